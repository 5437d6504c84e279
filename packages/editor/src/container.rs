//! # Container Adapter contract
//!
//! The core never parses or writes container files itself. It asks a
//! [`ContainerAdapter`] for `(text, style)` pairs on load and hands back a
//! [`ContainerPatch`] on save.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::StyleRef;

/// A paragraph as extracted by an adapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceParagraph {
    pub text: String,
    pub style: StyleRef,
}

impl SourceParagraph {
    pub fn new(text: impl Into<String>, style: StyleRef) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

/// What happened to one paragraph of the final document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum PatchEntry {
    /// Untouched; the adapter must copy it verbatim
    Keep { style: StyleRef },

    /// Existing paragraph with new text
    Rewrite { style: StyleRef, text: String },

    /// New paragraph; the adapter picks its formatting
    Insert { text: String },
}

impl PatchEntry {
    pub fn style(&self) -> Option<&StyleRef> {
        match self {
            PatchEntry::Keep { style } | PatchEntry::Rewrite { style, .. } => Some(style),
            PatchEntry::Insert { .. } => None,
        }
    }
}

/// Final document order plus the source paragraphs that were removed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerPatch {
    pub entries: Vec<PatchEntry>,
    pub removed: Vec<StyleRef>,
}

impl ContainerPatch {
    /// True when writing this patch reproduces the source container
    pub fn is_unchanged(&self) -> bool {
        self.removed.is_empty() && self.entries.iter().all(|e| matches!(e, PatchEntry::Keep { .. }))
    }
}

#[derive(Error, Debug)]
pub enum ContainerError {
    #[error("Container not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Unreadable container {}: {reason}", path.display())]
    Format { path: PathBuf, reason: String },

    #[error("Failed to write container {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ContainerError {
    pub fn format(path: &Path, reason: impl Into<String>) -> Self {
        ContainerError::Format {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    pub fn write(path: &Path, source: io::Error) -> Self {
        ContainerError::Write {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Loads and writes one container format
pub trait ContainerAdapter {
    /// Extract body paragraphs in document order
    fn load_container(&mut self, path: &Path) -> Result<Vec<SourceParagraph>, ContainerError>;

    /// Write `patch`, computed against the container at `source`, to `target`.
    ///
    /// Must leave `target` either fully written or untouched.
    fn write_container(
        &mut self,
        source: &Path,
        target: &Path,
        patch: &ContainerPatch,
    ) -> Result<(), ContainerError>;

    /// Display name of a style, if the adapter knows one
    fn style_label(&self, _style: &StyleRef) -> Option<String> {
        None
    }
}

impl<A: ContainerAdapter + ?Sized> ContainerAdapter for Box<A> {
    fn load_container(&mut self, path: &Path) -> Result<Vec<SourceParagraph>, ContainerError> {
        (**self).load_container(path)
    }

    fn write_container(
        &mut self,
        source: &Path,
        target: &Path,
        patch: &ContainerPatch,
    ) -> Result<(), ContainerError> {
        (**self).write_container(source, target, patch)
    }

    fn style_label(&self, style: &StyleRef) -> Option<String> {
        (**self).style_label(style)
    }
}

/// A stored in-memory container: paragraphs plus their style names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryFile {
    pub paragraphs: Vec<MemoryParagraph>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryParagraph {
    pub text: String,
    pub style_name: Option<String>,
}

/// In-memory adapter for tests and embedders.
///
/// Style tokens are `"{generation}:{slot}"` so a patch written against a
/// stale load is detected. Generations are unique across all paths.
#[derive(Debug, Default)]
pub struct MemoryContainer {
    files: HashMap<PathBuf, MemoryFile>,
    generations: HashMap<PathBuf, u64>,
    last_generation: u64,

    /// Style names of the latest load of each path
    labels: HashMap<PathBuf, HashMap<StyleRef, String>>,
    default_style: Option<String>,
    fail_writes: bool,
}

impl MemoryContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Style name given to inserted paragraphs
    pub fn with_default_style(mut self, style: impl Into<String>) -> Self {
        self.default_style = Some(style.into());
        self
    }

    pub fn insert_file(&mut self, path: impl Into<PathBuf>, texts: &[&str]) {
        let file = MemoryFile {
            paragraphs: texts
                .iter()
                .map(|t| MemoryParagraph {
                    text: t.to_string(),
                    style_name: None,
                })
                .collect(),
        };
        self.insert(path, file);
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, file: MemoryFile) {
        let path = path.into();
        self.last_generation += 1;
        self.generations.insert(path.clone(), self.last_generation);
        self.files.insert(path, file);
    }

    pub fn file(&self, path: &Path) -> Option<&MemoryFile> {
        self.files.get(path)
    }

    pub fn texts(&self, path: &Path) -> Option<Vec<String>> {
        self.file(path)
            .map(|f| f.paragraphs.iter().map(|p| p.text.clone()).collect())
    }

    /// Make every subsequent write fail (after the patch has been validated)
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    fn slot_of(&self, source: &Path, style: &StyleRef) -> Result<usize, ContainerError> {
        let generation = self.generations.get(source).copied().unwrap_or_default();
        let foreign = || ContainerError::format(source, format!("foreign style token {}", style));
        let (gen, slot) = style.token().split_once(':').ok_or_else(foreign)?;

        if gen.parse::<u64>().ok() != Some(generation) {
            return Err(ContainerError::format(source, "container changed since load"));
        }
        slot.parse().map_err(|_| foreign())
    }
}

impl ContainerAdapter for MemoryContainer {
    fn load_container(&mut self, path: &Path) -> Result<Vec<SourceParagraph>, ContainerError> {
        let file = self.files.get(path).ok_or_else(|| ContainerError::NotFound {
            path: path.to_path_buf(),
        })?;
        let generation = self.generations.get(path).copied().unwrap_or_default();

        let mut out = Vec::with_capacity(file.paragraphs.len());
        let mut labels = HashMap::new();
        for (slot, p) in file.paragraphs.iter().enumerate() {
            let style = StyleRef::new(format!("{}:{}", generation, slot));
            if let Some(name) = &p.style_name {
                labels.insert(style.clone(), name.clone());
            }
            out.push(SourceParagraph::new(p.text.clone(), style));
        }
        self.labels.insert(path.to_path_buf(), labels);
        Ok(out)
    }

    fn write_container(
        &mut self,
        source: &Path,
        target: &Path,
        patch: &ContainerPatch,
    ) -> Result<(), ContainerError> {
        let original = self.files.get(source).ok_or_else(|| ContainerError::NotFound {
            path: source.to_path_buf(),
        })?;

        let mut paragraphs = Vec::with_capacity(patch.entries.len());
        for entry in &patch.entries {
            let paragraph = match entry {
                PatchEntry::Keep { style } => {
                    let slot = self.slot_of(source, style)?;
                    original.paragraphs.get(slot).cloned().ok_or_else(|| {
                        ContainerError::format(source, format!("no paragraph for {}", style))
                    })?
                }
                PatchEntry::Rewrite { style, text } => {
                    let slot = self.slot_of(source, style)?;
                    let style_name = original
                        .paragraphs
                        .get(slot)
                        .ok_or_else(|| {
                            ContainerError::format(source, format!("no paragraph for {}", style))
                        })?
                        .style_name
                        .clone();
                    MemoryParagraph {
                        text: text.clone(),
                        style_name,
                    }
                }
                PatchEntry::Insert { text } => MemoryParagraph {
                    text: text.clone(),
                    style_name: self.default_style.clone(),
                },
            };
            paragraphs.push(paragraph);
        }

        if self.fail_writes {
            return Err(ContainerError::write(
                target,
                io::Error::new(io::ErrorKind::Other, "simulated write failure"),
            ));
        }

        self.insert(target, MemoryFile { paragraphs });
        Ok(())
    }

    fn style_label(&self, style: &StyleRef) -> Option<String> {
        self.labels
            .values()
            .find_map(|labels| labels.get(style))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_load_missing_file() {
        let mut container = MemoryContainer::new();
        let err = container.load_container(Path::new("missing.docx")).unwrap_err();
        assert!(matches!(err, ContainerError::NotFound { .. }));
    }

    fn styled(paragraphs: &[(&str, &str)]) -> MemoryFile {
        MemoryFile {
            paragraphs: paragraphs
                .iter()
                .map(|(text, style)| MemoryParagraph {
                    text: text.to_string(),
                    style_name: Some(style.to_string()),
                })
                .collect(),
        }
    }

    #[test]
    fn test_memory_labels_follow_latest_load() {
        let mut container = MemoryContainer::new();
        let path = Path::new("a.docx");
        container.insert(path, styled(&[("Title", "Heading1"), ("Body", "Normal")]));

        let first = container.load_container(path).unwrap();
        let patch = ContainerPatch {
            entries: vec![PatchEntry::Keep { style: first[0].style.clone() }],
            removed: vec![first[1].style.clone()],
        };
        container.write_container(path, path, &patch).unwrap();
        let second = container.load_container(path).unwrap();

        assert_eq!(container.labels.len(), 1);
        assert_eq!(container.labels[path].len(), 1);
        assert_eq!(container.style_label(&first[0].style), None);
        assert_eq!(container.style_label(&second[0].style).as_deref(), Some("Heading1"));
    }

    #[test]
    fn test_memory_tokens_differ_across_paths() {
        let mut container = MemoryContainer::new();
        container.insert(Path::new("a.docx"), styled(&[("one", "A")]));
        container.insert(Path::new("b.docx"), styled(&[("two", "B")]));

        let a = container.load_container(Path::new("a.docx")).unwrap();
        let b = container.load_container(Path::new("b.docx")).unwrap();

        assert_ne!(a[0].style, b[0].style);
        assert_eq!(container.style_label(&a[0].style).as_deref(), Some("A"));
        assert_eq!(container.style_label(&b[0].style).as_deref(), Some("B"));
    }

    #[test]
    fn test_memory_write_rejects_stale_tokens() {
        let mut container = MemoryContainer::new();
        container.insert_file("a.docx", &["one"]);
        let loaded = container.load_container(Path::new("a.docx")).unwrap();

        // Replaced behind our back
        container.insert_file("a.docx", &["other"]);

        let patch = ContainerPatch {
            entries: vec![PatchEntry::Keep { style: loaded[0].style.clone() }],
            removed: vec![],
        };
        let err = container
            .write_container(Path::new("a.docx"), Path::new("a.docx"), &patch)
            .unwrap_err();
        assert!(matches!(err, ContainerError::Format { .. }));
        assert_eq!(container.texts(Path::new("a.docx")).unwrap(), vec!["other"]);
    }

    #[test]
    fn test_patch_unchanged_detection() {
        let keep = ContainerPatch {
            entries: vec![PatchEntry::Keep { style: StyleRef::new("0:0") }],
            removed: vec![],
        };
        assert!(keep.is_unchanged());

        let removed = ContainerPatch {
            entries: vec![],
            removed: vec![StyleRef::new("0:0")],
        };
        assert!(!removed.is_unchanged());
    }
}
