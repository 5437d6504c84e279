//! # Docx Adapter
//!
//! [`ContainerAdapter`] for WordprocessingML packages. Paragraph identity is
//! the position of a body-level `w:p` in `word/document.xml` as loaded,
//! tagged with the part's CRC-32 so writes against a changed file are
//! refused.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use quill_editor::{ContainerAdapter, ContainerError, ContainerPatch, SourceParagraph, StyleRef};
use tracing::{debug, info, instrument};

use crate::atomic::atomic_write;
use crate::body::Body;
use crate::error::DocxError;
use crate::package::{copy_package, read_part, DOCUMENT_PART};
use crate::splice::{slot_token, splice};

#[derive(Debug, Default)]
pub struct DocxAdapter {
    /// Paragraph style id given to inserted paragraphs
    insert_style: Option<String>,

    /// `w:pStyle` values from the latest load of each path
    labels: HashMap<PathBuf, HashMap<StyleRef, String>>,

    /// CRC-32 of `word/document.xml` per loaded path
    loaded: HashMap<PathBuf, u32>,
}

impl DocxAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_insert_style(mut self, style: Option<String>) -> Self {
        self.insert_style = style;
        self
    }

    pub fn insert_style(&self) -> Option<&str> {
        self.insert_style.as_deref()
    }

    fn read_document(path: &Path) -> Result<(Vec<u8>, String, u32), DocxError> {
        let package = fs::read(path)?;
        let xml = read_part(&package, DOCUMENT_PART)?;
        let crc = crc32fast::hash(xml.as_bytes());
        Ok((package, xml, crc))
    }
}

impl ContainerAdapter for DocxAdapter {
    #[instrument(skip_all, fields(path = %path.display()))]
    fn load_container(&mut self, path: &Path) -> Result<Vec<SourceParagraph>, ContainerError> {
        let (_, xml, crc) = Self::read_document(path).map_err(|e| e.on_load(path))?;
        let body = Body::scan(&xml).map_err(|e| e.on_load(path))?;

        let mut paragraphs = Vec::with_capacity(body.slots.len());
        let mut labels = HashMap::new();
        for (index, slot) in body.slots.into_iter().enumerate() {
            let style = slot_token(crc, index);
            if let Some(id) = slot.style_id {
                labels.insert(style.clone(), id);
            }
            paragraphs.push(SourceParagraph::new(slot.text, style));
        }

        self.labels.insert(path.to_path_buf(), labels);
        self.loaded.insert(path.to_path_buf(), crc);
        info!(paragraphs = paragraphs.len(), crc = %format!("{:08x}", crc), "Loaded document");
        Ok(paragraphs)
    }

    #[instrument(skip_all, fields(source = %source.display(), target = %target.display()))]
    fn write_container(
        &mut self,
        source: &Path,
        target: &Path,
        patch: &ContainerPatch,
    ) -> Result<(), ContainerError> {
        let (package, xml, crc) = Self::read_document(source).map_err(|e| e.on_load(source))?;

        match self.loaded.get(source) {
            None => return Err(DocxError::NotLoaded.on_write(source)),
            Some(&seen) if seen != crc => return Err(DocxError::Changed.on_write(source)),
            Some(_) => {}
        }

        let document = if patch.is_unchanged() {
            debug!("No paragraph changes, copying package");
            None
        } else {
            let body = Body::scan(&xml).map_err(|e| e.on_load(source))?;
            let spliced = splice(&xml, &body, patch, crc, self.insert_style.as_deref())
                .map_err(|e| e.on_write(source))?;
            Some(spliced)
        };

        atomic_write(target, |file| {
            let replace = document.as_deref().map(|xml| (DOCUMENT_PART, xml));
            copy_package(&package, file, replace)?;
            Ok(())
        })
        .map_err(|e| e.on_write(target))?;

        info!(entries = patch.entries.len(), removed = patch.removed.len(), "Wrote document");
        Ok(())
    }

    fn style_label(&self, style: &StyleRef) -> Option<String> {
        self.labels
            .values()
            .find_map(|labels| labels.get(style))
            .cloned()
    }
}
