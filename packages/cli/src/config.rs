use quill_editor::DEFAULT_PREVIEW_WIDTH;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_NAME: &str = "quill.config.json";

const FALLBACK_EDITOR: &str = "vi";

/// Quill configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Paragraph style id for inserted paragraphs
    #[serde(default)]
    pub insert_style: Option<String>,

    /// Command used by `quill edit`
    #[serde(default)]
    pub editor: Option<String>,

    /// Characters of paragraph text shown by `quill info --structure`
    #[serde(default = "default_preview_width")]
    pub preview_width: usize,
}

fn default_preview_width() -> usize {
    DEFAULT_PREVIEW_WIDTH
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Editor command: config, then `$VISUAL`, then `$EDITOR`
    pub fn editor_command(&self) -> String {
        resolve_editor(
            self.editor.as_deref(),
            std::env::var("VISUAL").ok(),
            std::env::var("EDITOR").ok(),
        )
    }
}

fn resolve_editor(
    configured: Option<&str>,
    visual: Option<String>,
    editor: Option<String>,
) -> String {
    configured
        .map(str::to_string)
        .into_iter()
        .chain(visual)
        .chain(editor)
        .find(|cmd| !cmd.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_EDITOR.to_string())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            insert_style: None,
            editor: None,
            preview_width: default_preview_width(),
        }
    }
}
