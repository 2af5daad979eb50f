use crate::error::{Result, SplitError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Durable record of one split run, written once after every section is processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitManifest {
    pub original_file: String,
    pub original_size: u64,
    pub original_fingerprint: String,
    pub fingerprint_mode: String,
    pub total_pages: u32,
    pub encrypted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split_type: Option<String>,
    pub sections: Vec<ManifestEntry>,
    // Non-semantic; differs between otherwise identical runs.
    pub split_date: String,
    pub working_dir: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub start_page: u32,
    pub end_page: u32,
    pub page_count: u32,
    pub file_bytes: u64,
    pub file_path: String,
}

impl SplitManifest {
    pub fn write(&self, path: &Path) -> Result<()> {
        let raw = serde_json::to_string_pretty(self).map_err(|e| SplitError::write(path, e))?;
        std::fs::write(path, raw).map_err(|e| SplitError::write(path, e))
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading manifest: {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing manifest: {}", path.display()))
    }

    pub fn entry(&self, name: &str) -> Option<&ManifestEntry> {
        self.sections.iter().find(|e| e.name == name)
    }
}
