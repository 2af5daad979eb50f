//! Read-only view of a split output directory for the page generator, the
//! uploader and the launcher: file names, sizes and public URLs.

use crate::{config::Config, manifest::SplitManifest, util::bytes_to_mb};
use anyhow::{Context, Result, anyhow};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static SECTION_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)[-_]").expect("static regex"));

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub file_name: String,
    pub stem: String,
    pub number: Option<String>,
    pub path: PathBuf,
    pub bytes: u64,
    pub size_mb: f64,
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub dir: PathBuf,
    pub entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Scan `dir` for `*.<ext>` files, sorted by file name. Titles come from the
    /// manifest when one is present.
    pub fn scan(cfg: &Config, dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(anyhow!("output directory does not exist: {}", dir.display()));
        }

        let ext = cfg.output.extension.as_str();
        let manifest_path = dir.join(&cfg.output.manifest_filename);
        let manifest = if manifest_path.is_file() {
            Some(SplitManifest::load(&manifest_path)?)
        } else {
            None
        };

        let mut entries = Vec::new();
        for dent in std::fs::read_dir(dir).with_context(|| format!("read_dir {}", dir.display()))? {
            let dent = dent?;
            let path = dent.path();
            let matches_ext = path
                .extension()
                .and_then(|s| s.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(ext));
            if !matches_ext || !path.is_file() {
                continue;
            }

            let file_name = dent.file_name().to_string_lossy().into_owned();
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let bytes = dent.metadata()?.len();
            let title = manifest
                .as_ref()
                .and_then(|m| m.entry(&stem))
                .and_then(|e| e.title.clone());

            entries.push(CatalogEntry {
                number: section_number(&stem).map(str::to_string),
                url: public_url(cfg, &file_name),
                size_mb: (bytes_to_mb(bytes) * 100.0).round() / 100.0,
                file_name,
                stem,
                path,
                bytes,
                title,
            });
        }
        entries.sort_by(|a, b| a.file_name.cmp(&b.file_name));

        Ok(Self {
            dir: dir.to_path_buf(),
            entries,
        })
    }

    /// Resolve a section number (`15`, `7`) or name to one entry.
    ///
    /// Numbers try the prefixes `NN-`, `N-` and `NN_` in that order; names match the
    /// exact stem first and then a case-insensitive substring.
    pub fn resolve(&self, query: &str) -> Option<&CatalogEntry> {
        let query = query.trim();
        if let Ok(n) = query.parse::<u32>() {
            let prefixes = [format!("{n:02}-"), format!("{n}-"), format!("{n:02}_")];
            for prefix in &prefixes {
                if let Some(e) = self.entries.iter().find(|e| e.file_name.starts_with(prefix)) {
                    return Some(e);
                }
            }
            return None;
        }

        if let Some(e) = self.entries.iter().find(|e| e.stem == query) {
            return Some(e);
        }
        let needle = query.to_lowercase();
        self.entries
            .iter()
            .find(|e| e.stem.to_lowercase().contains(&needle))
    }

    pub fn total_bytes(&self) -> u64 {
        self.entries.iter().map(|e| e.bytes).sum()
    }
}

pub fn section_number(stem: &str) -> Option<&str> {
    SECTION_NUMBER
        .captures(stem)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

pub fn public_url(cfg: &Config, file_name: &str) -> Option<String> {
    let base = cfg.catalog.base_url.trim_end_matches('/');
    if base.is_empty() {
        return None;
    }
    let path = cfg.catalog.url_path.trim_matches('/');
    if path.is_empty() {
        Some(format!("{base}/{file_name}"))
    } else {
        Some(format!("{base}/{path}/{file_name}"))
    }
}
