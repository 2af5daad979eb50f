use crate::section::SectionSpec;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub global: Global,
    #[serde(default)]
    pub paths: Paths,
    #[serde(default)]
    pub hashing: Hashing,
    #[serde(default)]
    pub limits: Limits,
    #[serde(default)]
    pub output: Output,
    #[serde(default)]
    pub catalog: Catalog,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub security: Security,
    #[serde(default)]
    pub table: Table,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw).with_context(|| "parsing TOML")?;
        Ok(cfg)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Global {
    pub print_summary: bool,
}
impl Default for Global {
    fn default() -> Self {
        Self {
            print_summary: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paths {
    /// Source document used when `--input` is not given.
    pub input: String,
    pub out_dir: String,
}
impl Default for Paths {
    fn default() -> Self {
        Self {
            input: "".into(),
            out_dir: "public/pdfs/sections".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hashing {
    pub mode: HashMode,
    pub fast_window_bytes: u64,
}
impl Default for Hashing {
    fn default() -> Self {
        Self {
            mode: HashMode::Fast2x16mb,
            fast_window_bytes: 16 * 1024 * 1024,
        }
    }
}

/// How the source document is fingerprinted for the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HashMode {
    #[serde(rename = "fast_2x16mb")]
    Fast2x16mb,
    #[serde(rename = "full_sha256")]
    FullSha256,
}

impl HashMode {
    pub fn as_str(self) -> &'static str {
        match self {
            HashMode::Fast2x16mb => "fast_2x16mb",
            HashMode::FullSha256 => "full_sha256",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Limits {
    pub max_input_file_bytes: u64,
    /// Outputs above this size are reported, never refused.
    pub warn_output_bytes: u64,
}
impl Default for Limits {
    fn default() -> Self {
        Self {
            max_input_file_bytes: 2 * 1024 * 1024 * 1024,
            warn_output_bytes: 50 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Output {
    pub extension: String,
    pub manifest_filename: String,
    /// Prefix for the relative `file_path` recorded in the manifest.
    pub file_path_prefix: String,
    pub prune_unused_objects: bool,
}
impl Default for Output {
    fn default() -> Self {
        Self {
            extension: "pdf".into(),
            manifest_filename: "split-info.json".into(),
            file_path_prefix: "sections".into(),
            prune_unused_objects: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub base_url: String,
    pub url_path: String,
}
impl Default for Catalog {
    fn default() -> Self {
        Self {
            base_url: "".into(),
            url_path: "pdfs".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logging {
    pub level: String,
    pub json: bool,
    pub write_to_file: bool,
    pub file_path: String,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
            write_to_file: false,
            file_path: "".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Security {
    pub reject_url_inputs: bool,
}
impl Default for Security {
    fn default() -> Self {
        Self {
            reject_url_inputs: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Table {
    #[serde(default)]
    pub label: Option<String>,
    /// External section file; takes precedence over inline `sections`.
    #[serde(default)]
    pub sections_file: String,
    #[serde(default)]
    pub sections: Vec<SectionSpec>,
}
