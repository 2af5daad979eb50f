use crate::error::{Result, SplitError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use unicode_normalization::UnicodeNormalization;

/// Last page of a section, either a 1-based page number or "through the last page".
///
/// Authored as a positive integer, `-1`, or the string `"end"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawEndPage", into = "RawEndPage")]
pub enum EndPage {
    Page(u32),
    ToEnd,
}

impl EndPage {
    pub fn resolve(self, page_count: u32) -> u32 {
        match self {
            EndPage::Page(p) => p.min(page_count),
            EndPage::ToEnd => page_count,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawEndPage {
    Number(i64),
    Word(String),
}

impl TryFrom<RawEndPage> for EndPage {
    type Error = String;

    fn try_from(raw: RawEndPage) -> std::result::Result<Self, Self::Error> {
        match raw {
            RawEndPage::Number(-1) => Ok(EndPage::ToEnd),
            RawEndPage::Number(n) if n >= 1 => u32::try_from(n)
                .map(EndPage::Page)
                .map_err(|_| format!("end_page out of range: {n}")),
            RawEndPage::Number(n) => Err(format!("end_page must be >= 1 or -1, got {n}")),
            RawEndPage::Word(w) if w.eq_ignore_ascii_case("end") => Ok(EndPage::ToEnd),
            RawEndPage::Word(w) => Err(format!(
                "end_page must be a page number or \"end\", got {w:?}"
            )),
        }
    }
}

impl From<EndPage> for RawEndPage {
    fn from(end: EndPage) -> Self {
        match end {
            EndPage::Page(p) => RawEndPage::Number(p as i64),
            EndPage::ToEnd => RawEndPage::Number(-1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSpec {
    pub name: String,
    pub start_page: u32, // 1-based inclusive
    pub end_page: EndPage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl SectionSpec {
    pub fn new(name: impl Into<String>, start_page: u32, end_page: EndPage) -> Self {
        Self {
            name: name.into(),
            start_page,
            end_page,
            title: None,
            description: None,
            category: None,
        }
    }
}

/// Shape of a standalone section file (TOML `[[sections]]` or a JSON object).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SectionFile {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub sections: Vec<SectionSpec>,
}

impl SectionFile {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading section table: {}", path.display()))?;
        let is_json = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let file = if is_json {
            serde_json::from_str(&raw).with_context(|| "parsing section table JSON")?
        } else {
            toml::from_str(&raw).with_context(|| "parsing section table TOML")?
        };
        Ok(file)
    }
}

/// An ordered, validated list of sections.
#[derive(Debug, Clone, Serialize)]
pub struct SectionTable {
    pub label: Option<String>,
    sections: Vec<SectionSpec>,
}

impl SectionTable {
    /// Normalises names to NFC and rejects unusable or colliding names up front,
    /// so no output file is silently overwritten by a later section.
    pub fn new(label: Option<String>, sections: Vec<SectionSpec>) -> Result<Self> {
        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut out = Vec::with_capacity(sections.len());

        for (index, mut spec) in sections.into_iter().enumerate() {
            spec.name = spec.name.nfc().collect();
            validate_name(index, &spec.name)?;

            if spec.start_page == 0 {
                return Err(SplitError::InvalidSection {
                    index,
                    name: spec.name,
                    reason: "start_page is 1-based and must be >= 1".into(),
                });
            }

            if let Some(&first) = seen.get(&spec.name) {
                return Err(SplitError::DuplicateSection {
                    name: spec.name,
                    first,
                    second: index,
                });
            }
            seen.insert(spec.name.clone(), index);
            out.push(spec);
        }

        Ok(Self {
            label,
            sections: out,
        })
    }

    pub fn from_file(file: SectionFile) -> Result<Self> {
        Self::new(file.label, file.sections)
    }

    pub fn sections(&self) -> &[SectionSpec] {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

fn validate_name(index: usize, name: &str) -> Result<()> {
    let reason = if name.is_empty() {
        Some("name is empty")
    } else if name == "." || name == ".." {
        Some("name is a relative path component")
    } else if name.contains(['/', '\\', '\0']) {
        Some("name contains a path separator or NUL")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(SplitError::InvalidSection {
            index,
            name: name.to_string(),
            reason: reason.into(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_page_accepts_sentinels() {
        let f: SectionFile = toml::from_str(
            r#"
            [[sections]]
            name = "a"
            start_page = 1
            end_page = -1

            [[sections]]
            name = "b"
            start_page = 2
            end_page = "end"

            [[sections]]
            name = "c"
            start_page = 3
            end_page = 9
            "#,
        )
        .unwrap();
        let ends: Vec<_> = f.sections.iter().map(|s| s.end_page).collect();
        assert_eq!(ends, vec![EndPage::ToEnd, EndPage::ToEnd, EndPage::Page(9)]);
    }

    #[test]
    fn end_page_rejects_zero() {
        let r: std::result::Result<SectionFile, _> = toml::from_str(
            r#"
            [[sections]]
            name = "a"
            start_page = 1
            end_page = 0
            "#,
        );
        assert!(r.is_err());
    }

    #[test]
    fn end_page_resolves_against_page_count() {
        assert_eq!(EndPage::Page(48).resolve(1406), 48);
        assert_eq!(EndPage::Page(1504).resolve(1300), 1300);
        assert_eq!(EndPage::ToEnd.resolve(1406), 1406);
    }
}
