use crate::section::SectionSpec;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSpan {
    pub start_page: u32, // 1-based inclusive
    pub end_page: u32,   // 1-based inclusive, may be < start_page
}

impl PageSpan {
    pub fn page_count(&self) -> u32 {
        if self.end_page >= self.start_page {
            self.end_page - self.start_page + 1
        } else {
            0
        }
    }

    pub fn pages(&self) -> RangeInclusive<u32> {
        self.start_page..=self.end_page
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Disposition {
    Emit,
    Skip { reason: SkipReason },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The section starts after the last page of the document.
    OutOfRange { start_page: u32, page_count: u32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedSection {
    pub index: usize,
    pub spec: SectionSpec,
    pub span: PageSpan,
    pub disposition: Disposition,
}

impl PlannedSection {
    pub fn is_emitted(&self) -> bool {
        matches!(self.disposition, Disposition::Emit)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitPlan {
    pub page_count: u32,
    pub sections: Vec<PlannedSection>,
}

impl SplitPlan {
    /// Clamp every section against `page_count`, keeping table order.
    pub fn resolve(sections: &[SectionSpec], page_count: u32) -> SplitPlan {
        let sections = sections
            .iter()
            .enumerate()
            .map(|(index, spec)| {
                let span = PageSpan {
                    start_page: spec.start_page,
                    end_page: spec.end_page.resolve(page_count),
                };
                let disposition = if spec.start_page > page_count {
                    Disposition::Skip {
                        reason: SkipReason::OutOfRange {
                            start_page: spec.start_page,
                            page_count,
                        },
                    }
                } else {
                    Disposition::Emit
                };
                PlannedSection {
                    index,
                    spec: spec.clone(),
                    span,
                    disposition,
                }
            })
            .collect();

        SplitPlan {
            page_count,
            sections,
        }
    }

    pub fn emitted(&self) -> impl Iterator<Item = &PlannedSection> {
        self.sections.iter().filter(|s| s.is_emitted())
    }

    pub fn skipped(&self) -> impl Iterator<Item = &PlannedSection> {
        self.sections.iter().filter(|s| !s.is_emitted())
    }
}
