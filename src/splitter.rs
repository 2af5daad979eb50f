use crate::{
    config::Config,
    document::SourceDocument,
    error::{Result, SplitError},
    manifest::{ManifestEntry, SplitManifest},
    plan::{Disposition, PlannedSection, SkipReason, SplitPlan},
    section::SectionTable,
    util::{bytes_to_mb, fingerprint_file, now_rfc3339},
};
use lopdf::Document;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct SplitOptions {
    pub extension: String,
    pub manifest_filename: String,
    pub file_path_prefix: String,
    pub warn_output_bytes: u64,
    pub prune_unused_objects: bool,
    pub hashing: crate::config::Hashing,
}

impl SplitOptions {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            extension: cfg.output.extension.clone(),
            manifest_filename: cfg.output.manifest_filename.clone(),
            file_path_prefix: cfg.output.file_path_prefix.clone(),
            warn_output_bytes: cfg.limits.warn_output_bytes,
            prune_unused_objects: cfg.output.prune_unused_objects,
            hashing: cfg.hashing.clone(),
        }
    }
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

pub struct Splitter {
    opts: SplitOptions,
}

impl Splitter {
    pub fn new(opts: SplitOptions) -> Self {
        Self { opts }
    }

    pub fn manifest_path(&self, out_dir: &Path) -> PathBuf {
        out_dir.join(&self.opts.manifest_filename)
    }

    pub fn output_path(&self, out_dir: &Path, name: &str) -> PathBuf {
        out_dir.join(self.file_name(name))
    }

    fn file_name(&self, name: &str) -> String {
        format!("{}.{}", name, self.opts.extension)
    }

    fn relative_path(&self, name: &str) -> String {
        let prefix = self.opts.file_path_prefix.trim_end_matches('/');
        if prefix.is_empty() {
            self.file_name(name)
        } else {
            format!("{}/{}", prefix, self.file_name(name))
        }
    }

    /// Write one output per in-range section and then the manifest.
    ///
    /// Out-of-range sections are skipped with a warning. Any I/O failure aborts
    /// the run; files already written are left in place.
    pub fn split(
        &self,
        source: &SourceDocument,
        table: &SectionTable,
        out_dir: &Path,
    ) -> Result<SplitManifest> {
        let info = source.info();
        if info.encrypted {
            warn!(
                "source is encrypted; page content may not copy cleanly: {}",
                source.path().display()
            );
        }

        let fingerprint = fingerprint_file(&self.opts.hashing, source.path())
            .map_err(|e| SplitError::read(source.path(), format!("{e:#}")))?;

        std::fs::create_dir_all(out_dir).map_err(|e| SplitError::write(out_dir, e))?;

        let plan = SplitPlan::resolve(table.sections(), info.page_count);
        info!(
            "splitting {} ({} pages, {:.1}MB) into {} sections",
            source.path().display(),
            info.page_count,
            bytes_to_mb(info.file_bytes),
            plan.sections.len()
        );

        let mut entries = Vec::new();
        for planned in &plan.sections {
            match &planned.disposition {
                Disposition::Skip {
                    reason: SkipReason::OutOfRange {
                        start_page,
                        page_count,
                    },
                } => {
                    warn!(
                        "skipping {}: start page {} is past the last page {}",
                        planned.spec.name, start_page, page_count
                    );
                }
                Disposition::Emit => {
                    entries.push(self.emit(source, planned, out_dir)?);
                }
            }
        }

        let manifest = SplitManifest {
            original_file: source
                .path()
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| info.path.clone()),
            original_size: info.file_bytes,
            original_fingerprint: fingerprint,
            fingerprint_mode: self.opts.hashing.mode.as_str().to_string(),
            total_pages: info.page_count,
            encrypted: info.encrypted,
            split_type: table.label.clone(),
            sections: entries,
            split_date: now_rfc3339(),
            working_dir: std::env::current_dir()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        };

        let manifest_path = self.manifest_path(out_dir);
        manifest.write(&manifest_path)?;
        info!(
            "wrote manifest {} ({} of {} sections emitted)",
            manifest_path.display(),
            manifest.sections.len(),
            plan.sections.len()
        );

        Ok(manifest)
    }

    fn emit(
        &self,
        source: &SourceDocument,
        planned: &PlannedSection,
        out_dir: &Path,
    ) -> Result<ManifestEntry> {
        let spec = &planned.spec;
        let span = planned.span;
        info!(
            "processing {} (pages {}-{})",
            spec.name, span.start_page, span.end_page
        );

        let mut doc = source.extract(span, self.opts.prune_unused_objects)?;
        let path = self.output_path(out_dir, &spec.name);
        let file_bytes = write_document(&mut doc, &path)?;

        info!(
            "saved {} ({:.1}MB, {} pages)",
            path.display(),
            bytes_to_mb(file_bytes),
            span.page_count()
        );
        if file_bytes > self.opts.warn_output_bytes {
            warn!(
                "{} exceeds {:.0}MB ({} bytes); consider splitting it further",
                path.display(),
                bytes_to_mb(self.opts.warn_output_bytes),
                file_bytes
            );
        }

        Ok(ManifestEntry {
            name: spec.name.clone(),
            title: spec.title.clone(),
            description: spec.description.clone(),
            category: spec.category.clone(),
            start_page: span.start_page,
            end_page: span.end_page,
            page_count: span.page_count(),
            file_bytes,
            file_path: self.relative_path(&spec.name),
        })
    }
}

fn write_document(doc: &mut Document, path: &Path) -> Result<u64> {
    let file = File::create(path).map_err(|e| SplitError::write(path, e))?;
    let mut w = BufWriter::new(file);
    doc.save_to(&mut w).map_err(|e| SplitError::write(path, e))?;
    w.flush().map_err(|e| SplitError::write(path, e))?;
    drop(w);

    let meta = std::fs::metadata(path).map_err(|e| SplitError::write(path, e))?;
    Ok(meta.len())
}
