use crate::error::{Result, SplitError};
use crate::plan::PageSpan;
use lopdf::{Document, Object, ObjectId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub path: String,
    pub file_bytes: u64,
    pub page_count: u32,
    /// The source carried an `/Encrypt` dictionary; page content may not copy cleanly.
    /// Also set when lopdf decrypted it on load with the empty user password.
    pub encrypted: bool,
}

/// A source PDF held in memory for the duration of a split run.
pub struct SourceDocument {
    path: PathBuf,
    info: DocumentInfo,
    doc: Document,
}

pub fn inspect(path: &Path) -> Result<DocumentInfo> {
    SourceDocument::open(path).map(|d| d.info)
}

impl SourceDocument {
    pub fn open(path: &Path) -> Result<Self> {
        let meta = std::fs::metadata(path).map_err(|e| SplitError::read(path, e))?;
        if !meta.is_file() {
            return Err(SplitError::read(path, "not a regular file"));
        }

        let doc = Document::load(path).map_err(|e| SplitError::read(path, e))?;
        let page_count = u32::try_from(doc.get_pages().len())
            .map_err(|_| SplitError::read(path, "page count overflows u32"))?;

        let info = DocumentInfo {
            path: path.display().to_string(),
            file_bytes: meta.len(),
            page_count,
            encrypted: doc.is_encrypted() || doc.encryption_state.is_some(),
        };
        debug!(?info, "opened source document");

        Ok(Self {
            path: path.to_path_buf(),
            info,
            doc,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn info(&self) -> &DocumentInfo {
        &self.info
    }

    /// Build a new document holding pages `span` of the source, in source order.
    ///
    /// Pages past the end of the source are never copied, and an inverted span
    /// yields a document with no pages.
    pub fn extract(&self, span: PageSpan, prune: bool) -> Result<Document> {
        let pages = self.doc.get_pages();
        let keep: Vec<ObjectId> = span
            .pages()
            .filter(|&p| p <= self.info.page_count)
            .filter_map(|p| pages.get(&p).copied())
            .collect();
        let kept: BTreeSet<ObjectId> = keep.iter().copied().collect();
        let dropped: BTreeSet<ObjectId> = pages
            .values()
            .copied()
            .filter(|id| !kept.contains(id))
            .collect();

        let mut out = self.doc.clone();
        rebuild_page_tree(&mut out, &keep, &dropped)
            .map_err(|e| SplitError::read(&self.path, format!("page tree: {e}")))?;

        if prune {
            let removed = out.prune_objects();
            out.renumber_objects();
            debug!(
                start = span.start_page,
                end = span.end_page,
                pruned = removed.len(),
                "pruned unreferenced objects"
            );
        }
        Ok(out)
    }
}

/// Attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&str; 4] = ["Resources", "MediaBox", "CropBox", "Rotate"];

/// Catalog entries that point into the full page tree.
const PAGE_NAVIGATION: [&str; 5] = [
    "Outlines",
    "Dests",
    "PageLabels",
    "StructTreeRoot",
    "OpenAction",
];

/// Replace the page tree with a single flat node holding `keep`.
///
/// Inherited attributes are copied onto each kept page first so that dropping
/// the intermediate nodes does not change how a page renders. Dropped pages are
/// cut loose from their parents and links into them are removed, so pruning
/// cannot pull old `Pages` nodes and their kids back in.
fn rebuild_page_tree(
    doc: &mut Document,
    keep: &[ObjectId],
    dropped: &BTreeSet<ObjectId>,
) -> lopdf::Result<()> {
    let root_id = doc.trailer.get(b"Root")?.as_reference()?;
    let pages_id = doc.get_dictionary(root_id)?.get(b"Pages")?.as_reference()?;

    for &page_id in keep {
        let inherited: Vec<(&str, Object)> = INHERITABLE
            .iter()
            .filter_map(|key| inherited_attr(doc, page_id, key.as_bytes()).map(|v| (*key, v)))
            .collect();

        let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
        for (key, value) in inherited {
            page.set(key, value);
        }
        page.set("Parent", Object::Reference(pages_id));

        drop_links_into(doc, page_id, dropped)?;
    }

    for &page_id in dropped {
        if let Ok(page) = doc.get_object_mut(page_id).and_then(Object::as_dict_mut) {
            page.remove(b"Parent");
        }
    }

    let kids: Vec<Object> = keep.iter().map(|&id| Object::Reference(id)).collect();
    let root_pages = doc.get_object_mut(pages_id)?.as_dict_mut()?;
    root_pages.remove(b"Parent");
    root_pages.set("Kids", kids);
    root_pages.set("Count", keep.len() as i64);

    let catalog = doc.get_object_mut(root_id)?.as_dict_mut()?;
    for key in PAGE_NAVIGATION {
        catalog.remove(key.as_bytes());
    }
    Ok(())
}

fn inherited_attr(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let page = doc.get_dictionary(page_id).ok()?;
    if page.has(key) {
        return None;
    }

    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    // Bounded walk; malformed files can contain Parent cycles.
    for _ in 0..64 {
        let node = doc.get_dictionary(parent?).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }
    None
}

/// Remove annotations on `page_id` whose destination is one of `dropped`.
fn drop_links_into(
    doc: &mut Document,
    page_id: ObjectId,
    dropped: &BTreeSet<ObjectId>,
) -> lopdf::Result<()> {
    let annots = match doc.get_dictionary(page_id)?.get(b"Annots") {
        Ok(Object::Array(a)) => a.clone(),
        Ok(Object::Reference(id)) => doc.get_object(*id)?.as_array()?.clone(),
        _ => return Ok(()),
    };

    let before = annots.len();
    let kept: Vec<Object> = annots
        .into_iter()
        .filter(|a| !link_target(doc, a).is_some_and(|id| dropped.contains(&id)))
        .collect();
    if kept.len() != before {
        debug!(?page_id, removed = before - kept.len(), "dropped links to pages outside span");
        doc.get_object_mut(page_id)?.as_dict_mut()?.set("Annots", kept);
    }
    Ok(())
}

/// Page targeted by an explicit `/Dest` or a `/GoTo` action's `/D`.
fn link_target(doc: &Document, annot: &Object) -> Option<ObjectId> {
    let annot = resolve(doc, annot)?.as_dict().ok()?;
    let dest = match annot.get(b"Dest") {
        Ok(dest) => dest,
        Err(_) => {
            let action = resolve(doc, annot.get(b"A").ok()?)?.as_dict().ok()?;
            action.get(b"D").ok()?
        }
    };
    let dest = resolve(doc, dest)?.as_array().ok()?;
    dest.first()?.as_reference().ok()
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}
