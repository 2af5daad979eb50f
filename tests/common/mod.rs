#![allow(dead_code)]

use lopdf::{
    Dictionary, Document, EncryptionState, EncryptionVersion, Object, ObjectId, Permissions,
    Stream, StringFormat, dictionary,
};
use std::path::Path;

pub const PAGES_PER_NODE: u32 = 100;

/// Write a PDF with `page_count` pages whose content stream draws `(page N)`.
///
/// Pages hang off intermediate `Pages` nodes of up to 100 kids that carry the
/// `MediaBox` and `Resources`, so pages rely on inheritance like real scans do.
pub fn write_marked_pdf(path: &Path, page_count: u32) {
    let mut doc = Document::with_version("1.5");
    let root_pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => Object::Reference(font_id) },
    });

    let mut nodes: Vec<Object> = Vec::new();
    let mut page = 1u32;
    while page <= page_count {
        let node_id = doc.new_object_id();
        let last = (page + PAGES_PER_NODE - 1).min(page_count);
        let mut kids = Vec::new();
        for n in page..=last {
            kids.push(Object::Reference(add_page(&mut doc, node_id, n)));
        }
        doc.objects.insert(
            node_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Parent" => Object::Reference(root_pages_id),
                "Kids" => kids,
                "Count" => (last - page + 1) as i64,
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(612),
                    Object::Integer(792),
                ],
                "Resources" => Object::Reference(resources_id),
            }),
        );
        nodes.push(Object::Reference(node_id));
        page = last + 1;
    }

    doc.objects.insert(
        root_pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => nodes,
            "Count" => page_count as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(root_pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    doc.save(path).unwrap();
}

fn add_page(doc: &mut Document, parent: ObjectId, n: u32) -> ObjectId {
    let content = format!("BT /F1 12 Tf 72 720 Td (page {n}) Tj ET");
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
    doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => Object::Reference(parent),
        "Contents" => Object::Reference(content_id),
    })
}

/// Page markers of a PDF on disk, in page order.
pub fn page_markers(path: &Path) -> Vec<u32> {
    let doc = Document::load(path).unwrap();
    doc.get_pages()
        .values()
        .map(|&id| {
            let content = doc.get_page_content(id).unwrap();
            let text = String::from_utf8_lossy(&content);
            let start = text.find("(page ").unwrap() + "(page ".len();
            let end = start + text[start..].find(')').unwrap();
            text[start..end].parse().unwrap()
        })
        .collect()
}

/// Re-save `path` encrypted with an empty user password, the way restricted
/// catalogs are distributed.
pub fn encrypt_in_place(path: &Path) {
    let mut doc = Document::load(path).unwrap();
    let file_id = Object::String(b"catalog-split-test".to_vec(), StringFormat::Literal);
    doc.trailer.set("ID", vec![file_id.clone(), file_id]);

    let state = EncryptionState::try_from(EncryptionVersion::V2 {
        document: &doc,
        owner_password: "owner",
        user_password: "",
        key_length: 128,
        permissions: Permissions::PRINTABLE,
    })
    .unwrap();
    doc.encrypt(&state).unwrap();
    doc.save(path).unwrap();
}

/// Add a link annotation on page `from` with an explicit `/Dest` to page `to`.
pub fn add_link(path: &Path, from: u32, to: u32) {
    attach_link(path, from, to, |target| {
        dictionary! { "Dest" => vec![Object::Reference(target), "Fit".into()] }
    });
}

/// Add a link annotation on page `from` whose `/GoTo` action targets page `to`.
pub fn add_goto_link(path: &Path, from: u32, to: u32) {
    attach_link(path, from, to, |target| {
        dictionary! {
            "A" => dictionary! {
                "S" => "GoTo",
                "D" => vec![Object::Reference(target), "Fit".into()],
            },
        }
    });
}

fn attach_link(path: &Path, from: u32, to: u32, dest: impl FnOnce(ObjectId) -> Dictionary) {
    let mut doc = Document::load(path).unwrap();
    let pages = doc.get_pages();
    let (from_id, to_id) = (pages[&from], pages[&to]);

    let mut link = dictionary! {
        "Type" => "Annot",
        "Subtype" => "Link",
        "Rect" => vec![
            Object::Integer(72),
            Object::Integer(700),
            Object::Integer(200),
            Object::Integer(720),
        ],
    };
    link.extend(&dest(to_id));
    let link_id = doc.add_object(link);

    let page = doc.get_object_mut(from_id).unwrap().as_dict_mut().unwrap();
    let mut annots = page
        .get(b"Annots")
        .and_then(Object::as_array)
        .cloned()
        .unwrap_or_default();
    annots.push(Object::Reference(link_id));
    page.set("Annots", annots);

    doc.save(path).unwrap();
}

/// Number of objects in `doc` whose `/Type` is `ty`.
pub fn count_typed(doc: &Document, ty: &[u8]) -> usize {
    doc.objects
        .values()
        .filter_map(|o| o.as_dict().ok())
        .filter(|d| d.get(b"Type").and_then(Object::as_name).ok() == Some(ty))
        .count()
}
