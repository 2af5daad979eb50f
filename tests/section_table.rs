use catalog_split::{
    SplitError,
    section::{EndPage, SectionFile, SectionSpec, SectionTable},
};

#[test]
fn duplicate_names_fail_fast() {
    let err = SectionTable::new(
        None,
        vec![
            SectionSpec::new("31-Safety", 272, EndPage::Page(298)),
            SectionSpec::new("33-Safety_Equipment", 299, EndPage::Page(415)),
            SectionSpec::new("31-Safety", 300, EndPage::Page(310)),
        ],
    )
    .unwrap_err();

    match err {
        SplitError::DuplicateSection {
            name,
            first,
            second,
        } => {
            assert_eq!(name, "31-Safety");
            assert_eq!((first, second), (0, 2));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn names_equal_after_normalization_collide() {
    // "é" precomposed vs "e" + combining acute.
    let err = SectionTable::new(
        None,
        vec![
            SectionSpec::new("caf\u{e9}", 1, EndPage::Page(2)),
            SectionSpec::new("cafe\u{301}", 3, EndPage::Page(4)),
        ],
    )
    .unwrap_err();
    assert!(matches!(err, SplitError::DuplicateSection { .. }));
}

#[test]
fn path_like_names_are_rejected() {
    for bad in ["", "..", "a/b", "a\\b"] {
        let err =
            SectionTable::new(None, vec![SectionSpec::new(bad, 1, EndPage::ToEnd)]).unwrap_err();
        assert!(
            matches!(err, SplitError::InvalidSection { index: 0, .. }),
            "{bad:?} was accepted"
        );
    }
}

#[test]
fn zero_start_page_is_rejected() {
    let err =
        SectionTable::new(None, vec![SectionSpec::new("a", 0, EndPage::Page(5))]).unwrap_err();
    assert!(matches!(err, SplitError::InvalidSection { .. }));
}

#[test]
fn overlapping_ranges_are_accepted() {
    let table = SectionTable::new(
        None,
        vec![
            SectionSpec::new("27-Painting_Equipment", 261, EndPage::Page(273)),
            SectionSpec::new("31-Safety_Protective_Gear", 272, EndPage::Page(298)),
        ],
    )
    .unwrap();
    assert_eq!(table.len(), 2);
}

#[test]
fn json_table_with_to_end_sentinel() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blocks.json");
    std::fs::write(
        &path,
        r#"{
            "label": "by_page_blocks",
            "sections": [
                {"name": "09-Blocks", "start_page": 1401, "end_page": 1600, "description": "tail"},
                {"name": "10-Rest", "start_page": 1601, "end_page": -1}
            ]
        }"#,
    )
    .unwrap();

    let table = SectionTable::from_file(SectionFile::load(&path).unwrap()).unwrap();
    assert_eq!(table.label.as_deref(), Some("by_page_blocks"));
    assert_eq!(table.sections()[1].end_page, EndPage::ToEnd);
    assert_eq!(table.sections()[0].description.as_deref(), Some("tail"));
}

#[test]
fn bundled_tables_load() {
    let blocks: SectionFile =
        serde_json::from_str(include_str!("../tables/page-blocks.json")).unwrap();
    let blocks = SectionTable::from_file(blocks).unwrap();
    assert_eq!(blocks.sections().last().unwrap().end_page, EndPage::ToEnd);

    let structure: SectionFile =
        toml::from_str(include_str!("../tables/improved-structure.toml")).unwrap();
    let structure = SectionTable::from_file(structure).unwrap();
    assert!(structure.sections().iter().all(|s| s.category.is_some()));
}
