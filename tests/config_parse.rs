use catalog_split::{
    config::{Config, HashMode},
    section::SectionTable,
};

#[test]
fn parse_example_config() {
    let raw = include_str!("../catalog-split.example.toml");
    let cfg: Config = toml::from_str(raw).expect("parse TOML");
    assert!(!cfg.paths.out_dir.is_empty());
    assert_eq!(cfg.limits.warn_output_bytes, 50 * 1024 * 1024);
    assert_eq!(cfg.table.label.as_deref(), Some("accurate_by_user_specification"));

    let table = SectionTable::new(cfg.table.label.clone(), cfg.table.sections.clone()).unwrap();
    assert_eq!(table.len(), 34);
    assert_eq!(table.sections()[0].name, "15-Cloth_Linen_Products");
}

#[test]
fn empty_config_uses_defaults() {
    let cfg: Config = toml::from_str("").unwrap();
    assert_eq!(cfg.output.extension, "pdf");
    assert_eq!(cfg.output.manifest_filename, "split-info.json");
    assert!(cfg.security.reject_url_inputs);
    assert!(cfg.table.sections.is_empty());
}

#[test]
fn unknown_hashing_mode_fails_at_parse() {
    let err = toml::from_str::<Config>("[hashing]\nmode = \"md5\"\nfast_window_bytes = 16\n")
        .unwrap_err();
    assert!(err.to_string().contains("md5"), "{err}");

    let cfg: Config =
        toml::from_str("[hashing]\nmode = \"full_sha256\"\nfast_window_bytes = 16\n").unwrap();
    assert_eq!(cfg.hashing.mode, HashMode::FullSha256);
}
