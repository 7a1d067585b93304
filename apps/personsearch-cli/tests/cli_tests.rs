use std::fs;
use tempfile::TempDir;

use personsearch_cli::{configured_path, json_files, load_people};
use personsearch_core::config::Config;

#[test]
fn collects_json_records_recursively() {
    let tmp = TempDir::new().expect("tmp");
    let nested = tmp.path().join("clinic/a");
    fs::create_dir_all(&nested).expect("mkdir");
    fs::write(tmp.path().join("one.json"), r#"[{"person_id": 1}]"#).expect("write");
    fs::write(nested.join("two.json"), r#"[{"person_id": 2}, {"person_id": 3}]"#).expect("write");
    fs::write(nested.join("notes.txt"), "ignored").expect("write");

    assert_eq!(json_files(tmp.path()).len(), 2);
    let mut ids: Vec<u64> = load_people(tmp.path()).expect("load").iter().map(|p| p.person_id).collect();
    ids.sort();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(json_files(&tmp.path().join("one.json")).len(), 1);
}

#[test]
fn malformed_file_names_the_path() {
    let tmp = TempDir::new().expect("tmp");
    fs::write(tmp.path().join("bad.json"), "{not json").expect("write");
    let err = load_people(tmp.path()).expect_err("parse error");
    assert!(err.to_string().contains("bad.json"));
}

#[test]
fn cli_path_overrides_config() {
    let config = Config::from_toml_str("[data]\nindex_dir = \"/srv/people-index\"\n");
    let from_config = configured_path(&config, None, "data.index_dir", "unused").expect("path");
    assert_eq!(from_config, std::path::PathBuf::from("/srv/people-index"));
    let explicit = configured_path(&config, Some("/tmp/x".into()), "data.index_dir", "unused").expect("path");
    assert_eq!(explicit, std::path::PathBuf::from("/tmp/x"));
}
