use std::fs;

use df_column_lint::ProjectConfig;
use tempfile::tempdir;

#[test]
fn loads_a_toml_file_with_partial_overrides() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("df-column-lint.toml");
    fs::write(
        &path,
        r#"
paths = ["src"]
exclude = ["**/migrations/**"]
output_format = "json"
color = false

[engine]
strict-ingest = true
"#,
    )
    .unwrap();

    let config = ProjectConfig::load(&path).unwrap();
    assert_eq!(config.paths, vec![std::path::PathBuf::from("src")]);
    assert!(config.engine.strict_ingest);
    assert!(config.engine.enabled);
    assert!(!config.color);
}

#[test]
fn rejects_config_with_empty_exclude_pattern() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("df-column-lint.toml");
    fs::write(&path, "exclude = [\"\"]\n").unwrap();

    assert!(ProjectConfig::load(&path).is_err());
}

#[test]
fn missing_file_is_a_read_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nope.toml");
    assert!(ProjectConfig::load(&path).is_err());
}
