//! End-to-end scenarios driven through the public pipeline entry point,
//! one per documented behavior.

use std::fs;
use std::path::PathBuf;

use df_column_lint::{run, DiagnosticCode, ProjectConfig, Severity};
use tempfile::tempdir;

fn write(dir: &std::path::Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn inferred_load_plus_typo_reports_single_e001() {
    let dir = tempdir().unwrap();
    write(
        dir.path(),
        "u.py",
        "df = read_csv(\"u.csv\", usecols=[\"user_id\",\"email\"])\ndf[\"age\"]\n",
    );

    let outcome = run(&[dir.path().to_path_buf()], &ProjectConfig::default());
    assert_eq!(outcome.diagnostics.len(), 1);
    assert_eq!(outcome.diagnostics[0].code, DiagnosticCode::E001);
    assert_eq!(outcome.diagnostics[0].line, 2);
    assert!(outcome.diagnostics[0].message.contains("age"));
}

#[test]
fn typo_with_suggestion_names_the_closest_column() {
    let dir = tempdir().unwrap();
    write(dir.path(), "u.py", "df = read_csv(\"u.csv\", usecols=[\"revenue\"])\ndf[\"revnue\"]\n");

    let outcome = run(&[dir.path().to_path_buf()], &ProjectConfig::default());
    assert_eq!(outcome.diagnostics.len(), 1);
    assert_eq!(outcome.diagnostics[0].code, DiagnosticCode::E001);
    assert!(outcome.diagnostics[0].message.contains("revenue"));
}

#[test]
fn rename_ledger_hit_reports_e002_with_new_name() {
    let dir = tempdir().unwrap();
    write(
        dir.path(),
        "u.py",
        "df = read_csv(\"u.csv\", usecols=[\"email\"])\nrenamed = df.rename(columns={\"email\": \"email_address\"})\nrenamed[\"email\"]\n",
    );

    let outcome = run(&[dir.path().to_path_buf()], &ProjectConfig::default());
    assert_eq!(outcome.diagnostics.len(), 1);
    assert_eq!(outcome.diagnostics[0].code, DiagnosticCode::E002);
    assert!(outcome.diagnostics[0].message.contains("email_address"));
}

#[test]
fn cross_file_resolution_with_index_flags_unknown_column() {
    let dir = tempdir().unwrap();
    write(dir.path(), "s.py", "S = Schema(\"S\", [Column(\"a\", \"int\", False), Column(\"b\", \"str\", False)])\n");
    write(dir.path(), "l.py", "from s import S\ndef load() -> DF[S]:\n    return read_csv(\"u.csv\")\n");
    write(dir.path(), "p.py", "from l import load\nx = load()\nx[\"c\"]\n");

    let outcome = run(&[dir.path().to_path_buf()], &ProjectConfig::default());
    let p_diags: Vec<_> = outcome
        .diagnostics
        .iter()
        .filter(|d| d.path.file_name().unwrap() == "p.py")
        .collect();
    assert_eq!(p_diags.len(), 1);
    assert_eq!(p_diags[0].code, DiagnosticCode::E001);
}

#[test]
fn cross_file_resolution_without_index_is_silent() {
    let dir = tempdir().unwrap();
    write(dir.path(), "s.py", "S = Schema(\"S\", [Column(\"a\", \"int\", False), Column(\"b\", \"str\", False)])\n");
    write(dir.path(), "l.py", "from s import S\ndef load() -> DF[S]:\n    return read_csv(\"u.csv\")\n");
    write(dir.path(), "p.py", "from l import load\nx = load()\nx[\"c\"]\n");

    let mut config = ProjectConfig::default();
    config.engine.no_index = true;
    let outcome = run(&[dir.path().to_path_buf()], &config);
    let p_diags: Vec<_> = outcome
        .diagnostics
        .iter()
        .filter(|d| d.path.file_name().unwrap() == "p.py")
        .collect();
    assert!(p_diags.is_empty());
}

#[test]
fn drop_unknown_is_silent_without_strict_ingest_and_warns_with_it() {
    let dir = tempdir().unwrap();
    write(
        dir.path(),
        "u.py",
        "df = read_csv(\"u.csv\", usecols=[\"a\",\"b\"])\ndf.drop(columns=[\"nope\"])\n",
    );

    let lenient = run(&[dir.path().to_path_buf()], &ProjectConfig::default());
    assert!(lenient.diagnostics.iter().all(|d| d.code != DiagnosticCode::W002));

    let mut strict_config = ProjectConfig::default();
    strict_config.engine.strict_ingest = true;
    let strict = run(&[dir.path().to_path_buf()], &strict_config);
    assert_eq!(strict.diagnostics.len(), 1);
    assert_eq!(strict.diagnostics[0].code, DiagnosticCode::W002);
}

#[test]
fn untracked_pivot_result_is_a_full_escape_hatch() {
    let dir = tempdir().unwrap();
    write(
        dir.path(),
        "u.py",
        "df = read_csv(\"u.csv\", usecols=[\"a\"])\ny = df.pivot(index=\"a\", columns=\"b\", values=\"a\")\ny[\"anything\"]\n",
    );

    let outcome = run(&[dir.path().to_path_buf()], &ProjectConfig::default());
    assert!(outcome.diagnostics.is_empty());
}

#[test]
fn config_disabled_suppresses_everything() {
    let dir = tempdir().unwrap();
    write(dir.path(), "u.py", "df = read_csv(\"u.csv\", usecols=[\"a\"])\ndf[\"missing\"]\n");

    let mut config = ProjectConfig::default();
    config.engine.enabled = false;
    let outcome = run(&[dir.path().to_path_buf()], &config);
    assert!(outcome.diagnostics.is_empty());
}

#[test]
fn parse_error_in_one_file_does_not_abort_the_batch() {
    let dir = tempdir().unwrap();
    write(dir.path(), "bad.py", "x = \"unterminated\n");
    write(dir.path(), "good.py", "df = read_csv(\"u.csv\", usecols=[\"a\"])\ndf[\"missing\"]\n");

    let outcome = run(&[dir.path().to_path_buf()], &ProjectConfig::default());
    assert!(outcome.diagnostics.iter().any(|d| d.code == DiagnosticCode::ParseError));
    assert!(outcome.diagnostics.iter().any(|d| d.code == DiagnosticCode::E001));
}

#[test]
fn severity_taxonomy_has_exactly_two_levels() {
    let dir = tempdir().unwrap();
    write(dir.path(), "u.py", "df = read_csv(\"u.csv\")\n");
    let mut config = ProjectConfig::default();
    config.engine.strict_ingest = true;
    let outcome = run(&[dir.path().to_path_buf()], &config);
    for d in &outcome.diagnostics {
        assert!(d.severity == Severity::Error || d.severity == Severity::Warning);
    }
}
