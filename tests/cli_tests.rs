//! Integration tests for the knxrename CLI
//!
//! Each test copies the fixture export into a temporary directory and runs the
//! binary against it.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

/// Test helper to get the CLI binary
fn knxrename_cmd() -> Command {
    let mut cmd = Command::cargo_bin("knxrename").unwrap();
    cmd.env_remove("DEEPL_API_KEY").env_remove("RUST_LOG");
    cmd
}

fn fixture_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/export")
}

fn copy_dir(from: &Path, to: &Path) {
    fs::create_dir_all(to).unwrap();
    for entry in fs::read_dir(from).unwrap() {
        let entry = entry.unwrap();
        let target = to.join(entry.file_name());
        if entry.file_type().unwrap().is_dir() {
            copy_dir(&entry.path(), &target);
        } else {
            fs::copy(entry.path(), &target).unwrap();
        }
    }
}

#[test]
fn test_help_lists_subcommands() {
    knxrename_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("rename"))
        .stdout(predicate::str::contains("export-addresses"))
        .stdout(predicate::str::contains("print-default-config"));
}

#[test]
fn test_version_flag() {
    knxrename_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_print_default_config() {
    knxrename_cmd()
        .arg("print-default-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("remove_unused_addresses: false"))
        .stdout(predicate::str::contains("building_part: FacadeXx"))
        .stdout(predicate::str::contains("api_key_env: DEEPL_API_KEY"));
}

#[test]
fn test_init_and_validate_config() {
    let temp = tempdir().unwrap();
    let config = temp.path().join("knx.yml");

    knxrename_cmd()
        .args(["init-config", "--output"])
        .arg(&config)
        .assert()
        .success();
    assert!(config.exists());

    knxrename_cmd()
        .args(["init-config", "--output"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    knxrename_cmd()
        .args(["validate-config", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("valid"));
}

#[test]
fn test_validate_config_rejects_bad_values() {
    let temp = tempdir().unwrap();
    let config = temp.path().join("bad.yml");
    fs::write(&config, "output:\n  updated_suffix: _x\n  original_suffix: _x\n").unwrap();

    knxrename_cmd()
        .args(["validate-config", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("validation failed"));
}

#[test]
fn test_rename_export_directory() {
    let temp = tempdir().unwrap();
    copy_dir(&fixture_root(), temp.path());

    knxrename_cmd()
        .arg("rename")
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Rename complete"));

    let updated = fs::read_to_string(temp.path().join("P-0001/0_updated.xml")).unwrap();
    assert!(updated.contains("Cmd_Confort_Eclairage_Siege_FacadeXx_1erEtage_Bureau1"));
    assert!(!temp.path().join("P-0001/0_original.xml").exists());
}

#[test]
fn test_rename_json_report_with_pruning() {
    let temp = tempdir().unwrap();
    copy_dir(&fixture_root(), temp.path());
    let out = temp.path().join("out");

    let assert = knxrename_cmd()
        .arg("rename")
        .arg(temp.path().join("P-0001/0.xml"))
        .arg("--remove-unused")
        .arg("--json")
        .arg("--out")
        .arg(&out)
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["stats"]["renamed"], 6);
    assert_eq!(report["pruned"][0], "P-0001-0_GA-7");

    assert!(out.join("0_updated.xml").exists());
    let original = fs::read_to_string(out.join("0_original.xml")).unwrap();
    assert!(original.contains("Eclairage bureau"));
    assert!(!original.contains("P-0001-0_GA-7"));
}

#[test]
fn test_rename_french_summary() {
    let temp = tempdir().unwrap();
    copy_dir(&fixture_root(), temp.path());
    let config = temp.path().join("fr.yml");
    fs::write(&config, "ui:\n  language: fr\n").unwrap();

    knxrename_cmd()
        .arg("rename")
        .arg(temp.path())
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Renommage terminé"));
}

#[test]
fn test_translate_without_key_still_renames() {
    let temp = tempdir().unwrap();
    copy_dir(&fixture_root(), temp.path());

    knxrename_cmd()
        .arg("rename")
        .arg(temp.path())
        .arg("--translate")
        .assert()
        .success()
        .stdout(predicate::str::contains("no valid credential"));

    let updated = fs::read_to_string(temp.path().join("P-0001/0_updated.xml")).unwrap();
    assert!(updated.contains(r#"Name="Confort""#));
}

#[test]
fn test_rename_missing_project_fails() {
    let temp = tempdir().unwrap();
    knxrename_cmd()
        .arg("rename")
        .arg(temp.path().join("missing"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_export_addresses() {
    let temp = tempdir().unwrap();
    copy_dir(&fixture_root(), temp.path());
    let out = temp.path().join("addresses.xml");

    knxrename_cmd()
        .arg("export-addresses")
        .arg(temp.path().join("P-0001/0.xml"))
        .arg("--out")
        .arg(&out)
        .assert()
        .success();

    let exported = fs::read_to_string(&out).unwrap();
    assert!(exported.contains(r#"xmlns="http://knx.org/xml/ga-export/01""#));
    assert!(exported.contains(r#"Address="2/0/1""#));
    assert!(exported.contains(r#"DPTs="DPST-1-8""#));
}

#[test]
fn test_log_file_receives_output() {
    let temp = tempdir().unwrap();
    copy_dir(&fixture_root(), temp.path());
    let log = temp.path().join("run.log");

    knxrename_cmd()
        .arg("--log-file")
        .arg(&log)
        .arg("rename")
        .arg(temp.path())
        .assert()
        .success();

    let content = fs::read_to_string(&log).unwrap();
    assert!(content.contains("Rename completed"));
    assert!(!content.contains("\u{1b}["));
}
