//! Integration tests for the vulnrep-converter binary.
//!
//! These tests write report files into a temporary directory and run the
//! full executable against them.

mod common;

use assert_cmd::prelude::*;
use common::{RICH_XML, minimal_json, minimal_xml};
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

fn get_cmd() -> Command {
    Command::cargo_bin("vulnrep-converter").unwrap()
}

#[test]
fn test_xml_to_stdout_defaults_to_json() {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("advisory.xml");
    fs::write(&input_path, minimal_xml("CSAFPID-1")).unwrap();

    let output = get_cmd().arg("--input").arg(&input_path).output().unwrap();
    assert!(output.status.success());

    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        json["vulnerabilities"][0]["product_status"][0]["product_ids"][0],
        "CSAFPID-1"
    );
}

#[test]
fn test_json_to_xml_file() {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("advisory.json");
    let output_path = dir.path().join("advisory.xml");
    fs::write(&input_path, minimal_json("CSAFPID-1")).unwrap();

    get_cmd()
        .arg("-i")
        .arg(&input_path)
        .arg("-o")
        .arg(&output_path)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let xml = fs::read_to_string(&output_path).unwrap();
    assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
    assert!(xml.contains("<vuln:CVE>CVE-2021-0001</vuln:CVE>"));
}

#[test]
fn test_xml_file_round_trip_through_cli() {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("rich.xml");
    let output_path = dir.path().join("copy.xml");
    fs::write(&input_path, RICH_XML).unwrap();

    get_cmd()
        .arg("--input")
        .arg(&input_path)
        .arg("--output")
        .arg(&output_path)
        .assert()
        .success();

    assert_eq!(fs::read_to_string(&output_path).unwrap(), RICH_XML);
}

#[test]
fn test_explicit_formats_override_extensions() {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("advisory.txt");
    let output_path = dir.path().join("advisory.out");
    fs::write(&input_path, minimal_xml("CSAFPID-1")).unwrap();

    get_cmd()
        .arg("--input")
        .arg(&input_path)
        .arg("--output")
        .arg(&output_path)
        .args(["--from", "xml", "--to", "xml"])
        .assert()
        .success();

    assert!(fs::read_to_string(&output_path).unwrap().contains("<cvrfdoc"));
}

#[test]
fn test_dangling_reference_fails_without_output_file() {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("advisory.json");
    let output_path = dir.path().join("advisory.xml");
    fs::write(&input_path, minimal_json("CSAFPID-9999")).unwrap();

    get_cmd()
        .arg("--input")
        .arg(&input_path)
        .arg("--output")
        .arg(&output_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("CSAFPID-9999"));

    assert!(!output_path.exists());
}

#[test]
fn test_unsupported_input_extension() {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("advisory.txt");
    fs::write(&input_path, minimal_json("CSAFPID-1")).unwrap();

    get_cmd()
        .arg("--input")
        .arg(&input_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported file format"));
}

#[test]
fn test_validate_flag_rejects_schema_violation() {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("advisory.json");
    let bad = minimal_json("CSAFPID-1").replace(r#""status":"final""#, r#""status":"published""#);
    fs::write(&input_path, bad).unwrap();

    get_cmd()
        .arg("--input")
        .arg(&input_path)
        .arg("--validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Schema"));
}

#[test]
fn test_validate_flag_accepts_valid_json() {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("advisory.json");
    fs::write(&input_path, minimal_json("CSAFPID-1")).unwrap();

    get_cmd()
        .arg("--input")
        .arg(&input_path)
        .arg("--validate")
        .assert()
        .success();
}

#[test]
fn test_check_reports_issues() {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("advisory.xml");
    fs::write(&input_path, minimal_xml("CSAFPID-9999")).unwrap();

    get_cmd()
        .arg("--input")
        .arg(&input_path)
        .arg("--check")
        .assert()
        .failure()
        .stdout(predicate::str::contains("CSAFPID-9999"));
}

#[test]
fn test_check_passes_clean_document() {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("advisory.xml");
    fs::write(&input_path, RICH_XML).unwrap();

    get_cmd()
        .arg("--input")
        .arg(&input_path)
        .arg("--check")
        .assert()
        .success()
        .stdout(predicate::str::contains("No issues found"));
}

#[test]
fn test_file_not_found() {
    get_cmd()
        .arg("--input")
        .arg("nonexistent-file.json")
        .assert()
        .failure();
}
