// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const TEMPLATE: &str = "<!doctype html>\n<script>\nlet nodePort = 0;\nlet fileName = \"help\";\n</script>\n";

fn write_template(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("editor.html");
    fs::write(&path, TEMPLATE).unwrap();
    path
}

fn deploy() -> Command {
    Command::cargo_bin("quill-deploy").unwrap()
}

#[test]
fn deploy_provisions_a_complete_instance() {
    let dir = tempfile::tempdir().unwrap();
    let template = write_template(&dir);
    let target = dir.path().join("instance");

    deploy()
        .arg(&target)
        .arg("notes")
        .arg("3001")
        .arg("--template")
        .arg(&template)
        .assert()
        .success()
        .stdout(predicate::str::contains("deployment complete"));

    let document = fs::read_to_string(target.join("notes.html")).unwrap();
    assert!(document.contains("let nodePort = 3001;"));
    assert!(document.contains("let fileName = \"notes\";"));

    let config: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(target.join("svr_notes.json")).unwrap()).unwrap();
    assert_eq!(config["document"], "notes.html");
    assert_eq!(config["backup_dir"], "backups");
    assert_eq!(config["listen"], "127.0.0.1:3001");
    assert_eq!(config["retention"]["max_count"], 200);
    assert_eq!(config["retention"]["max_age_days"], 0);

    assert!(target.join("backups").is_dir());
}

#[test]
fn rejects_a_port_outside_the_valid_range() {
    let dir = tempfile::tempdir().unwrap();
    let template = write_template(&dir);

    for port in ["0", "70000", "not-a-port"] {
        deploy()
            .arg(dir.path().join("instance"))
            .arg("notes")
            .arg(port)
            .arg("--template")
            .arg(&template)
            .assert()
            .failure()
            .stderr(predicate::str::contains("invalid value"));
    }
}

#[test]
fn rejects_a_document_name_outside_the_identifier_set() {
    let dir = tempfile::tempdir().unwrap();
    let template = write_template(&dir);

    deploy()
        .arg(dir.path().join("instance"))
        .arg("bad.name")
        .arg("3001")
        .arg("--template")
        .arg(&template)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid document name"));
}

#[test]
fn missing_arguments_exit_nonzero_with_usage() {
    deploy()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn missing_template_is_a_descriptive_error() {
    let dir = tempfile::tempdir().unwrap();

    deploy()
        .arg(dir.path().join("instance"))
        .arg("notes")
        .arg("3001")
        .arg("--template")
        .arg(dir.path().join("nope.html"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("read template"));
}

#[test]
fn deploying_twice_overwrites_the_instance_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let template = write_template(&dir);
    let target = dir.path().join("instance");

    for port in ["3001", "3002"] {
        deploy()
            .arg(&target)
            .arg("notes")
            .arg(port)
            .arg("--template")
            .arg(&template)
            .assert()
            .success();
    }

    let config: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(target.join("svr_notes.json")).unwrap()).unwrap();
    assert_eq!(config["listen"], "127.0.0.1:3002");
}
