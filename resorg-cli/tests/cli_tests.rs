use std::fs;
use std::path::Path;

use assert_cmd::Command;
use tempfile::TempDir;

fn resorg() -> Command {
    Command::cargo_bin("resorg").unwrap()
}

fn write_tree(root: &Path) {
    fs::create_dir_all(root.join("Forms")).unwrap();
    fs::write(
        root.join("Forms/Main.resx"),
        r#"<root>
  <data name="OkButton"><value>OK</value></data>
  <data name="CancelButton"><value>Cancel</value></data>
</root>"#,
    )
    .unwrap();
    fs::write(
        root.join("Forms/Main.fr.resx"),
        r#"<root><data name="OkButton"><value>Valider</value></data></root>"#,
    )
    .unwrap();
}

#[test]
fn add_creates_store_and_view_summarizes_it() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("src");
    write_tree(&source);
    let db = dir.path().join("resources.db");

    resorg()
        .args(["add", "--db"])
        .arg(&db)
        .arg(&source)
        .assert()
        .success();
    assert!(db.exists());

    let output = resorg()
        .args(["view", "--db"])
        .arg(&db)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let output = String::from_utf8(output).unwrap();
    assert!(output.contains("Forms/Main.resx: 2 entries (fr)"));
    assert!(output.contains("1 files, 2 distinct resources"));
}

#[test]
fn add_is_idempotent_across_invocations() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("src");
    write_tree(&source);
    let db = dir.path().join("resources.db");

    for _ in 0..2 {
        resorg()
            .args(["add", "--db"])
            .arg(&db)
            .arg(&source)
            .assert()
            .success();
    }

    let output = resorg()
        .args(["view", "--db"])
        .arg(&db)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let output = String::from_utf8(output).unwrap();
    assert!(output.contains("2 distinct resources"));
}

#[test]
fn subtract_removes_covered_files() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("src");
    write_tree(&source);
    let db = dir.path().join("resources.db");

    resorg()
        .args(["add", "--db"])
        .arg(&db)
        .arg(&source)
        .assert()
        .success();
    resorg()
        .args(["subtract", "--db"])
        .arg(&db)
        .arg(&source)
        .assert()
        .success();

    let output = resorg()
        .args(["view", "--db"])
        .arg(&db)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let output = String::from_utf8(output).unwrap();
    assert!(output.contains("0 files, 0 distinct resources"));
}

#[test]
fn subtract_requires_an_existing_store() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("src");
    write_tree(&source);
    let db = dir.path().join("missing.db");

    resorg()
        .args(["subtract", "--db"])
        .arg(&db)
        .arg(&source)
        .assert()
        .failure();
    assert!(!db.exists());
}

#[test]
fn export_writes_an_archive() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("src");
    write_tree(&source);
    let db = dir.path().join("resources.db");
    let zip = dir.path().join("out.zip");

    resorg()
        .args(["add", "--db"])
        .arg(&db)
        .arg(&source)
        .assert()
        .success();
    resorg()
        .args(["export", "--db"])
        .arg(&db)
        .arg("--output")
        .arg(&zip)
        .assert()
        .success();
    assert!(zip.exists());
}

#[test]
fn view_keys_lists_sorted_invariant_keys() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("src");
    write_tree(&source);
    let db = dir.path().join("resources.db");

    resorg()
        .args(["add", "--db"])
        .arg(&db)
        .arg(&source)
        .assert()
        .success();

    let output = resorg()
        .args(["view", "--keys", "--db"])
        .arg(&db)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let output = String::from_utf8(output).unwrap();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("Name:CancelButton"));
    assert!(lines[1].starts_with("Name:OkButton"));
}
