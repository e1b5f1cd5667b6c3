use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn sfxml() -> Command {
    let mut cmd = Command::cargo_bin("sfxml").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_parse_prints_json() {
    sfxml()
        .arg("parse")
        .write_stdin("<a><b>1</b><b>2</b><c xsi:nil=\"true\"/></a>")
        .assert()
        .success()
        .stdout(r#"{"name":"a","attributes":"","value":{"b":["1","2"],"c":null}}"#.to_string() + "\n");
}

#[test]
fn test_parse_typed_value() {
    sfxml()
        .arg("parse")
        .write_stdin("<r><v xsi:type=\"xsd:int\">5</v></r>")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""v":{"$type":"xsd:int","$text":"5"}"#));
}

#[test]
fn test_parse_reports_errors() {
    sfxml()
        .arg("parse")
        .write_stdin("<a><b></a>")
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected </b>"));
}

#[test]
fn test_parse_empty_stdin() {
    sfxml()
        .arg("parse")
        .write_stdin("  \n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no input provided on stdin"));
}

#[test]
fn test_stringify_writes_xml() {
    sfxml()
        .arg("stringify")
        .write_stdin(r#"{"name":"p","attributes":" xmlns=\"urn:x\"","value":{"a":["1",null],"b":"x&y"}}"#)
        .assert()
        .success()
        .stdout(concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>",
            "<p xmlns=\"urn:x\"><a>1</a><a xsi:nil=\"true\"/><b>x&amp;y</b></p>\n",
        ));
}

#[test]
fn test_stringify_rejects_non_element() {
    sfxml()
        .arg("stringify")
        .write_stdin("[1, 2]")
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not a JSON element"));
}

#[test]
fn test_parse_to_output_file() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("package.xml");
    let output = dir.path().join("package.json");
    fs::write(&input, "<Package><version>59.0</version></Package>").unwrap();

    sfxml()
        .arg("parse")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .success()
        .stdout("");

    let json = fs::read_to_string(&output).unwrap();
    assert!(json.contains(r#""version":"59.0""#));
}

#[test]
fn test_check_walks_directory() {
    let dir = tempdir().unwrap();
    let classes = dir.path().join("classes");
    fs::create_dir(&classes).unwrap();
    fs::write(
        dir.path().join("package.xml"),
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Package>\n    <version>59.0</version>\n</Package>\n",
    )
    .unwrap();
    fs::write(classes.join("Foo.cls"), "public class Foo {}").unwrap();
    fs::write(
        classes.join("Foo.cls-meta.xml"),
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<ApexClass>\n    <status>Active</status>\n</ApexClass>\n",
    )
    .unwrap();
    fs::write(dir.path().join("script.js"), "let x = 1 < 2;").unwrap();

    sfxml()
        .arg("check")
        .arg(dir.path())
        .assert()
        .success()
        .stdout("2 passed, 0 failed, 2 skipped\n");
}

#[test]
fn test_check_reports_failures() {
    let dir = tempdir().unwrap();
    let bad = dir.path().join("bad.xml");
    fs::write(&bad, "<a>it's</a>").unwrap();
    fs::write(dir.path().join("broken.xml"), "<a><b></a>").unwrap();

    sfxml()
        .arg("check")
        .arg(dir.path())
        .assert()
        .failure()
        .stdout("0 passed, 2 failed, 0 skipped\n")
        .stderr(predicate::str::contains("bad.xml"))
        .stderr(predicate::str::contains("round trip mismatch"));
}

#[test]
fn test_check_requires_paths() {
    sfxml().arg("check").assert().failure();
}
