use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

const INCREMENT: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<expression>
  <lambda type="Func&lt;int32, int32&gt;">
    <parameters>
      <parameter-definition id="P1" name="x" type="int32"/>
    </parameters>
    <body>
      <add type="int32">
        <parameter-reference idref="P1"/>
        <int>1</int>
      </add>
    </body>
  </lambda>
</expression>
"#;

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn inspect_prints_outline() {
    let dir = tempdir().unwrap();
    let input = write(dir.path(), "increment.xml", INCREMENT);

    cargo_bin_cmd!("exprx")
        .arg("inspect")
        .arg(input.as_os_str())
        .assert()
        .success()
        .stdout(predicate::str::contains("Lambda: Func<int32, int32> (x)"))
        .stdout(predicate::str::contains("    Parameter: int32 x"));
}

#[test]
fn validate_accepts_encoder_output() {
    let dir = tempdir().unwrap();
    let input = write(dir.path(), "increment.xml", INCREMENT);

    cargo_bin_cmd!("exprx")
        .arg("validate")
        .arg(input.as_os_str())
        .assert()
        .success()
        .stdout(predicate::str::ends_with("ok\n"));
}

#[test]
fn validate_reports_every_schema_error() {
    let dir = tempdir().unwrap();
    let broken = INCREMENT
        .replace(r#"<add type="int32">"#, "<add>")
        .replace("<int>1</int>", "<mystery/>");
    let input = write(dir.path(), "broken.xml", &broken);

    cargo_bin_cmd!("exprx")
        .arg("validate")
        .arg(input.as_os_str())
        .assert()
        .failure()
        .stdout(predicate::str::contains("/expression/lambda/body/add"))
        .stdout(predicate::str::contains("/expression/lambda/body/add/mystery"))
        .stderr(predicate::str::contains("2 schema error(s)"));
}

#[test]
fn validate_reports_dangling_reference() {
    let dir = tempdir().unwrap();
    let dangling = INCREMENT.replace(r#"idref="P1""#, r#"idref="P9""#);
    let input = write(dir.path(), "dangling.xml", &dangling);

    cargo_bin_cmd!("exprx")
        .arg("validate")
        .arg(input.as_os_str())
        .assert()
        .failure()
        .stdout(predicate::str::contains("P9"));
}

#[test]
fn roundtrip_reproduces_document() {
    let dir = tempdir().unwrap();
    let input = write(dir.path(), "increment.xml", INCREMENT);

    let output = cargo_bin_cmd!("exprx")
        .arg("roundtrip")
        .arg(input.as_os_str())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert_eq!(String::from_utf8(output).unwrap(), INCREMENT);
}

#[test]
fn roundtrip_respects_config() {
    let dir = tempdir().unwrap();
    let input = write(dir.path(), "increment.xml", INCREMENT);
    let config = write(
        dir.path(),
        "exprx.toml",
        "[output]\nindent = \"\"\nxml_declaration = false\n",
    );

    cargo_bin_cmd!("exprx")
        .arg("roundtrip")
        .arg(input.as_os_str())
        .arg("--config")
        .arg(config.as_os_str())
        .assert()
        .success()
        .stdout(predicate::str::starts_with("<expression><lambda"));
}

#[test]
fn convert_to_json_and_back() {
    let dir = tempdir().unwrap();
    let input = write(dir.path(), "increment.xml", INCREMENT);
    let json = dir.path().join("increment.json");
    let xml = dir.path().join("back.xml");

    cargo_bin_cmd!("exprx")
        .arg("convert")
        .arg(input.as_os_str())
        .arg("--to")
        .arg("json")
        .arg("-o")
        .arg(json.as_os_str())
        .assert()
        .success();
    let written = fs::read_to_string(&json).unwrap();
    assert!(written.contains("\"parameter-definition\""));

    cargo_bin_cmd!("exprx")
        .arg("convert")
        .arg(json.as_os_str())
        .arg("--to")
        .arg("xml")
        .arg("-o")
        .arg(xml.as_os_str())
        .assert()
        .success();
    assert_eq!(fs::read_to_string(&xml).unwrap(), INCREMENT);
}

#[test]
fn convert_needs_known_extension() {
    let dir = tempdir().unwrap();
    let input = write(dir.path(), "increment.txt", INCREMENT);

    cargo_bin_cmd!("exprx")
        .arg("convert")
        .arg(input.as_os_str())
        .arg("--to")
        .arg("json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not detect format"));

    cargo_bin_cmd!("exprx")
        .arg("convert")
        .arg(input.as_os_str())
        .arg("--from")
        .arg("xml")
        .arg("--to")
        .arg("json")
        .assert()
        .success();
}
