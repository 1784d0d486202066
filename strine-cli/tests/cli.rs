use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn translates_a_file_to_a_file() {
    let dir = tempdir().expect("tempdir");
    let input_path = dir.path().join("input.strine");
    fs::write(&input_path, "crikey! 2 plus 3").expect("write input");
    let output_path = dir.path().join("out.js");

    Command::cargo_bin("strine-cli")
        .expect("binary exists")
        .arg("--input")
        .arg(&input_path)
        .arg("--output")
        .arg(&output_path)
        .assert()
        .success();

    let code = fs::read_to_string(&output_path).expect("read output");
    assert_eq!(code, "console.log((2 + 3));");
}

#[test]
fn reads_stdin_and_writes_stdout() {
    Command::cargo_bin("strine-cli")
        .expect("binary exists")
        .write_stdin("crikey! 1")
        .assert()
        .success()
        .stdout(predicate::str::contains("console.log(1);"));
}

#[test]
fn module_style_flag_switches_import_emission() {
    Command::cargo_bin("strine-cli")
        .expect("binary exists")
        .arg("--module-style")
        .arg("import")
        .write_stdin("chuck in readFileSync from fs.")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "import { readFileSync } from \"fs\";",
        ));
}

#[test]
fn parse_error_shows_the_offending_line() {
    Command::cargo_bin("strine-cli")
        .expect("binary exists")
        .write_stdin("crikey! ,")
        .assert()
        .failure()
        .stderr(predicate::str::contains("parse error at line 1"))
        .stderr(predicate::str::contains("crikey! ,"))
        .stderr(predicate::str::contains("^"));
}

#[test]
fn malformed_dedent_is_reported_as_a_lex_error() {
    Command::cargo_bin("strine-cli")
        .expect("binary exists")
        .write_stdin("til x.\n        crikey! 1\n    crikey! 2")
        .assert()
        .failure()
        .stderr(predicate::str::contains("lex error at line 3"));
}

#[test]
fn ambiguity_warning_goes_to_stderr_not_stdout() {
    Command::cargo_bin("strine-cli")
        .expect("binary exists")
        .write_stdin("x is empty")
        .assert()
        .success()
        .stdout(predicate::str::contains("x = [];"))
        .stdout(predicate::str::contains("ambiguous").not())
        .stderr(predicate::str::contains("warning: ambiguous parse"));
}
