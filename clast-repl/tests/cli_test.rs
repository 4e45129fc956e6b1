use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn write_source(dir: &TempDir, name: &str, source: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, source).unwrap();

    path.to_string_lossy().into_owned()
}

#[test]
fn prints_forms_from_a_file() {
    let dir = TempDir::new().unwrap();
    let path = write_source(&dir, "core.clj", "(ns core)\n(defn inc? [x] (+ x 1))\n");

    Command::cargo_bin("clast-repl")
        .unwrap()
        .arg(&path)
        .assert()
        .success()
        .stdout("(ns core)\n(defn inc_QMARK_ [x] (_PLUS_ x 1))\n");
}

#[test]
fn reads_stdin_with_a_dash() {
    Command::cargo_bin("clast-repl")
        .unwrap()
        .arg("-")
        .write_stdin("#(+ % 2)")
        .assert()
        .success()
        .stdout("(fn [_PERCENT_1] (_PLUS_ _PERCENT_1 2))\n");
}

#[test]
fn prints_json() {
    Command::cargo_bin("clast-repl")
        .unwrap()
        .args(&["--format", "json", "-"])
        .write_stdin(":a")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"kind\": \"keyword\""))
        .stdout(predicate::str::contains("\"raw\": \"\\\"a\\\"\""));
}

#[test]
fn prints_tokens() {
    Command::cargo_bin("clast-repl")
        .unwrap()
        .args(&["--tokens", "-"])
        .write_stdin("(a)")
        .assert()
        .success()
        .stdout("open-paren@1:1\nsymbol@1:2 \"a\"\nclose-delimiter@1:3 \")\"\n");
}

#[test]
fn fails_on_malformed_input() {
    let dir = TempDir::new().unwrap();
    let path = write_source(&dir, "broken.clj", "(defn broken [x]");

    Command::cargo_bin("clast-repl")
        .unwrap()
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unclosed delimiter \"(\"."));
}

#[test]
fn reports_missing_files() {
    Command::cargo_bin("clast-repl")
        .unwrap()
        .arg("does-not-exist.clj")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read does-not-exist.clj"));
}
