//! Command-line driver.

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use indoc::indoc;
use predicates::prelude::*;
use tempfile::TempDir;

fn write_source(dir: &TempDir, name: &str, src: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, src).expect("write source");
    path
}

fn lazyc() -> Command {
    Command::cargo_bin("lazyc").expect("binary built")
}

const DOUBLE: &str = indoc! {"
    f x = x * 2
    main = show (f 3)
"};

#[test]
fn run_prints_program_output() {
    let dir = TempDir::new().unwrap();
    let input = write_source(&dir, "double.hs", DOUBLE);
    lazyc()
        .arg(&input)
        .args(["--emit", "run"])
        .assert()
        .success()
        .stdout("6\n");
}

#[test]
fn c_is_the_default_output() {
    let dir = TempDir::new().unwrap();
    let input = write_source(&dir, "double.hs", DOUBLE);
    lazyc()
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("int main(void)").and(predicate::str::contains("lz_fn_f")));
}

#[test]
fn output_file_receives_core_ir() {
    let dir = TempDir::new().unwrap();
    let input = write_source(&dir, "double.hs", DOUBLE);
    let out = dir.path().join("double.core");
    lazyc()
        .arg(&input)
        .args(["--emit", "core", "-o"])
        .arg(&out)
        .assert()
        .success()
        .stdout("");
    let text = fs::read_to_string(&out).unwrap();
    assert!(text.starts_with("-- core module: Main"));
    assert!(text.contains("f = LAMBDA (x) {"));
}

#[test]
fn core_json_is_valid_json() {
    let dir = TempDir::new().unwrap();
    let input = write_source(&dir, "double.hs", DOUBLE);
    let assert = lazyc().arg(&input).args(["--emit", "core-json"]).assert().success();
    let json: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(json["entry"], "main");
}

#[test]
fn errors_render_with_location_and_code() {
    let dir = TempDir::new().unwrap();
    let input = write_source(&dir, "bad.hs", "main = x + 1\n");
    lazyc()
        .arg(&input)
        .assert()
        .code(1)
        .stderr(
            predicate::str::contains("error[E0100]")
                .and(predicate::str::contains("cannot find 'x'"))
                .and(predicate::str::contains("--> 1:8")),
        );
}

#[test]
fn runtime_errors_fail_the_run() {
    let dir = TempDir::new().unwrap();
    let input = write_source(&dir, "div.hs", "main = 1 `div` 0\n");
    lazyc()
        .arg(&input)
        .args(["--emit", "run"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("division by zero"));
}

#[test]
fn depth_flag_limits_recursion() {
    let dir = TempDir::new().unwrap();
    let input = write_source(&dir, "loop.hs", "loop x = loop x\nmain = loop 0\n");
    lazyc()
        .arg(&input)
        .args(["--emit", "run", "--max-depth", "50"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("call depth exceeded 50"));
}

#[test]
fn strict_operators_reject_operators_outside_the_prelude() {
    let dir = TempDir::new().unwrap();
    let input = write_source(&dir, "lt.hs", "main = show (1 < 2)\n");
    lazyc()
        .arg(&input)
        .args(["--emit", "run"])
        .assert()
        .success()
        .stdout("1\n");
    lazyc()
        .arg(&input)
        .args(["--emit", "run", "--strict-operators"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error[E0100]").and(predicate::str::contains("'<'")));
}

#[test]
fn missing_input_file() {
    lazyc()
        .arg("does-not-exist.hs")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("cannot read"));
}

#[test]
fn unknown_emit_kind_is_a_usage_error() {
    lazyc()
        .args(["x.hs", "--emit", "llvm"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}
