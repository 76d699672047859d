use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;

fn m6800() -> Command {
    let mut cmd = Command::cargo_bin("m6800").unwrap();
    cmd.env_remove("M6800_TRACE").env_remove("M6800_CATALOG");
    cmd
}

fn temp_file(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("m6800_{}_{}", std::process::id(), name))
}

#[test]
fn runs_without_arguments() {
    m6800().assert().success().stdout(contains("m6800"));
}

#[test]
fn runs_basic_program() {
    let mut cmd = m6800();
    cmd.arg("run").arg("tests/files/basic.asm").arg("--minimal");

    cmd.assert()
        .success()
        .stdout(contains("Success"))
        .stdout(contains("Halted"))
        .stdout(contains("A 06\n"))
        .stdout(contains("PC 0016\n"));
}

#[test]
fn runs_bare_path() {
    m6800()
        .arg("tests/files/basic.asm")
        .assert()
        .success()
        .stdout(contains("Halted"));
}

#[test]
fn dumps_memory() {
    let mut cmd = m6800();
    cmd.arg("run")
        .arg("tests/files/basic.asm")
        .arg("--minimal")
        .arg("--dump")
        .arg("$0020")
        .arg("--lines")
        .arg("1");

    cmd.assert()
        .success()
        .stdout(contains("0020: 05 00 00"));
}

#[test]
fn stops_at_step_limit() {
    let mut cmd = m6800();
    cmd.arg("run")
        .arg("tests/files/loop.asm")
        .arg("--minimal")
        .arg("--steps")
        .arg("30");

    cmd.assert()
        .success()
        .stdout(contains("step limit of 30 reached at $0100"))
        .stdout(contains("A 0A\n"));
}

#[test]
fn forward_jump_runs_into_placeholder() {
    let mut cmd = m6800();
    cmd.arg("run").arg("tests/files/forward.asm").arg("--minimal");

    cmd.assert()
        .success()
        .stdout(contains("1 error found"))
        .stderr(contains("Unresolved symbol 'DONE'"))
        .stdout(contains("Unknown or unimplemented opcode $00 at PC $EEEE"));
}

#[test]
fn checks_file_with_errors() {
    let mut cmd = m6800();
    cmd.arg("check").arg("tests/files/errors.asm");

    // Line errors never fail the command
    cmd.assert()
        .success()
        .stdout(contains("5 errors found"))
        .stderr(contains("Duplicate symbol 'LOOP'"))
        .stderr(contains("Invalid instruction 'FOO'"))
        .stderr(contains("Invalid ORG address 'START'"));
}

#[test]
fn checks_clean_file() {
    m6800()
        .arg("check")
        .arg("tests/files/basic.asm")
        .assert()
        .success()
        .stdout(contains("no errors found!"));
}

#[test]
fn assembles_bit_text() {
    let dest = temp_file("basic.txt");
    let mut cmd = m6800();
    cmd.arg("assemble").arg("tests/files/basic.asm").arg(&dest);

    cmd.assert()
        .success()
        .stdout(contains("ORG $0010 -> (Directive)"))
        .stdout(contains("LDAA #$05 -> 86 05"))
        .stdout(contains("STAA $20 -> 97 20"))
        .stdout(contains("SWI -> 3F"))
        .stdout(contains("END -> (Directive)"));

    let written = fs::read_to_string(&dest).unwrap();
    let _ = fs::remove_file(&dest);
    assert_eq!(
        written,
        "10000110\n00000101\n10010111\n00100000\n01001100\n00111111\n"
    );
}

#[test]
fn assembles_raw_bytes() {
    let dest = temp_file("basic.bin");
    let mut cmd = m6800();
    cmd.arg("assemble")
        .arg("tests/files/basic.asm")
        .arg(&dest)
        .arg("--raw")
        .arg("--quiet");

    cmd.assert().success().stdout(contains("->").not());

    let written = fs::read(&dest).unwrap();
    let _ = fs::remove_file(&dest);
    assert_eq!(written, vec![0x86, 0x05, 0x97, 0x20, 0x4C, 0x3F]);
}

#[test]
fn listing_marks_errors() {
    let dest = temp_file("errors.txt");
    let mut cmd = m6800();
    cmd.arg("assemble").arg("tests/files/errors.asm").arg(&dest);

    cmd.assert()
        .success()
        .stdout(contains("FOO #1 -> ERROR (Invalid Instruction)"))
        .stdout(contains("STAA #5 -> ERROR (Opcode/Mode Mismatch)"))
        .stdout(contains("ORG START -> ERROR (Invalid Directive Value)"));
    let _ = fs::remove_file(&dest);
}

#[test]
fn runs_bit_text_at_origin() {
    let mut cmd = m6800();
    cmd.arg("run")
        .arg("tests/files/program.txt")
        .arg("--minimal")
        .arg("--origin")
        .arg("200");

    cmd.assert()
        .success()
        .stdout(contains("Halted"))
        .stdout(contains("A 2A\n"))
        .stdout(contains("PC 0203\n"));
}

#[test]
fn uses_catalog_from_environment() {
    let descriptor = temp_file("catalog.txt");
    fs::write(&descriptor, "NOP 01 1 IMPLIED\nSWI 3F 1 IMPLIED\n").unwrap();

    let mut cmd = m6800();
    cmd.env("M6800_CATALOG", &descriptor)
        .arg("check")
        .arg("tests/files/basic.asm");

    // Only NOP and SWI are known
    cmd.assert()
        .success()
        .stderr(contains("Invalid instruction 'LDAA'"))
        .stdout(contains("3 errors found"));
    let _ = fs::remove_file(&descriptor);
}

#[test]
fn traces_execution() {
    let mut cmd = m6800();
    cmd.env("M6800_TRACE", "1")
        .arg("run")
        .arg("tests/files/basic.asm")
        .arg("--minimal");

    cmd.assert()
        .success()
        .stderr(contains("$0010  86  LDAA"))
        .stderr(contains("$0015  3F  SWI"));
}

#[test]
fn fails_on_missing_file() {
    m6800()
        .arg("run")
        .arg("tests/files/missing.asm")
        .assert()
        .failure();
}

#[test]
fn fails_on_unknown_extension() {
    m6800()
        .arg("run")
        .arg("Cargo.toml")
        .assert()
        .failure()
        .stderr(contains("unknown extension"));
}

#[test]
fn fails_on_bad_bit_text() {
    let object = temp_file("bad.txt");
    fs::write(&object, "10000110\n0101\n").unwrap();
    let mut cmd = m6800();
    cmd.arg("run").arg(&object);
    cmd.assert().failure();
    let _ = fs::remove_file(&object);
}
