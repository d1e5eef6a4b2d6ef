use std::fs;
use std::path::Path;
use std::process::Command;

use syntax::builder::*;
use syntax::{BinaryOp, CheckedProgram, Type};

fn program() -> CheckedProgram {
    let x = || ident("x", Type::Int);
    ProgramBuilder::new()
        .function(
            "twice",
            &[("x", Type::Int)],
            Type::Int,
            vec![ret(Some(binary(BinaryOp::Add, x(), x())))],
        )
        .finish(vec![put(call("twice", vec![int(21)], Type::Int))])
}

fn write_input(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("program.json");
    let json = serde_json::to_string_pretty(&program()).unwrap();
    fs::write(&path, json).unwrap();
    path
}

fn lowc() -> Command {
    Command::new(env!("CARGO_BIN_EXE_lowc"))
}

#[test]
fn writes_main_j_and_clears_stale_files() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path());
    let out = dir.path().join("out");
    fs::create_dir_all(&out).unwrap();
    fs::write(out.join("Stale.j"), "old").unwrap();

    let status = lowc().arg(&input).arg("-o").arg(&out).status().unwrap();
    assert!(status.success());

    assert!(!out.join("Stale.j").exists());
    let text = fs::read_to_string(out.join("Main.j")).unwrap();
    assert!(text.starts_with(".class public Main\n.super java/lang/Object\n"));
    assert!(text.contains(".method public twice(Ljava/lang/Integer;)Ljava/lang/Integer;\n"));
    assert!(text.contains(".limit stack 128\n"));
    assert!(text.contains("\t\tareturn\n"));
    assert!(text.contains(".end method\n"));
}

#[test]
fn dump_and_run_print_to_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path());

    let output = lowc()
        .arg(&input)
        .args(["--dump", "--run", "--limit-stack", "64"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains(".limit stack 64\n"));
    assert!(stdout.ends_with("42\n"));
}

#[test]
fn malformed_input_fails() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("broken.json");
    fs::write(&input, "{ not json").unwrap();

    let output = lowc()
        .arg(&input)
        .arg("-o")
        .arg(dir.path().join("out"))
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("parsing"));
}
