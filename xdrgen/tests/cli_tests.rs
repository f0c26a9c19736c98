use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

#[test]
fn compile_to_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let output = dir.path().join("calc.rs");
    let mut cmd = Command::cargo_bin("xdrgen")?;

    cmd.args(["-i", "tests/fixtures/calc.x", "-p", "calc", "-o"])
        .arg(&output);

    cmd.assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::is_empty());

    let generated = std::fs::read_to_string(&output)?;
    assert!(generated.starts_with("// Generated by xdrgen from `calc.x`. Do not edit.\n"));
    assert!(generated.contains("pub mod calc {"));
    assert!(generated.contains("    pub const MAX_OPERANDS: i64 = 16;"));
    assert!(generated.contains("    pub fn calc_prog_calc_v1_regs<"));

    Ok(())
}

#[test]
fn compile_to_stdout() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("xdrgen")?;

    cmd.args(["-i", "tests/fixtures/calc.x", "-o", "-", "--const-type", "u32"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("pub const MAX_OPERANDS: u32 = 16;"))
        .stdout(predicate::str::contains(
            "pub trait CalcProgCalcV1Handler: ::std::marker::Send + ::std::marker::Sync {",
        ))
        .stdout(predicate::str::contains("fn calc_eval(&self, arg: Operands) -> Result;"));

    Ok(())
}

#[test]
fn compile_from_stdin() -> anyhow::Result<()> {
    let mut cmd = assert_cmd::Command::cargo_bin("xdrgen")?;

    cmd.args(["-i", "-", "-o", "-", "--unsigned-enums"])
        .write_stdin("enum e { A = 1 };");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("pub struct E(pub u32);"));

    Ok(())
}

#[test]
fn output_is_deterministic() -> anyhow::Result<()> {
    let run = || -> anyhow::Result<std::process::Output> {
        let output = Command::cargo_bin("xdrgen")?
            .args(["-i", "tests/fixtures/calc.x", "-o", "-"])
            .output()?;
        Ok(output)
    };
    let first = run()?;
    let second = run()?;

    assert!(first.status.success());
    assert!(!first.stdout.is_empty());
    assert_eq!(first.stdout, second.stdout);

    Ok(())
}

#[test]
fn missing_input() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("xdrgen")?;

    cmd.args(["-i", "tests/fixtures/nope.x", "-o", "-"]);

    cmd.assert()
        .failure()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("couldn't read `tests/fixtures/nope.x`"));

    Ok(())
}

#[test]
fn parse_errors() -> anyhow::Result<()> {
    let mut cmd = assert_cmd::Command::cargo_bin("xdrgen")?;

    cmd.args(["-i", "-", "-o", "-", "--color", "never"])
        .write_stdin("struct s { int a };");

    cmd.assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("error: unexpected token"))
        .stderr(predicate::str::contains("<stdin>:1:18"));

    Ok(())
}

#[test]
fn unsupported_types_leave_output_untouched() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let output = dir.path().join("wide.rs");
    std::fs::write(&output, "// previous output\n")?;
    let mut cmd = Command::cargo_bin("xdrgen")?;

    cmd.args(["-i", "tests/fixtures/quadruple.x", "--color", "never", "-o"])
        .arg(&output);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("error: unsupported type `quadruple`"));

    assert_eq!(std::fs::read_to_string(&output)?, "// previous output\n");
    assert_eq!(std::fs::read_dir(dir.path())?.count(), 1);

    Ok(())
}

#[test]
fn invalid_module_name() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("xdrgen")?;

    cmd.args(["-i", "tests/fixtures/calc.x", "-o", "-", "-p", "not a module"]);

    cmd.assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("`not a module` is not a valid module name"));

    Ok(())
}

#[test]
fn debug_logging() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("xdrgen")?;

    cmd.args(["-i", "tests/fixtures/calc.x", "-o", "-", "-d"]);

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("generating definition"));

    Ok(())
}
