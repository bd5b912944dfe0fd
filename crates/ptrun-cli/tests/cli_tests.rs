//! Exit-status contract of the `ptrun` binary.
use std::process::Command;

fn ptrun() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_ptrun"));
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_missing_arguments_exit_one() {
    let output = ptrun().arg("test.Main").output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("PROGRAM"));
}

#[test]
fn test_help_exits_zero() {
    let output = ptrun().arg("--help").output().unwrap();
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("--fast"));
}

#[test]
fn test_missing_runtime_exit_one() {
    let dir = tempfile::tempdir().unwrap();
    let output = ptrun()
        .args(["test.Main", "pa.dtl"])
        .env_remove("JAVA_HOME")
        .env("PQLHOME", dir.path())
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("JAVA_HOME"));
    assert!(!dir.path().join("results").exists());
}

#[test]
fn test_missing_support_files_exit_one() {
    let dir = tempfile::tempdir().unwrap();
    let output = ptrun()
        .args(["test.Main", "pa.dtl"])
        .env("JAVA_HOME", "/usr/lib/jvm/default")
        .env("PQLHOME", dir.path())
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("PQL-0.2.jar"));
}
