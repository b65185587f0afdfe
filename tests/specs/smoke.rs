//! Black-box smoke tests over the built binaries.

use assert_cmd::Command;

#[test]
fn daemon_version_flag() {
    let out = Command::cargo_bin("shqd")
        .unwrap()
        .arg("--version")
        .output()
        .unwrap();
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).starts_with("shqd "));
}

#[test]
fn daemon_help_flag() {
    let out = Command::cargo_bin("shqd")
        .unwrap()
        .arg("--help")
        .output()
        .unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("--attached"));
    assert!(stdout.contains("--config"));
}

#[test]
fn daemon_rejects_unknown_argument() {
    let out = Command::cargo_bin("shqd")
        .unwrap()
        .arg("--frobnicate")
        .output()
        .unwrap();
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("unexpected argument"));
}

#[test]
fn client_fails_without_daemon() {
    // Nothing listens on the discard port; the client must exit non-zero
    // with a connection diagnostic.
    let out = Command::cargo_bin("shq")
        .unwrap()
        .args(["--port", "9", "cancel", "e1"])
        .output()
        .unwrap();
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("could not connect"));
}

#[test]
fn client_help_lists_trigger_commands() {
    let out = Command::cargo_bin("shq")
        .unwrap()
        .arg("--help")
        .output()
        .unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    for command in ["origin", "cancel", "trigger", "send"] {
        assert!(stdout.contains(command), "missing subcommand {command}");
    }
}
