//! The cms-server-manager command line.
//!
//! Skipped when the binary has not been built alongside the tests.

use e2e_tests::{find_manager_binary, ServerInstall};
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;
use wait_timeout::ChildExt;

const FAKE_SERVER: &str = env!("CARGO_BIN_EXE_fake-server");

fn run_manager(args: &[&str]) -> Option<String> {
    let Some(binary) = find_manager_binary() else {
        eprintln!("cms-server-manager binary not built, skipping");
        return None;
    };

    let mut child = Command::new(binary)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("Failed to spawn cms-server-manager");

    match child.wait_timeout(Duration::from_secs(30)).expect("wait failed") {
        Some(status) => assert!(status.success(), "cms-server-manager failed: {}", status),
        None => {
            let _ = child.kill();
            panic!("cms-server-manager did not exit");
        }
    }

    let mut out = String::new();
    std::io::Read::read_to_string(&mut child.stdout.take().unwrap(), &mut out).unwrap();
    Some(out)
}

#[test]
fn test_cli_status() {
    let install = ServerInstall::new(Path::new(FAKE_SERVER));
    let path = install.path_str();

    let Some(out) = run_manager(&["status", "--realmd", &path, "--mangosd", &path]) else {
        return;
    };

    let statuses: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(statuses[0]["name"], "realmd");
    assert_eq!(statuses[0]["status"], "stopped");
    assert_eq!(statuses[1]["name"], "mangosd");
    assert_eq!(statuses[1]["status"], "stopped");
}

#[test]
fn test_cli_verifier() {
    let Some(out) = run_manager(&["verifier", "--username", "player", "--password", "secret"]) else {
        return;
    };

    assert!(out.contains("username: PLAYER"));
    let hex_line = |prefix: &str| {
        out.lines()
            .find_map(|l| l.strip_prefix(prefix))
            .map(str::to_string)
            .unwrap()
    };
    assert_eq!(hex_line("s: ").len(), 64);
    assert_eq!(hex_line("v: ").len(), 64);
}
