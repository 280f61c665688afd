//! Basic lifecycle: status, start, stop against real server processes.
//!
//! The fake server is installed under the real server names in a temporary
//! folder, so identity matching runs exactly as it would for realmd and
//! mangosd.

use cms_common::{RunState, ServerKind};
use cms_server_control::{ControlOptions, ServerControl, ServerController, StartOptions};
use e2e_tests::assertions::{assert_running, assert_single_instance, assert_stopped};
use e2e_tests::{wait_until, ServerInstall};
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const FAKE_SERVER: &str = env!("CARGO_BIN_EXE_fake-server");

fn controller() -> ServerController {
    ServerController::new(ControlOptions {
        graceful_stop_timeout: Duration::from_secs(5),
        ..ControlOptions::default()
    })
}

#[tokio::test(flavor = "multi_thread")]
async fn test_start_status_stop() {
    println!("\n========================================");
    println!("TEST: Start / Status / Stop");
    println!("========================================\n");

    let install = ServerInstall::new(Path::new(FAKE_SERVER));
    let controller = controller();
    let path = install.path_str();
    let cancel = CancellationToken::new();

    println!("Step 1: Server is stopped before start...");
    let status = controller.status(ServerKind::Realmd, &path, &cancel).await;
    assert_stopped(&status).unwrap();
    assert_eq!(
        status.executable_path,
        Some(install.executable(ServerKind::Realmd).display().to_string())
    );
    println!("✓ realmd reported stopped\n");

    println!("Step 2: Starting realmd...");
    let started = controller
        .start(ServerKind::Realmd, &path, &StartOptions::default())
        .await
        .unwrap();
    assert_running(&started, true).unwrap();
    let pid = assert_single_instance(&install, ServerKind::Realmd).unwrap();
    assert_eq!(started.pid, Some(pid));
    assert_eq!(controller.registry().get(ServerKind::Realmd), Some(pid));
    println!("✓ realmd running with PID {}\n", pid);

    println!("Step 3: Status agrees...");
    let status = controller.status(ServerKind::Realmd, &path, &cancel).await;
    assert_running(&status, true).unwrap();
    assert_eq!(status.pid, Some(pid));
    println!("✓ status reports running, started by app\n");

    println!("Step 4: Stopping realmd...");
    let stopped = controller.stop(ServerKind::Realmd, &path).await.unwrap();
    assert_stopped(&stopped).unwrap();
    assert!(install.running_pids(ServerKind::Realmd).is_empty());
    assert_eq!(controller.registry().get(ServerKind::Realmd), None);
    println!("✓ realmd stopped and registry cleared\n");

    let status = controller.status(ServerKind::Realmd, &path, &cancel).await;
    assert_eq!(status.status, RunState::Stopped);

    println!("✓ TEST PASSED: Start / Status / Stop");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_start_is_idempotent() {
    let install = ServerInstall::new(Path::new(FAKE_SERVER));
    let controller = controller();
    let path = install.path_str();

    let first = controller
        .start(ServerKind::Mangosd, &path, &StartOptions::default())
        .await
        .unwrap();
    let second = controller
        .start(ServerKind::Mangosd, &path, &StartOptions::default())
        .await
        .unwrap();

    assert_eq!(first.pid, second.pid);
    assert_single_instance(&install, ServerKind::Mangosd).unwrap();

    controller.stop(ServerKind::Mangosd, &path).await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_stop_is_idempotent() {
    let install = ServerInstall::new(Path::new(FAKE_SERVER));
    let controller = controller();
    let path = install.path_str();

    controller
        .start(ServerKind::Realmd, &path, &StartOptions::default())
        .await
        .unwrap();

    let first = controller.stop(ServerKind::Realmd, &path).await.unwrap();
    let second = controller.stop(ServerKind::Realmd, &path).await.unwrap();
    assert_stopped(&first).unwrap();
    assert_stopped(&second).unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_foreign_instance_not_started_by_app() {
    let install = ServerInstall::new(Path::new(FAKE_SERVER));
    let path = install.path_str();

    // Started by one controller, observed by a fresh one (a manager restart)
    let first = controller();
    let started = first
        .start(ServerKind::Realmd, &path, &StartOptions::default())
        .await
        .unwrap();
    first.shutdown();

    let second = controller();
    let status = second
        .status(ServerKind::Realmd, &path, &CancellationToken::new())
        .await;
    assert_running(&status, false).unwrap();
    assert_eq!(status.pid, started.pid);

    // The fresh controller can still stop it
    second.stop(ServerKind::Realmd, &path).await.unwrap();
    assert!(install.running_pids(ServerKind::Realmd).is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_identity_is_per_executable_path() {
    let first = ServerInstall::new(Path::new(FAKE_SERVER));
    let second = ServerInstall::new(Path::new(FAKE_SERVER));
    let controller = controller();

    controller
        .start(ServerKind::Realmd, &first.path_str(), &StartOptions::default())
        .await
        .unwrap();

    // Same image name, different folder: not the same server
    let other = controller
        .status(ServerKind::Realmd, &second.path_str(), &CancellationToken::new())
        .await;
    assert_stopped(&other).unwrap();

    // Stopping the other install leaves the first one alone
    controller
        .stop(ServerKind::Realmd, &second.path_str())
        .await
        .unwrap();
    assert_single_instance(&first, ServerKind::Realmd).unwrap();

    controller
        .stop(ServerKind::Realmd, &first.path_str())
        .await
        .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_aggregate_start_stop() {
    let install = ServerInstall::new(Path::new(FAKE_SERVER));
    let controller = controller();
    let paths = install.server_paths();

    let started = controller.start_all(&paths).await.unwrap();
    assert_eq!(started[0].name, ServerKind::Realmd);
    assert_eq!(started[1].name, ServerKind::Mangosd);
    for status in &started {
        assert_running(status, true).unwrap();
    }

    // Concurrent status queries see the same picture
    let cancel = CancellationToken::new();
    let (a, b) = futures::future::join(
        controller.status_all(&paths, &cancel),
        controller.status_all(&paths, &cancel),
    )
    .await;
    assert_eq!(a, b);

    let stopped = controller.stop_all(&paths).await.unwrap();
    for status in &stopped {
        assert_stopped(status).unwrap();
    }
}

/// Launch the installed server the way an operator would, outside the
/// controller.
fn launch_by_hand(install: &ServerInstall, kind: ServerKind) -> std::process::Child {
    std::process::Command::new(install.executable(kind))
        .args(["-c", &format!("{}.conf", kind)])
        .current_dir(install.dir())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .expect("Failed to launch server by hand")
}

#[tokio::test(flavor = "multi_thread")]
async fn test_stop_kills_every_instance() {
    println!("\n========================================");
    println!("TEST: Stop Kills Every Instance");
    println!("========================================\n");

    let install = ServerInstall::new(Path::new(FAKE_SERVER));
    let controller = controller();
    let path = install.path_str();

    let mut first = launch_by_hand(&install, ServerKind::Mangosd);
    let mut second = launch_by_hand(&install, ServerKind::Mangosd);
    let lowest = first.id().min(second.id());
    assert!(
        wait_until(Duration::from_secs(5), || install.running_pids(ServerKind::Mangosd).len() == 2).await,
        "both instances should be visible"
    );
    println!("✓ two mangosd instances running\n");

    let status = controller
        .status(ServerKind::Mangosd, &path, &CancellationToken::new())
        .await;
    assert_running(&status, false).unwrap();
    assert_eq!(status.pid, Some(lowest));
    println!("✓ status reports the lowest PID {}\n", lowest);

    let stopped = controller.stop(ServerKind::Mangosd, &path).await.unwrap();
    assert_stopped(&stopped).unwrap();
    assert!(install.running_pids(ServerKind::Mangosd).is_empty());

    first.wait().unwrap();
    second.wait().unwrap();
    println!("✓ TEST PASSED: Stop Kills Every Instance");
}

#[tokio::test(flavor = "multi_thread")]
#[cfg(target_os = "linux")]
async fn test_replaced_binary_still_identified() {
    let install = ServerInstall::new(Path::new(FAKE_SERVER));
    let controller = controller();
    let path = install.path_str();

    let started = controller
        .start(ServerKind::Realmd, &path, &StartOptions::default())
        .await
        .unwrap();
    let pid = started.pid.unwrap();

    // Reinstall while running: fresh copy renamed over the old image
    let fresh = install.dir().join("realmd.new");
    std::fs::copy(FAKE_SERVER, &fresh).unwrap();
    std::fs::rename(&fresh, install.executable(ServerKind::Realmd)).unwrap();

    let status = controller
        .status(ServerKind::Realmd, &path, &CancellationToken::new())
        .await;
    assert_running(&status, true).unwrap();
    assert_eq!(status.pid, Some(pid));

    // Start must not spawn a second copy next to the old one
    let again = controller
        .start(ServerKind::Realmd, &path, &StartOptions::default())
        .await
        .unwrap();
    assert_eq!(again.pid, Some(pid));

    controller.stop(ServerKind::Realmd, &path).await.unwrap();
    assert!(install.running_pids(ServerKind::Realmd).is_empty());
    assert!(!cms_process::process_alive(pid).unwrap());
}
