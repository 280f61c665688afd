//! Forced stop
//!
//! A server that ignores the termination signal is killed once the graceful
//! timeout runs out.

#![cfg(unix)]

use cms_common::ServerKind;
use cms_server_control::{ControlOptions, ServerControl, ServerController, StartOptions};
use e2e_tests::assertions::assert_stopped;
use e2e_tests::{read_or_empty, wait_until, ServerInstall};
use std::path::Path;
use std::time::{Duration, Instant};

const FAKE_SERVER: &str = env!("CARGO_BIN_EXE_fake-server");

#[tokio::test(flavor = "multi_thread")]
async fn test_forced_stop() {
    println!("\n========================================");
    println!("TEST: Forced Stop");
    println!("========================================\n");

    let install = ServerInstall::new(Path::new(FAKE_SERVER));
    let controller = ServerController::new(ControlOptions {
        graceful_stop_timeout: Duration::from_millis(300),
        ..ControlOptions::default()
    });
    let path = install.path_str();

    println!("Step 1: Starting mangosd that ignores SIGTERM...");
    let options = StartOptions::default().with_args(vec![
        "-c".to_string(),
        "mangosd.conf".to_string(),
        "--ignore-term".to_string(),
    ]);
    controller
        .start(ServerKind::Mangosd, &path, &options)
        .await
        .unwrap();

    // Signal handler must be installed before we stop
    let stdout = install.capture_file(ServerKind::Mangosd, "stdout");
    assert!(
        wait_until(Duration::from_secs(10), || read_or_empty(&stdout).contains("heartbeat 1")).await
    );
    println!("✓ mangosd running\n");

    println!("Step 2: Stopping with a short graceful timeout...");
    let started_at = Instant::now();
    let stopped = controller.stop(ServerKind::Mangosd, &path).await.unwrap();
    let elapsed = started_at.elapsed();

    assert_stopped(&stopped).unwrap();
    assert!(install.running_pids(ServerKind::Mangosd).is_empty());
    assert!(elapsed >= Duration::from_millis(300), "stopped too early: {:?}", elapsed);
    assert!(
        wait_until(Duration::from_secs(5), || read_or_empty(&stdout).contains("SIGTERM ignored")).await
    );
    assert!(!read_or_empty(&stdout).contains("shutting down"));
    println!("✓ mangosd force-killed after {:?}\n", elapsed);

    println!("✓ TEST PASSED: Forced Stop");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_graceful_stop() {
    let install = ServerInstall::new(Path::new(FAKE_SERVER));
    let controller = ServerController::new(ControlOptions::default());
    let path = install.path_str();

    controller
        .start(ServerKind::Realmd, &path, &StartOptions::default())
        .await
        .unwrap();
    let stdout = install.capture_file(ServerKind::Realmd, "stdout");
    assert!(
        wait_until(Duration::from_secs(10), || read_or_empty(&stdout).contains("heartbeat 1")).await
    );

    controller.stop(ServerKind::Realmd, &path).await.unwrap();

    // The pump may still be flushing the last lines
    assert!(
        wait_until(Duration::from_secs(5), || read_or_empty(&stdout).contains("realmd shutting down")).await
    );
}
