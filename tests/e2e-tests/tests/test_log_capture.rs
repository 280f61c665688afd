//! Background mode output capture.

use cms_common::ServerKind;
use cms_server_control::{ControlOptions, ServerControl, ServerController, StartOptions};
use e2e_tests::assertions::assert_capture_contains;
use e2e_tests::{read_or_empty, wait_until, ServerInstall};
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const FAKE_SERVER: &str = env!("CARGO_BIN_EXE_fake-server");

fn controller(log_tail_bytes: usize) -> ServerController {
    ServerController::new(ControlOptions {
        graceful_stop_timeout: Duration::from_secs(5),
        log_tail_bytes,
        ..ControlOptions::default()
    })
}

#[tokio::test(flavor = "multi_thread")]
async fn test_capture_files_written() {
    println!("\n========================================");
    println!("TEST: Log Capture");
    println!("========================================\n");

    let install = ServerInstall::new(Path::new(FAKE_SERVER));
    let controller = controller(20_000);
    let path = install.path_str();

    controller
        .start(ServerKind::Realmd, &path, &StartOptions::default())
        .await
        .unwrap();

    let stdout = install.capture_file(ServerKind::Realmd, "stdout");
    assert!(
        wait_until(Duration::from_secs(10), || read_or_empty(&stdout).contains("heartbeat 2")).await,
        "no heartbeat captured in {}",
        stdout.display()
    );
    assert_capture_contains(&install, ServerKind::Realmd, "stdout", "config: realmd.conf").unwrap();
    assert_capture_contains(&install, ServerKind::Realmd, "stderr", "running offline").unwrap();
    println!("✓ stdout and stderr captured\n");

    let logs = controller
        .logs(ServerKind::Realmd, &path, &CancellationToken::new())
        .await
        .unwrap();
    assert!(logs.stdout.contains("realmd starting"));
    assert!(logs.stderr.contains("running offline"));

    controller.stop(ServerKind::Realmd, &path).await.unwrap();
    println!("✓ TEST PASSED: Log Capture");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_capture_appends_across_runs() {
    let install = ServerInstall::new(Path::new(FAKE_SERVER));
    let controller = controller(20_000);
    let path = install.path_str();
    let stdout = install.capture_file(ServerKind::Realmd, "stdout");

    for run in 1..=2 {
        controller
            .start(ServerKind::Realmd, &path, &StartOptions::default())
            .await
            .unwrap();
        assert!(
            wait_until(Duration::from_secs(10), || {
                read_or_empty(&stdout).matches("realmd starting").count() == run
            })
            .await
        );
        controller.stop(ServerKind::Realmd, &path).await.unwrap();
    }

    let content = read_or_empty(&stdout);
    assert_eq!(content.matches("realmd starting").count(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_mangosd_loads_ahbot_config() {
    let install = ServerInstall::new(Path::new(FAKE_SERVER)).with_ahbot();
    let controller = controller(20_000);
    let path = install.path_str();

    controller
        .start(ServerKind::Mangosd, &path, &StartOptions::default())
        .await
        .unwrap();

    let stdout = install.capture_file(ServerKind::Mangosd, "stdout");
    assert!(
        wait_until(Duration::from_secs(10), || read_or_empty(&stdout).contains("ahbot config")).await
    );
    assert_capture_contains(&install, ServerKind::Mangosd, "stdout", "config: mangosd.conf").unwrap();
    assert_capture_contains(&install, ServerKind::Mangosd, "stdout", "ahbot config: ahbot.conf")
        .unwrap();

    controller.stop(ServerKind::Mangosd, &path).await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_logs_are_bounded() {
    let install = ServerInstall::new(Path::new(FAKE_SERVER));
    let controller = controller(256);
    let path = install.path_str();

    controller
        .start(
            ServerKind::Mangosd,
            &path,
            &StartOptions::default().with_args(vec!["--heartbeat-ms".to_string(), "5".to_string()]),
        )
        .await
        .unwrap();

    let stdout = install.capture_file(ServerKind::Mangosd, "stdout");
    assert!(
        wait_until(Duration::from_secs(10), || read_or_empty(&stdout).len() > 1024).await
    );

    let logs = controller
        .logs_all(&install.server_paths(), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(logs.mangosd.stdout.len(), 256);
    assert_eq!(logs.realmd.stdout, "");

    controller.stop(ServerKind::Mangosd, &path).await.unwrap();
}

/// A shell installed as realmd keeps the default SIGPIPE action, like the
/// real servers and unlike Rust binaries.
#[tokio::test(flavor = "multi_thread")]
#[cfg(unix)]
async fn test_server_outlives_controller_shutdown() {
    println!("\n========================================");
    println!("TEST: Server Outlives Controller Shutdown");
    println!("========================================\n");

    let install = ServerInstall::new(Path::new("/bin/sh"));
    let path = install.path_str();
    let options = StartOptions::default().with_args(vec![
        "-c".to_string(),
        "while :; do echo tick; echo tock >&2; sleep 0.05; done".to_string(),
    ]);

    let first = controller(20_000);
    let started = first.start(ServerKind::Realmd, &path, &options).await.unwrap();
    let pid = started.pid.unwrap();
    println!("✓ realmd running with PID {}\n", pid);

    let stdout = install.capture_file(ServerKind::Realmd, "stdout");
    assert!(wait_until(Duration::from_secs(5), || read_or_empty(&stdout).contains("tick")).await);

    println!("Shutting the controller down...");
    first.shutdown();
    drop(first);
    let captured_at_shutdown = read_or_empty(&stdout).len();

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(install.running_pids(ServerKind::Realmd), vec![pid]);
    assert!(
        read_or_empty(&stdout).len() > captured_at_shutdown,
        "output stopped being captured after shutdown"
    );
    println!("✓ realmd still running and captured\n");

    let second = controller(20_000);
    second.stop(ServerKind::Realmd, &path).await.unwrap();
    assert!(install.running_pids(ServerKind::Realmd).is_empty());
    println!("✓ TEST PASSED: Server Outlives Controller Shutdown");
}
