//! Throwaway server installations.

use cms_common::{ServerKind, ServerPaths};
use cms_server_control::{exe_file_name, find_all_matching_processes};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary folder holding copies of the fake server named `realmd` and
/// `mangosd`, plus their config files.
///
/// Any process still running from the folder is killed on drop so a failed
/// test never leaks servers.
pub struct ServerInstall {
    dir: TempDir,
}

impl ServerInstall {
    /// Install `fake_server` under both server names.
    pub fn new(fake_server: &Path) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create install directory");

        for kind in ServerKind::ALL {
            let target = dir.path().join(exe_file_name(kind.as_str()));
            std::fs::copy(fake_server, &target).unwrap_or_else(|e| {
                panic!(
                    "Failed to copy {} to {}: {}",
                    fake_server.display(),
                    target.display(),
                    e
                )
            });
            std::fs::write(dir.path().join(format!("{}.conf", kind)), "# test config\n")
                .expect("Failed to write config");
        }

        Self { dir }
    }

    /// Add `ahbot.conf` next to mangosd.
    pub fn with_ahbot(self) -> Self {
        std::fs::write(self.dir.path().join("ahbot.conf"), "AuctionHouseBot.Seller.Enabled = 0\n")
            .expect("Failed to write ahbot.conf");
        self
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Folder path as a request would carry it.
    pub fn path_str(&self) -> String {
        self.dir.path().display().to_string()
    }

    pub fn executable(&self, kind: ServerKind) -> PathBuf {
        self.dir.path().join(exe_file_name(kind.as_str()))
    }

    pub fn capture_file(&self, kind: ServerKind, stream: &str) -> PathBuf {
        self.dir.path().join(format!("{}.{}.log", kind, stream))
    }

    pub fn server_paths(&self) -> ServerPaths {
        ServerPaths::new(self.path_str(), self.path_str())
    }

    /// PIDs currently running from this install's `kind` executable.
    pub fn running_pids(&self, kind: ServerKind) -> Vec<u32> {
        find_all_matching_processes(&self.executable(kind))
            .map(|matches| matches.into_iter().map(|m| m.pid).collect())
            .unwrap_or_default()
    }
}

impl Drop for ServerInstall {
    fn drop(&mut self) {
        for kind in ServerKind::ALL {
            for pid in self.running_pids(kind) {
                let _ = cms_process::force_kill(pid);
            }
        }
    }
}
