//! Started-by-app bookkeeping.

use cms_common::ServerKind;
use parking_lot::Mutex;
use std::collections::HashMap;

/// PIDs this manager instance spawned, per server.
///
/// Only used to flag status records; never used to find a process. The map
/// lives in memory and starts empty on every manager start.
#[derive(Debug, Default)]
pub struct StartedByAppRegistry {
    pids: Mutex<HashMap<ServerKind, u32>>,
}

impl StartedByAppRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, kind: ServerKind, pid: u32) {
        self.pids.lock().insert(kind, pid);
    }

    pub fn get(&self, kind: ServerKind) -> Option<u32> {
        self.pids.lock().get(&kind).copied()
    }

    pub fn clear(&self, kind: ServerKind) -> Option<u32> {
        self.pids.lock().remove(&kind)
    }

    pub fn is_started_by_app(&self, kind: ServerKind, pid: u32) -> bool {
        self.get(kind) == Some(pid)
    }
}
