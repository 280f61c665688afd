//! Per-server launch details.

use crate::resolver::exe_file_name;
use cms_common::ServerKind;
use std::path::Path;

/// Optional auction-house bot config picked up by mangosd.
pub const AHBOT_CONFIG: &str = "ahbot.conf";

/// Everything that differs between realmd and mangosd.
#[derive(Debug, Clone)]
pub struct ServerSpec {
    pub kind: ServerKind,
    /// Platform file name of the executable.
    pub exe_file_name: String,
    build_args: fn(&Path) -> Vec<String>,
}

impl ServerSpec {
    pub fn realmd() -> Self {
        Self {
            kind: ServerKind::Realmd,
            exe_file_name: exe_file_name(ServerKind::Realmd.as_str()),
            build_args: realmd_args,
        }
    }

    pub fn mangosd() -> Self {
        Self {
            kind: ServerKind::Mangosd,
            exe_file_name: exe_file_name(ServerKind::Mangosd.as_str()),
            build_args: mangosd_args,
        }
    }

    pub fn for_kind(kind: ServerKind) -> Self {
        match kind {
            ServerKind::Realmd => Self::realmd(),
            ServerKind::Mangosd => Self::mangosd(),
        }
    }

    /// Name used for capture files and log fields.
    pub fn name(&self) -> &'static str {
        self.kind.as_str()
    }

    /// Default command line for a server living in `working_dir`.
    pub fn default_args(&self, working_dir: &Path) -> Vec<String> {
        (self.build_args)(working_dir)
    }
}

fn realmd_args(_working_dir: &Path) -> Vec<String> {
    vec!["-c".to_string(), "realmd.conf".to_string()]
}

fn mangosd_args(working_dir: &Path) -> Vec<String> {
    let mut args = vec!["-c".to_string(), "mangosd.conf".to_string()];
    if working_dir.join(AHBOT_CONFIG).is_file() {
        args.push("-a".to_string());
        args.push(AHBOT_CONFIG.to_string());
    }
    args
}
