use anyhow::{Context, Result};
use cms_log_collection::DEFAULT_TAIL_BYTES;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub mod validation;

/// Top-level configuration structure
///
/// Every key is optional; an empty document yields the defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManagerConfig {
    #[serde(default)]
    pub server: ServerOptions,
    #[serde(default)]
    pub control: ControlOptions,
}

/// HTTP listener options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerOptions {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

/// Lifecycle controller tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlOptions {
    /// How long a server gets to exit after the termination signal.
    #[serde(default = "default_graceful_stop_timeout", with = "duration_serde")]
    pub graceful_stop_timeout: Duration,

    /// How long to wait for exit after the forced kill.
    #[serde(default = "default_force_kill_timeout", with = "duration_serde")]
    pub force_kill_timeout: Duration,

    /// Cap applied to each capture-file tail.
    #[serde(default = "default_log_tail_bytes")]
    pub log_tail_bytes: usize,
}

impl Default for ControlOptions {
    fn default() -> Self {
        Self {
            graceful_stop_timeout: default_graceful_stop_timeout(),
            force_kill_timeout: default_force_kill_timeout(),
            log_tail_bytes: default_log_tail_bytes(),
        }
    }
}

impl ManagerConfig {
    /// Load configuration from a YAML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        Self::load_from_string(&content)
    }

    /// Load configuration from a YAML string
    pub fn load_from_string(content: &str) -> Result<Self> {
        // serde_yaml maps an empty document to unit, not to an empty map
        let config: ManagerConfig = if content.trim().is_empty() {
            ManagerConfig::default()
        } else {
            serde_yaml::from_str(content).context("Failed to parse YAML configuration")?
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }

    /// `host:port` the HTTP API binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5023
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_graceful_stop_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_force_kill_timeout() -> Duration {
    Duration::from_secs(3)
}

fn default_log_tail_bytes() -> usize {
    DEFAULT_TAIL_BYTES
}

// Human-readable durations: "500ms", "10s", "1m"
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_millis() == 0 {
            serializer.serialize_str(&format!("{}s", duration.as_secs()))
        } else {
            serializer.serialize_str(&format!("{}ms", duration.as_millis()))
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    pub(super) fn parse_duration(s: &str) -> Result<Duration, String> {
        let s = s.trim();
        // "ms" before "s" since "ms" ends with 's'
        if let Some(num) = s.strip_suffix("ms") {
            let millis: u64 = num.parse().map_err(|_| format!("Invalid duration: {}", s))?;
            Ok(Duration::from_millis(millis))
        } else if let Some(num) = s.strip_suffix('s') {
            let secs: u64 = num.parse().map_err(|_| format!("Invalid duration: {}", s))?;
            Ok(Duration::from_secs(secs))
        } else if let Some(num) = s.strip_suffix('m') {
            let mins: u64 = num.parse().map_err(|_| format!("Invalid duration: {}", s))?;
            Ok(Duration::from_secs(mins * 60))
        } else {
            Err(format!("Duration must end with 's', 'ms', or 'm': {}", s))
        }
    }
}
