use super::*;
use anyhow::{anyhow, Result};

/// Validate the complete configuration
pub fn validate_config(config: &ManagerConfig) -> Result<()> {
    validate_server_options(&config.server)?;
    validate_control_options(&config.control)?;
    Ok(())
}

fn validate_server_options(options: &ServerOptions) -> Result<()> {
    if options.host.trim().is_empty() {
        return Err(anyhow!("Server host cannot be empty"));
    }

    if options.port == 0 {
        return Err(anyhow!("Port must be between 1 and 65535, got: {}", options.port));
    }

    match options.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(anyhow!(
            "Invalid log level: {}, must be one of: trace, debug, info, warn, error",
            options.log_level
        )),
    }
}

fn validate_control_options(options: &ControlOptions) -> Result<()> {
    if options.graceful_stop_timeout.is_zero() {
        return Err(anyhow!("Graceful stop timeout must be greater than 0"));
    }

    if options.force_kill_timeout.is_zero() {
        return Err(anyhow!("Force kill timeout must be greater than 0"));
    }

    if options.log_tail_bytes == 0 {
        return Err(anyhow!("Log tail size must be greater than 0"));
    }

    Ok(())
}
