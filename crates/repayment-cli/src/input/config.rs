use repayment_core::RepaymentConfig;
use std::fs;
use tracing::debug;

use super::file::resolve_path;

/// Load flow settings from a YAML file, or the defaults when no path is given.
pub fn load(path: Option<&str>) -> Result<RepaymentConfig, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(RepaymentConfig::default());
    };
    let canonical = resolve_path(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read config '{}': {}", canonical.display(), e))?;
    let config: RepaymentConfig = serde_yaml::from_str(&contents)
        .map_err(|e| format!("Invalid config '{}': {}", canonical.display(), e))?;
    if config.grace_period_days < 0 {
        return Err(format!("Invalid config '{}': grace_period_days cannot be negative", canonical.display()).into());
    }
    debug!(path = %canonical.display(), ?config, "loaded repayment config");
    Ok(config)
}
