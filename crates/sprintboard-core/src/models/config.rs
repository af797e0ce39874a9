//! Application configuration

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub version: String,
    pub default_project: Option<String>,
    pub log_level: String,
    pub api: ApiConfig,
    pub planner: PlannerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiConfig {
    pub base_url: String,
    /// Falls back to the OS keyring when unset
    pub token: Option<String>,
    /// Keyring account name
    pub username: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlannerConfig {
    pub debounce_ms: u64,
    pub rollback_on_failure: bool,
    pub reset_filters_on_project_switch: bool,
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.log_level.as_str()) {
            return Err(Error::Validation(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.log_level,
                valid_log_levels.join(", ")
            )));
        }

        self.api.validate()?;
        self.planner.validate()?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0.0".to_string(),
            default_project: None,
            log_level: "info".to_string(),
            api: ApiConfig::default(),
            planner: PlannerConfig::default(),
        }
    }
}

impl ApiConfig {
    /// Validate API configuration
    pub fn validate(&self) -> Result<()> {
        let url = self.base_url.trim();
        if url.is_empty() {
            return Err(Error::Validation("API base URL cannot be empty".to_string()));
        }

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(Error::Validation(
                "API base URL must start with http:// or https://".to_string(),
            ));
        }

        if self.timeout_secs == 0 {
            return Err(Error::Validation(
                "API timeout must be greater than 0".to_string(),
            ));
        }

        if let Some(ref token) = self.token {
            if token.trim().is_empty() {
                return Err(Error::Validation("API token cannot be empty".to_string()));
            }
        }

        Ok(())
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api".to_string(),
            token: None,
            username: None,
            timeout_secs: 30,
        }
    }
}

impl PlannerConfig {
    /// Validate planner configuration
    pub fn validate(&self) -> Result<()> {
        const MAX_DEBOUNCE_MS: u64 = 10_000;
        if self.debounce_ms > MAX_DEBOUNCE_MS {
            return Err(Error::Validation(format!(
                "Debounce window too long (max {} ms)",
                MAX_DEBOUNCE_MS
            )));
        }
        Ok(())
    }

    pub fn debounce(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.debounce_ms)
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 500,
            rollback_on_failure: true,
            reset_filters_on_project_switch: false,
        }
    }
}
