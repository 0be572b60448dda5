//! Configuration
//!
//! Resolution order, highest priority first:
//!
//! 1. Environment variables (`PORTAL_ACCESS_*`)
//! 2. Config file (TOML)
//! 3. Defaults

use std::env;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_ADMIN_ROLE, DEFAULT_BIND, DEFAULT_DEBOUNCE_MS, DEFAULT_LOG_FILTER};
use crate::error::{AccessError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Roles treated as administrators by the evaluator
    pub admin_roles: Vec<String>,
    /// Debounce window for tree search input
    pub search_debounce_ms: u64,
    /// `tracing_subscriber::EnvFilter` directive for the server binary
    pub log_filter: String,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            admin_roles: vec![DEFAULT_ADMIN_ROLE.to_string()],
            search_debounce_ms: DEFAULT_DEBOUNCE_MS,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            server: ServerConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: DEFAULT_BIND.to_string() }
    }
}

impl AccessConfig {
    /// Defaults, then `path` if it exists, then environment overrides
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            Self::default()
        };
        config.apply_env_vars()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn apply_env_vars(&mut self) -> Result<()> {
        if let Ok(roles) = env::var("PORTAL_ACCESS_ADMIN_ROLES") {
            self.admin_roles = roles
                .split(',')
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(String::from)
                .collect();
        }
        if let Ok(ms) = env::var("PORTAL_ACCESS_DEBOUNCE_MS") {
            self.search_debounce_ms = ms
                .trim()
                .parse()
                .map_err(|_| AccessError::Config(format!("PORTAL_ACCESS_DEBOUNCE_MS: '{}' is not a number", ms)))?;
        }
        if let Ok(bind) = env::var("PORTAL_ACCESS_BIND") {
            self.server.bind = bind;
        }
        if let Ok(filter) = env::var("PORTAL_ACCESS_LOG") {
            self.log_filter = filter;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.admin_roles.is_empty() {
            return Err(AccessError::Config("admin_roles must name at least one role".into()));
        }
        if self.server.bind.trim().is_empty() {
            return Err(AccessError::Config("server.bind is empty".into()));
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}
