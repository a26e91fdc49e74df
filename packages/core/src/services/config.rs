//! Export Configuration

use crate::models::StorePath;
use crate::services::error::BackupError;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

/// Default bound on store reads in flight at once
pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 64;

/// Environment variable naming the default root path
pub const ENV_ROOT_PATH: &str = "TREESNAP_ROOT_PATH";

/// Environment variable for the maximum collection depth
pub const ENV_MAX_DEPTH: &str = "TREESNAP_MAX_DEPTH";

/// Environment variable for the in-flight fetch bound
pub const ENV_MAX_CONCURRENT_FETCHES: &str = "TREESNAP_MAX_CONCURRENT_FETCHES";

/// Configuration for [`BackupService`](crate::services::BackupService)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupConfig {
    /// Root path used when `start` is called without one
    pub default_root_path: Option<String>,

    /// Maximum number of collection levels below the start point.
    /// `None` walks the whole tree.
    pub max_depth: Option<usize>,

    /// Maximum number of store reads in flight at once
    pub max_concurrent_fetches: usize,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            default_root_path: None,
            max_depth: None,
            max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
        }
    }
}

impl BackupConfig {
    /// Read overrides from `TREESNAP_*` environment variables
    pub fn from_env() -> Result<Self, BackupError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read overrides through an arbitrary key lookup, starting from defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, BackupError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(root) = lookup(ENV_ROOT_PATH) {
            config.default_root_path = Some(root);
        }
        if let Some(raw) = lookup(ENV_MAX_DEPTH) {
            config.max_depth = Some(parse_usize(ENV_MAX_DEPTH, &raw)?);
        }
        if let Some(raw) = lookup(ENV_MAX_CONCURRENT_FETCHES) {
            config.max_concurrent_fetches = parse_usize(ENV_MAX_CONCURRENT_FETCHES, &raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), BackupError> {
        if self.max_concurrent_fetches == 0 {
            return Err(BackupError::invalid_config(
                "max_concurrent_fetches must be greater than 0",
            ));
        }

        if self.max_concurrent_fetches > Semaphore::MAX_PERMITS {
            return Err(BackupError::invalid_config(format!(
                "max_concurrent_fetches must be at most {}",
                Semaphore::MAX_PERMITS
            )));
        }

        if self.max_depth == Some(0) {
            return Err(BackupError::invalid_config(
                "max_depth must be greater than 0 when set",
            ));
        }

        if let Some(root) = &self.default_root_path {
            StorePath::parse(root)?;
        }

        Ok(())
    }
}

fn parse_usize(key: &str, raw: &str) -> Result<usize, BackupError> {
    raw.trim().parse().map_err(|_| {
        BackupError::invalid_config(format!(
            "{} must be a non-negative integer, got '{}'",
            key, raw
        ))
    })
}
