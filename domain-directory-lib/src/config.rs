//! Configuration file parsing and management.
//!
//! This module handles loading configuration from TOML files and merging
//! configurations with proper precedence rules. Precedence (highest to
//! lowest): CLI flags, `DD_*` environment variables, local config file,
//! global config file, XDG config file, built-in defaults. The flag layer
//! is applied by the CLI; this module covers the rest.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::DirectoryError;

/// Configuration loaded from TOML files.
///
/// ```toml
/// [defaults]
/// store_path = "~/domains.json"
/// concurrency = 8
/// timeout = "5s"
/// retries = 1
/// enrich_on_add = true
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Default values for CLI options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,
}

/// Default configuration values that map to CLI options.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DefaultsConfig {
    /// Path of the JSON store file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_path: Option<String>,

    /// Bulk-enrichment concurrency
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,

    /// Per-lookup timeout (as string, e.g., "5s", "30s", "2m")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// Transient-failure retries per lookup
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retries: Option<u32>,

    /// Whether `add` enriches immediately
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrich_on_add: Option<bool>,
}

/// Configuration discovery and loading functionality.
pub struct ConfigManager {
    /// Whether to emit debug events for config discovery
    pub verbose: bool,
}

impl ConfigManager {
    /// Create a new configuration manager.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Load configuration from a specific file.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, DirectoryError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(DirectoryError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            DirectoryError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content).map_err(|e| {
            DirectoryError::config(format!("Failed to parse TOML configuration: {}", e))
        })?;

        // Validate the loaded configuration
        self.validate_config(&config)?;

        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// Looks for configuration files in standard locations and merges them,
    /// later (more local) files winning.
    pub fn discover_and_load(&self) -> Result<FileConfig, DirectoryError> {
        let mut merged_config = FileConfig::default();
        let mut loaded_files = Vec::new();

        // 1. Load XDG config (lowest precedence)
        if let Some(xdg_path) = self.get_xdg_config_path() {
            if let Ok(config) = self.load_file(&xdg_path) {
                merged_config = merge_configs(merged_config, config);
                loaded_files.push(xdg_path);
            }
        }

        // 2. Load global config
        if let Some(global_path) = self.get_global_config_path() {
            if let Ok(config) = self.load_file(&global_path) {
                merged_config = merge_configs(merged_config, config);
                loaded_files.push(global_path);
            }
        }

        // 3. Load local config (highest precedence)
        if let Some(local_path) = self.get_local_config_path() {
            if let Ok(config) = self.load_file(&local_path) {
                merged_config = merge_configs(merged_config, config);
                loaded_files.push(local_path);
            }
        }

        if self.verbose && loaded_files.len() > 1 {
            debug!(?loaded_files, "multiple config files merged, most local wins");
        }

        Ok(merged_config)
    }

    /// Get the local configuration file path (current directory).
    fn get_local_config_path(&self) -> Option<PathBuf> {
        let candidates = ["./.domain-directory.toml", "./domain-directory.toml"];

        for candidate in &candidates {
            let path = Path::new(candidate);
            if path.exists() {
                return Some(path.to_path_buf());
            }
        }

        None
    }

    /// Get the global configuration file path (home directory).
    fn get_global_config_path(&self) -> Option<PathBuf> {
        if let Some(home) = env::var_os("HOME") {
            let candidates = [".domain-directory.toml", "domain-directory.toml"];

            for candidate in &candidates {
                let path = Path::new(&home).join(candidate);
                if path.exists() {
                    return Some(path);
                }
            }
        }

        None
    }

    /// Get the XDG configuration file path.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("domain-directory").join("config.toml");
        if path.exists() {
            Some(path)
        } else {
            None
        }
    }

    /// Validate a configuration for common issues.
    fn validate_config(&self, config: &FileConfig) -> Result<(), DirectoryError> {
        if let Some(defaults) = &config.defaults {
            if let Some(concurrency) = defaults.concurrency {
                if concurrency == 0 || concurrency > 100 {
                    return Err(DirectoryError::config(
                        "Concurrency must be between 1 and 100",
                    ));
                }
            }

            if let Some(timeout_str) = &defaults.timeout {
                if parse_timeout_string(timeout_str).is_none() {
                    return Err(DirectoryError::config(format!(
                        "Invalid timeout format '{}'. Use format like '5s', '30s', '2m'",
                        timeout_str
                    )));
                }
            }

            if let Some(retries) = defaults.retries {
                if retries > 5 {
                    return Err(DirectoryError::config("Retries must be between 0 and 5"));
                }
            }

            if let Some(store_path) = &defaults.store_path {
                if store_path.trim().is_empty() {
                    return Err(DirectoryError::config("store_path cannot be empty"));
                }
            }
        }

        Ok(())
    }
}

/// Merge two configurations with proper precedence.
///
/// Values from `higher` take precedence over values from `lower`.
fn merge_configs(lower: FileConfig, higher: FileConfig) -> FileConfig {
    FileConfig {
        defaults: match (lower.defaults, higher.defaults) {
            (Some(mut lower_defaults), Some(higher_defaults)) => {
                if higher_defaults.store_path.is_some() {
                    lower_defaults.store_path = higher_defaults.store_path;
                }
                if higher_defaults.concurrency.is_some() {
                    lower_defaults.concurrency = higher_defaults.concurrency;
                }
                if higher_defaults.timeout.is_some() {
                    lower_defaults.timeout = higher_defaults.timeout;
                }
                if higher_defaults.retries.is_some() {
                    lower_defaults.retries = higher_defaults.retries;
                }
                if higher_defaults.enrich_on_add.is_some() {
                    lower_defaults.enrich_on_add = higher_defaults.enrich_on_add;
                }
                Some(lower_defaults)
            }
            (None, Some(higher_defaults)) => Some(higher_defaults),
            (Some(lower_defaults), None) => Some(lower_defaults),
            (None, None) => None,
        },
    }
}

/// Environment variable configuration that mirrors CLI options.
///
/// These are the values settable via `DD_*` environment variables.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub store_path: Option<String>,
    pub concurrency: Option<usize>,
    pub timeout: Option<String>,
    pub retries: Option<u32>,
    pub enrich_on_add: Option<bool>,
}

/// Load configuration from environment variables.
///
/// Parses all `DD_*` environment variables. Invalid values are logged as
/// warnings and ignored; the environment never hard-fails a run.
pub fn load_env_config() -> EnvConfig {
    let mut env_config = EnvConfig::default();

    // DD_STORE - store file path
    if let Ok(path) = env::var("DD_STORE") {
        if !path.trim().is_empty() {
            debug!(%path, "using DD_STORE");
            env_config.store_path = Some(path);
        }
    }

    // DD_CONCURRENCY - bulk enrichment workers
    if let Ok(val) = env::var("DD_CONCURRENCY") {
        match val.parse::<usize>() {
            Ok(concurrency) if concurrency > 0 && concurrency <= 100 => {
                debug!(concurrency, "using DD_CONCURRENCY");
                env_config.concurrency = Some(concurrency);
            }
            _ => warn!(value = %val, "invalid DD_CONCURRENCY, must be 1-100"),
        }
    }

    // DD_TIMEOUT - per-lookup timeout
    if let Ok(timeout_str) = env::var("DD_TIMEOUT") {
        if parse_timeout_string(&timeout_str).is_some() {
            debug!(timeout = %timeout_str, "using DD_TIMEOUT");
            env_config.timeout = Some(timeout_str);
        } else {
            warn!(
                value = %timeout_str,
                "invalid DD_TIMEOUT, use format like '5s', '30s', '2m'"
            );
        }
    }

    // DD_RETRIES - lookup retries
    if let Ok(val) = env::var("DD_RETRIES") {
        match val.parse::<u32>() {
            Ok(retries) if retries <= 5 => {
                debug!(retries, "using DD_RETRIES");
                env_config.retries = Some(retries);
            }
            _ => warn!(value = %val, "invalid DD_RETRIES, must be 0-5"),
        }
    }

    // DD_ENRICH_ON_ADD - enrich newly added domains
    if let Ok(val) = env::var("DD_ENRICH_ON_ADD") {
        match val.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => env_config.enrich_on_add = Some(true),
            "false" | "0" | "no" | "off" => env_config.enrich_on_add = Some(false),
            _ => warn!(value = %val, "invalid DD_ENRICH_ON_ADD, use true/false"),
        }
    }

    env_config
}

/// Parse a timeout string like "5s", "30s", "2m" into seconds.
pub fn parse_timeout_string(timeout_str: &str) -> Option<u64> {
    let timeout_str = timeout_str.trim().to_lowercase();

    if timeout_str.ends_with('s') {
        timeout_str
            .strip_suffix('s')
            .and_then(|s| s.parse::<u64>().ok())
    } else if timeout_str.ends_with('m') {
        timeout_str
            .strip_suffix('m')
            .and_then(|s| s.parse::<u64>().ok())
            .map(|m| m * 60)
    } else {
        // Assume seconds if no unit
        timeout_str.parse::<u64>().ok()
    }
}
