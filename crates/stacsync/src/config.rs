// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::error::{CatalogError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable naming the catalog service root URL
pub const CATALOG_SERVICE_ENV: &str = "CATALOG_SERVICE";

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 60;

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

/// Where the catalog service lives and how long to wait for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Root URL of the STAC transaction service
    pub catalog_service: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl CatalogConfig {
    pub fn new<S: Into<String>>(catalog_service: S) -> Self {
        Self {
            catalog_service: catalog_service.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECONDS,
        }
    }

    /// Configuration from `CATALOG_SERVICE` alone
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self> {
        let url = service_override(&lookup).ok_or_else(|| {
            CatalogError::Config(format!("{} is not set", CATALOG_SERVICE_ENV))
        })?;
        let config = Self::new(url);
        validate_config(&config)?;
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn service_override<F: Fn(&str) -> Option<String>>(lookup: &F) -> Option<String> {
    lookup(CATALOG_SERVICE_ENV).filter(|value| !value.trim().is_empty())
}

/// Load configuration from a YAML file; `CATALOG_SERVICE` overrides the
/// file's service URL
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CatalogConfig> {
    load_config_with(path, |key| std::env::var(key).ok())
}

pub fn load_config_with<P, F>(path: P, lookup: F) -> Result<CatalogConfig>
where
    P: AsRef<Path>,
    F: Fn(&str) -> Option<String>,
{
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        CatalogError::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;

    let mut config: CatalogConfig = serde_yaml_ng::from_str(&content).map_err(|e| {
        CatalogError::Config(format!("Failed to parse YAML configuration: {}", e))
    })?;

    if let Some(url) = service_override(&lookup) {
        config.catalog_service = url;
    }

    validate_config(&config)?;
    Ok(config)
}

/// Validate configuration
pub fn validate_config(config: &CatalogConfig) -> Result<()> {
    let url = url::Url::parse(&config.catalog_service).map_err(|e| {
        CatalogError::Config(format!(
            "catalog_service {:?} is not a valid URL: {}",
            config.catalog_service, e
        ))
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(CatalogError::Config(format!(
            "catalog_service must be an http or https URL, got scheme {:?}",
            url.scheme()
        )));
    }

    if config.timeout_secs == 0 {
        return Err(CatalogError::Config(
            "timeout_secs must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

/// Write a commented starter configuration; refuses to overwrite
pub fn create_example_config<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    if path.exists() {
        return Err(CatalogError::Config(format!(
            "{} already exists",
            path.display()
        )));
    }

    let example = format!(
        "# Cataloguer configuration\n\
         #\n\
         # {env} in the environment overrides catalog_service.\n\
         \n\
         # Root URL of the STAC transaction service\n\
         catalog_service: \"http://localhost:8082\"\n\
         \n\
         # Seconds to wait for each request\n\
         timeout_secs: {timeout}\n",
        env = CATALOG_SERVICE_ENV,
        timeout = DEFAULT_TIMEOUT_SECONDS,
    );

    std::fs::write(path, example).map_err(|e| {
        CatalogError::Config(format!("Failed to write {}: {}", path.display(), e))
    })
}
