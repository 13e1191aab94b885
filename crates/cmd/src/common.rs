// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use anyhow::{Context, Result};
use stacsync::{CatalogConfig, HttpCatalog};
use std::path::PathBuf;

/// Where commands find the catalog service
#[derive(Debug, Clone, Default)]
pub struct CatalogContext {
    /// YAML configuration file; without one, `CATALOG_SERVICE` must be set
    pub config_path: Option<PathBuf>,
    pub verbose: bool,
}

impl CatalogContext {
    pub fn new(config_path: Option<PathBuf>, verbose: bool) -> Self {
        Self {
            config_path,
            verbose,
        }
    }

    pub fn load_config(&self) -> Result<CatalogConfig> {
        match &self.config_path {
            Some(path) => stacsync::load_config(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display())),
            None => CatalogConfig::from_env().with_context(|| {
                format!(
                    "No --config given and {} is not usable",
                    stacsync::CATALOG_SERVICE_ENV
                )
            }),
        }
    }

    pub fn open_catalog(&self) -> Result<HttpCatalog> {
        let config = self.load_config()?;
        let service = config.catalog_service.as_str();
        diagnostics::debug!("Using catalog service {service}", service: service);
        HttpCatalog::new(&config).with_context(|| "Failed to create catalog client")
    }
}
