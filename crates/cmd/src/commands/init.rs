// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use anyhow::{Context, Result};
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "cataloguer.yaml";

/// Write an example configuration file
pub fn init_command<F>(path: &Path, mut handler: F) -> Result<()>
where
    F: FnMut(&str),
{
    stacsync::create_example_config(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    handler(&format!("✅ Wrote example configuration to {}\n", path.display()));
    handler(&format!(
        "Edit catalog_service, or set {} to override it.\n",
        stacsync::CATALOG_SERVICE_ENV
    ));
    Ok(())
}
