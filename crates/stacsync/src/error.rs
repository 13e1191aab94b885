// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use assetmeta::FormatError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CatalogError>;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("Failed to resolve cell {cell_id:?}: {reason}")]
    GeoResolutionFailed { cell_id: String, reason: String },

    /// Non-2xx response, or no response at all (`status` is `None`)
    #[error("{operation} failed{}: {message}", status_suffix(.status))]
    Transport {
        operation: String,
        status: Option<u16>,
        message: String,
    },

    #[error("{operation} returned an unreadable body: {source}")]
    Decode {
        operation: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Collection {0:?} does not exist")]
    CollectionNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    status
        .map(|code| format!(" with HTTP status {}", code))
        .unwrap_or_default()
}

impl CatalogError {
    pub fn transport<O: Into<String>, M: Into<String>>(
        operation: O,
        status: Option<u16>,
        message: M,
    ) -> Self {
        CatalogError::Transport {
            operation: operation.into(),
            status,
            message: message.into(),
        }
    }

    /// HTTP status carried by a transport failure
    pub fn status(&self) -> Option<u16> {
        match self {
            CatalogError::Transport { status, .. } => *status,
            _ => None,
        }
    }
}
