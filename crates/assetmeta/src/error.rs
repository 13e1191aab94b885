// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FormatError>;

/// Errors raised while selecting or running a metadata extractor
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("Unsupported file type for file extension: {extension:?}")]
    UnsupportedFormat { extension: String },

    #[error("Failed to extract metadata from {}: {source}", path.display())]
    ExtractionFailed {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl FormatError {
    pub fn unsupported<S: Into<String>>(extension: S) -> Self {
        FormatError::UnsupportedFormat {
            extension: extension.into(),
        }
    }

    /// Wrap a reader error (or a plain message) for the file at `path`
    pub fn extraction<P, E>(path: P, source: E) -> Self
    where
        P: AsRef<Path>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        FormatError::ExtractionFailed {
            path: path.as_ref().to_path_buf(),
            source: source.into(),
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, FormatError::UnsupportedFormat { .. })
    }
}
