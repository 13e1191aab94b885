// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Per-format metadata extraction for catalog assets
//!
//! A file's extension selects a [`FileKind`]; the kind's extractor opens the
//! file and returns an [`AttributeMap`] whose key order is fixed per format.
//!
//! | Extension | Keys, in order |
//! |---|---|
//! | `.geojson`, `.shp`, `.fgb` | `media_type`, `no_of_features`, `geometry_type` |
//! | `.las` | `media_type`, `no_of_features`, `geometry_type` (`Point Cloud`) |
//! | `.csv` | `media_type` |
//! | `.tif` | `media_type`, `num_bands`, `dimensions`, `spatial_resolution`, `geometry_type` |
//! | `.jpg`, `.jpeg`, `.png` | `dimensions`, `color_space`, `compression`, EXIF camera fields, `media_type` |
//!
//! ```no_run
//! let attributes = assetmeta::extract("/data/survey/area.geojson")?;
//! assert_eq!(attributes.media_type(), Some("application/geo+json"));
//! # Ok::<(), assetmeta::FormatError>(())
//! ```

mod attributes;
mod error;
mod imagery;
mod kind;
mod pointcloud;
mod raster;
mod vector;

pub use attributes::{AttrValue, AttributeMap, MEDIA_TYPE};
pub use error::{FormatError, Result};
pub use kind::{FileKind, extension_of, extract};
pub use vector::UNKNOWN_GEOMETRY;
