// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Reconcile local geospatial files with a remote STAC catalog
//!
//! One [`CatalogRequest`] names a collection, a grid cell and the files (or
//! asset ids) to add or remove. [`Reconciler::run`] observes the remote
//! collection and the cell's item, executes exactly one [`Plan`], and
//! refreshes the collection extent from the items that remain.
//!
//! ```no_run
//! use stacsync::{AssetSource, CatalogConfig, CatalogRequest, GeohashGrid, HttpCatalog, Reconciler};
//!
//! let catalog = HttpCatalog::new(&CatalogConfig::from_env()?)?;
//! let request = CatalogRequest::new("survey", "CC-BY-4.0", "te")
//!     .with_asset(AssetSource::local("/data/area.geojson"));
//! let report = Reconciler::new(&catalog, &GeohashGrid).run(&request)?;
//! assert!(report.succeeded());
//! # Ok::<(), stacsync::CatalogError>(())
//! ```

mod asset;
mod client;
mod config;
mod engine;
mod error;
mod extent;
mod geo;
mod identity;
pub mod memory;
mod models;

pub use asset::{AssetSource, PreparedAsset, asset_from_attributes, build_asset, prepare_asset};
pub use client::{CatalogApi, Fetched, HttpCatalog};
pub use config::{
    CATALOG_SERVICE_ENV, CatalogConfig, DEFAULT_TIMEOUT_SECONDS, create_example_config,
    load_config, load_config_with, validate_config,
};
pub use engine::{
    BatchPolicy, CatalogReport, CatalogRequest, Intent, Plan, Reconciler, RemoteState, Step,
    StepOutcome, StepStatus, decide, timestamp,
};
pub use error::{CatalogError, Result};
pub use extent::{ExtentChange, ExtentSummary, refresh_collection_extent, summarize};
pub use geo::{Footprint, GeoLookup, GeohashGrid, decode_geohash};
pub use identity::asset_id;
pub use models::{
    Asset, BBox, Collection, Extent, Geometry, Item, ItemCollection, Link, Properties,
    STAC_VERSION, SpatialExtent, TemporalExtent, item_id,
};
