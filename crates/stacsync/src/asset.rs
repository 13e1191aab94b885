// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Turning local files into catalog assets

use crate::identity::asset_id;
use crate::models::Asset;
use assetmeta::{AttributeMap, FileKind, FormatError, MEDIA_TYPE};
use diagnostics::*;
use serde_json::Map;
use std::path::{Path, PathBuf};

/// A file to catalog and the href it is published under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetSource {
    pub path: PathBuf,
    pub href: String,
}

impl AssetSource {
    pub fn new<P: Into<PathBuf>, H: Into<String>>(path: P, href: H) -> Self {
        Self {
            path: path.into(),
            href: href.into(),
        }
    }

    /// Publish the file under its own path
    pub fn local<P: Into<PathBuf>>(path: P) -> Self {
        let path = path.into();
        let href = path.to_string_lossy().into_owned();
        Self { path, href }
    }
}

/// An asset ready to be placed in an item, keyed by its content id
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedAsset {
    pub id: String,
    pub kind: FileKind,
    pub asset: Asset,
}

/// Asset record from already-extracted attributes: the media type becomes the
/// asset type and every other non-null attribute becomes an extra field
pub fn asset_from_attributes(href: &str, attributes: &AttributeMap) -> Asset {
    let mut extra_fields = Map::new();
    for (key, value) in attributes.iter() {
        if key == MEDIA_TYPE {
            continue;
        }
        if let Some(json) = value.to_json() {
            extra_fields.insert(key.to_string(), json);
        }
    }
    Asset {
        href: href.to_string(),
        media_type: attributes.media_type().map(str::to_string),
        extra_fields,
    }
}

/// Extract `path` and build the asset record published under `href`
pub fn build_asset(path: &Path, href: &str) -> Result<Asset, FormatError> {
    let attributes = assetmeta::extract(path)?;
    Ok(asset_from_attributes(href, &attributes))
}

/// Extract once and derive both the id and the asset record
pub fn prepare_asset(source: &AssetSource) -> Result<PreparedAsset, FormatError> {
    let kind = FileKind::for_path(&source.path)?;
    let attributes = kind.extract(&source.path)?;
    let id = asset_id(&source.path, &attributes);
    let asset = asset_from_attributes(&source.href, &attributes);

    let display = source.path.display().to_string();
    debug!("Prepared asset {id} from {display}", id: id.as_str(), display: display);

    Ok(PreparedAsset { id, kind, asset })
}
