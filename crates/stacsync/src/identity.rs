// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Content-derived asset identifiers

use assetmeta::AttributeMap;
use sha2::{Digest, Sha256};
use std::path::Path;

/// SHA-256 hex digest of the attribute values (canonical text, in order)
/// joined with `_`, followed by `_` and the path the attributes came from.
///
/// Null values take part as `None`, so two files that differ only in an
/// absent attribute still hash differently from files where it is present.
pub fn asset_id(path: &Path, attributes: &AttributeMap) -> String {
    let mut text = attributes.canonical_values().join("_");
    text.push('_');
    text.push_str(&path.to_string_lossy());
    hex::encode(Sha256::digest(text.as_bytes()))
}
