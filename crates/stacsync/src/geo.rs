// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Grid cell footprints

use crate::error::{CatalogError, Result};
use crate::models::{BBox, Geometry};

/// Spatial footprint of a grid cell
#[derive(Debug, Clone, PartialEq)]
pub struct Footprint {
    pub bbox: BBox,
    pub geometry: Geometry,
}

impl Footprint {
    pub fn from_bbox(bbox: BBox) -> Self {
        Footprint {
            geometry: Geometry::polygon(&bbox),
            bbox,
        }
    }
}

/// Resolves a cell identifier to the footprint an item for that cell covers
pub trait GeoLookup {
    fn resolve(&self, cell_id: &str) -> Result<Footprint>;
}

const BASE32: &[u8; 32] = b"0123456789bcdefghjkmnpqrstuvwxyz";

/// Cell ids are geohashes; a cell's footprint is its geohash rectangle
#[derive(Debug, Clone, Copy, Default)]
pub struct GeohashGrid;

impl GeoLookup for GeohashGrid {
    fn resolve(&self, cell_id: &str) -> Result<Footprint> {
        let bbox = decode_geohash(cell_id).map_err(|reason| CatalogError::GeoResolutionFailed {
            cell_id: cell_id.to_string(),
            reason,
        })?;
        Ok(Footprint::from_bbox(bbox))
    }
}

/// Bounding rectangle of a geohash (case-insensitive)
pub fn decode_geohash(hash: &str) -> std::result::Result<BBox, String> {
    if hash.is_empty() {
        return Err("empty geohash".to_string());
    }

    let (mut lon, mut lat) = ((-180.0f64, 180.0f64), (-90.0f64, 90.0f64));
    let mut even = true;
    for ch in hash.chars() {
        let lower = ch.to_ascii_lowercase();
        let bits = BASE32
            .iter()
            .position(|&c| char::from(c) == lower)
            .ok_or_else(|| format!("invalid geohash character {:?}", ch))?;

        for shift in (0..5).rev() {
            let range = if even { &mut lon } else { &mut lat };
            let mid = (range.0 + range.1) / 2.0;
            if (bits >> shift) & 1 == 1 {
                range.0 = mid;
            } else {
                range.1 = mid;
            }
            even = !even;
        }
    }

    Ok(BBox::new(lon.0, lat.0, lon.1, lat.1))
}
