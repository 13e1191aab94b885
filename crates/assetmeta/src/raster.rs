// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::attributes::{AttributeMap, MEDIA_TYPE};
use crate::error::{FormatError, Result};
use crate::kind::FileKind;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use tiff::decoder::Decoder;
use tiff::tags::Tag;

pub(crate) fn geotiff(path: &Path) -> Result<AttributeMap> {
    let file = File::open(path).map_err(|e| FormatError::extraction(path, e))?;
    let mut decoder = Decoder::new(BufReader::new(file)).map_err(|e| FormatError::extraction(path, e))?;

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| FormatError::extraction(path, e))?;
    let bands = match decoder
        .find_tag(Tag::SamplesPerPixel)
        .map_err(|e| FormatError::extraction(path, e))?
    {
        Some(value) => value.into_u32().map_err(|e| FormatError::extraction(path, e))?,
        None => 1,
    };
    let resolution = pixel_width(&mut decoder).map_err(|e| FormatError::extraction(path, e))?;

    let mut map = AttributeMap::new();
    map.insert(MEDIA_TYPE, FileKind::GeoTiff.media_type());
    map.insert("num_bands", bands);
    // Raster shape order: rows, then columns
    map.insert("dimensions", (u64::from(height), u64::from(width)));
    map.insert("spatial_resolution", resolution);
    map.insert("geometry_type", "Raster");
    Ok(map)
}

/// Pixel size for a raster without georeferencing (identity transform)
const IDENTITY_PIXEL_WIDTH: f64 = 1.0;

/// Horizontal pixel size in CRS units, from the GeoTIFF pixel scale or,
/// failing that, the model transformation matrix
fn pixel_width<R: Read + Seek>(decoder: &mut Decoder<R>) -> tiff::TiffResult<f64> {
    let width = if let Some(scale) = decoder.find_tag(Tag::ModelPixelScaleTag)? {
        scale.into_f64_vec()?.first().copied()
    } else if let Some(matrix) = decoder.find_tag(Tag::ModelTransformationTag)? {
        matrix.into_f64_vec()?.first().copied()
    } else {
        None
    };
    Ok(width.unwrap_or(IDENTITY_PIXEL_WIDTH))
}
