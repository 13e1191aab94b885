// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Feature counting for GeoJSON, ESRI Shapefile and FlatGeobuf

use crate::attributes::{AttributeMap, MEDIA_TYPE};
use crate::error::{FormatError, Result};
use crate::kind::FileKind;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

/// Reported when features disagree on geometry type, or there are none
pub const UNKNOWN_GEOMETRY: &str = "Unknown";

fn vector_attributes(kind: FileKind, features: u64, geometry_type: String) -> AttributeMap {
    let mut map = AttributeMap::new();
    map.insert(MEDIA_TYPE, kind.media_type());
    map.insert("no_of_features", features);
    map.insert("geometry_type", geometry_type);
    map
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| FormatError::extraction(path, e))
}

pub(crate) fn geojson(path: &Path) -> Result<AttributeMap> {
    let reader = BufReader::new(open(path)?);
    let doc: Value = serde_json::from_reader(reader).map_err(|e| FormatError::extraction(path, e))?;
    let (features, geometry_type) =
        summarize_geojson(&doc).map_err(|msg| FormatError::extraction(path, msg))?;
    Ok(vector_attributes(FileKind::GeoJson, features, geometry_type))
}

/// Count features and find their common geometry type
fn summarize_geojson(doc: &Value) -> std::result::Result<(u64, String), String> {
    let doc_type = doc
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| "GeoJSON document has no \"type\" member".to_string())?;

    let geometries: Vec<Option<(&str, bool)>> = match doc_type {
        "FeatureCollection" => doc
            .get("features")
            .and_then(Value::as_array)
            .ok_or_else(|| "FeatureCollection has no \"features\" array".to_string())?
            .iter()
            .map(|feature| feature.get("geometry").and_then(geometry_shape))
            .collect(),
        "Feature" => vec![doc.get("geometry").and_then(geometry_shape)],
        // A bare geometry reads as a single feature
        _ => vec![geometry_shape(doc)],
    };

    let types: BTreeSet<&str> = geometries.iter().flatten().map(|(name, _)| *name).collect();
    let has_z = geometries.iter().flatten().any(|(_, z)| *z);
    let geometry_type = match (types.len(), types.into_iter().next()) {
        (1, Some(name)) if has_z => format!("3D {}", name),
        (1, Some(name)) => name.to_string(),
        _ => UNKNOWN_GEOMETRY.to_string(),
    };
    Ok((geometries.len() as u64, geometry_type))
}

/// Geometry type name and whether any position carries a third ordinate
fn geometry_shape(geometry: &Value) -> Option<(&str, bool)> {
    let name = geometry.get("type")?.as_str()?;
    let has_z = match geometry.get("geometries").and_then(Value::as_array) {
        Some(members) => members
            .iter()
            .filter_map(geometry_shape)
            .any(|(_, z)| z),
        None => geometry.get("coordinates").is_some_and(positions_have_z),
    };
    Some((name, has_z))
}

fn positions_have_z(coordinates: &Value) -> bool {
    match coordinates.as_array() {
        Some(values) if values.first().is_some_and(Value::is_number) => values.len() >= 3,
        Some(values) => values.iter().any(positions_have_z),
        None => false,
    }
}

const SHP_FILE_CODE: i32 = 9994;
const SHP_HEADER_LEN: u64 = 100;

pub(crate) fn shapefile(path: &Path) -> Result<AttributeMap> {
    let file = open(path)?;
    let actual_len = file
        .metadata()
        .map_err(|e| FormatError::extraction(path, e))?
        .len();
    let mut reader = BufReader::new(file);
    let (shape_type, declared_len) =
        read_shp_header(&mut reader).map_err(|e| FormatError::extraction(path, e))?;
    let end = declared_len.min(actual_len);
    let features = count_shp_records(&mut reader, end).map_err(|e| FormatError::extraction(path, e))?;
    Ok(vector_attributes(
        FileKind::Shapefile,
        features,
        shape_type_name(shape_type).to_string(),
    ))
}

/// Returns the shape type and the declared file length in bytes
fn read_shp_header<R: Read>(reader: &mut R) -> std::io::Result<(i32, u64)> {
    let mut header = [0u8; SHP_HEADER_LEN as usize];
    reader.read_exact(&mut header)?;

    let file_code = i32::from_be_bytes([header[0], header[1], header[2], header[3]]);
    if file_code != SHP_FILE_CODE {
        return Err(invalid_data(format!("not a shapefile (file code {})", file_code)));
    }
    let length_words = i32::from_be_bytes([header[24], header[25], header[26], header[27]]);
    let shape_type = i32::from_le_bytes([header[32], header[33], header[34], header[35]]);
    Ok((shape_type, u64::from(length_words.max(0) as u32) * 2))
}

/// Walk record headers from the end of the file header up to `end`
fn count_shp_records<R: Read + Seek>(reader: &mut R, end: u64) -> std::io::Result<u64> {
    let mut pos = reader.seek(SeekFrom::Start(SHP_HEADER_LEN))?;
    let mut count = 0u64;
    let mut record_header = [0u8; 8];
    while pos + 8 <= end {
        reader.read_exact(&mut record_header)?;
        let content_words = i32::from_be_bytes([
            record_header[4],
            record_header[5],
            record_header[6],
            record_header[7],
        ]);
        if content_words < 0 {
            return Err(invalid_data(format!("negative record length at offset {}", pos)));
        }
        let content_len = u64::from(content_words as u32) * 2;
        if pos + 8 + content_len > end {
            return Err(invalid_data(format!("truncated record at offset {}", pos)));
        }
        pos = reader.seek(SeekFrom::Current(content_len as i64))?;
        count += 1;
    }
    Ok(count)
}

fn shape_type_name(shape_type: i32) -> &'static str {
    match shape_type {
        1 | 21 => "Point",
        3 | 23 => "LineString",
        5 | 25 => "Polygon",
        8 | 28 => "MultiPoint",
        11 => "3D Point",
        13 => "3D LineString",
        15 => "3D Polygon",
        18 => "3D MultiPoint",
        31 => "3D MultiPolygon",
        _ => UNKNOWN_GEOMETRY,
    }
}

const FGB_MAGIC_PREFIX: &[u8; 3] = b"fgb";
// Largest header accepted before treating the file as corrupt
const FGB_MAX_HEADER: u32 = 10 * 1024 * 1024;

// Field slots in the FlatGeobuf Header table
const FGB_FIELD_GEOMETRY_TYPE: usize = 2;
const FGB_FIELD_HAS_Z: usize = 3;
const FGB_FIELD_FEATURES_COUNT: usize = 8;

pub(crate) fn flatgeobuf(path: &Path) -> Result<AttributeMap> {
    let mut reader = BufReader::new(open(path)?);
    let header = read_fgb_header(&mut reader).map_err(|e| FormatError::extraction(path, e))?;
    let summary = FgbHeader::parse(&header)
        .ok_or_else(|| FormatError::extraction(path, "malformed FlatGeobuf header"))?;

    let mut geometry_type = fgb_geometry_name(summary.geometry_type).to_string();
    if summary.has_z && geometry_type != UNKNOWN_GEOMETRY {
        geometry_type = format!("3D {}", geometry_type);
    }
    Ok(vector_attributes(
        FileKind::FlatGeobuf,
        summary.features_count,
        geometry_type,
    ))
}

fn read_fgb_header<R: Read>(reader: &mut R) -> std::io::Result<Vec<u8>> {
    let mut magic = [0u8; 8];
    reader.read_exact(&mut magic)?;
    if &magic[0..3] != FGB_MAGIC_PREFIX || &magic[4..7] != FGB_MAGIC_PREFIX {
        return Err(invalid_data("not a FlatGeobuf file".to_string()));
    }

    let mut size = [0u8; 4];
    reader.read_exact(&mut size)?;
    let size = u32::from_le_bytes(size);
    if size > FGB_MAX_HEADER {
        return Err(invalid_data(format!("header size {} too large", size)));
    }

    let mut header = vec![0u8; size as usize];
    reader.read_exact(&mut header)?;
    Ok(header)
}

/// The few Header table fields the cataloguer reports
#[derive(Debug, PartialEq)]
struct FgbHeader {
    geometry_type: u8,
    has_z: bool,
    features_count: u64,
}

impl FgbHeader {
    /// Read scalar fields straight out of the flatbuffer table
    fn parse(buf: &[u8]) -> Option<Self> {
        let table = le_u32(buf, 0)? as usize;
        let vtable_offset = le_i32(buf, table)?;
        let vtable = usize::try_from(table as i64 - i64::from(vtable_offset)).ok()?;
        let vtable_len = le_u16(buf, vtable)? as usize;

        let field = |slot: usize| -> Option<usize> {
            let entry = 4 + 2 * slot;
            if entry + 2 > vtable_len {
                return Some(0);
            }
            le_u16(buf, vtable + entry).map(usize::from)
        };

        let geometry_type = match field(FGB_FIELD_GEOMETRY_TYPE)? {
            0 => 0,
            off => *buf.get(table + off)?,
        };
        let has_z = match field(FGB_FIELD_HAS_Z)? {
            0 => false,
            off => *buf.get(table + off)? != 0,
        };
        let features_count = match field(FGB_FIELD_FEATURES_COUNT)? {
            0 => 0,
            off => le_u64(buf, table + off)?,
        };

        Some(FgbHeader {
            geometry_type,
            has_z,
            features_count,
        })
    }
}

fn fgb_geometry_name(code: u8) -> &'static str {
    match code {
        1 => "Point",
        2 => "LineString",
        3 => "Polygon",
        4 => "MultiPoint",
        5 => "MultiLineString",
        6 => "MultiPolygon",
        7 => "GeometryCollection",
        8 => "CircularString",
        9 => "CompoundCurve",
        10 => "CurvePolygon",
        11 => "MultiCurve",
        12 => "MultiSurface",
        13 => "Curve",
        14 => "Surface",
        15 => "PolyhedralSurface",
        16 => "TIN",
        17 => "Triangle",
        _ => UNKNOWN_GEOMETRY,
    }
}

fn le_u16(buf: &[u8], at: usize) -> Option<u16> {
    Some(u16::from_le_bytes(buf.get(at..at + 2)?.try_into().ok()?))
}

fn le_u32(buf: &[u8], at: usize) -> Option<u32> {
    Some(u32::from_le_bytes(buf.get(at..at + 4)?.try_into().ok()?))
}

fn le_i32(buf: &[u8], at: usize) -> Option<i32> {
    Some(i32::from_le_bytes(buf.get(at..at + 4)?.try_into().ok()?))
}

fn le_u64(buf: &[u8], at: usize) -> Option<u64> {
    Some(u64::from_le_bytes(buf.get(at..at + 8)?.try_into().ok()?))
}

fn invalid_data(msg: String) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidData, msg)
}
