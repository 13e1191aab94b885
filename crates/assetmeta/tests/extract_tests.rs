// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Extraction over small synthetic files of every supported format

use assetmeta::{AttrValue, FileKind, FormatError, MEDIA_TYPE, extract};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, bytes).expect("write fixture");
    path
}

fn text(value: &str) -> AttrValue {
    AttrValue::Text(value.to_string())
}

fn point_shapefile(points: &[(f64, f64)]) -> Vec<u8> {
    let record_len = 8 + 20;
    let total = 100 + points.len() * record_len;
    let mut buf = vec![0u8; 100];
    buf[0..4].copy_from_slice(&9994i32.to_be_bytes());
    buf[24..28].copy_from_slice(&((total / 2) as i32).to_be_bytes());
    buf[28..32].copy_from_slice(&1000i32.to_le_bytes());
    buf[32..36].copy_from_slice(&1i32.to_le_bytes());
    for (n, (x, y)) in points.iter().enumerate() {
        buf.extend_from_slice(&((n + 1) as i32).to_be_bytes());
        buf.extend_from_slice(&10i32.to_be_bytes());
        buf.extend_from_slice(&1i32.to_le_bytes());
        buf.extend_from_slice(&x.to_le_bytes());
        buf.extend_from_slice(&y.to_le_bytes());
    }
    buf
}

fn flatgeobuf(geometry_type: u8, has_z: bool, features: u64) -> Vec<u8> {
    // Header table with a 9-slot vtable; only slots 2, 3 and 8 are set
    let mut header = vec![0u8; 44];
    header[0..4].copy_from_slice(&28u32.to_le_bytes());
    header[4..6].copy_from_slice(&22u16.to_le_bytes());
    header[6..8].copy_from_slice(&16u16.to_le_bytes());
    header[12..14].copy_from_slice(&4u16.to_le_bytes());
    header[14..16].copy_from_slice(&5u16.to_le_bytes());
    header[24..26].copy_from_slice(&8u16.to_le_bytes());
    header[28..32].copy_from_slice(&24i32.to_le_bytes());
    header[32] = geometry_type;
    header[33] = u8::from(has_z);
    header[36..44].copy_from_slice(&features.to_le_bytes());

    let mut buf = b"fgb\x03fgb\x00".to_vec();
    buf.extend_from_slice(&(header.len() as u32).to_le_bytes());
    buf.extend_from_slice(&header);
    buf
}

fn las_1_2(points: u32) -> Vec<u8> {
    let mut buf = vec![0u8; 227];
    buf[0..4].copy_from_slice(b"LASF");
    buf[24] = 1;
    buf[25] = 2;
    buf[94..96].copy_from_slice(&227u16.to_le_bytes());
    buf[107..111].copy_from_slice(&points.to_le_bytes());
    buf
}

#[test]
fn test_geojson_feature_collection() {
    let dir = TempDir::new().expect("tempdir");
    let path = write(
        &dir,
        "parcels.geojson",
        br#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{},"geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]}},
            {"type":"Feature","properties":{},"geometry":{"type":"Polygon","coordinates":[[[2,2],[3,2],[3,3],[2,2]]]}},
            {"type":"Feature","properties":{},"geometry":{"type":"Polygon","coordinates":[[[4,4],[5,4],[5,5],[4,4]]]}}
        ]}"#,
    );

    let map = extract(&path).expect("extract geojson");
    assert_eq!(map.keys(), vec![MEDIA_TYPE, "no_of_features", "geometry_type"]);
    assert_eq!(map.media_type(), Some("application/geo+json"));
    assert_eq!(map.get("no_of_features"), Some(&AttrValue::Int(3)));
    assert_eq!(map.get("geometry_type"), Some(&text("Polygon")));
}

#[test]
fn test_malformed_geojson_is_extraction_failure() {
    let dir = TempDir::new().expect("tempdir");
    let path = write(&dir, "broken.geojson", b"{ not json");
    match extract(&path) {
        Err(FormatError::ExtractionFailed { path: failed, .. }) => assert_eq!(failed, path),
        other => panic!("expected ExtractionFailed, got {:?}", other),
    }
}

#[test]
fn test_shapefile_counts_records() {
    let dir = TempDir::new().expect("tempdir");
    let path = write(&dir, "wells.shp", &point_shapefile(&[(1.0, 2.0), (3.0, 4.0), (5.0, 6.0)]));

    let map = extract(&path).expect("extract shp");
    assert_eq!(map.media_type(), Some("application/octet-stream"));
    assert_eq!(map.get("no_of_features"), Some(&AttrValue::Int(3)));
    assert_eq!(map.get("geometry_type"), Some(&text("Point")));
}

#[test]
fn test_truncated_shapefile_fails() {
    let dir = TempDir::new().expect("tempdir");
    let mut bytes = point_shapefile(&[(1.0, 2.0), (3.0, 4.0)]);
    bytes.truncate(bytes.len() - 10);
    // header still declares the full length
    let path = write(&dir, "cut.shp", &bytes);
    assert!(matches!(extract(&path), Err(FormatError::ExtractionFailed { .. })));
}

#[test]
fn test_flatgeobuf_header() {
    let dir = TempDir::new().expect("tempdir");
    let path = write(&dir, "roads.fgb", &flatgeobuf(5, false, 42));
    let map = extract(&path).expect("extract fgb");
    assert_eq!(map.get("no_of_features"), Some(&AttrValue::Int(42)));
    assert_eq!(map.get("geometry_type"), Some(&text("MultiLineString")));

    let path = write(&dir, "terrain.fgb", &flatgeobuf(1, true, 7));
    let map = extract(&path).expect("extract 3d fgb");
    assert_eq!(map.get("geometry_type"), Some(&text("3D Point")));
}

#[test]
fn test_flatgeobuf_bad_magic() {
    let dir = TempDir::new().expect("tempdir");
    let path = write(&dir, "fake.fgb", b"GIF89a and then some");
    assert!(matches!(extract(&path), Err(FormatError::ExtractionFailed { .. })));
}

#[test]
fn test_las_point_count() {
    let dir = TempDir::new().expect("tempdir");
    let path = write(&dir, "lidar.las", &las_1_2(98_765));
    let map = extract(&path).expect("extract las");
    assert_eq!(map.keys(), vec![MEDIA_TYPE, "no_of_features", "geometry_type"]);
    assert_eq!(map.get("no_of_features"), Some(&AttrValue::Int(98_765)));
    assert_eq!(map.get("geometry_type"), Some(&text("Point Cloud")));
}

#[test]
fn test_png_dimensions_and_mode() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("tile.png");
    image::RgbaImage::new(8, 6).save(&path).expect("encode png");

    let map = extract(&path).expect("extract png");
    assert_eq!(
        map.keys(),
        vec!["dimensions", "color_space", "compression", MEDIA_TYPE]
    );
    assert_eq!(map.get("dimensions"), Some(&AttrValue::Pair(8, 6)));
    assert_eq!(map.get("color_space"), Some(&text("RGBA")));
    assert_eq!(map.get("compression"), Some(&AttrValue::Null));
    assert_eq!(map.media_type(), Some("image/png"));
}

#[test]
fn test_jpeg_without_exif() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("photo.jpeg");
    image::RgbImage::new(16, 9).save(&path).expect("encode jpeg");

    let map = extract(&path).expect("extract jpeg");
    assert_eq!(map.get("dimensions"), Some(&AttrValue::Pair(16, 9)));
    assert_eq!(map.get("color_space"), Some(&text("RGB")));
    assert!(map.get("capture_time").is_none());
    assert_eq!(map.media_type(), Some("image/jpeg"));
    assert_eq!(
        map.canonical_values(),
        vec!["(16, 9)", "RGB", "None", "image/jpeg"]
    );
}

#[test]
fn test_greyscale_jpeg_mode() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("scan.jpg");
    image::GrayImage::new(4, 4).save(&path).expect("encode jpeg");

    let map = extract(&path).expect("extract jpeg");
    assert_eq!(map.get("color_space"), Some(&text("L")));
}

#[test]
fn test_tiff_bands_and_shape() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("ortho.tif");
    let file = fs::File::create(&path).expect("create tif");
    let mut encoder = tiff::encoder::TiffEncoder::new(file).expect("tiff encoder");
    encoder
        .write_image::<tiff::encoder::colortype::RGB8>(5, 3, &[0u8; 45])
        .expect("write tif");

    let map = extract(&path).expect("extract tif");
    assert_eq!(
        map.keys(),
        vec![MEDIA_TYPE, "num_bands", "dimensions", "spatial_resolution", "geometry_type"]
    );
    assert_eq!(map.media_type(), Some("image/tif"));
    assert_eq!(map.get("num_bands"), Some(&AttrValue::Int(3)));
    assert_eq!(map.get("dimensions"), Some(&AttrValue::Pair(3, 5)));
    // not georeferenced: identity transform
    assert_eq!(map.get("spatial_resolution"), Some(&AttrValue::Float(1.0)));
    assert_eq!(
        map.canonical_values(),
        vec!["image/tif", "3", "(3, 5)", "1.0", "Raster"]
    );
    assert_eq!(map.get("geometry_type"), Some(&text("Raster")));
}

#[test]
fn test_geotiff_pixel_scale() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("dem.tif");
    let file = fs::File::create(&path).expect("create tif");
    let mut encoder = tiff::encoder::TiffEncoder::new(file).expect("tiff encoder");
    let mut image = encoder
        .new_image::<tiff::encoder::colortype::Gray8>(4, 2)
        .expect("new image");
    image
        .encoder()
        .write_tag(tiff::tags::Tag::ModelPixelScaleTag, &[0.25f64, 0.25, 0.0][..])
        .expect("pixel scale");
    image.write_data(&[0u8; 8]).expect("write data");

    let map = extract(&path).expect("extract geotiff");
    assert_eq!(map.get("num_bands"), Some(&AttrValue::Int(1)));
    assert_eq!(map.get("spatial_resolution"), Some(&AttrValue::Float(0.25)));
}

#[test]
fn test_missing_file_is_extraction_failure() {
    let missing = Path::new("/definitely/not/here/lidar.las");
    assert!(matches!(
        FileKind::Las.extract(missing),
        Err(FormatError::ExtractionFailed { .. })
    ));
}

#[test]
fn test_unsupported_extension() {
    match extract("notes.xyz") {
        Err(FormatError::UnsupportedFormat { extension }) => assert_eq!(extension, ".xyz"),
        other => panic!("expected UnsupportedFormat, got {:?}", other),
    }
}
