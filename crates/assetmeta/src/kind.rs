// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::attributes::AttributeMap;
use crate::error::{FormatError, Result};
use crate::{imagery, pointcloud, raster, vector};
use diagnostics::*;
use std::fmt;
use std::fs::File;
use std::path::Path;

/// Closed set of file formats the cataloguer understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    GeoJson,
    Las,
    Csv,
    Shapefile,
    GeoTiff,
    Jpeg,
    Png,
    FlatGeobuf,
}

impl FileKind {
    pub const ALL: [FileKind; 8] = [
        FileKind::GeoJson,
        FileKind::Las,
        FileKind::Csv,
        FileKind::Shapefile,
        FileKind::GeoTiff,
        FileKind::Jpeg,
        FileKind::Png,
        FileKind::FlatGeobuf,
    ];

    /// Select by extension, including the leading dot. Matching is
    /// case-sensitive: `.tif` is recognised, `.TIF` is not.
    pub fn from_extension(extension: &str) -> Result<Self> {
        match extension {
            ".geojson" => Ok(FileKind::GeoJson),
            ".las" => Ok(FileKind::Las),
            ".csv" => Ok(FileKind::Csv),
            ".shp" => Ok(FileKind::Shapefile),
            ".tif" => Ok(FileKind::GeoTiff),
            ".jpg" | ".jpeg" => Ok(FileKind::Jpeg),
            ".png" => Ok(FileKind::Png),
            ".fgb" => Ok(FileKind::FlatGeobuf),
            other => Err(FormatError::unsupported(other)),
        }
    }

    pub fn for_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_extension(&extension_of(path.as_ref()))
    }

    /// Media type recorded on assets of this kind
    pub fn media_type(self) -> &'static str {
        match self {
            FileKind::GeoJson => "application/geo+json",
            FileKind::Csv => "text/csv",
            FileKind::GeoTiff => "image/tif",
            FileKind::Jpeg => "image/jpeg",
            FileKind::Png => "image/png",
            FileKind::Las | FileKind::Shapefile | FileKind::FlatGeobuf => {
                "application/octet-stream"
            }
        }
    }

    /// Read `path` and return its attribute mapping
    pub fn extract<P: AsRef<Path>>(self, path: P) -> Result<AttributeMap> {
        let path = path.as_ref();
        let attributes = match self {
            FileKind::GeoJson => vector::geojson(path)?,
            FileKind::Shapefile => vector::shapefile(path)?,
            FileKind::FlatGeobuf => vector::flatgeobuf(path)?,
            FileKind::Las => pointcloud::las(path)?,
            FileKind::GeoTiff => raster::geotiff(path)?,
            FileKind::Jpeg | FileKind::Png => imagery::image(path, self)?,
            FileKind::Csv => {
                // Only the media type is recorded, but the file must exist
                File::open(path).map_err(|e| FormatError::extraction(path, e))?;
                let mut map = AttributeMap::new();
                map.insert(crate::MEDIA_TYPE, self.media_type());
                map
            }
        };

        let display = path.display().to_string();
        let count = attributes.len();
        debug!("Extracted {count} attributes from {display}", count: count, display: display);
        Ok(attributes)
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FileKind::GeoJson => "GeoJSON",
            FileKind::Las => "LAS point cloud",
            FileKind::Csv => "CSV",
            FileKind::Shapefile => "Shapefile",
            FileKind::GeoTiff => "GeoTIFF",
            FileKind::Jpeg => "JPEG",
            FileKind::Png => "PNG",
            FileKind::FlatGeobuf => "FlatGeobuf",
        };
        f.write_str(name)
    }
}

/// Extension with its leading dot, or an empty string when there is none
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

/// Dispatch on the extension of `path` and extract its attributes
pub fn extract<P: AsRef<Path>>(path: P) -> Result<AttributeMap> {
    let path = path.as_ref();
    FileKind::for_path(path)?.extract(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_listed_extension_is_recognised() {
        for ext in [
            ".geojson", ".las", ".csv", ".shp", ".tif", ".jpg", ".jpeg", ".png", ".fgb",
        ] {
            assert!(FileKind::from_extension(ext).is_ok(), "{ext} should be supported");
        }
        assert_eq!(FileKind::from_extension(".jpeg").ok(), Some(FileKind::Jpeg));
        assert_eq!(FileKind::from_extension(".jpg").ok(), Some(FileKind::Jpeg));
    }

    #[test]
    fn test_unknown_extension_carries_extension() {
        match FileKind::from_extension(".xyz") {
            Err(FormatError::UnsupportedFormat { extension }) => assert_eq!(extension, ".xyz"),
            other => panic!("expected UnsupportedFormat, got {:?}", other),
        }
    }

    #[test]
    fn test_extension_match_is_case_sensitive() {
        assert!(FileKind::from_extension(".TIF").is_err());
        assert!(FileKind::for_path("scan.GeoJSON").is_err());
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of(Path::new("/data/a.b/scan.tif")), ".tif");
        assert_eq!(extension_of(Path::new("README")), "");
        assert_eq!(extension_of(Path::new(".bashrc")), "");
        assert!(FileKind::for_path("README").is_err());
    }

    #[test]
    fn test_csv_needs_only_media_type() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("readings.csv");
        std::fs::write(&path, "time,level\n2024-01-01,3.2\n").expect("write csv");

        let map = FileKind::Csv.extract(&path).expect("csv extraction");
        assert_eq!(map.keys(), vec![crate::MEDIA_TYPE]);
        assert_eq!(map.media_type(), Some("text/csv"));
    }

    #[test]
    fn test_missing_csv_fails_extraction() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("misspelt.csv");
        match FileKind::Csv.extract(&path) {
            Err(FormatError::ExtractionFailed { path: failed, .. }) => assert_eq!(failed, path),
            other => panic!("expected ExtractionFailed, got {:?}", other),
        }
    }
}
