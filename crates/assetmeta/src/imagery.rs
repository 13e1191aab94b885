// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! JPEG and PNG: dimensions, colour mode and camera EXIF fields

use crate::attributes::{AttrValue, AttributeMap, MEDIA_TYPE};
use crate::error::{FormatError, Result};
use crate::kind::FileKind;
use diagnostics::*;
use exif::{Exif, In, Tag};
use image::codecs::jpeg::JpegDecoder;
use image::codecs::png::PngDecoder;
use image::{ColorType, ImageDecoder};
use std::fs::File;
use std::io::{self, BufReader, Read, Seek};
use std::path::Path;

/// EXIF tags copied onto image assets, in tag-number order
const CAMERA_TAGS: [(Tag, &str); 3] = [
    (Tag::Make, "camera_make"),
    (Tag::Model, "camera_model"),
    (Tag::DateTimeOriginal, "capture_time"),
];

pub(crate) fn image(path: &Path, kind: FileKind) -> Result<AttributeMap> {
    let reader = BufReader::new(File::open(path).map_err(|e| FormatError::extraction(path, e))?);
    let ((width, height), color) = match kind {
        FileKind::Png => {
            let decoder = PngDecoder::new(reader).map_err(|e| FormatError::extraction(path, e))?;
            (decoder.dimensions(), decoder.color_type())
        }
        _ => {
            let decoder = JpegDecoder::new(reader).map_err(|e| FormatError::extraction(path, e))?;
            (decoder.dimensions(), decoder.color_type())
        }
    };

    let color_space = match stored_mode(path, kind)? {
        Some(mode) => mode.to_string(),
        None => color_mode(color),
    };

    let mut map = AttributeMap::new();
    map.insert("dimensions", (u64::from(width), u64::from(height)));
    map.insert("color_space", color_space);
    map.insert("compression", AttrValue::Null);

    if let Some(exif) = read_exif(path)? {
        for (tag, key) in CAMERA_TAGS {
            if let Some(value) = exif_text(&exif, tag) {
                map.insert(key, value);
            }
        }
    }

    map.insert(MEDIA_TYPE, kind.media_type());
    Ok(map)
}

/// Mode of the pixels as stored in the file, before any decoder expansion
/// (palette PNGs stay `P`, four-component JPEGs stay `CMYK`)
fn stored_mode(path: &Path, kind: FileKind) -> Result<Option<&'static str>> {
    let mut reader = BufReader::new(File::open(path).map_err(|e| FormatError::extraction(path, e))?);
    let mode = match kind {
        FileKind::Png => png_mode(&mut reader),
        _ => jpeg_components(&mut reader).map(|components| components.and_then(jpeg_mode)),
    };
    mode.map_err(|e| FormatError::extraction(path, e))
}

/// Mode from the IHDR bit depth and colour type
fn png_mode<R: Read>(reader: &mut R) -> io::Result<Option<&'static str>> {
    let mut header = [0u8; 26];
    reader.read_exact(&mut header)?;
    if &header[12..16] != b"IHDR" {
        return Ok(None);
    }
    let (bit_depth, color_type) = (header[24], header[25]);
    Ok(match (color_type, bit_depth) {
        (0, 1) => Some("1"),
        (0, 16) => Some("I;16"),
        (0, _) => Some("L"),
        (2, _) => Some("RGB"),
        (3, _) => Some("P"),
        (4, _) => Some("LA"),
        (6, _) => Some("RGBA"),
        _ => None,
    })
}

fn jpeg_mode(components: u8) -> Option<&'static str> {
    match components {
        1 => Some("L"),
        3 => Some("RGB"),
        4 => Some("CMYK"),
        _ => None,
    }
}

/// Component count from the first start-of-frame segment
fn jpeg_components<R: Read + Seek>(reader: &mut BufReader<R>) -> io::Result<Option<u8>> {
    let mut soi = [0u8; 2];
    reader.read_exact(&mut soi)?;
    if soi != [0xFF, 0xD8] {
        return Ok(None);
    }

    let mut byte = [0u8; 1];
    loop {
        reader.read_exact(&mut byte)?;
        if byte[0] != 0xFF {
            continue;
        }
        // Skip fill bytes
        while byte[0] == 0xFF {
            reader.read_exact(&mut byte)?;
        }
        let marker = byte[0];
        match marker {
            0x01 | 0xD0..=0xD8 => continue,
            // Scan data or end of image before any frame header
            0xD9 | 0xDA => return Ok(None),
            _ => {}
        }

        let mut length = [0u8; 2];
        reader.read_exact(&mut length)?;
        let length = u16::from_be_bytes(length);
        if is_start_of_frame(marker) {
            // precision, height, width, component count
            let mut frame = [0u8; 6];
            reader.read_exact(&mut frame)?;
            return Ok(Some(frame[5]));
        }
        reader.seek_relative(i64::from(length) - 2)?;
    }
}

fn is_start_of_frame(marker: u8) -> bool {
    matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC)
}

/// Conventional short name for a decoded pixel layout
fn color_mode(color: ColorType) -> String {
    match color {
        ColorType::L8 => "L".to_string(),
        ColorType::La8 | ColorType::La16 => "LA".to_string(),
        ColorType::Rgb8 | ColorType::Rgb16 => "RGB".to_string(),
        ColorType::Rgba8 | ColorType::Rgba16 => "RGBA".to_string(),
        ColorType::L16 => "I;16".to_string(),
        other => format!("{:?}", other),
    }
}

/// Files without EXIF (or with an unreadable block) yield `None`; only I/O
/// failures are errors
fn read_exif(path: &Path) -> Result<Option<Exif>> {
    let file = File::open(path).map_err(|e| FormatError::extraction(path, e))?;
    let mut reader = BufReader::new(file);
    match exif::Reader::new().read_from_container(&mut reader) {
        Ok(exif) => Ok(Some(exif)),
        Err(exif::Error::Io(e)) => Err(FormatError::extraction(path, e)),
        Err(e) => {
            let display = path.display().to_string();
            let reason = e.to_string();
            debug!("No usable EXIF in {display}: {reason}", display: display, reason: reason);
            Ok(None)
        }
    }
}

/// Raw tag text with trailing NULs and padding removed
fn exif_text(exif: &Exif, tag: Tag) -> Option<String> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    let text = match &field.value {
        exif::Value::Ascii(parts) => parts
            .first()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())?,
        _ => field.display_value().to_string().replace(['\\', '"'], ""),
    };
    let text = text.trim_end_matches(['\0', ' ']).to_string();
    if text.is_empty() { None } else { Some(text) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_color_modes() {
        assert_eq!(color_mode(ColorType::Rgb8), "RGB");
        assert_eq!(color_mode(ColorType::Rgba8), "RGBA");
        assert_eq!(color_mode(ColorType::L8), "L");
        assert_eq!(color_mode(ColorType::L16), "I;16");
    }

    fn png_header(bit_depth: u8, color_type: u8) -> Vec<u8> {
        let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13];
        bytes.extend_from_slice(b"IHDR");
        bytes.extend_from_slice(&4u32.to_be_bytes());
        bytes.extend_from_slice(&2u32.to_be_bytes());
        bytes.extend_from_slice(&[bit_depth, color_type, 0, 0, 0]);
        bytes
    }

    #[test]
    fn test_png_stored_modes() {
        let mode = |depth, color| {
            png_mode(&mut Cursor::new(png_header(depth, color))).expect("header")
        };
        assert_eq!(mode(8, 3), Some("P"));
        assert_eq!(mode(8, 2), Some("RGB"));
        assert_eq!(mode(16, 2), Some("RGB"));
        assert_eq!(mode(8, 6), Some("RGBA"));
        assert_eq!(mode(8, 4), Some("LA"));
        assert_eq!(mode(1, 0), Some("1"));
        assert_eq!(mode(16, 0), Some("I;16"));
        assert!(png_mode(&mut Cursor::new(vec![0u8; 10])).is_err());
    }

    #[test]
    fn test_jpeg_components_after_app_segment() {
        let mut bytes = vec![0xFF, 0xD8];
        // APP0 with a 14-byte payload
        bytes.extend_from_slice(&[0xFF, 0xE0, 0x00, 0x10]);
        bytes.extend_from_slice(b"JFIF\0\x01\x01\0\0\x01\0\x01\0\0");
        // SOF2 (progressive), 8-bit, 2x4, four components
        bytes.extend_from_slice(&[0xFF, 0xC2, 0x00, 0x14, 8, 0, 2, 0, 4, 4]);
        bytes.extend_from_slice(&[1, 0x11, 0, 2, 0x11, 0, 3, 0x11, 0, 4, 0x11, 0]);

        let components = jpeg_components(&mut BufReader::new(Cursor::new(bytes))).expect("scan");
        assert_eq!(components, Some(4));
        assert_eq!(components.and_then(jpeg_mode), Some("CMYK"));

        // An empty DHT segment ahead of a greyscale baseline frame
        let huffman_first = vec![
            0xFF, 0xD8, 0xFF, 0xC4, 0x00, 0x02, 0xFF, 0xC0, 0x00, 0x0B, 8, 0, 1, 0, 1, 1,
        ];
        assert_eq!(
            jpeg_components(&mut BufReader::new(Cursor::new(huffman_first))).expect("scan"),
            Some(1)
        );
    }
}
