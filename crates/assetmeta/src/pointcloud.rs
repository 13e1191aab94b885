// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::attributes::{AttributeMap, MEDIA_TYPE};
use crate::error::{FormatError, Result};
use crate::kind::FileKind;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const LAS_SIGNATURE: &[u8; 4] = b"LASF";
const LEGACY_HEADER_LEN: usize = 227;
const LAS14_HEADER_LEN: usize = 375;

const VERSION_MAJOR_AT: usize = 24;
const VERSION_MINOR_AT: usize = 25;
const HEADER_SIZE_AT: usize = 94;
const LEGACY_POINT_COUNT_AT: usize = 107;
const POINT_COUNT_AT: usize = 247;

pub(crate) fn las(path: &Path) -> Result<AttributeMap> {
    let mut file = File::open(path).map_err(|e| FormatError::extraction(path, e))?;
    let mut header = Vec::with_capacity(LAS14_HEADER_LEN);
    (&mut file)
        .take(LAS14_HEADER_LEN as u64)
        .read_to_end(&mut header)
        .map_err(|e| FormatError::extraction(path, e))?;

    let points = point_count(&header).map_err(|msg| FormatError::extraction(path, msg))?;

    let mut map = AttributeMap::new();
    map.insert(MEDIA_TYPE, FileKind::Las.media_type());
    map.insert("no_of_features", points);
    map.insert("geometry_type", "Point Cloud");
    Ok(map)
}

/// Point count from a public header block; LAS 1.4 stores a 64-bit count
fn point_count(header: &[u8]) -> std::result::Result<u64, String> {
    if header.len() < LEGACY_HEADER_LEN {
        return Err(format!("LAS header truncated at {} bytes", header.len()));
    }
    if &header[0..4] != LAS_SIGNATURE {
        return Err("missing LASF signature".to_string());
    }

    let version = (header[VERSION_MAJOR_AT], header[VERSION_MINOR_AT]);
    let header_size = u16::from_le_bytes([header[HEADER_SIZE_AT], header[HEADER_SIZE_AT + 1]]);

    if version >= (1, 4) && usize::from(header_size) >= LAS14_HEADER_LEN {
        let bytes = header
            .get(POINT_COUNT_AT..POINT_COUNT_AT + 8)
            .ok_or_else(|| "LAS 1.4 header truncated".to_string())?;
        let mut count = [0u8; 8];
        count.copy_from_slice(bytes);
        return Ok(u64::from_le_bytes(count));
    }

    let at = LEGACY_POINT_COUNT_AT;
    let legacy = u32::from_le_bytes([header[at], header[at + 1], header[at + 2], header[at + 3]]);
    Ok(u64::from(legacy))
}
