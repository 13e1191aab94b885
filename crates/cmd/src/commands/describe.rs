// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use anyhow::{Result, anyhow};
use assetmeta::{AttrValue, FileKind};
use std::path::Path;

/// Describe local files as they would be cataloged, without contacting the
/// catalog service
///
/// Every file is attempted; the command fails afterwards if any could not be
/// described.
pub fn describe_command<P, F>(files: &[P], verbose: bool, mut handler: F) -> Result<()>
where
    P: AsRef<Path>,
    F: FnMut(&str),
{
    let mut failed = 0usize;
    for file in files {
        let path = file.as_ref();
        match describe_file(path, verbose) {
            Ok(text) => handler(&text),
            Err(e) => {
                failed += 1;
                handler(&format!("❌ {}: {:#}\n", path.display(), e));
            }
        }
    }

    if failed > 0 {
        return Err(anyhow!("{} of {} files could not be described", failed, files.len()));
    }
    Ok(())
}

fn describe_file(path: &Path, verbose: bool) -> Result<String> {
    let kind = FileKind::for_path(path)?;
    let attributes = kind.extract(path)?;
    let id = stacsync::asset_id(path, &attributes);

    let mut out = format!("📄 {} [{}]\n", path.display(), kind);
    for (key, value) in attributes.iter() {
        let text = match value {
            AttrValue::Null => "-".to_string(),
            AttrValue::Text(text) => text.clone(),
            other => other.canonical_text(),
        };
        out.push_str(&format!("   {:<20} {}\n", key, text));
    }
    out.push_str(&format!("   {:<20} {}\n", "asset id", id));

    if verbose {
        let asset = stacsync::asset_from_attributes(&path.to_string_lossy(), &attributes);
        let json = serde_json::to_string_pretty(&asset)?;
        for line in json.lines() {
            out.push_str(&format!("   {}\n", line));
        }
    }
    Ok(out)
}
