// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::common::CatalogContext;
use anyhow::{Result, anyhow};
use stacsync::{CatalogApi, Fetched};

/// Print a collection id followed by each of its items
pub fn list_command<F>(context: &CatalogContext, collection_id: &str, handler: F) -> Result<()>
where
    F: FnMut(&str),
{
    let catalog = context.open_catalog()?;
    list_collection(&catalog, collection_id, handler)
}

pub fn list_collection<C, F>(catalog: &C, collection_id: &str, mut handler: F) -> Result<()>
where
    C: CatalogApi + ?Sized,
    F: FnMut(&str),
{
    let collection = match catalog.get_collection(collection_id)? {
        Fetched::Found(collection) => collection,
        Fetched::NotFound => return Err(anyhow!("Collection {} does not exist", collection_id)),
    };

    let mut items = catalog.list_items(&collection)?;
    items.sort_by(|a, b| a.id.cmp(&b.id));

    handler(&format!("Collection {} ({} items)\n", collection.id, items.len()));
    for item in items {
        let datetime = item.properties.datetime.as_deref().unwrap_or("-");
        handler(&format!(
            "  {}  {}  {} assets\n",
            item.id,
            datetime,
            item.assets.len()
        ));
    }
    Ok(())
}
