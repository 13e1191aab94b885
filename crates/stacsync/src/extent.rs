// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Collection extent aggregation

use crate::client::{CatalogApi, Fetched};
use crate::error::{CatalogError, Result};
use crate::models::{BBox, Extent, Item};
use diagnostics::*;

/// Spatial and temporal bounds covering a set of items
#[derive(Debug, Clone, PartialEq)]
pub struct ExtentSummary {
    pub bbox: BBox,
    /// Earliest and latest item datetimes, compared as strings
    pub interval: [Option<String>; 2],
}

impl ExtentSummary {
    fn bbox_entry(&self) -> Vec<Option<f64>> {
        self.bbox.to_array().into_iter().map(Some).collect()
    }

    /// The extent's overall box and interval already equal this summary
    pub fn matches(&self, extent: &Extent) -> bool {
        extent.spatial.bbox.first() == Some(&self.bbox_entry())
            && extent.interval() == Some(&self.interval)
    }

    /// Replace the extent with a single box and a single interval
    pub fn apply_to(&self, extent: &mut Extent) {
        extent.spatial.bbox = vec![self.bbox_entry()];
        extent.temporal.interval = vec![self.interval.clone()];
    }
}

/// Union of item boxes and the min/max of item datetimes; `None` for no items
pub fn summarize(items: &[Item]) -> Option<ExtentSummary> {
    let (first, rest) = items.split_first()?;
    let bbox = rest
        .iter()
        .fold(first.bbox.horizontal(), |acc, item| acc.union(&item.bbox));

    let datetimes = items
        .iter()
        .filter_map(|item| item.properties.datetime.as_deref());
    let start = datetimes.clone().min().map(str::to_string);
    let end = datetimes.max().map(str::to_string);

    Some(ExtentSummary {
        bbox,
        interval: [start, end],
    })
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExtentChange {
    /// The collection is empty; its extent is left alone
    NoItems,
    Unchanged,
    Updated(ExtentSummary),
}

/// Recompute a collection's extent from its current items and write it back
/// only when it differs
pub fn refresh_collection_extent<C: CatalogApi + ?Sized>(
    catalog: &C,
    collection_id: &str,
) -> Result<ExtentChange> {
    let mut collection = match catalog.get_collection(collection_id)? {
        Fetched::Found(collection) => collection,
        Fetched::NotFound => return Err(CatalogError::CollectionNotFound(collection_id.to_string())),
    };

    let items = catalog.list_items(&collection)?;
    let Some(summary) = summarize(&items) else {
        debug!(
            "Collection {collection_id} has no items; extent left as is",
            collection_id: collection_id
        );
        return Ok(ExtentChange::NoItems);
    };

    if summary.matches(&collection.extent) {
        debug!("Extent of {collection_id} is current", collection_id: collection_id);
        return Ok(ExtentChange::Unchanged);
    }

    summary.apply_to(&mut collection.extent);
    catalog.put_collection(&collection)?;

    let item_count = items.len();
    info!(
        "Updated extent of {collection_id} from {item_count} items",
        collection_id: collection_id,
        item_count: item_count
    );
    Ok(ExtentChange::Updated(summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{Call, MemoryCatalog};
    use crate::models::{Collection, Geometry};
    use std::collections::BTreeMap;

    fn item(id: &str, bbox: BBox, datetime: &str) -> Item {
        Item::new(
            id,
            "ds",
            bbox,
            Geometry::polygon(&bbox),
            datetime.to_string(),
            BTreeMap::new(),
        )
    }

    #[test]
    fn test_summarize_union_and_interval() {
        let items = vec![
            item("a", BBox::new(0.0, 0.0, 1.0, 1.0), "2024-03-01T00:00:00Z"),
            item("b", BBox::new(-2.0, 0.5, 0.5, 3.0), "2024-01-15T12:00:00Z"),
            item("c", BBox::new(0.0, -1.0, 4.0, 0.0), "2024-02-01T00:00:00Z"),
        ];
        let summary = summarize(&items).expect("non-empty");
        assert_eq!(summary.bbox, BBox::new(-2.0, -1.0, 4.0, 3.0));
        assert_eq!(
            summary.interval,
            [
                Some("2024-01-15T12:00:00Z".to_string()),
                Some("2024-03-01T00:00:00Z".to_string())
            ]
        );
    }

    #[test]
    fn test_summarize_empty_and_single() {
        assert_eq!(summarize(&[]), None);

        let bbox = BBox::new(1.0, 2.0, 3.0, 4.0);
        let summary = summarize(&[item("a", bbox, "2024-01-01T00:00:00Z")]).expect("one item");
        assert_eq!(summary.bbox, bbox);
        assert_eq!(summary.interval[0], summary.interval[1]);
    }

    #[test]
    fn test_refresh_writes_once() {
        let catalog = MemoryCatalog::new();
        catalog.insert_collection(Collection::new("ds", "MIT"));
        catalog.insert_item("ds", item("a", BBox::new(0.0, 0.0, 1.0, 1.0), "2024-01-01T00:00:00Z"));

        let change = refresh_collection_extent(&catalog, "ds").expect("refresh");
        assert!(matches!(change, ExtentChange::Updated(_)));
        let stored = catalog.collection("ds").expect("collection");
        assert_eq!(stored.extent.bbox(), Some(BBox::new(0.0, 0.0, 1.0, 1.0)));

        catalog.clear_calls();
        let change = refresh_collection_extent(&catalog, "ds").expect("refresh again");
        assert_eq!(change, ExtentChange::Unchanged);
        assert_eq!(
            catalog.calls(),
            vec![
                Call::GetCollection("ds".into()),
                Call::ListItems("ds".into())
            ]
        );
    }

    #[test]
    fn test_refresh_empty_collection() {
        let catalog = MemoryCatalog::new();
        catalog.insert_collection(Collection::new("ds", "MIT"));
        assert_eq!(
            refresh_collection_extent(&catalog, "ds").expect("refresh"),
            ExtentChange::NoItems
        );
        assert_eq!(catalog.collection("ds").expect("collection").extent, Extent::unset());
    }

    #[test]
    fn test_refresh_missing_collection() {
        let catalog = MemoryCatalog::new();
        assert!(matches!(
            refresh_collection_extent(&catalog, "nope"),
            Err(CatalogError::CollectionNotFound(_))
        ));
    }
}
