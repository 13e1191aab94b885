// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! STAC documents as exchanged with the catalog service
//!
//! Only the fields the reconciler reads or writes are typed; everything else
//! a server returns is kept in `extra` maps and written back unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const STAC_VERSION: &str = "1.0.0";

fn stac_version() -> String {
    STAC_VERSION.to_string()
}

fn collection_type() -> String {
    "Collection".to_string()
}

fn feature_type() -> String {
    "Feature".to_string()
}

/// Axis-aligned box `[left, bottom, right, top]`
///
/// A six-element (3D) box keeps its vertical range in `elevation` and is
/// written back with six elements. Aggregation only uses the horizontal part.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct BBox {
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
    pub top: f64,
    /// `[min_z, max_z]` of a 3D box
    pub elevation: Option<[f64; 2]>,
}

impl BBox {
    pub fn new(left: f64, bottom: f64, right: f64, top: f64) -> Self {
        Self {
            left,
            bottom,
            right,
            top,
            elevation: None,
        }
    }

    #[must_use]
    pub fn with_elevation(mut self, min_z: f64, max_z: f64) -> Self {
        self.elevation = Some([min_z, max_z]);
        self
    }

    /// The same box without its vertical range
    #[must_use]
    pub fn horizontal(&self) -> BBox {
        BBox::new(self.left, self.bottom, self.right, self.top)
    }

    /// Smallest horizontal box covering both
    #[must_use]
    pub fn union(&self, other: &BBox) -> BBox {
        BBox::new(
            self.left.min(other.left),
            self.bottom.min(other.bottom),
            self.right.max(other.right),
            self.top.max(other.top),
        )
    }

    pub fn to_array(self) -> [f64; 4] {
        [self.left, self.bottom, self.right, self.top]
    }
}

impl TryFrom<Vec<f64>> for BBox {
    type Error = String;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        match values.as_slice() {
            [left, bottom, right, top] => Ok(BBox::new(*left, *bottom, *right, *top)),
            [left, bottom, min_z, right, top, max_z] => {
                Ok(BBox::new(*left, *bottom, *right, *top).with_elevation(*min_z, *max_z))
            }
            other => Err(format!(
                "bbox must have 4 or 6 numbers, found {}",
                other.len()
            )),
        }
    }
}

impl From<BBox> for Vec<f64> {
    fn from(bbox: BBox) -> Self {
        match bbox.elevation {
            Some([min_z, max_z]) => {
                vec![bbox.left, bbox.bottom, min_z, bbox.right, bbox.top, max_z]
            }
            None => bbox.to_array().to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: Value,
}

impl Geometry {
    /// Closed five-point ring tracing the box corners
    pub fn polygon(bbox: &BBox) -> Self {
        let BBox {
            left,
            bottom,
            right,
            top,
            ..
        } = *bbox;
        Geometry {
            kind: "Polygon".to_string(),
            coordinates: serde_json::json!([[
                [left, bottom],
                [left, top],
                [right, top],
                [right, bottom],
                [left, bottom]
            ]]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub rel: String,
    pub href: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn find_link<'a>(links: &'a [Link], rel: &str) -> Option<&'a Link> {
    links.iter().find(|link| link.rel == rel)
}

/// One entry of an item's asset map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub href: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    /// Extracted attributes other than the media type, flattened onto the asset
    #[serde(flatten)]
    pub extra_fields: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialExtent {
    /// Each box is `[left, bottom, right, top]`; `None` marks an unset bound
    pub bbox: Vec<Vec<Option<f64>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalExtent {
    pub interval: Vec<[Option<String>; 2]>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub spatial: SpatialExtent,
    pub temporal: TemporalExtent,
}

impl Extent {
    /// Placeholder extent for a collection that has no items yet
    pub fn unset() -> Self {
        Extent {
            spatial: SpatialExtent {
                bbox: vec![vec![None; 4]],
            },
            temporal: TemporalExtent {
                interval: vec![[None, None]],
            },
        }
    }

    /// Horizontal part of the overall (first) box, when every bound is set
    pub fn bbox(&self) -> Option<BBox> {
        let first = self.spatial.bbox.first()?;
        let values: Option<Vec<f64>> = first.iter().copied().collect();
        BBox::try_from(values?).ok().map(|bbox| bbox.horizontal())
    }

    /// The overall (first) interval
    pub fn interval(&self) -> Option<&[Option<String>; 2]> {
        self.temporal.interval.first()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    #[serde(rename = "type", default = "collection_type")]
    pub kind: String,
    #[serde(default = "stac_version")]
    pub stac_version: String,
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub license: String,
    pub extent: Extent,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Collection {
    pub fn new(id: &str, license: &str) -> Self {
        Collection {
            kind: collection_type(),
            stac_version: stac_version(),
            id: id.to_string(),
            description: String::new(),
            license: license.to_string(),
            extent: Extent::unset(),
            links: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn link(&self, rel: &str) -> Option<&Link> {
        find_link(&self.links, rel)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Properties {
    /// RFC 3339 instant; `None` when the item only carries a range
    pub datetime: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(rename = "type", default = "feature_type")]
    pub kind: String,
    #[serde(default = "stac_version")]
    pub stac_version: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
    pub bbox: BBox,
    pub geometry: Option<Geometry>,
    pub properties: Properties,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub assets: BTreeMap<String, Asset>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Item {
    pub fn new(
        id: &str,
        collection_id: &str,
        bbox: BBox,
        geometry: Geometry,
        datetime: String,
        assets: BTreeMap<String, Asset>,
    ) -> Self {
        Item {
            kind: feature_type(),
            stac_version: stac_version(),
            id: id.to_string(),
            collection: Some(collection_id.to_string()),
            bbox,
            geometry: Some(geometry),
            properties: Properties {
                datetime: Some(datetime),
                extra: Map::new(),
            },
            links: Vec::new(),
            assets,
            extra: Map::new(),
        }
    }
}

/// A page of items as returned by `/collections/{id}/items`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemCollection {
    #[serde(default)]
    pub features: Vec<Item>,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl ItemCollection {
    pub fn next_link(&self) -> Option<&Link> {
        find_link(&self.links, "next")
    }
}

/// Item id for a grid cell within a collection
pub fn item_id(cell_id: &str, collection_id: &str) -> String {
    format!("{}_{}", cell_id, collection_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_item_id() {
        assert_eq!(item_id("te", "ds"), "te_ds");
    }

    #[test]
    fn test_bbox_serializes_as_array() {
        let bbox = BBox::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(serde_json::to_value(bbox).expect("serialize"), json!([1.0, 2.0, 3.0, 4.0]));

        let three_d: BBox = serde_json::from_value(json!([1.0, 2.0, -5.0, 3.0, 4.0, 50.0]))
            .expect("6-element bbox");
        assert_eq!(three_d.horizontal(), bbox);
        assert_eq!(three_d.elevation, Some([-5.0, 50.0]));

        assert!(serde_json::from_value::<BBox>(json!([1.0, 2.0])).is_err());
    }

    #[test]
    fn test_item_keeps_vertical_range() {
        let document = json!({
            "type": "Feature",
            "stac_version": "1.0.0",
            "id": "te_ds",
            "bbox": [1.0, 2.0, -5.0, 3.0, 4.0, 50.0],
            "geometry": null,
            "properties": {"datetime": "2024-01-01T00:00:00Z"},
            "links": [],
            "assets": {}
        });
        let item: Item = serde_json::from_value(document.clone()).expect("parse item");
        assert_eq!(item.bbox.to_array(), [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(serde_json::to_value(&item).expect("serialize"), document);

        let merged = item.bbox.union(&BBox::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(merged, BBox::new(0.0, 0.0, 3.0, 4.0));
    }

    #[test]
    fn test_polygon_ring() {
        let geometry = Geometry::polygon(&BBox::new(0.0, 10.0, 5.0, 20.0));
        assert_eq!(geometry.kind, "Polygon");
        assert_eq!(
            geometry.coordinates,
            json!([[[0.0, 10.0], [0.0, 20.0], [5.0, 20.0], [5.0, 10.0], [0.0, 10.0]]])
        );
    }

    #[test]
    fn test_new_collection_document() {
        let value = serde_json::to_value(Collection::new("ds", "CC-BY-4.0")).expect("serialize");
        assert_eq!(
            value,
            json!({
                "type": "Collection",
                "stac_version": "1.0.0",
                "id": "ds",
                "description": "",
                "license": "CC-BY-4.0",
                "extent": {
                    "spatial": {"bbox": [[null, null, null, null]]},
                    "temporal": {"interval": [[null, null]]}
                },
                "links": []
            })
        );
    }

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let document = json!({
            "type": "Feature",
            "stac_version": "1.0.0",
            "id": "te_ds",
            "collection": "ds",
            "bbox": [0.0, 0.0, 1.0, 1.0],
            "geometry": null,
            "properties": {"datetime": "2024-01-01T00:00:00Z", "platform": "drone"},
            "links": [{"rel": "self", "href": "http://stac/collections/ds/items/te_ds", "title": "me"}],
            "assets": {"abc": {"href": "/data/a.csv", "type": "text/csv", "roles": ["data"]}},
            "stac_extensions": []
        });
        let item: Item = serde_json::from_value(document.clone()).expect("parse item");
        assert_eq!(item.properties.extra.get("platform"), Some(&json!("drone")));
        assert_eq!(item.assets["abc"].media_type.as_deref(), Some("text/csv"));
        assert_eq!(serde_json::to_value(&item).expect("serialize"), document);
    }

    #[test]
    fn test_extent_accessors() {
        let unset = Extent::unset();
        assert_eq!(unset.bbox(), None);
        assert_eq!(unset.interval(), Some(&[None, None]));

        let extent: Extent = serde_json::from_value(json!({
            "spatial": {"bbox": [[-1.0, -2.0, 3.0, 4.0]]},
            "temporal": {"interval": [["2024-01-01T00:00:00Z", null]]}
        }))
        .expect("parse extent");
        assert_eq!(extent.bbox(), Some(BBox::new(-1.0, -2.0, 3.0, 4.0)));
    }
}
