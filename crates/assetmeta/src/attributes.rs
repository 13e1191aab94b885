// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Ordered attribute mapping produced by every extractor
//!
//! Entries keep insertion order. Asset identities hash the canonical text of
//! each value in that order, so each extractor inserts its keys in a fixed
//! sequence.

use serde_json::Value;

/// Key present in every extractor's output
pub const MEDIA_TYPE: &str = "media_type";

/// One extracted attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// Attribute the format defines but the file does not carry
    Null,
    Text(String),
    Int(u64),
    Float(f64),
    /// Two-component size, e.g. `(width, height)`
    Pair(u64, u64),
}

impl AttrValue {
    pub fn is_null(&self) -> bool {
        matches!(self, AttrValue::Null)
    }

    /// Text used when hashing asset identities
    ///
    /// Integers print in decimal, floats in shortest round-trip form with a
    /// `.0` suffix when integral, pairs as `(a, b)` and nulls as `None`.
    pub fn canonical_text(&self) -> String {
        match self {
            AttrValue::Null => "None".to_string(),
            AttrValue::Text(s) => s.clone(),
            AttrValue::Int(n) => n.to_string(),
            AttrValue::Float(f) => float_text(*f),
            AttrValue::Pair(a, b) => format!("({}, {})", a, b),
        }
    }

    /// JSON form for asset bodies; `None` for nulls and non-finite floats
    pub fn to_json(&self) -> Option<Value> {
        match self {
            AttrValue::Null => None,
            AttrValue::Text(s) => Some(Value::String(s.clone())),
            AttrValue::Int(n) => Some(Value::from(*n)),
            AttrValue::Float(f) => serde_json::Number::from_f64(*f).map(Value::Number),
            AttrValue::Pair(a, b) => Some(Value::Array(vec![Value::from(*a), Value::from(*b)])),
        }
    }
}

fn float_text(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let magnitude = f.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        // Exponent form with a signed, two-digit exponent: 1e-05, 2.5e+16
        let sci = format!("{:e}", f);
        if let Some((mantissa, exponent)) = sci.split_once('e') {
            let exponent: i32 = exponent.parse().unwrap_or(0);
            let sign = if exponent < 0 { '-' } else { '+' };
            return format!("{}e{}{:02}", mantissa, sign, exponent.abs());
        }
        return sci;
    }
    let text = f.to_string();
    if text.contains('.') {
        text
    } else {
        format!("{}.0", text)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(value)
    }
}

impl From<u64> for AttrValue {
    fn from(value: u64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<u32> for AttrValue {
    fn from(value: u32) -> Self {
        AttrValue::Int(u64::from(value))
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Float(value)
    }
}

impl From<(u64, u64)> for AttrValue {
    fn from((a, b): (u64, u64)) -> Self {
        AttrValue::Pair(a, b)
    }
}

impl<T: Into<AttrValue>> From<Option<T>> for AttrValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(AttrValue::Null, Into::into)
    }
}

/// Insertion-ordered attribute mapping with unique keys
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeMap {
    entries: Vec<(&'static str, AttrValue)>,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; a replaced key keeps its original position
    pub fn insert<V: Into<AttrValue>>(&mut self, key: &'static str, value: V) {
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.entries.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    pub fn media_type(&self) -> Option<&str> {
        match self.get(MEDIA_TYPE) {
            Some(AttrValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &AttrValue)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    pub fn keys(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(k, _)| *k).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Canonical text of every value, in insertion order
    pub fn canonical_values(&self) -> Vec<String> {
        self.entries.iter().map(|(_, v)| v.canonical_text()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_order_and_replaces_in_place() {
        let mut map = AttributeMap::new();
        map.insert("dimensions", (640u64, 480u64));
        map.insert("color_space", "RGB");
        map.insert(MEDIA_TYPE, "image/png");
        map.insert("color_space", "RGBA");

        assert_eq!(map.keys(), vec!["dimensions", "color_space", MEDIA_TYPE]);
        assert_eq!(map.get("color_space"), Some(&AttrValue::from("RGBA")));
        assert_eq!(map.media_type(), Some("image/png"));
    }

    #[test]
    fn test_canonical_text() {
        assert_eq!(AttrValue::from(3u64).canonical_text(), "3");
        assert_eq!(AttrValue::from((640u64, 480u64)).canonical_text(), "(640, 480)");
        assert_eq!(AttrValue::Null.canonical_text(), "None");
        assert_eq!(AttrValue::from(Option::<u64>::None), AttrValue::Null);
        assert_eq!(AttrValue::from("Polygon").canonical_text(), "Polygon");
    }

    #[test]
    fn test_float_text() {
        assert_eq!(float_text(30.0), "30.0");
        assert_eq!(float_text(0.5), "0.5");
        assert_eq!(float_text(0.0), "0.0");
        assert_eq!(float_text(-2.25), "-2.25");
        assert_eq!(float_text(0.00001), "1e-05");
        assert_eq!(float_text(2.5e16), "2.5e+16");
        assert_eq!(float_text(0.0001), "0.0001");
    }

    #[test]
    fn test_to_json_skips_nulls() {
        assert_eq!(AttrValue::Null.to_json(), None);
        assert_eq!(AttrValue::Float(f64::NAN).to_json(), None);
        assert_eq!(
            AttrValue::from((3u64, 4u64)).to_json(),
            Some(serde_json::json!([3, 4]))
        );
    }
}
