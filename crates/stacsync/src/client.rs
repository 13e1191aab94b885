// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Catalog service access
//!
//! [`CatalogApi`] is the seam between the reconciler and a STAC transaction
//! service. [`HttpCatalog`] talks to a real one over HTTP.

use crate::config::CatalogConfig;
use crate::error::{CatalogError, Result};
use crate::models::{Collection, Item, ItemCollection};
use diagnostics::*;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use url::Url;

/// Result of reading a remote document; absence is not an error
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    Found(T),
    NotFound,
}

impl<T> Fetched<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Fetched::Found(_))
    }

    pub fn found(self) -> Option<T> {
        match self {
            Fetched::Found(value) => Some(value),
            Fetched::NotFound => None,
        }
    }
}

/// Operations the reconciler needs from a STAC transaction service
pub trait CatalogApi {
    fn get_collection(&self, collection_id: &str) -> Result<Fetched<Collection>>;

    fn get_item(&self, collection_id: &str, item_id: &str) -> Result<Fetched<Item>>;

    fn create_collection(&self, collection: &Collection) -> Result<()>;

    fn create_item(&self, collection_id: &str, item: &Item) -> Result<()>;

    /// Replace an existing collection document
    fn put_collection(&self, collection: &Collection) -> Result<()>;

    /// Replace an existing item document
    fn put_item(&self, collection_id: &str, item: &Item) -> Result<()>;

    fn delete_item(&self, collection_id: &str, item_id: &str) -> Result<()>;

    fn delete_collection(&self, collection_id: &str) -> Result<()>;

    /// Every item in the collection, across all pages
    fn list_items(&self, collection: &Collection) -> Result<Vec<Item>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadStatus {
    Ok,
    NotFound,
    Failed,
}

fn classify_read(status: StatusCode) -> ReadStatus {
    if status.is_success() {
        ReadStatus::Ok
    } else if status == StatusCode::NOT_FOUND {
        ReadStatus::NotFound
    } else {
        ReadStatus::Failed
    }
}

/// Blocking HTTP client for a STAC API with the transaction extension
pub struct HttpCatalog {
    http_client: Client,
    base_url: String,
    root: Url,
}

impl HttpCatalog {
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| {
                CatalogError::Config(format!("Failed to create HTTP client: {}", e))
            })?;

        let base_url = config.catalog_service.trim_end_matches('/').to_string();
        let root = Url::parse(&base_url)
            .map_err(|e| CatalogError::Config(format!("Invalid catalog_service URL: {}", e)))?;
        if root.cannot_be_a_base() {
            return Err(CatalogError::Config(format!(
                "catalog_service {} cannot hold paths",
                base_url
            )));
        }

        Ok(HttpCatalog {
            http_client,
            base_url,
            root,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET and decode a JSON document; 404 is `NotFound`
    fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<Fetched<T>> {
        let operation = format!("GET {}", url);
        debug!("Catalog request {operation}", operation: operation.as_str());

        let response = self
            .http_client
            .get(url)
            .send()
            .map_err(|e| CatalogError::transport(&operation, None, e.to_string()))?;

        let status = response.status();
        match classify_read(status) {
            ReadStatus::NotFound => return Ok(Fetched::NotFound),
            ReadStatus::Failed => {
                let error_text = response
                    .text()
                    .unwrap_or_else(|_| "Unknown error".to_string());
                return Err(CatalogError::transport(
                    operation,
                    Some(status.as_u16()),
                    error_text,
                ));
            }
            ReadStatus::Ok => {}
        }

        let json_text = response
            .text()
            .map_err(|e| CatalogError::transport(&operation, Some(status.as_u16()), e.to_string()))?;

        serde_json::from_str(&json_text)
            .map(Fetched::Found)
            .map_err(|source| CatalogError::Decode { operation, source })
    }

    /// Send a mutating request; any 2xx is success
    fn send(&self, method: reqwest::Method, url: &str, body: Option<String>) -> Result<()> {
        let operation = format!("{} {}", method, url);
        debug!("Catalog request {operation}", operation: operation.as_str());

        let mut request = self.http_client.request(method, url);
        if let Some(body) = body {
            request = request.header(CONTENT_TYPE, "application/json").body(body);
        }

        let response = request
            .send()
            .map_err(|e| CatalogError::transport(&operation, None, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(CatalogError::transport(
                operation,
                Some(status.as_u16()),
                error_text,
            ));
        }
        Ok(())
    }

    fn send_json<T: Serialize>(&self, method: reqwest::Method, url: &str, document: &T) -> Result<()> {
        let body = serde_json::to_string(document).map_err(|source| CatalogError::Decode {
            operation: format!("{} {}", method, url),
            source,
        })?;
        self.send(method, url, Some(body))
    }

    /// Absolute hrefs pass through; relative ones resolve against the service root
    fn resolve_href(&self, href: &str) -> String {
        if Url::parse(href).is_ok() {
            return href.to_string();
        }
        Url::parse(&format!("{}/", self.base_url))
            .and_then(|base| base.join(href))
            .map(String::from)
            .unwrap_or_else(|_| href.to_string())
    }

    // URL construction helpers; every id is one percent-encoded path segment
    fn endpoint(root: &Url, segments: &[&str]) -> String {
        let mut url = root.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url.into()
    }

    fn collections_url(root: &Url) -> String {
        Self::endpoint(root, &["collections"])
    }

    fn collection_url(root: &Url, collection_id: &str) -> String {
        Self::endpoint(root, &["collections", collection_id])
    }

    fn items_url(root: &Url, collection_id: &str) -> String {
        Self::endpoint(root, &["collections", collection_id, "items"])
    }

    fn item_url(root: &Url, collection_id: &str, item_id: &str) -> String {
        Self::endpoint(root, &["collections", collection_id, "items", item_id])
    }
}

impl CatalogApi for HttpCatalog {
    fn get_collection(&self, collection_id: &str) -> Result<Fetched<Collection>> {
        self.fetch_json(&Self::collection_url(&self.root, collection_id))
    }

    fn get_item(&self, collection_id: &str, item_id: &str) -> Result<Fetched<Item>> {
        self.fetch_json(&Self::item_url(&self.root, collection_id, item_id))
    }

    fn create_collection(&self, collection: &Collection) -> Result<()> {
        let url = Self::collections_url(&self.root);
        self.send_json(reqwest::Method::POST, &url, collection)
    }

    fn create_item(&self, collection_id: &str, item: &Item) -> Result<()> {
        let url = Self::items_url(&self.root, collection_id);
        self.send_json(reqwest::Method::POST, &url, item)
    }

    fn put_collection(&self, collection: &Collection) -> Result<()> {
        let url = Self::collections_url(&self.root);
        self.send_json(reqwest::Method::PUT, &url, collection)
    }

    fn put_item(&self, collection_id: &str, item: &Item) -> Result<()> {
        let url = Self::item_url(&self.root, collection_id, &item.id);
        self.send_json(reqwest::Method::PUT, &url, item)
    }

    fn delete_item(&self, collection_id: &str, item_id: &str) -> Result<()> {
        let url = Self::item_url(&self.root, collection_id, item_id);
        self.send(reqwest::Method::DELETE, &url, None)
    }

    fn delete_collection(&self, collection_id: &str) -> Result<()> {
        let url = Self::collection_url(&self.root, collection_id);
        self.send(reqwest::Method::DELETE, &url, None)
    }

    fn list_items(&self, collection: &Collection) -> Result<Vec<Item>> {
        let first = collection
            .link("items")
            .map(|link| self.resolve_href(&link.href))
            .unwrap_or_else(|| Self::items_url(&self.root, &collection.id));

        let mut items = Vec::new();
        let mut visited = HashSet::new();
        let mut next = Some(first);

        while let Some(url) = next.take() {
            if !visited.insert(url.clone()) {
                warn!("Item pagination revisited {url}, stopping", url: url.as_str());
                break;
            }

            let page: ItemCollection = match self.fetch_json(&url)? {
                Fetched::Found(page) => page,
                Fetched::NotFound => {
                    return Err(CatalogError::CollectionNotFound(collection.id.clone()));
                }
            };

            next = page.next_link().map(|link| self.resolve_href(&link.href));
            items.extend(page.features);
        }

        let count = items.len();
        let collection_id = collection.id.as_str();
        debug!(
            "Listed {count} items in {collection_id}",
            count: count,
            collection_id: collection_id
        );
        Ok(items)
    }
}
