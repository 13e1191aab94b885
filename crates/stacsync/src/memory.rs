// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! In-process catalog with the status semantics of a transaction service
//!
//! Every call is recorded so tests can assert the exact sequence of remote
//! operations; failures can be injected per call.

use crate::client::{CatalogApi, Fetched};
use crate::error::{CatalogError, Result};
use crate::models::{Collection, Item};
use std::cell::RefCell;
use std::collections::BTreeMap;

/// A recorded catalog call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    GetCollection(String),
    GetItem(String, String),
    CreateCollection(String),
    CreateItem(String, String),
    PutCollection(String),
    PutItem(String, String),
    DeleteItem(String, String),
    DeleteCollection(String),
    ListItems(String),
}

impl Call {
    fn operation(&self) -> String {
        match self {
            Call::GetCollection(c) => format!("GET /collections/{}", c),
            Call::GetItem(c, i) => format!("GET /collections/{}/items/{}", c, i),
            Call::CreateCollection(_) => "POST /collections".to_string(),
            Call::CreateItem(c, _) => format!("POST /collections/{}/items", c),
            Call::PutCollection(_) => "PUT /collections".to_string(),
            Call::PutItem(c, i) => format!("PUT /collections/{}/items/{}", c, i),
            Call::DeleteItem(c, i) => format!("DELETE /collections/{}/items/{}", c, i),
            Call::DeleteCollection(c) => format!("DELETE /collections/{}", c),
            Call::ListItems(c) => format!("GET /collections/{}/items", c),
        }
    }
}

#[derive(Debug, Default)]
struct State {
    collections: BTreeMap<String, Collection>,
    items: BTreeMap<String, BTreeMap<String, Item>>,
}

#[derive(Debug, Default)]
pub struct MemoryCatalog {
    state: RefCell<State>,
    calls: RefCell<Vec<Call>>,
    failures: RefCell<Vec<(Call, u16)>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a collection without recording a call
    pub fn insert_collection(&self, collection: Collection) {
        let mut state = self.state.borrow_mut();
        state.items.entry(collection.id.clone()).or_default();
        state.collections.insert(collection.id.clone(), collection);
    }

    /// Seed an item without recording a call; the collection need not exist
    pub fn insert_item(&self, collection_id: &str, item: Item) {
        self.state
            .borrow_mut()
            .items
            .entry(collection_id.to_string())
            .or_default()
            .insert(item.id.clone(), item);
    }

    /// Answer every future `call` with `status` instead of executing it
    pub fn fail_on(&self, call: Call, status: u16) {
        self.failures.borrow_mut().push((call, status));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn collection(&self, collection_id: &str) -> Option<Collection> {
        self.state.borrow().collections.get(collection_id).cloned()
    }

    pub fn item(&self, collection_id: &str, item_id: &str) -> Option<Item> {
        self.state
            .borrow()
            .items
            .get(collection_id)
            .and_then(|items| items.get(item_id))
            .cloned()
    }

    fn record(&self, call: Call) -> Result<()> {
        let injected = self
            .failures
            .borrow()
            .iter()
            .find(|(failing, _)| *failing == call)
            .map(|(_, status)| *status);
        let operation = call.operation();
        self.calls.borrow_mut().push(call);
        match injected {
            Some(status) => Err(CatalogError::transport(
                operation,
                Some(status),
                "injected failure",
            )),
            None => Ok(()),
        }
    }
}

fn rejected(call: &Call, status: u16, message: &str) -> CatalogError {
    CatalogError::transport(call.operation(), Some(status), message)
}

impl CatalogApi for MemoryCatalog {
    fn get_collection(&self, collection_id: &str) -> Result<Fetched<Collection>> {
        self.record(Call::GetCollection(collection_id.to_string()))?;
        Ok(match self.collection(collection_id) {
            Some(collection) => Fetched::Found(collection),
            None => Fetched::NotFound,
        })
    }

    fn get_item(&self, collection_id: &str, item_id: &str) -> Result<Fetched<Item>> {
        self.record(Call::GetItem(collection_id.to_string(), item_id.to_string()))?;
        Ok(match self.item(collection_id, item_id) {
            Some(item) => Fetched::Found(item),
            None => Fetched::NotFound,
        })
    }

    fn create_collection(&self, collection: &Collection) -> Result<()> {
        let call = Call::CreateCollection(collection.id.clone());
        self.record(call.clone())?;
        if self.collection(&collection.id).is_some() {
            return Err(rejected(&call, 409, "collection already exists"));
        }
        self.insert_collection(collection.clone());
        Ok(())
    }

    fn create_item(&self, collection_id: &str, item: &Item) -> Result<()> {
        let call = Call::CreateItem(collection_id.to_string(), item.id.clone());
        self.record(call.clone())?;
        if self.collection(collection_id).is_none() {
            return Err(rejected(&call, 404, "collection not found"));
        }
        if self.item(collection_id, &item.id).is_some() {
            return Err(rejected(&call, 409, "item already exists"));
        }
        self.insert_item(collection_id, item.clone());
        Ok(())
    }

    fn put_collection(&self, collection: &Collection) -> Result<()> {
        let call = Call::PutCollection(collection.id.clone());
        self.record(call.clone())?;
        if self.collection(&collection.id).is_none() {
            return Err(rejected(&call, 404, "collection not found"));
        }
        self.insert_collection(collection.clone());
        Ok(())
    }

    fn put_item(&self, collection_id: &str, item: &Item) -> Result<()> {
        let call = Call::PutItem(collection_id.to_string(), item.id.clone());
        self.record(call.clone())?;
        if self.item(collection_id, &item.id).is_none() {
            return Err(rejected(&call, 404, "item not found"));
        }
        self.insert_item(collection_id, item.clone());
        Ok(())
    }

    fn delete_item(&self, collection_id: &str, item_id: &str) -> Result<()> {
        let call = Call::DeleteItem(collection_id.to_string(), item_id.to_string());
        self.record(call.clone())?;
        let removed = self
            .state
            .borrow_mut()
            .items
            .get_mut(collection_id)
            .and_then(|items| items.remove(item_id));
        match removed {
            Some(_) => Ok(()),
            None => Err(rejected(&call, 404, "item not found")),
        }
    }

    fn delete_collection(&self, collection_id: &str) -> Result<()> {
        let call = Call::DeleteCollection(collection_id.to_string());
        self.record(call.clone())?;
        let mut state = self.state.borrow_mut();
        if state.collections.remove(collection_id).is_none() {
            return Err(rejected(&call, 404, "collection not found"));
        }
        state.items.remove(collection_id);
        Ok(())
    }

    fn list_items(&self, collection: &Collection) -> Result<Vec<Item>> {
        let call = Call::ListItems(collection.id.clone());
        self.record(call.clone())?;
        let state = self.state.borrow();
        if !state.collections.contains_key(&collection.id) {
            return Err(CatalogError::CollectionNotFound(collection.id.clone()));
        }
        Ok(state
            .items
            .get(&collection.id)
            .map(|items| items.values().cloned().collect())
            .unwrap_or_default())
    }
}
