// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Catalog reconciliation
//!
//! A request names one collection and one grid cell. The reconciler
//! prepares every asset locally, observes whether the collection and the
//! cell's item exist, picks exactly one [`Plan`] with [`decide`], executes
//! it, and finally refreshes the collection extent.

use crate::asset::{AssetSource, PreparedAsset, prepare_asset};
use crate::client::{CatalogApi, Fetched};
use crate::error::{CatalogError, Result};
use crate::extent::{ExtentChange, refresh_collection_extent};
use crate::geo::GeoLookup;
use crate::models::{Asset, Collection, Item, item_id};
use assetmeta::FormatError;
use chrono::{DateTime, SecondsFormat, Utc};
use diagnostics::*;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// What exists remotely before anything is changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteState {
    Empty,
    CollectionOnly,
    CollectionWithItem,
    /// The item answers but its collection does not
    ItemWithoutCollection,
}

impl RemoteState {
    pub fn observe(collection_exists: bool, item_exists: bool) -> Self {
        match (collection_exists, item_exists) {
            (false, false) => RemoteState::Empty,
            (true, false) => RemoteState::CollectionOnly,
            (true, true) => RemoteState::CollectionWithItem,
            (false, true) => RemoteState::ItemWithoutCollection,
        }
    }
}

/// Requested destructive actions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Intent {
    pub delete_collection: bool,
    pub delete_assets: bool,
}

/// The single branch a run executes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plan {
    DeleteCollection,
    DeleteAssets,
    CreateCollectionAndItem,
    CreateItem,
    MergeAssets,
    /// Remote state the reconciler will not touch
    Inconsistent,
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Plan::DeleteCollection => "delete collection",
            Plan::DeleteAssets => "delete assets",
            Plan::CreateCollectionAndItem => "create collection and item",
            Plan::CreateItem => "create item",
            Plan::MergeAssets => "merge assets",
            Plan::Inconsistent => "inconsistent remote state",
        };
        write!(f, "{}", name)
    }
}

/// First match wins:
///
/// 1. collection exists and deletion is requested
/// 2. item exists and asset deletion is requested
/// 3. neither collection nor item exists
/// 4. collection exists without the item
/// 5. item exists
pub fn decide(state: RemoteState, intent: Intent) -> Plan {
    use RemoteState::*;
    match state {
        CollectionOnly | CollectionWithItem if intent.delete_collection => Plan::DeleteCollection,
        CollectionWithItem if intent.delete_assets => Plan::DeleteAssets,
        Empty => Plan::CreateCollectionAndItem,
        CollectionOnly => Plan::CreateItem,
        CollectionWithItem => Plan::MergeAssets,
        ItemWithoutCollection => Plan::Inconsistent,
    }
}

/// What to do with files that cannot be cataloged
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BatchPolicy {
    /// Leave the file out and catalog the rest
    #[default]
    SkipFailed,
    /// Fail the run before any remote call
    Abort,
}

/// One reconciliation run
#[derive(Debug, Clone, Default)]
pub struct CatalogRequest {
    pub collection_id: String,
    pub license: String,
    pub cell_id: String,
    pub assets: Vec<AssetSource>,
    pub assets_to_delete: Vec<String>,
    pub delete_collection: bool,
    pub policy: BatchPolicy,
}

impl CatalogRequest {
    pub fn new<C: Into<String>, L: Into<String>, G: Into<String>>(
        collection_id: C,
        license: L,
        cell_id: G,
    ) -> Self {
        Self {
            collection_id: collection_id.into(),
            license: license.into(),
            cell_id: cell_id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_asset(mut self, source: AssetSource) -> Self {
        self.assets.push(source);
        self
    }

    #[must_use]
    pub fn delete_asset<S: Into<String>>(mut self, asset_id: S) -> Self {
        self.assets_to_delete.push(asset_id.into());
        self
    }

    #[must_use]
    pub fn delete_collection(mut self) -> Self {
        self.delete_collection = true;
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: BatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn item_id(&self) -> String {
        item_id(&self.cell_id, &self.collection_id)
    }

    pub fn intent(&self) -> Intent {
        Intent {
            delete_collection: self.delete_collection,
            delete_assets: !self.assets_to_delete.is_empty(),
        }
    }
}

/// Remote mutations and derived work a run may perform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    ResolveFootprint,
    DeleteCollection,
    CreateCollection,
    CreateItem,
    UpdateItem,
    DeleteItem,
    RefreshExtent,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::ResolveFootprint => "resolve footprint",
            Step::DeleteCollection => "delete collection",
            Step::CreateCollection => "create collection",
            Step::CreateItem => "create item",
            Step::UpdateItem => "update item",
            Step::DeleteItem => "delete item",
            Step::RefreshExtent => "refresh extent",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug)]
pub enum StepStatus {
    Done,
    /// Nothing needed doing; the reason is for display
    NoChange(String),
    Failed(CatalogError),
}

#[derive(Debug)]
pub struct StepOutcome {
    pub step: Step,
    pub status: StepStatus,
}

/// Everything a run did, step by step
#[derive(Debug)]
pub struct CatalogReport {
    pub plan: Plan,
    pub item_ids: Vec<String>,
    pub steps: Vec<StepOutcome>,
    /// Files left out under [`BatchPolicy::SkipFailed`]
    pub rejected: Vec<(PathBuf, FormatError)>,
    pub added_assets: Vec<String>,
    pub removed_assets: Vec<String>,
}

impl CatalogReport {
    fn new(plan: Plan, item_id: String, rejected: Vec<(PathBuf, FormatError)>) -> Self {
        Self {
            plan,
            item_ids: vec![item_id],
            steps: Vec::new(),
            rejected,
            added_assets: Vec::new(),
            removed_assets: Vec::new(),
        }
    }

    /// No step failed
    pub fn succeeded(&self) -> bool {
        !self
            .steps
            .iter()
            .any(|outcome| matches!(outcome.status, StepStatus::Failed(_)))
    }

    pub fn failures(&self) -> impl Iterator<Item = (Step, &CatalogError)> {
        self.steps.iter().filter_map(|outcome| match &outcome.status {
            StepStatus::Failed(err) => Some((outcome.step, err)),
            _ => None,
        })
    }

    pub fn status_of(&self, step: Step) -> Option<&StepStatus> {
        self.steps
            .iter()
            .find(|outcome| outcome.step == step)
            .map(|outcome| &outcome.status)
    }

    fn push(&mut self, step: Step, status: StepStatus) {
        self.steps.push(StepOutcome { step, status });
    }

    fn unchanged<S: Into<String>>(&mut self, step: Step, reason: S) {
        self.push(step, StepStatus::NoChange(reason.into()));
    }

    /// Record a mutation's result; true when it succeeded
    fn record(&mut self, step: Step, result: Result<()>) -> bool {
        let name = step.to_string();
        match result {
            Ok(()) => {
                info!("Catalog step {name} done", name: name);
                self.push(step, StepStatus::Done);
                true
            }
            Err(err) => {
                let reason = err.to_string();
                error!("Catalog step {name} failed: {reason}", name: name, reason: reason);
                self.push(step, StepStatus::Failed(err));
                false
            }
        }
    }
}

/// Current time as an RFC 3339 UTC timestamp with microseconds
pub fn timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Executes [`CatalogRequest`]s against a catalog
pub struct Reconciler<'a, C: CatalogApi + ?Sized, G: GeoLookup + ?Sized> {
    catalog: &'a C,
    geo: &'a G,
    clock: fn() -> DateTime<Utc>,
}

impl<'a, C: CatalogApi + ?Sized, G: GeoLookup + ?Sized> Reconciler<'a, C, G> {
    pub fn new(catalog: &'a C, geo: &'a G) -> Self {
        Self {
            catalog,
            geo,
            clock: Utc::now,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Run one request. `Err` means nothing was changed remotely: a file was
    /// rejected under [`BatchPolicy::Abort`] or the initial reads failed.
    /// Failures after that point are recorded in the report.
    pub fn run(&self, request: &CatalogRequest) -> Result<CatalogReport> {
        let (prepared, rejected) = prepare_all(&request.assets, request.policy)?;

        let collection_id = request.collection_id.as_str();
        let item_id = request.item_id();

        let collection = self.catalog.get_collection(collection_id)?;
        let item = self.catalog.get_item(collection_id, &item_id)?;

        let state = RemoteState::observe(collection.is_found(), item.is_found());
        let plan = decide(state, request.intent());
        let plan_name = plan.to_string();
        info!(
            "Cataloging {item_id} in {collection_id}: {plan_name}",
            item_id: item_id.as_str(),
            collection_id: collection_id,
            plan_name: plan_name
        );

        let mut report = CatalogReport::new(plan, item_id, rejected);

        match (plan, item) {
            (Plan::DeleteCollection, _) => {
                let result = self.catalog.delete_collection(collection_id);
                report.record(Step::DeleteCollection, result);
                return Ok(report);
            }
            (Plan::DeleteAssets, Fetched::Found(item)) => {
                self.delete_assets(request, item, &mut report);
            }
            (Plan::MergeAssets, Fetched::Found(item)) => {
                self.merge_assets(request, item, prepared, &mut report);
            }
            (Plan::CreateCollectionAndItem, _) => {
                self.create(request, prepared, true, &mut report);
            }
            (Plan::CreateItem, _) => {
                self.create(request, prepared, false, &mut report);
            }
            (Plan::DeleteAssets | Plan::MergeAssets | Plan::Inconsistent, _) => {
                let id = &report.item_ids[0];
                warn!(
                    "Item {id} exists without collection {collection_id}; nothing changed",
                    id: id.as_str(),
                    collection_id: collection_id
                );
                return Ok(report);
            }
        }

        self.refresh_extent(collection_id, &mut report);
        Ok(report)
    }

    fn create(
        &self,
        request: &CatalogRequest,
        prepared: Vec<PreparedAsset>,
        with_collection: bool,
        report: &mut CatalogReport,
    ) {
        if prepared.is_empty() {
            if with_collection {
                report.unchanged(Step::CreateCollection, "no assets to catalog");
            }
            report.unchanged(Step::CreateItem, "no assets to catalog");
            return;
        }

        let footprint = match self.geo.resolve(&request.cell_id) {
            Ok(footprint) => {
                report.push(Step::ResolveFootprint, StepStatus::Done);
                footprint
            }
            Err(err) => {
                report.record(Step::ResolveFootprint, Err(err));
                return;
            }
        };

        if with_collection {
            let collection = Collection::new(&request.collection_id, &request.license);
            let result = self.catalog.create_collection(&collection);
            if !report.record(Step::CreateCollection, result) {
                return;
            }
        }

        let (ids, assets) = into_asset_map(prepared);
        let item = Item::new(
            &report.item_ids[0],
            &request.collection_id,
            footprint.bbox,
            footprint.geometry,
            timestamp((self.clock)()),
            assets,
        );

        let result = self.catalog.create_item(&request.collection_id, &item);
        if report.record(Step::CreateItem, result) {
            report.added_assets = ids;
        }
    }

    /// Add assets whose ids are new; existing ids are never overwritten
    fn merge_assets(
        &self,
        request: &CatalogRequest,
        mut item: Item,
        prepared: Vec<PreparedAsset>,
        report: &mut CatalogReport,
    ) {
        let mut added = Vec::new();
        for PreparedAsset { id, asset, .. } in prepared {
            if item.assets.contains_key(&id) {
                debug!("Asset {id} already cataloged", id: id.as_str());
                continue;
            }
            item.assets.insert(id.clone(), asset);
            added.push(id);
        }

        if added.is_empty() {
            report.unchanged(Step::UpdateItem, "every asset is already cataloged");
            return;
        }

        item.properties.datetime = Some(timestamp((self.clock)()));
        let result = self.catalog.put_item(&request.collection_id, &item);
        if report.record(Step::UpdateItem, result) {
            report.added_assets = added;
        }
    }

    /// Remove the named assets; an item left with none is deleted
    fn delete_assets(&self, request: &CatalogRequest, mut item: Item, report: &mut CatalogReport) {
        let mut removed = Vec::new();
        for id in &request.assets_to_delete {
            if item.assets.remove(id).is_some() {
                removed.push(id.clone());
            } else {
                debug!("Asset {id} not in item; nothing to delete", id: id.as_str());
            }
        }

        if removed.is_empty() {
            report.unchanged(Step::UpdateItem, "none of the named assets are cataloged");
            return;
        }

        let succeeded = if item.assets.is_empty() {
            let result = self.catalog.delete_item(&request.collection_id, &item.id);
            report.record(Step::DeleteItem, result)
        } else {
            let result = self.catalog.put_item(&request.collection_id, &item);
            report.record(Step::UpdateItem, result)
        };
        if succeeded {
            report.removed_assets = removed;
        }
    }

    fn refresh_extent(&self, collection_id: &str, report: &mut CatalogReport) {
        match refresh_collection_extent(self.catalog, collection_id) {
            Ok(ExtentChange::Updated(_)) => report.push(Step::RefreshExtent, StepStatus::Done),
            Ok(ExtentChange::Unchanged) => {
                report.unchanged(Step::RefreshExtent, "extent already current");
            }
            Ok(ExtentChange::NoItems) => {
                report.unchanged(Step::RefreshExtent, "collection has no items");
            }
            // A create branch with nothing to write leaves no collection behind
            Err(CatalogError::CollectionNotFound(_)) => {
                report.unchanged(Step::RefreshExtent, "collection does not exist");
            }
            Err(err) => {
                let reason = err.to_string();
                warn!(
                    "Extent of {collection_id} may be stale: {reason}",
                    collection_id: collection_id,
                    reason: reason
                );
                report.push(Step::RefreshExtent, StepStatus::Failed(err));
            }
        }
    }
}

type Prepared = (Vec<PreparedAsset>, Vec<(PathBuf, FormatError)>);

/// Extract every source before touching the catalog
fn prepare_all(sources: &[AssetSource], policy: BatchPolicy) -> Result<Prepared> {
    let mut prepared = Vec::with_capacity(sources.len());
    let mut rejected = Vec::new();

    for source in sources {
        match prepare_asset(source) {
            Ok(asset) => prepared.push(asset),
            Err(err) if policy == BatchPolicy::Abort => return Err(err.into()),
            Err(err) => {
                let display = source.path.display().to_string();
                let reason = err.to_string();
                warn!("Skipping {display}: {reason}", display: display, reason: reason);
                rejected.push((source.path.clone(), err));
            }
        }
    }

    Ok((prepared, rejected))
}

/// Asset map for a new item; a repeated id keeps its first asset
fn into_asset_map(prepared: Vec<PreparedAsset>) -> (Vec<String>, BTreeMap<String, Asset>) {
    let mut ids = Vec::new();
    let mut assets = BTreeMap::new();
    for PreparedAsset { id, asset, .. } in prepared {
        if assets.contains_key(&id) {
            continue;
        }
        ids.push(id.clone());
        assets.insert(id, asset);
    }
    (ids, assets)
}
