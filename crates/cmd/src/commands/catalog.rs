// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::commands::list::list_collection;
use crate::common::CatalogContext;
use anyhow::{Result, anyhow, bail};
use clap::Args;
use stacsync::{
    AssetSource, BatchPolicy, CatalogApi, CatalogReport, CatalogRequest, GeoLookup, GeohashGrid,
    Reconciler, StepStatus,
};
use std::path::PathBuf;

#[derive(Args, Debug, Clone, Default)]
pub struct CatalogArgs {
    /// Collection to reconcile
    #[arg(long = "collection")]
    pub collection_id: String,

    /// License recorded on a newly created collection
    #[arg(long)]
    pub license: String,

    /// Grid cell (geohash) the item covers
    #[arg(long)]
    pub cell_id: String,

    /// Local file to add as an asset (repeatable)
    #[arg(long = "asset")]
    pub assets: Vec<PathBuf>,

    /// Published href for the asset in the same position (defaults to the path)
    #[arg(long = "href")]
    pub hrefs: Vec<String>,

    /// Asset id to remove from the item (repeatable)
    #[arg(long = "delete-asset")]
    pub delete_assets: Vec<String>,

    /// Delete the whole collection and its items
    #[arg(long)]
    pub delete_collection: bool,

    /// Fail before any change if a file cannot be cataloged
    #[arg(long)]
    pub abort_on_error: bool,
}

/// Pair each asset path with the href given in the same position
pub fn asset_sources(assets: &[PathBuf], hrefs: &[String]) -> Result<Vec<AssetSource>> {
    if !hrefs.is_empty() && hrefs.len() != assets.len() {
        bail!(
            "{} --href values given for {} --asset values; give one per asset or none",
            hrefs.len(),
            assets.len()
        );
    }

    Ok(assets
        .iter()
        .enumerate()
        .map(|(n, path)| match hrefs.get(n) {
            Some(href) => AssetSource::new(path.clone(), href.clone()),
            None => AssetSource::local(path.clone()),
        })
        .collect())
}

pub fn build_request(args: &CatalogArgs) -> Result<CatalogRequest> {
    let mut request = CatalogRequest::new(&args.collection_id, &args.license, &args.cell_id);
    request.assets = asset_sources(&args.assets, &args.hrefs)?;
    request.assets_to_delete = args.delete_assets.clone();
    request.delete_collection = args.delete_collection;
    request.policy = if args.abort_on_error {
        BatchPolicy::Abort
    } else {
        BatchPolicy::SkipFailed
    };
    Ok(request)
}

/// Reconcile one collection and cell against the configured catalog service
pub fn catalog_command<F>(context: &CatalogContext, args: &CatalogArgs, handler: F) -> Result<()>
where
    F: FnMut(&str),
{
    let request = build_request(args)?;
    let catalog = context.open_catalog()?;
    run_catalog(&catalog, &GeohashGrid, &request, context.verbose, handler).map(|_| ())
}

/// Run a request and print its report followed by the collection listing;
/// fails when any step failed
pub fn run_catalog<C, G, F>(
    catalog: &C,
    geo: &G,
    request: &CatalogRequest,
    verbose: bool,
    mut handler: F,
) -> Result<CatalogReport>
where
    C: CatalogApi + ?Sized,
    G: GeoLookup + ?Sized,
    F: FnMut(&str),
{
    let report = Reconciler::new(catalog, geo).run(request)?;

    for line in format_report(&report, verbose) {
        handler(&line);
    }

    if catalog.get_collection(&request.collection_id)?.is_found() {
        list_collection(catalog, &request.collection_id, &mut handler)?;
    }

    let failed = report.failures().count();
    if failed > 0 {
        return Err(anyhow!("{} catalog step(s) failed", failed));
    }
    Ok(report)
}

pub fn format_report(report: &CatalogReport, verbose: bool) -> Vec<String> {
    let mut lines = Vec::new();
    for id in &report.item_ids {
        lines.push(format!("Item: {}\n", id));
    }
    lines.push(format!("Plan: {}\n", report.plan));

    for outcome in &report.steps {
        let line = match &outcome.status {
            StepStatus::Done => format!("  ✅ {}\n", outcome.step),
            StepStatus::NoChange(reason) => format!("  ➖ {} ({})\n", outcome.step, reason),
            StepStatus::Failed(err) => format!("  ❌ {}: {}\n", outcome.step, err),
        };
        lines.push(line);
    }

    for (path, err) in &report.rejected {
        lines.push(format!("  ⚠️  skipped {}: {}\n", path.display(), err));
    }

    if verbose {
        for id in &report.added_assets {
            lines.push(format!("  + {}\n", id));
        }
        for id in &report.removed_assets {
            lines.push(format!("  - {}\n", id));
        }
    }
    lines
}
