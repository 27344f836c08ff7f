//! High-level pipeline: orchestrates listing → upload → readiness → assignment → report.
//!
//! This module provides the top-level orchestration for one sync run. It
//! - validates the [`SyncConfig`] before touching any service
//! - lists the object store once
//! - uploads every listed item, isolating failures per item
//! - when a collection target is configured, polls uploaded items until the
//!   downstream service has processed them and adds the ready ones to the collection
//! - aggregates everything into one [`RunReport`]
//!
//! # Error Handling
//! Only configuration and listing failures abort a run; they come back as a
//! [`SyncFailure`] stamped with the failure time. Every per-item failure is
//! recorded in the report instead, so a caller gets either a complete report
//! or a single fatal error, never both.
//!
//! # Deadline
//! With [`SyncConfig::deadline`] set, in-flight work that outlives it is
//! recorded as failed (upload, assignment) or not processed (polling) and the
//! report built from what finished is still returned.

use chrono::Utc;
use tokio::time::Instant;
use tracing::{error, info};

use crate::assign::assign_all;
use crate::config::SyncConfig;
use crate::contract::{ContentFetcher, KnowledgeClient, Sleeper, SourceLister};
use crate::error::{ListingError, SyncFailure};
use crate::policy::until_deadline;
use crate::readiness::await_readiness;
use crate::report::{aggregate, RunReport};
use crate::upload::upload_all;

/// Run one complete sync.
pub async fn run_sync<L, F, K, S>(
    config: &SyncConfig,
    lister: &L,
    fetcher: &F,
    client: &K,
    sleeper: &S,
) -> Result<RunReport, SyncFailure>
where
    L: SourceLister + ?Sized,
    F: ContentFetcher + ?Sized,
    K: KnowledgeClient + ?Sized,
    S: Sleeper + ?Sized,
{
    info!("[SYNC] Starting sync run");

    if let Err(e) = config.validate() {
        error!(error = %e, "[SYNC][ERROR] Invalid configuration, aborting run");
        return Err(SyncFailure::now(e));
    }
    config.trace_loaded();

    let deadline = config.deadline.map(|d| Instant::now() + d);

    let items = match until_deadline(deadline, lister.list_items(&config.storage_token)).await {
        Some(Ok(items)) => items,
        Some(Err(e)) => {
            error!(error = %e, "[SYNC][ERROR] Listing source items failed, aborting run");
            return Err(SyncFailure::now(e));
        }
        None => {
            error!("[SYNC][ERROR] Deadline passed while listing source items, aborting run");
            return Err(SyncFailure::now(ListingError(
                "deadline exceeded while listing".into(),
            )));
        }
    };
    info!(items = items.len(), "[SYNC] Listed source items");

    let credential = config.downstream_api_key.as_str();
    let outcomes = upload_all(
        &items,
        fetcher,
        client,
        credential,
        config.concurrency,
        deadline,
    )
    .await;

    let collection = match config.collection_target() {
        Some(collection_id) if outcomes.iter().any(|o| o.is_uploaded()) => {
            let readiness = await_readiness(
                &outcomes,
                client,
                sleeper,
                credential,
                &config.policy,
                config.concurrency,
                deadline,
            )
            .await;
            assign_all(
                &outcomes,
                &readiness,
                client,
                credential,
                collection_id,
                config.concurrency,
                deadline,
            )
            .await
        }
        Some(_) => {
            info!("[SYNC] No successful uploads, skipping collection assignment");
            vec![None; outcomes.len()]
        }
        None => {
            info!("[SYNC] No collection configured, skipping readiness polling");
            vec![None; outcomes.len()]
        }
    };

    let report = aggregate(outcomes, collection, Utc::now());
    info!(
        total = report.total_files,
        successful = report.successful,
        failed = report.failed,
        added_to_collection = report.added_to_collection,
        "[SYNC] Sync run complete"
    );
    Ok(report)
}
