//! Collection runner
//!
//! Sweeps all collectable sources one at a time, invoking the collector and
//! merger per source and writing exactly one collection log row per source.
//! The runner holds no timer state: a scheduler (cron, manual trigger)
//! simply calls [`run_sweep`], and concurrent invocations are possible but
//! not mutually excluded.

use chrono::Local;
use reqwest::Client;
use tracing::{error, info};

use crate::collect::collector::collect_source;
use crate::collect::merger::{merge_candidates, MergeCounts};
use crate::model::SourceDescriptor;
use crate::storage::{NewRunLog, RunStatus, Storage};
use crate::{HarvestError, Result};

/// Per-source outcome of one sweep, for aggregate reporting
#[derive(Debug, Clone)]
pub struct SourceRunSummary {
    pub source_id: i64,
    pub source_name: String,
    pub status: RunStatus,
    pub collected: u32,
    pub added: u32,
    pub updated: u32,
    pub error: Option<String>,
}

/// Runs a full sweep over all enabled sources of enabled regions
///
/// A failure in one source's pipeline never stops the loop over the
/// remaining sources.
pub async fn run_sweep<S: Storage>(
    storage: &mut S,
    client: &Client,
) -> Result<Vec<SourceRunSummary>> {
    let sources = storage.list_collectable_sources()?;
    info!("Sweep started over {} sources", sources.len());

    let mut summaries = Vec::with_capacity(sources.len());
    for source in &sources {
        summaries.push(run_source(storage, client, source).await?);
    }

    let failed = summaries
        .iter()
        .filter(|s| s.status == RunStatus::Failed)
        .count();
    info!(
        "Sweep finished: {} sources, {} failed",
        summaries.len(),
        failed
    );

    Ok(summaries)
}

/// Runs collection for a single source by name (the test-collection surface)
pub async fn run_source_by_name<S: Storage>(
    storage: &mut S,
    client: &Client,
    name: &str,
) -> Result<SourceRunSummary> {
    let source = storage
        .get_source_by_name(name)?
        .ok_or_else(|| HarvestError::UnknownSource(name.to_string()))?;
    run_source(storage, client, &source).await
}

/// Runs collection for one source and records its audit row
///
/// The returned error only covers storage failures writing the audit
/// trail; collection and merge failures are captured in the summary.
pub async fn run_source<S: Storage>(
    storage: &mut S,
    client: &Client,
    source: &SourceDescriptor,
) -> Result<SourceRunSummary> {
    let region = storage.get_region(source.region_id)?;
    let started_at = Local::now().naive_local();

    let outcome = collect_source(client, source, &region).await;
    let collected = outcome.candidates.len() as u32;

    let (status, counts, error) = if collected == 0 && !outcome.errors.is_empty() {
        (
            RunStatus::Failed,
            MergeCounts::default(),
            Some(outcome.errors.join("; ")),
        )
    } else {
        if !outcome.errors.is_empty() {
            error!(
                "'{}': partial collection, {} errors: {}",
                source.name,
                outcome.errors.len(),
                outcome.errors.join("; ")
            );
        }
        let counts = merge_candidates(storage, &outcome.candidates, source.id);
        (RunStatus::Success, counts, None)
    };

    let completed_at = Local::now().naive_local();
    storage.insert_run_log(&NewRunLog {
        source_id: source.id,
        status,
        collected,
        added: counts.added,
        updated: counts.updated,
        error_message: error.clone(),
        started_at,
        completed_at,
    })?;
    storage.touch_source_collected(source.id, completed_at)?;

    match status {
        RunStatus::Success => info!(
            "'{}': {} collected, {} added, {} updated",
            source.name, collected, counts.added, counts.updated
        ),
        RunStatus::Failed => error!(
            "'{}': collection failed: {}",
            source.name,
            error.as_deref().unwrap_or("unknown error")
        ),
    }

    Ok(SourceRunSummary {
        source_id: source.id,
        source_name: source.name.clone(),
        status,
        collected,
        added: counts.added,
        updated: counts.updated,
        error,
    })
}
