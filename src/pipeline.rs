//! Pipeline driver
//!
//! Orchestrates the full run: fetch the push window, fan build-result
//! fetches out into rate-limited lanes, aggregate outcomes, resolve unknown
//! backout targets, and emit training records. The push index and the flag
//! map are owned here and passed down explicitly.

use crate::aggregate::{aggregate_files, Aggregator};
use crate::backout::NoteScanPolicy;
use crate::error::{PushtrainError, Result};
use crate::normalize::BuilderNormalizer;
use crate::remote::{references_tracked_issue, BuildsClient, HgClient};
use crate::resolve::resolve_unknown_changesets;
use crate::sequencer::{split_lanes, Sequencer};
use crate::types::{canonical_rev, Push, TrainingRecord};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// Configuration for one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Remote repository URL; the last path segment names the repository
    pub remote: String,

    /// Build-result service URL
    pub builds_url: String,

    /// First push ID of the window (inclusive)
    pub start: u64,

    /// Last push ID of the window (inclusive)
    pub end: u64,

    /// Number of concurrent fetch lanes
    pub lanes: usize,

    /// Minimum delay between requests within a lane
    pub delay: Duration,

    /// How build notes are scanned for backout targets
    pub scan_policy: NoteScanPolicy,
}

/// Run the fetch-and-aggregate pipeline and return the derived records.
///
/// Fatal on any required fetch failure; unknown-changeset resolution is
/// best-effort and only logs.
pub async fn run(config: &PipelineConfig) -> Result<Vec<TrainingRecord>> {
    let hg = HgClient::new(&config.remote)?;
    let pushes = hg.fetch_pushes(config.start, config.end).await?;
    info!("Fetched {} push(es)", pushes.len());

    // Index every fetched push by its canonical tip revision. The index
    // covers all pushes, not just candidates: a filtered-out push can still
    // be a backout target.
    let mut index: BTreeMap<String, Push> = BTreeMap::new();
    for push in pushes.values() {
        if let Some(tip) = push.tip() {
            index.insert(canonical_rev(&tip.node), push.clone());
        }
    }

    // Candidates: pushes whose tip description references a tracked issue,
    // in push-id order.
    let candidates: Vec<String> = pushes
        .values()
        .filter_map(Push::tip)
        .filter(|tip| references_tracked_issue(&tip.desc))
        .map(|tip| canonical_rev(&tip.node))
        .collect();
    info!(
        "{} candidate changeset(s) after commit-message filter",
        candidates.len()
    );

    let builds = Arc::new(BuildsClient::new(&config.builds_url, hg.repo())?);
    let normalizer = Arc::new(BuilderNormalizer::new(hg.repo()));
    let aggregator = Arc::new(Mutex::new(Aggregator::new(config.scan_policy)));
    let sequencer = Sequencer::new(config.delay);

    // Fan out into contiguous lanes; each lane is strictly sequential and
    // rate-limited, lanes run concurrently.
    let mut handles = Vec::new();
    for lane in split_lanes(candidates, config.lanes) {
        let builds = builds.clone();
        let normalizer = normalizer.clone();
        let aggregator = aggregator.clone();
        handles.push(tokio::spawn(async move {
            sequencer
                .run(lane, |rev| {
                    let builds = builds.clone();
                    let normalizer = normalizer.clone();
                    let aggregator = aggregator.clone();
                    async move {
                        let records = builds.fetch_builds(&rev).await?;
                        aggregator
                            .lock()
                            .await
                            .record_builds(&rev, &records, &normalizer);
                        Ok(())
                    }
                })
                .await
        }));
    }

    // A failed lane aborts the run, but only after every sibling lane has
    // run to completion.
    let mut first_err: Option<PushtrainError> = None;
    for handle in handles {
        match handle.await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                error!("Fetch lane failed: {}", e);
                first_err.get_or_insert(e);
            }
            Err(e) => {
                error!("Fetch lane panicked: {}", e);
                first_err.get_or_insert(PushtrainError::Other(format!("lane task failed: {}", e)));
            }
        }
    }
    if let Some(e) = first_err {
        return Err(e);
    }

    let aggregator = Arc::try_unwrap(aggregator)
        .map_err(|_| PushtrainError::Other("aggregator still shared after lanes".to_string()))?
        .into_inner();

    // Backout targets outside the push window get their metadata fetched
    // individually, under the same rate limit.
    let unknown: Vec<String> = aggregator
        .changesets()
        .filter(|rev| !index.contains_key(*rev))
        .map(str::to_string)
        .collect();
    resolve_unknown_changesets(&hg, &sequencer, &mut index, unknown).await;

    let mut records = Vec::new();
    for (rev, output) in aggregator.into_flags() {
        match index.get(&rev) {
            Some(push) => records.push(TrainingRecord {
                input: aggregate_files(push),
                output,
            }),
            None => warn!("Changeset {} not found, skipping", rev),
        }
    }
    info!("Emitted {} training record(s)", records.len());
    Ok(records)
}
