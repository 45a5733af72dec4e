//! Unknown-changeset resolution
//!
//! Backout targets frequently point at changesets outside the fetched push
//! window. Each one is fetched individually (rate-limited, sequential) and
//! wrapped in a synthetic single-changeset push. These fetches are
//! best-effort: a failure is logged and the changeset stays unindexed, which
//! drops it from the final output at emission.

use crate::remote::HgClient;
use crate::sequencer::Sequencer;
use crate::types::Push;
use std::collections::BTreeMap;
use tracing::debug;

/// Resolve changesets present in the flag map but absent from the push
/// index, inserting a synthetic push for each one that could be fetched.
pub async fn resolve_unknown_changesets(
    client: &HgClient,
    sequencer: &Sequencer,
    index: &mut BTreeMap<String, Push>,
    unknown: Vec<String>,
) {
    if unknown.is_empty() {
        return;
    }
    debug!("Resolving {} unknown changeset(s)", unknown.len());

    // Fetch failures are caught per changeset, so the lane never terminates
    // early and the overall run always succeeds.
    let resolved = sequencer
        .run(unknown, |rev| async move {
            match client.fetch_changeset_info(&rev).await {
                Ok(changeset) => Ok(Some((rev, changeset))),
                Err(e) => {
                    // The emission step warns once per still-missing
                    // changeset; this only records the cause.
                    debug!("Failed to resolve changeset {}: {}", rev, e);
                    Ok(None)
                }
            }
        })
        .await
        .unwrap_or_default();

    for (rev, changeset) in resolved.into_iter().flatten() {
        index.insert(
            rev,
            Push {
                changesets: vec![changeset],
            },
        );
    }
}
