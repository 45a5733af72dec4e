//! Clients for the pushlog and build-result services
//!
//! Required fetches fail hard with `RemoteUnavailable` on transport errors
//! or non-2xx status; there are no retries. Rate limiting lives in the
//! sequencer, not here.

use crate::error::{PushtrainError, Result};
use crate::types::{BuildRecord, Changeset, Push};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use std::collections::BTreeMap;
use tracing::debug;

/// Commit messages that reference a tracked issue: "bug" or "b=" followed by
/// at least 4 digits, case-insensitive.
static COMMIT_MSG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(bug|b=)\s*\d{4,}").expect("valid commit message regex"));

fn build_client() -> Result<Client> {
    Client::builder()
        .user_agent(concat!("pushtrain/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| PushtrainError::Config(format!("Failed to build HTTP client: {}", e)))
}

/// Client for the source-control pushlog service
pub struct HgClient {
    client: Client,
    base: String,
    repo: String,
}

impl HgClient {
    /// Create a client for a remote repository URL. The repository name is
    /// the last path segment of the URL.
    pub fn new(remote: &str) -> Result<Self> {
        let base = remote.trim_end_matches('/').to_string();
        let repo = base
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                PushtrainError::Config(format!("Cannot derive repository name from '{}'", remote))
            })?
            .to_string();

        Ok(Self {
            client: build_client()?,
            base,
            repo,
        })
    }

    /// Repository name derived from the remote URL
    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// Fetch the full pushlog for an ID range, as a push-id keyed map.
    ///
    /// One request for the whole range; the caller filters candidates with
    /// [`references_tracked_issue`].
    pub async fn fetch_pushes(&self, start: u64, end: u64) -> Result<BTreeMap<u64, Push>> {
        let url = format!("{}/json-pushes", self.base);
        debug!("Fetching pushes {}..{} from {}", start, end, url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("full", "1".to_string()),
                ("startID", start.to_string()),
                ("endID", end.to_string()),
            ])
            .send()
            .await
            .map_err(|e| {
                PushtrainError::RemoteUnavailable(format!("pushlog request failed: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(PushtrainError::RemoteUnavailable(format!(
                "pushlog returned status {}",
                response.status()
            )));
        }

        let raw: BTreeMap<String, Push> = response.json().await.map_err(|e| {
            PushtrainError::MalformedResponse(format!("pushlog response: {}", e))
        })?;

        raw.into_iter()
            .map(|(id, push)| {
                let id = id.parse::<u64>().map_err(|_| {
                    PushtrainError::MalformedResponse(format!("non-numeric push id '{}'", id))
                })?;
                Ok((id, push))
            })
            .collect()
    }

    /// Fetch metadata for a single changeset by its revision identifier.
    pub async fn fetch_changeset_info(&self, rev: &str) -> Result<Changeset> {
        let url = format!("{}/json-info", self.base);
        debug!("Fetching changeset info for {} from {}", rev, url);

        let response = self
            .client
            .get(&url)
            .query(&[("node", rev)])
            .send()
            .await
            .map_err(|e| {
                PushtrainError::RemoteUnavailable(format!("changeset info request failed: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(PushtrainError::RemoteUnavailable(format!(
                "changeset info for {} returned status {}",
                rev,
                response.status()
            )));
        }

        let raw: BTreeMap<String, Changeset> = response.json().await.map_err(|e| {
            PushtrainError::MalformedResponse(format!("changeset info response: {}", e))
        })?;

        let (_, changeset) = raw.into_iter().next().ok_or_else(|| {
            PushtrainError::MalformedResponse(format!("empty changeset info for {}", rev))
        })?;
        Ok(changeset)
    }
}

/// Client for the build-result service
pub struct BuildsClient {
    client: Client,
    url: String,
    branch: String,
}

impl BuildsClient {
    pub fn new(url: &str, branch: &str) -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            url: url.to_string(),
            branch: branch.to_string(),
        })
    }

    /// Fetch all build records associated with one changeset.
    pub async fn fetch_builds(&self, rev: &str) -> Result<Vec<BuildRecord>> {
        debug!("Fetching builds for {} from {}", rev, self.url);

        let response = self
            .client
            .get(&self.url)
            .query(&[("branch", self.branch.as_str()), ("rev", rev)])
            .send()
            .await
            .map_err(|e| {
                PushtrainError::RemoteUnavailable(format!("build result request failed: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(PushtrainError::RemoteUnavailable(format!(
                "build results for {} returned status {}",
                rev,
                response.status()
            )));
        }

        response.json().await.map_err(|e| {
            PushtrainError::MalformedResponse(format!("build result response: {}", e))
        })
    }
}

/// Whether a commit description references a tracked issue.
pub fn references_tracked_issue(desc: &str) -> bool {
    COMMIT_MSG.is_match(desc.trim())
}
