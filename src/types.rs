//! Core data structures for the fetch-and-aggregate pipeline
//!
//! Mirrors the wire shapes of the pushlog and build-result services plus the
//! persisted training record. Revision identifiers are keyed on their first
//! 12 hex characters everywhere; [`canonical_rev`] is the single place that
//! rule lives.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of hex characters that identify a changeset
pub const REV_KEY_LEN: usize = 12;

/// A single committed revision, as returned by the pushlog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Changeset {
    /// Full hex revision identifier (40 chars on the wire, keyed on 12)
    pub node: String,

    /// Commit description
    pub desc: String,

    /// Touched file paths
    #[serde(default)]
    pub files: Vec<String>,
}

/// A batch of changesets submitted together
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Push {
    pub changesets: Vec<Changeset>,
}

impl Push {
    /// The representative ("last") changeset of this push
    pub fn tip(&self) -> Option<&Changeset> {
        self.changesets.last()
    }
}

/// Free-text annotation attached to a build result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub note: String,
}

/// One build outcome from the build-result service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildRecord {
    pub buildername: String,
    pub result: String,
    #[serde(default)]
    pub notes: Vec<Note>,
}

/// One persisted training example: directory-prefix presence set in,
/// per-builder-label outcome flags out (0 = success, 1 = backout)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingRecord {
    pub input: BTreeMap<String, u8>,
    pub output: BTreeMap<String, u8>,
}

/// Canonical form of a revision identifier: first 12 hex chars, lowercased.
///
/// Longer and shorter spellings of the same changeset collapse to one key;
/// runs shorter than 12 chars keep their own length. Truncation counts
/// chars, not bytes, so junk nodes in a remote response never panic the
/// keying.
pub fn canonical_rev(node: &str) -> String {
    node.chars()
        .take(REV_KEY_LEN)
        .collect::<String>()
        .to_ascii_lowercase()
}
