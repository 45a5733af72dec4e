//! Backout detection in build annotations
//!
//! A revision identifier embedded in a build note means the build's result
//! was a backout of that changeset. Detection is a plain scan for hex runs
//! of length >= 10, each truncated to the canonical 12-char key.

use crate::types::canonical_rev;
use once_cell::sync::Lazy;
use regex::Regex;

static REV_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9a-fA-F]{10,}").expect("valid revision regex"));

/// How build notes are scanned for backout targets.
///
/// Two behaviors exist in the wild; the choice is an explicit policy, not a
/// silent default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoteScanPolicy {
    /// Scan every note and collect every match (the complete behavior).
    #[default]
    ScanAll,
    /// Take only the first match of the first matching note, then stop
    /// scanning further notes for that build (legacy behavior).
    FirstMatch,
}

/// All backout targets embedded in one note, in order of appearance.
pub fn backout_targets(note: &str) -> Vec<String> {
    REV_RUN
        .find_iter(note)
        .map(|m| canonical_rev(m.as_str()))
        .collect()
}

/// The first backout target embedded in one note, if any.
pub fn first_backout_target(note: &str) -> Option<String> {
    REV_RUN.find(note).map(|m| canonical_rev(m.as_str()))
}
