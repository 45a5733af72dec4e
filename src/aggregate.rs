//! Outcome aggregation
//!
//! Merges fetched build records into a changeset-id keyed flag map and
//! per-push file touch-sets into the training input features.
//!
//! Recording is deliberately asymmetric: a successful build records flag 0
//! for its *own* changeset, while a backout note records flag 1 for the
//! *target* changesets named in the note, under the reporting build's label.
//! That is how the upstream build service annotates backouts; do not
//! "fix" it.

use crate::backout::{backout_targets, first_backout_target, NoteScanPolicy};
use crate::normalize::BuilderNormalizer;
use crate::types::{BuildRecord, Push};
use std::collections::BTreeMap;

/// Per-changeset outcome flags, keyed changeset-id -> label -> flag
pub type FlagMap = BTreeMap<String, BTreeMap<String, u8>>;

/// Accumulates (changeset, label, flag) observations across build records.
///
/// Flag 1 (backout) always overwrites; flag 0 (success) only fills an empty
/// slot. The recorded set is therefore independent of the order in which
/// build records are processed.
#[derive(Debug)]
pub struct Aggregator {
    policy: NoteScanPolicy,
    flags: FlagMap,
}

impl Aggregator {
    pub fn new(policy: NoteScanPolicy) -> Self {
        Self {
            policy,
            flags: FlagMap::new(),
        }
    }

    /// Merge one changeset's fetched build records.
    ///
    /// `rev` is the canonical revision the builds were fetched for.
    pub fn record_builds(
        &mut self,
        rev: &str,
        builds: &[BuildRecord],
        normalizer: &BuilderNormalizer,
    ) {
        for build in builds {
            let Some(label) = normalizer.normalize(&build.buildername) else {
                continue;
            };

            let targets = self.collect_targets(build);
            if !targets.is_empty() {
                for target in targets {
                    self.flags
                        .entry(target)
                        .or_default()
                        .insert(label.clone(), 1);
                }
            } else if build.result.trim().eq_ignore_ascii_case("success") {
                self.flags
                    .entry(rev.to_string())
                    .or_default()
                    .entry(label)
                    .or_insert(0);
            }
        }
    }

    fn collect_targets(&self, build: &BuildRecord) -> Vec<String> {
        match self.policy {
            NoteScanPolicy::ScanAll => build
                .notes
                .iter()
                .flat_map(|note| backout_targets(&note.note))
                .collect(),
            NoteScanPolicy::FirstMatch => build
                .notes
                .iter()
                .find_map(|note| first_backout_target(&note.note))
                .into_iter()
                .collect(),
        }
    }

    /// Changeset ids with at least one recorded flag
    pub fn changesets(&self) -> impl Iterator<Item = &str> {
        self.flags.keys().map(String::as_str)
    }

    pub fn into_flags(self) -> FlagMap {
        self.flags
    }
}

/// Union of directory prefixes touched by any changeset in a push, as a
/// presence set. The prefix is everything up to and including the last `/`;
/// top-level files map to the empty prefix.
pub fn aggregate_files(push: &Push) -> BTreeMap<String, u8> {
    let mut files = BTreeMap::new();
    for cset in &push.changesets {
        for file in &cset.files {
            let prefix = match file.rfind('/') {
                Some(idx) => &file[..=idx],
                None => "",
            };
            files.insert(prefix.to_string(), 1);
        }
    }
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Changeset, Note};

    fn normalizer() -> BuilderNormalizer {
        BuilderNormalizer::new("repo-name")
    }

    fn build(name: &str, result: &str, notes: &[&str]) -> BuildRecord {
        BuildRecord {
            buildername: name.to_string(),
            result: result.to_string(),
            notes: notes
                .iter()
                .map(|n| Note {
                    note: n.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_success_recorded_for_own_changeset() {
        let mut agg = Aggregator::new(NoteScanPolicy::ScanAll);
        agg.record_builds(
            "abc123def456",
            &[build("repo-name opt test", "success", &[])],
            &normalizer(),
        );

        let flags = agg.into_flags();
        assert_eq!(flags["abc123def456"]["opt test"], 0);
    }

    #[test]
    fn test_non_success_without_backout_records_nothing() {
        let mut agg = Aggregator::new(NoteScanPolicy::ScanAll);
        agg.record_builds(
            "abc123def456",
            &[build("repo-name opt test", "failure", &[])],
            &normalizer(),
        );
        assert!(agg.into_flags().is_empty());
    }

    #[test]
    fn test_backout_attributed_to_target_under_reporting_label() {
        let mut agg = Aggregator::new(NoteScanPolicy::ScanAll);
        agg.record_builds(
            "abc123def456",
            &[build(
                "repo-name build",
                "failure",
                &["backed out for bug 123, see deadbeef0123"],
            )],
            &normalizer(),
        );

        let flags = agg.into_flags();
        assert_eq!(flags["deadbeef0123"]["build"], 1);
        assert!(!flags.contains_key("abc123def456"));
    }

    #[test]
    fn test_excluded_builder_records_nothing() {
        let mut agg = Aggregator::new(NoteScanPolicy::ScanAll);
        agg.record_builds(
            "abc123def456",
            &[build("repo-name talos tp5", "success", &[])],
            &normalizer(),
        );
        assert!(agg.into_flags().is_empty());
    }

    #[test]
    fn test_backout_wins_regardless_of_order() {
        let success = build("repo-name opt test", "success", &[]);
        let backout = build(
            "repo-name opt test",
            "failure",
            &["backed out, see abc123def456"],
        );

        // Success first, then backout
        let mut agg = Aggregator::new(NoteScanPolicy::ScanAll);
        agg.record_builds("abc123def456", &[success.clone(), backout.clone()], &normalizer());
        assert_eq!(agg.into_flags()["abc123def456"]["opt test"], 1);

        // Backout first, then success
        let mut agg = Aggregator::new(NoteScanPolicy::ScanAll);
        agg.record_builds("abc123def456", &[backout, success], &normalizer());
        assert_eq!(agg.into_flags()["abc123def456"]["opt test"], 1);
    }

    #[test]
    fn test_scan_all_collects_every_match() {
        let mut agg = Aggregator::new(NoteScanPolicy::ScanAll);
        agg.record_builds(
            "abc123def456",
            &[build(
                "repo-name build",
                "failure",
                &[
                    "backed out deadbeef0123 and cafebabe4567",
                    "also ba9876543210",
                ],
            )],
            &normalizer(),
        );

        let flags = agg.into_flags();
        assert_eq!(flags["deadbeef0123"]["build"], 1);
        assert_eq!(flags["cafebabe4567"]["build"], 1);
        assert_eq!(flags["ba9876543210"]["build"], 1);
    }

    #[test]
    fn test_first_match_policy_stops_at_first() {
        let mut agg = Aggregator::new(NoteScanPolicy::FirstMatch);
        agg.record_builds(
            "abc123def456",
            &[build(
                "repo-name build",
                "failure",
                &[
                    "backed out deadbeef0123 and cafebabe4567",
                    "also ba9876543210",
                ],
            )],
            &normalizer(),
        );

        let flags = agg.into_flags();
        assert_eq!(flags.len(), 1);
        assert_eq!(flags["deadbeef0123"]["build"], 1);
    }

    #[test]
    fn test_aggregate_files_prefix_union() {
        let push = Push {
            changesets: vec![
                Changeset {
                    node: "a".repeat(40),
                    desc: String::new(),
                    files: vec!["dir/a.js".into(), "dir/b.js".into()],
                },
                Changeset {
                    node: "b".repeat(40),
                    desc: String::new(),
                    files: vec!["dir/sub/c.js".into(), "README".into()],
                },
            ],
        };

        let files = aggregate_files(&push);
        assert_eq!(files["dir/"], 1);
        assert_eq!(files["dir/sub/"], 1);
        assert_eq!(files[""], 1);
        assert_eq!(files.len(), 3);
    }
}
