//! Builder-label normalization
//!
//! Raw builder names from the build-result service encode platform, OS
//! version, and hardware noise alongside the part that actually identifies
//! the job flavor. This module strips the noise down to a stable label used
//! as a training output key, or discards the record entirely for job
//! categories that carry no signal.
//!
//! The removal rules are an ordered, data-driven table so individual tokens
//! can be tested and extended without touching control flow.

use once_cell::sync::Lazy;
use regex::Regex;

/// Canonical label for any builder whose name carries a "build" marker
pub const BUILD_LABEL: &str = "build";

/// Job categories that are discarded outright: their outcomes say nothing
/// about the changeset under test.
static EXCLUDED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(dependent|periodic|spidermonkey|talos|valgrind)\b")
        .expect("valid exclusion regex")
});

static BUILD_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bbuild\b").expect("valid build marker regex"));

/// Noise patterns removed when a whitespace-delimited token matches one in
/// full, case-insensitive. Platforms, OS names, version numbers,
/// architecture tags, connectors.
const NOISE_TOKENS: &[&str] = &[
    // Platforms
    "linux64",
    "linux",
    "win64",
    "win32",
    "winnt",
    "macosx64",
    "macosx",
    "osx",
    "android",
    // OS names and slave types
    "snowleopard",
    "leopard",
    "lion",
    "mountainlion",
    "fedora",
    "ubuntu",
    "xp",
    "vista",
    "win7",
    "win8",
    "w764",
    "rev3",
    "rev4",
    // Architecture tags
    "x86-64",
    "x86_64",
    "x86",
    "armv6",
    "armv7",
    "arm",
    // Version numbers
    r"\d+(\.\d+)*",
    // Connectors
    "on",
    "ix",
];

static NOISE_RULES: Lazy<Vec<Regex>> = Lazy::new(|| {
    NOISE_TOKENS
        .iter()
        .map(|token| {
            Regex::new(&format!(r"(?i)^(?:{})$", token)).expect("valid noise token regex")
        })
        .collect()
});

fn is_noise(token: &str) -> bool {
    NOISE_RULES.iter().any(|rule| rule.is_match(token))
}

/// Normalizes raw builder names for one repository.
///
/// Pure and deterministic: the same raw name always yields the same label.
#[derive(Debug, Clone)]
pub struct BuilderNormalizer {
    repo: String,
}

impl BuilderNormalizer {
    pub fn new(repo: impl Into<String>) -> Self {
        Self { repo: repo.into() }
    }

    /// Normalize a raw builder name into a label, or `None` to discard the
    /// whole build record.
    ///
    /// The repository name is stripped first, then exclusion categories are
    /// checked, then the "build" collapse, then the noise-token table.
    /// Surviving tokens are rejoined with single spaces; a label that strips
    /// down to nothing is discarded as well.
    pub fn normalize(&self, raw: &str) -> Option<String> {
        let stripped = raw.replacen(&self.repo, "", 1);

        if EXCLUDED.is_match(&stripped) {
            return None;
        }
        if BUILD_MARKER.is_match(&stripped) {
            return Some(BUILD_LABEL.to_string());
        }

        let label = stripped
            .split_whitespace()
            .filter(|token| !is_noise(token))
            .collect::<Vec<_>>()
            .join(" ");

        if label.is_empty() {
            None
        } else {
            Some(label)
        }
    }
}
