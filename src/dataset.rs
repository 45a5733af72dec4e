//! Dataset persistence and merging
//!
//! Training records are the only persisted entity: a pretty-printed JSON
//! array, written whole-file atomically (temp file + rename) so a fatal
//! failure never leaves partial output behind. Several dataset files can be
//! merged into one training input for the downstream trainer.

use crate::error::Result;
use crate::types::TrainingRecord;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Write records atomically to `path` as a pretty-printed JSON array.
pub fn write_records(path: &Path, records: &[TrainingRecord]) -> Result<()> {
    let json = serde_json::to_vec_pretty(records)?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = Path::new(&tmp);

    fs::write(tmp, json)?;
    fs::rename(tmp, path)?;
    debug!("Wrote {} record(s) to {}", records.len(), path.display());
    Ok(())
}

/// Read a dataset file written by [`write_records`].
pub fn read_records(path: &Path) -> Result<Vec<TrainingRecord>> {
    let data = fs::read(path)?;
    Ok(serde_json::from_slice(&data)?)
}

/// Summary of a merged dataset: record count and unique key counts,
/// for sizing the downstream model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeSummary {
    pub records: usize,
    pub inputs: usize,
    pub outputs: usize,
}

/// Concatenate several dataset files in argument order.
pub fn merge_datasets(paths: &[impl AsRef<Path>]) -> Result<(Vec<TrainingRecord>, MergeSummary)> {
    let mut merged = Vec::new();
    for path in paths {
        let mut records = read_records(path.as_ref())?;
        debug!(
            "Loaded {} record(s) from {}",
            records.len(),
            path.as_ref().display()
        );
        merged.append(&mut records);
    }

    let mut inputs = BTreeSet::new();
    let mut outputs = BTreeSet::new();
    for record in &merged {
        inputs.extend(record.input.keys().cloned());
        outputs.extend(record.output.keys().cloned());
    }

    let summary = MergeSummary {
        records: merged.len(),
        inputs: inputs.len(),
        outputs: outputs.len(),
    };
    info!(
        "Merged {} record(s) mapping {} input(s) to {} output(s)",
        summary.records, summary.inputs, summary.outputs
    );
    Ok((merged, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn record(input: &[&str], output: &[(&str, u8)]) -> TrainingRecord {
        TrainingRecord {
            input: input.iter().map(|k| (k.to_string(), 1)).collect(),
            output: output
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn test_write_then_read_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.json");
        let records = vec![record(&["dir/"], &[("opt test", 0)])];

        write_records(&path, &records).unwrap();
        assert_eq!(read_records(&path).unwrap(), records);
        // No temp file left behind
        assert!(!dir.path().join("out.json.tmp").exists());
    }

    #[test]
    fn test_write_overwrites_whole_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.json");

        write_records(&path, &[record(&["a/"], &[("build", 1)])]).unwrap();
        write_records(&path, &[]).unwrap();
        assert!(read_records(&path).unwrap().is_empty());
    }

    #[test]
    fn test_merge_concatenates_in_order_and_counts_unique_keys() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.json");
        let b = dir.path().join("b.json");

        write_records(
            &a,
            &[
                record(&["dir/"], &[("opt test", 0)]),
                record(&["other/"], &[("build", 1)]),
            ],
        )
        .unwrap();
        write_records(&b, &[record(&["dir/"], &[("opt test", 1)])]).unwrap();

        let (merged, summary) = merge_datasets(&[&a, &b]).unwrap();
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].input.keys().next().map(String::as_str), Some("dir/"));
        assert_eq!(merged[2].output["opt test"], 1);
        assert_eq!(
            summary,
            MergeSummary {
                records: 3,
                inputs: 2,
                outputs: 2,
            }
        );
    }

    #[test]
    fn test_merge_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        assert!(merge_datasets(&[dir.path().join("absent.json")]).is_err());
    }
}
