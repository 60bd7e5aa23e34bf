//! JSON snapshot of a run, written next to (or instead of) dispatching.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::app::Result;
use crate::domain::Record;
use crate::harvest::RunSummary;

#[derive(Serialize)]
struct Snapshot<'a> {
    metadata: Metadata<'a>,
    targets: Vec<TargetRecords<'a>>,
}

#[derive(Serialize)]
struct Metadata<'a> {
    scraped_at: DateTime<Utc>,
    target_count: usize,
    record_count: usize,
    targets: Vec<&'a str>,
}

#[derive(Serialize)]
struct TargetRecords<'a> {
    name: &'a str,
    url: Option<&'a str>,
    error: Option<&'a str>,
    records: &'a [Record],
}

/// `reviews_<timestamp>_p<targets>_r<records>.json`
pub fn snapshot_file_name(at: DateTime<Utc>, targets: usize, records: usize) -> String {
    format!(
        "reviews_{}_p{}_r{}.json",
        at.format("%Y%m%d_%H%M%S"),
        targets,
        records
    )
}

/// Write the run's records grouped by target into `dir`. Returns the file path.
pub fn write_snapshot(dir: &Path, summary: &RunSummary) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;

    let snapshot = Snapshot {
        metadata: Metadata {
            scraped_at: summary.started_at,
            target_count: summary.targets.len(),
            record_count: summary.total_records(),
            targets: summary.targets.iter().map(|t| t.target.as_str()).collect(),
        },
        targets: summary
            .targets
            .iter()
            .map(|t| TargetRecords {
                name: &t.target,
                url: t.url.as_deref(),
                error: t.error.as_deref(),
                records: &t.records,
            })
            .collect(),
    };

    let path = dir.join(snapshot_file_name(
        summary.started_at,
        summary.targets.len(),
        summary.total_records(),
    ));
    fs::write(&path, serde_json::to_vec_pretty(&snapshot)?)?;
    tracing::info!("Wrote snapshot to {}", path.display());
    Ok(path)
}
