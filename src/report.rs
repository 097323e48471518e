// src/report.rs

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use git2::Repository;

use crate::config::Config;
use crate::error::Result;
use crate::history::{self, HistoryWalker};
use crate::model::{Identity, Timestamp};

/// Where a to-be-deleted path first entered history and roughly how much
/// space removing it frees. The byte count sums each distinct content
/// revision of the path, an upper bound on the post-compaction saving.
#[derive(Debug, Clone)]
pub struct DeletedFileReport {
    pub path: String,
    pub first_commit: usize,
    pub first_id: git2::Oid,
    pub first_author: Identity,
    pub first_date: Timestamp,
    pub revisions: usize,
    pub approx_bytes: u64,
}

/// Read-only report over the configured delete set. Paths never seen in
/// history are returned separately so the operator can fix typos.
pub fn deleted_files(
    repo_path: &Path,
    branch: &str,
    config: &Config,
) -> Result<(Vec<DeletedFileReport>, Vec<String>)> {
    let repo = Repository::open(repo_path)?;
    let walker = HistoryWalker::new(&repo, branch)?;

    let targets: BTreeSet<&str> = config
        .history_delete_files
        .iter()
        .map(String::as_str)
        .collect();
    let mut reports: BTreeMap<String, DeletedFileReport> = BTreeMap::new();
    let mut blobs_seen: BTreeMap<String, BTreeSet<git2::Oid>> = BTreeMap::new();

    for record in walker {
        let record = record?;
        for (path, entry) in &record.files {
            if !targets.contains(path.as_str()) {
                continue;
            }
            let report = reports
                .entry(path.clone())
                .or_insert_with(|| DeletedFileReport {
                    path: path.clone(),
                    first_commit: record.index,
                    first_id: record.id,
                    first_author: record.author.clone(),
                    first_date: record.authored,
                    revisions: 0,
                    approx_bytes: 0,
                });

            // Each distinct blob is one stored revision of the path.
            if blobs_seen
                .entry(path.clone())
                .or_default()
                .insert(entry.oid)
            {
                report.revisions += 1;
                report.approx_bytes += history::read_blob(&repo, entry.oid)?.len() as u64;
            }
        }
    }

    let missing = config
        .history_delete_files
        .iter()
        .filter(|path| !reports.contains_key(*path))
        .cloned()
        .collect();

    Ok((reports.into_values().collect(), missing))
}
