// src/analyze.rs

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use git2::Repository;
use indicatif::ProgressBar;

use crate::config::{Author, Config};
use crate::error::Result;
use crate::history::{self, HistoryWalker};
use crate::lfs::{self, PatternSet};
use crate::scan;

/// Analyze the source history and write/update the JSON config: authors
/// table, advisory warnings, and uncovered large/binary-file candidates.
/// Read-only on the repository; append-only on an existing config.
pub fn run(repo_path: &Path, branch: &str, config_path: &Path) -> Result<Config> {
    let repo = Repository::open(repo_path)?;
    let mut config = Config::load_or_default(config_path)?;
    let patterns = PatternSet::from_config(&config)?;

    let walker = HistoryWalker::new(&repo, branch)?;
    tracing::info!(
        repo = %repo_path.display(),
        commits = walker.len(),
        "analyzing history"
    );
    let bar = ProgressBar::new(walker.len() as u64);
    bar.set_message("Analyzing commits");

    let mut authors: BTreeMap<String, Author> = BTreeMap::new();
    let mut warnings: Vec<String> = Vec::new();
    let mut candidates: BTreeSet<String> = BTreeSet::new();
    let mut seen: BTreeSet<String> = BTreeSet::new();

    for record in walker {
        let record = record?;
        for identity in [&record.author, &record.committer] {
            authors.entry(identity.key()).or_insert_with(|| Author {
                name: identity.name.clone(),
                email: identity.email.clone(),
            });
        }

        // Only paths appearing for the first time need inspection.
        for (path, entry) in &record.files {
            if !seen.insert(path.clone()) {
                continue;
            }

            if let Some(warning) = scan::scan_path(path) {
                if !warnings.contains(&warning) {
                    warnings.push(warning);
                }
            }

            if patterns.is_match(path) {
                continue;
            }
            let content = history::read_blob(&repo, entry.oid)?;
            if lfs::looks_large_or_binary(content.len() as u64, &content) {
                candidates.insert(path.clone());
            }
        }
        bar.inc(1);
    }
    bar.finish_with_message("Analysis complete");

    config.absorb_analysis(authors, warnings, candidates.into_iter().collect());
    config.save(config_path)?;
    Ok(config)
}
