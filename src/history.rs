// src/history.rs

use std::collections::HashMap;

use git2::{BranchType, ObjectType, Repository, TreeWalkMode, TreeWalkResult};

use crate::error::{MigrateError, Result};
use crate::model::{
    CommitRecord, FileEntry, FileMode, Identity, Snapshot, TagAnnotation, TagRecord,
};

/// Lazy oldest-first walk over a linear branch history.
///
/// The commit chain is resolved and checked for linearity up front; the full
/// tree snapshot of each commit is only materialized when the iterator is
/// advanced. Restart by constructing a new walker.
pub struct HistoryWalker<'repo> {
    repo: &'repo Repository,
    ids: Vec<git2::Oid>,
    next: usize,
}

impl<'repo> HistoryWalker<'repo> {
    pub fn new(repo: &'repo Repository, branch: &str) -> Result<Self> {
        let branch_ref = repo.find_branch(branch, BranchType::Local).map_err(|_| {
            MigrateError::UnsupportedHistory(format!("branch `{branch}` not found"))
        })?;
        let tip = branch_ref.get().peel_to_commit()?;

        let mut ids = Vec::new();
        let mut current = Some(tip);
        while let Some(commit) = current {
            match commit.parent_count() {
                0 => {
                    ids.push(commit.id());
                    current = None;
                }
                1 => {
                    let parent = commit.parent(0)?;
                    ids.push(commit.id());
                    current = Some(parent);
                }
                n => {
                    return Err(MigrateError::UnsupportedHistory(format!(
                        "commit {} has {n} parents; merge history cannot be replayed",
                        commit.id()
                    )));
                }
            }
        }
        ids.reverse();

        Ok(HistoryWalker { repo, ids, next: 0 })
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Oldest-first commit ids of the walked chain.
    pub fn ids(&self) -> &[git2::Oid] {
        &self.ids
    }

    fn record(&self, index: usize) -> Result<CommitRecord> {
        let commit = self.repo.find_commit(self.ids[index])?;
        let files = snapshot_tree(&commit)?;
        let author = commit.author();
        let committer = commit.committer();

        let record = CommitRecord {
            index,
            parent: index.checked_sub(1),
            id: commit.id(),
            author: signature_identity(&author),
            committer: signature_identity(&committer),
            authored: author.when().into(),
            committed: committer.when().into(),
            message: commit.message().unwrap_or_default().to_string(),
            files,
        };
        Ok(record)
    }
}

impl Iterator for HistoryWalker<'_> {
    type Item = Result<CommitRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.ids.len() {
            return None;
        }
        let record = self.record(self.next);
        self.next += 1;
        Some(record)
    }
}

fn signature_identity(sig: &git2::Signature<'_>) -> Identity {
    Identity {
        name: sig.name().unwrap_or("Unknown").to_string(),
        email: sig.email().unwrap_or("").to_string(),
    }
}

/// Full tracked-path set of one commit, blobs and symlinks only.
fn snapshot_tree(commit: &git2::Commit<'_>) -> Result<Snapshot> {
    let tree = commit.tree()?;
    let mut files = Snapshot::new();
    tree.walk(TreeWalkMode::PreOrder, |root, entry| {
        if entry.kind() == Some(ObjectType::Blob) {
            if let Some(name) = entry.name() {
                files.insert(
                    format!("{root}{name}"),
                    FileEntry {
                        oid: entry.id(),
                        mode: FileMode::from_filemode(entry.filemode()),
                    },
                );
            }
        }
        TreeWalkResult::Ok
    })?;
    Ok(files)
}

/// Enumerate `refs/tags/*`, mapping each tag to its position on the walked
/// chain. Tags whose target is not a commit on the chain (tree/blob tags,
/// tags on other branches) are dropped with a warning.
pub fn tags(repo: &Repository, chain: &[git2::Oid]) -> Result<(Vec<TagRecord>, Vec<String>)> {
    let positions: HashMap<git2::Oid, usize> = chain
        .iter()
        .enumerate()
        .map(|(index, &oid)| (oid, index))
        .collect();

    let mut records = Vec::new();
    let mut warnings = Vec::new();

    let names = repo.tag_names(None)?;
    for name in names.iter().flatten() {
        let reference = repo.find_reference(&format!("refs/tags/{name}"))?;
        let oid = match reference.target() {
            Some(oid) => oid,
            None => continue,
        };

        // Annotated tags point at a tag object wrapping the real target.
        let (target_oid, annotation) = match repo.find_tag(oid) {
            Ok(tag) => {
                let tagger = tag.tagger().map(|sig| {
                    (signature_identity(&sig), sig.when().into())
                });
                let annotation = TagAnnotation {
                    message: tag.message().unwrap_or_default().to_string(),
                    tagger,
                };
                (tag.target_id(), Some(annotation))
            }
            Err(_) => (oid, None),
        };

        match positions.get(&target_oid) {
            Some(&target) => records.push(TagRecord {
                name: name.to_string(),
                target,
                annotation,
            }),
            None => warnings.push(format!(
                "cannot map tag `{name}` @ {target_oid}: only tags on walked commits are replayed"
            )),
        }
    }

    Ok((records, warnings))
}

/// Read a blob's full content from the source repository.
pub fn read_blob(repo: &Repository, oid: git2::Oid) -> Result<Vec<u8>> {
    Ok(repo.find_blob(oid)?.content().to_vec())
}
