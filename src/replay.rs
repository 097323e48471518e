// src/replay.rs

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use git2::{ObjectType, Repository, Signature};
use indicatif::ProgressBar;
use sha2::{Digest, Sha256};

use crate::config::Config;
use crate::error::{MigrateError, Result};
use crate::history::{self, HistoryWalker};
use crate::lfs::PatternSet;
use crate::model::{FileMode, TagRecord};
use crate::transform::{self, Content, OutEntry, TransformRules};

const GIT_ATTRIBUTES: &str = ".gitattributes";

/// Result of a full replay run.
pub struct ReplayOutcome {
    /// New commit ids, index-aligned with the walked source chain.
    pub commits: Vec<git2::Oid>,
    pub tags_replayed: usize,
    pub warnings: Vec<String>,
}

/// Identity of the content last written for a path, used to compute the
/// minimal write/remove delta between consecutive snapshots. Equal blob oids
/// imply equal written bytes (pointer routing depends only on the path).
#[derive(Clone, Copy, PartialEq, Eq)]
enum WrittenId {
    Blob(git2::Oid),
    Inline([u8; 32]),
}

fn written_id(entry: &OutEntry) -> WrittenId {
    match &entry.content {
        Content::Blob(oid) => WrittenId::Blob(*oid),
        Content::Bytes(bytes) => WrittenId::Inline(Sha256::digest(bytes).into()),
    }
}

fn io_at<T>(path: &Path, result: std::io::Result<T>) -> Result<T> {
    result.map_err(|source| MigrateError::ReplayWrite {
        path: path.to_path_buf(),
        source,
    })
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Replay the linear history of `branch` from the source repository into a
/// freshly initialized destination, applying transforms and LFS routing.
/// Any write or commit failure aborts the run; the destination then holds a
/// valid prefix of history and should simply be discarded.
pub fn run(
    source_path: &Path,
    dest_path: &Path,
    branch: &str,
    config: &Config,
) -> Result<ReplayOutcome> {
    config.validate()?;
    let rules = TransformRules::from_config(config);
    let patterns = PatternSet::from_config(config)?;
    let attributes = patterns.gitattributes();

    let source = Repository::open(source_path)?;
    let walker = HistoryWalker::new(&source, branch)?;
    let (tag_records, mut warnings) = history::tags(&source, walker.ids())?;

    // Transform is pure, so a dry run over the full chain surfaces rename
    // collisions at any commit before the destination is created. A
    // collision must write nothing, not leave a truncated prefix.
    for record in HistoryWalker::new(&source, branch)? {
        transform::transform(&record?.files, &rules, &source)?;
    }

    let dest = init_destination(source_path, dest_path, branch)?;
    let workdir = dest
        .workdir()
        .ok_or_else(|| {
            MigrateError::ConfigValidation("destination repository has no working tree".into())
        })?
        .to_path_buf();

    tracing::info!(
        source = %source_path.display(),
        dest = %dest_path.display(),
        commits = walker.len(),
        "replaying commits"
    );
    let bar = ProgressBar::new(walker.len() as u64);
    bar.set_message("Replaying commits");

    let mut previous: BTreeMap<String, (WrittenId, FileMode)> = BTreeMap::new();
    let mut commits: Vec<git2::Oid> = Vec::new();
    let mut saw_attributes = false;

    for record in walker {
        let record = record?;
        let mut snapshot = transform::transform(&record.files, &rules, &source)?;

        if snapshot.contains_key(GIT_ATTRIBUTES) && !saw_attributes {
            saw_attributes = true;
            let warning = format!(
                "source history carries its own {GIT_ATTRIBUTES}; the generated LFS attributes replace it"
            );
            tracing::warn!("{warning}");
            warnings.push(warning);
        }
        snapshot.insert(
            GIT_ATTRIBUTES.to_string(),
            OutEntry {
                content: Content::Bytes(attributes.clone().into_bytes()),
                mode: FileMode::Normal,
            },
        );

        let mut index = dest.index()?;

        let removed: Vec<String> = previous
            .keys()
            .filter(|path| !snapshot.contains_key(*path))
            .cloned()
            .collect();
        for path in removed {
            let file = workdir.join(&path);
            io_at(&file, fs::remove_file(&file))?;
            prune_empty_dirs(&workdir, &file);
            index.remove_path(Path::new(&path))?;
            previous.remove(&path);
        }

        for (path, entry) in &snapshot {
            let id = written_id(entry);
            let unchanged = previous
                .get(path)
                .map(|(prev_id, prev_mode)| *prev_id == id && *prev_mode == entry.mode)
                .unwrap_or(false);
            if unchanged {
                continue;
            }
            write_entry(&dest, &source, &workdir, path, entry, &patterns)?;
            index.add_path(Path::new(path))?;
            previous.insert(path.clone(), (id, entry.mode));
        }

        index.write()?;
        let tree = dest.find_tree(index.write_tree()?)?;

        let author_id = record.author.mapped(&config.authors);
        let committer_id = record.committer.mapped(&config.authors);
        let author = Signature::new(&author_id.name, &author_id.email, &record.authored.to_git())?;
        let committer = Signature::new(
            &committer_id.name,
            &committer_id.email,
            &record.committed.to_git(),
        )?;

        let parent = match commits.last() {
            Some(&oid) => Some(dest.find_commit(oid)?),
            None => None,
        };
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        let oid = dest.commit(
            Some("HEAD"),
            &author,
            &committer,
            &record.message,
            &tree,
            &parents,
        )?;
        tracing::debug!(source = %record.id, dest = %oid, "replayed commit");
        commits.push(oid);
        bar.inc(1);
    }
    bar.finish_with_message("Replay complete");

    let tags_replayed = replay_tags(&dest, &tag_records, &commits, config)?;

    Ok(ReplayOutcome {
        commits,
        tags_replayed,
        warnings,
    })
}

/// Wipe and re-init the destination. The destination must never be the
/// source repository.
fn init_destination(source_path: &Path, dest_path: &Path, branch: &str) -> Result<Repository> {
    if dest_path.exists() {
        let same = fs::canonicalize(dest_path)
            .ok()
            .zip(fs::canonicalize(source_path).ok())
            .map(|(a, b)| a == b)
            .unwrap_or(false);
        if same {
            return Err(MigrateError::ConfigValidation(
                "destination path equals the source repository".into(),
            ));
        }
        fs::remove_dir_all(dest_path)?;
    }
    fs::create_dir_all(dest_path)?;
    let dest = Repository::init(dest_path)?;
    // Pin the unborn HEAD to the replayed branch name, whatever the host
    // git config picks as its default.
    dest.set_head(&format!("refs/heads/{branch}"))?;
    Ok(dest)
}

fn write_entry(
    dest: &Repository,
    source: &Repository,
    workdir: &Path,
    path: &str,
    entry: &OutEntry,
    patterns: &PatternSet,
) -> Result<()> {
    let bytes = match &entry.content {
        Content::Blob(oid) => history::read_blob(source, *oid)?,
        Content::Bytes(bytes) => bytes.clone(),
    };

    let file = workdir.join(path);
    if let Some(parent) = file.parent() {
        io_at(parent, fs::create_dir_all(parent))?;
    }

    if entry.mode == FileMode::Link {
        return write_link(&file, &bytes);
    }

    // A stale symlink at this path would make fs::write follow the link.
    if let Ok(meta) = file.symlink_metadata() {
        if meta.file_type().is_symlink() {
            io_at(&file, fs::remove_file(&file))?;
        }
    }

    let final_bytes = if path != GIT_ATTRIBUTES && patterns.is_match(path) {
        lfs_pointer(dest, &bytes)?
    } else {
        bytes
    };
    io_at(&file, fs::write(&file, &final_bytes))?;

    // fs::write keeps the permissions of an existing file, so a mode flip
    // must be applied explicitly in both directions.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = match entry.mode {
            FileMode::Executable => 0o755,
            _ => 0o644,
        };
        io_at(
            &file,
            fs::set_permissions(&file, fs::Permissions::from_mode(mode)),
        )?;
    }

    Ok(())
}

#[cfg(unix)]
fn write_link(file: &Path, target: &[u8]) -> Result<()> {
    if file.symlink_metadata().is_ok() {
        io_at(file, fs::remove_file(file))?;
    }
    let target = PathBuf::from(String::from_utf8_lossy(target).into_owned());
    io_at(file, std::os::unix::fs::symlink(target, file))
}

#[cfg(not(unix))]
fn write_link(file: &Path, target: &[u8]) -> Result<()> {
    io_at(file, fs::write(file, target))
}

/// Store the real bytes under `.git/lfs/objects/aa/bb/<sha256>` and return
/// the pointer file content committed in their place.
fn lfs_pointer(dest: &Repository, bytes: &[u8]) -> Result<Vec<u8>> {
    let oid = hex(&Sha256::digest(bytes));
    let dir = dest.path().join("lfs/objects").join(&oid[..2]).join(&oid[2..4]);
    io_at(&dir, fs::create_dir_all(&dir))?;
    let object = dir.join(&oid);
    if !object.exists() {
        io_at(&object, fs::write(&object, bytes))?;
    }
    Ok(format!(
        "version https://git-lfs.github.com/spec/v1\noid sha256:{oid}\nsize {}\n",
        bytes.len()
    )
    .into_bytes())
}

/// Remove now-empty parent directories up to, but excluding, the workdir
/// root. Stops at the first non-empty directory.
fn prune_empty_dirs(root: &Path, file: &Path) {
    let mut dir = file.parent();
    while let Some(d) = dir {
        if d == root || fs::remove_dir(d).is_err() {
            break;
        }
        dir = d.parent();
    }
}

fn replay_tags(
    dest: &Repository,
    tags: &[TagRecord],
    commits: &[git2::Oid],
    config: &Config,
) -> Result<usize> {
    let mut replayed = 0;
    for tag in tags {
        let target = commits[tag.target];
        let object = dest.find_object(target, Some(ObjectType::Commit))?;

        match &tag.annotation {
            None => {
                dest.tag_lightweight(&tag.name, &object, false)?;
            }
            Some(annotation) => {
                let signature = match &annotation.tagger {
                    Some((identity, when)) => {
                        let mapped = identity.mapped(&config.authors);
                        Signature::new(&mapped.name, &mapped.email, &when.to_git())?
                    }
                    None => {
                        // Tag objects without a tagger fall back to the
                        // target commit's committer.
                        let commit = dest.find_commit(target)?;
                        let committer = commit.committer();
                        Signature::new(
                            committer.name().unwrap_or("Unknown"),
                            committer.email().unwrap_or(""),
                            &committer.when(),
                        )?
                    }
                };
                dest.tag(&tag.name, &object, &signature, &annotation.message, false)?;
            }
        }
        tracing::debug!(name = %tag.name, "replayed tag");
        replayed += 1;
    }
    Ok(replayed)
}
