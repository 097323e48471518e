// src/model.rs

use std::collections::BTreeMap;

use crate::config::Author;

/// Author or committer identity as recorded in a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Identity {
    /// The `"Name <email>"` form used as the key of the config authors table.
    pub fn key(&self) -> String {
        format!("{} <{}>", self.name, self.email)
    }

    /// Apply the authors-mapping table; identities without an entry pass
    /// through unchanged.
    pub fn mapped(&self, authors: &BTreeMap<String, Author>) -> Identity {
        match authors.get(&self.key()) {
            Some(author) => Identity {
                name: author.name.clone(),
                email: author.email.clone(),
            },
            None => self.clone(),
        }
    }
}

/// A commit or tag timestamp: seconds since the epoch plus UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    pub seconds: i64,
    pub offset_minutes: i32,
}

impl From<git2::Time> for Timestamp {
    fn from(time: git2::Time) -> Self {
        Timestamp {
            seconds: time.seconds(),
            offset_minutes: time.offset_minutes(),
        }
    }
}

impl Timestamp {
    pub fn to_git(self) -> git2::Time {
        git2::Time::new(self.seconds, self.offset_minutes)
    }
}

/// Kind of a tracked tree entry, derived from the git filemode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    Normal,
    Executable,
    Link,
}

impl FileMode {
    pub fn from_filemode(mode: i32) -> FileMode {
        match mode {
            0o100755 => FileMode::Executable,
            0o120000 => FileMode::Link,
            _ => FileMode::Normal,
        }
    }
}

/// One tracked file at one commit: a content reference plus its mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileEntry {
    pub oid: git2::Oid,
    pub mode: FileMode,
}

/// The complete set of tracked path -> content mappings at one commit.
pub type Snapshot = BTreeMap<String, FileEntry>;

/// One commit of the walked source history, with its full tree snapshot.
#[derive(Debug, Clone)]
pub struct CommitRecord {
    pub index: usize,
    pub parent: Option<usize>,
    pub id: git2::Oid,
    pub author: Identity,
    pub committer: Identity,
    pub authored: Timestamp,
    pub committed: Timestamp,
    pub message: String,
    pub files: Snapshot,
}

/// Annotation carried by a non-lightweight tag.
#[derive(Debug, Clone)]
pub struct TagAnnotation {
    pub message: String,
    pub tagger: Option<(Identity, Timestamp)>,
}

/// A tag whose target resolved to a commit on the walked chain.
#[derive(Debug, Clone)]
pub struct TagRecord {
    pub name: String,
    /// Position of the target commit in the walked chain.
    pub target: usize,
    /// `None` for lightweight tags.
    pub annotation: Option<TagAnnotation>,
}
