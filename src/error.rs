// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, MigrateError>;

#[derive(Error, Debug)]
pub enum MigrateError {
    /// The walked history is not a single linear chain (merge commit, or
    /// the requested branch does not exist).
    #[error("unsupported history: {0}")]
    UnsupportedHistory(String),

    /// Two distinct source paths were renamed onto the same target path.
    #[error("rename collision: `{first}` and `{second}` both map to `{target}`")]
    RenameCollision {
        first: String,
        second: String,
        target: String,
    },

    #[error("invalid configuration: {0}")]
    ConfigValidation(String),

    /// A file write or commit creation failed mid-replay. The destination is
    /// left as a valid prefix of history and should be discarded.
    #[error("replay write failure at `{path}`: {source}")]
    ReplayWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid LFS pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        source: globset::Error,
    },

    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),
}
