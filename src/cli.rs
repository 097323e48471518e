// src/cli.rs

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Print per-commit detail while working
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze git history and write a JSON config with the authors
    /// mapping, advisory warnings, and LFS candidate patterns to tweak
    Analyze {
        #[command(flatten)]
        common: Common,
    },
    /// Replay the history into a fresh LFS-enabled repository using the
    /// config (or the default LFS patterns)
    Migrate {
        #[command(flatten)]
        common: Common,

        /// Destination repository path (default: `<repo>-lfs`)
        #[arg(short, long)]
        dest: Option<PathBuf>,
    },
    /// Report which configured files will be deleted, where they first
    /// appear, and the approximate space freed
    Show {
        #[command(flatten)]
        common: Common,
    },
}

#[derive(clap::Args, Debug)]
pub struct Common {
    /// Path to the source git repository (never modified)
    #[arg(short, long)]
    pub repo: PathBuf,

    /// Branch to walk
    #[arg(short, long, default_value = "master")]
    pub branch: String,

    /// JSON configuration file (default: `<repo>-config.json`)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl Common {
    pub fn config_path(&self) -> PathBuf {
        match &self.config {
            Some(path) => path.clone(),
            None => default_sibling(&self.repo, "-config.json"),
        }
    }

    pub fn dest_path(&self, dest: &Option<PathBuf>) -> PathBuf {
        match dest {
            Some(path) => path.clone(),
            None => default_sibling(&self.repo, "-lfs"),
        }
    }
}

/// `<repo>` with a suffix appended to its final component.
fn default_sibling(repo: &PathBuf, suffix: &str) -> PathBuf {
    let mut name = repo
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "repo".to_string());
    name.push_str(suffix);
    repo.with_file_name(name)
}
