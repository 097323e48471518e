// src/main.rs

use std::time::Instant;

use chrono::TimeZone;
use clap::Parser;

use git_lfs_migrate::cli::{Args, Command};
use git_lfs_migrate::config::Config;
use git_lfs_migrate::error::Result;
use git_lfs_migrate::{analyze, replay, report};

fn main() {
    let args = Args::parse();

    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    let start_time = Instant::now();
    if let Err(e) = run(&args) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
    println!("Total time: {:.2?}", start_time.elapsed());
}

fn run(args: &Args) -> Result<()> {
    match &args.command {
        Command::Analyze { common } => {
            let config_path = common.config_path();
            println!("Analyzing repo: {}", common.repo.display());
            let config = analyze::run(&common.repo, &common.branch, &config_path)?;
            println!("Wrote config: {}", config_path.display());
            println!(
                "Found {} identities, {} warnings, {} extra LFS candidates.",
                config.authors.len(),
                config.warnings.len(),
                config.extra_lfs_patterns.len()
            );
            for warning in &config.warnings {
                println!("  WARN: {warning}");
            }
        }
        Command::Migrate { common, dest } => {
            let config = Config::load_or_default(&common.config_path())?;
            let dest_path = common.dest_path(dest);
            let outcome = replay::run(&common.repo, &dest_path, &common.branch, &config)?;
            println!(
                "Replayed {} commits and {} tags into {}.",
                outcome.commits.len(),
                outcome.tags_replayed,
                dest_path.display()
            );
            for warning in &outcome.warnings {
                println!("  WARN: {warning}");
            }
            println!("Your LFS repo is ready: {}", dest_path.display());
        }
        Command::Show { common } => {
            let config = Config::load_or_default(&common.config_path())?;
            if config.history_delete_files.is_empty() {
                println!("No history_delete_files configured; nothing to show.");
                return Ok(());
            }
            let (reports, missing) = report::deleted_files(&common.repo, &common.branch, &config)?;
            println!("{} file(s) scheduled for deletion:", reports.len());
            for r in &reports {
                let date = chrono::Utc
                    .timestamp_opt(r.first_date.seconds, 0)
                    .single()
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "????-??-??".to_string());
                println!(
                    "  {:<40} first seen in commit {:>4} ({:.8} {} {}), {} revision(s), ~{} bytes freed",
                    r.path,
                    r.first_commit,
                    r.first_id.to_string(),
                    date,
                    r.first_author.name,
                    r.revisions,
                    r.approx_bytes
                );
            }
            for path in &missing {
                println!("  WARN: `{path}` never appears in the walked history");
            }
        }
    }
    Ok(())
}
