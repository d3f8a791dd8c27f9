//! Command-line interface definition and argument parsing.
//!
//! This module defines all command-line arguments, options, and their validation
//! using the [clap](https://docs.rs/clap/) library.
//!
//! Helper methods accept a [`FileConfig`] reference so that config-file values
//! act as defaults that CLI arguments can override (layered config).

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use project_index::config::file::{FileConfig, expand_tilde};
use project_index::config::{
    FilterOptions, ProjectFilter, ReloadPolicy, ScanOptions, SortCriteria, SortOptions,
};
use project_index::utils::parse_size;

/// Scanning-related command line arguments.
#[derive(Args)]
struct ScanningArgs {
    /// Number of threads for per-root scans (0 = all cores)
    #[arg(short = 't', long, global = true)]
    threads: Option<usize>,

    /// Maximum depth below a root to look for projects
    #[arg(long, global = true)]
    max_depth: Option<usize>,

    /// Extra directory names to skip (repeatable)
    #[arg(long, action = ArgAction::Append, global = true)]
    ignore: Vec<String>,

    /// Estimate line counts for files larger than this (e.g. "10MB", "512KiB")
    #[arg(long, global = true)]
    large_file_threshold: Option<String>,
}

/// Arguments of the `list` subcommand.
#[derive(Args)]
pub struct ListArgs {
    /// Only list projects of this type
    #[arg(short = 'p', long)]
    project_type: Option<ProjectFilter>,

    /// Sort criterion (default: index order, newest first)
    #[arg(long, value_enum)]
    sort: Option<SortCriteria>,

    /// Reverse the sort order
    #[arg(long)]
    reverse: bool,

    /// Only list projects modified within the last N days
    #[arg(short = 'd', long)]
    days: Option<u32>,
}

/// Top-level subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Rebuild the whole index from every registered root
    Index,

    /// Re-scan one root or subtree (or every root) and merge the result
    Reload {
        /// A registered root, or a directory below one
        path: Option<PathBuf>,

        /// Whether unchanged projects are re-used when reloading every root
        #[arg(long, value_enum)]
        policy: Option<ReloadPolicy>,
    },

    /// List indexed projects
    List(ListArgs),

    /// Rank indexed projects against free text (name, description, type, docs)
    Search {
        /// Words to look for
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Maximum number of results
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,
    },

    /// Print a file that belongs to an indexed project
    Show {
        /// Path of the file to print
        file: PathBuf,
    },

    /// Manage configuration and registered roots
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Subcommands of `config`.
#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration and registered roots
    Show,

    /// Write a default config file if none exists
    Init,

    /// Print the config file path
    Path,

    /// Register a root directory
    Add {
        /// Directory to search for projects
        dir: PathBuf,
    },

    /// Unregister a root directory and drop its projects
    Remove {
        /// Previously registered directory
        dir: PathBuf,
    },
}

#[derive(Parser)]
#[command(name = "project-index")]
#[command(
    about = "Discover software projects under registered directories and index their type, languages and git remotes"
)]
#[command(version)]
#[command(author)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output results as a single JSON object instead of human-readable text
    #[arg(long, global = true)]
    json: bool,

    /// Directory holding the persisted index (overrides `state_dir` in config)
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(flatten)]
    scanning: ScanningArgs,
}

impl Cli {
    #[must_use]
    pub const fn json(&self) -> bool {
        self.json
    }

    #[must_use]
    pub const fn verbosity(&self) -> u8 {
        self.verbose
    }

    /// Resolve the state directory: CLI flag, then config file, then platform default.
    #[must_use]
    pub fn state_dir(&self, config: &FileConfig) -> PathBuf {
        self.state_dir
            .as_deref()
            .map_or_else(|| config.state_dir(), expand_tilde)
    }

    /// Merge scanning flags over the `[scanning]` table of the config file.
    ///
    /// # Errors
    ///
    /// Returns an error if a large-file threshold is not a valid size.
    pub fn scan_options(&self, config: &FileConfig) -> Result<ScanOptions> {
        let mut options = config.scan_options()?;

        if let Some(threads) = self.scanning.threads {
            options.threads = threads;
        }
        if self.scanning.max_depth.is_some() {
            options.max_depth = self.scanning.max_depth;
        }
        options.ignore.extend(self.scanning.ignore.iter().cloned());
        if let Some(size) = &self.scanning.large_file_threshold {
            options.large_file_threshold = parse_size(size)
                .with_context(|| format!("Invalid --large-file-threshold \"{size}\""))?;
        }
        if let Commands::Reload {
            policy: Some(policy),
            ..
        } = &self.command
        {
            options.reload = *policy;
        }

        Ok(options)
    }
}

impl ListArgs {
    #[must_use]
    pub fn filter_options(&self, config: &FileConfig) -> FilterOptions {
        FilterOptions {
            project_type: self
                .project_type
                .or_else(|| {
                    config
                        .listing
                        .project_type
                        .as_ref()
                        .and_then(|s| ProjectFilter::from_str(s, true).ok())
                })
                .unwrap_or_default(),
            modified_within_days: self.days.unwrap_or(0),
        }
    }

    #[must_use]
    pub fn sort_options(&self, config: &FileConfig) -> SortOptions {
        SortOptions {
            criteria: self.sort.or_else(|| {
                config
                    .listing
                    .sort
                    .as_ref()
                    .and_then(|s| SortCriteria::from_str(s, true).ok())
            }),
            reverse: self.reverse || config.listing.reverse.unwrap_or(false),
        }
    }
}
