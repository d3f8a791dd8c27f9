//! Scanning configuration for directory traversal.
//!
//! This module defines the options that control how configured roots are
//! walked and how much work a single indexing pass is allowed to do.

use clap::ValueEnum;
use serde::Deserialize;

/// Files larger than this are line-estimated from their size instead of read.
pub const DEFAULT_LARGE_FILE_THRESHOLD: u64 = 10 * 1000 * 1000;

/// What `reload_index` does with projects that were already indexed.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReloadPolicy {
    /// Re-use a stored project when no file or directory under it has a
    /// newer mtime than the stored record. The check stats every entry but
    /// reads no file contents.
    #[default]
    Fresh,

    /// Re-index every discovered project, like a full re-index but merged.
    Full,
}

/// Configuration for directory scanning behavior.
///
/// This struct contains options that control how directories are traversed
/// and what information is collected during the scanning process.
#[derive(Clone, Debug)]
pub struct ScanOptions {
    /// Number of worker threads used for per-root scans (0 = all cores)
    pub threads: usize,

    /// Maximum directory depth to descend while looking for projects (None = unlimited)
    pub max_depth: Option<usize>,

    /// Extra directory names pruned in addition to the built-in ignore list
    pub ignore: Vec<String>,

    /// Size ceiling in bytes above which line counts are estimated
    pub large_file_threshold: u64,

    /// Policy applied by `reload_index`
    pub reload: ReloadPolicy,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            threads: 0,
            max_depth: None,
            ignore: Vec::new(),
            large_file_threshold: DEFAULT_LARGE_FILE_THRESHOLD,
            reload: ReloadPolicy::default(),
        }
    }
}
