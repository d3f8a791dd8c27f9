//! Lazy filesystem traversal with ignore rules.
//!
//! [`FileWalker::walk`] re-reads the filesystem on every call and yields one
//! [`WalkEntry`] per file or directory. Ignored directories are pruned before
//! descent, so a `node_modules/` with a hundred thousand files costs a single
//! `readdir` of its parent. Symbolic links are never followed or yielded.

use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
    time::SystemTime,
};

use walkdir::{DirEntry, WalkDir};

use crate::{
    config::ScanOptions,
    error::{IndexError, Warnings},
};

/// Directory names that are never descended into.
pub const IGNORED_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    "target",
    "venv",
    "build",
    "dist",
    ".venv",
    "__pycache__",
    ".dart_tool",
    "vendor",
];

/// One filesystem entry produced by a walk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WalkEntry {
    pub path: PathBuf,
    pub is_dir: bool,
    /// File size in bytes (0 for directories)
    pub size: u64,
    pub modified: Option<SystemTime>,
    /// Depth below the walk root (the root itself is 0)
    pub depth: usize,
}

/// Recursive directory walker shared by discovery and language counting.
#[derive(Clone, Debug, Default)]
pub struct FileWalker {
    extra_ignore: Vec<String>,
    max_depth: Option<usize>,
}

impl FileWalker {
    #[must_use]
    pub fn new(options: &ScanOptions) -> Self {
        Self {
            extra_ignore: options.ignore.clone(),
            max_depth: options.max_depth,
        }
    }

    /// Limit how deep below the root the walk descends.
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub const fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Walk `root` lazily, yielding entries in a stable (name-sorted) order.
    ///
    /// Unreadable entries are recorded in `warnings` and skipped; they never
    /// end the walk early.
    pub fn walk<'a>(
        &'a self,
        root: &Path,
        warnings: &Warnings,
    ) -> impl Iterator<Item = WalkEntry> + use<'a> {
        let warnings = warnings.clone();

        let mut walker = WalkDir::new(root).follow_links(false).sort_by_file_name();
        if let Some(depth) = self.max_depth {
            walker = walker.max_depth(depth);
        }

        walker
            .into_iter()
            .filter_entry(move |entry| !self.should_prune(entry))
            .filter_map(move |result| match result {
                Ok(entry) if entry.path_is_symlink() => None,
                Ok(entry) => Self::to_walk_entry(&entry, &warnings),
                Err(err) => {
                    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                    let io_error = err
                        .into_io_error()
                        .unwrap_or_else(|| std::io::Error::other("filesystem loop"));
                    warnings.push(IndexError::access(path, io_error));
                    None
                }
            })
    }

    /// Whether a directory with this name is pruned by the ignore rules.
    #[must_use]
    pub fn is_ignored(&self, name: &OsStr) -> bool {
        name.to_str().is_some_and(|name| {
            IGNORED_DIRS.contains(&name) || self.extra_ignore.iter().any(|extra| extra == name)
        })
    }

    fn should_prune(&self, entry: &DirEntry) -> bool {
        entry.depth() > 0 && entry.file_type().is_dir() && self.is_ignored(entry.file_name())
    }

    fn to_walk_entry(entry: &DirEntry, warnings: &Warnings) -> Option<WalkEntry> {
        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(err) => {
                let io_error = err
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("metadata unavailable"));
                warnings.push(IndexError::access(entry.path(), io_error));
                return None;
            }
        };

        let is_dir = metadata.is_dir();
        Some(WalkEntry {
            path: entry.path().to_path_buf(),
            is_dir,
            size: if is_dir { 0 } else { metadata.len() },
            modified: metadata.modified().ok(),
            depth: entry.depth(),
        })
    }
}
