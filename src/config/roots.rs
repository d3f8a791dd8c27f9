//! The set of root directories registered for scanning.
//!
//! Roots are kept in registration order and canonicalized on insertion, so
//! two spellings of the same directory can never both be registered.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{IndexError, Result};

/// File name of the persisted root list inside the state directory.
pub const ROOTS_FILE: &str = "roots.json";

/// Ordered, duplicate-free list of directories searched for projects.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Directories searched for projects, in registration order
    pub project_dirs: Vec<PathBuf>,
}

impl Config {
    /// Register a new root directory.
    ///
    /// # Errors
    ///
    /// - [`IndexError::InvalidPath`] if `path` does not exist or is not a directory
    /// - [`IndexError::Duplicate`] if the directory is already registered
    pub fn add_directory(&mut self, path: &Path) -> Result<PathBuf> {
        let canonical = path
            .canonicalize()
            .map_err(|_| IndexError::InvalidPath(path.to_path_buf()))?;

        if !canonical.is_dir() {
            return Err(IndexError::InvalidPath(path.to_path_buf()));
        }

        if self.contains(&canonical) {
            return Err(IndexError::Duplicate(canonical));
        }

        info!(root = %canonical.display(), "registered root directory");
        self.project_dirs.push(canonical.clone());
        Ok(canonical)
    }

    /// Unregister a root directory. Returns the removed entry, if any.
    ///
    /// The path is matched both as given and canonicalized, so a root whose
    /// directory has since been deleted can still be removed.
    pub fn remove_directory(&mut self, path: &Path) -> Option<PathBuf> {
        let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let position = self
            .project_dirs
            .iter()
            .position(|dir| dir == path || *dir == canonical)?;

        let removed = self.project_dirs.remove(position);
        info!(root = %removed.display(), "unregistered root directory");
        Some(removed)
    }

    /// Whether `path` is one of the registered roots.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.project_dirs.iter().any(|dir| dir == path)
    }

    /// The registered root that contains `path`, if any.
    #[must_use]
    pub fn root_of(&self, path: &Path) -> Option<&Path> {
        self.project_dirs
            .iter()
            .map(PathBuf::as_path)
            .find(|root| path.starts_with(root))
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.project_dirs.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.project_dirs.is_empty()
    }

    /// Load the root list from `state_dir`, or an empty list if none was saved.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Persist`] if the file exists but cannot be read or parsed.
    pub fn load(state_dir: &Path) -> Result<Self> {
        let path = state_dir.join(ROOTS_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).map_err(|e| IndexError::persist(&path, e))?;
        serde_json::from_str(&content).map_err(|e| IndexError::persist(&path, e))
    }

    /// Write the root list to `state_dir` as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Persist`] if the directory cannot be created or written.
    pub fn save(&self, state_dir: &Path) -> Result<()> {
        let path = state_dir.join(ROOTS_FILE);
        fs::create_dir_all(state_dir).map_err(|e| IndexError::persist(state_dir, e))?;

        let json = serde_json::to_string_pretty(self).map_err(|e| IndexError::persist(&path, e))?;
        fs::write(&path, json).map_err(|e| IndexError::persist(&path, e))
    }
}
