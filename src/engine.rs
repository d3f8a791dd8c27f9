//! The public face of the indexing engine.
//!
//! [`Engine`] ties the [`IndexStore`], the [`IndexScheduler`] and the state
//! directory together. Every mutating operation persists its result so a
//! restarted engine picks up where the last one stopped.

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
    thread::{self, JoinHandle},
    time::SystemTime,
};

use tracing::{debug, info, warn};

use crate::{
    config::{Config, ScanOptions},
    error::{IndexError, Result},
    project::Project,
    scheduler::{IndexScheduler, ScanReport},
    search::{SearchHit, SearchIndex},
    store::{IndexStore, ProjectMap},
};

/// The search model and the snapshot it was built from.
type SearchCache = Option<(Arc<ProjectMap>, Arc<SearchIndex>)>;

/// Long-lived handle to an index backed by a state directory.
#[derive(Debug)]
pub struct Engine {
    state_dir: PathBuf,
    store: Arc<IndexStore>,
    scheduler: Arc<IndexScheduler>,
    search: Mutex<SearchCache>,
}

impl Engine {
    /// Open (or create) the engine state stored in `state_dir`.
    ///
    /// Nothing is written until the first mutating operation.
    #[must_use]
    pub fn open(state_dir: impl Into<PathBuf>, options: &ScanOptions) -> Self {
        let state_dir = state_dir.into();
        let store = Arc::new(IndexStore::open(&state_dir));
        let scheduler = Arc::new(IndexScheduler::new(Arc::clone(&store), options));

        Self {
            state_dir,
            store,
            scheduler,
            search: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    /// Rebuild the index from every configured root, blocking until done.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Busy`] if a pass is already running.
    pub fn re_index(&self) -> Result<ScanReport> {
        let mut report = self.scheduler.re_index()?;
        persist_into(&self.store, &self.state_dir, &mut report);
        Ok(report)
    }

    /// Start a full re-index on a background thread.
    ///
    /// The indexing flag is claimed before this returns, so a second call
    /// (or any other pass) fails with [`IndexError::Busy`] right away.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Busy`] if a pass is already running.
    pub fn spawn_re_index(&self) -> Result<JoinHandle<Result<ScanReport>>> {
        let guard = self.store.try_begin_indexing()?;
        let scheduler = Arc::clone(&self.scheduler);
        let store = Arc::clone(&self.store);
        let state_dir = self.state_dir.clone();

        Ok(thread::spawn(move || {
            let mut report = scheduler.re_index_claimed(guard)?;
            persist_into(&store, &state_dir, &mut report);
            Ok(report)
        }))
    }

    /// Re-scan `path` (or every root) and merge the result into the index.
    ///
    /// # Errors
    ///
    /// - [`IndexError::Busy`] if a pass is already running
    /// - [`IndexError::NotFound`] if `path` is outside every configured root
    pub fn reload_index(&self, path: Option<&Path>) -> Result<ScanReport> {
        let mut report = self.scheduler.reload_index(path)?;
        persist_into(&self.store, &self.state_dir, &mut report);
        Ok(report)
    }

    /// Every indexed project, newest first.
    #[must_use]
    pub fn get_projects(&self) -> Vec<Project> {
        self.store.projects()
    }

    #[must_use]
    pub fn get_project(&self, path: &Path) -> Option<Project> {
        let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        self.store.get(&path)
    }

    /// Rank indexed projects against `query`, best match first.
    ///
    /// The model is rebuilt lazily whenever the index changed since the last
    /// search.
    #[must_use]
    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchHit> {
        self.search_index().search(query, limit)
    }

    fn search_index(&self) -> Arc<SearchIndex> {
        let snapshot = self.store.snapshot();
        let mut cache = self.search.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some((built_from, index)) = cache.as_ref()
            && Arc::ptr_eq(built_from, &snapshot)
        {
            return Arc::clone(index);
        }

        let projects: Vec<Project> = snapshot.values().cloned().collect();
        let index = Arc::new(SearchIndex::build(&projects));
        debug!(projects = index.len(), "rebuilt search index");
        *cache = Some((snapshot, Arc::clone(&index)));
        index
    }

    #[must_use]
    pub fn get_config(&self) -> Config {
        self.store.config()
    }

    #[must_use]
    pub fn is_indexing(&self) -> bool {
        self.store.is_indexing()
    }

    #[must_use]
    pub fn last_indexed(&self) -> Option<SystemTime> {
        self.store.last_indexed()
    }

    /// Register a root directory and persist the root list.
    ///
    /// The new root is not scanned until the next re-index or reload.
    ///
    /// # Errors
    ///
    /// - [`IndexError::InvalidPath`] if `path` is missing or not a directory
    /// - [`IndexError::Duplicate`] if it is already registered
    /// - [`IndexError::Persist`] if the root list cannot be saved
    pub fn add_config_directory(&self, path: &Path) -> Result<PathBuf> {
        let root = self.store.add_directory(path)?;
        self.store.config().save(&self.state_dir)?;
        Ok(root)
    }

    /// Unregister a root directory and drop the projects that only it covered.
    ///
    /// Returns the removed root, or `None` if it was not registered. The
    /// indexing flag is held for the duration, so a running pass cannot
    /// write the root's projects back afterwards.
    ///
    /// # Errors
    ///
    /// - [`IndexError::Busy`] if an indexing pass is running
    /// - [`IndexError::Persist`] if the updated state cannot be saved
    pub fn remove_config_directory(&self, path: &Path) -> Result<Option<PathBuf>> {
        let _guard = self.store.try_begin_indexing()?;

        let Some(root) = self.store.remove_directory(path) else {
            return Ok(None);
        };

        let remaining = self.store.config();
        let keep: HashSet<PathBuf> = self
            .store
            .snapshot()
            .keys()
            .filter(|project| project.starts_with(&root) && remaining.root_of(project).is_some())
            .cloned()
            .collect();
        let removed = self.store.retain_under(&root, &keep);

        info!(
            root = %root.display(),
            projects = removed.len(),
            "removed root and its projects"
        );

        self.store.save(&self.state_dir)?;
        Ok(Some(root))
    }

    /// Read a file that belongs to an indexed project.
    ///
    /// The path is canonicalized first, so `..` components and symbolic
    /// links cannot reach outside the project. Invalid UTF-8 is replaced.
    ///
    /// # Errors
    ///
    /// - [`IndexError::NotFound`] if the file does not exist or lies outside
    ///   every indexed project
    /// - [`IndexError::Access`] if it exists but cannot be read
    pub fn get_file_contents(&self, path: &Path) -> Result<String> {
        let canonical = path
            .canonicalize()
            .map_err(|_| IndexError::NotFound(path.to_path_buf()))?;

        if self.store.project_root_of(&canonical).is_none() {
            return Err(IndexError::NotFound(path.to_path_buf()));
        }

        let bytes = fs::read(&canonical).map_err(|e| IndexError::access(&canonical, e))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Save the store after a pass; a failure becomes a report warning.
fn persist_into(store: &IndexStore, state_dir: &Path, report: &mut ScanReport) {
    if let Err(err) = store.save(state_dir) {
        warn!("{err}");
        report.warnings.push(err.to_string());
    }
}
