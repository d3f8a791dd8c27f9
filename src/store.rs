//! The in-memory index and its persistence.
//!
//! [`IndexStore`] is the single owner of the project map, the registered
//! roots and the indexing flag. The project map lives behind an `Arc` that is
//! swapped (or copied on write) under a `RwLock`, so readers always see either
//! the old or the new set of projects and never a half-applied update.

use std::{
    collections::{BTreeMap, HashSet},
    fs,
    path::{Path, PathBuf},
    sync::{
        Arc, PoisonError, RwLock,
        atomic::{AtomicBool, Ordering},
    },
    time::SystemTime,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    config::Config,
    error::{IndexError, Result},
    project::Project,
};

/// File name of the persisted project index inside the state directory.
pub const INDEX_FILE: &str = "index.json";

/// Project records keyed by their root path.
pub type ProjectMap = BTreeMap<PathBuf, Project>;

#[derive(Serialize, Deserialize, Default)]
struct PersistedIndex {
    last_indexed: Option<SystemTime>,
    projects: Vec<Project>,
}

/// Thread-safe owner of the index snapshot and configuration.
#[derive(Debug, Default)]
pub struct IndexStore {
    projects: RwLock<Arc<ProjectMap>>,
    config: RwLock<Config>,
    last_indexed: RwLock<Option<SystemTime>>,
    indexing: Arc<AtomicBool>,
}

/// Clears the indexing flag when dropped.
///
/// Obtained from [`IndexStore::try_begin_indexing`]; holding one is what it
/// means for an indexing pass to be running.
#[derive(Debug)]
#[must_use = "the indexing flag is cleared as soon as the guard is dropped"]
pub struct IndexingGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for IndexingGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl IndexStore {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config: RwLock::new(config),
            ..Self::default()
        }
    }

    /// Load the store from `state_dir`.
    ///
    /// Missing files yield an empty index. Corrupt files are logged and
    /// treated as missing so a bad state file never prevents start-up.
    #[must_use]
    pub fn open(state_dir: &Path) -> Self {
        let config = Config::load(state_dir).unwrap_or_else(|err| {
            warn!("{err}; starting with no registered roots");
            Config::default()
        });

        let persisted = Self::load_index(state_dir).unwrap_or_else(|err| {
            warn!("{err}; starting with an empty index");
            PersistedIndex::default()
        });

        debug!(
            state_dir = %state_dir.display(),
            roots = config.len(),
            projects = persisted.projects.len(),
            "opened index store"
        );

        let store = Self::new(config);
        store.install(persisted.projects);
        *write(&store.last_indexed) = persisted.last_indexed;
        store
    }

    fn load_index(state_dir: &Path) -> Result<PersistedIndex> {
        let path = state_dir.join(INDEX_FILE);
        if !path.exists() {
            return Ok(PersistedIndex::default());
        }

        let content = fs::read_to_string(&path).map_err(|e| IndexError::persist(&path, e))?;
        serde_json::from_str(&content).map_err(|e| IndexError::persist(&path, e))
    }

    /// Write the project index and root list to `state_dir`.
    ///
    /// The index is written to a temporary file and renamed into place.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Persist`] if either file cannot be written.
    pub fn save(&self, state_dir: &Path) -> Result<()> {
        fs::create_dir_all(state_dir).map_err(|e| IndexError::persist(state_dir, e))?;

        let persisted = PersistedIndex {
            last_indexed: self.last_indexed(),
            projects: self.snapshot().values().cloned().collect(),
        };

        let path = state_dir.join(INDEX_FILE);
        let staging = path.with_extension("json.tmp");
        let json =
            serde_json::to_string_pretty(&persisted).map_err(|e| IndexError::persist(&path, e))?;

        fs::write(&staging, json).map_err(|e| IndexError::persist(&staging, e))?;
        fs::rename(&staging, &path).map_err(|e| IndexError::persist(&path, e))?;

        self.config().save(state_dir)
    }

    /// The current project map. Cheap; later updates do not affect it.
    #[must_use]
    pub fn snapshot(&self) -> Arc<ProjectMap> {
        Arc::clone(&*read(&self.projects))
    }

    /// All projects, newest first, ties broken by path.
    #[must_use]
    pub fn projects(&self) -> Vec<Project> {
        let mut projects: Vec<Project> = self.snapshot().values().cloned().collect();
        projects.sort_by(|a, b| {
            b.last_modified
                .cmp(&a.last_modified)
                .then_with(|| a.path.cmp(&b.path))
        });
        projects
    }

    #[must_use]
    pub fn get(&self, path: &Path) -> Option<Project> {
        self.snapshot().get(path).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// The root of the indexed project containing `path`, if any.
    #[must_use]
    pub fn project_root_of(&self, path: &Path) -> Option<PathBuf> {
        self.snapshot()
            .keys()
            .filter(|root| path.starts_with(root))
            .max_by_key(|root| root.components().count())
            .cloned()
    }

    /// Replace every project at once and stamp the index as freshly built.
    pub fn replace_all(&self, projects: Vec<Project>) {
        self.install(projects);
        self.mark_indexed();
    }

    fn install(&self, projects: Vec<Project>) {
        let map: ProjectMap = projects
            .into_iter()
            .map(|project| (project.path.clone(), project))
            .collect();
        *write(&self.projects) = Arc::new(map);
    }

    /// Insert or replace a single project.
    pub fn upsert(&self, project: Project) {
        let mut guard = write(&self.projects);
        Arc::make_mut(&mut *guard).insert(project.path.clone(), project);
    }

    /// Remove the project rooted at `path`.
    pub fn remove(&self, path: &Path) -> Option<Project> {
        let mut guard = write(&self.projects);
        if !guard.contains_key(path) {
            return None;
        }
        Arc::make_mut(&mut *guard).remove(path)
    }

    /// Drop every project under `root` whose path is not in `keep`.
    ///
    /// Returns the removed paths.
    pub fn retain_under(&self, root: &Path, keep: &HashSet<PathBuf>) -> Vec<PathBuf> {
        let mut guard = write(&self.projects);
        let stale: Vec<PathBuf> = guard
            .keys()
            .filter(|path| path.starts_with(root) && !keep.contains(*path))
            .cloned()
            .collect();

        if !stale.is_empty() {
            let map = Arc::make_mut(&mut *guard);
            for path in &stale {
                map.remove(path);
            }
        }

        stale
    }

    /// Replace everything under `scope` with `projects` in a single update.
    ///
    /// Projects outside `scope` are untouched. Returns the paths that were
    /// dropped because they were not in `projects`.
    pub fn merge_under(&self, scope: &Path, projects: Vec<Project>) -> Vec<PathBuf> {
        let keep: HashSet<PathBuf> = projects.iter().map(|p| p.path.clone()).collect();

        let mut guard = write(&self.projects);
        let map = Arc::make_mut(&mut *guard);

        let stale: Vec<PathBuf> = map
            .keys()
            .filter(|path| path.starts_with(scope) && !keep.contains(*path))
            .cloned()
            .collect();
        for path in &stale {
            map.remove(path);
        }
        for project in projects {
            map.insert(project.path.clone(), project);
        }

        stale
    }

    /// When the last indexing pass finished.
    #[must_use]
    pub fn last_indexed(&self) -> Option<SystemTime> {
        *read(&self.last_indexed)
    }

    pub fn mark_indexed(&self) {
        *write(&self.last_indexed) = Some(SystemTime::now());
    }

    #[must_use]
    pub fn is_indexing(&self) -> bool {
        self.indexing.load(Ordering::Acquire)
    }

    /// Force the indexing flag. Prefer [`Self::try_begin_indexing`].
    pub fn set_indexing(&self, indexing: bool) {
        self.indexing.store(indexing, Ordering::Release);
    }

    /// Claim the indexing flag for the lifetime of the returned guard.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Busy`] if another pass already holds it.
    pub fn try_begin_indexing(&self) -> Result<IndexingGuard> {
        self.indexing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| IndexError::Busy)?;

        Ok(IndexingGuard {
            flag: Arc::clone(&self.indexing),
        })
    }

    #[must_use]
    pub fn config(&self) -> Config {
        read(&self.config).clone()
    }

    /// Register a root directory.
    ///
    /// # Errors
    ///
    /// See [`Config::add_directory`].
    pub fn add_directory(&self, path: &Path) -> Result<PathBuf> {
        write(&self.config).add_directory(path)
    }

    /// Unregister a root directory. Its projects stay until the caller prunes them.
    pub fn remove_directory(&self, path: &Path) -> Option<PathBuf> {
        write(&self.config).remove_directory(path)
    }
}

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
