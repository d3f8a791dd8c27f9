//! Indexing passes over the configured roots.
//!
//! The scheduler is either idle or running exactly one pass; the indexing
//! flag held by the [`IndexStore`] is the state. A pass scans each root as an
//! independent unit on a bounded rayon pool, so a failing root only shows up
//! in the [`ScanReport`] and never aborts the others.

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant},
};

use rayon::{ThreadPool, ThreadPoolBuilder, prelude::*};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    config::{ReloadPolicy, ScanOptions},
    error::{IndexError, Result, Warnings},
    indexer::ProjectIndexer,
    project::Project,
    store::{IndexStore, IndexingGuard, ProjectMap},
};

/// Outcome of scanning one root (or subtree).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RootReport {
    pub root: PathBuf,
    /// Projects now indexed under this root
    pub projects: usize,
    /// Of those, how many were re-used unchanged from the previous index
    pub reused: usize,
    /// Previously indexed projects that were dropped
    pub removed: usize,
    /// Why the root could not be scanned, if it could not
    pub error: Option<String>,
}

/// Summary of an indexing pass.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ScanReport {
    pub roots: Vec<RootReport>,
    /// Non-fatal problems (unreadable files, broken manifests, ...)
    pub warnings: Vec<String>,
    pub elapsed: Duration,
}

impl ScanReport {
    #[must_use]
    pub fn total_projects(&self) -> usize {
        self.roots.iter().map(|root| root.projects).sum()
    }

    #[must_use]
    pub fn total_removed(&self) -> usize {
        self.roots.iter().map(|root| root.removed).sum()
    }

    /// Roots that could not be scanned at all.
    pub fn failed_roots(&self) -> impl Iterator<Item = &RootReport> {
        self.roots.iter().filter(|root| root.error.is_some())
    }

    /// Whether every root was scanned without a single warning.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty() && self.failed_roots().next().is_none()
    }
}

/// Result of scanning one scope before it is written to the store.
struct ScopeScan {
    report: RootReport,
    projects: Vec<Project>,
}

/// Runs re-index and reload passes against an [`IndexStore`].
pub struct IndexScheduler {
    store: Arc<IndexStore>,
    indexer: ProjectIndexer,
    reload_policy: ReloadPolicy,
    /// `None` if a dedicated pool could not be built; rayon's global pool is used instead
    pool: Option<ThreadPool>,
}

impl std::fmt::Debug for IndexScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexScheduler")
            .field("indexer", &self.indexer)
            .field("reload_policy", &self.reload_policy)
            .field("threads", &self.pool.as_ref().map(ThreadPool::current_num_threads))
            .finish_non_exhaustive()
    }
}

impl IndexScheduler {
    #[must_use]
    pub fn new(store: Arc<IndexStore>, options: &ScanOptions) -> Self {
        let pool = ThreadPoolBuilder::new()
            .num_threads(options.threads)
            .thread_name(|i| format!("project-index-{i}"))
            .build()
            .map_err(|err| warn!("falling back to the global thread pool: {err}"))
            .ok();

        Self {
            store,
            indexer: ProjectIndexer::new(options),
            reload_policy: options.reload,
            pool,
        }
    }

    #[must_use]
    pub const fn store(&self) -> &Arc<IndexStore> {
        &self.store
    }

    /// Rebuild the whole index from every configured root.
    ///
    /// The new project set replaces the old one in a single swap. Projects
    /// under a root that fails to scan are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Busy`] if a pass is already running.
    pub fn re_index(&self) -> Result<ScanReport> {
        let guard = self.store.try_begin_indexing()?;
        self.re_index_claimed(guard)
    }

    /// [`Self::re_index`] for a caller that has already claimed the indexing flag.
    pub(crate) fn re_index_claimed(&self, _guard: IndexingGuard) -> Result<ScanReport> {
        let started = Instant::now();
        let roots = self.store.config().project_dirs;
        let previous = self.store.snapshot();
        let warnings = Warnings::new();

        info!(roots = roots.len(), "starting full re-index");

        let scans = self.scan_scopes(&roots, ReloadPolicy::Full, &previous, &warnings);

        let mut reports = Vec::with_capacity(scans.len());
        let mut projects = Vec::new();
        for scan in scans {
            reports.push(scan.report);
            projects.extend(scan.projects);
        }

        self.store.replace_all(projects);

        let report = ScanReport {
            roots: reports,
            warnings: warnings.take(),
            elapsed: started.elapsed(),
        };
        info!(
            projects = self.store.len(),
            warnings = report.warnings.len(),
            elapsed = ?report.elapsed,
            "re-index finished"
        );
        Ok(report)
    }

    /// Re-scan one root, a subtree of one, or (with `None`) every root, and
    /// merge the results into the existing index.
    ///
    /// Entries outside the scanned scope are left untouched. A scope whose
    /// directory no longer exists has its projects removed. Without a path
    /// the configured [`ReloadPolicy`] decides whether unchanged projects are
    /// re-used; an explicit path is always re-indexed in full.
    ///
    /// # Errors
    ///
    /// - [`IndexError::Busy`] if a pass is already running
    /// - [`IndexError::NotFound`] if `path` is not under any configured root
    pub fn reload_index(&self, path: Option<&Path>) -> Result<ScanReport> {
        let _guard = self.store.try_begin_indexing()?;
        let started = Instant::now();
        let previous = self.store.snapshot();
        let warnings = Warnings::new();

        let (scopes, policy) = match path {
            None => (self.store.config().project_dirs, self.reload_policy),
            Some(path) => (vec![self.resolve_scope(path, &previous)?], ReloadPolicy::Full),
        };

        info!(scopes = scopes.len(), ?policy, "starting reload");

        let (present, missing): (Vec<PathBuf>, Vec<PathBuf>) =
            scopes.into_iter().partition(|scope| scope.exists());

        let mut reports: Vec<RootReport> = missing
            .into_iter()
            .map(|scope| {
                let removed = self.store.retain_under(&scope, &HashSet::new());
                debug!(scope = %scope.display(), removed = removed.len(), "scope no longer exists");
                RootReport {
                    error: Some(IndexError::NotFound(scope.clone()).to_string()),
                    root: scope,
                    removed: removed.len(),
                    ..RootReport::default()
                }
            })
            .collect();

        for scan in self.scan_scopes(&present, policy, &previous, &warnings) {
            let report = scan.report;
            if report.error.is_none() {
                self.store.merge_under(&report.root, scan.projects);
            }
            reports.push(report);
        }

        self.store.mark_indexed();

        let report = ScanReport {
            roots: reports,
            warnings: warnings.take(),
            elapsed: started.elapsed(),
        };
        info!(
            projects = report.total_projects(),
            removed = report.total_removed(),
            elapsed = ?report.elapsed,
            "reload finished"
        );
        Ok(report)
    }

    /// Map a reload path onto the scope that has to be re-scanned.
    ///
    /// A path inside an indexed project widens to that project's root.
    fn resolve_scope(&self, path: &Path, previous: &ProjectMap) -> Result<PathBuf> {
        let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        if self.store.config().root_of(&path).is_none() {
            return Err(IndexError::NotFound(path));
        }

        let enclosing = previous
            .keys()
            .filter(|root| path.starts_with(root))
            .max_by_key(|root| root.components().count());

        Ok(enclosing.cloned().unwrap_or(path))
    }

    fn scan_scopes(
        &self,
        scopes: &[PathBuf],
        policy: ReloadPolicy,
        previous: &ProjectMap,
        warnings: &Warnings,
    ) -> Vec<ScopeScan> {
        let scan_all = || -> Vec<ScopeScan> {
            scopes
                .par_iter()
                .map(|scope| self.scan_scope(scope, policy, previous, warnings))
                .collect()
        };

        match &self.pool {
            Some(pool) => pool.install(scan_all),
            None => scan_all(),
        }
    }

    /// Whether anything under the project changed after it was last indexed.
    ///
    /// Problems hit while checking are left to the re-index that follows.
    fn is_stale(&self, project: &Project) -> bool {
        self.indexer
            .newest_mtime(&project.path, &Warnings::new())
            .is_none_or(|newest| newest > project.last_modified)
    }

    fn scan_scope(
        &self,
        scope: &Path,
        policy: ReloadPolicy,
        previous: &ProjectMap,
        warnings: &Warnings,
    ) -> ScopeScan {
        let mut report = RootReport {
            root: scope.to_path_buf(),
            ..RootReport::default()
        };

        let roots = match self.indexer.discover(scope, warnings) {
            Ok(roots) => roots,
            Err(err) => {
                warn!(root = %scope.display(), "skipping root: {err}");
                report.error = Some(err.to_string());
                return ScopeScan {
                    report,
                    projects: Vec::new(),
                };
            }
        };

        let mut projects = Vec::with_capacity(roots.len());
        for root in roots {
            if policy == ReloadPolicy::Fresh
                && let Some(existing) = previous.get(&root)
                && !self.is_stale(existing)
            {
                report.reused += 1;
                projects.push(existing.clone());
                continue;
            }

            match self.indexer.index_project(&root, warnings) {
                Ok(project) => projects.push(project),
                Err(err) => warnings.push(err),
            }
        }

        let found: HashSet<&Path> = projects.iter().map(|p| p.path.as_path()).collect();
        report.removed = previous
            .keys()
            .filter(|path| path.starts_with(scope) && !found.contains(path.as_path()))
            .count();
        report.projects = projects.len();

        debug!(
            root = %scope.display(),
            projects = report.projects,
            reused = report.reused,
            "scanned root"
        );

        ScopeScan { report, projects }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::fs;
    use std::time::SystemTime;
    use tempfile::TempDir;

    fn create_file(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn scheduler_for(roots: &[&Path], options: &ScanOptions) -> IndexScheduler {
        let mut config = Config::default();
        for root in roots {
            config.add_directory(root).unwrap();
        }
        IndexScheduler::new(Arc::new(IndexStore::new(config)), options)
    }

    fn options() -> ScanOptions {
        ScanOptions {
            threads: 2,
            ..ScanOptions::default()
        }
    }

    #[test]
    fn test_re_index_indexes_every_root() {
        let one = TempDir::new().unwrap();
        let two = TempDir::new().unwrap();
        create_file(&one.path().join("a/Cargo.toml"), "");
        create_file(&one.path().join("b/package.json"), "{}");
        create_file(&two.path().join("c/Gemfile"), "");

        let scheduler = scheduler_for(&[one.path(), two.path()], &options());
        let report = scheduler.re_index().unwrap();

        assert_eq!(report.roots.len(), 2);
        assert_eq!(report.total_projects(), 3);
        assert_eq!(scheduler.store().len(), 3);
        assert!(!scheduler.store().is_indexing());
    }

    #[test]
    fn test_re_index_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        create_file(&tmp.path().join("a/Cargo.toml"), "");
        create_file(&tmp.path().join("a/src/lib.rs"), "fn a() {}\n");

        let scheduler = scheduler_for(&[tmp.path()], &options());
        scheduler.re_index().unwrap();
        let first = scheduler.store().projects();
        scheduler.re_index().unwrap();

        assert_eq!(scheduler.store().projects(), first);
    }

    #[test]
    fn test_re_index_while_indexing_is_busy() {
        let tmp = TempDir::new().unwrap();
        let scheduler = scheduler_for(&[tmp.path()], &options());

        let _guard = scheduler.store().try_begin_indexing().unwrap();

        assert!(matches!(scheduler.re_index(), Err(IndexError::Busy)));
        assert!(matches!(
            scheduler.reload_index(None),
            Err(IndexError::Busy)
        ));
    }

    #[test]
    fn test_missing_root_is_reported_and_others_continue() {
        let good = TempDir::new().unwrap();
        let doomed = TempDir::new().unwrap();
        create_file(&good.path().join("a/Cargo.toml"), "");

        let scheduler = scheduler_for(&[doomed.path(), good.path()], &options());
        let doomed_path = doomed.path().canonicalize().unwrap();
        drop(doomed);

        let report = scheduler.re_index().unwrap();

        let failed: Vec<&RootReport> = report.failed_roots().collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].root, doomed_path);
        assert_eq!(report.total_projects(), 1);
        assert_eq!(scheduler.store().len(), 1);
    }

    #[test]
    fn test_re_index_drops_deleted_projects() {
        let tmp = TempDir::new().unwrap();
        create_file(&tmp.path().join("a/Cargo.toml"), "");
        create_file(&tmp.path().join("b/Cargo.toml"), "");

        let scheduler = scheduler_for(&[tmp.path()], &options());
        scheduler.re_index().unwrap();
        fs::remove_dir_all(tmp.path().join("b")).unwrap();

        let report = scheduler.re_index().unwrap();

        assert_eq!(report.total_removed(), 1);
        assert_eq!(scheduler.store().len(), 1);
    }

    #[test]
    fn test_reload_subtree_leaves_other_projects() {
        let tmp = TempDir::new().unwrap();
        create_file(&tmp.path().join("a/Cargo.toml"), "");
        create_file(&tmp.path().join("b/Cargo.toml"), "");

        let scheduler = scheduler_for(&[tmp.path()], &options());
        scheduler.re_index().unwrap();

        create_file(&tmp.path().join("a/src/main.rs"), "fn main() {}\n");
        let report = scheduler
            .reload_index(Some(&tmp.path().join("a/src")))
            .unwrap();

        let root = tmp.path().canonicalize().unwrap();
        assert_eq!(report.roots.len(), 1);
        assert_eq!(report.roots[0].root, root.join("a"));
        let a = scheduler.store().get(&root.join("a")).unwrap();
        assert_eq!(a.language_map.get("rust"), Some(&1));
        assert!(scheduler.store().get(&root.join("b")).is_some());
    }

    #[test]
    fn test_reload_new_project_in_subtree() {
        let tmp = TempDir::new().unwrap();
        create_file(&tmp.path().join("a/Cargo.toml"), "");

        let scheduler = scheduler_for(&[tmp.path()], &options());
        scheduler.re_index().unwrap();

        create_file(&tmp.path().join("group/new/package.json"), "{}");
        scheduler
            .reload_index(Some(&tmp.path().join("group")))
            .unwrap();

        assert_eq!(scheduler.store().len(), 2);
    }

    #[test]
    fn test_reload_deleted_project_removes_it() {
        let tmp = TempDir::new().unwrap();
        create_file(&tmp.path().join("a/Cargo.toml"), "");
        create_file(&tmp.path().join("b/Cargo.toml"), "");

        let scheduler = scheduler_for(&[tmp.path()], &options());
        scheduler.re_index().unwrap();

        let root = tmp.path().canonicalize().unwrap();
        fs::remove_dir_all(root.join("b")).unwrap();
        let report = scheduler.reload_index(Some(&root.join("b"))).unwrap();

        assert_eq!(report.total_removed(), 1);
        assert!(scheduler.store().get(&root.join("b")).is_none());
        assert!(scheduler.store().get(&root.join("a")).is_some());
    }

    #[test]
    fn test_reload_outside_roots_is_not_found() {
        let root = TempDir::new().unwrap();
        let elsewhere = TempDir::new().unwrap();

        let scheduler = scheduler_for(&[root.path()], &options());

        assert!(matches!(
            scheduler.reload_index(Some(elsewhere.path())),
            Err(IndexError::NotFound(_))
        ));
        assert!(!scheduler.store().is_indexing());
    }

    #[test]
    fn test_fresh_reload_reuses_unchanged_projects() {
        let tmp = TempDir::new().unwrap();
        create_file(&tmp.path().join("a/Cargo.toml"), "");

        let scheduler = scheduler_for(&[tmp.path()], &options());
        scheduler.re_index().unwrap();

        // Pretend the stored record is newer than anything on disk.
        let root = tmp.path().canonicalize().unwrap();
        let mut stored = scheduler.store().get(&root.join("a")).unwrap();
        stored.last_modified = SystemTime::now() + Duration::from_secs(3600);
        stored.description = Some("kept".to_string());
        scheduler.store().upsert(stored);

        let report = scheduler.reload_index(None).unwrap();

        assert_eq!(report.roots[0].reused, 1);
        let kept = scheduler.store().get(&root.join("a")).unwrap();
        assert_eq!(kept.description.as_deref(), Some("kept"));
    }

    #[test]
    fn test_fresh_reload_sees_in_place_edits() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("a/src/main.rs");
        create_file(&tmp.path().join("a/Cargo.toml"), "");
        create_file(&source, "x\n".repeat(2).as_str());

        let scheduler = scheduler_for(&[tmp.path()], &options());
        scheduler.re_index().unwrap();

        // Rewriting a file in place leaves every directory mtime alone.
        fs::write(&source, "x\n".repeat(5)).unwrap();
        fs::File::options()
            .write(true)
            .open(&source)
            .unwrap()
            .set_modified(SystemTime::now() + Duration::from_secs(60))
            .unwrap();

        let report = scheduler.reload_index(None).unwrap();

        assert_eq!(report.roots[0].reused, 0);
        let root = tmp.path().canonicalize().unwrap();
        let project = scheduler.store().get(&root.join("a")).unwrap();
        assert_eq!(project.language_map.get("rust"), Some(&5));
    }

    #[test]
    fn test_full_reload_reindexes_unchanged_projects() {
        let tmp = TempDir::new().unwrap();
        create_file(&tmp.path().join("a/Cargo.toml"), "");

        let scheduler = scheduler_for(
            &[tmp.path()],
            &ScanOptions {
                reload: ReloadPolicy::Full,
                ..options()
            },
        );
        scheduler.re_index().unwrap();

        let root = tmp.path().canonicalize().unwrap();
        let mut stored = scheduler.store().get(&root.join("a")).unwrap();
        stored.last_modified = SystemTime::now() + Duration::from_secs(3600);
        stored.description = Some("stale".to_string());
        scheduler.store().upsert(stored);

        let report = scheduler.reload_index(None).unwrap();

        assert_eq!(report.roots[0].reused, 0);
        let fresh = scheduler.store().get(&root.join("a")).unwrap();
        assert_eq!(fresh.description, None);
    }

    #[test]
    fn test_report_is_clean() {
        let report = ScanReport::default();
        assert!(report.is_clean());

        let failed = ScanReport {
            roots: vec![RootReport {
                error: Some("gone".to_string()),
                ..RootReport::default()
            }],
            ..ScanReport::default()
        };
        assert!(!failed.is_clean());
    }
}
