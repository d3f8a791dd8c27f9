//! Project discovery and per-project record building.
//!
//! [`ProjectIndexer::discover`] finds project roots below a configured root;
//! [`ProjectIndexer::index_project`] turns one of them into a [`Project`] by
//! running type detection, manifest extraction, git inspection and language
//! counting.

use std::{
    fs,
    path::{Path, PathBuf},
    time::SystemTime,
};

use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::{
    config::ScanOptions,
    error::{IndexError, Result, Warnings},
    git::GitInspector,
    language::{LanguageClassifier, LanguageTally},
    project::{ManifestInfo, Project, ProjectTypeDetector, RootListing},
    walker::FileWalker,
};

/// Documentation file names checked first, in priority order.
const DOCUMENTATION_FILES: &[&str] = &["README.md", "README", "readme.md"];

/// Lower-case names accepted as a fallback when none of the above exist.
const DOCUMENTATION_FALLBACKS: &[&str] = &["readme.md", "doc.md"];

/// Builds [`Project`] records from directories on disk.
#[derive(Clone, Debug)]
pub struct ProjectIndexer {
    /// Walker used for discovery; honours `max_depth`
    discovery: FileWalker,
    /// Walker used inside a project; always unbounded
    counting: FileWalker,
    classifier: LanguageClassifier,
}

impl ProjectIndexer {
    #[must_use]
    pub fn new(options: &ScanOptions) -> Self {
        let discovery = FileWalker::new(options);
        let counting = discovery.clone().with_max_depth(None);

        Self {
            discovery,
            counting,
            classifier: LanguageClassifier::new(options.large_file_threshold),
        }
    }

    /// Whether `listing` describes a project root.
    ///
    /// A directory qualifies when its manifests identify a project type or
    /// when it is a git checkout.
    #[must_use]
    pub fn is_project_root(listing: &RootListing) -> bool {
        ProjectTypeDetector::detect(listing).is_known() || listing.has_git()
    }

    /// Whether the directory at `path` currently qualifies as a project root.
    #[must_use]
    pub fn qualifies(path: &Path) -> bool {
        RootListing::read(path).is_ok_and(|listing| Self::is_project_root(&listing))
    }

    /// Find every project root under `root`, in path order.
    ///
    /// The walk does not descend into a directory once it has been identified
    /// as a project, so nested projects are covered by their enclosing one.
    /// Hidden and ignored directories are never candidates.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Access`] if `root` cannot be read, or
    /// [`IndexError::InvalidPath`] if it is not a directory. Problems below the
    /// root are recorded in `warnings`.
    pub fn discover(&self, root: &Path, warnings: &Warnings) -> Result<Vec<PathBuf>> {
        let metadata = fs::metadata(root).map_err(|e| IndexError::access(root, e))?;
        if !metadata.is_dir() {
            return Err(IndexError::InvalidPath(root.to_path_buf()));
        }
        fs::read_dir(root).map_err(|e| IndexError::access(root, e))?;

        let mut walker = WalkDir::new(root).follow_links(false).sort_by_file_name();
        if let Some(depth) = self.discovery.max_depth() {
            walker = walker.max_depth(depth);
        }

        let mut roots = Vec::new();
        let mut entries = walker
            .into_iter()
            .filter_entry(|entry| self.is_candidate_dir(entry));

        while let Some(result) = entries.next() {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                    let io_error = err
                        .into_io_error()
                        .unwrap_or_else(|| std::io::Error::other("filesystem loop"));
                    warnings.push(IndexError::access(path, io_error));
                    continue;
                }
            };

            let listing = match RootListing::read(entry.path()) {
                Ok(listing) => listing,
                Err(err) => {
                    warnings.push(IndexError::access(entry.path(), err));
                    entries.skip_current_dir();
                    continue;
                }
            };

            if Self::is_project_root(&listing) {
                debug!(path = %entry.path().display(), "discovered project");
                roots.push(entry.into_path());
                entries.skip_current_dir();
            }
        }

        Ok(roots)
    }

    /// Build the record for the project rooted at `root`.
    ///
    /// Files that cannot be read are recorded in `warnings` and left out of
    /// the language map.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Access`] if the root directory itself cannot be listed.
    pub fn index_project(&self, root: &Path, warnings: &Warnings) -> Result<Project> {
        let listing = RootListing::read(root).map_err(|e| IndexError::access(root, e))?;
        let project_type = ProjectTypeDetector::detect(&listing);
        let manifest = ManifestInfo::read(root, project_type);
        let git = GitInspector::inspect(root).unwrap_or_default();

        let mut tally = LanguageTally::default();
        let mut last_modified: Option<SystemTime> = None;

        for entry in self.counting.walk(root, warnings) {
            last_modified = last_modified.max(entry.modified);

            if entry.is_dir {
                continue;
            }

            match self.classifier.classify(&entry.path, entry.size) {
                Ok(Some((language, lines))) => tally.add(language, lines),
                Ok(None) => {}
                Err(err) => warnings.push(err),
            }
        }

        debug!(
            path = %root.display(),
            kind = %project_type,
            lines = tally.total(),
            "indexed project"
        );

        Ok(Project {
            name: manifest.name.unwrap_or_else(|| directory_name(root)),
            path: root.to_path_buf(),
            git: git.remotes,
            branch: git.branch,
            dirty: git.dirty,
            description: manifest.description,
            language_map: tally.into_map(),
            project_type,
            last_modified: last_modified.unwrap_or(SystemTime::UNIX_EPOCH),
            documentation_file: find_documentation(&listing),
        })
    }

    /// Newest mtime under `root`, over the same entries [`Self::index_project`]
    /// looks at, without reading any file.
    pub fn newest_mtime(&self, root: &Path, warnings: &Warnings) -> Option<SystemTime> {
        self.counting
            .walk(root, warnings)
            .filter_map(|entry| entry.modified)
            .max()
    }

    fn is_candidate_dir(&self, entry: &DirEntry) -> bool {
        if !entry.file_type().is_dir() {
            return false;
        }

        entry.depth() == 0
            || !(is_hidden(entry.file_name().to_str()) || self.discovery.is_ignored(entry.file_name()))
    }
}

fn is_hidden(name: Option<&str>) -> bool {
    name.is_some_and(|name| name.starts_with('.'))
}

fn directory_name(root: &Path) -> String {
    root.file_name().map_or_else(
        || root.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}

/// The documentation file at the project root, if any.
fn find_documentation(listing: &RootListing) -> Option<PathBuf> {
    DOCUMENTATION_FILES
        .iter()
        .find(|name| listing.has_file(name))
        .map(|name| listing.root.join(name))
        .or_else(|| {
            listing
                .files
                .iter()
                .find(|file| {
                    let lower = file.to_ascii_lowercase();
                    DOCUMENTATION_FALLBACKS.contains(&lower.as_str())
                })
                .map(|file| listing.root.join(file))
        })
}
