//! Manifest-based project type detection.
//!
//! Detection looks only at the immediate children of a candidate root. Rules
//! are tried in order and the first match wins. A `package.json` project is
//! refined first by framework config files at the root, then by its
//! dependencies, before falling back to plain Node.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde_json::Value;

use super::ProjectType;

/// The immediate children of a candidate project root.
#[derive(Clone, Debug, Default)]
pub struct RootListing {
    pub root: PathBuf,
    /// File names at the root, sorted
    pub files: Vec<String>,
    /// Directory names at the root, sorted
    pub dirs: Vec<String>,
}

impl RootListing {
    /// List the direct children of `root`.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if `root` cannot be read. Individual children
    /// whose type cannot be determined are skipped.
    pub fn read(root: &Path) -> io::Result<Self> {
        let mut listing = Self {
            root: root.to_path_buf(),
            ..Self::default()
        };

        for entry in fs::read_dir(root)?.flatten() {
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            let name = entry.file_name().to_string_lossy().into_owned();

            if file_type.is_dir() {
                listing.dirs.push(name);
            } else {
                // `.git` may be a file for worktrees and submodules.
                listing.files.push(name);
            }
        }

        listing.files.sort();
        listing.dirs.sort();
        Ok(listing)
    }

    #[must_use]
    pub fn has_file(&self, name: &str) -> bool {
        self.files.iter().any(|file| file == name)
    }

    /// Whether any root file ends with `suffix` (e.g. `".gemspec"`).
    #[must_use]
    pub fn has_file_with_suffix(&self, suffix: &str) -> bool {
        self.files.iter().any(|file| file.ends_with(suffix))
    }

    /// Whether the root contains a `.git` directory or `.git` file.
    #[must_use]
    pub fn has_git(&self) -> bool {
        self.dirs.iter().chain(&self.files).any(|name| name == ".git")
    }
}

/// Ordered manifest rules mapping a root listing to a [`ProjectType`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ProjectTypeDetector;

impl ProjectTypeDetector {
    /// Classify the project at `listing.root`.
    ///
    /// Returns [`ProjectType::Unknown`] when no rule matches.
    #[must_use]
    pub fn detect(listing: &RootListing) -> ProjectType {
        if listing.has_file("Cargo.toml") {
            return ProjectType::Rust;
        }

        if listing.has_file("pubspec.yaml") {
            return ProjectType::Flutter;
        }

        if listing.has_file("package.json") {
            return Self::detect_framework_config(listing)
                .unwrap_or_else(|| Self::detect_node_flavor(&listing.root.join("package.json")));
        }

        if listing.has_file("Gemfile") || listing.has_file_with_suffix(".gemspec") {
            return ProjectType::Ruby;
        }

        if ["requirements.txt", "pyproject.toml", "setup.py"]
            .iter()
            .any(|file| listing.has_file(file))
        {
            return ProjectType::Python;
        }

        if listing.has_file_with_suffix(".svelte") {
            return ProjectType::Svelte;
        }

        ProjectType::Unknown
    }

    /// Framework config files that settle the flavor without reading `package.json`.
    fn detect_framework_config(listing: &RootListing) -> Option<ProjectType> {
        const CONFIG_MARKERS: &[(&str, ProjectType)] = &[
            ("next.config.js", ProjectType::NextJs),
            ("next.config.mjs", ProjectType::NextJs),
            ("next.config.json", ProjectType::NextJs),
            ("angular.json", ProjectType::Angular),
            ("svelte.config.js", ProjectType::Svelte),
            ("svelte.config.json", ProjectType::Svelte),
            ("vue.config.js", ProjectType::Vue),
        ];

        CONFIG_MARKERS
            .iter()
            .find(|(file, _)| listing.has_file(file))
            .map(|(_, kind)| *kind)
    }

    /// Refine a `package.json` project by its dependencies.
    ///
    /// An unreadable or malformed `package.json` is treated as a bare Node project.
    fn detect_node_flavor(package_json: &Path) -> ProjectType {
        let Some(manifest) = fs::read_to_string(package_json)
            .ok()
            .and_then(|content| serde_json::from_str::<Value>(&content).ok())
        else {
            return ProjectType::Node;
        };

        Self::classify_dependencies(&manifest)
    }

    fn classify_dependencies(manifest: &Value) -> ProjectType {
        const FRAMEWORKS: &[(&str, ProjectType)] = &[
            ("next", ProjectType::NextJs),
            ("react", ProjectType::React),
            ("vue", ProjectType::Vue),
            ("@angular/core", ProjectType::Angular),
            ("svelte", ProjectType::Svelte),
        ];

        let depends_on = |package: &str| {
            ["dependencies", "devDependencies"].iter().any(|section| {
                manifest
                    .get(section)
                    .and_then(Value::as_object)
                    .is_some_and(|deps| deps.contains_key(package))
            })
        };

        FRAMEWORKS
            .iter()
            .find(|(package, _)| depends_on(package))
            .map_or(ProjectType::Node, |(_, kind)| *kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_file(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn detect_with(files: &[(&str, &str)]) -> ProjectType {
        let tmp = TempDir::new().unwrap();
        for (name, content) in files {
            create_file(&tmp.path().join(name), content);
        }
        let listing = RootListing::read(tmp.path()).unwrap();
        ProjectTypeDetector::detect(&listing)
    }

    #[test]
    fn test_detect_rust() {
        assert_eq!(
            detect_with(&[("Cargo.toml", "[package]\nname = \"x\"\n")]),
            ProjectType::Rust
        );
    }

    #[test]
    fn test_detect_flutter() {
        assert_eq!(
            detect_with(&[("pubspec.yaml", "name: app\n")]),
            ProjectType::Flutter
        );
    }

    #[test]
    fn test_next_wins_over_react_and_node() {
        let package = r#"{"dependencies": {"next": "14.0.0", "react": "18.2.0"}}"#;
        assert_eq!(
            detect_with(&[("package.json", package)]),
            ProjectType::NextJs
        );
    }

    #[test]
    fn test_detect_js_frameworks() {
        assert_eq!(
            detect_with(&[("package.json", r#"{"dependencies": {"react": "18"}}"#)]),
            ProjectType::React
        );
        assert_eq!(
            detect_with(&[("package.json", r#"{"dependencies": {"vue": "3"}}"#)]),
            ProjectType::Vue
        );
        assert_eq!(
            detect_with(&[(
                "package.json",
                r#"{"dependencies": {"@angular/core": "17"}}"#
            )]),
            ProjectType::Angular
        );
        assert_eq!(
            detect_with(&[("package.json", r#"{"devDependencies": {"svelte": "4"}}"#)]),
            ProjectType::Svelte
        );
    }

    #[test]
    fn test_framework_config_files() {
        let react_only = r#"{"dependencies": {"react": "18"}}"#;
        assert_eq!(
            detect_with(&[("package.json", react_only), ("next.config.js", "")]),
            ProjectType::NextJs
        );
        assert_eq!(
            detect_with(&[("package.json", "{}"), ("angular.json", "{}")]),
            ProjectType::Angular
        );
        assert_eq!(
            detect_with(&[("package.json", "{}"), ("svelte.config.js", "")]),
            ProjectType::Svelte
        );
        assert_eq!(
            detect_with(&[("package.json", "{}"), ("vue.config.js", "")]),
            ProjectType::Vue
        );
    }

    #[test]
    fn test_framework_config_needs_package_json() {
        assert_eq!(
            detect_with(&[("next.config.js", "")]),
            ProjectType::Unknown
        );
    }

    #[test]
    fn test_bare_package_json_is_node() {
        assert_eq!(
            detect_with(&[("package.json", r#"{"name": "tool"}"#)]),
            ProjectType::Node
        );
    }

    #[test]
    fn test_malformed_package_json_is_node() {
        assert_eq!(
            detect_with(&[("package.json", "{ not json")]),
            ProjectType::Node
        );
    }

    #[test]
    fn test_detect_ruby() {
        assert_eq!(
            detect_with(&[("Gemfile", "source 'https://rubygems.org'\n")]),
            ProjectType::Ruby
        );
        assert_eq!(
            detect_with(&[("mygem.gemspec", "Gem::Specification.new\n")]),
            ProjectType::Ruby
        );
    }

    #[test]
    fn test_detect_python() {
        for manifest in ["requirements.txt", "pyproject.toml", "setup.py"] {
            assert_eq!(detect_with(&[(manifest, "")]), ProjectType::Python);
        }
    }

    #[test]
    fn test_detect_loose_svelte_files() {
        assert_eq!(
            detect_with(&[("App.svelte", "<script></script>\n")]),
            ProjectType::Svelte
        );
    }

    #[test]
    fn test_rust_wins_over_node() {
        assert_eq!(
            detect_with(&[("Cargo.toml", ""), ("package.json", "{}")]),
            ProjectType::Rust
        );
    }

    #[test]
    fn test_nothing_matches_is_unknown() {
        assert_eq!(
            detect_with(&[("notes.txt", "hello")]),
            ProjectType::Unknown
        );
    }

    #[test]
    fn test_manifest_in_subdirectory_is_ignored() {
        assert_eq!(
            detect_with(&[("sub/Cargo.toml", "")]),
            ProjectType::Unknown
        );
    }

    #[test]
    fn test_root_listing_has_git() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join(".git")).unwrap();
        assert!(RootListing::read(tmp.path()).unwrap().has_git());

        let worktree = TempDir::new().unwrap();
        create_file(&worktree.path().join(".git"), "gitdir: /elsewhere\n");
        assert!(RootListing::read(worktree.path()).unwrap().has_git());

        let plain = TempDir::new().unwrap();
        assert!(!RootListing::read(plain.path()).unwrap().has_git());
    }
}
