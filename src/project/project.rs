//! Core project data structures and types.
//!
//! This module defines the record produced for every discovered project root
//! and the closed set of project classifications.

use std::{
    fmt::{Display, Formatter, Result},
    path::PathBuf,
    time::SystemTime,
};

use serde::{Deserialize, Serialize};

use crate::language::LanguageMap;

/// Enumeration of recognised project types.
///
/// Classification is based purely on manifest files found at the project
/// root; see [`ProjectTypeDetector`](super::ProjectTypeDetector) for the
/// rule order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum ProjectType {
    /// `Cargo.toml` at the root
    Rust,

    /// `requirements.txt`, `pyproject.toml` or `setup.py` at the root
    Python,

    /// `pubspec.yaml` at the root
    Flutter,

    /// `Gemfile` or a `*.gemspec` at the root
    Ruby,

    /// `package.json` depending on `next`
    NextJs,

    /// `package.json` depending on `svelte`, or `*.svelte` files at the root
    Svelte,

    /// `package.json` depending on `react`
    React,

    /// `package.json` depending on `@angular/core`
    Angular,

    /// Any other `package.json`
    Node,

    /// `package.json` depending on `vue`
    Vue,

    /// No manifest matched; the directory qualified through its `.git` alone
    Unknown,
}

impl ProjectType {
    /// Whether this is a real classification rather than the fallback.
    #[must_use]
    pub const fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Human-readable name of the project type.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Rust => "Rust",
            Self::Python => "Python",
            Self::Flutter => "Flutter",
            Self::Ruby => "Ruby",
            Self::NextJs => "Next.js",
            Self::Svelte => "Svelte",
            Self::React => "React",
            Self::Angular => "Angular",
            Self::Node => "Node.js",
            Self::Vue => "Vue",
            Self::Unknown => "Unknown",
        }
    }
}

impl Display for ProjectType {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.write_str(self.name())
    }
}

/// One indexed project root.
///
/// A `Project` is rebuilt from scratch every time its root is re-indexed;
/// it is never patched in place.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Manifest name if declared, otherwise the directory's base name
    pub name: String,

    /// Absolute path of the project root; unique within the index
    pub path: PathBuf,

    /// Remote URLs of the repository at the root
    pub git: Vec<String>,

    /// Branch checked out at `HEAD`, when it is a symbolic ref
    pub branch: Option<String>,

    /// Uncommitted changes in the working tree when it was indexed
    #[serde(default)]
    pub dirty: bool,

    /// Manifest description, if any
    pub description: Option<String>,

    /// Lines of code per language tag
    pub language_map: LanguageMap,

    pub project_type: ProjectType,

    /// Newest mtime seen while classifying files (directory mtime as fallback)
    pub last_modified: SystemTime,

    /// README (or similar) at the project root
    pub documentation_file: Option<PathBuf>,
}

impl Project {
    /// Sum of all language line counts.
    #[must_use]
    pub fn total_lines(&self) -> u64 {
        self.language_map.values().sum()
    }

    /// The language with the most lines, ties broken alphabetically.
    #[must_use]
    pub fn primary_language(&self) -> Option<&str> {
        self.language_map
            .iter()
            .max_by(|(a_name, a_lines), (b_name, b_lines)| {
                a_lines.cmp(b_lines).then_with(|| b_name.cmp(a_name))
            })
            .map(|(name, _)| name.as_str())
    }
}

impl Display for Project {
    /// `name [Type] (path)`, e.g. `indexer [Rust] (/home/me/code/indexer)`.
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(
            f,
            "{} [{}] ({})",
            self.name,
            self.project_type,
            self.path.display()
        )
    }
}
