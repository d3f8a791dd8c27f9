//! Filtering configuration for project listing.
//!
//! This module defines the project type filter and the sorting criteria used
//! when presenting the indexed projects.

use clap::ValueEnum;

use crate::project::ProjectType;

/// Enumeration of supported project type filters.
///
/// This enum is used to restrict a listing to specific types of projects.
#[derive(Clone, Copy, PartialEq, Eq, Debug, ValueEnum, Default)]
pub enum ProjectFilter {
    /// Include all project types
    #[default]
    All,

    /// Include only Rust projects (Cargo.toml)
    Rust,

    /// Include only Python projects (requirements.txt, pyproject.toml, setup.py)
    Python,

    /// Include only Flutter projects (pubspec.yaml)
    Flutter,

    /// Include only Ruby projects (Gemfile or *.gemspec)
    Ruby,

    /// Include only Next.js projects (package.json depending on `next`)
    #[value(name = "nextjs")]
    NextJs,

    /// Include only Svelte projects
    Svelte,

    /// Include only React projects
    React,

    /// Include only Angular projects
    Angular,

    /// Include only plain Node.js projects
    Node,

    /// Include only Vue projects
    Vue,

    /// Include only git repositories without a recognised manifest
    Unknown,
}

impl ProjectFilter {
    /// Whether a project of the given type passes this filter.
    #[must_use]
    pub const fn matches(self, kind: ProjectType) -> bool {
        matches!(
            (self, kind),
            (Self::All, _)
                | (Self::Rust, ProjectType::Rust)
                | (Self::Python, ProjectType::Python)
                | (Self::Flutter, ProjectType::Flutter)
                | (Self::Ruby, ProjectType::Ruby)
                | (Self::NextJs, ProjectType::NextJs)
                | (Self::Svelte, ProjectType::Svelte)
                | (Self::React, ProjectType::React)
                | (Self::Angular, ProjectType::Angular)
                | (Self::Node, ProjectType::Node)
                | (Self::Vue, ProjectType::Vue)
                | (Self::Unknown, ProjectType::Unknown)
        )
    }
}

/// Enumeration of supported sorting criteria for project output.
///
/// Each variant has a natural default direction:
/// - `Modified`: most recently modified first
/// - `Name`: alphabetical (ascending)
/// - `Lines`: largest code base first
/// - `Type`: grouped by type name alphabetically
#[derive(Clone, Copy, PartialEq, Eq, Debug, ValueEnum)]
pub enum SortCriteria {
    /// Sort by last modification time (newest first by default)
    Modified,

    /// Sort by project name alphabetically (A-Z by default)
    Name,

    /// Sort by total counted lines (largest first by default)
    Lines,

    /// Sort by project type name alphabetically
    Type,
}

/// Which projects a listing includes.
#[derive(Clone, Debug, Default)]
pub struct FilterOptions {
    /// Restrict to a single project type
    pub project_type: ProjectFilter,

    /// Only projects modified within this many days (0 = no age filter)
    pub modified_within_days: u32,
}

/// Configuration for project sorting behavior.
///
/// When `criteria` is `None`, projects are displayed in index order.
#[derive(Clone, Debug)]
pub struct SortOptions {
    /// The sorting criterion to apply, or `None` to preserve index order
    pub criteria: Option<SortCriteria>,

    /// Whether to reverse the sort order
    pub reverse: bool,
}
