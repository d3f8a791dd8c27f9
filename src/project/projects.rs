//! Collection of indexed projects with summary reporting.
//!
//! `Projects` wraps the ordered list returned by the index and provides the
//! aggregate figures the command-line front end prints after listing.

use std::collections::BTreeMap;

use colored::Colorize;

use super::{Project, ProjectType};

/// An ordered collection of indexed projects.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Projects(Vec<Project>);

impl From<Vec<Project>> for Projects {
    fn from(projects: Vec<Project>) -> Self {
        Self(projects)
    }
}

impl IntoIterator for Projects {
    type Item = Project;
    type IntoIter = std::vec::IntoIter<Project>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl Projects {
    /// Total counted lines across every project.
    #[must_use]
    pub fn total_lines(&self) -> u64 {
        self.0.iter().map(Project::total_lines).sum()
    }

    /// Line counts per language, summed across every project.
    #[must_use]
    pub fn language_totals(&self) -> BTreeMap<&str, u64> {
        let mut totals = BTreeMap::new();
        for (language, lines) in self.0.iter().flat_map(|p| &p.language_map) {
            *totals.entry(language.as_str()).or_insert(0) += lines;
        }
        totals
    }

    /// Number of projects and their total lines for each project type present.
    ///
    /// Types are returned in first-seen order so the summary follows the
    /// listing order.
    #[must_use]
    pub fn type_breakdown(&self) -> Vec<(ProjectType, usize, u64)> {
        let mut breakdown: Vec<(ProjectType, usize, u64)> = Vec::new();

        for project in &self.0 {
            if let Some(entry) = breakdown
                .iter_mut()
                .find(|(kind, _, _)| *kind == project.project_type)
            {
                entry.1 += 1;
                entry.2 += project.total_lines();
            } else {
                breakdown.push((project.project_type, 1, project.total_lines()));
            }
        }

        breakdown
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Project] {
        &self.0
    }

    /// Print per-type counts and the overall line total.
    ///
    /// ```text
    ///   3 Rust projects (12840 lines)
    ///   1 Next.js project (4210 lines)
    ///   Total: 4 projects, 17050 lines
    /// ```
    pub fn print_summary(&self) {
        for (kind, count, lines) in self.type_breakdown() {
            let noun = if count == 1 { "project" } else { "projects" };
            println!(
                "  {} {kind} {noun} ({} lines)",
                count.to_string().bright_white(),
                lines.to_string().bright_white()
            );
        }

        println!(
            "  Total: {} projects, {} lines",
            self.len().to_string().bright_white(),
            self.total_lines().to_string().bright_green().bold()
        );
    }
}
