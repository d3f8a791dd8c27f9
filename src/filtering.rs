//! Project filtering and sorting for listings.
//!
//! This module narrows the indexed projects by type and age and orders them
//! for display.

use chrono::{DateTime, Duration, Local};
use rayon::prelude::*;

use crate::config::{FilterOptions, SortCriteria, SortOptions};
use crate::project::Project;

/// Keep only the projects that pass every filter in `filter_opts`.
#[must_use]
pub fn filter_projects(projects: Vec<Project>, filter_opts: &FilterOptions) -> Vec<Project> {
    let cutoff = age_cutoff(filter_opts.modified_within_days);

    projects
        .into_par_iter()
        .filter(|project| filter_opts.project_type.matches(project.project_type))
        .filter(|project| cutoff.is_none_or(|cutoff| is_recent(project, cutoff)))
        .collect()
}

fn age_cutoff(days: u32) -> Option<DateTime<Local>> {
    (days > 0).then(|| Local::now() - Duration::days(i64::from(days)))
}

fn is_recent(project: &Project, cutoff: DateTime<Local>) -> bool {
    let modified: DateTime<Local> = project.last_modified.into();
    modified >= cutoff
}

/// Sort projects in place according to `sort_opts`.
///
/// With no criteria the index order (newest first) is kept, but `reverse`
/// still applies.
pub fn sort_projects(projects: &mut [Project], sort_opts: &SortOptions) {
    if let Some(criteria) = sort_opts.criteria {
        match criteria {
            SortCriteria::Modified => {
                projects.sort_by(|a, b| {
                    b.last_modified
                        .cmp(&a.last_modified)
                        .then_with(|| a.path.cmp(&b.path))
                });
            }
            SortCriteria::Name => {
                projects.sort_by(|a, b| {
                    a.name
                        .to_lowercase()
                        .cmp(&b.name.to_lowercase())
                        .then_with(|| a.path.cmp(&b.path))
                });
            }
            SortCriteria::Lines => {
                projects.sort_by(|a, b| {
                    b.total_lines()
                        .cmp(&a.total_lines())
                        .then_with(|| a.path.cmp(&b.path))
                });
            }
            SortCriteria::Type => {
                projects.sort_by(|a, b| {
                    a.project_type
                        .name()
                        .cmp(b.project_type.name())
                        .then_with(|| a.path.cmp(&b.path))
                });
            }
        }
    }

    if sort_opts.reverse {
        projects.reverse();
    }
}
