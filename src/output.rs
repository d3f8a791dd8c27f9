//! Structured JSON output for scripting and piping.
//!
//! When the `--json` flag is passed, these structures are serialized to
//! stdout as a single JSON object, replacing all human-readable output.

use std::{collections::BTreeMap, path::PathBuf, time::SystemTime};

use chrono::{DateTime, Local, SecondsFormat};
use serde::Serialize;

use crate::{
    language::LanguageMap,
    project::{Project, ProjectType, Projects},
    scheduler::{RootReport, ScanReport},
    search::SearchHit,
};

/// Format a timestamp as local RFC 3339 (`2024-05-01T12:30:00+02:00`).
#[must_use]
pub fn format_timestamp(time: SystemTime) -> String {
    let local: DateTime<Local> = time.into();
    local.to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Output of `list`.
#[derive(Serialize, Debug)]
pub struct JsonListOutput {
    /// Listed projects, in display order
    pub projects: Vec<JsonProjectEntry>,

    /// Aggregated statistics over the listed projects
    pub summary: JsonSummary,

    /// When the index was last built, or `null` if never
    pub last_indexed: Option<String>,

    /// Whether a pass is running while this listing was taken
    pub is_indexing: bool,
}

/// A single project entry in the JSON output.
#[derive(Serialize, Debug)]
pub struct JsonProjectEntry {
    pub name: String,

    /// Project type (`"Rust"`, `"NextJs"`, ..., `"Unknown"`)
    #[serde(rename = "type")]
    pub project_type: ProjectType,

    pub path: PathBuf,

    /// Remote URLs, without duplicates
    pub git: Vec<String>,

    pub branch: Option<String>,

    pub dirty: bool,

    pub description: Option<String>,

    /// Lines per language tag
    pub languages: LanguageMap,

    pub total_lines: u64,

    pub primary_language: Option<String>,

    /// RFC 3339 timestamp
    pub last_modified: String,

    pub documentation_file: Option<PathBuf>,
}

/// Aggregated summary across all listed projects.
#[derive(Serialize, Debug)]
pub struct JsonSummary {
    pub total_projects: usize,

    pub total_lines: u64,

    /// Per-type breakdown (key is the project type name)
    pub by_type: BTreeMap<String, JsonTypeSummary>,

    /// Lines per language across every listed project
    pub languages: BTreeMap<String, u64>,
}

/// Per-project-type count and lines.
#[derive(Serialize, Debug)]
pub struct JsonTypeSummary {
    pub count: usize,
    pub lines: u64,
}

/// Output of `index` and `reload`.
#[derive(Serialize, Debug)]
pub struct JsonScanOutput {
    /// `"re_index"` or `"reload"`
    pub mode: String,

    pub total_projects: usize,

    pub removed: usize,

    pub roots: Vec<RootReport>,

    pub warnings: Vec<String>,

    pub elapsed_ms: u128,
}

/// Output of `search`.
#[derive(Serialize, Debug)]
pub struct JsonSearchOutput {
    pub query: String,

    /// Best match first
    pub results: Vec<SearchHit>,
}

impl JsonListOutput {
    #[must_use]
    pub fn new(projects: &Projects, last_indexed: Option<SystemTime>, is_indexing: bool) -> Self {
        Self {
            projects: projects
                .as_slice()
                .iter()
                .map(JsonProjectEntry::from_project)
                .collect(),
            summary: JsonSummary::from_projects(projects),
            last_indexed: last_indexed.map(format_timestamp),
            is_indexing,
        }
    }
}

impl JsonProjectEntry {
    /// Convert a `Project` into a `JsonProjectEntry`.
    #[must_use]
    pub fn from_project(project: &Project) -> Self {
        Self {
            name: project.name.clone(),
            project_type: project.project_type,
            path: project.path.clone(),
            git: project.git.clone(),
            branch: project.branch.clone(),
            dirty: project.dirty,
            description: project.description.clone(),
            languages: project.language_map.clone(),
            total_lines: project.total_lines(),
            primary_language: project.primary_language().map(str::to_string),
            last_modified: format_timestamp(project.last_modified),
            documentation_file: project.documentation_file.clone(),
        }
    }
}

impl JsonSummary {
    /// Build summary statistics from a collection of projects.
    #[must_use]
    pub fn from_projects(projects: &Projects) -> Self {
        let by_type = projects
            .type_breakdown()
            .into_iter()
            .map(|(kind, count, lines)| (kind.name().to_string(), JsonTypeSummary { count, lines }))
            .collect();

        let languages = projects
            .language_totals()
            .into_iter()
            .map(|(language, lines)| (language.to_string(), lines))
            .collect();

        Self {
            total_projects: projects.len(),
            total_lines: projects.total_lines(),
            by_type,
            languages,
        }
    }
}

impl JsonScanOutput {
    #[must_use]
    pub fn from_report(mode: &str, report: &ScanReport) -> Self {
        Self {
            mode: mode.to_string(),
            total_projects: report.total_projects(),
            removed: report.total_removed(),
            roots: report.roots.clone(),
            warnings: report.warnings.clone(),
            elapsed_ms: report.elapsed.as_millis(),
        }
    }
}
