//! Ranked free-text search over indexed projects.
//!
//! Every project becomes one document made of weighted fields: the name
//! counts [`NAME_WEIGHT`] times, the description [`DESCRIPTION_WEIGHT`]
//! times, the project type [`TYPE_WEIGHT`] times and the documentation file
//! once. Queries are scored against those documents with BM25.

use std::{
    collections::{HashMap, HashSet},
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};

use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

use crate::project::{Project, ProjectType};

pub const NAME_WEIGHT: u32 = 9;
pub const DESCRIPTION_WEIGHT: u32 = 4;
pub const TYPE_WEIGHT: u32 = 3;

/// Only the head of a documentation file is indexed.
pub const MAX_DOCUMENTATION_BYTES: u64 = 256 * 1024;

const K1: f32 = 1.2;
const B: f32 = 0.75;

/// One ranked search result.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SearchHit {
    pub name: String,
    pub path: PathBuf,
    #[serde(rename = "type")]
    pub project_type: ProjectType,
    pub score: f32,
}

#[derive(Debug)]
struct Document {
    name: String,
    path: PathBuf,
    project_type: ProjectType,
    /// Weighted term counts
    terms: HashMap<String, u32>,
    len: u32,
}

/// BM25 model over a set of projects.
#[derive(Debug, Default)]
pub struct SearchIndex {
    documents: Vec<Document>,
    doc_freq: HashMap<String, usize>,
    avg_len: f32,
}

impl SearchIndex {
    /// Build the model, reading each project's documentation file.
    ///
    /// A documentation file that cannot be read contributes nothing.
    #[must_use]
    pub fn build(projects: &[Project]) -> Self {
        let documents: Vec<Document> = projects
            .par_iter()
            .map(|project| {
                let documentation = project
                    .documentation_file
                    .as_deref()
                    .map(read_documentation)
                    .unwrap_or_default();
                Document::new(project, &documentation)
            })
            .collect();

        Self::from_documents(documents)
    }

    fn from_documents(documents: Vec<Document>) -> Self {
        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        for document in &documents {
            for term in document.terms.keys() {
                *doc_freq.entry(term.clone()).or_insert(0) += 1;
            }
        }

        let total_len: u64 = documents.iter().map(|d| u64::from(d.len)).sum();
        #[allow(clippy::cast_precision_loss)]
        let avg_len = total_len as f32 / documents.len().max(1) as f32;

        Self {
            documents,
            doc_freq,
            avg_len,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// The `limit` best matches for `query`, highest score first.
    ///
    /// Projects sharing no term with the query are never returned; ties are
    /// broken by path.
    #[must_use]
    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchHit> {
        let query_terms: HashSet<String> = tokenize(query).collect();
        if query_terms.is_empty() {
            return Vec::new();
        }

        let mut hits: Vec<SearchHit> = self
            .documents
            .iter()
            .filter_map(|document| {
                let score = self.score(document, &query_terms);
                (score > 0.0).then(|| SearchHit {
                    name: document.name.clone(),
                    path: document.path.clone(),
                    project_type: document.project_type,
                    score,
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.path.cmp(&b.path))
        });
        hits.truncate(limit);
        hits
    }

    #[allow(clippy::cast_precision_loss)]
    fn score(&self, document: &Document, query_terms: &HashSet<String>) -> f32 {
        let total_docs = self.documents.len() as f32;
        let doc_len = document.len as f32;
        let norm = K1 * (1.0 - B + B * doc_len / self.avg_len.max(1e-3));

        query_terms
            .iter()
            .filter_map(|term| {
                let freq = *document.terms.get(term)? as f32;
                let df = *self.doc_freq.get(term).unwrap_or(&0) as f32;
                let idf = ((total_docs - df + 0.5) / (df + 0.5) + 1.0).ln();
                Some(idf * freq * (K1 + 1.0) / (freq + norm))
            })
            .sum()
    }
}

impl Document {
    fn new(project: &Project, documentation: &str) -> Self {
        let mut terms: HashMap<String, u32> = HashMap::new();
        let mut add = |text: &str, weight: u32| {
            for term in tokenize(text) {
                *terms.entry(term).or_insert(0) += weight;
            }
        };

        add(&project.name, NAME_WEIGHT);
        if let Some(description) = &project.description {
            add(description, DESCRIPTION_WEIGHT);
        }
        add(project.project_type.name(), TYPE_WEIGHT);
        add(documentation, 1);

        let len = terms.values().sum();
        Self {
            name: project.name.clone(),
            path: project.path.clone(),
            project_type: project.project_type,
            terms,
            len,
        }
    }
}

/// Lower-cased Unicode words of `text`.
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.unicode_words().map(str::to_lowercase)
}

fn read_documentation(path: &Path) -> String {
    let mut bytes = Vec::new();
    let read = File::open(path).and_then(|file| {
        file.take(MAX_DOCUMENTATION_BYTES)
            .read_to_end(&mut bytes)
    });

    match read {
        Ok(_) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(err) => {
            debug!(path = %path.display(), "unreadable documentation: {err}");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::LanguageMap;
    use std::{fs, time::SystemTime};
    use tempfile::TempDir;

    fn create_test_project(name: &str, kind: ProjectType, description: Option<&str>) -> Project {
        Project {
            name: name.to_string(),
            path: PathBuf::from("/code").join(name),
            git: Vec::new(),
            branch: None,
            dirty: false,
            description: description.map(str::to_string),
            language_map: LanguageMap::default(),
            project_type: kind,
            last_modified: SystemTime::UNIX_EPOCH,
            documentation_file: None,
        }
    }

    fn names(hits: &[SearchHit]) -> Vec<&str> {
        hits.iter().map(|hit| hit.name.as_str()).collect()
    }

    #[test]
    fn test_tokenize_lowercases_words() {
        let terms: Vec<String> = tokenize("Blood-Pressure monitor, v2!").collect();
        assert_eq!(terms, vec!["blood", "pressure", "monitor", "v2"]);
    }

    #[test]
    fn test_name_outranks_description() {
        let index = SearchIndex::build(&[
            create_test_project("tracker", ProjectType::Rust, Some("Budget planner")),
            create_test_project("budget", ProjectType::Rust, Some("Expense tracker")),
        ]);

        let hits = index.search("tracker", 10);

        assert_eq!(names(&hits), vec!["tracker", "budget"]);
        assert!(hits[0].score > hits[1].score);
    }

    #[test]
    fn test_search_by_project_type() {
        let index = SearchIndex::build(&[
            create_test_project("site", ProjectType::NextJs, None),
            create_test_project("cli", ProjectType::Rust, None),
        ]);

        assert_eq!(names(&index.search("rust", 10)), vec!["cli"]);
    }

    #[test]
    fn test_no_match_and_empty_query() {
        let index = SearchIndex::build(&[create_test_project("cli", ProjectType::Rust, None)]);

        assert!(index.search("kubernetes", 10).is_empty());
        assert!(index.search("  ,, ", 10).is_empty());
    }

    #[test]
    fn test_limit_truncates_results() {
        let projects: Vec<Project> = (0..5)
            .map(|i| create_test_project(&format!("tool-{i}"), ProjectType::Rust, None))
            .collect();
        let index = SearchIndex::build(&projects);

        let hits = index.search("tool", 2);
        assert_eq!(hits.len(), 2);
        // Equal scores fall back to path order.
        assert_eq!(names(&hits), vec!["tool-0", "tool-1"]);
    }

    #[test]
    fn test_documentation_contents_are_searchable() {
        let tmp = TempDir::new().unwrap();
        let readme = tmp.path().join("README.md");
        fs::write(&readme, "# App\n\nSyncs photos with the cloud.\n").unwrap();

        let mut project = create_test_project("app", ProjectType::Flutter, None);
        project.documentation_file = Some(readme);
        let mut missing = create_test_project("other", ProjectType::Flutter, None);
        missing.documentation_file = Some(tmp.path().join("gone.md"));

        let index = SearchIndex::build(&[project, missing]);

        assert_eq!(index.len(), 2);
        assert_eq!(names(&index.search("photos", 10)), vec!["app"]);
    }
}
