//! Heuristic language classification and line counting.
//!
//! Files are mapped to a language tag by extension (or by a handful of
//! well-known file names). Only source and markup languages are counted:
//! manifests and data formats such as TOML, JSON, YAML and Markdown are
//! skipped, so a project's language map reflects its code.

use std::{collections::BTreeMap, fs, path::Path};

use crate::{
    config::scan::DEFAULT_LARGE_FILE_THRESHOLD,
    error::{IndexError, Result},
};

/// Average bytes per line used to estimate files above the size ceiling.
pub const AVERAGE_LINE_LENGTH: u64 = 40;

/// How many leading bytes are inspected for NUL when sniffing binaries.
const BINARY_SNIFF_LEN: usize = 8 * 1024;

/// Language tag to line count, ordered by tag for stable output.
pub type LanguageMap = BTreeMap<String, u64>;

/// Maps files to `(language, lines)` pairs.
#[derive(Clone, Copy, Debug)]
pub struct LanguageClassifier {
    large_file_threshold: u64,
}

impl Default for LanguageClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_LARGE_FILE_THRESHOLD)
    }
}

impl LanguageClassifier {
    #[must_use]
    pub const fn new(large_file_threshold: u64) -> Self {
        Self {
            large_file_threshold,
        }
    }

    /// The language tag for a path, or `None` if the file is not counted.
    #[must_use]
    pub fn language_of(path: &Path) -> Option<&'static str> {
        let file_name = path.file_name()?.to_str()?;

        match file_name {
            "Dockerfile" | "Containerfile" => return Some("dockerfile"),
            "Makefile" | "GNUmakefile" | "makefile" => return Some("makefile"),
            "Rakefile" | "Gemfile" => return Some("ruby"),
            _ => {}
        }

        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        let language = match extension.as_str() {
            "rs" => "rust",
            "py" | "pyi" | "pyw" => "python",
            "js" | "mjs" | "cjs" | "jsx" => "javascript",
            "ts" | "tsx" | "mts" | "cts" => "typescript",
            "dart" => "dart",
            "rb" | "rake" | "gemspec" => "ruby",
            "svelte" => "svelte",
            "vue" => "vue",
            "html" | "htm" => "html",
            "css" => "css",
            "scss" | "sass" => "scss",
            "less" => "less",
            "go" => "go",
            "java" => "java",
            "kt" | "kts" => "kotlin",
            "swift" => "swift",
            "c" | "h" => "c",
            "cc" | "cpp" | "cxx" | "hpp" | "hh" | "hxx" => "cpp",
            "cs" => "csharp",
            "php" => "php",
            "sh" | "bash" | "zsh" => "shell",
            "sql" => "sql",
            "lua" => "lua",
            "ex" | "exs" => "elixir",
            "hs" => "haskell",
            "scala" => "scala",
            "zig" => "zig",
            _ => return None,
        };

        Some(language)
    }

    /// Classify a file and count its lines.
    ///
    /// `size` is the file size from the walk; files above the size ceiling are
    /// estimated without being read. Returns `Ok(None)` for unrecognised or
    /// binary files.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Access`] if a recognised file cannot be read.
    pub fn classify(&self, path: &Path, size: u64) -> Result<Option<(&'static str, u64)>> {
        let Some(language) = Self::language_of(path) else {
            return Ok(None);
        };

        if size > self.large_file_threshold {
            return Ok(Some((language, size / AVERAGE_LINE_LENGTH)));
        }

        let bytes = fs::read(path).map_err(|e| IndexError::access(path, e))?;
        if is_binary(&bytes) {
            return Ok(None);
        }

        Ok(Some((language, count_lines(&bytes))))
    }
}

/// Count lines: every `\n`, plus a final line without a terminator.
#[must_use]
pub fn count_lines(bytes: &[u8]) -> u64 {
    let newlines = bytes.iter().filter(|&&b| b == b'\n').count() as u64;
    let unterminated = u64::from(bytes.last().is_some_and(|&b| b != b'\n'));
    newlines + unterminated
}

fn is_binary(bytes: &[u8]) -> bool {
    bytes.iter().take(BINARY_SNIFF_LEN).any(|&b| b == 0)
}

/// Per-project accumulator for language line counts.
#[derive(Debug, Default)]
pub struct LanguageTally {
    counts: LanguageMap,
}

impl LanguageTally {
    pub fn add(&mut self, language: &str, lines: u64) {
        *self.counts.entry(language.to_string()).or_insert(0) += lines;
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    #[must_use]
    pub fn into_map(self) -> LanguageMap {
        self.counts
    }
}
