//! Name and description extraction from project manifests.
//!
//! Every extractor is best-effort: an unreadable or malformed manifest simply
//! yields empty metadata and the project falls back to its directory name.

use std::{fs, path::Path};

use serde_json::Value;
use toml::Table;

use super::ProjectType;

/// Metadata declared by a project's manifest.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ManifestInfo {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl ManifestInfo {
    /// Read the manifest matching `kind` from `root`.
    #[must_use]
    pub fn read(root: &Path, kind: ProjectType) -> Self {
        match kind {
            ProjectType::Rust => read_with(&root.join("Cargo.toml"), from_cargo_toml),
            ProjectType::Flutter => read_with(&root.join("pubspec.yaml"), from_pubspec),
            ProjectType::NextJs
            | ProjectType::React
            | ProjectType::Vue
            | ProjectType::Angular
            | ProjectType::Node => read_with(&root.join("package.json"), from_package_json),
            ProjectType::Svelte => {
                // Svelte may be detected from loose `.svelte` files without a package.json.
                read_with(&root.join("package.json"), from_package_json)
            }
            ProjectType::Python => read_with(&root.join("pyproject.toml"), from_pyproject),
            ProjectType::Ruby => find_gemspec(root)
                .map(|gemspec| read_with(&gemspec, from_gemspec))
                .unwrap_or_default(),
            ProjectType::Unknown => Self::default(),
        }
    }
}

fn read_with(path: &Path, parse: fn(&str) -> ManifestInfo) -> ManifestInfo {
    fs::read_to_string(path)
        .map(|content| parse(&content))
        .unwrap_or_default()
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// `[package] name` and `description` from `Cargo.toml`.
fn from_cargo_toml(content: &str) -> ManifestInfo {
    let Ok(table) = content.parse::<Table>() else {
        return ManifestInfo::default();
    };

    let package = table.get("package");
    let field = |key: &str| non_empty(package.and_then(|p| p.get(key)).and_then(|v| v.as_str()));

    ManifestInfo {
        name: field("name"),
        description: field("description"),
    }
}

/// `[project]` (PEP 621) or `[tool.poetry]` name and description from `pyproject.toml`.
fn from_pyproject(content: &str) -> ManifestInfo {
    let Ok(table) = content.parse::<Table>() else {
        return ManifestInfo::default();
    };

    let section = table.get("project").or_else(|| {
        table
            .get("tool")
            .and_then(|tool| tool.get("poetry"))
    });
    let field = |key: &str| non_empty(section.and_then(|s| s.get(key)).and_then(|v| v.as_str()));

    ManifestInfo {
        name: field("name"),
        description: field("description"),
    }
}

/// `name` and `description` from `package.json`.
fn from_package_json(content: &str) -> ManifestInfo {
    let Ok(json) = serde_json::from_str::<Value>(content) else {
        return ManifestInfo::default();
    };

    ManifestInfo {
        name: non_empty(json.get("name").and_then(Value::as_str)),
        description: non_empty(json.get("description").and_then(Value::as_str)),
    }
}

/// Top-level `name` and `description` from `pubspec.yaml`.
fn from_pubspec(content: &str) -> ManifestInfo {
    let Ok(yaml) = serde_yaml::from_str::<serde_yaml::Value>(content) else {
        return ManifestInfo::default();
    };

    let field = |key: &str| non_empty(yaml.get(key).and_then(serde_yaml::Value::as_str));

    ManifestInfo {
        name: field("name"),
        description: field("description"),
    }
}

/// `spec.name = "..."` and `spec.summary`/`spec.description` from a gemspec.
fn from_gemspec(content: &str) -> ManifestInfo {
    let assignment = |attribute: &str| {
        content.lines().map(str::trim).find_map(|line| {
            let (lhs, rhs) = line.split_once('=')?;
            let lhs = lhs.trim();
            lhs.rsplit_once('.')
                .filter(|(_, attr)| *attr == attribute)
                .and_then(|_| extract_quoted_value(rhs))
        })
    };

    ManifestInfo {
        name: assignment("name"),
        description: assignment("summary").or_else(|| assignment("description")),
    }
}

fn find_gemspec(root: &Path) -> Option<std::path::PathBuf> {
    let mut gemspecs: Vec<_> = fs::read_dir(root)
        .ok()?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "gemspec"))
        .collect();
    gemspecs.sort();
    gemspecs.into_iter().next()
}

/// Extract the text between the first and last quote (single or double).
fn extract_quoted_value(text: &str) -> Option<String> {
    let quote = text.chars().find(|c| *c == '"' || *c == '\'')?;
    let start = text.find(quote)?;
    let end = text.rfind(quote)?;

    if start == end {
        return None;
    }

    non_empty(Some(&text[start + 1..end]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_cargo_toml_name_and_description() {
        let info = from_cargo_toml(
            "[package]\nname = \"indexer\"\ndescription = \"Finds projects\"\nversion = \"0.1.0\"\n",
        );
        assert_eq!(info.name.as_deref(), Some("indexer"));
        assert_eq!(info.description.as_deref(), Some("Finds projects"));
    }

    #[test]
    fn test_cargo_workspace_without_package() {
        let info = from_cargo_toml("[workspace]\nmembers = [\"a\"]\n");
        assert_eq!(info, ManifestInfo::default());
    }

    #[test]
    fn test_malformed_toml_is_empty() {
        assert_eq!(from_cargo_toml("[package\nname ="), ManifestInfo::default());
    }

    #[test]
    fn test_package_json() {
        let info = from_package_json(r#"{"name": "web", "description": "  Site  "}"#);
        assert_eq!(info.name.as_deref(), Some("web"));
        assert_eq!(info.description.as_deref(), Some("Site"));

        let empty = from_package_json(r#"{"name": "", "description": 3}"#);
        assert_eq!(empty, ManifestInfo::default());
    }

    #[test]
    fn test_pubspec() {
        let info = from_pubspec(
            "name: bp_monitor\ndescription: \"A new Flutter project.\"\nenvironment:\n  name: nested\n",
        );
        assert_eq!(info.name.as_deref(), Some("bp_monitor"));
        assert_eq!(info.description.as_deref(), Some("A new Flutter project."));
    }

    #[test]
    fn test_pubspec_ignores_prefix_keys() {
        let info = from_pubspec("names: wrong\nname: right\n");
        assert_eq!(info.name.as_deref(), Some("right"));
    }

    #[test]
    fn test_pubspec_comments_and_block_scalars() {
        let info = from_pubspec(
            "name: my_app # the app\ndescription: >-\n  A folded\n  description\nversion: 1.0.0+1\n",
        );
        assert_eq!(info.name.as_deref(), Some("my_app"));
        assert_eq!(info.description.as_deref(), Some("A folded description"));
    }

    #[test]
    fn test_malformed_pubspec_is_empty() {
        assert_eq!(from_pubspec("name: [unclosed\n"), ManifestInfo::default());
        assert_eq!(from_pubspec("- just\n- a list\n"), ManifestInfo::default());
    }

    #[test]
    fn test_pyproject_pep621_and_poetry() {
        let pep = from_pyproject("[project]\nname = \"tool\"\ndescription = \"CLI\"\n");
        assert_eq!(pep.name.as_deref(), Some("tool"));
        assert_eq!(pep.description.as_deref(), Some("CLI"));

        let poetry = from_pyproject("[tool.poetry]\nname = \"app\"\n");
        assert_eq!(poetry.name.as_deref(), Some("app"));
        assert_eq!(poetry.description, None);
    }

    #[test]
    fn test_gemspec() {
        let info = from_gemspec(
            "Gem::Specification.new do |spec|\n  spec.name = \"shiny\"\n  spec.summary = 'Makes things shiny'\nend\n",
        );
        assert_eq!(info.name.as_deref(), Some("shiny"));
        assert_eq!(info.description.as_deref(), Some("Makes things shiny"));
    }

    #[test]
    fn test_extract_quoted_value() {
        assert_eq!(
            extract_quoted_value(r#" "my-project""#),
            Some("my-project".to_string())
        );
        assert_eq!(extract_quoted_value("no quotes here"), None);
        assert_eq!(extract_quoted_value(r#"only "one"#), None);
    }

    #[test]
    fn test_read_uses_manifest_for_kind() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("package.json"),
            r#"{"name": "site", "dependencies": {"next": "14"}}"#,
        )
        .unwrap();

        let info = ManifestInfo::read(tmp.path(), ProjectType::NextJs);
        assert_eq!(info.name.as_deref(), Some("site"));

        // A missing manifest degrades to empty metadata.
        assert_eq!(
            ManifestInfo::read(tmp.path(), ProjectType::Rust),
            ManifestInfo::default()
        );
    }
}
