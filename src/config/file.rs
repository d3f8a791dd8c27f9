//! Configuration file support for persistent settings.
//!
//! This module provides support for loading configuration from a TOML file
//! located at `~/.config/project-index/config.toml` (or the platform-specific
//! equivalent). Configuration file values serve as defaults that can be
//! overridden by CLI arguments.
//!
//! # Layering
//!
//! The precedence order is: **CLI argument > config file > hardcoded default**.
//!
//! The registered root directories are *not* stored here: they are managed
//! by the engine itself (see [`Config`](super::Config)) so that `config add`
//! never has to rewrite a hand-edited TOML file.
//!
//! # Example config
//!
//! ```toml
//! state_dir = "~/.local/share/project-index"
//!
//! [listing]
//! project_type = "rust"
//! sort = "name"
//! reverse = false
//!
//! [scanning]
//! threads = 4
//! max_depth = 6
//! ignore = ["tmp", ".cache"]
//! large_file_threshold = "10MB"
//! reload = "fresh"
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use super::{ReloadPolicy, ScanOptions, scan::DEFAULT_LARGE_FILE_THRESHOLD};
use crate::utils::parse_size;

/// Name of the per-user application directory.
pub const APP_DIR: &str = "project-index";

/// Top-level configuration file structure.
///
/// All fields are `Option<T>` so we can detect which values are present in the
/// config file and apply layered configuration (CLI > config file > defaults).
#[derive(Deserialize, Default, Debug)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Directory holding the persisted index and root list
    pub state_dir: Option<PathBuf>,

    /// Listing options
    #[serde(default)]
    pub listing: FileListingConfig,

    /// Scanning options
    #[serde(default)]
    pub scanning: FileScanConfig,
}

/// Listing options from the configuration file.
#[derive(Deserialize, Default, Debug)]
#[serde(deny_unknown_fields)]
pub struct FileListingConfig {
    /// Default project type filter (e.g., `"rust"`, `"nextjs"`, `"all"`)
    pub project_type: Option<String>,

    /// Sort criterion (`"modified"`, `"name"`, `"lines"`, `"type"`)
    pub sort: Option<String>,

    /// Whether to reverse the sort order
    pub reverse: Option<bool>,
}

/// Scanning options from the configuration file.
#[derive(Deserialize, Default, Debug)]
#[serde(deny_unknown_fields)]
pub struct FileScanConfig {
    /// Number of threads for per-root scans
    pub threads: Option<usize>,

    /// Maximum directory depth to scan
    pub max_depth: Option<usize>,

    /// Extra directory names to prune during scanning
    pub ignore: Option<Vec<String>>,

    /// Size above which line counts are estimated (e.g. `"10MB"`)
    pub large_file_threshold: Option<String>,

    /// Reload policy (`"fresh"` or `"full"`)
    pub reload: Option<ReloadPolicy>,
}

/// Expand a leading `~` in a path to the user's home directory.
///
/// Paths that don't start with `~` are returned unchanged.
#[must_use]
pub fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    path.to_path_buf()
}

impl FileConfig {
    /// Returns the path where the configuration file is expected.
    ///
    /// The configuration file is located at `<config_dir>/project-index/config.toml`,
    /// where `<config_dir>` is the platform-specific configuration directory
    /// (e.g., `~/.config` on Linux, `%APPDATA%` on Windows).
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join(APP_DIR).join("config.toml"))
    }

    /// Load configuration from the default config file location.
    ///
    /// If the config file doesn't exist, returns a default (empty) configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> anyhow::Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit path, defaulting when it is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, contains invalid
    /// TOML, or has unexpected fields.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))
    }

    /// The directory holding `index.json` and `roots.json`.
    ///
    /// Falls back to `<data_dir>/project-index`, then to `./.project-index`
    /// on platforms without a data directory.
    #[must_use]
    pub fn state_dir(&self) -> PathBuf {
        if let Some(dir) = &self.state_dir {
            return expand_tilde(dir);
        }

        dirs::data_dir().map_or_else(
            || PathBuf::from(".project-index"),
            |dir| dir.join(APP_DIR),
        )
    }

    /// Build scan options from the `[scanning]` table, applying defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if `large_file_threshold` is not a valid size string.
    pub fn scan_options(&self) -> anyhow::Result<ScanOptions> {
        let scanning = &self.scanning;

        let large_file_threshold = match scanning.large_file_threshold.as_deref() {
            Some(size) => parse_size(size)
                .with_context(|| format!("Invalid large_file_threshold \"{size}\""))?,
            None => DEFAULT_LARGE_FILE_THRESHOLD,
        };

        Ok(ScanOptions {
            threads: scanning.threads.unwrap_or(0),
            max_depth: scanning.max_depth,
            ignore: scanning.ignore.clone().unwrap_or_default(),
            large_file_threshold,
            reload: scanning.reload.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_file_config() {
        let config = FileConfig::default();

        assert!(config.state_dir.is_none());
        assert!(config.listing.project_type.is_none());
        assert!(config.listing.sort.is_none());
        assert!(config.listing.reverse.is_none());
        assert!(config.scanning.threads.is_none());
        assert!(config.scanning.max_depth.is_none());
        assert!(config.scanning.ignore.is_none());
        assert!(config.scanning.large_file_threshold.is_none());
        assert!(config.scanning.reload.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
state_dir = "/var/lib/project-index"

[listing]
project_type = "rust"
sort = "name"
reverse = true

[scanning]
threads = 4
max_depth = 6
ignore = ["tmp", ".cache"]
large_file_threshold = "2MB"
reload = "full"
"#;

        let config: FileConfig = toml::from_str(toml_content).unwrap();

        assert_eq!(
            config.state_dir,
            Some(PathBuf::from("/var/lib/project-index"))
        );
        assert_eq!(config.listing.project_type, Some("rust".to_string()));
        assert_eq!(config.listing.sort, Some("name".to_string()));
        assert_eq!(config.listing.reverse, Some(true));
        assert_eq!(config.scanning.threads, Some(4));
        assert_eq!(config.scanning.max_depth, Some(6));
        assert_eq!(
            config.scanning.ignore,
            Some(vec!["tmp".to_string(), ".cache".to_string()])
        );
        assert_eq!(config.scanning.reload, Some(ReloadPolicy::Full));

        let scan = config.scan_options().unwrap();
        assert_eq!(scan.threads, 4);
        assert_eq!(scan.max_depth, Some(6));
        assert_eq!(scan.large_file_threshold, 2_000_000);
        assert_eq!(scan.reload, ReloadPolicy::Full);
    }

    #[test]
    fn test_parse_empty_config_uses_defaults() {
        let config: FileConfig = toml::from_str("").unwrap();
        let scan = config.scan_options().unwrap();

        assert_eq!(scan.threads, 0);
        assert_eq!(scan.large_file_threshold, DEFAULT_LARGE_FILE_THRESHOLD);
        assert_eq!(scan.reload, ReloadPolicy::Fresh);
    }

    #[test]
    fn test_invalid_threshold_is_an_error() {
        let config: FileConfig =
            toml::from_str("[scanning]\nlarge_file_threshold = \"lots\"\n").unwrap();
        assert!(config.scan_options().is_err());
    }

    #[test]
    fn test_malformed_config_errors() {
        let toml_content = r#"
[scanning]
threads = "not_a_number"
"#;
        assert!(toml::from_str::<FileConfig>(toml_content).is_err());
    }

    #[test]
    fn test_unknown_field_errors() {
        assert!(toml::from_str::<FileConfig>("colour = \"blue\"\n").is_err());
    }

    #[test]
    fn test_load_from_missing_file_returns_defaults() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = FileConfig::load_from(&tmp.path().join("absent.toml")).unwrap();
        assert!(config.state_dir.is_none());
    }

    #[test]
    fn test_load_from_reads_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[scanning]\nmax_depth = 2\n").unwrap();

        let config = FileConfig::load_from(&path).unwrap();
        assert_eq!(config.scanning.max_depth, Some(2));
    }

    #[test]
    fn test_config_path_returns_expected_suffix() {
        if let Some(p) = FileConfig::config_path() {
            assert!(p.ends_with("project-index/config.toml"));
        }
    }

    #[test]
    fn test_state_dir_prefers_configured_value() {
        let config = FileConfig {
            state_dir: Some(PathBuf::from("/srv/index")),
            ..FileConfig::default()
        };
        assert_eq!(config.state_dir(), PathBuf::from("/srv/index"));
    }

    #[test]
    fn test_expand_tilde_with_home() {
        let expanded = expand_tilde(&PathBuf::from("~/Projects"));

        if let Some(home) = dirs::home_dir() {
            assert_eq!(expanded, home.join("Projects"));
        }
    }

    #[test]
    fn test_expand_tilde_no_effect_on_non_tilde() {
        let relative = PathBuf::from("some/relative/path");
        assert_eq!(expand_tilde(&relative), relative);

        let absolute = PathBuf::from("/usr/local/bin");
        assert_eq!(expand_tilde(&absolute), absolute);
    }
}
