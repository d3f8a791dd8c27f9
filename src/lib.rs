//! # project-index
//!
//! Discovers software projects under a set of registered root directories
//! and keeps an index of each project's type, language breakdown and git
//! remotes fresh.
//!
//! The [`Engine`] is the entry point: register roots with
//! [`Engine::add_config_directory`], build the index with [`Engine::re_index`]
//! (or refresh part of it with [`Engine::reload_index`]) and read it back with
//! [`Engine::get_projects`] or rank it with [`Engine::search`]. Only one indexing pass runs at a time; a second
//! request fails fast with [`IndexError::Busy`].
//!
//! ```no_run
//! use std::path::Path;
//! use project_index::{Engine, config::ScanOptions};
//!
//! let engine = Engine::open("/tmp/project-index", &ScanOptions::default());
//! engine.add_config_directory(Path::new("/home/me/code"))?;
//! let report = engine.re_index()?;
//! println!("indexed {} projects", report.total_projects());
//! # Ok::<(), project_index::IndexError>(())
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod filtering;
pub mod git;
pub mod indexer;
pub mod language;
pub mod output;
pub mod project;
pub mod scheduler;
pub mod search;
pub mod store;
pub mod utils;
pub mod walker;

pub use config::{Config, FilterOptions, ProjectFilter, ReloadPolicy, ScanOptions, SortOptions};
pub use engine::Engine;
pub use error::{IndexError, Result};
pub use project::{Project, ProjectType, Projects};
pub use scheduler::{RootReport, ScanReport};
pub use search::SearchHit;
