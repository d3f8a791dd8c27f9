//! Configuration for the indexing engine and its command-line front end.
//!
//! - [`Config`] - the registered root directories (persisted by the engine)
//! - [`ScanOptions`] - how roots are walked and how reloads behave
//! - [`FileConfig`] - user settings loaded from `config.toml`
//! - [`ProjectFilter`] / [`SortOptions`] - how listings are filtered and ordered

pub mod file;
pub mod filter;
pub mod roots;
pub mod scan;

pub use file::FileConfig;
pub use filter::{FilterOptions, ProjectFilter, SortCriteria, SortOptions};
pub use roots::Config;
pub use scan::{ReloadPolicy, ScanOptions};
