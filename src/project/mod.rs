//! Project records, classification and manifest metadata.
//!
//! ## Main Parts
//!
//! - [`Project`] - One indexed project root with its language breakdown
//! - [`Projects`] - An ordered collection of projects with summary reporting
//! - [`ProjectType`] - The closed set of recognised project kinds
//! - [`ProjectTypeDetector`] - Ordered manifest rules that pick a [`ProjectType`]
//! - [`ManifestInfo`] - Name and description declared by a manifest

pub mod detector;
pub mod manifest;
#[allow(clippy::module_inception)]
// This is acceptable as it is the main module for project management
pub mod project;
pub mod projects;

pub use detector::{ProjectTypeDetector, RootListing};
pub use manifest::ManifestInfo;
pub use project::{Project, ProjectType};
pub use projects::Projects;
