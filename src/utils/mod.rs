//! Utility functions and helpers.
//!
//! This module contains small helpers used throughout the crate, such as
//! size parsing and formatting.

pub mod size;

pub use size::{format_bytes, parse_size};
