//! Dependency-directory data model.
//!
//! ## Main Parts
//!
//! - [`DependencyEntry`] - A `node_modules/` or `vendor/` directory found in a project root
//! - [`DependencyKind`] - Which of the two fixed directory names an entry has
//! - [`DependencyEntries`] - An ordered collection with sizing, sorting and selection helpers

pub mod entries;
pub mod entry;

pub use entries::DependencyEntries;
pub use entry::{DependencyEntry, DependencyKind, MANIFEST_FILES};
