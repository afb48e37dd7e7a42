//! Core dependency-directory data structures.
//!
//! This module defines the types the scanner produces and the size estimator
//! and deleter consume.

use std::{
    fmt::{Display, Formatter, Result},
    path::PathBuf,
};

use serde::Serialize;

/// Manifest files that mark a directory as a project root.
pub const MANIFEST_FILES: [&str; 2] = ["package.json", "composer.json"];

/// Kind of dependency directory.
///
/// Each kind corresponds to exactly one fixed directory name; there is no
/// way to register additional names.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    /// A `node_modules/` directory (npm, yarn, pnpm).
    NodeModules,

    /// A `vendor/` directory (Composer).
    Vendor,
}

impl DependencyKind {
    /// Every kind, in the order the scanner checks them.
    pub const ALL: [Self; 2] = [Self::NodeModules, Self::Vendor];

    /// The directory name this kind is recognised by.
    #[must_use]
    pub const fn dir_name(self) -> &'static str {
        match self {
            Self::NodeModules => "node_modules",
            Self::Vendor => "vendor",
        }
    }

    /// Look up the kind whose directory name is `name`.
    #[must_use]
    pub fn from_dir_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.dir_name() == name)
    }
}

impl Display for DependencyKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.write_str(self.dir_name())
    }
}

/// A dependency directory found directly inside a project root.
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct DependencyEntry {
    /// Absolute path to the dependency directory.
    pub path: PathBuf,

    /// `path` relative to the scan root.
    pub relative_path: PathBuf,

    /// Which kind of dependency directory this is.
    pub kind: DependencyKind,

    /// Disk usage in bytes; `0` until sizes have been applied.
    pub size: u64,
}

impl DependencyEntry {
    /// Create an entry with a zero size placeholder.
    #[must_use]
    pub const fn new(path: PathBuf, relative_path: PathBuf, kind: DependencyKind) -> Self {
        Self {
            path,
            relative_path,
            kind,
            size: 0,
        }
    }
}

impl Display for DependencyEntry {
    /// Formats as `<kind> • <relative path>`, e.g. `node_modules • app/node_modules`.
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{} • {}", self.kind, self.relative_path.display())
    }
}
