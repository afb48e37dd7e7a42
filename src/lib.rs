//! # cull
//!
//! Finds the `node_modules/` and `vendor/` directories of JavaScript and PHP
//! projects under a root directory, measures how much disk space they use and
//! deletes the ones you pick.
//!
//! The engine has three parts:
//!
//! - [`scanner`] walks the tree breadth-first and records dependency
//!   directories found directly inside project roots, without descending into
//!   projects or following symbolic links.
//! - [`sizer`] measures directory sizes with the platform's own disk-usage tool
//!   when it is available and a parallel in-process walk otherwise.
//! - [`deleter`] removes directories in batches of external commands and
//!   checks on disk which ones are actually gone.
//!
//! Both the sizer and the deleter run their commands through the bounded
//! [`pool::WorkerPool`].
//!
//! ```no_run
//! let found = cull::scan(std::path::Path::new("."));
//! let paths: Vec<_> = found.entries.iter().map(|e| e.path.clone()).collect();
//! let sizes = cull::estimate_sizes(&paths);
//! let outcomes = cull::delete_paths(&paths, |_| {});
//! # let _ = (sizes, outcomes);
//! ```

pub mod cleaner;
pub mod config;
pub mod deleter;
pub mod dependency;
pub mod output;
pub mod platform;
pub mod pool;
pub mod scanner;
pub mod sizer;

use std::path::{Path, PathBuf};

pub use cleaner::{CleanResult, Cleaner};
pub use config::{ExecutionOptions, FileConfig};
pub use deleter::{Deleter, DeletionOutcome};
pub use dependency::{DependencyEntries, DependencyEntry, DependencyKind};
pub use pool::WorkerPool;
pub use scanner::{ScanResult, Scanner};
pub use sizer::{SizeEstimator, SizeTable};

/// Find every dependency directory under `root`.
///
/// A missing or unreadable root yields an empty result.
#[must_use]
pub fn scan(root: &Path) -> ScanResult {
    Scanner::new().scan(root)
}

/// Measure the disk usage of `paths` in bytes with the best strategy this
/// host supports.
///
/// Paths that could not be measured are absent from the table.
#[must_use]
pub fn estimate_sizes(paths: &[PathBuf]) -> SizeTable {
    SizeEstimator::default().compute(paths)
}

/// Delete `paths`, calling `on_progress` once per path as its batch finishes.
///
/// Returns one outcome per path, in input order.
pub fn delete_paths<F>(paths: &[PathBuf], on_progress: F) -> Vec<DeletionOutcome>
where
    F: FnMut(&Path),
{
    Deleter::default().delete_paths(paths, on_progress)
}
