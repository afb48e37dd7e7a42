//! In-process size measurement.
//!
//! The safe strategy: walk each tree directly and add up file lengths. Slower
//! than the platform tools, but needs nothing outside this process.

use std::path::{Path, PathBuf};

use anyhow::Result;
use rayon::prelude::*;
use walkdir::WalkDir;

use super::{SizeStrategy, SizeTable};

/// Measures directories by walking them with `walkdir`.
///
/// Every requested path gets a key in the result, `0` if it could not be read.
/// Paths are measured in parallel.
#[derive(Clone, Copy, Debug, Default)]
pub struct TreeWalk;

impl SizeStrategy for TreeWalk {
    fn name(&self) -> &'static str {
        "tree walk"
    }

    fn measure(&mut self, paths: &[PathBuf]) -> Result<SizeTable> {
        Ok(paths
            .par_iter()
            .map(|path| (path.clone(), calculate_dir_size(path)))
            .collect())
    }
}

/// Calculate the total size of a directory and all its contents, in bytes.
///
/// Visits the directory before its contents and never follows symbolic
/// links; links themselves are not counted. Entries that fail to read
/// (permission denied, removed mid-walk) are skipped, so the function always
/// returns whatever it managed to add up.
///
/// Returns `0` if the path does not exist or cannot be traversed at the root level.
#[must_use]
pub fn calculate_dir_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .follow_links(false)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.metadata().ok())
        .map(|metadata| metadata.len())
        .sum()
}

/// Measure in-process every directory in `paths` that `table` has no size for.
///
/// Used by the fast strategies for batches whose command produced nothing
/// usable. Paths that are not directories stay absent.
pub(crate) fn fill_missing(table: &mut SizeTable, paths: &[PathBuf]) {
    let missing: Vec<&PathBuf> = paths
        .iter()
        .filter(|p| !table.contains_key(*p) && p.is_dir())
        .collect();

    let measured: Vec<(PathBuf, u64)> = missing
        .par_iter()
        .map(|path| ((*path).clone(), calculate_dir_size(path)))
        .collect();

    table.extend(measured);
}
