//! Structured JSON output for scripting and piping.
//!
//! This module provides serializable data structures that represent the
//! complete output of a listing or cleanup run. When the `--json` flag
//! is passed, these structures are serialized to stdout as a single JSON
//! object, replacing all human-readable output.

use std::{collections::BTreeMap, path::Path};

use humansize::{BINARY, format_size};
use serde::Serialize;

use crate::{
    cleaner::CleanResult,
    dependency::{DependencyEntry, DependencyKind},
};

/// Top-level JSON output emitted when `--json` is active.
#[derive(Serialize)]
pub struct JsonOutput {
    /// The execution mode: `"listing"` or `"cleanup"`.
    pub mode: String,

    /// Absolute path of the scanned directory.
    pub root: String,

    /// Number of directories the scanner visited.
    pub visited: usize,

    /// Dependency directories that were found, largest first.
    pub entries: Vec<JsonEntry>,

    /// Aggregated summary statistics.
    pub summary: JsonSummary,

    /// Cleanup results. Present only when directories were deleted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleanup: Option<JsonCleanupResult>,
}

/// A single dependency directory in the JSON output.
#[derive(Serialize)]
pub struct JsonEntry {
    /// `"node_modules"` or `"vendor"`.
    #[serde(rename = "type")]
    pub kind: DependencyKind,

    /// Absolute path to the directory.
    pub path: String,

    /// Path relative to the scanned directory.
    pub relative_path: String,

    /// Measured size in bytes (`0` when sizes were skipped).
    pub size: u64,

    /// Human-readable formatted size (e.g. `"1.23 GiB"`).
    pub size_formatted: String,
}

/// Aggregated summary across all entries.
#[derive(Serialize)]
pub struct JsonSummary {
    /// Total number of dependency directories.
    pub total_entries: usize,

    /// Total reclaimable size in bytes.
    pub total_size: u64,

    /// Human-readable formatted total size.
    pub total_size_formatted: String,

    /// Per-kind breakdown keyed by directory name.
    pub by_kind: BTreeMap<String, JsonKindSummary>,
}

/// Per-kind count and size.
#[derive(Serialize)]
pub struct JsonKindSummary {
    pub count: usize,
    pub size: u64,
    pub size_formatted: String,
}

/// Results of a cleanup run.
#[derive(Serialize)]
pub struct JsonCleanupResult {
    /// Number of directories that are gone.
    pub deleted_count: usize,

    /// Number of directories still on disk.
    pub failure_count: usize,

    /// Bytes freed, summed from the measured sizes of deleted directories.
    pub total_freed: u64,

    /// Human-readable formatted freed size.
    pub total_freed_formatted: String,

    /// Bytes that would have been freed had every deletion succeeded.
    pub planned_size: u64,

    /// One record per directory that could not be deleted.
    pub errors: Vec<JsonDeletionError>,
}

/// A directory that survived deletion.
#[derive(Serialize)]
pub struct JsonDeletionError {
    pub path: String,
    pub error: String,
}

impl JsonOutput {
    /// Build the document printed by `--json` without `--yes`.
    #[must_use]
    pub fn listing(root: &Path, visited: usize, entries: &[DependencyEntry]) -> Self {
        Self {
            mode: "listing".to_string(),
            root: root.display().to_string(),
            visited,
            entries: entries.iter().map(JsonEntry::from_entry).collect(),
            summary: JsonSummary::from_entries(entries),
            cleanup: None,
        }
    }

    /// Build the document printed by `--json --yes` after deleting `entries`.
    #[must_use]
    pub fn cleanup(
        root: &Path,
        visited: usize,
        entries: &[DependencyEntry],
        result: &CleanResult,
    ) -> Self {
        Self {
            mode: "cleanup".to_string(),
            cleanup: Some(JsonCleanupResult::from_clean_result(result)),
            ..Self::listing(root, visited, entries)
        }
    }
}

impl JsonEntry {
    /// Convert a `DependencyEntry` into a `JsonEntry`.
    #[must_use]
    pub fn from_entry(entry: &DependencyEntry) -> Self {
        Self {
            kind: entry.kind,
            path: entry.path.display().to_string(),
            relative_path: entry.relative_path.display().to_string(),
            size: entry.size,
            size_formatted: format_size(entry.size, BINARY),
        }
    }
}

impl JsonSummary {
    /// Compute summary statistics from a slice of entries.
    #[must_use]
    pub fn from_entries(entries: &[DependencyEntry]) -> Self {
        let mut by_kind: BTreeMap<String, (usize, u64)> = BTreeMap::new();

        for entry in entries {
            let totals = by_kind.entry(entry.kind.to_string()).or_insert((0, 0));
            totals.0 += 1;
            totals.1 += entry.size;
        }

        let total_size: u64 = entries.iter().map(|e| e.size).sum();

        Self {
            total_entries: entries.len(),
            total_size,
            total_size_formatted: format_size(total_size, BINARY),
            by_kind: by_kind
                .into_iter()
                .map(|(k, (count, size))| {
                    (
                        k,
                        JsonKindSummary {
                            count,
                            size,
                            size_formatted: format_size(size, BINARY),
                        },
                    )
                })
                .collect(),
        }
    }
}

impl JsonCleanupResult {
    /// Convert a `CleanResult` into a `JsonCleanupResult`.
    #[must_use]
    pub fn from_clean_result(result: &CleanResult) -> Self {
        Self {
            deleted_count: result.deleted_count,
            failure_count: result.failures.len(),
            total_freed: result.total_freed,
            total_freed_formatted: format_size(result.total_freed, BINARY),
            planned_size: result.planned_size,
            errors: result
                .failures
                .iter()
                .map(|f| JsonDeletionError {
                    path: f.path.display().to_string(),
                    error: f.error.clone().unwrap_or_default(),
                })
                .collect(),
        }
    }
}
