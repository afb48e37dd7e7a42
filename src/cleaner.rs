//! Dependency directory cleanup.
//!
//! This module drives the [`Deleter`] over a user's selection, shows a
//! progress bar while the batches run and folds the per-path outcomes into a
//! [`CleanResult`] that either the human summary or the JSON output renders.

use std::io::{self, Write};

use colored::Colorize;
use humansize::{BINARY, format_size};
use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    deleter::{Deleter, DeletionOutcome},
    dependency::DependencyEntry,
    pool::{JobRunner, WorkerPool},
};

/// Structured result returned after a cleanup operation.
///
/// Contains all the data needed to render either human-readable or JSON output.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CleanResult {
    /// Number of directories that are gone.
    pub deleted_count: usize,

    /// Sum of the measured sizes of the directories that are gone.
    pub total_freed: u64,

    /// Sum of the measured sizes of every selected directory.
    pub planned_size: u64,

    /// Outcomes for the directories still on disk.
    pub failures: Vec<DeletionOutcome>,
}

impl CleanResult {
    /// Fold the deleter's outcomes back onto the entries they were made for.
    ///
    /// `outcomes` must be in the same order as `entries`, which is what
    /// [`Deleter::delete_paths`] returns.
    #[must_use]
    pub fn from_outcomes(entries: &[DependencyEntry], outcomes: Vec<DeletionOutcome>) -> Self {
        let mut result = Self {
            planned_size: entries.iter().map(|e| e.size).sum(),
            ..Self::default()
        };

        for (entry, outcome) in entries.iter().zip(outcomes) {
            if outcome.is_deleted() {
                result.deleted_count += 1;
                result.total_freed += entry.size;
            } else {
                result.failures.push(outcome);
            }
        }

        result
    }

    /// Whether any selected directory is still on disk.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Removes selected dependency directories.
#[derive(Debug)]
pub struct Cleaner;

impl Cleaner {
    /// Delete the directories of `entries` with this host's removal command.
    ///
    /// When `quiet` is set no progress bar or messages are printed; this is
    /// what `--json` uses so that only the final document reaches stdout.
    #[must_use]
    pub fn clean_entries(
        entries: &[DependencyEntry],
        pool: WorkerPool,
        quiet: bool,
    ) -> CleanResult {
        Self::clean_with(&mut Deleter::new(pool), entries, quiet)
    }

    /// Delete the directories of `entries` through an existing deleter.
    pub fn clean_with<R: JobRunner>(
        deleter: &mut Deleter<R>,
        entries: &[DependencyEntry],
        quiet: bool,
    ) -> CleanResult {
        let progress = if quiet {
            ProgressBar::hidden()
        } else {
            println!("\n{}", "🧹 Starting cleanup...".cyan());

            let pb = ProgressBar::new(entries.len() as u64);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            {
                pb.set_style(style.progress_chars("█▉▊▋▌▍▎▏  "));
            }
            pb
        };

        let paths: Vec<_> = entries.iter().map(|e| e.path.clone()).collect();
        let outcomes = deleter.delete_paths(&paths, |path| {
            progress.set_message(
                path.parent()
                    .and_then(|p| p.file_name())
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            );
            progress.inc(1);
        });

        progress.finish_with_message("✅ Cleanup complete");

        CleanResult::from_outcomes(entries, outcomes)
    }

    /// Print a human-readable cleanup summary to stdout.
    ///
    /// This is called from `main` when `--json` is **not** active.
    ///
    /// # Errors
    ///
    /// Returns an error if stdout cannot be written to.
    pub fn print_summary(result: &CleanResult) -> io::Result<()> {
        Self::write_summary(&mut io::stdout().lock(), result)
    }

    /// Write the cleanup summary, failures included, to `out`.
    ///
    /// # Errors
    ///
    /// Returns any error from writing to `out`.
    pub fn write_summary(out: &mut impl Write, result: &CleanResult) -> io::Result<()> {
        if result.has_failures() {
            writeln!(out, "\n{}", "⚠️  Some directories could not be deleted:".yellow())?;
            for failure in &result.failures {
                writeln!(
                    out,
                    "  {} {}",
                    failure.path.display().to_string().red(),
                    failure.error.as_deref().unwrap_or_default()
                )?;
            }
        }

        writeln!(out, "\n{}", "📊 Cleanup Summary:".bold())?;
        writeln!(
            out,
            "  ✅ Deleted: {} directories",
            result.deleted_count.to_string().green()
        )?;

        if result.has_failures() {
            writeln!(
                out,
                "  ❌ Failed: {} directories",
                result.failures.len().to_string().red()
            )?;
        }

        writeln!(
            out,
            "  💾 Freed: {} (planned: {})",
            format_size(result.total_freed, BINARY).bright_green().bold(),
            format_size(result.planned_size, BINARY)
        )
    }
}

#[cfg(test)]
mod tests {
    use std::{
        fs,
        path::{Path, PathBuf},
    };

    use tempfile::TempDir;

    use super::*;
    use crate::{
        dependency::DependencyKind,
        pool::testing::{FakeRunner, ok_output},
    };

    fn entry(root: &Path, project: &str, size: u64) -> DependencyEntry {
        let path = root.join(project).join("node_modules");
        fs::create_dir_all(path.join("pkg")).unwrap();
        let mut entry = DependencyEntry::new(
            path,
            PathBuf::from(project).join("node_modules"),
            DependencyKind::NodeModules,
        );
        entry.size = size;
        entry
    }

    #[test]
    fn test_from_outcomes_counts_only_deleted_sizes() {
        let sized = |path: &str, kind, size| DependencyEntry {
            size,
            ..DependencyEntry::new(path.into(), path.trim_start_matches('/').into(), kind)
        };
        let entries = vec![
            sized("/a/node_modules", DependencyKind::NodeModules, 100),
            sized("/b/vendor", DependencyKind::Vendor, 40),
        ];
        let outcomes = vec![
            DeletionOutcome {
                path: "/a/node_modules".into(),
                error: None,
            },
            DeletionOutcome {
                path: "/b/vendor".into(),
                error: Some("Failed to delete (exit status 1)".to_string()),
            },
        ];

        let result = CleanResult::from_outcomes(&entries, outcomes);

        assert_eq!(result.deleted_count, 1);
        assert_eq!(result.total_freed, 100);
        assert_eq!(result.planned_size, 140);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].path, PathBuf::from("/b/vendor"));
        assert!(result.has_failures());
    }

    #[test]
    fn test_clean_with_fake_removal() {
        let tmp = TempDir::new().unwrap();
        let entries = vec![entry(tmp.path(), "web", 2048), entry(tmp.path(), "api", 1024)];

        let mut deleter = Deleter::with_runner(
            WorkerPool::new(2),
            FakeRunner::new(|batch: &[PathBuf]| {
                for p in batch {
                    fs::remove_dir_all(p).unwrap();
                }
                ok_output("")
            }),
        );

        let result = Cleaner::clean_with(&mut deleter, &entries, true);

        assert_eq!(result.deleted_count, 2);
        assert_eq!(result.total_freed, 3072);
        assert_eq!(result.planned_size, 3072);
        assert!(!result.has_failures());
        assert!(entries.iter().all(|e| !e.path.exists()));
    }

    #[test]
    fn test_summary_lists_failures_under_their_heading() {
        let result = CleanResult {
            deleted_count: 1,
            total_freed: 1024,
            planned_size: 3072,
            failures: vec![DeletionOutcome {
                path: "/locked/vendor".into(),
                error: Some("Failed to delete (exit status 1)".to_string()),
            }],
        };

        let mut out = Vec::new();
        Cleaner::write_summary(&mut out, &result).unwrap();
        let text = String::from_utf8(out).unwrap();

        let heading = text.find("could not be deleted").unwrap();
        let failure = text.find("/locked/vendor").unwrap();
        let summary = text.find("Cleanup Summary").unwrap();
        assert!(heading < failure && failure < summary);
        assert!(text.contains("Failed to delete (exit status 1)"));
        assert!(text.contains("(planned: 3 KiB)"));
    }

    #[test]
    fn test_summary_without_failures_has_no_failure_section() {
        let result = CleanResult {
            deleted_count: 2,
            ..CleanResult::default()
        };

        let mut out = Vec::new();
        Cleaner::write_summary(&mut out, &result).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(!text.contains("could not be deleted"));
        assert!(!text.contains("Failed:"));
    }

    #[test]
    fn test_clean_nothing() {
        let result = Cleaner::clean_entries(&[], WorkerPool::new(2), true);
        assert_eq!(result, CleanResult::default());
    }

    #[cfg(unix)]
    #[test]
    fn test_clean_entries_with_rm() {
        let tmp = TempDir::new().unwrap();
        let entries = vec![entry(tmp.path(), "web", 10)];

        let result = Cleaner::clean_entries(&entries, WorkerPool::new(2), true);

        assert_eq!(result.deleted_count, 1);
        assert_eq!(result.total_freed, 10);
        assert!(!entries[0].path.exists());
    }
}
