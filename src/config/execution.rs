//! Resolved options for one run.
//!
//! These are the values left after CLI arguments have been layered over the
//! configuration file.

use crate::{platform, pool::WorkerPool};

/// Options that control what a run does.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct ExecutionOptions {
    /// Measure directory sizes before listing them.
    pub measure_sizes: bool,

    /// Select every entry and skip the confirmation prompt.
    pub assume_yes: bool,

    /// Emit a single JSON document instead of human-readable output.
    pub json: bool,

    /// Log engine diagnostics at debug level.
    pub verbose: bool,

    /// Worker-pool bound; `None` means `max(2, cpu_count())`.
    pub jobs: Option<usize>,
}

impl ExecutionOptions {
    /// Number of external commands allowed in flight.
    #[must_use]
    pub fn effective_jobs(&self) -> usize {
        self.jobs
            .filter(|&n| n > 0)
            .unwrap_or_else(platform::default_jobs)
    }

    /// Worker pool sized for these options.
    #[must_use]
    pub fn worker_pool(&self) -> WorkerPool {
        WorkerPool::new(self.effective_jobs())
    }
}
