//! Disk-usage measurement for dependency directories.
//!
//! Sizes are measured by one of two tiers implementing [`SizeStrategy`]:
//!
//! - a **fast** strategy that shells out to the platform's own tool
//!   ([`DiskUsage`] on POSIX, [`PowerShellSize`] on Windows) through the
//!   bounded [`WorkerPool`](crate::pool::WorkerPool);
//! - a **safe** strategy, [`TreeWalk`], that walks the trees in-process.
//!
//! [`SizeEstimator::detect`] checks the fast tool once and only uses it if it
//! answers correctly. If the fast strategy still fails outright, the estimator
//! falls back to the safe one for that call, so [`SizeEstimator::compute`]
//! never fails.

pub mod du;
pub mod powershell;
pub mod walk;

use std::{
    collections::HashMap,
    env, fmt, fs,
    path::{Path, PathBuf},
    process,
    sync::atomic::{AtomicUsize, Ordering},
};

use anyhow::Result;
use tracing::{debug, warn};

pub use du::DiskUsage;
pub use powershell::PowerShellSize;
pub use walk::{TreeWalk, calculate_dir_size};

use crate::{platform, pool::WorkerPool};

/// Measured sizes in bytes, keyed by the requested path.
///
/// A path whose measurement failed is absent; callers should treat that as
/// "unknown" (usually displayed as zero), not as an error.
pub type SizeTable = HashMap<PathBuf, u64>;

/// A way of measuring the disk usage of a set of directories.
pub trait SizeStrategy {
    /// Short name used in log messages.
    fn name(&self) -> &'static str;

    /// Measure every path in `paths`.
    ///
    /// Individual paths that cannot be measured may be left out of the table.
    ///
    /// # Errors
    ///
    /// Returns an error only when the strategy as a whole could not run
    /// (for example, its external tool is missing).
    fn measure(&mut self, paths: &[PathBuf]) -> Result<SizeTable>;
}

/// Computes sizes with a fast strategy and an in-process fallback.
pub struct SizeEstimator {
    primary: Box<dyn SizeStrategy>,
    fallback: TreeWalk,
}

impl fmt::Debug for SizeEstimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SizeEstimator")
            .field("primary", &self.primary.name())
            .finish_non_exhaustive()
    }
}

impl SizeEstimator {
    /// Pick the best strategy available on this host.
    ///
    /// The platform tool is tried on a trivial input first; if it is missing
    /// or misbehaves, [`TreeWalk`] is used for every measurement.
    #[must_use]
    pub fn detect(pool: WorkerPool) -> Self {
        let primary: Box<dyn SizeStrategy> = if platform::is_windows_family() {
            if PowerShellSize::is_available() {
                Box::new(PowerShellSize::new(pool))
            } else {
                Box::new(TreeWalk)
            }
        } else if DiskUsage::is_available() {
            Box::new(DiskUsage::new(pool))
        } else {
            Box::new(TreeWalk)
        };

        debug!("measuring sizes with {}", primary.name());
        Self::with_strategy(primary)
    }

    /// Use `primary` for measurements, falling back to [`TreeWalk`].
    #[must_use]
    pub fn with_strategy(primary: Box<dyn SizeStrategy>) -> Self {
        Self {
            primary,
            fallback: TreeWalk,
        }
    }

    /// Name of the strategy tried first.
    #[must_use]
    pub fn strategy_name(&self) -> &'static str {
        self.primary.name()
    }

    /// Measure the disk usage of `paths`, in bytes.
    ///
    /// Never fails. An empty input returns an empty table without launching
    /// anything.
    pub fn compute(&mut self, paths: &[PathBuf]) -> SizeTable {
        if paths.is_empty() {
            return SizeTable::new();
        }

        match self.primary.measure(paths) {
            Ok(table) => table,
            Err(e) => {
                warn!(
                    "{} failed ({e}); falling back to {}",
                    self.primary.name(),
                    self.fallback.name()
                );
                self.fallback.measure(paths).unwrap_or_default()
            }
        }
    }
}

impl Default for SizeEstimator {
    fn default() -> Self {
        Self::detect(WorkerPool::for_host())
    }
}

/// Run `check` against a freshly created, empty directory.
///
/// The directory lives under the system temp dir and is removed afterwards.
/// Returns `false` if it cannot be created.
pub(crate) fn with_scratch_dir(check: impl FnOnce(&Path) -> bool) -> bool {
    static NEXT: AtomicUsize = AtomicUsize::new(0);

    let dir = env::temp_dir().join(format!(
        "cull-scratch-{}-{}",
        process::id(),
        NEXT.fetch_add(1, Ordering::Relaxed)
    ));

    if let Err(e) = fs::create_dir(&dir) {
        debug!("cannot create scratch directory {}: {e}", dir.display());
        return false;
    }

    let passed = check(&dir);

    if let Err(e) = fs::remove_dir_all(&dir) {
        debug!("cannot remove scratch directory {}: {e}", dir.display());
    }

    passed
}
