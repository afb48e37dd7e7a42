//! Batched deletion of dependency directories.
//!
//! Paths are removed in batches of up to [`DELETE_BATCH_SIZE`] by one external
//! command per batch (`rm -rf` on POSIX, `Remove-Item` on Windows), with the
//! number of concurrent commands bounded by a [`WorkerPool`].
//!
//! The command's exit status is only a hint. Once a batch's command has
//! finished, every path in it is checked on disk: a path that is gone is a
//! success, a path that is still there is reported with an error.

use std::{
    fs, io,
    path::{Path, PathBuf},
    process::Command,
};

use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    platform,
    pool::{CommandBuilder, Completion, JobRunner, ProcessRunner, WorkerPool},
    sizer::powershell::{powershell, ps_literal},
};

/// Maximum number of paths handed to one removal command.
pub const DELETE_BATCH_SIZE: usize = 64;

/// Result of trying to delete one path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DeletionOutcome {
    /// The path that was to be deleted.
    pub path: PathBuf,

    /// Why the path is still on disk; `None` means it is gone.
    pub error: Option<String>,
}

impl DeletionOutcome {
    /// Whether the path no longer exists.
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.error.is_none()
    }
}

/// Build `rm -rf -- <paths>`.
fn rm_command(batch: &[PathBuf]) -> Command {
    let mut cmd = Command::new("rm");
    cmd.args(["-rf", "--"]).args(batch);
    cmd
}

/// Script removing every path in `batch`, ignoring per-item errors.
fn remove_script(batch: &[PathBuf]) -> String {
    let quoted: Vec<String> = batch
        .iter()
        .map(|p| ps_literal(&p.to_string_lossy()))
        .collect();

    format!(
        "$paths=@({}); Remove-Item -LiteralPath $paths -Recurse -Force -ErrorAction SilentlyContinue",
        quoted.join(",")
    )
}

fn powershell_remove_command(batch: &[PathBuf]) -> Command {
    powershell(&remove_script(batch))
}

/// Removal command for this host.
#[must_use]
pub fn host_remove_command() -> CommandBuilder {
    if platform::is_windows_family() {
        powershell_remove_command
    } else {
        rm_command
    }
}

/// Deletes paths in parallel batches of external removal commands.
#[derive(Debug)]
pub struct Deleter<R = ProcessRunner> {
    pool: WorkerPool,
    runner: R,
}

impl Deleter {
    /// Create a deleter using this host's removal command.
    #[must_use]
    pub fn new(pool: WorkerPool) -> Self {
        Self::with_runner(pool, ProcessRunner::new(host_remove_command()))
    }
}

impl Default for Deleter {
    fn default() -> Self {
        Self::new(WorkerPool::for_host())
    }
}

impl<R: JobRunner> Deleter<R> {
    /// Create a deleter that launches its batches through `runner`.
    #[must_use]
    pub const fn with_runner(pool: WorkerPool, runner: R) -> Self {
        Self { pool, runner }
    }

    /// Delete every path in `paths`.
    ///
    /// Returns one [`DeletionOutcome`] per path, in input order. `on_progress`
    /// is called exactly once per path, batch by batch, whether or not the
    /// path was removed. An empty input launches nothing.
    ///
    /// If a batch's command cannot be started at all, that batch is removed
    /// in-process instead.
    pub fn delete_paths<F>(&mut self, paths: &[PathBuf], mut on_progress: F) -> Vec<DeletionOutcome>
    where
        F: FnMut(&Path),
    {
        let mut outcomes = Vec::with_capacity(paths.len());

        self.pool.run(
            &mut self.runner,
            paths.chunks(DELETE_BATCH_SIZE),
            |batch, completion| {
                if let Completion::Failed(e) = &completion {
                    warn!(
                        "removal command unavailable ({e}); deleting {} path(s) in-process",
                        batch.len()
                    );
                    remove_in_process(batch);
                }

                for path in batch {
                    outcomes.push(verify_removed(path, &completion));
                    on_progress(path);
                }
            },
        );

        outcomes
    }
}

/// Remove each directory with `fs::remove_dir_all`, ignoring failures.
fn remove_in_process(batch: &[PathBuf]) {
    for path in batch {
        if let Err(e) = fs::remove_dir_all(path)
            && e.kind() != io::ErrorKind::NotFound
        {
            debug!("failed to remove {}: {e}", path.display());
        }
    }
}

/// Check on disk whether `path` is gone after its batch ran.
fn verify_removed(path: &Path, completion: &Completion) -> DeletionOutcome {
    let still_present = fs::symlink_metadata(path).is_ok();

    let error = still_present.then(|| {
        debug!("{} still present after removal", path.display());
        format!("Failed to delete ({})", completion.describe())
    });

    DeletionOutcome {
        path: path.to_path_buf(),
        error,
    }
}
