//! POSIX fast path: `du`.

use std::{
    path::{Path, PathBuf},
    process::Command,
};

use anyhow::{Result, bail};
use tracing::debug;

use super::{SizeStrategy, SizeTable, walk::fill_missing, with_scratch_dir};
use crate::pool::{Completion, JobRunner, ProcessRunner, WorkerPool};

/// Maximum number of paths handed to one `du` invocation.
pub const DU_BATCH_SIZE: usize = 64;

/// Build `du -s -k -H -x -- <paths>`.
///
/// `-k` reports kibibytes, `-H` follows symlinks named on the command line
/// only, `-x` stays on one filesystem.
fn du_command(batch: &[PathBuf]) -> Command {
    let mut cmd = Command::new("du");
    cmd.args(["-s", "-k", "-H", "-x", "--"]).args(batch);
    cmd
}

/// Measures directories with batched `du` invocations.
#[derive(Debug)]
pub struct DiskUsage<R = ProcessRunner> {
    pool: WorkerPool,
    runner: R,
}

impl DiskUsage {
    /// Create the strategy; at most `pool.limit()` `du` processes run at once.
    #[must_use]
    pub const fn new(pool: WorkerPool) -> Self {
        Self::with_runner(pool, ProcessRunner::new(du_command))
    }

    /// Whether a working `du` is on `PATH`.
    ///
    /// Runs the exact command used for measuring against a fresh empty
    /// directory and requires a parseable line naming that directory.
    #[must_use]
    pub fn is_available() -> bool {
        check_with(&mut ProcessRunner::new(du_command))
    }
}

impl<R: JobRunner> DiskUsage<R> {
    /// Create the strategy with `runner` launching the `du` batches.
    #[must_use]
    pub const fn with_runner(pool: WorkerPool, runner: R) -> Self {
        Self { pool, runner }
    }
}

fn check_with<R: JobRunner>(runner: &mut R) -> bool {
    with_scratch_dir(|dir| {
        let batch = [dir.to_path_buf()];

        match runner.launch(&batch).and_then(|h| runner.wait(h)) {
            Ok(output) if output.success => {
                let mut table = SizeTable::new();
                collect_du_output(&output.stdout, &batch, &mut table) == 1
            }
            Ok(output) => {
                debug!("du check exited with {:?}", output.code);
                false
            }
            Err(e) => {
                debug!("du check failed: {e}");
                false
            }
        }
    })
}

impl<R: JobRunner> SizeStrategy for DiskUsage<R> {
    fn name(&self) -> &'static str {
        "du"
    }

    fn measure(&mut self, paths: &[PathBuf]) -> Result<SizeTable> {
        let mut table = SizeTable::with_capacity(paths.len());
        let mut batches = 0usize;
        let mut unmeasured: Vec<&[PathBuf]> = Vec::new();

        self.pool.run(
            &mut self.runner,
            paths.chunks(DU_BATCH_SIZE),
            |batch, completion| {
                batches += 1;
                let parsed = match completion {
                    // du exits non-zero when any operand is unreadable but
                    // still prints the ones it measured.
                    Completion::Exited(output) => {
                        collect_du_output(&output.stdout, batch, &mut table)
                    }
                    Completion::Failed(e) => {
                        debug!("du batch of {} path(s) failed: {e}", batch.len());
                        0
                    }
                };

                if parsed == 0 {
                    debug!("du reported nothing for a batch of {} path(s)", batch.len());
                    unmeasured.push(batch);
                }
            },
        );

        if batches > 0 && unmeasured.len() == batches {
            bail!("du reported nothing for any of {batches} batch(es)");
        }

        for batch in unmeasured {
            fill_missing(&mut table, batch);
        }

        Ok(table)
    }
}

/// Add the sizes `du` reported for `batch` to `table`, in bytes.
///
/// Lines that do not parse, or that name a path outside the batch, are
/// dropped; those paths stay absent from the table. Returns the number of
/// sizes added.
fn collect_du_output(stdout: &str, batch: &[PathBuf], table: &mut SizeTable) -> usize {
    let mut added = 0;

    for (kib, path) in stdout.lines().filter_map(parse_du_line) {
        if let Some(requested) = batch.iter().find(|p| p.as_path() == path) {
            table.insert(requested.clone(), kib.saturating_mul(1024));
            added += 1;
        }
    }

    added
}

/// Parse one `<kib><whitespace><path>` line.
///
/// The line is split on the first run of whitespace; everything after it is
/// the path, verbatim.
fn parse_du_line(line: &str) -> Option<(u64, &Path)> {
    let (size, rest) = line.split_once(char::is_whitespace)?;
    let kib = size.parse::<u64>().ok()?;
    let path = rest.trim_start();

    if path.is_empty() {
        return None;
    }

    Some((kib, Path::new(path)))
}
