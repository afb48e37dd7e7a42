//! Windows fast path: PowerShell.

use std::{
    path::{Path, PathBuf},
    process::Command,
};

use anyhow::{Result, bail};
use tracing::debug;

use super::{SizeStrategy, SizeTable, walk::fill_missing, with_scratch_dir};
use crate::pool::{Completion, JobRunner, ProcessRunner, WorkerPool};

/// Whether PowerShell ends a single-quoted string at `c`.
///
/// Besides the ASCII apostrophe it accepts the typographic single quotes
/// U+2018 through U+201B.
const fn is_single_quote(c: char) -> bool {
    matches!(c, '\'' | '\u{2018}'..='\u{201B}')
}

/// Quote `value` as a single-quoted PowerShell string literal.
///
/// Inside single quotes PowerShell expands nothing; the only characters that
/// need escaping are the quote characters themselves, which are doubled.
#[must_use]
pub fn ps_literal(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        if is_single_quote(c) {
            quoted.push(c);
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}

/// Start a `powershell` invocation that runs `script` without a profile.
#[must_use]
pub fn powershell(script: &str) -> Command {
    let mut cmd = Command::new("powershell");
    cmd.args(["-NoProfile", "-NonInteractive", "-Command", script]);
    cmd
}

/// Script printing the summed length of every file under `path`.
fn size_script(path: &Path) -> String {
    format!(
        "$p={}; \
         $s=(Get-ChildItem -LiteralPath $p -Recurse -File -Force -ErrorAction SilentlyContinue \
         | Measure-Object -Property Length -Sum).Sum; \
         if ($s -eq $null) {{ $s = 0 }}; Write-Output $s",
        ps_literal(&path.to_string_lossy())
    )
}

/// One PowerShell process per path: this strategy always gets single-path batches.
fn size_command(batch: &[PathBuf]) -> Command {
    let script = batch.first().map(|p| size_script(p)).unwrap_or_default();
    powershell(&script)
}

/// Measures directories with one PowerShell process per path.
#[derive(Debug)]
pub struct PowerShellSize<R = ProcessRunner> {
    pool: WorkerPool,
    runner: R,
}

impl PowerShellSize {
    /// Create the strategy; at most `pool.limit()` PowerShell processes run at once.
    #[must_use]
    pub const fn new(pool: WorkerPool) -> Self {
        Self::with_runner(pool, ProcessRunner::new(size_command))
    }

    /// Whether PowerShell measures a fresh empty directory as zero bytes.
    #[must_use]
    pub fn is_available() -> bool {
        check_with(&mut ProcessRunner::new(size_command))
    }
}

impl<R: JobRunner> PowerShellSize<R> {
    /// Create the strategy with `runner` launching the PowerShell processes.
    #[must_use]
    pub const fn with_runner(pool: WorkerPool, runner: R) -> Self {
        Self { pool, runner }
    }
}

fn check_with<R: JobRunner>(runner: &mut R) -> bool {
    with_scratch_dir(|dir| {
        let batch = [dir.to_path_buf()];

        match runner.launch(&batch).and_then(|h| runner.wait(h)) {
            Ok(output) => output.success && parse_size_output(&output.stdout) == Some(0),
            Err(e) => {
                debug!("powershell check failed: {e}");
                false
            }
        }
    })
}

impl<R: JobRunner> SizeStrategy for PowerShellSize<R> {
    fn name(&self) -> &'static str {
        "powershell"
    }

    fn measure(&mut self, paths: &[PathBuf]) -> Result<SizeTable> {
        let mut table = SizeTable::with_capacity(paths.len());
        let mut unmeasured: Vec<&[PathBuf]> = Vec::new();

        self.pool.run(&mut self.runner, paths.chunks(1), |batch, completion| {
            let bytes = match completion {
                Completion::Exited(output) if output.success => parse_size_output(&output.stdout),
                Completion::Exited(output) => {
                    debug!("powershell exited with {:?}", output.code);
                    None
                }
                Completion::Failed(e) => {
                    debug!("powershell failed: {e}");
                    None
                }
            };

            match (batch.first(), bytes) {
                (Some(path), Some(bytes)) => {
                    table.insert(path.clone(), bytes);
                }
                _ => unmeasured.push(batch),
            }
        });

        if !paths.is_empty() && unmeasured.len() == paths.len() {
            bail!("powershell reported nothing for any of {} path(s)", paths.len());
        }

        for batch in unmeasured {
            fill_missing(&mut table, batch);
        }

        Ok(table)
    }
}

fn parse_size_output(stdout: &str) -> Option<u64> {
    stdout.trim().parse().ok()
}
