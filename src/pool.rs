//! Bounded-concurrency dispatcher for external commands.
//!
//! Both the size estimator and the batch deleter work the same way: split a
//! list of paths into batches, run one external command per batch, and keep
//! at most `limit` of those commands alive at once. This module implements
//! that loop once.
//!
//! Admission and completion handling are both FIFO: when the pool is full the
//! orchestrating thread blocks on the *oldest* running command, hands its
//! result to the caller, and only then launches the next batch. Real process
//! completion order is unconstrained, but every result is paired with the
//! batch that produced it.

use std::{
    collections::VecDeque,
    io,
    path::PathBuf,
    process::{Child, Command, Stdio},
};

use tracing::{debug, warn};

use crate::platform;

/// Captured result of one finished external command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobOutput {
    /// Whether the command exited successfully.
    pub success: bool,

    /// Exit code, if the process exited normally.
    pub code: Option<i32>,

    /// Everything the command wrote to stdout (lossily decoded).
    pub stdout: String,
}

/// How a batch's command ended.
#[derive(Debug)]
pub enum Completion {
    /// The command ran and exited (successfully or not).
    Exited(JobOutput),

    /// The command could not be launched or waited on.
    Failed(io::Error),
}

impl Completion {
    /// Short human-readable description of the exit status.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Exited(JobOutput { code: Some(code), .. }) => format!("exit status {code}"),
            Self::Exited(JobOutput { code: None, .. }) => "terminated by signal".to_string(),
            Self::Failed(e) => format!("command failed: {e}"),
        }
    }
}

/// Launches and awaits the command for one batch.
///
/// The production implementation is [`ProcessRunner`]; tests plug in fakes
/// to observe scheduling without spawning real processes.
pub trait JobRunner {
    /// Handle to a launched, still-running job.
    type Handle;

    /// Start the command for `batch` without waiting for it.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be started.
    fn launch(&mut self, batch: &[PathBuf]) -> io::Result<Self::Handle>;

    /// Block until the job behind `handle` has finished.
    ///
    /// # Errors
    ///
    /// Returns an error if waiting on the job or collecting its output fails.
    fn wait(&mut self, handle: Self::Handle) -> io::Result<JobOutput>;
}

/// Builds the command that processes one batch.
pub type CommandBuilder = fn(&[PathBuf]) -> Command;

/// [`JobRunner`] that spawns real child processes.
///
/// stdin is closed, stdout is captured and stderr is discarded. No timeout is
/// applied: a command runs until it exits on its own.
#[derive(Debug, Clone, Copy)]
pub struct ProcessRunner {
    build: CommandBuilder,
}

impl ProcessRunner {
    /// Create a runner that uses `build` to turn a batch into a command.
    #[must_use]
    pub const fn new(build: CommandBuilder) -> Self {
        Self { build }
    }
}

impl JobRunner for ProcessRunner {
    type Handle = Child;

    fn launch(&mut self, batch: &[PathBuf]) -> io::Result<Child> {
        (self.build)(batch)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
    }

    fn wait(&mut self, child: Child) -> io::Result<JobOutput> {
        let output = child.wait_with_output()?;

        Ok(JobOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }
}

/// Bounded pool of in-flight external commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerPool {
    limit: usize,
}

impl WorkerPool {
    /// Create a pool that keeps at most `limit` jobs in flight (minimum 1).
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
        }
    }

    /// Pool sized for this host: `max(2, cpu_count())`.
    #[must_use]
    pub fn for_host() -> Self {
        Self::new(platform::default_jobs())
    }

    /// Maximum number of jobs in flight.
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// Run every batch through `runner`, calling `on_complete` once per batch.
    ///
    /// Batches are launched in input order and their completions are handled
    /// in the same order. A batch whose command fails to launch is reported as
    /// [`Completion::Failed`] in its turn; it never stops the other batches.
    pub fn run<'a, R, I, F>(&self, runner: &mut R, batches: I, mut on_complete: F)
    where
        R: JobRunner,
        I: IntoIterator<Item = &'a [PathBuf]>,
        F: FnMut(&'a [PathBuf], Completion),
    {
        let mut in_flight: VecDeque<(&'a [PathBuf], io::Result<R::Handle>)> =
            VecDeque::with_capacity(self.limit);

        for batch in batches {
            while in_flight.len() >= self.limit {
                Self::finish_oldest(runner, &mut in_flight, &mut on_complete);
            }

            debug!(paths = batch.len(), in_flight = in_flight.len(), "launching batch");
            let handle = runner.launch(batch);
            if let Err(e) = &handle {
                warn!("failed to launch command for {} path(s): {e}", batch.len());
            }
            in_flight.push_back((batch, handle));
        }

        while !in_flight.is_empty() {
            Self::finish_oldest(runner, &mut in_flight, &mut on_complete);
        }
    }

    fn finish_oldest<'a, R, F>(
        runner: &mut R,
        in_flight: &mut VecDeque<(&'a [PathBuf], io::Result<R::Handle>)>,
        on_complete: &mut F,
    ) where
        R: JobRunner,
        F: FnMut(&'a [PathBuf], Completion),
    {
        let Some((batch, handle)) = in_flight.pop_front() else {
            return;
        };

        let completion = match handle.and_then(|h| runner.wait(h)) {
            Ok(output) => Completion::Exited(output),
            Err(e) => Completion::Failed(e),
        };

        on_complete(batch, completion);
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::for_host()
    }
}
