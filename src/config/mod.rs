//! Configuration for a run.
//!
//! - [`file`] - The optional TOML configuration file
//! - [`execution`] - Options resolved from the CLI and the file

pub mod execution;
pub mod file;

pub use execution::ExecutionOptions;
pub use file::FileConfig;
