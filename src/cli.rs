//! Command-line interface definition and argument parsing.
//!
//! This module defines all command-line arguments, options, and their validation
//! using the [clap](https://docs.rs/clap/) library.
//!
//! Helper methods on [`Cli`] accept a [`FileConfig`] reference so that config-file
//! values act as defaults that CLI arguments can override (layered config).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use cull::config::{
    ExecutionOptions,
    file::{FileConfig, expand_tilde},
};

/// Command-line arguments controlling what happens to the found directories.
#[derive(Parser)]
struct ExecutionArgs {
    /// Don't prompt; select and delete every found directory
    ///
    /// Skips both the interactive selection and the confirmation prompt.
    /// Use with caution as this will immediately delete dependency directories.
    #[arg(short = 'y', long)]
    yes: bool,

    /// Don't measure directory sizes
    ///
    /// Listing is much faster on large trees; every size is shown as zero.
    #[arg(long = "no-size", visible_aliases = ["no-sizes", "skip-size", "skip-sizes"])]
    no_size: bool,

    /// Maximum number of external commands to run at once
    ///
    /// A value of 0 uses max(2, number of CPUs).
    #[arg(short = 'j', long)]
    jobs: Option<usize>,

    /// Log skipped directories, batch launches and fallbacks to stderr
    #[arg(short = 'v', long)]
    verbose: bool,
}

/// Top-level subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Inspect or initialise the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Subcommands for `config`.
#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration (file values + defaults for unset keys)
    Show,
    /// Write a default config.toml if none exists yet
    Init,
    /// Print the path to the config file
    Path,
}

/// Main command-line interface structure.
///
/// Helper methods accept a [`FileConfig`] reference so that config-file values act as
/// defaults when the corresponding CLI argument is not provided.
#[derive(Parser)]
#[command(name = "cull")]
#[command(
    about = "Find and delete node_modules/ and vendor/ directories of JavaScript and PHP projects"
)]
#[command(version)]
#[command(author)]
pub struct Cli {
    /// Subcommand (e.g. `config`)
    #[command(subcommand)]
    pub subcommand: Option<Commands>,

    /// Directory to search for projects
    ///
    /// Defaults to the configured `dir`, or the current directory.
    dir: Option<PathBuf>,

    /// Output results as a single JSON object for scripting/piping
    ///
    /// Without `--yes` the found directories are listed and nothing is deleted.
    /// With `--yes` everything is deleted and the cleanup results are included.
    #[arg(long)]
    json: bool,

    /// Execution options
    #[command(flatten)]
    execution: ExecutionArgs,
}

impl Cli {
    /// Whether `--json` structured output mode is enabled.
    #[must_use]
    pub const fn json(&self) -> bool {
        self.json
    }

    /// Resolve the directory to scan.
    ///
    /// Priority: CLI argument > config file `dir` (tilde expanded) > current directory (`.`).
    #[must_use]
    pub fn directory(&self, config: &FileConfig) -> PathBuf {
        if let Some(ref dir) = self.dir {
            return dir.clone();
        }

        config
            .dir
            .as_deref()
            .map_or_else(|| PathBuf::from("."), expand_tilde)
    }

    /// Extract execution options from CLI args and config file.
    ///
    /// - **measure_sizes**: `false` if `--no-size` or `[sizing] skip = true`
    /// - **verbose**: CLI flag `||` config value `||` `false`
    /// - **jobs**: CLI > config > automatic
    #[must_use]
    pub fn execution_options(&self, config: &FileConfig) -> ExecutionOptions {
        ExecutionOptions {
            measure_sizes: !(self.execution.no_size || config.sizing.skip.unwrap_or(false)),
            assume_yes: self.execution.yes,
            json: self.json,
            verbose: self.execution.verbose || config.logging.verbose.unwrap_or(false),
            jobs: self.execution.jobs.or(config.execution.jobs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use cull::config::file::{FileExecutionConfig, FileLoggingConfig, FileSizingConfig};

    #[test]
    fn test_default_values() {
        let args = Cli::parse_from(["cull"]);
        let config = FileConfig::default();

        assert!(args.subcommand.is_none());
        assert!(!args.json());
        assert_eq!(args.directory(&config), PathBuf::from("."));

        let opts = args.execution_options(&config);
        assert!(opts.measure_sizes);
        assert!(!opts.assume_yes);
        assert!(!opts.json);
        assert!(!opts.verbose);
        assert_eq!(opts.jobs, None);
    }

    #[test]
    fn test_directory_argument() {
        let args = Cli::parse_from(["cull", "/srv/code"]);
        let config = FileConfig {
            dir: Some(PathBuf::from("/elsewhere")),
            ..FileConfig::default()
        };

        assert_eq!(args.directory(&config), PathBuf::from("/srv/code"));
    }

    #[test]
    fn test_directory_from_config() {
        let args = Cli::parse_from(["cull"]);

        let config = FileConfig {
            dir: Some(PathBuf::from("/srv/code")),
            ..FileConfig::default()
        };
        assert_eq!(args.directory(&config), PathBuf::from("/srv/code"));

        if let Some(home) = dirs::home_dir() {
            let config = FileConfig {
                dir: Some(PathBuf::from("~/code")),
                ..FileConfig::default()
            };
            assert_eq!(args.directory(&config), home.join("code"));
        }
    }

    #[test]
    fn test_no_size_aliases() {
        let config = FileConfig::default();

        for flag in ["--no-size", "--no-sizes", "--skip-size", "--skip-sizes"] {
            let args = Cli::parse_from(["cull", flag]);
            assert!(
                !args.execution_options(&config).measure_sizes,
                "{flag} should disable sizing"
            );
        }
    }

    #[test]
    fn test_short_flags() {
        let config = FileConfig::default();
        let args = Cli::parse_from(["cull", "-y", "-v", "-j", "3"]);
        let opts = args.execution_options(&config);

        assert!(opts.assume_yes);
        assert!(opts.verbose);
        assert_eq!(opts.jobs, Some(3));
    }

    #[test]
    fn test_json_with_yes() {
        let args = Cli::parse_from(["cull", "--json", "--yes", "."]);
        let opts = args.execution_options(&FileConfig::default());

        assert!(args.json());
        assert!(opts.json);
        assert!(opts.assume_yes);
    }

    #[test]
    fn test_config_values_apply_when_flags_absent() {
        let args = Cli::parse_from(["cull"]);
        let config = FileConfig {
            sizing: FileSizingConfig { skip: Some(true) },
            execution: FileExecutionConfig { jobs: Some(6) },
            logging: FileLoggingConfig {
                verbose: Some(true),
            },
            ..FileConfig::default()
        };

        let opts = args.execution_options(&config);
        assert!(!opts.measure_sizes);
        assert!(opts.verbose);
        assert_eq!(opts.jobs, Some(6));
    }

    #[test]
    fn test_cli_jobs_overrides_config() {
        let args = Cli::parse_from(["cull", "--jobs", "2"]);
        let config = FileConfig {
            execution: FileExecutionConfig { jobs: Some(16) },
            ..FileConfig::default()
        };

        assert_eq!(args.execution_options(&config).jobs, Some(2));
    }

    #[test]
    fn test_config_subcommands() {
        let args = Cli::parse_from(["cull", "config", "path"]);
        assert!(matches!(
            args.subcommand,
            Some(Commands::Config {
                command: ConfigCommand::Path
            })
        ));

        let args = Cli::parse_from(["cull", "config", "show"]);
        assert!(matches!(
            args.subcommand,
            Some(Commands::Config {
                command: ConfigCommand::Show
            })
        ));

        let args = Cli::parse_from(["cull", "config", "init"]);
        assert!(matches!(
            args.subcommand,
            Some(Commands::Config {
                command: ConfigCommand::Init
            })
        ));
    }

    #[test]
    fn test_invalid_jobs_rejected() {
        assert!(Cli::try_parse_from(["cull", "--jobs", "many"]).is_err());
    }
}
