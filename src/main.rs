//! # cull
//!
//! A CLI tool that finds `node_modules/` and `vendor/` directories of
//! JavaScript and PHP projects and deletes the ones you choose to reclaim
//! disk space.
//!
//! ## Features
//!
//! - Breadth-first scan that stops at project roots and never follows symlinks
//! - Fast size measurement through `du` / PowerShell, with an in-process fallback
//! - Batched parallel deletion with per-directory results
//! - Interactive selection and confirmation
//! - JSON output for scripting
//! - Persistent configuration via `~/.config/cull/config.toml`
//!
//! ## Usage
//!
//! ```bash
//! # List and pick directories under the current directory
//! cull
//!
//! # Skip size measurement
//! cull ~/code --no-size
//!
//! # Delete everything without prompting, JSON report
//! cull ~/code --yes --json
//! ```

mod cli;

use std::{path::Path, process::ExitCode, time::Duration};

use anyhow::{Result, bail};
use clap::Parser;
use cli::{Cli, Commands, ConfigCommand};
use colored::Colorize;
use cull::{
    cleaner::Cleaner,
    config::{ExecutionOptions, FileConfig},
    dependency::{DependencyEntries, DependencyEntry},
    output::JsonOutput,
    scanner::Scanner,
    sizer::SizeEstimator,
};
use humansize::{BINARY, format_size};
use indicatif::{ProgressBar, ProgressStyle};
use inquire::Confirm;
use tracing_subscriber::EnvFilter;

/// Entry point for the cull application.
///
/// Errors from [`inner_main`] are printed to stderr and turn into a non-zero
/// exit status, as does any directory that could not be deleted.
fn main() -> ExitCode {
    match inner_main() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("Error: {err}");

            ExitCode::FAILURE
        }
    }
}

/// Main application logic that can return errors.
///
/// Returns `Ok(false)` when the run completed but some selected directories
/// are still on disk.
///
/// # Errors
///
/// Returns errors from the config subcommand, interactive prompts, or JSON
/// serialization.
fn inner_main() -> Result<bool> {
    let args = Cli::parse();

    if let Some(Commands::Config { command }) = &args.subcommand {
        handle_config_command(command)?;
        return Ok(true);
    }

    let file_config = load_config(args.json());
    let options = args.execution_options(&file_config);
    init_logging(options.verbose);

    let dir = args.directory(&file_config);
    let root = std::path::absolute(&dir).unwrap_or(dir);

    let spinner = spinner(options.json, "Scanning...");
    let found = Scanner::new().scan(&root);
    spinner.finish_and_clear();

    if found.entries.is_empty() {
        if options.json {
            print_json(&JsonOutput::listing(&root, found.visited, &[]))?;
        } else {
            println!(
                "{}",
                "✨ No node_modules or vendor directories found!".green()
            );
        }
        return Ok(true);
    }

    let mut entries = DependencyEntries::from(found.entries);

    if options.measure_sizes {
        measure(&mut entries, &options);
    }

    if !options.json {
        println!(
            "\n{} {} directories under {}\n",
            "📊 Found".bold(),
            entries.len(),
            root.display()
        );
        entries.print_summary();
    }

    if options.json && !options.assume_yes {
        print_json(&JsonOutput::listing(&root, found.visited, entries.as_slice()))?;
        return Ok(true);
    }

    let Some(selected) = select_entries(&entries, &options)? else {
        return Ok(true);
    };

    let result = Cleaner::clean_entries(&selected, options.worker_pool(), options.json);

    if options.json {
        print_json(&JsonOutput::cleanup(
            &root,
            found.visited,
            &selected,
            &result,
        ))?;
    } else {
        Cleaner::print_summary(&result)?;
    }

    Ok(!result.has_failures())
}

/// Install the stderr log subscriber.
///
/// `RUST_LOG` wins when set; otherwise only warnings are shown, or debug
/// messages too with `--verbose`.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// A steady-ticking spinner, or a hidden bar in JSON mode.
fn spinner(quiet: bool, message: &'static str) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Measure every entry and order them largest first.
fn measure(entries: &mut DependencyEntries, options: &ExecutionOptions) {
    let spinner = spinner(options.json, "Measuring sizes...");

    let mut estimator = SizeEstimator::detect(options.worker_pool());
    let paths: Vec<_> = entries.as_slice().iter().map(|e| e.path.clone()).collect();
    let sizes = estimator.compute(&paths);

    spinner.finish_and_clear();

    entries.apply_sizes(&sizes);
    entries.sort_by_size_desc();
}

/// Pick the entries to delete and confirm.
///
/// `--yes` selects everything without asking. Returns `None` when the user
/// selected nothing or declined the confirmation.
fn select_entries(
    entries: &DependencyEntries,
    options: &ExecutionOptions,
) -> Result<Option<Vec<DependencyEntry>>> {
    if options.assume_yes {
        return Ok(Some(entries.as_slice().to_vec()));
    }

    let selected = entries.interactive_selection()?;
    if selected.is_empty() {
        println!("{}", "⚠️  Nothing selected.".yellow());
        return Ok(None);
    }

    let planned: u64 = selected.iter().map(|e| e.size).sum();
    let confirmed = Confirm::new(&format!(
        "Delete {} directories ({})?",
        selected.len(),
        format_size(planned, BINARY)
    ))
    .with_default(false)
    .prompt()?;

    if !confirmed {
        println!("{}", "Cancelled.".yellow());
        return Ok(None);
    }

    Ok(Some(selected))
}

fn print_json(output: &JsonOutput) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(output)?);
    Ok(())
}

// ── Config subcommand ────────────────────────────────────────────────

/// Default config file template written by `config init`.
const CONFIG_TEMPLATE: &str = r#"# cull configuration
# All values shown are their defaults. Uncomment and change as needed.

# Default directory to scan (defaults to current directory when not set)
# dir = "."

[sizing]
# Don't measure directory sizes (same as --no-size)
# skip = false

[execution]
# Maximum number of du / rm / PowerShell processes at once (0 = max(2, CPUs))
# jobs = 0

[logging]
# Log skipped directories, batch launches and fallbacks
# verbose = false
"#;

/// Dispatch a `config` subcommand.
fn handle_config_command(cmd: &ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Path => match FileConfig::config_path() {
            Some(path) => println!("{}", path.display()),
            None => bail!("Could not determine the config directory on this platform"),
        },
        ConfigCommand::Show => show_config()?,
        ConfigCommand::Init => init_config()?,
    }
    Ok(())
}

/// Print the effective configuration (file values merged with defaults).
fn show_config() -> Result<()> {
    let path = FileConfig::config_path();

    let (file_exists, config) = match &path {
        Some(p) if p.exists() => (true, FileConfig::load()?),
        _ => (false, FileConfig::default()),
    };

    match &path {
        Some(p) if file_exists => println!("Config file: {} (found)", p.display()),
        Some(p) => println!(
            "Config file: {} (not found - showing defaults)",
            p.display()
        ),
        None => println!("Config file: (cannot determine path on this platform)"),
    }

    println!();
    println!("{}", format_config(&config));
    Ok(())
}

/// Format a [`FileConfig`] as a human-readable table, showing defaults for `None` fields.
fn format_config(config: &FileConfig) -> String {
    fn show_bool(val: Option<bool>, default: bool) -> String {
        val.map_or_else(|| format!("{default}  (default)"), |v| v.to_string())
    }

    let dir = config.dir.as_deref().map_or_else(
        || "\".\"  (default)".to_string(),
        |p: &Path| format!("\"{}\"", p.display()),
    );
    let jobs = config.execution.jobs.map_or_else(
        || format!("0  (default: {})", cull::platform::default_jobs()),
        |v| v.to_string(),
    );

    format!(
        "\
dir     = {dir}

[sizing]
skip    = {skip}

[execution]
jobs    = {jobs}

[logging]
verbose = {verbose}",
        skip = show_bool(config.sizing.skip, false),
        verbose = show_bool(config.logging.verbose, false),
    )
}

/// Write a default config template to the config file path if it does not exist yet.
fn init_config() -> Result<()> {
    let Some(path) = FileConfig::config_path() else {
        bail!("Could not determine the config directory on this platform");
    };

    if path.exists() {
        println!("Config file already exists at: {}", path.display());
        println!("Remove it first if you want to regenerate it.");
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            anyhow::anyhow!(
                "Failed to create config directory {}: {e}",
                parent.display()
            )
        })?;
    }

    std::fs::write(&path, CONFIG_TEMPLATE)
        .map_err(|e| anyhow::anyhow!("Failed to write config file {}: {e}", path.display()))?;

    println!("Config file written to: {}", path.display());
    Ok(())
}

/// Load the configuration file, falling back to defaults on failure.
fn load_config(json_mode: bool) -> FileConfig {
    match FileConfig::load() {
        Ok(config) => config,
        Err(e) => {
            if !json_mode {
                eprintln!("{} {e}", "Warning: Failed to load config file:".yellow());
            }
            FileConfig::default()
        }
    }
}
