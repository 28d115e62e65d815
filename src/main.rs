use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

mod cli;

fn log_filter(verbose: bool, quiet: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new("debug")
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Install the subscriber from the command-line flags alone, so config
/// loading can already log. The returned handle swaps the filter once the
/// config has had its say on verbosity.
fn init_tracing(verbose: bool, quiet: bool) -> reload::Handle<EnvFilter, Registry> {
    let (filter, handle) = reload::Layer::new(log_filter(verbose, quiet));
    // Log to stderr to keep stdout clean for --json
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
    handle
}

fn main() -> ExitCode {
    let mut args = cli::Cli::parse();
    let log_handle = init_tracing(args.verbose, args.quiet);

    let config = jade::config::Config::load(&args.project_dir);
    cli::apply_config_defaults(&mut args, &config);
    if let Err(e) = log_handle.reload(log_filter(args.verbose, args.quiet)) {
        tracing::warn!(error = %e, "Failed to apply configured log level");
    }

    match cli::run_with(args, &config) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
