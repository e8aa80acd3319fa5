use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use target_timeline::{aggregate, cli::Cli, csv_output};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber; per-file failures are warnings, so they
/// show up unless RUST_LOG silences them
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .init();
}

/// Directory containing the running executable
fn default_scan_root() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("Cannot locate the running executable")?;
    exe.parent()
        .map(PathBuf::from)
        .with_context(|| format!("Executable {} has no parent directory", exe.display()))
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.debug);

    let root = match &args.root {
        Some(root) => root.clone(),
        None => default_scan_root()?,
    };

    let aggregation = aggregate::aggregate(&root, &args.aggregate_config());

    let stdout = io::stdout();
    let mut out = stdout.lock();
    csv_output::write_csv(&aggregation, &args.csv_options(), &mut out)
        .context("Failed to write CSV to stdout")?;
    out.flush().context("Failed to flush stdout")?;

    Ok(())
}
