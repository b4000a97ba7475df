//! Logging init: file under XDG state dir, or graceful fallback to stderr.

use anyhow::Result;
use std::fs;
use std::io;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,hlsget=debug"))
}

/// Initialize structured logging to `~/.local/state/hlsget/hlsget.log`.
/// On failure (e.g. log dir unwritable), returns Err so the caller can fall
/// back to [`init_logging_stderr`].
pub fn init_logging() -> Result<()> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("hlsget")?;
    let log_dir = xdg_dirs.get_state_home().join("hlsget");

    fs::create_dir_all(&log_dir)?;
    let log_file_path = log_dir.join("hlsget.log");

    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file_path)?;

    // Each log event gets a fresh handle; stderr covers the (unlikely) case
    // that cloning the open file fails mid-run.
    let writer = BoxMakeWriter::new(move || -> Box<dyn io::Write + Send> {
        match file.try_clone() {
            Ok(f) => Box::new(f),
            Err(_) => Box::new(io::stderr()),
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(default_filter())
        .with_writer(writer)
        .with_ansi(false)
        .init();

    tracing::info!("hlsget logging initialized at {}", log_file_path.display());

    Ok(())
}

/// Initialize logging to stderr only (no file). Use when [`init_logging`]
/// fails so the CLI doesn't crash.
pub fn init_logging_stderr() {
    tracing_subscriber::fmt()
        .with_env_filter(default_filter())
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
}
