//! barstatus: an i3bar/swaybar status command.
//!
//! Run with:  `RUST_LOG=debug barstatus`

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::IsTerminal;
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let config_path = bar_config::default_path();
    let config = bar_config::load(&config_path);

    if let Ok(Some(log_file)) = config.as_ref().map(|c| c.log_file.as_deref()) {
        redirect_stderr(log_file)?;
    }

    // stdout carries the protocol; logs go to stderr only.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();

    info!("barstatus v{} starting (pid {})", env!("CARGO_PKG_VERSION"), std::process::id());
    if !config_path.exists() {
        warn!("no config at '{}'; using defaults", config_path.display());
    }

    let config = config.inspect_err(|e| error!("{e}"))?;
    let err = match bar_runtime::run(config, &config_path) {
        Ok(()) => return Ok(()),
        Err(e) => e,
    };
    error!("{err}");
    Err(err.into())
}

/// Point fd 2 at `path`, appending, so every image of this run logs to the
/// same file.
fn redirect_stderr(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .mode(0o640)
        .open(path)
        .with_context(|| format!("cannot open log file '{}'", path.display()))?;
    nix::unistd::dup2(file.as_raw_fd(), std::io::stderr().as_raw_fd())
        .with_context(|| format!("cannot redirect stderr to '{}'", path.display()))?;
    Ok(())
}
