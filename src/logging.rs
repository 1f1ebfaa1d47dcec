use anyhow::{Context, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "KJKIDS_LOG";
const DEFAULT_DIRECTIVE: &str = "kjkids=info";

fn env_filter() -> EnvFilter {
  EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Log to a daily-rolling file under `dir`. The terminal UI owns stdout, so it
/// logs here. Keep the guard alive for the whole run or buffered lines are lost.
pub fn init_file(dir: &Path) -> Result<WorkerGuard> {
  std::fs::create_dir_all(dir).with_context(|| format!("Failed to create log dir {}", dir.display()))?;
  let writer = tracing_appender::rolling::daily(dir, "kjkids.log");
  let (writer, guard) = tracing_appender::non_blocking(writer);
  tracing_subscriber::fmt()
    .with_writer(writer)
    .with_env_filter(env_filter())
    .with_ansi(false)
    .try_init()
    .map_err(|e| anyhow::anyhow!(e))
    .context("Failed to install file logger")?;
  Ok(guard)
}

/// Log to stderr, for the one-shot page generators.
pub fn init_stderr() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(env_filter())
    .try_init()
    .map_err(|e| anyhow::anyhow!(e))
    .context("Failed to install stderr logger")
}
