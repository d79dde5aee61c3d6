use anyhow::{Context, Result, anyhow};
use core_types::config::LoggingConfig;
use std::io;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber: stderr output (plain or JSON) filtered by
/// `RUST_LOG`, falling back to `logging.level`, plus an optional log file.
///
/// Keep the returned guard alive for the process lifetime so buffered file
/// output gets flushed.
pub fn init_tracing_with_config(cfg: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.level))
        .with_context(|| format!("invalid log level {:?}", cfg.level))?;

    let (file_layer, guard) = if cfg.file.is_empty() {
        (None, None)
    } else {
        let (writer, guard) = file_writer(Path::new(&cfg.file))?;
        let layer = fmt::layer().with_writer(writer).with_ansi(false);
        (Some(layer), Some(guard))
    };

    let registry = tracing_subscriber::registry().with(filter).with(file_layer);
    let installed = if cfg.json {
        registry
            .with(fmt::layer().json().with_writer(io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_writer(io::stderr))
            .try_init()
    };
    installed.map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))?;

    Ok(guard)
}

fn file_writer(path: &Path) -> Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .with_context(|| format!("log file path {} has no file name", path.display()))?;
    std::fs::create_dir_all(dir)
        .with_context(|| format!("create log directory {}", dir.display()))?;
    let appender = tracing_appender::rolling::never(dir, name);
    Ok(tracing_appender::non_blocking(appender))
}
