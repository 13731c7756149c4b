//! Log directory resolution and the non-blocking daily file writer shared by binaries.

use std::path::PathBuf;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::EnvFilter;

/// `QUESTLINE_LOG_DIR` when set, else `<data_local_dir>/<app_name>/logs`, else `./logs`.
pub fn log_dir(app_name: &str) -> PathBuf {
    if let Some(dir) = std::env::var_os("QUESTLINE_LOG_DIR").filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::data_local_dir()
        .map(|d| d.join(app_name).join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

/// Daily-rolling `<app_name>.log` writer. Keep the guard alive for the process lifetime.
pub fn file_writer(app_name: &str) -> std::io::Result<(NonBlocking, WorkerGuard)> {
    let dir = log_dir(app_name);
    std::fs::create_dir_all(&dir)?;
    let appender = tracing_appender::rolling::daily(dir, format!("{app_name}.log"));
    Ok(tracing_appender::non_blocking(appender))
}

/// `RUST_LOG` when set, else `default_directive` (e.g. `"info"` or `"questline=debug"`).
pub fn env_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}
