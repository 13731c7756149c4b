//! File logging for the binary. Stdout carries the story, so every log line goes to
//! `<log_dir>/questline.log.<date>` through a non-blocking writer.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::log_format::{OperationLine, OperationTagLayer};

const APP_NAME: &str = "questline";

/// Installs the global subscriber. `RUST_LOG` wins; otherwise `info`, or debug for the
/// questline crates when `verbose`. Lines inside a session operation carry its
/// `[op=.. ticket=.. session=..]` tag. Hold the returned guard until exit so buffered
/// lines flush.
pub fn init(verbose: bool) -> Result<WorkerGuard, cli::CliError> {
    let (writer, guard) = config::tracing_init::file_writer(APP_NAME)?;
    let default_directive = if verbose {
        "info,questline=debug,serve=debug,cli=debug,stream_event=debug"
    } else {
        "info"
    };
    tracing_subscriber::registry()
        .with(config::tracing_init::env_filter(default_directive))
        .with(OperationTagLayer)
        .with(
            tracing_subscriber::fmt::layer()
                .event_format(OperationLine::new().with_target(verbose))
                .with_writer(writer)
                .with_ansi(false),
        )
        .try_init()
        .map_err(|e| cli::CliError::Logging(e.to_string()))?;
    Ok(guard)
}
