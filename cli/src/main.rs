//! Questline CLI binary: play a streamed text adventure from the terminal.
//!
//! Subcommands: `play` (interactive REPL, default), `autoplay` (one fresh run to completion),
//! `provider <name>` (print provider metadata), `serve` (run the demo backend).

mod log_format;
mod logging;
mod repl;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use cli::{describe_outcome, CliError, Overrides, Renderer, Resolved};
use config::GameDefaults;
use questline::{GameBackend, GameSession, HttpBackend, OperationOutcome, SessionUpdate};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Parser, Debug)]
#[command(name = "questline")]
#[command(about = "Questline: play an AI-narrated text adventure from the terminal")]
struct Args {
    #[command(subcommand)]
    cmd: Option<Command>,

    /// Game backend base URL (default: http://SERVER_HOST:SERVER_PORT)
    #[arg(long, value_name = "URL", env = "QUESTLINE_BACKEND_URL", global = true)]
    backend: Option<String>,

    /// LLM provider name, e.g. Groq, OpenAI, Ollama
    #[arg(long, global = true)]
    provider: Option<String>,

    /// Model name for the provider
    #[arg(long, global = true)]
    model: Option<String>,

    /// API key forwarded to the backend
    #[arg(long, env = "QUESTLINE_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Provider API URL override
    #[arg(long, value_name = "URL", global = true)]
    api_url: Option<String>,

    /// Step budget for a new game (clamped to MAX_STEPS_LIMIT)
    #[arg(long, value_name = "N", global = true)]
    max_steps: Option<u32>,

    /// Seconds between client-driven autoplay steps (clamped to MAX_DELAY)
    #[arg(long, value_name = "SECS", global = true)]
    delay: Option<u64>,

    /// Verbose: debug logging for the questline crates, status lines on stdout
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Interactive play (default)
    Play,
    /// Fresh server-streamed autoplay to completion; Ctrl-C stops
    Autoplay,
    /// Print provider metadata as JSON
    Provider(ProviderArgs),
    /// Run the demo backend
    Serve(ServeArgs),
}

#[derive(clap::Args, Debug, Clone)]
struct ProviderArgs {
    /// Provider name, e.g. "OpenAI (GPT)"
    name: String,
}

#[derive(clap::Args, Debug, Clone)]
struct ServeArgs {
    /// Listen address (default: SERVER_HOST:SERVER_PORT)
    #[arg(long, value_name = "ADDR")]
    addr: Option<String>,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            backend: self.backend.clone(),
            provider: self.provider.clone(),
            model: self.model.clone(),
            api_key: self.api_key.clone(),
            api_url: self.api_url.clone(),
            max_steps: self.max_steps,
            delay: self.delay,
        }
    }
}

/// Session wired to the HTTP backend, with its updates rendered to stdout by a separate task.
fn open_session(
    resolved: &Resolved,
    verbose: bool,
) -> Result<(GameSession, JoinHandle<()>), CliError> {
    let backend = HttpBackend::new(resolved.backend_url.clone(), resolved.request_timeout)?;
    let (tx, mut rx) = mpsc::unbounded_channel::<SessionUpdate>();
    let session = GameSession::new(Arc::new(backend), resolved.settings.clone(), resolved.session)
        .with_update_sink(tx);
    let render = tokio::spawn(async move {
        let mut renderer = Renderer::new(std::io::stdout(), verbose);
        while let Some(update) = rx.recv().await {
            if let Err(e) = renderer.render(&update) {
                tracing::warn!(error = %e, "stdout write failed");
                break;
            }
        }
    });
    Ok((session, render))
}

async fn autoplay(session: GameSession) -> OperationOutcome {
    let play = session.autoplay();
    tokio::pin!(play);
    tokio::select! {
        outcome = &mut play => outcome,
        _ = tokio::signal::ctrl_c() => {
            if let Err(e) = session.stop() {
                tracing::warn!(error = %e, "stop on Ctrl-C refused");
            }
            play.await
        }
    }
}

async fn provider(resolved: &Resolved, name: &str) -> Result<(), CliError> {
    let backend = HttpBackend::new(resolved.backend_url.clone(), resolved.request_timeout)?;
    let info = backend.provider(name).await?;
    let json = serde_json::to_string_pretty(&info)
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    println!("{json}");
    Ok(())
}

async fn run(args: Args, defaults: GameDefaults) -> Result<(), CliError> {
    let resolved = cli::resolve(&defaults, &args.overrides());
    let cmd = args.cmd.clone().unwrap_or(Command::Play);
    tracing::info!(
        command = ?cmd,
        backend = %resolved.backend_url,
        settings = ?resolved.settings,
        budget = resolved.session.default_budget,
        "questline starting"
    );

    match cmd {
        Command::Serve(sa) => {
            let addr = sa.addr.unwrap_or_else(|| defaults.server_addr());
            serve::run_serve(Some(&addr), serve::ServeConfig::from_env())
                .await
                .map_err(|e| CliError::Serve(e.to_string()))
        }
        Command::Provider(pa) => provider(&resolved, &pa.name).await,
        Command::Autoplay => {
            let (session, render) = open_session(&resolved, args.verbose)?;
            let outcome = autoplay(session).await;
            let _ = render.await;
            println!();
            eprintln!("[{}]", describe_outcome(&outcome));
            outcome.into_result()?;
            Ok(())
        }
        Command::Play => {
            let (session, render) = open_session(&resolved, args.verbose)?;
            repl::run_repl_loop(session, defaults.max_delay_secs).await?;
            let _ = render.await;
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    config::load_and_apply("questline", None::<&std::path::Path>).ok();
    let args = Args::parse();
    let _log_guard = logging::init(args.verbose)?;
    let defaults = GameDefaults::from_env();

    if let Err(e) = run(args, defaults).await {
        tracing::error!(error = %e, "questline failed");
        eprintln!("questline: {e}");
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn play_is_the_default_command() {
        let args = Args::try_parse_from(["questline"]).unwrap();
        assert!(args.cmd.is_none());
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let args = Args::try_parse_from([
            "questline",
            "autoplay",
            "--max-steps",
            "8",
            "--delay",
            "1",
            "--provider",
            "Ollama",
        ])
        .unwrap();
        assert!(matches!(args.cmd, Some(Command::Autoplay)));
        let o = args.overrides();
        assert_eq!(o.max_steps, Some(8));
        assert_eq!(o.delay, Some(1));
        assert_eq!(o.provider.as_deref(), Some("Ollama"));
    }

    #[test]
    fn provider_takes_a_name_and_serve_an_addr() {
        let args = Args::try_parse_from(["questline", "provider", "OpenAI (GPT)"]).unwrap();
        assert!(matches!(args.cmd, Some(Command::Provider(ref p)) if p.name == "OpenAI (GPT)"));

        let args = Args::try_parse_from(["questline", "serve", "--addr", "0.0.0.0:9000"]).unwrap();
        assert!(
            matches!(args.cmd, Some(Command::Serve(ref s)) if s.addr.as_deref() == Some("0.0.0.0:9000"))
        );
    }

    #[test]
    fn non_numeric_budget_is_a_parse_error() {
        assert!(Args::try_parse_from(["questline", "--max-steps", "many"]).is_err());
    }
}
