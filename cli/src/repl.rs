//! Interactive play loop: read commands from stdin and drive one [`GameSession`].
//!
//! Start, next and a non-autoplay continue are awaited in place. Autoplay, resume and
//! `continue <n> auto` run in a background task so `stop` (or Ctrl-C) can reach them.

use std::future::Future;
use std::io::Write;
use std::str::FromStr;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;

use cli::{describe_outcome, CliError};
use questline::{GameSession, OperationOutcome, Phase};

const HELP: &str = "commands: start | next | auto | stop | resume | continue <n> [auto] | \
budget <n> | delay <secs> | reset | status | help | quit";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplCommand {
    Start,
    Next,
    Auto,
    Stop,
    Resume,
    Continue { steps: u32, autoplay: bool },
    Budget(u32),
    Delay(u64),
    Reset,
    Status,
    Help,
    Quit,
}

impl FromStr for ReplCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let head = words.next().unwrap_or_default().to_ascii_lowercase();
        let rest: Vec<&str> = words.collect();
        let number = |what: &str| -> Result<u64, String> {
            rest.first()
                .ok_or_else(|| format!("{head} needs {what}"))?
                .parse::<u64>()
                .map_err(|_| format!("{head}: {what} must be a whole number"))
        };
        let cmd = match head.as_str() {
            "start" => ReplCommand::Start,
            "next" | "n" => ReplCommand::Next,
            "auto" | "autoplay" => ReplCommand::Auto,
            "stop" => ReplCommand::Stop,
            "resume" => ReplCommand::Resume,
            "continue" => {
                let steps = u32::try_from(number("a step count")?)
                    .map_err(|_| "continue: step count too large".to_string())?;
                let autoplay = match rest.get(1) {
                    None => false,
                    Some(w) if w.eq_ignore_ascii_case("auto") => true,
                    Some(w) => return Err(format!("continue: unexpected `{w}`")),
                };
                ReplCommand::Continue { steps, autoplay }
            }
            "budget" => ReplCommand::Budget(
                u32::try_from(number("a step count")?)
                    .map_err(|_| "budget: step count too large".to_string())?,
            ),
            "delay" => ReplCommand::Delay(number("seconds")?),
            "reset" => ReplCommand::Reset,
            "status" => ReplCommand::Status,
            "help" | "?" => ReplCommand::Help,
            "quit" | "exit" | "/quit" => ReplCommand::Quit,
            other => return Err(format!("unknown command `{other}`; try `help`")),
        };
        Ok(cmd)
    }
}

fn report(outcome: &OperationOutcome) {
    eprintln!("[{}]", describe_outcome(outcome));
}

/// Runs `op` in the background and reports its outcome when it ends.
fn spawn_op<F>(slot: &mut Option<JoinHandle<()>>, op: F)
where
    F: Future<Output = OperationOutcome> + Send + 'static,
{
    *slot = Some(tokio::spawn(async move { report(&op.await) }));
}

fn stop(session: &GameSession) {
    if let Err(e) = session.stop() {
        eprintln!("[{e}]");
    }
}

fn print_status(session: &GameSession) {
    let snap = session.snapshot();
    println!(
        "{} | step {}/{} (ceiling {}) | session {}",
        snap.phase, snap.current_step, snap.step_budget, snap.budget_ceiling, snap.session_id
    );
    println!("{}", session.status());
}

/// Prompts until EOF, `quit`, or Ctrl-C outside autoplay.
pub async fn run_repl_loop(session: GameSession, max_delay_secs: u64) -> Result<(), CliError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut background: Option<JoinHandle<()>> = None;
    println!("{HELP}");

    loop {
        print!("questline> ");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                if session.phase() == Phase::Autoplaying {
                    println!();
                    stop(&session);
                    continue;
                }
                None
            }
        };
        let Some(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }
        let cmd = match line.parse::<ReplCommand>() {
            Ok(cmd) => cmd,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };
        tracing::debug!(?cmd, phase = %session.phase(), "repl command");

        match cmd {
            ReplCommand::Start => report(&session.start().await),
            ReplCommand::Next => report(&session.next_step().await),
            ReplCommand::Auto => {
                let s = session.clone();
                spawn_op(&mut background, async move { s.autoplay().await });
            }
            ReplCommand::Resume => {
                let s = session.clone();
                spawn_op(&mut background, async move { s.resume().await });
            }
            ReplCommand::Continue {
                steps,
                autoplay: true,
            } => {
                let s = session.clone();
                spawn_op(&mut background, async move {
                    s.continue_game(steps, true).await
                });
            }
            ReplCommand::Continue {
                steps,
                autoplay: false,
            } => report(&session.continue_game(steps, false).await),
            ReplCommand::Stop => stop(&session),
            ReplCommand::Budget(steps) => match session.set_budget(steps) {
                Ok(()) => println!("budget set to {steps} steps"),
                Err(e) => eprintln!("[{e}]"),
            },
            ReplCommand::Delay(secs) => {
                let secs = secs.min(max_delay_secs);
                session.set_delay(secs);
                println!("autoplay delay {secs}s");
            }
            ReplCommand::Reset => {
                session.reset();
                println!("{}", session.status());
            }
            ReplCommand::Status => print_status(&session),
            ReplCommand::Help => println!("{HELP}"),
            ReplCommand::Quit => break,
        }
    }

    if session.phase() == Phase::Autoplaying {
        stop(&session);
    }
    if let Some(handle) = background.take() {
        let _ = handle.await;
    }
    Ok(())
}
