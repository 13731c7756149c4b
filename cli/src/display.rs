//! Terminal rendering of [`SessionUpdate`]s: story text grows in place, status lines go between.
//!
//! Mutations carry full message content; the renderer keeps how many bytes of each message
//! it already wrote and prints only the new tail.

use std::io::{self, Write};

use questline::{Message, OperationOutcome, Role, SessionUpdate, TranscriptMutation};

/// Writes the transcript as it grows.
pub struct Renderer<W: Write> {
    out: W,
    show_status: bool,
    /// Bytes already written per transcript index.
    shown: Vec<usize>,
    /// A bot message is mid-line.
    line_open: bool,
}

impl<W: Write> Renderer<W> {
    pub fn new(out: W, show_status: bool) -> Self {
        Self {
            out,
            show_status,
            shown: Vec::new(),
            line_open: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn render(&mut self, update: &SessionUpdate) -> io::Result<()> {
        match update {
            SessionUpdate::Transcript(mutation) => self.mutation(mutation)?,
            SessionUpdate::Status(status) if self.show_status => {
                self.end_line()?;
                writeln!(self.out, "-- {status} --")?;
            }
            SessionUpdate::Status(_) | SessionUpdate::State(_) => {}
        }
        self.out.flush()
    }

    fn mutation(&mut self, mutation: &TranscriptMutation) -> io::Result<()> {
        match mutation {
            TranscriptMutation::Appended { index, message }
            | TranscriptMutation::Inserted { index, message } => {
                let at = (*index).min(self.shown.len());
                self.shown.insert(at, message.content.len());
                self.message(message)
            }
            TranscriptMutation::Updated { index, message } => {
                let Some(shown) = self.shown.get_mut(*index) else {
                    return Ok(());
                };
                let tail = message.content.get(*shown..).unwrap_or(&message.content);
                *shown = message.content.len();
                if tail.is_empty() {
                    return Ok(());
                }
                if !self.line_open {
                    write!(self.out, "{}", label(message.role))?;
                }
                write!(self.out, "{tail}")?;
                self.line_open = true;
                Ok(())
            }
            TranscriptMutation::Discarded { from } => {
                self.shown.truncate(*from);
                self.end_line()?;
                writeln!(self.out, "(unfinished step discarded)")
            }
        }
    }

    fn message(&mut self, message: &Message) -> io::Result<()> {
        self.end_line()?;
        match message.role {
            Role::User => writeln!(self.out, "{}{}", label(Role::User), message.content),
            Role::Bot => {
                write!(self.out, "{}{}", label(Role::Bot), message.content)?;
                self.line_open = true;
                Ok(())
            }
        }
    }

    fn end_line(&mut self) -> io::Result<()> {
        if self.line_open {
            writeln!(self.out)?;
            self.line_open = false;
        }
        Ok(())
    }
}

fn label(role: Role) -> &'static str {
    match role {
        Role::User => "> choice ",
        Role::Bot => "",
    }
}

/// One line describing how an operation ended.
pub fn describe_outcome(outcome: &OperationOutcome) -> String {
    match outcome {
        OperationOutcome::Ready { step } => format!("ready at step {step}; `next` to continue"),
        OperationOutcome::Completed { step } => format!("story complete at step {step}"),
        OperationOutcome::Stopped { step } => {
            format!("stopped at step {step}; `resume` to continue")
        }
        OperationOutcome::Failed(e) => format!("error: {e}"),
        OperationOutcome::Ignored(e) => format!("ignored: {e}"),
        OperationOutcome::Superseded => "replaced by reset".to_string(),
    }
}
