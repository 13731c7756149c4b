//! Transcript Builder: chunk events into display messages.
//!
//! Within one step the user-choice message (if any) precedes the bot message. Only the
//! messages of the open step may change; [`Transcript::finish_step`] freezes them.

use std::fmt;

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Bot,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::User => "user",
            Role::Bot => "bot",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn bot(content: impl Into<String>) -> Self {
        Self {
            role: Role::Bot,
            content: content.into(),
        }
    }
}

/// One visible change. Messages are carried in full so a renderer can redraw without diffing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TranscriptMutation {
    Appended { index: usize, message: Message },
    /// A late choice placed before the step's bot message; later indices shift by one.
    Inserted { index: usize, message: Message },
    Updated { index: usize, message: Message },
    /// The unfinished step was dropped; everything from `from` on is gone.
    Discarded { from: usize },
}

#[derive(Clone, Copy, Debug)]
struct OpenStep {
    start: usize,
    user: Option<usize>,
    bot: Option<usize>,
}

#[derive(Clone, Debug, Default)]
pub struct Transcript {
    messages: Vec<Message>,
    open: Option<OpenStep>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn is_step_open(&self) -> bool {
        self.open.is_some()
    }

    /// Applies one `chunk`. Repeated choices within a step are ignored.
    pub fn push_chunk(&mut self, content: &str, choice: Option<&str>) -> Vec<TranscriptMutation> {
        let mut out = Vec::new();
        let mut step = self.open.unwrap_or(OpenStep {
            start: self.messages.len(),
            user: None,
            bot: None,
        });

        if let Some(choice) = choice.filter(|_| step.user.is_none()) {
            let message = Message::user(choice);
            match step.bot {
                Some(bot) => {
                    self.messages.insert(bot, message.clone());
                    step.user = Some(bot);
                    step.bot = Some(bot + 1);
                    out.push(TranscriptMutation::Inserted {
                        index: bot,
                        message,
                    });
                }
                None => {
                    let index = self.messages.len();
                    self.messages.push(message.clone());
                    step.user = Some(index);
                    out.push(TranscriptMutation::Appended { index, message });
                }
            }
        }

        match step.bot {
            Some(index) => {
                if !content.is_empty() {
                    self.messages[index].content.push_str(content);
                    out.push(TranscriptMutation::Updated {
                        index,
                        message: self.messages[index].clone(),
                    });
                }
            }
            None => {
                let index = self.messages.len();
                let message = Message::bot(content);
                self.messages.push(message.clone());
                step.bot = Some(index);
                out.push(TranscriptMutation::Appended { index, message });
            }
        }

        self.open = Some(step);
        out
    }

    /// Freezes the open step. Returns false when no step was open.
    pub fn finish_step(&mut self) -> bool {
        self.open.take().is_some()
    }

    /// Drops the messages of an unfinished step.
    pub fn discard_open_step(&mut self) -> Option<TranscriptMutation> {
        let step = self.open.take()?;
        self.messages.truncate(step.start);
        Some(TranscriptMutation::Discarded { from: step.start })
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.open = None;
    }
}
