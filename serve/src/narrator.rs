//! Narration source. The demo uses [`ScriptedNarrator`]; prompt construction and real model
//! calls are outside this crate.

use std::sync::OnceLock;

use regex::Regex;

/// Produces the game master's text for each step.
pub trait Narrator: Send + Sync {
    /// Opening scene, ending with four numbered options.
    fn opening(&self) -> String;

    /// The player's pick for `step` (1-based), one of 1..=4.
    fn choose(&self, step: u32) -> u8;

    /// Continuation after `choice`. On the final step the story must conclude.
    fn continue_story(&self, step: u32, choice: u8, final_step: bool) -> String;
}

const SCENES: &[&str] = &[
    "The torchlight trembles as a cold draft sweeps the corridor, carrying the smell of old rain.",
    "A rope bridge sways over the chasm, and something large shifts in the darkness below.",
    "The village elder studies you for a long moment before sliding a sealed letter across the table.",
    "Moonlight spills through a broken roof onto a circle of runes that pulse faintly blue.",
    "A merchant caravan lies overturned on the road, its wheels still slowly turning.",
];

const OPTIONS: &[&str] = &[
    "Press forward carefully",
    "Search the surroundings",
    "Call out and wait for an answer",
    "Turn back and find another way",
];

/// Deterministic narrator: the same step and choice always produce the same text.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScriptedNarrator;

fn with_options(scene: &str) -> String {
    let mut text = scene.to_string();
    text.push_str("\n\n");
    for (i, option) in OPTIONS.iter().enumerate() {
        text.push_str(&format!("{}. {}\n", i + 1, option));
    }
    text.trim_end().to_string()
}

impl Narrator for ScriptedNarrator {
    fn opening(&self) -> String {
        with_options(
            "You wake at the edge of an ancient forest. Mist curls between the trees, and a \
             weathered signpost points three ways at once.",
        )
    }

    fn choose(&self, step: u32) -> u8 {
        (step.saturating_sub(1) % 4) as u8 + 1
    }

    fn continue_story(&self, step: u32, choice: u8, final_step: bool) -> String {
        let scene = SCENES[(step as usize + choice as usize) % SCENES.len()];
        if final_step {
            format!(
                "Choosing option {choice}, you face the last trial of the journey. {scene} \
                 Every lesson of the road comes together, allies answer your call, and the \
                 shadow over the land finally lifts. The quest is complete"
            )
        } else {
            with_options(&format!("You chose option {choice}. {scene}"))
        }
    }
}

fn option_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n?\d+[\.\):][^\n]*").expect("static regex is valid"))
}

const WEAK_OPENINGS: &[&str] = &["you", "as", "the", "and", "but", "or", "while", "when", "if"];

/// Post-processing of a final step: numbered options removed, a too-short or awkward
/// conclusion replaced by a stock ending, terminal punctuation guaranteed.
pub fn finalize_ending(text: &str, choice: u8) -> String {
    let cleaned = option_line().replace_all(text.trim(), "").trim().to_string();
    let lower = cleaned.to_lowercase();
    let weak = cleaned.split_whitespace().count() < 20
        || WEAK_OPENINGS
            .iter()
            .any(|w| lower.starts_with(&format!("{w} ")));
    let mut ending = if weak {
        tracing::warn!(
            words = cleaned.split_whitespace().count(),
            "final narration unusable, using stock ending"
        );
        format!(
            "With choice {choice}, the adventure takes its final turn. The hero faces the \
             ultimate challenge with courage and determination. All the skills learned \
             throughout the journey come together in this decisive moment. Peace returns to \
             the land as the threat is finally overcome. The quest is complete, and the \
             legend begins"
        )
    } else {
        cleaned
    };
    if !ending.ends_with(['.', '!', '?']) {
        ending.push('.');
    }
    ending
}

/// Splits narration into streaming deltas (word by word, whitespace kept).
pub fn deltas(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        current.push(ch);
        if ch == ' ' || ch == '\n' {
            out.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}
