//! Server-side record of one game.

/// Who spoke a line of the story.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Speaker {
    GameMaster,
    Player,
}

#[derive(Clone, Debug, Default)]
pub struct GameRecord {
    pub step_count: u32,
    pub history: Vec<(Speaker, String)>,
}

impl GameRecord {
    pub fn new(opening: String) -> Self {
        Self {
            step_count: 0,
            history: vec![(Speaker::GameMaster, opening)],
        }
    }

    /// Records the player's choice and advances the counter. Returns the new step number and
    /// whether it is the last one allowed by `max_steps`.
    pub fn advance(&mut self, choice: u8, max_steps: u32) -> (u32, bool) {
        self.history.push((Speaker::Player, choice.to_string()));
        self.step_count += 1;
        (self.step_count, self.step_count >= max_steps)
    }

    pub fn narrate(&mut self, text: String) {
        self.history.push((Speaker::GameMaster, text));
    }
}
