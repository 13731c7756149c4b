//! Budget extension for the continue flows.

/// Result of [`extend`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Extension {
    pub budget: u32,
    /// New selectable maximum: at least `budget`, never below the floor.
    pub ceiling: u32,
}

/// `budget + additional`, saturating. Does not touch the step counter or transcript.
pub fn extend(current_budget: u32, additional: u32, ceiling_floor: u32) -> Extension {
    let budget = current_budget.saturating_add(additional);
    Extension {
        budget,
        ceiling: budget.max(ceiling_floor),
    }
}
