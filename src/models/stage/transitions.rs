use anyhow::{bail, Result};

use super::types::Stage;

impl Stage {
    /// The stage that follows this one, or `None` when the workflow ends.
    ///
    /// The sequence is strictly linear:
    /// `1 -> 1.5 -> 2 -> 2.5 -> 3 -> 3.5 -> (disabled)`.
    pub fn next(&self) -> Option<Stage> {
        match self {
            Stage::Annotate15 => Some(Stage::Train15),
            Stage::Train15 => Some(Stage::Annotate35),
            Stage::Annotate35 => Some(Stage::Train35),
            Stage::Train35 => Some(Stage::Annotate50),
            Stage::Annotate50 => Some(Stage::TrainFull),
            Stage::TrainFull => None,
        }
    }

    /// Check if advancing from the current stage to `target` is valid.
    ///
    /// Only the immediate successor is reachable; there are no skips, no
    /// repeats, and no way back. Staying put is not an advance.
    pub fn can_advance_to(&self, target: &Stage) -> bool {
        self.next().as_ref() == Some(target)
    }

    /// Attempt to advance to `target`, returning an error if invalid.
    pub fn try_advance(&self, target: Stage) -> Result<Stage> {
        if self.can_advance_to(&target) {
            Ok(target)
        } else {
            bail!("Invalid three-step stage transition: {self} -> {target}")
        }
    }

    /// Returns the list of stages reachable from this one.
    pub fn valid_next(&self) -> Vec<Stage> {
        self.next().into_iter().collect()
    }
}
