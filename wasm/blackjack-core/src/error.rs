use thiserror::Error;

use crate::game::{Action, Phase};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoundError {
    #[error("Deck exhausted: no cards left to draw")]
    DeckExhausted,

    #[error("Cannot {action} during {phase}")]
    InvalidAction { action: Action, phase: Phase },

    #[error("Invalid round state: {0}")]
    InvalidState(String),
}
