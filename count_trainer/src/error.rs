use crate::table::Phase;
use thiserror::Error;

/// Errors the trainer can recover from. Running out of cards is not one of them, exhaustion is
/// reported through `Option` and outcome values instead.
#[derive(Debug, Error)]
pub enum TrainerError {
    #[error("Please enter a number before checking.")]
    InvalidGuess { input: String },
    #[error("cannot {action} while the table is {phase}")]
    ActionUnavailable { action: &'static str, phase: Phase },
    #[error("the seat count cannot change while a round is in progress")]
    RoundInProgress,
    #[error("{0} seats is not supported, choose between 1 and 6")]
    UnsupportedSeatCount(usize),
    #[error("{0} decks is not supported, choose 1, 2, 4, 6 or 8")]
    UnsupportedDeckCount(u32),
    #[error("a scheduled step is already pending")]
    StepAlreadyPending,
    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed settings record: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TrainerError>;
