use crate::error::{Result, TrainerError};
use blackjack_lib::Shoe;
use serde::Serialize;
use std::fmt::Display;

/// The result of comparing a guess against the running count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "camelCase")]
pub enum GuessOutcome {
    /// Nothing has been dealt from the shoe, so the count is 0 whatever was entered.
    NothingDealt,
    Correct { actual: i32 },
    Incorrect { guess: f64, actual: i32 },
}

impl GuessOutcome {
    pub fn is_correct(&self) -> bool {
        matches!(self, GuessOutcome::Correct { .. })
    }
}

impl Display for GuessOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GuessOutcome::NothingDealt => write!(f, "No cards dealt yet. Running count is 0."),
            GuessOutcome::Correct { actual } => {
                write!(f, "Correct! Running count is {}.", format_signed(*actual))
            }
            GuessOutcome::Incorrect { guess, actual } => write!(
                f,
                "Not quite. You entered {}, actual running count is {}.",
                format_signed(*guess),
                format_signed(*actual)
            ),
        }
    }
}

/// Formats a count with an explicit plus sign for positive values.
pub fn format_signed<T>(value: T) -> String
where
    T: Display + PartialOrd + Default,
{
    if value > T::default() {
        format!("+{}", value)
    } else {
        value.to_string()
    }
}

/// Parses guess text. Blank, non-numeric and non-finite input is rejected.
pub fn parse_guess(input: &str) -> Result<f64> {
    let trimmed = input.trim();
    match trimmed.parse::<f64>() {
        Ok(n) if !trimmed.is_empty() && n.is_finite() => Ok(n),
        _ => Err(TrainerError::InvalidGuess {
            input: input.to_string(),
        }),
    }
}

/// Checks `input` against the running count of `shoe`.
pub fn check_running_count(input: &str, shoe: &Shoe) -> Result<GuessOutcome> {
    let guess = parse_guess(input)?;
    if shoe.cards_dealt() == 0 {
        return Ok(GuessOutcome::NothingDealt);
    }

    let actual = shoe.running_count();
    if guess == actual as f64 {
        Ok(GuessOutcome::Correct { actual })
    } else {
        Ok(GuessOutcome::Incorrect { guess, actual })
    }
}
