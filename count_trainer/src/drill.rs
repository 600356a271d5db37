//! The single card drill: deal one card at a time and check the running count on demand.

use crate::error::Result;
use crate::guess::{check_running_count, GuessOutcome};
use crate::settings::Preferences;
use blackjack_lib::{Card, Shoe};
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt::Display;
use tracing::{debug, info};

/// Default number of cards kept in the drill's discard pile.
pub const RECENT_LIMIT: usize = 8;

/// What happened when the drill asked the shoe for a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "camelCase")]
pub enum DealOutcome {
    Dealt { card: Card, delta: i32 },
    Exhausted,
}

/// Describes a Hi-Lo delta the way the drill shows it next to a card.
pub fn delta_text(delta: i32) -> String {
    match delta {
        0 => "neutral".to_string(),
        d if d > 0 => format!("+{d}"),
        d => d.to_string(),
    }
}

impl Display for DealOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DealOutcome::Dealt { card, delta } => write!(
                f,
                "Drew {} ({}). Running count updated.",
                card,
                delta_text(*delta)
            ),
            DealOutcome::Exhausted => {
                write!(f, "Shoe exhausted. Reset the shoe to keep practicing.")
            }
        }
    }
}

/// Struct that holds the state of a single card drill. The shoe itself is owned elsewhere and passed in per call.
pub struct SingleCardDrill {
    current: Option<Card>,
    recent: VecDeque<Card>,
    recent_limit: usize,
    guess: Option<String>,
    feedback: String,
    validation: Option<String>,
}

impl Default for SingleCardDrill {
    fn default() -> Self {
        SingleCardDrill::new(RECENT_LIMIT)
    }
}

impl SingleCardDrill {
    const WELCOME: &'static str = "Deal a card to start practicing your running count.";

    /// Associated method for a new drill that remembers up to `recent_limit` cards.
    pub fn new(recent_limit: usize) -> SingleCardDrill {
        SingleCardDrill {
            current: None,
            recent: VecDeque::with_capacity(recent_limit),
            recent_limit,
            guess: None,
            feedback: SingleCardDrill::WELCOME.to_string(),
            validation: None,
        }
    }

    /// Draws the next card. An empty shoe only updates the feedback, everything else is left as it was.
    pub fn deal(&mut self, shoe: &mut Shoe) -> DealOutcome {
        let outcome = match shoe.draw_card() {
            Some(card) => {
                self.validation = None;
                self.current = Some(card);
                self.recent.push_front(card);
                self.recent.truncate(self.recent_limit);
                DealOutcome::Dealt {
                    card,
                    delta: card.hi_lo(),
                }
            }
            None => DealOutcome::Exhausted,
        };
        debug!(?outcome, "drill deal");
        self.feedback = outcome.to_string();
        outcome
    }

    /// Checks `input` against the shoe's running count. Invalid input sets the validation message and
    /// returns the error without touching the rest of the drill.
    pub fn check_guess(&mut self, input: &str, shoe: &Shoe) -> Result<GuessOutcome> {
        let outcome = match check_running_count(input, shoe) {
            Ok(o) => o,
            Err(e) => {
                self.validation = Some(e.to_string());
                return Err(e);
            }
        };
        self.validation = None;
        self.guess = Some(input.trim().to_string());
        self.feedback = outcome.to_string();
        debug!(?outcome, "drill guess checked");
        Ok(outcome)
    }

    /// Starts a new shoe and clears the drill.
    pub fn reset(&mut self, shoe: &mut Shoe) {
        shoe.reset_shoe();
        self.clear();
        info!("drill reset");
    }

    /// Forgets the current card, the recent cards and the last guess. Called when the shoe behind
    /// the drill has been rebuilt.
    pub fn clear(&mut self) {
        self.current = None;
        self.recent.clear();
        self.guess = None;
        self.validation = None;
        self.feedback = "Shoe reset. Running count is back to 0.".to_string();
    }

    /// Getter for the card most recently dealt
    pub fn current(&self) -> Option<&Card> {
        self.current.as_ref()
    }

    /// Cards dealt so far, newest first.
    pub fn recent(&self) -> &VecDeque<Card> {
        &self.recent
    }

    /// The discard pile to display, if the preferences ask for one.
    pub fn discard_pile(&self, prefs: &Preferences) -> Option<&VecDeque<Card>> {
        prefs.show_discard_pile.then_some(&self.recent)
    }

    /// The Hi-Lo delta of the current card, shown only in training mode.
    pub fn hint(&self, prefs: &Preferences) -> Option<i32> {
        if prefs.training_mode {
            self.current.map(|c| c.hi_lo())
        } else {
            None
        }
    }

    pub fn guess(&self) -> Option<&str> {
        self.guess.as_deref()
    }

    pub fn feedback(&self) -> &str {
        &self.feedback
    }

    pub fn validation(&self) -> Option<&str> {
        self.validation.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TrainerError;
    use blackjack_lib::{Rank, Suit};

    fn shoe_of(ranks: &[Rank]) -> Shoe {
        Shoe::stacked(ranks.iter().map(|r| Card::new(*r, Suit::Hearts)).collect())
    }

    #[test]
    fn deal_records_current_card_and_delta() {
        let mut shoe = shoe_of(&[Rank::Five, Rank::King]);
        let mut drill = SingleCardDrill::default();

        let outcome = drill.deal(&mut shoe);
        let five = Card::new(Rank::Five, Suit::Hearts);
        assert_eq!(outcome, DealOutcome::Dealt { card: five, delta: 1 });
        assert_eq!(drill.current(), Some(&five));
        assert_eq!(drill.feedback(), "Drew 5♥ (+1). Running count updated.");

        drill.deal(&mut shoe);
        assert_eq!(drill.recent().len(), 2);
        assert_eq!(drill.recent()[0].rank, Rank::King);
        assert_eq!(shoe.running_count(), 0);
    }

    #[test]
    fn exhausted_shoe_leaves_drill_untouched() {
        let mut shoe = shoe_of(&[Rank::Seven]);
        let mut drill = SingleCardDrill::default();
        drill.deal(&mut shoe);

        assert_eq!(drill.deal(&mut shoe), DealOutcome::Exhausted);
        assert!(shoe.is_exhausted());
        assert_eq!(drill.current().map(|c| c.rank), Some(Rank::Seven));
        assert_eq!(drill.recent().len(), 1);
        assert_eq!(
            drill.feedback(),
            "Shoe exhausted. Reset the shoe to keep practicing."
        );
    }

    #[test]
    fn recent_cards_are_capped() {
        let mut shoe = Shoe::seeded(1, 21);
        let mut drill = SingleCardDrill::default();
        for _ in 0..12 {
            drill.deal(&mut shoe);
        }
        assert_eq!(drill.recent().len(), RECENT_LIMIT);
        assert_eq!(drill.recent()[0], shoe.history()[0]);
    }

    #[test]
    fn invalid_guess_only_sets_validation() {
        let mut shoe = shoe_of(&[Rank::Two]);
        let mut drill = SingleCardDrill::default();
        drill.deal(&mut shoe);
        let before = drill.feedback().to_string();

        let err = drill.check_guess("twelve", &shoe).unwrap_err();
        assert!(matches!(err, TrainerError::InvalidGuess { .. }));
        assert_eq!(
            drill.validation(),
            Some("Please enter a number before checking.")
        );
        assert_eq!(drill.feedback(), before);
        assert_eq!(drill.guess(), None);
    }

    #[test]
    fn guess_checks_running_count() {
        let mut shoe = shoe_of(&[Rank::Five, Rank::King, Rank::Three, Rank::Nine, Rank::Ace]);
        let mut drill = SingleCardDrill::default();
        assert_eq!(
            drill.check_guess("4", &shoe).unwrap(),
            GuessOutcome::NothingDealt
        );

        for _ in 0..3 {
            drill.deal(&mut shoe);
        }
        assert_eq!(
            drill.check_guess("1", &shoe).unwrap(),
            GuessOutcome::Correct { actual: 1 }
        );
        assert_eq!(drill.feedback(), "Correct! Running count is +1.");

        for _ in 0..2 {
            drill.deal(&mut shoe);
        }
        assert_eq!(
            drill.check_guess("1", &shoe).unwrap(),
            GuessOutcome::Incorrect {
                guess: 1.0,
                actual: 0
            }
        );
        assert_eq!(
            drill.check_guess("0", &shoe).unwrap(),
            GuessOutcome::Correct { actual: 0 }
        );
        assert_eq!(drill.feedback(), "Correct! Running count is 0.");
        assert_eq!(drill.validation(), None);
    }

    #[test]
    fn reset_clears_drill_and_shoe() {
        let mut shoe = Shoe::seeded(2, 8);
        let mut drill = SingleCardDrill::default();
        drill.deal(&mut shoe);
        drill.check_guess("0", &shoe).unwrap();

        drill.reset(&mut shoe);
        assert!(drill.current().is_none());
        assert!(drill.recent().is_empty());
        assert!(drill.guess().is_none());
        assert_eq!(shoe.cards_dealt(), 0);
        assert_eq!(shoe.running_count(), 0);
    }

    #[test]
    fn clear_keeps_the_shoe() {
        let mut shoe = shoe_of(&[Rank::Four, Rank::Queen]);
        let mut drill = SingleCardDrill::default();
        drill.deal(&mut shoe);
        drill.check_guess("1", &shoe).unwrap();

        drill.clear();
        assert!(drill.current().is_none());
        assert!(drill.recent().is_empty());
        assert!(drill.guess().is_none());
        assert_eq!(shoe.cards_dealt(), 1);
    }

    #[test]
    fn preferences_gate_hint_and_discard_pile() {
        let mut shoe = shoe_of(&[Rank::Ace]);
        let mut drill = SingleCardDrill::default();
        drill.deal(&mut shoe);

        let mut prefs = Preferences::default();
        assert_eq!(drill.hint(&prefs), None);
        assert!(drill.discard_pile(&prefs).is_some());

        prefs.training_mode = true;
        prefs.show_discard_pile = false;
        assert_eq!(drill.hint(&prefs), Some(-1));
        assert!(drill.discard_pile(&prefs).is_none());
    }

    #[test]
    fn delta_descriptions() {
        assert_eq!(delta_text(1), "+1");
        assert_eq!(delta_text(0), "neutral");
        assert_eq!(delta_text(-1), "-1");
    }
}
