use crate::guess::format_signed;
use crate::settings::Preferences;
use blackjack_lib::{Shoe, CARDS_PER_DECK};
use serde::Serialize;
use std::fmt::Display;

/// Read only snapshot of the shoe counters, shaped by the display preferences.
/// The running count is hidden unless `show_count` is set, and the true count is only meaningful
/// for shoes of more than one deck.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShoeStats {
    pub running_count: Option<i32>,
    pub true_count: Option<f64>,
    pub cards_dealt: usize,
    pub cards_remaining: usize,
    pub total_cards: usize,
    pub penetration_percent: u32,
    pub exhausted: bool,
}

impl ShoeStats {
    pub fn new(shoe: &Shoe, prefs: &Preferences) -> ShoeStats {
        let percent = f64::min(100.0, (shoe.penetration() * 100.0).round()) as u32;
        ShoeStats {
            running_count: prefs.show_count.then(|| shoe.running_count()),
            true_count: (shoe.total_cards() > CARDS_PER_DECK).then(|| shoe.true_count()),
            cards_dealt: shoe.cards_dealt(),
            cards_remaining: shoe.cards_remaining(),
            total_cards: shoe.total_cards(),
            penetration_percent: percent,
            exhausted: shoe.is_exhausted(),
        }
    }
}

impl Display for ShoeStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        const WIDTH: usize = 80;
        const TEXT_WIDTH: usize = "cards remaining".len() + 20;
        const NUM_WIDTH: usize = WIDTH - TEXT_WIDTH;

        let running = match self.running_count {
            Some(rc) => format_signed(rc),
            None => "hidden".to_string(),
        };
        let true_count = match self.true_count {
            Some(tc) => format!("{:.1}", tc),
            None => "n/a".to_string(),
        };

        writeln!(f, "{:-^WIDTH$}", "stats")?;
        writeln!(f, "{:<TEXT_WIDTH$}{:>NUM_WIDTH$}", "running count", running)?;
        writeln!(f, "{:<TEXT_WIDTH$}{:>NUM_WIDTH$}", "true count", true_count)?;
        writeln!(f, "{:<TEXT_WIDTH$}{:>NUM_WIDTH$}", "cards dealt", self.cards_dealt)?;
        writeln!(
            f,
            "{:<TEXT_WIDTH$}{:>NUM_WIDTH$}",
            "cards remaining", self.cards_remaining
        )?;
        writeln!(
            f,
            "{:<TEXT_WIDTH$}{:>NUM_WIDTH$}",
            "shoe penetration",
            format!("{}%", self.penetration_percent)
        )?;
        if self.exhausted {
            writeln!(f, "{:^WIDTH$}", "shoe exhausted, reset to continue")?;
        }
        write!(f, "{}", "-".repeat(WIDTH))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hides_running_count_unless_asked() {
        let mut shoe = Shoe::seeded(6, 9);
        shoe.draw_card();
        let mut prefs = Preferences::default();

        let stats = ShoeStats::new(&shoe, &prefs);
        assert_eq!(stats.running_count, None);
        assert_eq!(stats.cards_dealt, 1);
        assert_eq!(stats.cards_remaining, 311);
        assert!(stats.to_string().contains("hidden"));

        prefs.show_count = true;
        let stats = ShoeStats::new(&shoe, &prefs);
        assert_eq!(stats.running_count, Some(shoe.running_count()));
    }

    #[test]
    fn true_count_not_applicable_for_single_deck() {
        let shoe = Shoe::seeded(1, 9);
        let stats = ShoeStats::new(&shoe, &Preferences::new(1));
        assert_eq!(stats.true_count, None);
        assert!(stats.to_string().contains("n/a"));
    }

    #[test]
    fn penetration_percent() {
        let mut shoe = Shoe::seeded(2, 9);
        for _ in 0..26 {
            shoe.draw_card();
        }
        let stats = ShoeStats::new(&shoe, &Preferences::new(2));
        assert_eq!(stats.penetration_percent, 25);
        assert_eq!(stats.cards_remaining, 78);
        assert!(stats.to_string().contains("25%"));
    }
}
