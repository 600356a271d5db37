//! The dealing shoe and its Hi-Lo bookkeeping.

use crate::card::{build_shoe, hi_lo_value, shuffle, Card, CARDS_PER_DECK};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::VecDeque;
use tracing::{debug, info};

/// Maximum number of drawn cards remembered by a `Shoe`, most recent first.
pub const HISTORY_LIMIT: usize = 10;

/// Trait for anything cards can be dealt from. Consumers such as a table only ever draw from,
/// or fully reset, the source and never see its contents.
pub trait CardSource {
    /// Draws the next card, `None` once the source is exhausted.
    fn draw_card(&mut self) -> Option<Card>;
    /// Replaces the source with a freshly shuffled one.
    fn reset_shoe(&mut self);
}

/// Trait for the settings a `Shoe` follows. `reset_token` is a change signal only, whenever it
/// moves the shoe is rebuilt.
pub trait ShoeSettings {
    fn num_decks(&self) -> u32;
    fn reset_token(&self) -> u64;
}

/// Struct for a multi deck shoe that keeps the running count of everything dealt from it.
pub struct Shoe {
    cards: VecDeque<Card>,
    num_decks: u32,
    total_cards: usize,
    cards_dealt: usize,
    running_count: i32,
    history: VecDeque<Card>,
    exhausted: bool,
    synced_token: Option<u64>,
    rng: StdRng,
}

impl Shoe {
    /// Associated method for building a freshly shuffled shoe of `num_decks` decks.
    pub fn new(num_decks: u32) -> Shoe {
        Shoe::with_rng(num_decks, StdRng::from_entropy())
    }

    /// Associated method for building a shoe whose shuffles are reproducible from `seed`.
    pub fn seeded(num_decks: u32, seed: u64) -> Shoe {
        Shoe::with_rng(num_decks, StdRng::seed_from_u64(seed))
    }

    fn with_rng(num_decks: u32, rng: StdRng) -> Shoe {
        let mut shoe = Shoe {
            cards: VecDeque::new(),
            num_decks,
            total_cards: 0,
            cards_dealt: 0,
            running_count: 0,
            history: VecDeque::with_capacity(HISTORY_LIMIT),
            exhausted: false,
            synced_token: None,
            rng,
        };
        shoe.initialize(num_decks);
        shoe
    }

    /// Associated method for a shoe that deals `cards` in exactly the given order.
    /// The deck count is the number of decks needed to hold the cards, a later reset deals a normal shuffled shoe of that size.
    pub fn stacked(cards: Vec<Card>) -> Shoe {
        let num_decks = u32::max(1, cards.len().div_ceil(CARDS_PER_DECK) as u32);
        let total_cards = cards.len();
        Shoe {
            cards: cards.into(),
            num_decks,
            total_cards,
            cards_dealt: 0,
            running_count: 0,
            history: VecDeque::with_capacity(HISTORY_LIMIT),
            exhausted: false,
            synced_token: None,
            rng: StdRng::from_entropy(),
        }
    }

    /// Rebuilds and shuffles a shoe of `num_decks` decks, zeroing the count and forgetting the history.
    pub fn initialize(&mut self, num_decks: u32) {
        let fresh = shuffle(&build_shoe(num_decks), &mut self.rng);
        self.num_decks = num_decks;
        self.total_cards = fresh.len();
        self.cards = fresh.into();
        self.cards_dealt = 0;
        self.running_count = 0;
        self.history.clear();
        self.exhausted = false;
        info!(num_decks, total_cards = self.total_cards, "shoe shuffled");
    }

    /// Rebuilds the shoe when `settings` name a different deck count or a new reset token than the
    /// ones this shoe was last built from. Returns true if the shoe was rebuilt.
    pub fn sync<S: ShoeSettings + ?Sized>(&mut self, settings: &S) -> bool {
        let token = settings.reset_token();
        let stale = self.num_decks != settings.num_decks() || self.synced_token != Some(token);
        if stale {
            self.initialize(settings.num_decks());
            self.synced_token = Some(token);
        }
        stale
    }

    /// Getter for the number of decks the shoe was built from.
    pub fn num_decks(&self) -> u32 {
        self.num_decks
    }

    pub fn running_count(&self) -> i32 {
        self.running_count
    }

    pub fn cards_remaining(&self) -> usize {
        self.cards.len()
    }

    pub fn cards_dealt(&self) -> usize {
        self.cards_dealt
    }

    pub fn total_cards(&self) -> usize {
        self.total_cards
    }

    /// Fraction of the shoe already dealt, between 0 and 1.
    pub fn penetration(&self) -> f64 {
        if self.total_cards > 0 {
            self.cards_dealt as f64 / self.total_cards as f64
        } else {
            0.0
        }
    }

    pub fn decks_remaining(&self) -> f64 {
        self.cards.len() as f64 / CARDS_PER_DECK as f64
    }

    /// The running count divided by the decks left in the shoe, rounded to one decimal place (halves round up).
    /// Zero once the shoe is empty.
    pub fn true_count(&self) -> f64 {
        let decks_remaining = self.decks_remaining();
        if decks_remaining > 0.0 {
            ((self.running_count as f64 / decks_remaining) * 10.0 + 0.5).floor() / 10.0
        } else {
            0.0
        }
    }

    /// The most recently drawn cards, newest first.
    pub fn history(&self) -> &VecDeque<Card> {
        &self.history
    }

    /// True after a draw was attempted against an empty shoe.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Snapshot of the cards still in the shoe, in the order they will be dealt.
    pub fn remaining(&self) -> Vec<Card> {
        self.cards.iter().copied().collect()
    }

    /// Deals the next card off the front of the shoe and counts it.
    /// Returns `None`, and flags the shoe as exhausted, when there is nothing left to deal.
    pub fn draw_card(&mut self) -> Option<Card> {
        let card = match self.cards.pop_front() {
            Some(c) => c,
            None => {
                self.exhausted = true;
                debug!("draw attempted on an empty shoe");
                return None;
            }
        };

        self.exhausted = false;
        self.running_count += hi_lo_value(&card);
        self.cards_dealt += 1;
        self.history.push_front(card);
        self.history.truncate(HISTORY_LIMIT);
        debug!(%card, running_count = self.running_count, remaining = self.cards.len(), "card drawn");
        Some(card)
    }

    /// Starts over with an entirely new shuffle of the current deck count.
    pub fn reset_shoe(&mut self) {
        self.initialize(self.num_decks);
    }
}

impl CardSource for Shoe {
    fn draw_card(&mut self) -> Option<Card> {
        Shoe::draw_card(self)
    }

    fn reset_shoe(&mut self) {
        Shoe::reset_shoe(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{Rank, Suit};

    struct Settings {
        num_decks: u32,
        reset_token: u64,
    }

    impl ShoeSettings for Settings {
        fn num_decks(&self) -> u32 {
            self.num_decks
        }

        fn reset_token(&self) -> u64 {
            self.reset_token
        }
    }

    fn cards(ranks: &[Rank]) -> Vec<Card> {
        ranks.iter().map(|r| Card::new(*r, Suit::Clubs)).collect()
    }

    #[test]
    fn new_shoe_is_full_and_uncounted() {
        let shoe = Shoe::seeded(6, 1);
        assert_eq!(shoe.total_cards(), 312);
        assert_eq!(shoe.cards_remaining(), 312);
        assert_eq!(shoe.cards_dealt(), 0);
        assert_eq!(shoe.running_count(), 0);
        assert!(shoe.history().is_empty());
        assert!(!shoe.is_exhausted());
    }

    #[test]
    fn draining_a_shoe_counts_back_to_zero() {
        for num_decks in [1u32, 2, 4, 6, 8] {
            let mut shoe = Shoe::seeded(num_decks, num_decks as u64);
            let total = shoe.total_cards();
            let mut draws = 0;
            while shoe.draw_card().is_some() {
                draws += 1;
                assert_eq!(shoe.cards_dealt() + shoe.cards_remaining(), total);
            }
            assert_eq!(draws, total);
            assert_eq!(shoe.running_count(), 0);
            assert!(shoe.is_exhausted());
            assert_eq!(shoe.draw_card(), None);
            assert_eq!(shoe.cards_dealt(), total);
            assert_eq!(shoe.true_count(), 0.0);
            assert_eq!(shoe.penetration(), 1.0);
        }
    }

    #[test]
    fn draws_follow_shuffle_order() {
        let mut shoe = Shoe::seeded(1, 99);
        let order = shoe.remaining();
        let drawn: Vec<Card> = std::iter::from_fn(|| shoe.draw_card()).collect();
        assert_eq!(drawn, order);
    }

    #[test]
    fn running_count_follows_each_draw() {
        let mut shoe = Shoe::stacked(cards(&[
            Rank::Five,
            Rank::King,
            Rank::Three,
            Rank::Nine,
            Rank::Ace,
        ]));
        let mut counts = vec![];
        while shoe.draw_card().is_some() {
            counts.push(shoe.running_count());
        }
        assert_eq!(counts, vec![1, 0, 1, 1, 0]);
        assert_eq!(shoe.running_count(), 0);
    }

    #[test]
    fn true_count_divides_by_decks_remaining() {
        let mut stack = cards(&[Rank::Two, Rank::Three, Rank::Four, Rank::Five]);
        stack.extend(cards(&[Rank::Eight; 104]));
        let mut shoe = Shoe::stacked(stack);
        for _ in 0..4 {
            shoe.draw_card();
        }
        assert_eq!(shoe.running_count(), 4);
        assert_eq!(shoe.cards_remaining(), 104);
        assert_eq!(shoe.true_count(), 2.0);

        // Fractional decks still divide
        for _ in 0..78 {
            shoe.draw_card();
        }
        assert_eq!(shoe.cards_remaining(), 26);
        assert_eq!(shoe.true_count(), 8.0);
    }

    #[test]
    fn true_count_rounds_to_one_decimal() {
        let mut stack = cards(&[Rank::Two]);
        stack.extend(cards(&[Rank::Eight; 155]));
        let mut shoe = Shoe::stacked(stack);
        shoe.draw_card();
        // 1 / (155 / 52) = 0.3354...
        assert_eq!(shoe.true_count(), 0.3);
    }

    #[test]
    fn history_is_capped_and_newest_first() {
        let mut shoe = Shoe::seeded(1, 3);
        let mut drawn = vec![];
        for _ in 0..15 {
            drawn.push(shoe.draw_card().unwrap());
        }
        assert_eq!(shoe.history().len(), HISTORY_LIMIT);
        assert_eq!(shoe.history()[0], drawn[14]);
        assert_eq!(shoe.history()[HISTORY_LIMIT - 1], drawn[5]);
    }

    #[test]
    fn reset_starts_a_new_shoe() {
        let mut shoe = Shoe::seeded(2, 11);
        for _ in 0..30 {
            shoe.draw_card();
        }
        shoe.reset_shoe();
        assert_eq!(shoe.cards_remaining(), 104);
        assert_eq!(shoe.cards_dealt(), 0);
        assert_eq!(shoe.running_count(), 0);
        assert!(shoe.history().is_empty());
    }

    #[test]
    fn stacked_shoe_resets_to_a_full_shoe() {
        let mut shoe = Shoe::stacked(cards(&[Rank::Two]));
        assert_eq!(shoe.num_decks(), 1);
        assert_eq!(shoe.total_cards(), 1);
        shoe.draw_card();
        assert_eq!(shoe.draw_card(), None);
        assert!(shoe.is_exhausted());
        shoe.reset_shoe();
        assert_eq!(shoe.total_cards(), 52);
        assert!(!shoe.is_exhausted());
    }

    #[test]
    fn sync_rebuilds_on_deck_or_token_change() {
        let mut shoe = Shoe::seeded(6, 5);
        let mut settings = Settings {
            num_decks: 6,
            reset_token: 0,
        };
        // The first sync always adopts the token
        assert!(shoe.sync(&settings));
        shoe.draw_card();
        assert!(!shoe.sync(&settings));
        assert_eq!(shoe.cards_dealt(), 1);

        settings.reset_token = 1;
        assert!(shoe.sync(&settings));
        assert_eq!(shoe.cards_dealt(), 0);

        settings.num_decks = 2;
        assert!(shoe.sync(&settings));
        assert_eq!(shoe.total_cards(), 104);
    }
}
