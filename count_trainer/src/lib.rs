pub mod config;
pub mod drill;
pub mod error;
pub mod guess;
pub mod logging;
pub mod settings;
pub mod stats;
pub mod table;
pub mod timer;

use tracing::info;

pub mod prelude {
    pub use super::{
        config::{TrainerConfig, TrainerConfigBuilder},
        drill::{DealOutcome, SingleCardDrill},
        error::{Result, TrainerError},
        guess::{check_running_count, format_signed, GuessOutcome},
        settings::{FileStorage, MemoryStorage, PreferenceStorage, Preferences},
        stats::ShoeStats,
        table::{HitOutcome, Phase, SeatStatus, TableEvent, TableSequencer, TableSnapshot},
        timer::Ticket,
        TrainerSession,
    };
    pub use blackjack_lib::prelude::*;
}

use prelude::*;

/// Struct that ties a trainer session together: the preferences and where they are stored, and the
/// single card drill and the table, each dealing from its own shoe. Both shoes follow the deck count
/// and reset token in the preferences.
pub struct TrainerSession {
    config: TrainerConfig,
    storage: Box<dyn PreferenceStorage + Send>,
    preferences: Preferences,
    drill_shoe: Shoe,
    table_shoe: Shoe,
    drill: SingleCardDrill,
    table: TableSequencer,
}

fn shoe_for(preferences: &Preferences, seed: Option<u64>) -> Shoe {
    let mut shoe = match seed {
        Some(seed) => Shoe::seeded(preferences.num_decks(), seed),
        None => Shoe::new(preferences.num_decks()),
    };
    shoe.sync(preferences);
    shoe
}

impl TrainerSession {
    /// Associated method for a session configured by `config`. Preferences are read from the configured
    /// storage directory, or kept in memory when there is none.
    pub fn new(config: TrainerConfig) -> Result<TrainerSession> {
        let storage: Box<dyn PreferenceStorage + Send> = match &config.storage_dir {
            Some(dir) => Box::new(FileStorage::new(dir.clone())),
            None => Box::new(MemoryStorage::new()),
        };
        TrainerSession::with_storage(config, storage)
    }

    /// Associated method for a session whose preferences live in `storage`.
    pub fn with_storage(
        config: TrainerConfig,
        storage: Box<dyn PreferenceStorage + Send>,
    ) -> Result<TrainerSession> {
        let preferences = Preferences::load(&*storage);
        let drill_shoe = shoe_for(&preferences, config.seed);
        let table_shoe = shoe_for(&preferences, config.seed.map(|s| s.wrapping_add(1)));
        let drill = SingleCardDrill::new(config.drill_history_limit);
        let table = TableSequencer::new(&config)?;
        info!(
            num_decks = preferences.num_decks(),
            seats = config.num_seats,
            "trainer session started"
        );

        Ok(TrainerSession {
            config,
            storage,
            preferences,
            drill_shoe,
            table_shoe,
            drill,
            table,
        })
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    /// Mutable access to the session only flags (count visibility, discard pile, training mode).
    /// Deck count changes go through `set_num_decks`.
    pub fn preferences_mut(&mut self) -> &mut Preferences {
        &mut self.preferences
    }

    /// The shoe the single card drill deals from.
    pub fn drill_shoe(&self) -> &Shoe {
        &self.drill_shoe
    }

    /// The shoe the table deals from.
    pub fn table_shoe(&self) -> &Shoe {
        &self.table_shoe
    }

    pub fn drill(&self) -> &SingleCardDrill {
        &self.drill
    }

    pub fn table(&self) -> &TableSequencer {
        &self.table
    }

    pub fn drill_stats(&self) -> ShoeStats {
        ShoeStats::new(&self.drill_shoe, &self.preferences)
    }

    pub fn table_stats(&self) -> ShoeStats {
        ShoeStats::new(&self.table_shoe, &self.preferences)
    }

    /// Changes the deck count, persists it and rebuilds both shoes. The drill and the table are
    /// cleared since their cards came from the old shoes.
    pub fn set_num_decks(&mut self, num_decks: u32) -> Result<()> {
        self.preferences
            .set_num_decks(num_decks, &mut *self.storage)?;
        if self.drill_shoe.sync(&self.preferences) {
            self.drill.clear();
        }
        if self.table_shoe.sync(&self.preferences) {
            self.table.clear_table();
        }
        Ok(())
    }

    /// Starts new shoes for both modes.
    pub fn reset_shoe(&mut self) {
        self.drill.reset(&mut self.drill_shoe);
        self.table.reset_shoe(&mut self.table_shoe);
    }

    pub fn drill_deal(&mut self) -> DealOutcome {
        self.drill.deal(&mut self.drill_shoe)
    }

    pub fn drill_check(&mut self, input: &str) -> Result<GuessOutcome> {
        self.drill.check_guess(input, &self.drill_shoe)
    }

    pub fn drill_reset(&mut self) {
        self.drill.reset(&mut self.drill_shoe);
    }

    pub fn table_deal(&mut self) -> Result<()> {
        self.table.deal_new_round(&mut self.table_shoe)
    }

    pub fn table_hit(&mut self) -> Result<HitOutcome> {
        self.table.hit(&mut self.table_shoe)
    }

    pub fn table_stand(&mut self) -> Result<()> {
        self.table.stand()
    }

    pub fn table_clear(&mut self) {
        self.table.clear_table();
    }

    pub fn table_reset_shoe(&mut self) {
        self.table.reset_shoe(&mut self.table_shoe);
    }

    pub fn table_set_seats(&mut self, seats: usize) -> Result<()> {
        self.table.set_seat_count(seats, &mut self.table_shoe)
    }

    /// Checks a running count guess made at the table.
    pub fn table_check(&self, input: &str) -> Result<GuessOutcome> {
        check_running_count(input, &self.table_shoe)
    }

    /// Fires the table step identified by `ticket`, see `TableSequencer::fire`.
    pub fn table_fire(&mut self, ticket: Ticket) -> Result<bool> {
        self.table.fire(ticket, &mut self.table_shoe)
    }

    /// Runs every pending table step without waiting.
    pub fn table_settle(&mut self) -> Result<usize> {
        self.table.settle(&mut self.table_shoe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> TrainerSession {
        let config = TrainerConfig::new().seed(31).instant().build();
        TrainerSession::new(config).unwrap()
    }

    #[test]
    fn drill_and_table_keep_separate_counts() {
        let mut session = session();
        session.drill_deal();
        session.table_deal().unwrap();
        session.table_settle().unwrap();
        assert_eq!(session.drill_shoe().cards_dealt(), 1);
        assert_eq!(session.table_shoe().cards_dealt(), 8);
        assert_eq!(session.table().phase(), Phase::PlayerTurn);
    }

    #[test]
    fn table_side_resets_leave_the_drill_alone() {
        let mut session = session();
        session.drill_deal();
        session.drill_deal();
        let count = session.drill_shoe().running_count();

        session.table_set_seats(2).unwrap();
        session.table_reset_shoe();
        assert_eq!(session.drill().recent().len(), 2);
        assert_eq!(session.drill_shoe().cards_dealt(), 2);
        let guess = count.to_string();
        assert!(session.drill_check(&guess).unwrap().is_correct());
    }

    #[test]
    fn deck_change_rebuilds_shoes_and_clears_both_modes() {
        let mut session = session();
        session.drill_deal();
        session.table_deal().unwrap();
        session.set_num_decks(2).unwrap();

        assert_eq!(session.drill_shoe().total_cards(), 104);
        assert_eq!(session.table_shoe().total_cards(), 104);
        assert_eq!(session.drill_shoe().cards_dealt(), 0);
        assert_eq!(session.table_shoe().cards_dealt(), 0);
        assert!(session.drill().current().is_none());
        assert!(session.drill().recent().is_empty());
        assert_eq!(
            session.drill_check("3").unwrap(),
            GuessOutcome::NothingDealt
        );
        assert_eq!(session.table().phase(), Phase::Idle);
        assert!(session.table().pending().is_none());
        assert_eq!(session.preferences().reset_token(), 1);
    }

    #[test]
    fn rejected_deck_change_keeps_shoes() {
        let mut session = session();
        session.drill_deal();
        assert!(session.set_num_decks(5).is_err());
        assert_eq!(session.drill_shoe().cards_dealt(), 1);
        assert!(session.drill().current().is_some());
    }
}
