use std::path::PathBuf;
use std::time::Duration;

/// Struct for configuring a trainer session: the table size, the pacing of dealt cards and where
/// preferences are stored.
#[derive(Debug, Clone)]
pub struct TrainerConfig {
    pub num_seats: usize,
    pub deal_delay: Duration,
    pub dealer_reveal_delay: Duration,
    pub dealer_draw_delay: Duration,
    pub drill_history_limit: usize,
    pub storage_dir: Option<PathBuf>,
    pub seed: Option<u64>,
}

impl TrainerConfig {
    /// Associated method for returning a new `TrainerConfigBuilder`, every setting left unset falls back to its default.
    pub fn new() -> TrainerConfigBuilder {
        TrainerConfigBuilder {
            num_seats: None,
            deal_delay: None,
            dealer_reveal_delay: None,
            dealer_draw_delay: None,
            drill_history_limit: None,
            storage_dir: None,
            seed: None,
        }
    }
}

impl Default for TrainerConfig {
    fn default() -> Self {
        TrainerConfig::new().build()
    }
}

/// Struct to implement the builder pattern for `TrainerConfig`
#[derive(Debug, Clone)]
pub struct TrainerConfigBuilder {
    num_seats: Option<usize>,
    deal_delay: Option<Duration>,
    dealer_reveal_delay: Option<Duration>,
    dealer_draw_delay: Option<Duration>,
    drill_history_limit: Option<usize>,
    storage_dir: Option<PathBuf>,
    seed: Option<u64>,
}

impl TrainerConfigBuilder {
    /// Method for setting the number of player seats at the table
    pub fn num_seats(&mut self, seats: usize) -> &mut Self {
        self.num_seats = Some(seats);
        self
    }

    /// Method for setting the pause between cards of the initial deal
    pub fn deal_delay(&mut self, delay: Duration) -> &mut Self {
        self.deal_delay = Some(delay);
        self
    }

    /// Method for setting the pause between revealing the hole card and the dealer's first draw
    pub fn dealer_reveal_delay(&mut self, delay: Duration) -> &mut Self {
        self.dealer_reveal_delay = Some(delay);
        self
    }

    /// Method for setting the pause between dealer draws
    pub fn dealer_draw_delay(&mut self, delay: Duration) -> &mut Self {
        self.dealer_draw_delay = Some(delay);
        self
    }

    /// Sets every pacing delay to zero, cards are then dealt as fast as the driver fires steps.
    pub fn instant(&mut self) -> &mut Self {
        self.deal_delay = Some(Duration::ZERO);
        self.dealer_reveal_delay = Some(Duration::ZERO);
        self.dealer_draw_delay = Some(Duration::ZERO);
        self
    }

    /// Method for setting how many recent cards the single card drill keeps
    pub fn drill_history_limit(&mut self, limit: usize) -> &mut Self {
        self.drill_history_limit = Some(limit);
        self
    }

    /// Method for setting the directory the preferences file lives in
    pub fn storage_dir(&mut self, dir: impl Into<PathBuf>) -> &mut Self {
        self.storage_dir = Some(dir.into());
        self
    }

    /// Method for seeding the shoe so shuffles can be replayed
    pub fn seed(&mut self, seed: u64) -> &mut Self {
        self.seed = Some(seed);
        self
    }

    /// Method for building a `TrainerConfig` from the given builder.
    pub fn build(&mut self) -> TrainerConfig {
        TrainerConfig {
            num_seats: self.num_seats.unwrap_or(3),
            deal_delay: self.deal_delay.unwrap_or(Duration::from_millis(500)),
            dealer_reveal_delay: self
                .dealer_reveal_delay
                .unwrap_or(Duration::from_millis(400)),
            dealer_draw_delay: self.dealer_draw_delay.unwrap_or(Duration::from_millis(500)),
            drill_history_limit: self.drill_history_limit.unwrap_or(8),
            storage_dir: self.storage_dir.take(),
            seed: self.seed,
        }
    }
}
