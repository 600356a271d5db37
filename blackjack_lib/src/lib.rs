//! Cards, hand scoring and the counted dealing shoe used by the Hi-Lo trainer.

pub mod card;
pub mod shoe;

pub mod prelude {
    pub use super::card::{
        build_shoe, format_card, hand_value, hi_lo_value, shuffle, Card, HandValue, Rank, Suit,
        CARDS_PER_DECK,
    };
    pub use super::shoe::{CardSource, Shoe, ShoeSettings, HISTORY_LIMIT};
}

pub use prelude::*;
