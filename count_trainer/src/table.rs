//! Multi seat table simulation. The sequencer deals rounds, runs each seat's turn and plays the
//! dealer out to 17, drawing every card through a `CardSource`.

use crate::config::TrainerConfig;
use crate::error::{Result, TrainerError};
use crate::timer::{Pending, StepTimer, Ticket};
use blackjack_lib::{format_card, hand_value, Card, CardSource, HandValue};
use serde::Serialize;
use std::fmt::Display;
use std::time::Duration;
use tracing::{debug, info};

pub const MIN_SEATS: usize = 1;
pub const MAX_SEATS: usize = 6;
/// The dealer stands on any total of at least this much.
pub const DEALER_STANDS_ON: u8 = 17;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Idle,
    Dealing,
    PlayerTurn,
    DealerTurn,
    RoundFinished,
}

impl Phase {
    /// True between the first dealt card and the dealer's last one.
    pub fn in_round(self) -> bool {
        matches!(self, Phase::Dealing | Phase::PlayerTurn | Phase::DealerTurn)
    }
}

impl Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Phase::Idle => "idle",
            Phase::Dealing => "dealing",
            Phase::PlayerTurn => "on a player turn",
            Phase::DealerTurn => "on the dealer turn",
            Phase::RoundFinished => "finished with the round",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SeatStatus {
    Playing,
    Stood,
    Busted,
}

/// A player seat. `id` is the 1-based number shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seat {
    pub id: usize,
    hand: Vec<Card>,
    status: SeatStatus,
}

impl Seat {
    fn new(id: usize) -> Seat {
        Seat {
            id,
            hand: Vec::new(),
            status: SeatStatus::Playing,
        }
    }

    pub fn hand(&self) -> &[Card] {
        &self.hand
    }

    pub fn status(&self) -> SeatStatus {
        self.status
    }

    pub fn value(&self) -> HandValue {
        hand_value(&self.hand)
    }
}

fn empty_seats(count: usize) -> Vec<Seat> {
    (1..=count).map(Seat::new).collect()
}

/// The work a scheduled step performs when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStep {
    /// Deal the card at this position of the initial deal order, or finish the deal when past the end.
    Deal(usize),
    /// Let the dealer take one more action.
    DealerPlay,
}

/// The last thing that happened at the table, displayed as feedback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TableEvent {
    Waiting,
    Dealing,
    RoundDealt,
    Dealt { seat: usize, card: Card },
    Busted { seat: usize, total: u8 },
    Stood { seat: usize },
    DealerPlaying,
    DealerStands { total: u8 },
    DealerBusts { total: u8 },
    ShoeExhausted,
    TableCleared,
    ShoeReset,
    SeatCountChanged(usize),
}

impl Display for TableEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableEvent::Waiting => write!(f, "Deal a new round to start the table flow."),
            TableEvent::Dealing => write!(f, "Dealing..."),
            TableEvent::RoundDealt => {
                write!(f, "New round dealt. Track the flow and keep counting.")
            }
            TableEvent::Dealt { seat, card } => {
                write!(f, "Dealt {} to Player {}.", format_card(Some(card)), seat)
            }
            TableEvent::Busted { seat, total } => write!(
                f,
                "Player {} busted at {}. Moving to next player.",
                seat, total
            ),
            TableEvent::Stood { seat } => write!(f, "Player {} stands.", seat),
            TableEvent::DealerPlaying => write!(f, "Dealer playing..."),
            TableEvent::DealerStands { total } => {
                write!(f, "Dealer stands on {}. Round finished.", total)
            }
            TableEvent::DealerBusts { total } => {
                write!(f, "Dealer busts with {}. Round finished.", total)
            }
            TableEvent::ShoeExhausted => write!(f, "Shoe exhausted. Reset to continue."),
            TableEvent::TableCleared => {
                write!(f, "Table cleared. Running count stays the same.")
            }
            TableEvent::ShoeReset => write!(f, "Shoe reset. Running count is back to 0."),
            TableEvent::SeatCountChanged(n) => write!(
                f,
                "Player count set to {}. Round and shoe have been reset.",
                n
            ),
        }
    }
}

/// Outcome of a hit on the active seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    Dealt { card: Card, value: HandValue },
    Busted { card: Card, total: u8 },
    Exhausted,
}

#[derive(Debug, Clone, Copy)]
struct Pacing {
    deal: Duration,
    dealer_reveal: Duration,
    dealer_draw: Duration,
}

/// Struct that sequences rounds of blackjack at a table of `seat_count` seats.
/// Card pacing goes through a single `StepTimer` slot, starting a round or clearing the table always
/// cancels whatever step is waiting before anything else happens.
pub struct TableSequencer {
    seat_count: usize,
    seats: Vec<Seat>,
    dealer_hand: Vec<Card>,
    hole_revealed: bool,
    active_seat: usize,
    phase: Phase,
    timer: StepTimer<TableStep>,
    pacing: Pacing,
    last_event: TableEvent,
}

impl TableSequencer {
    /// Associated method for a table configured by `config`.
    pub fn new(config: &TrainerConfig) -> Result<TableSequencer> {
        check_seat_count(config.num_seats)?;
        Ok(TableSequencer {
            seat_count: config.num_seats,
            seats: empty_seats(config.num_seats),
            dealer_hand: Vec::new(),
            hole_revealed: true,
            active_seat: 0,
            phase: Phase::Idle,
            timer: StepTimer::new(),
            pacing: Pacing {
                deal: config.deal_delay,
                dealer_reveal: config.dealer_reveal_delay,
                dealer_draw: config.dealer_draw_delay,
            },
            last_event: TableEvent::Waiting,
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn seat_count(&self) -> usize {
        self.seat_count
    }

    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    /// Index of the seat whose turn it is.
    pub fn active_seat(&self) -> usize {
        self.active_seat
    }

    pub fn dealer_hand(&self) -> &[Card] {
        &self.dealer_hand
    }

    pub fn hole_revealed(&self) -> bool {
        self.hole_revealed
    }

    /// The dealer's cards as a player sees them, `None` standing in for the face down hole card.
    pub fn dealer_visible_hand(&self) -> Vec<Option<Card>> {
        self.dealer_hand
            .iter()
            .enumerate()
            .map(|(i, c)| {
                if i == 1 && !self.hole_revealed {
                    None
                } else {
                    Some(*c)
                }
            })
            .collect()
    }

    /// Value of the dealer cards that are face up.
    pub fn dealer_visible_value(&self) -> HandValue {
        let visible: Vec<Card> = self.dealer_visible_hand().into_iter().flatten().collect();
        hand_value(&visible)
    }

    pub fn last_event(&self) -> TableEvent {
        self.last_event
    }

    /// The step waiting to be fired, if any.
    pub fn pending(&self) -> Option<Pending<TableStep>> {
        self.timer.pending()
    }

    fn total_deal_steps(&self) -> usize {
        2 * (self.seat_count + 1)
    }

    fn reset_hands(&mut self) {
        self.seats = empty_seats(self.seat_count);
        self.dealer_hand.clear();
        self.active_seat = 0;
    }

    /// Starts a new round: any waiting step is cancelled, hands are cleared and the first card is dealt
    /// straight away. The remaining cards of the deal follow as scheduled steps, two passes over
    /// seat 1..N and then the dealer.
    pub fn deal_new_round<C: CardSource + ?Sized>(&mut self, source: &mut C) -> Result<()> {
        if let Some(cancelled) = self.timer.cancel() {
            debug!(step = ?cancelled.step, "cancelled pending step for new round");
        }
        self.reset_hands();
        self.hole_revealed = false;
        self.phase = Phase::Dealing;
        self.last_event = TableEvent::Dealing;
        info!(seats = self.seat_count, "dealing new round");
        self.deal_step(0, source)
    }

    fn deal_step<C: CardSource + ?Sized>(&mut self, step: usize, source: &mut C) -> Result<()> {
        if step >= self.total_deal_steps() {
            self.phase = Phase::PlayerTurn;
            self.active_seat = 0;
            self.last_event = TableEvent::RoundDealt;
            debug!("initial deal complete");
            return Ok(());
        }

        let card = match source.draw_card() {
            Some(c) => c,
            None => {
                // The round stays incomplete, cards already dealt remain on the table
                self.timer.cancel();
                self.last_event = TableEvent::ShoeExhausted;
                info!(step, "shoe ran out during the deal");
                return Ok(());
            }
        };

        let position = step % (self.seat_count + 1);
        if position == self.seat_count {
            self.dealer_hand.push(card);
        } else {
            self.seats[position].hand.push(card);
        }
        debug!(step, %card, "dealt");

        self.timer.schedule(TableStep::Deal(step + 1), self.pacing.deal)?;
        Ok(())
    }

    fn require_player_turn(&self, action: &'static str) -> Result<()> {
        if self.phase != Phase::PlayerTurn {
            return Err(TrainerError::ActionUnavailable {
                action,
                phase: self.phase,
            });
        }
        Ok(())
    }

    /// Deals one card to the active seat. Going over 21 busts the seat and moves the turn on.
    pub fn hit<C: CardSource + ?Sized>(&mut self, source: &mut C) -> Result<HitOutcome> {
        self.require_player_turn("hit")?;

        let card = match source.draw_card() {
            Some(c) => c,
            None => {
                self.last_event = TableEvent::ShoeExhausted;
                return Ok(HitOutcome::Exhausted);
            }
        };

        let seat = &mut self.seats[self.active_seat];
        seat.hand.push(card);
        let value = hand_value(&seat.hand);
        let id = seat.id;

        if value.is_bust() {
            seat.status = SeatStatus::Busted;
            self.last_event = TableEvent::Busted {
                seat: id,
                total: value.total,
            };
            info!(seat = id, total = value.total, "seat busted");
            self.advance()?;
            Ok(HitOutcome::Busted {
                card,
                total: value.total,
            })
        } else {
            self.last_event = TableEvent::Dealt { seat: id, card };
            Ok(HitOutcome::Dealt { card, value })
        }
    }

    /// Ends the active seat's turn.
    pub fn stand(&mut self) -> Result<()> {
        self.require_player_turn("stand")?;

        let seat = &mut self.seats[self.active_seat];
        if seat.status == SeatStatus::Playing {
            seat.status = SeatStatus::Stood;
        }
        self.last_event = TableEvent::Stood { seat: seat.id };
        self.advance()
    }

    /// Picks the next seat still playing after the active one. When none is left after it, the first
    /// seat still playing is taken only if it is not the active seat; otherwise the dealer plays.
    fn advance(&mut self) -> Result<()> {
        let active = self.active_seat;
        let next = self
            .seats
            .iter()
            .enumerate()
            .position(|(i, s)| i > active && s.status == SeatStatus::Playing);
        let first = self
            .seats
            .iter()
            .position(|s| s.status == SeatStatus::Playing);

        match next.or(first.filter(|&i| i != active)) {
            Some(i) => {
                self.active_seat = i;
                debug!(seat = self.seats[i].id, "turn advanced");
                Ok(())
            }
            None => self.begin_dealer_turn(),
        }
    }

    fn begin_dealer_turn(&mut self) -> Result<()> {
        self.hole_revealed = true;
        self.phase = Phase::DealerTurn;
        self.last_event = TableEvent::DealerPlaying;
        info!("dealer turn");
        self.timer
            .schedule(TableStep::DealerPlay, self.pacing.dealer_reveal)?;
        Ok(())
    }

    fn dealer_step<C: CardSource + ?Sized>(&mut self, source: &mut C) -> Result<()> {
        let value = hand_value(&self.dealer_hand);
        if value.total >= DEALER_STANDS_ON {
            self.finish_round(value);
            return Ok(());
        }

        match source.draw_card() {
            Some(card) => {
                self.dealer_hand.push(card);
                debug!(%card, "dealer draws");
                self.timer
                    .schedule(TableStep::DealerPlay, self.pacing.dealer_draw)?;
            }
            None => {
                self.phase = Phase::RoundFinished;
                self.last_event = TableEvent::ShoeExhausted;
                info!("shoe ran out during the dealer turn");
            }
        }
        Ok(())
    }

    fn finish_round(&mut self, value: HandValue) {
        self.phase = Phase::RoundFinished;
        self.last_event = if value.is_bust() {
            TableEvent::DealerBusts { total: value.total }
        } else {
            TableEvent::DealerStands { total: value.total }
        };
        info!(dealer_total = value.total, "round finished");
    }

    /// Fires the step identified by `ticket`. Returns false, without changing anything, if that step
    /// was cancelled or has already run.
    pub fn fire<C: CardSource + ?Sized>(&mut self, ticket: Ticket, source: &mut C) -> Result<bool> {
        let step = match self.timer.claim(ticket) {
            Some(s) => s,
            None => {
                debug!(ticket = ticket.id(), "ignoring stale step");
                return Ok(false);
            }
        };

        match step {
            TableStep::Deal(i) => self.deal_step(i, source)?,
            TableStep::DealerPlay => self.dealer_step(source)?,
        }
        Ok(true)
    }

    /// Fires every pending step back to back, ignoring the delays. Returns how many steps ran.
    pub fn settle<C: CardSource + ?Sized>(&mut self, source: &mut C) -> Result<usize> {
        let mut fired = 0;
        while let Some(p) = self.timer.pending() {
            self.fire(p.ticket, source)?;
            fired += 1;
        }
        Ok(fired)
    }

    /// Cancels any waiting step and returns to an empty table. The shoe and its count are left alone.
    pub fn clear_table(&mut self) {
        self.timer.cancel();
        self.reset_hands();
        self.hole_revealed = true;
        self.phase = Phase::Idle;
        self.last_event = TableEvent::TableCleared;
        info!("table cleared");
    }

    /// Clears the table and starts a new shoe.
    pub fn reset_shoe<C: CardSource + ?Sized>(&mut self, source: &mut C) {
        source.reset_shoe();
        self.clear_table();
        self.last_event = TableEvent::ShoeReset;
    }

    /// Changes the number of seats between rounds. The table goes back to idle and the shoe is reset.
    pub fn set_seat_count<C: CardSource + ?Sized>(
        &mut self,
        seats: usize,
        source: &mut C,
    ) -> Result<()> {
        check_seat_count(seats)?;
        if self.phase.in_round() {
            return Err(TrainerError::RoundInProgress);
        }
        self.seat_count = seats;
        self.reset_shoe(source);
        self.last_event = TableEvent::SeatCountChanged(seats);
        info!(seats, "seat count changed");
        Ok(())
    }

    /// A serializable view of the table for display.
    pub fn snapshot(&self) -> TableSnapshot {
        TableSnapshot {
            phase: self.phase,
            active_seat: (self.phase == Phase::PlayerTurn).then(|| self.seats[self.active_seat].id),
            seats: self
                .seats
                .iter()
                .map(|s| SeatView {
                    id: s.id,
                    cards: s.hand.clone(),
                    value: s.value(),
                    status: s.status,
                })
                .collect(),
            dealer_cards: self.dealer_visible_hand(),
            dealer_value: self.dealer_visible_value(),
            pending: self.timer.pending().map(|p| PendingView {
                ticket: p.ticket,
                delay_ms: p.delay.as_millis() as u64,
            }),
            message: self.last_event.to_string(),
        }
    }
}

fn check_seat_count(seats: usize) -> Result<()> {
    if !(MIN_SEATS..=MAX_SEATS).contains(&seats) {
        return Err(TrainerError::UnsupportedSeatCount(seats));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatView {
    pub id: usize,
    pub cards: Vec<Card>,
    pub value: HandValue,
    pub status: SeatStatus,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingView {
    pub ticket: Ticket,
    pub delay_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSnapshot {
    pub phase: Phase,
    pub active_seat: Option<usize>,
    pub seats: Vec<SeatView>,
    pub dealer_cards: Vec<Option<Card>>,
    pub dealer_value: HandValue,
    pub pending: Option<PendingView>,
    pub message: String,
}
