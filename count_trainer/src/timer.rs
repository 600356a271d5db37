//! A single slot for a delayed, cancelable step. Nothing here sleeps: the slot only remembers which
//! step is due next and after what delay, and whoever drives the session fires it.

use crate::error::{Result, TrainerError};
use serde::Serialize;
use std::time::Duration;

/// Identifies one scheduled step. Firing with a ticket that is no longer in the slot does nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Ticket(u64);

impl Ticket {
    pub fn id(&self) -> u64 {
        self.0
    }

    pub fn from_id(id: u64) -> Ticket {
        Ticket(id)
    }
}

/// A step waiting in the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pending<S> {
    pub ticket: Ticket,
    pub step: S,
    pub delay: Duration,
}

pub struct StepTimer<S> {
    slot: Option<Pending<S>>,
    issued: u64,
}

impl<S> Default for StepTimer<S> {
    fn default() -> Self {
        StepTimer {
            slot: None,
            issued: 0,
        }
    }
}

impl<S: Copy> StepTimer<S> {
    pub fn new() -> StepTimer<S> {
        StepTimer::default()
    }

    /// Puts `step` in the slot. The slot must be empty: the previous step has to be cancelled or
    /// claimed first, otherwise `StepAlreadyPending` is returned and nothing changes.
    pub fn schedule(&mut self, step: S, delay: Duration) -> Result<Ticket> {
        if self.slot.is_some() {
            return Err(TrainerError::StepAlreadyPending);
        }
        self.issued += 1;
        let ticket = Ticket(self.issued);
        self.slot = Some(Pending {
            ticket,
            step,
            delay,
        });
        Ok(ticket)
    }

    /// Empties the slot, returning whatever was waiting.
    pub fn cancel(&mut self) -> Option<Pending<S>> {
        self.slot.take()
    }

    pub fn pending(&self) -> Option<Pending<S>> {
        self.slot
    }

    /// Takes the step out of the slot if `ticket` is the one waiting there.
    pub fn claim(&mut self, ticket: Ticket) -> Option<S> {
        match self.slot {
            Some(p) if p.ticket == ticket => {
                self.slot = None;
                Some(p.step)
            }
            _ => None,
        }
    }
}
