//! Change notifications for the board state managers.
//!
//! Each manager owns one [`Listeners`] registry per event type. Delivery is
//! synchronous and in registration order; a listener that panics is caught and
//! logged so the remaining listeners still run and the mutating call that
//! triggered the notification never observes the failure.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

#[cfg(feature = "serialization")]
use serde::Serialize;

use crate::ids::{CardId, PlayerId};
use crate::phase::Phase;
use crate::token::TokenKind;

/// Handle returned by a subscribe call, used to unsubscribe later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// An ordered collection of callbacks for one event type.
pub struct Listeners<E> {
    entries: Vec<(ListenerId, Box<dyn FnMut(&E)>)>,
    next_id: u64,
    label: &'static str,
}

impl<E> Listeners<E> {
    /// Creates an empty registry. The label identifies it in warning logs.
    pub fn new(label: &'static str) -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
            label,
        }
    }

    /// Registers a callback and returns its handle.
    pub fn subscribe(&mut self, listener: impl FnMut(&E) + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, Box::new(listener)));
        id
    }

    /// Removes the callback with the given handle. Returns false if it was
    /// not registered (or already removed).
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        match self.entries.iter().position(|(entry_id, _)| *entry_id == id) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Removes every callback.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Invokes every callback in registration order. A panicking callback is
    /// caught and logged; it stays registered and delivery continues.
    pub fn emit(&mut self, event: &E) {
        for (id, callback) in &mut self.entries {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| callback(event))) {
                log::warn!(
                    "{} listener {} panicked: {}",
                    self.label,
                    id.0,
                    panic_message(payload.as_ref())
                );
            }
        }
    }
}

impl<E> fmt::Debug for Listeners<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("label", &self.label)
            .field("len", &self.entries.len())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

/// Emitted after every phase change, including the wrap into a new turn.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub struct PhaseChanged {
    pub previous_phase: Phase,
    pub new_phase: Phase,
    /// Turn number after the change (differs from before only on turn wrap).
    pub turn_number: u32,
}

/// Emitted after a turn ends and the active player switches.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub struct TurnChanged {
    pub previous_turn: u32,
    pub new_turn: u32,
    pub active_player: PlayerId,
}

/// Emitted by every life mutation that goes through clamping.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub struct LifeChanged {
    pub player: PlayerId,
    pub previous_life: i64,
    pub new_life: i64,
    /// Delta after clamping; zero when the clamp landed on the old value.
    pub change: i64,
    pub source: Option<String>,
}

/// Emitted when a stored token count actually changes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub struct TokenChanged {
    pub card: CardId,
    pub kind: TokenKind,
    pub previous_count: u32,
    pub new_count: u32,
}
