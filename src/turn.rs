//! Turn and phase progression for a two-player match.
//!
//! This module handles:
//! - The fixed eight-phase cycle within a player's turn
//! - Turn rollover (active player switch, turn counter)
//! - Per-phase action availability and consumption

use std::fmt;

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

use crate::events::{ListenerId, Listeners, PhaseChanged, TurnChanged};
use crate::ids::PlayerId;
use crate::phase::{ActionKind, Phase, PhaseActions};

/// Errors that can occur during turn progression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnError {
    /// The action is not (or no longer) available in the current phase.
    ActionNotAvailable { action: ActionKind, phase: Phase },
    /// A phase name outside the eight known phases.
    UnknownPhase { name: String },
    /// An action name outside the five known actions.
    UnknownAction { name: String },
    /// A player id that is not one of the two configured players.
    UnknownPlayer { player: PlayerId },
}

impl fmt::Display for TurnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnError::ActionNotAvailable { action, phase } => {
                write!(
                    f,
                    "action '{action}' is not available during the '{phase}' phase"
                )
            }
            TurnError::UnknownPhase { name } => write!(f, "unknown phase '{name}'"),
            TurnError::UnknownAction { name } => write!(f, "unknown action '{name}'"),
            TurnError::UnknownPlayer { player } => {
                write!(f, "player '{player}' is not part of this match")
            }
        }
    }
}

impl std::error::Error for TurnError {}

/// Tunables for turn progression.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct TurnConfig {
    /// The player taking the very first turn skips their first draw.
    pub skip_first_draw: bool,
    /// Reserved for future multi-resource rules; not enforced.
    pub resources_per_turn: u32,
    /// Reserved for future multi-draw rules; not enforced.
    pub draws_per_turn: u32,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            skip_first_draw: true,
            resources_per_turn: 1,
            draws_per_turn: 1,
        }
    }
}

/// Returns the next phase within the turn, or None when the turn is over.
pub fn next_phase(phase: Phase) -> Option<Phase> {
    match phase {
        Phase::Start => Some(Phase::Untap),
        Phase::Untap => Some(Phase::Draw),
        Phase::Draw => Some(Phase::Resource),
        Phase::Resource => Some(Phase::Main),
        Phase::Main => Some(Phase::Clash),
        Phase::Clash => Some(Phase::Main2),
        Phase::Main2 => Some(Phase::End),
        Phase::End => None, // turn ends
    }
}

/// Full turn state as an opaque, restorable value.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct TurnSnapshot {
    pub turn_number: u32,
    pub phase: Phase,
    pub active_player: PlayerId,
    pub actions: PhaseActions,
}

/// Owns the turn counter, active player, current phase and the per-phase
/// action flags for one match.
#[derive(Debug)]
pub struct TurnManager {
    players: [PlayerId; 2],
    active_index: usize,
    turn_number: u32,
    phase: Phase,
    actions: PhaseActions,
    config: TurnConfig,
    phase_listeners: Listeners<PhaseChanged>,
    turn_listeners: Listeners<TurnChanged>,
}

impl TurnManager {
    /// Creates a manager with the default configuration. The first player is
    /// active at the top of turn 1.
    pub fn new(first: impl Into<PlayerId>, second: impl Into<PlayerId>) -> Self {
        Self::with_config(first, second, TurnConfig::default())
    }

    pub fn with_config(
        first: impl Into<PlayerId>,
        second: impl Into<PlayerId>,
        config: TurnConfig,
    ) -> Self {
        Self {
            players: [first.into(), second.into()],
            active_index: 0,
            turn_number: 1,
            phase: Phase::Start,
            actions: PhaseActions::defaults_for(Phase::Start),
            config,
            phase_listeners: Listeners::new("phase-change"),
            turn_listeners: Listeners::new("turn-change"),
        }
    }

    pub fn turn_number(&self) -> u32 {
        self.turn_number
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &TurnConfig {
        &self.config
    }

    /// Both players in configuration order.
    pub fn players(&self) -> &[PlayerId; 2] {
        &self.players
    }

    pub fn active_player(&self) -> &PlayerId {
        &self.players[self.active_index]
    }

    pub fn inactive_player(&self) -> &PlayerId {
        &self.players[1 - self.active_index]
    }

    pub fn is_active(&self, player: &PlayerId) -> bool {
        self.active_player() == player
    }

    /// A copy of the current action flags.
    pub fn actions(&self) -> PhaseActions {
        self.actions
    }

    pub fn action_available(&self, action: ActionKind) -> bool {
        self.actions.available(action)
    }

    /// Moves to the next phase in the fixed cycle.
    ///
    /// Leaving the end phase ends the turn instead of wrapping in place: the
    /// turn-change notification fires first, then the phase-change
    /// notification reports the start phase of the new turn. Returns the
    /// phase that is now current.
    pub fn advance_phase(&mut self) -> Phase {
        let previous = self.phase;
        match next_phase(previous) {
            Some(next) => self.enter_phase(next),
            None => {
                self.end_turn();
            }
        }
        let event = PhaseChanged {
            previous_phase: previous,
            new_phase: self.phase,
            turn_number: self.turn_number,
        };
        self.phase_listeners.emit(&event);
        self.phase
    }

    /// Forcibly sets the phase, for rules overrides and testing.
    ///
    /// Action flags reset to the phase's defaults; the first-turn draw
    /// suppression does not apply here. Emits a phase-change notification
    /// even when the phase did not actually change.
    pub fn set_phase(&mut self, phase: Phase) {
        let previous = self.phase;
        self.phase = phase;
        self.actions = PhaseActions::defaults_for(phase);
        let event = PhaseChanged {
            previous_phase: previous,
            new_phase: phase,
            turn_number: self.turn_number,
        };
        self.phase_listeners.emit(&event);
    }

    /// Ends the current turn: increments the turn counter, switches the
    /// active player and resets the phase to start. Returns the new turn
    /// number.
    pub fn end_turn(&mut self) -> u32 {
        let previous_turn = self.turn_number;
        self.turn_number = self.turn_number.saturating_add(1);
        self.active_index = 1 - self.active_index;
        self.phase = Phase::Start;
        self.actions = PhaseActions::defaults_for(Phase::Start);
        let event = TurnChanged {
            previous_turn,
            new_turn: self.turn_number,
            active_player: self.active_player().clone(),
        };
        self.turn_listeners.emit(&event);
        self.turn_number
    }

    /// Spends the given action for the rest of the phase.
    pub fn consume_action(&mut self, action: ActionKind) -> Result<(), TurnError> {
        if !self.actions.available(action) {
            return Err(TurnError::ActionNotAvailable {
                action,
                phase: self.phase,
            });
        }
        self.actions.consume(action);
        Ok(())
    }

    pub fn snapshot(&self) -> TurnSnapshot {
        TurnSnapshot {
            turn_number: self.turn_number,
            phase: self.phase,
            active_player: self.active_player().clone(),
            actions: self.actions,
        }
    }

    /// Replaces the full turn state with the snapshot. No notifications are
    /// emitted. Fails if the snapshot's active player is not one of the two
    /// configured players.
    pub fn restore(&mut self, snapshot: TurnSnapshot) -> Result<(), TurnError> {
        let active_index = self
            .players
            .iter()
            .position(|player| *player == snapshot.active_player)
            .ok_or_else(|| TurnError::UnknownPlayer {
                player: snapshot.active_player.clone(),
            })?;
        self.active_index = active_index;
        self.turn_number = snapshot.turn_number;
        self.phase = snapshot.phase;
        self.actions = snapshot.actions;
        Ok(())
    }

    pub fn on_phase_change(
        &mut self,
        listener: impl FnMut(&PhaseChanged) + 'static,
    ) -> ListenerId {
        self.phase_listeners.subscribe(listener)
    }

    pub fn on_turn_change(&mut self, listener: impl FnMut(&TurnChanged) + 'static) -> ListenerId {
        self.turn_listeners.subscribe(listener)
    }

    pub fn remove_phase_listener(&mut self, id: ListenerId) -> bool {
        self.phase_listeners.unsubscribe(id)
    }

    pub fn remove_turn_listener(&mut self, id: ListenerId) -> bool {
        self.turn_listeners.unsubscribe(id)
    }

    pub fn clear_listeners(&mut self) {
        self.phase_listeners.clear();
        self.turn_listeners.clear();
    }

    fn enter_phase(&mut self, phase: Phase) {
        self.phase = phase;
        self.actions = PhaseActions::defaults_for(phase);
        // The opening player does not get their first draw.
        if phase == Phase::Draw && self.turn_number == 1 && self.config.skip_first_draw {
            self.actions.can_draw = false;
        }
    }
}
