use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

use crate::turn::TurnError;

/// One of the eight fixed sub-stages of a player's turn, in cycle order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum Phase {
    Start,
    Untap,
    Draw,
    Resource,
    Main,
    Clash,
    Main2,
    End,
}

impl Phase {
    /// All phases in turn order.
    pub const ALL: [Phase; 8] = [
        Phase::Start,
        Phase::Untap,
        Phase::Draw,
        Phase::Resource,
        Phase::Main,
        Phase::Clash,
        Phase::Main2,
        Phase::End,
    ];

    /// Canonical lowercase name, stable across versions.
    pub fn name(self) -> &'static str {
        match self {
            Phase::Start => "start",
            Phase::Untap => "untap",
            Phase::Draw => "draw",
            Phase::Resource => "resource",
            Phase::Main => "main",
            Phase::Clash => "clash",
            Phase::Main2 => "main2",
            Phase::End => "end",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Phase {
    type Err = TurnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(Phase::Start),
            "untap" => Ok(Phase::Untap),
            "draw" => Ok(Phase::Draw),
            "resource" => Ok(Phase::Resource),
            "main" => Ok(Phase::Main),
            "clash" => Ok(Phase::Clash),
            "main2" => Ok(Phase::Main2),
            "end" => Ok(Phase::End),
            _ => Err(TurnError::UnknownPhase {
                name: s.to_string(),
            }),
        }
    }
}

/// An action a player may take at most once per phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum ActionKind {
    Draw,
    PlayResource,
    PlayCards,
    Attack,
    ActivateAbilities,
}

impl ActionKind {
    pub const ALL: [ActionKind; 5] = [
        ActionKind::Draw,
        ActionKind::PlayResource,
        ActionKind::PlayCards,
        ActionKind::Attack,
        ActionKind::ActivateAbilities,
    ];

    /// Canonical lowercase name, stable across versions.
    pub fn name(self) -> &'static str {
        match self {
            ActionKind::Draw => "draw",
            ActionKind::PlayResource => "play-resource",
            ActionKind::PlayCards => "play-cards",
            ActionKind::Attack => "attack",
            ActionKind::ActivateAbilities => "activate-abilities",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ActionKind {
    type Err = TurnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draw" => Ok(ActionKind::Draw),
            "play-resource" => Ok(ActionKind::PlayResource),
            "play-cards" => Ok(ActionKind::PlayCards),
            "attack" => Ok(ActionKind::Attack),
            "activate-abilities" => Ok(ActionKind::ActivateAbilities),
            _ => Err(TurnError::UnknownAction {
                name: s.to_string(),
            }),
        }
    }
}

/// Which actions remain available in the current phase.
///
/// Flags only move true to false while a phase is underway (via consumption);
/// they are replaced wholesale when the phase changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct PhaseActions {
    pub can_draw: bool,
    pub can_play_resource: bool,
    pub can_play_cards: bool,
    pub can_attack: bool,
    pub can_activate_abilities: bool,
}

impl PhaseActions {
    /// No actions available (start, untap, end).
    pub const NONE: PhaseActions = PhaseActions {
        can_draw: false,
        can_play_resource: false,
        can_play_cards: false,
        can_attack: false,
        can_activate_abilities: false,
    };

    /// The default action set for the given phase.
    pub fn defaults_for(phase: Phase) -> Self {
        match phase {
            Phase::Start | Phase::Untap | Phase::End => Self::NONE,
            Phase::Draw => Self {
                can_draw: true,
                ..Self::NONE
            },
            Phase::Resource => Self {
                can_play_resource: true,
                ..Self::NONE
            },
            Phase::Main | Phase::Main2 => Self {
                can_play_cards: true,
                can_activate_abilities: true,
                ..Self::NONE
            },
            Phase::Clash => Self {
                can_attack: true,
                can_activate_abilities: true,
                ..Self::NONE
            },
        }
    }

    /// Returns true if the given action has not been consumed this phase.
    pub fn available(self, action: ActionKind) -> bool {
        match action {
            ActionKind::Draw => self.can_draw,
            ActionKind::PlayResource => self.can_play_resource,
            ActionKind::PlayCards => self.can_play_cards,
            ActionKind::Attack => self.can_attack,
            ActionKind::ActivateAbilities => self.can_activate_abilities,
        }
    }

    /// Marks the given action as used for the rest of the phase.
    pub fn consume(&mut self, action: ActionKind) {
        match action {
            ActionKind::Draw => self.can_draw = false,
            ActionKind::PlayResource => self.can_play_resource = false,
            ActionKind::PlayCards => self.can_play_cards = false,
            ActionKind::Attack => self.can_attack = false,
            ActionKind::ActivateAbilities => self.can_activate_abilities = false,
        }
    }
}
