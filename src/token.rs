//! Per-card token (counter) bookkeeping.
//!
//! This module handles:
//! - The five well-known token kinds and their static definitions
//! - Stack limits (configurable for stackable kinds, 1 for status kinds)
//! - Empty-entry cleanup so "has any tokens" stays a plain map lookup

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

use crate::events::{ListenerId, Listeners, TokenChanged};
use crate::ids::CardId;

/// Errors from token operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// A token kind name outside the five known kinds.
    UnknownKind { name: String },
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenError::UnknownKind { name } => write!(f, "unknown token kind '{name}'"),
        }
    }
}

impl std::error::Error for TokenError {}

/// The five well-known token kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum TokenKind {
    DamageCounter,
    BoostCounter,
    ShieldCounter,
    StatusStun,
    StatusFreeze,
}

impl TokenKind {
    /// All kinds, stackable counters first.
    pub const ALL: [TokenKind; 5] = [
        TokenKind::DamageCounter,
        TokenKind::BoostCounter,
        TokenKind::ShieldCounter,
        TokenKind::StatusStun,
        TokenKind::StatusFreeze,
    ];

    /// Canonical identifier, stable across versions.
    pub fn id(self) -> &'static str {
        match self {
            TokenKind::DamageCounter => "damage-counter",
            TokenKind::BoostCounter => "boost-counter",
            TokenKind::ShieldCounter => "shield-counter",
            TokenKind::StatusStun => "status-stun",
            TokenKind::StatusFreeze => "status-freeze",
        }
    }

    /// The static definition for this kind.
    pub fn definition(self) -> &'static TokenDefinition {
        &DEFINITIONS[self as usize]
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for TokenKind {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "damage-counter" => Ok(TokenKind::DamageCounter),
            "boost-counter" => Ok(TokenKind::BoostCounter),
            "shield-counter" => Ok(TokenKind::ShieldCounter),
            "status-stun" => Ok(TokenKind::StatusStun),
            "status-freeze" => Ok(TokenKind::StatusFreeze),
            _ => Err(TokenError::UnknownKind {
                name: s.to_string(),
            }),
        }
    }
}

/// Static presentation and stacking data for a token kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub struct TokenDefinition {
    pub kind: TokenKind,
    /// Display name shown on the badge.
    pub name: &'static str,
    /// Asset path for the badge art.
    pub image: &'static str,
    /// Badge background color, CSS hex.
    pub color: &'static str,
    pub stackable: bool,
    /// Per-unit value when tallying board effects.
    pub value: u32,
}

/// Indexed by `TokenKind` discriminant.
pub const DEFINITIONS: [TokenDefinition; 5] = [
    TokenDefinition {
        kind: TokenKind::DamageCounter,
        name: "Damage",
        image: "tokens/damage.png",
        color: "#c0392b",
        stackable: true,
        value: 1,
    },
    TokenDefinition {
        kind: TokenKind::BoostCounter,
        name: "Boost",
        image: "tokens/boost.png",
        color: "#27ae60",
        stackable: true,
        value: 1,
    },
    TokenDefinition {
        kind: TokenKind::ShieldCounter,
        name: "Shield",
        image: "tokens/shield.png",
        color: "#2980b9",
        stackable: true,
        value: 1,
    },
    TokenDefinition {
        kind: TokenKind::StatusStun,
        name: "Stunned",
        image: "tokens/stun.png",
        color: "#f1c40f",
        stackable: false,
        value: 1,
    },
    TokenDefinition {
        kind: TokenKind::StatusFreeze,
        name: "Frozen",
        image: "tokens/freeze.png",
        color: "#5dade2",
        stackable: false,
        value: 1,
    },
];

/// Tunables for token stacking.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct TokenConfig {
    /// Per-kind cap for stackable kinds; non-stackable kinds always cap at 1.
    pub stack_limit: u32,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self { stack_limit: 99 }
    }
}

/// Full token state as an opaque, restorable value.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct TokenSnapshot {
    pub cards: HashMap<CardId, HashMap<TokenKind, u32>>,
}

/// Owns the card-id to token-count mapping for one match.
///
/// Invariant: a card present in the map has at least one kind with a count
/// above zero. Every mutating path removes a kind entry the moment it hits
/// zero and the card entry the moment its last kind goes.
#[derive(Debug)]
pub struct TokenManager {
    cards: HashMap<CardId, HashMap<TokenKind, u32>>,
    config: TokenConfig,
    listeners: Listeners<TokenChanged>,
}

impl TokenManager {
    pub fn new() -> Self {
        Self::with_config(TokenConfig::default())
    }

    pub fn with_config(config: TokenConfig) -> Self {
        Self {
            cards: HashMap::new(),
            config,
            listeners: Listeners::new("token-change"),
        }
    }

    /// Most tokens of this kind a single card can carry.
    pub fn capacity(&self, kind: TokenKind) -> u32 {
        if kind.definition().stackable {
            self.config.stack_limit
        } else {
            1
        }
    }

    /// Adds tokens, clamped at the kind's capacity. Returns the new count.
    pub fn add_token(&mut self, card: impl Into<CardId>, kind: TokenKind, count: u32) -> u32 {
        let card = card.into();
        let current = self.token_count(&card, kind);
        let new_count = current.saturating_add(count).min(self.capacity(kind));
        self.store(card, kind, current, new_count);
        new_count
    }

    /// Removes tokens, floored at zero. Returns the new count (zero when the
    /// card was never present).
    pub fn remove_token(&mut self, card: impl Into<CardId>, kind: TokenKind, count: u32) -> u32 {
        let card = card.into();
        let current = self.token_count(&card, kind);
        let new_count = current.saturating_sub(count);
        self.store(card, kind, current, new_count);
        new_count
    }

    /// Sets an exact count, clamped into `[0, capacity]`. Zero behaves
    /// exactly like removing everything of that kind.
    pub fn set_token_count(&mut self, card: impl Into<CardId>, kind: TokenKind, count: u32) -> u32 {
        let card = card.into();
        if count == 0 {
            return self.remove_token(card, kind, u32::MAX);
        }
        let current = self.token_count(&card, kind);
        let new_count = count.min(self.capacity(kind));
        self.store(card, kind, current, new_count);
        new_count
    }

    pub fn token_count(&self, card: &CardId, kind: TokenKind) -> u32 {
        self.cards
            .get(card)
            .and_then(|kinds| kinds.get(&kind))
            .copied()
            .unwrap_or(0)
    }

    /// A copy of the card's kind-to-count mapping (empty if the card has none).
    pub fn tokens_on_card(&self, card: &CardId) -> HashMap<TokenKind, u32> {
        self.cards.get(card).cloned().unwrap_or_default()
    }

    pub fn has_tokens(&self, card: &CardId) -> bool {
        self.cards.contains_key(card)
    }

    pub fn has_token(&self, card: &CardId, kind: TokenKind) -> bool {
        self.token_count(card, kind) > 0
    }

    /// Removes every token from the card, one notification per removed kind.
    pub fn clear_tokens(&mut self, card: &CardId) {
        let Some(kinds) = self.cards.remove(card) else {
            return;
        };
        let mut removed: Vec<(TokenKind, u32)> = kinds.into_iter().collect();
        removed.sort_unstable_by_key(|(kind, _)| *kind);
        for (kind, previous) in removed {
            self.listeners.emit(&TokenChanged {
                card: card.clone(),
                kind,
                previous_count: previous,
                new_count: 0,
            });
        }
    }

    pub fn clear_all_tokens(&mut self) {
        for card in self.cards_with_tokens() {
            self.clear_tokens(&card);
        }
    }

    /// All card ids carrying at least one token, sorted.
    pub fn cards_with_tokens(&self) -> Vec<CardId> {
        let mut cards: Vec<CardId> = self.cards.keys().cloned().collect();
        cards.sort_unstable();
        cards
    }

    /// Total tokens across every card and kind.
    pub fn total_token_count(&self) -> u64 {
        self.cards
            .values()
            .flat_map(|kinds| kinds.values())
            .map(|count| u64::from(*count))
            .sum()
    }

    pub fn definition(&self, kind: TokenKind) -> &'static TokenDefinition {
        kind.definition()
    }

    pub fn all_definitions(&self) -> &'static [TokenDefinition; 5] {
        &DEFINITIONS
    }

    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    pub fn on_token_change(
        &mut self,
        listener: impl FnMut(&TokenChanged) + 'static,
    ) -> ListenerId {
        self.listeners.subscribe(listener)
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    pub fn clear_listeners(&mut self) {
        self.listeners.clear();
    }

    pub fn snapshot(&self) -> TokenSnapshot {
        TokenSnapshot {
            cards: self.cards.clone(),
        }
    }

    /// Replaces the full mapping. No notifications are emitted.
    pub fn restore(&mut self, snapshot: TokenSnapshot) {
        self.cards = snapshot.cards;
    }

    /// Single write path: applies the cleanup invariant and notifies when
    /// the stored count actually changed.
    fn store(&mut self, card: CardId, kind: TokenKind, previous: u32, new_count: u32) {
        if new_count == 0 {
            if let Some(kinds) = self.cards.get_mut(&card) {
                kinds.remove(&kind);
                if kinds.is_empty() {
                    self.cards.remove(&card);
                }
            }
        } else {
            self.cards
                .entry(card.clone())
                .or_default()
                .insert(kind, new_count);
        }
        if new_count != previous {
            self.listeners.emit(&TokenChanged {
                card,
                kind,
                previous_count: previous,
                new_count,
            });
        }
    }
}

impl Default for TokenManager {
    fn default() -> Self {
        Self::new()
    }
}
