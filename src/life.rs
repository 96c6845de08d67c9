//! Per-player life totals with range clamping and change notifications.

use std::collections::HashMap;
use std::fmt;

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

use crate::events::{LifeChanged, ListenerId, Listeners};
use crate::ids::PlayerId;

/// Errors from life total operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifeError {
    /// The player was never initialized.
    UnknownPlayer { player: PlayerId },
    /// Damage and healing amounts must be non-negative.
    NegativeAmount { amount: i64 },
}

impl fmt::Display for LifeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifeError::UnknownPlayer { player } => {
                write!(f, "player '{player}' has not been initialized")
            }
            LifeError::NegativeAmount { amount } => {
                write!(f, "amount must be non-negative, got {amount}")
            }
        }
    }
}

impl std::error::Error for LifeError {}

/// Tunables for life tracking.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct LifeConfig {
    pub starting_life: i64,
    /// Floor every stored total is clamped to.
    pub min_life: i64,
    /// Optional ceiling; None means unbounded.
    pub max_life: Option<i64>,
}

impl Default for LifeConfig {
    fn default() -> Self {
        Self {
            starting_life: 20,
            min_life: 0,
            max_life: None,
        }
    }
}

/// Full life state as an opaque, restorable value.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct LifeSnapshot {
    pub totals: HashMap<PlayerId, i64>,
}

/// Owns the player-id to life-total mapping for one match.
#[derive(Debug)]
pub struct LifeManager {
    totals: HashMap<PlayerId, i64>,
    config: LifeConfig,
    listeners: Listeners<LifeChanged>,
}

impl LifeManager {
    pub fn new() -> Self {
        Self::with_config(LifeConfig::default())
    }

    pub fn with_config(config: LifeConfig) -> Self {
        Self {
            totals: HashMap::new(),
            config,
            listeners: Listeners::new("life-change"),
        }
    }

    /// Registers the player at the configured starting life.
    pub fn initialize_player(&mut self, player: impl Into<PlayerId>) -> i64 {
        let starting = self.config.starting_life;
        self.initialize_player_with(player, starting)
    }

    /// Registers the player at the given life total. Calling again
    /// hard-resets the total; no clamp applies and nothing is emitted.
    pub fn initialize_player_with(&mut self, player: impl Into<PlayerId>, life: i64) -> i64 {
        self.totals.insert(player.into(), life);
        life
    }

    pub fn life(&self, player: &PlayerId) -> Result<i64, LifeError> {
        self.totals
            .get(player)
            .copied()
            .ok_or_else(|| LifeError::UnknownPlayer {
                player: player.clone(),
            })
    }

    pub fn has_player(&self, player: &PlayerId) -> bool {
        self.totals.contains_key(player)
    }

    /// Clamps `value` into the configured range, stores it, and notifies.
    /// Returns the emitted event; its delta is computed after clamping.
    pub fn set_life(
        &mut self,
        player: &PlayerId,
        value: i64,
        source: Option<&str>,
    ) -> Result<LifeChanged, LifeError> {
        let previous = self.life(player)?;
        let new_life = self.clamp(value);
        self.totals.insert(player.clone(), new_life);
        let event = LifeChanged {
            player: player.clone(),
            previous_life: previous,
            new_life,
            change: new_life.saturating_sub(previous),
            source: source.map(str::to_string),
        };
        self.listeners.emit(&event);
        Ok(event)
    }

    pub fn change_life(
        &mut self,
        player: &PlayerId,
        delta: i64,
        source: Option<&str>,
    ) -> Result<LifeChanged, LifeError> {
        let current = self.life(player)?;
        self.set_life(player, current.saturating_add(delta), source)
    }

    /// Subtracts `amount` (clamped at the floor). Negative amounts are
    /// rejected and leave the total untouched.
    pub fn deal_damage(
        &mut self,
        player: &PlayerId,
        amount: i64,
        source: Option<&str>,
    ) -> Result<LifeChanged, LifeError> {
        if amount < 0 {
            return Err(LifeError::NegativeAmount { amount });
        }
        self.change_life(player, -amount, source)
    }

    /// Adds `amount` (clamped at the ceiling, if any). Negative amounts are
    /// rejected and leave the total untouched.
    pub fn heal(
        &mut self,
        player: &PlayerId,
        amount: i64,
        source: Option<&str>,
    ) -> Result<LifeChanged, LifeError> {
        if amount < 0 {
            return Err(LifeError::NegativeAmount { amount });
        }
        self.change_life(player, amount, source)
    }

    /// A player is alive while their total is above the configured floor.
    pub fn is_alive(&self, player: &PlayerId) -> Result<bool, LifeError> {
        Ok(self.life(player)? > self.config.min_life)
    }

    pub fn is_dead(&self, player: &PlayerId) -> Result<bool, LifeError> {
        Ok(!self.is_alive(player)?)
    }

    /// Sets the player back to the configured starting life, source "reset".
    pub fn reset_life(&mut self, player: &PlayerId) -> Result<LifeChanged, LifeError> {
        let starting = self.config.starting_life;
        self.set_life(player, starting, Some("reset"))
    }

    /// Resets every initialized player, source "reset". Returns the emitted
    /// events in player-id order.
    pub fn reset_all_life(&mut self) -> Vec<LifeChanged> {
        let starting = self.config.starting_life;
        let players = self.player_ids();
        let mut events = Vec::with_capacity(players.len());
        for player in players {
            if let Ok(event) = self.set_life(&player, starting, Some("reset")) {
                events.push(event);
            }
        }
        events
    }

    /// All initialized player ids, sorted.
    pub fn player_ids(&self) -> Vec<PlayerId> {
        let mut players: Vec<PlayerId> = self.totals.keys().cloned().collect();
        players.sort_unstable();
        players
    }

    /// A copy of the full id-to-life mapping.
    pub fn life_totals(&self) -> HashMap<PlayerId, i64> {
        self.totals.clone()
    }

    pub fn starting_life(&self) -> i64 {
        self.config.starting_life
    }

    pub fn config(&self) -> &LifeConfig {
        &self.config
    }

    pub fn on_life_change(&mut self, listener: impl FnMut(&LifeChanged) + 'static) -> ListenerId {
        self.listeners.subscribe(listener)
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    pub fn clear_listeners(&mut self) {
        self.listeners.clear();
    }

    pub fn snapshot(&self) -> LifeSnapshot {
        LifeSnapshot {
            totals: self.totals.clone(),
        }
    }

    /// Replaces the full mapping. No notifications are emitted.
    pub fn restore(&mut self, snapshot: LifeSnapshot) {
        self.totals = snapshot.totals;
    }

    fn clamp(&self, value: i64) -> i64 {
        let floored = value.max(self.config.min_life);
        match self.config.max_life {
            Some(max) => floored.min(max),
            None => floored,
        }
    }
}

impl Default for LifeManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn p(id: &str) -> PlayerId {
        PlayerId::from(id)
    }

    #[test]
    fn test_initialize_and_query() {
        let mut life = LifeManager::new();
        assert_eq!(life.initialize_player("p1"), 20);
        assert_eq!(life.initialize_player_with("p2", 35), 35);
        assert_eq!(life.life(&p("p1")).unwrap(), 20);
        assert_eq!(life.life(&p("p2")).unwrap(), 35);
        assert!(life.has_player(&p("p1")));
        assert!(!life.has_player(&p("p3")));
        assert_eq!(life.starting_life(), 20);
        assert_eq!(life.player_ids(), vec![p("p1"), p("p2")]);
    }

    #[test]
    fn test_unknown_player_is_rejected() {
        let mut life = LifeManager::new();
        let err = life.life(&p("ghost")).unwrap_err();
        assert_eq!(err.to_string(), "player 'ghost' has not been initialized");
        assert!(life.set_life(&p("ghost"), 10, None).is_err());
        assert!(life.deal_damage(&p("ghost"), 1, None).is_err());
        assert!(life.is_alive(&p("ghost")).is_err());
    }

    #[test]
    fn test_reinitialize_is_a_direct_set() {
        let mut life = LifeManager::new();
        life.initialize_player("p1");
        // No clamp on initialization, unlike set_life.
        assert_eq!(life.initialize_player_with("p1", -5), -5);
        assert_eq!(life.life(&p("p1")).unwrap(), -5);
    }

    #[test]
    fn test_set_life_clamps_to_floor() {
        let mut life = LifeManager::new();
        life.initialize_player("p1");
        let event = life.set_life(&p("p1"), -100, Some("burn")).unwrap();
        assert_eq!(event.previous_life, 20);
        assert_eq!(event.new_life, 0);
        assert_eq!(event.change, -20);
        assert_eq!(event.source.as_deref(), Some("burn"));
        assert_eq!(life.life(&p("p1")).unwrap(), 0);
    }

    #[test]
    fn test_set_life_clamps_to_ceiling_when_bounded() {
        let config = LifeConfig {
            max_life: Some(30),
            ..LifeConfig::default()
        };
        let mut life = LifeManager::with_config(config);
        life.initialize_player("p1");
        let event = life.set_life(&p("p1"), i64::MAX, None).unwrap();
        assert_eq!(event.new_life, 30);
        assert_eq!(event.change, 10);
    }

    #[test]
    fn test_unbounded_ceiling_allows_large_totals() {
        let mut life = LifeManager::new();
        life.initialize_player("p1");
        life.deal_damage(&p("p1"), 25, None).unwrap();
        assert_eq!(life.life(&p("p1")).unwrap(), 0);
        life.heal(&p("p1"), 100, None).unwrap();
        assert_eq!(life.life(&p("p1")).unwrap(), 100);
    }

    #[test]
    fn test_negative_amounts_are_rejected_without_side_effects() {
        let heard = Rc::new(RefCell::new(0u32));
        let mut life = LifeManager::new();
        life.initialize_player("p1");
        {
            let heard = Rc::clone(&heard);
            life.on_life_change(move |_| *heard.borrow_mut() += 1);
        }

        let err = life.deal_damage(&p("p1"), -3, None).unwrap_err();
        assert_eq!(err, LifeError::NegativeAmount { amount: -3 });
        assert!(life.heal(&p("p1"), -1, None).is_err());

        assert_eq!(life.life(&p("p1")).unwrap(), 20);
        assert_eq!(*heard.borrow(), 0);
    }

    #[test]
    fn test_change_life_saturates_instead_of_overflowing() {
        let mut life = LifeManager::new();
        life.initialize_player_with("p1", i64::MAX - 1);
        life.heal(&p("p1"), 100, None).unwrap();
        assert_eq!(life.life(&p("p1")).unwrap(), i64::MAX);
    }

    #[test]
    fn test_alive_is_strictly_above_the_floor() {
        let mut life = LifeManager::new();
        life.initialize_player("p1");
        assert!(life.is_alive(&p("p1")).unwrap());
        life.set_life(&p("p1"), 0, None).unwrap();
        assert!(life.is_dead(&p("p1")).unwrap());

        let config = LifeConfig {
            min_life: 5,
            ..LifeConfig::default()
        };
        let mut raised = LifeManager::with_config(config);
        raised.initialize_player_with("p2", 6);
        assert!(raised.is_alive(&p("p2")).unwrap());
        raised.set_life(&p("p2"), 5, None).unwrap();
        assert!(raised.is_dead(&p("p2")).unwrap());
    }

    #[test]
    fn test_reset_tags_events_with_reset_source() {
        let mut life = LifeManager::new();
        life.initialize_player_with("p1", 3);
        life.initialize_player_with("p2", 7);

        let event = life.reset_life(&p("p1")).unwrap();
        assert_eq!(event.new_life, 20);
        assert_eq!(event.source.as_deref(), Some("reset"));

        life.set_life(&p("p1"), 1, None).unwrap();
        let events = life.reset_all_life();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.source.as_deref() == Some("reset")));
        assert!(events.iter().all(|e| e.new_life == 20));
        // Player-id order.
        assert_eq!(events[0].player, p("p1"));
        assert_eq!(events[1].player, p("p2"));
    }

    #[test]
    fn test_listener_sees_the_full_event() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut life = LifeManager::new();
        life.initialize_player("p1");
        {
            let seen = Rc::clone(&seen);
            life.on_life_change(move |event| seen.borrow_mut().push(event.clone()));
        }

        let returned = life.deal_damage(&p("p1"), 4, Some("goblin")).unwrap();
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(seen.borrow()[0], returned);
        assert_eq!(returned.previous_life, 20);
        assert_eq!(returned.new_life, 16);
        assert_eq!(returned.change, -4);
    }

    #[test]
    fn test_emits_even_when_the_clamp_lands_on_the_old_value() {
        let heard = Rc::new(RefCell::new(0u32));
        let mut life = LifeManager::new();
        life.initialize_player_with("p1", 0);
        {
            let heard = Rc::clone(&heard);
            life.on_life_change(move |_| *heard.borrow_mut() += 1);
        }
        let event = life.deal_damage(&p("p1"), 10, None).unwrap();
        assert_eq!(event.change, 0);
        assert_eq!(*heard.borrow(), 1);
    }

    #[test]
    fn test_life_totals_returns_a_copy() {
        let mut life = LifeManager::new();
        life.initialize_player("p1");
        let mut copy = life.life_totals();
        copy.insert(p("p1"), 9999);
        assert_eq!(life.life(&p("p1")).unwrap(), 20);
    }

    #[test]
    fn test_snapshot_restore_round_trip() {
        let mut life = LifeManager::new();
        life.initialize_player("p1");
        life.initialize_player("p2");
        life.deal_damage(&p("p1"), 12, None).unwrap();
        let snapshot = life.snapshot();

        let heard = Rc::new(RefCell::new(0u32));
        let mut fresh = LifeManager::new();
        {
            let heard = Rc::clone(&heard);
            fresh.on_life_change(move |_| *heard.borrow_mut() += 1);
        }
        fresh.restore(snapshot);

        assert_eq!(fresh.life(&p("p1")).unwrap(), 8);
        assert_eq!(fresh.life(&p("p2")).unwrap(), 20);
        assert_eq!(fresh.life_totals(), life.life_totals());
        // Restore is silent.
        assert_eq!(*heard.borrow(), 0);
    }
}
