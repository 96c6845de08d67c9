//! Session composition: one instance of each state manager per match.
//!
//! The managers never reference each other; this is the single place they
//! are wired together. Application surfaces (the CLI, the wasm bindings)
//! each own exactly one session instead of reaching for global state.

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

use crate::ids::PlayerId;
use crate::life::{LifeConfig, LifeManager, LifeSnapshot};
use crate::token::{TokenConfig, TokenManager, TokenSnapshot};
use crate::turn::{TurnConfig, TurnError, TurnManager, TurnSnapshot};

/// Per-manager configuration for a new session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct SessionConfig {
    pub turn: TurnConfig,
    pub life: LifeConfig,
    pub tokens: TokenConfig,
}

/// Snapshot of the full session as one opaque value.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct SessionSnapshot {
    pub turn: TurnSnapshot,
    pub life: LifeSnapshot,
    pub tokens: TokenSnapshot,
}

/// Errors from the JSON snapshot helpers.
#[cfg(feature = "serialization")]
#[derive(Debug)]
pub enum SnapshotError {
    Json(serde_json::Error),
    Turn(TurnError),
}

#[cfg(feature = "serialization")]
impl std::fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotError::Json(err) => write!(f, "snapshot is not valid JSON: {err}"),
            SnapshotError::Turn(err) => write!(f, "snapshot was rejected: {err}"),
        }
    }
}

#[cfg(feature = "serialization")]
impl std::error::Error for SnapshotError {}

/// One match's worth of board state: turn/phase sequencing, life totals and
/// token counts composed behind a single owner.
#[derive(Debug)]
pub struct GameSession {
    turn: TurnManager,
    life: LifeManager,
    tokens: TokenManager,
}

impl GameSession {
    /// Creates a session with default configurations; both players start at
    /// the configured starting life.
    pub fn new(first: impl Into<PlayerId>, second: impl Into<PlayerId>) -> Self {
        Self::with_configs(first, second, SessionConfig::default())
    }

    pub fn with_configs(
        first: impl Into<PlayerId>,
        second: impl Into<PlayerId>,
        config: SessionConfig,
    ) -> Self {
        let turn = TurnManager::with_config(first, second, config.turn);
        let mut life = LifeManager::with_config(config.life);
        for player in turn.players() {
            life.initialize_player(player.clone());
        }
        Self {
            turn,
            life,
            tokens: TokenManager::with_config(config.tokens),
        }
    }

    /// Builds a session from already-configured managers.
    pub fn from_parts(turn: TurnManager, life: LifeManager, tokens: TokenManager) -> Self {
        Self { turn, life, tokens }
    }

    pub fn turn(&self) -> &TurnManager {
        &self.turn
    }

    pub fn turn_mut(&mut self) -> &mut TurnManager {
        &mut self.turn
    }

    pub fn life(&self) -> &LifeManager {
        &self.life
    }

    pub fn life_mut(&mut self) -> &mut LifeManager {
        &mut self.life
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    pub fn tokens_mut(&mut self) -> &mut TokenManager {
        &mut self.tokens
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            turn: self.turn.snapshot(),
            life: self.life.snapshot(),
            tokens: self.tokens.snapshot(),
        }
    }

    /// Replaces all three managers' state. The turn leg validates its active
    /// player first, so a failed restore leaves the session untouched.
    pub fn restore(&mut self, snapshot: SessionSnapshot) -> Result<(), TurnError> {
        self.turn.restore(snapshot.turn)?;
        self.life.restore(snapshot.life);
        self.tokens.restore(snapshot.tokens);
        Ok(())
    }
}

#[cfg(feature = "serialization")]
impl GameSession {
    /// Serializes the full session snapshot to JSON.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string(&self.snapshot()).map_err(SnapshotError::Json)
    }

    /// Restores the session from a JSON snapshot produced by `to_json`.
    pub fn restore_json(&mut self, json: &str) -> Result<(), SnapshotError> {
        let snapshot: SessionSnapshot = serde_json::from_str(json).map_err(SnapshotError::Json)?;
        self.restore(snapshot).map_err(SnapshotError::Turn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::CardId;
    use crate::phase::{ActionKind, Phase};
    use crate::token::TokenKind;

    fn p(id: &str) -> PlayerId {
        PlayerId::from(id)
    }

    #[test]
    fn test_new_session_initializes_both_life_totals() {
        let session = GameSession::new("p1", "p2");
        assert_eq!(session.life().life(&p("p1")).unwrap(), 20);
        assert_eq!(session.life().life(&p("p2")).unwrap(), 20);
        assert_eq!(session.turn().active_player(), &p("p1"));
    }

    #[test]
    fn test_with_configs_applies_every_config() {
        let config = SessionConfig {
            turn: TurnConfig {
                skip_first_draw: false,
                ..TurnConfig::default()
            },
            life: LifeConfig {
                starting_life: 40,
                ..LifeConfig::default()
            },
            tokens: TokenConfig { stack_limit: 10 },
        };
        let mut session = GameSession::with_configs("p1", "p2", config);

        assert_eq!(session.life().life(&p("p1")).unwrap(), 40);
        assert_eq!(session.tokens().capacity(TokenKind::DamageCounter), 10);
        session.turn_mut().advance_phase();
        session.turn_mut().advance_phase();
        assert!(session.turn().action_available(ActionKind::Draw));
    }

    #[test]
    fn test_from_parts_keeps_injected_state() {
        let mut life = LifeManager::new();
        life.initialize_player_with("p1", 7);
        life.initialize_player_with("p2", 13);
        let mut tokens = TokenManager::new();
        tokens.add_token("c1", TokenKind::ShieldCounter, 2);

        let session = GameSession::from_parts(TurnManager::new("p1", "p2"), life, tokens);
        assert_eq!(session.life().life(&p("p1")).unwrap(), 7);
        assert_eq!(
            session
                .tokens()
                .token_count(&CardId::from("c1"), TokenKind::ShieldCounter),
            2
        );
    }

    #[test]
    fn test_restore_replaces_all_three_managers() {
        let mut session = GameSession::new("p1", "p2");
        session.turn_mut().advance_phase();
        session.turn_mut().advance_phase();
        session
            .life_mut()
            .deal_damage(&p("p2"), 6, Some("clash"))
            .unwrap();
        session.tokens_mut().add_token("c1", TokenKind::StatusStun, 1);
        let snapshot = session.snapshot();

        let mut fresh = GameSession::new("p1", "p2");
        fresh.restore(snapshot).unwrap();
        assert_eq!(fresh.turn().phase(), Phase::Draw);
        assert_eq!(fresh.life().life(&p("p2")).unwrap(), 14);
        assert!(fresh
            .tokens()
            .has_token(&CardId::from("c1"), TokenKind::StatusStun));
    }

    #[test]
    fn test_failed_restore_leaves_the_session_untouched() {
        let mut session = GameSession::new("p1", "p2");
        let mut donor = GameSession::new("x1", "x2");
        donor.life_mut().set_life(&p("x1"), 3, None).unwrap();
        let snapshot = donor.snapshot();

        assert!(session.restore(snapshot).is_err());
        assert_eq!(session.turn().active_player(), &p("p1"));
        assert_eq!(session.life().life(&p("p1")).unwrap(), 20);
    }

    #[cfg(feature = "serialization")]
    #[test]
    fn test_json_round_trip() {
        let mut session = GameSession::new("p1", "p2");
        session.turn_mut().advance_phase();
        session.life_mut().deal_damage(&p("p1"), 5, None).unwrap();
        session
            .tokens_mut()
            .add_token("c7", TokenKind::BoostCounter, 3);

        let json = session.to_json().unwrap();
        let mut fresh = GameSession::new("p1", "p2");
        fresh.restore_json(&json).unwrap();
        assert_eq!(fresh.snapshot(), session.snapshot());
    }

    #[cfg(feature = "serialization")]
    #[test]
    fn test_restore_json_rejects_garbage() {
        let mut session = GameSession::new("p1", "p2");
        let err = session.restore_json("not json").unwrap_err();
        assert!(matches!(err, SnapshotError::Json(_)));
    }
}
