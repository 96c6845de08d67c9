//! WASM-facing API for browser integration.
//!
//! A thin wrapper around `GameSession` so JavaScript can:
//! - drive the turn/phase cycle and spend action flags
//! - mutate life totals and token counts
//! - subscribe to change notifications
//! - read and restore a serializable snapshot

use std::collections::HashMap;

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::events::ListenerId;
use crate::ids::{CardId, PlayerId};
use crate::phase::{ActionKind, Phase};
use crate::session::{GameSession, SessionSnapshot};
use crate::token::{DEFINITIONS, TokenDefinition, TokenKind};

#[wasm_bindgen(start)]
pub fn wasm_start() {
    console_error_panic_hook::set_once();
}

fn js_err(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Serializes the event and invokes the JS callback. A throwing callback is
/// swallowed, matching the listener isolation contract.
fn invoke_callback<E: Serialize>(callback: &js_sys::Function, event: &E) {
    if let Ok(value) = serde_wasm_bindgen::to_value(event) {
        let _ = callback.call1(&JsValue::NULL, &value);
    }
}

/// JS-friendly view of a token definition, keyed by the public identifier.
#[derive(Serialize)]
struct TokenDefinitionView {
    id: &'static str,
    name: &'static str,
    image: &'static str,
    color: &'static str,
    stackable: bool,
    value: u32,
}

impl TokenDefinitionView {
    fn from_definition(def: &'static TokenDefinition) -> Self {
        Self {
            id: def.kind.id(),
            name: def.name,
            image: def.image,
            color: def.color,
            stackable: def.stackable,
            value: def.value,
        }
    }
}

enum CallbackChannel {
    Phase,
    Turn,
    Life,
    Token,
}

struct CallbackRegistration {
    handle: u32,
    channel: CallbackChannel,
    id: ListenerId,
}

#[wasm_bindgen]
pub struct WasmBoard {
    session: GameSession,
    callbacks: Vec<CallbackRegistration>,
    next_callback: u32,
}

#[wasm_bindgen]
impl WasmBoard {
    /// Construct a board for two players; the first one starts active.
    #[wasm_bindgen(constructor)]
    pub fn new(first: &str, second: &str) -> WasmBoard {
        WasmBoard {
            session: GameSession::new(first, second),
            callbacks: Vec::new(),
            next_callback: 0,
        }
    }

    /// Advance to the next phase; returns the new phase name.
    #[wasm_bindgen(js_name = advancePhase)]
    pub fn advance_phase(&mut self) -> String {
        self.session.turn_mut().advance_phase().name().to_string()
    }

    /// Jump straight to the named phase.
    #[wasm_bindgen(js_name = setPhase)]
    pub fn set_phase(&mut self, phase: &str) -> Result<(), JsValue> {
        let phase: Phase = phase.parse().map_err(js_err)?;
        self.session.turn_mut().set_phase(phase);
        Ok(())
    }

    /// End the current turn; returns the new turn number.
    #[wasm_bindgen(js_name = endTurn)]
    pub fn end_turn(&mut self) -> u32 {
        self.session.turn_mut().end_turn()
    }

    /// Spend an action flag for the rest of the phase.
    #[wasm_bindgen(js_name = consumeAction)]
    pub fn consume_action(&mut self, action: &str) -> Result<(), JsValue> {
        let action: ActionKind = action.parse().map_err(js_err)?;
        self.session
            .turn_mut()
            .consume_action(action)
            .map_err(js_err)
    }

    #[wasm_bindgen(js_name = getTurnNumber)]
    pub fn turn_number(&self) -> u32 {
        self.session.turn().turn_number()
    }

    #[wasm_bindgen(js_name = getCurrentPhase)]
    pub fn current_phase(&self) -> String {
        self.session.turn().phase().name().to_string()
    }

    #[wasm_bindgen(js_name = getActivePlayer)]
    pub fn active_player(&self) -> String {
        self.session.turn().active_player().to_string()
    }

    #[wasm_bindgen(js_name = isActivePlayer)]
    pub fn is_active_player(&self, player: &str) -> bool {
        self.session.turn().is_active(&PlayerId::from(player))
    }

    /// Current action flags as a JS object.
    #[wasm_bindgen(js_name = getActions)]
    pub fn actions(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.session.turn().actions()).map_err(js_err)
    }

    #[wasm_bindgen(js_name = canPerform)]
    pub fn can_perform(&self, action: &str) -> Result<bool, JsValue> {
        let action: ActionKind = action.parse().map_err(js_err)?;
        Ok(self.session.turn().action_available(action))
    }

    /// All phase names in turn order.
    #[wasm_bindgen(js_name = phaseNames)]
    pub fn phase_names(&self) -> Vec<String> {
        Phase::ALL
            .into_iter()
            .map(|phase| phase.name().to_string())
            .collect()
    }

    /// Registers a player, at the given life or the configured default.
    #[wasm_bindgen(js_name = initializePlayer)]
    pub fn initialize_player(&mut self, player: &str, life: Option<i64>) -> i64 {
        match life {
            Some(life) => self.session.life_mut().initialize_player_with(player, life),
            None => self.session.life_mut().initialize_player(player),
        }
    }

    #[wasm_bindgen(js_name = hasPlayer)]
    pub fn has_player(&self, player: &str) -> bool {
        self.session.life().has_player(&PlayerId::from(player))
    }

    #[wasm_bindgen(js_name = getLife)]
    pub fn get_life(&self, player: &str) -> Result<i64, JsValue> {
        self.session
            .life()
            .life(&PlayerId::from(player))
            .map_err(js_err)
    }

    /// Set a player's life total; returns the change event.
    #[wasm_bindgen(js_name = setLife)]
    pub fn set_life(
        &mut self,
        player: &str,
        value: i64,
        source: Option<String>,
    ) -> Result<JsValue, JsValue> {
        let event = self
            .session
            .life_mut()
            .set_life(&PlayerId::from(player), value, source.as_deref())
            .map_err(js_err)?;
        serde_wasm_bindgen::to_value(&event).map_err(js_err)
    }

    /// Apply a signed life delta; returns the change event.
    #[wasm_bindgen(js_name = changeLife)]
    pub fn change_life(
        &mut self,
        player: &str,
        delta: i64,
        source: Option<String>,
    ) -> Result<JsValue, JsValue> {
        let event = self
            .session
            .life_mut()
            .change_life(&PlayerId::from(player), delta, source.as_deref())
            .map_err(js_err)?;
        serde_wasm_bindgen::to_value(&event).map_err(js_err)
    }

    /// Deal damage (non-negative); returns the change event.
    #[wasm_bindgen(js_name = dealDamage)]
    pub fn deal_damage(
        &mut self,
        player: &str,
        amount: i64,
        source: Option<String>,
    ) -> Result<JsValue, JsValue> {
        let event = self
            .session
            .life_mut()
            .deal_damage(&PlayerId::from(player), amount, source.as_deref())
            .map_err(js_err)?;
        serde_wasm_bindgen::to_value(&event).map_err(js_err)
    }

    /// Heal (non-negative); returns the change event.
    #[wasm_bindgen(js_name = heal)]
    pub fn heal(
        &mut self,
        player: &str,
        amount: i64,
        source: Option<String>,
    ) -> Result<JsValue, JsValue> {
        let event = self
            .session
            .life_mut()
            .heal(&PlayerId::from(player), amount, source.as_deref())
            .map_err(js_err)?;
        serde_wasm_bindgen::to_value(&event).map_err(js_err)
    }

    #[wasm_bindgen(js_name = isAlive)]
    pub fn is_alive(&self, player: &str) -> Result<bool, JsValue> {
        self.session
            .life()
            .is_alive(&PlayerId::from(player))
            .map_err(js_err)
    }

    #[wasm_bindgen(js_name = resetAllLife)]
    pub fn reset_all_life(&mut self) {
        self.session.life_mut().reset_all_life();
    }

    /// Every life total as a JS object keyed by player id.
    #[wasm_bindgen(js_name = getLifeTotals)]
    pub fn life_totals(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.session.life().life_totals()).map_err(js_err)
    }

    /// Adds tokens (default one); returns the new count.
    #[wasm_bindgen(js_name = addToken)]
    pub fn add_token(&mut self, card: &str, kind: &str, count: Option<u32>) -> Result<u32, JsValue> {
        let kind: TokenKind = kind.parse().map_err(js_err)?;
        Ok(self
            .session
            .tokens_mut()
            .add_token(card, kind, count.unwrap_or(1)))
    }

    /// Removes tokens (default one); returns the new count.
    #[wasm_bindgen(js_name = removeToken)]
    pub fn remove_token(
        &mut self,
        card: &str,
        kind: &str,
        count: Option<u32>,
    ) -> Result<u32, JsValue> {
        let kind: TokenKind = kind.parse().map_err(js_err)?;
        Ok(self
            .session
            .tokens_mut()
            .remove_token(card, kind, count.unwrap_or(1)))
    }

    /// Sets an exact token count; returns the stored count.
    #[wasm_bindgen(js_name = setTokenCount)]
    pub fn set_token_count(&mut self, card: &str, kind: &str, count: u32) -> Result<u32, JsValue> {
        let kind: TokenKind = kind.parse().map_err(js_err)?;
        Ok(self.session.tokens_mut().set_token_count(card, kind, count))
    }

    #[wasm_bindgen(js_name = getTokenCount)]
    pub fn token_count(&self, card: &str, kind: &str) -> Result<u32, JsValue> {
        let kind: TokenKind = kind.parse().map_err(js_err)?;
        Ok(self.session.tokens().token_count(&CardId::from(card), kind))
    }

    /// The card's token counts as a JS object keyed by kind identifier.
    #[wasm_bindgen(js_name = getTokensOnCard)]
    pub fn tokens_on_card(&self, card: &str) -> Result<JsValue, JsValue> {
        let on_card = self.session.tokens().tokens_on_card(&CardId::from(card));
        let mut by_id: HashMap<&'static str, u32> = HashMap::new();
        for (kind, count) in on_card {
            by_id.insert(kind.id(), count);
        }
        serde_wasm_bindgen::to_value(&by_id).map_err(js_err)
    }

    #[wasm_bindgen(js_name = hasTokens)]
    pub fn has_tokens(&self, card: &str) -> bool {
        self.session.tokens().has_tokens(&CardId::from(card))
    }

    #[wasm_bindgen(js_name = clearTokens)]
    pub fn clear_tokens(&mut self, card: &str) {
        self.session.tokens_mut().clear_tokens(&CardId::from(card));
    }

    #[wasm_bindgen(js_name = clearAllTokens)]
    pub fn clear_all_tokens(&mut self) {
        self.session.tokens_mut().clear_all_tokens();
    }

    #[wasm_bindgen(js_name = getCardsWithTokens)]
    pub fn cards_with_tokens(&self) -> Vec<String> {
        self.session
            .tokens()
            .cards_with_tokens()
            .into_iter()
            .map(|card| card.to_string())
            .collect()
    }

    #[wasm_bindgen(js_name = getTotalTokenCount)]
    pub fn total_token_count(&self) -> u64 {
        self.session.tokens().total_token_count()
    }

    #[wasm_bindgen(js_name = getTokenDefinition)]
    pub fn token_definition(&self, kind: &str) -> Result<JsValue, JsValue> {
        let kind: TokenKind = kind.parse().map_err(js_err)?;
        let view = TokenDefinitionView::from_definition(kind.definition());
        serde_wasm_bindgen::to_value(&view).map_err(js_err)
    }

    #[wasm_bindgen(js_name = getTokenDefinitions)]
    pub fn token_definitions(&self) -> Result<JsValue, JsValue> {
        let views: Vec<TokenDefinitionView> = DEFINITIONS
            .iter()
            .map(TokenDefinitionView::from_definition)
            .collect();
        serde_wasm_bindgen::to_value(&views).map_err(js_err)
    }

    /// Full session snapshot as a JS value.
    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.session.snapshot()).map_err(js_err)
    }

    /// Replaces the full session state from a snapshot.
    pub fn restore(&mut self, snapshot: JsValue) -> Result<(), JsValue> {
        let snapshot: SessionSnapshot =
            serde_wasm_bindgen::from_value(snapshot).map_err(js_err)?;
        self.session.restore(snapshot).map_err(js_err)
    }

    #[wasm_bindgen(js_name = snapshotJson)]
    pub fn snapshot_json(&self) -> Result<String, JsValue> {
        self.session.to_json().map_err(js_err)
    }

    #[wasm_bindgen(js_name = restoreJson)]
    pub fn restore_json(&mut self, json: &str) -> Result<(), JsValue> {
        self.session.restore_json(json).map_err(js_err)
    }

    /// Subscribe to phase changes. Returns a handle for `removeListener`.
    #[wasm_bindgen(js_name = onPhaseChange)]
    pub fn on_phase_change(&mut self, callback: js_sys::Function) -> u32 {
        let id = self
            .session
            .turn_mut()
            .on_phase_change(move |event| invoke_callback(&callback, event));
        self.register(CallbackChannel::Phase, id)
    }

    /// Subscribe to turn changes. Returns a handle for `removeListener`.
    #[wasm_bindgen(js_name = onTurnChange)]
    pub fn on_turn_change(&mut self, callback: js_sys::Function) -> u32 {
        let id = self
            .session
            .turn_mut()
            .on_turn_change(move |event| invoke_callback(&callback, event));
        self.register(CallbackChannel::Turn, id)
    }

    /// Subscribe to life changes. Returns a handle for `removeListener`.
    #[wasm_bindgen(js_name = onLifeChange)]
    pub fn on_life_change(&mut self, callback: js_sys::Function) -> u32 {
        let id = self
            .session
            .life_mut()
            .on_life_change(move |event| invoke_callback(&callback, event));
        self.register(CallbackChannel::Life, id)
    }

    /// Subscribe to token changes. Returns a handle for `removeListener`.
    #[wasm_bindgen(js_name = onTokenChange)]
    pub fn on_token_change(&mut self, callback: js_sys::Function) -> u32 {
        let id = self
            .session
            .tokens_mut()
            .on_token_change(move |event| invoke_callback(&callback, event));
        self.register(CallbackChannel::Token, id)
    }

    /// Unsubscribes the callback with the given handle.
    #[wasm_bindgen(js_name = removeListener)]
    pub fn remove_listener(&mut self, handle: u32) -> bool {
        let Some(index) = self
            .callbacks
            .iter()
            .position(|registration| registration.handle == handle)
        else {
            return false;
        };
        let registration = self.callbacks.remove(index);
        match registration.channel {
            CallbackChannel::Phase => self
                .session
                .turn_mut()
                .remove_phase_listener(registration.id),
            CallbackChannel::Turn => self.session.turn_mut().remove_turn_listener(registration.id),
            CallbackChannel::Life => self.session.life_mut().remove_listener(registration.id),
            CallbackChannel::Token => self.session.tokens_mut().remove_listener(registration.id),
        }
    }

    /// Unsubscribes every callback.
    #[wasm_bindgen(js_name = clearListeners)]
    pub fn clear_listeners(&mut self) {
        self.session.turn_mut().clear_listeners();
        self.session.life_mut().clear_listeners();
        self.session.tokens_mut().clear_listeners();
        self.callbacks.clear();
    }
}

impl WasmBoard {
    fn register(&mut self, channel: CallbackChannel, id: ListenerId) -> u32 {
        let handle = self.next_callback;
        self.next_callback += 1;
        self.callbacks.push(CallbackRegistration {
            handle,
            channel,
            id,
        });
        handle
    }
}
