//! Scenario tests that drive a full session end to end.
//!
//! The per-module unit tests pin down each manager on its own. These cover
//! the interplay: listener ordering across managers, scripted turns that mix
//! phase flow with life and token changes, and whole-board snapshots.

use std::cell::RefCell;
use std::rc::Rc;

use crate::ids::{CardId, PlayerId};
use crate::phase::{ActionKind, Phase, PhaseActions};
use crate::session::GameSession;
use crate::token::TokenKind;

/// Records every event a session fires as one readable line, in order.
struct EventLog {
    lines: Rc<RefCell<Vec<String>>>,
}

impl EventLog {
    fn attach(session: &mut GameSession) -> Self {
        let lines = Rc::new(RefCell::new(Vec::new()));

        let sink = Rc::clone(&lines);
        session.turn_mut().on_phase_change(move |event| {
            sink.borrow_mut().push(format!(
                "phase {} -> {}",
                event.previous_phase, event.new_phase
            ));
        });

        let sink = Rc::clone(&lines);
        session.turn_mut().on_turn_change(move |event| {
            sink.borrow_mut().push(format!(
                "turn {} -> {} ({})",
                event.previous_turn, event.new_turn, event.active_player
            ));
        });

        let sink = Rc::clone(&lines);
        session.life_mut().on_life_change(move |event| {
            sink.borrow_mut().push(format!(
                "life {} {} -> {}",
                event.player, event.previous_life, event.new_life
            ));
        });

        let sink = Rc::clone(&lines);
        session.tokens_mut().on_token_change(move |event| {
            sink.borrow_mut().push(format!(
                "token {} {} {} -> {}",
                event.card, event.kind, event.previous_count, event.new_count
            ));
        });

        Self { lines }
    }

    fn take(&self) -> Vec<String> {
        self.lines.borrow_mut().drain(..).collect()
    }
}

mod tests {
    use super::*;

    #[test]
    fn test_full_first_turn_walkthrough() {
        let mut session = GameSession::new("alice", "bob");
        let turn = session.turn_mut();

        assert_eq!(turn.phase(), Phase::Start);
        assert_eq!(turn.turn_number(), 1);
        assert_eq!(turn.active_player(), &PlayerId::from("alice"));
        assert_eq!(turn.actions(), PhaseActions::NONE);

        assert_eq!(turn.advance_phase(), Phase::Untap);
        assert_eq!(turn.actions(), PhaseActions::NONE);

        // The opening player skips their first draw.
        assert_eq!(turn.advance_phase(), Phase::Draw);
        assert!(!turn.actions().can_draw);
        assert!(turn.consume_action(ActionKind::Draw).is_err());

        assert_eq!(turn.advance_phase(), Phase::Resource);
        assert!(turn.actions().can_play_resource);
        turn.consume_action(ActionKind::PlayResource)
            .expect("the resource drop should be available");
        assert!(!turn.actions().can_play_resource);

        assert_eq!(turn.advance_phase(), Phase::Main);
        assert!(turn.actions().can_play_cards);
        assert!(turn.actions().can_activate_abilities);
        assert!(!turn.actions().can_attack);

        assert_eq!(turn.advance_phase(), Phase::Clash);
        assert!(turn.actions().can_attack);
        assert!(!turn.actions().can_play_cards);

        assert_eq!(turn.advance_phase(), Phase::Main2);
        assert!(turn.actions().can_play_cards);

        assert_eq!(turn.advance_phase(), Phase::End);
        assert_eq!(turn.actions(), PhaseActions::NONE);

        // Advancing past the end hands the board to the opponent.
        assert_eq!(turn.advance_phase(), Phase::Start);
        assert_eq!(turn.turn_number(), 2);
        assert_eq!(turn.active_player(), &PlayerId::from("bob"));
    }

    #[test]
    fn test_second_player_draws_on_their_first_turn() {
        let mut session = GameSession::new("alice", "bob");
        for _ in 0..8 {
            session.turn_mut().advance_phase();
        }

        let turn = session.turn_mut();
        assert_eq!(turn.turn_number(), 2);
        turn.advance_phase();
        assert_eq!(turn.advance_phase(), Phase::Draw);
        assert!(
            turn.actions().can_draw,
            "only the very first draw phase is skipped"
        );
        turn.consume_action(ActionKind::Draw)
            .expect("the draw should be available on turn two");
        assert!(turn.consume_action(ActionKind::Draw).is_err());
    }

    #[test]
    fn test_clash_scenario_mixes_all_three_managers() {
        let mut session = GameSession::new("alice", "bob");
        let log = EventLog::attach(&mut session);

        for _ in 0..5 {
            session.turn_mut().advance_phase();
        }
        assert_eq!(session.turn().phase(), Phase::Clash);
        session
            .turn_mut()
            .consume_action(ActionKind::Attack)
            .expect("attacking should be allowed in the clash phase");

        // The blocker survives with damage marked, the defender takes the rest.
        session
            .tokens_mut()
            .add_token("bob:guard-golem", TokenKind::DamageCounter, 2);
        session
            .life_mut()
            .deal_damage(&PlayerId::from("bob"), 4, Some("alice:raid-captain"))
            .expect("bob is part of this session");

        assert_eq!(session.life().life(&PlayerId::from("bob")).unwrap(), 16);
        assert_eq!(
            session
                .tokens()
                .token_count(&CardId::from("bob:guard-golem"), TokenKind::DamageCounter),
            2
        );

        let lines = log.take();
        assert_eq!(
            lines,
            vec![
                "phase start -> untap".to_string(),
                "phase untap -> draw".to_string(),
                "phase draw -> resource".to_string(),
                "phase resource -> main".to_string(),
                "phase main -> clash".to_string(),
                "token bob:guard-golem damage-counter 0 -> 2".to_string(),
                "life bob 20 -> 16".to_string(),
            ]
        );
    }

    #[test]
    fn test_turn_hand_off_event_order() {
        let mut session = GameSession::new("alice", "bob");
        session.turn_mut().set_phase(Phase::End);
        let log = EventLog::attach(&mut session);

        session.turn_mut().advance_phase();

        assert_eq!(
            log.take(),
            vec![
                "turn 1 -> 2 (bob)".to_string(),
                "phase end -> start".to_string(),
            ]
        );
    }

    #[test]
    fn test_panicking_listener_does_not_break_the_board() {
        let mut session = GameSession::new("alice", "bob");
        session
            .turn_mut()
            .on_phase_change(|_| panic!("render layer fell over"));
        let log = EventLog::attach(&mut session);

        assert_eq!(session.turn_mut().advance_phase(), Phase::Untap);

        // Later listeners still ran.
        assert_eq!(log.take(), vec!["phase start -> untap".to_string()]);
    }

    #[test]
    fn test_reset_after_a_long_game() {
        let mut session = GameSession::new("alice", "bob");
        session
            .life_mut()
            .deal_damage(&PlayerId::from("alice"), 19, Some("bob:siege-ram"))
            .unwrap();
        session
            .life_mut()
            .deal_damage(&PlayerId::from("bob"), 20, Some("alice:raid-captain"))
            .unwrap();
        assert!(session.life().is_dead(&PlayerId::from("bob")).unwrap());

        let events = session.life_mut().reset_all_life();
        assert_eq!(events.len(), 2);
        assert!(
            events
                .iter()
                .all(|event| event.source.as_deref() == Some("reset"))
        );
        assert!(session.life().is_alive(&PlayerId::from("alice")).unwrap());
        assert!(session.life().is_alive(&PlayerId::from("bob")).unwrap());
    }

    #[test]
    fn test_snapshot_carries_the_whole_board() {
        let mut source = GameSession::new("alice", "bob");
        for _ in 0..4 {
            source.turn_mut().advance_phase();
        }
        source
            .turn_mut()
            .consume_action(ActionKind::PlayCards)
            .unwrap();
        source
            .life_mut()
            .deal_damage(&PlayerId::from("alice"), 7, None)
            .unwrap();
        source
            .tokens_mut()
            .add_token("alice:warded-keep", TokenKind::ShieldCounter, 3);

        let mut copy = GameSession::new("alice", "bob");
        copy.restore(source.snapshot())
            .expect("both sessions share the same players");

        assert_eq!(copy.turn().phase(), Phase::Main);
        assert_eq!(copy.turn().turn_number(), 1);
        assert!(!copy.turn().actions().can_play_cards);
        assert_eq!(copy.life().life(&PlayerId::from("alice")).unwrap(), 13);
        assert_eq!(
            copy.tokens()
                .token_count(&CardId::from("alice:warded-keep"), TokenKind::ShieldCounter),
            3
        );
    }

    #[test]
    fn test_restore_fires_no_events() {
        let donor = {
            let mut donor = GameSession::new("alice", "bob");
            donor.turn_mut().end_turn();
            donor
                .life_mut()
                .set_life(&PlayerId::from("bob"), 3, None)
                .unwrap();
            donor
                .tokens_mut()
                .add_token("bob:last-stand", TokenKind::StatusStun, 1);
            donor.snapshot()
        };

        let mut session = GameSession::new("alice", "bob");
        let log = EventLog::attach(&mut session);

        session.restore(donor).unwrap();

        assert_eq!(session.turn().turn_number(), 2);
        assert_eq!(session.life().life(&PlayerId::from("bob")).unwrap(), 3);
        assert!(
            session
                .tokens()
                .has_token(&CardId::from("bob:last-stand"), TokenKind::StatusStun)
        );
        assert_eq!(log.take(), Vec::<String>::new());
    }

    #[cfg(feature = "serialization")]
    #[test]
    fn test_json_round_trip_preserves_the_board() {
        let mut source = GameSession::new("alice", "bob");
        source.turn_mut().set_phase(Phase::Clash);
        source
            .life_mut()
            .heal(&PlayerId::from("alice"), 5, Some("alice:field-medic"))
            .unwrap();
        source
            .tokens_mut()
            .add_token("bob:frozen-sentinel", TokenKind::StatusFreeze, 1);

        let json = source.to_json().expect("the session should serialize");
        let mut copy = GameSession::new("alice", "bob");
        copy.restore_json(&json)
            .expect("the JSON we just produced should restore");

        assert_eq!(copy.snapshot(), source.snapshot());
    }
}
