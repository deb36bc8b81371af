//! Response processing tests.
//!
//! These drive whole batches through a session on a manual clock and check
//! what the renderer would see at each step.

use std::time::Duration;

use tactics_client::prelude::*;
use tactics_rules::prelude::{
    execute_action, Action, ActionResponse, MapData, PlayerId, Unit, UnitKind, Vision,
};
use tactics_test_utils::clock::{drive, ManualClock};
use tactics_test_utils::fixtures::{
    empty_map, humans, record_responses, skirmish_map, skirmish_script, v,
};

fn session_on(map: &MapData, viewer: Option<PlayerId>) -> (Session, ManualClock) {
    let clock = ManualClock::new();
    let session = Session::new(ClientConfig::default(), map, viewer, OfflineTransport)
        .unwrap()
        .with_clock(clock.clone());
    (session, clock)
}

/// Pump from deadline to deadline until `predicate` holds. Returns `false`
/// if the session settled first.
fn step_until(
    session: &mut Session,
    clock: &ManualClock,
    mut predicate: impl FnMut(&Session) -> bool,
) -> bool {
    loop {
        session.pump();
        if predicate(session) {
            return true;
        }
        match session.next_deadline() {
            Some(deadline) => clock.set(deadline),
            None => return false,
        }
    }
}

fn has_animation(session: &Session, key: AnimationKey, kind: &str) -> bool {
    session
        .state()
        .animations
        .get(key)
        .is_some_and(|entry| entry.animation.kind() == kind)
}

// =============================================================================
// Single responses
// =============================================================================

mod responses {
    use super::*;

    #[test]
    fn test_move_animates_then_commits() {
        let map = empty_map(5, 5).with_unit(v(2, 2), Unit::new(UnitKind::Infantry, 1));
        let (mut session, clock) = session_on(&map, Some(1));

        session.process_game_action_response(GameActionResponse::from_others(vec![
            ActionResponse::Move {
                from: v(2, 2),
                to: v(2, 4),
                path: vec![v(2, 3), v(2, 4)],
            },
        ]));
        session.pump();

        let entries: Vec<_> = session.state().animations.iter().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(*entries[0].0, AnimationKey::Position(v(2, 2)));
        assert_eq!(entries[0].1.animation.kind(), "move");
        assert!(session.state().map.unit(v(2, 2)).is_some(), "Not committed yet");
        assert_eq!(session.state().behavior_kind(), Some(BehaviorKind::Null));

        drive(&mut session, &clock);

        assert!(session.state().map.unit(v(2, 2)).is_none());
        assert!(session
            .state()
            .map
            .unit(v(2, 4))
            .is_some_and(|unit| unit.kind == UnitKind::Infantry && unit.moved));
        assert_eq!(session.state().behavior_kind(), Some(BehaviorKind::Base));
        assert!(session.is_idle());
    }

    #[test]
    fn test_explosion_plays_before_the_unit_is_removed() {
        let map = empty_map(4, 4)
            .with_unit(v(2, 2), Unit::new(UnitKind::Infantry, 1))
            .with_unit(v(2, 3), Unit::new(UnitKind::Infantry, 2).with_health(1))
            .with_unit(v(4, 4), Unit::new(UnitKind::Infantry, 2));
        let (_, response) = execute_action(
            &map,
            &Action::AttackUnit {
                from: v(2, 2),
                to: v(2, 3),
            },
        )
        .unwrap();
        assert!(matches!(
            response,
            ActionResponse::AttackUnit { unit_b: None, .. }
        ));

        let (mut session, clock) = session_on(&map, Some(1));
        session.process_game_action_response(GameActionResponse::from_others(vec![response]));

        let exploding = step_until(&mut session, &clock, |session| {
            has_animation(session, v(2, 3).into(), "explosion")
        });
        assert!(exploding);
        assert!(session.state().map.unit(v(2, 3)).is_some());

        drive(&mut session, &clock);
        assert!(session.state().map.unit(v(2, 3)).is_none());
        assert!(session.state().map.unit(v(2, 2)).is_some_and(|unit| unit.completed));
    }

    #[test]
    fn test_hidden_move_without_a_unit_only_filters_vision() {
        let mut authoritative = MapData::new(8, 3, humans(0))
            .with_fog(true)
            .with_unit(v(1, 1), Unit::new(UnitKind::Infantry, 1))
            .with_unit(v(3, 1), Unit::new(UnitKind::Infantry, 2));
        authoritative.current_player = 2;
        let (_, response) = execute_action(
            &authoritative,
            &Action::Move {
                from: v(3, 1),
                to: v(6, 1),
                path: vec![],
            },
        )
        .unwrap();
        let hidden = Vision::new(Some(1))
            .dim_response(&authoritative, &response)
            .unwrap();
        assert!(matches!(
            hidden,
            ActionResponse::HiddenMove {
                from: Some(_),
                unit: None,
                ..
            }
        ));

        let (mut session, clock) = session_on(&authoritative, Some(1));
        let before = session.state().map.clone();
        assert!(before.unit(v(3, 1)).is_some());

        session.process_game_action_response(GameActionResponse::from_others(vec![hidden]));
        drive(&mut session, &clock);

        let after = &session.state().map;
        assert!(after.unit(v(3, 1)).is_none());
        assert!(after.unit(v(6, 1)).is_none());
        assert_eq!(after.unit(v(1, 1)), before.unit(v(1, 1)));
        assert_eq!(after.units.len(), 1);
        assert_eq!(after.current_player, before.current_player);
    }

    #[test]
    fn test_hidden_response_on_an_open_map_is_rejected() {
        let map = empty_map(4, 4).with_unit(v(1, 1), Unit::new(UnitKind::Infantry, 1));
        let errors = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let sink = errors.clone();
        let (session, clock) = session_on(&map, Some(1));
        let mut session = session.with_error_handler(move |error| {
            sink.borrow_mut().push(error.to_string());
        });

        session.process_game_action_response(GameActionResponse::from_others(vec![
            ActionResponse::HiddenMove {
                from: None,
                to: Some(v(2, 2)),
                path: vec![v(2, 2)],
                unit: Some(Unit::new(UnitKind::Infantry, 2)),
            },
        ]));
        drive(&mut session, &clock);

        assert_eq!(errors.borrow().len(), 1);
        assert!(errors.borrow()[0].contains("HiddenMove"));
        assert!(!session.is_processing());
        assert_eq!(session.state().behavior_kind(), Some(BehaviorKind::Base));
    }
}

// =============================================================================
// Batches
// =============================================================================

mod batches {
    use super::*;

    #[test]
    fn test_batches_are_processed_in_order() {
        let map = empty_map(6, 6)
            .with_unit(v(1, 1), Unit::new(UnitKind::Infantry, 1))
            .with_unit(v(6, 6), Unit::new(UnitKind::Infantry, 2));
        let (mut session, clock) = session_on(&map, Some(1));
        let mut events = session.subscribe();

        let first = ActionResponse::Move {
            from: v(1, 1),
            to: v(1, 2),
            path: vec![v(1, 2)],
        };
        let second = ActionResponse::Move {
            from: v(1, 2),
            to: v(1, 3),
            path: vec![v(1, 3)],
        };
        session.process_game_action_response(GameActionResponse::from_others(vec![first.clone()]));
        session.process_game_action_response(GameActionResponse::from_others(vec![second.clone()]));
        drive(&mut session, &clock);

        assert_eq!(
            events.try_recv().unwrap(),
            SessionEvent::ActionsProcessed {
                responses: 1,
                last: Some(first),
            }
        );
        assert_eq!(
            events.try_recv().unwrap(),
            SessionEvent::ActionsProcessed {
                responses: 1,
                last: Some(second),
            }
        );
        assert!(session.state().map.unit(v(1, 3)).is_some());
    }

    #[test]
    fn test_own_response_is_processed_before_others() {
        let map = empty_map(6, 6)
            .with_unit(v(1, 1), Unit::new(UnitKind::Infantry, 1))
            .with_unit(v(6, 6), Unit::new(UnitKind::Infantry, 2));
        let (mut session, clock) = session_on(&map, Some(1));
        let mut events = session.subscribe();
        session.process_game_action_response(GameActionResponse {
            own: Some(ActionResponse::CompleteUnit { from: v(1, 1) }),
            others: vec![ActionResponse::EndTurn {
                current: 1,
                next: 2,
                round: 1,
                funds: 0,
            }],
        });
        drive(&mut session, &clock);

        assert!(matches!(
            events.try_recv().unwrap(),
            SessionEvent::ActionsProcessed {
                responses: 2,
                last: Some(ActionResponse::EndTurn { .. }),
            }
        ));
        assert!(session.state().map.unit(v(1, 1)).is_some_and(|unit| unit.completed));
        assert_eq!(session.state().map.current_player, 2);
    }

    #[test]
    fn test_remote_pushes_are_queued() {
        let map = empty_map(4, 4)
            .with_unit(v(1, 1), Unit::new(UnitKind::Infantry, 1))
            .with_unit(v(4, 4), Unit::new(UnitKind::Infantry, 2));
        let (mut session, clock) = session_on(&map, Some(1));
        let sender = session.remote_sender();
        sender
            .send(GameActionResponse::from_others(vec![ActionResponse::EndTurn {
                current: 1,
                next: 2,
                round: 1,
                funds: 0,
            }]))
            .unwrap();
        drive(&mut session, &clock);
        assert_eq!(session.state().map.current_player, 2);
    }

    #[test]
    fn test_profile_follows_the_next_response() {
        let (_, responses) = record_responses(&skirmish_map(), &skirmish_script()).unwrap();
        let (mut session, clock) = session_on(&skirmish_map(), Some(1));
        session.replay(responses);

        let bot = step_until(&mut session, &clock, |session| {
            session.state().profile == ProfileKind::Bot
        });
        assert!(bot, "Responses not followed by a human turn use the bot profile");
        drive(&mut session, &clock);
        assert_eq!(session.state().profile, ProfileKind::Human);
    }
}

// =============================================================================
// Replays and the end of the game
// =============================================================================

mod replays {
    use super::*;

    #[test]
    fn test_replay_suppresses_remote_actions() {
        let (_, responses) = record_responses(&skirmish_map(), &skirmish_script()).unwrap();
        let (mut session, clock) = session_on(&skirmish_map(), Some(1));
        session.replay(responses);

        let error = session.action(Action::EndTurn).unwrap_err();
        assert!(matches!(
            error,
            ClientError::RemoteActionsSuppressed { action: "EndTurn" }
        ));

        drive(&mut session, &clock);
        assert!(!session.state().replaying);
        assert!(session.action(Action::EndTurn).is_ok());
    }

    #[test]
    fn test_replay_reaches_the_recorded_map() {
        let (expected, responses) = record_responses(&skirmish_map(), &skirmish_script()).unwrap();
        let (mut session, clock) = session_on(&skirmish_map(), None);
        session.replay(responses);
        let elapsed = drive(&mut session, &clock);

        assert_eq!(session.state().map, expected);
        assert!(elapsed > Duration::ZERO);
    }

    #[test]
    fn test_game_end_stops_interaction() {
        let map = empty_map(4, 4)
            .with_unit(v(2, 2), Unit::new(UnitKind::Infantry, 1))
            .with_unit(v(2, 3), Unit::new(UnitKind::Infantry, 2).with_health(1));
        let (_, responses) = record_responses(
            &map,
            &[Action::AttackUnit {
                from: v(2, 2),
                to: v(2, 3),
            }],
        )
        .unwrap();
        assert_eq!(responses.len(), 2);

        let (mut session, clock) = session_on(&map, Some(1));
        let mut events = session.subscribe();
        session.process_game_action_response(GameActionResponse::from_others(responses));
        drive(&mut session, &clock);

        let mut winner = None;
        while let Ok(event) = events.try_recv() {
            if let SessionEvent::GameEnded { winner: w } = event {
                winner = Some(w);
            }
        }
        assert_eq!(winner, Some(Some(1)));
        assert!(session.state().map.is_ended());
        assert_eq!(session.state().behavior_kind(), Some(BehaviorKind::Null));
        assert!(matches!(
            session.action(Action::EndTurn),
            Err(ClientError::GameEnded { .. })
        ));

        session.reset_behavior().unwrap();
        assert_eq!(session.state().behavior_kind(), Some(BehaviorKind::Null));
    }
}
