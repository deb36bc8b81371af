//! Session-level tests: pacing, pausing and input robustness.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;

use tactics_client::prelude::*;
use tactics_rules::prelude::{ActionResponse, MapData, Unit, UnitKind, Vector};
use tactics_test_utils::clock::{advance, drive, ManualClock};
use tactics_test_utils::fingerprint::Fingerprint;
use tactics_test_utils::fixtures::{
    empty_map, record_responses, skirmish_map, skirmish_script, v,
};
use tactics_test_utils::proptest::prelude::*;
use tactics_test_utils::strategies::{arb_flashes, arb_inputs};
use tactics_test_utils::transport::RecordingViewport;

fn session_on(map: &MapData) -> (Session, ManualClock) {
    let clock = ManualClock::new();
    let session = Session::new(ClientConfig::default(), map, Some(1), OfflineTransport)
        .unwrap()
        .with_clock(clock.clone());
    (session, clock)
}

fn recorded_skirmish() -> Vec<ActionResponse> {
    record_responses(&skirmish_map(), &skirmish_script()).unwrap().1
}

/// Replay the skirmish to the end and return the fingerprint and the time
/// it took.
fn replay_skirmish(fast_forward: bool) -> (Fingerprint, Duration) {
    let (mut session, clock) = session_on(&skirmish_map());
    session.fast_forward(fast_forward);
    session.replay(recorded_skirmish());
    let elapsed = drive(&mut session, &clock);
    assert!(session.is_idle());
    (Fingerprint::of(session.state()), elapsed)
}

// =============================================================================
// Fast forward and pausing
// =============================================================================

#[test]
fn test_fast_forward_reaches_the_same_state_sooner() {
    let (normal, normal_time) = replay_skirmish(false);
    let (fast, fast_time) = replay_skirmish(true);

    normal.assert_matches(&fast);
    assert!(
        fast_time < normal_time,
        "Fast forward took {fast_time:?}, real time {normal_time:?}"
    );
}

#[test]
fn test_fast_forward_can_be_toggled_mid_batch() {
    let (reference, _) = replay_skirmish(false);

    let (mut session, clock) = session_on(&skirmish_map());
    session.replay(recorded_skirmish());
    advance(&mut session, &clock, Duration::from_millis(700));
    assert!(session.is_processing());
    session.fast_forward(true);
    drive(&mut session, &clock);

    reference.assert_matches(&Fingerprint::of(session.state()));
}

#[test]
fn test_pause_freezes_a_batch() {
    let (reference, _) = replay_skirmish(false);

    let (mut session, clock) = session_on(&skirmish_map());
    session.replay(recorded_skirmish());
    advance(&mut session, &clock, Duration::from_millis(50));
    assert!(!session.state().animations.is_empty());

    session.pause_replay();
    assert!(session.state().paused);
    let frozen = session.state().clone();
    let waited = drive(&mut session, &clock);
    assert_eq!(waited, Duration::ZERO);
    clock.advance(Duration::from_secs(60));
    session.pump();

    assert_eq!(session.state().map, frozen.map);
    assert_eq!(session.state().animations, frozen.animations);
    assert_eq!(session.state().last_action_response, frozen.last_action_response);
    assert!(session.is_processing());
    assert_eq!(session.next_deadline(), None);

    session.resume_replay();
    assert!(!session.state().paused);
    drive(&mut session, &clock);
    reference.assert_matches(&Fingerprint::of(session.state()));
    assert_eq!(session.state().behavior_kind(), Some(BehaviorKind::Base));
}

#[test]
fn test_pause_keeps_the_remaining_delay() {
    let map = empty_map(4, 4).with_unit(v(1, 1), Unit::new(UnitKind::Infantry, 1));
    let (mut session, clock) = session_on(&map);
    let fired = Rc::new(RefCell::new(false));
    let flag = fired.clone();
    session.schedule_timer(Duration::from_millis(100), move |_| {
        *flag.borrow_mut() = true;
        Ok(())
    });

    advance(&mut session, &clock, Duration::from_millis(60));
    session.pause_replay();
    clock.advance(Duration::from_secs(5));
    session.pump();
    assert!(!*fired.borrow());

    session.resume_replay();
    advance(&mut session, &clock, Duration::from_millis(39));
    assert!(!*fired.borrow());
    advance(&mut session, &clock, Duration::from_millis(1));
    assert!(*fired.borrow());
}

#[test]
fn test_frames_wait_for_resume() {
    let map = empty_map(4, 4).with_unit(v(1, 1), Unit::new(UnitKind::Infantry, 1));
    let (mut session, _clock) = session_on(&map);
    let order = Rc::new(RefCell::new(Vec::new()));

    session.pause_replay();
    for index in 0..3 {
        let order = order.clone();
        session.request_frame(move |_| {
            order.borrow_mut().push(index);
            Ok(())
        });
    }
    session.pump();
    assert!(order.borrow().is_empty());

    session.resume_replay();
    session.pump();
    assert_eq!(*order.borrow(), vec![0, 1, 2]);
}

#[test]
fn test_every_response_is_scrolled_into_view() {
    let viewport = RecordingViewport::new(Duration::from_millis(200));
    let (session, clock) = session_on(&skirmish_map());
    let mut session = session.with_viewport(viewport.clone());
    let responses = recorded_skirmish();
    let count = responses.len();
    session.replay(responses);
    drive(&mut session, &clock);

    let scrolls = viewport.scrolls();
    // End of turn carries no field and does not scroll.
    assert_eq!(scrolls.len(), count - 2);
    assert_eq!(scrolls[0], vec![v(3, 3), v(3, 4)]);
}

// =============================================================================
// Behavior resets
// =============================================================================

#[test]
fn test_reset_is_idempotent() {
    let map = empty_map(5, 5).with_unit(v(2, 2), Unit::new(UnitKind::Infantry, 1));
    let (mut session, _clock) = session_on(&map);
    session.select(v(2, 2), None).unwrap();
    assert_eq!(session.state().behavior_kind(), Some(BehaviorKind::Move));

    session.reset_behavior().unwrap();
    let once = session.state().clone();
    session.reset_behavior().unwrap();
    let twice = session.state();

    assert_eq!(twice.behavior_kind(), Some(BehaviorKind::Base));
    assert_eq!(twice.behavior_kind(), once.behavior_kind());
    assert_eq!(twice.selected_position, once.selected_position);
    assert_eq!(twice.selected_unit, once.selected_unit);
    assert_eq!(twice.radius, once.radius);
    assert_eq!(twice.menu, once.menu);
    assert_eq!(twice.map, once.map);
}

#[test]
fn test_selecting_an_empty_field_selects_nothing() {
    let map = empty_map(5, 5).with_unit(v(2, 2), Unit::new(UnitKind::Infantry, 1));
    let (mut session, _clock) = session_on(&map);
    session.select(v(4, 1), None).unwrap();
    assert_eq!(session.state().behavior_kind(), Some(BehaviorKind::Base));
    assert_eq!(session.state().selected_position, None);
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// One animation plays per key at a time. The rest wait in order and
    /// the keys play in parallel.
    #[test]
    fn prop_flashes_queue_per_key(flashes in arb_flashes(3, 3, 12)) {
        let map = empty_map(3, 3).with_unit(v(1, 1), Unit::new(UnitKind::Infantry, 1));
        let (mut session, clock) = session_on(&map);

        let mut per_key: BTreeMap<Vector, usize> = BTreeMap::new();
        for (vector, reason) in &flashes {
            session.flash(*vector, *reason);
            *per_key.entry(*vector).or_default() += 1;
        }

        let queue = &session.state().animations;
        prop_assert_eq!(queue.len(), per_key.len());
        for (vector, count) in &per_key {
            prop_assert_eq!(queue.waiting((*vector).into()), count - 1);
        }

        let elapsed = drive(&mut session, &clock);
        let longest = per_key.values().copied().max().unwrap_or(0) as u64;
        let flash = ClientConfig::default().human.flash_ms;
        prop_assert_eq!(elapsed, Duration::from_millis(longest * flash));
        prop_assert!(session.is_idle());
    }

    /// Arbitrary input never wedges the session.
    #[test]
    fn prop_input_always_settles(inputs in arb_inputs(5, 5, 30)) {
        let map = empty_map(5, 5)
            .with_unit(v(2, 2), Unit::new(UnitKind::Infantry, 1))
            .with_unit(v(3, 3), Unit::new(UnitKind::Tank, 1))
            .with_unit(v(4, 3), Unit::new(UnitKind::Infantry, 2))
            .with_unit(v(5, 5), Unit::new(UnitKind::Infantry, 2));
        let (mut session, clock) = session_on(&map);

        for input in inputs {
            session.handle_input(input);
            advance(&mut session, &clock, Duration::from_millis(50));
        }
        drive(&mut session, &clock);
        prop_assert!(session.is_idle());
        prop_assert!(session.state().animations.is_empty());
    }
}
