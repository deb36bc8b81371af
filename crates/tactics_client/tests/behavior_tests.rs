//! Interaction flows through the behavior state machine.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use tactics_client::prelude::*;
use tactics_rules::prelude::{
    Action, Building, BuildingKind, MapData, Skill, Tile, Unit, UnitAction, UnitKind, Vector,
    BARRIER_TOGGLE_COST, HEAL_COST, NEUTRAL,
};
use tactics_test_utils::clock::{drive, ManualClock};
use tactics_test_utils::fixtures::{humans, v};
use tactics_test_utils::transport::LocalServer;

type Errors = Rc<RefCell<Vec<ClientError>>>;

struct Harness {
    session: Session,
    clock: ManualClock,
    server: LocalServer,
    errors: Errors,
}

fn harness_with(config: ClientConfig, map: &MapData) -> Harness {
    let server = LocalServer::new(map, Some(1));
    let clock = ManualClock::new();
    let errors = Errors::default();
    let sink = errors.clone();
    let session = Session::new(config, map, Some(1), server.clone())
        .unwrap()
        .with_clock(clock.clone())
        .with_error_handler(move |error| sink.borrow_mut().push(error.clone()));
    Harness {
        session,
        clock,
        server,
        errors,
    }
}

fn harness(map: &MapData) -> Harness {
    harness_with(ClientConfig::default(), map)
}

/// A map where player 2 keeps a unit out of the way so no test ends the game.
fn arena(funds: u32) -> MapData {
    MapData::new(8, 8, humans(funds)).with_unit(v(8, 8), Unit::new(UnitKind::Infantry, 2))
}

fn flash_at(session: &Session, vector: Vector) -> Option<FlashReason> {
    match session.state().animations.get(vector.into()) {
        Some(AnimationEntry {
            animation: Animation::Flash { reason },
            ..
        }) => Some(*reason),
        _ => None,
    }
}

// =============================================================================
// Move
// =============================================================================

#[test]
fn test_move_and_attack_from_a_chosen_field() {
    let map = arena(0)
        .with_unit(v(2, 2), Unit::new(UnitKind::Infantry, 1))
        .with_unit(v(2, 5), Unit::new(UnitKind::Infantry, 2).with_health(1));
    let Harness {
        mut session,
        clock,
        server,
        errors,
    } = harness(&map);

    session.select(v(2, 2), None).unwrap();
    assert_eq!(session.state().behavior_kind(), Some(BehaviorKind::Move));
    session.select(v(2, 5), Some(v(2, 4))).unwrap();
    drive(&mut session, &clock);

    let received = server.received();
    assert_eq!(received.len(), 2);
    assert!(matches!(received[0], Action::Move { from, to, .. } if from == v(2, 2) && to == v(2, 4)));
    assert_eq!(
        received[1],
        Action::AttackUnit {
            from: v(2, 4),
            to: v(2, 5)
        }
    );
    assert!(session.state().map.unit(v(2, 5)).is_none());
    assert_eq!(session.state().map.unit(v(2, 4)).map(|unit| unit.player), Some(1));
    assert_eq!(session.state().behavior_kind(), Some(BehaviorKind::Base));
    assert!(errors.borrow().is_empty());
}

#[test]
fn test_confirmation_locks_the_radius_until_the_second_select() {
    let map = arena(0).with_unit(v(2, 2), Unit::new(UnitKind::Infantry, 1));
    let config = ClientConfig {
        confirm_actions: true,
        ..ClientConfig::default()
    };
    let Harness {
        mut session,
        clock,
        server,
        ..
    } = harness_with(config, &map);

    session.select(v(2, 2), None).unwrap();
    session.select(v(2, 4), None).unwrap();
    let pending = session.state().confirm_action.unwrap();
    assert_eq!(pending.to, v(2, 4));
    assert!(session.state().radius.as_ref().unwrap().locked);
    assert!(server.received().is_empty());

    // Selecting another field drops the pending confirmation.
    session.select(v(3, 2), None).unwrap();
    assert!(session.state().confirm_action.is_none());
    assert!(!session.state().radius.as_ref().unwrap().locked);
    assert_eq!(session.state().behavior_kind(), Some(BehaviorKind::Move));

    session.select(v(2, 4), None).unwrap();
    session.select(v(2, 4), None).unwrap();
    drive(&mut session, &clock);

    assert_eq!(server.received().len(), 1);
    assert_eq!(session.state().behavior_kind(), Some(BehaviorKind::Menu));
    assert_eq!(session.state().selected_position, Some(v(2, 4)));
}

// =============================================================================
// Attack
// =============================================================================

#[test]
fn test_unit_on_a_building_opens_the_target_picker() {
    let map = arena(0)
        .with_unit(v(2, 2), Unit::new(UnitKind::Infantry, 1))
        .with_unit(v(2, 3), Unit::new(UnitKind::Infantry, 2))
        .with_building(v(2, 3), Building::new(BuildingKind::House, 2));
    let Harness {
        mut session,
        clock,
        server,
        errors,
    } = harness(&map);

    session.select(v(2, 2), None).unwrap();
    session.select(v(2, 3), Some(v(2, 2))).unwrap();

    let state = session.state();
    assert_eq!(state.behavior_kind(), Some(BehaviorKind::Attack));
    assert_eq!(state.selected_attackable, Some(v(2, 3)));
    assert_eq!(
        state.menu.as_ref().map(|menu| menu.entries.clone()),
        Some(vec![
            MenuChoice::Target(TargetEntity::Unit),
            MenuChoice::Target(TargetEntity::Building),
        ])
    );
    assert!(server.received().is_empty());

    session.choose(MenuChoice::Target(TargetEntity::Building)).unwrap();
    drive(&mut session, &clock);

    assert_eq!(
        server.received(),
        vec![Action::AttackBuilding {
            from: v(2, 2),
            to: v(2, 3)
        }]
    );
    assert!(errors.borrow().is_empty());
}

#[test]
fn test_cancel_closes_the_picker_but_keeps_attacking() {
    let map = arena(0)
        .with_unit(v(2, 2), Unit::new(UnitKind::Infantry, 1))
        .with_unit(v(2, 3), Unit::new(UnitKind::Infantry, 2))
        .with_building(v(2, 3), Building::new(BuildingKind::House, 2));
    let Harness {
        mut session,
        server,
        ..
    } = harness(&map);

    session.select(v(2, 2), None).unwrap();
    session.select(v(2, 3), Some(v(2, 2))).unwrap();
    session.cancel().unwrap();

    assert_eq!(session.state().behavior_kind(), Some(BehaviorKind::Attack));
    assert!(session.state().selected_attackable.is_none());
    assert!(session.state().menu.is_none());

    session.choose(MenuChoice::Target(TargetEntity::Unit)).unwrap();
    assert!(server.received().is_empty(), "No target is picked");
}

// =============================================================================
// Menu and support actions
// =============================================================================

#[test]
fn test_moved_unit_opens_the_menu_and_waits() {
    let map = arena(0).with_unit(v(3, 3), Unit::new(UnitKind::Infantry, 1).set_moved());
    let Harness {
        mut session,
        clock,
        server,
        ..
    } = harness(&map);

    session.select(v(3, 3), None).unwrap();
    assert_eq!(session.state().behavior_kind(), Some(BehaviorKind::Menu));
    let entries = session.state().menu.as_ref().unwrap().entries.clone();
    assert_eq!(entries.last(), Some(&MenuChoice::Unit(UnitAction::Wait)));

    // Entries the menu does not offer are ignored.
    session.choose(MenuChoice::Unit(UnitAction::Heal)).unwrap();
    assert_eq!(session.state().behavior_kind(), Some(BehaviorKind::Menu));

    session.choose(MenuChoice::Unit(UnitAction::Wait)).unwrap();
    drive(&mut session, &clock);

    assert_eq!(server.received(), vec![Action::CompleteUnit { from: v(3, 3) }]);
    assert!(session.state().map.unit(v(3, 3)).unwrap().completed);
    assert_eq!(session.state().behavior_kind(), Some(BehaviorKind::Base));
}

fn medic_map(funds: u32) -> MapData {
    arena(funds)
        .with_unit(v(2, 2), Unit::new(UnitKind::Medic, 1).set_moved())
        .with_unit(v(2, 3), Unit::new(UnitKind::Infantry, 1).with_health(40))
}

#[test]
fn test_heal_without_funds_flashes() {
    let Harness { mut session, server, .. } = harness(&medic_map(0));

    session.select(v(2, 2), None).unwrap();
    session.choose(MenuChoice::Unit(UnitAction::Heal)).unwrap();

    assert_eq!(flash_at(&session, v(2, 2)), Some(FlashReason::InsufficientFunds));
    assert_eq!(session.state().behavior_kind(), Some(BehaviorKind::Base));
    assert!(server.received().is_empty());
}

#[test]
fn test_heal_spends_funds() {
    let Harness {
        mut session,
        clock,
        server,
        errors,
    } = harness(&medic_map(100));

    session.select(v(2, 2), None).unwrap();
    session.choose(MenuChoice::Unit(UnitAction::Heal)).unwrap();
    assert_eq!(session.state().behavior_kind(), Some(BehaviorKind::Heal));
    assert!(session.state().radius.as_ref().unwrap().contains(v(2, 3)));

    session.select(v(2, 3), None).unwrap();
    drive(&mut session, &clock);

    assert_eq!(
        server.received(),
        vec![Action::Heal {
            from: v(2, 2),
            to: v(2, 3)
        }]
    );
    assert!(session.state().map.unit(v(2, 3)).unwrap().health > 40);
    assert_eq!(session.state().map.player(1).unwrap().funds, 100 - HEAL_COST);
    assert!(errors.borrow().is_empty());
}

// =============================================================================
// Production
// =============================================================================

fn hq_map(funds: u32) -> MapData {
    arena(funds).with_building(v(1, 1), Building::new(BuildingKind::HQ, 1))
}

#[test]
fn test_building_menu_lists_what_it_builds() {
    let Harness { mut session, .. } = harness(&hq_map(0));

    session.select(v(1, 1), None).unwrap();

    assert_eq!(
        session.state().behavior_kind(),
        Some(BehaviorKind::CreateUnit)
    );
    assert_eq!(
        session.state().menu.as_ref().map(|menu| menu.entries.clone()),
        Some(vec![
            MenuChoice::Build(UnitKind::Infantry),
            MenuChoice::Build(UnitKind::Pioneer),
            MenuChoice::Skills,
        ])
    );
}

#[test]
fn test_create_unit_without_funds_flashes() {
    let Harness { mut session, server, .. } = harness(&hq_map(100));

    session.select(v(1, 1), None).unwrap();
    session.choose(MenuChoice::Build(UnitKind::Infantry)).unwrap();

    assert_eq!(flash_at(&session, v(1, 1)), Some(FlashReason::InsufficientFunds));
    assert_eq!(session.state().behavior_kind(), Some(BehaviorKind::Base));
    assert!(server.received().is_empty());
}

#[test]
fn test_single_deploy_field_creates_directly() {
    let Harness {
        mut session,
        clock,
        server,
        errors,
    } = harness(&hq_map(150));

    session.select(v(1, 1), None).unwrap();
    session.choose(MenuChoice::Build(UnitKind::Infantry)).unwrap();
    drive(&mut session, &clock);

    assert_eq!(
        server.received(),
        vec![Action::CreateUnit {
            from: v(1, 1),
            to: v(1, 1),
            kind: UnitKind::Infantry
        }]
    );
    let state = session.state();
    assert_eq!(state.map.unit(v(1, 1)).map(|unit| unit.kind), Some(UnitKind::Infantry));
    assert!(state.map.building(v(1, 1)).unwrap().completed);
    assert_eq!(state.map.player(1).unwrap().funds, 0);
    assert_eq!(state.behavior_kind(), Some(BehaviorKind::Base));
    assert!(errors.borrow().is_empty());
}

// =============================================================================
// Unit actions
// =============================================================================

#[test]
fn test_rescue_claims_the_neutral_unit() {
    let map = arena(0)
        .with_unit(v(3, 3), Unit::new(UnitKind::Jeep, 1).set_moved())
        .with_unit(v(3, 4), Unit::new(UnitKind::Infantry, NEUTRAL).with_health(30));
    let Harness {
        mut session,
        clock,
        server,
        errors,
    } = harness(&map);

    session.select(v(3, 3), None).unwrap();
    assert_eq!(
        session.state().menu.as_ref().map(|menu| menu.entries.clone()),
        Some(vec![
            MenuChoice::Unit(UnitAction::Rescue),
            MenuChoice::Unit(UnitAction::Wait),
        ])
    );
    session.choose(MenuChoice::Unit(UnitAction::Rescue)).unwrap();
    assert_eq!(session.state().behavior_kind(), Some(BehaviorKind::Rescue));
    assert_eq!(
        session.state().radius.as_ref().map(|radius| radius.kind),
        Some(RadiusType::Support)
    );

    session.select(v(3, 4), None).unwrap();
    drive(&mut session, &clock);

    assert_eq!(
        server.received(),
        vec![Action::Rescue {
            from: v(3, 3),
            to: v(3, 4)
        }]
    );
    let state = session.state();
    let rescued = state.map.unit(v(3, 4)).unwrap();
    assert_eq!(rescued.player, 1);
    assert_eq!(rescued.health, 30);
    assert!(state.map.unit(v(3, 3)).unwrap().completed);
    assert_eq!(state.map.units, server.map().units);
    assert_eq!(state.behavior_kind(), Some(BehaviorKind::Base));
    assert!(errors.borrow().is_empty());
}

#[test]
fn test_rescue_without_neutral_units_flashes() {
    let map = arena(0).with_unit(v(3, 3), Unit::new(UnitKind::Jeep, 1).set_moved());
    let Harness { mut session, server, .. } = harness(&map);

    session.select(v(3, 3), None).unwrap();
    session.update(StateUpdate::new().behavior(Behavior::Rescue)).unwrap();

    assert_eq!(flash_at(&session, v(3, 3)), Some(FlashReason::NoTargets));
    assert_eq!(session.state().behavior_kind(), Some(BehaviorKind::Base));
    assert!(session.state().radius.is_none());
    assert!(server.received().is_empty());
}

#[test]
fn test_sabotage_halves_the_victims_health() {
    let map = arena(0)
        .with_unit(v(3, 3), Unit::new(UnitKind::Saboteur, 1).set_moved())
        .with_unit(v(4, 3), Unit::new(UnitKind::Tank, 2).with_health(90));
    let Harness {
        mut session,
        clock,
        server,
        errors,
    } = harness(&map);

    session.select(v(3, 3), None).unwrap();
    let entries = session.state().menu.as_ref().unwrap().entries.clone();
    assert!(entries.contains(&MenuChoice::Unit(UnitAction::Attack)));
    session.choose(MenuChoice::Unit(UnitAction::Sabotage)).unwrap();
    assert_eq!(
        session.state().radius.as_ref().map(|radius| radius.kind),
        Some(RadiusType::Hostile)
    );

    // Fields outside the radius fall back to the default behavior.
    session.select(v(3, 4), None).unwrap();
    assert_eq!(session.state().behavior_kind(), Some(BehaviorKind::Base));
    assert!(server.received().is_empty());

    session.select(v(3, 3), None).unwrap();
    session.choose(MenuChoice::Unit(UnitAction::Sabotage)).unwrap();
    session.select(v(4, 3), None).unwrap();
    drive(&mut session, &clock);

    assert_eq!(
        server.received(),
        vec![Action::Sabotage {
            from: v(3, 3),
            to: v(4, 3)
        }]
    );
    let state = session.state();
    assert_eq!(state.map.unit(v(4, 3)).unwrap().health, 45);
    assert!(state.map.unit(v(3, 3)).unwrap().completed);
    assert_eq!(state.behavior_kind(), Some(BehaviorKind::Base));
    assert!(errors.borrow().is_empty());
}

#[test]
fn test_loading_moves_the_passenger_into_the_transporter() {
    let map = arena(0)
        .with_unit(v(3, 3), Unit::new(UnitKind::Jeep, 1).set_moved())
        .with_unit(v(3, 4), Unit::new(UnitKind::Infantry, 1).with_health(70));
    let Harness {
        mut session,
        clock,
        server,
        errors,
    } = harness(&map);

    session.select(v(3, 3), None).unwrap();
    session.choose(MenuChoice::Unit(UnitAction::Load)).unwrap();
    assert_eq!(session.state().behavior_kind(), Some(BehaviorKind::Transport));
    assert!(session.state().radius.as_ref().unwrap().contains(v(3, 4)));

    session.select(v(3, 4), None).unwrap();
    drive(&mut session, &clock);

    assert_eq!(
        server.received(),
        vec![Action::Move {
            from: v(3, 4),
            to: v(3, 3),
            path: vec![v(3, 3)]
        }]
    );
    let state = session.state();
    assert!(state.map.unit(v(3, 4)).is_none());
    let transporter = state.map.unit(v(3, 3)).unwrap();
    assert_eq!(transporter.kind, UnitKind::Jeep);
    assert_eq!(transporter.transports.len(), 1);
    assert_eq!(transporter.transports[0].health, 70);
    assert_eq!(state.map.units, server.map().units);
    assert!(errors.borrow().is_empty());
}

fn loaded_jeep() -> Unit {
    Unit::new(UnitKind::Jeep, 1)
        .load(&Unit::new(UnitKind::Infantry, 1))
        .set_moved()
}

#[test]
fn test_drop_unloads_next_to_the_transporter() {
    let map = arena(0).with_unit(v(3, 3), loaded_jeep());
    let Harness {
        mut session,
        clock,
        server,
        errors,
    } = harness(&map);

    session.select(v(3, 3), None).unwrap();
    assert_eq!(
        session.state().menu.as_ref().map(|menu| menu.entries.clone()),
        Some(vec![
            MenuChoice::Unit(UnitAction::Drop(0)),
            MenuChoice::Unit(UnitAction::Wait),
        ])
    );
    session.choose(MenuChoice::Unit(UnitAction::Drop(0))).unwrap();
    assert_eq!(session.state().behavior_kind(), Some(BehaviorKind::DropUnit));
    let radius = session.state().radius.as_ref().unwrap();
    assert_eq!(radius.kind, RadiusType::Deploy);
    assert!(radius.contains(v(2, 3)));
    assert!(!radius.contains(v(3, 3)));

    session.select(v(2, 3), None).unwrap();
    drive(&mut session, &clock);

    assert_eq!(
        server.received(),
        vec![Action::DropUnit {
            from: v(3, 3),
            index: 0,
            to: v(2, 3)
        }]
    );
    let state = session.state();
    let dropped = state.map.unit(v(2, 3)).unwrap();
    assert_eq!(dropped.kind, UnitKind::Infantry);
    assert!(dropped.completed);
    assert!(state.map.unit(v(3, 3)).unwrap().transports.is_empty());
    assert_eq!(state.map.units, server.map().units);
    assert_eq!(state.behavior_kind(), Some(BehaviorKind::Base));
    assert!(errors.borrow().is_empty());
}

#[test]
fn test_drop_without_free_fields_flashes() {
    let blocker = Unit::new(UnitKind::Infantry, 1).complete();
    let map = arena(0)
        .with_unit(v(3, 3), loaded_jeep())
        .with_unit(v(3, 2), blocker.clone())
        .with_unit(v(3, 4), blocker.clone())
        .with_unit(v(2, 3), blocker.clone())
        .with_unit(v(4, 3), blocker);
    let Harness { mut session, server, .. } = harness(&map);

    session.select(v(3, 3), None).unwrap();
    assert_eq!(
        session.state().menu.as_ref().map(|menu| menu.entries.clone()),
        Some(vec![MenuChoice::Unit(UnitAction::Wait)])
    );

    session
        .update(StateUpdate::new().behavior(Behavior::DropUnit { index: 0 }))
        .unwrap();

    assert_eq!(flash_at(&session, v(3, 3)), Some(FlashReason::NoSpace));
    assert_eq!(session.state().behavior_kind(), Some(BehaviorKind::Base));
    assert!(server.received().is_empty());
}

#[test]
fn test_capture_takes_over_the_building() {
    let map = arena(0)
        .with_unit(v(3, 3), Unit::new(UnitKind::Infantry, 1).set_moved())
        .with_building(v(3, 3), Building::new(BuildingKind::House, 2));
    let Harness {
        mut session,
        clock,
        server,
        errors,
    } = harness(&map);

    session.select(v(3, 3), None).unwrap();
    assert_eq!(
        session.state().menu.as_ref().map(|menu| menu.entries.clone()),
        Some(vec![
            MenuChoice::Unit(UnitAction::Capture),
            MenuChoice::Unit(UnitAction::Wait),
        ])
    );
    session.choose(MenuChoice::Unit(UnitAction::Capture)).unwrap();
    assert_eq!(session.state().behavior_kind(), Some(BehaviorKind::Null));
    drive(&mut session, &clock);

    assert_eq!(server.received(), vec![Action::Capture { from: v(3, 3) }]);
    let state = session.state();
    let building = state.map.building(v(3, 3)).unwrap();
    assert_eq!(building.player, 1);
    assert!(building.completed);
    assert!(state.map.unit(v(3, 3)).unwrap().completed);
    assert_eq!(state.map.buildings, server.map().buildings);
    assert_eq!(state.behavior_kind(), Some(BehaviorKind::Base));
    assert!(errors.borrow().is_empty());
}

#[test]
fn test_artillery_unfolds_and_folds_from_the_menu() {
    let unfolded = Unit {
        unfolded: true,
        ..Unit::new(UnitKind::Artillery, 1)
    };
    let map = arena(0)
        .with_unit(v(2, 2), Unit::new(UnitKind::Artillery, 1).set_moved())
        .with_unit(v(5, 5), unfolded);
    let Harness {
        mut session,
        clock,
        server,
        errors,
    } = harness(&map);

    session.select(v(2, 2), None).unwrap();
    assert_eq!(
        session.state().menu.as_ref().map(|menu| menu.entries.clone()),
        Some(vec![
            MenuChoice::Unit(UnitAction::Unfold),
            MenuChoice::Unit(UnitAction::Wait),
        ])
    );
    session.choose(MenuChoice::Unit(UnitAction::Unfold)).unwrap();
    drive(&mut session, &clock);

    // Unfolded units cannot move, so selecting one opens the menu.
    session.select(v(5, 5), None).unwrap();
    assert_eq!(session.state().behavior_kind(), Some(BehaviorKind::Menu));
    session.choose(MenuChoice::Unit(UnitAction::Fold)).unwrap();
    drive(&mut session, &clock);

    assert_eq!(
        server.received(),
        vec![
            Action::Unfold { from: v(2, 2) },
            Action::Fold { from: v(5, 5) }
        ]
    );
    let state = session.state();
    let first = state.map.unit(v(2, 2)).unwrap();
    assert!(first.unfolded && first.completed);
    let second = state.map.unit(v(5, 5)).unwrap();
    assert!(!second.unfolded && second.completed);
    assert_eq!(state.map.units, server.map().units);
    assert!(errors.borrow().is_empty());
}

// =============================================================================
// Buildings
// =============================================================================

fn radar_map(funds: u32) -> MapData {
    arena(funds)
        .with_building(v(3, 3), Building::new(BuildingKind::RadarStation, 1))
        .with_tile(v(3, 5), Tile::Barrier { active: true })
}

#[test]
fn test_radar_without_funds_flashes() {
    let Harness { mut session, server, .. } = harness(&radar_map(BARRIER_TOGGLE_COST - 1));

    session.select(v(3, 3), None).unwrap();

    assert_eq!(flash_at(&session, v(3, 3)), Some(FlashReason::InsufficientFunds));
    assert_eq!(session.state().behavior_kind(), Some(BehaviorKind::Base));
    assert!(server.received().is_empty());
}

#[test]
fn test_radar_without_barriers_flashes() {
    let map = arena(BARRIER_TOGGLE_COST)
        .with_building(v(3, 3), Building::new(BuildingKind::RadarStation, 1));
    let Harness { mut session, .. } = harness(&map);

    session.select(v(3, 3), None).unwrap();

    assert_eq!(flash_at(&session, v(3, 3)), Some(FlashReason::NoTargets));
    assert_eq!(session.state().behavior_kind(), Some(BehaviorKind::Base));
}

#[test]
fn test_radar_toggles_a_barrier() {
    let Harness {
        mut session,
        clock,
        server,
        errors,
    } = harness(&radar_map(BARRIER_TOGGLE_COST + 20));

    session.select(v(3, 3), None).unwrap();
    assert_eq!(session.state().behavior_kind(), Some(BehaviorKind::Radar));
    let radius = session.state().radius.as_ref().unwrap();
    assert_eq!(radius.kind, RadiusType::Barrier);
    assert!(radius.contains(v(3, 5)));

    session.select(v(3, 5), None).unwrap();
    drive(&mut session, &clock);

    assert_eq!(
        server.received(),
        vec![Action::ToggleBarrier {
            from: v(3, 3),
            to: v(3, 5)
        }]
    );
    let state = session.state();
    assert_eq!(state.map.tile(v(3, 5)), Some(Tile::Barrier { active: false }));
    assert!(state.map.building(v(3, 3)).unwrap().completed);
    assert_eq!(state.map.player(1).unwrap().funds, 20);
    assert_eq!(state.map.tile(v(3, 5)), server.map().tile(v(3, 5)));
    assert_eq!(state.behavior_kind(), Some(BehaviorKind::Base));
    assert!(errors.borrow().is_empty());
}

#[test]
fn test_shop_sells_skills_the_player_can_afford() {
    let map = arena(400).with_building(v(3, 3), Building::new(BuildingKind::Shop, 1));
    let Harness {
        mut session,
        clock,
        server,
        errors,
    } = harness(&map);

    session.select(v(3, 3), None).unwrap();
    assert_eq!(session.state().behavior_kind(), Some(BehaviorKind::BuySkills));
    assert_eq!(
        session.state().menu.as_ref().map(|menu| menu.entries.clone()),
        Some(Skill::ALL.into_iter().map(MenuChoice::Skill).collect())
    );

    session.choose(MenuChoice::Skill(Skill::Fortify)).unwrap();
    assert_eq!(flash_at(&session, v(3, 3)), Some(FlashReason::InsufficientFunds));
    assert_eq!(session.state().behavior_kind(), Some(BehaviorKind::Base));
    assert!(server.received().is_empty());

    session.select(v(3, 3), None).unwrap();
    session.choose(MenuChoice::Skill(Skill::Recon)).unwrap();
    drive(&mut session, &clock);

    assert_eq!(
        server.received(),
        vec![Action::BuySkill {
            from: v(3, 3),
            skill: Skill::Recon
        }]
    );
    let state = session.state();
    let player = state.map.player(1).unwrap();
    assert!(player.skills.contains(&Skill::Recon));
    assert_eq!(player.funds, 400 - Skill::Recon.cost());
    assert!(state.map.building(v(3, 3)).unwrap().completed);
    assert_eq!(state.map.players, server.map().players);
    assert!(errors.borrow().is_empty());
}

#[test]
fn test_headquarters_menu_leads_to_the_skill_shop() {
    let Harness { mut session, .. } = harness(&hq_map(0));

    session.select(v(1, 1), None).unwrap();
    session.choose(MenuChoice::Skills).unwrap();

    assert_eq!(session.state().behavior_kind(), Some(BehaviorKind::BuySkills));
    assert_eq!(session.state().selected_position, Some(v(1, 1)));
    assert_eq!(session.state().menu.as_ref().map(|menu| menu.entries.len()), Some(3));
}

#[test]
fn test_pioneer_constructs_a_building() {
    let map = arena(200).with_unit(v(3, 3), Unit::new(UnitKind::Pioneer, 1).set_moved());
    let Harness {
        mut session,
        clock,
        server,
        errors,
    } = harness(&map);

    session.select(v(3, 3), None).unwrap();
    session.choose(MenuChoice::Unit(UnitAction::CreateBuilding)).unwrap();
    assert_eq!(
        session.state().behavior_kind(),
        Some(BehaviorKind::CreateBuilding)
    );
    assert_eq!(
        session.state().menu.as_ref().map(|menu| menu.entries.clone()),
        Some(
            BuildingKind::CONSTRUCTIBLE
                .into_iter()
                .map(MenuChoice::Construct)
                .collect()
        )
    );

    session.choose(MenuChoice::Construct(BuildingKind::Barracks)).unwrap();
    assert_eq!(flash_at(&session, v(3, 3)), Some(FlashReason::InsufficientFunds));
    assert_eq!(session.state().behavior_kind(), Some(BehaviorKind::Base));
    assert!(server.received().is_empty());

    session.select(v(3, 3), None).unwrap();
    session.choose(MenuChoice::Unit(UnitAction::CreateBuilding)).unwrap();
    session.choose(MenuChoice::Construct(BuildingKind::House)).unwrap();
    drive(&mut session, &clock);

    assert_eq!(
        server.received(),
        vec![Action::CreateBuilding {
            from: v(3, 3),
            kind: BuildingKind::House
        }]
    );
    let state = session.state();
    let building = state.map.building(v(3, 3)).unwrap();
    assert_eq!((building.kind, building.player), (BuildingKind::House, 1));
    assert!(building.completed);
    assert!(state.map.unit(v(3, 3)).unwrap().completed);
    assert_eq!(state.map.player(1).unwrap().funds, 0);
    assert_eq!(state.map.buildings, server.map().buildings);
    assert_eq!(state.behavior_kind(), Some(BehaviorKind::Base));
    assert!(errors.borrow().is_empty());
}

// =============================================================================
// Editor
// =============================================================================

#[test]
fn test_design_paints_and_undoes() {
    let Harness {
        mut session,
        server,
        ..
    } = harness(&arena(0));

    let brush = Brush::Tile(Tile::Forest);
    session.update(StateUpdate::new().behavior(Behavior::Design { brush })).unwrap();
    session.select(v(3, 3), None).unwrap();
    assert_eq!(session.state().map.tile(v(3, 3)), Some(Tile::Forest));
    assert_eq!(session.state().editor.as_ref().map(EditorState::history_len), Some(1));

    // Painting the same tile again changes nothing.
    session.select(v(3, 3), None).unwrap();
    assert_eq!(session.state().editor.as_ref().map(EditorState::history_len), Some(1));

    let brush = Brush::Unit(UnitKind::Tank, 2);
    session.update(StateUpdate::new().behavior(Behavior::Design { brush })).unwrap();
    session.select(v(4, 4), None).unwrap();
    assert_eq!(session.state().map.unit(v(4, 4)).map(|unit| unit.kind), Some(UnitKind::Tank));
    assert_eq!(session.state().position, Some(v(4, 4)));

    assert!(session.undo_edit());
    assert!(session.state().map.unit(v(4, 4)).is_none());
    assert!(session.undo_edit());
    assert_eq!(session.state().map.tile(v(3, 3)), Some(Tile::Plain));
    assert!(!session.undo_edit());
    assert!(server.received().is_empty());
}

#[test]
fn test_entity_picks_and_relocates() {
    let map = arena(0)
        .with_unit(v(2, 2), Unit::new(UnitKind::Infantry, 1))
        .with_building(v(5, 5), Building::new(BuildingKind::House, 1));
    let Harness { mut session, .. } = harness(&map);

    session.update(StateUpdate::new().behavior(Behavior::Entity)).unwrap();
    session.select(v(2, 2), None).unwrap();
    assert_eq!(session.state().editor.as_ref().and_then(|editor| editor.selected), Some(v(2, 2)));

    session.select(v(4, 4), None).unwrap();
    let state = session.state();
    assert!(state.map.unit(v(2, 2)).is_none());
    assert_eq!(state.map.unit(v(4, 4)).map(|unit| unit.kind), Some(UnitKind::Infantry));
    assert_eq!(state.editor.as_ref().and_then(|editor| editor.selected), None);

    // Selecting the picked field again drops the pick.
    session.select(v(5, 5), None).unwrap();
    session.select(v(5, 5), None).unwrap();
    assert_eq!(session.state().editor.as_ref().and_then(|editor| editor.selected), None);
    session.select(v(5, 5), None).unwrap();
    session.select(v(6, 6), None).unwrap();
    assert!(session.state().map.building(v(5, 5)).is_none());
    assert!(session.state().map.building(v(6, 6)).is_some());

    assert!(session.undo_edit());
    assert!(session.state().map.building(v(5, 5)).is_some());
    assert!(session.undo_edit());
    assert!(session.state().map.unit(v(2, 2)).is_some());
}

// =============================================================================
// Hover timers
// =============================================================================

#[test]
fn test_hover_shows_tooltip_then_attack_preview() {
    let map = arena(0).with_unit(v(4, 4), Unit::new(UnitKind::Infantry, 2));
    let Harness {
        mut session, clock, ..
    } = harness(&map);
    let config = ClientConfig::default();

    session.enter(v(4, 4)).unwrap();
    assert!(session.state().tooltip.is_none());

    clock.set(Duration::from_millis(config.tooltip_delay_ms));
    session.pump();
    assert_eq!(session.state().tooltip, Some(v(4, 4)));
    assert!(session.state().preview.is_none());

    clock.set(Duration::from_millis(config.attack_preview_delay_ms));
    session.pump();
    let preview = session.state().preview.as_ref().unwrap();
    assert!(preview.contains_key(&v(4, 3)));
}

#[test]
fn test_moving_on_restarts_the_tooltip_timer() {
    let Harness {
        mut session, clock, ..
    } = harness(&arena(0));

    session.enter(v(4, 4)).unwrap();
    clock.set(Duration::from_millis(200));
    session.enter(v(1, 1)).unwrap();

    clock.set(Duration::from_millis(600));
    session.pump();
    assert!(session.state().tooltip.is_none());

    clock.set(Duration::from_millis(700));
    session.pump();
    assert_eq!(session.state().tooltip, Some(v(1, 1)));
}
