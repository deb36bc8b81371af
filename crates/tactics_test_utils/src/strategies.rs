//! Proptest strategies for client testing.

use proptest::prelude::*;
use tactics_client::prelude::{AnimationKey, FlashReason, InputEvent, MenuChoice};
use tactics_rules::prelude::{Direction, UnitAction, Vector};

/// A field on a `width` x `height` map.
pub fn arb_vector(width: i32, height: i32) -> impl Strategy<Value = Vector> {
    (1..=width, 1..=height).prop_map(|(x, y)| Vector::new(x, y))
}

/// Any arrow key.
pub fn arb_direction() -> impl Strategy<Value = Direction> {
    prop_oneof![
        Just(Direction::Up),
        Just(Direction::Right),
        Just(Direction::Down),
        Just(Direction::Left),
    ]
}

/// Any flash reason.
pub fn arb_flash_reason() -> impl Strategy<Value = FlashReason> {
    prop_oneof![
        Just(FlashReason::InsufficientFunds),
        Just(FlashReason::NoTargets),
        Just(FlashReason::NoSpace),
        Just(FlashReason::Blocked),
    ]
}

/// A key on a small map. Positions collide often on purpose.
pub fn arb_position_key(width: i32, height: i32) -> impl Strategy<Value = AnimationKey> {
    arb_vector(width, height).prop_map(AnimationKey::Position)
}

/// A sequence of flashes on a small map.
pub fn arb_flashes(
    width: i32,
    height: i32,
    max_len: usize,
) -> impl Strategy<Value = Vec<(Vector, FlashReason)>> {
    proptest::collection::vec((arb_vector(width, height), arb_flash_reason()), 1..max_len)
}

/// Any input gesture on a `width` x `height` map.
///
/// Menu choices are limited to waiting, the rest is covered by the
/// behavior tests.
pub fn arb_input(width: i32, height: i32) -> impl Strategy<Value = InputEvent> {
    prop_oneof![
        arb_vector(width, height).prop_map(InputEvent::Enter),
        (
            arb_vector(width, height),
            proptest::option::of(arb_vector(width, height))
        )
            .prop_map(|(vector, sub_vector)| InputEvent::Select { vector, sub_vector }),
        Just(InputEvent::Cancel),
        arb_direction().prop_map(InputEvent::Navigate),
        Just(InputEvent::Choose(MenuChoice::Unit(UnitAction::Wait))),
        Just(InputEvent::Accept),
    ]
}

/// A sequence of gestures.
pub fn arb_inputs(
    width: i32,
    height: i32,
    max_len: usize,
) -> impl Strategy<Value = Vec<InputEvent>> {
    proptest::collection::vec(arb_input(width, height), 0..max_len)
}
