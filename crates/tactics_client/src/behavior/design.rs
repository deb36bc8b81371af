//! Map painting in the editor.

use tactics_rules::prelude::Vector;

use crate::editor::{paint, Brush};
use crate::error::Result;
use crate::session::Session;
use crate::state::StateUpdate;

pub(super) fn select(session: &mut Session, vector: Vector, brush: Brush) -> Result<Option<StateUpdate>> {
    let Some(painted) = paint(&session.state.map, vector, brush) else {
        return Ok(Some(StateUpdate::new().position(Some(vector))));
    };
    let editor = session.state.editor.clone().unwrap_or_default();
    Ok(Some(
        StateUpdate::new()
            .editor(Some(editor.with_snapshot(session.state.map.clone())))
            .map(painted)
            .position(Some(vector)),
    ))
}
