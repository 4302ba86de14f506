//! Fixed timestep simulation tick

use super::state::SceneState;

/// Advance every bubble one step, then swing its minis around the new position
pub fn tick(state: &mut SceneState) {
    if !state.viewport.is_ready() {
        return;
    }

    state.time_ticks += 1;
    let viewport = state.viewport;
    for bubble in &mut state.bubbles {
        bubble.advance(viewport);
        bubble.advance_minis();
    }
}
