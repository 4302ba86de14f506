//! Pointer routing: turn a click into a scene mutation plus reward events

use glam::Vec2;

use super::bubble::{BubbleId, MiniId};
use super::state::{PopKind, SceneEvent, SceneState};
use crate::consts::{BUBBLE_POP_REWARD, MINI_POP_REWARD};

/// A click in canvas-local coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerInput {
    pub pos: Vec2,
    /// Auxiliary key (shift) held during the click
    pub modifier: bool,
}

impl PointerInput {
    pub fn click(x: f32, y: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            modifier: false,
        }
    }

    pub fn modified_click(x: f32, y: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            modifier: true,
        }
    }
}

/// What a click did
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    /// Nothing was hit, or the scene is not ready for input
    Ignored,
    /// Modifier click attached a mini
    MiniAttached { bubble: BubbleId, mini: MiniId },
    /// A mini was popped off its owner
    MiniPopped { bubble: BubbleId, mini: MiniId },
    /// A top-level bubble was popped and removed
    BubblePopped { bubble: BubbleId },
    /// The hit bubble still has minis and stays put
    Blocked { bubble: BubbleId },
}

/// Route one click through the priority rules
///
/// 1. modifier: attach a mini to the first bubble under the pointer
/// 2. first mini under the pointer (owner order, then orbit order): pop it
/// 3. first bubble under the pointer: pop it if it has no minis
pub fn route_click(state: &mut SceneState, input: &PointerInput, pending_label: &str) -> ClickOutcome {
    if !state.viewport.is_ready() {
        log::debug!("Click at {:?} ignored, canvas not sized yet", input.pos);
        return ClickOutcome::Ignored;
    }

    if input.modifier {
        let Some(bubble) = hit_bubble(state, input.pos) else {
            return ClickOutcome::Ignored;
        };
        return match state.attach_mini(bubble, pending_label) {
            Some(mini) => ClickOutcome::MiniAttached { bubble, mini },
            None => ClickOutcome::Ignored,
        };
    }

    if let Some((bubble, mini)) = hit_mini(state, input.pos) {
        state.detach_mini(bubble, mini);
        state.push_event(SceneEvent::RewardGranted {
            points: MINI_POP_REWARD,
            at: input.pos,
        });
        state.push_event(SceneEvent::PopSound { kind: PopKind::Mini });
        return ClickOutcome::MiniPopped { bubble, mini };
    }

    let Some(bubble) = hit_bubble(state, input.pos) else {
        return ClickOutcome::Ignored;
    };
    let has_minis = state
        .bubble(bubble)
        .is_some_and(|b| !b.minis.is_empty());
    if has_minis {
        return ClickOutcome::Blocked { bubble };
    }

    let Some(popped) = state.remove_bubble(bubble) else {
        return ClickOutcome::Ignored;
    };
    if let Some(task_id) = popped.task_id {
        state.push_event(SceneEvent::TaskDeleteRequested { task_id });
    }
    state.push_event(SceneEvent::RewardGranted {
        points: BUBBLE_POP_REWARD,
        at: input.pos,
    });
    state.push_event(SceneEvent::PopSound {
        kind: PopKind::Bubble,
    });
    ClickOutcome::BubblePopped { bubble }
}

/// First bubble (insertion order) whose disc contains `pos`
fn hit_bubble(state: &SceneState, pos: Vec2) -> Option<BubbleId> {
    state
        .bubbles
        .iter()
        .find(|b| b.contains(pos))
        .map(|b| b.id)
}

fn hit_mini(state: &SceneState, pos: Vec2) -> Option<(BubbleId, MiniId)> {
    state.bubbles.iter().find_map(|b| {
        b.minis
            .iter()
            .find(|m| m.contains(pos))
            .map(|m| (b.id, m.id))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::Viewport;
    use crate::tasks::TaskId;

    fn ready_scene() -> SceneState {
        let mut state = SceneState::new(77);
        state.resize(Viewport::new(1000.0, 800.0));
        state
    }

    fn rewards(state: &mut SceneState) -> Vec<u32> {
        state
            .drain_events()
            .into_iter()
            .filter_map(|e| match e {
                SceneEvent::RewardGranted { points, .. } => Some(points),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_modifier_click_attaches_labelled_mini() {
        let mut state = ready_scene();
        let id = state.add_bubble(Vec2::new(300.0, 300.0), "#fff", "parent", None);

        let outcome = route_click(&mut state, &PointerInput::modified_click(310.0, 290.0), "X");
        assert!(matches!(outcome, ClickOutcome::MiniAttached { bubble, .. } if bubble == id));

        assert_eq!(state.bubbles.len(), 1);
        let bubble = state.bubble(id).expect("still present");
        assert_eq!(bubble.minis.len(), 1);
        assert_eq!(bubble.minis[0].label, "X");
        assert_eq!(bubble.minis[0].owner, id);
        assert!(state.events().is_empty());
    }

    #[test]
    fn test_modifier_click_on_empty_space_is_consumed() {
        let mut state = ready_scene();
        state.add_bubble(Vec2::new(300.0, 300.0), "#fff", "parent", None);
        let outcome = route_click(&mut state, &PointerInput::modified_click(700.0, 700.0), "X");
        assert_eq!(outcome, ClickOutcome::Ignored);
        assert_eq!(state.bubbles.len(), 1);
        assert_eq!(state.mini_count(), 0);
    }

    #[test]
    fn test_plain_click_pops_bubble_and_requests_delete() {
        let mut state = ready_scene();
        let id = state.add_bubble(Vec2::new(300.0, 300.0), "#fff", "a", Some(TaskId(42)));

        let outcome = route_click(&mut state, &PointerInput::click(300.0, 340.0), "");
        assert_eq!(outcome, ClickOutcome::BubblePopped { bubble: id });
        assert!(state.bubbles.is_empty());

        let events = state.drain_events();
        assert!(events.contains(&SceneEvent::TaskDeleteRequested { task_id: TaskId(42) }));
        assert!(events.contains(&SceneEvent::RewardGranted {
            points: BUBBLE_POP_REWARD,
            at: Vec2::new(300.0, 340.0),
        }));
    }

    #[test]
    fn test_bubble_with_minis_is_not_removable() {
        let mut state = ready_scene();
        let id = state.add_bubble(Vec2::new(300.0, 300.0), "#fff", "a", Some(TaskId(1)));
        state.attach_mini(id, "sub");

        let outcome = route_click(&mut state, &PointerInput::click(300.0, 300.0), "");
        assert_eq!(outcome, ClickOutcome::Blocked { bubble: id });
        assert_eq!(state.bubbles.len(), 1);
        assert!(state.events().is_empty());
    }

    #[test]
    fn test_mini_pop_wins_over_bubble_and_rewards_five() {
        let mut state = ready_scene();
        let id = state.add_bubble(Vec2::new(300.0, 300.0), "#fff", "a", None);
        state.attach_mini(id, "sub");
        // Mini sits at angle 0: owner + (100, 0); a second bubble overlaps it
        state.add_bubble(Vec2::new(400.0, 300.0), "#fff", "b", None);

        let outcome = route_click(&mut state, &PointerInput::click(400.0, 300.0), "");
        assert!(matches!(outcome, ClickOutcome::MiniPopped { bubble, .. } if bubble == id));
        assert_eq!(state.bubbles.len(), 2);
        assert_eq!(state.mini_count(), 0);
        assert_eq!(rewards(&mut state), vec![MINI_POP_REWARD]);

        // Bubble is free again once its last mini is gone
        let outcome = route_click(&mut state, &PointerInput::click(300.0, 300.0), "");
        assert_eq!(outcome, ClickOutcome::BubblePopped { bubble: id });
    }

    #[test]
    fn test_overlap_resolved_by_insertion_order() {
        let mut state = ready_scene();
        let first = state.add_bubble(Vec2::new(300.0, 300.0), "#fff", "first", None);
        let second = state.add_bubble(Vec2::new(320.0, 300.0), "#fff", "second", None);

        let outcome = route_click(&mut state, &PointerInput::click(310.0, 300.0), "");
        assert_eq!(outcome, ClickOutcome::BubblePopped { bubble: first });
        assert!(state.bubble(second).is_some());
    }

    #[test]
    fn test_three_minis_pop_one_leaves_half_turn() {
        let mut state = ready_scene();
        let id = state.add_bubble(Vec2::new(400.0, 400.0), "#fff", "a", None);
        for label in ["a", "b", "c"] {
            state.attach_mini(id, label);
        }
        let target = state.bubble(id).map(|b| b.minis[1].pos).expect("bubble");
        let outcome = route_click(&mut state, &PointerInput::click(target.x, target.y), "");
        assert!(matches!(outcome, ClickOutcome::MiniPopped { .. }));

        let minis = &state.bubble(id).expect("bubble").minis;
        assert_eq!(minis.len(), 2);
        assert!((minis[1].angle - minis[0].angle - std::f32::consts::PI).abs() < 1e-5);
    }

    #[test]
    fn test_untracked_bubble_pop_skips_delete() {
        let mut state = ready_scene();
        state.add_bubble(Vec2::new(300.0, 300.0), "#fff", "a", None);
        route_click(&mut state, &PointerInput::click(300.0, 300.0), "");
        let events = state.drain_events();
        assert!(
            !events
                .iter()
                .any(|e| matches!(e, SceneEvent::TaskDeleteRequested { .. }))
        );
    }

    #[test]
    fn test_click_before_sizing_is_ignored() {
        let mut state = SceneState::new(1);
        state.add_bubble(Vec2::new(100.0, 100.0), "#fff", "a", None);
        let outcome = route_click(&mut state, &PointerInput::click(100.0, 100.0), "");
        assert_eq!(outcome, ClickOutcome::Ignored);
        assert_eq!(state.bubbles.len(), 1);
    }
}
