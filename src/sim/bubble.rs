//! Bubble and mini-bubble entities
//!
//! A `Bubble` exclusively owns its minis. Each `MiniBubble` only stores the
//! owner's `BubbleId`, never a reference, and its position is derived from the
//! owner's position every time it changes.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::Viewport;
use crate::consts::*;
use crate::tasks::TaskId;
use crate::{polar_to_cartesian, wrap_angle};

/// Fill colors for top-level bubbles
pub const GALAXY_COLORS: &[&str] = &[
    "#4A148C", "#1A237E", "#0D47A1", "#006064", "#1B5E20", "#3E2723", "#BF360C", "#E91E63",
    "#9C27B0", "#673AB7", "#3F51B5", "#2196F3", "#00BCD4", "#4CAF50", "#FF9800", "#F44336",
];

/// Fill colors for minis
pub const MINI_COLORS: &[&str] = &[
    "#FF6B6B", "#4ECDC4", "#45B7D1", "#96CEB4", "#FECA57", "#FF9FF3", "#54A0FF", "#5F27CD",
    "#00D2D3", "#FF9F43", "#10AC84", "#EE5A24",
];

/// Scene-local bubble identifier (allocation order = insertion order)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BubbleId(pub u32);

/// Scene-local mini identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MiniId(pub u32);

/// A top-level task bubble
#[derive(Debug, Clone)]
pub struct Bubble {
    pub id: BubbleId,
    /// Correlation id of the stored task, once known
    pub task_id: Option<TaskId>,
    pub pos: Vec2,
    vel: Vec2,
    radius: f32,
    pub color: String,
    pub label: String,
    /// Orbiting minis (insertion order = display order)
    pub minis: Vec<MiniBubble>,
}

impl Bubble {
    /// Create a bubble; each velocity axis gets an independent coin-flip sign
    pub fn new<R: Rng + ?Sized>(
        id: BubbleId,
        pos: Vec2,
        radius: f32,
        color: impl Into<String>,
        label: impl Into<String>,
        task_id: Option<TaskId>,
        rng: &mut R,
    ) -> Self {
        let sign_x = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
        let sign_y = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
        Self::with_direction(id, pos, radius, color, label, task_id, Vec2::new(sign_x, sign_y))
    }

    /// Create a bubble moving along the given sign vector
    pub fn with_direction(
        id: BubbleId,
        pos: Vec2,
        radius: f32,
        color: impl Into<String>,
        label: impl Into<String>,
        task_id: Option<TaskId>,
        direction: Vec2,
    ) -> Self {
        Self {
            id,
            task_id,
            pos,
            vel: direction.signum() * BUBBLE_SPEED,
            radius,
            color: color.into(),
            label: label.into(),
            minis: Vec::new(),
        }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn velocity(&self) -> Vec2 {
        self.vel
    }

    /// True when `point` lies on or inside the disc
    pub fn contains(&self, point: Vec2) -> bool {
        self.pos.distance(point) <= self.radius
    }

    /// Move one tick, reflecting an axis before it would cross the inset margin
    pub fn advance(&mut self, viewport: Viewport) {
        let (x, dx) = bounce_axis(self.pos.x, self.vel.x, self.radius, viewport.width);
        let (y, dy) = bounce_axis(self.pos.y, self.vel.y, self.radius, viewport.height);
        self.pos = Vec2::new(x, y);
        self.vel = Vec2::new(dx, dy);
    }

    /// Attach a mini at angle 0, then spread all minis evenly
    pub fn attach_mini(&mut self, id: MiniId, label: impl Into<String>, color: impl Into<String>) {
        let mini = MiniBubble {
            id,
            owner: self.id,
            angle: 0.0,
            angular_vel: MINI_ANGULAR_STEP,
            orbit_radius: MINI_ORBIT_RADIUS,
            radius: MINI_RADIUS,
            color: color.into(),
            label: label.into(),
            pos: polar_to_cartesian(self.pos, MINI_ORBIT_RADIUS, 0.0),
        };
        self.minis.push(mini);
        self.redistribute();
    }

    /// Remove a mini and re-spread the remainder
    pub fn detach_mini(&mut self, id: MiniId) -> Option<MiniBubble> {
        let index = self.minis.iter().position(|m| m.id == id)?;
        let mini = self.minis.remove(index);
        self.redistribute();
        Some(mini)
    }

    /// Reassign angles `i * 2π / count` in display order
    pub fn redistribute(&mut self) {
        if self.minis.is_empty() {
            return;
        }
        let step = TAU / self.minis.len() as f32;
        let owner_pos = self.pos;
        for (i, mini) in self.minis.iter_mut().enumerate() {
            mini.angle = i as f32 * step;
            mini.snap_to(owner_pos);
        }
    }

    /// Advance every mini around the current owner position
    pub fn advance_minis(&mut self) {
        let owner_pos = self.pos;
        for mini in &mut self.minis {
            mini.advance(owner_pos);
        }
    }
}

/// Reflect and clamp one axis so the disc edge stays inside `[margin, size - margin]`
fn bounce_axis(pos: f32, vel: f32, radius: f32, size: f32) -> (f32, f32) {
    let lo = BOUNCE_MARGIN + radius;
    let hi = size - BOUNCE_MARGIN - radius;
    if lo > hi {
        // Viewport too small to hold the disc; park it in the middle
        return (size / 2.0, vel);
    }

    let next = pos + vel;
    let vel = if (next > hi && vel > 0.0) || (next < lo && vel < 0.0) {
        -vel
    } else {
        vel
    };
    ((pos + vel).clamp(lo, hi), vel)
}

/// A sub-task orbiting its owner bubble
#[derive(Debug, Clone)]
pub struct MiniBubble {
    pub id: MiniId,
    /// Owner back-reference by id
    pub owner: BubbleId,
    pub angle: f32,
    pub angular_vel: f32,
    pub orbit_radius: f32,
    pub radius: f32,
    pub color: String,
    pub label: String,
    pub pos: Vec2,
}

impl MiniBubble {
    /// Step the orbit angle and follow the (possibly moved) owner
    pub fn advance(&mut self, owner_pos: Vec2) {
        self.angle = wrap_angle(self.angle + self.angular_vel);
        self.snap_to(owner_pos);
    }

    fn snap_to(&mut self, owner_pos: Vec2) {
        self.pos = polar_to_cartesian(owner_pos, self.orbit_radius, self.angle);
    }

    pub fn contains(&self, point: Vec2) -> bool {
        self.pos.distance(point) <= self.radius
    }
}

/// Pick a random palette entry
pub fn pick_color<R: Rng + ?Sized>(palette: &[&'static str], rng: &mut R) -> &'static str {
    palette[rng.random_range(0..palette.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use std::f32::consts::{FRAC_PI_2, PI};

    fn viewport() -> Viewport {
        Viewport::new(800.0, 600.0)
    }

    fn bubble_at(x: f32, y: f32, dir: Vec2) -> Bubble {
        Bubble::with_direction(BubbleId(1), Vec2::new(x, y), BUBBLE_RADIUS, "#fff", "t", None, dir)
    }

    fn assert_angle_step(bubble: &Bubble, step: f32) {
        for (i, mini) in bubble.minis.iter().enumerate() {
            let expected = i as f32 * step;
            assert!(
                (mini.angle - expected).abs() < 1e-5,
                "mini {} at {} expected {}",
                i,
                mini.angle,
                expected
            );
        }
    }

    #[test]
    fn test_velocity_is_unit_per_axis() {
        let mut rng = Pcg32::seed_from_u64(7);
        for i in 0..32 {
            let b = Bubble::new(BubbleId(i), Vec2::splat(300.0), 50.0, "#fff", "", None, &mut rng);
            assert_eq!(b.velocity().abs(), Vec2::splat(BUBBLE_SPEED));
        }
    }

    #[test]
    fn test_direction_signs_are_both_reachable() {
        let mut rng = Pcg32::seed_from_u64(42);
        let mut seen_pos = false;
        let mut seen_neg = false;
        for i in 0..64 {
            let b = Bubble::new(BubbleId(i), Vec2::splat(300.0), 50.0, "#fff", "", None, &mut rng);
            seen_pos |= b.velocity().x > 0.0;
            seen_neg |= b.velocity().x < 0.0;
        }
        assert!(seen_pos && seen_neg);
    }

    #[test]
    fn test_bounce_off_right_margin() {
        let vp = viewport();
        let mut b = bubble_at(100.0, 100.0, Vec2::new(1.0, 1.0));
        let limit = vp.width - BOUNCE_MARGIN - b.radius();

        let mut steps = 0;
        while b.pos.x + b.velocity().x <= limit {
            b.advance(vp);
            steps += 1;
            assert!(steps < 10_000, "never reached the margin");
        }
        assert!(b.velocity().x > 0.0);
        let before = b.pos.x;

        b.advance(vp);
        assert!(b.velocity().x < 0.0, "dx should flip at the margin");
        assert!(b.pos.x < before, "x should decrease after the flip");
    }

    #[test]
    fn test_axes_bounce_independently() {
        let vp = viewport();
        let lo = BOUNCE_MARGIN + BUBBLE_RADIUS;
        let mut b = bubble_at(lo + 0.5, 300.0, Vec2::new(-1.0, 1.0));
        b.advance(vp);
        assert!(b.velocity().x > 0.0);
        assert!(b.velocity().y > 0.0);
    }

    #[test]
    fn test_tiny_viewport_parks_bubble() {
        let mut b = bubble_at(10.0, 10.0, Vec2::ONE);
        b.advance(Viewport::new(100.0, 100.0));
        assert_eq!(b.pos, Vec2::new(50.0, 50.0));
    }

    #[test]
    fn test_attach_spreads_evenly_from_zero() {
        let mut b = bubble_at(300.0, 300.0, Vec2::ONE);
        for i in 0..3 {
            b.attach_mini(MiniId(i), format!("m{}", i), "#000");
        }
        assert_angle_step(&b, TAU / 3.0);
    }

    #[test]
    fn test_four_minis_quarter_turns() {
        let mut b = bubble_at(300.0, 300.0, Vec2::ONE);
        for i in 0..4 {
            b.attach_mini(MiniId(i), "sub", "#000");
        }
        let angles: Vec<f32> = b.minis.iter().map(|m| m.angle).collect();
        let expected = [0.0, FRAC_PI_2, PI, 3.0 * FRAC_PI_2];
        for (a, e) in angles.iter().zip(expected) {
            assert!((a - e).abs() < 1e-5);
        }
    }

    #[test]
    fn test_detach_redistributes_remainder() {
        let mut b = bubble_at(300.0, 300.0, Vec2::ONE);
        for i in 0..3 {
            b.attach_mini(MiniId(i), "sub", "#000");
        }
        let removed = b.detach_mini(MiniId(1)).expect("mini exists");
        assert_eq!(removed.label, "sub");
        assert_eq!(b.minis.len(), 2);
        assert_angle_step(&b, PI);
    }

    #[test]
    fn test_detach_last_mini_leaves_nothing() {
        let mut b = bubble_at(300.0, 300.0, Vec2::ONE);
        b.attach_mini(MiniId(9), "only", "#000");
        assert!(b.detach_mini(MiniId(9)).is_some());
        assert!(b.minis.is_empty());
        assert!(b.detach_mini(MiniId(9)).is_none());
    }

    #[test]
    fn test_minis_track_moving_owner() {
        let vp = viewport();
        let mut b = bubble_at(300.0, 300.0, Vec2::ONE);
        b.attach_mini(MiniId(1), "a", "#000");
        b.attach_mini(MiniId(2), "b", "#000");
        for _ in 0..25 {
            b.advance(vp);
            b.advance_minis();
        }
        for mini in &b.minis {
            let expected = polar_to_cartesian(b.pos, mini.orbit_radius, mini.angle);
            assert!(mini.pos.distance(expected) < 1e-3);
        }
        assert!((b.minis[0].angle - 25.0 * MINI_ANGULAR_STEP).abs() < 1e-4);
    }

    proptest! {
        #[test]
        fn prop_position_stays_inside_margins(
            width in 260.0f32..1600.0,
            height in 260.0f32..1200.0,
            fx in 0.0f32..1.0,
            fy in 0.0f32..1.0,
            dx in prop::bool::ANY,
            dy in prop::bool::ANY,
            steps in 0usize..3000,
        ) {
            let vp = Viewport::new(width, height);
            let r = BUBBLE_RADIUS;
            let lo = BOUNCE_MARGIN + r;
            let x = lo + fx * (width - 2.0 * lo);
            let y = lo + fy * (height - 2.0 * lo);
            let dir = Vec2::new(if dx { 1.0 } else { -1.0 }, if dy { 1.0 } else { -1.0 });
            let mut b = bubble_at(x, y, dir);
            for _ in 0..steps {
                b.advance(vp);
                prop_assert!(b.pos.x >= BOUNCE_MARGIN && b.pos.x <= width - BOUNCE_MARGIN);
                prop_assert!(b.pos.y >= BOUNCE_MARGIN && b.pos.y <= height - BOUNCE_MARGIN);
                prop_assert!(b.pos.x - r >= BOUNCE_MARGIN - 1e-3);
                prop_assert!(b.pos.x + r <= width - BOUNCE_MARGIN + 1e-3);
            }
        }

        #[test]
        fn prop_redistribution_step(count in 1usize..24, remove in 0usize..24) {
            let mut b = bubble_at(300.0, 300.0, Vec2::ONE);
            for i in 0..count {
                b.attach_mini(MiniId(i as u32), "m", "#000");
            }
            assert_angle_step(&b, TAU / count as f32);
            if remove < count && count > 1 {
                b.detach_mini(MiniId(remove as u32));
                assert_angle_step(&b, TAU / (count - 1) as f32);
            }
        }
    }
}
