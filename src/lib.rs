//! Bubble Galaxy - task bubbles drifting over a rotating galaxy
//!
//! Core modules:
//! - `sim`: Deterministic scene simulation (bubbles, minis, backdrop, input routing)
//! - `renderer`: Canvas drawing of a scene frame
//! - `platform`: Browser/native host abstraction
//! - `driver`: Scene loop lifecycle (mount, frame ticks, unmount)
//! - `tasks`, `experience`: External task store and reward sink seams

#[cfg(target_arch = "wasm32")]
pub mod audio;
pub mod driver;
pub mod experience;
pub mod notifications;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod tasks;

pub use driver::{Collaborators, SceneError, SceneLoop, SoundPlayer};
pub use experience::{ExperienceLedger, RewardSink};
pub use settings::{QualityPreset, Settings};
pub use tasks::{TaskDraft, TaskId, TaskRecord, TaskService, TaskServiceError};

use glam::Vec2;

/// Scene configuration constants
pub mod consts {
    /// Fixed simulation timestep (one tick per 60 Hz display frame)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame gap fed to the accumulator (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Inset from each viewport edge that bubbles bounce off
    pub const BOUNCE_MARGIN: f32 = 50.0;
    /// Bubble speed along each axis (pixels per tick)
    pub const BUBBLE_SPEED: f32 = 1.0;
    pub const BUBBLE_RADIUS: f32 = 50.0;

    pub const MINI_RADIUS: f32 = 20.0;
    /// Distance from the owner's center to an orbiting mini
    pub const MINI_ORBIT_RADIUS: f32 = 100.0;
    /// Orbit angle advance per tick (radians)
    pub const MINI_ANGULAR_STEP: f32 = 0.02;

    /// Experience granted for popping a top-level bubble
    pub const BUBBLE_POP_REWARD: u32 = 10;
    /// Experience granted for popping a mini
    pub const MINI_POP_REWARD: u32 = 5;

    /// Floating "+N XP" lifetime (seconds)
    pub const NOTE_LIFETIME: f64 = 2.0;
    /// Age at which the floating note starts fading (seconds)
    pub const NOTE_FADE_START: f64 = 1.5;
    /// Distance a note rises while fading (pixels)
    pub const NOTE_RISE: f32 = 20.0;

    /// Canvas size limits and the chrome kept around it
    pub const MAX_CANVAS_WIDTH: f32 = 1200.0;
    pub const MAX_CANVAS_HEIGHT: f32 = 1000.0;
    pub const CANVAS_SIDE_CHROME: f32 = 40.0;
    pub const CANVAS_VERTICAL_CHROME: f32 = 200.0;
}

/// Normalized angle to [0, 2π)
#[inline]
pub fn wrap_angle(angle: f32) -> f32 {
    angle.rem_euclid(std::f32::consts::TAU)
}

/// Convert polar (r, theta) around `center` to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(center: Vec2, r: f32, theta: f32) -> Vec2 {
    center + Vec2::new(r * theta.cos(), r * theta.sin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{PI, TAU};

    #[test]
    fn test_wrap_angle() {
        assert!((wrap_angle(TAU + 0.5) - 0.5).abs() < 1e-5);
        assert!((wrap_angle(-PI / 2.0) - 1.5 * PI).abs() < 1e-5);
    }

    #[test]
    fn test_polar_to_cartesian_offsets_from_center() {
        let p = polar_to_cartesian(Vec2::new(10.0, 20.0), 5.0, PI / 2.0);
        assert!((p.x - 10.0).abs() < 1e-5);
        assert!((p.y - 25.0).abs() < 1e-5);
    }
}
