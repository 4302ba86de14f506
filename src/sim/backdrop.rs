//! Procedural galaxy backdrop
//!
//! The shape (arms and both star populations) is rolled once from a seeded RNG
//! and memoized for the scene lifetime. Each frame only re-projects the fixed
//! base angles against elapsed time, so the galaxy turns without reshaping.

use std::f32::consts::{PI, TAU};

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::polar_to_cartesian;
use crate::settings::QualityPreset;

/// Arm polyline resolution
pub const ARM_POINTS: usize = 150;
/// Branch polyline resolution
pub const BRANCH_POINTS: usize = 80;
pub const ARM_STAR_COUNT: usize = 400;
pub const BACKGROUND_STAR_COUNT: usize = 100;
/// Radius of the glowing core
pub const CORE_RADIUS: f32 = 350.0;

/// Rotation rates (radians per second)
pub const ARM_ROTATION: f32 = 0.01;
pub const BRANCH_ROTATION: f32 = 0.005;
pub const STAR_ROTATION: f32 = 0.005;
pub const BACKGROUND_ROTATION: f32 = 0.002;

/// One spiral arm
#[derive(Debug, Clone, PartialEq)]
pub struct Arm {
    pub angle: f32,
    /// Extra winding on top of 3π
    pub variation: f32,
    /// Phase of the radial wobble
    pub offset: f32,
    pub line_width: f32,
    pub has_branch: bool,
}

/// A star scattered along an arm
#[derive(Debug, Clone, PartialEq)]
pub struct Star {
    pub base_angle: f32,
    pub base_radius: f32,
    pub size: f32,
    pub opacity: f32,
    /// Index into `STAR_TINTS`
    pub tint: usize,
    pub arm: usize,
}

/// A faint star in the outer ring
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundStar {
    pub base_angle: f32,
    pub base_distance: f32,
    pub size: f32,
    pub opacity: f32,
}

/// RGB tints for arm stars (alpha comes from the star's opacity)
pub const STAR_TINTS: [(u8, u8, u8); 4] = [
    (255, 255, 255),
    (200, 200, 255),
    (255, 200, 255),
    (200, 255, 255),
];

/// The fixed galaxy structure
#[derive(Debug, Clone, PartialEq)]
pub struct BackdropField {
    pub arms: Vec<Arm>,
    pub stars: Vec<Star>,
    pub background_stars: Vec<BackgroundStar>,
}

impl BackdropField {
    /// Roll a new galaxy shape
    pub fn generate(seed: u64, quality: QualityPreset) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);

        let num_arms = rng.random_range(3..=5);
        let arms: Vec<Arm> = (0..num_arms)
            .map(|k| Arm {
                angle: k as f32 * TAU / num_arms as f32 + (rng.random::<f32>() - 0.5) * 0.5,
                variation: rng.random::<f32>() * 0.3 + 0.1,
                offset: (rng.random::<f32>() - 0.5) * 0.8,
                line_width: 2.0 + rng.random::<f32>() * 3.0,
                has_branch: rng.random::<f32>() > 0.6,
            })
            .collect();

        let star_scale = quality.backdrop_density();
        let star_count = (ARM_STAR_COUNT as f32 * star_scale) as usize;
        let stars = (0..star_count)
            .map(|_| {
                let arm = rng.random_range(0..num_arms);
                let arm_angle = arm as f32 * TAU / num_arms as f32;
                let t: f32 = rng.random();
                Star {
                    base_radius: t * 600.0 + rng.random::<f32>() * 100.0,
                    base_angle: arm_angle + t * 3.0 * PI + (rng.random::<f32>() - 0.5) * 0.5,
                    size: rng.random::<f32>() * 3.0 + 0.5,
                    opacity: rng.random::<f32>() * 0.9 + 0.1,
                    tint: rng.random_range(0..STAR_TINTS.len()),
                    arm,
                }
            })
            .collect();

        let background_count =
            (BACKGROUND_STAR_COUNT as f32 * quality.background_density()) as usize;
        let background_stars = (0..background_count)
            .map(|_| BackgroundStar {
                base_angle: rng.random::<f32>() * TAU,
                base_distance: 400.0 + rng.random::<f32>() * 300.0,
                size: rng.random::<f32>() * 1.5,
                opacity: rng.random::<f32>() * 0.4 + 0.1,
            })
            .collect();

        Self {
            arms,
            stars,
            background_stars,
        }
    }

    /// Points of an arm's main curve at `time` seconds
    pub fn arm_path(&self, arm: &Arm, center: Vec2, time: f32) -> Vec<Vec2> {
        (0..ARM_POINTS)
            .map(|i| {
                let t = i as f32 / ARM_POINTS as f32;
                let radius = t * 500.0 + (t * PI * 4.0 + arm.offset).sin() * 20.0;
                let angle = arm.angle
                    + t * (3.0 + arm.variation) * PI
                    + time * ARM_ROTATION
                    + (t * PI * 6.0).sin() * 0.2;
                polar_to_cartesian(center, radius, angle)
            })
            .collect()
    }

    /// Points of an arm's secondary branch, if it has one
    pub fn branch_path(&self, arm: &Arm, center: Vec2, time: f32) -> Option<Vec<Vec2>> {
        if !arm.has_branch {
            return None;
        }
        let points = (0..BRANCH_POINTS)
            .map(|i| {
                let t = i as f32 / BRANCH_POINTS as f32;
                let radius = t * 300.0 + (t * PI * 3.0).sin() * 15.0;
                let angle = arm.angle + t * TAU + time * BRANCH_ROTATION;
                polar_to_cartesian(center, radius, angle)
            })
            .collect();
        Some(points)
    }

    pub fn star_position(star: &Star, center: Vec2, time: f32) -> Vec2 {
        polar_to_cartesian(center, star.base_radius, star.base_angle + time * STAR_ROTATION)
    }

    pub fn background_star_position(star: &BackgroundStar, center: Vec2, time: f32) -> Vec2 {
        polar_to_cartesian(
            center,
            star.base_distance,
            star.base_angle + time * BACKGROUND_ROTATION,
        )
    }
}

/// Lazily generated backdrop, built on first use and kept until the scene ends
#[derive(Debug, Clone)]
pub struct Backdrop {
    seed: u64,
    quality: QualityPreset,
    field: Option<BackdropField>,
    generations: u32,
}

impl Backdrop {
    pub fn new(seed: u64, quality: QualityPreset) -> Self {
        Self {
            seed,
            quality,
            field: None,
            generations: 0,
        }
    }

    /// The memoized field, generating it on the first call
    pub fn field(&mut self) -> &BackdropField {
        if self.field.is_none() {
            self.generations += 1;
            log::debug!("Generating {} backdrop (seed {})", self.quality.as_str(), self.seed);
        }
        let (seed, quality) = (self.seed, self.quality);
        self.field
            .get_or_insert_with(|| BackdropField::generate(seed, quality))
    }

    /// The field if it has been generated
    pub fn cached(&self) -> Option<&BackdropField> {
        self.field.as_ref()
    }

    /// How many times the shape was rolled (1 after first use)
    pub fn generations(&self) -> u32 {
        self.generations
    }
}
