//! Frame rendering
//!
//! Every frame is a full redraw: clear, backdrop, bubbles, minis, then the
//! floating notes. Drawing goes through the `Canvas` trait so the same pass
//! runs against the browser's 2D context or a headless recorder.

#[cfg(target_arch = "wasm32")]
pub mod canvas2d;
pub mod recorder;

#[cfg(target_arch = "wasm32")]
pub use canvas2d::Canvas2d;
pub use recorder::{DrawCommand, FrameRecorder};

use glam::Vec2;

use crate::notifications::FloatingNotes;
use crate::settings::QualityPreset;
use crate::sim::backdrop::{BackdropField, CORE_RADIUS, STAR_TINTS};
use crate::sim::state::{SceneState, Viewport};

/// A color stop at `offset` in [0, 1]
pub type ColorStop = (f32, &'static str);

const CORE_STOPS: &[ColorStop] = &[
    (0.0, "rgba(255, 255, 255, 0.9)"),
    (0.2, "rgba(255, 200, 255, 0.7)"),
    (0.4, "rgba(200, 150, 255, 0.5)"),
    (0.7, "rgba(100, 50, 200, 0.3)"),
    (1.0, "rgba(50, 25, 100, 0.1)"),
];

const ARM_STOPS: &[ColorStop] = &[
    (0.0, "rgba(255, 255, 255, 0.4)"),
    (0.3, "rgba(200, 150, 255, 0.3)"),
    (0.6, "rgba(150, 100, 255, 0.2)"),
    (1.0, "rgba(100, 50, 200, 0.1)"),
];

/// Length of the arm gradient along the arm's base angle
const ARM_GRADIENT_LENGTH: f32 = 600.0;
const BRANCH_COLOR: &str = "rgba(150, 100, 255, 0.15)";

pub const BUBBLE_FONT: &str = "bold 15px Arial";
pub const MINI_FONT: &str = "bold 11px Arial";
pub const NOTE_FONT: &str = "bold 18px Arial";
const NOTE_COLOR: &str = "#FFD54F";

/// Fill or stroke style
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Solid(String),
    Radial {
        center: Vec2,
        radius: f32,
        stops: &'static [ColorStop],
    },
    Linear {
        from: Vec2,
        to: Vec2,
        stops: &'static [ColorStop],
    },
}

/// Centered, outlined text
#[derive(Debug, Clone, PartialEq)]
pub struct LabelStyle {
    pub font: &'static str,
    pub fill: String,
    pub outline: &'static str,
    pub outline_width: f32,
    pub alpha: f32,
}

impl LabelStyle {
    pub fn bubble() -> Self {
        Self {
            font: BUBBLE_FONT,
            fill: "white".to_string(),
            outline: "rgba(0, 0, 0, 0.7)",
            outline_width: 2.0,
            alpha: 1.0,
        }
    }

    pub fn mini() -> Self {
        Self {
            font: MINI_FONT,
            ..Self::bubble()
        }
    }

    pub fn note(alpha: f32) -> Self {
        Self {
            font: NOTE_FONT,
            fill: NOTE_COLOR.to_string(),
            alpha,
            ..Self::bubble()
        }
    }
}

/// Drawing surface
pub trait Canvas {
    /// Wipe the whole surface
    fn clear(&mut self, viewport: Viewport);
    fn fill_circle(&mut self, center: Vec2, radius: f32, paint: &Paint);
    fn stroke_path(&mut self, points: &[Vec2], line_width: f32, paint: &Paint);
    fn draw_label(&mut self, text: &str, at: Vec2, style: &LabelStyle);
}

/// What a frame needs beyond the scene itself
#[derive(Debug, Clone, Copy)]
pub struct FrameContext {
    /// Backdrop clock (seconds)
    pub backdrop_time: f32,
    /// Scene clock for notes (seconds)
    pub now: f64,
    pub quality: QualityPreset,
}

/// Draw one complete frame; reads the scene, never mutates it
pub fn render_frame(
    canvas: &mut dyn Canvas,
    scene: &SceneState,
    backdrop: &BackdropField,
    notes: &FloatingNotes,
    ctx: &FrameContext,
) {
    let viewport = scene.viewport;
    canvas.clear(viewport);
    draw_backdrop(canvas, backdrop, viewport.center(), ctx);

    for bubble in &scene.bubbles {
        canvas.fill_circle(bubble.pos, bubble.radius(), &Paint::Solid(bubble.color.clone()));
        canvas.draw_label(&bubble.label, bubble.pos, &LabelStyle::bubble());
    }

    let mini_style = LabelStyle::mini();
    for mini in scene.bubbles.iter().flat_map(|b| &b.minis) {
        canvas.fill_circle(mini.pos, mini.radius, &Paint::Solid(mini.color.clone()));
        canvas.draw_label(&mini.label, mini.pos, &mini_style);
    }

    for note in notes.visible(ctx.now) {
        canvas.draw_label(&note.text(), note.drawn_at(ctx.now), &LabelStyle::note(note.alpha(ctx.now)));
    }
}

fn draw_backdrop(canvas: &mut dyn Canvas, field: &BackdropField, center: Vec2, ctx: &FrameContext) {
    let time = ctx.backdrop_time;

    canvas.fill_circle(
        center,
        CORE_RADIUS,
        &Paint::Radial {
            center,
            radius: CORE_RADIUS,
            stops: CORE_STOPS,
        },
    );

    for arm in &field.arms {
        let paint = Paint::Linear {
            from: center,
            to: crate::polar_to_cartesian(center, ARM_GRADIENT_LENGTH, arm.angle),
            stops: ARM_STOPS,
        };
        canvas.stroke_path(&field.arm_path(arm, center, time), arm.line_width, &paint);

        if ctx.quality.branches_enabled() {
            if let Some(branch) = field.branch_path(arm, center, time) {
                canvas.stroke_path(&branch, 1.0, &Paint::Solid(BRANCH_COLOR.to_string()));
            }
        }
    }

    for star in &field.stars {
        let (r, g, b) = STAR_TINTS[star.tint];
        let paint = Paint::Solid(format!("rgba({}, {}, {}, {})", r, g, b, star.opacity));
        canvas.fill_circle(BackdropField::star_position(star, center, time), star.size, &paint);
    }

    for star in &field.background_stars {
        let paint = Paint::Solid(format!("rgba(255, 255, 255, {})", star.opacity));
        canvas.fill_circle(
            BackdropField::background_star_position(star, center, time),
            star.size,
            &paint,
        );
    }
}
