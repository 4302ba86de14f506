//! Headless canvas that records draw calls

use glam::Vec2;

use super::{Canvas, LabelStyle, Paint};
use crate::sim::state::Viewport;

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear {
        viewport: Viewport,
    },
    Circle {
        center: Vec2,
        radius: f32,
        paint: Paint,
    },
    Path {
        points: usize,
        line_width: f32,
        paint: Paint,
    },
    Label {
        text: String,
        at: Vec2,
        style: LabelStyle,
    },
}

/// Records every command of every frame drawn into it
#[derive(Debug, Clone, Default)]
pub struct FrameRecorder {
    commands: Vec<DrawCommand>,
    frames: u64,
}

impl FrameRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Number of `clear` calls seen, one per frame
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Label texts in draw order
    pub fn labels(&self) -> Vec<String> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Label { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Canvas for FrameRecorder {
    fn clear(&mut self, viewport: Viewport) {
        self.frames += 1;
        self.commands.clear();
        self.commands.push(DrawCommand::Clear { viewport });
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, paint: &Paint) {
        self.commands.push(DrawCommand::Circle {
            center,
            radius,
            paint: paint.clone(),
        });
    }

    fn stroke_path(&mut self, points: &[Vec2], line_width: f32, paint: &Paint) {
        self.commands.push(DrawCommand::Path {
            points: points.len(),
            line_width,
            paint: paint.clone(),
        });
    }

    fn draw_label(&mut self, text: &str, at: Vec2, style: &LabelStyle) {
        self.commands.push(DrawCommand::Label {
            text: text.to_string(),
            at,
            style: style.clone(),
        });
    }
}
