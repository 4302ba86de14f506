//! Canvas 2D backend

use glam::Vec2;
use web_sys::{CanvasGradient, CanvasRenderingContext2d};

use super::{Canvas, ColorStop, LabelStyle, Paint};
use crate::sim::state::Viewport;

/// Draws through the browser's 2D context
#[derive(Debug, Clone)]
pub struct Canvas2d {
    ctx: CanvasRenderingContext2d,
}

impl Canvas2d {
    pub fn new(ctx: CanvasRenderingContext2d) -> Self {
        Self { ctx }
    }

    fn gradient(&self, paint: &Paint) -> Option<CanvasGradient> {
        let (gradient, stops): (CanvasGradient, &[ColorStop]) = match paint {
            Paint::Solid(_) => return None,
            Paint::Radial {
                center,
                radius,
                stops,
            } => {
                let (x, y) = (center.x as f64, center.y as f64);
                let g = self
                    .ctx
                    .create_radial_gradient(x, y, 0.0, x, y, *radius as f64)
                    .ok()?;
                (g, *stops)
            }
            Paint::Linear { from, to, stops } => {
                let g = self.ctx.create_linear_gradient(
                    from.x as f64,
                    from.y as f64,
                    to.x as f64,
                    to.y as f64,
                );
                (g, *stops)
            }
        };
        for (offset, color) in stops {
            gradient.add_color_stop(*offset, color).ok()?;
        }
        Some(gradient)
    }

    fn set_fill(&self, paint: &Paint) {
        match paint {
            Paint::Solid(color) => self.ctx.set_fill_style_str(color),
            _ => match self.gradient(paint) {
                Some(g) => self.ctx.set_fill_style_canvas_gradient(&g),
                None => log::warn!("Gradient fill could not be built"),
            },
        }
    }

    fn set_stroke(&self, paint: &Paint) {
        match paint {
            Paint::Solid(color) => self.ctx.set_stroke_style_str(color),
            _ => match self.gradient(paint) {
                Some(g) => self.ctx.set_stroke_style_canvas_gradient(&g),
                None => log::warn!("Gradient stroke could not be built"),
            },
        }
    }
}

impl Canvas for Canvas2d {
    fn clear(&mut self, viewport: Viewport) {
        self.ctx
            .clear_rect(0.0, 0.0, viewport.width as f64, viewport.height as f64);
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, paint: &Paint) {
        self.set_fill(paint);
        self.ctx.begin_path();
        self.ctx
            .arc(
                center.x as f64,
                center.y as f64,
                radius.max(0.0) as f64,
                0.0,
                std::f64::consts::TAU,
            )
            .ok();
        self.ctx.fill();
        self.ctx.close_path();
    }

    fn stroke_path(&mut self, points: &[Vec2], line_width: f32, paint: &Paint) {
        let Some((first, rest)) = points.split_first() else {
            return;
        };
        self.set_stroke(paint);
        self.ctx.set_line_width(line_width as f64);
        self.ctx.begin_path();
        self.ctx.move_to(first.x as f64, first.y as f64);
        for p in rest {
            self.ctx.line_to(p.x as f64, p.y as f64);
        }
        self.ctx.stroke();
    }

    fn draw_label(&mut self, text: &str, at: Vec2, style: &LabelStyle) {
        let (x, y) = (at.x as f64, at.y as f64);
        self.ctx.save();
        self.ctx.set_global_alpha(style.alpha as f64);
        self.ctx.set_font(style.font);
        self.ctx.set_text_align("center");
        self.ctx.set_text_baseline("middle");
        self.ctx.set_stroke_style_str(style.outline);
        self.ctx.set_line_width(style.outline_width as f64);
        self.ctx.stroke_text(text, x, y).ok();
        self.ctx.set_fill_style_str(&style.fill);
        self.ctx.fill_text(text, x, y).ok();
        self.ctx.restore();
    }
}
