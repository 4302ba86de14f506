//! Floating "+N XP" notes
//!
//! Each note lives for `NOTE_LIFETIME`, holds full opacity until
//! `NOTE_FADE_START`, then fades out while drifting upward.

use glam::Vec2;

use crate::consts::{NOTE_FADE_START, NOTE_LIFETIME, NOTE_RISE};

#[derive(Debug, Clone, PartialEq)]
pub struct FloatingNote {
    pub pos: Vec2,
    pub points: u32,
    /// Scene clock (seconds) at creation
    pub born: f64,
}

impl FloatingNote {
    pub fn text(&self) -> String {
        format!("+{} XP", self.points)
    }

    pub fn is_expired(&self, now: f64) -> bool {
        now - self.born >= NOTE_LIFETIME
    }

    /// 1.0 until the fade starts, then linear down to 0 at expiry
    pub fn alpha(&self, now: f64) -> f32 {
        let age = now - self.born;
        if age <= NOTE_FADE_START {
            return 1.0;
        }
        let fade = (age - NOTE_FADE_START) / (NOTE_LIFETIME - NOTE_FADE_START);
        (1.0 - fade).clamp(0.0, 1.0) as f32
    }

    /// Position after the upward drift for the current fade
    pub fn drawn_at(&self, now: f64) -> Vec2 {
        self.pos - Vec2::new(0.0, NOTE_RISE * (1.0 - self.alpha(now)))
    }
}

/// Active notes in creation order
#[derive(Debug, Clone, Default)]
pub struct FloatingNotes {
    notes: Vec<FloatingNote>,
}

impl FloatingNotes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, pos: Vec2, points: u32, now: f64) {
        self.notes.push(FloatingNote {
            pos,
            points,
            born: now,
        });
    }

    /// Drop expired notes
    pub fn prune(&mut self, now: f64) {
        self.notes.retain(|n| !n.is_expired(now));
    }

    /// Notes still on screen at `now`
    pub fn visible(&self, now: f64) -> impl Iterator<Item = &FloatingNote> {
        self.notes.iter().filter(move |n| !n.is_expired(now))
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn clear(&mut self) {
        self.notes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fade_schedule() {
        let note = FloatingNote {
            pos: Vec2::new(50.0, 50.0),
            points: 10,
            born: 10.0,
        };
        assert_eq!(note.alpha(10.0), 1.0);
        assert_eq!(note.alpha(11.5), 1.0);
        assert!((note.alpha(11.75) - 0.5).abs() < 1e-5);
        assert!(note.alpha(12.0) <= 1e-6);
        assert_eq!(note.drawn_at(10.5), Vec2::new(50.0, 50.0));
        assert!(note.drawn_at(11.9).y < 50.0);
        assert_eq!(note.text(), "+10 XP");
    }

    #[test]
    fn test_prune_after_lifetime() {
        let mut notes = FloatingNotes::new();
        notes.push(Vec2::ZERO, 5, 0.0);
        notes.push(Vec2::ZERO, 10, 1.0);
        assert_eq!(notes.visible(1.9).count(), 2);

        notes.prune(2.5);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes.visible(2.5).next().map(|n| n.points), Some(10));

        notes.prune(3.0);
        assert!(notes.is_empty());
    }
}
