//! Scene state and core simulation types
//!
//! `SceneState` is the aggregate root: it owns every bubble (and through them
//! every mini), the viewport, and the queue of events for the outer shell.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::bubble::{Bubble, BubbleId, GALAXY_COLORS, MINI_COLORS, MiniId, pick_color};
use crate::consts::*;
use crate::tasks::{TaskDraft, TaskId, TaskRecord};

/// Canvas size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Size the canvas from the screen, keeping room for page chrome
    pub fn fit(screen_width: f32, screen_height: f32) -> Self {
        Self {
            width: (screen_width - CANVAS_SIDE_CHROME).clamp(0.0, MAX_CANVAS_WIDTH),
            height: (screen_height - CANVAS_VERTICAL_CHROME).clamp(0.0, MAX_CANVAS_HEIGHT),
        }
    }

    /// A zero-sized canvas cannot be hit-tested or animated
    pub fn is_ready(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Clamp a bubble center into the bounce area
    pub fn contain(&self, pos: Vec2, radius: f32) -> Vec2 {
        let inset = BOUNCE_MARGIN + radius;
        let clamp_axis = |v: f32, size: f32| {
            if size - inset < inset {
                size / 2.0
            } else {
                v.clamp(inset, size - inset)
            }
        };
        Vec2::new(clamp_axis(pos.x, self.width), clamp_axis(pos.y, self.height))
    }
}

/// Which entity a pop sound is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopKind {
    Bubble,
    Mini,
}

/// Side effects requested by the simulation, drained by the scene loop
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    /// Experience earned at a pointer position
    RewardGranted { points: u32, at: Vec2 },
    /// A new bubble should be stored as a task
    TaskCreateRequested { bubble: BubbleId, draft: TaskDraft },
    /// A popped bubble's task should be removed from the store
    TaskDeleteRequested { task_id: TaskId },
    /// Audio feedback for a pop
    PopSound { kind: PopKind },
}

/// Complete scene state
#[derive(Debug, Clone)]
pub struct SceneState {
    pub seed: u64,
    pub viewport: Viewport,
    /// Live bubbles in insertion order
    pub bubbles: Vec<Bubble>,
    /// Simulation tick counter
    pub time_ticks: u64,
    events: Vec<SceneEvent>,
    rng: Pcg32,
    next_bubble_id: u32,
    next_mini_id: u32,
}

impl SceneState {
    /// Create an empty scene with the given seed
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            viewport: Viewport::default(),
            bubbles: Vec::new(),
            time_ticks: 0,
            events: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
            next_bubble_id: 1,
            next_mini_id: 1,
        }
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn next_bubble_id(&mut self) -> BubbleId {
        let id = BubbleId(self.next_bubble_id);
        self.next_bubble_id += 1;
        id
    }

    fn next_mini_id(&mut self) -> MiniId {
        let id = MiniId(self.next_mini_id);
        self.next_mini_id += 1;
        id
    }

    /// Insert a bubble with a random direction; returns its id
    pub fn add_bubble(
        &mut self,
        pos: Vec2,
        color: impl Into<String>,
        label: impl Into<String>,
        task_id: Option<TaskId>,
    ) -> BubbleId {
        let id = self.next_bubble_id();
        let bubble = Bubble::new(id, pos, BUBBLE_RADIUS, color, label, task_id, &mut self.rng);
        self.bubbles.push(bubble);
        id
    }

    /// Spawn a bubble for a freshly typed task and ask the shell to store it
    ///
    /// Lands in the 600..1000 x 300..700 band, pulled inside the margins when
    /// the canvas is smaller.
    pub fn spawn_bubble(&mut self, label: &str) -> BubbleId {
        let raw = Vec2::new(
            self.rng.random_range(600.0..1000.0),
            self.rng.random_range(300.0..700.0),
        );
        let pos = self.viewport.contain(raw, BUBBLE_RADIUS);
        let color = pick_color(GALAXY_COLORS, &mut self.rng);
        let id = self.add_bubble(pos, color, label, None);

        let draft = TaskDraft {
            label: label.to_string(),
            x: pos.x.round() as i32,
            y: pos.y.round() as i32,
            color: color.to_string(),
        };
        self.push_event(SceneEvent::TaskCreateRequested { bubble: id, draft });
        id
    }

    /// Seed bubbles from stored tasks; completed tasks stay hidden
    pub fn seed_from_tasks(&mut self, records: &[TaskRecord]) -> usize {
        let mut seeded = 0;
        for record in records.iter().filter(|r| !r.completed) {
            let mut pos = Vec2::new(record.x as f32, record.y as f32);
            if self.viewport.is_ready() {
                pos = self.viewport.contain(pos, BUBBLE_RADIUS);
            }
            self.add_bubble(pos, record.color.clone(), record.label.clone(), Some(record.id));
            seeded += 1;
        }
        seeded
    }

    pub fn bubble(&self, id: BubbleId) -> Option<&Bubble> {
        self.bubbles.iter().find(|b| b.id == id)
    }

    pub fn bubble_mut(&mut self, id: BubbleId) -> Option<&mut Bubble> {
        self.bubbles.iter_mut().find(|b| b.id == id)
    }

    /// Record the store's id for a bubble; false if it was popped meanwhile
    pub fn assign_task_id(&mut self, id: BubbleId, task_id: TaskId) -> bool {
        match self.bubble_mut(id) {
            Some(bubble) => {
                bubble.task_id = Some(task_id);
                true
            }
            None => false,
        }
    }

    pub fn remove_bubble(&mut self, id: BubbleId) -> Option<Bubble> {
        let index = self.bubbles.iter().position(|b| b.id == id)?;
        Some(self.bubbles.remove(index))
    }

    /// Attach a mini with a random palette color to the given bubble
    pub fn attach_mini(&mut self, id: BubbleId, label: &str) -> Option<MiniId> {
        let index = self.bubbles.iter().position(|b| b.id == id)?;
        let mini_id = self.next_mini_id();
        let color = pick_color(MINI_COLORS, &mut self.rng);
        self.bubbles[index].attach_mini(mini_id, label, color);
        Some(mini_id)
    }

    pub fn detach_mini(&mut self, id: BubbleId, mini: MiniId) -> bool {
        self.bubble_mut(id)
            .and_then(|b| b.detach_mini(mini))
            .is_some()
    }

    pub fn mini_count(&self) -> usize {
        self.bubbles.iter().map(|b| b.minis.len()).sum()
    }

    pub fn push_event(&mut self, event: SceneEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[SceneEvent] {
        &self.events
    }

    /// Take all pending events in emission order
    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.events)
    }
}
