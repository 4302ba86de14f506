//! Scene loop driver
//!
//! Owns the scene for as long as it is mounted: sizes the canvas, installs the
//! resize/pointer listeners, runs fixed timestep ticks plus one full redraw per
//! display frame, and forwards scene events to the task store, the reward
//! sink and the optional pop sound. Side effects are best-effort; a failing
//! collaborator is logged and the local scene change stands.

use thiserror::Error;

use crate::consts::*;
use crate::experience::RewardSink;
use crate::notifications::FloatingNotes;
use crate::platform::{FrameHandle, Host, HostError, ListenerHandle, ListenerKind};
use crate::renderer::{Canvas, FrameContext, render_frame};
use crate::settings::Settings;
use crate::sim::{
    Backdrop, BubbleId, ClickOutcome, PointerInput, PopKind, SceneEvent, SceneState, Viewport,
    route_click, tick,
};
use crate::tasks::TaskService;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("task label is empty")]
    EmptyLabel,
    #[error("scene is not mounted")]
    NotMounted,
    #[error("scene was unmounted and cannot be mounted again")]
    TornDown,
    #[error("canvas has not been sized yet")]
    NotReady,
    #[error(transparent)]
    Host(#[from] HostError),
}

/// Audio feedback for pops
pub trait SoundPlayer {
    fn play(&mut self, kind: PopKind) -> Result<(), HostError>;
}

/// External services the scene talks to
pub struct Collaborators {
    pub tasks: Box<dyn TaskService>,
    pub rewards: Box<dyn RewardSink>,
    pub sound: Option<Box<dyn SoundPlayer>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopPhase {
    Idle,
    Running,
    Stopped,
}

/// A mounted (or mountable) bubble scene
pub struct SceneLoop<H: Host> {
    host: H,
    scene: SceneState,
    backdrop: Backdrop,
    notes: FloatingNotes,
    collaborators: Collaborators,
    settings: Settings,
    phase: LoopPhase,
    pending_frame: Option<FrameHandle>,
    listeners: Vec<ListenerHandle>,
    accumulator: f32,
    last_time_ms: Option<f64>,
    start_time_ms: Option<f64>,
    /// Seconds since the first frame
    clock: f64,
    pending_label: String,
    frames_rendered: u64,
}

impl<H: Host> SceneLoop<H> {
    pub fn new(host: H, seed: u64, settings: Settings, collaborators: Collaborators) -> Self {
        Self {
            host,
            scene: SceneState::new(seed),
            backdrop: Backdrop::new(seed, settings.quality),
            notes: FloatingNotes::new(),
            collaborators,
            settings,
            phase: LoopPhase::Idle,
            pending_frame: None,
            listeners: Vec::new(),
            accumulator: 0.0,
            last_time_ms: None,
            start_time_ms: None,
            clock: 0.0,
            pending_label: String::new(),
            frames_rendered: 0,
        }
    }

    /// Size the canvas, install listeners, seed stored tasks and start the loop
    pub fn mount(&mut self) -> Result<(), SceneError> {
        match self.phase {
            LoopPhase::Running => return Ok(()),
            LoopPhase::Stopped => return Err(SceneError::TornDown),
            LoopPhase::Idle => {}
        }

        self.fit_to_screen();
        for kind in ListenerKind::ALL {
            match self.host.add_listener(kind) {
                Ok(handle) => self.listeners.push(handle),
                Err(e) => {
                    self.teardown();
                    return Err(e.into());
                }
            }
        }

        match self.collaborators.tasks.list() {
            Ok(records) => {
                let seeded = self.scene.seed_from_tasks(&records);
                log::info!("Seeded {} bubbles from {} stored tasks", seeded, records.len());
            }
            Err(e) => log::warn!("Could not load tasks, starting empty: {}", e),
        }

        self.phase = LoopPhase::Running;
        if let Err(e) = self.schedule_frame() {
            self.teardown();
            return Err(e.into());
        }

        log::info!(
            "Scene mounted at {}x{}",
            self.scene.viewport.width,
            self.scene.viewport.height
        );
        Ok(())
    }

    /// Stop the loop and remove every listener; safe to call repeatedly
    pub fn unmount(&mut self) {
        if self.phase == LoopPhase::Stopped {
            return;
        }
        self.teardown();
        log::info!("Scene unmounted after {} frames", self.frames_rendered);
    }

    fn teardown(&mut self) {
        if let Some(handle) = self.pending_frame.take() {
            self.host.cancel_frame(handle);
        }
        for handle in self.listeners.drain(..) {
            self.host.remove_listener(handle);
        }
        self.notes.clear();
        self.phase = LoopPhase::Stopped;
    }

    fn schedule_frame(&mut self) -> Result<(), HostError> {
        let handle = self.host.request_frame()?;
        self.pending_frame = Some(handle);
        Ok(())
    }

    fn fit_to_screen(&mut self) {
        let (w, h) = self.host.screen_size();
        let viewport = Viewport::fit(w, h);
        self.scene.resize(viewport);
        self.host.resize_surface(viewport);
    }

    /// Display refresh callback: tick, draw, schedule the next frame
    ///
    /// Returns false (and draws nothing) once the scene is not running.
    pub fn on_frame(&mut self, time_ms: f64, canvas: &mut dyn Canvas) -> bool {
        if self.phase != LoopPhase::Running {
            log::debug!("Frame at {:.1}ms dropped, scene not running", time_ms);
            return false;
        }
        self.pending_frame = None;

        let dt = match self.last_time_ms {
            Some(last) => ((time_ms - last) / 1000.0) as f32,
            None => SIM_DT,
        };
        self.last_time_ms = Some(time_ms);
        let start = *self.start_time_ms.get_or_insert(time_ms);
        self.clock = (time_ms - start) / 1000.0;

        self.update(dt);
        self.dispatch_events();
        self.notes.prune(self.clock);

        let ctx = FrameContext {
            backdrop_time: self.settings.backdrop_time(self.clock as f32),
            now: self.clock,
            quality: self.settings.quality,
        };
        let field = self.backdrop.field();
        render_frame(canvas, &self.scene, field, &self.notes, &ctx);
        self.frames_rendered += 1;

        if let Err(e) = self.schedule_frame() {
            log::error!("Could not schedule next frame: {}", e);
        }
        true
    }

    /// Run the fixed timestep ticks owed for `dt` seconds
    fn update(&mut self, dt: f32) {
        self.accumulator += dt.clamp(0.0, MAX_FRAME_DT);

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            tick(&mut self.scene);
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
    }

    pub fn on_resize(&mut self) {
        if self.phase == LoopPhase::Running {
            self.fit_to_screen();
        }
    }

    /// Route a listener event: modifier clicks come from the document-wide
    /// pointer listener, plain clicks from the canvas
    pub fn on_listener_event(&mut self, kind: ListenerKind, input: PointerInput) -> ClickOutcome {
        match (kind, input.modifier) {
            (ListenerKind::PointerDown, true) | (ListenerKind::Click, false) => {
                self.on_pointer(input)
            }
            _ => ClickOutcome::Ignored,
        }
    }

    pub fn on_pointer(&mut self, input: PointerInput) -> ClickOutcome {
        if self.phase != LoopPhase::Running {
            return ClickOutcome::Ignored;
        }
        let outcome = route_click(&mut self.scene, &input, &self.pending_label);
        if matches!(outcome, ClickOutcome::MiniAttached { .. }) {
            self.pending_label.clear();
        }
        self.dispatch_events();
        outcome
    }

    /// Spawn a bubble for a new task and store it
    pub fn create_task(&mut self, label: &str) -> Result<BubbleId, SceneError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(SceneError::EmptyLabel);
        }
        if self.phase != LoopPhase::Running {
            return Err(SceneError::NotMounted);
        }
        if !self.scene.viewport.is_ready() {
            return Err(SceneError::NotReady);
        }

        let id = self.scene.spawn_bubble(label);
        self.dispatch_events();
        Ok(id)
    }

    fn dispatch_events(&mut self) {
        for event in self.scene.drain_events() {
            match event {
                SceneEvent::RewardGranted { points, at } => {
                    self.collaborators.rewards.grant(points);
                    if self.settings.show_notifications {
                        self.notes.push(at, points, self.clock);
                    }
                }
                SceneEvent::TaskCreateRequested { bubble, draft } => {
                    match self.collaborators.tasks.create(&draft) {
                        Ok(task_id) => {
                            if !self.scene.assign_task_id(bubble, task_id) {
                                log::debug!("Bubble {:?} gone before task {} was stored", bubble, task_id);
                            }
                        }
                        Err(e) => log::warn!("Could not store task '{}': {}", draft.label, e),
                    }
                }
                SceneEvent::TaskDeleteRequested { task_id } => {
                    if let Err(e) = self.collaborators.tasks.remove(task_id) {
                        log::warn!("Could not delete task {}: {}", task_id, e);
                    }
                }
                SceneEvent::PopSound { kind } => {
                    if self.settings.effective_volume() <= 0.0 {
                        continue;
                    }
                    if let Some(sound) = self.collaborators.sound.as_mut() {
                        if let Err(e) = sound.play(kind) {
                            log::warn!("Pop sound failed: {}", e);
                        }
                    }
                }
            }
        }
    }

    pub fn set_pending_label(&mut self, label: impl Into<String>) {
        self.pending_label = label.into();
    }

    pub fn pending_label(&self) -> &str {
        &self.pending_label
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn is_running(&self) -> bool {
        self.phase == LoopPhase::Running
    }

    pub fn scene(&self) -> &SceneState {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut SceneState {
        &mut self.scene
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn backdrop(&self) -> &Backdrop {
        &self.backdrop
    }

    pub fn notes(&self) -> &FloatingNotes {
        &self.notes
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    pub fn pending_frame(&self) -> Option<FrameHandle> {
        self.pending_frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::HeadlessHost;
    use crate::renderer::FrameRecorder;
    use crate::tasks::{MemoryTaskStore, TaskDraft, TaskId};
    use crate::experience::ExperienceLedger;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct FailingSound;

    impl SoundPlayer for FailingSound {
        fn play(&mut self, _kind: PopKind) -> Result<(), HostError> {
            Err(HostError("audio blocked".to_string()))
        }
    }

    fn scene_loop(
        store: MemoryTaskStore,
    ) -> (
        SceneLoop<HeadlessHost>,
        Rc<RefCell<MemoryTaskStore>>,
        Rc<RefCell<ExperienceLedger>>,
    ) {
        let store = Rc::new(RefCell::new(store));
        let ledger = Rc::new(RefCell::new(ExperienceLedger::new()));
        let collaborators = Collaborators {
            tasks: Box::new(store.clone()),
            rewards: Box::new(ledger.clone()),
            sound: Some(Box::new(FailingSound)),
        };
        let host = HeadlessHost::new(1240.0, 1080.0);
        (
            SceneLoop::new(host, 2024, Settings::default(), collaborators),
            store,
            ledger,
        )
    }

    fn stored(id: u64, label: &str, x: i32, y: i32) -> crate::tasks::TaskRecord {
        TaskDraft {
            label: label.to_string(),
            x,
            y,
            color: "#00BCD4".to_string(),
        }
        .into_record(TaskId(id))
    }

    #[test]
    fn test_mount_sizes_listens_and_schedules() {
        let (mut scene, _, _) = scene_loop(MemoryTaskStore::new());
        scene.mount().expect("mount");
        assert!(scene.is_running());
        assert_eq!(scene.scene().viewport, Viewport::new(1200.0, 880.0));
        assert_eq!(scene.host().surface, Viewport::new(1200.0, 880.0));
        for kind in ListenerKind::ALL {
            assert!(scene.host().has_listener(kind));
        }
        assert_eq!(scene.host().pending_frames().len(), 1);
    }

    #[test]
    fn test_mount_seeds_stored_tasks() {
        let (mut scene, _, _) = scene_loop(MemoryTaskStore::with_records(vec![
            stored(1, "Dishes", 400, 300),
            stored(2, "Email", 700, 500),
        ]));
        scene.mount().expect("mount");
        let labels: Vec<_> = scene.scene().bubbles.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["Dishes", "Email"]);
    }

    #[test]
    fn test_frames_render_and_reschedule() {
        let (mut scene, _, _) = scene_loop(MemoryTaskStore::new());
        scene.mount().expect("mount");
        let mut canvas = FrameRecorder::new();
        for i in 0..5 {
            scene.host_mut().take_frame();
            assert!(scene.on_frame(i as f64 * 16.0, &mut canvas));
            assert_eq!(scene.host().pending_frames().len(), 1);
        }
        assert_eq!(scene.frames_rendered(), 5);
        assert_eq!(canvas.frames(), 5);
        assert_eq!(scene.backdrop().generations(), 1);
    }

    #[test]
    fn test_long_gap_is_capped() {
        let (mut scene, _, _) = scene_loop(MemoryTaskStore::new());
        scene.mount().expect("mount");
        let mut canvas = FrameRecorder::new();
        scene.on_frame(0.0, &mut canvas);
        let before = scene.scene().time_ticks;
        scene.on_frame(5_000.0, &mut canvas);
        assert!(scene.scene().time_ticks - before <= MAX_SUBSTEPS as u64);
    }

    #[test]
    fn test_create_task_stores_and_links_id() {
        let (mut scene, store, _) = scene_loop(MemoryTaskStore::new());
        scene.mount().expect("mount");
        let id = scene.create_task("  Groceries ").expect("created");

        let bubble = scene.scene().bubble(id).expect("bubble");
        assert_eq!(bubble.label, "Groceries");
        assert_eq!(bubble.task_id, Some(TaskId(1)));
        assert_eq!(store.borrow().records().len(), 1);

        assert!(matches!(scene.create_task("   "), Err(SceneError::EmptyLabel)));
    }

    #[test]
    fn test_create_task_keeps_mini_label() {
        let (mut scene, _, _) = scene_loop(MemoryTaskStore::new());
        scene.mount().expect("mount");
        scene.set_pending_label("child");
        let id = scene.create_task("Parent").expect("created");
        assert_eq!(scene.pending_label(), "child");

        let pos = scene.scene().bubble(id).expect("bubble").pos;
        let outcome = scene.on_listener_event(
            ListenerKind::PointerDown,
            PointerInput::modified_click(pos.x, pos.y),
        );
        assert!(matches!(outcome, ClickOutcome::MiniAttached { .. }));
        let minis = &scene.scene().bubble(id).expect("bubble").minis;
        assert_eq!(minis[0].label, "child");
        assert_eq!(scene.pending_label(), "");
    }

    #[test]
    fn test_missed_shift_click_keeps_mini_label() {
        let (mut scene, _, _) = scene_loop(MemoryTaskStore::new());
        scene.mount().expect("mount");
        scene.set_pending_label("child");
        let outcome = scene.on_listener_event(
            ListenerKind::PointerDown,
            PointerInput::modified_click(1.0, 1.0),
        );
        assert_eq!(outcome, ClickOutcome::Ignored);
        assert_eq!(scene.pending_label(), "child");
    }

    #[test]
    fn test_create_failure_keeps_local_bubble() {
        let mut failing = MemoryTaskStore::new();
        failing.fail_writes = true;
        let (mut scene, _, _) = scene_loop(failing);
        scene.mount().expect("mount");
        let id = scene.create_task("Offline").expect("created locally");
        assert_eq!(scene.scene().bubble(id).and_then(|b| b.task_id), None);
    }

    #[test]
    fn test_delete_failure_still_removes_and_rewards() {
        let (mut scene, store, ledger) =
            scene_loop(MemoryTaskStore::with_records(vec![stored(5, "Gym", 400, 400)]));
        scene.mount().expect("mount");
        store.borrow_mut().fail_writes = true;

        let pos = scene.scene().bubbles[0].pos;
        let outcome = scene.on_listener_event(ListenerKind::Click, PointerInput::click(pos.x, pos.y));
        assert!(matches!(outcome, ClickOutcome::BubblePopped { .. }));
        assert!(scene.scene().bubbles.is_empty());
        assert_eq!(store.borrow().records().len(), 1);
        assert_eq!(ledger.borrow().total, u64::from(BUBBLE_POP_REWARD));
        assert_eq!(scene.notes().len(), 1);
    }

    #[test]
    fn test_listener_kinds_filter_modifier() {
        let (mut scene, _, _) = scene_loop(MemoryTaskStore::new());
        scene.mount().expect("mount");
        let id = scene.create_task("Parent").expect("created");
        let pos = scene.scene().bubble(id).expect("bubble").pos;
        scene.set_pending_label("child");

        // Shift-click also reaches the canvas click listener; that copy is dropped
        let dup = scene.on_listener_event(
            ListenerKind::Click,
            PointerInput::modified_click(pos.x, pos.y),
        );
        assert_eq!(dup, ClickOutcome::Ignored);

        let outcome = scene.on_listener_event(
            ListenerKind::PointerDown,
            PointerInput::modified_click(pos.x, pos.y),
        );
        assert!(matches!(outcome, ClickOutcome::MiniAttached { .. }));
        assert_eq!(scene.pending_label(), "");

        // A plain mousedown on the document is not a pop
        let plain = scene.on_listener_event(ListenerKind::PointerDown, PointerInput::click(pos.x, pos.y));
        assert_eq!(plain, ClickOutcome::Ignored);
    }

    #[test]
    fn test_unmount_cancels_frame_and_listeners() {
        let (mut scene, _, _) = scene_loop(MemoryTaskStore::new());
        scene.mount().expect("mount");
        let pending = scene.pending_frame().expect("frame scheduled");

        scene.unmount();
        assert!(!scene.is_running());
        assert!(scene.host().pending_frames().is_empty());
        assert_eq!(scene.host().cancelled_frames(), &[pending]);
        assert!(scene.host().listeners().is_empty());

        let mut canvas = FrameRecorder::new();
        assert!(!scene.on_frame(16.0, &mut canvas));
        assert_eq!(canvas.frames(), 0);

        scene.unmount();
        assert_eq!(scene.host().cancelled_frames().len(), 1);
        assert!(matches!(scene.mount(), Err(SceneError::TornDown)));
    }
}
