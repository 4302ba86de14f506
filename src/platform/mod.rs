//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Frame scheduling (requestAnimationFrame)
//! - Input and resize listeners
//! - Canvas sizing

#[cfg(target_arch = "wasm32")]
pub mod web;

use thiserror::Error;

use crate::sim::state::Viewport;

/// Failure reported by the host environment
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("host error: {0}")]
pub struct HostError(pub String);

/// Token for a scheduled frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub i32);

/// Token for an installed listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerHandle(pub u32);

/// Listeners the scene installs while mounted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    /// Window resize
    Resize,
    /// Pointer down anywhere in the document (modifier clicks)
    PointerDown,
    /// Plain click on the canvas
    Click,
}

impl ListenerKind {
    pub const ALL: [ListenerKind; 3] = [
        ListenerKind::Resize,
        ListenerKind::PointerDown,
        ListenerKind::Click,
    ];

    pub fn event_name(&self) -> &'static str {
        match self {
            ListenerKind::Resize => "resize",
            ListenerKind::PointerDown => "mousedown",
            ListenerKind::Click => "click",
        }
    }
}

/// Environment the scene loop runs in
pub trait Host {
    /// Current screen (window) size
    fn screen_size(&self) -> (f32, f32);
    /// Apply a new canvas size
    fn resize_surface(&mut self, viewport: Viewport);
    /// Ask for one callback on the next display refresh
    fn request_frame(&mut self) -> Result<FrameHandle, HostError>;
    fn cancel_frame(&mut self, handle: FrameHandle);
    fn add_listener(&mut self, kind: ListenerKind) -> Result<ListenerHandle, HostError>;
    fn remove_listener(&mut self, handle: ListenerHandle);
}

/// Host without a display: frames and listeners are only bookkept
#[derive(Debug, Clone)]
pub struct HeadlessHost {
    pub screen: (f32, f32),
    pub surface: Viewport,
    pending_frames: Vec<FrameHandle>,
    cancelled_frames: Vec<FrameHandle>,
    listeners: Vec<(ListenerHandle, ListenerKind)>,
    next_frame: i32,
    next_listener: u32,
}

impl HeadlessHost {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            screen: (width, height),
            surface: Viewport::default(),
            pending_frames: Vec::new(),
            cancelled_frames: Vec::new(),
            listeners: Vec::new(),
            next_frame: 1,
            next_listener: 1,
        }
    }

    /// Frames requested and not yet delivered or cancelled
    pub fn pending_frames(&self) -> &[FrameHandle] {
        &self.pending_frames
    }

    pub fn cancelled_frames(&self) -> &[FrameHandle] {
        &self.cancelled_frames
    }

    /// Mark the oldest pending frame as delivered
    pub fn take_frame(&mut self) -> Option<FrameHandle> {
        if self.pending_frames.is_empty() {
            None
        } else {
            Some(self.pending_frames.remove(0))
        }
    }

    pub fn listeners(&self) -> Vec<ListenerKind> {
        self.listeners.iter().map(|(_, kind)| *kind).collect()
    }

    pub fn has_listener(&self, kind: ListenerKind) -> bool {
        self.listeners.iter().any(|(_, k)| *k == kind)
    }
}

impl Host for HeadlessHost {
    fn screen_size(&self) -> (f32, f32) {
        self.screen
    }

    fn resize_surface(&mut self, viewport: Viewport) {
        self.surface = viewport;
    }

    fn request_frame(&mut self) -> Result<FrameHandle, HostError> {
        let handle = FrameHandle(self.next_frame);
        self.next_frame += 1;
        self.pending_frames.push(handle);
        Ok(handle)
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.pending_frames.retain(|h| *h != handle);
        self.cancelled_frames.push(handle);
    }

    fn add_listener(&mut self, kind: ListenerKind) -> Result<ListenerHandle, HostError> {
        let handle = ListenerHandle(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((handle, kind));
        Ok(handle)
    }

    fn remove_listener(&mut self, handle: ListenerHandle) {
        self.listeners.retain(|(h, _)| *h != handle);
    }
}
