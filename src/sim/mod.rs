//! Deterministic scene simulation
//!
//! All scene logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (insertion order, which is also id order)
//! - No rendering or platform dependencies

pub mod backdrop;
pub mod bubble;
pub mod interaction;
pub mod state;
pub mod tick;

pub use backdrop::{Backdrop, BackdropField};
pub use bubble::{Bubble, BubbleId, MiniBubble, MiniId};
pub use interaction::{ClickOutcome, PointerInput, route_click};
pub use state::{PopKind, SceneEvent, SceneState, Viewport};
pub use tick::tick;
