//! Reframe Project Model
//!
//! Defines the core data contracts for Reframe projects:
//! - **Cursor metadata:** Timestamped pointer samples and clicks
//! - **Regions:** Interval tracks (video cuts, audio, camera, spotlight)
//!   and the shared editing algebra that keeps them consistent
//! - **Zoom timeline:** Keyframed zoom/pan shared between edit and render threads
//! - **Project:** Source tracks, style, and the serializable editor snapshot
//!
//! All coordinates are normalized to `[0.0, 1.0]` range relative to the
//! capture region to survive DPI/scaling changes across sessions.

pub mod event;
pub mod project;
pub mod region;
pub mod timeline;
pub mod viewport;

pub use event::*;
pub use project::*;
pub use region::*;
pub use timeline::*;
pub use viewport::*;
