//! Reframe Render Engine
//!
//! Turns an edited project into a flattened export.
//!
//! # Pipeline Architecture
//!
//! ```text
//! EditorSnapshot ──┐
//! CursorSnapshot ──┼── RenderInstructions::resolve ── RenderBackend (ffmpeg) ── output.mp4
//! source tracks ───┘          │                              │
//!                             ▼                              ▼
//!                  compute_compositions          subtitle sidecars (.srt/.vtt)
//!                  (verification report)
//! ```
//!
//! [`Exporter`] owns the state machine (`Idle → Exporting → Succeeded |
//! Failed | Cancelled`), waits for preprocessing and handles cancellation.

pub mod compositor;
pub mod export;
pub mod ffmpeg;
pub mod sidecar;

pub use compositor::{compute_compositions, FrameComposition, RenderInstructions};
pub use export::*;
pub use ffmpeg::FfmpegBackend;
