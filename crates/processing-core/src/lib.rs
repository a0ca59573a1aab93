//! Reframe Processing Core
//!
//! Turns recorded input into editing decisions:
//! - **Cursor Smoothing:** Damped-spring resampling of pointer samples
//! - **Auto-Zoom:** Cluster clicks by dwell time into zoom keyframes
//! - **Zoom Regions:** Group keyframes into ease/hold blocks and insert manual zooms
//!
//! This crate is pure computation, no I/O, no platform dependencies.
//! All inputs are data; all outputs are data.

pub mod auto_zoom;
pub mod cursor_smooth;
pub mod zoom_regions;

pub use auto_zoom::{AutoZoomAnalyzer, AutoZoomConfig, AutoZoomReport, ClickRegion};
pub use cursor_smooth::{position_at, CursorSmoother, CursorSnapshot, CursorTrack, SpringParams};
pub use zoom_regions::{group_zoom_regions, insert_manual_region, remove_region_at, ManualZoom, ZoomRegion};
