//! Pieces every Reframe crate leans on: the shared [`ReframeError`], the
//! user's [`AppConfig`], tracing setup, and the settle timers that pace
//! autosave and undo history.

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::{secs_to_duration, EtaEstimator, SettleTimer};
pub use config::{AppConfig, EditorDefaults, ExportDefaults, LoggingConfig};
pub use error::{ReframeError, ReframeResult};
