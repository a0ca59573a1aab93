//! Reframe Editor
//!
//! The editing side of a project:
//! - **Session:** Owns the region tracks, zoom timeline, cursor track and
//!   style for one project; debounces history and autosave
//! - **History:** Capped undo/redo list of full editor snapshots
//! - **Describe:** Human-readable change lists between snapshots

pub mod describe;
pub mod history;
pub mod session;

pub use describe::describe_changes;
pub use history::{History, HistoryEntry, DEFAULT_HISTORY_CAPACITY};
pub use session::{EditorSession, PollOutcome, RuntimeWindows};
