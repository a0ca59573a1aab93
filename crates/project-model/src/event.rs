//! Cursor metadata recorded alongside the screen capture.
//!
//! The side-channel file is JSONL: a `#`-prefixed JSON header line followed
//! by one event per line. Times are seconds since recording start and all
//! pointer coordinates are normalized to `[0.0, 1.0]` relative to the
//! capture region.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::project::ProjectError;

/// Schema version written into new cursor metadata headers.
pub const CURSOR_SCHEMA_VERSION: &str = "1.0";

/// A single pointer position sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CursorSample {
    /// Seconds since recording start.
    pub t: f64,
    /// Normalized X coordinate [0.0, 1.0].
    pub x: f64,
    /// Normalized Y coordinate [0.0, 1.0].
    pub y: f64,
    /// Pen/trackpad pressure, 0.0 when the device reports none.
    #[serde(default)]
    pub pressure: f64,
}

/// A mouse button press.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClickEvent {
    /// Seconds since recording start.
    pub t: f64,
    pub x: f64,
    pub y: f64,
    pub button: MouseButton,
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Back,
    Forward,
}

/// One line of the cursor metadata stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CursorEvent {
    /// Pointer moved.
    Move {
        t: f64,
        x: f64,
        y: f64,
        #[serde(default)]
        pressure: f64,
    },
    /// Button pressed.
    Click {
        t: f64,
        x: f64,
        y: f64,
        button: MouseButton,
    },
}

impl CursorEvent {
    /// Timestamp in seconds.
    pub fn t(&self) -> f64 {
        match self {
            CursorEvent::Move { t, .. } | CursorEvent::Click { t, .. } => *t,
        }
    }
}

/// Header line of the cursor metadata stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CursorStreamHeader {
    /// Schema version for forward compatibility.
    pub schema_version: String,

    /// Capture region dimensions in physical pixels.
    pub capture_width: u32,
    pub capture_height: u32,

    /// Monitor scale factor at recording time.
    #[serde(default = "default_scale_factor")]
    pub scale_factor: f64,
}

fn default_scale_factor() -> f64 {
    1.0
}

impl CursorStreamHeader {
    pub fn new(capture_width: u32, capture_height: u32) -> Self {
        Self {
            schema_version: CURSOR_SCHEMA_VERSION.to_string(),
            capture_width,
            capture_height,
            scale_factor: 1.0,
        }
    }
}

/// Cursor data loaded once per editing session.
///
/// Samples and clicks are immutable and shared; derived data (smoothed paths)
/// is built from them, never written back.
#[derive(Debug, Clone)]
pub struct CursorMetadata {
    pub header: CursorStreamHeader,
    pub samples: Arc<[CursorSample]>,
    pub clicks: Arc<[ClickEvent]>,
}

impl CursorMetadata {
    /// Build metadata from events, sorting each stream by time.
    pub fn from_events(header: CursorStreamHeader, events: Vec<CursorEvent>) -> Self {
        let mut samples = Vec::new();
        let mut clicks = Vec::new();
        for event in events {
            match event {
                CursorEvent::Move { t, x, y, pressure } => {
                    samples.push(CursorSample { t, x, y, pressure })
                }
                CursorEvent::Click { t, x, y, button } => clicks.push(ClickEvent { t, x, y, button }),
            }
        }
        samples.sort_by(|a, b| a.t.total_cmp(&b.t));
        clicks.sort_by(|a, b| a.t.total_cmp(&b.t));

        Self {
            header,
            samples: samples.into(),
            clicks: clicks.into(),
        }
    }

    /// Metadata with no samples (recordings made without cursor capture).
    pub fn empty(capture_width: u32, capture_height: u32) -> Self {
        Self::from_events(CursorStreamHeader::new(capture_width, capture_height), vec![])
    }

    /// Parse the full JSONL file content (header line plus events).
    pub fn parse(content: &str) -> Result<Self, CursorParseError> {
        let header_line = content
            .lines()
            .map(str::trim)
            .find(|line| line.starts_with('#'))
            .ok_or(CursorParseError::MissingHeader)?;
        let header: CursorStreamHeader =
            serde_json::from_str(header_line.trim_start_matches('#').trim())
                .map_err(CursorParseError::Header)?;
        let events = parse_events(content).map_err(CursorParseError::Event)?;
        Ok(Self::from_events(header, events))
    }

    /// Load from a file on disk.
    pub fn load(path: &Path) -> Result<Self, ProjectError> {
        let content = std::fs::read_to_string(path).map_err(|e| ProjectError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content).map_err(|e| ProjectError::ValidationError {
            message: format!("{}: {e}", path.display()),
        })
    }

    /// Time of the last sample or click, in seconds.
    pub fn last_timestamp(&self) -> f64 {
        let last_sample = self.samples.last().map(|s| s.t).unwrap_or(0.0);
        let last_click = self.clicks.last().map(|c| c.t).unwrap_or(0.0);
        last_sample.max(last_click)
    }
}

/// Errors raised while parsing a cursor metadata stream.
#[derive(Debug, thiserror::Error)]
pub enum CursorParseError {
    #[error("cursor stream has no header line")]
    MissingHeader,

    #[error("invalid cursor stream header: {0}")]
    Header(serde_json::Error),

    #[error("invalid cursor event: {0}")]
    Event(serde_json::Error),
}

/// Parse events from JSONL content (one JSON object per line).
/// Blank lines and `#` header/comment lines are skipped.
pub fn parse_events(jsonl: &str) -> Result<Vec<CursorEvent>, serde_json::Error> {
    jsonl
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(serde_json::from_str)
        .collect()
}

/// Serialize a header and events to JSONL format.
pub fn serialize_stream(
    header: &CursorStreamHeader,
    events: &[CursorEvent],
) -> Result<String, serde_json::Error> {
    let mut output = format!("# {}\n", serde_json::to_string(header)?);
    for event in events {
        output.push_str(&serde_json::to_string(event)?);
        output.push('\n');
    }
    Ok(output)
}
