//! Project metadata, style settings, and the serializable editor snapshot.
//!
//! A project directory looks like:
//!
//! ```text
//! <root>/
//!   sources/          screen, webcam, audio recordings
//!   meta/project.json source tracks and recording info
//!   meta/editor.json  EditorSnapshot (autosaved)
//!   meta/history.json undo history
//!   meta/cursor.jsonl cursor metadata stream
//!   exports/
//! ```

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::event::CursorMetadata;
use crate::region::{AudioGain, CameraBorder, CameraRegion, Region, Spotlight, VideoCut};
use crate::timeline::ZoomKeyframe;

/// Top-level project file (`project.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Schema version.
    pub version: String,

    /// Human-readable project name.
    pub name: String,

    /// Unique project identifier (UUID).
    pub id: String,

    /// Creation timestamp (ISO 8601).
    pub created_at: String,

    /// Last modified timestamp (ISO 8601).
    pub modified_at: String,

    /// How the recording was captured.
    pub recording: RecordingInfo,

    /// Source media tracks.
    pub tracks: Tracks,

    /// Export configuration.
    pub export: ExportSettings,
}

/// Capture parameters of the recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingInfo {
    /// Capture resolution (physical pixels).
    pub capture_width: u32,
    pub capture_height: u32,

    /// Recording frame rate.
    pub fps: u32,

    /// Monitor scale factor (e.g., 1.0, 1.25, 2.0).
    #[serde(default = "default_scale_factor")]
    pub scale_factor: f64,

    /// Audio sample rate.
    #[serde(default = "default_sample_rate")]
    pub audio_sample_rate: u32,
}

fn default_scale_factor() -> f64 {
    1.0
}

fn default_sample_rate() -> u32 {
    48_000
}

/// References to source media files (relative to project root).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tracks {
    /// Screen capture video. Required for export.
    pub screen: Option<TrackRef>,

    /// Webcam video.
    #[serde(default)]
    pub webcam: Option<TrackRef>,

    /// Microphone audio.
    #[serde(default)]
    pub mic: Option<TrackRef>,

    /// System/desktop audio.
    #[serde(default)]
    pub system_audio: Option<TrackRef>,

    /// Noise-reduced microphone audio, preferred over `mic` when present.
    #[serde(default)]
    pub denoised_mic: Option<TrackRef>,
}

impl Tracks {
    /// Every referenced track with a display label, in a stable order.
    pub fn referenced(&self) -> Vec<(&'static str, &TrackRef)> {
        [
            ("Screen", &self.screen),
            ("Webcam", &self.webcam),
            ("Microphone", &self.mic),
            ("System audio", &self.system_audio),
            ("Denoised microphone", &self.denoised_mic),
        ]
        .into_iter()
        .filter_map(|(label, track)| track.as_ref().map(|t| (label, t)))
        .collect()
    }

    /// The microphone track export should use.
    pub fn effective_mic(&self) -> Option<&TrackRef> {
        self.denoised_mic.as_ref().or(self.mic.as_ref())
    }
}

/// Reference to a media file with metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRef {
    /// Relative path from project root to the media file.
    pub path: String,

    /// Duration in seconds.
    pub duration_secs: f64,

    /// Codec used.
    #[serde(default)]
    pub codec: String,

    /// Offset in nanoseconds from recording epoch.
    #[serde(default)]
    pub offset_ns: i64,
}

impl TrackRef {
    pub fn new(path: impl Into<String>, duration_secs: f64) -> Self {
        Self {
            path: path.into(),
            duration_secs,
            codec: String::new(),
            offset_ns: 0,
        }
    }

    /// Ratio correcting a secondary track whose duration drifts from the
    /// primary video. `1.0` when either duration is unknown.
    pub fn drift_ratio(&self, primary_duration_secs: f64) -> f64 {
        if self.duration_secs > 0.0 && primary_duration_secs > 0.0 {
            self.duration_secs / primary_duration_secs
        } else {
            1.0
        }
    }
}

/// Export configuration stored with the project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSettings {
    /// Output format.
    pub format: ExportFormat,

    /// Output resolution (width x height in pixels).
    pub width: u32,
    pub height: u32,

    /// Output frame rate.
    pub fps: u32,

    /// Video bitrate in kbps (0 = auto).
    #[serde(default)]
    pub video_bitrate_kbps: u32,

    /// Audio bitrate in kbps.
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate_kbps: u32,

    /// Write SRT/VTT caption files next to the export.
    #[serde(default = "default_true")]
    pub subtitle_sidecars: bool,
}

fn default_audio_bitrate() -> u32 {
    192
}

fn default_true() -> bool {
    true
}

/// Output video format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[serde(rename = "mp4-h264")]
    Mp4H264,
    #[serde(rename = "mp4-h265")]
    Mp4H265,
    Gif,
    Webm,
}

impl ExportFormat {
    /// Parse the config/CLI spelling (`mp4-h264`, `webm`, ...).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "mp4" | "mp4-h264" | "h264" => Some(ExportFormat::Mp4H264),
            "mp4-h265" | "h265" | "hevc" => Some(ExportFormat::Mp4H265),
            "gif" => Some(ExportFormat::Gif),
            "webm" => Some(ExportFormat::Webm),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Mp4H264 | ExportFormat::Mp4H265 => "mp4",
            ExportFormat::Gif => "gif",
            ExportFormat::Webm => "webm",
        }
    }

    pub fn has_audio(&self) -> bool {
        !matches!(self, ExportFormat::Gif)
    }
}

/// Canvas/background styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasStyle {
    /// Background color as hex string (for example `#1a1a1a`).
    pub background: String,
    /// Rounded corner radius in output pixels.
    pub corner_radius: u32,
    /// Padding around the content window in output pixels.
    pub padding: u32,
    /// Shadow intensity multiplier in `[0.0, 1.0]`.
    pub shadow_intensity: f64,
}

impl Default for CanvasStyle {
    fn default() -> Self {
        Self {
            background: "#1a1a1a".to_string(),
            corner_radius: 20,
            padding: 56,
            shadow_intensity: 0.60,
        }
    }
}

/// Corner placement for the webcam overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CameraCorner {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
}

/// Global webcam overlay layout. Camera regions in custom mode override
/// individual fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraStyle {
    pub corner: CameraCorner,
    /// Overlay width relative to output width.
    pub size_ratio: f64,
    /// Margin from the frame edges relative to output dimensions.
    pub margin_ratio: f64,
    /// Width / height of the overlay.
    pub aspect_ratio: f64,
    pub corner_radius: f64,
    pub shadow: f64,
    pub border: Option<CameraBorder>,
    pub mirrored: bool,
}

impl Default for CameraStyle {
    fn default() -> Self {
        Self {
            corner: CameraCorner::BottomRight,
            size_ratio: 0.24,
            margin_ratio: 0.03,
            aspect_ratio: 16.0 / 9.0,
            corner_radius: 12.0,
            shadow: 0.4,
            border: None,
            mirrored: false,
        }
    }
}

/// Global spotlight defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotlightStyle {
    /// Lit radius relative to the frame height.
    pub radius: f64,
    /// Darkening applied outside the lit area, `[0, 1]`.
    pub dim: f64,
    /// Edge feathering, `[0, 1]`.
    pub softness: f64,
    /// Fade in/out duration in seconds.
    pub fade_secs: f64,
}

impl Default for SpotlightStyle {
    fn default() -> Self {
        Self {
            radius: 0.15,
            dim: 0.6,
            softness: 0.5,
            fade_secs: 0.3,
        }
    }
}

/// Visual style of the export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleSettings {
    pub canvas: CanvasStyle,
    pub camera: CameraStyle,
    pub spotlight: SpotlightStyle,
    /// Keep zoomed windows centered on the cursor.
    pub zoom_follow_cursor: bool,
    /// Rendered cursor size multiplier.
    pub cursor_scale: f64,
}

impl Default for StyleSettings {
    fn default() -> Self {
        Self {
            canvas: CanvasStyle::default(),
            camera: CameraStyle::default(),
            spotlight: SpotlightStyle::default(),
            zoom_follow_cursor: false,
            cursor_scale: 1.0,
        }
    }
}

/// Cursor smoothing speed preset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CursorSpeed {
    Slow,
    #[default]
    Mellow,
    Quick,
    Rapid,
    Custom {
        tension: f64,
        friction: f64,
        mass: f64,
    },
}

impl CursorSpeed {
    /// Parse a preset name. Custom speeds have no name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "slow" => Some(CursorSpeed::Slow),
            "mellow" => Some(CursorSpeed::Mellow),
            "quick" => Some(CursorSpeed::Quick),
            "rapid" => Some(CursorSpeed::Rapid),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CursorSpeed::Slow => "slow",
            CursorSpeed::Mellow => "mellow",
            CursorSpeed::Quick => "quick",
            CursorSpeed::Rapid => "rapid",
            CursorSpeed::Custom { .. } => "custom",
        }
    }
}

/// Cursor smoothing settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CursorSettings {
    pub smoothing_enabled: bool,
    pub speed: CursorSpeed,
}

impl Default for CursorSettings {
    fn default() -> Self {
        Self {
            smoothing_enabled: true,
            speed: CursorSpeed::Mellow,
        }
    }
}

/// A timed caption line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Caption {
    pub start_secs: f64,
    pub end_secs: f64,
    pub text: String,
}

/// Single kept range used before cut regions existed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct TrimRange {
    pub start_secs: f64,
    pub end_secs: f64,
}

impl TrimRange {
    pub fn new(start_secs: f64, end_secs: f64) -> Self {
        Self {
            start_secs,
            end_secs,
        }
    }

    pub fn duration(&self) -> f64 {
        (self.end_secs - self.start_secs).max(0.0)
    }
}

/// The complete editable state of a project.
///
/// Persisted to `meta/editor.json` and stored whole in each history entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EditorSnapshot {
    pub trim: TrimRange,
    pub video_cuts: Vec<Region<VideoCut>>,
    pub system_audio: Vec<Region<AudioGain>>,
    pub microphone: Vec<Region<AudioGain>>,
    pub camera: Vec<Region<CameraRegion>>,
    pub spotlight: Vec<Region<Spotlight>>,
    pub zoom_keyframes: Vec<ZoomKeyframe>,
    pub style: StyleSettings,
    pub cursor: CursorSettings,
    pub captions: Vec<Caption>,
}

impl EditorSnapshot {
    /// Fresh state for a recording of `duration_secs`: the whole recording
    /// kept, no regions.
    pub fn for_duration(duration_secs: f64) -> Self {
        Self {
            trim: TrimRange::new(0.0, duration_secs.max(0.0)),
            ..Self::default()
        }
    }
}

/// The complete in-memory representation of a loaded project.
#[derive(Debug, Clone)]
pub struct LoadedProject {
    /// Filesystem path to the project directory.
    pub root: PathBuf,

    /// Project metadata.
    pub project: Project,

    /// Editable state.
    pub editor: EditorSnapshot,

    /// Cursor metadata stream.
    pub cursor: CursorMetadata,
}

impl Project {
    /// Create a new project with defaults.
    pub fn new(name: impl Into<String>, width: u32, height: u32, fps: u32) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            version: "1.0".to_string(),
            name: name.into(),
            id: uuid_v4(),
            created_at: now.clone(),
            modified_at: now,
            recording: RecordingInfo {
                capture_width: width,
                capture_height: height,
                fps,
                scale_factor: default_scale_factor(),
                audio_sample_rate: default_sample_rate(),
            },
            tracks: Tracks::default(),
            export: ExportSettings {
                format: ExportFormat::Mp4H264,
                width,
                height,
                fps,
                video_bitrate_kbps: 8000,
                audio_bitrate_kbps: default_audio_bitrate(),
                subtitle_sidecars: true,
            },
        }
    }

    /// Duration of the primary video, or zero without one.
    pub fn duration_secs(&self) -> f64 {
        self.tracks
            .screen
            .as_ref()
            .map(|t| t.duration_secs)
            .unwrap_or(0.0)
    }
}

impl LoadedProject {
    pub fn meta_dir(&self) -> PathBuf {
        self.root.join("meta")
    }

    pub fn project_path(&self) -> PathBuf {
        self.meta_dir().join("project.json")
    }

    pub fn editor_path(&self) -> PathBuf {
        self.meta_dir().join("editor.json")
    }

    pub fn history_path(&self) -> PathBuf {
        self.meta_dir().join("history.json")
    }

    pub fn cursor_path(&self) -> PathBuf {
        self.meta_dir().join("cursor.jsonl")
    }

    pub fn exports_dir(&self) -> PathBuf {
        self.root.join("exports")
    }

    /// Absolute path of a track file.
    pub fn source_path(&self, track: &TrackRef) -> PathBuf {
        self.root.join(&track.path)
    }

    /// Load a project from a directory.
    ///
    /// A missing `editor.json` yields a fresh snapshot; a missing cursor
    /// stream yields empty cursor metadata.
    pub fn load(root: impl AsRef<Path>) -> Result<Self, ProjectError> {
        let root = root.as_ref().to_path_buf();
        let meta = root.join("meta");

        let project: Project = read_json(&meta.join("project.json"))?;

        let editor_path = meta.join("editor.json");
        let editor = if editor_path.exists() {
            read_json(&editor_path)?
        } else {
            EditorSnapshot::for_duration(project.duration_secs())
        };

        let cursor_path = meta.join("cursor.jsonl");
        let cursor = if cursor_path.exists() {
            CursorMetadata::load(&cursor_path)?
        } else {
            tracing::debug!(path = %cursor_path.display(), "No cursor stream, using empty metadata");
            CursorMetadata::empty(
                project.recording.capture_width,
                project.recording.capture_height,
            )
        };

        Ok(Self {
            root,
            project,
            editor,
            cursor,
        })
    }

    /// Save project metadata and editor state to disk.
    pub fn save(&self) -> Result<(), ProjectError> {
        let meta_dir = self.meta_dir();
        std::fs::create_dir_all(&meta_dir).map_err(|e| ProjectError::IoError {
            path: meta_dir.clone(),
            source: e,
        })?;

        write_json(&self.project_path(), &self.project)?;
        self.save_editor(&self.editor)
    }

    /// Write an editor snapshot to `meta/editor.json`.
    pub fn save_editor(&self, snapshot: &EditorSnapshot) -> Result<(), ProjectError> {
        write_json(&self.editor_path(), snapshot)
    }

    /// Create a new project on disk with the standard directory structure.
    pub fn create(
        root: impl AsRef<Path>,
        name: impl Into<String>,
        width: u32,
        height: u32,
        fps: u32,
    ) -> Result<Self, ProjectError> {
        let root = root.as_ref().to_path_buf();

        for subdir in &["sources", "meta", "cache", "exports"] {
            std::fs::create_dir_all(root.join(subdir)).map_err(|e| ProjectError::IoError {
                path: root.join(subdir),
                source: e,
            })?;
        }

        let loaded = Self {
            root,
            project: Project::new(name, width, height, fps),
            editor: EditorSnapshot::default(),
            cursor: CursorMetadata::empty(width, height),
        };
        loaded.save()?;
        Ok(loaded)
    }

    /// Check that every referenced source file exists.
    pub fn validate_sources(&self) -> Vec<String> {
        let mut errors = vec![];

        if self.project.tracks.screen.is_none() {
            errors.push("Screen track not set".to_string());
        }
        for (label, track) in self.project.tracks.referenced() {
            if !self.source_path(track).exists() {
                errors.push(format!("{label} source missing: {}", track.path));
            }
        }

        errors
    }
}

/// Read and deserialize a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ProjectError> {
    let content = std::fs::read_to_string(path).map_err(|e| ProjectError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&content).map_err(|e| ProjectError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Serialize to pretty JSON and write, replacing the file through a temp
/// sibling so readers never see a half-written file.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ProjectError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| ProjectError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).map_err(|e| ProjectError::IoError {
        path: tmp.clone(),
        source: e,
    })?;
    std::fs::rename(&tmp, path).map_err(|e| ProjectError::IoError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Errors that can occur when working with projects.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid project: {message}")]
    ValidationError { message: String },
}

/// Generate a time-seeded UUID v4-shaped identifier.
fn uuid_v4() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!(
        "{:08x}-{:04x}-4{:03x}-{:04x}-{:012x}",
        (seed & 0xFFFF_FFFF) as u32,
        ((seed >> 32) & 0xFFFF) as u16,
        ((seed >> 48) & 0x0FFF) as u16,
        (((seed >> 60) & 0x3F) | 0x80) as u16,
        (seed >> 68) & 0xFFFF_FFFF_FFFF,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_project_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("reframe_test_{name}_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_project_creation() {
        let project = Project::new("Test Recording", 1920, 1080, 60);
        assert_eq!(project.name, "Test Recording");
        assert_eq!(project.recording.capture_width, 1920);
        assert_eq!(project.export.fps, 60);
        assert_eq!(project.duration_secs(), 0.0);
    }

    #[test]
    fn test_loaded_project_create_and_load() {
        let dir = temp_project_dir("create");

        let created = LoadedProject::create(&dir, "Integration Test", 1920, 1080, 60).unwrap();
        assert_eq!(created.project.name, "Integration Test");

        let loaded = LoadedProject::load(&dir).unwrap();
        assert_eq!(loaded.project, created.project);
        assert_eq!(loaded.editor, EditorSnapshot::default());
        assert!(loaded.cursor.samples.is_empty());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_editor_snapshot_persists() {
        let dir = temp_project_dir("editor");
        let loaded = LoadedProject::create(&dir, "Editor", 1280, 720, 30).unwrap();

        let mut snapshot = EditorSnapshot::for_duration(42.0);
        snapshot.video_cuts.push(Region {
            id: 1,
            start_secs: 2.0,
            end_secs: 40.0,
            payload: VideoCut::default(),
        });
        snapshot.zoom_keyframes.push(ZoomKeyframe::manual(3.0, 2.0, 0.4, 0.6));
        snapshot.cursor.speed = CursorSpeed::Rapid;
        snapshot.captions.push(Caption {
            start_secs: 1.0,
            end_secs: 2.5,
            text: "Hello".to_string(),
        });
        loaded.save_editor(&snapshot).unwrap();

        let reloaded = LoadedProject::load(&dir).unwrap();
        assert_eq!(reloaded.editor, snapshot);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_editor_file_uses_screen_duration() {
        let dir = temp_project_dir("fresh_editor");
        let mut loaded = LoadedProject::create(&dir, "Fresh", 1920, 1080, 60).unwrap();
        loaded.project.tracks.screen = Some(TrackRef::new("sources/screen.mp4", 12.5));
        loaded.save().unwrap();
        std::fs::remove_file(loaded.editor_path()).unwrap();

        let reloaded = LoadedProject::load(&dir).unwrap();
        assert_eq!(reloaded.editor.trim, TrimRange::new(0.0, 12.5));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_validate_sources_reports_missing() {
        let dir = temp_project_dir("validate");

        let mut loaded = LoadedProject::create(&dir, "Validate Test", 1920, 1080, 60).unwrap();
        assert!(loaded
            .validate_sources()
            .iter()
            .any(|e| e.contains("Screen track not set")));

        loaded.project.tracks.screen = Some(TrackRef::new("sources/screen.mkv", 60.0));
        loaded.project.tracks.webcam = Some(TrackRef::new("sources/webcam.mkv", 60.0));

        let errors = loaded.validate_sources();
        assert!(errors.iter().any(|e| e.contains("Screen source missing")));
        assert!(errors.iter().any(|e| e.contains("Webcam source missing")));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_legacy_project_without_optional_fields() {
        let json = r#"{
            "version": "1.0",
            "name": "Legacy",
            "id": "x",
            "created_at": "2024-01-01T00:00:00Z",
            "modified_at": "2024-01-01T00:00:00Z",
            "recording": {"capture_width": 1920, "capture_height": 1080, "fps": 60},
            "tracks": {"screen": {"path": "sources/screen.mp4", "duration_secs": 10.0}},
            "export": {"format": "mp4-h264", "width": 1920, "height": 1080, "fps": 60}
        }"#;
        let project: Project = serde_json::from_str(json).unwrap();
        assert_eq!(project.recording.scale_factor, 1.0);
        assert!(project.tracks.denoised_mic.is_none());
        assert!(project.export.subtitle_sidecars);
        assert_eq!(project.duration_secs(), 10.0);
    }

    #[test]
    fn test_effective_mic_prefers_denoised() {
        let mut tracks = Tracks {
            mic: Some(TrackRef::new("sources/mic.wav", 10.0)),
            ..Tracks::default()
        };
        assert_eq!(tracks.effective_mic().unwrap().path, "sources/mic.wav");
        tracks.denoised_mic = Some(TrackRef::new("cache/mic_denoised.wav", 10.0));
        assert_eq!(
            tracks.effective_mic().unwrap().path,
            "cache/mic_denoised.wav"
        );
    }

    #[test]
    fn test_cursor_speed_names() {
        assert_eq!(CursorSpeed::from_name("Quick"), Some(CursorSpeed::Quick));
        assert_eq!(CursorSpeed::from_name("warp"), None);
        assert_eq!(CursorSpeed::Mellow.name(), "mellow");
    }

    #[test]
    fn test_drift_ratio() {
        let webcam = TrackRef::new("sources/webcam.mp4", 10.1);
        assert!((webcam.drift_ratio(10.0) - 1.01).abs() < 1e-9);
        assert_eq!(TrackRef::new("x", 0.0).drift_ratio(10.0), 1.0);
    }
}
