//! The editing session for one open project.
//!
//! All region, zoom, style and history mutation goes through
//! [`EditorSession`]. Every mutation re-derives the runtime windows and marks
//! the session dirty; [`EditorSession::poll`] then records history and
//! autosaves once edits have settled.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use reframe_audio_ai::jobs::{BusyProbe, JobSlot};
use reframe_audio_ai::noise::{denoised_output_path, NoiseReducer, NoiseReductionConfig};
use reframe_audio_ai::transcription::{Transcriber, TranscriptionConfig, TranscriptionResult};
use reframe_common::clock::SettleTimer;
use reframe_common::config::EditorDefaults;
use reframe_common::error::{ReframeError, ReframeResult};
use reframe_processing_core::auto_zoom::{AutoZoomAnalyzer, AutoZoomConfig, AutoZoomReport};
use reframe_processing_core::cursor_smooth::{CursorSnapshot, CursorTrack};
use reframe_processing_core::zoom_regions::{
    group_zoom_regions, insert_manual_region, remove_region_at, ManualZoom, ZoomRegion,
};
use reframe_project_model::project::{
    write_json, Caption, CursorSpeed, EditorSnapshot, LoadedProject, ProjectError, StyleSettings,
    TrackRef, TrimRange,
};
use reframe_project_model::region::{
    AudioGain, CameraMode, CameraRegion, RegionEditing, RegionId, RegionTrack, Spotlight,
    TimeRange, TrackKind, Transition, VideoCut, EDIT_EPSILON_SECS,
};
use reframe_project_model::timeline::{ZoomKeyframe, ZoomTimeline};
use reframe_render_engine::compositor::resolve_trim;
use reframe_render_engine::export::ExportRequest;

use crate::describe::describe_changes;
use crate::history::History;

/// Windows derived from the region tracks, rebuilt after every edit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuntimeWindows {
    /// Source ranges that make it into the export.
    pub kept: Vec<TimeRange>,
    pub system_audio_muted: Vec<TimeRange>,
    pub microphone_muted: Vec<TimeRange>,
    pub camera_fullscreen: Vec<TimeRange>,
    pub camera_hidden: Vec<TimeRange>,
}

/// What a call to [`EditorSession::poll`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollOutcome {
    pub history_pushed: bool,
    pub saved: bool,
}

/// One open project.
pub struct EditorSession {
    project: LoadedProject,
    video_cuts: RegionTrack<VideoCut>,
    system_audio: RegionTrack<AudioGain>,
    microphone: RegionTrack<AudioGain>,
    camera: RegionTrack<CameraRegion>,
    spotlight: RegionTrack<Spotlight>,
    zoom: Arc<ZoomTimeline>,
    cursor: CursorTrack,
    style: StyleSettings,
    trim: TrimRange,
    captions: Vec<Caption>,
    history: History,
    history_timer: SettleTimer,
    save_timer: SettleTimer,
    windows: RuntimeWindows,
    denoise: JobSlot<PathBuf>,
    transcription: JobSlot<TranscriptionResult>,
}

impl EditorSession {
    /// Open the project at `root`, restoring its editor state and history.
    ///
    /// A project without `editor.json` starts from the configured cursor
    /// speed. An unreadable history file is logged and replaced.
    pub fn open(root: impl AsRef<Path>, defaults: &EditorDefaults) -> Result<Self, ProjectError> {
        let root = root.as_ref();
        let fresh = !root.join("meta").join("editor.json").exists();
        let mut loaded = LoadedProject::load(root)?;
        if fresh {
            if let Some(speed) = CursorSpeed::from_name(&defaults.cursor_speed) {
                loaded.editor.cursor.speed = speed;
            }
        }

        let history = match History::load_or_default(&loaded.history_path(), defaults.history_capacity)
        {
            Ok(history) => history,
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable history");
                History::new(defaults.history_capacity)
            }
        };

        Ok(Self::with_history(loaded, history, defaults))
    }

    /// Start a session over an already loaded project.
    pub fn with_history(loaded: LoadedProject, mut history: History, defaults: &EditorDefaults) -> Self {
        let duration = loaded.project.duration_secs();
        let snapshot = loaded.editor.clone();
        if history.is_empty() {
            history.push_snapshot(snapshot.clone());
        }

        let mut session = Self {
            cursor: CursorTrack::new(&loaded.cursor, snapshot.cursor),
            project: loaded,
            video_cuts: RegionTrack::new(duration),
            system_audio: RegionTrack::new(duration),
            microphone: RegionTrack::for_kind(TrackKind::Microphone, duration),
            camera: RegionTrack::new(duration),
            spotlight: RegionTrack::new(duration),
            zoom: Arc::new(ZoomTimeline::new()),
            style: StyleSettings::default(),
            trim: TrimRange::default(),
            captions: Vec::new(),
            history,
            history_timer: SettleTimer::from_millis(defaults.history_settle_ms),
            save_timer: SettleTimer::from_millis(defaults.autosave_settle_ms),
            windows: RuntimeWindows::default(),
            denoise: JobSlot::new("noise-reduction"),
            transcription: JobSlot::new("transcription"),
        };
        session.apply_snapshot(snapshot);

        tracing::info!(
            project = %session.project.project.name,
            duration_secs = duration,
            history_entries = session.history.len(),
            "Editor session opened"
        );
        session
    }

    pub fn project(&self) -> &LoadedProject {
        &self.project
    }

    pub fn duration_secs(&self) -> f64 {
        self.project.project.duration_secs()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn windows(&self) -> &RuntimeWindows {
        &self.windows
    }

    /// The zoom timeline, shared with render-side readers.
    pub fn zoom_timeline(&self) -> Arc<ZoomTimeline> {
        self.zoom.clone()
    }

    pub fn zoom_regions(&self) -> Vec<ZoomRegion> {
        group_zoom_regions(&self.zoom.snapshot())
    }

    pub fn cursor(&self) -> CursorSnapshot {
        self.cursor.snapshot()
    }

    pub fn style(&self) -> &StyleSettings {
        &self.style
    }

    pub fn trim(&self) -> TrimRange {
        self.trim
    }

    pub fn captions(&self) -> &[Caption] {
        &self.captions
    }

    pub fn video_cuts(&self) -> &RegionTrack<VideoCut> {
        &self.video_cuts
    }

    pub fn system_audio(&self) -> &RegionTrack<AudioGain> {
        &self.system_audio
    }

    pub fn microphone(&self) -> &RegionTrack<AudioGain> {
        &self.microphone
    }

    pub fn camera(&self) -> &RegionTrack<CameraRegion> {
        &self.camera
    }

    pub fn spotlight(&self) -> &RegionTrack<Spotlight> {
        &self.spotlight
    }

    /// Kind-erased view of one region track.
    pub fn track(&self, kind: TrackKind) -> &dyn RegionEditing {
        match kind {
            TrackKind::VideoCut => &self.video_cuts,
            TrackKind::SystemAudio => &self.system_audio,
            TrackKind::Microphone => &self.microphone,
            TrackKind::Camera => &self.camera,
            TrackKind::Spotlight => &self.spotlight,
        }
    }

    fn track_mut(&mut self, kind: TrackKind) -> &mut dyn RegionEditing {
        match kind {
            TrackKind::VideoCut => &mut self.video_cuts,
            TrackKind::SystemAudio => &mut self.system_audio,
            TrackKind::Microphone => &mut self.microphone,
            TrackKind::Camera => &mut self.camera,
            TrackKind::Spotlight => &mut self.spotlight,
        }
    }

    fn audio_track_mut(&mut self, kind: TrackKind) -> Option<&mut RegionTrack<AudioGain>> {
        match kind {
            TrackKind::SystemAudio => Some(&mut self.system_audio),
            TrackKind::Microphone => Some(&mut self.microphone),
            _ => None,
        }
    }

    // Region edits

    pub fn add_region(&mut self, kind: TrackKind, at_secs: f64) -> Option<RegionId> {
        let id = self.track_mut(kind).add_at(at_secs);
        if id.is_some() {
            self.edited();
        }
        id
    }

    pub fn update_region_start(&mut self, kind: TrackKind, id: RegionId, start_secs: f64) -> bool {
        let changed = self.track_mut(kind).update_start(id, start_secs);
        self.edited_if(changed)
    }

    pub fn update_region_end(&mut self, kind: TrackKind, id: RegionId, end_secs: f64) -> bool {
        let changed = self.track_mut(kind).update_end(id, end_secs);
        self.edited_if(changed)
    }

    pub fn move_region(&mut self, kind: TrackKind, id: RegionId, new_start_secs: f64) -> bool {
        let changed = self.track_mut(kind).move_to(id, new_start_secs);
        self.edited_if(changed)
    }

    pub fn remove_region(&mut self, kind: TrackKind, id: RegionId) -> bool {
        let changed = self.track_mut(kind).remove(id);
        self.edited_if(changed)
    }

    pub fn set_cut_transitions(
        &mut self,
        id: RegionId,
        entry: Option<Transition>,
        exit: Option<Transition>,
    ) -> bool {
        let changed = self.video_cuts.update_payload(id, |cut| {
            cut.entry = entry;
            cut.exit = exit;
        });
        self.edited_if(changed)
    }

    /// Set the gain of an audio region. Ignored for non-audio tracks.
    pub fn set_audio_gain(&mut self, kind: TrackKind, id: RegionId, gain: f64) -> bool {
        let gain = if gain.is_finite() { gain.max(0.0) } else { 1.0 };
        let changed = self
            .audio_track_mut(kind)
            .is_some_and(|track| track.update_payload(id, |p| p.gain = gain));
        self.edited_if(changed)
    }

    pub fn set_camera_mode(&mut self, id: RegionId, mode: CameraMode) -> bool {
        let changed = self.camera.update_payload(id, |p| p.mode = mode);
        self.edited_if(changed)
    }

    pub fn update_spotlight(&mut self, id: RegionId, edit: impl FnOnce(&mut Spotlight)) -> bool {
        let changed = self.spotlight.update_payload(id, edit);
        self.edited_if(changed)
    }

    // Zoom edits

    pub fn insert_manual_zoom(&mut self, proposal: &ManualZoom) -> bool {
        let inserted = insert_manual_region(&self.zoom, proposal, self.duration_secs());
        self.edited_if(inserted)
    }

    pub fn remove_zoom_keyframe(&mut self, index: usize) -> Option<ZoomKeyframe> {
        let removed = self.zoom.remove_keyframe(index);
        self.edited_if(removed.is_some());
        removed
    }

    pub fn remove_zoom_region_at(&mut self, t: f64) -> Option<ZoomRegion> {
        let removed = remove_region_at(&self.zoom, t);
        self.edited_if(removed.is_some());
        removed
    }

    /// Regenerate auto zoom keyframes from the recorded clicks.
    pub fn run_auto_zoom(&mut self, config: AutoZoomConfig) -> AutoZoomReport {
        let before = self.zoom.snapshot();
        let report = AutoZoomAnalyzer::new(config).apply_to_timeline(
            &self.zoom,
            self.cursor.clicks(),
            self.duration_secs(),
        );
        let changed = self.zoom.snapshot() != before;
        self.edited_if(changed);
        report
    }

    // Settings edits

    pub fn set_cursor_smoothing(&mut self, enabled: bool, speed: CursorSpeed) -> bool {
        let changed = self.cursor.set_smoothing(enabled, speed);
        self.edited_if(changed)
    }

    pub fn set_style(&mut self, style: StyleSettings) -> bool {
        if style == self.style {
            return false;
        }
        self.style = style;
        self.edited_if(true)
    }

    /// Set the legacy trim range, clamped to the recording. Ranges narrower
    /// than the edit epsilon are ignored.
    pub fn set_trim(&mut self, start_secs: f64, end_secs: f64) -> bool {
        let duration = self.duration_secs();
        let start = start_secs.clamp(0.0, duration);
        let end = end_secs.clamp(0.0, duration);
        if end - start < EDIT_EPSILON_SECS {
            return false;
        }
        let trim = TrimRange::new(start, end);
        if trim == self.trim {
            return false;
        }
        self.trim = trim;
        self.edited_if(true)
    }

    pub fn set_captions(&mut self, captions: Vec<Caption>) -> bool {
        if captions == self.captions {
            return false;
        }
        self.captions = captions;
        self.edited_if(true)
    }

    fn edited(&mut self) {
        self.rederive();
        self.mark_dirty();
    }

    fn edited_if(&mut self, changed: bool) -> bool {
        if changed {
            self.edited();
        }
        changed
    }

    fn rederive(&mut self) {
        let trim = resolve_trim(self.video_cuts.regions(), self.trim, self.duration_secs());
        let camera_windows = |mode: fn(&CameraMode) -> bool| -> Vec<TimeRange> {
            self.camera
                .regions()
                .iter()
                .filter(|r| mode(&r.payload.mode))
                .map(|r| r.range())
                .collect()
        };
        self.windows = RuntimeWindows {
            kept: trim.segments.iter().map(|s| s.range).collect(),
            system_audio_muted: self.system_audio.complement(),
            microphone_muted: self.microphone.complement(),
            camera_fullscreen: camera_windows(|m| matches!(m, CameraMode::Fullscreen)),
            camera_hidden: camera_windows(|m| matches!(m, CameraMode::Hidden)),
        };
    }

    // Persistence and history

    /// Arm both settle timers.
    pub fn mark_dirty(&mut self) {
        self.mark_dirty_at(Instant::now());
    }

    pub fn mark_dirty_at(&mut self, now: Instant) {
        self.history_timer.touch(now);
        self.save_timer.touch(now);
    }

    pub fn is_dirty(&self) -> bool {
        self.history_timer.is_pending() || self.save_timer.is_pending()
    }

    /// Run whichever settle timers have elapsed by `now`.
    pub fn poll(&mut self, now: Instant) -> PollOutcome {
        let mut outcome = PollOutcome::default();

        if self.history_timer.poll(now) {
            outcome.history_pushed = self.push_history();
            if outcome.history_pushed && !self.save_timer.is_pending() {
                self.save_timer.touch(now);
            }
        }

        if self.save_timer.poll(now) {
            outcome.saved = self.autosave();
        }

        outcome
    }

    /// Record pending history and save immediately.
    pub fn flush(&mut self) -> Result<(), ProjectError> {
        if self.history_timer.is_pending() {
            self.history_timer.cancel();
            self.push_history();
        }
        self.save_timer.cancel();
        self.save()
    }

    fn push_history(&mut self) -> bool {
        let snapshot = self.snapshot();
        if self.history.is_current(&snapshot) {
            return false;
        }
        if let Some(previous) = self.history.current() {
            let changes = describe_changes(previous, &snapshot);
            tracing::debug!(?changes, "Recording history entry");
        }
        self.history.push_snapshot(snapshot);
        true
    }

    fn autosave(&mut self) -> bool {
        match self.save() {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Autosave failed");
                false
            }
        }
    }

    /// Write `editor.json` and `history.json`.
    pub fn save(&mut self) -> Result<(), ProjectError> {
        let snapshot = self.snapshot();
        self.project.save_editor(&snapshot)?;
        self.project.editor = snapshot;
        self.history.save(&self.project.history_path())?;
        tracing::debug!(root = %self.project.root.display(), "Project saved");
        Ok(())
    }

    pub fn undo(&mut self) -> bool {
        self.settle_pending_history();
        let Some(snapshot) = self.history.undo().cloned() else {
            return false;
        };
        self.restore(snapshot);
        true
    }

    pub fn redo(&mut self) -> bool {
        self.settle_pending_history();
        let Some(snapshot) = self.history.redo().cloned() else {
            return false;
        };
        self.restore(snapshot);
        true
    }

    pub fn jump_to(&mut self, index: usize) -> bool {
        self.settle_pending_history();
        let Some(snapshot) = self.history.jump_to(index).cloned() else {
            return false;
        };
        self.restore(snapshot);
        true
    }

    /// Edits not yet in history are recorded before navigating away from them.
    fn settle_pending_history(&mut self) {
        if self.history_timer.is_pending() {
            self.history_timer.cancel();
            self.push_history();
        }
    }

    fn restore(&mut self, snapshot: EditorSnapshot) {
        self.apply_snapshot(snapshot);
        self.save_timer.touch(Instant::now());
    }

    fn apply_snapshot(&mut self, snapshot: EditorSnapshot) {
        let duration = self.duration_secs();
        self.video_cuts = RegionTrack::from_regions(duration, snapshot.video_cuts);
        self.system_audio = RegionTrack::from_regions(duration, snapshot.system_audio);
        self.microphone =
            RegionTrack::from_regions_as(TrackKind::Microphone, duration, snapshot.microphone);
        self.camera = RegionTrack::from_regions(duration, snapshot.camera);
        self.spotlight = RegionTrack::from_regions(duration, snapshot.spotlight);
        self.zoom.set_keyframes(snapshot.zoom_keyframes);
        self.cursor
            .set_smoothing(snapshot.cursor.smoothing_enabled, snapshot.cursor.speed);
        self.style = snapshot.style;
        self.trim = snapshot.trim;
        self.captions = snapshot.captions;
        self.rederive();
    }

    /// Full copy of the current editable state.
    pub fn snapshot(&self) -> EditorSnapshot {
        EditorSnapshot {
            trim: self.trim,
            video_cuts: self.video_cuts.regions().to_vec(),
            system_audio: self.system_audio.regions().to_vec(),
            microphone: self.microphone.regions().to_vec(),
            camera: self.camera.regions().to_vec(),
            spotlight: self.spotlight.regions().to_vec(),
            zoom_keyframes: self.zoom.snapshot(),
            style: self.style.clone(),
            cursor: self.cursor.settings(),
            captions: self.captions.clone(),
        }
    }

    /// Export request for the current state, written to `output_path` or the
    /// project's default export path.
    pub fn export_request(&self, output_path: Option<PathBuf>) -> ExportRequest {
        let output_path =
            output_path.unwrap_or_else(|| ExportRequest::default_output_path(&self.project));
        ExportRequest {
            project_root: self.project.root.clone(),
            project: self.project.project.clone(),
            snapshot: self.snapshot(),
            cursor: self.cursor.snapshot(),
            output_path,
        }
    }

    // Audio services

    /// Probe the exporter waits on while the microphone is being cleaned up.
    pub fn preprocessing_gate(&self) -> BusyProbe {
        self.denoise.busy_probe()
    }

    pub fn is_preprocessing(&self) -> bool {
        self.denoise.is_busy()
    }

    /// Start denoising the microphone track, superseding any running pass.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start_noise_reduction(
        &mut self,
        reducer: Arc<dyn NoiseReducer>,
        intensity: f64,
    ) -> ReframeResult<u64> {
        let mic = self
            .project
            .project
            .tracks
            .mic
            .clone()
            .ok_or_else(|| ReframeError::audio("project has no microphone track"))?;
        let input = self.project.source_path(&mic);
        let output = denoised_output_path(&self.project.root.join("cache"), &input);
        let config = NoiseReductionConfig {
            intensity,
            duration_secs: Some(mic.duration_secs),
            ..NoiseReductionConfig::default()
        };

        tracing::info!(reducer = reducer.name(), input = %input.display(), "Starting noise reduction");
        Ok(self
            .denoise
            .replace(move |ctx| reducer.reduce(&input, &output, &config, ctx)))
    }

    /// Wait for the current noise reduction pass and register its output as
    /// the denoised microphone track.
    pub async fn finish_noise_reduction(&mut self) -> Option<ReframeResult<PathBuf>> {
        let result = self.denoise.wait().await?;
        let output = match result {
            Ok(path) => path,
            Err(e) => return Some(Err(e)),
        };

        let duration = self
            .project
            .project
            .tracks
            .mic
            .as_ref()
            .map(|t| t.duration_secs)
            .unwrap_or_default();
        let relative = output
            .strip_prefix(&self.project.root)
            .unwrap_or(&output)
            .to_string_lossy()
            .into_owned();
        self.project.project.tracks.denoised_mic = Some(TrackRef::new(relative, duration));

        if let Err(e) = write_json(&self.project.project_path(), &self.project.project) {
            return Some(Err(ReframeError::project(e.to_string())));
        }
        Some(Ok(output))
    }

    /// Start transcribing the microphone (denoised when available), falling
    /// back to system audio.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start_transcription(
        &mut self,
        transcriber: Arc<dyn Transcriber>,
        config: TranscriptionConfig,
    ) -> ReframeResult<u64> {
        let tracks = &self.project.project.tracks;
        let source = tracks
            .effective_mic()
            .or(tracks.system_audio.as_ref())
            .ok_or_else(|| ReframeError::audio("project has no audio track to transcribe"))?;
        let input = self.project.source_path(source);

        tracing::info!(
            transcriber = transcriber.name(),
            input = %input.display(),
            "Starting transcription"
        );
        Ok(self
            .transcription
            .replace(move |ctx| transcriber.transcribe(&input, &config, ctx)))
    }

    /// Wait for the current transcription and replace the captions with it.
    pub async fn finish_transcription(&mut self) -> Option<ReframeResult<usize>> {
        let result = self.transcription.wait().await?;
        Some(result.map(|transcript| {
            let captions = transcript.into_captions();
            let count = captions.len();
            self.set_captions(captions);
            count
        }))
    }
}
