//! Export orchestration and job management.
//!
//! [`Exporter`] drives one export at a time: it waits for preprocessing,
//! validates sources, resolves [`RenderInstructions`], hands them to a
//! [`RenderBackend`] on a blocking task and publishes [`ExportState`] on a
//! watch channel.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;

use reframe_audio_ai::BusyProbe;
use reframe_common::clock::EtaEstimator;
use reframe_processing_core::{CursorSnapshot, CursorTrack};
use reframe_project_model::project::{EditorSnapshot, LoadedProject, Project, TrackRef};

use crate::compositor::{RenderInstructions, SourcePaths};
use crate::sidecar::spawn_subtitle_sidecars;

/// Observable export state.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ExportState {
    #[default]
    Idle,
    Exporting {
        /// `[0.0, 1.0]`
        progress: f64,
        eta_secs: Option<f64>,
    },
    Succeeded(PathBuf),
    Failed(String),
    Cancelled,
}

impl ExportState {
    pub fn is_running(&self) -> bool {
        matches!(self, ExportState::Exporting { .. })
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExportState::Succeeded(_) | ExportState::Failed(_) | ExportState::Cancelled
        )
    }
}

/// How an export that did not fail ended.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportOutcome {
    Finished(PathBuf),
    Cancelled,
}

/// Errors that fail an export.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("{label} source missing: {}", path.display())]
    MissingSource { label: String, path: PathBuf },

    #[error("{label} source unreadable at {}: {source}", path.display())]
    UnreadableSource {
        label: String,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Renderer failed: {0}")]
    Renderer(String),

    #[error("Invalid timeline: {0}")]
    InvalidTimeline(String),

    #[error("An export is already in progress")]
    Busy,

    /// Raised by backends when they notice the cancel flag. The orchestrator
    /// turns it into [`ExportOutcome::Cancelled`].
    #[error("Export cancelled")]
    Cancelled,
}

/// Export progress report.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportProgress {
    /// Current progress [0.0, 1.0].
    pub progress: f64,

    /// Frames rendered so far.
    pub frames_rendered: u64,

    /// Total frames to render.
    pub total_frames: u64,

    /// Backend's own remaining-time estimate, if it has one.
    pub eta_secs: Option<f64>,
}

/// Trait for render backends.
pub trait RenderBackend: Send + Sync {
    /// Render `instructions` to `instructions.output_path`.
    ///
    /// Must check `cancel` at least on every progress report and return
    /// [`ExportError::Cancelled`] once it is set.
    fn render(
        &self,
        instructions: &RenderInstructions,
        progress: &dyn Fn(ExportProgress),
        cancel: &AtomicBool,
    ) -> Result<PathBuf, ExportError>;

    /// Check if this backend is available on the system.
    fn is_available(&self) -> bool;

    /// Backend name.
    fn name(&self) -> &str;
}

/// A preprocessing step the export must wait for.
pub trait PreprocessingGate: Send + Sync {
    fn is_busy(&self) -> bool;
}

impl PreprocessingGate for BusyProbe {
    fn is_busy(&self) -> bool {
        BusyProbe::is_busy(self)
    }
}

/// Everything an export reads, copied out of the editor.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub project_root: PathBuf,
    pub project: Project,
    pub snapshot: EditorSnapshot,
    pub cursor: CursorSnapshot,
    pub output_path: PathBuf,
}

impl ExportRequest {
    /// Build a request from a project as stored on disk.
    pub fn from_loaded(loaded: &LoadedProject, output_path: PathBuf) -> Self {
        let cursor = CursorTrack::new(&loaded.cursor, loaded.editor.cursor).snapshot();
        Self {
            project_root: loaded.root.clone(),
            project: loaded.project.clone(),
            snapshot: loaded.editor.clone(),
            cursor,
            output_path,
        }
    }

    /// `exports/<project name>.<ext>` inside the project.
    pub fn default_output_path(loaded: &LoadedProject) -> PathBuf {
        let stem: String = loaded
            .project
            .name
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        let stem = if stem.is_empty() { "export".to_string() } else { stem };
        loaded
            .exports_dir()
            .join(format!("{stem}.{}", loaded.project.export.format.extension()))
    }
}

/// Runs exports against a render backend.
pub struct Exporter {
    backend: Arc<dyn RenderBackend>,
    gate: Option<Arc<dyn PreprocessingGate>>,
    poll_interval: Duration,
    state: Arc<watch::Sender<ExportState>>,
    cancel: Mutex<Option<Arc<AtomicBool>>>,
}

impl Exporter {
    pub fn new(backend: Arc<dyn RenderBackend>) -> Self {
        let (state, _) = watch::channel(ExportState::Idle);
        Self {
            backend,
            gate: None,
            poll_interval: Duration::from_millis(100),
            state: Arc::new(state),
            cancel: Mutex::new(None),
        }
    }

    /// Wait for `gate` to go idle before each export.
    pub fn with_gate(mut self, gate: Arc<dyn PreprocessingGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn subscribe(&self) -> watch::Receiver<ExportState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> ExportState {
        self.state.borrow().clone()
    }

    /// Ask the running export to stop. Returns whether one was running.
    pub fn cancel_export(&self) -> bool {
        match self.lock_cancel().as_ref() {
            Some(flag) => {
                tracing::info!("Export cancellation requested");
                flag.store(true, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }

    /// Run one export to completion.
    ///
    /// Cancellation is reported as `Ok(ExportOutcome::Cancelled)`.
    pub async fn export(&self, request: ExportRequest) -> Result<ExportOutcome, ExportError> {
        let mut active = self.claim()?;
        let result = self.run(request, &active.cancel).await;
        active.settled = true;
        drop(active);

        let terminal = match &result {
            Ok(ExportOutcome::Finished(path)) => ExportState::Succeeded(path.clone()),
            Ok(ExportOutcome::Cancelled) => ExportState::Cancelled,
            Err(e) => {
                tracing::error!(error = %e, "Export failed");
                ExportState::Failed(e.to_string())
            }
        };
        self.state.send_replace(terminal);
        result
    }

    async fn run(
        &self,
        request: ExportRequest,
        cancel: &Arc<AtomicBool>,
    ) -> Result<ExportOutcome, ExportError> {
        let output_path = request.output_path.clone();
        tracing::info!(
            output = %output_path.display(),
            format = ?request.project.export.format,
            backend = self.backend.name(),
            "Starting export"
        );
        self.state.send_replace(ExportState::Exporting {
            progress: 0.0,
            eta_secs: None,
        });

        if self.wait_for_preprocessing(cancel).await.is_err() {
            return Ok(ExportOutcome::Cancelled);
        }

        let (sources, duration_secs) = resolve_sources(&request.project_root, &request.project)?;
        let instructions = RenderInstructions::resolve(
            &request.snapshot,
            request.cursor,
            sources,
            request.project.export.clone(),
            duration_secs,
            output_path.clone(),
        );
        if instructions.output_duration() <= 0.0 {
            return Err(ExportError::InvalidTimeline(
                "nothing is kept after trimming".to_string(),
            ));
        }
        tracing::debug!(
            segments = instructions.trim.segments.len(),
            legacy_trim = instructions.trim.from_legacy,
            output_secs = instructions.output_duration(),
            frames = instructions.total_frames(),
            zoom_keyframes = instructions.zoom.keyframes.len(),
            camera_custom = instructions.camera.custom.len(),
            spotlights = instructions.spotlights.len(),
            "Resolved render instructions"
        );

        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ExportError::Renderer(format!(
                    "failed to create output directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let instructions = Arc::new(instructions);
        let backend = self.backend.clone();
        let state = self.state.clone();
        let flag = cancel.clone();
        let task_instructions = instructions.clone();
        let joined = tokio::task::spawn_blocking(move || {
            let eta = EtaEstimator::start();
            let report = |p: ExportProgress| {
                let progress = p.progress.clamp(0.0, 1.0);
                let eta_secs = p.eta_secs.or_else(|| eta.eta_now(progress));
                state.send_replace(ExportState::Exporting { progress, eta_secs });
            };
            backend.render(&task_instructions, &report, &flag)
        })
        .await;

        let rendered = match joined {
            Ok(result) => result,
            Err(e) => Err(ExportError::Renderer(format!("render task failed: {e}"))),
        };

        match rendered {
            Ok(path) if !cancel.load(Ordering::SeqCst) => {
                if request.project.export.subtitle_sidecars && !instructions.captions.is_empty() {
                    // Detached: sidecar failures are logged, never surfaced.
                    let _ = spawn_subtitle_sidecars(&path, instructions.captions.clone());
                }
                tracing::info!(output = %path.display(), "Export finished");
                Ok(ExportOutcome::Finished(path))
            }
            Ok(_) | Err(ExportError::Cancelled) => {
                remove_partial_output(&output_path);
                tracing::info!(output = %output_path.display(), "Export cancelled");
                Ok(ExportOutcome::Cancelled)
            }
            Err(e) => Err(e),
        }
    }

    /// Poll the preprocessing gate until it is idle. `Err` on cancellation.
    async fn wait_for_preprocessing(&self, cancel: &AtomicBool) -> Result<(), ExportError> {
        let Some(gate) = &self.gate else {
            return Ok(());
        };
        if gate.is_busy() {
            tracing::info!(
                poll_ms = self.poll_interval.as_millis() as u64,
                "Waiting for preprocessing to finish"
            );
        }
        while gate.is_busy() {
            if cancel.load(Ordering::SeqCst) {
                return Err(ExportError::Cancelled);
            }
            tokio::time::sleep(self.poll_interval).await;
        }
        if cancel.load(Ordering::SeqCst) {
            return Err(ExportError::Cancelled);
        }
        Ok(())
    }

    fn claim(&self) -> Result<ActiveExport<'_>, ExportError> {
        let mut slot = self.lock_cancel();
        if slot.is_some() {
            return Err(ExportError::Busy);
        }
        let cancel = Arc::new(AtomicBool::new(false));
        *slot = Some(cancel.clone());
        Ok(ActiveExport {
            exporter: self,
            cancel,
            settled: false,
        })
    }

    fn lock_cancel(&self) -> MutexGuard<'_, Option<Arc<AtomicBool>>> {
        self.cancel.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// The exporter's claim on its single export slot.
///
/// Dropping it frees the slot. If the export future is dropped before it
/// settles, the render is told to stop and the state becomes `Cancelled`.
struct ActiveExport<'a> {
    exporter: &'a Exporter,
    cancel: Arc<AtomicBool>,
    settled: bool,
}

impl Drop for ActiveExport<'_> {
    fn drop(&mut self) {
        *self.exporter.lock_cancel() = None;
        if !self.settled {
            self.cancel.store(true, Ordering::SeqCst);
            self.exporter.state.send_replace(ExportState::Cancelled);
            tracing::info!("Export abandoned before it finished");
        }
    }
}

fn remove_partial_output(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "Removed partial export"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(error = %e, path = %path.display(), "Failed to remove partial export"),
    }
}

/// Check that every referenced source exists and resolve their paths.
///
/// Returns the source paths and the primary video duration.
pub fn resolve_sources(root: &Path, project: &Project) -> Result<(SourcePaths, f64), ExportError> {
    let tracks = &project.tracks;
    let screen_track = tracks.screen.as_ref().ok_or_else(|| ExportError::MissingSource {
        label: "Screen".to_string(),
        path: root.join("sources"),
    })?;
    let screen = check_source(root, "Screen", screen_track)?;

    let optional = |label: &str, track: &Option<TrackRef>| -> Result<Option<PathBuf>, ExportError> {
        track
            .as_ref()
            .map(|t| check_source(root, label, t))
            .transpose()
    };
    let webcam = optional("Webcam", &tracks.webcam)?;
    let system_audio = optional("System audio", &tracks.system_audio)?;
    let mic = optional("Microphone", &tracks.mic)?;
    let denoised_mic = optional("Denoised microphone", &tracks.denoised_mic)?;

    let duration_secs = screen_track.duration_secs;
    if duration_secs.is_nan() || duration_secs <= 0.0 {
        return Err(ExportError::InvalidTimeline(format!(
            "screen track {} has no duration",
            screen_track.path
        )));
    }
    let webcam_drift = tracks
        .webcam
        .as_ref()
        .map(|t| t.drift_ratio(duration_secs))
        .unwrap_or(1.0);

    Ok((
        SourcePaths {
            screen,
            webcam,
            webcam_drift,
            system_audio,
            microphone: denoised_mic.or(mic),
        },
        duration_secs,
    ))
}

fn check_source(root: &Path, label: &str, track: &TrackRef) -> Result<PathBuf, ExportError> {
    let path = root.join(&track.path);
    if !path.exists() {
        return Err(ExportError::MissingSource {
            label: label.to_string(),
            path,
        });
    }
    if let Err(source) = std::fs::File::open(&path) {
        return Err(ExportError::UnreadableSource {
            label: label.to_string(),
            path,
            source,
        });
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reframe_audio_ai::JobSlot;
    use reframe_project_model::project::Caption;
    use std::sync::atomic::AtomicUsize;

    /// Writes a placeholder output and reports progress in steps.
    struct FakeBackend {
        steps: usize,
        step_delay: Duration,
        fail_with: Option<String>,
        started: Arc<AtomicBool>,
        renders: Arc<AtomicUsize>,
    }

    impl FakeBackend {
        fn new(steps: usize, step_delay: Duration) -> Self {
            Self {
                steps,
                step_delay,
                fail_with: None,
                started: Arc::new(AtomicBool::new(false)),
                renders: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl RenderBackend for FakeBackend {
        fn render(
            &self,
            instructions: &RenderInstructions,
            progress: &dyn Fn(ExportProgress),
            cancel: &AtomicBool,
        ) -> Result<PathBuf, ExportError> {
            self.started.store(true, Ordering::SeqCst);
            self.renders.fetch_add(1, Ordering::SeqCst);
            std::fs::write(&instructions.output_path, b"partial")
                .map_err(|e| ExportError::Renderer(e.to_string()))?;
            for step in 1..=self.steps {
                if cancel.load(Ordering::SeqCst) {
                    return Err(ExportError::Cancelled);
                }
                std::thread::sleep(self.step_delay);
                progress(ExportProgress {
                    progress: step as f64 / self.steps as f64,
                    frames_rendered: step as u64,
                    total_frames: self.steps as u64,
                    eta_secs: None,
                });
            }
            if let Some(message) = &self.fail_with {
                return Err(ExportError::Renderer(message.clone()));
            }
            Ok(instructions.output_path.clone())
        }

        fn is_available(&self) -> bool {
            true
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    fn temp_project(name: &str) -> LoadedProject {
        let dir = std::env::temp_dir().join(format!(
            "reframe_export_test_{name}_{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        let mut loaded = LoadedProject::create(&dir, name, 1280, 720, 30).unwrap();
        std::fs::write(dir.join("sources/screen.mkv"), b"video").unwrap();
        loaded.project.tracks.screen = Some(TrackRef::new("sources/screen.mkv", 4.0));
        loaded.editor = EditorSnapshot::for_duration(4.0);
        loaded.save().unwrap();
        loaded
    }

    fn request_for(loaded: &LoadedProject) -> ExportRequest {
        ExportRequest::from_loaded(loaded, ExportRequest::default_output_path(loaded))
    }

    #[tokio::test]
    async fn test_successful_export_publishes_succeeded() {
        let loaded = temp_project("success");
        let exporter = Exporter::new(Arc::new(FakeBackend::new(4, Duration::from_millis(1))));
        let rx = exporter.subscribe();
        let request = request_for(&loaded);
        let output = request.output_path.clone();

        let outcome = exporter.export(request).await.unwrap();
        assert_eq!(outcome, ExportOutcome::Finished(output.clone()));
        assert_eq!(*rx.borrow(), ExportState::Succeeded(output.clone()));
        assert!(output.exists());
        assert!(!exporter.cancel_export());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cancel_removes_partial_output() {
        let loaded = temp_project("cancel");
        let backend = FakeBackend::new(10_000, Duration::from_millis(2));
        let started = backend.started.clone();
        let exporter = Arc::new(Exporter::new(Arc::new(backend)));
        let request = request_for(&loaded);
        let output = request.output_path.clone();

        let running = {
            let exporter = exporter.clone();
            tokio::spawn(async move { exporter.export(request).await })
        };
        while !started.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        assert!(exporter.state().is_running());
        assert!(exporter.cancel_export());

        let outcome = running.await.unwrap().unwrap();
        assert_eq!(outcome, ExportOutcome::Cancelled);
        assert_eq!(exporter.state(), ExportState::Cancelled);
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_missing_source_fails_without_touching_state() {
        let mut loaded = temp_project("missing");
        loaded.project.tracks.webcam = Some(TrackRef::new("sources/webcam.mkv", 4.0));
        loaded.save().unwrap();
        let before = LoadedProject::load(&loaded.root).unwrap();

        let backend = FakeBackend::new(1, Duration::ZERO);
        let renders = backend.renders.clone();
        let exporter = Exporter::new(Arc::new(backend));
        let err = exporter.export(request_for(&loaded)).await.unwrap_err();

        assert!(matches!(err, ExportError::MissingSource { ref label, .. } if label == "Webcam"));
        assert!(matches!(exporter.state(), ExportState::Failed(ref m) if m.contains("Webcam")));
        assert_eq!(renders.load(Ordering::SeqCst), 0);
        let after = LoadedProject::load(&loaded.root).unwrap();
        assert_eq!(after.editor, before.editor);
        assert_eq!(after.project, before.project);
    }

    #[tokio::test]
    async fn test_renderer_failure_is_reported() {
        let loaded = temp_project("renderfail");
        let mut backend = FakeBackend::new(1, Duration::ZERO);
        backend.fail_with = Some("encoder exploded".to_string());
        let exporter = Exporter::new(Arc::new(backend));

        let err = exporter.export(request_for(&loaded)).await.unwrap_err();
        assert!(matches!(err, ExportError::Renderer(ref m) if m == "encoder exploded"));
        assert_eq!(
            exporter.state(),
            ExportState::Failed("Renderer failed: encoder exploded".to_string())
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_waits_for_preprocessing_gate() {
        let loaded = temp_project("gate");
        let mut slot: JobSlot<()> = JobSlot::new("denoise");
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
        slot.replace(move |_| {
            let _ = release_rx.recv_timeout(Duration::from_secs(5));
            Ok(())
        });

        let backend = FakeBackend::new(1, Duration::ZERO);
        let started = backend.started.clone();
        let exporter = Arc::new(
            Exporter::new(Arc::new(backend))
                .with_gate(Arc::new(slot.busy_probe()))
                .with_poll_interval(Duration::from_millis(5)),
        );
        let request = request_for(&loaded);
        let running = {
            let exporter = exporter.clone();
            tokio::spawn(async move { exporter.export(request).await })
        };

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(!started.load(Ordering::SeqCst));
        assert_eq!(
            exporter.state(),
            ExportState::Exporting {
                progress: 0.0,
                eta_secs: None
            }
        );

        release_tx.send(()).unwrap();
        slot.wait().await.unwrap().unwrap();
        let outcome = running.await.unwrap().unwrap();
        assert!(matches!(outcome, ExportOutcome::Finished(_)));
        assert!(started.load(Ordering::SeqCst));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cancel_while_waiting_for_gate() {
        let loaded = temp_project("gatecancel");
        let mut slot: JobSlot<()> = JobSlot::new("denoise");
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
        slot.replace(move |_| {
            let _ = release_rx.recv_timeout(Duration::from_secs(5));
            Ok(())
        });

        let backend = FakeBackend::new(1, Duration::ZERO);
        let renders = backend.renders.clone();
        let exporter = Arc::new(
            Exporter::new(Arc::new(backend))
                .with_gate(Arc::new(slot.busy_probe()))
                .with_poll_interval(Duration::from_millis(5)),
        );
        let request = request_for(&loaded);
        let running = {
            let exporter = exporter.clone();
            tokio::spawn(async move { exporter.export(request).await })
        };

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(exporter.cancel_export());
        let outcome = running.await.unwrap().unwrap();
        assert_eq!(outcome, ExportOutcome::Cancelled);
        assert_eq!(renders.load(Ordering::SeqCst), 0);

        release_tx.send(()).unwrap();
        slot.wait().await.unwrap().unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_abandoned_export_frees_the_slot() {
        let loaded = temp_project("abandoned");
        let mut slot: JobSlot<()> = JobSlot::new("denoise");
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
        slot.replace(move |_| {
            let _ = release_rx.recv_timeout(Duration::from_secs(5));
            Ok(())
        });

        let exporter = Exporter::new(Arc::new(FakeBackend::new(1, Duration::ZERO)))
            .with_gate(Arc::new(slot.busy_probe()))
            .with_poll_interval(Duration::from_millis(5));

        let timed_out =
            tokio::time::timeout(Duration::from_millis(30), exporter.export(request_for(&loaded)))
                .await;
        assert!(timed_out.is_err());
        assert_eq!(exporter.state(), ExportState::Cancelled);
        assert!(!exporter.cancel_export());

        release_tx.send(()).unwrap();
        slot.wait().await.unwrap().unwrap();

        let outcome = exporter.export(request_for(&loaded)).await.unwrap();
        assert!(matches!(outcome, ExportOutcome::Finished(_)));
        assert!(matches!(exporter.state(), ExportState::Succeeded(_)));
    }

    #[tokio::test]
    async fn test_success_writes_subtitle_sidecars() {
        let mut loaded = temp_project("sidecars");
        loaded.editor.captions = vec![Caption {
            start_secs: 0.5,
            end_secs: 1.5,
            text: "Hello".to_string(),
        }];
        let exporter = Exporter::new(Arc::new(FakeBackend::new(1, Duration::ZERO)));
        let request = request_for(&loaded);
        let srt = request.output_path.with_extension("srt");
        let vtt = request.output_path.with_extension("vtt");

        exporter.export(request).await.unwrap();
        for _ in 0..200 {
            if srt.exists() && vtt.exists() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(std::fs::read_to_string(&srt).unwrap().contains("Hello"));
        assert!(std::fs::read_to_string(&vtt).unwrap().starts_with("WEBVTT"));
    }

    #[test]
    fn test_default_output_path_sanitizes_name() {
        let mut loaded = temp_project("naming");
        loaded.project.name = "My demo/take 2".to_string();
        let path = ExportRequest::default_output_path(&loaded);
        assert_eq!(path, loaded.root.join("exports/My_demo_take_2.mp4"));
    }
}
