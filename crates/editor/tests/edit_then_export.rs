//! Edits made through a session reach the renderer as resolved instructions.

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use reframe_common::config::EditorDefaults;
use reframe_editor::EditorSession;
use reframe_project_model::{EditorSnapshot, LoadedProject, TimeRange, TrackKind, TrackRef};
use reframe_render_engine::{
    ExportError, ExportOutcome, ExportProgress, Exporter, RenderBackend, RenderInstructions,
};

#[derive(Default)]
struct CapturingBackend {
    seen: Mutex<Vec<(f64, Vec<TimeRange>)>>,
}

impl RenderBackend for CapturingBackend {
    fn render(
        &self,
        instructions: &RenderInstructions,
        progress: &dyn Fn(ExportProgress),
        _cancel: &AtomicBool,
    ) -> Result<PathBuf, ExportError> {
        self.seen.lock().unwrap().push((
            instructions.output_duration(),
            instructions.system_audio.muted.clone(),
        ));
        progress(ExportProgress {
            progress: 1.0,
            frames_rendered: instructions.total_frames(),
            total_frames: instructions.total_frames(),
            eta_secs: Some(0.0),
        });
        std::fs::write(&instructions.output_path, b"rendered")
            .map_err(|e| ExportError::Renderer(e.to_string()))?;
        Ok(instructions.output_path.clone())
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "capture"
    }
}

fn project_with_screen(name: &str, duration: f64) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("reframe_editor_it_{name}_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    let mut loaded = LoadedProject::create(&dir, name, 640, 360, 10).unwrap();
    std::fs::write(dir.join("sources/screen.mkv"), b"video").unwrap();
    loaded.project.tracks.screen = Some(TrackRef::new("sources/screen.mkv", duration));
    loaded.editor = EditorSnapshot::for_duration(duration);
    loaded.save().unwrap();
    dir
}

#[tokio::test]
async fn cuts_and_audio_windows_reach_the_renderer() {
    let root = project_with_screen("cuts", 60.0);
    let mut session = EditorSession::open(&root, &EditorDefaults::default()).unwrap();

    let first = session.add_region(TrackKind::VideoCut, 10.0).unwrap();
    session.add_region(TrackKind::VideoCut, 40.0).unwrap();
    session.update_region_end(TrackKind::VideoCut, first, 12.0);
    session.add_region(TrackKind::SystemAudio, 30.0).unwrap();

    assert_eq!(
        session.windows().kept,
        vec![TimeRange::new(5.0, 12.0), TimeRange::new(35.0, 45.0)]
    );

    let backend = Arc::new(CapturingBackend::default());
    let exporter = Exporter::new(backend.clone())
        .with_gate(Arc::new(session.preprocessing_gate()))
        .with_poll_interval(Duration::from_millis(5));

    let request = session.export_request(Some(root.join("exports/out.mp4")));
    let outcome = exporter.export(request).await.unwrap();
    assert_eq!(outcome, ExportOutcome::Finished(root.join("exports/out.mp4")));

    let seen = backend.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert!((seen[0].0 - 17.0).abs() < 1e-9);
    assert_eq!(
        seen[0].1,
        vec![TimeRange::new(0.0, 25.0), TimeRange::new(35.0, 60.0)]
    );

    let _ = std::fs::remove_dir_all(&root);
}

#[tokio::test]
async fn exporting_does_not_touch_editable_state() {
    let root = project_with_screen("readonly", 20.0);
    let mut session = EditorSession::open(&root, &EditorDefaults::default()).unwrap();
    session.add_region(TrackKind::Spotlight, 5.0);
    session.poll(Instant::now() + Duration::from_secs(5));
    let before = session.snapshot();
    let history_len = session.history().len();

    std::fs::remove_file(root.join("sources/screen.mkv")).unwrap();
    let exporter = Exporter::new(Arc::new(CapturingBackend::default()));
    let err = exporter.export(session.export_request(None)).await.unwrap_err();
    assert!(matches!(err, ExportError::MissingSource { .. }));

    assert_eq!(session.snapshot(), before);
    assert_eq!(session.history().len(), history_len);
    assert!(!session.is_dirty());

    let _ = std::fs::remove_dir_all(&root);
}
