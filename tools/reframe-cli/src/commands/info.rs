//! Show project information.

use std::path::PathBuf;

use reframe_common::config::AppConfig;
use reframe_editor::EditorSession;
use reframe_project_model::TrackKind;

pub fn run(path: PathBuf, config: &AppConfig) -> anyhow::Result<()> {
    let session = EditorSession::open(&path, &config.editor)
        .map_err(|e| anyhow::anyhow!("Failed to load project: {e}"))?;

    let loaded = session.project();
    let p = &loaded.project;

    println!("Project: {}", p.name);
    println!("  ID: {}", p.id);
    println!("  Created: {}", p.created_at);
    println!("  Modified: {}", p.modified_at);
    println!();

    println!("Recording:");
    println!(
        "  Resolution: {}x{} @ {}fps",
        p.recording.capture_width, p.recording.capture_height, p.recording.fps
    );
    println!("  Scale factor: {}", p.recording.scale_factor);
    println!("  Duration: {:.1}s", session.duration_secs());
    println!();

    println!("Tracks:");
    for (label, track) in p.tracks.referenced() {
        println!("  {label}: {} ({:.1}s)", track.path, track.duration_secs);
    }
    println!();

    println!("Editor:");
    let trim = session.trim();
    println!("  Trim: {:.2}s - {:.2}s", trim.start_secs, trim.end_secs);
    for kind in TrackKind::ALL {
        println!("  {} regions: {}", kind.label(), session.track(kind).region_count());
    }
    let kept: f64 = session.windows().kept.iter().map(|r| r.duration()).sum();
    println!("  Kept duration: {:.1}s", kept);
    println!(
        "  Zoom: {} keyframes in {} regions",
        session.zoom_timeline().len(),
        session.zoom_regions().len()
    );
    let cursor = session.snapshot().cursor;
    println!(
        "  Cursor smoothing: {} ({})",
        if cursor.smoothing_enabled { "on" } else { "off" },
        cursor.speed.name()
    );
    println!("  Captions: {}", session.captions().len());
    println!(
        "  History: {} entries (current {})",
        session.history().len(),
        session
            .history()
            .current_index()
            .map(|i| i.to_string())
            .unwrap_or_else(|| "-".to_string())
    );
    println!();

    println!("Export config:");
    println!("  Format: {:?}", p.export.format);
    println!(
        "  Output: {}x{} @ {}fps",
        p.export.width, p.export.height, p.export.fps
    );
    println!("  Subtitle files: {}", p.export.subtitle_sidecars);

    Ok(())
}
