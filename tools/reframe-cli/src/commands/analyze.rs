//! Generate auto-zoom keyframes from a project's recorded clicks.

use std::path::PathBuf;

use reframe_common::config::AppConfig;
use reframe_editor::EditorSession;
use reframe_processing_core::AutoZoomConfig;

pub fn run(
    path: PathBuf,
    config: &AppConfig,
    zoom_level: f64,
    dwell_secs: f64,
    transition_secs: f64,
    json: bool,
) -> anyhow::Result<()> {
    println!("Analyzing project at: {}", path.display());

    let mut session = EditorSession::open(&path, &config.editor)
        .map_err(|e| anyhow::anyhow!("Failed to load project: {e}"))?;

    let clicks = session.cursor().clicks.len();
    println!("  Loaded {clicks} clicks");
    if clicks == 0 {
        println!("  No clicks to analyze. Auto zoom cleared.");
    }

    let report = session.run_auto_zoom(AutoZoomConfig {
        zoom_level,
        dwell_threshold_secs: dwell_secs,
        transition_duration_secs: transition_secs,
    });

    session
        .flush()
        .map_err(|e| anyhow::anyhow!("Failed to save project: {e}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("  Zoom regions: {}", report.regions.len());
    for region in &report.regions {
        println!(
            "    {:>7.2}s - {:>7.2}s  {} click(s) around ({:.2}, {:.2})",
            region.start_secs,
            region.end_secs,
            region.click_count,
            region.centroid.x,
            region.centroid.y
        );
    }
    println!("  Keyframes added: {}", report.keyframes_added);
    if report.manual_keyframes_dropped > 0 {
        println!(
            "  Manual keyframes replaced: {}",
            report.manual_keyframes_dropped
        );
    }
    println!("\nAnalysis saved to {}", session.project().editor_path().display());

    Ok(())
}
