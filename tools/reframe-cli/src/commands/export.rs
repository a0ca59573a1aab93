//! Export a project to video.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reframe_common::clock::secs_to_duration;
use reframe_common::config::AppConfig;
use reframe_editor::EditorSession;
use reframe_project_model::ExportFormat;
use reframe_render_engine::{ExportOutcome, ExportState, Exporter, FfmpegBackend, RenderBackend};

/// Command-line overrides of the project's export settings.
pub struct ExportOverrides {
    pub output: Option<PathBuf>,
    pub format: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fps: Option<u32>,
    pub no_subtitles: bool,
    pub debug_report: bool,
}

pub async fn run(path: PathBuf, config: &AppConfig, overrides: ExportOverrides) -> anyhow::Result<()> {
    println!("Exporting project at: {}", path.display());

    let session = EditorSession::open(&path, &config.editor)
        .map_err(|e| anyhow::anyhow!("Failed to load project: {e}"))?;

    let custom_output = overrides.output.is_some();
    let mut request = session.export_request(overrides.output);
    let settings = &mut request.project.export;
    if let Some(name) = overrides.format.as_deref() {
        settings.format = ExportFormat::from_name(name).ok_or_else(|| {
            anyhow::anyhow!("Unknown format: {name}. Use: mp4-h264, mp4-h265, webm, gif")
        })?;
    }
    if let Some(width) = overrides.width {
        settings.width = width;
    }
    if let Some(height) = overrides.height {
        settings.height = height;
    }
    if let Some(fps) = overrides.fps {
        settings.fps = fps;
    }
    if overrides.no_subtitles {
        settings.subtitle_sidecars = false;
    }
    if !custom_output {
        request
            .output_path
            .set_extension(request.project.export.format.extension());
    }

    let backend = FfmpegBackend::default().with_debug_report(overrides.debug_report);
    if !backend.is_available() {
        anyhow::bail!("ffmpeg was not found on PATH; install it to export");
    }

    let export = &request.project.export;
    println!("  Output: {}", request.output_path.display());
    println!("  Format: {:?}", export.format);
    println!("  Resolution: {}x{} @ {}fps", export.width, export.height, export.fps);

    let exporter = Exporter::new(Arc::new(backend))
        .with_gate(Arc::new(session.preprocessing_gate()))
        .with_poll_interval(Duration::from_millis(config.export.poll_interval_ms));
    let mut progress = exporter.subscribe();

    let export = exporter.export(request);
    tokio::pin!(export);

    let result = loop {
        tokio::select! {
            result = &mut export => break result,
            changed = progress.changed() => {
                if changed.is_ok() {
                    let state = progress.borrow_and_update().clone();
                    print_progress(&state);
                }
            }
            signal = tokio::signal::ctrl_c() => {
                if signal.is_ok() && exporter.cancel_export() {
                    println!("\n  Cancelling...");
                }
            }
        }
    };

    match result {
        Ok(ExportOutcome::Finished(output)) => {
            println!("\nExport complete: {}", output.display());
            Ok(())
        }
        Ok(ExportOutcome::Cancelled) => {
            println!("\nExport cancelled.");
            Ok(())
        }
        Err(e) => Err(anyhow::anyhow!("Export failed: {e}")),
    }
}

fn print_progress(state: &ExportState) {
    if let ExportState::Exporting { progress, eta_secs } = state {
        let eta = eta_secs
            .map(format_eta)
            .unwrap_or_else(|| "--:--".to_string());
        print!("\r  Progress: {:5.1}% (ETA {eta})  ", progress * 100.0);
        let _ = std::io::stdout().flush();
    }
}

fn format_eta(secs: f64) -> String {
    let total = secs_to_duration(secs).as_secs();
    format!("{}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_eta() {
        assert_eq!(format_eta(0.0), "0:00");
        assert_eq!(format_eta(75.4), "1:15");
        assert_eq!(format_eta(-3.0), "0:00");
        assert_eq!(format_eta(f64::NAN), "0:00");
    }
}
