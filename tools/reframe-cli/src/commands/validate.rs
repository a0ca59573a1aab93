//! Validate a Reframe project bundle.

use std::path::PathBuf;

use reframe_project_model::{LoadedProject, Region, RegionPayload, RegionTrack, TrackKind};

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    println!("Validating project at: {}", path.display());

    let project =
        LoadedProject::load(&path).map_err(|e| anyhow::anyhow!("Failed to load project: {e}"))?;

    let duration = project.project.duration_secs();
    println!("  Name: {}", project.project.name);
    println!("  Version: {}", project.project.version);
    println!(
        "  Resolution: {}x{}",
        project.project.recording.capture_width, project.project.recording.capture_height
    );
    println!("  FPS: {}", project.project.recording.fps);
    println!("  Duration: {:.1}s", duration);

    let mut errors = project.validate_sources();

    let editor = &project.editor;
    let tracks = [
        (TrackKind::VideoCut, is_normalized(TrackKind::VideoCut, duration, &editor.video_cuts)),
        (
            TrackKind::SystemAudio,
            is_normalized(TrackKind::SystemAudio, duration, &editor.system_audio),
        ),
        (
            TrackKind::Microphone,
            is_normalized(TrackKind::Microphone, duration, &editor.microphone),
        ),
        (TrackKind::Camera, is_normalized(TrackKind::Camera, duration, &editor.camera)),
        (TrackKind::Spotlight, is_normalized(TrackKind::Spotlight, duration, &editor.spotlight)),
    ];
    for (kind, ok) in tracks {
        if !ok {
            errors.push(format!(
                "{} regions overlap or fall outside the recording",
                kind.label()
            ));
        }
    }

    if editor.trim.end_secs > duration + f64::EPSILON || editor.trim.start_secs < 0.0 {
        errors.push(format!(
            "Trim {:.2}s-{:.2}s exceeds the recording",
            editor.trim.start_secs, editor.trim.end_secs
        ));
    }

    if errors.is_empty() {
        println!("  Sources: All present");
        println!("\nProject is valid.");
    } else {
        println!("\nValidation issues:");
        for error in &errors {
            println!("  - {error}");
        }
        println!(
            "\n{} issue(s) found. Project may not be fully usable.",
            errors.len()
        );
    }

    Ok(())
}

/// Whether loading `regions` into a track would keep them unchanged.
fn is_normalized<P: RegionPayload>(
    kind: TrackKind,
    duration_secs: f64,
    regions: &[Region<P>],
) -> bool {
    RegionTrack::from_regions_as(kind, duration_secs, regions.to_vec()).regions() == regions
}
