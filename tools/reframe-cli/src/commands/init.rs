//! Create a new Reframe project from recorded media.

use std::path::{Path, PathBuf};

use reframe_common::config::AppConfig;
use reframe_project_model::{
    AudioGain, CursorMetadata, CursorSpeed, EditorSnapshot, ExportFormat, LoadedProject, Region,
    RegionTrack, TrackRef,
};
use reframe_render_engine::ffmpeg::{probe_media_duration, probe_video_dimensions};

pub struct InitArgs {
    pub name: String,
    pub output: PathBuf,
    pub screen: Option<PathBuf>,
    pub webcam: Option<PathBuf>,
    pub mic: Option<PathBuf>,
    pub system_audio: Option<PathBuf>,
    pub cursor: Option<PathBuf>,
    pub duration: Option<f64>,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

pub fn run(args: InitArgs, config: &AppConfig) -> anyhow::Result<()> {
    let project_dir = args.output.join(&args.name);
    println!("Creating project '{}' at {}", args.name, project_dir.display());

    let (width, height) = args
        .screen
        .as_deref()
        .and_then(probe_video_dimensions)
        .unwrap_or((args.width, args.height));

    let mut project = LoadedProject::create(&project_dir, &args.name, width, height, args.fps)
        .map_err(|e| anyhow::anyhow!("Failed to create project: {e}"))?;

    let export = &mut project.project.export;
    export.width = config.export.width;
    export.height = config.export.height;
    export.fps = config.export.fps;
    if let Some(format) = ExportFormat::from_name(&config.export.format) {
        export.format = format;
    }

    if let Some(screen) = &args.screen {
        let track = import_source(&project, screen, "screen", args.duration)?;
        project.project.tracks.screen = Some(track);
    }
    let screen_duration = args.duration.or_else(|| {
        project
            .project
            .tracks
            .screen
            .as_ref()
            .map(|t| t.duration_secs)
    });

    if let Some(webcam) = &args.webcam {
        let track = import_source(&project, webcam, "webcam", screen_duration)?;
        project.project.tracks.webcam = Some(track);
    }
    if let Some(mic) = &args.mic {
        let track = import_source(&project, mic, "mic", screen_duration)?;
        project.project.tracks.mic = Some(track);
    }
    if let Some(system_audio) = &args.system_audio {
        let track = import_source(&project, system_audio, "system_audio", screen_duration)?;
        project.project.tracks.system_audio = Some(track);
    }

    if let Some(cursor) = &args.cursor {
        let target = project.cursor_path();
        std::fs::copy(cursor, &target)
            .map_err(|e| anyhow::anyhow!("Failed to copy cursor stream {}: {e}", cursor.display()))?;
        project.cursor = CursorMetadata::load(&target)
            .map_err(|e| anyhow::anyhow!("Invalid cursor stream: {e}"))?;
    }

    let duration = project.project.duration_secs();
    let mut editor = EditorSnapshot::for_duration(duration);
    if let Some(speed) = CursorSpeed::from_name(&config.editor.cursor_speed) {
        editor.cursor.speed = speed;
    }
    if project.project.tracks.system_audio.is_some() {
        editor.system_audio = audible_throughout(duration);
    }
    if project.project.tracks.mic.is_some() {
        editor.microphone = audible_throughout(duration);
    }
    project.editor = editor;
    project
        .save()
        .map_err(|e| anyhow::anyhow!("Failed to save project: {e}"))?;

    println!("Project created successfully:");
    println!("  Directory: {}", project.root.display());
    println!("  Resolution: {}x{} @ {}fps", width, height, args.fps);
    println!("  Duration: {:.1}s", duration);
    for (label, track) in project.project.tracks.referenced() {
        println!("  {label}: {}", track.path);
    }
    println!("  Cursor samples: {}", project.cursor.samples.len());
    println!();
    println!("Directory structure:");
    println!("  {}/", args.name);
    println!("  ├── sources/     (recorded media)");
    println!("  ├── meta/        (project.json, editor.json, history.json, cursor.jsonl)");
    println!("  ├── cache/       (denoised audio)");
    println!("  └── exports/     (rendered output)");

    Ok(())
}

/// Copy `source` into the project's `sources/` dir as `<stem>.<ext>`.
fn import_source(
    project: &LoadedProject,
    source: &Path,
    stem: &str,
    fallback_duration: Option<f64>,
) -> anyhow::Result<TrackRef> {
    if !source.exists() {
        anyhow::bail!("Source not found: {}", source.display());
    }
    let ext = source.extension().and_then(|e| e.to_str()).unwrap_or("bin");
    let relative = format!("sources/{stem}.{ext}");

    std::fs::copy(source, project.root.join(&relative))
        .map_err(|e| anyhow::anyhow!("Failed to copy {}: {e}", source.display()))?;

    let duration = probe_media_duration(source)
        .or(fallback_duration)
        .ok_or_else(|| {
            anyhow::anyhow!(
                "Could not determine the duration of {}; pass --duration",
                source.display()
            )
        })?;
    tracing::debug!(source = %source.display(), duration, "Imported source");

    Ok(TrackRef::new(relative, duration))
}

/// One region spanning the whole recording, so the track starts unmuted.
fn audible_throughout(duration_secs: f64) -> Vec<Region<AudioGain>> {
    let mut track = RegionTrack::new(duration_secs);
    track.insert(0.0, duration_secs, AudioGain::default());
    track.into_regions()
}
