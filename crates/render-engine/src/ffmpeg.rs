//! ffmpeg CLI render backend.
//!
//! Builds one `-filter_complex` graph from [`RenderInstructions`]:
//!
//! ```text
//! screen ── fps ── zoompan (piecewise zoom rect) ──┐
//! webcam ── setpts (drift) ── split ── scale ──────┴── overlay(enable=..) ... ── select (kept segments) ── [vout]
//! system audio ── volume(windows) ──┐
//! microphone   ── volume(windows) ──┴── amix ── aselect (kept segments) ── [aout]
//! ```

use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use reframe_common::clock::EtaEstimator;
use reframe_project_model::project::{ExportFormat, ExportSettings};
use reframe_project_model::region::TimeRange;
use reframe_project_model::viewport::Viewport;

use crate::compositor::{compute_compositions, AudioPlan, CameraFrame, RenderInstructions};
use crate::export::{ExportError, ExportProgress, RenderBackend};

const MAX_VIEWPORT_EXPR_POINTS: usize = 96;
/// Samples per keyframe interval, so eased zooms survive the linear expression.
const ZOOM_EASE_SAMPLES: usize = 6;
const FOLLOW_SAMPLE_STEP_SECS: f64 = 0.25;
const STALL_WARN_SECS: u64 = 10;
const GIF_FPS: u32 = 15;

/// A fully built ffmpeg invocation.
#[derive(Debug, Clone)]
pub struct FfmpegPlan {
    pub args: Vec<String>,
    pub total_frames: u64,
    pub expected_duration_secs: f64,
    pub debug_report: String,
}

/// Which ffmpeg input index each optional source landed on.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct InputLayout {
    webcam: Option<usize>,
    system_audio: Option<usize>,
    microphone: Option<usize>,
}

/// One gated webcam overlay.
#[derive(Debug, Clone, PartialEq)]
struct OverlaySpec {
    rect: Viewport,
    mirrored: bool,
    enable: String,
}

/// Renders by shelling out to the ffmpeg CLI.
#[derive(Debug, Clone)]
pub struct FfmpegBackend {
    ffmpeg: PathBuf,
    write_debug_report: bool,
}

impl Default for FfmpegBackend {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            write_debug_report: false,
        }
    }
}

impl FfmpegBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_binary(ffmpeg: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ..Self::default()
        }
    }

    /// Also write `<output>.ffmpeg-debug.txt` describing the invocation.
    pub fn with_debug_report(mut self, enabled: bool) -> Self {
        self.write_debug_report = enabled;
        self
    }

    /// Build the ffmpeg arguments for `instructions`.
    pub fn build_plan(&self, instructions: &RenderInstructions) -> Result<FfmpegPlan, ExportError> {
        let plan_started = Instant::now();
        let expected_duration_secs = instructions.output_duration();
        if expected_duration_secs <= 0.0 {
            return Err(ExportError::InvalidTimeline(
                "export duration resolved to zero seconds".to_string(),
            ));
        }
        let export = &instructions.export;
        let sources = &instructions.sources;
        let with_audio = export.format.has_audio();

        let overlays = if sources.webcam.is_some() {
            camera_overlays(instructions)
        } else {
            Vec::new()
        };

        let mut layout = InputLayout::default();
        let mut args = vec![
            "-y".to_string(),
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-nostats".to_string(),
            "-progress".to_string(),
            "pipe:1".to_string(),
            "-i".to_string(),
            sources.screen.display().to_string(),
        ];
        let mut next_input = 1usize;
        let mut add_input = |args: &mut Vec<String>, path: &Path| {
            args.push("-i".to_string());
            args.push(path.display().to_string());
            next_input += 1;
            next_input - 1
        };

        if let Some(webcam) = sources.webcam.as_ref().filter(|_| !overlays.is_empty()) {
            layout.webcam = Some(add_input(&mut args, webcam));
        }
        if with_audio {
            if let Some(path) = sources
                .system_audio
                .as_ref()
                .filter(|_| !instructions.system_audio.is_silent())
            {
                layout.system_audio = Some(add_input(&mut args, path));
            }
            if let Some(path) = sources
                .microphone
                .as_ref()
                .filter(|_| !instructions.microphone.is_silent())
            {
                layout.microphone = Some(add_input(&mut args, path));
            }
        }

        let (filter, has_audio_out) = build_filter_graph(instructions, layout, &overlays);
        let filter_len = filter.len();

        args.push("-filter_complex".to_string());
        args.push(filter);
        args.push("-map".to_string());
        args.push("[vout]".to_string());
        if has_audio_out {
            args.push("-map".to_string());
            args.push("[aout]".to_string());
        } else {
            args.push("-an".to_string());
        }
        if export.format != ExportFormat::Gif {
            args.push("-r".to_string());
            args.push(export.fps.max(1).to_string());
        }
        args.push("-t".to_string());
        args.push(format!("{expected_duration_secs:.6}"));
        args.append(&mut codec_args_for_config(export, has_audio_out));
        args.push(instructions.output_path.display().to_string());

        let total_frames = instructions.total_frames();
        let debug_report = format!(
            "duration_secs={:.3}\nframes={}\nsegments={}\nlegacy_trim={}\nzoom_keyframes={}\nfollow_cursor={}\ncamera_overlays={}\ninputs={:?}\nfilter_len={}\nffmpeg_args={}\nplan_build_ms={}\n",
            expected_duration_secs,
            total_frames,
            instructions.trim.segments.len(),
            instructions.trim.from_legacy,
            instructions.zoom.keyframes.len(),
            instructions.zoom.follow_cursor,
            overlays.len(),
            layout,
            filter_len,
            args.join(" "),
            plan_started.elapsed().as_millis(),
        );

        tracing::debug!(
            duration_secs = expected_duration_secs,
            frames = total_frames,
            segments = instructions.trim.segments.len(),
            camera_overlays = overlays.len(),
            audio = has_audio_out,
            filter_len,
            "Export plan built"
        );

        Ok(FfmpegPlan {
            args,
            total_frames,
            expected_duration_secs,
            debug_report,
        })
    }

    fn run_ffmpeg(
        &self,
        plan: &FfmpegPlan,
        output: &Path,
        progress: &dyn Fn(ExportProgress),
        cancel: &AtomicBool,
    ) -> Result<(), ExportError> {
        tracing::debug!(args = ?plan.args, "Running ffmpeg");
        let started = Instant::now();
        let mut child = Command::new(&self.ffmpeg)
            .args(&plan.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ExportError::Renderer(format!("failed to start ffmpeg: {e}")))?;

        tracing::info!(
            pid = child.id(),
            args_len = plan.args.len(),
            total_frames = plan.total_frames,
            "ffmpeg process started"
        );

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ExportError::Renderer("failed to capture ffmpeg stdout".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ExportError::Renderer("failed to capture ffmpeg stderr".to_string()))?;

        // ffmpeg blocks once its stderr pipe fills up.
        let stderr_task = std::thread::spawn(move || -> String {
            let mut output = String::new();
            match BufReader::new(stderr).read_to_string(&mut output) {
                Ok(_) => output,
                Err(err) => format!("<failed to read ffmpeg stderr: {err}>"),
            }
        });

        let mut reader = BufReader::new(stdout);
        let mut line = String::new();
        let mut state = ProgressState::default();
        let mut last_progress_secs = 0.0f64;
        let mut last_progress_wall = Instant::now();
        loop {
            if cancel.load(Ordering::SeqCst) {
                kill_child(&mut child);
                let _ = stderr_task.join();
                let _ = std::fs::remove_file(output);
                return Err(ExportError::Cancelled);
            }

            line.clear();
            let bytes = reader.read_line(&mut line).map_err(|e| {
                ExportError::Renderer(format!("failed reading ffmpeg progress: {e}"))
            })?;
            if bytes == 0 {
                break;
            }

            let Some((key, value)) = line.trim().split_once('=') else {
                continue;
            };
            state.update(key, value);
            if key != "progress" {
                continue;
            }

            if state.out_time_secs > last_progress_secs + 0.001 {
                last_progress_secs = state.out_time_secs;
                last_progress_wall = Instant::now();
            }
            progress(progress_report(
                &state,
                plan.total_frames,
                plan.expected_duration_secs,
                started.elapsed().as_secs_f64(),
            ));
            if last_progress_wall.elapsed().as_secs() >= STALL_WARN_SECS {
                tracing::warn!(
                    out_time_secs = state.out_time_secs,
                    elapsed_secs = started.elapsed().as_secs_f64(),
                    "No ffmpeg progress advancement for {STALL_WARN_SECS}s"
                );
                last_progress_wall = Instant::now();
            }
        }

        let status = child
            .wait()
            .map_err(|e| ExportError::Renderer(format!("failed to wait on ffmpeg: {e}")))?;
        let stderr_output = stderr_task
            .join()
            .unwrap_or_else(|_| "<failed to join stderr reader>".to_string());

        if cancel.load(Ordering::SeqCst) {
            let _ = std::fs::remove_file(output);
            return Err(ExportError::Cancelled);
        }
        if !status.success() {
            return Err(ExportError::Renderer(format!(
                "ffmpeg export failed (status {status}): {}",
                stderr_output.trim()
            )));
        }

        progress(ExportProgress {
            progress: 1.0,
            frames_rendered: plan.total_frames,
            total_frames: plan.total_frames,
            eta_secs: Some(0.0),
        });
        Ok(())
    }
}

impl RenderBackend for FfmpegBackend {
    fn render(
        &self,
        instructions: &RenderInstructions,
        progress: &dyn Fn(ExportProgress),
        cancel: &AtomicBool,
    ) -> Result<PathBuf, ExportError> {
        let plan = self.build_plan(instructions)?;
        let output = &instructions.output_path;

        if self.write_debug_report {
            let debug_path = output.with_extension("ffmpeg-debug.txt");
            match std::fs::write(&debug_path, &plan.debug_report) {
                Ok(()) => tracing::info!(path = %debug_path.display(), "Wrote ffmpeg debug report"),
                Err(err) => tracing::warn!(
                    error = %err,
                    path = %debug_path.display(),
                    "Failed to write ffmpeg debug report"
                ),
            }
        }

        progress(ExportProgress {
            progress: 0.0,
            frames_rendered: 0,
            total_frames: plan.total_frames,
            eta_secs: None,
        });

        self.run_ffmpeg(&plan, output, progress, cancel)?;
        write_verification_report(instructions);
        Ok(output.clone())
    }

    fn is_available(&self) -> bool {
        command_exists(&self.ffmpeg)
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

fn kill_child(child: &mut Child) {
    tracing::info!(pid = child.id(), "Killing ffmpeg after cancellation");
    let _ = child.kill();
    let _ = child.wait();
}

/// Summarize per-frame compositions next to the output.
fn write_verification_report(instructions: &RenderInstructions) {
    let compositions = compute_compositions(instructions);
    let width = instructions.export.width as f64;
    let height = instructions.export.height as f64;

    let out_of_bounds_cursors = compositions
        .iter()
        .filter_map(|c| c.cursor.as_ref())
        .filter(|c| c.x < 0.0 || c.y < 0.0 || c.x > width || c.y > height)
        .count();
    let zoomed_frames = compositions.iter().filter(|c| c.viewport.is_zoomed()).count();
    let camera_hidden = compositions
        .iter()
        .filter(|c| c.camera == CameraFrame::Hidden)
        .count();
    let camera_fullscreen = compositions
        .iter()
        .filter(|c| c.camera == CameraFrame::Fullscreen)
        .count();
    let spotlight_frames = compositions.iter().filter(|c| c.spotlight.is_some()).count();
    let transition_frames = compositions.iter().filter(|c| c.transition.is_some()).count();

    let output = &instructions.output_path;
    let report_path = output.with_extension("verification.json");
    let report = serde_json::json!({
        "output": output,
        "sampled_frames": compositions.len(),
        "zoomed_frames": zoomed_frames,
        "camera_hidden_frames": camera_hidden,
        "camera_fullscreen_frames": camera_fullscreen,
        "spotlight_frames": spotlight_frames,
        "transition_frames": transition_frames,
        "out_of_bounds_cursors": out_of_bounds_cursors,
        "status": if out_of_bounds_cursors == 0 { "ok" } else { "warn" }
    });

    let written = serde_json::to_string_pretty(&report)
        .map_err(std::io::Error::from)
        .and_then(|json| std::fs::write(&report_path, json));
    match written {
        Ok(()) => tracing::info!(report = %report_path.display(), "Wrote visual verification report"),
        Err(err) => tracing::warn!(
            error = %err,
            report = %report_path.display(),
            "Failed to write visual verification report"
        ),
    }
}

/// Zoom rect samples for the piecewise zoompan expressions, in source time.
fn sample_viewport_points(instructions: &RenderInstructions) -> Vec<(f64, Viewport)> {
    let zoom = &instructions.zoom;
    let Some(first) = zoom.keyframes.first() else {
        return vec![(0.0, Viewport::FULL)];
    };

    let mut times = Vec::new();
    if zoom.follow_cursor {
        let duration = instructions.source_duration_secs.max(0.0);
        let steps = (duration / FOLLOW_SAMPLE_STEP_SECS).ceil() as usize;
        times.extend((0..=steps).map(|i| (i as f64 * FOLLOW_SAMPLE_STEP_SECS).min(duration)));
    } else {
        times.push(first.time_secs);
        for pair in zoom.keyframes.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if a.zoom_level != b.zoom_level || a.center() != b.center() {
                let span = b.time_secs - a.time_secs;
                times.extend(
                    (1..ZOOM_EASE_SAMPLES).map(|i| a.time_secs + span * i as f64 / ZOOM_EASE_SAMPLES as f64),
                );
            }
            times.push(b.time_secs);
        }
    }

    let points = times
        .into_iter()
        .map(|t| (t, zoom.rect_at(t, &instructions.cursor)))
        .collect();
    downsample_timed_points(points, MAX_VIEWPORT_EXPR_POINTS)
}

fn downsample_timed_points<T: Clone>(points: Vec<(f64, T)>, max_points: usize) -> Vec<(f64, T)> {
    if points.len() <= max_points {
        return points;
    }

    let target = max_points.max(2);
    let last_idx = points.len() - 1;
    let mut selected = Vec::with_capacity(target);
    for i in 0..target {
        let idx = ((i as f64 / (target - 1) as f64) * last_idx as f64).round() as usize;
        selected.push(points[idx].clone());
    }
    selected
}

/// Nested `if(lt(var,..))` expression linearly interpolating `points` over `var`.
fn build_piecewise_expr(mut points: Vec<(f64, f64)>, var: &str) -> String {
    points.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut sanitized: Vec<(f64, f64)> = Vec::with_capacity(points.len());
    for (t, v) in points {
        if let Some((last_t, last_v)) = sanitized.last_mut() {
            if (t - *last_t).abs() < 1e-4 {
                *last_t = t;
                *last_v = v;
                continue;
            }
        }
        sanitized.push((t, v));
    }

    let Some(&(_, last_value)) = sanitized.last() else {
        return "0".to_string();
    };
    let mut expr = format!("{last_value:.6}");
    for pair in sanitized.windows(2).rev() {
        let (t0, v0) = pair[0];
        let (t1, v1) = pair[1];
        let interp = format!(
            "{v0:.6}+({delta:.6})*({var}-{t0:.6})/{dur:.6}",
            delta = v1 - v0,
            dur = (t1 - t0).max(1e-4)
        );
        expr = format!("if(lt({var},{t1:.6}),{interp},{expr})");
    }
    if let Some(&(t0, v0)) = sanitized.first() {
        if sanitized.len() > 1 {
            expr = format!("if(lt({var},{t0:.6}),{v0:.6},{expr})");
        }
    }
    expr
}

/// `between(t,a,b)+...` over `ranges`, or `None` when nothing is covered.
fn enable_expr(ranges: &[TimeRange]) -> Option<String> {
    let terms: Vec<String> = ranges
        .iter()
        .filter(|r| r.duration() > 0.0)
        .map(|r| format!("between(t,{:.6},{:.6})", r.start_secs, r.end_secs))
        .collect();
    (!terms.is_empty()).then(|| terms.join("+"))
}

/// Per-frame gain: each audible window's gain, zero elsewhere.
fn volume_expr(plan: &AudioPlan) -> String {
    plan.audible.iter().rev().fold("0".to_string(), |tail, w| {
        format!(
            "if(between(t,{:.6},{:.6}),{:.4},{tail})",
            w.range.start_secs, w.range.end_secs, w.gain
        )
    })
}

fn camera_overlays(instructions: &RenderInstructions) -> Vec<OverlaySpec> {
    let camera = &instructions.camera;
    let mut specs = Vec::new();

    if let Some(enable) = enable_expr(&camera.overlay_windows(instructions.source_duration_secs)) {
        specs.push(OverlaySpec {
            rect: camera.default_layout.rect,
            mirrored: camera.default_layout.mirrored,
            enable,
        });
    }
    if let Some(enable) = enable_expr(&camera.fullscreen) {
        specs.push(OverlaySpec {
            rect: Viewport::FULL,
            mirrored: camera.default_layout.mirrored,
            enable,
        });
    }
    for window in &camera.custom {
        if let Some(enable) = enable_expr(&[window.range]) {
            specs.push(OverlaySpec {
                rect: window.layout.rect,
                mirrored: window.layout.mirrored,
                enable,
            });
        }
    }
    specs
}

fn even(px: f64) -> u32 {
    ((px / 2.0).round() as u32).max(1) * 2
}

/// Returns the graph and whether it produces an `[aout]` stream.
fn build_filter_graph(
    instructions: &RenderInstructions,
    layout: InputLayout,
    overlays: &[OverlaySpec],
) -> (String, bool) {
    let export = &instructions.export;
    let out_w = export.width.max(2);
    let out_h = export.height.max(2);
    let fps = export.fps.max(1);

    let points = sample_viewport_points(instructions);
    let axis = |f: fn(&Viewport) -> f64| {
        build_piecewise_expr(points.iter().map(|(t, vp)| (*t, f(vp))).collect(), "it")
    };
    let x_expr = axis(|vp| vp.x);
    let y_expr = axis(|vp| vp.y);
    let w_expr = axis(|vp| vp.w);

    let mut graph = format!(
        "[0:v]fps={fps},zoompan=z='1/({w_expr})':x='iw*({x_expr})':y='ih*({y_expr})':d=1:s={out_w}x{out_h}:fps={fps}[zoomed]"
    );

    let mut scene = "zoomed".to_string();
    if let Some(webcam_idx) = layout.webcam.filter(|_| !overlays.is_empty()) {
        let drift = instructions.sources.webcam_drift;
        let drift = if drift.is_finite() && drift > 0.0 { drift } else { 1.0 };
        graph.push_str(&format!(
            ";[{webcam_idx}:v]setpts=PTS/{drift:.6},fps={fps},split={n}",
            n = overlays.len()
        ));
        for i in 0..overlays.len() {
            graph.push_str(&format!("[cam{i}]"));
        }
        for (i, spec) in overlays.iter().enumerate() {
            let w = even(spec.rect.w * out_w as f64);
            let h = even(spec.rect.h * out_h as f64);
            let x = (spec.rect.x * out_w as f64).round() as u32;
            let y = (spec.rect.y * out_h as f64).round() as u32;
            let mirror = if spec.mirrored { ",hflip" } else { "" };
            graph.push_str(&format!(
                ";[cam{i}]scale={w}:{h}:flags=lanczos{mirror}[camv{i}];[{scene}][camv{i}]overlay=x={x}:y={y}:enable='{enable}'[scene{i}]",
                enable = spec.enable,
            ));
            scene = format!("scene{i}");
        }
    }

    let segments: Vec<TimeRange> = instructions.trim.segments.iter().map(|s| s.range).collect();
    let select = enable_expr(&segments).unwrap_or_else(|| "0".to_string());
    graph.push_str(&format!(
        ";[{scene}]select='{select}',setpts=N/({fps}*TB)"
    ));
    if export.format == ExportFormat::Gif {
        graph.push_str(&format!(
            ",fps={GIF_FPS},split[g0][g1];[g0]palettegen[pal];[g1][pal]paletteuse[vout]"
        ));
    } else {
        graph.push_str(",format=yuv420p[vout]");
    }

    let mut streams = Vec::new();
    for (idx, plan, label) in [
        (layout.system_audio, &instructions.system_audio, "asys"),
        (layout.microphone, &instructions.microphone, "amic"),
    ] {
        if let Some(idx) = idx {
            graph.push_str(&format!(
                ";[{idx}:a]volume='{expr}':eval=frame[{label}]",
                expr = volume_expr(plan)
            ));
            streams.push(label);
        }
    }
    let mixed = match streams.as_slice() {
        [] => None,
        [only] => Some(only.to_string()),
        many => {
            let inputs: String = many.iter().map(|l| format!("[{l}]")).collect();
            graph.push_str(&format!(
                ";{inputs}amix=inputs={}:normalize=0[amixed]",
                many.len()
            ));
            Some("amixed".to_string())
        }
    };
    if let Some(mixed) = &mixed {
        graph.push_str(&format!(
            ";[{mixed}]aselect='{select}',asetpts=N/SR/TB[aout]"
        ));
    }

    (graph, mixed.is_some())
}

fn codec_args_for_config(config: &ExportSettings, with_audio: bool) -> Vec<String> {
    let video_bitrate = format!("{}k", config.video_bitrate_kbps.max(1000));
    let audio_bitrate = format!("{}k", config.audio_bitrate_kbps.max(64));

    let (mut video, audio_codec): (Vec<String>, Option<&str>) = match config.format {
        ExportFormat::Mp4H264 => (
            vec![
                "-c:v".to_string(),
                "libx264".to_string(),
                "-preset".to_string(),
                "medium".to_string(),
                "-profile:v".to_string(),
                "high".to_string(),
                "-pix_fmt".to_string(),
                "yuv420p".to_string(),
                "-b:v".to_string(),
                video_bitrate,
                "-movflags".to_string(),
                "+faststart".to_string(),
            ],
            Some("aac"),
        ),
        ExportFormat::Mp4H265 => (
            vec![
                "-c:v".to_string(),
                "libx265".to_string(),
                "-preset".to_string(),
                "medium".to_string(),
                "-pix_fmt".to_string(),
                "yuv420p".to_string(),
                "-b:v".to_string(),
                video_bitrate,
                "-movflags".to_string(),
                "+faststart".to_string(),
            ],
            Some("aac"),
        ),
        ExportFormat::Gif => (vec!["-loop".to_string(), "0".to_string()], None),
        ExportFormat::Webm => (
            vec![
                "-c:v".to_string(),
                "libvpx-vp9".to_string(),
                "-b:v".to_string(),
                video_bitrate,
            ],
            Some("libopus"),
        ),
    };

    if let Some(codec) = audio_codec.filter(|_| with_audio) {
        video.extend([
            "-c:a".to_string(),
            codec.to_string(),
            "-b:a".to_string(),
            audio_bitrate,
        ]);
    }
    video
}

/// Whether `binary` runs.
fn command_exists(binary: &Path) -> bool {
    Command::new(binary)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Width and height of the first video stream, via ffprobe.
pub fn probe_video_dimensions(path: &Path) -> Option<(u32, u32)> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height",
            "-of",
            "csv=p=0:s=x",
        ])
        .arg(path)
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let raw = String::from_utf8(output.stdout).ok()?;
    let line = raw.lines().next()?.trim();
    let (w, h) = line.split_once('x')?;
    let width = w.parse::<u32>().ok()?;
    let height = h.parse::<u32>().ok()?;
    if width == 0 || height == 0 {
        return None;
    }
    Some((width, height))
}

/// Container duration in seconds, via ffprobe.
pub fn probe_media_duration(path: &Path) -> Option<f64> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "csv=p=0",
        ])
        .arg(path)
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }
    let raw = String::from_utf8(output.stdout).ok()?;
    raw.lines()
        .next()?
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d > 0.0)
}

#[derive(Debug, Default)]
struct ProgressState {
    out_time_secs: f64,
    complete: bool,
}

impl ProgressState {
    fn update(&mut self, key: &str, value: &str) {
        match key {
            // ffmpeg reports microseconds under both keys.
            "out_time_ms" | "out_time_us" => {
                if let Ok(us) = value.parse::<f64>() {
                    self.out_time_secs = us / 1_000_000.0;
                }
            }
            "progress" => {
                self.complete = value == "end";
            }
            _ => {}
        }
    }
}

fn progress_report(
    state: &ProgressState,
    total_frames: u64,
    expected_duration_secs: f64,
    elapsed_secs: f64,
) -> ExportProgress {
    let progress = if state.complete {
        1.0
    } else if expected_duration_secs <= 0.0 {
        0.0
    } else {
        (state.out_time_secs / expected_duration_secs).clamp(0.0, 1.0)
    };

    ExportProgress {
        progress,
        frames_rendered: (progress * total_frames as f64).round() as u64,
        total_frames,
        eta_secs: EtaEstimator::eta_secs(progress, elapsed_secs),
    }
}
