//! Render instruction resolution and per-frame composition.
//!
//! Everything the renderer needs is resolved up front into an immutable
//! [`RenderInstructions`] bundle: kept source segments, audible/muted audio
//! windows, camera and spotlight windows, a zoom keyframe snapshot and the
//! cursor data. [`compute_compositions`] walks that bundle frame by frame.

use std::path::PathBuf;

use reframe_processing_core::CursorSnapshot;
use reframe_project_model::project::{
    CameraCorner, CameraStyle, Caption, EditorSnapshot, ExportSettings, SpotlightStyle,
    StyleSettings, TrimRange,
};
use reframe_project_model::region::{
    AudioGain, CameraBorder, CameraMode, CameraRegion, Region, RegionTrack, Spotlight, TimeRange,
    TrackKind, Transition, TransitionKind, VideoCut, EDIT_EPSILON_SECS,
};
use reframe_project_model::timeline::{follow_cursor, interpolate_zoom, ZoomKeyframe};
use reframe_project_model::viewport::{Point2D, Viewport};

/// How long a click keeps the cursor in its pressed state.
const CLICK_HIGHLIGHT_SECS: f64 = 0.15;

/// One kept range of the source recording.
#[derive(Debug, Clone, PartialEq)]
pub struct TrimSegment {
    /// Source range in seconds.
    pub range: TimeRange,
    pub entry: Option<Transition>,
    pub exit: Option<Transition>,
}

impl TrimSegment {
    fn plain(range: TimeRange) -> Self {
        Self {
            range,
            entry: None,
            exit: None,
        }
    }

    /// Transition in effect at source time `t`, with its progress in `[0, 1]`.
    ///
    /// The exit transition wins where both overlap.
    pub fn transition_at(&self, t: f64) -> Option<ActiveTransition> {
        if let Some(exit) = self.exit.filter(Transition::is_visible) {
            let remaining = self.range.end_secs - t;
            if remaining < exit.duration_secs {
                return Some(ActiveTransition {
                    kind: exit.kind,
                    progress: (remaining / exit.duration_secs).clamp(0.0, 1.0),
                    entering: false,
                });
            }
        }
        if let Some(entry) = self.entry.filter(Transition::is_visible) {
            let elapsed = t - self.range.start_secs;
            if elapsed < entry.duration_secs {
                return Some(ActiveTransition {
                    kind: entry.kind,
                    progress: (elapsed / entry.duration_secs).clamp(0.0, 1.0),
                    entering: true,
                });
            }
        }
        None
    }
}

/// A transition being played on a frame.
///
/// `progress` runs from 0 (invisible) to 1 (fully shown) for both entry and
/// exit, so it can be used directly as an opacity or scale factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveTransition {
    pub kind: TransitionKind,
    pub progress: f64,
    pub entering: bool,
}

/// The kept parts of the recording, in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTrim {
    pub segments: Vec<TrimSegment>,
    /// Whether the legacy single trim range was used instead of cut regions.
    pub from_legacy: bool,
}

impl ResolvedTrim {
    /// Total output duration.
    pub fn output_duration(&self) -> f64 {
        self.segments.iter().map(|s| s.range.duration()).sum()
    }

    /// Map an output timestamp to `(segment index, source time)`.
    pub fn to_source_time(&self, output_secs: f64) -> Option<(usize, f64)> {
        if output_secs < 0.0 {
            return None;
        }
        let mut offset = 0.0;
        for (idx, segment) in self.segments.iter().enumerate() {
            let len = segment.range.duration();
            if output_secs < offset + len {
                return Some((idx, segment.range.start_secs + (output_secs - offset)));
            }
            offset += len;
        }
        None
    }
}

/// Resolve which parts of the recording are kept.
///
/// Cut regions are authoritative unless there are none, or there is exactly
/// one that matches the legacy trim range and carries no transitions; then
/// the legacy trim is used. A legacy trim with no extent keeps everything.
pub fn resolve_trim(
    cuts: &[Region<VideoCut>],
    legacy: TrimRange,
    source_duration_secs: f64,
) -> ResolvedTrim {
    let duration = source_duration_secs.max(0.0);
    let use_legacy = match cuts {
        [] => true,
        [only] => {
            !only.payload.has_transitions()
                && (only.start_secs - legacy.start_secs).abs() < EDIT_EPSILON_SECS
                && (only.end_secs - legacy.end_secs).abs() < EDIT_EPSILON_SECS
        }
        _ => false,
    };

    let clamp = |start: f64, end: f64| {
        let start = start.clamp(0.0, duration);
        let end = end.clamp(0.0, duration);
        (end - start > f64::EPSILON).then(|| TimeRange::new(start, end))
    };

    if use_legacy {
        let range = if legacy.duration() > 0.0 {
            clamp(legacy.start_secs, legacy.end_secs)
        } else {
            clamp(0.0, duration)
        };
        return ResolvedTrim {
            segments: range.map(TrimSegment::plain).into_iter().collect(),
            from_legacy: true,
        };
    }

    let segments = cuts
        .iter()
        .filter_map(|cut| {
            clamp(cut.start_secs, cut.end_secs).map(|range| TrimSegment {
                range,
                entry: cut.payload.entry,
                exit: cut.payload.exit,
            })
        })
        .collect();
    ResolvedTrim {
        segments,
        from_legacy: false,
    }
}

/// An audible window and its gain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioWindow {
    pub range: TimeRange,
    pub gain: f64,
}

/// Audible and muted windows for one audio source.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AudioPlan {
    pub audible: Vec<AudioWindow>,
    pub muted: Vec<TimeRange>,
}

impl AudioPlan {
    /// Gain at source time `t`; zero inside muted windows.
    pub fn gain_at(&self, t: f64) -> f64 {
        self.audible
            .iter()
            .find(|w| w.range.contains(t))
            .map(|w| w.gain)
            .unwrap_or(0.0)
    }

    pub fn is_silent(&self) -> bool {
        self.audible.iter().all(|w| w.gain <= 0.0)
    }
}

/// Audio regions are audible windows; everything else is muted.
pub fn resolve_audio(
    kind: TrackKind,
    regions: &[Region<AudioGain>],
    source_duration_secs: f64,
) -> AudioPlan {
    let track = RegionTrack::from_regions_as(kind, source_duration_secs, regions.to_vec());
    AudioPlan {
        audible: track
            .regions()
            .iter()
            .map(|r| AudioWindow {
                range: r.range(),
                gain: r.payload.gain.max(0.0),
            })
            .collect(),
        muted: track.complement(),
    }
}

/// Fully resolved webcam layout in normalized output coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraLayout {
    pub rect: Viewport,
    pub aspect_ratio: f64,
    pub corner_radius: f64,
    pub shadow: f64,
    pub border: Option<CameraBorder>,
    pub mirrored: bool,
}

impl CameraLayout {
    /// The global picture-in-picture layout for an output of the given size.
    pub fn from_style(style: &CameraStyle, output_width: u32, output_height: u32) -> Self {
        Self {
            rect: pip_rect(style, style.aspect_ratio, output_width, output_height),
            aspect_ratio: style.aspect_ratio,
            corner_radius: style.corner_radius,
            shadow: style.shadow,
            border: style.border.clone(),
            mirrored: style.mirrored,
        }
    }
}

fn pip_rect(style: &CameraStyle, aspect_ratio: f64, output_width: u32, output_height: u32) -> Viewport {
    let frame_aspect = output_width.max(1) as f64 / output_height.max(1) as f64;
    let aspect = if aspect_ratio.is_finite() && aspect_ratio > 0.0 {
        aspect_ratio
    } else {
        16.0 / 9.0
    };
    let w = style.size_ratio.clamp(0.01, 1.0);
    let h = (w * frame_aspect / aspect).clamp(0.01, 1.0);
    let mx = style.margin_ratio.clamp(0.0, 0.5);
    let my = mx * frame_aspect;

    let (x, y) = match style.corner {
        CameraCorner::TopLeft => (mx, my),
        CameraCorner::TopRight => (1.0 - w - mx, my),
        CameraCorner::BottomLeft => (mx, 1.0 - h - my),
        CameraCorner::BottomRight => (1.0 - w - mx, 1.0 - h - my),
    };
    Viewport {
        x: x.clamp(0.0, 1.0 - w),
        y: y.clamp(0.0, 1.0 - h),
        w,
        h,
    }
}

/// A custom-layout camera window.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraWindow {
    pub range: TimeRange,
    pub layout: CameraLayout,
    pub entry: Option<Transition>,
    pub exit: Option<Transition>,
}

/// What the webcam does on a given frame.
#[derive(Debug, Clone, PartialEq)]
pub enum CameraState<'a> {
    /// Default picture-in-picture.
    Overlay(&'a CameraLayout),
    Fullscreen,
    Hidden,
    Custom(&'a CameraWindow),
}

/// Disjoint camera windows by mode. Uncovered time uses the default overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraPlan {
    pub default_layout: CameraLayout,
    pub fullscreen: Vec<TimeRange>,
    pub hidden: Vec<TimeRange>,
    pub custom: Vec<CameraWindow>,
}

impl CameraPlan {
    pub fn state_at(&self, t: f64) -> CameraState<'_> {
        if self.fullscreen.iter().any(|r| r.contains(t)) {
            return CameraState::Fullscreen;
        }
        if self.hidden.iter().any(|r| r.contains(t)) {
            return CameraState::Hidden;
        }
        if let Some(window) = self.custom.iter().find(|w| w.range.contains(t)) {
            return CameraState::Custom(window);
        }
        CameraState::Overlay(&self.default_layout)
    }

    /// Windows where the default overlay is shown.
    pub fn overlay_windows(&self, source_duration_secs: f64) -> Vec<TimeRange> {
        let mut taken: Vec<TimeRange> = self
            .fullscreen
            .iter()
            .chain(&self.hidden)
            .copied()
            .chain(self.custom.iter().map(|w| w.range))
            .collect();
        taken.sort_by(|a, b| a.start_secs.total_cmp(&b.start_secs));

        let mut free = Vec::new();
        let mut cursor = 0.0;
        for range in taken {
            if range.start_secs > cursor {
                free.push(TimeRange::new(cursor, range.start_secs));
            }
            cursor = cursor.max(range.end_secs);
        }
        if source_duration_secs > cursor {
            free.push(TimeRange::new(cursor, source_duration_secs));
        }
        free
    }
}

/// Split camera regions by mode, filling custom layouts from the global style.
pub fn resolve_camera(
    regions: &[Region<CameraRegion>],
    style: &CameraStyle,
    output_width: u32,
    output_height: u32,
) -> CameraPlan {
    let default_layout = CameraLayout::from_style(style, output_width, output_height);
    let mut plan = CameraPlan {
        default_layout: default_layout.clone(),
        fullscreen: Vec::new(),
        hidden: Vec::new(),
        custom: Vec::new(),
    };

    for region in regions {
        match &region.payload.mode {
            CameraMode::Fullscreen => plan.fullscreen.push(region.range()),
            CameraMode::Hidden => plan.hidden.push(region.range()),
            CameraMode::Custom(overrides) => {
                let aspect_ratio = overrides.aspect_ratio.unwrap_or(style.aspect_ratio);
                let rect = overrides
                    .rect
                    .unwrap_or_else(|| pip_rect(style, aspect_ratio, output_width, output_height));
                plan.custom.push(CameraWindow {
                    range: region.range(),
                    layout: CameraLayout {
                        rect,
                        aspect_ratio,
                        corner_radius: overrides.corner_radius.unwrap_or(default_layout.corner_radius),
                        shadow: overrides.shadow.unwrap_or(default_layout.shadow),
                        border: overrides
                            .border
                            .clone()
                            .or_else(|| default_layout.border.clone()),
                        mirrored: overrides.mirrored.unwrap_or(default_layout.mirrored),
                    },
                    entry: overrides.entry,
                    exit: overrides.exit,
                });
            }
        }
    }
    plan
}

/// A spotlight window with every parameter resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotlightWindow {
    pub range: TimeRange,
    pub radius: f64,
    pub dim: f64,
    pub softness: f64,
    pub fade_secs: f64,
}

impl SpotlightWindow {
    /// Effective dim strength at `t`, ramping in and out over `fade_secs`.
    pub fn intensity_at(&self, t: f64) -> f64 {
        if !self.range.contains(t) {
            return 0.0;
        }
        let fade = self.fade_secs.min(self.range.duration() / 2.0);
        if fade <= 0.0 {
            return self.dim;
        }
        let edge = (t - self.range.start_secs).min(self.range.end_secs - t);
        self.dim * (edge / fade).clamp(0.0, 1.0)
    }
}

pub fn resolve_spotlights(regions: &[Region<Spotlight>], style: &SpotlightStyle) -> Vec<SpotlightWindow> {
    regions
        .iter()
        .map(|r| SpotlightWindow {
            range: r.range(),
            radius: r.payload.radius.unwrap_or(style.radius).max(0.0),
            dim: r.payload.dim.unwrap_or(style.dim).clamp(0.0, 1.0),
            softness: r.payload.softness.unwrap_or(style.softness).clamp(0.0, 1.0),
            fade_secs: r.payload.fade_secs.unwrap_or(style.fade_secs).max(0.0),
        })
        .collect()
}

/// Zoom keyframes as seen by the renderer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ZoomPlan {
    pub keyframes: Vec<ZoomKeyframe>,
    pub follow_cursor: bool,
}

impl ZoomPlan {
    /// Visible window at source time `t`.
    pub fn rect_at(&self, t: f64, cursor: &CursorSnapshot) -> Viewport {
        let rect = interpolate_zoom(&self.keyframes, t);
        if !self.follow_cursor {
            return rect;
        }
        match cursor.position_at(t) {
            Some(position) => follow_cursor(rect, position),
            None => rect,
        }
    }
}

/// Source files the renderer reads.
#[derive(Debug, Clone, PartialEq)]
pub struct SourcePaths {
    pub screen: PathBuf,
    pub webcam: Option<PathBuf>,
    /// `duration(webcam) / duration(screen)`.
    pub webcam_drift: f64,
    pub system_audio: Option<PathBuf>,
    /// Denoised microphone when available, the raw one otherwise.
    pub microphone: Option<PathBuf>,
}

/// Everything a render backend needs, resolved and immutable.
#[derive(Debug, Clone)]
pub struct RenderInstructions {
    pub source_duration_secs: f64,
    pub trim: ResolvedTrim,
    pub system_audio: AudioPlan,
    pub microphone: AudioPlan,
    pub camera: CameraPlan,
    pub spotlights: Vec<SpotlightWindow>,
    pub zoom: ZoomPlan,
    pub cursor: CursorSnapshot,
    pub style: StyleSettings,
    pub captions: Vec<Caption>,
    pub export: ExportSettings,
    pub sources: SourcePaths,
    pub output_path: PathBuf,
}

impl RenderInstructions {
    /// Translate an editor snapshot into render instructions.
    pub fn resolve(
        snapshot: &EditorSnapshot,
        cursor: CursorSnapshot,
        sources: SourcePaths,
        export: ExportSettings,
        source_duration_secs: f64,
        output_path: PathBuf,
    ) -> Self {
        let trim = resolve_trim(&snapshot.video_cuts, snapshot.trim, source_duration_secs);
        let mut keyframes = snapshot.zoom_keyframes.clone();
        keyframes.sort_by(|a, b| a.time_secs.total_cmp(&b.time_secs));

        Self {
            source_duration_secs,
            trim,
            system_audio: resolve_audio(
                TrackKind::SystemAudio,
                &snapshot.system_audio,
                source_duration_secs,
            ),
            microphone: resolve_audio(
                TrackKind::Microphone,
                &snapshot.microphone,
                source_duration_secs,
            ),
            camera: resolve_camera(&snapshot.camera, &snapshot.style.camera, export.width, export.height),
            spotlights: resolve_spotlights(&snapshot.spotlight, &snapshot.style.spotlight),
            zoom: ZoomPlan {
                keyframes,
                follow_cursor: snapshot.style.zoom_follow_cursor,
            },
            cursor,
            style: snapshot.style.clone(),
            captions: snapshot.captions.clone(),
            export,
            sources,
            output_path,
        }
    }

    pub fn output_duration(&self) -> f64 {
        self.trim.output_duration()
    }

    pub fn total_frames(&self) -> u64 {
        (self.output_duration() * self.export.fps.max(1) as f64).ceil() as u64
    }
}

/// A single frame's composition instructions.
#[derive(Debug, Clone)]
pub struct FrameComposition {
    /// Output frame number.
    pub frame_index: u64,

    /// Output time in seconds.
    pub time_secs: f64,

    /// Source recording time this frame shows.
    pub source_secs: f64,

    /// The viewport to crop from the source video.
    pub viewport: Viewport,

    /// Cursor position in output coordinates.
    pub cursor: Option<CursorOverlay>,

    /// Webcam placement.
    pub camera: CameraFrame,

    pub spotlight: Option<SpotlightFrame>,

    /// Cut transition being played.
    pub transition: Option<ActiveTransition>,
}

/// Cursor rendering instruction for a single frame.
#[derive(Debug, Clone)]
pub struct CursorOverlay {
    /// X position in output pixel coordinates.
    pub x: f64,
    /// Y position in output pixel coordinates.
    pub y: f64,
    /// Scale factor for the cursor asset.
    pub scale: f64,
    /// Whether a click animation should be shown.
    pub clicking: bool,
}

/// Webcam placement for a single frame.
#[derive(Debug, Clone, PartialEq)]
pub enum CameraFrame {
    Hidden,
    Fullscreen,
    /// Overlay rect in output pixels.
    Overlay {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        opacity: f64,
    },
}

/// Spotlight dimming for a single frame, centered on the cursor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotlightFrame {
    pub center: Point2D,
    pub radius: f64,
    pub softness: f64,
    pub intensity: f64,
}

/// Compute the composition for each output frame.
pub fn compute_compositions(instructions: &RenderInstructions) -> Vec<FrameComposition> {
    let fps = instructions.export.fps.max(1);
    let width = instructions.export.width as f64;
    let height = instructions.export.height as f64;
    let total_frames = instructions.total_frames();
    let mut compositions = Vec::with_capacity(total_frames as usize);

    for frame in 0..total_frames {
        let time_secs = frame as f64 / fps as f64;
        let Some((segment_idx, source_secs)) = instructions.trim.to_source_time(time_secs) else {
            continue;
        };
        let segment = &instructions.trim.segments[segment_idx];

        let viewport = instructions.zoom.rect_at(source_secs, &instructions.cursor);
        let pointer = instructions.cursor.position_at(source_secs);

        let cursor = pointer.map(|p| {
            // Outside the viewport the cursor is pinned to the nearest edge.
            let (lx, ly) = viewport.to_local(p.x, p.y).unwrap_or_else(|| {
                (
                    ((p.x - viewport.x) / viewport.w).clamp(0.0, 1.0),
                    ((p.y - viewport.y) / viewport.h).clamp(0.0, 1.0),
                )
            });
            CursorOverlay {
                x: lx * width,
                y: ly * height,
                scale: viewport.zoom_factor() * instructions.style.cursor_scale,
                clicking: is_clicking(&instructions.cursor, source_secs),
            }
        });

        let camera = camera_frame(instructions, source_secs, width, height);

        let spotlight = instructions
            .spotlights
            .iter()
            .find(|w| w.range.contains(source_secs))
            .map(|w| SpotlightFrame {
                center: pointer.unwrap_or_else(|| viewport.center()),
                radius: w.radius,
                softness: w.softness,
                intensity: w.intensity_at(source_secs),
            });

        compositions.push(FrameComposition {
            frame_index: frame,
            time_secs,
            source_secs,
            viewport,
            cursor,
            camera,
            spotlight,
            transition: segment.transition_at(source_secs),
        });
    }

    compositions
}

fn is_clicking(cursor: &CursorSnapshot, t: f64) -> bool {
    cursor.recent_click(t, CLICK_HIGHLIGHT_SECS).is_some()
}

fn camera_frame(instructions: &RenderInstructions, t: f64, width: f64, height: f64) -> CameraFrame {
    if instructions.sources.webcam.is_none() {
        return CameraFrame::Hidden;
    }
    let overlay = |rect: Viewport, opacity: f64| CameraFrame::Overlay {
        x: rect.x * width,
        y: rect.y * height,
        width: rect.w * width,
        height: rect.h * height,
        opacity,
    };
    match instructions.camera.state_at(t) {
        CameraState::Hidden => CameraFrame::Hidden,
        CameraState::Fullscreen => CameraFrame::Fullscreen,
        CameraState::Overlay(layout) => overlay(layout.rect, 1.0),
        CameraState::Custom(window) => {
            let segment = TrimSegment {
                range: window.range,
                entry: window.entry,
                exit: window.exit,
            };
            let opacity = segment.transition_at(t).map(|a| a.progress).unwrap_or(1.0);
            overlay(window.layout.rect, opacity)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reframe_project_model::project::{ExportFormat, Project};
    use reframe_project_model::region::CameraOverrides;

    fn cut(id: u64, start: f64, end: f64) -> Region<VideoCut> {
        Region {
            id,
            start_secs: start,
            end_secs: end,
            payload: VideoCut::default(),
        }
    }

    fn gain(id: u64, start: f64, end: f64, gain: f64) -> Region<AudioGain> {
        Region {
            id,
            start_secs: start,
            end_secs: end,
            payload: AudioGain { gain },
        }
    }

    fn sources() -> SourcePaths {
        SourcePaths {
            screen: PathBuf::from("/p/sources/screen.mkv"),
            webcam: Some(PathBuf::from("/p/sources/webcam.mkv")),
            webcam_drift: 1.0,
            system_audio: None,
            microphone: None,
        }
    }

    fn export_settings() -> ExportSettings {
        let mut export = Project::new("t", 1920, 1080, 30).export;
        export.format = ExportFormat::Mp4H264;
        export
    }

    #[test]
    fn test_no_cuts_falls_back_to_legacy_trim() {
        let trim = resolve_trim(&[], TrimRange::new(2.0, 8.0), 10.0);
        assert!(trim.from_legacy);
        assert_eq!(trim.segments.len(), 1);
        assert_eq!(trim.segments[0].range, TimeRange::new(2.0, 8.0));
    }

    #[test]
    fn test_single_cut_matching_legacy_uses_legacy() {
        let trim = resolve_trim(&[cut(1, 2.0, 8.0)], TrimRange::new(2.0, 8.0), 10.0);
        assert!(trim.from_legacy);
    }

    #[test]
    fn test_single_cut_with_transition_is_authoritative() {
        let mut only = cut(1, 2.0, 8.0);
        only.payload.entry = Some(Transition::new(TransitionKind::Fade, 0.5));
        let trim = resolve_trim(&[only], TrimRange::new(2.0, 8.0), 10.0);
        assert!(!trim.from_legacy);
        assert!(trim.segments[0].entry.is_some());
    }

    #[test]
    fn test_empty_legacy_trim_keeps_everything() {
        let trim = resolve_trim(&[], TrimRange::default(), 12.0);
        assert_eq!(trim.output_duration(), 12.0);
    }

    #[test]
    fn test_multiple_cuts_map_output_time() {
        let trim = resolve_trim(
            &[cut(1, 0.0, 2.0), cut(2, 5.0, 8.0)],
            TrimRange::new(0.0, 10.0),
            10.0,
        );
        assert_eq!(trim.output_duration(), 5.0);
        assert_eq!(trim.to_source_time(1.0), Some((0, 1.0)));
        assert_eq!(trim.to_source_time(2.5), Some((1, 5.5)));
        assert_eq!(trim.to_source_time(5.0), None);
    }

    #[test]
    fn test_cuts_are_clamped_to_source() {
        let trim = resolve_trim(
            &[cut(1, 0.0, 2.0), cut(2, 9.0, 15.0)],
            TrimRange::new(0.0, 15.0),
            10.0,
        );
        assert_eq!(trim.segments[1].range, TimeRange::new(9.0, 10.0));
    }

    #[test]
    fn test_audio_complement_is_muted() {
        let plan = resolve_audio(TrackKind::SystemAudio, &[gain(1, 2.0, 4.0, 0.5)], 10.0);
        assert_eq!(plan.audible.len(), 1);
        assert_eq!(
            plan.muted,
            vec![TimeRange::new(0.0, 2.0), TimeRange::new(4.0, 10.0)]
        );
        assert_eq!(plan.gain_at(3.0), 0.5);
        assert_eq!(plan.gain_at(5.0), 0.0);
    }

    #[test]
    fn test_no_audio_regions_is_fully_muted() {
        let plan = resolve_audio(TrackKind::Microphone, &[], 10.0);
        assert!(plan.is_silent());
        assert_eq!(plan.muted, vec![TimeRange::new(0.0, 10.0)]);
    }

    #[test]
    fn test_camera_custom_falls_back_to_style() {
        let style = CameraStyle::default();
        let regions = vec![
            Region {
                id: 1,
                start_secs: 0.0,
                end_secs: 2.0,
                payload: CameraRegion {
                    mode: CameraMode::Hidden,
                },
            },
            Region {
                id: 2,
                start_secs: 3.0,
                end_secs: 5.0,
                payload: CameraRegion {
                    mode: CameraMode::Custom(CameraOverrides {
                        mirrored: Some(true),
                        ..CameraOverrides::default()
                    }),
                },
            },
        ];
        let plan = resolve_camera(&regions, &style, 1920, 1080);
        assert_eq!(plan.hidden, vec![TimeRange::new(0.0, 2.0)]);
        assert_eq!(plan.custom.len(), 1);
        let layout = &plan.custom[0].layout;
        assert!(layout.mirrored);
        assert_eq!(layout.corner_radius, style.corner_radius);
        assert_eq!(layout.rect, plan.default_layout.rect);

        assert_eq!(plan.state_at(1.0), CameraState::Hidden);
        assert!(matches!(plan.state_at(2.5), CameraState::Overlay(_)));
        assert!(matches!(plan.state_at(4.0), CameraState::Custom(_)));
        assert_eq!(
            plan.overlay_windows(10.0),
            vec![TimeRange::new(2.0, 3.0), TimeRange::new(5.0, 10.0)]
        );
    }

    #[test]
    fn test_default_pip_sits_in_bottom_right() {
        let layout = CameraLayout::from_style(&CameraStyle::default(), 1920, 1080);
        assert!((layout.rect.w - 0.24).abs() < 1e-9);
        assert!((layout.rect.h - 0.24).abs() < 1e-9);
        assert!((layout.rect.right() - 0.97).abs() < 1e-9);
        assert!(layout.rect.bottom() < 1.0);
    }

    #[test]
    fn test_spotlight_fades() {
        let window = resolve_spotlights(
            &[Region {
                id: 1,
                start_secs: 1.0,
                end_secs: 3.0,
                payload: Spotlight {
                    fade_secs: Some(0.5),
                    ..Spotlight::default()
                },
            }],
            &SpotlightStyle::default(),
        )[0];
        assert_eq!(window.intensity_at(0.5), 0.0);
        assert!((window.intensity_at(1.25) - 0.3).abs() < 1e-9);
        assert!((window.intensity_at(2.0) - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_compositions_skip_cut_frames() {
        let mut snapshot = EditorSnapshot::for_duration(4.0);
        snapshot.video_cuts = vec![cut(1, 0.0, 1.0), cut(2, 3.0, 4.0)];
        let instructions = RenderInstructions::resolve(
            &snapshot,
            CursorSnapshot::empty(),
            sources(),
            export_settings(),
            4.0,
            PathBuf::from("/tmp/out.mp4"),
        );
        let frames = compute_compositions(&instructions);
        assert_eq!(frames.len(), 60);
        assert!(frames.iter().all(|f| f.source_secs < 1.0 || f.source_secs >= 3.0));
        assert!((frames[30].source_secs - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_compositions_apply_zoom_and_transition() {
        let mut snapshot = EditorSnapshot::for_duration(4.0);
        let mut only = cut(1, 0.0, 4.0);
        only.payload.entry = Some(Transition::new(TransitionKind::Fade, 1.0));
        snapshot.video_cuts = vec![only];
        snapshot.zoom_keyframes = vec![
            ZoomKeyframe::manual(0.0, 2.0, 0.5, 0.5),
            ZoomKeyframe::manual(4.0, 2.0, 0.5, 0.5),
        ];
        let instructions = RenderInstructions::resolve(
            &snapshot,
            CursorSnapshot::empty(),
            sources(),
            export_settings(),
            4.0,
            PathBuf::from("/tmp/out.mp4"),
        );
        let frames = compute_compositions(&instructions);
        assert!((frames[0].viewport.w - 0.5).abs() < 1e-9);
        let fade = frames[15].transition.expect("entry fade");
        assert_eq!(fade.kind, TransitionKind::Fade);
        assert!((fade.progress - 0.5).abs() < 1e-9);
        assert!(frames[60].transition.is_none());
        assert!(matches!(frames[60].camera, CameraFrame::Overlay { .. }));
    }
}
