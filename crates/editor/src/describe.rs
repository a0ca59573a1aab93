//! Human-readable summaries of what changed between two editor snapshots.
//!
//! Used to label history entries. The output is presentation only; nothing
//! parses it back.

use reframe_project_model::project::{
    CameraCorner, CameraStyle, CanvasStyle, Caption, CursorSettings, EditorSnapshot, SpotlightStyle,
    StyleSettings, TrimRange,
};
use reframe_project_model::region::{Region, TrackKind};
use reframe_project_model::timeline::ZoomKeyframe;

const TIME_EPSILON: f64 = 1e-6;

/// List the differences from `old` to `new`, in a fixed field order:
/// trim, region tracks, zoom, style, cursor, captions.
pub fn describe_changes(old: &EditorSnapshot, new: &EditorSnapshot) -> Vec<String> {
    let mut changes = Vec::new();

    describe_trim(old.trim, new.trim, &mut changes);

    describe_regions(TrackKind::VideoCut, &old.video_cuts, &new.video_cuts, &mut changes);
    describe_regions(TrackKind::SystemAudio, &old.system_audio, &new.system_audio, &mut changes);
    describe_regions(TrackKind::Microphone, &old.microphone, &new.microphone, &mut changes);
    describe_regions(TrackKind::Camera, &old.camera, &new.camera, &mut changes);
    describe_regions(TrackKind::Spotlight, &old.spotlight, &new.spotlight, &mut changes);

    describe_zoom(&old.zoom_keyframes, &new.zoom_keyframes, &mut changes);
    describe_style(&old.style, &new.style, &mut changes);
    describe_cursor(old.cursor, new.cursor, &mut changes);
    describe_captions(&old.captions, &new.captions, &mut changes);

    changes
}

fn differs(a: f64, b: f64) -> bool {
    (a - b).abs() > TIME_EPSILON
}

fn plural(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("1 {noun}")
    } else {
        format!("{n} {noun}s")
    }
}

fn describe_trim(old: TrimRange, new: TrimRange, out: &mut Vec<String>) {
    if differs(old.start_secs, new.start_secs) || differs(old.end_secs, new.end_secs) {
        out.push(format!(
            "Trim changed from {:.2}s-{:.2}s to {:.2}s-{:.2}s",
            old.start_secs, old.end_secs, new.start_secs, new.end_secs
        ));
    }
}

fn describe_regions<P: PartialEq>(
    kind: TrackKind,
    old: &[Region<P>],
    new: &[Region<P>],
    out: &mut Vec<String>,
) {
    let label = kind.label();
    let added = new
        .iter()
        .filter(|n| !old.iter().any(|o| o.id == n.id))
        .count();
    let removed = old
        .iter()
        .filter(|o| !new.iter().any(|n| n.id == o.id))
        .count();

    let (mut moved, mut resized, mut edited) = (0, 0, 0);
    for n in new {
        let Some(o) = old.iter().find(|o| o.id == n.id) else {
            continue;
        };
        if differs(o.duration(), n.duration()) {
            resized += 1;
        } else if differs(o.start_secs, n.start_secs) {
            moved += 1;
        }
        if o.payload != n.payload {
            edited += 1;
        }
    }

    for (count, verb) in [
        (added, "added"),
        (removed, "removed"),
        (moved, "moved"),
        (resized, "resized"),
        (edited, "edited"),
    ] {
        if count > 0 {
            out.push(format!("{label}: {verb} {}", plural(count, "region")));
        }
    }
}

fn describe_zoom(old: &[ZoomKeyframe], new: &[ZoomKeyframe], out: &mut Vec<String>) {
    let split = |kfs: &[ZoomKeyframe]| -> (Vec<ZoomKeyframe>, Vec<ZoomKeyframe>) {
        kfs.iter().partition(|k| k.is_auto)
    };
    let (old_auto, old_manual) = split(old);
    let (new_auto, new_manual) = split(new);

    if old_auto != new_auto {
        if new_auto.is_empty() {
            out.push("Auto zoom cleared".to_string());
        } else {
            out.push(format!(
                "Auto zoom regenerated ({})",
                plural(new_auto.len(), "keyframe")
            ));
        }
    }

    if old_manual != new_manual {
        match new_manual.len().cmp(&old_manual.len()) {
            std::cmp::Ordering::Greater => out.push(format!(
                "Zoom: added {}",
                plural(new_manual.len() - old_manual.len(), "manual keyframe")
            )),
            std::cmp::Ordering::Less => out.push(format!(
                "Zoom: removed {}",
                plural(old_manual.len() - new_manual.len(), "manual keyframe")
            )),
            std::cmp::Ordering::Equal => out.push("Zoom: manual keyframes edited".to_string()),
        }
    }
}

fn corner_name(corner: CameraCorner) -> &'static str {
    match corner {
        CameraCorner::TopLeft => "top left",
        CameraCorner::TopRight => "top right",
        CameraCorner::BottomLeft => "bottom left",
        CameraCorner::BottomRight => "bottom right",
    }
}

fn describe_canvas(old: &CanvasStyle, new: &CanvasStyle, out: &mut Vec<String>) {
    if old.background != new.background {
        out.push(format!("Background changed to {}", new.background));
    }
    if old.corner_radius != new.corner_radius {
        out.push(format!("Corner radius changed to {}px", new.corner_radius));
    }
    if old.padding != new.padding {
        out.push(format!("Padding changed to {}px", new.padding));
    }
    if differs(old.shadow_intensity, new.shadow_intensity) {
        out.push(format!("Shadow changed to {:.2}", new.shadow_intensity));
    }
}

fn describe_camera(old: &CameraStyle, new: &CameraStyle, out: &mut Vec<String>) {
    if old.corner != new.corner {
        out.push(format!("Camera moved to {}", corner_name(new.corner)));
    }
    if differs(old.size_ratio, new.size_ratio) {
        out.push(format!("Camera size changed to {:.0}%", new.size_ratio * 100.0));
    }
    if differs(old.margin_ratio, new.margin_ratio) {
        out.push(format!("Camera margin changed to {:.0}%", new.margin_ratio * 100.0));
    }
    if differs(old.aspect_ratio, new.aspect_ratio) {
        out.push(format!("Camera aspect ratio changed to {:.2}", new.aspect_ratio));
    }
    if differs(old.corner_radius, new.corner_radius) {
        out.push(format!("Camera corner radius changed to {:.0}px", new.corner_radius));
    }
    if differs(old.shadow, new.shadow) {
        out.push(format!("Camera shadow changed to {:.2}", new.shadow));
    }
    if old.border != new.border {
        match &new.border {
            Some(border) => out.push(format!(
                "Camera border set to {:.0}px {}",
                border.width, border.color
            )),
            None => out.push("Camera border removed".to_string()),
        }
    }
    if old.mirrored != new.mirrored {
        out.push(if new.mirrored {
            "Camera mirrored".to_string()
        } else {
            "Camera no longer mirrored".to_string()
        });
    }
}

fn describe_spotlight(old: &SpotlightStyle, new: &SpotlightStyle, out: &mut Vec<String>) {
    if differs(old.radius, new.radius) {
        out.push(format!("Spotlight radius changed to {:.2}", new.radius));
    }
    if differs(old.dim, new.dim) {
        out.push(format!("Spotlight dim changed to {:.2}", new.dim));
    }
    if differs(old.softness, new.softness) {
        out.push(format!("Spotlight softness changed to {:.2}", new.softness));
    }
    if differs(old.fade_secs, new.fade_secs) {
        out.push(format!("Spotlight fade changed to {:.2}s", new.fade_secs));
    }
}

fn describe_style(old: &StyleSettings, new: &StyleSettings, out: &mut Vec<String>) {
    describe_canvas(&old.canvas, &new.canvas, out);
    describe_camera(&old.camera, &new.camera, out);
    describe_spotlight(&old.spotlight, &new.spotlight, out);
    if old.zoom_follow_cursor != new.zoom_follow_cursor {
        out.push(if new.zoom_follow_cursor {
            "Zoom follows cursor".to_string()
        } else {
            "Zoom no longer follows cursor".to_string()
        });
    }
    if differs(old.cursor_scale, new.cursor_scale) {
        out.push(format!("Cursor size changed to {:.1}x", new.cursor_scale));
    }
}

fn describe_cursor(old: CursorSettings, new: CursorSettings, out: &mut Vec<String>) {
    if old.smoothing_enabled != new.smoothing_enabled {
        out.push(if new.smoothing_enabled {
            "Cursor smoothing enabled".to_string()
        } else {
            "Cursor smoothing disabled".to_string()
        });
    }
    if old.speed != new.speed {
        out.push(format!("Cursor speed changed to {}", new.speed.name()));
    }
}

fn describe_captions(old: &[Caption], new: &[Caption], out: &mut Vec<String>) {
    if old == new {
        return;
    }
    if old.is_empty() {
        out.push(format!("Captions added ({})", plural(new.len(), "segment")));
    } else if new.is_empty() {
        out.push("Captions removed".to_string());
    } else if old.len() != new.len() {
        out.push(format!(
            "Captions replaced ({} to {})",
            plural(old.len(), "segment"),
            plural(new.len(), "segment")
        ));
    } else {
        let edited = old.iter().zip(new).filter(|(a, b)| a != b).count();
        out.push(format!("Captions: edited {}", plural(edited, "segment")));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reframe_project_model::project::CursorSpeed;
    use reframe_project_model::region::{AudioGain, VideoCut};

    fn cut(id: u64, start: f64, end: f64) -> Region<VideoCut> {
        Region {
            id,
            start_secs: start,
            end_secs: end,
            payload: VideoCut::default(),
        }
    }

    #[test]
    fn test_identical_snapshots_have_no_changes() {
        let snap = EditorSnapshot::for_duration(10.0);
        assert!(describe_changes(&snap, &snap.clone()).is_empty());
    }

    #[test]
    fn test_region_changes_are_classified() {
        let mut old = EditorSnapshot::for_duration(60.0);
        old.video_cuts = vec![cut(1, 0.0, 10.0), cut(2, 20.0, 30.0), cut(3, 40.0, 50.0)];

        let mut new = old.clone();
        new.video_cuts = vec![cut(1, 2.0, 12.0), cut(2, 20.0, 25.0), cut(4, 55.0, 58.0)];

        assert_eq!(
            describe_changes(&old, &new),
            vec![
                "Video: added 1 region",
                "Video: removed 1 region",
                "Video: moved 1 region",
                "Video: resized 1 region",
            ]
        );
    }

    #[test]
    fn test_payload_edit_is_reported() {
        let region = |gain| Region {
            id: 7,
            start_secs: 0.0,
            end_secs: 5.0,
            payload: AudioGain { gain },
        };
        let mut old = EditorSnapshot::for_duration(10.0);
        old.microphone = vec![region(1.0)];
        let mut new = old.clone();
        new.microphone = vec![region(0.5)];

        assert_eq!(describe_changes(&old, &new), vec!["Microphone: edited 1 region"]);
    }

    #[test]
    fn test_changes_follow_field_order() {
        let old = EditorSnapshot::for_duration(10.0);
        let mut new = old.clone();
        new.captions = vec![Caption {
            start_secs: 0.0,
            end_secs: 1.0,
            text: "hi".into(),
        }];
        new.cursor.speed = CursorSpeed::Rapid;
        new.style.camera.corner = CameraCorner::TopLeft;
        new.zoom_keyframes = vec![
            ZoomKeyframe::manual(1.0, 1.0, 0.5, 0.5),
            ZoomKeyframe::manual(2.0, 2.0, 0.5, 0.5),
        ];
        new.trim = TrimRange::new(1.0, 9.0);

        assert_eq!(
            describe_changes(&old, &new),
            vec![
                "Trim changed from 0.00s-10.00s to 1.00s-9.00s",
                "Zoom: added 2 manual keyframes",
                "Camera moved to top left",
                "Cursor speed changed to rapid",
                "Captions added (1 segment)",
            ]
        );
    }

    #[test]
    fn test_auto_zoom_regeneration() {
        let old = EditorSnapshot::for_duration(10.0);
        let mut new = old.clone();
        new.zoom_keyframes = vec![
            ZoomKeyframe::new(0.4, 1.0, 0.5, 0.5, true),
            ZoomKeyframe::new(1.0, 2.0, 0.5, 0.5, true),
            ZoomKeyframe::new(1.5, 2.0, 0.5, 0.5, true),
            ZoomKeyframe::new(2.1, 1.0, 0.5, 0.5, true),
        ];
        assert_eq!(describe_changes(&old, &new), vec!["Auto zoom regenerated (4 keyframes)"]);
        assert_eq!(describe_changes(&new, &old), vec!["Auto zoom cleared"]);
    }
}
