//! Keyframed zoom/pan timeline.
//!
//! Keyframes are sparse `(time, zoom, focus)` samples. The visible window at
//! any time is derived by [`interpolate_zoom`], a pure function over a sorted
//! keyframe slice, so the editor preview and the exporter frame identically.
//!
//! [`ZoomTimeline`] is the one structure shared between the edit thread and the
//! render thread. It guards its list with a mutex and only ever hands out copies.

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::viewport::{Point2D, Viewport};

/// A zoom keyframe: zoom level and focus point at a moment in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomKeyframe {
    pub time_secs: f64,
    /// `1.0` is the full frame; `2.0` shows half the width and height.
    pub zoom_level: f64,
    pub center_x: f64,
    pub center_y: f64,
    /// Generated by the auto-detector. Auto keyframes are replaced wholesale
    /// on every detector run.
    #[serde(default)]
    pub is_auto: bool,
}

impl ZoomKeyframe {
    /// Build a keyframe, clamping every field into its valid range.
    pub fn new(time_secs: f64, zoom_level: f64, center_x: f64, center_y: f64, is_auto: bool) -> Self {
        let zoom_level = if zoom_level.is_nan() {
            1.0
        } else {
            zoom_level.max(1.0)
        };
        Self {
            time_secs: if time_secs.is_nan() { 0.0 } else { time_secs.max(0.0) },
            zoom_level,
            center_x: clamp_unit(center_x),
            center_y: clamp_unit(center_y),
            is_auto,
        }
    }

    /// A manual keyframe.
    pub fn manual(time_secs: f64, zoom_level: f64, center_x: f64, center_y: f64) -> Self {
        Self::new(time_secs, zoom_level, center_x, center_y, false)
    }

    /// A full-frame keyframe at `time_secs`.
    pub fn unzoomed(time_secs: f64, is_auto: bool) -> Self {
        Self::new(time_secs, 1.0, 0.5, 0.5, is_auto)
    }

    pub fn is_zoomed(&self) -> bool {
        self.zoom_level > 1.0
    }

    pub fn center(&self) -> Point2D {
        Point2D::new(self.center_x, self.center_y)
    }

    /// The visible window described by this keyframe alone.
    pub fn viewport(&self) -> Viewport {
        Viewport::for_zoom(self.zoom_level, self.center_x, self.center_y)
    }
}

fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() {
        0.5
    } else {
        v.clamp(0.0, 1.0)
    }
}

/// Quintic smoothstep: `t³(t(6t − 15) + 10)`, with `t` clamped to `[0, 1]`.
pub fn smoothstep(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * t * t * (t * (6.0 * t - 15.0) + 10.0)
}

/// Visible window at time `t` for a keyframe list sorted by time.
///
/// Outside the keyframe range the first/last keyframe is held. Between two
/// keyframes the inverse zoom (window size) is interpolated so the apparent
/// dolly speed stays constant, and the focus point moves linearly; both use the
/// eased fraction. An empty list yields the full frame.
pub fn interpolate_zoom(keyframes: &[ZoomKeyframe], t: f64) -> Viewport {
    let (first, last) = match (keyframes.first(), keyframes.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Viewport::FULL,
    };
    if t <= first.time_secs {
        return first.viewport();
    }
    if t >= last.time_secs {
        return last.viewport();
    }

    let idx = keyframes.partition_point(|k| k.time_secs <= t);
    let a = &keyframes[idx - 1];
    let b = &keyframes[idx];

    let span = b.time_secs - a.time_secs;
    if span <= f64::EPSILON {
        return b.viewport();
    }
    let eased = smoothstep((t - a.time_secs) / span);

    let inv_a = 1.0 / a.zoom_level;
    let inv_b = 1.0 / b.zoom_level;
    let size = inv_a + (inv_b - inv_a) * eased;
    let center = Point2D::lerp(&a.center(), &b.center(), eased);

    Viewport::for_zoom(1.0 / size, center.x, center.y)
}

/// Re-center a zoomed window on the cursor, keeping its size.
///
/// A full-frame window is returned unchanged.
pub fn follow_cursor(rect: Viewport, cursor: Point2D) -> Viewport {
    if !rect.is_zoomed() {
        return rect;
    }
    let cursor = Point2D::new(clamp_unit(cursor.x), clamp_unit(cursor.y));
    rect.recentered(cursor)
}

/// Mutex-guarded zoom keyframe list.
///
/// Written from the edit thread, read by the renderer. Reads copy out.
#[derive(Debug, Default)]
pub struct ZoomTimeline {
    keyframes: Mutex<Vec<ZoomKeyframe>>,
}

impl ZoomTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_keyframes(keyframes: Vec<ZoomKeyframe>) -> Self {
        let timeline = Self::new();
        timeline.set_keyframes(keyframes);
        timeline
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ZoomKeyframe>> {
        self.keyframes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Visible window at time `t`.
    pub fn zoom_rect(&self, t: f64) -> Viewport {
        interpolate_zoom(&self.lock(), t)
    }

    /// Copy of the current keyframes, sorted by time.
    pub fn snapshot(&self) -> Vec<ZoomKeyframe> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Insert keyframe in time order. Equal times keep insertion order.
    pub fn add_keyframe(&self, keyframe: ZoomKeyframe) {
        let mut keyframes = self.lock();
        let idx = keyframes.partition_point(|k| k.time_secs <= keyframe.time_secs);
        keyframes.insert(idx, keyframe);
    }

    /// Remove the keyframe at `index`. Out-of-range indices are ignored.
    pub fn remove_keyframe(&self, index: usize) -> Option<ZoomKeyframe> {
        let mut keyframes = self.lock();
        (index < keyframes.len()).then(|| keyframes.remove(index))
    }

    /// Replace all keyframes.
    pub fn set_keyframes(&self, mut keyframes: Vec<ZoomKeyframe>) {
        keyframes.sort_by(|a, b| a.time_secs.total_cmp(&b.time_secs));
        *self.lock() = keyframes;
    }

    /// Drop every auto keyframe, keeping manual ones.
    pub fn clear_auto(&self) -> usize {
        let mut keyframes = self.lock();
        let before = keyframes.len();
        keyframes.retain(|k| !k.is_auto);
        before - keyframes.len()
    }

    /// Swap the auto keyframes for `auto`.
    ///
    /// `select_dropped` sees the current list under the lock and returns the
    /// indices of manual keyframes to drop alongside the old auto keyframes.
    /// Returns the number of manual keyframes dropped.
    pub fn replace_auto<F>(&self, auto: Vec<ZoomKeyframe>, select_dropped: F) -> usize
    where
        F: FnOnce(&[ZoomKeyframe]) -> Vec<usize>,
    {
        let mut keyframes = self.lock();
        let dropped = select_dropped(&keyframes);

        let mut kept: Vec<ZoomKeyframe> = keyframes
            .iter()
            .enumerate()
            .filter(|(i, k)| !k.is_auto && !dropped.contains(i))
            .map(|(_, k)| *k)
            .collect();
        let manual_dropped = keyframes.iter().filter(|k| !k.is_auto).count() - kept.len();

        kept.extend(auto.into_iter().map(|mut k| {
            k.is_auto = true;
            k
        }));
        kept.sort_by(|a, b| a.time_secs.total_cmp(&b.time_secs));
        *keyframes = kept;
        manual_dropped
    }
}

impl Clone for ZoomTimeline {
    fn clone(&self) -> Self {
        Self::from_keyframes(self.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_keyframes() -> Vec<ZoomKeyframe> {
        vec![
            ZoomKeyframe::manual(0.0, 1.0, 0.5, 0.5),
            ZoomKeyframe::manual(1.0, 3.0, 0.5, 0.5),
            ZoomKeyframe::manual(2.0, 3.0, 0.5, 0.5),
            ZoomKeyframe::manual(3.0, 1.0, 0.5, 0.5),
        ]
    }

    fn assert_rect(actual: Viewport, expected: Viewport) {
        assert!((actual.x - expected.x).abs() < 1e-9, "{actual:?} != {expected:?}");
        assert!((actual.y - expected.y).abs() < 1e-9, "{actual:?} != {expected:?}");
        assert!((actual.w - expected.w).abs() < 1e-9, "{actual:?} != {expected:?}");
        assert!((actual.h - expected.h).abs() < 1e-9, "{actual:?} != {expected:?}");
    }

    #[test]
    fn test_keyframe_clamps_fields() {
        let k = ZoomKeyframe::new(-2.0, 0.2, 1.5, -0.5, false);
        assert_eq!(k.time_secs, 0.0);
        assert_eq!(k.zoom_level, 1.0);
        assert_eq!(k.center_x, 1.0);
        assert_eq!(k.center_y, 0.0);
    }

    #[test]
    fn test_empty_timeline_is_full_frame() {
        let timeline = ZoomTimeline::new();
        assert_eq!(timeline.zoom_rect(3.0), Viewport::FULL);
    }

    #[test]
    fn test_hold_segment_at_triple_zoom() {
        let timeline = ZoomTimeline::from_keyframes(scenario_keyframes());
        let third = 1.0 / 3.0;
        assert_rect(
            timeline.zoom_rect(1.5),
            Viewport {
                x: 0.5 - third / 2.0,
                y: 0.5 - third / 2.0,
                w: third,
                h: third,
            },
        );
    }

    #[test]
    fn test_holds_first_and_last_keyframe() {
        let keyframes = vec![
            ZoomKeyframe::manual(1.0, 2.0, 0.25, 0.25),
            ZoomKeyframe::manual(2.0, 4.0, 0.75, 0.75),
        ];
        assert_eq!(interpolate_zoom(&keyframes, 0.0), keyframes[0].viewport());
        assert_eq!(interpolate_zoom(&keyframes, 9.0), keyframes[1].viewport());
    }

    #[test]
    fn test_inverse_zoom_interpolation_at_midpoint() {
        let keyframes = vec![
            ZoomKeyframe::manual(0.0, 1.0, 0.5, 0.5),
            ZoomKeyframe::manual(1.0, 2.0, 0.5, 0.5),
        ];
        // smoothstep(0.5) == 0.5, so the window size is halfway between 1 and 1/2.
        let rect = interpolate_zoom(&keyframes, 0.5);
        assert!((rect.w - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_result_stays_inside_frame() {
        let keyframes = vec![
            ZoomKeyframe::manual(0.0, 2.0, 0.0, 0.0),
            ZoomKeyframe::manual(1.0, 2.0, 1.0, 1.0),
        ];
        for i in 0..=20 {
            let rect = interpolate_zoom(&keyframes, i as f64 / 20.0);
            assert!(rect.x >= 0.0 && rect.y >= 0.0);
            assert!(rect.x + rect.w <= 1.0 + 1e-12);
            assert!(rect.y + rect.h <= 1.0 + 1e-12);
        }
    }

    #[test]
    fn test_zoom_rect_is_pure() {
        let timeline = ZoomTimeline::from_keyframes(scenario_keyframes());
        let a = timeline.zoom_rect(0.7);
        let b = timeline.zoom_rect(0.7);
        assert_eq!(a, b);
        assert_eq!(a, interpolate_zoom(&timeline.snapshot(), 0.7));
    }

    #[test]
    fn test_smoothstep_endpoints() {
        assert_eq!(smoothstep(0.0), 0.0);
        assert_eq!(smoothstep(1.0), 1.0);
        assert!((smoothstep(0.5) - 0.5).abs() < 1e-12);
        assert_eq!(smoothstep(-1.0), 0.0);
    }

    #[test]
    fn test_follow_cursor_recenters_only_when_zoomed() {
        let zoomed = Viewport::for_zoom(2.0, 0.5, 0.5);
        let moved = follow_cursor(zoomed, Point2D::new(0.9, 0.1));
        assert_eq!(moved.w, zoomed.w);
        assert_eq!(moved.x, 0.5);
        assert_eq!(moved.y, 0.0);

        assert_eq!(
            follow_cursor(Viewport::FULL, Point2D::new(0.9, 0.1)),
            Viewport::FULL
        );
    }

    #[test]
    fn test_add_and_remove_keep_order() {
        let timeline = ZoomTimeline::new();
        timeline.add_keyframe(ZoomKeyframe::manual(2.0, 2.0, 0.5, 0.5));
        timeline.add_keyframe(ZoomKeyframe::manual(0.5, 1.0, 0.5, 0.5));
        timeline.add_keyframe(ZoomKeyframe::manual(1.0, 1.5, 0.5, 0.5));

        let times: Vec<f64> = timeline.snapshot().iter().map(|k| k.time_secs).collect();
        assert_eq!(times, vec![0.5, 1.0, 2.0]);

        assert!(timeline.remove_keyframe(1).is_some());
        assert!(timeline.remove_keyframe(5).is_none());
        assert_eq!(timeline.len(), 2);
    }

    #[test]
    fn test_replace_auto_keeps_unselected_manual() {
        let timeline = ZoomTimeline::from_keyframes(vec![
            ZoomKeyframe::manual(0.0, 2.0, 0.5, 0.5),
            ZoomKeyframe::new(1.0, 2.0, 0.5, 0.5, true),
            ZoomKeyframe::manual(5.0, 2.0, 0.5, 0.5),
        ]);

        let dropped = timeline.replace_auto(
            vec![ZoomKeyframe::manual(4.0, 3.0, 0.2, 0.2)],
            |current| {
                current
                    .iter()
                    .enumerate()
                    .filter(|(_, k)| k.time_secs > 4.5)
                    .map(|(i, _)| i)
                    .collect()
            },
        );
        assert_eq!(dropped, 1);

        let snapshot = timeline.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert!(!snapshot[0].is_auto);
        assert!(snapshot[1].is_auto);
        assert_eq!(snapshot[1].time_secs, 4.0);

        assert_eq!(timeline.clear_auto(), 1);
        assert_eq!(timeline.len(), 1);
    }

    #[test]
    fn test_shared_across_threads() {
        let timeline = std::sync::Arc::new(ZoomTimeline::from_keyframes(scenario_keyframes()));
        let reader = {
            let timeline = timeline.clone();
            std::thread::spawn(move || timeline.zoom_rect(1.5).w)
        };
        timeline.add_keyframe(ZoomKeyframe::manual(4.0, 2.0, 0.5, 0.5));
        let w = reader.join().unwrap();
        assert!((w - 1.0 / 3.0).abs() < 1e-9);
    }
}
