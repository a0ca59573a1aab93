//! Zoom regions: keyframe runs viewed as ease-in, hold, ease-out blocks.
//!
//! The timeline stores flat keyframes. Editing and visualization work on
//! regions, which are derived on demand and never stored.

use std::ops::Range;

use serde::Serialize;

use reframe_project_model::timeline::{ZoomKeyframe, ZoomTimeline};
use reframe_project_model::viewport::Point2D;

/// A contiguous zoomed run of keyframes with its entry/exit bounds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoomRegion {
    /// Ease-in start (entry keyframe, or first zoomed keyframe).
    pub start_time: f64,
    /// First zoomed keyframe.
    pub zoom_start_time: f64,
    /// Last zoomed keyframe.
    pub zoom_end_time: f64,
    /// Ease-out end (exit keyframe, or last zoomed keyframe).
    pub end_time: f64,
    pub peak_zoom: f64,
    pub center: Point2D,
    pub is_auto: bool,
    /// Indices of the source keyframes in the slice that was grouped.
    pub keyframe_range: Range<usize>,
}

impl ZoomRegion {
    /// Whether `[start, end]` intersects this region's span.
    pub fn overlaps(&self, start: f64, end: f64) -> bool {
        start < self.end_time && self.start_time < end
    }

    pub fn contains(&self, t: f64) -> bool {
        t >= self.start_time && t <= self.end_time
    }
}

/// Group sorted keyframes into zoom regions.
///
/// A region is a maximal run of keyframes with `zoom_level > 1`, extended by
/// at most one unzoomed keyframe on each side. An unzoomed keyframe bounds at
/// most one region. Runs that total fewer than two keyframes are dropped.
pub fn group_zoom_regions(keyframes: &[ZoomKeyframe]) -> Vec<ZoomRegion> {
    let n = keyframes.len();
    let mut regions = Vec::new();
    let mut consumed_until = 0;
    let mut i = 0;

    while i < n {
        if !keyframes[i].is_zoomed() {
            i += 1;
            continue;
        }

        let run_start = i;
        while i < n && keyframes[i].is_zoomed() {
            i += 1;
        }
        let run_end = i;

        let first = if run_start > consumed_until && !keyframes[run_start - 1].is_zoomed() {
            run_start - 1
        } else {
            run_start
        };
        let last = if run_end < n { run_end } else { run_end - 1 };

        if last <= first {
            continue;
        }
        consumed_until = last + 1;

        let run = &keyframes[run_start..run_end];
        let peak = run
            .iter()
            .max_by(|a, b| a.zoom_level.total_cmp(&b.zoom_level))
            .unwrap_or(&run[0]);
        let bounded = &keyframes[first..=last];

        regions.push(ZoomRegion {
            start_time: keyframes[first].time_secs,
            zoom_start_time: keyframes[run_start].time_secs,
            zoom_end_time: keyframes[run_end - 1].time_secs,
            end_time: keyframes[last].time_secs,
            peak_zoom: peak.zoom_level,
            center: peak.center(),
            is_auto: bounded.iter().all(|k| k.is_auto),
            keyframe_range: first..last + 1,
        });
    }

    regions
}

/// A zoom region requested by the user.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManualZoom {
    /// Hold start (fully zoomed).
    pub start_secs: f64,
    /// Hold end.
    pub end_secs: f64,
    pub zoom_level: f64,
    pub center: Point2D,
    /// Ease duration on each side of the hold.
    pub transition_secs: f64,
}

impl ManualZoom {
    /// The full span including eases, kept inside `[0, duration_secs]`
    /// (or the hold end, if that runs past the recording).
    pub fn span(&self, duration_secs: f64) -> (f64, f64) {
        let trans = self.transition_secs.max(0.0);
        (
            (self.start_secs - trans).max(0.0),
            (self.end_secs + trans).min(duration_secs.max(self.end_secs)),
        )
    }

    /// The four keyframes describing this zoom.
    pub fn keyframes(&self, duration_secs: f64) -> [ZoomKeyframe; 4] {
        let (ease_in, ease_out) = self.span(duration_secs);
        let (cx, cy) = (self.center.x, self.center.y);
        [
            ZoomKeyframe::new(ease_in, 1.0, cx, cy, false),
            ZoomKeyframe::new(self.start_secs, self.zoom_level, cx, cy, false),
            ZoomKeyframe::new(self.end_secs, self.zoom_level, cx, cy, false),
            ZoomKeyframe::new(ease_out, 1.0, cx, cy, false),
        ]
    }
}

/// Add a manual zoom region unless its span overlaps an existing region.
///
/// The overlap check only runs here. A later auto-zoom run may produce
/// regions that overlap this one's neighbours; that is not re-checked.
pub fn insert_manual_region(
    timeline: &ZoomTimeline,
    proposal: &ManualZoom,
    duration_secs: f64,
) -> bool {
    let well_formed = proposal.end_secs > proposal.start_secs
        && proposal.start_secs < duration_secs
        && proposal.zoom_level > 1.0;
    if !well_formed {
        tracing::debug!(?proposal, "Rejected degenerate manual zoom");
        return false;
    }

    let (start, end) = proposal.span(duration_secs);
    let existing = group_zoom_regions(&timeline.snapshot());
    if let Some(conflict) = existing.iter().find(|r| r.overlaps(start, end)) {
        tracing::debug!(
            start,
            end,
            conflict_start = conflict.start_time,
            conflict_end = conflict.end_time,
            "Rejected manual zoom overlapping an existing region"
        );
        return false;
    }

    for keyframe in proposal.keyframes(duration_secs) {
        timeline.add_keyframe(keyframe);
    }
    true
}

/// Remove every keyframe of the region containing `t`.
///
/// Returns the removed region, if one covered `t`.
pub fn remove_region_at(timeline: &ZoomTimeline, t: f64) -> Option<ZoomRegion> {
    let mut keyframes = timeline.snapshot();
    let region = group_zoom_regions(&keyframes)
        .into_iter()
        .find(|r| r.contains(t))?;
    keyframes.drain(region.keyframe_range.clone());
    timeline.set_keyframes(keyframes);
    Some(region)
}
