//! Auto-Zoom analysis: zoom in where the user clicks.
//!
//! # Algorithm
//!
//! 1. **Cluster** clicks by dwell time: a click joins the current region when
//!    it follows the region's last click by less than the dwell threshold.
//! 2. **Centroid**: running mean of the clicks in each region.
//! 3. **Keyframes**: four per region (ease-in, hold start, hold end, ease-out).
//! 4. **Apply**: auto keyframes on the timeline are replaced wholesale; manual
//!    zooms that collide with a new auto region are dropped.

use serde::Serialize;

use reframe_project_model::event::ClickEvent;
use reframe_project_model::timeline::{ZoomKeyframe, ZoomTimeline};
use reframe_project_model::viewport::Point2D;

use crate::zoom_regions::group_zoom_regions;

/// Shortest hold a generated region gets, regardless of the dwell threshold.
pub const MIN_HOLD_SECS: f64 = 0.5;

/// Configuration for the auto-zoom detector.
#[derive(Debug, Clone)]
pub struct AutoZoomConfig {
    /// Zoom level of generated holds.
    pub zoom_level: f64,

    /// Clicks closer together than this join the same region (seconds).
    pub dwell_threshold_secs: f64,

    /// Ease duration before and after each hold (seconds).
    pub transition_duration_secs: f64,
}

impl Default for AutoZoomConfig {
    fn default() -> Self {
        Self {
            zoom_level: 2.0,
            dwell_threshold_secs: 1.5,
            transition_duration_secs: 0.6,
        }
    }
}

/// A burst of clicks to zoom into.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClickRegion {
    /// Time of the first click.
    pub start_secs: f64,
    /// Time of the last click.
    pub end_secs: f64,
    pub centroid: Point2D,
    pub click_count: usize,
}

/// Outcome of applying a detector run to a timeline.
#[derive(Debug, Clone, Serialize)]
pub struct AutoZoomReport {
    pub regions: Vec<ClickRegion>,
    pub keyframes_added: usize,
    pub manual_keyframes_dropped: usize,
}

/// The auto-zoom detector.
pub struct AutoZoomAnalyzer {
    config: AutoZoomConfig,
}

impl AutoZoomAnalyzer {
    pub fn new(config: AutoZoomConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(AutoZoomConfig::default())
    }

    pub fn config(&self) -> &AutoZoomConfig {
        &self.config
    }

    /// Cluster clicks (sorted by time) into regions.
    pub fn detect_click_regions(&self, clicks: &[ClickEvent]) -> Vec<ClickRegion> {
        let mut regions: Vec<ClickRegion> = Vec::new();

        for click in clicks {
            match regions.last_mut() {
                Some(current) if click.t - current.end_secs < self.config.dwell_threshold_secs => {
                    let n = current.click_count as f64;
                    current.centroid = Point2D::new(
                        (current.centroid.x * n + click.x) / (n + 1.0),
                        (current.centroid.y * n + click.y) / (n + 1.0),
                    );
                    current.click_count += 1;
                    current.end_secs = click.t;
                }
                _ => regions.push(ClickRegion {
                    start_secs: click.t,
                    end_secs: click.t,
                    centroid: Point2D::new(click.x, click.y),
                    click_count: 1,
                }),
            }
        }

        regions
    }

    /// Hold duration for every region.
    pub fn hold_secs(&self) -> f64 {
        self.config.dwell_threshold_secs.max(MIN_HOLD_SECS)
    }

    /// End of a region's hold, kept inside the recording.
    fn hold_end(&self, region: &ClickRegion, duration_secs: f64) -> f64 {
        region
            .end_secs
            .max(region.start_secs + self.hold_secs())
            .min(duration_secs.max(region.end_secs))
    }

    /// The ease-in..ease-out span a region will occupy.
    pub fn region_span(&self, region: &ClickRegion, duration_secs: f64) -> (f64, f64) {
        let trans = self.config.transition_duration_secs.max(0.0);
        let hold_end = self.hold_end(region, duration_secs);
        (
            (region.start_secs - trans).max(0.0),
            (hold_end + trans).min(duration_secs.max(hold_end)),
        )
    }

    /// Four auto keyframes per region, sorted by time.
    pub fn generate_keyframes(&self, regions: &[ClickRegion], duration_secs: f64) -> Vec<ZoomKeyframe> {
        let zoom = self.config.zoom_level;
        let mut keyframes = Vec::with_capacity(regions.len() * 4);

        for region in regions {
            let (ease_in, ease_out) = self.region_span(region, duration_secs);
            let hold_end = self.hold_end(region, duration_secs);
            let (cx, cy) = (region.centroid.x, region.centroid.y);

            keyframes.push(ZoomKeyframe::new(ease_in, 1.0, cx, cy, true));
            keyframes.push(ZoomKeyframe::new(region.start_secs, zoom, cx, cy, true));
            keyframes.push(ZoomKeyframe::new(hold_end, zoom, cx, cy, true));
            keyframes.push(ZoomKeyframe::new(ease_out, 1.0, cx, cy, true));
        }

        keyframes.sort_by(|a, b| a.time_secs.total_cmp(&b.time_secs));
        keyframes
    }

    /// Detect regions and generate their keyframes.
    pub fn analyze(&self, clicks: &[ClickEvent], duration_secs: f64) -> (Vec<ClickRegion>, Vec<ZoomKeyframe>) {
        let regions = self.detect_click_regions(clicks);
        let keyframes = self.generate_keyframes(&regions, duration_secs);
        (regions, keyframes)
    }

    /// Run the detector and replace the timeline's auto keyframes.
    ///
    /// Manual keyframes survive unless their span overlaps one of the new auto
    /// regions. A grouped manual keyframe's span is its whole zoom region; an
    /// ungrouped one's span is its instant.
    pub fn apply_to_timeline(
        &self,
        timeline: &ZoomTimeline,
        clicks: &[ClickEvent],
        duration_secs: f64,
    ) -> AutoZoomReport {
        let (regions, keyframes) = self.analyze(clicks, duration_secs);
        let auto_spans: Vec<(f64, f64)> = regions
            .iter()
            .map(|r| self.region_span(r, duration_secs))
            .collect();
        let keyframes_added = keyframes.len();

        let manual_keyframes_dropped = timeline.replace_auto(keyframes, |current| {
            manual_indices_overlapping(current, &auto_spans)
        });

        tracing::info!(
            regions = regions.len(),
            keyframes = keyframes_added,
            manual_dropped = manual_keyframes_dropped,
            "Auto-zoom applied"
        );

        AutoZoomReport {
            regions,
            keyframes_added,
            manual_keyframes_dropped,
        }
    }
}

/// Indices (into `current`) of manual keyframes whose span overlaps any of
/// `spans`.
fn manual_indices_overlapping(current: &[ZoomKeyframe], spans: &[(f64, f64)]) -> Vec<usize> {
    let manual_idx: Vec<usize> = (0..current.len()).filter(|&i| !current[i].is_auto).collect();
    let manual: Vec<ZoomKeyframe> = manual_idx.iter().map(|&i| current[i]).collect();

    let mut grouped = vec![false; manual.len()];
    let mut dropped = Vec::new();

    for region in group_zoom_regions(&manual) {
        for i in region.keyframe_range.clone() {
            grouped[i] = true;
        }
        if spans.iter().any(|&(s, e)| region.overlaps(s, e)) {
            dropped.extend(region.keyframe_range.map(|i| manual_idx[i]));
        }
    }

    for (i, keyframe) in manual.iter().enumerate() {
        let t = keyframe.time_secs;
        if !grouped[i] && spans.iter().any(|&(s, e)| t >= s && t <= e) {
            dropped.push(manual_idx[i]);
        }
    }

    dropped
}

#[cfg(test)]
mod tests {
    use super::*;
    use reframe_project_model::event::MouseButton;

    fn click(t: f64, x: f64, y: f64) -> ClickEvent {
        ClickEvent {
            t,
            x,
            y,
            button: MouseButton::Left,
        }
    }

    fn analyzer(threshold: f64) -> AutoZoomAnalyzer {
        AutoZoomAnalyzer::new(AutoZoomConfig {
            zoom_level: 2.0,
            dwell_threshold_secs: threshold,
            transition_duration_secs: 0.5,
        })
    }

    #[test]
    fn test_burst_of_clicks_forms_one_region() {
        let clicks = vec![click(1.0, 0.2, 0.3), click(1.2, 0.4, 0.5), click(1.4, 0.6, 0.1)];
        let (regions, keyframes) = analyzer(0.5).analyze(&clicks, 10.0);

        assert_eq!(regions.len(), 1);
        assert_eq!(keyframes.len(), 4);
        assert_eq!(regions[0].click_count, 3);
        assert!((regions[0].centroid.x - 0.4).abs() < 1e-9);
        assert!((regions[0].centroid.y - 0.3).abs() < 1e-9);
        assert!(keyframes.iter().all(|k| k.is_auto));
    }

    #[test]
    fn test_gap_at_threshold_starts_new_region() {
        let clicks = vec![click(1.0, 0.5, 0.5), click(2.0, 0.5, 0.5), click(2.5, 0.5, 0.5)];
        let regions = analyzer(1.0).detect_click_regions(&clicks);
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[1].click_count, 2);
    }

    #[test]
    fn test_keyframe_layout() {
        let clicks = vec![click(3.0, 0.5, 0.5), click(3.2, 0.5, 0.5)];
        let (_, keyframes) = analyzer(0.3).analyze(&clicks, 10.0);

        let layout: Vec<(f64, f64)> = keyframes.iter().map(|k| (k.time_secs, k.zoom_level)).collect();
        // hold = max(0.3, 0.5) so the hold ends at 3.5 even though the last click is at 3.2.
        assert_eq!(layout, vec![(2.5, 1.0), (3.0, 2.0), (3.5, 2.0), (4.0, 1.0)]);
    }

    #[test]
    fn test_keyframes_clamped_to_recording() {
        let clicks = vec![click(0.1, 0.5, 0.5), click(9.8, 0.5, 0.5)];
        let (_, keyframes) = analyzer(0.5).analyze(&clicks, 10.0);
        assert_eq!(keyframes.first().unwrap().time_secs, 0.0);
        assert_eq!(keyframes.last().unwrap().time_secs, 10.0);
    }

    #[test]
    fn test_apply_replaces_auto_and_drops_colliding_manual() {
        let timeline = ZoomTimeline::from_keyframes(vec![
            // Old auto region, always replaced.
            ZoomKeyframe::new(20.0, 2.0, 0.5, 0.5, true),
            // Manual region [0.5, 2.8] collides with the new auto region [2.5, 4.0].
            ZoomKeyframe::manual(0.5, 1.0, 0.5, 0.5),
            ZoomKeyframe::manual(1.0, 3.0, 0.5, 0.5),
            ZoomKeyframe::manual(2.0, 3.0, 0.5, 0.5),
            ZoomKeyframe::manual(2.8, 1.0, 0.5, 0.5),
            // Manual region far away survives.
            ZoomKeyframe::manual(7.0, 1.0, 0.5, 0.5),
            ZoomKeyframe::manual(7.5, 2.0, 0.5, 0.5),
            ZoomKeyframe::manual(8.0, 1.0, 0.5, 0.5),
        ]);

        let clicks = vec![click(3.0, 0.2, 0.2)];
        let report = analyzer(0.5).apply_to_timeline(&timeline, &clicks, 30.0);

        assert_eq!(report.keyframes_added, 4);
        assert_eq!(report.manual_keyframes_dropped, 4);

        let snapshot = timeline.snapshot();
        assert_eq!(snapshot.len(), 7);
        assert!(!snapshot.iter().any(|k| k.is_auto && k.time_secs == 20.0));
        assert!(snapshot.iter().any(|k| !k.is_auto && k.time_secs == 7.5));
    }

    #[test]
    fn test_apply_drops_ungrouped_manual_inside_auto_span() {
        let timeline = ZoomTimeline::from_keyframes(vec![
            ZoomKeyframe::manual(3.2, 1.0, 0.5, 0.5),
            ZoomKeyframe::manual(9.0, 1.0, 0.5, 0.5),
        ]);
        let report = analyzer(0.5).apply_to_timeline(&timeline, &[click(3.0, 0.5, 0.5)], 30.0);
        assert_eq!(report.manual_keyframes_dropped, 1);
        assert_eq!(timeline.len(), 5);
    }

    #[test]
    fn test_no_clicks_clears_auto() {
        let timeline = ZoomTimeline::from_keyframes(vec![ZoomKeyframe::new(1.0, 2.0, 0.5, 0.5, true)]);
        let report = AutoZoomAnalyzer::with_defaults().apply_to_timeline(&timeline, &[], 10.0);
        assert!(report.regions.is_empty());
        assert!(timeline.is_empty());
    }
}
