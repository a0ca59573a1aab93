//! Region tracks: ordered, non-overlapping time intervals with a per-kind payload.
//!
//! Every interval track in the editor (video cuts, both audio tracks, camera
//! layout, spotlight) shares one editing algebra, [`RegionTrack`]. Edits come
//! from direct-manipulation gestures, so they never fail: out-of-range values
//! are clamped against the neighbouring regions and the timeline bounds, and
//! edits that cannot be satisfied are ignored.
//!
//! Invariants held after every operation:
//! - regions are sorted ascending by start
//! - regions never overlap
//! - `end - start >= EDIT_EPSILON_SECS`

use serde::{Deserialize, Serialize};

use crate::viewport::Viewport;

/// Identifier of a region, unique within its track.
pub type RegionId = u64;

/// Smallest width a newly inserted region may have, and the smallest free gap
/// an insertion will use.
pub const MIN_INSERT_WIDTH_SECS: f64 = 0.05;

/// Spacing kept between a new region and its neighbours.
pub const GAP_MARGIN_SECS: f64 = 0.05;

/// Minimum width preserved by resize and move edits.
pub const EDIT_EPSILON_SECS: f64 = 0.01;

/// The tracks that carry regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackKind {
    VideoCut,
    SystemAudio,
    Microphone,
    Camera,
    Spotlight,
}

impl TrackKind {
    /// All region track kinds, in display order.
    pub const ALL: [TrackKind; 5] = [
        TrackKind::VideoCut,
        TrackKind::SystemAudio,
        TrackKind::Microphone,
        TrackKind::Camera,
        TrackKind::Spotlight,
    ];

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            TrackKind::VideoCut => "Video",
            TrackKind::SystemAudio => "System audio",
            TrackKind::Microphone => "Microphone",
            TrackKind::Camera => "Camera",
            TrackKind::Spotlight => "Spotlight",
        }
    }
}

/// A half-open time interval `[start_secs, end_secs)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start_secs: f64,
    pub end_secs: f64,
}

impl TimeRange {
    pub fn new(start_secs: f64, end_secs: f64) -> Self {
        Self {
            start_secs,
            end_secs,
        }
    }

    pub fn duration(&self) -> f64 {
        (self.end_secs - self.start_secs).max(0.0)
    }

    pub fn contains(&self, t: f64) -> bool {
        t >= self.start_secs && t < self.end_secs
    }

    /// Strict overlap: ranges that only touch do not overlap.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start_secs < other.end_secs && other.start_secs < self.end_secs
    }
}

/// Behaviour shared by every region payload type.
pub trait RegionPayload: Clone + Default + PartialEq + std::fmt::Debug {
    /// The track this payload belongs to.
    const KIND: TrackKind;

    /// Half of the width a region gets when inserted at a point.
    const HALF_WIDTH_SECS: f64;
}

/// One interval on a track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region<P> {
    pub id: RegionId,
    pub start_secs: f64,
    pub end_secs: f64,
    pub payload: P,
}

impl<P> Region<P> {
    pub fn range(&self) -> TimeRange {
        TimeRange::new(self.start_secs, self.end_secs)
    }

    pub fn duration(&self) -> f64 {
        self.end_secs - self.start_secs
    }

    pub fn contains(&self, t: f64) -> bool {
        t >= self.start_secs && t < self.end_secs
    }
}

/// Visual transition style at a region boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    #[default]
    None,
    Fade,
    Scale,
    Slide,
}

/// A transition applied when entering or leaving a region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub kind: TransitionKind,
    pub duration_secs: f64,
}

impl Transition {
    pub fn new(kind: TransitionKind, duration_secs: f64) -> Self {
        Self {
            kind,
            duration_secs: duration_secs.max(0.0),
        }
    }

    /// Whether this transition changes anything on screen.
    pub fn is_visible(&self) -> bool {
        self.kind != TransitionKind::None && self.duration_secs > 0.0
    }
}

/// Kept range of the recording, with optional boundary transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct VideoCut {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<Transition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit: Option<Transition>,
}

impl VideoCut {
    pub fn has_transitions(&self) -> bool {
        self.entry.is_some_and(|t| t.is_visible()) || self.exit.is_some_and(|t| t.is_visible())
    }
}

impl RegionPayload for VideoCut {
    const KIND: TrackKind = TrackKind::VideoCut;
    const HALF_WIDTH_SECS: f64 = 5.0;
}

/// Audible window on an audio track. Time not covered by a region is muted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioGain {
    /// Linear gain multiplier applied inside the window.
    #[serde(default = "unit_gain")]
    pub gain: f64,
}

fn unit_gain() -> f64 {
    1.0
}

impl Default for AudioGain {
    fn default() -> Self {
        Self { gain: unit_gain() }
    }
}

/// Shared by both audio tracks; build the microphone track with
/// [`RegionTrack::for_kind`] so it reports [`TrackKind::Microphone`].
impl RegionPayload for AudioGain {
    const KIND: TrackKind = TrackKind::SystemAudio;
    const HALF_WIDTH_SECS: f64 = 5.0;
}

/// Webcam presentation inside a camera region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CameraMode {
    /// Webcam fills the frame.
    #[default]
    Fullscreen,
    /// Webcam hidden.
    Hidden,
    /// Picture-in-picture with per-region overrides of the global camera style.
    Custom(CameraOverrides),
}

/// Optional overrides of the global camera layout for one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CameraOverrides {
    pub rect: Option<Viewport>,
    pub aspect_ratio: Option<f64>,
    pub corner_radius: Option<f64>,
    pub shadow: Option<f64>,
    pub border: Option<CameraBorder>,
    pub mirrored: Option<bool>,
    pub entry: Option<Transition>,
    pub exit: Option<Transition>,
}

/// Border drawn around the webcam overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraBorder {
    pub width: f64,
    pub color: String,
}

/// Camera layout region payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CameraRegion {
    pub mode: CameraMode,
}

impl RegionPayload for CameraRegion {
    const KIND: TrackKind = TrackKind::Camera;
    const HALF_WIDTH_SECS: f64 = 3.0;
}

/// Spotlight (dim everything but the cursor area) region payload.
///
/// Unset fields use the global spotlight style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Spotlight {
    pub radius: Option<f64>,
    pub dim: Option<f64>,
    pub softness: Option<f64>,
    pub fade_secs: Option<f64>,
}

impl RegionPayload for Spotlight {
    const KIND: TrackKind = TrackKind::Spotlight;
    const HALF_WIDTH_SECS: f64 = 2.0;
}

/// An ordered list of regions over a timeline of known duration.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionTrack<P> {
    kind: TrackKind,
    duration_secs: f64,
    regions: Vec<Region<P>>,
    next_id: RegionId,
}

impl<P: RegionPayload> RegionTrack<P> {
    /// Empty track over `[0, duration_secs]`.
    pub fn new(duration_secs: f64) -> Self {
        Self::for_kind(P::KIND, duration_secs)
    }

    /// Empty track for a kind other than the payload's default.
    pub fn for_kind(kind: TrackKind, duration_secs: f64) -> Self {
        Self {
            kind,
            duration_secs: duration_secs.max(0.0),
            regions: Vec::new(),
            next_id: 1,
        }
    }

    /// Rebuild a track from persisted regions.
    ///
    /// Regions are sorted; any region that is too short, out of bounds, or
    /// overlaps an earlier one is dropped.
    pub fn from_regions(duration_secs: f64, regions: Vec<Region<P>>) -> Self {
        Self::from_regions_as(P::KIND, duration_secs, regions)
    }

    /// [`RegionTrack::from_regions`] for a kind other than the payload's default.
    pub fn from_regions_as(
        kind: TrackKind,
        duration_secs: f64,
        mut regions: Vec<Region<P>>,
    ) -> Self {
        let duration_secs = duration_secs.max(0.0);
        regions.sort_by(|a, b| a.start_secs.total_cmp(&b.start_secs));

        let mut kept: Vec<Region<P>> = Vec::with_capacity(regions.len());
        for mut region in regions {
            region.start_secs = region.start_secs.max(0.0);
            region.end_secs = region.end_secs.min(duration_secs);
            let overlaps_prev = kept
                .last()
                .is_some_and(|prev| region.start_secs < prev.end_secs);
            if overlaps_prev || region.duration() < EDIT_EPSILON_SECS {
                tracing::warn!(
                    track = kind.label(),
                    id = region.id,
                    "Dropping invalid region while loading track"
                );
                continue;
            }
            kept.push(region);
        }

        let next_id = kept.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        Self {
            kind,
            duration_secs,
            regions: kept,
            next_id,
        }
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn duration(&self) -> f64 {
        self.duration_secs
    }

    /// Change the timeline duration, trimming or dropping regions past the end.
    pub fn set_duration(&mut self, duration_secs: f64) {
        self.duration_secs = duration_secs.max(0.0);
        let end = self.duration_secs;
        self.regions.retain_mut(|region| {
            region.end_secs = region.end_secs.min(end);
            region.duration() >= EDIT_EPSILON_SECS
        });
    }

    pub fn regions(&self) -> &[Region<P>] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn get(&self, id: RegionId) -> Option<&Region<P>> {
        self.regions.iter().find(|r| r.id == id)
    }

    /// The region covering `t`, if any.
    pub fn region_at(&self, t: f64) -> Option<&Region<P>> {
        let idx = self.regions.partition_point(|r| r.end_secs <= t);
        self.regions.get(idx).filter(|r| r.contains(t))
    }

    /// Insert a region centered on `t` inside the free gap containing `t`.
    ///
    /// Returns `None` when `t` is outside the timeline, inside an existing
    /// region, or when the gap is too narrow to hold a region.
    pub fn add_at(&mut self, t: f64) -> Option<RegionId> {
        if !t.is_finite() || t < 0.0 || t > self.duration_secs {
            return None;
        }

        let idx = self.regions.partition_point(|r| r.end_secs <= t);
        if self
            .regions
            .get(idx)
            .is_some_and(|r| r.start_secs <= t)
        {
            return None;
        }

        let lo = match idx.checked_sub(1) {
            Some(prev) => self.regions[prev].end_secs + GAP_MARGIN_SECS,
            None => 0.0,
        };
        let hi = match self.regions.get(idx) {
            Some(next) => next.start_secs - GAP_MARGIN_SECS,
            None => self.duration_secs,
        };
        if hi - lo < MIN_INSERT_WIDTH_SECS {
            return None;
        }

        let mut start = (t - P::HALF_WIDTH_SECS).max(lo);
        let mut end = (t + P::HALF_WIDTH_SECS).min(hi);
        if end - start < MIN_INSERT_WIDTH_SECS {
            start = start.min(hi - MIN_INSERT_WIDTH_SECS).max(lo);
            end = start + MIN_INSERT_WIDTH_SECS;
        }

        Some(self.insert_unchecked(start, end, P::default()))
    }

    /// Insert a region with explicit bounds and payload.
    ///
    /// Returns `None` if the range is too short, out of bounds, or overlaps
    /// an existing region.
    pub fn insert(&mut self, start_secs: f64, end_secs: f64, payload: P) -> Option<RegionId> {
        let range = TimeRange::new(start_secs, end_secs);
        let valid = start_secs.is_finite()
            && end_secs.is_finite()
            && start_secs >= 0.0
            && end_secs <= self.duration_secs
            && range.duration() >= EDIT_EPSILON_SECS
            && !self.regions.iter().any(|r| r.range().overlaps(&range));
        if !valid {
            return None;
        }
        Some(self.insert_unchecked(start_secs, end_secs, payload))
    }

    /// Move a region's start edge, clamped to `[prev_end, end - ε]`.
    pub fn update_start(&mut self, id: RegionId, start_secs: f64) -> bool {
        let Some(i) = self.index_of(id) else {
            return false;
        };
        if start_secs.is_nan() {
            return false;
        }

        let lo = if i > 0 {
            self.regions[i - 1].end_secs
        } else {
            0.0
        };
        let hi = self.regions[i].end_secs - EDIT_EPSILON_SECS;
        let clamped = start_secs.max(lo).min(hi);

        let changed = clamped != self.regions[i].start_secs;
        self.regions[i].start_secs = clamped;
        self.sort();
        changed
    }

    /// Move a region's end edge, clamped to `[start + ε, next_start]`.
    pub fn update_end(&mut self, id: RegionId, end_secs: f64) -> bool {
        let Some(i) = self.index_of(id) else {
            return false;
        };
        if end_secs.is_nan() {
            return false;
        }

        let lo = self.regions[i].start_secs + EDIT_EPSILON_SECS;
        let hi = match self.regions.get(i + 1) {
            Some(next) => next.start_secs,
            None => self.duration_secs,
        };
        let clamped = end_secs.min(hi).max(lo);

        let changed = clamped != self.regions[i].end_secs;
        self.regions[i].end_secs = clamped;
        self.sort();
        changed
    }

    /// Move a region to a new start, preserving its duration and staying
    /// between its neighbours.
    pub fn move_to(&mut self, id: RegionId, new_start_secs: f64) -> bool {
        let Some(i) = self.index_of(id) else {
            return false;
        };
        if new_start_secs.is_nan() {
            return false;
        }

        let duration = self.regions[i].duration();
        let lo = if i > 0 {
            self.regions[i - 1].end_secs
        } else {
            0.0
        };
        let hi = match self.regions.get(i + 1) {
            Some(next) => next.start_secs - duration,
            None => self.duration_secs - duration,
        };
        let start = new_start_secs.min(hi).max(lo);

        let changed = start != self.regions[i].start_secs;
        self.regions[i].start_secs = start;
        self.regions[i].end_secs = start + duration;
        self.sort();
        changed
    }

    /// Edit a region's payload in place.
    pub fn update_payload(&mut self, id: RegionId, edit: impl FnOnce(&mut P)) -> bool {
        match self.regions.iter_mut().find(|r| r.id == id) {
            Some(region) => {
                let before = region.payload.clone();
                edit(&mut region.payload);
                region.payload != before
            }
            None => false,
        }
    }

    /// Delete a region. Neighbours are unaffected.
    pub fn remove(&mut self, id: RegionId) -> bool {
        let before = self.regions.len();
        self.regions.retain(|r| r.id != id);
        self.regions.len() != before
    }

    /// Covered intervals, in order.
    pub fn windows(&self) -> Vec<TimeRange> {
        self.regions.iter().map(Region::range).collect()
    }

    /// Uncovered intervals within `[0, duration]`, in order.
    pub fn complement(&self) -> Vec<TimeRange> {
        let mut gaps = Vec::new();
        let mut cursor = 0.0;
        for region in &self.regions {
            if region.start_secs > cursor {
                gaps.push(TimeRange::new(cursor, region.start_secs));
            }
            cursor = region.end_secs;
        }
        if self.duration_secs > cursor {
            gaps.push(TimeRange::new(cursor, self.duration_secs));
        }
        gaps
    }

    /// Consume the track into its regions.
    pub fn into_regions(self) -> Vec<Region<P>> {
        self.regions
    }

    fn insert_unchecked(&mut self, start_secs: f64, end_secs: f64, payload: P) -> RegionId {
        let id = self.next_id;
        self.next_id += 1;
        let idx = self.regions.partition_point(|r| r.start_secs < start_secs);
        self.regions.insert(
            idx,
            Region {
                id,
                start_secs,
                end_secs,
                payload,
            },
        );
        id
    }

    fn index_of(&self, id: RegionId) -> Option<usize> {
        self.regions.iter().position(|r| r.id == id)
    }

    fn sort(&mut self) {
        self.regions
            .sort_by(|a, b| a.start_secs.total_cmp(&b.start_secs));
    }
}

/// Kind-erased editing surface over a region track.
///
/// Lets the editor dispatch gestures by [`TrackKind`] without knowing the
/// payload type.
pub trait RegionEditing {
    fn kind(&self) -> TrackKind;
    fn add_at(&mut self, t: f64) -> Option<RegionId>;
    fn update_start(&mut self, id: RegionId, start_secs: f64) -> bool;
    fn update_end(&mut self, id: RegionId, end_secs: f64) -> bool;
    fn move_to(&mut self, id: RegionId, new_start_secs: f64) -> bool;
    fn remove(&mut self, id: RegionId) -> bool;
    fn windows(&self) -> Vec<TimeRange>;
    fn region_count(&self) -> usize;
}

impl<P: RegionPayload> RegionEditing for RegionTrack<P> {
    fn kind(&self) -> TrackKind {
        self.kind
    }

    fn add_at(&mut self, t: f64) -> Option<RegionId> {
        RegionTrack::add_at(self, t)
    }

    fn update_start(&mut self, id: RegionId, start_secs: f64) -> bool {
        RegionTrack::update_start(self, id, start_secs)
    }

    fn update_end(&mut self, id: RegionId, end_secs: f64) -> bool {
        RegionTrack::update_end(self, id, end_secs)
    }

    fn move_to(&mut self, id: RegionId, new_start_secs: f64) -> bool {
        RegionTrack::move_to(self, id, new_start_secs)
    }

    fn remove(&mut self, id: RegionId) -> bool {
        RegionTrack::remove(self, id)
    }

    fn windows(&self) -> Vec<TimeRange> {
        RegionTrack::windows(self)
    }

    fn region_count(&self) -> usize {
        self.len()
    }
}
