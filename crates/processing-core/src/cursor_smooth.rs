//! Cursor motion smoothing.
//!
//! Raw pointer samples arrive at irregular intervals and jitter. The smoother
//! runs a damped spring that chases each raw sample in turn and records where
//! the spring sits at that sample's timestamp, giving a stable trajectory with
//! the same timestamps as the input.

use std::sync::Arc;

use reframe_project_model::event::{ClickEvent, CursorMetadata, CursorSample};
use reframe_project_model::project::{CursorSettings, CursorSpeed};
use reframe_project_model::viewport::Point2D;

/// Largest integration step.
pub const MAX_STEP_SECS: f64 = 0.001;

/// Gaps this long or longer (and non-positive gaps) snap instead of animating.
/// They come from seeks and cuts, not from pointer motion.
pub const SNAP_GAP_SECS: f64 = 1.0;

/// Spring constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringParams {
    /// Stiffness: pull toward the target per unit distance.
    pub tension: f64,
    /// Damping: resistance per unit velocity.
    pub friction: f64,
    pub mass: f64,
}

impl SpringParams {
    pub const SLOW: SpringParams = SpringParams::new(80.0, 20.0, 3.0);
    pub const MELLOW: SpringParams = SpringParams::new(170.0, 26.0, 1.6);
    pub const QUICK: SpringParams = SpringParams::new(300.0, 34.0, 1.0);
    pub const RAPID: SpringParams = SpringParams::new(500.0, 44.0, 0.6);

    pub const fn new(tension: f64, friction: f64, mass: f64) -> Self {
        Self {
            tension,
            friction,
            mass,
        }
    }

    pub fn from_speed(speed: CursorSpeed) -> Self {
        match speed {
            CursorSpeed::Slow => Self::SLOW,
            CursorSpeed::Mellow => Self::MELLOW,
            CursorSpeed::Quick => Self::QUICK,
            CursorSpeed::Rapid => Self::RAPID,
            CursorSpeed::Custom {
                tension,
                friction,
                mass,
            } => Self::new(tension.max(0.0), friction.max(0.0), mass.max(1e-3)),
        }
    }
}

/// Damped-spring cursor smoother.
#[derive(Debug, Clone, Copy)]
pub struct CursorSmoother {
    params: SpringParams,
}

impl CursorSmoother {
    pub fn new(params: SpringParams) -> Self {
        Self { params }
    }

    pub fn from_speed(speed: CursorSpeed) -> Self {
        Self::new(SpringParams::from_speed(speed))
    }

    pub fn params(&self) -> SpringParams {
        self.params
    }

    /// Resample `raw` (sorted by time) through the spring.
    ///
    /// The output has one sample per input timestamp. The first sample passes
    /// through unchanged; pressure is carried from the raw sample.
    pub fn smooth(&self, raw: &[CursorSample]) -> Vec<CursorSample> {
        let Some(first) = raw.first() else {
            return vec![];
        };

        let SpringParams {
            tension,
            friction,
            mass,
        } = self.params;

        let mut out = Vec::with_capacity(raw.len());
        out.push(*first);

        let (mut px, mut py) = (first.x, first.y);
        let (mut vx, mut vy) = (0.0, 0.0);
        let mut prev_t = first.t;

        for target in &raw[1..] {
            let dt = target.t - prev_t;
            prev_t = target.t;

            if dt <= 0.0 || dt >= SNAP_GAP_SECS {
                px = target.x;
                py = target.y;
                vx = 0.0;
                vy = 0.0;
            } else {
                let steps = (dt / MAX_STEP_SECS).ceil().max(1.0) as usize;
                let h = dt / steps as f64;
                for _ in 0..steps {
                    let ax = (tension * (target.x - px) - friction * vx) / mass;
                    let ay = (tension * (target.y - py) - friction * vy) / mass;
                    vx += ax * h;
                    vy += ay * h;
                    px += vx * h;
                    py += vy * h;
                }
            }

            out.push(CursorSample {
                t: target.t,
                x: px,
                y: py,
                pressure: target.pressure,
            });
        }

        out
    }
}

/// Cursor position at time `t`, linearly interpolated between samples.
///
/// Before the first sample and after the last, the end sample is held.
pub fn position_at(samples: &[CursorSample], t: f64) -> Option<Point2D> {
    let first = samples.first()?;
    let last = samples.last()?;
    if t <= first.t {
        return Some(Point2D::new(first.x, first.y));
    }
    if t >= last.t {
        return Some(Point2D::new(last.x, last.y));
    }

    let idx = samples.partition_point(|s| s.t <= t);
    let a = &samples[idx - 1];
    let b = &samples[idx];
    let span = b.t - a.t;
    if span <= f64::EPSILON {
        return Some(Point2D::new(b.x, b.y));
    }
    let f = (t - a.t) / span;
    Some(Point2D::new(a.x + (b.x - a.x) * f, a.y + (b.y - a.y) * f))
}

/// Raw cursor stream plus its derived smoothed copy.
///
/// The raw stream never changes. The smoothed copy is rebuilt wholesale
/// whenever the smoothing settings change.
#[derive(Debug, Clone)]
pub struct CursorTrack {
    raw: Arc<[CursorSample]>,
    clicks: Arc<[ClickEvent]>,
    smoothed: Option<Arc<[CursorSample]>>,
    settings: CursorSettings,
}

impl CursorTrack {
    pub fn new(metadata: &CursorMetadata, settings: CursorSettings) -> Self {
        let mut track = Self {
            raw: metadata.samples.clone(),
            clicks: metadata.clicks.clone(),
            smoothed: None,
            settings,
        };
        track.rebuild();
        track
    }

    pub fn settings(&self) -> CursorSettings {
        self.settings
    }

    /// Change smoothing, regenerating the smoothed stream if anything changed.
    pub fn set_smoothing(&mut self, enabled: bool, speed: CursorSpeed) -> bool {
        let settings = CursorSettings {
            smoothing_enabled: enabled,
            speed,
        };
        if settings == self.settings {
            return false;
        }
        self.settings = settings;
        self.rebuild();
        true
    }

    fn rebuild(&mut self) {
        self.smoothed = if self.settings.smoothing_enabled {
            let smoothed = CursorSmoother::from_speed(self.settings.speed).smooth(&self.raw);
            tracing::debug!(
                samples = smoothed.len(),
                speed = self.settings.speed.name(),
                "Rebuilt smoothed cursor track"
            );
            Some(smoothed.into())
        } else {
            None
        };
    }

    pub fn raw(&self) -> &[CursorSample] {
        &self.raw
    }

    pub fn clicks(&self) -> &[ClickEvent] {
        &self.clicks
    }

    /// Samples the renderer should draw: smoothed when enabled, raw otherwise.
    pub fn active(&self) -> &[CursorSample] {
        self.smoothed.as_deref().unwrap_or(&self.raw)
    }

    /// Immutable view of the active samples and the clicks.
    pub fn snapshot(&self) -> CursorSnapshot {
        CursorSnapshot {
            samples: self.smoothed.clone().unwrap_or_else(|| self.raw.clone()),
            clicks: self.clicks.clone(),
        }
    }
}

/// Immutable cursor data handed to the renderer.
#[derive(Debug, Clone)]
pub struct CursorSnapshot {
    pub samples: Arc<[CursorSample]>,
    pub clicks: Arc<[ClickEvent]>,
}

impl CursorSnapshot {
    pub fn empty() -> Self {
        Self {
            samples: Arc::from(Vec::new()),
            clicks: Arc::from(Vec::new()),
        }
    }

    pub fn position_at(&self, t: f64) -> Option<Point2D> {
        position_at(&self.samples, t)
    }

    /// Whether a click happened within `window_secs` before `t`.
    pub fn recent_click(&self, t: f64, window_secs: f64) -> Option<&ClickEvent> {
        let idx = self.clicks.partition_point(|c| c.t <= t);
        idx.checked_sub(1)
            .map(|i| &self.clicks[i])
            .filter(|c| t - c.t <= window_secs)
    }
}
