//! Normalized frame geometry shared by the zoom timeline and the compositor.
//!
//! `(0, 0)` is the top-left of the recorded screen and `(1, 1)` its
//! bottom-right, independent of capture resolution.

use serde::{Deserialize, Serialize};

/// Smallest side a viewport may shrink to (a 100x zoom).
const MIN_SIDE: f64 = 0.01;

/// The visible part of the recorded screen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Viewport {
    /// The whole screen, unzoomed.
    pub const FULL: Viewport = Viewport {
        x: 0.0,
        y: 0.0,
        w: 1.0,
        h: 1.0,
    };

    /// A `w` x `h` window around `(cx, cy)`, slid back inside the frame if
    /// the focus sits near an edge.
    pub fn centered(cx: f64, cy: f64, w: f64, h: f64) -> Self {
        let w = w.clamp(MIN_SIDE, 1.0);
        let h = h.clamp(MIN_SIDE, 1.0);
        Self {
            x: (cx - w * 0.5).clamp(0.0, 1.0 - w),
            y: (cy - h * 0.5).clamp(0.0, 1.0 - h),
            w,
            h,
        }
    }

    /// Square window of side `1 / zoom_level` focused on `(cx, cy)`.
    /// `zoom_level <= 1` (or NaN) is the full frame.
    pub fn for_zoom(zoom_level: f64, cx: f64, cy: f64) -> Self {
        if zoom_level.is_nan() || zoom_level <= 1.0 {
            return Self::FULL;
        }
        let side = zoom_level.recip();
        Self::centered(cx, cy, side, side)
    }

    pub fn center(&self) -> Point2D {
        Point2D::new(self.x + self.w * 0.5, self.y + self.h * 0.5)
    }

    pub fn right(&self) -> f64 {
        (self.x + self.w).min(1.0)
    }

    pub fn bottom(&self) -> f64 {
        (self.y + self.h).min(1.0)
    }

    pub fn is_zoomed(&self) -> bool {
        self.w.min(self.h) < 1.0 - 1e-9
    }

    /// Magnification of the tighter axis; `2.0` shows a quarter of the screen.
    pub fn zoom_factor(&self) -> f64 {
        self.w.min(self.h).recip()
    }

    /// Same size, new focus; still kept inside the frame.
    pub fn recentered(&self, focus: Point2D) -> Viewport {
        Self::centered(focus.x, focus.y, self.w, self.h)
    }

    /// Map a screen point into this window's own `[0, 1]` space.
    ///
    /// Points the window does not show map to `None`.
    pub fn to_local(&self, px: f64, py: f64) -> Option<(f64, f64)> {
        let inside = (self.x..=self.right()).contains(&px) && (self.y..=self.bottom()).contains(&py);
        inside.then(|| ((px - self.x) / self.w, (py - self.y) / self.h))
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::FULL
    }
}

/// A normalized screen position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Straight-line blend from `a` to `b`; `t` is clamped to `[0, 1]`.
    pub fn lerp(a: &Point2D, b: &Point2D, t: f64) -> Point2D {
        let t = t.clamp(0.0, 1.0);
        Point2D::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
    }
}
