//! Display coordinates for regime nodes. View-layer helper only; nothing in
//! the transition logic reads these.

use serde::Serialize;

use crate::catalog::{RegimeId, REGIME_COUNT};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayoutGeometry {
    pub width: f64,
    pub height: f64,
    pub padding: f64,
    /// Rise of the middle node above the ends
    pub arc_height: f64,
}

impl Default for LayoutGeometry {
    fn default() -> Self {
        Self::new(800.0, 240.0, 60.0)
    }
}

impl LayoutGeometry {
    pub fn new(width: f64, height: f64, padding: f64) -> Self {
        let inner = (height - 2.0 * padding).max(0.0);
        Self {
            width,
            height,
            padding,
            arc_height: inner * 0.5,
        }
    }

    /// Nodes spaced evenly left to right on a shallow parabola peaking at
    /// the middle regime. y grows downward.
    pub fn position(&self, regime: RegimeId) -> Point {
        let last = (REGIME_COUNT - 1) as f64;
        let i = regime.index() as f64;
        let span = (self.width - 2.0 * self.padding).max(0.0);
        let x = self.padding + span * i / last;

        let mid = last / 2.0;
        let t = (i - mid) / mid;
        let baseline = self.height - self.padding;
        let y = baseline - self.arc_height * (1.0 - t * t);
        Point { x, y }
    }

    pub fn positions(&self) -> [Point; REGIME_COUNT] {
        RegimeId::ALL.map(|id| self.position(id))
    }
}
