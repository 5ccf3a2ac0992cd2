use serde::{Deserialize, Serialize};

/// Width/height pair of a pixel grid: a decoded frame, the displayed video,
/// or an overlay surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Per-axis factors that map coordinates in `self` onto `target`.
    ///
    /// Returns `(1.0, 1.0)` when `self` is empty, so degenerate sources never
    /// produce NaN coordinates.
    pub fn scale_to(&self, target: Dimensions) -> (f64, f64) {
        if self.is_empty() {
            return (1.0, 1.0);
        }
        (
            target.width as f64 / self.width as f64,
            target.height as f64 / self.height as f64,
        )
    }

    /// Largest size with the same aspect ratio that fits inside `bounds`.
    pub fn fit_within(&self, bounds: Dimensions) -> Dimensions {
        if self.is_empty() || bounds.is_empty() {
            return bounds;
        }
        let scale = (bounds.width as f64 / self.width as f64)
            .min(bounds.height as f64 / self.height as f64);
        Dimensions {
            width: ((self.width as f64 * scale).round() as u32).max(1),
            height: ((self.height as f64 * scale).round() as u32).max(1),
        }
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
