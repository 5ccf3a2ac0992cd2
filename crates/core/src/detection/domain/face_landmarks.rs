//! Ordered facial landmark points.
//!
//! Detectors emit a fixed number of points per model (5 for YOLO-pose,
//! 6 for BlazeFace). A point the model was not confident about is kept as
//! `None` so indices stay meaningful.

use serde::{Deserialize, Serialize};

pub type Point = (f64, f64);

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaceLandmarks {
    points: Vec<Option<Point>>,
}

impl FaceLandmarks {
    pub fn new(points: Vec<Option<Point>>) -> Self {
        Self { points }
    }

    /// All points visible.
    pub fn from_points(points: impl IntoIterator<Item = Point>) -> Self {
        Self::new(points.into_iter().map(Some).collect())
    }

    pub fn points(&self) -> &[Option<Point>] {
        &self.points
    }

    pub fn visible(&self) -> impl Iterator<Item = Point> + '_ {
        self.points.iter().flatten().copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn scaled(&self, sx: f64, sy: f64) -> Self {
        Self::new(
            self.points
                .iter()
                .map(|p| p.map(|(x, y)| (x * sx, y * sy)))
                .collect(),
        )
    }
}
