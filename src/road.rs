//! L shaped road geometry.
//!
//! A vertical segment centred on `x = x_vert` runs from `y = 0` up to a horizontal segment centred
//! on `y = y_horiz`, which runs from the vertical segment to `x = -width`. Both segments are
//! `width` wide.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::error::{require, EstimateResult};

/// Direction of travel along a road segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Segment {
    /// Along the vertical segment, towards +y
    Vertical,
    /// Along the horizontal segment, towards -x
    Horizontal,
}

impl Segment {
    /// Unit direction of travel.
    pub fn direction(self) -> Vector2<f64> {
        match self {
            Segment::Vertical => Vector2::new(0., 1.),
            Segment::Horizontal => Vector2::new(-1., 0.),
        }
    }

    /// Unit direction across the road.
    pub fn across(self) -> Vector2<f64> {
        match self {
            Segment::Vertical => Vector2::new(1., 0.),
            Segment::Horizontal => Vector2::new(0., 1.),
        }
    }
}

/// Segments containing a position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Location {
    Off,
    On(Segment),
    /// Where both segments overlap
    Intersection,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoadGeometry {
    /// x coordinate of the vertical segment's centre line
    pub x_vert: f64,
    /// y coordinate of the horizontal segment's centre line
    pub y_horiz: f64,
    pub width: f64,
}

impl Default for RoadGeometry {
    fn default() -> Self {
        RoadGeometry {
            x_vert: 5.,
            y_horiz: 10.,
            width: 2.,
        }
    }
}

impl RoadGeometry {
    pub fn validate(&self) -> EstimateResult<()> {
        require(
            self.x_vert.is_finite() && self.y_horiz.is_finite() && self.width.is_finite(),
            "road geometry must be finite",
        )?;
        require(self.width > 0., format!("road width {} must be positive", self.width))?;
        require(self.y_horiz + self.width / 2. > 0., "horizontal segment below the vertical segment's start")?;
        require(
            self.x_vert + self.width / 2. > -self.width,
            "vertical segment beyond the horizontal segment's end",
        )
    }

    pub fn in_vertical(&self, p: &Vector2<f64>) -> bool {
        let half = self.width / 2.;
        (p.x - self.x_vert).abs() <= half && p.y >= 0. && p.y <= self.y_horiz + half
    }

    pub fn in_horizontal(&self, p: &Vector2<f64>) -> bool {
        let half = self.width / 2.;
        (p.y - self.y_horiz).abs() <= half && p.x >= -self.width && p.x <= self.x_vert + half
    }

    /// The on road predicate.
    pub fn on_road(&self, p: &Vector2<f64>) -> bool {
        self.in_vertical(p) || self.in_horizontal(p)
    }

    pub fn locate(&self, p: &Vector2<f64>) -> Location {
        match (self.in_vertical(p), self.in_horizontal(p)) {
            (true, true) => Location::Intersection,
            (true, false) => Location::On(Segment::Vertical),
            (false, true) => Location::On(Segment::Horizontal),
            (false, false) => Location::Off,
        }
    }

    /// Outline of the road as a closed polygon, starting at the bottom left corner.
    pub fn outline(&self) -> [Vector2<f64>; 6] {
        let half = self.width / 2.;
        let (x1, x2) = (self.x_vert - half, self.x_vert + half);
        let (y1, y2) = (self.y_horiz - half, self.y_horiz + half);
        [
            Vector2::new(x1, 0.),
            Vector2::new(x1, y1),
            Vector2::new(-self.width, y1),
            Vector2::new(-self.width, y2),
            Vector2::new(x2, y2),
            Vector2::new(x2, 0.),
        ]
    }
}
