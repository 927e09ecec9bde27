// Envelope Implementation
//
// Axis-aligned bounding rectangles, used for cheap rejection in the bounds
// stage and as the rectangle behind BBOX predicates.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::geometry::{Coord, Geometry, Polygon};

/// Axis-aligned rectangle in the native coordinates of a dataset
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Envelope {
    /// Create an envelope from two corners, in any order
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Envelope {
            min_x: x1.min(x2),
            min_y: y1.min(y2),
            max_x: x1.max(x2),
            max_y: y1.max(y2),
        }
    }

    /// The empty envelope; expanding it by any coordinate yields that coordinate
    pub fn empty() -> Self {
        Envelope {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    pub fn width(&self) -> f64 {
        if self.is_empty() { 0.0 } else { self.max_x - self.min_x }
    }

    pub fn height(&self) -> f64 {
        if self.is_empty() { 0.0 } else { self.max_y - self.min_y }
    }

    /// Grow the envelope to cover a coordinate
    pub fn expand_to_include(&mut self, c: Coord) {
        self.min_x = self.min_x.min(c.x);
        self.min_y = self.min_y.min(c.y);
        self.max_x = self.max_x.max(c.x);
        self.max_y = self.max_y.max(c.y);
    }

    /// Grow the envelope to cover another envelope
    pub fn expand_to_include_envelope(&mut self, other: &Envelope) {
        if other.is_empty() {
            return;
        }
        self.min_x = self.min_x.min(other.min_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_x = self.max_x.max(other.max_x);
        self.max_y = self.max_y.max(other.max_y);
    }

    /// Closed-interval intersection test; touching edges intersect
    pub fn intersects(&self, other: &Envelope) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }

    pub fn contains_coord(&self, c: Coord) -> bool {
        !self.is_empty()
            && c.x >= self.min_x
            && c.x <= self.max_x
            && c.y >= self.min_y
            && c.y <= self.max_y
    }

    pub fn contains(&self, other: &Envelope) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && other.min_x >= self.min_x
            && other.max_x <= self.max_x
            && other.min_y >= self.min_y
            && other.max_y <= self.max_y
    }

    /// Closed counter-clockwise ring around the rectangle
    pub fn to_polygon(&self) -> Polygon {
        Polygon::new(
            vec![
                Coord::new(self.min_x, self.min_y),
                Coord::new(self.max_x, self.min_y),
                Coord::new(self.max_x, self.max_y),
                Coord::new(self.min_x, self.max_y),
                Coord::new(self.min_x, self.min_y),
            ],
            Vec::new(),
        )
    }

    pub fn to_geometry(&self) -> Geometry {
        Geometry::Polygon(self.to_polygon())
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "BOX EMPTY");
        }
        write!(f, "BOX({} {}, {} {})", self.min_x, self.min_y, self.max_x, self.max_y)
    }
}
