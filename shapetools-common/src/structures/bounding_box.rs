/*
This code is part of the ShapeTools geospatial analysis library.
Authors: Dr. John Lindsay
Created: 04/03/2019
Last Modified: 08/11/2021
License: MIT
*/

use crate::structures::Point2D;

/// An axis-aligned rectangle described by its minimum and maximum corners.
/// A box only ever grows: `add_point` and `expand_to` widen the extent and
/// nothing shrinks it.
#[derive(Default, Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl BoundingBox {
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> BoundingBox {
        let (x1, x2) = if x_min < x_max {
            (x_min, x_max)
        } else {
            (x_max, x_min)
        };
        let (y1, y2) = if y_min < y_max {
            (y_min, y_max)
        } else {
            (y_max, y_min)
        };
        BoundingBox {
            x_min: x1,
            y_min: y1,
            x_max: x2,
            y_max: y2,
        }
    }

    /// Returns an inverted box (min = +inf, max = -inf) that any call to
    /// `add_point` or `expand_to` will snap onto real coordinates.
    pub fn fresh() -> BoundingBox {
        BoundingBox {
            x_min: f64::INFINITY,
            y_min: f64::INFINITY,
            x_max: f64::NEG_INFINITY,
            y_max: f64::NEG_INFINITY,
        }
    }

    /// True until the first point has been added.
    pub fn is_fresh(&self) -> bool {
        self.x_min > self.x_max || self.y_min > self.y_max
    }

    pub fn add_point(&mut self, p: Point2D) {
        if p.x < self.x_min {
            self.x_min = p.x;
        }
        if p.y < self.y_min {
            self.y_min = p.y;
        }
        if p.x > self.x_max {
            self.x_max = p.x;
        }
        if p.y > self.y_max {
            self.y_max = p.y;
        }
    }

    pub fn expand_to(&mut self, other: BoundingBox) {
        self.x_min = if self.x_min <= other.x_min { self.x_min } else { other.x_min };
        self.y_min = if self.y_min <= other.y_min { self.y_min } else { other.y_min };
        self.x_max = if self.x_max >= other.x_max { self.x_max } else { other.x_max };
        self.y_max = if self.y_max >= other.y_max { self.y_max } else { other.y_max };
    }

    /// Strict interior intersection: boxes that meet only along an edge or
    /// at a corner do not intersect.
    pub fn intersects(&self, other: BoundingBox) -> bool {
        !(self.x_max <= other.x_min
            || self.y_max <= other.y_min
            || self.x_min >= other.x_max
            || self.y_min >= other.y_max)
    }

    pub fn is_point_in_box(&self, x: f64, y: f64) -> bool {
        !(self.y_max < y || self.x_max < x || self.y_min > y || self.x_min > x)
    }
}
