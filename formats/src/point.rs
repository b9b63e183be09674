//! Minimal 2D point, enough for placefile coordinates and centroids.
//!

use std::fmt::{Display, Formatter};
use std::ops::{AddAssign, SubAssign};

use serde::{Deserialize, Serialize};

/// A point in placefile space.  For geographic data `x` is the latitude and `y` the longitude.
///
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Point2D { x, y }
    }

    /// Accumulate `other` into `self`.
    ///
    #[inline]
    pub fn add(&mut self, other: &Point2D) -> &mut Self {
        self.x += other.x;
        self.y += other.y;
        self
    }

    /// Remove `other` from `self`.
    ///
    #[inline]
    pub fn sub(&mut self, other: &Point2D) -> &mut Self {
        self.x -= other.x;
        self.y -= other.y;
        self
    }

    /// Euclidean norm
    ///
    #[inline]
    pub fn length(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Arithmetic mean of all points, `None` if there are none.
    ///
    pub fn centroid(points: &[Point2D]) -> Option<Point2D> {
        if points.is_empty() {
            return None;
        }
        let mut sum = Point2D::default();
        points.iter().for_each(|p| {
            sum.add(p);
        });
        let n = points.len() as f64;
        Some(Point2D::new(sum.x / n, sum.y / n))
    }
}

impl Display for Point2D {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

impl AddAssign for Point2D {
    fn add_assign(&mut self, rhs: Point2D) {
        Point2D::add(self, &rhs);
    }
}

impl SubAssign for Point2D {
    fn sub_assign(&mut self, rhs: Point2D) {
        Point2D::sub(self, &rhs);
    }
}

impl From<[f64; 2]> for Point2D {
    fn from(value: [f64; 2]) -> Self {
        Point2D::new(value[0], value[1])
    }
}
