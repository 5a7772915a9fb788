//! Plane intersection and closed-boundary construction.
//!
//! Walls are measured one tap per physical wall, walking around the boundary
//! in a consistent rotational order. Each pair of neighbouring walls meets
//! along a vertical line; [`build_polygon`] returns one corner per wall where
//! that wall meets the one recorded before it, closing back onto the first.
//!
//! Two consecutive walls recorded as (nearly) co-planar have no meaningful
//! intersection. The builder does not hide that: the resulting corner is
//! non-finite and [`Polygon::validate`] reports it.
//!
//! # Example
//!
//! ```rust
//! use navgraph_geometry::plane::build_polygon;
//! use navgraph_geometry::transform::Mat4;
//! use navgraph_types::Point3;
//! use std::f32::consts::{FRAC_PI_2, PI};
//!
//! // A 4 m x 2 m room, walls recorded counter-clockwise seen from above.
//! let walls = [
//!     Mat4::from_yaw(0.0, Point3::new(2.0, 0.0, -1.0)),
//!     Mat4::from_yaw(-FRAC_PI_2, Point3::new(4.0, 0.0, 0.0)),
//!     Mat4::from_yaw(PI, Point3::new(2.0, 0.0, 1.0)),
//!     Mat4::from_yaw(FRAC_PI_2, Point3::new(0.0, 0.0, 0.0)),
//! ];
//! let polygon = build_polygon(&walls);
//! assert_eq!(polygon.len(), 4);
//! assert!(polygon.validate().is_ok());
//! ```

use navgraph_types::Point3;
use thiserror::Error;
use tracing::warn;

use crate::transform::Mat4;

/// Minimum number of corners of a closable boundary.
pub const MIN_CORNERS: usize = 3;

// ────────────────────────────────────────────────────────────────────────────
// Error type
// ────────────────────────────────────────────────────────────────────────────

/// Why a corner list cannot be used as a closed boundary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("boundary has {found} corners, at least 3 are needed to close it")]
    TooFewCorners { found: usize },

    #[error("corner {index} is not finite (adjacent walls are nearly parallel)")]
    NonFiniteCorner { index: usize },
}

// ────────────────────────────────────────────────────────────────────────────
// Intersection
// ────────────────────────────────────────────────────────────────────────────

/// Point where the vertical plane `other` crosses the local X axis of `plane`,
/// expressed in the world frame.
///
/// `other`'s origin and X axis are moved into `plane`'s frame; the X axis is
/// then followed until its local Z reaches zero. The result lies on `plane`'s
/// ground line (local y = 0, z = 0), so its height is `plane`'s origin height.
///
/// When the planes are parallel the division degenerates and the returned
/// point has non-finite components.
pub fn intersect(plane: &Mat4, other: &Mat4) -> Point3 {
    let Some(world_to_plane) = plane.inverse() else {
        return Point3::new(f32::NAN, f32::NAN, f32::NAN);
    };
    let relative = world_to_plane.mul(other);
    let origin = relative.translation();
    let along = relative.x_axis();

    let local_x = origin.x - along.x / along.z * origin.z;
    plane.transform_point(Point3::new(local_x, 0.0, 0.0))
}

// ────────────────────────────────────────────────────────────────────────────
// Polygon
// ────────────────────────────────────────────────────────────────────────────

/// Ordered corner list of a boundary. The last corner connects back to the
/// first.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polygon {
    corners: Vec<Point3>,
}

impl Polygon {
    pub fn new(corners: Vec<Point3>) -> Self {
        Self { corners }
    }

    pub fn corners(&self) -> &[Point3] {
        &self.corners
    }

    pub fn into_corners(self) -> Vec<Point3> {
        self.corners
    }

    pub fn len(&self) -> usize {
        self.corners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.corners.is_empty()
    }

    /// Enough corners to form a closed region (finiteness not checked).
    pub fn is_closable(&self) -> bool {
        self.corners.len() >= MIN_CORNERS
    }

    /// Check that the boundary can be registered: at least
    /// [`MIN_CORNERS`] corners, all of them finite.
    pub fn validate(&self) -> Result<(), GeometryError> {
        if !self.is_closable() {
            return Err(GeometryError::TooFewCorners {
                found: self.corners.len(),
            });
        }
        if let Some(index) = self.corners.iter().position(|c| !c.is_finite()) {
            return Err(GeometryError::NonFiniteCorner { index });
        }
        Ok(())
    }
}

/// Build the closed boundary through an ordered list of wall planes.
///
/// Corner `i` is where wall `i + 1` meets wall `i`; the last corner is
/// where the final wall meets the first one. The result has exactly
/// one corner per wall. Fewer than two walls yield an empty polygon.
pub fn build_polygon<'a, I>(planes: I) -> Polygon
where
    I: IntoIterator<Item = &'a Mat4>,
{
    let planes: Vec<&Mat4> = planes.into_iter().collect();
    if planes.len() < 2 {
        return Polygon::default();
    }

    let mut corners: Vec<Point3> = planes
        .windows(2)
        .map(|pair| intersect(pair[1], pair[0]))
        .collect();
    let last = planes[planes.len() - 1];
    corners.push(intersect(last, planes[0]));

    if let Some(index) = corners.iter().position(|c| !c.is_finite()) {
        warn!(index, walls = planes.len(), "non-finite corner: adjacent walls nearly parallel");
    }
    Polygon::new(corners)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
