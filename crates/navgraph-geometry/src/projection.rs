//! Plan projection: fitting a point set into a 2-D viewport.
//!
//! The floor plan is drawn looking down the world Y axis, so the viewport's
//! horizontal axis is world X and its vertical axis is world Z. These are
//! pure functions over immutable input; calling them twice on the same
//! points yields identical results.
//!
//! # Example
//!
//! ```rust
//! use navgraph_geometry::projection::{center, scale};
//! use navgraph_types::Point3;
//!
//! let points = [Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 0.0, 5.0)];
//! let c = center(&points).unwrap();
//! assert_eq!(c, Point3::new(5.0, 0.0, 2.5));
//! // 0.8 * 1000 / 10 = 80 is tighter than 0.8 * 1000 / 5 = 160.
//! assert_eq!(scale(1000.0, 1000.0, &points), Some(80.0));
//! ```

use navgraph_types::Point3;

/// Fraction of the viewport the content may occupy along its tighter axis.
pub const PADDING_FACTOR: f32 = 0.8;

// ────────────────────────────────────────────────────────────────────────────
// Bounds
// ────────────────────────────────────────────────────────────────────────────

/// An axis-aligned bounding box, defined by its minimum and maximum corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point3,
    pub max: Point3,
}

impl Bounds {
    /// Return the centre point of the box.
    pub fn centre(&self) -> Point3 {
        Point3::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
            (self.min.z + self.max.z) * 0.5,
        )
    }

    /// Extent along world X.
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    /// Extent along world Z.
    pub fn depth(&self) -> f32 {
        self.max.z - self.min.z
    }
}

/// Axis-aligned bounds of `points`, `None` for an empty slice.
pub fn bounds(points: &[Point3]) -> Option<Bounds> {
    let first = *points.first()?;
    let mut b = Bounds {
        min: first,
        max: first,
    };
    for p in &points[1..] {
        b.min = Point3::new(b.min.x.min(p.x), b.min.y.min(p.y), b.min.z.min(p.z));
        b.max = Point3::new(b.max.x.max(p.x), b.max.y.max(p.y), b.max.z.max(p.z));
    }
    Some(b)
}

/// Centre of the bounding box of `points`.
pub fn center(points: &[Point3]) -> Option<Point3> {
    bounds(points).map(|b| b.centre())
}

/// Uniform scale that fits `points` into a `viewport_h` x `viewport_w`
/// viewport with [`PADDING_FACTOR`] padding.
///
/// The smaller of the width-fit and depth-fit ratios wins. A box with zero
/// extent on one axis fits on the other; zero extent on both yields
/// `f32::INFINITY`.
pub fn scale(viewport_h: f32, viewport_w: f32, points: &[Point3]) -> Option<f32> {
    let b = bounds(points)?;
    let x_scale = PADDING_FACTOR * viewport_w / b.width();
    let z_scale = PADDING_FACTOR * viewport_h / b.depth();
    Some(x_scale.min(z_scale))
}

/// Project a world point onto the viewport plane, relative to the
/// viewport centre.
pub fn project(point: Point3, center: Point3, scale: f32) -> [f32; 2] {
    [(point.x - center.x) * scale, (point.z - center.z) * scale]
}

// ────────────────────────────────────────────────────────────────────────────
// Edge labels
// ────────────────────────────────────────────────────────────────────────────

/// One side of a closed polygon, for wall-length labels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub from: Point3,
    pub to: Point3,
    /// Length on the floor plane (X/Z), in metres.
    pub length: f32,
    pub midpoint: Point3,
}

/// Every side of the closed polygon through `corners`, including the one
/// from the last corner back to the first.
pub fn edge_lengths(corners: &[Point3]) -> Vec<Edge> {
    if corners.len() < 2 {
        return Vec::new();
    }
    corners
        .iter()
        .zip(corners.iter().cycle().skip(1))
        .map(|(&from, &to)| {
            let dx = to.x - from.x;
            let dz = to.z - from.z;
            Edge {
                from,
                to,
                length: (dx * dx + dz * dz).sqrt(),
                midpoint: from.add(to).scale(0.5),
            }
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// PlanLayout
// ────────────────────────────────────────────────────────────────────────────

/// Pixel dimensions of the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

/// Everything a renderer needs to place a point set on a viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanLayout {
    pub viewport: Viewport,
    pub center: Point3,
    pub scale: f32,
}

impl PlanLayout {
    /// Fit `points` into `viewport`. `None` for an empty point set.
    pub fn for_points(points: &[Point3], viewport: Viewport) -> Option<Self> {
        Some(Self {
            viewport,
            center: center(points)?,
            scale: scale(viewport.height, viewport.width, points)?,
        })
    }

    /// Absolute viewport coordinates of `point` (origin top-left).
    pub fn to_screen(&self, point: Point3) -> [f32; 2] {
        let [x, y] = project(point, self.center, self.scale);
        [self.viewport.width / 2.0 + x, self.viewport.height / 2.0 + y]
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn square() -> Vec<Point3> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
            Point3::new(4.0, 1.0, 2.0),
            Point3::new(0.0, 0.0, 2.0),
        ]
    }

    #[test]
    fn bounds_of_empty_is_none() {
        assert!(bounds(&[]).is_none());
        assert!(center(&[]).is_none());
        assert!(scale(100.0, 100.0, &[]).is_none());
    }

    #[test]
    fn bounds_cover_all_axes() {
        let b = bounds(&square()).unwrap();
        assert_eq!(b.min, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(b.max, Point3::new(4.0, 1.0, 2.0));
    }

    #[test]
    fn bounds_handle_negative_coordinates() {
        let b = bounds(&[Point3::new(-3.0, -1.0, -7.0), Point3::new(-1.0, -2.0, -5.0)]).unwrap();
        assert_eq!(b.min, Point3::new(-3.0, -2.0, -7.0));
        assert_eq!(b.max, Point3::new(-1.0, -1.0, -5.0));
    }

    #[test]
    fn center_is_box_midpoint() {
        assert_eq!(center(&square()), Some(Point3::new(2.0, 0.5, 1.0)));
    }

    #[test]
    fn scale_picks_tighter_axis() {
        // width-fit: 0.8 * 800 / 4 = 160; depth-fit: 0.8 * 200 / 2 = 80
        assert_eq!(scale(200.0, 800.0, &square()), Some(80.0));
        // width-fit: 0.8 * 400 / 4 = 80; depth-fit: 0.8 * 1000 / 2 = 400
        assert_eq!(scale(1000.0, 400.0, &square()), Some(80.0));
    }

    #[test]
    fn scaled_content_stays_inside_viewport() {
        let viewport = Viewport {
            width: 640.0,
            height: 480.0,
        };
        let layout = PlanLayout::for_points(&square(), viewport).unwrap();
        for p in square() {
            let [x, y] = layout.to_screen(p);
            assert!(x > 0.0 && x < viewport.width, "x = {x}");
            assert!(y > 0.0 && y < viewport.height, "y = {y}");
        }
    }

    #[test]
    fn single_point_scale_is_infinite() {
        assert_eq!(scale(10.0, 10.0, &[Point3::new(1.0, 1.0, 1.0)]), Some(f32::INFINITY));
    }

    #[test]
    fn project_drops_vertical_axis() {
        let p = project(Point3::new(3.0, 99.0, 5.0), Point3::new(1.0, 0.0, 1.0), 10.0);
        assert_eq!(p, [20.0, 40.0]);
    }

    #[test]
    fn edges_close_the_polygon() {
        let edges = edge_lengths(&square());
        assert_eq!(edges.len(), 4);
        assert!((edges[0].length - 4.0).abs() < 1e-6);
        assert!((edges[1].length - 2.0).abs() < 1e-6);
        assert!((edges[3].length - 2.0).abs() < 1e-6);
        assert_eq!(edges[3].to, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(edges[0].midpoint, Point3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn edges_of_degenerate_input_are_empty() {
        assert!(edge_lengths(&[]).is_empty());
        assert!(edge_lengths(&[Point3::zero()]).is_empty());
    }

    proptest! {
        #[test]
        fn projection_is_idempotent(
            raw in prop::collection::vec((-100.0f32..100.0, -5.0f32..5.0, -100.0f32..100.0), 1..40),
            h in 10.0f32..4000.0,
            w in 10.0f32..4000.0,
        ) {
            let points: Vec<Point3> = raw.into_iter().map(|(x, y, z)| Point3::new(x, y, z)).collect();
            prop_assert_eq!(bounds(&points), bounds(&points));
            prop_assert_eq!(center(&points), center(&points));
            let (a, b) = (scale(h, w, &points).unwrap(), scale(h, w, &points).unwrap());
            prop_assert!(a == b || (a.is_nan() && b.is_nan()));
        }
    }
}
