//! Rigid-body transform math.
//!
//! Plane and device poses arrive from the acquisition side as 4x4 matrices in
//! column-major order (the OpenGL convention): columns 0..2 hold the local X,
//! Y and Z axes expressed in the parent frame, column 3 holds the origin.
//! A plane's local X axis runs horizontally along the wall, Y points up and
//! Z is the wall normal.
//!
//! # Example
//!
//! ```rust
//! use navgraph_geometry::transform::Mat4;
//! use navgraph_types::Point3;
//!
//! // A wall 2 m along +X, turned to face +X.
//! let wall = Mat4::from_yaw(std::f32::consts::FRAC_PI_2, Point3::new(2.0, 0.0, 0.0));
//! let back = wall.inverse().unwrap().mul(&wall);
//! assert!(back.approx_eq(&Mat4::identity(), 1e-5));
//! ```

use navgraph_types::Point3;

// ────────────────────────────────────────────────────────────────────────────
// Mat4
// ────────────────────────────────────────────────────────────────────────────

/// A 4x4 homogeneous transform stored column-major.
///
/// Element `(row, col)` lives at index `col * 4 + row`, so indices 12..=14
/// are the translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4 {
    m: [f32; 16],
}

impl Mat4 {
    /// Wrap a column-major array as delivered by the sensor service.
    pub const fn from_cols_array(m: [f32; 16]) -> Self {
        Self { m }
    }

    /// The identity transform.
    pub const fn identity() -> Self {
        Self::from_cols_array([
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    /// Build a transform from its three local axes and its origin.
    pub fn from_axes(x_axis: Point3, y_axis: Point3, z_axis: Point3, origin: Point3) -> Self {
        Self::from_cols_array([
            x_axis.x, x_axis.y, x_axis.z, 0.0, //
            y_axis.x, y_axis.y, y_axis.z, 0.0, //
            z_axis.x, z_axis.y, z_axis.z, 0.0, //
            origin.x, origin.y, origin.z, 1.0,
        ])
    }

    /// A vertical plane at `origin` rotated `yaw` radians about world +Y.
    ///
    /// With `yaw == 0` the plane faces +Z; with `yaw == π/2` it faces +X.
    pub fn from_yaw(yaw: f32, origin: Point3) -> Self {
        let (sin, cos) = yaw.sin_cos();
        Self::from_axes(
            Point3::new(cos, 0.0, -sin),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(sin, 0.0, cos),
            origin,
        )
    }

    /// Pure translation.
    pub fn from_translation(origin: Point3) -> Self {
        Self::from_yaw(0.0, origin)
    }

    pub fn to_cols_array(&self) -> [f32; 16] {
        self.m
    }

    /// Element at `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.m[col * 4 + row]
    }

    fn set(&mut self, row: usize, col: usize, value: f32) {
        self.m[col * 4 + row] = value;
    }

    /// Origin of the local frame in the parent frame.
    pub fn translation(&self) -> Point3 {
        Point3::new(self.m[12], self.m[13], self.m[14])
    }

    /// Local X axis in the parent frame (runs along a wall).
    pub fn x_axis(&self) -> Point3 {
        Point3::new(self.m[0], self.m[1], self.m[2])
    }

    /// Local Z axis in the parent frame (a wall's normal).
    pub fn z_axis(&self) -> Point3 {
        Point3::new(self.m[8], self.m[9], self.m[10])
    }

    /// Matrix product `self * rhs`.
    ///
    /// If `self` = T_A_B and `rhs` = T_B_C, the result is T_A_C.
    pub fn mul(&self, rhs: &Mat4) -> Mat4 {
        let mut out = Mat4::from_cols_array([0.0; 16]);
        for row in 0..4 {
            for col in 0..4 {
                let mut sum = 0.0;
                for k in 0..4 {
                    sum += self.get(row, k) * rhs.get(k, col);
                }
                out.set(row, col, sum);
            }
        }
        out
    }

    /// Map a point from the local frame into the parent frame.
    pub fn transform_point(&self, p: Point3) -> Point3 {
        Point3::new(
            self.m[0] * p.x + self.m[4] * p.y + self.m[8] * p.z + self.m[12],
            self.m[1] * p.x + self.m[5] * p.y + self.m[9] * p.z + self.m[13],
            self.m[2] * p.x + self.m[6] * p.y + self.m[10] * p.z + self.m[14],
        )
    }

    /// General inverse by Gauss-Jordan elimination with partial pivoting.
    ///
    /// Returns `None` for a singular matrix.
    pub fn inverse(&self) -> Option<Mat4> {
        let mut a = [[0.0f64; 8]; 4];
        for (r, row) in a.iter_mut().enumerate() {
            for c in 0..4 {
                row[c] = f64::from(self.get(r, c));
            }
            row[4 + r] = 1.0;
        }

        for col in 0..4 {
            let pivot = (col..4).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
            if a[pivot][col].abs() < 1e-12 {
                return None;
            }
            a.swap(col, pivot);

            let p = a[col][col];
            for v in a[col].iter_mut() {
                *v /= p;
            }
            let pivot_row = a[col];
            for (r, row) in a.iter_mut().enumerate() {
                if r == col {
                    continue;
                }
                let factor = row[col];
                if factor != 0.0 {
                    for c in 0..8 {
                        row[c] -= factor * pivot_row[c];
                    }
                }
            }
        }

        let mut out = Mat4::from_cols_array([0.0; 16]);
        for (r, row) in a.iter().enumerate() {
            for c in 0..4 {
                out.set(r, c, row[4 + c] as f32);
            }
        }
        Some(out)
    }

    /// Element-wise comparison with an absolute tolerance.
    pub fn approx_eq(&self, other: &Mat4, epsilon: f32) -> bool {
        self.m
            .iter()
            .zip(other.m.iter())
            .all(|(a, b)| (a - b).abs() < epsilon)
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::identity()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    fn assert_point(p: Point3, x: f32, y: f32, z: f32) {
        assert!(
            p.approx_eq(Point3::new(x, y, z), 1e-5),
            "expected ({x}, {y}, {z}), got {p}"
        );
    }

    #[test]
    fn identity_transform_is_noop() {
        let p = Mat4::identity().transform_point(Point3::new(1.0, 2.0, 3.0));
        assert_point(p, 1.0, 2.0, 3.0);
    }

    #[test]
    fn translation_lives_in_last_column() {
        let t = Mat4::from_translation(Point3::new(4.0, 5.0, 6.0));
        assert_eq!(t.to_cols_array()[12], 4.0);
        assert_eq!(t.to_cols_array()[13], 5.0);
        assert_eq!(t.to_cols_array()[14], 6.0);
        assert_point(t.translation(), 4.0, 5.0, 6.0);
    }

    #[test]
    fn yaw_quarter_turn_faces_plus_x() {
        let t = Mat4::from_yaw(FRAC_PI_2, Point3::zero());
        assert_point(t.z_axis(), 1.0, 0.0, 0.0);
        assert_point(t.x_axis(), 0.0, 0.0, -1.0);
    }

    #[test]
    fn compose_translations_add() {
        let a = Mat4::from_translation(Point3::new(1.0, 0.0, 0.0));
        let b = Mat4::from_translation(Point3::new(2.0, 0.0, 0.0));
        assert_point(a.mul(&b).translation(), 3.0, 0.0, 0.0);
    }

    #[test]
    fn compose_respects_rotation() {
        // Frame turned a quarter about +Y, child 1 m along its local X.
        let parent = Mat4::from_yaw(FRAC_PI_2, Point3::zero());
        let child = Mat4::from_translation(Point3::new(1.0, 0.0, 0.0));
        assert_point(parent.mul(&child).translation(), 0.0, 0.0, -1.0);
    }

    #[test]
    fn inverse_of_rigid_transform() {
        let t = Mat4::from_yaw(0.7, Point3::new(3.0, -1.0, 2.5));
        let inv = t.inverse().unwrap();
        assert!(t.mul(&inv).approx_eq(&Mat4::identity(), 1e-5));
        assert!(inv.mul(&t).approx_eq(&Mat4::identity(), 1e-5));
    }

    #[test]
    fn inverse_maps_points_back() {
        let t = Mat4::from_yaw(-1.2, Point3::new(0.5, 0.0, -4.0));
        let p = Point3::new(1.0, 2.0, 3.0);
        let q = t.inverse().unwrap().transform_point(t.transform_point(p));
        assert_point(q, 1.0, 2.0, 3.0);
    }

    #[test]
    fn singular_matrix_has_no_inverse() {
        assert!(Mat4::from_cols_array([0.0; 16]).inverse().is_none());
    }

    #[test]
    fn get_reads_row_col() {
        let t = Mat4::from_translation(Point3::new(7.0, 8.0, 9.0));
        assert_eq!(t.get(0, 3), 7.0);
        assert_eq!(t.get(2, 3), 9.0);
        assert_eq!(t.get(3, 3), 1.0);
    }

    fn pose() -> impl Strategy<Value = Mat4> {
        (-PI..PI, -100.0f32..100.0, -5.0f32..5.0, -100.0f32..100.0)
            .prop_map(|(yaw, x, y, z)| Mat4::from_yaw(yaw, Point3::new(x, y, z)))
    }

    proptest! {
        #[test]
        fn pose_times_inverse_is_identity(device in pose(), offset in pose()) {
            let m = device.mul(&offset);
            let inv = m.inverse().expect("rigid pose is invertible");
            prop_assert!(m.mul(&inv).approx_eq(&Mat4::identity(), 1e-3));
            prop_assert!(inv.mul(&m).approx_eq(&Mat4::identity(), 1e-3));
        }

        #[test]
        fn inverse_round_trips_points(
            m in pose(),
            x in -50.0f32..50.0,
            y in -5.0f32..5.0,
            z in -50.0f32..50.0,
        ) {
            let p = Point3::new(x, y, z);
            let inv = m.inverse().expect("rigid pose is invertible");
            let back = inv.transform_point(m.transform_point(p));
            prop_assert!(back.approx_eq(p, 1e-3), "{} vs {}", back, p);
            let again = m.transform_point(inv.transform_point(p));
            prop_assert!(again.approx_eq(p, 1e-3), "{} vs {}", again, p);
        }
    }
}
