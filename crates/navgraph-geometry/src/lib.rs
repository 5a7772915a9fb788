//! `navgraph-geometry` – spatial math for floor-plan capture.
//!
//! Turns the plane poses reported by the acquisition side into corners,
//! boundaries and plan-view coordinates.
//!
//! # Modules
//!
//! - [`transform`] – [`Mat4`][transform::Mat4]: column-major rigid transform
//!   with composition and inversion.
//! - [`plane`] – [`intersect`][plane::intersect] and
//!   [`build_polygon`][plane::build_polygon]: turn an ordered list of wall
//!   planes into a closed [`Polygon`][plane::Polygon].
//! - [`projection`] – bounds, centre and padded scale for fitting a level
//!   into a viewport, plus edge-length labels.

pub mod plane;
pub mod projection;
pub mod transform;

pub use plane::{GeometryError, Polygon, build_polygon, intersect};
pub use projection::{PlanLayout, Viewport};
pub use transform::Mat4;
