//! `navgraph-types` – shared vocabulary of the navigation graph workspace.
//!
//! Every other crate speaks in these types: 3-D points in the world frame,
//! hallway identifiers, the measurement and entrypoint kinds an operator
//! assigns, and the crate-spanning [`NavError`].

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Per-axis tolerance used to decide that two recorded positions denote the
/// same physical point.
pub const POSITION_EPSILON: f32 = 1e-6;

// ────────────────────────────────────────────────────────────────────────────
// Point3
// ────────────────────────────────────────────────────────────────────────────

/// A point (or direction) in the world frame, in metres.
///
/// Serialised as a bare `[x, y, z]` array.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f32; 3]", into = "[f32; 3]")]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3 {
    /// Create a new point.
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// The origin.
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }

    pub fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }

    pub fn scale(self, factor: f32) -> Self {
        Self::new(self.x * factor, self.y * factor, self.z * factor)
    }

    /// Euclidean distance to `other`.
    pub fn distance(self, other: Self) -> f32 {
        let d = self.sub(other);
        (d.x * d.x + d.y * d.y + d.z * d.z).sqrt()
    }

    /// `true` when every component is neither NaN nor infinite.
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Component-wise comparison with an absolute per-axis tolerance.
    pub fn approx_eq(self, other: Self, epsilon: f32) -> bool {
        (self.x - other.x).abs() < epsilon
            && (self.y - other.y).abs() < epsilon
            && (self.z - other.z).abs() < epsilon
    }

    /// Whether `other` is the same physical point within [`POSITION_EPSILON`].
    pub fn same_position(self, other: Self) -> bool {
        self.approx_eq(other, POSITION_EPSILON)
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[f32; 3]> for Point3 {
    fn from(a: [f32; 3]) -> Self {
        Self::new(a[0], a[1], a[2])
    }
}

impl From<Point3> for [f32; 3] {
    fn from(p: Point3) -> Self {
        p.to_array()
    }
}

impl fmt::Display for Point3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3}, {:.3})", self.x, self.y, self.z)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Identifiers & kinds
// ────────────────────────────────────────────────────────────────────────────

/// Unique identifier of a hallway within a graph. Never reused.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct HallwayId(pub u32);

impl fmt::Display for HallwayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a single tap on a plane measured. Assigned by the acquisition side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MeasurementKind {
    /// A wall of the hallway currently being recorded.
    Wall,
    /// A room door or sign; becomes a room annotation on the hallway.
    Room,
    /// A passage to another hallway (door, stairs or lift).
    Entry,
    /// A free-form landmark.
    Marker,
    /// A wall of an obstacle cut out of the hallway floor.
    Cut,
}

impl fmt::Display for MeasurementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MeasurementKind::Wall => "WALL",
            MeasurementKind::Room => "ROOM",
            MeasurementKind::Entry => "ENTRY",
            MeasurementKind::Marker => "MARKER",
            MeasurementKind::Cut => "CUT",
        };
        f.write_str(s)
    }
}

/// The kind of passage an entrypoint represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryKind {
    Door,
    Stairs,
    Lift,
}

impl EntryKind {
    /// Upper bound on the number of connections, `None` when unbounded.
    ///
    /// Doors and stairs lead to exactly one place; a lift may stop on any
    /// number of levels.
    pub fn max_links(self) -> Option<usize> {
        match self {
            EntryKind::Door | EntryKind::Stairs => Some(1),
            EntryKind::Lift => None,
        }
    }

    pub fn is_lift(self) -> bool {
        matches!(self, EntryKind::Lift)
    }

    /// Lifts connect to lifts; doors and stairs connect to doors and stairs.
    pub fn is_compatible_with(self, other: EntryKind) -> bool {
        self.is_lift() == other.is_lift()
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntryKind::Door => "DOOR",
            EntryKind::Stairs => "STAIRS",
            EntryKind::Lift => "LIFT",
        };
        f.write_str(s)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

/// Errors shared across the workspace: stale references, link capacity and
/// hallway identity.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NavError {
    #[error("Hallway not found: {0}")]
    HallwayNotFound(HallwayId),

    #[error("Entrypoint {index} not found on hallway {hallway}")]
    EntrypointNotFound { hallway: HallwayId, index: usize },

    #[error("{kind} entrypoint \"{name}\" already holds its single connection")]
    LinkCapacity { kind: EntryKind, name: String },

    #[error("Only ENTRY measurements carry connections, got {0}")]
    NotAnEntry(MeasurementKind),

    #[error("Hallway ID space exhausted")]
    IdSpaceExhausted,

    #[error("Hallway {0} is already registered")]
    DuplicateHallway(HallwayId),
}
