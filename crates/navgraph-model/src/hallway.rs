//! Graph entities: hallways, their entrypoints and point annotations.
//!
//! A [`Hallway`] is a node of the navigation graph. Its boundary polygon is
//! fixed at construction; rooms, markers, obstacles and entrypoints are
//! appended while the hallway is assembled, and entrypoint links may grow
//! later when connections are resolved.
//!
//! # Example
//!
//! ```rust
//! use navgraph_model::hallway::{Entrypoint, Hallway, Link};
//! use navgraph_geometry::Polygon;
//! use navgraph_types::{EntryKind, HallwayId, Point3};
//!
//! let square = Polygon::new(vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(4.0, 0.0, 0.0),
//!     Point3::new(4.0, 0.0, 4.0),
//!     Point3::new(0.0, 0.0, 4.0),
//! ]);
//! let mut lobby = Hallway::new(HallwayId(0), "Lobby", 0, square).unwrap();
//!
//! let mut door = Entrypoint::new("Main", EntryKind::Door, Point3::new(2.0, 0.0, 0.0), lobby.id);
//! door.add_link(Link::new(Point3::new(2.0, 0.0, -0.1), HallwayId(1))).unwrap();
//! // A door leads to exactly one place.
//! assert!(door.add_link(Link::new(Point3::zero(), HallwayId(2))).is_err());
//!
//! lobby.entrypoints.push(door);
//! assert_eq!(lobby.entrypoints[0].target_hallways(), vec![HallwayId(1)]);
//! ```

use navgraph_geometry::{GeometryError, Polygon};
use navgraph_types::{EntryKind, HallwayId, NavError, Point3};

// ────────────────────────────────────────────────────────────────────────────
// Link
// ────────────────────────────────────────────────────────────────────────────

/// One connection target: the far entrypoint's position and its hallway.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Link {
    pub position: Point3,
    pub hallway: HallwayId,
}

impl Link {
    pub fn new(position: Point3, hallway: HallwayId) -> Self {
        Self { position, hallway }
    }

    /// Same hallway and an epsilon-equal position.
    pub fn matches(&self, position: Point3, hallway: HallwayId) -> bool {
        self.hallway == hallway && self.position.same_position(position)
    }
}

/// Append `link` to `links` unless `kind` forbids another connection.
pub(crate) fn push_link(
    links: &mut Vec<Link>,
    kind: EntryKind,
    name: &str,
    link: Link,
) -> Result<(), NavError> {
    if let Some(max) = kind.max_links()
        && links.len() >= max
    {
        return Err(NavError::LinkCapacity {
            kind,
            name: name.to_string(),
        });
    }
    links.push(link);
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Entrypoint
// ────────────────────────────────────────────────────────────────────────────

/// A typed passage on a hallway boundary.
///
/// DOOR and STAIRS entrypoints hold at most one link; LIFT entrypoints hold
/// any number. The capacity is enforced by [`Entrypoint::add_link`].
#[derive(Debug, Clone, PartialEq)]
pub struct Entrypoint {
    pub name: String,
    pub kind: EntryKind,
    pub position: Point3,
    /// Owning hallway.
    pub hallway: HallwayId,
    links: Vec<Link>,
}

impl Entrypoint {
    pub fn new(name: impl Into<String>, kind: EntryKind, position: Point3, hallway: HallwayId) -> Self {
        Self {
            name: name.into(),
            kind,
            position,
            hallway,
            links: Vec::new(),
        }
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Add a connection target.
    ///
    /// Fails with [`NavError::LinkCapacity`] when a DOOR or STAIRS entrypoint
    /// is already connected.
    pub fn add_link(&mut self, link: Link) -> Result<(), NavError> {
        push_link(&mut self.links, self.kind, &self.name, link)
    }

    /// `true` when no more links would be accepted.
    pub fn is_full(&self) -> bool {
        self.kind
            .max_links()
            .is_some_and(|max| self.links.len() >= max)
    }

    /// Still eligible for finalize-time resolution: an unconnected door or
    /// stairs, or any lift.
    pub fn is_unresolved(&self) -> bool {
        self.kind.is_lift() || self.links.is_empty()
    }

    pub fn is_linked_to(&self, hallway: HallwayId) -> bool {
        self.links.iter().any(|l| l.hallway == hallway)
    }

    /// Whether some link already points at `position` on `hallway`.
    pub fn has_link(&self, position: Point3, hallway: HallwayId) -> bool {
        self.links.iter().any(|l| l.matches(position, hallway))
    }

    pub fn target_hallways(&self) -> Vec<HallwayId> {
        self.links.iter().map(|l| l.hallway).collect()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Annotations
// ────────────────────────────────────────────────────────────────────────────

/// A labelled room position.
#[derive(Debug, Clone, PartialEq)]
pub struct Room {
    pub position: Point3,
    pub name: String,
}

/// A labelled landmark.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub position: Point3,
    pub name: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Hallway
// ────────────────────────────────────────────────────────────────────────────

/// A closed polygonal region recorded in one session.
#[derive(Debug, Clone, PartialEq)]
pub struct Hallway {
    pub id: HallwayId,
    pub name: String,
    pub level: i32,
    polygon: Polygon,
    pub rooms: Vec<Room>,
    pub markers: Vec<Marker>,
    pub obstacles: Vec<Polygon>,
    /// Entrypoints whose "from" side lives on this hallway.
    pub entrypoints: Vec<Entrypoint>,
}

impl Hallway {
    /// Create a hallway around `polygon`.
    ///
    /// The polygon must be closable: at least three finite corners.
    pub fn new(
        id: HallwayId,
        name: impl Into<String>,
        level: i32,
        polygon: Polygon,
    ) -> Result<Self, GeometryError> {
        polygon.validate()?;
        Ok(Self {
            id,
            name: name.into(),
            level,
            polygon,
            rooms: Vec::new(),
            markers: Vec::new(),
            obstacles: Vec::new(),
            entrypoints: Vec::new(),
        })
    }

    pub fn polygon(&self) -> &Polygon {
        &self.polygon
    }

    pub fn corners(&self) -> &[Point3] {
        self.polygon.corners()
    }

    /// First entrypoint whose position is epsilon-equal to `position`.
    pub fn entrypoint_at(&self, position: Point3) -> Option<usize> {
        self.entrypoints
            .iter()
            .position(|e| e.position.same_position(position))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Polygon {
        Polygon::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ])
    }

    #[test]
    fn door_accepts_one_link() {
        let mut door = Entrypoint::new("D", EntryKind::Door, Point3::zero(), HallwayId(0));
        assert!(door.is_unresolved());
        door.add_link(Link::new(Point3::new(1.0, 0.0, 0.0), HallwayId(1)))
            .unwrap();
        assert!(door.is_full());
        assert!(!door.is_unresolved());

        let err = door
            .add_link(Link::new(Point3::zero(), HallwayId(2)))
            .unwrap_err();
        assert!(matches!(err, NavError::LinkCapacity { kind: EntryKind::Door, .. }));
        assert_eq!(door.links().len(), 1);
    }

    #[test]
    fn stairs_share_door_capacity() {
        let mut stairs = Entrypoint::new("S", EntryKind::Stairs, Point3::zero(), HallwayId(0));
        stairs.add_link(Link::new(Point3::zero(), HallwayId(1))).unwrap();
        assert!(stairs.add_link(Link::new(Point3::zero(), HallwayId(2))).is_err());
    }

    #[test]
    fn lift_is_unbounded_and_always_unresolved() {
        let mut lift = Entrypoint::new("L", EntryKind::Lift, Point3::zero(), HallwayId(0));
        for h in 1..=5 {
            lift.add_link(Link::new(Point3::zero(), HallwayId(h))).unwrap();
        }
        assert_eq!(lift.links().len(), 5);
        assert!(!lift.is_full());
        assert!(lift.is_unresolved());
        assert!(lift.is_linked_to(HallwayId(3)));
        assert!(!lift.is_linked_to(HallwayId(9)));
    }

    #[test]
    fn has_link_uses_epsilon_position() {
        let mut lift = Entrypoint::new("L", EntryKind::Lift, Point3::zero(), HallwayId(0));
        lift.add_link(Link::new(Point3::new(1.0, 2.0, 3.0), HallwayId(4)))
            .unwrap();
        assert!(lift.has_link(Point3::new(1.0, 2.0, 3.0 + 1e-7), HallwayId(4)));
        assert!(!lift.has_link(Point3::new(1.0, 2.0, 3.0), HallwayId(5)));
        assert!(!lift.has_link(Point3::new(1.0, 2.0, 3.1), HallwayId(4)));
    }

    #[test]
    fn hallway_requires_closable_polygon() {
        let two = Polygon::new(vec![Point3::zero(), Point3::new(1.0, 0.0, 0.0)]);
        assert!(matches!(
            Hallway::new(HallwayId(0), "H", 0, two),
            Err(GeometryError::TooFewCorners { found: 2 })
        ));

        let broken = Polygon::new(vec![
            Point3::zero(),
            Point3::new(f32::NAN, 0.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ]);
        assert!(matches!(
            Hallway::new(HallwayId(0), "H", 0, broken),
            Err(GeometryError::NonFiniteCorner { index: 1 })
        ));
    }

    #[test]
    fn entrypoint_at_finds_first_match() {
        let mut h = Hallway::new(HallwayId(0), "H", 2, triangle()).unwrap();
        h.entrypoints.push(Entrypoint::new("A", EntryKind::Door, Point3::new(1.0, 0.0, 0.0), h.id));
        h.entrypoints.push(Entrypoint::new("B", EntryKind::Door, Point3::new(1.0, 0.0, 0.0), h.id));
        assert_eq!(h.entrypoint_at(Point3::new(1.0, 0.0, 0.0)), Some(0));
        assert_eq!(h.entrypoint_at(Point3::new(5.0, 0.0, 0.0)), None);
        assert_eq!(h.corners().len(), 3);
    }
}
