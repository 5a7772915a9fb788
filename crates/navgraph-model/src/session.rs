//! Recording session: the measurement buffer of the hallway being walked.
//!
//! A [`RecordingSession`] collects taps by kind until the operator closes
//! the hallway. Obstacles are outlined with CUT taps and closed one at a
//! time with [`RecordingSession::close_obstacle`]. Closing the hallway with
//! [`RecordingSession::finish_hallway`] validates the boundary before any ID
//! is spent, so a failed attempt registers nothing and keeps the buffer for
//! correction.
//!
//! # Example
//!
//! ```rust
//! use navgraph_geometry::Mat4;
//! use navgraph_model::{Graph, Measurement, RecordingSession};
//! use navgraph_types::{MeasurementKind, Point3};
//! use std::f32::consts::{FRAC_PI_2, PI};
//!
//! let mut graph = Graph::new();
//! let mut session = RecordingSession::new(0);
//! let walls = [
//!     (0.0, Point3::new(2.0, 0.0, -1.0)),
//!     (-FRAC_PI_2, Point3::new(4.0, 0.0, 0.0)),
//!     (PI, Point3::new(2.0, 0.0, 1.0)),
//!     (FRAC_PI_2, Point3::new(0.0, 0.0, 0.0)),
//! ];
//! for (i, (yaw, at)) in walls.into_iter().enumerate() {
//!     let plane = Mat4::from_yaw(yaw, at);
//!     session.record(Measurement::new(plane, Mat4::identity(), i as f64, MeasurementKind::Wall));
//! }
//! assert!(session.can_close());
//!
//! let id = session.finish_hallway("Lobby", &mut graph).unwrap();
//! assert_eq!(graph.find(id).unwrap().corners().len(), 4);
//! assert_eq!(session.wall_count(), 0);
//! ```

use navgraph_geometry::{GeometryError, Mat4, Polygon, build_polygon};
use navgraph_types::{HallwayId, MeasurementKind, NavError};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::builder::{Parts, assemble, check_entries, reconcile_reciprocal};
use crate::graph::Graph;
use crate::measurement::Measurement;

// ────────────────────────────────────────────────────────────────────────────
// Error type
// ────────────────────────────────────────────────────────────────────────────

/// Errors raised while closing an obstacle or a hallway.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("invalid boundary: {0}")]
    Geometry(#[from] GeometryError),

    #[error("entry measurement {index} has no passage type (DOOR, STAIRS or LIFT)")]
    UntypedEntry { index: usize },

    #[error("no CUT measurements recorded for the obstacle")]
    EmptyObstacle,

    #[error(transparent)]
    Nav(#[from] NavError),
}

// ────────────────────────────────────────────────────────────────────────────
// PoseSource
// ────────────────────────────────────────────────────────────────────────────

/// Refined device trajectory, queried by capture timestamp.
pub trait PoseSource {
    /// Refined depth-camera pose at `timestamp`, `None` when unknown.
    fn depth_pose_at(&self, timestamp: f64) -> Option<Mat4>;
}

impl<F> PoseSource for F
where
    F: Fn(f64) -> Option<Mat4>,
{
    fn depth_pose_at(&self, timestamp: f64) -> Option<Mat4> {
        self(timestamp)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// RecordingSession
// ────────────────────────────────────────────────────────────────────────────

/// Address of a buffered measurement: its bucket and index within it.
///
/// Undo and reset may invalidate a handle; lookups through a stale handle
/// return `None` or a later measurement of the same kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeasurementHandle {
    pub kind: MeasurementKind,
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Recorded {
    Tap(MeasurementKind),
    Obstacle,
}

/// Buffered measurements of the hallway currently being recorded.
#[derive(Debug, Clone, Default)]
pub struct RecordingSession {
    level: i32,
    walls: Vec<Measurement>,
    rooms: Vec<Measurement>,
    markers: Vec<Measurement>,
    entries: Vec<Measurement>,
    cuts: Vec<Measurement>,
    obstacles: Vec<Polygon>,
    history: Vec<Recorded>,
}

impl RecordingSession {
    pub fn new(level: i32) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }

    pub fn level(&self) -> i32 {
        self.level
    }

    pub fn set_level(&mut self, level: i32) {
        self.level = level;
    }

    fn bucket(&self, kind: MeasurementKind) -> &Vec<Measurement> {
        match kind {
            MeasurementKind::Wall => &self.walls,
            MeasurementKind::Room => &self.rooms,
            MeasurementKind::Entry => &self.entries,
            MeasurementKind::Marker => &self.markers,
            MeasurementKind::Cut => &self.cuts,
        }
    }

    fn bucket_mut(&mut self, kind: MeasurementKind) -> &mut Vec<Measurement> {
        match kind {
            MeasurementKind::Wall => &mut self.walls,
            MeasurementKind::Room => &mut self.rooms,
            MeasurementKind::Entry => &mut self.entries,
            MeasurementKind::Marker => &mut self.markers,
            MeasurementKind::Cut => &mut self.cuts,
        }
    }

    /// Buffer a measurement in the bucket of its kind.
    pub fn record(&mut self, measurement: Measurement) -> MeasurementHandle {
        let kind = measurement.kind;
        let bucket = self.bucket_mut(kind);
        bucket.push(measurement);
        let index = bucket.len() - 1;
        self.history.push(Recorded::Tap(kind));
        debug!(%kind, index, "measurement recorded");
        MeasurementHandle { kind, index }
    }

    pub fn measurement(&self, handle: MeasurementHandle) -> Option<&Measurement> {
        self.bucket(handle.kind).get(handle.index)
    }

    pub fn measurement_mut(&mut self, handle: MeasurementHandle) -> Option<&mut Measurement> {
        self.bucket_mut(handle.kind).get_mut(handle.index)
    }

    /// The most recently recorded ENTRY measurement.
    pub fn last_entry_mut(&mut self) -> Option<&mut Measurement> {
        self.entries.last_mut()
    }

    pub fn measurements(&self, kind: MeasurementKind) -> &[Measurement] {
        self.bucket(kind)
    }

    pub fn obstacles(&self) -> &[Polygon] {
        &self.obstacles
    }

    pub fn wall_count(&self) -> usize {
        self.walls.len()
    }

    /// Enough walls to attempt closing the hallway.
    pub fn can_close(&self) -> bool {
        self.walls.len() >= navgraph_geometry::plane::MIN_CORNERS
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Drop the most recent tap, or the most recently closed obstacle.
    ///
    /// Returns `false` when there is nothing to undo.
    pub fn undo_last(&mut self) -> bool {
        match self.history.pop() {
            Some(Recorded::Tap(kind)) => {
                self.bucket_mut(kind).pop();
                debug!(%kind, "measurement undone");
                true
            }
            Some(Recorded::Obstacle) => {
                self.obstacles.pop();
                debug!("obstacle undone");
                true
            }
            None => false,
        }
    }

    /// Discard everything recorded for the current hallway. The level is kept.
    pub fn reset(&mut self) {
        *self = Self::new(self.level);
    }

    /// Close the obstacle outlined by the pending CUT measurements.
    ///
    /// On success the cut buffer is cleared and the polygon stored. An
    /// invalid outline is rejected and the CUT measurements are kept.
    pub fn close_obstacle(&mut self) -> Result<&Polygon, SessionError> {
        if self.cuts.is_empty() {
            return Err(SessionError::EmptyObstacle);
        }
        let polygon = build_polygon(self.cuts.iter().map(|m| &m.plane));
        polygon.validate()?;

        self.cuts.clear();
        self.history.retain(|r| *r != Recorded::Tap(MeasurementKind::Cut));
        self.history.push(Recorded::Obstacle);
        info!(corners = polygon.len(), "obstacle closed");
        self.obstacles.push(polygon);
        Ok(&self.obstacles[self.obstacles.len() - 1])
    }

    /// Re-anchor every buffered measurement against a refined trajectory.
    ///
    /// Measurements the source has no pose for are left unchanged. Returns
    /// the number of measurements moved.
    pub fn reanchor(&mut self, source: &impl PoseSource) -> usize {
        let mut moved = 0;
        for m in self
            .walls
            .iter_mut()
            .chain(self.rooms.iter_mut())
            .chain(self.markers.iter_mut())
            .chain(self.entries.iter_mut())
            .chain(self.cuts.iter_mut())
        {
            if let Some(pose) = source.depth_pose_at(m.timestamp)
                && m.reanchor(pose)
            {
                moved += 1;
            }
        }
        debug!(moved, "session re-anchored");
        moved
    }

    /// Close the hallway: build and validate its boundary, register it in
    /// `graph` and reconcile the far side of its links.
    ///
    /// Nothing is registered and no ID is allocated on failure; the buffer
    /// is left as it was. An exhausted ID space surfaces as
    /// [`NavError::IdSpaceExhausted`]. On success the session is cleared for the next
    /// hallway.
    pub fn finish_hallway(&mut self, name: &str, graph: &mut Graph) -> Result<HallwayId, SessionError> {
        let boundary = build_polygon(self.walls.iter().map(|m| &m.plane));
        if let Err(e) = boundary.validate() {
            warn!(error = %e, walls = self.walls.len(), "hallway boundary rejected");
            return Err(e.into());
        }
        let kinds = check_entries(&self.entries)?;
        for (e, kind) in self.entries.iter().zip(kinds) {
            if kind.max_links().is_some_and(|max| e.links().len() > max) {
                return Err(NavError::LinkCapacity {
                    kind,
                    name: e.label.clone().unwrap_or_default(),
                }
                .into());
            }
        }

        let id = graph.allocate_id()?;
        let hallway = assemble(
            id,
            name,
            self.level,
            boundary,
            Parts {
                rooms: &self.rooms,
                markers: &self.markers,
                entries: &self.entries,
                obstacles: &self.obstacles,
            },
        )?;
        graph.register(hallway)?;
        let reciprocal = reconcile_reciprocal(graph, id);
        info!(hallway = %id, name, reciprocal, "hallway finished");

        self.reset();
        Ok(id)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hallway::Link;
    use navgraph_types::{EntryKind, Point3};
    use std::f32::consts::{FRAC_PI_2, PI};

    fn wall(yaw: f32, at: Point3, t: f64) -> Measurement {
        Measurement::new(Mat4::from_yaw(yaw, at), Mat4::identity(), t, MeasurementKind::Wall)
    }

    fn cut(yaw: f32, at: Point3) -> Measurement {
        Measurement::new(Mat4::from_yaw(yaw, at), Mat4::identity(), 0.0, MeasurementKind::Cut)
    }

    /// Walls of the axis-aligned box (x0..x1, z0..z1), counter-clockwise.
    fn record_box(session: &mut RecordingSession, x0: f32, x1: f32, z0: f32, z1: f32) {
        let (cx, cz) = ((x0 + x1) / 2.0, (z0 + z1) / 2.0);
        session.record(wall(0.0, Point3::new(cx, 0.0, z0), 0.0));
        session.record(wall(-FRAC_PI_2, Point3::new(x1, 0.0, cz), 1.0));
        session.record(wall(PI, Point3::new(cx, 0.0, z1), 2.0));
        session.record(wall(FRAC_PI_2, Point3::new(x0, 0.0, cz), 3.0));
    }

    fn door(name: &str, at: Point3) -> Measurement {
        Measurement::new(Mat4::from_translation(at), Mat4::identity(), 0.0, MeasurementKind::Entry)
            .with_label(name)
            .with_entry_kind(EntryKind::Door)
    }

    #[test]
    fn record_sorts_into_buckets() {
        let mut s = RecordingSession::new(0);
        s.record(wall(0.0, Point3::zero(), 0.0));
        let h = s.record(door("D", Point3::zero()));
        assert_eq!(s.wall_count(), 1);
        assert_eq!(h, MeasurementHandle { kind: MeasurementKind::Entry, index: 0 });
        assert_eq!(s.measurement(h).unwrap().label.as_deref(), Some("D"));
    }

    #[test]
    fn can_close_needs_three_walls() {
        let mut s = RecordingSession::new(0);
        s.record(wall(0.0, Point3::zero(), 0.0));
        s.record(wall(FRAC_PI_2, Point3::new(1.0, 0.0, 1.0), 1.0));
        assert!(!s.can_close());
        s.record(wall(PI, Point3::new(0.0, 0.0, 2.0), 2.0));
        assert!(s.can_close());
    }

    #[test]
    fn undo_follows_recording_order() {
        let mut s = RecordingSession::new(0);
        s.record(wall(0.0, Point3::zero(), 0.0));
        s.record(door("D", Point3::zero()));
        assert!(s.undo_last());
        assert!(s.measurements(MeasurementKind::Entry).is_empty());
        assert_eq!(s.wall_count(), 1);
        assert!(s.undo_last());
        assert!(!s.undo_last());
    }

    #[test]
    fn reset_keeps_level() {
        let mut s = RecordingSession::new(3);
        record_box(&mut s, 0.0, 4.0, 0.0, 2.0);
        s.reset();
        assert!(s.is_empty());
        assert_eq!(s.level(), 3);
    }

    #[test]
    fn finish_too_few_walls_registers_nothing() {
        let mut graph = Graph::new();
        let mut s = RecordingSession::new(0);
        s.record(wall(0.0, Point3::zero(), 0.0));
        s.record(wall(FRAC_PI_2, Point3::new(2.0, 0.0, 2.0), 1.0));

        let err = s.finish_hallway("H", &mut graph).unwrap_err();
        assert!(matches!(err, SessionError::Geometry(GeometryError::TooFewCorners { found: 2 })));
        assert!(graph.is_empty());
        assert_eq!(graph.next_id(), 0);
        assert_eq!(s.wall_count(), 2);
    }

    #[test]
    fn finish_parallel_walls_registers_nothing() {
        let mut graph = Graph::new();
        let mut s = RecordingSession::new(0);
        s.record(wall(0.0, Point3::zero(), 0.0));
        s.record(wall(0.0, Point3::new(1.0, 0.0, 0.0), 1.0));
        s.record(wall(FRAC_PI_2, Point3::new(3.0, 0.0, 1.0), 2.0));

        let err = s.finish_hallway("H", &mut graph).unwrap_err();
        assert!(matches!(err, SessionError::Geometry(GeometryError::NonFiniteCorner { .. })));
        assert!(graph.is_empty());
    }

    #[test]
    fn finish_with_untyped_entry_fails() {
        let mut graph = Graph::new();
        let mut s = RecordingSession::new(0);
        record_box(&mut s, 0.0, 4.0, 0.0, 2.0);
        s.record(Measurement::new(Mat4::identity(), Mat4::identity(), 0.0, MeasurementKind::Entry));
        assert!(matches!(
            s.finish_hallway("H", &mut graph),
            Err(SessionError::UntypedEntry { index: 0 })
        ));
        assert!(graph.is_empty());
        assert_eq!(graph.next_id(), 0);
    }

    #[test]
    fn finish_with_exhausted_ids_keeps_buffer() {
        let mut graph = Graph::new();
        graph.restore_counter(u32::MAX);
        let mut s = RecordingSession::new(0);
        record_box(&mut s, 0.0, 4.0, 0.0, 2.0);

        assert_eq!(
            s.finish_hallway("H", &mut graph),
            Err(SessionError::Nav(NavError::IdSpaceExhausted))
        );
        assert!(graph.is_empty());
        assert_eq!(s.wall_count(), 4);
    }

    #[test]
    fn finish_registers_and_clears() {
        let mut graph = Graph::new();
        let mut s = RecordingSession::new(2);
        record_box(&mut s, 0.0, 4.0, 0.0, 2.0);
        s.record(door("Main", Point3::new(2.0, 0.0, 0.0)));
        s.record(
            Measurement::new(Mat4::from_translation(Point3::new(1.0, 0.0, 2.0)), Mat4::identity(), 0.0, MeasurementKind::Room)
                .with_label("Office"),
        );

        let id = s.finish_hallway("Lobby", &mut graph).unwrap();
        let h = graph.find(id).unwrap();
        assert_eq!(h.level, 2);
        assert_eq!(h.corners().len(), 4);
        assert!(h.corners()[0].approx_eq(Point3::new(4.0, 0.0, 0.0), 1e-4));
        assert_eq!(h.rooms[0].name, "Office");
        assert_eq!(h.entrypoints[0].name, "Main");
        assert!(s.is_empty());
        assert_eq!(s.level(), 2);
    }

    #[test]
    fn authoring_link_is_reconciled_on_finish() {
        let mut graph = Graph::new();
        let mut s = RecordingSession::new(0);
        record_box(&mut s, 0.0, 4.0, 0.0, 2.0);
        s.record(door("East", Point3::new(4.0, 0.0, 1.0)));
        let first = s.finish_hallway("West wing", &mut graph).unwrap();

        record_box(&mut s, 4.0, 8.0, 0.0, 2.0);
        let h = s.record(door("West", Point3::new(4.0, 0.0, 1.0)));
        s.measurement_mut(h)
            .unwrap()
            .add_link(Link::new(Point3::new(4.0, 0.0, 1.0), first))
            .unwrap();
        let second = s.finish_hallway("East wing", &mut graph).unwrap();

        let east = &graph.find(first).unwrap().entrypoints[0];
        let west = &graph.find(second).unwrap().entrypoints[0];
        assert_eq!(east.target_hallways(), vec![second]);
        assert_eq!(west.target_hallways(), vec![first]);
    }

    #[test]
    fn close_obstacle_stores_polygon() {
        let mut s = RecordingSession::new(0);
        s.record(cut(0.0, Point3::new(1.0, 0.0, 1.0)));
        s.record(cut(-FRAC_PI_2, Point3::new(2.0, 0.0, 1.5)));
        s.record(cut(PI, Point3::new(1.5, 0.0, 2.0)));
        s.record(cut(FRAC_PI_2, Point3::new(1.0, 0.0, 1.5)));
        assert_eq!(s.close_obstacle().unwrap().len(), 4);
        assert!(s.measurements(MeasurementKind::Cut).is_empty());

        // Undo removes the whole obstacle.
        assert!(s.undo_last());
        assert!(s.obstacles().is_empty());
    }

    #[test]
    fn invalid_obstacle_keeps_cuts() {
        let mut s = RecordingSession::new(0);
        assert_eq!(s.close_obstacle().unwrap_err(), SessionError::EmptyObstacle);

        s.record(cut(0.0, Point3::zero()));
        s.record(cut(FRAC_PI_2, Point3::new(1.0, 0.0, 1.0)));
        assert!(matches!(
            s.close_obstacle(),
            Err(SessionError::Geometry(GeometryError::TooFewCorners { found: 2 }))
        ));
        assert_eq!(s.measurements(MeasurementKind::Cut).len(), 2);
        assert!(s.obstacles().is_empty());
    }

    #[test]
    fn reanchor_moves_known_timestamps_only() {
        let mut s = RecordingSession::new(0);
        s.record(wall(0.0, Point3::zero(), 1.0));
        s.record(wall(0.0, Point3::zero(), 2.0));
        let shift = |t: f64| (t < 1.5).then(|| Mat4::from_translation(Point3::new(0.0, 0.0, 1.0)));

        assert_eq!(s.reanchor(&shift), 1);
        let walls = s.measurements(MeasurementKind::Wall);
        assert!(walls[0].position().approx_eq(Point3::new(0.0, 0.0, 1.0), 1e-6));
        assert_eq!(walls[1].position(), Point3::zero());
    }
}
