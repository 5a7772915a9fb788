//! Measurements: the raw unit handed over by the acquisition side.
//!
//! One measurement is one tap on a fitted plane. It carries the plane pose,
//! the depth-camera pose at capture time, a timestamp and its kind. ENTRY
//! measurements additionally collect provisional connection targets while
//! the hallway is still being recorded.

use navgraph_geometry::Mat4;
use navgraph_types::{EntryKind, MeasurementKind, NavError, Point3};
use tracing::debug;

use crate::hallway::{Link, push_link};

/// A single plane measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub plane: Mat4,
    pub depth_pose: Mat4,
    /// Capture time in seconds, as reported by the sensor service.
    pub timestamp: f64,
    pub kind: MeasurementKind,
    pub label: Option<String>,
    /// Passage type, set by the operator on ENTRY measurements.
    pub entry_kind: Option<EntryKind>,
    links: Vec<Link>,
}

impl Measurement {
    pub fn new(plane: Mat4, depth_pose: Mat4, timestamp: f64, kind: MeasurementKind) -> Self {
        Self {
            plane,
            depth_pose,
            timestamp,
            kind,
            label: None,
            entry_kind: None,
            links: Vec::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_entry_kind(mut self, kind: EntryKind) -> Self {
        self.entry_kind = Some(kind);
        self
    }

    /// World position of the tapped plane.
    pub fn position(&self) -> Point3 {
        self.plane.translation()
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Record a provisional connection from this entry to `link`.
    ///
    /// Only ENTRY measurements accept links. A DOOR or STAIRS entry holds at
    /// most one; an entry whose kind is not chosen yet is not capped.
    pub fn add_link(&mut self, link: Link) -> Result<(), NavError> {
        if self.kind != MeasurementKind::Entry {
            return Err(NavError::NotAnEntry(self.kind));
        }
        let name = self.label.as_deref().unwrap_or("unnamed");
        match self.entry_kind {
            Some(kind) => push_link(&mut self.links, kind, name, link),
            None => {
                self.links.push(link);
                Ok(())
            }
        }
    }

    /// Move the plane onto a refined device trajectory.
    ///
    /// The plane is carried by `new_depth_pose * inverse(depth_pose)` and the
    /// stored depth pose replaced. Returns `false` and leaves the measurement
    /// untouched when the stored depth pose is singular.
    pub fn reanchor(&mut self, new_depth_pose: Mat4) -> bool {
        let Some(old_inverse) = self.depth_pose.inverse() else {
            return false;
        };
        let correction = new_depth_pose.mul(&old_inverse);
        self.plane = correction.mul(&self.plane);
        self.depth_pose = new_depth_pose;
        debug!(timestamp = self.timestamp, kind = %self.kind, "measurement re-anchored");
        true
    }
}
