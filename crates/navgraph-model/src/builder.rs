//! Hallway assembly from buffered measurements.
//!
//! The [`RecordingSession`](crate::session::RecordingSession) hands its
//! buckets to [`assemble`] once the operator closes a hallway. After the
//! hallway is registered, [`reconcile_reciprocal`] completes the far side of
//! every link that was written one-sided while recording.

use navgraph_geometry::Polygon;
use navgraph_types::{EntryKind, HallwayId};
use tracing::{debug, warn};

use crate::graph::Graph;
use crate::hallway::{Entrypoint, Hallway, Link, Marker, Room};
use crate::measurement::Measurement;
use crate::session::SessionError;

/// Measurement buckets of one hallway, already split by kind.
#[derive(Debug, Default)]
pub struct Parts<'a> {
    pub rooms: &'a [Measurement],
    pub markers: &'a [Measurement],
    pub entries: &'a [Measurement],
    pub obstacles: &'a [Polygon],
}

fn label_or(m: &Measurement, prefix: &str, index: usize) -> String {
    m.label
        .clone()
        .unwrap_or_else(|| format!("{prefix} {}", index + 1))
}

/// Check that every ENTRY measurement has a passage type and return the
/// types in bucket order.
pub fn check_entries(entries: &[Measurement]) -> Result<Vec<EntryKind>, SessionError> {
    entries
        .iter()
        .enumerate()
        .map(|(index, m)| m.entry_kind.ok_or(SessionError::UntypedEntry { index }))
        .collect()
}

/// Build a hallway from a validated boundary and its annotation buckets.
///
/// Provisional links on the entry measurements are carried over onto the
/// new entrypoints unchanged.
pub fn assemble(
    id: HallwayId,
    name: &str,
    level: i32,
    boundary: Polygon,
    parts: Parts<'_>,
) -> Result<Hallway, SessionError> {
    let kinds = check_entries(parts.entries)?;
    let mut hallway = Hallway::new(id, name, level, boundary)?;

    hallway.rooms = parts
        .rooms
        .iter()
        .enumerate()
        .map(|(i, m)| Room {
            position: m.position(),
            name: label_or(m, "Room", i),
        })
        .collect();
    hallway.markers = parts
        .markers
        .iter()
        .enumerate()
        .map(|(i, m)| Marker {
            position: m.position(),
            name: label_or(m, "Marker", i),
        })
        .collect();
    hallway.obstacles = parts.obstacles.to_vec();

    for (i, (m, kind)) in parts.entries.iter().zip(kinds).enumerate() {
        let mut entry = Entrypoint::new(label_or(m, "Entry", i), kind, m.position(), id);
        for link in m.links() {
            entry.add_link(*link)?;
        }
        hallway.entrypoints.push(entry);
    }
    Ok(hallway)
}

/// Write the far side of every link leaving hallway `owner`.
///
/// For each link the target hallway is looked up and its first entrypoint
/// at the link position (within the position epsilon) gains a link back to
/// the owning entrypoint. Missing hallways, missing entrypoints and full
/// far sides are logged and skipped. Returns the number of links written.
pub fn reconcile_reciprocal(graph: &mut Graph, owner: HallwayId) -> usize {
    let Some(hallway) = graph.find(owner) else {
        warn!(hallway = %owner, "cannot reconcile links of unknown hallway");
        return 0;
    };
    let pending: Vec<(String, Link, Link)> = hallway
        .entrypoints
        .iter()
        .flat_map(|e| {
            e.links()
                .iter()
                .map(move |l| (e.name.clone(), *l, Link::new(e.position, owner)))
        })
        .collect();

    let mut written = 0;
    for (name, outgoing, back) in pending {
        let Some(target) = graph.find_mut(outgoing.hallway) else {
            warn!(hallway = %outgoing.hallway, entrypoint = %name, "link target hallway not found, skipping");
            continue;
        };
        let Some(index) = target.entrypoint_at(outgoing.position) else {
            warn!(
                hallway = %outgoing.hallway,
                entrypoint = %name,
                position = %outgoing.position,
                "no entrypoint at link position, leaving link one-sided"
            );
            continue;
        };
        let far = &mut target.entrypoints[index];
        if far.has_link(back.position, back.hallway) {
            continue;
        }
        match far.add_link(back) {
            Ok(()) => {
                debug!(hallway = %outgoing.hallway, entrypoint = %far.name, from = %name, "reciprocal link written");
                written += 1;
            }
            Err(e) => warn!(error = %e, entrypoint = %name, "reciprocal link refused"),
        }
    }
    written
}
