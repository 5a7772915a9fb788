//! Persisted graph document: schema, validation and JSON codec.
//!
//! The on-disk shape is owned here; where the bytes go is up to the caller.
//!
//! ```text
//! {
//!   "version": 1,
//!   "hallways": { "<id>": HallwayRecord, ... },
//!   "id_counter": <next free id>
//! }
//! ```
//!
//! Entrypoint targets travel as two parallel lists, `positions_to` and
//! `hallway_to_ids`. Decoding checks every record exhaustively and either
//! yields a complete fresh [`Graph`] or fails as a whole, so a bad document
//! can never leave a half-populated graph behind.
//!
//! Links that point at hallways absent from the document are accepted: a
//! one-sided or dangling link is a legal state.
//!
//! # Example
//!
//! ```rust
//! use navgraph_model::{Graph, document};
//!
//! let mut graph = Graph::new();
//! graph.allocate_id().unwrap();
//! let json = document::encode(&mut graph).unwrap();
//!
//! let mut restored = document::decode(&json).unwrap();
//! assert_eq!(restored.allocate_id().unwrap().0, 1);
//! ```

use std::collections::BTreeMap;

use navgraph_geometry::{GeometryError, Polygon};
use navgraph_types::{EntryKind, HallwayId, NavError, Point3};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::graph::Graph;
use crate::hallway::{Entrypoint, Hallway, Link, Marker, Room};

/// Schema version written by [`encode`] and required by [`decode`].
pub const DOCUMENT_VERSION: u32 = 1;

// ────────────────────────────────────────────────────────────────────────────
// Error type
// ────────────────────────────────────────────────────────────────────────────

/// Why a document could not be encoded or decoded.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported document version {found} (expected 1)")]
    UnsupportedVersion { found: u32 },

    #[error("hallway stored under key {key} carries id {id}")]
    KeyMismatch { key: u32, id: u32 },

    #[error("entrypoint \"{entrypoint}\" on hallway {hallway}: {positions} target positions but {hallways} target hallways")]
    LinkLengthMismatch {
        hallway: u32,
        entrypoint: String,
        positions: usize,
        hallways: usize,
    },

    #[error("{kind} entrypoint \"{entrypoint}\" on hallway {hallway} has {links} connections")]
    LinkCapacity {
        hallway: u32,
        entrypoint: String,
        kind: EntryKind,
        links: usize,
    },

    #[error("entrypoint \"{entrypoint}\" listed on hallway {hallway} claims origin hallway {origin}")]
    ForeignOrigin {
        hallway: u32,
        entrypoint: String,
        origin: u32,
    },

    #[error("id_counter {counter} does not exceed hallway id {max_id}")]
    CounterBehindIds { counter: u32, max_id: u32 },

    #[error("hallway {hallway} boundary: {source}")]
    Polygon { hallway: u32, source: GeometryError },

    #[error("hallway {hallway} obstacle {index}: {source}")]
    Obstacle {
        hallway: u32,
        index: usize,
        source: GeometryError,
    },

    #[error(transparent)]
    Nav(#[from] NavError),
}

// ────────────────────────────────────────────────────────────────────────────
// Records
// ────────────────────────────────────────────────────────────────────────────

/// Root of the persisted graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct GraphDocument {
    pub version: u32,
    pub hallways: BTreeMap<u32, HallwayRecord>,
    /// Next hallway ID to hand out; greater than every key in `hallways`.
    pub id_counter: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct HallwayRecord {
    pub id: u32,
    pub name: String,
    pub level: i32,
    pub points: Vec<[f32; 3]>,
    pub rooms: Vec<AnnotationRecord>,
    pub markers: Vec<AnnotationRecord>,
    pub obstacles: Vec<Vec<[f32; 3]>>,
    pub connections: Vec<EntrypointRecord>,
}

/// A room or marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct AnnotationRecord {
    pub position: [f32; 3],
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct EntrypointRecord {
    pub name: String,
    pub kind: EntryKind,
    pub position_from: [f32; 3],
    pub hallway_from_id: u32,
    pub positions_to: Vec<[f32; 3]>,
    pub hallway_to_ids: Vec<u32>,
}

fn points_of(corners: &[Point3]) -> Vec<[f32; 3]> {
    corners.iter().map(|p| p.to_array()).collect()
}

fn polygon_of(points: &[[f32; 3]]) -> Polygon {
    Polygon::new(points.iter().copied().map(Point3::from).collect())
}

// ────────────────────────────────────────────────────────────────────────────
// Graph -> document
// ────────────────────────────────────────────────────────────────────────────

impl From<&Entrypoint> for EntrypointRecord {
    fn from(e: &Entrypoint) -> Self {
        Self {
            name: e.name.clone(),
            kind: e.kind,
            position_from: e.position.to_array(),
            hallway_from_id: e.hallway.0,
            positions_to: e.links().iter().map(|l| l.position.to_array()).collect(),
            hallway_to_ids: e.links().iter().map(|l| l.hallway.0).collect(),
        }
    }
}

impl From<&Hallway> for HallwayRecord {
    fn from(h: &Hallway) -> Self {
        Self {
            id: h.id.0,
            name: h.name.clone(),
            level: h.level,
            points: points_of(h.corners()),
            rooms: h
                .rooms
                .iter()
                .map(|r| AnnotationRecord {
                    position: r.position.to_array(),
                    name: r.name.clone(),
                })
                .collect(),
            markers: h
                .markers
                .iter()
                .map(|m| AnnotationRecord {
                    position: m.position.to_array(),
                    name: m.name.clone(),
                })
                .collect(),
            obstacles: h.obstacles.iter().map(|o| points_of(o.corners())).collect(),
            connections: h.entrypoints.iter().map(EntrypointRecord::from).collect(),
        }
    }
}

impl GraphDocument {
    /// Capture `graph`, snapshotting its ID counter.
    pub fn from_graph(graph: &mut Graph) -> Self {
        let id_counter = graph.snapshot_counter();
        Self {
            version: DOCUMENT_VERSION,
            hallways: graph
                .hallways()
                .map(|h| (h.id.0, HallwayRecord::from(h)))
                .collect(),
            id_counter,
        }
    }

    // ── Document -> graph ─────────────────────────────────────────────────

    /// Validate every record and build a fresh graph with its counter
    /// restored.
    pub fn into_graph(self) -> Result<Graph, DocumentError> {
        if self.version != DOCUMENT_VERSION {
            return Err(DocumentError::UnsupportedVersion {
                found: self.version,
            });
        }
        if let Some(&max_id) = self.hallways.keys().next_back()
            && max_id >= self.id_counter
        {
            return Err(DocumentError::CounterBehindIds {
                counter: self.id_counter,
                max_id,
            });
        }

        let hallways = self
            .hallways
            .into_iter()
            .map(|(key, record)| hallway_from_record(key, record))
            .collect::<Result<Vec<_>, _>>()?;

        let mut graph = Graph::new();
        let count = hallways.len();
        for hallway in hallways {
            graph.register(hallway)?;
        }
        graph.restore_counter(self.id_counter);
        info!(hallways = count, id_counter = self.id_counter, "graph document loaded");
        Ok(graph)
    }
}

fn hallway_from_record(key: u32, record: HallwayRecord) -> Result<Hallway, DocumentError> {
    if record.id != key {
        return Err(DocumentError::KeyMismatch { key, id: record.id });
    }
    let id = HallwayId(record.id);
    let mut hallway = Hallway::new(id, record.name, record.level, polygon_of(&record.points))
        .map_err(|source| DocumentError::Polygon {
            hallway: key,
            source,
        })?;

    for (index, points) in record.obstacles.iter().enumerate() {
        let obstacle = polygon_of(points);
        obstacle.validate().map_err(|source| DocumentError::Obstacle {
            hallway: key,
            index,
            source,
        })?;
        hallway.obstacles.push(obstacle);
    }
    hallway.rooms = record
        .rooms
        .into_iter()
        .map(|r| Room {
            position: r.position.into(),
            name: r.name,
        })
        .collect();
    hallway.markers = record
        .markers
        .into_iter()
        .map(|m| Marker {
            position: m.position.into(),
            name: m.name,
        })
        .collect();

    for c in record.connections {
        hallway.entrypoints.push(entrypoint_from_record(key, c)?);
    }
    Ok(hallway)
}

fn entrypoint_from_record(owner: u32, c: EntrypointRecord) -> Result<Entrypoint, DocumentError> {
    if c.hallway_from_id != owner {
        return Err(DocumentError::ForeignOrigin {
            hallway: owner,
            entrypoint: c.name,
            origin: c.hallway_from_id,
        });
    }
    if c.positions_to.len() != c.hallway_to_ids.len() {
        return Err(DocumentError::LinkLengthMismatch {
            hallway: owner,
            entrypoint: c.name,
            positions: c.positions_to.len(),
            hallways: c.hallway_to_ids.len(),
        });
    }

    let links = c.hallway_to_ids.len();
    let mut entry = Entrypoint::new(c.name, c.kind, c.position_from.into(), HallwayId(owner));
    for (position, hallway) in c.positions_to.into_iter().zip(c.hallway_to_ids) {
        entry
            .add_link(Link::new(position.into(), HallwayId(hallway)))
            .map_err(|e| match e {
                NavError::LinkCapacity { kind, name } => DocumentError::LinkCapacity {
                    hallway: owner,
                    entrypoint: name,
                    kind,
                    links,
                },
                other => other.into(),
            })?;
    }
    Ok(entry)
}

// ────────────────────────────────────────────────────────────────────────────
// Codec
// ────────────────────────────────────────────────────────────────────────────

/// Serialise `graph` as a pretty-printed JSON document.
pub fn encode(graph: &mut Graph) -> Result<String, DocumentError> {
    let doc = GraphDocument::from_graph(graph);
    Ok(serde_json::to_string_pretty(&doc)?)
}

/// Parse and validate a JSON document into a fresh graph.
pub fn decode(json: &str) -> Result<Graph, DocumentError> {
    let doc: GraphDocument = serde_json::from_str(json)?;
    doc.into_graph()
}

/// JSON Schema of [`GraphDocument`], pretty-printed.
pub fn schema_json() -> Result<String, DocumentError> {
    let schema = schemars::schema_for!(GraphDocument);
    Ok(serde_json::to_string_pretty(&schema)?)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
