//! `navgraph-model` – the navigation graph and how it gets built.
//!
//! Owns the graph entities, the hallway-ID allocator, the buffer of the
//! hallway being recorded and the persisted document format.
//!
//! # Modules
//!
//! - [`measurement`] – [`Measurement`]: one tapped plane with its pose,
//!   timestamp, kind and provisional links.
//! - [`hallway`] – [`Hallway`], [`Entrypoint`], [`Link`], [`Room`] and
//!   [`Marker`].
//! - [`graph`] – [`Graph`] and [`IdAllocator`][graph::IdAllocator]: ID
//!   allocation, lookup, symmetric linking and level queries.
//! - [`builder`] – hallway assembly from measurement buckets and
//!   epsilon-matched reciprocal link reconciliation.
//! - [`session`] – [`RecordingSession`]: buffers taps, closes obstacles and
//!   finishes hallways into the graph.
//! - [`document`] – [`GraphDocument`][document::GraphDocument]: versioned
//!   JSON schema with exhaustive validation on decode.

pub mod builder;
pub mod document;
pub mod graph;
pub mod hallway;
pub mod measurement;
pub mod session;

pub use document::{DocumentError, GraphDocument};
pub use graph::{EntrypointRef, Graph, IdAllocator};
pub use hallway::{Entrypoint, Hallway, Link, Marker, Room};
pub use measurement::Measurement;
pub use session::{MeasurementHandle, PoseSource, RecordingSession, SessionError};
