//! `navgraph-resolver` – Interactive connection resolution
//!
//! Linking an entrypoint to its partner in another hallway is a short
//! conversation with the operator: pick a level, then a hallway, then an
//! entrypoint, with the option to step back or give up at any point. This
//! crate models those conversations as resumable state machines that never
//! block on I/O.
//!
//! # Modules
//!
//! - [`prompt`] – [`Prompt`] and [`Answer`], the serialisable question and
//!   reply vocabulary, plus the [`Operator`] trait and a
//!   [`ScriptedOperator`] for tests and batch runs.
//! - [`workflow`] – the [`Workflow`] trait shared by both machines and the
//!   synchronous [`drive`] helper.
//! - [`authoring`] – [`LinkDialog`]: links the entry just placed while a
//!   hallway is being recorded. Links are written onto the measurement only.
//! - [`finalize`] – [`Resolver`]: walks every unresolved entrypoint of a
//!   finished graph and writes links symmetrically on both sides.
//!
//! # Candidate rules
//!
//! | Source       | Offered partners                                   |
//! |--------------|----------------------------------------------------|
//! | DOOR, STAIRS | DOOR or STAIRS entrypoints with no link yet        |
//! | LIFT         | LIFT entrypoints in hallways the lift does not reach |
//!
//! The source entrypoint is never offered to itself.

pub mod authoring;
pub mod finalize;
pub mod prompt;
mod selection;
pub mod workflow;

pub use authoring::{Authoring, LinkDialog};
pub use finalize::Resolver;
pub use prompt::{Answer, Operator, Prompt, ScriptedOperator};
pub use workflow::{ResolveError, Workflow, drive};
