//! Finalize-time repair of unresolved entrypoints.
//!
//! When a recording session ends, every unconnected DOOR/STAIRS entrypoint
//! and every LIFT entrypoint is pushed onto a stack. The [`Resolver`] pops
//! them one at a time and walks the operator through:
//!
//! ```text
//!   Confirm ──Confirm──▶ ChooseLevel ──▶ ChooseHallway ──▶ ChooseEntrypoint
//!      │  ◀────Back────────┘  ◀──Back──────┘  ◀───Back──────────┘    │
//!      │                                                           chosen
//!   Decline / Cancel                                                 │
//!      ▼                                                             ▼
//!   next entry ◀──── door/stairs linked ◀──── link both sides ◀──────┘
//!                    lift linked ─────▶ Confirm (same lift, "more?")
//! ```
//!
//! A confirmed pairing writes both entrypoints in one step. A door or stairs
//! partner that was queued on its own is dropped from the stack. Declining a
//! door or stairs leaves it unknown for the rest of the pass; declining a
//! lift moves on to the next entry.
//!
//! Resolved links stay written even if the operator stops answering.
//!
//! # Example
//!
//! ```rust
//! use navgraph_resolver::{Resolver, ScriptedOperator, drive};
//! use navgraph_model::Graph;
//!
//! let mut graph = Graph::new();
//! let mut resolver = Resolver::new(&graph);
//! let mut operator = ScriptedOperator::new([]);
//! assert_eq!(drive(&mut resolver, &mut graph, &mut operator).unwrap(), 0);
//! assert!(resolver.is_done());
//! ```

use navgraph_model::{EntrypointRef, Graph};
use navgraph_types::NavError;
use tracing::{debug, info, warn};

use crate::prompt::{Answer, Prompt};
use crate::selection::{Outcome, Selection, Source};
use crate::workflow::{ResolveError, Workflow};

#[derive(Debug, Clone, PartialEq)]
enum State {
    Confirm(EntrypointRef),
    Selecting {
        current: EntrypointRef,
        selection: Selection,
    },
    Done,
}

/// Stack-driven resolution over the whole graph.
#[derive(Debug, Clone)]
pub struct Resolver {
    stack: Vec<EntrypointRef>,
    state: State,
    links_written: usize,
}

impl Resolver {
    /// Seed the stack from `graph` and move to the first entry.
    pub fn new(graph: &Graph) -> Self {
        let stack = graph.unresolved_entrypoints();
        info!(pending = stack.len(), "connection resolution started");
        let mut resolver = Self {
            stack,
            state: State::Done,
            links_written: 0,
        };
        resolver.pop_next(graph);
        resolver
    }

    pub fn is_done(&self) -> bool {
        self.state == State::Done
    }

    /// The entrypoint being resolved.
    pub fn current(&self) -> Option<EntrypointRef> {
        match self.state {
            State::Confirm(r) | State::Selecting { current: r, .. } => Some(r),
            State::Done => None,
        }
    }

    /// Entries still waiting on the stack, excluding the current one.
    pub fn pending(&self) -> usize {
        self.stack.len()
    }

    pub fn links_written(&self) -> usize {
        self.links_written
    }

    fn pop_next(&mut self, graph: &Graph) {
        while let Some(next) = self.stack.pop() {
            match graph.entrypoint(next) {
                Some(e) if e.is_unresolved() => {
                    debug!(hallway = %next.hallway, entrypoint = %e.name, "resolving");
                    self.state = State::Confirm(next);
                    return;
                }
                Some(e) => debug!(hallway = %next.hallway, entrypoint = %e.name, "already resolved, skipping"),
                None => warn!(hallway = %next.hallway, index = next.index, "entrypoint not found, skipping"),
            }
        }
        if self.state != State::Done {
            info!(links = self.links_written, "connection resolution finished");
        }
        self.state = State::Done;
    }

    /// Skip past a current entrypoint that no longer resolves in `graph`.
    ///
    /// Returns `true` when one was skipped.
    fn skip_missing(&mut self, graph: &Graph) -> bool {
        let Some(current) = self.current() else {
            return false;
        };
        if graph.entrypoint(current).is_some() {
            return false;
        }
        warn!(hallway = %current.hallway, index = current.index, "entrypoint not found, skipping");
        self.pop_next(graph);
        true
    }

    fn source(graph: &Graph, r: EntrypointRef) -> Option<Source> {
        let e = graph.entrypoint(r)?;
        Some(Source {
            kind: e.kind,
            own: Some(r),
            linked: e.target_hallways(),
        })
    }

    /// The question the resolver is suspended on, `None` once done.
    ///
    /// An entrypoint that has disappeared from `graph` is skipped first, so
    /// `None` always means the resolver is done.
    pub fn prompt(&mut self, graph: &Graph) -> Option<Prompt> {
        while self.skip_missing(graph) {}
        match &self.state {
            State::Done => None,
            State::Confirm(r) => {
                let e = graph.entrypoint(*r)?;
                let hallway = graph.find(r.hallway)?;
                Some(Prompt::Confirm {
                    entrypoint: e.name.clone(),
                    kind: e.kind,
                    hallway: hallway.name.clone(),
                    more: !e.links().is_empty(),
                })
            }
            State::Selecting { current, selection } => {
                let source = Self::source(graph, *current)?;
                Some(selection.prompt(graph, &source))
            }
        }
    }

    /// Apply the operator's answer. On error nothing changes.
    ///
    /// An answer aimed at an entrypoint that has since disappeared is
    /// dropped and the resolver moves on to the next entry.
    pub fn answer(&mut self, graph: &mut Graph, answer: Answer) -> Result<(), ResolveError> {
        if self.skip_missing(graph) {
            return Ok(());
        }
        match self.state.clone() {
            State::Done => Err(ResolveError::Finished),

            State::Confirm(current) => match answer {
                Answer::Confirm => {
                    self.state = State::Selecting {
                        current,
                        selection: Selection::new(),
                    };
                    Ok(())
                }
                Answer::Decline | Answer::Cancel => {
                    debug!(hallway = %current.hallway, index = current.index, "left unknown");
                    self.pop_next(graph);
                    Ok(())
                }
                answer => Err(ResolveError::UnexpectedAnswer { answer }),
            },

            State::Selecting {
                current,
                mut selection,
            } => {
                let source = Self::source(graph, current).ok_or(NavError::EntrypointNotFound {
                    hallway: current.hallway,
                    index: current.index,
                })?;
                match selection.advance(graph, &source, answer)? {
                    Outcome::Continue => {
                        self.state = State::Selecting { current, selection };
                    }
                    Outcome::Back => self.state = State::Confirm(current),
                    Outcome::Cancelled => self.pop_next(graph),
                    Outcome::Chosen(target) => {
                        graph.link_pair(current, target)?;
                        self.links_written += 1;
                        let target_is_lift = graph.entrypoint(target).is_some_and(|e| e.kind.is_lift());
                        if !target_is_lift {
                            self.stack.retain(|r| *r != target);
                        }
                        if source.kind.is_lift() {
                            self.state = State::Confirm(current);
                        } else {
                            self.pop_next(graph);
                        }
                    }
                }
                Ok(())
            }
        }
    }
}

impl Workflow<Graph> for Resolver {
    fn prompt(&mut self, graph: &Graph) -> Option<Prompt> {
        Resolver::prompt(self, graph)
    }

    fn answer(&mut self, graph: &mut Graph, answer: Answer) -> Result<(), ResolveError> {
        Resolver::answer(self, graph, answer)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
