//! The navigation graph: hallway storage, ID allocation and queries.
//!
//! [`Graph`] is the aggregate root. It owns every [`Hallway`] keyed by its
//! [`HallwayId`] and an [`IdAllocator`] that hands out fresh IDs. The graph
//! is append-only: hallways are registered, never removed, so a stored
//! [`EntrypointRef`] or link target stays valid for the graph's lifetime.
//!
//! # Persisted counter
//!
//! The allocator's position is bridged to the persisted document through
//! [`Graph::snapshot_counter`] (once per save) and [`Graph::restore_counter`]
//! (once per load). After a restore, newly allocated IDs never collide with
//! IDs already present in the stored document.
//!
//! # Example
//!
//! ```rust
//! use navgraph_model::graph::Graph;
//!
//! let mut graph = Graph::new();
//! let a = graph.allocate_id()?;
//! let b = graph.allocate_id()?;
//! assert!(b > a);
//!
//! graph.restore_counter(40);
//! assert_eq!(graph.allocate_id()?.0, 40);
//! # Ok::<(), navgraph_types::NavError>(())
//! ```

use std::collections::BTreeMap;
use std::fmt::Write as _;

use navgraph_types::{HallwayId, NavError, Point3};
use tracing::info;

use crate::hallway::{Entrypoint, Hallway, Link};

// ────────────────────────────────────────────────────────────────────────────
// IdAllocator
// ────────────────────────────────────────────────────────────────────────────

/// Monotonic hallway ID source.
///
/// `u32::MAX` is never handed out: a counter standing there means the ID
/// space is used up, and it still fits the persisted `id_counter` field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the current counter value, then advance it.
    pub fn allocate(&mut self) -> Result<HallwayId, NavError> {
        let id = self.next;
        self.next = id
            .checked_add(1)
            .ok_or(NavError::IdSpaceExhausted)?;
        Ok(HallwayId(id))
    }

    /// The value the next [`allocate`](Self::allocate) call will return.
    pub fn peek(&self) -> u32 {
        self.next
    }

    /// Raise the counter to at least `floor`. Never moves it backwards.
    pub fn raise_to(&mut self, floor: u32) {
        self.next = self.next.max(floor);
    }

    /// Move the counter past an ID that is now in use.
    pub fn claim(&mut self, id: HallwayId) -> Result<(), NavError> {
        let floor = id.0.checked_add(1).ok_or(NavError::IdSpaceExhausted)?;
        self.raise_to(floor);
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// EntrypointRef
// ────────────────────────────────────────────────────────────────────────────

/// Stable address of an entrypoint: owning hallway and list index.
///
/// Entrypoint lists only grow, so an index stays valid once issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntrypointRef {
    pub hallway: HallwayId,
    pub index: usize,
}

impl EntrypointRef {
    pub fn new(hallway: HallwayId, index: usize) -> Self {
        Self { hallway, index }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Graph
// ────────────────────────────────────────────────────────────────────────────

/// Hallways keyed by ID, plus the allocator and its persisted snapshot.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    hallways: BTreeMap<HallwayId, Hallway>,
    ids: IdAllocator,
    saved_counter: u32,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Identity ──────────────────────────────────────────────────────────

    /// Hand out a fresh hallway ID.
    pub fn allocate_id(&mut self) -> Result<HallwayId, NavError> {
        self.ids.allocate()
    }

    /// Copy the live counter into the persisted slot and return it.
    pub fn snapshot_counter(&mut self) -> u32 {
        self.saved_counter = self.ids.peek();
        self.saved_counter
    }

    /// Adopt a persisted counter as the allocator floor.
    pub fn restore_counter(&mut self, value: u32) {
        self.saved_counter = value;
        self.ids.raise_to(value);
    }

    /// Counter value recorded by the last snapshot or restore.
    pub fn saved_counter(&self) -> u32 {
        self.saved_counter
    }

    pub fn next_id(&self) -> u32 {
        self.ids.peek()
    }

    // ── Storage ───────────────────────────────────────────────────────────

    /// Insert `hallway` at its own ID.
    ///
    /// An ID that is already taken is refused and the stored hallway is kept.
    /// The allocator is raised past the ID so later allocations cannot
    /// collide with it; `u32::MAX` has no successor and is refused too.
    pub fn register(&mut self, hallway: Hallway) -> Result<(), NavError> {
        let id = hallway.id;
        if self.hallways.contains_key(&id) {
            return Err(NavError::DuplicateHallway(id));
        }
        self.ids.claim(id)?;
        info!(
            hallway = %id,
            name = %hallway.name,
            level = hallway.level,
            entrypoints = hallway.entrypoints.len(),
            "hallway registered"
        );
        self.hallways.insert(id, hallway);
        Ok(())
    }

    pub fn find(&self, id: HallwayId) -> Option<&Hallway> {
        self.hallways.get(&id)
    }

    pub fn find_mut(&mut self, id: HallwayId) -> Option<&mut Hallway> {
        self.hallways.get_mut(&id)
    }

    /// All hallways in ascending ID order.
    pub fn hallways(&self) -> impl Iterator<Item = &Hallway> {
        self.hallways.values()
    }

    pub fn len(&self) -> usize {
        self.hallways.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hallways.is_empty()
    }

    // ── Entrypoints ───────────────────────────────────────────────────────

    pub fn entrypoint(&self, r: EntrypointRef) -> Option<&Entrypoint> {
        self.find(r.hallway)?.entrypoints.get(r.index)
    }

    pub fn entrypoint_mut(&mut self, r: EntrypointRef) -> Option<&mut Entrypoint> {
        self.find_mut(r.hallway)?.entrypoints.get_mut(r.index)
    }

    fn require(&self, r: EntrypointRef) -> Result<&Entrypoint, NavError> {
        if self.find(r.hallway).is_none() {
            return Err(NavError::HallwayNotFound(r.hallway));
        }
        self.entrypoint(r).ok_or(NavError::EntrypointNotFound {
            hallway: r.hallway,
            index: r.index,
        })
    }

    /// Entrypoints still eligible for finalize-time resolution, in ascending
    /// (hallway, index) order: unconnected doors and stairs, and every lift.
    pub fn unresolved_entrypoints(&self) -> Vec<EntrypointRef> {
        self.hallways
            .values()
            .flat_map(|h| {
                h.entrypoints
                    .iter()
                    .enumerate()
                    .filter(|(_, e)| e.is_unresolved())
                    .map(move |(i, _)| EntrypointRef::new(h.id, i))
            })
            .collect()
    }

    /// Connect two entrypoints in one step, writing both sides.
    ///
    /// Both capacities are checked before either side is touched, so a
    /// refusal leaves the graph unchanged.
    pub fn link_pair(&mut self, a: EntrypointRef, b: EntrypointRef) -> Result<(), NavError> {
        let ea = self.require(a)?;
        let eb = self.require(b)?;
        for e in [ea, eb] {
            if e.is_full() {
                return Err(NavError::LinkCapacity {
                    kind: e.kind,
                    name: e.name.clone(),
                });
            }
        }
        let to_b = Link::new(eb.position, b.hallway);
        let to_a = Link::new(ea.position, a.hallway);
        let (name_a, name_b) = (ea.name.clone(), eb.name.clone());

        if let Some(e) = self.entrypoint_mut(a) {
            e.add_link(to_b)?;
        }
        if let Some(e) = self.entrypoint_mut(b) {
            e.add_link(to_a)?;
        }
        info!(
            from_hallway = %a.hallway,
            from = %name_a,
            to_hallway = %b.hallway,
            to = %name_b,
            "entrypoints linked"
        );
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// Distinct levels that hold at least one hallway, ascending.
    pub fn levels(&self) -> Vec<i32> {
        let mut levels: Vec<i32> = self.hallways.values().map(|h| h.level).collect();
        levels.sort_unstable();
        levels.dedup();
        levels
    }

    /// Hallways on `level`, sorted by name, then ID.
    pub fn hallways_on_level(&self, level: i32) -> Vec<&Hallway> {
        let mut found: Vec<&Hallway> = self
            .hallways
            .values()
            .filter(|h| h.level == level)
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        found
    }

    /// Every boundary corner on `level`, the input to plan projection.
    pub fn level_points(&self, level: i32) -> Vec<Point3> {
        self.hallways
            .values()
            .filter(|h| h.level == level)
            .flat_map(|h| h.corners().iter().copied())
            .collect()
    }

    /// Human-readable overview, one block per hallway in ID order.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        for h in self.hallways.values() {
            let _ = writeln!(out, "#{} {} (level {})", h.id, h.name, h.level);
            for e in &h.entrypoints {
                let targets: Vec<String> =
                    e.links().iter().map(|l| l.hallway.to_string()).collect();
                let _ = writeln!(out, "  {} {} -> [{}]", e.kind, e.name, targets.join(", "));
            }
        }
        out
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
