//! Authoring-time linking of the entry just placed.
//!
//! While a hallway is still being recorded its entrypoints are plain
//! [`Measurement`]s with no ID to point back at. [`LinkDialog`] therefore
//! writes the chosen link onto the measurement only; the far side is filled
//! in when the hallway is finished and its links are reconciled by position.
//!
//! A DOOR or STAIRS entry takes one link and the dialog ends. A LIFT entry
//! loops back to "add another connection?" until the operator declines or
//! cancels.

use navgraph_model::{Graph, Link, Measurement};
use navgraph_types::{MeasurementKind, NavError};
use tracing::{debug, info};

use crate::prompt::{Answer, Prompt};
use crate::selection::{Outcome, Selection, Source};
use crate::workflow::{ResolveError, Workflow};

/// Context of an authoring dialog: the graph to search and the entry to
/// extend.
pub struct Authoring<'a> {
    pub graph: &'a Graph,
    pub entry: &'a mut Measurement,
}

#[derive(Debug, Clone, PartialEq)]
enum State {
    Confirm,
    Selecting(Selection),
    Done,
}

/// Resumable dialog linking one ENTRY measurement.
#[derive(Debug, Clone)]
pub struct LinkDialog {
    /// Label of the hallway being recorded, shown in prompts.
    hallway: String,
    state: State,
}

fn source_of(entry: &Measurement) -> Result<Source, ResolveError> {
    match (entry.kind, entry.entry_kind) {
        (MeasurementKind::Entry, Some(kind)) => Ok(Source {
            kind,
            own: None,
            linked: entry.links().iter().map(|l| l.hallway).collect(),
        }),
        _ => Err(ResolveError::NotLinkable),
    }
}

impl LinkDialog {
    /// Open a dialog for `entry`, which must be a typed ENTRY measurement.
    ///
    /// A door or stairs that already holds its link starts finished.
    pub fn new(entry: &Measurement, hallway: impl Into<String>) -> Result<Self, ResolveError> {
        let source = source_of(entry)?;
        let full = source
            .kind
            .max_links()
            .is_some_and(|max| entry.links().len() >= max);
        Ok(Self {
            hallway: hallway.into(),
            state: if full { State::Done } else { State::Confirm },
        })
    }

    pub fn is_done(&self) -> bool {
        self.state == State::Done
    }

    pub fn prompt(&self, graph: &Graph, entry: &Measurement) -> Option<Prompt> {
        let source = source_of(entry).ok()?;
        match &self.state {
            State::Done => None,
            State::Confirm => Some(Prompt::Confirm {
                entrypoint: entry.label.clone().unwrap_or_default(),
                kind: source.kind,
                hallway: self.hallway.clone(),
                more: !entry.links().is_empty(),
            }),
            State::Selecting(selection) => Some(selection.prompt(graph, &source)),
        }
    }

    /// Apply the operator's answer. On error nothing changes.
    pub fn answer(&mut self, graph: &Graph, entry: &mut Measurement, answer: Answer) -> Result<(), ResolveError> {
        let source = source_of(entry)?;
        match self.state.clone() {
            State::Done => Err(ResolveError::Finished),
            State::Confirm => match answer {
                Answer::Confirm => {
                    self.state = State::Selecting(Selection::new());
                    Ok(())
                }
                Answer::Decline | Answer::Cancel => {
                    self.state = State::Done;
                    Ok(())
                }
                answer => Err(ResolveError::UnexpectedAnswer { answer }),
            },
            State::Selecting(mut selection) => {
                match selection.advance(graph, &source, answer)? {
                    Outcome::Continue => self.state = State::Selecting(selection),
                    Outcome::Back => self.state = State::Confirm,
                    Outcome::Cancelled => {
                        debug!(entry = ?entry.label, "authoring link cancelled");
                        self.state = State::Done;
                    }
                    Outcome::Chosen(target) => {
                        let far = graph.entrypoint(target).ok_or(NavError::EntrypointNotFound {
                            hallway: target.hallway,
                            index: target.index,
                        })?;
                        entry.add_link(Link::new(far.position, target.hallway))?;
                        info!(
                            entry = ?entry.label,
                            to_hallway = %target.hallway,
                            to = %far.name,
                            "provisional link recorded"
                        );
                        self.state = if source.kind.is_lift() {
                            State::Confirm
                        } else {
                            State::Done
                        };
                    }
                }
                Ok(())
            }
        }
    }
}

impl<'a> Workflow<Authoring<'a>> for LinkDialog {
    fn prompt(&mut self, ctx: &Authoring<'a>) -> Option<Prompt> {
        LinkDialog::prompt(self, ctx.graph, &*ctx.entry)
    }

    fn answer(&mut self, ctx: &mut Authoring<'a>, answer: Answer) -> Result<(), ResolveError> {
        LinkDialog::answer(self, ctx.graph, ctx.entry, answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::ScriptedOperator;
    use crate::workflow::drive;
    use navgraph_geometry::{Mat4, Polygon};
    use navgraph_model::{Entrypoint, Hallway};
    use navgraph_types::{EntryKind, HallwayId, Point3};

    fn graph() -> Graph {
        let mut graph = Graph::new();
        for (name, level, entries) in [
            ("Lobby", 0, vec![("Front", EntryKind::Door), ("Lift", EntryKind::Lift)]),
            ("Office", 1, vec![("Lift", EntryKind::Lift)]),
            ("Roof", 2, vec![("Lift", EntryKind::Lift)]),
        ] {
            let id = graph.allocate_id().unwrap();
            let corners = vec![Point3::zero(), Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 0.0, 1.0)];
            let mut h = Hallway::new(id, name, level, Polygon::new(corners)).unwrap();
            for (i, (n, k)) in entries.into_iter().enumerate() {
                h.entrypoints.push(Entrypoint::new(n, k, Point3::new(i as f32, level as f32 * 3.0, 0.0), id));
            }
            graph.register(h).unwrap();
        }
        graph
    }

    fn entry(kind: EntryKind) -> Measurement {
        Measurement::new(Mat4::identity(), Mat4::identity(), 0.0, MeasurementKind::Entry)
            .with_label("New")
            .with_entry_kind(kind)
    }

    #[test]
    fn door_takes_one_link_one_sided() {
        let graph = graph();
        let mut m = entry(EntryKind::Door);
        let mut dialog = LinkDialog::new(&m, "Annex").unwrap();
        let mut op = ScriptedOperator::new([
            Answer::Confirm,
            Answer::Level(0),
            Answer::Hallway("Lobby".into()),
            Answer::Entrypoint("Front".into()),
        ]);
        let mut ctx = Authoring {
            graph: &graph,
            entry: &mut m,
        };
        drive(&mut dialog, &mut ctx, &mut op).unwrap();

        assert!(dialog.is_done());
        assert_eq!(m.links(), &[Link::new(Point3::new(0.0, 0.0, 0.0), HallwayId(0))]);
        // The graph itself is untouched until reconciliation.
        let front = &graph.find(HallwayId(0)).unwrap().entrypoints[0];
        assert!(front.links().is_empty());
    }

    #[test]
    fn lift_loops_until_declined() {
        let graph = graph();
        let mut m = entry(EntryKind::Lift);
        let mut dialog = LinkDialog::new(&m, "Basement").unwrap();

        for (level, hallway) in [(0, "Lobby"), (2, "Roof")] {
            for a in [
                Answer::Confirm,
                Answer::Level(level),
                Answer::Hallway(hallway.into()),
                Answer::Entrypoint("Lift".into()),
            ] {
                dialog.answer(&graph, &mut m, a).unwrap();
            }
            assert!(matches!(
                dialog.prompt(&graph, &m),
                Some(Prompt::Confirm { more: true, .. })
            ));
        }
        dialog.answer(&graph, &mut m, Answer::Decline).unwrap();
        assert!(dialog.is_done());
        let targets: Vec<HallwayId> = m.links().iter().map(|l| l.hallway).collect();
        assert_eq!(targets, vec![HallwayId(0), HallwayId(2)]);
    }

    #[test]
    fn lift_does_not_offer_reached_hallways() {
        let graph = graph();
        let mut m = entry(EntryKind::Lift);
        m.add_link(Link::new(Point3::new(0.0, 3.0, 0.0), HallwayId(1))).unwrap();
        let mut dialog = LinkDialog::new(&m, "Basement").unwrap();
        dialog.answer(&graph, &mut m, Answer::Confirm).unwrap();
        dialog.answer(&graph, &mut m, Answer::Level(1)).unwrap();
        assert_eq!(
            dialog.prompt(&graph, &m),
            Some(Prompt::ChooseHallway { level: 1, candidates: vec![] })
        );
        assert_eq!(
            dialog.answer(&graph, &mut m, Answer::Hallway("Office".into())),
            Err(ResolveError::UnknownCandidate("Office".into()))
        );
    }

    #[test]
    fn cancel_ends_dialog() {
        let graph = graph();
        let mut m = entry(EntryKind::Stairs);
        let mut dialog = LinkDialog::new(&m, "Annex").unwrap();
        dialog.answer(&graph, &mut m, Answer::Confirm).unwrap();
        dialog.answer(&graph, &mut m, Answer::Cancel).unwrap();
        assert!(dialog.is_done());
        assert!(m.links().is_empty());
        assert_eq!(
            dialog.answer(&graph, &mut m, Answer::Confirm),
            Err(ResolveError::Finished)
        );
    }

    #[test]
    fn linked_door_starts_done() {
        let mut m = entry(EntryKind::Door);
        m.add_link(Link::new(Point3::zero(), HallwayId(0))).unwrap();
        let dialog = LinkDialog::new(&m, "Annex").unwrap();
        assert!(dialog.is_done());
        assert_eq!(dialog.prompt(&graph(), &m), None);
    }

    #[test]
    fn only_typed_entries_can_be_linked() {
        let wall = Measurement::new(Mat4::identity(), Mat4::identity(), 0.0, MeasurementKind::Wall);
        assert_eq!(LinkDialog::new(&wall, "H").unwrap_err(), ResolveError::NotLinkable);
        let untyped = Measurement::new(Mat4::identity(), Mat4::identity(), 0.0, MeasurementKind::Entry);
        assert_eq!(LinkDialog::new(&untyped, "H").unwrap_err(), ResolveError::NotLinkable);
    }
}
