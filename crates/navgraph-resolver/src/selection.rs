//! The level → hallway → entrypoint chain shared by both workflows.
//!
//! | Step         | Prompt                       | Back goes to  |
//! |--------------|------------------------------|---------------|
//! | `Level`      | [`Prompt::ChooseLevel`]      | caller        |
//! | `Hallway`    | [`Prompt::ChooseHallway`]    | `Level`       |
//! | `Entrypoint` | [`Prompt::ChooseEntrypoint`] | `Hallway`     |
//!
//! Levels are offered ascending, hallway and entrypoint names
//! lexicographically. Duplicate names collapse to one choice which resolves
//! to the lowest hallway ID or the first entrypoint in list order.

use navgraph_model::{EntrypointRef, Graph};
use navgraph_types::{EntryKind, HallwayId};

use crate::prompt::{Answer, Prompt};
use crate::workflow::ResolveError;

/// What the chain is looking for a partner for.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Source {
    pub kind: EntryKind,
    /// The entrypoint itself when it already lives in the graph.
    pub own: Option<EntrypointRef>,
    /// Hallways the source already links to.
    pub linked: Vec<HallwayId>,
}

impl Source {
    /// Lifts skip hallways they already reach.
    fn skips_hallway(&self, id: HallwayId) -> bool {
        self.kind.is_lift() && self.linked.contains(&id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Step {
    Level,
    Hallway { level: i32 },
    Entrypoint { level: i32, hallway: HallwayId },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Outcome {
    /// Moved within the chain; a new prompt is pending.
    Continue,
    Chosen(EntrypointRef),
    /// Backed out of the first step.
    Back,
    Cancelled,
}

pub(crate) fn hallway_candidates(graph: &Graph, source: &Source, level: i32) -> Vec<(String, HallwayId)> {
    let mut found: Vec<(String, HallwayId)> = graph
        .hallways_on_level(level)
        .into_iter()
        .filter(|h| !source.skips_hallway(h.id))
        .map(|h| (h.name.clone(), h.id))
        .collect();
    found.dedup_by(|later, earlier| later.0 == earlier.0);
    found
}

pub(crate) fn entrypoint_candidates(graph: &Graph, source: &Source, hallway: HallwayId) -> Vec<(String, usize)> {
    let Some(h) = graph.find(hallway) else {
        return Vec::new();
    };
    if source.skips_hallway(hallway) {
        return Vec::new();
    }
    let mut found: Vec<(String, usize)> = h
        .entrypoints
        .iter()
        .enumerate()
        .filter(|(i, _)| source.own != Some(EntrypointRef::new(hallway, *i)))
        .filter(|(_, e)| e.kind.is_compatible_with(source.kind))
        .filter(|(_, e)| e.kind.is_lift() || e.links().is_empty())
        .map(|(i, e)| (e.name.clone(), i))
        .collect();
    found.sort();
    found.dedup_by(|later, earlier| later.0 == earlier.0);
    found
}

fn names<T>(candidates: &[(String, T)]) -> Vec<String> {
    candidates.iter().map(|(n, _)| n.clone()).collect()
}

/// Position within the chain.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Selection {
    step: Step,
}

impl Selection {
    pub fn new() -> Self {
        Self { step: Step::Level }
    }

    pub fn prompt(&self, graph: &Graph, source: &Source) -> Prompt {
        match self.step {
            Step::Level => Prompt::ChooseLevel {
                candidates: graph.levels(),
            },
            Step::Hallway { level } => Prompt::ChooseHallway {
                level,
                candidates: names(&hallway_candidates(graph, source, level)),
            },
            Step::Entrypoint { hallway, .. } => Prompt::ChooseEntrypoint {
                hallway: graph
                    .find(hallway)
                    .map_or_else(|| hallway.to_string(), |h| h.name.clone()),
                candidates: names(&entrypoint_candidates(graph, source, hallway)),
            },
        }
    }

    /// Apply `answer`. On error the step is left unchanged.
    pub fn advance(&mut self, graph: &Graph, source: &Source, answer: Answer) -> Result<Outcome, ResolveError> {
        match (self.step, answer) {
            (_, Answer::Cancel | Answer::Decline) => Ok(Outcome::Cancelled),

            (Step::Level, Answer::Back) => Ok(Outcome::Back),
            (Step::Level, Answer::Level(level)) => {
                if !graph.levels().contains(&level) {
                    return Err(ResolveError::UnknownCandidate(level.to_string()));
                }
                self.step = Step::Hallway { level };
                Ok(Outcome::Continue)
            }

            (Step::Hallway { .. }, Answer::Back) => {
                self.step = Step::Level;
                Ok(Outcome::Continue)
            }
            (Step::Hallway { level }, Answer::Hallway(name)) => {
                let hallway = hallway_candidates(graph, source, level)
                    .into_iter()
                    .find(|(n, _)| *n == name)
                    .map(|(_, id)| id)
                    .ok_or(ResolveError::UnknownCandidate(name))?;
                self.step = Step::Entrypoint { level, hallway };
                Ok(Outcome::Continue)
            }

            (Step::Entrypoint { level, .. }, Answer::Back) => {
                self.step = Step::Hallway { level };
                Ok(Outcome::Continue)
            }
            (Step::Entrypoint { hallway, .. }, Answer::Entrypoint(name)) => {
                let index = entrypoint_candidates(graph, source, hallway)
                    .into_iter()
                    .find(|(n, _)| *n == name)
                    .map(|(_, i)| i)
                    .ok_or(ResolveError::UnknownCandidate(name))?;
                Ok(Outcome::Chosen(EntrypointRef::new(hallway, index)))
            }

            (_, answer) => Err(ResolveError::UnexpectedAnswer { answer }),
        }
    }
}
