//! Operator protocol: what the workflows ask and what they accept back.
//!
//! Each [`Prompt`] is a suspension point. The host shows it however it likes
//! and feeds the operator's [`Answer`] back into the workflow. Prompts and
//! answers are plain serde data so a host can ship them over any transport.

use std::fmt;

use navgraph_types::EntryKind;
use serde::{Deserialize, Serialize};

/// A question put to the operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Prompt {
    /// Connect `entrypoint` now? `more` is set when it already has links.
    Confirm {
        entrypoint: String,
        kind: EntryKind,
        hallway: String,
        more: bool,
    },
    /// Pick a level, candidates ascending.
    ChooseLevel { candidates: Vec<i32> },
    /// Pick a hallway on `level`, candidates sorted by name.
    ChooseHallway { level: i32, candidates: Vec<String> },
    /// Pick an entrypoint on `hallway`, candidates sorted by name. May be
    /// empty when nothing there is eligible.
    ChooseEntrypoint {
        hallway: String,
        candidates: Vec<String>,
    },
}

impl Prompt {
    /// Names of the offered choices, empty for [`Prompt::Confirm`].
    pub fn candidate_labels(&self) -> Vec<String> {
        match self {
            Prompt::Confirm { .. } => Vec::new(),
            Prompt::ChooseLevel { candidates } => candidates.iter().map(i32::to_string).collect(),
            Prompt::ChooseHallway { candidates, .. } | Prompt::ChooseEntrypoint { candidates, .. } => {
                candidates.clone()
            }
        }
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prompt::Confirm {
                entrypoint,
                kind,
                hallway,
                more,
            } => {
                let verb = if *more { "Add another connection to" } else { "Connect" };
                write!(f, "{verb} {kind} \"{entrypoint}\" on {hallway}?")
            }
            Prompt::ChooseLevel { .. } => f.write_str("Choose a level"),
            Prompt::ChooseHallway { level, .. } => write!(f, "Choose a hallway on level {level}"),
            Prompt::ChooseEntrypoint { hallway, .. } => write!(f, "Choose an entrypoint on {hallway}"),
        }
    }
}

/// The operator's reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Answer {
    /// Yes to a [`Prompt::Confirm`].
    Confirm,
    /// Leave this entrypoint unknown.
    Decline,
    Level(i32),
    Hallway(String),
    Entrypoint(String),
    /// Return to the previous question of the same chain.
    Back,
    /// Abandon the current entrypoint for this pass.
    Cancel,
}

/// Something that answers prompts synchronously: a console, a script.
pub trait Operator {
    fn answer(&mut self, prompt: &Prompt) -> Answer;
}

/// Replays a fixed list of answers, then declines everything.
#[derive(Debug, Clone, Default)]
pub struct ScriptedOperator {
    answers: std::collections::VecDeque<Answer>,
    /// Every prompt seen, in order.
    pub transcript: Vec<Prompt>,
}

impl ScriptedOperator {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            transcript: Vec::new(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl Operator for ScriptedOperator {
    fn answer(&mut self, prompt: &Prompt) -> Answer {
        self.transcript.push(prompt.clone());
        self.answers.pop_front().unwrap_or(Answer::Decline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_operator_replays_then_declines() {
        let mut op = ScriptedOperator::new([Answer::Confirm, Answer::Level(2)]);
        let p = Prompt::ChooseLevel { candidates: vec![2] };
        assert_eq!(op.answer(&p), Answer::Confirm);
        assert_eq!(op.answer(&p), Answer::Level(2));
        assert_eq!(op.answer(&p), Answer::Decline);
        assert_eq!(op.transcript.len(), 3);
        assert_eq!(op.remaining(), 0);
    }

    #[test]
    fn prompt_serializes_tagged() {
        let p = Prompt::ChooseHallway {
            level: 1,
            candidates: vec!["A".into()],
        };
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v["type"], "choose_hallway");
        assert_eq!(v["level"], 1);

        let a: Answer = serde_json::from_str(r#"{"type":"level","value":3}"#).unwrap();
        assert_eq!(a, Answer::Level(3));
    }

    #[test]
    fn prompt_display_and_labels() {
        let p = Prompt::Confirm {
            entrypoint: "D1".into(),
            kind: EntryKind::Door,
            hallway: "Lobby".into(),
            more: false,
        };
        assert_eq!(p.to_string(), "Connect DOOR \"D1\" on Lobby?");
        assert!(p.candidate_labels().is_empty());
        let p = Prompt::ChooseLevel { candidates: vec![-1, 0] };
        assert_eq!(p.candidate_labels(), vec!["-1", "0"]);
    }
}
