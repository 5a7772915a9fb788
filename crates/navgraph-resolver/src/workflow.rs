//! The shape shared by both resolution workflows, and a synchronous driver.
//!
//! A workflow is a resumable state machine: [`Workflow::prompt`] reports the
//! question it is suspended on, [`Workflow::answer`] feeds the operator's
//! reply back in. Interactive hosts step it themselves as answers arrive;
//! [`drive`] runs it to completion against an [`Operator`] that answers on
//! the spot.

use navgraph_types::NavError;
use thiserror::Error;
use tracing::debug;

use crate::prompt::{Answer, Operator, Prompt};

/// Errors raised when an answer does not fit the current prompt.
///
/// The workflow's state is unchanged whenever one of these is returned, so
/// the host can simply ask again.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolveError {
    #[error("answer {answer:?} does not fit the current prompt")]
    UnexpectedAnswer { answer: Answer },

    #[error("\"{0}\" is not one of the offered candidates")]
    UnknownCandidate(String),

    #[error("the workflow has already finished")]
    Finished,

    #[error("only typed ENTRY measurements can be linked")]
    NotLinkable,

    #[error(transparent)]
    Nav(#[from] NavError),
}

/// A resumable workflow over a context `C`.
pub trait Workflow<C: ?Sized> {
    /// The pending question, `None` once the workflow has finished.
    ///
    /// May advance past steps whose subject no longer exists in `ctx`.
    fn prompt(&mut self, ctx: &C) -> Option<Prompt>;

    /// Apply the operator's answer to the pending question.
    fn answer(&mut self, ctx: &mut C, answer: Answer) -> Result<(), ResolveError>;
}

/// Run `machine` until it has no more questions, returning the number of
/// answers applied.
///
/// The first rejected answer is returned as an error; the machine stays at
/// the prompt that rejected it and may be driven again.
pub fn drive<C, W, O>(machine: &mut W, ctx: &mut C, operator: &mut O) -> Result<usize, ResolveError>
where
    C: ?Sized,
    W: Workflow<C> + ?Sized,
    O: Operator + ?Sized,
{
    let mut steps = 0;
    while let Some(prompt) = machine.prompt(ctx) {
        let answer = operator.answer(&prompt);
        debug!(?prompt, ?answer, "operator answered");
        machine.answer(ctx, answer)?;
        steps += 1;
    }
    Ok(steps)
}
