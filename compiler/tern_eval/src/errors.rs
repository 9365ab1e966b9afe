//! Recoverable evaluation errors.
//!
//! Two failure classes exist in the evaluation core. Violations of the
//! evaluator's own invariants (duplicate bindings, heap mismatches, double
//! release) are bugs in the surrounding compiler and panic on the spot with
//! an `internal error:` message. Everything in this module is the other
//! class: a property of the user's program, reported with the location that
//! triggered it and surfaced as a language-level runtime error.

use tern_ir::SourceLocation;
use thiserror::Error;

use crate::value::AllocationId;

/// Result of a fallible evaluation step.
pub type EvalResult<T> = Result<T, EvalError>;

/// Typed error category.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EvalErrorKind {
    /// A pinned binding was read after its storage was reassigned or freed.
    #[error("reference has changed since this value was bound")]
    StaleReference { binding: String },

    /// Storage was read or written after its allocation was released.
    #[error("access to {allocation}, which is no longer alive")]
    DeadAllocation { allocation: AllocationId },

    /// An element path selected something that is not there.
    #[error("element {index} does not exist in {value}")]
    InvalidElementPath { index: usize, value: String },

    /// The frame stack grew past the mode's depth limit.
    #[error("maximum recursion depth exceeded (limit: {depth})")]
    StackOverflow { depth: usize },

    /// More frames were started than the mode's budget allows.
    #[error("const eval budget exceeded (budget: {budget} frames)")]
    BudgetExceeded { budget: u32 },
}

/// Evaluation error.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{source_loc}: {kind}")]
pub struct EvalError {
    pub kind: EvalErrorKind,
    pub source_loc: SourceLocation,
}

impl EvalError {
    pub fn new(kind: EvalErrorKind, source_loc: SourceLocation) -> Self {
        EvalError { kind, source_loc }
    }
}

pub fn stale_reference(binding: &str, source_loc: SourceLocation) -> EvalError {
    EvalError::new(
        EvalErrorKind::StaleReference {
            binding: binding.to_owned(),
        },
        source_loc,
    )
}

pub fn dead_allocation(allocation: AllocationId, source_loc: SourceLocation) -> EvalError {
    EvalError::new(EvalErrorKind::DeadAllocation { allocation }, source_loc)
}

pub fn invalid_element_path(index: usize, value: String, source_loc: SourceLocation) -> EvalError {
    EvalError::new(EvalErrorKind::InvalidElementPath { index, value }, source_loc)
}

pub fn stack_overflow(depth: usize, source_loc: SourceLocation) -> EvalError {
    EvalError::new(EvalErrorKind::StackOverflow { depth }, source_loc)
}

pub fn budget_exceeded(budget: u32, source_loc: SourceLocation) -> EvalError {
    EvalError::new(EvalErrorKind::BudgetExceeded { budget }, source_loc)
}
