//! Evaluation modes.
//!
//! `EvalMode` parameterizes the frame stack with the limits appropriate to
//! how the program is being run. Enum dispatch, like the rest of the
//! evaluator: each policy is a method that matches on the mode.

/// Evaluation mode, determining frame-stack limits.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum EvalMode {
    /// Standard mode for running a program. The frame stack lives on the
    /// heap, so depth is unbounded.
    #[default]
    Interpret,
    /// Compile-time evaluation: tight depth limit and a budget on the number
    /// of frames started, so a runaway constant expression cannot hang the
    /// compiler.
    ConstEval {
        /// Maximum number of frames started before aborting.
        budget: u32,
    },
    /// Test execution: generous but bounded depth.
    TestRun,
}

impl EvalMode {
    /// Maximum number of frames on the stack at once, or `None` for no limit.
    #[inline]
    pub fn max_stack_depth(&self) -> Option<usize> {
        match self {
            Self::Interpret => None,
            Self::ConstEval { .. } => Some(64),
            Self::TestRun => Some(500),
        }
    }

    /// Maximum number of frames started over the whole run, if limited.
    #[inline]
    pub fn frame_budget(&self) -> Option<u32> {
        match self {
            Self::ConstEval { budget } => Some(*budget),
            Self::Interpret | Self::TestRun => None,
        }
    }
}
