//! Tern Eval - Evaluation core for the Tern interpreter.
//!
//! The interpreter walks the AST with an explicit stack of frames instead
//! of native recursion, so evaluation can be suspended, inspected and
//! resumed at any step. This crate holds the pieces every step relies on.
//!
//! # Architecture
//!
//! - `Action`: one suspended frame (what is being evaluated, how far along,
//!   the sub-results so far, and the scope it introduced)
//! - `ActionStack`: pushes and pops frames, forwards results to callers and
//!   resolves bindings through the scopes of live frames
//! - `RuntimeScope`: binding environment that owns heap allocations and
//!   detects reads through stale references
//! - `Heap` / `SharedHeap`: address-based storage with per-allocation pins
//! - `Value`, `Address`, `LocationValue`: what bindings are bound to
//!
//! # Errors
//!
//! Violated internal invariants panic with an `internal error:` message.
//! Errors in the evaluated program are returned as `EvalError`.

mod action;
mod action_stack;
pub mod errors;
mod eval_mode;
mod heap;
mod runtime_scope;
mod value;
mod value_node;

#[cfg(test)]
mod tests;

pub use action::{Action, ActionKind};
pub use action_stack::ActionStack;
pub use errors::{EvalError, EvalErrorKind, EvalResult};
pub use eval_mode::EvalMode;
pub use heap::{Heap, SharedHeap};
pub use runtime_scope::RuntimeScope;
pub use value::{Address, AllocationId, ElementPath, LocationValue, Value, ValueKind};
pub use value_node::ValueNodeView;

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing subscriber for debugging.
///
/// Entry point for embedders and test harnesses; safe to call repeatedly.
/// Set `RUST_LOG=tern_eval=debug` to see frame pushes and pops, or
/// `RUST_LOG=tern_eval=trace` to also see every heap access.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
