//! The explicit frame stack.
//!
//! `ActionStack` is the contract the step driver relies on: it pushes and
//! pops `Action`s, forwards each finished frame's result to its caller, and
//! answers "what is this binding bound to right now" by walking the scopes
//! owned by live frames. The per-construct step logic stays with the driver.
//!
//! Scopes are released when their frame is popped, innermost first. A
//! scope opened with `spawn_with_scope` lives in its own `Scope` frame
//! directly beneath the child, and is popped together with the child.

use std::fmt;

use tern_ir::SourceLocation;

use crate::action::{Action, ActionKind};
use crate::errors::{budget_exceeded, stack_overflow, EvalResult};
use crate::eval_mode::EvalMode;
use crate::heap::SharedHeap;
use crate::{RuntimeScope, Value, ValueNodeView};

/// Stack of frames for one interpreter run.
pub struct ActionStack<'ast> {
    /// Frames, innermost last.
    todo: Vec<Action<'ast>>,
    /// Bindings that outlive every frame.
    globals: Option<RuntimeScope<'ast>>,
    heap: SharedHeap,
    mode: EvalMode,
    /// Frames pushed so far, for the mode's budget.
    frames_started: u32,
    /// Result of the bottom frame once the stack has emptied.
    result: Option<Value>,
}

impl<'ast> ActionStack<'ast> {
    /// Create an empty stack over `heap` in `Interpret` mode.
    pub fn new(heap: SharedHeap) -> Self {
        ActionStack {
            todo: Vec::new(),
            globals: None,
            heap,
            mode: EvalMode::default(),
            frames_started: 0,
            result: None,
        }
    }

    /// Set the evaluation mode.
    #[must_use]
    pub fn with_mode(mut self, mode: EvalMode) -> Self {
        self.mode = mode;
        self
    }

    /// Install the global scope, consulted after every frame scope.
    #[must_use]
    pub fn with_globals(mut self, globals: RuntimeScope<'ast>) -> Self {
        assert!(
            globals.heap().ptr_eq(&self.heap),
            "internal error: global scope uses a different heap"
        );
        self.globals = Some(globals);
        self
    }

    #[inline]
    pub fn heap(&self) -> &SharedHeap {
        &self.heap
    }

    #[inline]
    pub fn mode(&self) -> &EvalMode {
        &self.mode
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.todo.is_empty()
    }

    /// Number of frames on the stack.
    #[inline]
    pub fn depth(&self) -> usize {
        self.todo.len()
    }

    pub fn top(&self) -> Option<&Action<'ast>> {
        self.todo.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut Action<'ast>> {
        self.todo.last_mut()
    }

    pub fn globals(&self) -> Option<&RuntimeScope<'ast>> {
        self.globals.as_ref()
    }

    /// Result of the outermost frame, once it has finished.
    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    pub fn take_result(&mut self) -> Option<Value> {
        self.result.take()
    }

    /// Push the first frame of a run.
    pub fn start(&mut self, action: Action<'ast>) -> EvalResult<()> {
        assert!(
            self.todo.is_empty(),
            "internal error: starting a run on a stack with {} frames",
            self.todo.len()
        );
        self.result = None;
        self.check_limits(1, 1, &action)?;
        self.push(action);
        Ok(())
    }

    /// Advance the top frame's cursor and push `child` above it.
    pub fn spawn(&mut self, child: Action<'ast>) -> EvalResult<()> {
        self.check_limits(self.todo.len() + 1, 1, &child)?;
        self.advance_top("spawning");
        self.push(child);
        Ok(())
    }

    /// As `spawn`, with `scope` held by a `Scope` frame beneath `child`
    /// until `child` finishes.
    pub fn spawn_with_scope(
        &mut self,
        child: Action<'ast>,
        scope: RuntimeScope<'ast>,
    ) -> EvalResult<()> {
        self.check_limits(self.todo.len() + 2, 2, &child)?;
        self.advance_top("spawning");
        self.push(Action::scope_frame(scope));
        self.push(child);
        Ok(())
    }

    /// Advance the top frame's cursor without pushing anything.
    pub fn run_again(&mut self) {
        self.advance_top("re-running");
    }

    /// Replace the top frame with `child`, which produces its result.
    ///
    /// A scope owned by the replaced frame moves to `child`. If `child`
    /// cannot be pushed, the replaced frame stays where it was.
    pub fn delegate(&mut self, mut child: Action<'ast>) -> EvalResult<()> {
        self.check_limits(self.todo.len(), 1, &child)?;
        let Some(mut old) = self.todo.pop() else {
            panic!("internal error: delegating from an empty stack");
        };
        if let Some(scope) = old.take_scope() {
            child.start_scope(scope);
        }
        tracing::debug!(from = old.kind().name(), to = child.kind().name(), "delegate");
        drop(old);
        self.push(child);
        Ok(())
    }

    /// Pop the top frame, and any scope frames it was spawned with, and hand
    /// `result` to the caller.
    ///
    /// The popped frames' scopes are released here, innermost first.
    #[tracing::instrument(level = "trace", skip_all)]
    pub fn finish_action(&mut self, result: Option<Value>) {
        let Some(finished) = self.todo.pop() else {
            panic!("internal error: finishing an action on an empty stack");
        };
        tracing::debug!(depth = self.todo.len(), frame = %finished, "finish");
        drop(finished);
        while matches!(self.todo.last().map(Action::kind), Some(ActionKind::Scope)) {
            self.todo.pop();
        }
        match (self.todo.last_mut(), result) {
            (Some(caller), Some(result)) => caller.add_result(result),
            (Some(_), None) => {}
            (None, result) => self.result = result,
        }
    }

    /// The current value of `binding`.
    ///
    /// Constants come from the binding itself. Otherwise the innermost frame
    /// scope binding it wins, then the globals. A binding bound nowhere means
    /// name resolution and evaluation disagree, which is an internal error.
    pub fn value_of_node(
        &self,
        binding: &ValueNodeView<'ast>,
        source_loc: &SourceLocation,
    ) -> EvalResult<Value> {
        if let Some(constant) = binding.constant_value() {
            return Ok(constant.clone());
        }
        let frame_scopes = self.todo.iter().rev().filter_map(Action::scope);
        for scope in frame_scopes.chain(self.globals.as_ref()) {
            if let Some(value) = scope.get(binding, source_loc)? {
                return Ok(value);
            }
        }
        panic!("internal error: no value bound for {binding} at {source_loc}");
    }

    /// Merge `scope` into the innermost frame scope, or the globals.
    pub fn merge_scope(&mut self, scope: RuntimeScope<'ast>) {
        let target = self
            .todo
            .iter_mut()
            .rev()
            .find_map(Action::scope_mut)
            .or(self.globals.as_mut());
        let Some(target) = target else {
            panic!("internal error: no scope to merge into");
        };
        target.merge(scope);
    }

    /// A scope seeing every binding visible from the top of the stack, with
    /// inner bindings shadowing outer ones. It owns nothing.
    pub fn capture_scope(&self) -> RuntimeScope<'ast> {
        let scopes: Vec<&RuntimeScope<'ast>> = self
            .todo
            .iter()
            .rev()
            .filter_map(Action::scope)
            .chain(self.globals.as_ref())
            .collect();
        if scopes.is_empty() {
            return RuntimeScope::new(self.heap.clone());
        }
        RuntimeScope::capture(&scopes)
    }

    fn advance_top(&mut self, what: &str) {
        let Some(top) = self.todo.last_mut() else {
            panic!("internal error: {what} with no frame on the stack");
        };
        top.set_pos(top.pos() + 1);
    }

    /// Fail if reaching `depth` frames, or starting `frames` more, would
    /// exceed the mode's limits. Called before any frame is touched, so a
    /// failed spawn leaves the stack as it was.
    fn check_limits(&self, depth: usize, frames: u32, action: &Action<'ast>) -> EvalResult<()> {
        if let Some(limit) = self.mode.max_stack_depth() {
            if depth > limit {
                return Err(stack_overflow(limit, self.error_loc(action)));
            }
        }
        if let Some(budget) = self.mode.frame_budget() {
            if self.frames_started.saturating_add(frames) > budget {
                return Err(budget_exceeded(budget, self.error_loc(action)));
            }
        }
        Ok(())
    }

    fn push(&mut self, action: Action<'ast>) {
        self.frames_started = self.frames_started.saturating_add(1);
        tracing::debug!(depth = self.todo.len(), kind = action.kind().name(), "push");
        self.todo.push(action);
    }

    /// Best location to blame for an error raised while pushing `action`.
    fn error_loc(&self, action: &Action<'ast>) -> SourceLocation {
        action
            .source_loc()
            .or_else(|| self.todo.iter().rev().find_map(Action::source_loc))
            .cloned()
            .unwrap_or_else(SourceLocation::builtin)
    }
}

impl Drop for ActionStack<'_> {
    fn drop(&mut self) {
        // Innermost frame first, so scopes are released in reverse order of
        // opening; the globals go last.
        while let Some(action) = self.todo.pop() {
            drop(action);
        }
    }
}

impl fmt::Display for ActionStack<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, action) in self.todo.iter().rev().enumerate() {
            if i > 0 {
                write!(f, " ## ")?;
            }
            write!(f, "{action}")?;
        }
        Ok(())
    }
}
