//! Evaluation frames.
//!
//! An `Action` is one unit of suspended progress: which construct is being
//! evaluated (`ActionKind`), how many of its sub-steps are done (`pos`), the
//! values those sub-steps produced (`results`), and the bindings the frame
//! introduced (`scope`). The driver keeps frames on an explicit stack
//! instead of recursing, so evaluation can stop between any two steps and
//! destruction can be scheduled as ordinary frames.
//!
//! The driver is the only mutator of `pos` and `results`. A frame checks
//! nothing about them; it only upholds the invariants of the scope it owns.

use std::fmt;

use tern_ir::{Declaration, Expression, SourceLocation, Statement, TypeExpr, Witness};

use crate::value::LocationValue;
use crate::{RuntimeScope, Value};

/// What a frame is evaluating.
#[derive(Debug)]
pub enum ActionKind<'ast> {
    /// Evaluate an expression to the location it denotes.
    Location { expression: &'ast Expression },
    /// Evaluate an expression to a value, reading through locations.
    ValueExpression { expression: &'ast Expression },
    /// Evaluate an expression in whatever category it naturally has.
    Expression {
        expression: &'ast Expression,
        /// Keep sub-expressions in their own category instead of converting
        /// them to values.
        preserve_nested_categories: bool,
        /// Storage the result should be initialized into, when the caller
        /// supplied one.
        location_received: Option<LocationValue>,
    },
    /// Resolve an interface witness.
    Witness { witness: &'ast Witness },
    /// Execute a statement.
    Statement {
        statement: &'ast Statement,
        location_received: Option<LocationValue>,
    },
    /// Elaborate a declaration.
    Declaration { declaration: &'ast Declaration },
    /// Instantiate a type with the current bindings.
    TypeInstantiation {
        ty: &'ast TypeExpr,
        source_loc: SourceLocation,
    },
    /// Marks the extent of a scope; the scope itself is the frame's `scope`.
    Scope,
    /// Re-enter the step logic of the frame below for a repeated
    /// sub-structure.
    Recursive,
    /// Run destructors for the locals of the frame's scope, newest first.
    CleanUp {
        locals_count: usize,
        source_loc: SourceLocation,
    },
    /// Destroy one value held in storage.
    Destroy {
        location: LocationValue,
        value: Value,
    },
}

impl ActionKind<'_> {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::Location { .. } => "location",
            ActionKind::ValueExpression { .. } => "value expression",
            ActionKind::Expression { .. } => "expression",
            ActionKind::Witness { .. } => "witness",
            ActionKind::Statement { .. } => "statement",
            ActionKind::Declaration { .. } => "declaration",
            ActionKind::TypeInstantiation { .. } => "type instantiation",
            ActionKind::Scope => "scope",
            ActionKind::Recursive => "recursive",
            ActionKind::CleanUp { .. } => "clean up",
            ActionKind::Destroy { .. } => "destroy",
        }
    }
}

/// One frame of suspended evaluation.
#[derive(Debug)]
pub struct Action<'ast> {
    kind: ActionKind<'ast>,
    /// Number of sub-steps completed.
    pos: usize,
    /// Values produced by completed sub-steps, in step order.
    results: Vec<Value>,
    scope: Option<RuntimeScope<'ast>>,
}

impl<'ast> Action<'ast> {
    fn with_kind(kind: ActionKind<'ast>, scope: Option<RuntimeScope<'ast>>) -> Self {
        Action {
            kind,
            pos: 0,
            results: Vec::new(),
            scope,
        }
    }

    pub fn location(expression: &'ast Expression) -> Self {
        Self::with_kind(ActionKind::Location { expression }, None)
    }

    pub fn value_expression(expression: &'ast Expression) -> Self {
        Self::with_kind(ActionKind::ValueExpression { expression }, None)
    }

    pub fn expression(expression: &'ast Expression, preserve_nested_categories: bool) -> Self {
        Self::with_kind(
            ActionKind::Expression {
                expression,
                preserve_nested_categories,
                location_received: None,
            },
            None,
        )
    }

    pub fn witness(witness: &'ast Witness) -> Self {
        Self::with_kind(ActionKind::Witness { witness }, None)
    }

    pub fn statement(statement: &'ast Statement) -> Self {
        Self::with_kind(
            ActionKind::Statement {
                statement,
                location_received: None,
            },
            None,
        )
    }

    pub fn declaration(declaration: &'ast Declaration) -> Self {
        Self::with_kind(ActionKind::Declaration { declaration }, None)
    }

    pub fn type_instantiation(ty: &'ast TypeExpr, source_loc: SourceLocation) -> Self {
        Self::with_kind(ActionKind::TypeInstantiation { ty, source_loc }, None)
    }

    /// A scope marker frame owning `scope`.
    pub fn scope_frame(scope: RuntimeScope<'ast>) -> Self {
        Self::with_kind(ActionKind::Scope, Some(scope))
    }

    pub fn recursive() -> Self {
        Self::with_kind(ActionKind::Recursive, None)
    }

    /// A frame that destroys the locals of `scope` and then releases it.
    pub fn clean_up(scope: RuntimeScope<'ast>, source_loc: SourceLocation) -> Self {
        let locals_count = scope.allocations().len();
        Self::with_kind(
            ActionKind::CleanUp {
                locals_count,
                source_loc,
            },
            Some(scope),
        )
    }

    pub fn destroy(location: LocationValue, value: Value) -> Self {
        Self::with_kind(ActionKind::Destroy { location, value }, None)
    }

    #[inline]
    pub fn kind(&self) -> &ActionKind<'ast> {
        &self.kind
    }

    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn set_pos(&mut self, pos: usize) {
        self.pos = pos;
    }

    #[inline]
    pub fn results(&self) -> &[Value] {
        &self.results
    }

    pub fn add_result(&mut self, result: Value) {
        self.results.push(result);
    }

    pub fn replace_result(&mut self, index: usize, result: Value) {
        let len = self.results.len();
        let Some(slot) = self.results.get_mut(index) else {
            panic!("internal error: replacing result {index} of {len}");
        };
        *slot = result;
    }

    /// Restart this frame from its first step.
    pub fn clear(&mut self) {
        assert!(
            self.scope.is_none(),
            "internal error: restarting a {} frame that owns a scope",
            self.kind.name()
        );
        self.pos = 0;
        self.results.clear();
    }

    #[inline]
    pub fn scope(&self) -> Option<&RuntimeScope<'ast>> {
        self.scope.as_ref()
    }

    #[inline]
    pub fn scope_mut(&mut self) -> Option<&mut RuntimeScope<'ast>> {
        self.scope.as_mut()
    }

    /// Attach the scope this frame introduces.
    pub fn start_scope(&mut self, scope: RuntimeScope<'ast>) {
        assert!(
            self.scope.is_none(),
            "internal error: {} frame already owns a scope",
            self.kind.name()
        );
        self.scope = Some(scope);
    }

    /// Detach the frame's scope, e.g. to merge it into an enclosing one.
    pub fn take_scope(&mut self) -> Option<RuntimeScope<'ast>> {
        self.scope.take()
    }

    /// Storage the frame's result should be initialized into.
    pub fn location_received(&self) -> Option<&LocationValue> {
        match &self.kind {
            ActionKind::Expression {
                location_received, ..
            }
            | ActionKind::Statement {
                location_received, ..
            } => location_received.as_ref(),
            _ => None,
        }
    }

    pub fn set_location_received(&mut self, location: LocationValue) {
        match &mut self.kind {
            ActionKind::Expression {
                location_received, ..
            }
            | ActionKind::Statement {
                location_received, ..
            } => *location_received = Some(location),
            other => panic!(
                "internal error: {} frame cannot receive a location",
                other.name()
            ),
        }
    }

    /// Location of the node being evaluated, when the frame has one.
    pub fn source_loc(&self) -> Option<&SourceLocation> {
        match &self.kind {
            ActionKind::Location { expression }
            | ActionKind::ValueExpression { expression }
            | ActionKind::Expression { expression, .. } => Some(&expression.source_loc),
            ActionKind::Statement { statement, .. } => Some(&statement.source_loc),
            ActionKind::Declaration { declaration } => Some(&declaration.source_loc),
            ActionKind::TypeInstantiation { source_loc, .. }
            | ActionKind::CleanUp { source_loc, .. } => Some(source_loc),
            ActionKind::Witness { .. }
            | ActionKind::Scope
            | ActionKind::Recursive
            | ActionKind::Destroy { .. } => None,
        }
    }
}

impl fmt::Display for Action<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ActionKind::Location { expression }
            | ActionKind::ValueExpression { expression }
            | ActionKind::Expression { expression, .. } => write!(f, "{expression} ")?,
            ActionKind::Witness { witness } => write!(f, "{witness} ")?,
            ActionKind::Statement { statement, .. } => {
                statement.print_depth(1, f)?;
                write!(f, " ")?;
            }
            ActionKind::Declaration { declaration } => write!(f, "{declaration} ")?,
            ActionKind::TypeInstantiation { ty, .. } => write!(f, "{ty} ")?,
            ActionKind::Scope => {}
            ActionKind::Recursive => write!(f, "recursive")?,
            ActionKind::CleanUp { .. } => write!(f, "clean up")?,
            ActionKind::Destroy { .. } => write!(f, "destroy")?,
        }
        write!(f, ".{}.", self.pos)?;
        if !self.results.is_empty() {
            write!(f, " [[")?;
            for (i, result) in self.results.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{result}")?;
            }
            write!(f, "]]")?;
        }
        if let Some(scope) = &self.scope {
            write!(f, " {scope}")?;
        }
        Ok(())
    }
}
