//! Step driver used by the scenario tests.
//!
//! Covers literals, identifiers, tuples, indexing, arithmetic, blocks,
//! variable definitions (including `let ref`), assignment, `if`, `while`
//! and global variable declarations. Anything else panics.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use rustc_hash::FxHashMap;
use tern_ir::{
    BinaryOp, BindingDecl, BindingKind, DeclKind, Declaration, ExprKind, Expression, Statement,
    StmtKind,
};

use crate::errors::invalid_element_path;
use crate::{
    Action, ActionKind, ActionStack, EvalMode, EvalResult, RuntimeScope, SharedHeap, Value,
    ValueNodeView,
};

#[derive(Clone, Copy)]
enum Step<'ast> {
    Value(&'ast Expression),
    Location(&'ast Expression),
    Statement(&'ast Statement),
    Declaration(&'ast Declaration),
}

pub(super) struct Stepper<'ast> {
    pub(super) stack: ActionStack<'ast>,
    heap: SharedHeap,
    names: FxHashMap<&'ast str, ValueNodeView<'ast>>,
}

impl<'ast> Stepper<'ast> {
    pub(super) fn new(mode: EvalMode) -> Self {
        crate::init_tracing();
        let heap = SharedHeap::new();
        let stack = ActionStack::new(heap.clone())
            .with_mode(mode)
            .with_globals(RuntimeScope::new(heap.clone()));
        Stepper {
            stack,
            heap,
            names: FxHashMap::default(),
        }
    }

    pub(super) fn heap(&self) -> &SharedHeap {
        &self.heap
    }

    pub(super) fn live(&self) -> usize {
        self.heap.borrow().live_allocations()
    }

    /// Run `statement` to completion, returning the value of its last
    /// expression statement.
    pub(super) fn run(&mut self, statement: &'ast Statement) -> EvalResult<Option<Value>> {
        self.stack.start(Action::statement(statement))?;
        while !self.stack.is_empty() {
            self.step()?;
        }
        Ok(self.stack.take_result())
    }

    /// Run top-level declarations, binding their variables as globals.
    pub(super) fn declare(&mut self, declaration: &'ast Declaration) -> EvalResult<()> {
        self.stack.start(Action::declaration(declaration))?;
        while !self.stack.is_empty() {
            self.step()?;
        }
        Ok(())
    }

    pub(super) fn step(&mut self) -> EvalResult<()> {
        let (step, pos, results) = {
            let top = self.stack.top().expect("stepping an empty stack");
            let step = match top.kind() {
                ActionKind::ValueExpression { expression }
                | ActionKind::Expression { expression, .. } => Step::Value(*expression),
                ActionKind::Location { expression } => Step::Location(*expression),
                ActionKind::Statement { statement, .. } => Step::Statement(*statement),
                ActionKind::Declaration { declaration } => Step::Declaration(*declaration),
                other => panic!("test driver cannot step a {} frame", other.name()),
            };
            (step, top.pos(), top.results().to_vec())
        };
        match step {
            Step::Value(e) => self.step_value(e, pos, &results),
            Step::Location(e) => self.step_location(e, pos, &results),
            Step::Statement(s) => self.step_statement(s, pos, &results),
            Step::Declaration(d) => self.step_declaration(d, pos, &results),
        }
    }

    fn resolve(&self, name: &str) -> ValueNodeView<'ast> {
        self.names
            .get(name)
            .cloned()
            .unwrap_or_else(|| panic!("unresolved name {name}"))
    }

    fn declare_name(&mut self, binding: &'ast BindingDecl) -> ValueNodeView<'ast> {
        let view = ValueNodeView::new(binding);
        self.names.insert(binding.name.as_str(), view.clone());
        view
    }

    fn step_value(&mut self, e: &'ast Expression, pos: usize, results: &[Value]) -> EvalResult<()> {
        let loc = &e.source_loc;
        let value = match &e.kind {
            ExprKind::IntLiteral(n) => Value::Int(*n),
            ExprKind::BoolLiteral(b) => Value::Bool(*b),
            ExprKind::StringLiteral(s) => Value::string(s),
            ExprKind::Identifier(name) => {
                let bound = self.stack.value_of_node(&self.resolve(name), loc)?;
                match bound.as_location() {
                    Some(location) => self.heap.borrow().read(location.address(), loc)?,
                    None => bound,
                }
            }
            ExprKind::Tuple(elements) => {
                if let Some(element) = elements.get(pos) {
                    return self.stack.spawn(Action::value_expression(element));
                }
                Value::tuple(results.to_vec())
            }
            ExprKind::Index { aggregate, index } => {
                if pos == 0 {
                    return self.stack.spawn(Action::value_expression(aggregate));
                }
                let aggregate = &results[0];
                match aggregate.element(*index) {
                    Some(element) => element.clone(),
                    None => {
                        return Err(invalid_element_path(
                            *index,
                            aggregate.to_string(),
                            loc.clone(),
                        ))
                    }
                }
            }
            ExprKind::Binary { op, lhs, rhs } => match pos {
                0 => return self.stack.spawn(Action::value_expression(lhs)),
                1 => return self.stack.spawn(Action::value_expression(rhs)),
                _ => binary(*op, &results[0], &results[1]),
            },
            ExprKind::Call { .. } => panic!("test driver does not evaluate calls"),
        };
        self.stack.finish_action(Some(value));
        Ok(())
    }

    fn step_location(
        &mut self,
        e: &'ast Expression,
        pos: usize,
        results: &[Value],
    ) -> EvalResult<()> {
        let location = match &e.kind {
            ExprKind::Identifier(name) => {
                self.stack.value_of_node(&self.resolve(name), &e.source_loc)?
            }
            ExprKind::Index { aggregate, index } => {
                if pos == 0 {
                    return self.stack.spawn(Action::location(aggregate));
                }
                let base = results[0].as_location().expect("indexing a non-location");
                Value::location(base.address().element_address(*index))
            }
            _ => panic!("{e} does not denote storage"),
        };
        assert!(location.is_location(), "{e} is not bound to storage");
        self.stack.finish_action(Some(location));
        Ok(())
    }

    fn step_statement(
        &mut self,
        s: &'ast Statement,
        pos: usize,
        results: &[Value],
    ) -> EvalResult<()> {
        match &s.kind {
            StmtKind::Expression(e) => {
                if pos == 0 {
                    return self.stack.spawn(Action::value_expression(e));
                }
                self.stack.finish_action(results.first().cloned());
            }
            StmtKind::VariableDefinition { binding, init } => {
                if pos == 0 {
                    let init_action = if binding.kind == BindingKind::Reference {
                        Action::location(init)
                    } else {
                        Action::value_expression(init)
                    };
                    return self.stack.spawn(init_action);
                }
                let view = self.declare_name(binding);
                let mut scope = RuntimeScope::new(self.heap.clone());
                if binding.kind == BindingKind::Reference {
                    let location = results[0].as_location().expect("reference to a value");
                    scope.bind_and_pin(view, location.address().clone());
                } else {
                    scope.initialize(view, results[0].clone());
                }
                self.stack.merge_scope(scope);
                self.stack.finish_action(None);
            }
            StmtKind::Assign { lhs, rhs } => match pos {
                0 => return self.stack.spawn(Action::location(lhs)),
                1 => return self.stack.spawn(Action::value_expression(rhs)),
                _ => {
                    let location = results[0].as_location().expect("assigning to a value");
                    self.heap.borrow_mut().write(
                        location.address(),
                        results[1].clone(),
                        &s.source_loc,
                    )?;
                    self.stack.finish_action(None);
                }
            },
            StmtKind::Block(statements) => {
                if pos == 0 && !statements.is_empty() {
                    let top = self.stack.top_mut().expect("block frame");
                    top.start_scope(RuntimeScope::new(self.heap.clone()));
                }
                match statements.get(pos) {
                    Some(statement) => return self.stack.spawn(Action::statement(statement)),
                    None => self.stack.finish_action(results.last().cloned()),
                }
            }
            StmtKind::If {
                condition,
                then_block,
                else_block,
            } => match pos {
                0 => return self.stack.spawn(Action::value_expression(condition)),
                1 => {
                    if results[0] == Value::Bool(true) {
                        return self.stack.spawn(Action::statement(then_block));
                    }
                    match else_block {
                        Some(else_block) => {
                            return self.stack.spawn(Action::statement(else_block))
                        }
                        None => self.stack.finish_action(None),
                    }
                }
                _ => self.stack.finish_action(None),
            },
            StmtKind::While { condition, body } => match pos {
                0 => return self.stack.spawn(Action::value_expression(condition)),
                1 if results[0] == Value::Bool(true) => {
                    return self.stack.spawn(Action::statement(body))
                }
                1 => self.stack.finish_action(None),
                _ => self.stack.top_mut().expect("loop frame").clear(),
            },
            StmtKind::Return(_) => panic!("test driver does not evaluate returns"),
        }
        Ok(())
    }

    fn step_declaration(
        &mut self,
        d: &'ast Declaration,
        pos: usize,
        results: &[Value],
    ) -> EvalResult<()> {
        match &d.kind {
            DeclKind::Variable { binding, init } => {
                if let (0, Some(init)) = (pos, init) {
                    return self.stack.spawn(Action::value_expression(init));
                }
                let view = self.declare_name(binding);
                let value = results.first().cloned().unwrap_or(Value::Int(0));
                let mut scope = RuntimeScope::new(self.heap.clone());
                scope.initialize(view, value);
                self.stack.merge_scope(scope);
            }
            DeclKind::Function { .. } => {}
        }
        self.stack.finish_action(None);
        Ok(())
    }
}

fn binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> Value {
    match (op, lhs, rhs) {
        (BinaryOp::Add, Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_add(*b)),
        (BinaryOp::Sub, Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_sub(*b)),
        (BinaryOp::Mul, Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_mul(*b)),
        (BinaryOp::Lt, Value::Int(a), Value::Int(b)) => Value::Bool(a < b),
        (BinaryOp::Eq, a, b) => Value::Bool(a == b),
        (BinaryOp::NotEq, a, b) => Value::Bool(a != b),
        (BinaryOp::And, Value::Bool(a), Value::Bool(b)) => Value::Bool(*a && *b),
        (BinaryOp::Or, Value::Bool(a), Value::Bool(b)) => Value::Bool(*a || *b),
        (op, a, b) => panic!("cannot apply {} to {a} and {b}", op.as_symbol()),
    }
}
