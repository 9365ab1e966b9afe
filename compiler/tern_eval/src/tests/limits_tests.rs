#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;
use tern_ir::{AstBuilder, BinaryOp, BindingKind};

use super::helper::Stepper;
use crate::{EvalErrorKind, EvalMode};

#[test]
fn const_eval_budget_stops_a_runaway_loop() {
    // { var i = 0; while true { i = i + 1; } }
    let mut b = AstBuilder::new("limits.tern");
    let i = b.binding("i", BindingKind::Var, None);
    let zero = b.int(0);
    let def_i = b.var_def(i, zero);
    let cond = b.bool(true);
    let lhs = b.ident("i");
    let i_ref = b.ident("i");
    let one = b.int(1);
    let sum = b.binary(BinaryOp::Add, i_ref, one);
    let step = b.assign(lhs, sum);
    let body = b.block(vec![step]);
    let forever = b.while_stmt(cond, body);
    let program = b.block(vec![def_i, forever]);

    let mut stepper = Stepper::new(EvalMode::ConstEval { budget: 50 });
    let heap = stepper.heap().clone();
    let err = stepper.run(&program).unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::BudgetExceeded { budget: 50 });

    drop(stepper);
    assert_eq!(heap.borrow().live_allocations(), 0);
}

#[test]
fn test_run_depth_limit_stops_deep_nesting() {
    let mut b = AstBuilder::new("limits.tern");
    let mut nested = b.int(0);
    for _ in 0..600 {
        nested = b.tuple(vec![nested]);
    }
    let program = b.expr_stmt(nested);

    let mut stepper = Stepper::new(EvalMode::TestRun);
    let err = stepper.run(&program).unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::StackOverflow { depth: 500 });

    let mut stepper = Stepper::new(EvalMode::Interpret);
    assert!(stepper.run(&program).unwrap().is_some());
}

#[test]
fn indexing_past_the_end_is_reported() {
    // { var t = (1, 2); t[5]; }
    let mut b = AstBuilder::new("limits.tern");
    let t = b.binding("t", BindingKind::Var, None);
    let one = b.int(1);
    let two = b.int(2);
    let pair = b.tuple(vec![one, two]);
    let def_t = b.var_def(t, pair);
    let t_ref = b.ident("t");
    let read = b.index(t_ref, 5);
    let use_read = b.expr_stmt(read);
    let program = b.block(vec![def_t, use_read]);

    let mut stepper = Stepper::new(EvalMode::Interpret);
    let err = stepper.run(&program).unwrap_err();
    assert_eq!(
        err.kind,
        EvalErrorKind::InvalidElementPath {
            index: 5,
            value: "(1, 2)".to_owned()
        }
    );
}
