//! Tern IR - AST node handles for the evaluation core.
//!
//! The parser and type checker live elsewhere; this crate holds the node
//! shapes the evaluator refers to while it runs:
//! - `SourceLocation` for diagnostics
//! - `NodeId` for stable node identity
//! - AST nodes (`Expression`, `Statement`, `Declaration`, `TypeExpr`, `Witness`)
//! - `BindingDecl`, the declaration behind every runtime binding
//! - `AstBuilder`, which hands out fresh ids while constructing nodes
//!
//! # Design Philosophy
//!
//! - **Identity by id**: nodes compare by `NodeId`, never by structure
//! - **Borrowed, not owned**: the evaluator holds `&'ast` references into a
//!   tree that outlives the whole run

mod ast;
mod builder;
mod node_id;
mod source_loc;

pub use ast::{
    BinaryOp, BindingDecl, BindingKind, DeclKind, Declaration, ExprKind, Expression, Statement,
    StmtKind, TypeExpr, Witness,
};
pub use builder::AstBuilder;
pub use node_id::NodeId;
pub use source_loc::SourceLocation;
