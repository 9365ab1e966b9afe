//! Binding identity.

use std::fmt;
use std::hash::{Hash, Hasher};

use tern_ir::{BindingDecl, NodeId};

use crate::Value;

/// Handle naming one binding occurrence in the program.
///
/// Views are non-owning and copied freely; the declaration they point at is
/// owned by the AST. Equality and hashing look only at the declaration's
/// `NodeId`, so two views are equal iff they denote the same occurrence.
///
/// A binding whose value the type checker already knows carries it as
/// `constant_value`. Such bindings are never materialized in storage.
#[derive(Clone, Debug)]
pub struct ValueNodeView<'ast> {
    base: &'ast BindingDecl,
    constant_value: Option<Value>,
}

impl<'ast> ValueNodeView<'ast> {
    pub fn new(base: &'ast BindingDecl) -> Self {
        ValueNodeView {
            base,
            constant_value: None,
        }
    }

    /// A view of a binding whose value is a compile-time constant.
    pub fn with_constant(base: &'ast BindingDecl, value: Value) -> Self {
        ValueNodeView {
            base,
            constant_value: Some(value),
        }
    }

    /// The declaration this view denotes.
    #[inline]
    pub fn base(&self) -> &'ast BindingDecl {
        self.base
    }

    #[inline]
    pub fn id(&self) -> NodeId {
        self.base.id
    }

    #[inline]
    pub fn constant_value(&self) -> Option<&Value> {
        self.constant_value.as_ref()
    }
}

impl PartialEq for ValueNodeView<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.base.id == other.base.id
    }
}

impl Eq for ValueNodeView<'_> {}

impl Hash for ValueNodeView<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.base.id.hash(state);
    }
}

impl fmt::Display for ValueNodeView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base)
    }
}
