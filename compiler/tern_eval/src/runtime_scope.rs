//! Binding environment for one dynamic extent.
//!
//! A `RuntimeScope` maps binding identities to values. A binding either holds
//! a value directly or denotes storage, in which case its value is a
//! `LocationValue`. Scopes own the heap allocations they create: dropping a
//! scope releases every allocation it still owns, so leaving a block or a
//! call frees exactly the storage introduced there.
//!
//! Ownership moves, it is never shared. `merge` and `take` hand a scope's
//! allocations to another owner and leave the source with none, so the
//! source's drop releases nothing.
//!
//! Misuse of this API (binding a name twice, mixing heaps, extending the
//! lifetime of a sub-object) is a bug in the evaluator, not in the program
//! being run, and panics with an `internal error:` message.

use std::collections::hash_map::Entry;
use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};
use tern_ir::{NodeId, SourceLocation};

use crate::errors::{stale_reference, EvalResult};
use crate::heap::SharedHeap;
use crate::value::{Address, AllocationId, LocationValue};
use crate::{Value, ValueNodeView};

/// Bindings introduced by one frame, and the storage they own.
pub struct RuntimeScope<'ast> {
    /// Bindings in insertion order (the order used for printing).
    locals: Vec<(ValueNodeView<'ast>, Value)>,
    /// Position of each binding in `locals`.
    index: FxHashMap<NodeId, usize>,
    /// Bindings whose storage is re-validated on every read.
    bound_values: FxHashSet<NodeId>,
    /// Allocations this scope releases when dropped, in creation order.
    allocations: Vec<AllocationId>,
    heap: SharedHeap,
}

impl<'ast> RuntimeScope<'ast> {
    /// Create an empty scope over `heap`.
    pub fn new(heap: SharedHeap) -> Self {
        RuntimeScope {
            locals: Vec::new(),
            index: FxHashMap::default(),
            bound_values: FxHashSet::default(),
            allocations: Vec::new(),
            heap,
        }
    }

    /// The heap this scope allocates from.
    #[inline]
    pub fn heap(&self) -> &SharedHeap {
        &self.heap
    }

    /// Bind `binding` to the storage at `address`.
    pub fn bind(&mut self, binding: ValueNodeView<'ast>, address: Address) {
        assert_not_constant(&binding);
        self.define(binding, Value::location(address));
    }

    /// Bind `binding` to the storage at `address` and pin it.
    ///
    /// Every later `get` of a pinned binding first asks the heap whether the
    /// storage is still the storage it was bound to.
    pub fn bind_and_pin(&mut self, binding: ValueNodeView<'ast>, address: Address) {
        self.bind(binding.clone(), address.clone());
        assert!(
            self.bound_values.insert(binding.id()),
            "internal error: duplicate pinned binding {binding}"
        );
        self.heap
            .borrow_mut()
            .bind_value_to_reference(&binding, &address);
    }

    /// Make this scope responsible for releasing the allocation at `address`.
    pub fn bind_lifetime_to_scope(&mut self, address: &Address) {
        assert!(
            address.is_whole_allocation(),
            "internal error: cannot extend the lifetime of sub-element {address}"
        );
        let allocation = address.allocation();
        assert!(
            !self.allocations.contains(&allocation),
            "internal error: {allocation} is already owned by this scope"
        );
        self.allocations.push(allocation);
    }

    /// Bind `binding` directly to `value`.
    pub fn bind_value(&mut self, binding: ValueNodeView<'ast>, value: Value) {
        assert_not_constant(&binding);
        assert_not_location(&binding, &value);
        self.define(binding, value);
    }

    /// Allocate storage holding `value`, bind `binding` to it and own the
    /// allocation. Returns the new location.
    pub fn initialize(&mut self, binding: ValueNodeView<'ast>, value: Value) -> LocationValue {
        assert_not_constant(&binding);
        assert_not_location(&binding, &value);
        let allocation = self.heap.borrow_mut().allocate_value(value);
        self.allocations.push(allocation);
        let location = LocationValue::new(Address::new(allocation));
        self.define(binding, Value::Location(location.clone()));
        location
    }

    /// Absorb `other`'s bindings, pins and allocations.
    ///
    /// The two scopes must come from the same heap and bind disjoint sets of
    /// names, as sibling sub-scopes always do.
    pub fn merge(&mut self, mut other: RuntimeScope<'ast>) {
        assert!(
            self.heap.ptr_eq(&other.heap),
            "internal error: merging scopes from different heaps"
        );
        for (binding, _) in &other.locals {
            assert!(
                !self.index.contains_key(&binding.id()),
                "internal error: duplicate definition of {binding}"
            );
        }
        for pinned in &other.bound_values {
            assert!(
                !self.bound_values.contains(pinned),
                "internal error: duplicate pinned binding {pinned:?}"
            );
        }
        for (binding, value) in std::mem::take(&mut other.locals) {
            self.define(binding, value);
        }
        self.bound_values.extend(other.bound_values.drain());
        self.allocations.append(&mut other.allocations);
    }

    /// Look up `binding`.
    ///
    /// Returns `Ok(None)` when this scope does not bind it. A pinned binding
    /// whose storage changed since it was bound is a stale reference, reported
    /// at `source_loc`.
    pub fn get(
        &self,
        binding: &ValueNodeView<'ast>,
        source_loc: &SourceLocation,
    ) -> EvalResult<Option<Value>> {
        let Some(&slot) = self.index.get(&binding.id()) else {
            return Ok(None);
        };
        let value = &self.locals[slot].1;
        if self.bound_values.contains(&binding.id()) {
            let Some(location) = value.as_location() else {
                panic!("internal error: pinned binding {binding} does not denote storage");
            };
            if !self
                .heap
                .borrow()
                .is_bound_value_alive(binding, location.address())
            {
                tracing::debug!(%binding, address = %location.address(), "stale reference");
                return Err(stale_reference(&binding.base().name, source_loc.clone()));
            }
        }
        Ok(Some(value.clone()))
    }

    /// Build a scope that sees the direct bindings of every scope in
    /// `scopes`, for closures that read enclosing state.
    ///
    /// The result owns no allocations and carries no pins. When several
    /// scopes bind the same name, the earliest one in `scopes` wins, so pass
    /// the innermost scope first.
    pub fn capture(scopes: &[&RuntimeScope<'ast>]) -> RuntimeScope<'ast> {
        let Some(first) = scopes.first() else {
            panic!("internal error: capturing an empty list of scopes");
        };
        let mut result = RuntimeScope::new(first.heap.clone());
        for scope in scopes {
            assert!(
                scope.heap.ptr_eq(&result.heap),
                "internal error: capturing scopes from different heaps"
            );
            for (binding, value) in &scope.locals {
                if !result.index.contains_key(&binding.id()) {
                    result.define(binding.clone(), value.clone());
                }
            }
        }
        result
    }

    /// Move everything out of this scope, leaving it empty over the same heap.
    ///
    /// The returned scope owns what this one owned; dropping the emptied
    /// source afterwards releases nothing.
    #[must_use]
    pub fn take(&mut self) -> RuntimeScope<'ast> {
        let empty = RuntimeScope::new(self.heap.clone());
        std::mem::replace(self, empty)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.locals.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.locals.is_empty()
    }

    pub fn contains(&self, binding: &ValueNodeView<'ast>) -> bool {
        self.index.contains_key(&binding.id())
    }

    pub fn is_pinned(&self, binding: &ValueNodeView<'ast>) -> bool {
        self.bound_values.contains(&binding.id())
    }

    /// Allocations this scope currently owns, in creation order.
    pub fn allocations(&self) -> &[AllocationId] {
        &self.allocations
    }

    fn define(&mut self, binding: ValueNodeView<'ast>, value: Value) {
        match self.index.entry(binding.id()) {
            Entry::Occupied(_) => panic!("internal error: duplicate definition of {binding}"),
            Entry::Vacant(entry) => {
                entry.insert(self.locals.len());
            }
        }
        self.locals.push((binding, value));
    }
}

fn assert_not_constant(binding: &ValueNodeView<'_>) {
    assert!(
        binding.constant_value().is_none(),
        "internal error: constant binding {binding} cannot be bound at runtime"
    );
}

fn assert_not_location(binding: &ValueNodeView<'_>, value: &Value) {
    assert!(
        !value.is_location(),
        "internal error: {binding} bound to location {value} as a direct value"
    );
}

impl Drop for RuntimeScope<'_> {
    fn drop(&mut self) {
        if self.allocations.is_empty() && self.bound_values.is_empty() {
            return;
        }
        tracing::trace!(
            count = self.allocations.len(),
            pins = self.bound_values.len(),
            "release scope allocations"
        );
        let mut heap = self.heap.borrow_mut();
        for pinned in self.bound_values.drain() {
            let Some(&slot) = self.index.get(&pinned) else {
                continue;
            };
            let (binding, value) = &self.locals[slot];
            if let Some(location) = value.as_location() {
                heap.unbind_value_from_reference(binding, location.address());
            }
        }
        // Last created, first released.
        for allocation in self.allocations.drain(..).rev() {
            heap.deallocate(allocation);
        }
    }
}

impl fmt::Display for RuntimeScope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (binding, value)) in self.locals.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{binding}: {value}")?;
        }
        write!(f, "}}")
    }
}

impl fmt::Debug for RuntimeScope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeScope")
            .field("locals", &format_args!("{self}"))
            .field("pinned", &self.bound_values.len())
            .field("allocations", &self.allocations)
            .finish_non_exhaustive()
    }
}
