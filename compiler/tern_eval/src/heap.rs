//! The interpreter heap.
//!
//! Storage cells live here, addressed by `Address`. The heap does not decide
//! when storage dies: every allocation is owned by exactly one
//! `RuntimeScope`, which releases it when the scope is dropped.
//!
//! The heap also answers one aliasing question. A reference binding
//! registers a pin on the address it was bound to; any later write to that
//! allocation, or its release, invalidates the pin, and readers of the
//! binding check `is_bound_value_alive` before trusting it.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use tern_ir::{NodeId, SourceLocation};

use crate::errors::{dead_allocation, invalid_element_path, EvalResult};
use crate::value::{Address, AllocationId, ElementPath};
use crate::{Value, ValueNodeView};

/// Addressable storage.
#[derive(Debug, Default)]
pub struct Heap {
    /// Cell contents, indexed by `AllocationId`. `None` once released.
    values: Vec<Option<Value>>,
    /// Live pins per allocation: binding id to the element path it was bound to.
    bound_values: Vec<FxHashMap<NodeId, ElementPath>>,
}

impl Heap {
    pub fn new() -> Self {
        Heap::default()
    }

    /// Allocate a fresh cell holding `value`.
    pub fn allocate_value(&mut self, value: Value) -> AllocationId {
        let index = u32::try_from(self.values.len())
            .unwrap_or_else(|_| panic!("internal error: heap exceeded u32::MAX allocations"));
        let allocation = AllocationId::new(index);
        tracing::trace!(%allocation, %value, "allocate");
        self.values.push(Some(value));
        self.bound_values.push(FxHashMap::default());
        allocation
    }

    /// Whether `allocation` has been allocated and not yet released.
    pub fn is_alive(&self, allocation: AllocationId) -> bool {
        matches!(self.values.get(allocation.index()), Some(Some(_)))
    }

    /// Number of allocations not yet released.
    pub fn live_allocations(&self) -> usize {
        self.values.iter().filter(|value| value.is_some()).count()
    }

    /// Read the value stored at `address`.
    pub fn read(&self, address: &Address, source_loc: &SourceLocation) -> EvalResult<Value> {
        let mut value = self.cell(address.allocation(), source_loc)?;
        for &index in address.element_path().indices() {
            value = value
                .element(index)
                .ok_or_else(|| invalid_element_path(index, value.to_string(), source_loc.clone()))?;
        }
        Ok(value.clone())
    }

    /// Store `value` at `address`.
    ///
    /// Any write into an allocation invalidates every pin registered on it,
    /// whichever sub-object the write touched.
    pub fn write(
        &mut self,
        address: &Address,
        value: Value,
        source_loc: &SourceLocation,
    ) -> EvalResult<()> {
        let current = self.cell(address.allocation(), source_loc)?;
        let updated = replace_at(current, address.element_path().indices(), value, source_loc)?;
        tracing::trace!(%address, value = %updated, "write");
        let index = address.allocation().index();
        self.values[index] = Some(updated);
        self.bound_values[index].clear();
        Ok(())
    }

    /// Release `allocation`.
    ///
    /// Releasing an allocation twice means two scopes believed they owned it.
    pub fn deallocate(&mut self, allocation: AllocationId) {
        let Some(slot) = self.values.get_mut(allocation.index()) else {
            panic!("internal error: deallocating unknown {allocation}");
        };
        assert!(
            slot.take().is_some(),
            "internal error: {allocation} released twice"
        );
        tracing::trace!(%allocation, "deallocate");
        self.bound_values[allocation.index()].clear();
    }

    /// Register a pin: `binding` aliases the storage at `address`.
    pub fn bind_value_to_reference(&mut self, binding: &ValueNodeView<'_>, address: &Address) {
        let allocation = address.allocation();
        assert!(
            self.is_alive(allocation),
            "internal error: pinning {} to released {allocation}",
            binding
        );
        tracing::trace!(%binding, %address, "pin");
        self.bound_values[allocation.index()].insert(binding.id(), address.element_path().clone());
    }

    /// Remove the pin `binding` registered on `address`, if it is still there.
    pub fn unbind_value_from_reference(&mut self, binding: &ValueNodeView<'_>, address: &Address) {
        let Some(pins) = self.bound_values.get_mut(address.allocation().index()) else {
            return;
        };
        if pins.remove(&binding.id()).is_some() {
            tracing::trace!(%binding, %address, "unpin");
        }
    }

    /// Whether the pin `binding` registered on `address` still holds.
    pub fn is_bound_value_alive(&self, binding: &ValueNodeView<'_>, address: &Address) -> bool {
        self.bound_values
            .get(address.allocation().index())
            .and_then(|pins| pins.get(&binding.id()))
            .is_some_and(|path| path == address.element_path())
    }

    fn cell(&self, allocation: AllocationId, source_loc: &SourceLocation) -> EvalResult<&Value> {
        self.values
            .get(allocation.index())
            .and_then(Option::as_ref)
            .ok_or_else(|| dead_allocation(allocation, source_loc.clone()))
    }
}

/// `current` with the sub-object at `path` replaced by `value`.
fn replace_at(
    current: &Value,
    path: &[usize],
    value: Value,
    source_loc: &SourceLocation,
) -> EvalResult<Value> {
    let Some((&index, rest)) = path.split_first() else {
        return Ok(value);
    };
    let element = current
        .element(index)
        .ok_or_else(|| invalid_element_path(index, current.to_string(), source_loc.clone()))?;
    let updated = replace_at(element, rest, value, source_loc)?;
    current
        .with_element(index, updated)
        .ok_or_else(|| invalid_element_path(index, current.to_string(), source_loc.clone()))
}

impl fmt::Display for Heap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "alloc#{i}: ")?;
            match value {
                Some(value) => write!(f, "{value}")?,
                None => write!(f, "<released>")?,
            }
        }
        write!(f, "}}")
    }
}

/// Shared handle to the one heap of an interpreter run.
///
/// Every scope and the frame stack hold a clone; the handle does not own
/// any allocation. Single-threaded by construction (`Rc`, not `Arc`).
#[repr(transparent)]
#[derive(Default)]
pub struct SharedHeap(Rc<RefCell<Heap>>);

impl SharedHeap {
    pub fn new() -> Self {
        SharedHeap(Rc::new(RefCell::new(Heap::new())))
    }

    #[inline]
    pub fn borrow(&self) -> Ref<'_, Heap> {
        self.0.borrow()
    }

    #[inline]
    pub fn borrow_mut(&self) -> RefMut<'_, Heap> {
        self.0.borrow_mut()
    }

    /// Whether both handles refer to the same heap.
    #[inline]
    pub fn ptr_eq(&self, other: &SharedHeap) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Clone for SharedHeap {
    #[inline]
    fn clone(&self) -> Self {
        SharedHeap(Rc::clone(&self.0))
    }
}

impl fmt::Debug for SharedHeap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SharedHeap").field(&self.0).finish()
    }
}
