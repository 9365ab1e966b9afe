//! Runtime values and heap addresses.
//!
//! Values are immutable and cheap to clone: aggregates share their elements.
//! Storage is never a value; a binding that denotes storage holds a
//! `LocationValue`, which names the address to read through.

use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

/// Identifier of one heap allocation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct AllocationId(u32);

impl AllocationId {
    #[inline]
    pub const fn new(index: u32) -> Self {
        AllocationId(index)
    }

    /// Index into the heap's allocation table.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for AllocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "alloc#{}", self.0)
    }
}

/// Path of tuple-element indices selecting a sub-object of an allocation.
///
/// Most paths are empty or one element deep, so two indices are stored
/// inline.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ElementPath(SmallVec<[usize; 2]>);

impl ElementPath {
    /// The path selecting the whole allocation.
    pub fn empty() -> Self {
        ElementPath(SmallVec::new())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    /// This path extended by one more element index.
    #[must_use]
    pub fn append(&self, index: usize) -> Self {
        let mut path = self.clone();
        path.0.push(index);
        path
    }
}

impl From<&[usize]> for ElementPath {
    fn from(indices: &[usize]) -> Self {
        ElementPath(SmallVec::from_slice(indices))
    }
}

impl fmt::Display for ElementPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for index in &self.0 {
            write!(f, ".{index}")?;
        }
        Ok(())
    }
}

/// A location in the heap: an allocation plus the sub-object within it.
///
/// Two addresses with the same allocation but different element paths alias
/// the same allocation without denoting the same cell.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Address {
    allocation: AllocationId,
    element_path: ElementPath,
}

impl Address {
    /// Address of a whole allocation.
    pub fn new(allocation: AllocationId) -> Self {
        Address {
            allocation,
            element_path: ElementPath::empty(),
        }
    }

    pub fn with_path(allocation: AllocationId, element_path: ElementPath) -> Self {
        Address {
            allocation,
            element_path,
        }
    }

    #[inline]
    pub fn allocation(&self) -> AllocationId {
        self.allocation
    }

    #[inline]
    pub fn element_path(&self) -> &ElementPath {
        &self.element_path
    }

    /// Whether this address denotes a whole allocation rather than a part.
    #[inline]
    pub fn is_whole_allocation(&self) -> bool {
        self.element_path.is_empty()
    }

    /// Address of element `index` within this address.
    #[must_use]
    pub fn element_address(&self, index: usize) -> Self {
        Address {
            allocation: self.allocation,
            element_path: self.element_path.append(index),
        }
    }

    /// Whether both addresses point into the same allocation.
    #[inline]
    pub fn aliases(&self, other: &Address) -> bool {
        self.allocation == other.allocation
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.allocation, self.element_path)
    }
}

/// "The value is stored at this address."
///
/// Distinguishes a binding that denotes storage (assignable) from one that
/// holds a value directly.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LocationValue {
    address: Address,
}

impl LocationValue {
    pub fn new(address: Address) -> Self {
        LocationValue { address }
    }

    #[inline]
    pub fn address(&self) -> &Address {
        &self.address
    }
}

impl fmt::Display for LocationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lval<{}>", self.address)
    }
}

/// Discriminant of a `Value`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Int,
    Bool,
    Str,
    Tuple,
    Location,
}

/// Opaque immutable runtime value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Bool(bool),
    Str(Arc<str>),
    Tuple(Arc<[Value]>),
    Location(LocationValue),
}

impl Value {
    pub fn string(s: &str) -> Self {
        Value::Str(Arc::from(s))
    }

    pub fn tuple(elements: Vec<Value>) -> Self {
        Value::Tuple(Arc::from(elements))
    }

    pub fn location(address: Address) -> Self {
        Value::Location(LocationValue::new(address))
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Int(_) => ValueKind::Int,
            Value::Bool(_) => ValueKind::Bool,
            Value::Str(_) => ValueKind::Str,
            Value::Tuple(_) => ValueKind::Tuple,
            Value::Location(_) => ValueKind::Location,
        }
    }

    #[inline]
    pub fn is_location(&self) -> bool {
        matches!(self, Value::Location(_))
    }

    pub fn as_location(&self) -> Option<&LocationValue> {
        match self {
            Value::Location(location) => Some(location),
            _ => None,
        }
    }

    /// Element `index` of a tuple.
    pub fn element(&self, index: usize) -> Option<&Value> {
        match self {
            Value::Tuple(elements) => elements.get(index),
            _ => None,
        }
    }

    /// This tuple with element `index` replaced, or `None` if there is no
    /// such element.
    pub fn with_element(&self, index: usize, value: Value) -> Option<Value> {
        match self {
            Value::Tuple(elements) if index < elements.len() => {
                let mut updated = elements.to_vec();
                updated[index] = value;
                Some(Value::tuple(updated))
            }
            _ => None,
        }
    }
}

impl From<LocationValue> for Value {
    fn from(location: LocationValue) -> Self {
        Value::Location(location)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Str(s) => write!(f, "\"{}\"", &**s),
            Value::Tuple(elements) => {
                write!(f, "(")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{element}")?;
                }
                write!(f, ")")
            }
            Value::Location(location) => write!(f, "{location}"),
        }
    }
}
