//! Core types for vtree-reconcile.
//!
//! These types are shared by descriptors and live nodes alike. They flow
//! through every reconciliation pass and define what the collaborators see.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

// =============================================================================
// Cleanup Function
// =============================================================================

/// Stop function of a reactive mount.
///
/// Call this to stop whatever the mount set up.
pub type Cleanup = Box<dyn FnOnce()>;

// =============================================================================
// Attribute Values
// =============================================================================

/// A single attribute value carried by a descriptor or written onto a live node.
///
/// Comparison is strict: `Int(1)` and `Str("1")` are different values.
/// Floats with identical bits are equal, so a `NaN` value compares equal to
/// itself and is not rewritten on every pass.
#[derive(Debug, Clone)]
pub enum AttrValue {
    /// Boolean attribute (`checked`, `disabled`, ...).
    Bool(bool),
    /// Integer attribute.
    Int(i64),
    /// Floating point attribute.
    Float(f64),
    /// String attribute.
    Str(String),
}

impl AttrValue {
    /// Borrow the string payload, if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Whether writing this value means "attribute absent".
    #[inline]
    pub fn is_falsy(&self) -> bool {
        matches!(self, AttrValue::Bool(false))
    }
}

impl PartialEq for AttrValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (AttrValue::Bool(a), AttrValue::Bool(b)) => a == b,
            (AttrValue::Int(a), AttrValue::Int(b)) => a == b,
            (AttrValue::Float(a), AttrValue::Float(b)) => a == b || a.to_bits() == b.to_bits(),
            (AttrValue::Str(a), AttrValue::Str(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Bool(b) => write!(f, "{b}"),
            AttrValue::Int(i) => write!(f, "{i}"),
            AttrValue::Float(v) => write!(f, "{v}"),
            AttrValue::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Str(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Str(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<i32> for AttrValue {
    fn from(value: i32) -> Self {
        AttrValue::Int(value as i64)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Float(value)
    }
}

/// Ordered attribute map (name → value).
///
/// Insertion order is the order attributes are applied in.
pub type Attributes = IndexMap<String, AttrValue>;

// =============================================================================
// Keys
// =============================================================================

/// Explicit sibling identity used by keyed matching.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(String);

impl Key {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<usize> for Key {
    fn from(value: usize) -> Self {
        Self(value.to_string())
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

// =============================================================================
// Context
// =============================================================================

/// Context values passed down a pass to components and functional descriptors.
///
/// Cheap to clone; extending produces a new map and leaves the parent intact.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context(Rc<IndexMap<String, AttrValue>>);

impl Context {
    /// Empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a context value.
    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.0.get(name)
    }

    /// Return a copy of this context with `name` set to `value`.
    pub fn with(&self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        let mut map = (*self.0).clone();
        map.insert(name.into(), value.into());
        Self(Rc::new(map))
    }

    /// Return a copy of this context with every entry of `other` layered on top.
    pub fn extend(&self, other: &Context) -> Self {
        if other.0.is_empty() {
            return self.clone();
        }
        let mut map = (*self.0).clone();
        for (name, value) in other.0.iter() {
            map.insert(name.clone(), value.clone());
        }
        Self(Rc::new(map))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// =============================================================================
// Pass Flags (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// Options for a single reconcile call.
    ///
    /// Combine with bitwise OR: `DiffFlags::MOUNT_ALL | DiffFlags::UNMOUNT_CHILDREN_ONLY`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DiffFlags: u8 {
        const NONE = 0;
        /// Treat every component reached in this pass as freshly mounted.
        const MOUNT_ALL = 1 << 0;
        /// Do not release the live node passed in when it has to be replaced.
        /// The caller (a component host) owns its teardown.
        const UNMOUNT_CHILDREN_ONLY = 1 << 1;
    }
}

impl DiffFlags {
    #[inline]
    pub fn mount_all(self) -> bool {
        self.contains(DiffFlags::MOUNT_ALL)
    }

    #[inline]
    pub fn unmount_children_only(self) -> bool {
        self.contains(DiffFlags::UNMOUNT_CHILDREN_ONLY)
    }
}

bitflags::bitflags! {
    /// Per-node bookkeeping flags on live nodes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct NodeFlags: u8 {
        const NONE = 0;
        /// Element was created inside a namespaced subtree (e.g. `svg`).
        const NAMESPACED = 1 << 0;
        /// Element is parked in the recycler pool.
        const POOLED = 1 << 1;
    }
}

// =============================================================================
// Tests
// =============================================================================
