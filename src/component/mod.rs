//! Component - the seam between the reconciler and stateful components.
//!
//! The reconciler never looks inside a component. When it meets a
//! [`ComponentDescriptor`] it hands over to the installed [`ComponentHost`],
//! and when it releases a node linked to a component instance it asks the
//! host to unmount that instance.
//!
//! - [`ComponentType`]: constructor identity, compared by pointer
//! - [`ComponentLink`]: non-owning back-reference from a live node to its instance
//! - [`NoComponents`]: default host that refuses to build anything
//! - [`ComponentRegistry`]: reference host with a [`Component`] trait

mod registry;

pub use registry::*;

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::engine::NodeId;
use crate::error::{Error, Result};
use crate::reconciler::Reconciler;
use crate::types::Context;
use crate::vnode::ComponentDescriptor;

// =============================================================================
// Identity
// =============================================================================

/// Handle of one component instance inside a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(u64);

impl ComponentId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Constructor identity of a component.
///
/// Two types are equal only when they share the same constructor allocation,
/// so clones compare equal and independently created types never do, even
/// with the same name.
#[derive(Clone)]
pub struct ComponentType {
    name: &'static str,
    constructor: Rc<dyn Any>,
}

impl ComponentType {
    pub fn new<T: Any>(name: &'static str, constructor: T) -> Self {
        Self {
            name,
            constructor: Rc::new(constructor),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn constructor(&self) -> &dyn Any {
        self.constructor.as_ref()
    }

    /// The constructor, if it is a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.constructor.downcast_ref::<T>()
    }
}

impl PartialEq for ComponentType {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.constructor), Rc::as_ptr(&other.constructor))
    }
}

impl Eq for ComponentType {}

impl fmt::Debug for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentType({})", self.name)
    }
}

/// Back-reference stored on a component's base node.
#[derive(Debug, Clone)]
pub struct ComponentLink {
    pub instance: ComponentId,
    pub ty: ComponentType,
}

// =============================================================================
// Host
// =============================================================================

/// Builds, updates and unmounts component instances for the reconciler.
///
/// Methods take `&self` and receive the reconciler so a host can run nested
/// passes for a component's rendered output. Hosts keep their own state
/// behind interior mutability and must not hold a borrow of it across calls
/// back into the reconciler.
pub trait ComponentHost {
    /// Produce the live node for `descriptor`, reusing `existing` when it
    /// belongs to an instance of the same type.
    fn build_from_descriptor(
        &self,
        reconciler: &mut Reconciler,
        existing: Option<NodeId>,
        descriptor: &ComponentDescriptor,
        context: &Context,
        mount_all: bool,
    ) -> Result<NodeId>;

    /// Tear an instance down. `remove` asks for its base node to be taken out
    /// of the tree as well.
    fn unmount(&self, reconciler: &mut Reconciler, instance: ComponentId, remove: bool) -> Result<()>;

    /// Called from the mount queue once the pass that created `instance` settled.
    fn did_mount(&self, reconciler: &mut Reconciler, instance: ComponentId) -> Result<()> {
        let _ = (reconciler, instance);
        Ok(())
    }
}

/// Default host for trees without components.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoComponents;

impl ComponentHost for NoComponents {
    fn build_from_descriptor(
        &self,
        _reconciler: &mut Reconciler,
        _existing: Option<NodeId>,
        descriptor: &ComponentDescriptor,
        _context: &Context,
        _mount_all: bool,
    ) -> Result<NodeId> {
        Err(Error::NoComponentHost {
            component: descriptor.ty.name().to_string(),
        })
    }

    fn unmount(&self, _reconciler: &mut Reconciler, instance: ComponentId, _remove: bool) -> Result<()> {
        // Only reachable through a hand-built link
        Err(Error::UnknownInstance(instance))
    }
}

// =============================================================================
// Tests
// =============================================================================
