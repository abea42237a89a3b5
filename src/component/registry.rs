//! Component Registry - reference [`ComponentHost`] for stateful components.
//!
//! Instances live in the registry, keyed by [`ComponentId`]. Each instance
//! remembers its props, context, key and the base node its render produced.
//! The base node carries a [`ComponentLink`] back to the OUTERMOST instance
//! that owns it.
//!
//! # Higher-order components
//!
//! A component whose render returns another component descriptor does not
//! produce a node of its own. It keeps an inner instance instead:
//!
//! ```text
//! Outer ──inner──► Middle ──inner──► Leaf ──render──► <div>
//!   ▲                                                   │
//!   └───────────────── link (outermost) ────────────────┘
//! ```
//!
//! All instances in the chain share the same base node.
//!
//! # Borrowing
//!
//! Registry state sits behind a `RefCell` and is never borrowed across a call
//! into the reconciler, so nested builds and unmounts can re-enter freely.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::engine::NodeId;
use crate::error::{Error, Result};
use crate::reconciler::Reconciler;
use crate::types::{Context, DiffFlags, Key};
use crate::vnode::{ComponentDescriptor, Descriptor, Props};

use super::{ComponentHost, ComponentId, ComponentLink, ComponentType};

// =============================================================================
// Component trait
// =============================================================================

/// A stateful component managed by [`ComponentRegistry`].
///
/// Only `render` is required.
pub trait Component {
    /// Describe the component's output for the given props and context.
    fn render(&mut self, props: &Props, context: &Context) -> Result<Descriptor>;

    /// Before the first render.
    fn will_mount(&mut self) {}

    /// After the pass that created this instance has settled.
    fn did_mount(&mut self, base: NodeId) -> Result<()> {
        let _ = base;
        Ok(())
    }

    /// Before a re-render caused by a parent pass.
    fn will_receive_props(&mut self, next: &Props, context: &Context) {
        let _ = (next, context);
    }

    /// Before the instance and its base are torn down.
    fn will_unmount(&mut self) {}

    /// Extra context entries for everything this component renders.
    fn child_context(&self) -> Option<Context> {
        None
    }
}

type Factory = dyn Fn(&Props, &Context) -> Box<dyn Component>;

/// Constructor stored inside a [`ComponentType`] created by [`define`].
struct ComponentFactory(Box<Factory>);

/// Create a component type whose instances are built by `factory`.
///
/// Every call yields a distinct type, even for the same name.
///
/// ```
/// use vtree_reconcile::component::{define, Component};
/// use vtree_reconcile::vnode::{element, Descriptor, Props};
/// use vtree_reconcile::{Context, Result};
///
/// struct Hello;
///
/// impl Component for Hello {
///     fn render(&mut self, props: &Props, _: &Context) -> Result<Descriptor> {
///         Ok(element("p").child(format!("hello {}", props.get_str("name"))).into())
///     }
/// }
///
/// let hello = define("Hello", |_, _| Hello);
/// assert_eq!(hello.name(), "Hello");
/// ```
pub fn define<C, F>(name: &'static str, factory: F) -> ComponentType
where
    C: Component + 'static,
    F: Fn(&Props, &Context) -> C + 'static,
{
    let factory: Box<Factory> =
        Box::new(move |props: &Props, context: &Context| -> Box<dyn Component> {
            Box::new(factory(props, context))
        });
    ComponentType::new(name, ComponentFactory(factory))
}

// =============================================================================
// Instance
// =============================================================================

type SharedComponent = Rc<RefCell<Box<dyn Component>>>;

struct Instance {
    ty: ComponentType,
    component: SharedComponent,
    props: Props,
    context: Context,
    key: Option<Key>,
    /// Node produced by the last render.
    base: Option<NodeId>,
    /// Existing node the first render should morph instead of creating one.
    next_base: Option<NodeId>,
    /// Instance this one renders directly (higher-order component).
    inner: Option<ComponentId>,
    /// Instance that renders this one directly.
    outer: Option<ComponentId>,
}

// =============================================================================
// Registry
// =============================================================================

/// Reference component host.
///
/// Install it with [`Reconciler::with_component_host`] and keep an `Rc` to it
/// for [`rerender`](ComponentRegistry::rerender).
#[derive(Default)]
pub struct ComponentRegistry {
    instances: RefCell<HashMap<ComponentId, Instance>>,
    next_id: Cell<u64>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live instances.
    pub fn len(&self) -> usize {
        self.instances.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.borrow().is_empty()
    }

    pub fn contains(&self, id: ComponentId) -> bool {
        self.instances.borrow().contains_key(&id)
    }

    /// Base node of an instance.
    pub fn base(&self, id: ComponentId) -> Option<NodeId> {
        self.instances.borrow().get(&id).and_then(|i| i.base)
    }

    /// Instance rendered directly by `id`, for higher-order components.
    pub fn inner(&self, id: ComponentId) -> Option<ComponentId> {
        self.instances.borrow().get(&id).and_then(|i| i.inner)
    }

    /// Render one instance again with its current props (a forced update).
    ///
    /// Runs synchronously. When called outside a pass, instances created by
    /// this render get their `did_mount` before it returns.
    pub fn rerender(&self, rc: &mut Reconciler, id: ComponentId) -> Result<NodeId> {
        tracing::debug!(?id, "rerender");
        self.render_component(rc, id, false, false)?;
        if rc.depth() == 0 {
            rc.flush_mounts()?;
        }
        self.rendered_base(id)
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn with<R>(&self, id: ComponentId, f: impl FnOnce(&mut Instance) -> R) -> Result<R> {
        let mut instances = self.instances.borrow_mut();
        let instance = instances.get_mut(&id).ok_or(Error::UnknownInstance(id))?;
        Ok(f(instance))
    }

    fn rendered_base(&self, id: ComponentId) -> Result<NodeId> {
        let (base, name) = self.with(id, |i| (i.base, i.ty.name()))?;
        base.ok_or_else(|| Error::Component {
            component: name.to_string(),
            reason: "render produced no node".to_string(),
        })
    }

    fn create(
        &self,
        ty: &ComponentType,
        props: &Props,
        context: &Context,
        key: Option<Key>,
    ) -> Result<ComponentId> {
        let factory = ty
            .downcast_ref::<ComponentFactory>()
            .ok_or_else(|| Error::Component {
                component: ty.name().to_string(),
                reason: "type was not created with `define`".to_string(),
            })?;
        let component = (factory.0)(props, context);

        let id = ComponentId::new(self.next_id.get() + 1);
        self.next_id.set(id.raw());
        self.instances.borrow_mut().insert(
            id,
            Instance {
                ty: ty.clone(),
                component: Rc::new(RefCell::new(component)),
                props: Props::default(),
                context: Context::new(),
                key,
                base: None,
                next_base: None,
                inner: None,
                outer: None,
            },
        );
        tracing::trace!(?id, component = ty.name(), "component created");
        Ok(id)
    }

    /// Hand new props to an instance, running the matching lifecycle hook,
    /// and render it when `render` is set.
    fn set_props(
        &self,
        rc: &mut Reconciler,
        id: ComponentId,
        props: Props,
        context: &Context,
        mount_all: bool,
        render: bool,
    ) -> Result<()> {
        let (component, first) = self.with(id, |i| (Rc::clone(&i.component), i.base.is_none()))?;
        if first || mount_all {
            component.borrow_mut().will_mount();
        } else {
            component.borrow_mut().will_receive_props(&props, context);
        }

        self.with(id, |i| {
            i.props = props;
            i.context = context.clone();
        })?;

        if render {
            self.render_component(rc, id, mount_all, false)?;
        }
        Ok(())
    }

    fn render_component(
        &self,
        rc: &mut Reconciler,
        id: ComponentId,
        mount_all: bool,
        is_child: bool,
    ) -> Result<()> {
        let (component, props, context, base, next_base, initial_inner) = self.with(id, |i| {
            (
                Rc::clone(&i.component),
                i.props.clone(),
                i.context.clone(),
                i.base,
                i.next_base,
                i.inner,
            )
        })?;
        let is_update = base.is_some();
        let initial_base = base.or(next_base);

        let rendered = component.borrow_mut().render(&props, &context)?;
        let child_context = match component.borrow().child_context() {
            Some(extra) => context.extend(&extra),
            None => context.clone(),
        };
        let rendered = rc.expand(&rendered, &child_context).into_owned();

        let mut to_unmount = None;
        let mut reused_inner = false;
        let new_base = match &rendered {
            // Higher-order: render through an inner instance
            Descriptor::Component(child) => {
                let child_props = child.props();
                let reusable = match initial_inner {
                    Some(inner) => self.with(inner, |i| i.ty == child.ty && i.key == child.key)?,
                    None => false,
                };

                let inner = match initial_inner {
                    Some(inner) if reusable => {
                        reused_inner = true;
                        self.set_props(rc, inner, child_props, &child_context, mount_all, true)?;
                        inner
                    }
                    _ => {
                        to_unmount = initial_inner;
                        let inner = self.create(&child.ty, &child_props, &child_context, child.key.clone())?;
                        self.with(inner, |i| {
                            i.next_base = next_base;
                            i.outer = Some(id);
                        })?;
                        self.with(id, |i| i.inner = Some(inner))?;
                        self.set_props(rc, inner, child_props, &child_context, mount_all, false)?;
                        self.render_component(rc, inner, mount_all, true)?;
                        inner
                    }
                };
                self.with(inner, |i| i.base)?
            }

            // Plain output: reconcile it against the current base
            _ => {
                let mut cbase = initial_base;
                to_unmount = initial_inner;
                if to_unmount.is_some() {
                    cbase = None;
                    self.with(id, |i| i.inner = None)?;
                }
                if let Some(node) = cbase {
                    rc.tree_mut().set_component(node, None);
                }

                let mut flags = DiffFlags::UNMOUNT_CHILDREN_ONLY;
                if mount_all || !is_update {
                    flags |= DiffFlags::MOUNT_ALL;
                }
                Some(rc.reconcile(cbase, &rendered, &child_context, flags)?)
            }
        };

        // Swap a replaced base in place
        if let (Some(initial), Some(new)) = (initial_base, new_base)
            && new != initial
            && !reused_inner
        {
            if let Some(parent) = rc.tree().parent(initial)
                && parent != new
            {
                rc.tree_mut().insert_before(parent, new, Some(initial));
                rc.tree_mut().detach(initial);
            }
            if to_unmount.is_none() {
                tracing::trace!(?id, old = ?initial, ?new, "component base replaced");
                rc.tree_mut().set_component(initial, None);
                rc.release(initial, false)?;
            }
        }

        if let Some(old) = to_unmount {
            self.unmount(rc, old, new_base != initial_base)?;
        }

        self.with(id, |i| {
            i.base = new_base;
            i.next_base = None;
        })?;

        if let Some(base) = new_base
            && !is_child
        {
            self.link_base(rc, id, base)?;
        }

        if !is_update || mount_all {
            rc.enqueue_mount(id);
        }
        Ok(())
    }

    /// Point `base` at the outermost instance of the chain `id` belongs to.
    fn link_base(&self, rc: &mut Reconciler, id: ComponentId, base: NodeId) -> Result<()> {
        let mut outermost = id;
        while let Some(outer) = self.with(outermost, |i| i.outer)? {
            self.with(outer, |i| i.base = Some(base))?;
            outermost = outer;
        }

        let (ty, key) = self.with(outermost, |i| (i.ty.clone(), i.key.clone()))?;
        let tree = rc.tree_mut();
        tree.set_component(
            base,
            Some(ComponentLink {
                instance: outermost,
                ty,
            }),
        );
        tree.set_key(base, key);
        Ok(())
    }
}

// =============================================================================
// ComponentHost
// =============================================================================

impl ComponentHost for ComponentRegistry {
    fn build_from_descriptor(
        &self,
        rc: &mut Reconciler,
        existing: Option<NodeId>,
        descriptor: &ComponentDescriptor,
        context: &Context,
        mount_all: bool,
    ) -> Result<NodeId> {
        let props = descriptor.props();
        let original = existing.and_then(|node| rc.tree().component(node).cloned());
        let direct = original.as_ref().is_some_and(|link| link.ty == descriptor.ty);

        // Find an owner of the same type along the chain
        let mut owner = None;
        let mut cursor = original.as_ref().map(|link| link.instance);
        while let Some(candidate) = cursor {
            let (ty_matches, outer) = self.with(candidate, |i| (i.ty == descriptor.ty, i.outer))?;
            if ty_matches {
                owner = Some(candidate);
                break;
            }
            cursor = outer;
        }

        if let Some(instance) = owner {
            tracing::trace!(?instance, component = descriptor.ty.name(), "component reused");
            self.with(instance, |i| i.key = descriptor.key.clone())?;
            self.set_props(rc, instance, props, context, mount_all, true)?;
            return self.rendered_base(instance);
        }

        let mut next_base = existing;
        if let Some(link) = original
            && !direct
        {
            self.unmount(rc, link.instance, true)?;
            next_base = None;
        }

        let instance = self.create(&descriptor.ty, &props, context, descriptor.key.clone())?;
        self.with(instance, |i| i.next_base = next_base)?;
        self.set_props(rc, instance, props, context, mount_all, true)?;
        self.rendered_base(instance)
    }

    fn unmount(&self, rc: &mut Reconciler, instance: ComponentId, remove: bool) -> Result<()> {
        let (component, base, inner) =
            self.with(instance, |i| (Rc::clone(&i.component), i.base.take(), i.inner))?;
        tracing::trace!(?instance, remove, "component unmount");

        component.borrow_mut().will_unmount();

        if let Some(inner) = inner {
            self.unmount(rc, inner, remove)?;
        } else if let Some(base) = base
            && rc.tree().contains(base)
        {
            if let Some(callback) = rc.tree().ref_callback(base).cloned() {
                callback.call(None);
            }
            rc.tree_mut().set_component(base, None);

            let children = rc.tree().children(base).to_vec();
            if remove {
                rc.recycle(base);
            }
            rc.release_all(&children, !remove)?;
        }

        self.instances.borrow_mut().remove(&instance);
        Ok(())
    }

    fn did_mount(&self, _rc: &mut Reconciler, instance: ComponentId) -> Result<()> {
        // Unmounted again before the pass settled
        let Ok((component, base)) = self.with(instance, |i| (Rc::clone(&i.component), i.base)) else {
            tracing::trace!(?instance, "skipping did_mount of unmounted instance");
            return Ok(());
        };
        match base {
            Some(base) => component.borrow_mut().did_mount(base),
            None => Ok(()),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
