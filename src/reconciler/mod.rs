//! Reconciler - synchronizes a live tree with a descriptor tree.
//!
//! One [`Reconciler`] owns one [`LiveTree`] plus the collaborators that touch
//! it. A pass starts at [`Reconciler::reconcile`] (or [`Reconciler::render`])
//! and recurses through:
//!
//! ```text
//! reconcile ─► element ─► reconcile_children ─► (per child) element / text / component host
//!                 │                   └─► orphans ─► release (tree collector)
//!                 └─► diff_attributes ─► attribute accessor
//! ```
//!
//! # Pass state
//!
//! The recursion depth, the namespace flag and the mount queue live on the
//! reconciler itself, not in globals. Every [`Reconciler::reconcile`] call bumps
//! the depth; when it returns to zero the mount queue is flushed, so `did_mount`
//! never runs while any part of the tree is still being synchronized.
//!
//! # Example
//!
//! ```
//! use vtree_reconcile::{Reconciler, vnode::element};
//!
//! let mut rc = Reconciler::new();
//! let root = rc.render(&element("ul").child(element("li").child("one")).into(), None, None)?;
//! assert_eq!(rc.tree().markup(root), "<ul><li>one</li></ul>");
//!
//! // Second pass reuses every node
//! let again = rc.render(&element("ul").child(element("li").child("two")).into(), None, Some(root))?;
//! assert_eq!(again, root);
//! assert_eq!(rc.tree().markup(root), "<ul><li>two</li></ul>");
//! # Ok::<(), vtree_reconcile::Error>(())
//! ```

mod attributes;
mod children;
mod collector;
pub mod compat;
mod mount_queue;

pub use mount_queue::MountQueue;

use std::borrow::Cow;
use std::rc::Rc;

use crate::component::{ComponentHost, ComponentId, NoComponents};
use crate::config::ReconcilerConfig;
use crate::engine::{AttributeAccessor, DomAccessor, LiveTree, NodeId, NodePool, Recycler};
use crate::error::Result;
use crate::types::{Context, DiffFlags};
use crate::vnode::{Descriptor, ElementDescriptor, FunctionalExpander, PropsExpander};

// =============================================================================
// Reconciler
// =============================================================================

/// Tree reconciliation engine.
pub struct Reconciler {
    tree: LiveTree,
    nodes: Box<dyn NodePool>,
    accessor: Box<dyn AttributeAccessor>,
    components: Rc<dyn ComponentHost>,
    expander: Box<dyn FunctionalExpander>,
    config: ReconcilerConfig,

    /// Nesting depth of `reconcile` calls in the running pass.
    depth: usize,
    /// Inside a namespaced subtree (e.g. `svg`).
    namespaced: bool,
    mounts: MountQueue,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new()
    }
}

impl Reconciler {
    /// Reconciler with default collaborators: pooling [`Recycler`],
    /// [`DomAccessor`], [`PropsExpander`] and no component host.
    pub fn new() -> Self {
        Self {
            tree: LiveTree::new(),
            nodes: Box::new(Recycler::new()),
            accessor: Box::new(DomAccessor::new()),
            components: Rc::new(NoComponents),
            expander: Box::new(PropsExpander),
            config: ReconcilerConfig::default(),
            depth: 0,
            namespaced: false,
            mounts: MountQueue::default(),
        }
    }

    /// Replace the configuration. Also reinstalls a [`DomAccessor`] using the
    /// configured live properties; install a custom accessor afterwards.
    pub fn with_config(mut self, config: ReconcilerConfig) -> Self {
        self.accessor = Box::new(DomAccessor::with_live_properties(
            config.live_properties.clone(),
        ));
        self.config = config;
        self
    }

    pub fn with_node_pool(mut self, nodes: impl NodePool + 'static) -> Self {
        self.nodes = Box::new(nodes);
        self
    }

    pub fn with_accessor(mut self, accessor: impl AttributeAccessor + 'static) -> Self {
        self.accessor = Box::new(accessor);
        self
    }

    pub fn with_component_host(mut self, host: Rc<dyn ComponentHost>) -> Self {
        self.components = host;
        self
    }

    pub fn with_expander(mut self, expander: impl FunctionalExpander + 'static) -> Self {
        self.expander = Box::new(expander);
        self
    }

    /// Adopt an existing tree (e.g. one built by hand or by a previous reconciler).
    pub fn with_tree(mut self, tree: LiveTree) -> Self {
        self.tree = tree;
        self
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn tree(&self) -> &LiveTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut LiveTree {
        &mut self.tree
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Current `reconcile` nesting depth (0 outside a pass).
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Is the pass currently inside a namespaced subtree?
    pub fn is_namespaced(&self) -> bool {
        self.namespaced
    }

    // -------------------------------------------------------------------------
    // Entry points
    // -------------------------------------------------------------------------

    /// Top-level render: reconcile `merge` (or nothing) against `descriptor`
    /// with an empty context and attach the result to `parent`.
    pub fn render(
        &mut self,
        descriptor: &Descriptor,
        parent: Option<NodeId>,
        merge: Option<NodeId>,
    ) -> Result<NodeId> {
        self.reconcile_into(merge, descriptor, &Context::new(), DiffFlags::NONE, parent)
    }

    /// Mutate `live` (or create a node) so it matches `descriptor`.
    ///
    /// Returns the resulting node, which differs from `live` whenever the
    /// node kind or tag had to change.
    pub fn reconcile(
        &mut self,
        live: Option<NodeId>,
        descriptor: &Descriptor,
        context: &Context,
        flags: DiffFlags,
    ) -> Result<NodeId> {
        self.reconcile_into(live, descriptor, context, flags, None)
    }

    /// Like [`reconcile`](Self::reconcile), appending the result to `parent`
    /// when it is not already one of its children.
    pub fn reconcile_into(
        &mut self,
        live: Option<NodeId>,
        descriptor: &Descriptor,
        context: &Context,
        flags: DiffFlags,
        parent: Option<NodeId>,
    ) -> Result<NodeId> {
        if self.depth == 0 {
            tracing::debug!(root = ?live, kind = descriptor.kind_name(), "pass started");
        }
        self.depth += 1;

        let result = self.idiff(live, descriptor, context, flags).inspect(|&out| {
            if let Some(parent) = parent
                && self.tree.parent(out) != Some(parent)
            {
                self.tree.append_child(parent, out);
            }
        });

        self.depth -= 1;
        if self.depth > 0 {
            return result;
        }

        // Outermost call: the whole pass has settled
        self.namespaced = false;
        match result {
            Ok(out) => {
                self.flush_mounts()?;
                tracing::debug!(root = ?out, "pass finished");
                Ok(out)
            }
            Err(err) => {
                let dropped = self.mounts.clear();
                tracing::debug!(dropped, error = %err, "pass failed, pending mounts discarded");
                Err(err)
            }
        }
    }

    /// Expand functional descriptors until a concrete one is reached.
    pub fn expand<'d>(&self, descriptor: &'d Descriptor, context: &Context) -> Cow<'d, Descriptor> {
        let mut current = Cow::Borrowed(descriptor);
        while let Descriptor::Functional(f) = current.as_ref() {
            let next = self.expander.expand(f, context);
            current = Cow::Owned(next);
        }
        current
    }

    // -------------------------------------------------------------------------
    // Recursive core
    // -------------------------------------------------------------------------

    fn idiff(
        &mut self,
        live: Option<NodeId>,
        descriptor: &Descriptor,
        context: &Context,
        flags: DiffFlags,
    ) -> Result<NodeId> {
        match descriptor {
            Descriptor::Functional(f) => {
                let expanded = self.expander.expand(f, context);
                self.idiff(live, &expanded, context, flags)
            }
            Descriptor::Text(value) => self.reconcile_text(live, value, flags),
            Descriptor::Component(c) => {
                let host = Rc::clone(&self.components);
                host.build_from_descriptor(self, live, c, context, flags.mount_all())
            }
            Descriptor::Element(el) => {
                let enters = self.config.is_namespace_tag(&el.tag);
                let outer = self.namespaced;
                if enters {
                    self.namespaced = true;
                }
                let result = self.reconcile_element(live, el, context, flags);
                self.namespaced = outer;
                result
            }
        }
    }

    fn reconcile_text(&mut self, live: Option<NodeId>, value: &str, flags: DiffFlags) -> Result<NodeId> {
        if let Some(node) = live
            && self.tree.is_text(node)
        {
            if self.tree.text(node) != Some(value) {
                self.tree.set_text(node, value);
            }
            return Ok(node);
        }

        let out = self.tree.create_text(value);
        if let Some(old) = live {
            tracing::trace!(?old, new = ?out, "replacing node with text");
            self.replace(old, out, flags)?;
        }
        Ok(out)
    }

    fn reconcile_element(
        &mut self,
        live: Option<NodeId>,
        el: &ElementDescriptor,
        context: &Context,
        flags: DiffFlags,
    ) -> Result<NodeId> {
        let out = match live {
            Some(node) if compat::same_tag(&self.tree, node, &el.tag) => node,
            Some(old) => {
                let out = self.nodes.create_node(&mut self.tree, &el.tag, self.namespaced);
                tracing::trace!(?old, new = ?out, tag = %el.tag, "tag changed, replacing element");

                // Move children into the replacement
                let children = self.tree.children(old).to_vec();
                for child in children {
                    self.tree.append_child(out, child);
                }
                self.replace(old, out, flags)?;
                out
            }
            None => self.nodes.create_node(&mut self.tree, &el.tag, self.namespaced),
        };

        // Fast path: single text child onto a single live text child
        let single_text = match el.children.as_slice() {
            [Descriptor::Text(value)] => Some(value.as_str()),
            _ => None,
        };
        let (single_live_text, has_live_children) = match self.tree.children(out) {
            [] => (None, false),
            [only] if self.tree.is_text(*only) => (Some(*only), true),
            _ => (None, true),
        };

        if let (Some(value), Some(text_node)) = (single_text, single_live_text) {
            if self.tree.text(text_node) != Some(value) {
                self.tree.set_text(text_node, value);
            }
        } else if !el.children.is_empty() || has_live_children {
            self.reconcile_children(out, &el.children, context, flags.mount_all())?;
        }

        self.diff_attributes(out, Some(&el.attributes))?;

        if self.tree.key(out) != el.key.as_ref() {
            self.tree.set_key(out, el.key.clone());
        }
        self.apply_ref(out, el);

        Ok(out)
    }

    /// Swap `new` in for `old` and release `old`, unless the caller owns `old`.
    fn replace(&mut self, old: NodeId, new: NodeId, flags: DiffFlags) -> Result<()> {
        if flags.unmount_children_only() {
            return Ok(());
        }
        if let Some(parent) = self.tree.parent(old) {
            self.tree.insert_before(parent, new, Some(old));
        }
        self.release(old, false)
    }

    fn apply_ref(&mut self, out: NodeId, el: &ElementDescriptor) {
        let previous = self.tree.ref_callback(out).cloned();
        match (&el.ref_callback, previous) {
            (Some(cb), Some(prev)) if cb.ptr_eq(&prev) => cb.call(Some(out)),
            (Some(cb), previous) => {
                if let Some(prev) = previous {
                    prev.call(None);
                }
                self.tree.set_ref_callback(out, Some(cb.clone()));
                cb.call(Some(out));
            }
            (None, Some(prev)) => {
                self.tree.set_ref_callback(out, None);
                prev.call(None);
            }
            (None, None) => {}
        }
    }

    /// Hand a released element to the node recycler.
    pub fn recycle(&mut self, node: NodeId) {
        self.nodes.recycle(&mut self.tree, node);
    }

    /// Queue a component for its `did_mount` notification at the end of the pass.
    pub fn enqueue_mount(&mut self, instance: ComponentId) {
        self.mounts.enqueue(instance);
    }

    /// Number of components waiting for `did_mount`.
    pub fn pending_mounts(&self) -> usize {
        self.mounts.len()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests;
