//! Tree Collector - releases subtrees that are no longer described.

use std::rc::Rc;

use crate::engine::NodeId;
use crate::error::Result;

use super::Reconciler;

impl Reconciler {
    /// Release a node and everything below it.
    ///
    /// - component bases are handed to the component host's `unmount`
    /// - otherwise the node's ref callback gets `None`
    /// - unless `unmount_only`: text nodes are detached and freed, elements go
    ///   to the node recycler
    /// - children are released the same way
    pub fn release(&mut self, node: NodeId, unmount_only: bool) -> Result<()> {
        if !self.tree.contains(node) {
            tracing::warn!(?node, "release of stale node ignored");
            return Ok(());
        }

        if let Some(link) = self.tree.component(node) {
            let instance = link.instance;
            let host = Rc::clone(&self.components);
            return host.unmount(self, instance, !unmount_only);
        }

        if let Some(callback) = self.tree.ref_callback(node).cloned() {
            callback.call(None);
        }

        // Capture before recycling: a full pool disposes the element
        let children = self.tree.children(node).to_vec();

        if !unmount_only {
            if !self.tree.is_element(node) {
                self.tree.dispose(node);
                return Ok(());
            }
            self.nodes.recycle(&mut self.tree, node);
        }

        self.release_all(&children, unmount_only)
    }

    /// Release every node in `nodes`, in order.
    pub fn release_all(&mut self, nodes: &[NodeId], unmount_only: bool) -> Result<()> {
        for &node in nodes {
            self.release(node, unmount_only)?;
        }
        Ok(())
    }
}
