//! Node Factory and Node Recycler.
//!
//! Elements released by the tree collector are parked in a pool keyed by
//! `(tag, namespaced)`. The next `create_node` for the same tag takes one from
//! the pool instead of allocating. Pooled elements keep their attributes; the
//! attribute differ removes the stale ones when the element is reused.

use std::collections::HashMap;

use crate::types::NodeFlags;

use super::tree::{LiveTree, NodeId};

/// Default number of pooled elements kept per tag.
pub const DEFAULT_POOL_LIMIT: usize = 64;

/// Creates live elements.
pub trait NodeFactory {
    /// Produce a detached element whose tag is exactly `tag`.
    fn create_node(&mut self, tree: &mut LiveTree, tag: &str, namespaced: bool) -> NodeId;
}

/// Accepts released elements for possible reuse.
pub trait NodeRecycler {
    /// Take ownership of a released element. Must detach it from its parent.
    fn recycle(&mut self, tree: &mut LiveTree, node: NodeId);
}

/// A node factory that is also a recycler (they usually share a pool).
pub trait NodePool: NodeFactory + NodeRecycler {}

impl<T: NodeFactory + NodeRecycler> NodePool for T {}

// =============================================================================
// Recycler
// =============================================================================

/// Pooling node factory.
#[derive(Debug)]
pub struct Recycler {
    pool: HashMap<(String, bool), Vec<NodeId>>,
    limit: usize,
}

impl Default for Recycler {
    fn default() -> Self {
        Self::new()
    }
}

impl Recycler {
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_POOL_LIMIT)
    }

    /// Pool at most `limit` elements per tag. `0` disables pooling.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            pool: HashMap::new(),
            limit,
        }
    }

    /// Number of pooled elements across all tags.
    pub fn pooled(&self) -> usize {
        self.pool.values().map(Vec::len).sum()
    }

    /// Dispose every pooled element.
    pub fn drain(&mut self, tree: &mut LiveTree) {
        for (_, nodes) in self.pool.drain() {
            for node in nodes {
                tree.dispose(node);
            }
        }
    }
}

impl NodeFactory for Recycler {
    fn create_node(&mut self, tree: &mut LiveTree, tag: &str, namespaced: bool) -> NodeId {
        let bucket = self.pool.get_mut(&(tag.to_string(), namespaced));
        if let Some(bucket) = bucket {
            while let Some(node) = bucket.pop() {
                // Pooled nodes can be disposed behind our back
                if tree.contains(node) {
                    tree.set_flag(node, NodeFlags::POOLED, false);
                    tracing::trace!(tag, ?node, "reusing pooled element");
                    return node;
                }
            }
        }
        tree.create_element(tag, namespaced)
    }
}

impl NodeRecycler for Recycler {
    fn recycle(&mut self, tree: &mut LiveTree, node: NodeId) {
        tree.detach(node);

        let Some(tag) = tree.tag(node).map(str::to_string) else {
            // Text nodes are never pooled
            tree.dispose(node);
            return;
        };

        tree.set_component(node, None);
        tree.set_key(node, None);
        tree.set_ref_callback(node, None);

        let namespaced = tree.flags(node).contains(NodeFlags::NAMESPACED);
        let bucket = self.pool.entry((tag, namespaced)).or_default();
        if bucket.len() < self.limit {
            tree.set_flag(node, NodeFlags::POOLED, true);
            bucket.push(node);
        } else {
            tree.dispose(node);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
