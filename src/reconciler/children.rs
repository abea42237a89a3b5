//! Child Reconciler - matches live children against child descriptors.
//!
//! # Algorithm
//!
//! 1. Split the live children into a keyed map and an ordered list of unkeyed
//!    candidates (the map is only built when there are descriptors to match)
//! 2. For each descriptor, in order:
//!    - keyed descriptor with a live match: claim it
//!    - otherwise: scan unkeyed candidates forward from a cursor for the first
//!      compatible node
//!    - reconcile the claimed (or absent) node against the descriptor
//!    - move the result to its position if it is not already there
//! 3. Release whatever was never claimed
//!
//! The scan never looks behind the cursor. Some reorderings therefore recreate
//! a node even though a compatible one sits earlier in the list; matching stays
//! linear.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::engine::NodeId;
use crate::error::Result;
use crate::types::{Context, DiffFlags, Key};
use crate::vnode::Descriptor;

use super::{Reconciler, compat};

impl Reconciler {
    /// Reconcile the children of `parent` against `descriptors`, in place.
    pub fn reconcile_children(
        &mut self,
        parent: NodeId,
        descriptors: &[Descriptor],
        context: &Context,
        mount_all: bool,
    ) -> Result<()> {
        let flags = if mount_all {
            DiffFlags::MOUNT_ALL
        } else {
            DiffFlags::NONE
        };

        // 1. PARTITION LIVE CHILDREN
        let mut keyed: IndexMap<Key, NodeId> = IndexMap::new();
        let mut unkeyed: Vec<Option<NodeId>> = Vec::new();

        for &child in self.tree.children(parent) {
            match self.tree.key(child) {
                // A second live node with the same key stays an unkeyed candidate
                // so it is either reused or released, never leaked.
                Some(key) if !descriptors.is_empty() && !keyed.contains_key(key) => {
                    keyed.insert(key.clone(), child);
                }
                _ => unkeyed.push(Some(child)),
            }
        }

        let mut min = 0;
        let mut len = unkeyed.len();
        let mut seen_keys: HashSet<Key> = HashSet::new();

        // 2. MATCH EACH DESCRIPTOR
        for (position, descriptor) in descriptors.iter().enumerate() {
            let descriptor = self.expand(descriptor, context);
            let mut claimed = None;

            // Keyed match first
            if let Some(key) = descriptor.key() {
                if !seen_keys.insert(key.clone()) {
                    tracing::warn!(%key, "duplicate sibling key, later occurrence treated as unkeyed");
                } else if let Some(node) = keyed.shift_remove(key) {
                    tracing::trace!(%key, ?node, "keyed match");
                    claimed = Some(node);
                }
            }

            // Forward scan for a compatible unkeyed node
            if claimed.is_none() && min < len {
                for j in min..len {
                    let Some(candidate) = unkeyed[j] else {
                        continue;
                    };
                    if compat::same_type(&self.tree, candidate, &descriptor) {
                        claimed = Some(candidate);
                        unkeyed[j] = None;
                        break;
                    }
                }
                while min < len && unkeyed[min].is_none() {
                    min += 1;
                }
                while len > min && unkeyed[len - 1].is_none() {
                    len -= 1;
                }
            }

            // Morph the claimed (or absent) node into shape
            let child = self.idiff(claimed, &descriptor, context, flags)?;

            let expected = self.tree.child_at(parent, position);
            if expected != Some(child) {
                self.tree.insert_before(parent, child, expected);
            }
        }

        // 3. RELEASE ORPHANS
        let orphans: Vec<NodeId> = keyed
            .into_values()
            .chain(unkeyed.into_iter().flatten())
            .collect();
        if !orphans.is_empty() {
            tracing::trace!(?parent, count = orphans.len(), "releasing orphaned children");
            self.release_all(&orphans, false)?;
        }
        Ok(())
    }
}
