//! Attribute Differ - applies the minimal attribute delta to a live element.
//!
//! The baseline for a comparison is the attribute set recorded on the node by
//! the previous pass, except for live properties (`value`, `checked`,
//! `selected` by default): those compare against the node's current property,
//! because user interaction can change them without any descriptor update.

use crate::engine::NodeId;
use crate::error::Result;
use crate::types::Attributes;

use super::Reconciler;

impl Reconciler {
    /// Bring the attributes of `node` in line with `attributes`.
    ///
    /// `None` removes every recorded attribute.
    pub fn diff_attributes(&mut self, node: NodeId, attributes: Option<&Attributes>) -> Result<()> {
        let old = self.tree.recorded(node).cloned().unwrap_or_default();

        // Removed
        for (name, old_value) in &old {
            if attributes.is_some_and(|a| a.contains_key(name)) {
                continue;
            }
            self.accessor.set_attribute(
                &mut self.tree,
                node,
                name,
                None,
                Some(old_value),
                self.namespaced,
            )?;
            self.tree.forget_attribute(node, name);
        }

        let Some(attributes) = attributes else {
            return Ok(());
        };

        // New and updated
        for (name, value) in attributes {
            let recorded = old.get(name);
            let baseline = if self.config.is_live_property(name) {
                self.tree.property(node, name)
            } else {
                recorded
            };

            if recorded.is_some() && baseline == Some(value) {
                if recorded != Some(value) {
                    self.tree.record_attribute(node, name, value.clone());
                }
                continue;
            }

            self.accessor.set_attribute(
                &mut self.tree,
                node,
                name,
                Some(value),
                recorded,
                self.namespaced,
            )?;
            self.tree.record_attribute(node, name, value.clone());
        }
        Ok(())
    }
}
