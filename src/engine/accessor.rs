//! Attribute Accessor - writes one attribute onto a live element.

use crate::error::Result;
use crate::types::AttrValue;

use super::tree::{LiveTree, NodeId};

/// Low-level attribute writer.
///
/// `value == None` means remove. `old` is the value recorded by the previous
/// pass (if any). `namespaced` is true while the pass is inside a namespaced
/// subtree such as `svg`.
pub trait AttributeAccessor {
    fn set_attribute(
        &mut self,
        tree: &mut LiveTree,
        node: NodeId,
        name: &str,
        value: Option<&AttrValue>,
        old: Option<&AttrValue>,
        namespaced: bool,
    ) -> Result<()>;
}

/// Default accessor for the in-memory tree.
///
/// - `None` or `Bool(false)` removes the attribute
/// - live properties are written as properties only
/// - `className` is an alias for `class`
/// - outside namespace mode names are ASCII-lowercased; inside they keep their case
#[derive(Debug, Clone)]
pub struct DomAccessor {
    live_properties: Vec<String>,
}

impl Default for DomAccessor {
    fn default() -> Self {
        Self {
            live_properties: vec![
                "value".to_string(),
                "selected".to_string(),
                "checked".to_string(),
            ],
        }
    }
}

impl DomAccessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom set of property-backed attribute names.
    pub fn with_live_properties(live_properties: Vec<String>) -> Self {
        Self { live_properties }
    }

    fn physical_name(name: &str, namespaced: bool) -> String {
        if name == "className" {
            return "class".to_string();
        }
        if namespaced {
            name.to_string()
        } else {
            name.to_ascii_lowercase()
        }
    }
}

impl AttributeAccessor for DomAccessor {
    fn set_attribute(
        &mut self,
        tree: &mut LiveTree,
        node: NodeId,
        name: &str,
        value: Option<&AttrValue>,
        _old: Option<&AttrValue>,
        namespaced: bool,
    ) -> Result<()> {
        if self.live_properties.iter().any(|p| p == name) {
            match value {
                Some(v) => tree.set_property(node, name, v.clone()),
                None => tree.remove_property(node, name),
            }
            return Ok(());
        }

        let physical = Self::physical_name(name, namespaced);
        match value {
            Some(v) if !v.is_falsy() => tree.set_attribute(node, &physical, v.clone()),
            _ => tree.remove_attribute(node, &physical),
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
