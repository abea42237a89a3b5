//! Type compatibility - can this live node be reused for this descriptor?

use crate::engine::{LiveTree, NodeId};
use crate::vnode::Descriptor;

/// Is `node` an element whose tag equals `tag`, ignoring ASCII case?
pub fn same_tag(tree: &LiveTree, node: NodeId, tag: &str) -> bool {
    tree.tag(node).is_some_and(|t| t.eq_ignore_ascii_case(tag))
}

/// Can `node` be matched to `descriptor` during child matching?
///
/// - text matches text nodes
/// - elements match elements of the same tag that are not a component's base
/// - components match nodes whose owning component has the same constructor
/// - functional descriptors never match; they are expanded first
pub fn same_type(tree: &LiveTree, node: NodeId, descriptor: &Descriptor) -> bool {
    match descriptor {
        Descriptor::Text(_) => tree.is_text(node),
        Descriptor::Element(el) => tree.component(node).is_none() && same_tag(tree, node, &el.tag),
        Descriptor::Component(c) => tree.component(node).is_some_and(|link| link.ty == c.ty),
        Descriptor::Functional(_) => false,
    }
}
