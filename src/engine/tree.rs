//! Live Tree - arena of mutable live nodes.
//!
//! Manages the lifecycle of live node slots:
//! - Generational ids so a disposed slot never aliases a new node
//! - Free index pool for O(1) reuse
//! - Parent/children links mirroring a document tree
//! - Per-node bookkeeping owned by the reconciler (recorded attributes,
//!   cached key, ref callback, component back-reference)
//!
//! Structural operations follow the document model: inserting a node that is
//! already attached somewhere moves it.

use std::collections::HashMap;
use std::fmt::Write as _;

use indexmap::IndexMap;

use crate::component::ComponentLink;
use crate::types::{AttrValue, Attributes, Key, NodeFlags};
use crate::vnode::RefCallback;

// =============================================================================
// Node Id
// =============================================================================

/// Handle to a live node.
///
/// Stays valid until the node is disposed. After that, lookups return `None`
/// even if the slot has been reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    /// Slot index (for diagnostics).
    pub fn index(self) -> u32 {
        self.index
    }
}

// =============================================================================
// Node Data
// =============================================================================

/// Element payload: tag plus physical state written by the attribute accessor.
#[derive(Debug, Clone, Default)]
pub struct ElementData {
    /// Tag name exactly as created. Immutable.
    pub tag: String,
    /// Physically written attributes.
    pub attributes: IndexMap<String, AttrValue>,
    /// Live properties (`value`, `checked`, ...) that may change independently
    /// of descriptors.
    pub properties: HashMap<String, AttrValue>,
}

/// What a live node is.
#[derive(Debug, Clone)]
pub enum NodeData {
    Text(String),
    Element(ElementData),
}

/// One live node plus the reconciler's bookkeeping for it.
#[derive(Debug)]
pub struct LiveNode {
    pub data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Attributes applied by the last descriptor (the diff baseline).
    recorded: Attributes,
    key: Option<Key>,
    ref_callback: Option<RefCallback>,
    component: Option<ComponentLink>,
    flags: NodeFlags,
}

impl LiveNode {
    fn new(data: NodeData, flags: NodeFlags) -> Self {
        Self {
            data,
            parent: None,
            children: Vec::new(),
            recorded: Attributes::new(),
            key: None,
            ref_callback: None,
            component: None,
            flags,
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_text(&self) -> bool {
        matches!(self.data, NodeData::Text(_))
    }

    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    pub fn tag(&self) -> Option<&str> {
        match &self.data {
            NodeData::Element(el) => Some(&el.tag),
            NodeData::Text(_) => None,
        }
    }

    pub fn flags(&self) -> NodeFlags {
        self.flags
    }
}

// =============================================================================
// Stats
// =============================================================================

/// Mutation counters. Every structural or physical write bumps one of these.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeStats {
    /// Nodes created (text or element).
    pub created: usize,
    /// Text node values rewritten.
    pub text_writes: usize,
    /// Insertions and moves.
    pub inserts: usize,
    /// Nodes detached from a parent.
    pub detaches: usize,
    /// Slots freed.
    pub disposed: usize,
    /// Physical attribute or property writes (including removals).
    pub attribute_writes: usize,
}

impl TreeStats {
    /// Structural mutations only (everything except attribute writes).
    pub fn structural(&self) -> usize {
        self.created + self.text_writes + self.inserts + self.detaches + self.disposed
    }
}

// =============================================================================
// Live Tree
// =============================================================================

struct Slot {
    generation: u32,
    node: Option<LiveNode>,
}

/// Arena holding every live node of one rendered tree.
#[derive(Default)]
pub struct LiveTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    stats: TreeStats,
}

impl LiveTree {
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Allocation
    // -------------------------------------------------------------------------

    fn allocate(&mut self, node: LiveNode) -> NodeId {
        self.stats.created += 1;

        // Reuse free slot or grow
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return NodeId {
                index,
                generation: slot.generation,
            };
        }

        let index = slot_index(self.slots.len());
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId {
            index,
            generation: 0,
        }
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, value: impl Into<String>) -> NodeId {
        self.allocate(LiveNode::new(NodeData::Text(value.into()), NodeFlags::NONE))
    }

    /// Create a detached element.
    pub fn create_element(&mut self, tag: impl Into<String>, namespaced: bool) -> NodeId {
        let flags = if namespaced {
            NodeFlags::NAMESPACED
        } else {
            NodeFlags::NONE
        };
        let data = NodeData::Element(ElementData {
            tag: tag.into(),
            ..Default::default()
        });
        self.allocate(LiveNode::new(data, flags))
    }

    /// Free a node's slot. The node is detached first; its children become
    /// detached roots.
    pub fn dispose(&mut self, id: NodeId) {
        if !self.contains(id) {
            return;
        }
        self.detach(id);

        let children = self
            .get_mut(id)
            .map(|n| std::mem::take(&mut n.children))
            .unwrap_or_default();
        for child in children {
            if let Some(c) = self.get_mut(child) {
                c.parent = None;
            }
        }

        let slot = &mut self.slots[id.index as usize];
        slot.node = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.stats.disposed += 1;
    }

    // -------------------------------------------------------------------------
    // Lookups
    // -------------------------------------------------------------------------

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: NodeId) -> Option<&LiveNode> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut LiveNode> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    /// Number of live (not disposed) nodes.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(LiveNode::is_text)
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(LiveNode::is_element)
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(LiveNode::tag)
    }

    /// Value of a text node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.get(id)?.data {
            NodeData::Text(value) => Some(value),
            NodeData::Element(_) => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Children of a node (empty for text nodes and stale ids).
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn child_at(&self, id: NodeId, position: usize) -> Option<NodeId> {
        self.children(id).get(position).copied()
    }

    pub fn flags(&self, id: NodeId) -> NodeFlags {
        self.get(id).map(|n| n.flags).unwrap_or_default()
    }

    pub(crate) fn set_flag(&mut self, id: NodeId, flag: NodeFlags, on: bool) {
        if let Some(node) = self.get_mut(id) {
            node.flags.set(flag, on);
        }
    }

    // -------------------------------------------------------------------------
    // Text
    // -------------------------------------------------------------------------

    /// Rewrite a text node's value. Returns false for non-text or stale ids.
    pub fn set_text(&mut self, id: NodeId, value: &str) -> bool {
        let Some(node) = self.get_mut(id) else {
            return false;
        };
        match &mut node.data {
            NodeData::Text(current) => {
                current.clear();
                current.push_str(value);
                self.stats.text_writes += 1;
                true
            }
            NodeData::Element(_) => false,
        }
    }

    // -------------------------------------------------------------------------
    // Structure
    // -------------------------------------------------------------------------

    /// Append `child` as the last child of `parent` (moving it if attached).
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.insert_before(parent, child, None);
    }

    /// Insert `child` into `parent` before `before` (or at the end when `None`
    /// or when `before` is not a child of `parent`). Moves `child` if it is
    /// already attached anywhere.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, before: Option<NodeId>) {
        if parent == child || Some(child) == before {
            return;
        }
        if !self.contains(parent) || !self.contains(child) {
            tracing::warn!(?parent, ?child, "insert_before on stale node ignored");
            return;
        }

        self.unlink(child);

        let Some(p) = self.get_mut(parent) else {
            return;
        };
        let position = before
            .and_then(|b| p.children.iter().position(|&c| c == b))
            .unwrap_or(p.children.len());
        p.children.insert(position, child);

        if let Some(c) = self.get_mut(child) {
            c.parent = Some(parent);
        }
        self.stats.inserts += 1;
    }

    /// Detach a node from its parent. No-op for roots.
    pub fn detach(&mut self, id: NodeId) {
        if self.unlink(id) {
            self.stats.detaches += 1;
        }
    }

    /// Remove `id` from its parent's child list without counting a mutation.
    fn unlink(&mut self, id: NodeId) -> bool {
        let Some(parent) = self.parent(id) else {
            return false;
        };
        if let Some(p) = self.get_mut(parent) {
            p.children.retain(|&c| c != id);
        }
        if let Some(n) = self.get_mut(id) {
            n.parent = None;
        }
        true
    }

    // -------------------------------------------------------------------------
    // Physical attributes and live properties
    // -------------------------------------------------------------------------

    fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.get_mut(id)?.data {
            NodeData::Element(el) => Some(el),
            NodeData::Text(_) => None,
        }
    }

    fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.get(id)?.data {
            NodeData::Element(el) => Some(el),
            NodeData::Text(_) => None,
        }
    }

    /// Physically written attribute.
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&AttrValue> {
        self.element(id)?.attributes.get(name)
    }

    /// All physically written attributes.
    pub fn attributes(&self, id: NodeId) -> Option<&IndexMap<String, AttrValue>> {
        self.element(id).map(|el| &el.attributes)
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: AttrValue) {
        if let Some(el) = self.element_mut(id) {
            el.attributes.insert(name.to_string(), value);
            self.stats.attribute_writes += 1;
        }
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) {
        if let Some(el) = self.element_mut(id) {
            el.attributes.shift_remove(name);
            self.stats.attribute_writes += 1;
        }
    }

    /// Live property value (e.g. the current `checked` state).
    pub fn property(&self, id: NodeId, name: &str) -> Option<&AttrValue> {
        self.element(id)?.properties.get(name)
    }

    /// Write a live property. Also used to simulate user interaction.
    pub fn set_property(&mut self, id: NodeId, name: &str, value: AttrValue) {
        if let Some(el) = self.element_mut(id) {
            el.properties.insert(name.to_string(), value);
            self.stats.attribute_writes += 1;
        }
    }

    pub fn remove_property(&mut self, id: NodeId, name: &str) {
        if let Some(el) = self.element_mut(id) {
            el.properties.remove(name);
            self.stats.attribute_writes += 1;
        }
    }

    // -------------------------------------------------------------------------
    // Reconciler bookkeeping
    // -------------------------------------------------------------------------

    /// Attributes recorded by the last pass over this node.
    pub fn recorded(&self, id: NodeId) -> Option<&Attributes> {
        self.get(id).map(|n| &n.recorded)
    }

    pub(crate) fn record_attribute(&mut self, id: NodeId, name: &str, value: AttrValue) {
        if let Some(node) = self.get_mut(id) {
            node.recorded.insert(name.to_string(), value);
        }
    }

    pub(crate) fn forget_attribute(&mut self, id: NodeId, name: &str) {
        if let Some(node) = self.get_mut(id) {
            node.recorded.shift_remove(name);
        }
    }

    pub fn key(&self, id: NodeId) -> Option<&Key> {
        self.get(id).and_then(|n| n.key.as_ref())
    }

    pub fn set_key(&mut self, id: NodeId, key: Option<Key>) {
        if let Some(node) = self.get_mut(id) {
            node.key = key;
        }
    }

    pub fn ref_callback(&self, id: NodeId) -> Option<&RefCallback> {
        self.get(id).and_then(|n| n.ref_callback.as_ref())
    }

    pub fn set_ref_callback(&mut self, id: NodeId, callback: Option<RefCallback>) {
        if let Some(node) = self.get_mut(id) {
            node.ref_callback = callback;
        }
    }

    /// Component instance this node is the base of, if any.
    pub fn component(&self, id: NodeId) -> Option<&ComponentLink> {
        self.get(id).and_then(|n| n.component.as_ref())
    }

    pub fn set_component(&mut self, id: NodeId, link: Option<ComponentLink>) {
        if let Some(node) = self.get_mut(id) {
            node.component = link;
        }
    }

    // -------------------------------------------------------------------------
    // Stats
    // -------------------------------------------------------------------------

    pub fn stats(&self) -> TreeStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = TreeStats::default();
    }

    // -------------------------------------------------------------------------
    // Inspection
    // -------------------------------------------------------------------------

    /// Concatenated text of a subtree.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match self.get(id).map(|n| &n.data) {
            Some(NodeData::Text(value)) => out.push_str(value),
            Some(NodeData::Element(_)) => {
                for &child in self.children(id) {
                    self.collect_text(child, out);
                }
            }
            None => {}
        }
    }

    /// Markup rendering of a subtree, for debugging and tests.
    ///
    /// Attributes are written in insertion order; live properties are not shown.
    pub fn markup(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_markup(id, &mut out);
        out
    }

    fn write_markup(&self, id: NodeId, out: &mut String) {
        match self.get(id).map(|n| &n.data) {
            Some(NodeData::Text(value)) => out.push_str(value),
            Some(NodeData::Element(el)) => {
                let _ = write!(out, "<{}", el.tag);
                for (name, value) in &el.attributes {
                    let _ = write!(out, " {name}=\"{value}\"");
                }
                out.push('>');
                for &child in self.children(id) {
                    self.write_markup(child, out);
                }
                let _ = write!(out, "</{}>", el.tag);
            }
            None => {}
        }
    }
}

/// Index of the next fresh slot. Ids are 32-bit, so a tree cannot outgrow them.
fn slot_index(len: usize) -> u32 {
    u32::try_from(len).unwrap_or_else(|_| panic!("live tree is full: {len} slots in use"))
}

// =============================================================================
// Tests
// =============================================================================
