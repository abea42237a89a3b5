//! Descriptor types - the desired shape of one node.
//!
//! Descriptors are produced fresh for every pass and dropped afterwards.
//! They never point at live nodes; the reconciler is what connects the two.

use std::fmt;
use std::rc::Rc;

use crate::component::ComponentType;
use crate::engine::NodeId;
use crate::types::{AttrValue, Attributes, Context, Key};

// =============================================================================
// Ref Callback
// =============================================================================

/// Callback handed the live element after its attributes are applied,
/// and `None` when that element is released.
#[derive(Clone)]
pub struct RefCallback(Rc<dyn Fn(Option<NodeId>)>);

impl RefCallback {
    pub fn new(f: impl Fn(Option<NodeId>) + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Invoke the callback.
    #[inline]
    pub fn call(&self, node: Option<NodeId>) {
        (self.0)(node)
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &RefCallback) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for RefCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RefCallback(..)")
    }
}

// =============================================================================
// Props
// =============================================================================

/// Attributes plus children, as seen by components and functional descriptors.
#[derive(Debug, Clone, Default)]
pub struct Props {
    pub attributes: Attributes,
    pub children: Vec<Descriptor>,
}

impl Props {
    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.attributes.get(name)
    }

    /// String attribute, or `""` when missing or not a string.
    pub fn get_str(&self, name: &str) -> &str {
        self.attributes.get(name).and_then(AttrValue::as_str).unwrap_or("")
    }
}

// =============================================================================
// Descriptor
// =============================================================================

/// Immutable description of one desired node.
#[derive(Debug, Clone)]
pub enum Descriptor {
    /// Plain text.
    Text(String),
    /// A tagged element with attributes and children.
    Element(ElementDescriptor),
    /// A stateful component, handled by the component host.
    Component(ComponentDescriptor),
    /// A pure function producing another descriptor. Expanded before matching.
    Functional(FunctionalDescriptor),
}

impl Descriptor {
    /// Explicit key, if any. Text never carries one.
    pub fn key(&self) -> Option<&Key> {
        match self {
            Descriptor::Text(_) => None,
            Descriptor::Element(el) => el.key.as_ref(),
            Descriptor::Component(c) => c.key.as_ref(),
            Descriptor::Functional(f) => f.key.as_ref(),
        }
    }

    /// Short label for logs.
    pub fn kind_name(&self) -> &str {
        match self {
            Descriptor::Text(_) => "#text",
            Descriptor::Element(el) => &el.tag,
            Descriptor::Component(c) => c.ty.name(),
            Descriptor::Functional(f) => f.name,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Descriptor::Text(_))
    }
}

impl From<&str> for Descriptor {
    fn from(value: &str) -> Self {
        Descriptor::Text(value.to_string())
    }
}

impl From<String> for Descriptor {
    fn from(value: String) -> Self {
        Descriptor::Text(value)
    }
}

// =============================================================================
// Builder helpers shared by the tagged variants
// =============================================================================

macro_rules! descriptor_builder {
    ($ty:ty, $variant:ident) => {
        impl $ty {
            /// Set an attribute.
            pub fn attr(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
                self.attributes.insert(name.into(), value.into());
                self
            }

            /// Set the explicit key.
            pub fn key(mut self, key: impl Into<Key>) -> Self {
                self.key = Some(key.into());
                self
            }

            /// Append one child.
            pub fn child(mut self, child: impl Into<Descriptor>) -> Self {
                self.children.push(child.into());
                self
            }

            /// Append several children.
            pub fn children<I, D>(mut self, children: I) -> Self
            where
                I: IntoIterator<Item = D>,
                D: Into<Descriptor>,
            {
                self.children.extend(children.into_iter().map(Into::into));
                self
            }
        }

        impl From<$ty> for Descriptor {
            fn from(value: $ty) -> Self {
                Descriptor::$variant(value)
            }
        }
    };
}

// =============================================================================
// Element
// =============================================================================

/// An element descriptor: tag, attributes, children, optional key and ref.
#[derive(Debug, Clone, Default)]
pub struct ElementDescriptor {
    pub tag: String,
    pub attributes: Attributes,
    pub children: Vec<Descriptor>,
    pub key: Option<Key>,
    pub ref_callback: Option<RefCallback>,
}

descriptor_builder!(ElementDescriptor, Element);

impl ElementDescriptor {
    /// Attach a ref callback.
    pub fn on_ref(mut self, f: impl Fn(Option<NodeId>) + 'static) -> Self {
        self.ref_callback = Some(RefCallback::new(f));
        self
    }

    /// Attach an existing ref callback.
    pub fn with_ref(mut self, callback: RefCallback) -> Self {
        self.ref_callback = Some(callback);
        self
    }
}

// =============================================================================
// Component
// =============================================================================

/// A component descriptor. The constructor identity decides type compatibility.
#[derive(Debug, Clone)]
pub struct ComponentDescriptor {
    pub ty: ComponentType,
    pub attributes: Attributes,
    pub children: Vec<Descriptor>,
    pub key: Option<Key>,
}

descriptor_builder!(ComponentDescriptor, Component);

impl ComponentDescriptor {
    /// Props for the component instance.
    pub fn props(&self) -> Props {
        Props {
            attributes: self.attributes.clone(),
            children: self.children.clone(),
        }
    }
}

// =============================================================================
// Functional
// =============================================================================

/// Render function of a functional descriptor.
pub type RenderFn = Rc<dyn Fn(&Props, &Context) -> Descriptor>;

/// A functional descriptor: a pure function of props and context.
#[derive(Clone)]
pub struct FunctionalDescriptor {
    pub name: &'static str,
    pub render: RenderFn,
    pub attributes: Attributes,
    pub children: Vec<Descriptor>,
    pub key: Option<Key>,
}

descriptor_builder!(FunctionalDescriptor, Functional);

impl FunctionalDescriptor {
    pub fn props(&self) -> Props {
        Props {
            attributes: self.attributes.clone(),
            children: self.children.clone(),
        }
    }
}

impl fmt::Debug for FunctionalDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionalDescriptor")
            .field("name", &self.name)
            .field("attributes", &self.attributes)
            .field("children", &self.children)
            .field("key", &self.key)
            .finish()
    }
}

// =============================================================================
// Constructors
// =============================================================================

/// Text descriptor.
pub fn text(value: impl Into<String>) -> Descriptor {
    Descriptor::Text(value.into())
}

/// Element descriptor builder.
///
/// ```
/// use vtree_reconcile::vnode::{element, Descriptor};
///
/// let d: Descriptor = element("ul")
///     .attr("class", "list")
///     .child(element("li").key("a").child("first"))
///     .into();
/// assert_eq!(d.kind_name(), "ul");
/// ```
pub fn element(tag: impl Into<String>) -> ElementDescriptor {
    ElementDescriptor {
        tag: tag.into(),
        ..Default::default()
    }
}

/// Component descriptor builder.
pub fn component(ty: &ComponentType) -> ComponentDescriptor {
    ComponentDescriptor {
        ty: ty.clone(),
        attributes: Attributes::new(),
        children: Vec::new(),
        key: None,
    }
}

/// Functional descriptor builder.
pub fn functional(
    name: &'static str,
    render: impl Fn(&Props, &Context) -> Descriptor + 'static,
) -> FunctionalDescriptor {
    FunctionalDescriptor {
        name,
        render: Rc::new(render),
        attributes: Attributes::new(),
        children: Vec::new(),
        key: None,
    }
}

// =============================================================================
// Tests
// =============================================================================
