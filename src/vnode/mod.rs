//! Virtual tree - descriptors of the desired shape.
//!
//! A descriptor tree is the input of every pass:
//! - [`Descriptor::Text`] - a plain string
//! - [`Descriptor::Element`] - tag, attributes, children, key, ref
//! - [`Descriptor::Component`] - handed to the component host
//! - [`Descriptor::Functional`] - expanded by a [`FunctionalExpander`] before matching
//!
//! # Example
//!
//! ```
//! use vtree_reconcile::vnode::{element, functional, text, Descriptor};
//!
//! let row = functional("Row", |props, _| {
//!     element("li").child(text(props.get_str("label"))).into()
//! });
//!
//! let list: Descriptor = element("ul")
//!     .child(row.clone().attr("label", "one").key("1"))
//!     .child(row.attr("label", "two").key("2"))
//!     .into();
//! assert_eq!(list.kind_name(), "ul");
//! ```

mod descriptor;
mod functional;

pub use descriptor::*;
pub use functional::*;
