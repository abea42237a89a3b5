//! Functional Expander - turns functional descriptors into concrete ones.

use crate::types::Context;

use super::descriptor::{Descriptor, FunctionalDescriptor};

/// Expands one functional descriptor by one step.
///
/// The reconciler calls this repeatedly until a non-functional descriptor
/// comes back, so an implementation only ever needs to apply the function once.
pub trait FunctionalExpander {
    fn expand(&self, descriptor: &FunctionalDescriptor, context: &Context) -> Descriptor;
}

/// Default expander: calls the render function with the descriptor's props.
#[derive(Debug, Default, Clone, Copy)]
pub struct PropsExpander;

impl FunctionalExpander for PropsExpander {
    fn expand(&self, descriptor: &FunctionalDescriptor, context: &Context) -> Descriptor {
        let props = descriptor.props();
        (descriptor.render)(&props, context)
    }
}
