//! Error type for reconciliation passes.
//!
//! The core has no recoverable errors of its own. Everything here originates
//! in a collaborator (component host, attribute accessor) or in misuse of the
//! API, and is propagated unchanged to the caller of the top-level pass.

use crate::component::ComponentId;

/// Errors surfaced by a reconciliation pass.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A component descriptor was reached but no component host is installed.
    #[error("no component host installed, cannot build component `{component}`")]
    NoComponentHost { component: String },

    /// The component host was asked about an instance it does not know.
    #[error("unknown component instance {0:?}")]
    UnknownInstance(ComponentId),

    /// The attribute accessor refused a write.
    #[error("attribute `{name}` rejected: {reason}")]
    Attribute { name: String, reason: String },

    /// A component failed while rendering or running a lifecycle hook.
    #[error("component `{component}` failed: {reason}")]
    Component { component: String, reason: String },

    /// A pass was requested while another pass on the same tree was running.
    #[error("reconciliation pass already in progress")]
    Reentrant,
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
