//! # vtree-reconcile
//!
//! Tree reconciliation engine: keeps a live, mutable node tree in sync with
//! an immutable descriptor tree using as few mutations as possible.
//!
//! Reactive mounting is built on [spark-signals](https://github.com/RLabs-Inc/spark-signals).
//!
//! ## Architecture
//!
//! Live nodes sit in an arena ([`engine::LiveTree`]) and are addressed by
//! generational [`NodeId`]s. Every pass is explicit state on a [`Reconciler`]:
//! recursion depth, namespace mode and the queue of components waiting for
//! `did_mount`.
//!
//! ```text
//! Descriptor tree ─► Reconciler ─► Child Reconciler ─► Attribute Differ
//!                        │                │
//!                        │                └─► Tree Collector ─► Node Recycler
//!                        └─► Component Host ─► Mount Queue (flushed at depth 0)
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Core types (AttrValue, Key, Context, DiffFlags, etc.)
//! - [`vnode`] - Descriptors and their builders
//! - [`engine`] - Live tree arena, node recycler, attribute accessor
//! - [`reconciler`] - The reconciliation passes
//! - [`component`] - Component host seam and the reference registry
//! - [`pipeline`] - Reactive mounting with spark-signals effects

pub mod component;
pub mod config;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod reconciler;
pub mod types;
pub mod vnode;

#[cfg(test)]
mod testing;

// Re-export commonly used items
pub use component::{ComponentHost, ComponentId, ComponentRegistry, ComponentType};
pub use config::ReconcilerConfig;
pub use engine::{LiveTree, NodeId};
pub use error::{Error, Result};
pub use reconciler::Reconciler;
pub use types::*;
pub use vnode::Descriptor;
