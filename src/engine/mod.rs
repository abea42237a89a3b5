//! Engine - the live tree and the collaborators that touch it physically.
//!
//! The engine manages the host-side data structures:
//! - [`LiveTree`]: arena of live nodes with generational ids and a free pool
//! - [`NodeFactory`] / [`NodeRecycler`]: element creation and pooling ([`Recycler`])
//! - [`AttributeAccessor`]: single attribute writes ([`DomAccessor`])
//!
//! # Architecture
//!
//! Live nodes are NOT owned by each other. They are slots in one arena and
//! refer to each other by [`NodeId`]:
//!
//! ```text
//! slot 0: <div>   (parent=None, children=[1, 2])
//! slot 1: "hello" (parent=0)
//! slot 2: <span>  (parent=0, children=[])
//! ```
//!
//! Moving a subtree is a pair of list edits, and a released node can be
//! handed back out by the recycler without reallocating.

mod accessor;
mod recycler;
mod tree;

pub use accessor::*;
pub use recycler::*;
pub use tree::*;
