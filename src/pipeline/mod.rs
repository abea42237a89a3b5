//! Reactive Pipeline
//!
//! Connects spark-signals to the reconciler. A mounted view is a closure that
//! builds a descriptor tree; every signal it reads becomes a dependency of a
//! single render effect.
//!
//! # Pipeline Architecture
//!
//! ```text
//! signals ─► view() ─► Descriptor ─► Reconciler::render ─► LiveTree
//!    ▲                                                       │
//!    └────────────── set() re-runs the effect ───────────────┘
//! ```
//!
//! ## Key Design Principles
//!
//! - **One effect per mount**: the whole view is re-described and reconciled
//! - **Synchronous**: a `set()` returns after the pass has finished
//! - **No nested passes**: a trigger while the reconciler is busy is refused

pub mod mount;

// Re-exports
pub use mount::{MountHandle, mount};
