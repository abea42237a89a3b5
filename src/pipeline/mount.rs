//! Mount API - keeps a live subtree in sync with a reactive view.
//!
//! # Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use spark_signals::signal;
//! use vtree_reconcile::pipeline::mount;
//! use vtree_reconcile::vnode::element;
//! use vtree_reconcile::Reconciler;
//!
//! let rc = Rc::new(RefCell::new(Reconciler::new()));
//! let body = rc.borrow_mut().tree_mut().create_element("body", false);
//!
//! let count = signal(0);
//! let view_count = count.clone();
//! let handle = mount(rc.clone(), body, move || {
//!     element("p").child(view_count.get().to_string()).into()
//! });
//!
//! count.set(3);
//! assert_eq!(rc.borrow().tree().markup(body), "<body><p>3</p></body>");
//!
//! handle.unmount()?;
//! assert!(rc.borrow().tree().children(body).is_empty());
//! # Ok::<(), vtree_reconcile::Error>(())
//! ```

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use spark_signals::effect;

use crate::engine::NodeId;
use crate::error::{Error, Result};
use crate::reconciler::Reconciler;
use crate::types::Cleanup;
use crate::vnode::Descriptor;

// =============================================================================
// Mount Handle
// =============================================================================

/// Handle returned by [`mount`].
///
/// Dropping the handle stops the render effect but leaves the rendered
/// subtree in place. Use [`unmount`](MountHandle::unmount) to release it too.
pub struct MountHandle {
    stop_effect: Option<Cleanup>,
    reconciler: Rc<RefCell<Reconciler>>,
    root: Rc<Cell<Option<NodeId>>>,
    passes: Rc<Cell<usize>>,
    last_error: Rc<RefCell<Option<Error>>>,
}

impl MountHandle {
    /// Root node produced by the latest successful pass.
    pub fn root(&self) -> Option<NodeId> {
        self.root.get()
    }

    /// Number of passes the effect has run, including refused and failed ones.
    pub fn passes(&self) -> usize {
        self.passes.get()
    }

    /// Error of the most recent failed pass, if not taken yet.
    pub fn take_error(&self) -> Option<Error> {
        self.last_error.borrow_mut().take()
    }

    /// Stop reacting and release the mounted subtree.
    pub fn unmount(mut self) -> Result<()> {
        if let Some(stop) = self.stop_effect.take() {
            stop();
        }

        let Some(root) = self.root.take() else {
            return Ok(());
        };
        let mut rc = self.reconciler.try_borrow_mut().map_err(|_| Error::Reentrant)?;
        tracing::debug!(?root, "unmounting view");
        rc.release(root, false)
    }
}

impl Drop for MountHandle {
    fn drop(&mut self) {
        if let Some(stop) = self.stop_effect.take() {
            stop();
        }
    }
}

// =============================================================================
// Mount Function
// =============================================================================

/// Render `view` into `parent` and re-render whenever a signal it reads changes.
///
/// The first pass runs before this returns. Each later pass reconciles the
/// fresh descriptor against the previous root, so unchanged nodes are kept.
///
/// Failures never panic: they are logged and kept for
/// [`MountHandle::take_error`]. A change that fires while the reconciler is
/// already borrowed (for example from inside a ref callback) is refused with
/// [`Error::Reentrant`].
pub fn mount(
    reconciler: Rc<RefCell<Reconciler>>,
    parent: NodeId,
    view: impl Fn() -> Descriptor + 'static,
) -> MountHandle {
    let root = Rc::new(Cell::new(None));
    let passes = Rc::new(Cell::new(0));
    let last_error = Rc::new(RefCell::new(None));

    let effect_reconciler = reconciler.clone();
    let effect_root = root.clone();
    let effect_passes = passes.clone();
    let effect_error = last_error.clone();

    let stop_fn = effect(move || {
        effect_passes.set(effect_passes.get() + 1);

        // Read signals outside the borrow so dependencies are tracked either way
        let descriptor = view();

        let Ok(mut rc) = effect_reconciler.try_borrow_mut() else {
            tracing::error!("render pass refused, reconciler is busy");
            *effect_error.borrow_mut() = Some(Error::Reentrant);
            return;
        };

        match rc.render(&descriptor, Some(parent), effect_root.get()) {
            Ok(node) => effect_root.set(Some(node)),
            Err(err) => {
                tracing::error!(error = %err, "render pass failed");
                *effect_error.borrow_mut() = Some(err);
            }
        }
    });

    MountHandle {
        stop_effect: Some(Box::new(stop_fn)),
        reconciler,
        root,
        passes,
        last_error,
    }
}

// =============================================================================
// Tests
// =============================================================================
