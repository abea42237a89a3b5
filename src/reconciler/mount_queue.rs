//! Mount Queue - defers `did_mount` until the pass has settled.

use std::collections::VecDeque;
use std::rc::Rc;

use crate::component::ComponentId;
use crate::error::Result;

use super::Reconciler;

/// Components created during the running pass, in creation order.
#[derive(Debug, Default)]
pub struct MountQueue {
    pending: VecDeque<ComponentId>,
}

impl MountQueue {
    pub fn enqueue(&mut self, instance: ComponentId) {
        self.pending.push_back(instance);
    }

    pub fn pop(&mut self) -> Option<ComponentId> {
        self.pending.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drop everything queued. Returns how many entries were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }
}

impl Reconciler {
    /// Notify every queued component that it has mounted, in enqueue order.
    ///
    /// Called automatically when the outermost `reconcile` returns. The first
    /// failing `did_mount` stops the flush and the rest of the queue is dropped.
    pub fn flush_mounts(&mut self) -> Result<()> {
        if self.mounts.is_empty() {
            return Ok(());
        }
        tracing::debug!(count = self.mounts.len(), "flushing mounts");

        while let Some(instance) = self.mounts.pop() {
            let host = Rc::clone(&self.components);
            if let Err(err) = host.did_mount(self, instance) {
                let dropped = self.mounts.clear();
                tracing::debug!(
                    ?instance,
                    dropped,
                    error = %err,
                    "did_mount failed, remaining mounts discarded"
                );
                return Err(err);
            }
        }
        Ok(())
    }
}
