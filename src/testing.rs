//! Test doubles shared by the unit tests.

use std::cell::RefCell;
use std::rc::Rc;

use crate::engine::{AttributeAccessor, DomAccessor, LiveTree, NodeId};
use crate::error::{Error, Result};
use crate::types::AttrValue;

/// One call into the attribute accessor.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrWrite {
    Set(String, AttrValue),
    Remove(String),
}

pub type WriteLog = Rc<RefCell<Vec<(NodeId, AttrWrite)>>>;

/// Accessor that records every call, then forwards to a [`DomAccessor`].
///
/// A name listed in `fail_on` makes the write fail instead.
#[derive(Default)]
pub struct RecordingAccessor {
    pub log: WriteLog,
    pub fail_on: Option<String>,
    inner: DomAccessor,
}

impl RecordingAccessor {
    pub fn new() -> (Self, WriteLog) {
        let accessor = Self::default();
        let log = Rc::clone(&accessor.log);
        (accessor, log)
    }

    pub fn failing_on(name: &str) -> Self {
        Self {
            fail_on: Some(name.to_string()),
            ..Self::default()
        }
    }
}

impl AttributeAccessor for RecordingAccessor {
    fn set_attribute(
        &mut self,
        tree: &mut LiveTree,
        node: NodeId,
        name: &str,
        value: Option<&AttrValue>,
        old: Option<&AttrValue>,
        namespaced: bool,
    ) -> Result<()> {
        if self.fail_on.as_deref() == Some(name) {
            return Err(Error::Attribute {
                name: name.to_string(),
                reason: "rejected by test accessor".to_string(),
            });
        }

        let write = match value {
            Some(v) => AttrWrite::Set(name.to_string(), v.clone()),
            None => AttrWrite::Remove(name.to_string()),
        };
        self.log.borrow_mut().push((node, write));
        self.inner.set_attribute(tree, node, name, value, old, namespaced)
    }
}

/// Writes recorded so far, emptying the log.
pub fn drain(log: &WriteLog) -> Vec<AttrWrite> {
    log.borrow_mut().drain(..).map(|(_, write)| write).collect()
}
