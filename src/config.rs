//! Reconciler configuration.

/// Settings that shape how a [`Reconciler`](crate::Reconciler) treats tags and attributes.
///
/// # Example
///
/// ```
/// use vtree_reconcile::ReconcilerConfig;
///
/// let config = ReconcilerConfig {
///     namespace_tags: vec!["svg".into(), "math".into()],
///     ..Default::default()
/// };
/// assert!(config.is_namespace_tag("MATH"));
/// assert!(config.is_live_property("checked"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// Tags that switch the pass into namespace mode for their subtree.
    /// Compared case-insensitively.
    pub namespace_tags: Vec<String>,

    /// Attributes whose comparison baseline is the node's live property
    /// rather than the last applied descriptor value.
    pub live_properties: Vec<String>,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            namespace_tags: vec!["svg".to_string()],
            live_properties: vec![
                "value".to_string(),
                "selected".to_string(),
                "checked".to_string(),
            ],
        }
    }
}

impl ReconcilerConfig {
    /// Does `tag` open a namespaced subtree?
    pub fn is_namespace_tag(&self, tag: &str) -> bool {
        self.namespace_tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    /// Is `name` backed by live node state?
    pub fn is_live_property(&self, name: &str) -> bool {
        self.live_properties.iter().any(|p| p == name)
    }
}
