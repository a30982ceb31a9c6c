//! Identifier allocation for model nodes.

/// Identity of every component, annotation, and relationship in a model.
pub type NodeId = u64;

/// Monotonic identifier source. Issues 1, 2, 3, ... and never reuses a value.
///
/// One allocator lives inside each [`crate::model::Model`], so identifiers are
/// unique per conversion run rather than per process.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    last: NodeId,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return an identifier strictly greater than every one issued before.
    pub fn next_id(&mut self) -> NodeId {
        self.last += 1;
        self.last
    }

    /// The most recently issued identifier, or 0 if none was issued yet.
    pub fn last_issued(&self) -> NodeId {
        self.last
    }
}
