//! Node identifiers.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// Source of fresh node ids, shared by the front-end and every rewrite pass
/// that synthesizes nodes.
pub trait IdGenerator {
    fn next_id(&mut self) -> NodeId;
}

/// Hands out ids in increasing order starting at 1.
#[derive(Clone, Debug)]
pub struct IncrementingIdGenerator {
    next: u32,
}

impl IncrementingIdGenerator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Continue numbering after ids that are already in use.
    pub fn starting_at(next: u32) -> Self {
        Self { next }
    }

    pub fn peek(&self) -> NodeId {
        NodeId(self.next)
    }
}

impl Default for IncrementingIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for IncrementingIdGenerator {
    fn next_id(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next = self.next.wrapping_add(1);
        id
    }
}
