use std::fmt::{Display, Formatter};

use crate::utils::{pairing3, MyHash};

/// An index into the node table.
///
/// The two terminal diagrams live at fixed indices: `FALSE` at 0 and `TRUE`
/// at 1. Everything else is an inner node. A `NodeId` is only meaningful
/// together with the engine that produced it.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// The terminal representing the constant false function.
    pub const FALSE: NodeId = NodeId(0);
    /// The terminal representing the constant true function.
    pub const TRUE: NodeId = NodeId(1);

    pub const fn new(index: u32) -> Self {
        NodeId(index)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub const fn is_false(self) -> bool {
        self.0 == 0
    }

    pub const fn is_true(self) -> bool {
        self.0 == 1
    }

    pub const fn is_terminal(self) -> bool {
        self.0 < 2
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// The `(variable, low, high)` triple identifying an inner node.
///
/// Canonical form guarantees that at most one table slot ever holds a given
/// triple, so structural equality of diagrams reduces to index equality.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Node {
    pub var: u32,
    pub low: NodeId,
    pub high: NodeId,
}

impl MyHash for Node {
    fn hash(&self) -> u64 {
        pairing3(self.var as u64, self.low.raw() as u64, self.high.raw() as u64)
    }
}
