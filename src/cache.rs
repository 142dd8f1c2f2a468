use std::fmt::{Display, Formatter};

use crate::node::NodeId;
use crate::utils::{pairing3, MyHash};

/// The binary Boolean connectives implemented by the apply engine.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Op {
    And,
    Or,
    Imp,
    Equiv,
}

impl Op {
    /// Commutative operators normalize their operand order for cache-key
    /// stability.
    pub fn is_commutative(self) -> bool {
        !matches!(self, Op::Imp)
    }

    fn tag(self) -> u64 {
        match self {
            Op::And => 0,
            Op::Or => 1,
            Op::Imp => 2,
            Op::Equiv => 3,
        }
    }
}

impl Display for Op {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Op::And => write!(f, "and"),
            Op::Or => write!(f, "or"),
            Op::Imp => write!(f, "imp"),
            Op::Equiv => write!(f, "equiv"),
        }
    }
}

/// A memoizable operator application.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum OpKey {
    Apply(Op, NodeId, NodeId),
    Not(NodeId),
    Restrict(NodeId, NodeId),
}

impl MyHash for OpKey {
    fn hash(&self) -> u64 {
        match *self {
            OpKey::Apply(op, l, r) => pairing3(l.raw() as u64, r.raw() as u64, op.tag()),
            OpKey::Not(r) => pairing3(r.raw() as u64, 0, 4),
            OpKey::Restrict(r, cube) => pairing3(r.raw() as u64, cube.raw() as u64, 5),
        }
    }
}

struct Entry {
    key: OpKey,
    value: NodeId,
}

/// The operation cache: a bounded, direct-mapped memoization table.
///
/// Entries may be evicted (overwritten) at any time, so the cache is never a
/// source of truth. Lookups compare the full stored key, so a hash collision
/// can cost a recomputation but can never return a wrong result. The engine
/// clears the cache wholesale on every garbage collection and on variable
/// growth, which keeps every surviving entry valid by construction.
pub struct OpCache {
    data: Vec<Option<Entry>>,
    bitmask: u64,
    hits: usize,
    misses: usize,
}

impl OpCache {
    /// Create a cache with at least the given number of entries (rounded up
    /// to a power of two).
    pub fn new(capacity: usize) -> Self {
        let size = capacity.next_power_of_two().max(16);
        let bitmask = (size - 1) as u64;
        Self {
            data: std::iter::repeat_with(|| None).take(size).collect(),
            bitmask,
            hits: 0,
            misses: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.iter().all(|e| e.is_none())
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }

    fn index(&self, key: &OpKey) -> usize {
        (key.hash() & self.bitmask) as usize
    }

    pub fn get(&mut self, key: &OpKey) -> Option<NodeId> {
        match &self.data[self.index(key)] {
            Some(entry) if entry.key == *key => {
                self.hits += 1;
                Some(entry.value)
            }
            _ => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn insert(&mut self, key: OpKey, value: NodeId) {
        let index = self.index(&key);
        self.data[index] = Some(Entry { key, value });
    }

    /// Drop every entry. Hit/miss counters are kept.
    pub fn clear(&mut self) {
        self.data.fill_with(|| None);
    }
}
