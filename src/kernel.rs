use std::collections::HashSet;
use std::fmt::{Display, Formatter};

use log::debug;

use crate::cache::OpCache;
use crate::error::BddError;
use crate::gc;
use crate::node::NodeId;
use crate::table::NodeTable;

/// Upper bound on the number of variables an engine can declare.
pub const MAX_VAR: u32 = 0x001F_FFFF;

/// Default growth limit for the node table.
const DEFAULT_MAX_NODES: usize = 1 << 24;

/// The BDD engine: node table, operation cache, reference bookkeeping and
/// the variable index space.
///
/// All state is owned and mutated through `&mut self`; one kernel serves one
/// thread. Independent kernels share nothing and may run concurrently.
/// Node indices handed out by one kernel are meaningless to another.
pub struct Kernel {
    pub(crate) table: NodeTable,
    pub(crate) cache: OpCache,
    /// Transient roots protecting intermediate results of an in-flight
    /// recursion across a collection triggered by `make_node`. Reset at
    /// every public operation entry.
    pub(crate) ref_stack: Vec<NodeId>,
    var_nodes: Vec<NodeId>,
    nvar_nodes: Vec<NodeId>,
    pub(crate) varnum: u32,
    /// Sign table driving the restrict operation: `1` fixed true, `-1` fixed
    /// false, `0` untouched.
    pub(crate) sign_table: Vec<i8>,
    /// Deepest variable fixed by the current sign table.
    pub(crate) sign_last: u32,
    gc_runs: usize,
}

impl Kernel {
    /// Create an engine with the given initial node-table capacity and
    /// operation-cache capacity. The table may grow up to a default limit.
    pub fn new(node_capacity: usize, cache_capacity: usize) -> Self {
        Self::with_node_limit(node_capacity, cache_capacity, DEFAULT_MAX_NODES)
    }

    /// Like [`Kernel::new`], but with an explicit growth bound for the node
    /// table. Allocation past this bound fails with a resource-exhaustion
    /// error instead of growing.
    pub fn with_node_limit(node_capacity: usize, cache_capacity: usize, max_nodes: usize) -> Self {
        Self {
            table: NodeTable::new(node_capacity, max_nodes),
            cache: OpCache::new(cache_capacity),
            ref_stack: Vec::new(),
            var_nodes: Vec::new(),
            nvar_nodes: Vec::new(),
            varnum: 0,
            sign_table: Vec::new(),
            sign_last: 0,
            gc_runs: 0,
        }
    }

    /// The number of declared variables.
    pub fn num_vars(&self) -> u32 {
        self.varnum
    }

    /// Declare the variable index space `0..num`. Must be called before any
    /// node is built and can only be called once; use [`extend_var_num`]
    /// afterwards. Pre-builds the pinned positive and negative leaf node for
    /// every variable.
    ///
    /// [`extend_var_num`]: Kernel::extend_var_num
    pub fn set_num_vars(&mut self, num: u32) -> Result<(), BddError> {
        if num == 0 || num > MAX_VAR {
            return Err(BddError::InvalidVariableCount { requested: num as u64 });
        }
        if self.varnum != 0 {
            return Err(BddError::VariablesAlreadySet);
        }
        self.varnum = num;
        self.table.set_terminal_var(num);
        self.build_var_nodes(0, num)
    }

    /// Grow the variable index space by `extra` variables. Every existing
    /// node keeps its identity; the operation cache is cleared.
    pub fn extend_var_num(&mut self, extra: u32) -> Result<(), BddError> {
        if extra == 0 {
            return Ok(());
        }
        let new_num = self
            .varnum
            .checked_add(extra)
            .filter(|&n| n <= MAX_VAR)
            .ok_or(BddError::InvalidVariableCount { requested: self.varnum as u64 + extra as u64 })?;
        if self.varnum == 0 {
            return Err(BddError::InvalidVariableCount { requested: extra as u64 });
        }
        let old_num = self.varnum;
        self.varnum = new_num;
        self.table.set_terminal_var(new_num);
        self.build_var_nodes(old_num, new_num)?;
        self.cache.clear();
        Ok(())
    }

    fn build_var_nodes(&mut self, from: u32, to: u32) -> Result<(), BddError> {
        for v in from..to {
            let pos = self.make_node(v, NodeId::FALSE, NodeId::TRUE)?;
            self.table.pin(pos);
            self.var_nodes.push(pos);
            let neg = self.make_node(v, NodeId::TRUE, NodeId::FALSE)?;
            self.table.pin(neg);
            self.nvar_nodes.push(neg);
        }
        Ok(())
    }

    /// The diagram of the `i`-th variable: one node with children FALSE and
    /// TRUE. The node is pinned, so callers need not reference it.
    pub fn ith_var(&self, i: u32) -> Result<NodeId, BddError> {
        if i >= self.varnum {
            return Err(BddError::InvalidVariable { index: i, num_vars: self.varnum });
        }
        Ok(self.var_nodes[i as usize])
    }

    /// The diagram of the negated `i`-th variable.
    pub fn nith_var(&self, i: u32) -> Result<NodeId, BddError> {
        if i >= self.varnum {
            return Err(BddError::InvalidVariable { index: i, num_vars: self.varnum });
        }
        Ok(self.nvar_nodes[i as usize])
    }

    /// The conjunction of the given variables in positive form, used as a
    /// variable set for restriction and quantification.
    pub fn make_set(&mut self, vars: &[u32]) -> Result<NodeId, BddError> {
        let mut sorted = vars.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        for &v in &sorted {
            if v >= self.varnum {
                return Err(BddError::InvalidVariable { index: v, num_vars: self.varnum });
            }
        }
        self.init_ref();
        let mut res = NodeId::TRUE;
        for &v in sorted.iter().rev() {
            self.push_ref(res);
            res = self.make_node(v, NodeId::FALSE, res)?;
        }
        Ok(res)
    }

    /// Create (or share) the node `(var, low, high)`.
    ///
    /// Redundant nodes collapse to their child; duplicates are resolved by
    /// the hash lookup. When the table is exhausted, a collection runs, the
    /// table grows if the collection left it nearly full, and only then does
    /// allocation fail.
    pub fn make_node(&mut self, var: u32, low: NodeId, high: NodeId) -> Result<NodeId, BddError> {
        if low == high {
            return Ok(low);
        }
        debug_assert!(low.is_terminal() || var < self.table.var(low));
        debug_assert!(high.is_terminal() || var < self.table.var(high));
        if let Some(id) = self.table.find(var, low, high) {
            return Ok(id);
        }
        if self.table.free_count() == 0 {
            self.collect_garbage();
            if self.table.free_count() < self.table.capacity() / 5 {
                self.table.grow();
            }
        }
        self.table.insert(var, low, high)
    }

    /// Mark a node as externally referenced and hand the index back, so the
    /// call wraps a result expression. Referenced nodes (and their
    /// descendants) survive garbage collection.
    pub fn add_ref(&mut self, id: NodeId) -> NodeId {
        self.table.add_ref(id);
        id
    }

    /// Drop one external reference, making the node collectible again once
    /// no other reference remains.
    pub fn del_ref(&mut self, id: NodeId) {
        self.table.del_ref(id);
    }

    pub(crate) fn init_ref(&mut self) {
        self.ref_stack.clear();
    }

    pub(crate) fn push_ref(&mut self, id: NodeId) {
        self.ref_stack.push(id);
    }

    pub(crate) fn pop_ref(&mut self, count: usize) {
        let len = self.ref_stack.len();
        self.ref_stack.truncate(len - count);
    }

    /// Run a collection now: mark from every referenced root (and the
    /// in-flight recursion stack), sweep everything else, clear the
    /// operation cache. Returns the number of reclaimed nodes.
    pub fn collect_garbage(&mut self) -> usize {
        let freed = gc::collect(&mut self.table, &self.ref_stack);
        self.cache.clear();
        self.gc_runs += 1;
        debug!("garbage collection #{}: reclaimed {} nodes", self.gc_runs, freed);
        freed
    }

    /// The variable labeling a node. Terminals report the variable count.
    pub fn node_var(&self, id: NodeId) -> u32 {
        self.table.var(id)
    }

    pub fn node_low(&self, id: NodeId) -> NodeId {
        self.table.low(id)
    }

    pub fn node_high(&self, id: NodeId) -> NodeId {
        self.table.high(id)
    }

    /// The number of inner nodes reachable from `root`.
    pub fn node_count(&self, root: NodeId) -> usize {
        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut stack = vec![root];
        let mut count = 0;
        while let Some(id) = stack.pop() {
            if id.is_terminal() || !visited.insert(id) {
                continue;
            }
            count += 1;
            stack.push(self.table.low(id));
            stack.push(self.table.high(id));
        }
        count
    }

    /// The flat `(id, var, low, high)` list of every inner node reachable
    /// from `root`, in ascending index order. This is the export surface for
    /// visualization; terminals are the callers' business.
    pub fn all_nodes(&self, root: NodeId) -> Vec<(NodeId, u32, NodeId, NodeId)> {
        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut stack = vec![root];
        let mut ids = Vec::new();
        while let Some(id) = stack.pop() {
            if id.is_terminal() || !visited.insert(id) {
                continue;
            }
            ids.push(id);
            stack.push(self.table.low(id));
            stack.push(self.table.high(id));
        }
        ids.sort_unstable();
        ids.into_iter()
            .map(|id| (id, self.table.var(id), self.table.low(id), self.table.high(id)))
            .collect()
    }

    /// A snapshot of table and cache health.
    pub fn stats(&self) -> KernelStats {
        KernelStats {
            num_vars: self.varnum,
            capacity: self.table.capacity(),
            active_nodes: self.table.active_count(),
            free_nodes: self.table.free_count(),
            gc_runs: self.gc_runs,
            cache_hits: self.cache.hits(),
            cache_misses: self.cache.misses(),
        }
    }
}

/// Engine statistics, as reported by [`Kernel::stats`].
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct KernelStats {
    pub num_vars: u32,
    pub capacity: usize,
    pub active_nodes: usize,
    pub free_nodes: usize,
    pub gc_runs: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
}

impl Display for KernelStats {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "vars: {} | nodes: {}/{} ({} free) | gc runs: {} | cache: {} hits, {} misses",
            self.num_vars,
            self.active_nodes,
            self.capacity,
            self.free_nodes,
            self.gc_runs,
            self.cache_hits,
            self.cache_misses
        )
    }
}
