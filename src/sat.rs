//! Satisfiability queries: single models, full enumeration, model and path
//! counting, support extraction.
//!
//! Enumeration works on *profiles*: a vector with one entry per declared
//! variable, `0`/`1` for a decision taken on the path and `-1` for a variable
//! the path never tests (a don't-care). Expanding don't-cares into both
//! polarities is the caller's choice and lives in the factory layer.

use std::collections::{BTreeSet, HashMap};

use num_bigint::BigUint;

use crate::error::BddError;
use crate::kernel::Kernel;
use crate::node::NodeId;

impl Kernel {
    /// One satisfying path as `(variable, value)` literals, or `None` for
    /// the contradiction. At every node the low branch is taken unless it is
    /// dead; variables the path never tests are left out.
    pub fn sat_one(&self, r: NodeId) -> Option<Vec<(u32, bool)>> {
        if r.is_false() {
            return None;
        }
        let mut lits = Vec::new();
        let mut cur = r;
        while !cur.is_terminal() {
            let var = self.node_var(cur);
            if self.node_low(cur).is_false() {
                lits.push((var, true));
                cur = self.node_high(cur);
            } else {
                lits.push((var, false));
                cur = self.node_low(cur);
            }
        }
        Some(lits)
    }

    /// One satisfying assignment over *all* declared variables: the
    /// [`sat_one`] path, with every variable absent from it set to `false`.
    ///
    /// [`sat_one`]: Kernel::sat_one
    pub fn full_sat_one(&self, r: NodeId) -> Option<Vec<(u32, bool)>> {
        if r.is_false() {
            return None;
        }
        let mut lits = Vec::new();
        let mut next_var = 0;
        let mut cur = r;
        while !cur.is_terminal() {
            let var = self.node_var(cur);
            for skipped in next_var..var {
                lits.push((skipped, false));
            }
            if self.node_low(cur).is_false() {
                lits.push((var, true));
                cur = self.node_high(cur);
            } else {
                lits.push((var, false));
                cur = self.node_low(cur);
            }
            next_var = var + 1;
        }
        for skipped in next_var..self.num_vars() {
            lits.push((skipped, false));
        }
        Some(lits)
    }

    /// One satisfying path, with every variable from `vars` that the path
    /// does not test assigned `default`. Path variables outside `vars` keep
    /// their path value.
    pub fn sat_one_set(
        &self,
        r: NodeId,
        vars: &[u32],
        default: bool,
    ) -> Result<Option<Vec<(u32, bool)>>, BddError> {
        let mut set = vars.to_vec();
        set.sort_unstable();
        set.dedup();
        for &v in &set {
            if v >= self.num_vars() {
                return Err(BddError::InvalidVariable { index: v, num_vars: self.num_vars() });
            }
        }
        if r.is_false() {
            return Ok(None);
        }

        let mut lits = Vec::new();
        let mut requested = set.iter().copied().peekable();
        let mut cur = r;
        loop {
            let var = self.node_var(cur);
            while let Some(&v) = requested.peek() {
                if v < var {
                    lits.push((v, default));
                    requested.next();
                } else {
                    break;
                }
            }
            if cur.is_terminal() {
                break;
            }
            if requested.peek() == Some(&var) {
                requested.next();
            }
            if self.node_low(cur).is_false() {
                lits.push((var, true));
                cur = self.node_high(cur);
            } else {
                lits.push((var, false));
                cur = self.node_low(cur);
            }
        }
        Ok(Some(lits))
    }

    /// Every path from `r` to the TRUE terminal, as don't-care profiles.
    pub fn all_sat(&self, r: NodeId) -> Vec<Vec<i8>> {
        let mut acc = Vec::new();
        let mut profile = vec![0i8; self.num_vars() as usize];
        for v in 0..self.node_var(r) {
            profile[v as usize] = -1;
        }
        self.all_sat_rec(r, &mut profile, &mut acc);
        acc
    }

    fn all_sat_rec(&self, r: NodeId, profile: &mut Vec<i8>, acc: &mut Vec<Vec<i8>>) {
        if r.is_true() {
            acc.push(profile.clone());
            return;
        }
        if r.is_false() {
            return;
        }
        let var = self.node_var(r);
        let low = self.node_low(r);
        if !low.is_false() {
            profile[var as usize] = 0;
            for skipped in var + 1..self.node_var(low) {
                profile[skipped as usize] = -1;
            }
            self.all_sat_rec(low, profile, acc);
        }
        let high = self.node_high(r);
        if !high.is_false() {
            profile[var as usize] = 1;
            for skipped in var + 1..self.node_var(high) {
                profile[skipped as usize] = -1;
            }
            self.all_sat_rec(high, profile, acc);
        }
    }

    /// Every path from `r` to the FALSE terminal, as don't-care profiles.
    /// These are exactly the clauses of the CNF of `r` (negated).
    pub fn all_unsat(&self, r: NodeId) -> Vec<Vec<i8>> {
        let mut acc = Vec::new();
        let mut profile = vec![0i8; self.num_vars() as usize];
        for v in 0..self.node_var(r) {
            profile[v as usize] = -1;
        }
        self.all_unsat_rec(r, &mut profile, &mut acc);
        acc
    }

    fn all_unsat_rec(&self, r: NodeId, profile: &mut Vec<i8>, acc: &mut Vec<Vec<i8>>) {
        if r.is_false() {
            acc.push(profile.clone());
            return;
        }
        if r.is_true() {
            return;
        }
        let var = self.node_var(r);
        let low = self.node_low(r);
        if !low.is_true() {
            profile[var as usize] = 0;
            for skipped in var + 1..self.node_var(low) {
                profile[skipped as usize] = -1;
            }
            self.all_unsat_rec(low, profile, acc);
        }
        let high = self.node_high(r);
        if !high.is_true() {
            profile[var as usize] = 1;
            for skipped in var + 1..self.node_var(high) {
                profile[skipped as usize] = -1;
            }
            self.all_unsat_rec(high, profile, acc);
        }
    }

    /// The number of satisfying assignments over all declared variables.
    ///
    /// Each edge skipping `k` levels doubles the count `k` times, so the
    /// result counts complete models rather than paths.
    pub fn sat_count(&self, r: NodeId) -> BigUint {
        let mut memo = HashMap::new();
        let prefix = BigUint::from(1u8) << self.node_var(r);
        prefix * self.sat_count_rec(r, &mut memo)
    }

    fn sat_count_rec(&self, r: NodeId, memo: &mut HashMap<NodeId, BigUint>) -> BigUint {
        if r.is_false() {
            return BigUint::from(0u8);
        }
        if r.is_true() {
            return BigUint::from(1u8);
        }
        if let Some(count) = memo.get(&r) {
            return count.clone();
        }
        let var = self.node_var(r);
        let low = self.node_low(r);
        let high = self.node_high(r);
        let count_low = self.sat_count_rec(low, memo) << (self.node_var(low) - var - 1);
        let count_high = self.sat_count_rec(high, memo) << (self.node_var(high) - var - 1);
        let count = count_low + count_high;
        memo.insert(r, count.clone());
        count
    }

    /// The number of distinct paths from `r` to the TRUE terminal.
    pub fn path_count_one(&self, r: NodeId) -> BigUint {
        let mut memo = HashMap::new();
        self.path_count_rec(r, NodeId::TRUE, &mut memo)
    }

    /// The number of distinct paths from `r` to the FALSE terminal.
    pub fn path_count_zero(&self, r: NodeId) -> BigUint {
        let mut memo = HashMap::new();
        self.path_count_rec(r, NodeId::FALSE, &mut memo)
    }

    fn path_count_rec(
        &self,
        r: NodeId,
        target: NodeId,
        memo: &mut HashMap<NodeId, BigUint>,
    ) -> BigUint {
        if r == target {
            return BigUint::from(1u8);
        }
        if r.is_terminal() {
            return BigUint::from(0u8);
        }
        if let Some(count) = memo.get(&r) {
            return count.clone();
        }
        let low = self.node_low(r);
        let high = self.node_high(r);
        let count = self.path_count_rec(low, target, memo) + self.path_count_rec(high, target, memo);
        memo.insert(r, count.clone());
        count
    }

    /// The set of variables the diagram actually depends on.
    pub fn support(&self, r: NodeId) -> BTreeSet<u32> {
        let mut support = BTreeSet::new();
        let mut visited = std::collections::HashSet::new();
        let mut stack = vec![r];
        while let Some(id) = stack.pop() {
            if id.is_terminal() || !visited.insert(id) {
                continue;
            }
            support.insert(self.node_var(id));
            stack.push(self.node_low(id));
            stack.push(self.node_high(id));
        }
        support
    }

    /// Per-variable count of reachable nodes labeled with it, over the whole
    /// declared index space.
    pub fn var_profile(&self, r: NodeId) -> Vec<usize> {
        let mut profile = vec![0usize; self.num_vars() as usize];
        let mut visited = std::collections::HashSet::new();
        let mut stack = vec![r];
        while let Some(id) = stack.pop() {
            if id.is_terminal() || !visited.insert(id) {
                continue;
            }
            profile[self.node_var(id) as usize] += 1;
            stack.push(self.node_low(id));
            stack.push(self.node_high(id));
        }
        profile
    }
}
