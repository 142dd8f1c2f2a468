//! The memoized apply engine.
//!
//! Every binary connective runs through the same cofactor recursion: resolve
//! terminal and absorbing cases, consult the operation cache, split both
//! operands on the topmost variable, combine the cofactors, rebuild with
//! `make_node`. Negation is its own cached recursion (the engine has no
//! complement edges), and restriction walks the diagram under a sign table
//! extracted from the restriction cube.
//!
//! Recursion depth is bounded by the number of declared variables: every
//! recursive call strictly descends the variable order.

use log::debug;

use crate::cache::{Op, OpKey};
use crate::error::BddError;
use crate::kernel::Kernel;
use crate::node::NodeId;

impl Kernel {
    /// Apply a binary Boolean connective to two diagrams.
    pub fn apply(&mut self, op: Op, l: NodeId, r: NodeId) -> Result<NodeId, BddError> {
        debug!("apply({}, {}, {})", op, l, r);
        self.init_ref();
        self.apply_rec(op, l, r)
    }

    /// The conjunction of two diagrams.
    pub fn and(&mut self, l: NodeId, r: NodeId) -> Result<NodeId, BddError> {
        self.apply(Op::And, l, r)
    }

    /// The disjunction of two diagrams.
    pub fn or(&mut self, l: NodeId, r: NodeId) -> Result<NodeId, BddError> {
        self.apply(Op::Or, l, r)
    }

    /// The implication `l => r`.
    pub fn implication(&mut self, l: NodeId, r: NodeId) -> Result<NodeId, BddError> {
        self.apply(Op::Imp, l, r)
    }

    /// The equivalence `l <=> r`.
    pub fn equivalence(&mut self, l: NodeId, r: NodeId) -> Result<NodeId, BddError> {
        self.apply(Op::Equiv, l, r)
    }

    /// The negation of a diagram.
    pub fn not(&mut self, r: NodeId) -> Result<NodeId, BddError> {
        debug!("not({})", r);
        self.init_ref();
        self.not_rec(r)
    }

    /// Terminal and absorbing cases; `None` means the recursion must split.
    fn terminal_case(&self, op: Op, l: NodeId, r: NodeId) -> Option<NodeId> {
        match op {
            Op::And => {
                if l == r {
                    Some(l)
                } else if l.is_false() || r.is_false() {
                    Some(NodeId::FALSE)
                } else if l.is_true() {
                    Some(r)
                } else if r.is_true() {
                    Some(l)
                } else {
                    None
                }
            }
            Op::Or => {
                if l == r {
                    Some(l)
                } else if l.is_true() || r.is_true() {
                    Some(NodeId::TRUE)
                } else if l.is_false() {
                    Some(r)
                } else if r.is_false() {
                    Some(l)
                } else {
                    None
                }
            }
            Op::Imp => {
                if l.is_false() || r.is_true() || l == r {
                    Some(NodeId::TRUE)
                } else if l.is_true() {
                    Some(r)
                } else {
                    None
                }
            }
            Op::Equiv => {
                if l == r {
                    Some(NodeId::TRUE)
                } else if l.is_true() {
                    Some(r)
                } else if r.is_true() {
                    Some(l)
                } else {
                    None
                }
            }
        }
    }

    fn apply_rec(&mut self, op: Op, l: NodeId, r: NodeId) -> Result<NodeId, BddError> {
        if let Some(res) = self.terminal_case(op, l, r) {
            return Ok(res);
        }
        // Past the terminal cases at least one operand is an inner node.
        let (l, r) = if op.is_commutative() && r < l { (r, l) } else { (l, r) };
        let key = OpKey::Apply(op, l, r);
        if let Some(res) = self.cache.get(&key) {
            return Ok(res);
        }

        let lvar = self.node_var(l);
        let rvar = self.node_var(r);
        let var = lvar.min(rvar);
        let (l0, l1) = if lvar == var {
            (self.node_low(l), self.node_high(l))
        } else {
            (l, l)
        };
        let (r0, r1) = if rvar == var {
            (self.node_low(r), self.node_high(r))
        } else {
            (r, r)
        };

        let low = self.apply_rec(op, l0, r0)?;
        self.push_ref(low);
        let high = self.apply_rec(op, l1, r1)?;
        self.push_ref(high);
        let res = self.make_node(var, low, high)?;
        self.pop_ref(2);

        self.cache.insert(key, res);
        Ok(res)
    }

    fn not_rec(&mut self, r: NodeId) -> Result<NodeId, BddError> {
        if r.is_false() {
            return Ok(NodeId::TRUE);
        }
        if r.is_true() {
            return Ok(NodeId::FALSE);
        }
        let key = OpKey::Not(r);
        if let Some(res) = self.cache.get(&key) {
            return Ok(res);
        }

        let low_child = self.node_low(r);
        let high_child = self.node_high(r);
        let low = self.not_rec(low_child)?;
        self.push_ref(low);
        let high = self.not_rec(high_child)?;
        self.push_ref(high);
        let res = self.make_node(self.node_var(r), low, high)?;
        self.pop_ref(2);

        self.cache.insert(key, res);
        Ok(res)
    }

    /// Restrict a diagram by the variable assignments encoded in `cube`, a
    /// conjunction of literals (positive or negative). Each fixed variable is
    /// substituted by its truth value and the diagram re-reduced. A terminal
    /// cube fixes nothing and leaves the diagram unchanged.
    pub fn restrict(&mut self, r: NodeId, cube: NodeId) -> Result<NodeId, BddError> {
        debug!("restrict({}, cube = {})", r, cube);
        if cube.is_terminal() {
            return Ok(r);
        }
        self.load_sign_table(cube);
        self.init_ref();
        self.restrict_rec(r, cube)
    }

    /// Walk the literal cube and record each decision's polarity: a dead low
    /// branch means the variable is fixed true, otherwise fixed false.
    fn load_sign_table(&mut self, cube: NodeId) {
        self.sign_table.clear();
        self.sign_table.resize(self.varnum as usize, 0);
        let mut n = cube;
        while !n.is_terminal() {
            let v = self.node_var(n);
            self.sign_last = v;
            if self.node_low(n).is_false() {
                self.sign_table[v as usize] = 1;
                n = self.node_high(n);
            } else {
                self.sign_table[v as usize] = -1;
                n = self.node_low(n);
            }
        }
    }

    fn restrict_rec(&mut self, r: NodeId, cube: NodeId) -> Result<NodeId, BddError> {
        if r.is_terminal() || self.node_var(r) > self.sign_last {
            return Ok(r);
        }
        let key = OpKey::Restrict(r, cube);
        if let Some(res) = self.cache.get(&key) {
            return Ok(res);
        }

        let var = self.node_var(r);
        let res = match self.sign_table[var as usize] {
            1 => {
                let high_child = self.node_high(r);
                self.restrict_rec(high_child, cube)?
            }
            -1 => {
                let low_child = self.node_low(r);
                self.restrict_rec(low_child, cube)?
            }
            _ => {
                let low_child = self.node_low(r);
                let high_child = self.node_high(r);
                let low = self.restrict_rec(low_child, cube)?;
                self.push_ref(low);
                let high = self.restrict_rec(high_child, cube)?;
                self.push_ref(high);
                let res = self.make_node(var, low, high)?;
                self.pop_ref(2);
                res
            }
        };

        self.cache.insert(key, res);
        Ok(res)
    }
}
