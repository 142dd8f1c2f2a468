//! The formula compiler and the user-facing query surface.
//!
//! A [`BddFactory`] owns one [`Kernel`] plus the bidirectional mapping
//! between named variables and the kernel's dense variable indices. Formulas
//! go in ([`BddFactory::build`]), opaque [`Bdd`] handles come out, and every
//! query runs against a handle through the factory that created it.
//!
//! The variable order is the index order: either declared up front with
//! [`BddFactory::set_variable_order`], or fixed incrementally by the first
//! appearance of each variable during compilation (in which case the number
//! of variables must have been declared beforehand). Two semantically
//! equivalent formulas built on the same factory under the same order end up
//! with the same root, so handle equality decides semantic equivalence.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use log::info;
use num_bigint::BigUint;

use crate::assignment::Assignment;
use crate::cache::Op;
use crate::error::BddError;
use crate::formula::{Formula, Literal, Variable};
use crate::kernel::{Kernel, KernelStats};
use crate::node::NodeId;

static NEXT_FACTORY_ID: AtomicU64 = AtomicU64::new(0);

/// An opaque handle to a built diagram: the root index paired with the
/// identity of the owning factory.
///
/// Equality of handles from the same factory is structural equality of the
/// underlying diagrams; the hash-consing invariant reduces it to root-index
/// comparison. Passing a handle to a different factory is a programming
/// error and is caught by an assertion.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Bdd {
    index: NodeId,
    factory: u64,
}

impl Bdd {
    /// The root node index inside the owning factory's kernel.
    pub fn index(&self) -> NodeId {
        self.index
    }
}

/// One inner node of the export list: `(id, variable label, low, high)`.
/// This is the stable contract consumed by graph writers.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct InternalNode {
    pub id: NodeId,
    pub label: String,
    pub low: NodeId,
    pub high: NodeId,
}

/// The BDD factory: compiles formulas and answers queries.
pub struct BddFactory {
    kernel: Kernel,
    var2idx: BTreeMap<Variable, u32>,
    idx2var: Vec<Variable>,
    id: u64,
}

impl BddFactory {
    /// Create a factory with the given initial node-table capacity and
    /// operation-cache capacity.
    pub fn new(num_nodes: usize, cache_size: usize) -> Self {
        Self::with_kernel(Kernel::new(num_nodes, cache_size))
    }

    /// Like [`BddFactory::new`], with an explicit node-table growth limit.
    pub fn with_node_limit(num_nodes: usize, cache_size: usize, max_nodes: usize) -> Self {
        Self::with_kernel(Kernel::with_node_limit(num_nodes, cache_size, max_nodes))
    }

    fn with_kernel(kernel: Kernel) -> Self {
        Self {
            kernel,
            var2idx: BTreeMap::new(),
            idx2var: Vec::new(),
            id: NEXT_FACTORY_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    fn wrap(&self, index: NodeId) -> Bdd {
        Bdd { index, factory: self.id }
    }

    fn root(&self, bdd: &Bdd) -> NodeId {
        assert_eq!(bdd.factory, self.id, "BDD handle belongs to a different factory");
        bdd.index
    }

    /// Declare the number of variables. Required before building when the
    /// variable order is fixed incrementally (first-seen) rather than via
    /// [`BddFactory::set_variable_order`].
    pub fn set_number_of_vars(&mut self, num: u32) -> Result<(), BddError> {
        self.kernel.set_num_vars(num)
    }

    /// Fix the variable order explicitly: the i-th variable of `order` gets
    /// dense index `i`. Also declares the variable count, so this must be the
    /// first call on a fresh factory, before anything is built.
    pub fn set_variable_order(&mut self, order: &[Variable]) -> Result<(), BddError> {
        self.kernel.set_num_vars(order.len() as u32)?;
        for variable in order {
            assert!(
                !self.var2idx.contains_key(variable),
                "duplicate variable in order: {}",
                variable
            );
            let index = self.var2idx.len() as u32;
            self.var2idx.insert(variable.clone(), index);
            self.idx2var.push(variable.clone());
        }
        Ok(())
    }

    /// Grow the variable index space by `num` fresh indices. Existing
    /// diagrams are untouched.
    pub fn extend_var_num(&mut self, num: u32) -> Result<(), BddError> {
        self.kernel.extend_var_num(num)
    }

    /// The number of declared variables.
    pub fn number_of_vars(&self) -> u32 {
        self.kernel.num_vars()
    }

    /// The variable mapped to a dense index, if any.
    pub fn variable_at_index(&self, index: u32) -> Option<&Variable> {
        self.idx2var.get(index as usize)
    }

    /// The dense index of a variable, allocating the next free index on
    /// first sight.
    fn variable_index(&mut self, variable: &Variable) -> u32 {
        if let Some(&index) = self.var2idx.get(variable) {
            return index;
        }
        let index = self.var2idx.len() as u32;
        self.var2idx.insert(variable.clone(), index);
        self.idx2var.push(variable.clone());
        index
    }

    /// Build the BDD of a formula.
    ///
    /// All Boolean connectives are supported; pseudo-Boolean constraints are
    /// not, because the number of variables must be known before compilation
    /// while their encoding size depends on the translation; normalize them
    /// into CNF first. The returned handle holds an external reference; drop
    /// it with [`BddFactory::release`] when the diagram is no longer needed.
    pub fn build(&mut self, formula: &Formula) -> Result<Bdd, BddError> {
        let index = self.build_rec(formula)?;
        Ok(self.wrap(index))
    }

    /// Recursive build. Every return value carries an external reference
    /// (trivially so for pinned leaves); operand references are released
    /// once they are folded into a bigger diagram.
    fn build_rec(&mut self, formula: &Formula) -> Result<NodeId, BddError> {
        match formula {
            Formula::Falsum => Ok(NodeId::FALSE),
            Formula::Verum => Ok(NodeId::TRUE),
            Formula::Literal(lit) => {
                let index = self.variable_index(lit.variable());
                if lit.phase() {
                    self.kernel.ith_var(index)
                } else {
                    self.kernel.nith_var(index)
                }
            }
            Formula::Not(operand) => {
                let a = self.build_rec(operand)?;
                let res = self.kernel.not(a)?;
                self.kernel.add_ref(res);
                self.kernel.del_ref(a);
                Ok(res)
            }
            Formula::Implication(left, right) => self.build_binary(Op::Imp, left, right),
            Formula::Equivalence(left, right) => self.build_binary(Op::Equiv, left, right),
            Formula::And(operands) => self.build_nary(Op::And, operands, NodeId::TRUE),
            Formula::Or(operands) => self.build_nary(Op::Or, operands, NodeId::FALSE),
            Formula::Pbc(_) => Err(BddError::UnsupportedOperator("pseudo-Boolean constraint")),
        }
    }

    fn build_binary(&mut self, op: Op, left: &Formula, right: &Formula) -> Result<NodeId, BddError> {
        let a = self.build_rec(left)?;
        let b = self.build_rec(right)?;
        let res = self.kernel.apply(op, a, b)?;
        self.kernel.add_ref(res);
        self.kernel.del_ref(a);
        self.kernel.del_ref(b);
        Ok(res)
    }

    fn build_nary(&mut self, op: Op, operands: &[Formula], empty: NodeId) -> Result<NodeId, BddError> {
        let mut iter = operands.iter();
        let Some(first) = iter.next() else {
            return Ok(empty);
        };
        let mut acc = self.build_rec(first)?;
        for operand in iter {
            let b = self.build_rec(operand)?;
            let res = self.kernel.apply(op, acc, b)?;
            self.kernel.add_ref(res);
            self.kernel.del_ref(acc);
            self.kernel.del_ref(b);
            acc = res;
        }
        Ok(acc)
    }

    /// The diagram of a single variable.
    pub fn var(&mut self, variable: &Variable) -> Result<Bdd, BddError> {
        let index = self.variable_index(variable);
        let node = self.kernel.ith_var(index)?;
        self.kernel.add_ref(node);
        Ok(self.wrap(node))
    }

    /// The diagram of a single literal.
    pub fn literal(&mut self, variable: &Variable, phase: bool) -> Result<Bdd, BddError> {
        let index = self.variable_index(variable);
        let node = if phase { self.kernel.ith_var(index)? } else { self.kernel.nith_var(index)? };
        self.kernel.add_ref(node);
        Ok(self.wrap(node))
    }

    /// The diagram of the variable with dense index `i`.
    pub fn ith_var(&mut self, i: u32) -> Result<Bdd, BddError> {
        let node = self.kernel.ith_var(i)?;
        self.kernel.add_ref(node);
        Ok(self.wrap(node))
    }

    /// The diagram of the negated variable with dense index `i`.
    pub fn nith_var(&mut self, i: u32) -> Result<Bdd, BddError> {
        let node = self.kernel.nith_var(i)?;
        self.kernel.add_ref(node);
        Ok(self.wrap(node))
    }

    /// The constant true diagram.
    pub fn verum(&self) -> Bdd {
        self.wrap(NodeId::TRUE)
    }

    /// The constant false diagram.
    pub fn falsum(&self) -> Bdd {
        self.wrap(NodeId::FALSE)
    }

    /// The conjunction of two diagrams.
    pub fn and(&mut self, a: &Bdd, b: &Bdd) -> Result<Bdd, BddError> {
        self.apply(Op::And, a, b)
    }

    /// The disjunction of two diagrams.
    pub fn or(&mut self, a: &Bdd, b: &Bdd) -> Result<Bdd, BddError> {
        self.apply(Op::Or, a, b)
    }

    /// The implication `a => b`.
    pub fn implication(&mut self, a: &Bdd, b: &Bdd) -> Result<Bdd, BddError> {
        self.apply(Op::Imp, a, b)
    }

    /// The equivalence `a <=> b`.
    pub fn equivalence(&mut self, a: &Bdd, b: &Bdd) -> Result<Bdd, BddError> {
        self.apply(Op::Equiv, a, b)
    }

    fn apply(&mut self, op: Op, a: &Bdd, b: &Bdd) -> Result<Bdd, BddError> {
        let (x, y) = (self.root(a), self.root(b));
        let res = self.kernel.apply(op, x, y)?;
        self.kernel.add_ref(res);
        Ok(self.wrap(res))
    }

    /// The negation of a diagram.
    pub fn not(&mut self, a: &Bdd) -> Result<Bdd, BddError> {
        let x = self.root(a);
        let res = self.kernel.not(x)?;
        self.kernel.add_ref(res);
        Ok(self.wrap(res))
    }

    /// The conjunction of the given variables in positive form (a variable
    /// set for quantification). Keep the returned handle around instead of
    /// rebuilding the set for every call.
    pub fn make_set(&mut self, variables: &[Variable]) -> Result<Bdd, BddError> {
        let indices: Vec<u32> = variables.iter().map(|v| self.variable_index(v)).collect();
        let res = self.kernel.make_set(&indices)?;
        self.kernel.add_ref(res);
        Ok(self.wrap(res))
    }

    /// Drop the external reference held by a handle. The diagram becomes
    /// collectible once no other reference keeps it alive; the handle must
    /// not be used afterwards.
    pub fn release(&mut self, bdd: &Bdd) {
        let root = self.root(bdd);
        self.kernel.del_ref(root);
    }

    /// Whether the diagram is the constant true function.
    pub fn is_tautology(&self, bdd: &Bdd) -> bool {
        self.root(bdd).is_true()
    }

    /// Whether the diagram is the constant false function.
    pub fn is_contradiction(&self, bdd: &Bdd) -> bool {
        self.root(bdd).is_false()
    }

    /// Restrict a diagram: substitute each restriction literal's variable by
    /// its truth value and re-reduce.
    pub fn restrict(&mut self, bdd: &Bdd, restriction: &[Literal]) -> Result<Bdd, BddError> {
        let root = self.root(bdd);
        let cube_formula =
            Formula::And(restriction.iter().cloned().map(Formula::Literal).collect());
        let cube = self.build_rec(&cube_formula)?;
        let res = self.kernel.restrict(root, cube)?;
        self.kernel.add_ref(res);
        self.kernel.del_ref(cube);
        Ok(self.wrap(res))
    }

    /// Existentially quantify the given variables:
    /// `∃v. D = D|v=0 ∨ D|v=1`, folded over the set (the order does not
    /// matter, quantification commutes across distinct variables).
    pub fn exists(&mut self, bdd: &Bdd, variables: &[Variable]) -> Result<Bdd, BddError> {
        self.quantify(bdd, variables, Op::Or)
    }

    /// Universally quantify the given variables:
    /// `∀v. D = D|v=0 ∧ D|v=1`, folded over the set.
    pub fn forall(&mut self, bdd: &Bdd, variables: &[Variable]) -> Result<Bdd, BddError> {
        self.quantify(bdd, variables, Op::And)
    }

    fn quantify(&mut self, bdd: &Bdd, variables: &[Variable], op: Op) -> Result<Bdd, BddError> {
        let mut res = self.root(bdd);
        self.kernel.add_ref(res);
        for variable in variables {
            let index = self.variable_index(variable);
            let pos_cube = self.kernel.ith_var(index)?;
            let neg_cube = self.kernel.nith_var(index)?;
            let when_true = self.kernel.restrict(res, pos_cube)?;
            self.kernel.add_ref(when_true);
            let when_false = self.kernel.restrict(res, neg_cube)?;
            self.kernel.add_ref(when_false);
            let combined = self.kernel.apply(op, when_false, when_true)?;
            self.kernel.add_ref(combined);
            self.kernel.del_ref(when_true);
            self.kernel.del_ref(when_false);
            self.kernel.del_ref(res);
            res = combined;
        }
        Ok(self.wrap(res))
    }

    /// One satisfying assignment over the variables actually tested on the
    /// chosen path, or `None` for the contradiction.
    pub fn model(&self, bdd: &Bdd) -> Option<Assignment> {
        let path = self.kernel.sat_one(self.root(bdd))?;
        Some(self.path_to_assignment(&path))
    }

    /// One satisfying assignment; variables from `variables` that the chosen
    /// path does not test are assigned `default_value`.
    pub fn model_for_variables(
        &mut self,
        bdd: &Bdd,
        default_value: bool,
        variables: &[Variable],
    ) -> Result<Option<Assignment>, BddError> {
        let root = self.root(bdd);
        let indices: Vec<u32> = variables.iter().map(|v| self.variable_index(v)).collect();
        let path = self.kernel.sat_one_set(root, &indices, default_value)?;
        Ok(path.map(|p| self.path_to_assignment(&p)))
    }

    /// One satisfying assignment over *all* declared variables; variables
    /// absent from the chosen path default to false.
    pub fn full_model(&self, bdd: &Bdd) -> Option<Assignment> {
        let path = self.kernel.full_sat_one(self.root(bdd))?;
        Some(self.path_to_assignment(&path))
    }

    fn path_to_assignment(&self, path: &[(u32, bool)]) -> Assignment {
        let mut assignment = Assignment::new();
        for &(index, value) in path {
            let variable = self.idx2var[index as usize].clone();
            assignment.add_literal(Literal::new(variable, value));
        }
        assignment
    }

    /// Enumerate every satisfying assignment over all mapped variables.
    /// Don't-care variables are expanded into both polarities, and the
    /// result is de-duplicated as a set.
    pub fn enumerate_all_models(&self, bdd: &Bdd) -> Vec<Assignment> {
        let relevant: Vec<u32> = (0..self.idx2var.len() as u32).collect();
        self.enumerate(self.root(bdd), &relevant)
    }

    /// Enumerate every satisfying assignment projected onto the given
    /// variables. Unmapped variables are ignored.
    pub fn enumerate_all_models_for(&self, bdd: &Bdd, variables: &[Variable]) -> Vec<Assignment> {
        let mut relevant: Vec<u32> = variables
            .iter()
            .filter_map(|v| self.var2idx.get(v).copied())
            .collect();
        relevant.sort_unstable();
        relevant.dedup();
        self.enumerate(self.root(bdd), &relevant)
    }

    fn enumerate(&self, root: NodeId, relevant: &[u32]) -> Vec<Assignment> {
        let mut result: HashSet<Assignment> = HashSet::new();
        for mut profile in self.kernel.all_sat(root) {
            self.expand_models(&mut profile, relevant, 0, &mut result);
        }
        result.into_iter().collect()
    }

    /// Expand every don't-care position among the relevant indices into both
    /// polarities; complete profiles become assignments.
    fn expand_models(
        &self,
        profile: &mut Vec<i8>,
        relevant: &[u32],
        position: usize,
        result: &mut HashSet<Assignment>,
    ) {
        if position == relevant.len() {
            let mut assignment = Assignment::new();
            for &index in relevant {
                let variable = self.idx2var[index as usize].clone();
                assignment.add_literal(Literal::new(variable, profile[index as usize] != 0));
            }
            result.insert(assignment);
            return;
        }
        let index = relevant[position] as usize;
        if profile[index] != -1 {
            self.expand_models(profile, relevant, position + 1, result);
        } else {
            profile[index] = 0;
            self.expand_models(profile, relevant, position + 1, result);
            profile[index] = 1;
            self.expand_models(profile, relevant, position + 1, result);
            profile[index] = -1;
        }
    }

    /// The number of satisfying assignments over all declared variables.
    pub fn model_count(&self, bdd: &Bdd) -> BigUint {
        self.kernel.sat_count(self.root(bdd))
    }

    /// The model count with `unimportant_vars` of the declared variables
    /// considered irrelevant: the full count divided by `2^unimportant_vars`.
    pub fn model_count_unimportant(&self, bdd: &Bdd, unimportant_vars: u32) -> BigUint {
        self.model_count(bdd) >> unimportant_vars
    }

    /// The number of paths from the root to the TRUE terminal.
    pub fn path_count_one(&self, bdd: &Bdd) -> BigUint {
        self.kernel.path_count_one(self.root(bdd))
    }

    /// The number of paths from the root to the FALSE terminal.
    pub fn path_count_zero(&self, bdd: &Bdd) -> BigUint {
        self.kernel.path_count_zero(self.root(bdd))
    }

    /// A CNF of the diagram: one clause per path to FALSE, each clause the
    /// disjunction of the negated decisions along that path.
    pub fn cnf(&self, bdd: &Bdd) -> Formula {
        let mut clauses = Vec::new();
        for path in self.kernel.all_unsat(self.root(bdd)) {
            let mut literals = Vec::new();
            for (index, &value) in path.iter().enumerate() {
                match value {
                    0 => literals.push(Formula::Literal(self.idx2var[index].pos())),
                    1 => literals.push(Formula::Literal(self.idx2var[index].neg())),
                    _ => {}
                }
            }
            clauses.push(Formula::Or(literals));
        }
        Formula::And(clauses)
    }

    /// The number of clauses [`BddFactory::cnf`] produces, without building
    /// the formula.
    pub fn number_of_clauses_cnf(&self, bdd: &Bdd) -> BigUint {
        self.path_count_zero(bdd)
    }

    /// A DNF of the diagram: the disjunction of one conjunctive term per
    /// enumerated model, or the false constant for the contradiction.
    pub fn dnf(&self, bdd: &Bdd) -> Formula {
        let models = self.enumerate_all_models(bdd);
        if models.is_empty() {
            return Formula::Falsum;
        }
        Formula::Or(models.iter().map(Assignment::formula).collect())
    }

    /// The set of variables the diagram depends on.
    pub fn support(&self, bdd: &Bdd) -> BTreeSet<Variable> {
        self.kernel
            .support(self.root(bdd))
            .into_iter()
            .map(|index| self.idx2var[index as usize].clone())
            .collect()
    }

    /// Per-variable occurrence counts over the reachable nodes, for every
    /// mapped variable (zero included).
    pub fn variable_profile(&self, bdd: &Bdd) -> BTreeMap<Variable, usize> {
        let counts = self.kernel.var_profile(self.root(bdd));
        self.idx2var
            .iter()
            .enumerate()
            .map(|(index, variable)| (variable.clone(), counts[index]))
            .collect()
    }

    /// The number of inner nodes of the diagram.
    pub fn node_count(&self, bdd: &Bdd) -> usize {
        self.kernel.node_count(self.root(bdd))
    }

    /// The inner nodes of the diagram for external consumption (e.g. a DOT
    /// writer): `(id, variable label, low, high)`, terminals excluded.
    pub fn internal_nodes(&self, bdd: &Bdd) -> Vec<InternalNode> {
        self.kernel
            .all_nodes(self.root(bdd))
            .into_iter()
            .map(|(id, var, low, high)| InternalNode {
                id,
                label: self.idx2var[var as usize].name().to_string(),
                low,
                high,
            })
            .collect()
    }

    /// Run a garbage collection now. Returns the number of reclaimed nodes.
    pub fn collect_garbage(&mut self) -> usize {
        self.kernel.collect_garbage()
    }

    /// Engine statistics.
    pub fn stats(&self) -> KernelStats {
        self.kernel.stats()
    }

    /// Log the engine statistics at info level.
    pub fn print_stats(&self) {
        info!("{}", self.kernel.stats());
    }
}
