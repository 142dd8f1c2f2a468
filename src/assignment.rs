//! A satisfying valuation: which variables are true, which are false.
//!
//! Equality and hashing are set-based, so two assignments denote the same
//! valuation exactly when they compare equal, no matter in which order their
//! literals were added.

use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use crate::formula::{Formula, Literal, Variable};

#[derive(Debug, Clone, Default, Eq, PartialEq, Hash)]
pub struct Assignment {
    pos: BTreeSet<Variable>,
    neg: BTreeSet<Variable>,
}

impl Assignment {
    pub fn new() -> Self {
        Assignment::default()
    }

    pub fn from_literals(literals: impl IntoIterator<Item = Literal>) -> Self {
        let mut assignment = Assignment::new();
        for lit in literals {
            assignment.add_literal(lit);
        }
        assignment
    }

    pub fn add_literal(&mut self, literal: Literal) {
        if literal.phase() {
            self.pos.insert(literal.variable().clone());
        } else {
            self.neg.insert(literal.variable().clone());
        }
    }

    /// The variables assigned true.
    pub fn positive_variables(&self) -> &BTreeSet<Variable> {
        &self.pos
    }

    /// The variables assigned false.
    pub fn negative_variables(&self) -> &BTreeSet<Variable> {
        &self.neg
    }

    pub fn contains_pos(&self, variable: &Variable) -> bool {
        self.pos.contains(variable)
    }

    pub fn contains_neg(&self, variable: &Variable) -> bool {
        self.neg.contains(variable)
    }

    pub fn size(&self) -> usize {
        self.pos.len() + self.neg.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pos.is_empty() && self.neg.is_empty()
    }

    /// Evaluate a literal. A variable not covered by the assignment counts
    /// as false: its positive literal evaluates to false, its negative
    /// literal to true.
    pub fn evaluate_literal(&self, literal: &Literal) -> bool {
        if literal.phase() {
            self.pos.contains(literal.variable())
        } else {
            self.neg.contains(literal.variable()) || !self.pos.contains(literal.variable())
        }
    }

    /// All literals of this assignment, positive and negative, in variable
    /// order.
    pub fn literals(&self) -> Vec<Literal> {
        let mut literals: Vec<Literal> = self
            .pos
            .iter()
            .map(Variable::pos)
            .chain(self.neg.iter().map(Variable::neg))
            .collect();
        literals.sort();
        literals
    }

    /// The assignment as a conjunction of its literals.
    pub fn formula(&self) -> Formula {
        Formula::And(self.literals().into_iter().map(Formula::Literal).collect())
    }
}

impl Display for Assignment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let pos: Vec<String> = self.pos.iter().map(|v| v.to_string()).collect();
        let neg: Vec<String> = self.neg.iter().map(|v| format!("~{}", v)).collect();
        write!(f, "Assignment{{pos=[{}], neg=[{}]}}", pos.join(", "), neg.join(", "))
    }
}
