//! The Boolean formula tree accepted by the compiler.
//!
//! This is the crate's input boundary: a plain sum type over constants,
//! literals, negation, implication, equivalence and n-ary conjunction /
//! disjunction. Operand order inside n-ary operators is preserved exactly as
//! given. The tree also carries pseudo-Boolean constraints so that callers
//! can pass formulas around before normalization, but the BDD compiler
//! rejects them: encode them into CNF first.

use std::fmt::{Display, Formatter};

use crate::assignment::Assignment;

/// A named Boolean variable. Ordered and hashable so it can key the
/// variable-index mapping and live in sorted sets.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Variable(String);

impl Variable {
    pub fn new(name: impl Into<String>) -> Self {
        Variable(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// The positive literal of this variable.
    pub fn pos(&self) -> Literal {
        Literal::new(self.clone(), true)
    }

    /// The negative literal of this variable.
    pub fn neg(&self) -> Literal {
        Literal::new(self.clone(), false)
    }
}

impl From<&str> for Variable {
    fn from(name: &str) -> Self {
        Variable::new(name)
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A variable with a polarity.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Literal {
    variable: Variable,
    phase: bool,
}

impl Literal {
    pub fn new(variable: Variable, phase: bool) -> Self {
        Literal { variable, phase }
    }

    pub fn variable(&self) -> &Variable {
        &self.variable
    }

    pub fn phase(&self) -> bool {
        self.phase
    }

    pub fn negate(&self) -> Literal {
        Literal::new(self.variable.clone(), !self.phase)
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.phase {
            write!(f, "{}", self.variable)
        } else {
            write!(f, "~{}", self.variable)
        }
    }
}

/// Comparator of a pseudo-Boolean constraint.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PbComparator {
    Le,
    Lt,
    Ge,
    Gt,
    Eq,
}

/// A pseudo-Boolean constraint `c₁·l₁ + … + cₙ·lₙ ⋈ rhs`.
///
/// The compiler does not support these; they exist so a formula tree can
/// carry them up to the point where the caller normalizes them away.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PbConstraint {
    pub coefficients: Vec<i64>,
    pub literals: Vec<Literal>,
    pub comparator: PbComparator,
    pub rhs: i64,
}

impl PbConstraint {
    pub fn evaluate(&self, assignment: &Assignment) -> bool {
        let sum: i64 = self
            .coefficients
            .iter()
            .zip(&self.literals)
            .filter(|(_, lit)| assignment.evaluate_literal(lit))
            .map(|(&c, _)| c)
            .sum();
        match self.comparator {
            PbComparator::Le => sum <= self.rhs,
            PbComparator::Lt => sum < self.rhs,
            PbComparator::Ge => sum >= self.rhs,
            PbComparator::Gt => sum > self.rhs,
            PbComparator::Eq => sum == self.rhs,
        }
    }
}

/// A Boolean formula.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Formula {
    Falsum,
    Verum,
    Literal(Literal),
    Not(Box<Formula>),
    Implication(Box<Formula>, Box<Formula>),
    Equivalence(Box<Formula>, Box<Formula>),
    And(Vec<Formula>),
    Or(Vec<Formula>),
    Pbc(PbConstraint),
}

impl Formula {
    pub fn verum() -> Formula {
        Formula::Verum
    }

    pub fn falsum() -> Formula {
        Formula::Falsum
    }

    /// The positive literal of the named variable.
    pub fn variable(name: &str) -> Formula {
        Formula::Literal(Variable::new(name).pos())
    }

    pub fn literal(name: &str, phase: bool) -> Formula {
        Formula::Literal(Literal::new(Variable::new(name), phase))
    }

    pub fn not(operand: Formula) -> Formula {
        Formula::Not(Box::new(operand))
    }

    pub fn implication(left: Formula, right: Formula) -> Formula {
        Formula::Implication(Box::new(left), Box::new(right))
    }

    pub fn equivalence(left: Formula, right: Formula) -> Formula {
        Formula::Equivalence(Box::new(left), Box::new(right))
    }

    pub fn and(operands: impl IntoIterator<Item = Formula>) -> Formula {
        Formula::And(operands.into_iter().collect())
    }

    pub fn or(operands: impl IntoIterator<Item = Formula>) -> Formula {
        Formula::Or(operands.into_iter().collect())
    }

    /// Evaluate under an assignment. Unassigned variables count as false,
    /// matching the assignment's literal semantics.
    pub fn evaluate(&self, assignment: &Assignment) -> bool {
        match self {
            Formula::Falsum => false,
            Formula::Verum => true,
            Formula::Literal(lit) => assignment.evaluate_literal(lit),
            Formula::Not(op) => !op.evaluate(assignment),
            Formula::Implication(l, r) => !l.evaluate(assignment) || r.evaluate(assignment),
            Formula::Equivalence(l, r) => l.evaluate(assignment) == r.evaluate(assignment),
            Formula::And(ops) => ops.iter().all(|op| op.evaluate(assignment)),
            Formula::Or(ops) => ops.iter().any(|op| op.evaluate(assignment)),
            Formula::Pbc(pbc) => pbc.evaluate(assignment),
        }
    }
}

impl Display for Formula {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        fn join(f: &mut Formatter<'_>, ops: &[Formula], sep: &str, empty: &str) -> std::fmt::Result {
            if ops.is_empty() {
                return write!(f, "{}", empty);
            }
            for (i, op) in ops.iter().enumerate() {
                if i > 0 {
                    write!(f, "{}", sep)?;
                }
                match op {
                    Formula::Literal(_) | Formula::Verum | Formula::Falsum | Formula::Not(_) => {
                        write!(f, "{}", op)?
                    }
                    _ => write!(f, "({})", op)?,
                }
            }
            Ok(())
        }

        match self {
            Formula::Falsum => write!(f, "$false"),
            Formula::Verum => write!(f, "$true"),
            Formula::Literal(lit) => write!(f, "{}", lit),
            Formula::Not(op) => match op.as_ref() {
                Formula::Literal(_) | Formula::Verum | Formula::Falsum => write!(f, "~{}", op),
                _ => write!(f, "~({})", op),
            },
            Formula::Implication(l, r) => write!(f, "{} => {}", l, r),
            Formula::Equivalence(l, r) => write!(f, "{} <=> {}", l, r),
            Formula::And(ops) => join(f, ops, " & ", "$true"),
            Formula::Or(ops) => join(f, ops, " | ", "$false"),
            Formula::Pbc(pbc) => {
                for (i, (c, lit)) in pbc.coefficients.iter().zip(&pbc.literals).enumerate() {
                    if i > 0 {
                        write!(f, " + ")?;
                    }
                    write!(f, "{}*{}", c, lit)?;
                }
                let cmp = match pbc.comparator {
                    PbComparator::Le => "<=",
                    PbComparator::Lt => "<",
                    PbComparator::Ge => ">=",
                    PbComparator::Gt => ">",
                    PbComparator::Eq => "=",
                };
                write!(f, " {} {}", cmp, pbc.rhs)
            }
        }
    }
}
