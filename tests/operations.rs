//! End-to-end tests of the factory operations: restriction, quantification,
//! model extraction, counting, support and profiles, all against one shared
//! set of small formulas over the variables A, B, C.

use std::collections::{BTreeMap, BTreeSet};

use num_bigint::BigUint;
use test_log::test;

use bdd_kernel::{Assignment, Bdd, BddFactory, Formula, Literal, Variable};

fn v(name: &str) -> Variable {
    Variable::new(name)
}

fn lit(name: &str, phase: bool) -> Literal {
    Literal::new(v(name), phase)
}

fn assignment(literals: &[(&str, bool)]) -> Assignment {
    Assignment::from_literals(literals.iter().map(|&(name, phase)| lit(name, phase)))
}

fn big(n: u64) -> BigUint {
    BigUint::from(n)
}

/// All fixture formulas are built on one factory, fixing the variable order
/// A < B < C in first-seen order.
struct Fixture {
    factory: BddFactory,
    verum: Bdd,
    falsum: Bdd,
    pos_lit: Bdd,
    neg_lit: Bdd,
    implication: Bdd,
    equivalence: Bdd,
    disjunction: Bdd,
    conjunction: Bdd,
}

impl Fixture {
    fn new() -> Self {
        let mut factory = BddFactory::new(1000, 1000);
        factory.set_number_of_vars(3).unwrap();
        let verum = factory.build(&Formula::verum()).unwrap();
        let falsum = factory.build(&Formula::falsum()).unwrap();
        let pos_lit = factory.build(&Formula::literal("A", true)).unwrap();
        let neg_lit = factory.build(&Formula::literal("A", false)).unwrap();
        // A => ~B
        let implication = factory
            .build(&Formula::implication(
                Formula::variable("A"),
                Formula::not(Formula::variable("B")),
            ))
            .unwrap();
        // A <=> ~B
        let equivalence = factory
            .build(&Formula::equivalence(
                Formula::variable("A"),
                Formula::not(Formula::variable("B")),
            ))
            .unwrap();
        // A | B | ~C
        let disjunction = factory
            .build(&Formula::or([
                Formula::variable("A"),
                Formula::variable("B"),
                Formula::literal("C", false),
            ]))
            .unwrap();
        // A & B & ~C
        let conjunction = factory
            .build(&Formula::and([
                Formula::variable("A"),
                Formula::variable("B"),
                Formula::literal("C", false),
            ]))
            .unwrap();
        Fixture {
            factory,
            verum,
            falsum,
            pos_lit,
            neg_lit,
            implication,
            equivalence,
            disjunction,
            conjunction,
        }
    }

    fn build(&mut self, formula: &Formula) -> Bdd {
        self.factory.build(formula).unwrap()
    }
}

#[test]
fn test_restriction() {
    let mut x = Fixture::new();
    let a = vec![lit("A", true)];
    let not_a = vec![lit("A", false)];
    let ab = vec![lit("A", true), lit("B", true)];

    for restriction in [&a, &not_a, &ab] {
        let restricted = x.factory.restrict(&x.verum, restriction).unwrap();
        assert_eq!(restricted, x.verum);
        let restricted = x.factory.restrict(&x.falsum, restriction).unwrap();
        assert_eq!(restricted, x.falsum);
    }

    assert_eq!(x.factory.restrict(&x.pos_lit, &a).unwrap(), x.verum);
    assert_eq!(x.factory.restrict(&x.pos_lit, &not_a).unwrap(), x.falsum);
    assert_eq!(x.factory.restrict(&x.pos_lit, &ab).unwrap(), x.verum);
    assert_eq!(x.factory.restrict(&x.neg_lit, &a).unwrap(), x.falsum);
    assert_eq!(x.factory.restrict(&x.neg_lit, &not_a).unwrap(), x.verum);
    assert_eq!(x.factory.restrict(&x.neg_lit, &ab).unwrap(), x.falsum);

    let not_b = x.build(&Formula::literal("B", false));
    assert_eq!(x.factory.restrict(&x.implication, &a).unwrap(), not_b);
    assert_eq!(x.factory.restrict(&x.implication, &not_a).unwrap(), x.verum);
    assert_eq!(x.factory.restrict(&x.implication, &ab).unwrap(), x.falsum);

    let b = x.build(&Formula::literal("B", true));
    assert_eq!(x.factory.restrict(&x.equivalence, &a).unwrap(), not_b);
    assert_eq!(x.factory.restrict(&x.equivalence, &not_a).unwrap(), b);
    assert_eq!(x.factory.restrict(&x.equivalence, &ab).unwrap(), x.falsum);

    let b_or_not_c = x.build(&Formula::or([
        Formula::variable("B"),
        Formula::literal("C", false),
    ]));
    assert_eq!(x.factory.restrict(&x.disjunction, &a).unwrap(), x.verum);
    assert_eq!(x.factory.restrict(&x.disjunction, &not_a).unwrap(), b_or_not_c);
    assert_eq!(x.factory.restrict(&x.disjunction, &ab).unwrap(), x.verum);

    let b_and_not_c = x.build(&Formula::and([
        Formula::variable("B"),
        Formula::literal("C", false),
    ]));
    let not_c = x.build(&Formula::literal("C", false));
    assert_eq!(x.factory.restrict(&x.conjunction, &a).unwrap(), b_and_not_c);
    assert_eq!(x.factory.restrict(&x.conjunction, &not_a).unwrap(), x.falsum);
    assert_eq!(x.factory.restrict(&x.conjunction, &ab).unwrap(), not_c);
}

#[test]
fn test_existential_quantification() {
    let mut x = Fixture::new();
    let a = vec![v("A")];
    let ab = vec![v("A"), v("B")];

    assert_eq!(x.factory.exists(&x.verum, &a).unwrap(), x.verum);
    assert_eq!(x.factory.exists(&x.verum, &ab).unwrap(), x.verum);
    assert_eq!(x.factory.exists(&x.falsum, &a).unwrap(), x.falsum);
    assert_eq!(x.factory.exists(&x.falsum, &ab).unwrap(), x.falsum);
    assert_eq!(x.factory.exists(&x.pos_lit, &a).unwrap(), x.verum);
    assert_eq!(x.factory.exists(&x.pos_lit, &ab).unwrap(), x.verum);
    assert_eq!(x.factory.exists(&x.neg_lit, &a).unwrap(), x.verum);
    assert_eq!(x.factory.exists(&x.neg_lit, &ab).unwrap(), x.verum);
    assert_eq!(x.factory.exists(&x.implication, &a).unwrap(), x.verum);
    assert_eq!(x.factory.exists(&x.implication, &ab).unwrap(), x.verum);
    assert_eq!(x.factory.exists(&x.equivalence, &a).unwrap(), x.verum);
    assert_eq!(x.factory.exists(&x.equivalence, &ab).unwrap(), x.verum);
    assert_eq!(x.factory.exists(&x.disjunction, &a).unwrap(), x.verum);
    assert_eq!(x.factory.exists(&x.disjunction, &ab).unwrap(), x.verum);

    let b_and_not_c = x.build(&Formula::and([
        Formula::variable("B"),
        Formula::literal("C", false),
    ]));
    let not_c = x.build(&Formula::literal("C", false));
    assert_eq!(x.factory.exists(&x.conjunction, &a).unwrap(), b_and_not_c);
    assert_eq!(x.factory.exists(&x.conjunction, &ab).unwrap(), not_c);
}

#[test]
fn test_universal_quantification() {
    let mut x = Fixture::new();
    let a = vec![v("A")];
    let ab = vec![v("A"), v("B")];

    assert_eq!(x.factory.forall(&x.verum, &a).unwrap(), x.verum);
    assert_eq!(x.factory.forall(&x.verum, &ab).unwrap(), x.verum);
    assert_eq!(x.factory.forall(&x.falsum, &a).unwrap(), x.falsum);
    assert_eq!(x.factory.forall(&x.falsum, &ab).unwrap(), x.falsum);
    assert_eq!(x.factory.forall(&x.pos_lit, &a).unwrap(), x.falsum);
    assert_eq!(x.factory.forall(&x.pos_lit, &ab).unwrap(), x.falsum);
    assert_eq!(x.factory.forall(&x.neg_lit, &a).unwrap(), x.falsum);
    assert_eq!(x.factory.forall(&x.neg_lit, &ab).unwrap(), x.falsum);

    let not_b = x.build(&Formula::literal("B", false));
    assert_eq!(x.factory.forall(&x.implication, &a).unwrap(), not_b);
    assert_eq!(x.factory.forall(&x.implication, &ab).unwrap(), x.falsum);
    assert_eq!(x.factory.forall(&x.equivalence, &a).unwrap(), x.falsum);
    assert_eq!(x.factory.forall(&x.equivalence, &ab).unwrap(), x.falsum);

    let b_or_not_c = x.build(&Formula::or([
        Formula::variable("B"),
        Formula::literal("C", false),
    ]));
    let not_c = x.build(&Formula::literal("C", false));
    assert_eq!(x.factory.forall(&x.disjunction, &a).unwrap(), b_or_not_c);
    assert_eq!(x.factory.forall(&x.disjunction, &ab).unwrap(), not_c);
    assert_eq!(x.factory.forall(&x.conjunction, &a).unwrap(), x.falsum);
    assert_eq!(x.factory.forall(&x.conjunction, &ab).unwrap(), x.falsum);
}

#[test]
fn test_model() {
    let x = Fixture::new();
    assert_eq!(x.factory.model(&x.verum), Some(Assignment::new()));
    assert_eq!(x.factory.model(&x.falsum), None);
    assert_eq!(x.factory.model(&x.pos_lit), Some(assignment(&[("A", true)])));
    assert_eq!(x.factory.model(&x.neg_lit), Some(assignment(&[("A", false)])));
    assert_eq!(x.factory.model(&x.implication), Some(assignment(&[("A", false)])));
    assert_eq!(
        x.factory.model(&x.equivalence),
        Some(assignment(&[("A", false), ("B", true)]))
    );
    assert_eq!(
        x.factory.model(&x.disjunction),
        Some(assignment(&[("A", false), ("B", false), ("C", false)]))
    );
    assert_eq!(
        x.factory.model(&x.conjunction),
        Some(assignment(&[("A", true), ("B", true), ("C", false)]))
    );
}

#[test]
fn test_model_for_variables() {
    let mut x = Fixture::new();
    let a = vec![v("A")];
    let ab = vec![v("A"), v("B")];

    fn model(f: &mut BddFactory, bdd: &Bdd, default: bool, vars: &[Variable]) -> Option<Assignment> {
        f.model_for_variables(bdd, default, vars).unwrap()
    }

    assert_eq!(model(&mut x.factory, &x.verum, true, &a), Some(assignment(&[("A", true)])));
    assert_eq!(
        model(&mut x.factory, &x.verum, true, &ab),
        Some(assignment(&[("A", true), ("B", true)]))
    );
    assert_eq!(model(&mut x.factory, &x.verum, false, &a), Some(assignment(&[("A", false)])));
    assert_eq!(
        model(&mut x.factory, &x.verum, false, &ab),
        Some(assignment(&[("A", false), ("B", false)]))
    );

    for default in [true, false] {
        assert_eq!(model(&mut x.factory, &x.falsum, default, &a), None);
        assert_eq!(model(&mut x.factory, &x.falsum, default, &ab), None);
    }

    assert_eq!(model(&mut x.factory, &x.pos_lit, true, &a), Some(assignment(&[("A", true)])));
    assert_eq!(
        model(&mut x.factory, &x.pos_lit, true, &ab),
        Some(assignment(&[("A", true), ("B", true)]))
    );
    assert_eq!(model(&mut x.factory, &x.pos_lit, false, &a), Some(assignment(&[("A", true)])));
    assert_eq!(
        model(&mut x.factory, &x.pos_lit, false, &ab),
        Some(assignment(&[("A", true), ("B", false)]))
    );

    assert_eq!(model(&mut x.factory, &x.neg_lit, true, &a), Some(assignment(&[("A", false)])));
    assert_eq!(
        model(&mut x.factory, &x.neg_lit, true, &ab),
        Some(assignment(&[("A", false), ("B", true)]))
    );

    assert_eq!(
        model(&mut x.factory, &x.implication, true, &ab),
        Some(assignment(&[("A", false), ("B", true)]))
    );
    assert_eq!(
        model(&mut x.factory, &x.implication, false, &ab),
        Some(assignment(&[("A", false), ("B", false)]))
    );

    // The equivalence's chosen path covers both A and B, so the default
    // never applies.
    for default in [true, false] {
        assert_eq!(
            model(&mut x.factory, &x.equivalence, default, &a),
            Some(assignment(&[("A", false), ("B", true)]))
        );
        assert_eq!(
            model(&mut x.factory, &x.equivalence, default, &ab),
            Some(assignment(&[("A", false), ("B", true)]))
        );
        assert_eq!(
            model(&mut x.factory, &x.disjunction, default, &a),
            Some(assignment(&[("A", false), ("B", false), ("C", false)]))
        );
        assert_eq!(
            model(&mut x.factory, &x.conjunction, default, &ab),
            Some(assignment(&[("A", true), ("B", true), ("C", false)]))
        );
    }
}

#[test]
fn test_full_model() {
    let x = Fixture::new();
    assert_eq!(
        x.factory.full_model(&x.verum),
        Some(assignment(&[("A", false), ("B", false), ("C", false)]))
    );
    assert_eq!(x.factory.full_model(&x.falsum), None);
    assert_eq!(
        x.factory.full_model(&x.pos_lit),
        Some(assignment(&[("A", true), ("B", false), ("C", false)]))
    );
    assert_eq!(
        x.factory.full_model(&x.neg_lit),
        Some(assignment(&[("A", false), ("B", false), ("C", false)]))
    );
    assert_eq!(
        x.factory.full_model(&x.implication),
        Some(assignment(&[("A", false), ("B", false), ("C", false)]))
    );
    assert_eq!(
        x.factory.full_model(&x.equivalence),
        Some(assignment(&[("A", false), ("B", true), ("C", false)]))
    );
    assert_eq!(
        x.factory.full_model(&x.disjunction),
        Some(assignment(&[("A", false), ("B", false), ("C", false)]))
    );
    assert_eq!(
        x.factory.full_model(&x.conjunction),
        Some(assignment(&[("A", true), ("B", true), ("C", false)]))
    );
}

#[test]
fn test_path_count() {
    let x = Fixture::new();
    assert_eq!(x.factory.path_count_one(&x.verum), big(1));
    assert_eq!(x.factory.path_count_zero(&x.verum), big(0));
    assert_eq!(x.factory.path_count_one(&x.falsum), big(0));
    assert_eq!(x.factory.path_count_zero(&x.falsum), big(1));
    assert_eq!(x.factory.path_count_one(&x.pos_lit), big(1));
    assert_eq!(x.factory.path_count_zero(&x.pos_lit), big(1));
    assert_eq!(x.factory.path_count_one(&x.neg_lit), big(1));
    assert_eq!(x.factory.path_count_zero(&x.neg_lit), big(1));
    assert_eq!(x.factory.path_count_one(&x.implication), big(2));
    assert_eq!(x.factory.path_count_zero(&x.implication), big(1));
    assert_eq!(x.factory.path_count_one(&x.equivalence), big(2));
    assert_eq!(x.factory.path_count_zero(&x.equivalence), big(2));
    assert_eq!(x.factory.path_count_one(&x.disjunction), big(3));
    assert_eq!(x.factory.path_count_zero(&x.disjunction), big(1));
    assert_eq!(x.factory.path_count_one(&x.conjunction), big(1));
    assert_eq!(x.factory.path_count_zero(&x.conjunction), big(3));
}

#[test]
fn test_support() {
    let x = Fixture::new();
    let set = |names: &[&str]| names.iter().map(|n| v(n)).collect::<BTreeSet<_>>();
    assert_eq!(x.factory.support(&x.verum), set(&[]));
    assert_eq!(x.factory.support(&x.falsum), set(&[]));
    assert_eq!(x.factory.support(&x.pos_lit), set(&["A"]));
    assert_eq!(x.factory.support(&x.neg_lit), set(&["A"]));
    assert_eq!(x.factory.support(&x.implication), set(&["A", "B"]));
    assert_eq!(x.factory.support(&x.equivalence), set(&["A", "B"]));
    assert_eq!(x.factory.support(&x.disjunction), set(&["A", "B", "C"]));
    assert_eq!(x.factory.support(&x.conjunction), set(&["A", "B", "C"]));
}

#[test]
fn test_node_count() {
    let x = Fixture::new();
    assert_eq!(x.factory.node_count(&x.verum), 0);
    assert_eq!(x.factory.node_count(&x.falsum), 0);
    assert_eq!(x.factory.node_count(&x.pos_lit), 1);
    assert_eq!(x.factory.node_count(&x.neg_lit), 1);
    assert_eq!(x.factory.node_count(&x.implication), 2);
    assert_eq!(x.factory.node_count(&x.equivalence), 3);
    assert_eq!(x.factory.node_count(&x.disjunction), 3);
    assert_eq!(x.factory.node_count(&x.conjunction), 3);
}

#[test]
fn test_variable_profile() {
    let x = Fixture::new();
    let profile = |entries: &[(&str, usize)]| {
        entries
            .iter()
            .map(|&(name, count)| (v(name), count))
            .collect::<BTreeMap<_, _>>()
    };
    assert_eq!(
        x.factory.variable_profile(&x.verum),
        profile(&[("A", 0), ("B", 0), ("C", 0)])
    );
    assert_eq!(
        x.factory.variable_profile(&x.falsum),
        profile(&[("A", 0), ("B", 0), ("C", 0)])
    );
    assert_eq!(
        x.factory.variable_profile(&x.pos_lit),
        profile(&[("A", 1), ("B", 0), ("C", 0)])
    );
    assert_eq!(
        x.factory.variable_profile(&x.neg_lit),
        profile(&[("A", 1), ("B", 0), ("C", 0)])
    );
    assert_eq!(
        x.factory.variable_profile(&x.implication),
        profile(&[("A", 1), ("B", 1), ("C", 0)])
    );
    assert_eq!(
        x.factory.variable_profile(&x.equivalence),
        profile(&[("A", 1), ("B", 2), ("C", 0)])
    );
    assert_eq!(
        x.factory.variable_profile(&x.disjunction),
        profile(&[("A", 1), ("B", 1), ("C", 1)])
    );
    assert_eq!(
        x.factory.variable_profile(&x.conjunction),
        profile(&[("A", 1), ("B", 1), ("C", 1)])
    );
}

#[test]
fn test_model_count() {
    let x = Fixture::new();
    assert_eq!(x.factory.model_count(&x.verum), big(8));
    assert_eq!(x.factory.model_count(&x.falsum), big(0));
    assert_eq!(x.factory.model_count(&x.pos_lit), big(4));
    assert_eq!(x.factory.model_count(&x.implication), big(6));
    assert_eq!(x.factory.model_count(&x.equivalence), big(4));
    assert_eq!(x.factory.model_count(&x.disjunction), big(7));
    assert_eq!(x.factory.model_count(&x.conjunction), big(1));
    assert_eq!(x.factory.model_count_unimportant(&x.implication, 1), big(3));
    assert_eq!(x.factory.model_count_unimportant(&x.verum, 3), big(1));
}

#[test]
fn test_cnf_round_trip() {
    let mut x = Fixture::new();
    for handle in [
        x.verum,
        x.falsum,
        x.pos_lit,
        x.neg_lit,
        x.implication,
        x.equivalence,
        x.disjunction,
        x.conjunction,
    ] {
        let cnf = x.factory.cnf(&handle);
        let rebuilt = x.factory.build(&cnf).unwrap();
        assert_eq!(rebuilt, handle, "CNF of {:?} did not round-trip", handle);
    }
    // Clause count matches the zero-path count.
    assert_eq!(
        x.factory.number_of_clauses_cnf(&x.conjunction),
        x.factory.path_count_zero(&x.conjunction)
    );
    match x.factory.cnf(&x.conjunction) {
        Formula::And(clauses) => assert_eq!(clauses.len(), 3),
        other => panic!("expected a conjunction of clauses, got {}", other),
    }
}

#[test]
fn test_dnf_round_trip() {
    let mut x = Fixture::new();
    for handle in [
        x.verum,
        x.falsum,
        x.pos_lit,
        x.neg_lit,
        x.implication,
        x.equivalence,
        x.disjunction,
        x.conjunction,
    ] {
        let dnf = x.factory.dnf(&handle);
        let rebuilt = x.factory.build(&dnf).unwrap();
        assert_eq!(rebuilt, handle, "DNF of {:?} did not round-trip", handle);
    }
    assert_eq!(x.factory.dnf(&x.falsum), Formula::Falsum);
}
