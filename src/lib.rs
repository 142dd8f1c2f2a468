//! # bdd-kernel: Binary Decision Diagrams with a formula compiler
//!
//! **`bdd-kernel`** compiles Boolean formulas into **Binary Decision
//! Diagrams (BDDs)**, a canonical, compressed graph representation of
//! Boolean functions, and answers structural and semantic queries against
//! them: satisfiability, model enumeration and counting, restriction,
//! quantification, CNF/DNF extraction.
//!
//! ## What is a BDD?
//!
//! A BDD represents a Boolean function as a directed acyclic graph over a
//! fixed variable order. It is **canonical**: under a given order, every
//! function has exactly one reduced diagram, so semantic equivalence checks
//! reduce to comparing root indices.
//!
//! ## Key pieces
//!
//! - **Hash-consed node table**: every distinct `(variable, low, high)`
//!   triple is stored exactly once ([`table`]); unreferenced nodes are
//!   reclaimed by a mark-and-sweep collector ([`gc`]) driven by an explicit
//!   reference-counting protocol.
//! - **Memoized apply engine**: all Boolean connectives run through one
//!   cached cofactor recursion ([`apply`], [`cache`]).
//! - **Query engine**: model extraction and enumeration, model/path
//!   counting, support and profiles ([`sat`]).
//! - **Formula compiler**: walks a [`Formula`] tree and builds the diagram
//!   bottom-up, owning the variable-to-index mapping ([`factory`]).
//!
//! ## Basic usage
//!
//! ```
//! use bdd_kernel::{BddFactory, Formula};
//!
//! // 1. Initialize the factory and declare the variable space.
//! let mut factory = BddFactory::new(10_000, 10_000);
//! factory.set_number_of_vars(3).unwrap();
//!
//! // 2. Compile a formula: (A | B) & ~C
//! let f = factory
//!     .build(&Formula::and([
//!         Formula::or([Formula::variable("A"), Formula::variable("B")]),
//!         Formula::not(Formula::variable("C")),
//!     ]))
//!     .unwrap();
//!
//! // 3. Query it.
//! assert!(!factory.is_contradiction(&f));
//! assert_eq!(factory.model_count(&f), 3u32.into());
//! let model = factory.model(&f).unwrap();
//! assert!(model.evaluate_literal(&bdd_kernel::Variable::new("C").neg()));
//!
//! // 4. Round-trip through a normal form: the DNF compiles back to f.
//! let dnf = factory.dnf(&f);
//! assert_eq!(factory.build(&dnf).unwrap(), f);
//! ```
//!
//! One factory serves one thread; independent factories share nothing and
//! may run on separate threads. Handles are only meaningful with the factory
//! that created them.

pub mod apply;
pub mod assignment;
pub mod cache;
pub mod dot;
pub mod error;
pub mod factory;
pub mod formula;
pub mod gc;
pub mod kernel;
pub mod node;
pub mod sat;
pub mod table;
pub mod utils;

pub use crate::assignment::Assignment;
pub use crate::cache::{Op, OpCache, OpKey};
pub use crate::error::BddError;
pub use crate::factory::{Bdd, BddFactory, InternalNode};
pub use crate::formula::{Formula, Literal, PbComparator, PbConstraint, Variable};
pub use crate::kernel::{Kernel, KernelStats, MAX_VAR};
pub use crate::node::{Node, NodeId};
pub use crate::table::NodeTable;
