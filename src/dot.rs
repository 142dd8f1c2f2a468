//! BDD to DOT (Graphviz) conversion.
//!
//! Renders the [`internal_nodes`] export list as a Graphviz graph: terminal
//! nodes as squares at the sink rank, inner nodes as circles grouped per
//! variable level, solid edges for high (then) branches and dashed edges for
//! low (else) branches.
//!
//! ```
//! use bdd_kernel::{BddFactory, Formula};
//!
//! let mut factory = BddFactory::new(1000, 1000);
//! factory.set_number_of_vars(2).unwrap();
//! let f = factory
//!     .build(&Formula::and([Formula::variable("A"), Formula::variable("B")]))
//!     .unwrap();
//! let dot = factory.to_dot(&f).unwrap();
//! // Render with: dot -Tpng output.dot -o output.png
//! assert!(dot.starts_with("graph {"));
//! ```
//!
//! [`internal_nodes`]: BddFactory::internal_nodes

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::factory::{Bdd, BddFactory};
use crate::node::NodeId;

impl BddFactory {
    /// Render the diagram as a DOT graph.
    pub fn to_dot(&self, bdd: &Bdd) -> Result<String, std::fmt::Error> {
        let nodes = self.internal_nodes(bdd);

        let mut dot = String::new();
        writeln!(dot, "graph {{")?;
        writeln!(dot, "node [shape=circle, fixedsize=true];")?;

        writeln!(dot, "{{ rank=sink")?;
        writeln!(dot, "0 [shape=square, label=\"0\"];")?;
        writeln!(dot, "1 [shape=square, label=\"1\"];")?;
        writeln!(dot, "}}")?;

        // Group nodes per variable label so each level shares a rank.
        let mut levels: BTreeMap<&str, Vec<NodeId>> = BTreeMap::new();
        for node in &nodes {
            levels.entry(&node.label).or_default().push(node.id);
        }
        for (label, ids) in &levels {
            writeln!(dot, "{{ rank=same")?;
            for id in ids {
                writeln!(dot, "{} [label=\"{}\"];", id.raw(), label)?;
            }
            writeln!(dot, "}}")?;
        }

        for node in &nodes {
            writeln!(dot, "{} -- {} [style=solid];", node.id.raw(), node.high.raw())?;
            writeln!(dot, "{} -- {} [style=dashed];", node.id.raw(), node.low.raw())?;
        }

        writeln!(dot, "{{ rank=source")?;
        writeln!(dot, "root [shape=rect, label=\"{}\"];", bdd.index())?;
        writeln!(dot, "}}")?;
        writeln!(dot, "root -- {};", bdd.index().raw())?;

        writeln!(dot, "}}")?;
        Ok(dot)
    }
}
