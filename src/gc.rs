//! Mark-and-sweep reclamation over the node table.
//!
//! Reference counting (who is externally alive) lives in the table itself;
//! this module only answers reachability: everything transitively reachable
//! from a slot with a nonzero reference count, or from one of the transient
//! roots the engine passes in, survives. The rest is returned to the free
//! list and the bucket chains are rebuilt.

use log::debug;

use crate::node::{Node, NodeId};
use crate::table::NodeTable;
use crate::utils::MyHash;

/// Collect unreachable slots. `extra_roots` protects results the engine is
/// still holding on its recursion stack. Returns the number of reclaimed
/// slots. Terminals are never collected.
pub fn collect(table: &mut NodeTable, extra_roots: &[NodeId]) -> usize {
    // Mark phase: explicit worklist seeded from every referenced slot.
    let mut worklist: Vec<u32> = Vec::new();
    for (i, slot) in table.slots.iter().enumerate() {
        if slot.occupied && slot.refcount > 0 {
            worklist.push(i as u32);
        }
    }
    worklist.extend(extra_roots.iter().map(|r| r.raw()));

    while let Some(index) = worklist.pop() {
        let slot = &mut table.slots[index as usize];
        if !slot.occupied || slot.mark {
            continue;
        }
        slot.mark = true;
        if index >= 2 {
            let (low, high) = (slot.low, slot.high);
            worklist.push(low.raw());
            worklist.push(high.raw());
        }
    }

    // Sweep phase: rebuild bucket chains for survivors, free the rest.
    let free_before = table.free_count;
    table.buckets.fill(0);
    table.free_head = 0;
    table.free_count = 0;
    for i in (2..table.slots.len()).rev() {
        if table.slots[i].mark {
            table.slots[i].mark = false;
            let node = Node {
                var: table.slots[i].var,
                low: table.slots[i].low,
                high: table.slots[i].high,
            };
            let bucket = (node.hash() & table.bitmask) as usize;
            table.slots[i].next = table.buckets[bucket];
            table.buckets[bucket] = i as u32;
        } else {
            table.free_slot(i);
        }
    }
    table.slots[0].mark = false;
    table.slots[1].mark = false;

    let freed = table.free_count - free_before;
    debug!("sweep reclaimed {} slots, {} free", freed, table.free_count);
    freed
}
