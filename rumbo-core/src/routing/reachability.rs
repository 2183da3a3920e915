use std::collections::VecDeque;

use fixedbitset::FixedBitSet;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;

use crate::model::VenueGraph;

/// Breadth-first reachability test between two graph nodes.
///
/// Any directed path counts; segment weights are ignored. Routing a
/// node to itself is a no-op and reports `false`, matching
/// [`shortest_route`](crate::routing::shortest_route).
#[must_use]
pub fn can_route(graph: &VenueGraph, start: NodeIndex, target: NodeIndex) -> bool {
    if start == target {
        return false;
    }

    let mut visited = FixedBitSet::with_capacity(graph.graph.node_count());
    let mut queue = VecDeque::new();
    visited.insert(start.index());
    queue.push_back(start);

    while let Some(node) = queue.pop_front() {
        for edge in graph.graph.edges(node) {
            let next = edge.target();
            if next == target {
                return true;
            }
            if !visited.put(next.index()) {
                queue.push_back(next);
            }
        }
    }

    false
}
