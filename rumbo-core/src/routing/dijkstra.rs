use std::{cmp::Ordering, collections::BinaryHeap};

use hashbrown::HashMap;
use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;

use super::route::Route;
use crate::model::VenueGraph;

#[derive(Copy, Clone, PartialEq)]
struct State {
    cost: f64,
    node: NodeIndex,
}

// Costs are finite segment weights, so total_cmp yields a total order
impl Eq for State {}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap by cost (reversed from standard Rust BinaryHeap)
        other.cost.total_cmp(&self.cost)
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Dijkstra's algorithm over segment travel times.
///
/// Returns the cheapest sequence of segments from `start` to `target`,
/// or `None` when the target is unreachable. Routing a node to itself
/// is a no-op and also returns `None`.
#[must_use]
pub fn shortest_route(graph: &VenueGraph, start: NodeIndex, target: NodeIndex) -> Option<Route> {
    if start == target {
        return None;
    }

    let mut distances: HashMap<NodeIndex, f64> = HashMap::new();
    let mut predecessor: HashMap<NodeIndex, EdgeIndex> = HashMap::new();
    let mut heap = BinaryHeap::new();

    heap.push(State {
        cost: 0.0,
        node: start,
    });
    distances.insert(start, 0.0);

    while let Some(State { cost, node }) = heap.pop() {
        if node == target {
            break;
        }

        // Skip if we've found a better path
        if let Some(&best) = distances.get(&node) {
            if cost > best {
                continue;
            }
        }

        for edge in graph.graph.edges(node) {
            let next = edge.target();
            let next_cost = cost + edge.weight().weight;

            match distances.entry(next) {
                hashbrown::hash_map::Entry::Vacant(entry) => {
                    entry.insert(next_cost);
                    predecessor.insert(next, edge.id());
                    heap.push(State {
                        cost: next_cost,
                        node: next,
                    });
                }
                hashbrown::hash_map::Entry::Occupied(mut entry) => {
                    if next_cost < *entry.get() {
                        *entry.get_mut() = next_cost;
                        predecessor.insert(next, edge.id());
                        heap.push(State {
                            cost: next_cost,
                            node: next,
                        });
                    }
                }
            }
        }
    }

    if !predecessor.contains_key(&target) {
        return None;
    }

    // Walk the predecessor chain back from the target
    let mut legs = Vec::new();
    let mut current = target;
    while current != start {
        let edge = *predecessor.get(&current)?;
        legs.push(graph.graph.edge_weight(edge)?.clone());
        current = graph.graph.edge_endpoints(edge)?.0;
    }
    legs.reverse();

    Some(Route::new(legs))
}
