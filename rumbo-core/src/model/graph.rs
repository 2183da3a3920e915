//! Venue graph construction and lookup structures

use geo::Point;
use hashbrown::HashMap;
use log::{debug, info, warn};
use petgraph::Direction;
use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use rstar::{AABB, PointDistance, RTree, RTreeObject};

use super::components::{BeaconId, PathSegment, Waypoint};
use crate::{Error, WaypointId};

/// Spatial index entry; `seq` preserves insertion order so that exact
/// distance ties resolve to the earliest-added waypoint.
#[derive(Debug, Clone)]
struct IndexedWaypoint {
    point: [f64; 2],
    node: NodeIndex,
    seq: usize,
}

impl RTreeObject for IndexedWaypoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for IndexedWaypoint {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

/// Immutable directed graph of one venue.
///
/// Construction goes through [`VenueGraphBuilder`]; once built, the
/// graph only answers queries and is safe to share behind an `Arc`.
#[derive(Debug)]
pub struct VenueGraph {
    pub graph: DiGraph<Waypoint, PathSegment>,
    id_index: HashMap<WaypointId, NodeIndex>,
    beacon_index: HashMap<BeaconId, NodeIndex>,
    spatial_index: RTree<IndexedWaypoint>,
}

impl VenueGraph {
    /// Node index for a waypoint id.
    #[must_use]
    pub fn node(&self, id: &str) -> Option<NodeIndex> {
        self.id_index.get(id).copied()
    }

    #[must_use]
    pub fn waypoint(&self, node: NodeIndex) -> Option<&Waypoint> {
        self.graph.node_weight(node)
    }

    #[must_use]
    pub fn waypoint_by_id(&self, id: &str) -> Option<&Waypoint> {
        self.node(id).and_then(|node| self.graph.node_weight(node))
    }

    /// Node carrying the given beacon identity.
    #[must_use]
    pub fn node_by_beacon(&self, beacon: BeaconId) -> Option<NodeIndex> {
        self.beacon_index.get(&beacon).copied()
    }

    /// Outgoing segments of a node.
    pub fn segments_from(&self, node: NodeIndex) -> impl Iterator<Item = &PathSegment> {
        self.graph
            .edges_directed(node, Direction::Outgoing)
            .map(|edge| edge.weight())
    }

    /// The directed segment `from -> to`, when one exists.
    #[must_use]
    pub fn segment_between(&self, from: NodeIndex, to: NodeIndex) -> Option<&PathSegment> {
        self.graph
            .find_edge(from, to)
            .and_then(|edge| self.graph.edge_weight(edge))
    }

    /// Nearest surveyed waypoint to `point` and its distance in meters.
    ///
    /// Exact ties resolve to the waypoint added first, so repeated
    /// queries from the same position are stable.
    #[must_use]
    pub fn nearest_waypoint(&self, point: Point<f64>) -> Option<(NodeIndex, f64)> {
        let query = [point.x(), point.y()];
        let mut candidates = self.spatial_index.nearest_neighbor_iter_with_distance_2(&query);
        let (first, best) = candidates.next()?;
        let mut nearest = first;
        for (candidate, d2) in candidates {
            if d2 > best {
                break;
            }
            if candidate.seq < nearest.seq {
                nearest = candidate;
            }
        }
        Some((nearest.node, best.sqrt()))
    }

    /// Whether every waypoint can reach every other waypoint.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        kosaraju_scc(&self.graph).len() <= 1
    }

    #[must_use]
    pub fn waypoint_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn waypoints(&self) -> impl Iterator<Item = &Waypoint> {
        self.graph.node_weights()
    }

    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> {
        self.graph.node_indices()
    }
}

/// Accumulates waypoints and segments, then validates and freezes them
/// into a [`VenueGraph`].
#[derive(Debug, Default)]
pub struct VenueGraphBuilder {
    waypoints: Vec<Waypoint>,
    segments: Vec<PathSegment>,
    segment_index: HashMap<String, usize>,
}

impl VenueGraphBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_waypoint(&mut self, waypoint: Waypoint) -> &mut Self {
        self.waypoints.push(waypoint);
        self
    }

    /// Adds a segment. Re-adding an id replaces the earlier segment,
    /// so later data revisions win.
    pub fn add_segment(&mut self, segment: PathSegment) -> &mut Self {
        match self.segment_index.get(&segment.id) {
            Some(&position) => {
                debug!("segment {} redefined, replacing earlier version", segment.id);
                self.segments[position] = segment;
            }
            None => {
                self.segment_index.insert(segment.id.clone(), self.segments.len());
                self.segments.push(segment);
            }
        }
        self
    }

    /// Validates the accumulated data and builds the graph.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateWaypoint` for repeated waypoint ids,
    /// `DanglingSegment` for segments referencing unknown waypoints,
    /// `InvalidData` for self-loops or negative/non-finite weights and
    /// `InvalidInstructionSet` when a segment breaks the
    /// `starting_only` exclusivity rule.
    pub fn build(self) -> Result<VenueGraph, Error> {
        let mut graph = DiGraph::with_capacity(self.waypoints.len(), self.segments.len());
        let mut id_index: HashMap<WaypointId, NodeIndex> = HashMap::new();
        let mut beacon_index: HashMap<BeaconId, NodeIndex> = HashMap::new();
        let mut spatial = Vec::new();

        for (seq, waypoint) in self.waypoints.into_iter().enumerate() {
            let id = waypoint.id.clone();
            let beacon = waypoint.beacon;
            let geometry = waypoint.geometry;
            let node = graph.add_node(waypoint);

            match id_index.entry(id.clone()) {
                hashbrown::hash_map::Entry::Vacant(entry) => {
                    entry.insert(node);
                }
                hashbrown::hash_map::Entry::Occupied(_) => {
                    return Err(Error::DuplicateWaypoint(id));
                }
            }
            if let Some(beacon) = beacon {
                match beacon_index.entry(beacon) {
                    hashbrown::hash_map::Entry::Vacant(entry) => {
                        entry.insert(node);
                    }
                    hashbrown::hash_map::Entry::Occupied(entry) => {
                        warn!(
                            "beacon {beacon} is declared on several waypoints; keeping {:?}",
                            entry.get()
                        );
                    }
                }
            }
            if let Some(point) = geometry {
                spatial.push(IndexedWaypoint {
                    point: [point.x(), point.y()],
                    node,
                    seq,
                });
            }
        }

        for segment in self.segments {
            if segment.source == segment.target {
                return Err(Error::InvalidData(format!(
                    "segment {} is a self-loop on {}",
                    segment.id, segment.source
                )));
            }
            if !segment.weight.is_finite() || segment.weight < 0.0 {
                return Err(Error::InvalidData(format!(
                    "segment {} has a negative or non-finite weight",
                    segment.id
                )));
            }
            segment.instructions.validate(&segment.id)?;
            let source = *id_index
                .get(&segment.source)
                .ok_or_else(|| Error::DanglingSegment {
                    segment: segment.id.clone(),
                    waypoint: segment.source.clone(),
                })?;
            let target = *id_index
                .get(&segment.target)
                .ok_or_else(|| Error::DanglingSegment {
                    segment: segment.id.clone(),
                    waypoint: segment.target.clone(),
                })?;
            graph.add_edge(source, target, segment);
        }

        let spatial_index = RTree::bulk_load(spatial);

        info!(
            "venue graph built: {} waypoints, {} segments, {} surveyed positions",
            graph.node_count(),
            graph.edge_count(),
            spatial_index.size()
        );

        Ok(VenueGraph {
            graph,
            id_index,
            beacon_index,
            spatial_index,
        })
    }
}
