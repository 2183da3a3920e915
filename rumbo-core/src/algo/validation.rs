//! Venue data integrity checks
//!
//! Run before publishing venue data. Checks full waypoint-to-waypoint
//! connectivity, the key routes travellers actually ask for (platform
//! to platform, platform to street and back) and segments that carry
//! no guidance at all.

use rayon::prelude::*;

use crate::WaypointId;
use crate::model::{Venue, VenueGraph};
use crate::routing::can_route;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// One problem found in the venue data.
#[derive(Debug, Clone)]
pub struct Finding {
    pub severity: Severity,
    pub message: String,
}

/// Outcome of a validation sweep.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub findings: Vec<Finding>,
}

impl ValidationReport {
    /// True when nothing error-grade was found; warnings may remain.
    #[must_use]
    pub fn passed(&self) -> bool {
        !self
            .findings
            .iter()
            .any(|finding| finding.severity == Severity::Error)
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.findings
            .iter()
            .filter(|finding| finding.severity == Severity::Error)
            .count()
    }

    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.findings
            .iter()
            .filter(|finding| finding.severity == Severity::Warning)
            .count()
    }
}

/// Full validation sweep over one venue.
#[must_use]
pub fn validate_venue(venue: &Venue) -> ValidationReport {
    let mut findings = check_connectivity(&venue.graph);
    findings.extend(check_key_routes(venue));
    findings.extend(check_silent_segments(&venue.graph));
    ValidationReport { findings }
}

/// Every ordered pair of waypoints must be mutually reachable.
/// Reported per unreachable pair so the data team can see exactly
/// where the graph tears.
#[must_use]
pub fn check_connectivity(graph: &VenueGraph) -> Vec<Finding> {
    if graph.is_connected() {
        return Vec::new();
    }
    let nodes: Vec<_> = graph.node_indices().collect();
    let mut unreachable: Vec<(WaypointId, WaypointId)> = nodes
        .par_iter()
        .flat_map_iter(|&from| {
            nodes
                .iter()
                .filter(move |&&to| to != from && !can_route(graph, from, to))
                .map(move |&to| (waypoint_id(graph, from), waypoint_id(graph, to)))
        })
        .collect();
    unreachable.sort();

    unreachable
        .into_iter()
        .map(|(from, to)| Finding {
            severity: Severity::Error,
            message: format!("no path from {from} to {to}"),
        })
        .collect()
}

/// Platforms and exits must reach each other in the directions a
/// traveller uses: between platforms, from any platform out to the
/// street, and from the street in to any platform.
#[must_use]
pub fn check_key_routes(venue: &Venue) -> Vec<Finding> {
    let graph = &venue.graph;
    let mut findings = Vec::new();

    let mut require = |from: &WaypointId, to: &WaypointId, label: String| {
        let (Some(from_node), Some(to_node)) = (graph.node(from), graph.node(to)) else {
            findings.push(Finding {
                severity: Severity::Error,
                message: format!("{label}: endpoint missing from the graph"),
            });
            return;
        };
        if !can_route(graph, from_node, to_node) {
            findings.push(Finding {
                severity: Severity::Error,
                message: format!("{label}: no route ({from} -> {to})"),
            });
        }
    };

    for platform in &venue.platforms {
        for other in &venue.platforms {
            if platform.name == other.name {
                continue;
            }
            require(
                &platform.exit,
                &other.entrance,
                format!("interchange {} -> {}", platform.name, other.name),
            );
        }
        for exit in &venue.exits {
            require(
                &platform.exit,
                &exit.exit,
                format!("leave {} via {}", platform.name, exit.name),
            );
            require(
                &exit.entrance,
                &platform.entrance,
                format!("enter via {} to {}", exit.name, platform.name),
            );
        }
    }

    findings
}

/// Segments with no authored guidance are legal but worth flagging;
/// a traveller crossing one hears nothing.
#[must_use]
pub fn check_silent_segments(graph: &VenueGraph) -> Vec<Finding> {
    graph
        .node_indices()
        .flat_map(|node| graph.segments_from(node))
        .filter(|segment| segment.instructions.is_empty())
        .map(|segment| Finding {
            severity: Severity::Warning,
            message: format!(
                "segment {} ({} -> {}) carries no instructions",
                segment.id, segment.source, segment.target
            ),
        })
        .collect()
}

fn waypoint_id(graph: &VenueGraph, node: petgraph::graph::NodeIndex) -> WaypointId {
    graph
        .waypoint(node)
        .map_or_else(|| format!("#{}", node.index()), |wp| wp.id.clone())
}
