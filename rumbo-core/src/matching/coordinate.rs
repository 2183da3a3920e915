//! Coordinate matching - nearest surveyed waypoint wins

use geo::{Distance, Euclidean, Point};
use petgraph::graph::NodeIndex;

use super::PositionMatch;
use crate::model::VenueGraph;

/// Stateless matcher for venues with absolute positioning.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoordinateMatcher;

impl CoordinateMatcher {
    /// Match a fix against every surveyed waypoint in the graph.
    #[must_use]
    pub fn match_point(graph: &VenueGraph, point: Point<f64>) -> Option<PositionMatch> {
        let (node, distance) = graph.nearest_waypoint(point)?;
        let waypoint = graph.waypoint(node)?;
        Some(PositionMatch {
            node,
            waypoint: waypoint.id.clone(),
            distance,
            position: Some(point),
        })
    }

    /// Match a fix against an explicit candidate list.
    ///
    /// Candidates are scanned in the given order and a later candidate
    /// wins only when strictly closer, so equidistant candidates
    /// resolve to the earliest one. Unsurveyed candidates are skipped.
    #[must_use]
    pub fn match_among(
        graph: &VenueGraph,
        point: Point<f64>,
        candidates: &[NodeIndex],
    ) -> Option<PositionMatch> {
        let mut best: Option<(NodeIndex, f64)> = None;
        for &node in candidates {
            let Some(waypoint) = graph.waypoint(node) else {
                continue;
            };
            let Some(geometry) = waypoint.geometry else {
                continue;
            };
            let distance = Euclidean.distance(point, geometry);
            match best {
                Some((_, closest)) if distance >= closest => {}
                _ => best = Some((node, distance)),
            }
        }
        let (node, distance) = best?;
        let waypoint = graph.waypoint(node)?;
        Some(PositionMatch {
            node,
            waypoint: waypoint.id.clone(),
            distance,
            position: Some(point),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{VenueGraphBuilder, Waypoint};

    fn graph(points: &[(&str, Option<(f64, f64)>)]) -> VenueGraph {
        let mut builder = VenueGraphBuilder::new();
        for (id, coords) in points {
            builder.add_waypoint(Waypoint {
                id: (*id).to_string(),
                name: (*id).to_string(),
                geometry: coords.map(|(x, y)| Point::new(x, y)),
                beacon: None,
                accuracy: crate::DEFAULT_WAYPOINT_ACCURACY,
                rssi: crate::DEFAULT_WAYPOINT_RSSI,
                kinds: Vec::new(),
            });
        }
        builder.build().unwrap()
    }

    #[test]
    fn matches_nearest_waypoint() {
        let graph = graph(&[
            ("a", Some((0.0, 0.0))),
            ("b", Some((4.0, 0.0))),
            ("c", Some((20.0, 0.0))),
        ]);
        let matched = CoordinateMatcher::match_point(&graph, Point::new(3.0, 0.0)).unwrap();
        assert_eq!(matched.waypoint, "b");
        assert!((matched.distance - 1.0).abs() < 1e-9);
        assert_eq!(matched.position, Some(Point::new(3.0, 0.0)));
    }

    #[test]
    fn equidistant_candidates_resolve_to_the_first() {
        let graph = graph(&[("left", Some((-5.0, 0.0))), ("right", Some((5.0, 0.0)))]);
        let candidates = [graph.node("left").unwrap(), graph.node("right").unwrap()];

        let matched =
            CoordinateMatcher::match_among(&graph, Point::new(0.0, 0.0), &candidates).unwrap();
        assert_eq!(matched.waypoint, "left");

        // Reversed candidate order flips the winner.
        let reversed = [candidates[1], candidates[0]];
        let matched =
            CoordinateMatcher::match_among(&graph, Point::new(0.0, 0.0), &reversed).unwrap();
        assert_eq!(matched.waypoint, "right");
    }

    #[test]
    fn unsurveyed_candidates_are_skipped() {
        let graph = graph(&[("blind", None), ("seen", Some((2.0, 0.0)))]);
        let candidates = [graph.node("blind").unwrap(), graph.node("seen").unwrap()];

        let matched =
            CoordinateMatcher::match_among(&graph, Point::new(0.0, 0.0), &candidates).unwrap();
        assert_eq!(matched.waypoint, "seen");
    }

    #[test]
    fn no_surveyed_waypoints_means_no_match() {
        let graph = graph(&[("blind", None)]);
        assert!(CoordinateMatcher::match_point(&graph, Point::new(0.0, 0.0)).is_none());
        let candidates = [graph.node("blind").unwrap()];
        assert!(CoordinateMatcher::match_among(&graph, Point::new(0.0, 0.0), &candidates).is_none());
    }
}
