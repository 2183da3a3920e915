//! Route progress tracking
//!
//! A per-session state machine that consumes position matches and moves
//! a cursor along the planned route: refine in place, advance to the
//! next waypoint, skip ahead when sampling missed one, or fall off the
//! plan and ask for a recalculation.

use std::collections::VecDeque;
use std::sync::Arc;

use geo::{Distance, Euclidean, Point};
use log::debug;
use petgraph::graph::NodeIndex;

use super::bearing::bearing_change;
use super::config::EngineConfig;
use crate::WaypointId;
use crate::matching::{PositionMatch, Reading};
use crate::model::{PathSegment, VenueGraph};
use crate::routing::Route;

/// Where the session currently stands relative to the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressState {
    /// Walking the current segment towards its target.
    OnEdge,
    /// The final segment's target has been reached. Terminal.
    AtDestination,
    /// The last match fell off the plan; a new route is needed.
    Recalculating,
}

/// Outcome of feeding one position match to the tracker.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressUpdate {
    /// Same waypoint, same reading: only the bearing was refreshed.
    Unchanged,
    /// The match was outside the assignation limit; position stored
    /// for bearing purposes, cursor untouched.
    Noise { distance: f64 },
    /// The tracked waypoint matched again with fresh data.
    Refined,
    /// The cursor moved to the matched waypoint.
    Advanced {
        /// The leg that ends at the matched waypoint.
        completed: PathSegment,
        /// Legs dropped before `completed` because sampling missed
        /// their targets.
        skipped: usize,
        /// The completed leg's arrival text already fired on distance.
        arrival_already_given: bool,
        /// The matched waypoint is the session destination.
        arrived: bool,
    },
    /// A fresh plan was installed after falling off the previous one.
    Rerouted,
    /// The match contradicts the plan. Roles are swapped (head back to
    /// the last confirmed waypoint) and the caller must re-plan.
    OffRoute {
        from: WaypointId,
        back_to: WaypointId,
    },
}

/// Snapshot of the mutable tracking state, for logs and displays.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteState {
    pub state: ProgressState,
    pub current: WaypointId,
    pub destination: WaypointId,
    pub remaining_legs: usize,
    pub distance_to_target: Option<f64>,
    pub bearing: Option<f64>,
    pub mid_course_given: bool,
    pub arrival_given: bool,
    pub recalculated: bool,
}

pub struct RouteProgress {
    graph: Arc<VenueGraph>,
    config: EngineConfig,
    state: ProgressState,
    /// Remaining plan; the front leg is the one being walked.
    remaining: VecDeque<PathSegment>,
    current: NodeIndex,
    current_id: WaypointId,
    destination: NodeIndex,
    destination_id: WaypointId,
    /// Distance from the latest reading to the current leg's target.
    distance_to_target: Option<f64>,
    bearing: Option<f64>,
    last_position: Option<Point<f64>>,
    last_reading: Option<Reading>,
    mid_course_given: bool,
    arrival_given: bool,
    recalculated: bool,
    first_edge: bool,
    accepted_since_recalculation: u32,
}

impl RouteProgress {
    pub(crate) fn new(
        graph: Arc<VenueGraph>,
        config: EngineConfig,
        start: (NodeIndex, WaypointId),
        destination: (NodeIndex, WaypointId),
        route: Route,
    ) -> Self {
        let cooldown = config.recalculation_cooldown;
        let mut progress = Self {
            graph,
            config,
            state: ProgressState::OnEdge,
            remaining: route.into_legs().into(),
            current: start.0,
            current_id: start.1,
            destination: destination.0,
            destination_id: destination.1,
            distance_to_target: None,
            bearing: None,
            last_position: None,
            last_reading: None,
            mid_course_given: false,
            arrival_given: false,
            recalculated: false,
            first_edge: true,
            // allow an immediate recalculation on a fresh session
            accepted_since_recalculation: cooldown.saturating_add(1),
        };
        if progress.remaining.is_empty() {
            progress.state = ProgressState::AtDestination;
        }
        progress
    }

    #[must_use]
    pub fn state(&self) -> ProgressState {
        self.state
    }

    #[must_use]
    pub fn current_segment(&self) -> Option<&PathSegment> {
        self.remaining.front()
    }

    #[must_use]
    pub fn current_waypoint(&self) -> &WaypointId {
        &self.current_id
    }

    #[must_use]
    pub fn destination(&self) -> &WaypointId {
        &self.destination_id
    }

    #[must_use]
    pub fn remaining_legs(&self) -> usize {
        self.remaining.len()
    }

    #[must_use]
    pub fn distance_to_target(&self) -> Option<f64> {
        self.distance_to_target
    }

    /// Signed degrees between the direction of travel and the current
    /// leg's target; see [`bearing_change`].
    #[must_use]
    pub fn bearing(&self) -> Option<f64> {
        self.bearing
    }

    #[must_use]
    pub fn is_first_edge(&self) -> bool {
        self.first_edge
    }

    #[must_use]
    pub fn mid_course_given(&self) -> bool {
        self.mid_course_given
    }

    #[must_use]
    pub fn arrival_given(&self) -> bool {
        self.arrival_given
    }

    #[must_use]
    pub fn state_snapshot(&self) -> RouteState {
        RouteState {
            state: self.state,
            current: self.current_id.clone(),
            destination: self.destination_id.clone(),
            remaining_legs: self.remaining.len(),
            distance_to_target: self.distance_to_target,
            bearing: self.bearing,
            mid_course_given: self.mid_course_given,
            arrival_given: self.arrival_given,
            recalculated: self.recalculated,
        }
    }

    pub(crate) fn mark_mid_course_given(&mut self) {
        self.mid_course_given = true;
    }

    pub(crate) fn mark_arrival_given(&mut self) {
        self.arrival_given = true;
    }

    /// Reads and clears the recalculated flag; the generic
    /// re-orientation text is spoken once.
    pub(crate) fn take_recalculated(&mut self) -> bool {
        std::mem::take(&mut self.recalculated)
    }

    /// Feed one accepted position match into the state machine.
    pub fn observe(&mut self, matched: &PositionMatch, reading: &Reading) -> ProgressUpdate {
        if self.state == ProgressState::AtDestination {
            return ProgressUpdate::Unchanged;
        }

        // No new information: refresh the bearing estimate only.
        if matched.node == self.current && self.last_reading.as_ref() == Some(reading) {
            if let Some(position) = matched.position {
                self.estimate_bearing(position);
            }
            return ProgressUpdate::Unchanged;
        }

        self.accepted_since_recalculation = self.accepted_since_recalculation.saturating_add(1);
        self.update_position(matched, reading);

        if matched.distance > self.config.assignation_limit() {
            debug!(
                "match {} at {:.1} m exceeds assignation limit {:.1} m, treated as noise",
                matched.waypoint,
                matched.distance,
                self.config.assignation_limit()
            );
            return ProgressUpdate::Noise {
                distance: matched.distance,
            };
        }

        if self.state == ProgressState::Recalculating {
            // No active plan. Adopt the freshest acceptable match as
            // the origin and ask the caller to plan again.
            if matched.node == self.current {
                return ProgressUpdate::Refined;
            }
            self.current = matched.node;
            self.current_id = matched.waypoint.clone();
            return ProgressUpdate::OffRoute {
                from: matched.waypoint.clone(),
                back_to: self.destination_id.clone(),
            };
        }

        if matched.node == self.current {
            return ProgressUpdate::Refined;
        }

        // Planned target of the current leg?
        if self
            .remaining
            .front()
            .is_some_and(|leg| leg.target == matched.waypoint)
        {
            return self.advance(0);
        }

        // Further along the plan (sampling missed a waypoint)?
        if !self.config.strict_routing {
            if let Some(position) = self
                .remaining
                .iter()
                .position(|leg| leg.target == matched.waypoint)
            {
                return self.advance(position);
            }
        }

        if self.accepted_since_recalculation <= self.config.recalculation_cooldown {
            debug!(
                "off-plan match {} within recalculation cooldown, treated as noise",
                matched.waypoint
            );
            return ProgressUpdate::Noise {
                distance: matched.distance,
            };
        }

        // Off the plan: head back to the last confirmed waypoint.
        let back_to = self.current_id.clone();
        self.destination = self.current;
        self.destination_id = back_to.clone();
        self.current = matched.node;
        self.current_id = matched.waypoint.clone();
        self.state = ProgressState::Recalculating;
        self.recalculated = true;
        self.accepted_since_recalculation = 0;
        self.remaining.clear();
        self.reset_phase_flags();
        self.distance_to_target = None;
        debug!(
            "match {} contradicts the plan, recalculating back to {back_to}",
            self.current_id
        );
        ProgressUpdate::OffRoute {
            from: self.current_id.clone(),
            back_to,
        }
    }

    /// Replace the plan after an off-route swap. The tracker stays on
    /// its swapped current/destination pair; the new route starts at
    /// the current waypoint.
    pub(crate) fn install_recalculated(&mut self, route: Route) {
        self.remaining = route.into_legs().into();
        self.state = if self.remaining.is_empty() {
            ProgressState::AtDestination
        } else {
            ProgressState::OnEdge
        };
        self.first_edge = true;
        self.reset_phase_flags();
        self.refresh_distance();
    }

    fn advance(&mut self, skipped: usize) -> ProgressUpdate {
        for _ in 0..skipped {
            self.remaining.pop_front();
        }
        let Some(completed) = self.remaining.pop_front() else {
            return ProgressUpdate::Unchanged;
        };

        let arrival_already_given = skipped == 0 && self.arrival_given;
        self.current_id = completed.target.clone();
        if let Some(node) = self.graph.node(&completed.target) {
            self.current = node;
        }
        self.reset_phase_flags();
        self.first_edge = false;
        self.refresh_distance();

        let arrived = self.remaining.is_empty();
        if arrived {
            self.state = ProgressState::AtDestination;
            debug!("arrived at {}", self.current_id);
        } else {
            debug!(
                "advanced to {} ({} legs remaining)",
                self.current_id,
                self.remaining.len()
            );
        }

        ProgressUpdate::Advanced {
            completed,
            skipped,
            arrival_already_given,
            arrived,
        }
    }

    fn reset_phase_flags(&mut self) {
        self.mid_course_given = false;
        self.arrival_given = false;
    }

    /// Stores the reading and refreshes the derived estimates. Runs
    /// for noise readings too; a noisy position still informs bearing.
    fn update_position(&mut self, matched: &PositionMatch, reading: &Reading) {
        if let Some(position) = matched.position {
            self.estimate_bearing(position);
            self.last_position = Some(position);
        }
        self.last_reading = Some(reading.clone());
        self.refresh_distance();
    }

    fn estimate_bearing(&mut self, position: Point<f64>) {
        if let (Some(previous), Some(target)) = (self.last_position, self.target_geometry()) {
            if let Some(bearing) = bearing_change(previous, position, target) {
                self.bearing = Some(bearing);
            }
        }
    }

    fn refresh_distance(&mut self) {
        self.distance_to_target = match (self.last_position, self.target_geometry()) {
            (Some(position), Some(target)) => Some(Euclidean.distance(position, target)),
            _ => None,
        };
    }

    fn target_geometry(&self) -> Option<Point<f64>> {
        let front = self.remaining.front()?;
        self.graph.waypoint_by_id(&front.target)?.geometry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InstructionSet, VenueGraphBuilder, Waypoint};
    use crate::routing::shortest_route;

    /// Four waypoints in a row, 10 m apart, connected a->b->c->d.
    fn corridor() -> Arc<VenueGraph> {
        let mut builder = VenueGraphBuilder::new();
        for (i, id) in ["a", "b", "c", "d"].iter().enumerate() {
            builder.add_waypoint(Waypoint {
                id: (*id).to_string(),
                name: (*id).to_string(),
                geometry: Some(Point::new(10.0 * i as f64, 0.0)),
                beacon: None,
                accuracy: crate::DEFAULT_WAYPOINT_ACCURACY,
                rssi: crate::DEFAULT_WAYPOINT_RSSI,
                kinds: Vec::new(),
            });
        }
        for (i, (source, target)) in [("a", "b"), ("b", "c"), ("c", "d")].iter().enumerate() {
            builder.add_segment(PathSegment {
                id: format!("e{i}"),
                source: (*source).to_string(),
                target: (*target).to_string(),
                weight: 10.0,
                instructions: InstructionSet::empty("en-GB"),
            });
        }
        // an off-route spur reachable from the corridor
        builder.add_waypoint(Waypoint {
            id: "spur".to_string(),
            name: "spur".to_string(),
            geometry: Some(Point::new(10.0, 10.0)),
            beacon: None,
            accuracy: crate::DEFAULT_WAYPOINT_ACCURACY,
            rssi: crate::DEFAULT_WAYPOINT_RSSI,
            kinds: Vec::new(),
        });
        builder.add_segment(PathSegment {
            id: "spur-edge".to_string(),
            source: "spur".to_string(),
            target: "b".to_string(),
            weight: 10.0,
            instructions: InstructionSet::empty("en-GB"),
        });
        Arc::new(builder.build().unwrap())
    }

    fn progress_with(graph: &Arc<VenueGraph>, config: EngineConfig) -> RouteProgress {
        let a = graph.node("a").unwrap();
        let d = graph.node("d").unwrap();
        let route = shortest_route(graph, a, d).unwrap();
        RouteProgress::new(
            Arc::clone(graph),
            config,
            (a, "a".to_string()),
            (d, "d".to_string()),
            route,
        )
    }

    fn fix(graph: &VenueGraph, id: &str, x: f64, y: f64) -> (PositionMatch, Reading) {
        let node = graph.node(id).unwrap();
        let point = Point::new(x, y);
        let matched = PositionMatch {
            node,
            waypoint: id.to_string(),
            distance: Euclidean.distance(point, graph.waypoint(node).unwrap().geometry.unwrap()),
            position: Some(point),
        };
        (matched, Reading::Fix(point))
    }

    #[test]
    fn identical_reading_is_a_noop() {
        let graph = corridor();
        let mut progress = progress_with(&graph, EngineConfig::default());

        let (matched, reading) = fix(&graph, "a", 1.0, 0.0);
        assert_eq!(progress.observe(&matched, &reading), ProgressUpdate::Refined);
        assert_eq!(
            progress.observe(&matched, &reading),
            ProgressUpdate::Unchanged
        );
        assert_eq!(progress.state(), ProgressState::OnEdge);
        assert_eq!(progress.current_waypoint(), "a");
    }

    #[test]
    fn repeated_refinement_never_advances() {
        let graph = corridor();
        let mut progress = progress_with(&graph, EngineConfig::default());

        for offset in [0.5, 1.0, 1.5, 2.0] {
            let (matched, reading) = fix(&graph, "a", offset, 0.0);
            assert_eq!(progress.observe(&matched, &reading), ProgressUpdate::Refined);
            assert_eq!(progress.current_waypoint(), "a");
            assert_eq!(progress.remaining_legs(), 3);
        }
    }

    #[test]
    fn distant_match_is_noise() {
        let graph = corridor();
        let mut progress = progress_with(&graph, EngineConfig::default());

        // 8 m away from b: beyond assignation limit (5 + 1)
        let (matched, reading) = fix(&graph, "b", 18.0, 0.0);
        assert_eq!(
            progress.observe(&matched, &reading),
            ProgressUpdate::Noise { distance: 8.0 }
        );
        assert_eq!(progress.current_waypoint(), "a");
        // position was still stored: the distance estimate refers to
        // the current leg's target b at x=10
        assert!((progress.distance_to_target().unwrap() - 8.0).abs() < 1e-9);
    }

    #[test]
    fn reaching_the_target_advances() {
        let graph = corridor();
        let mut progress = progress_with(&graph, EngineConfig::default());

        let (matched, reading) = fix(&graph, "b", 10.5, 0.0);
        let update = progress.observe(&matched, &reading);
        match update {
            ProgressUpdate::Advanced {
                completed,
                skipped,
                arrived,
                ..
            } => {
                assert_eq!(completed.target, "b");
                assert_eq!(skipped, 0);
                assert!(!arrived);
            }
            other => panic!("expected advance, got {other:?}"),
        }
        assert_eq!(progress.current_waypoint(), "b");
        assert_eq!(progress.remaining_legs(), 2);
        assert!(!progress.is_first_edge());
    }

    #[test]
    fn skip_ahead_drops_missed_legs() {
        let graph = corridor();
        let mut progress = progress_with(&graph, EngineConfig::default());

        // c observed while still tracked at a: b was never seen
        let (matched, reading) = fix(&graph, "c", 20.0, 0.0);
        let update = progress.observe(&matched, &reading);
        match update {
            ProgressUpdate::Advanced {
                completed, skipped, ..
            } => {
                assert_eq!(completed.target, "c");
                assert_eq!(skipped, 1);
            }
            other => panic!("expected skip-ahead advance, got {other:?}"),
        }
        assert_eq!(progress.current_waypoint(), "c");
        assert_eq!(progress.remaining_legs(), 1);
    }

    #[test]
    fn strict_routing_rejects_skip_ahead() {
        let graph = corridor();
        let config = EngineConfig {
            strict_routing: true,
            ..EngineConfig::default()
        };
        let mut progress = progress_with(&graph, config);

        let (matched, reading) = fix(&graph, "c", 20.0, 0.0);
        let update = progress.observe(&matched, &reading);
        assert_eq!(
            update,
            ProgressUpdate::OffRoute {
                from: "c".to_string(),
                back_to: "a".to_string(),
            }
        );
        assert_eq!(progress.state(), ProgressState::Recalculating);
    }

    #[test]
    fn walking_the_whole_route_arrives() {
        let graph = corridor();
        let mut progress = progress_with(&graph, EngineConfig::default());

        for (id, x) in [("b", 10.0), ("c", 20.0)] {
            let (matched, reading) = fix(&graph, id, x, 0.0);
            assert!(matches!(
                progress.observe(&matched, &reading),
                ProgressUpdate::Advanced { arrived: false, .. }
            ));
        }
        let (matched, reading) = fix(&graph, "d", 30.0, 0.0);
        assert!(matches!(
            progress.observe(&matched, &reading),
            ProgressUpdate::Advanced { arrived: true, .. }
        ));
        assert_eq!(progress.state(), ProgressState::AtDestination);

        // further readings are ignored
        let (matched, reading) = fix(&graph, "a", 0.0, 0.0);
        assert_eq!(
            progress.observe(&matched, &reading),
            ProgressUpdate::Unchanged
        );
    }

    #[test]
    fn off_route_match_swaps_roles() {
        let graph = corridor();
        let mut progress = progress_with(&graph, EngineConfig::default());

        // reach b first, then fall off to the spur
        let (matched, reading) = fix(&graph, "b", 10.0, 0.0);
        progress.observe(&matched, &reading);

        let (matched, reading) = fix(&graph, "spur", 10.0, 10.0);
        let update = progress.observe(&matched, &reading);
        assert_eq!(
            update,
            ProgressUpdate::OffRoute {
                from: "spur".to_string(),
                back_to: "b".to_string(),
            }
        );
        assert_eq!(progress.state(), ProgressState::Recalculating);
        assert_eq!(progress.current_waypoint(), "spur");
        assert_eq!(progress.destination(), "b");

        // the caller re-plans and installs the fresh route
        let spur = graph.node("spur").unwrap();
        let b = graph.node("b").unwrap();
        let route = shortest_route(&graph, spur, b).unwrap();
        progress.install_recalculated(route);
        assert_eq!(progress.state(), ProgressState::OnEdge);
        assert!(progress.take_recalculated());
        assert!(!progress.take_recalculated());
    }

    #[test]
    fn recalculation_cooldown_suppresses_thrashing() {
        let graph = corridor();
        let config = EngineConfig {
            recalculation_cooldown: 2,
            ..EngineConfig::default()
        };
        let mut progress = progress_with(&graph, config);

        // first off-route swap goes through
        let (matched, reading) = fix(&graph, "spur", 10.0, 10.0);
        assert!(matches!(
            progress.observe(&matched, &reading),
            ProgressUpdate::OffRoute { .. }
        ));
        let spur = graph.node("spur").unwrap();
        let b = graph.node("b").unwrap();
        progress.install_recalculated(shortest_route(&graph, spur, b).unwrap());

        // an immediate second contradiction is held back as noise
        let (matched, reading) = fix(&graph, "d", 30.0, 0.0);
        assert!(matches!(
            progress.observe(&matched, &reading),
            ProgressUpdate::Noise { .. }
        ));

        // after the cooldown has elapsed it goes through again
        let (matched, reading) = fix(&graph, "spur", 10.5, 10.0);
        progress.observe(&matched, &reading);
        let (matched, reading) = fix(&graph, "d", 29.5, 0.0);
        assert!(matches!(
            progress.observe(&matched, &reading),
            ProgressUpdate::OffRoute { .. }
        ));
    }

    #[test]
    fn advance_reports_pending_arrival_state() {
        let graph = corridor();
        let mut progress = progress_with(&graph, EngineConfig::default());

        progress.mark_arrival_given();
        let (matched, reading) = fix(&graph, "b", 10.0, 0.0);
        match progress.observe(&matched, &reading) {
            ProgressUpdate::Advanced {
                arrival_already_given,
                ..
            } => assert!(arrival_already_given),
            other => panic!("expected advance, got {other:?}"),
        }
        // flags reset for the new leg
        assert!(!progress.arrival_given());
        assert!(!progress.mid_course_given());
    }
}
