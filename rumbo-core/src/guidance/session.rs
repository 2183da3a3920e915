//! Guidance sessions
//!
//! Ties the pipeline together: readings are matched against the graph,
//! fed to the progress tracker, and the selector's verdict is surfaced
//! as a stream of events the embedding application renders.

use std::sync::Arc;

use log::{debug, info, warn};

use super::config::EngineConfig;
use super::progress::{ProgressState, ProgressUpdate, RouteProgress};
use super::selector::{Instruction, InstructionSelector, Selection, SilentReason};
use crate::WaypointId;
use crate::error::Error;
use crate::matching::{CoordinateMatcher, PositionMatch, ProximityMatcher, Reading};
use crate::model::VenueGraph;
use crate::routing::{can_route, shortest_route};

/// Everything a session can tell the outside world.
#[derive(Debug, Clone, PartialEq)]
pub enum GuidanceEvent {
    Instruction(Instruction),
    /// A reading was processed but produced nothing to say.
    Silent(SilentReason),
    /// The traveller left the plan; a fresh route back is active.
    Rerouted { from: WaypointId, to: WaypointId },
    /// The traveller left the plan and no route back exists.
    RouteUnavailable { from: WaypointId, to: WaypointId },
    /// The session destination has been reached.
    Arrived { at: WaypointId },
}

/// Where readings come from. Implementations decide pacing; the
/// engine only requires that readings arrive one at a time.
pub trait PositionSource {
    /// Next reading, or `None` when the source is exhausted.
    fn next_reading(&mut self) -> Option<Reading>;
}

/// Where events go. A sink renders or records them; the engine does
/// not care which.
pub trait InstructionSink {
    fn deliver(&mut self, event: &GuidanceEvent);
}

/// Why [`run_session`] stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Arrived,
    SourceExhausted,
    Unroutable,
}

/// One active navigation: a planned route plus the mutable state that
/// follows the traveller along it.
///
/// A session is single-owner: readings must be fed from one place at a
/// time. The graph itself is shared and immutable.
pub struct GuidanceSession {
    graph: Arc<VenueGraph>,
    proximity: ProximityMatcher,
    progress: RouteProgress,
    selector: InstructionSelector,
    begun: bool,
}

impl GuidanceSession {
    /// Plans a route and opens a session along it.
    ///
    /// # Errors
    ///
    /// `WaypointNotFound` when either endpoint is unknown, `NoRoute`
    /// when the destination is unreachable (or equals the origin), and
    /// `InvalidData` when the configuration is inconsistent.
    pub fn start(
        graph: Arc<VenueGraph>,
        config: EngineConfig,
        from: &str,
        to: &str,
    ) -> Result<Self, Error> {
        config.validate()?;
        let origin = graph
            .node(from)
            .ok_or_else(|| Error::WaypointNotFound(from.to_string()))?;
        let target = graph
            .node(to)
            .ok_or_else(|| Error::WaypointNotFound(to.to_string()))?;
        if !can_route(&graph, origin, target) {
            return Err(Error::NoRoute {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        let route = shortest_route(&graph, origin, target).ok_or_else(|| Error::NoRoute {
            from: from.to_string(),
            to: to.to_string(),
        })?;
        info!(
            "guidance session {} -> {}: {} legs, {:.0} s estimated",
            from,
            to,
            route.len(),
            route.total_weight()
        );

        let proximity = ProximityMatcher::new(config.use_rssi);
        let progress = RouteProgress::new(
            Arc::clone(&graph),
            config.clone(),
            (origin, from.to_string()),
            (target, to.to_string()),
            route,
        );
        let selector = InstructionSelector::new(config);
        Ok(Self {
            graph,
            proximity,
            progress,
            selector,
            begun: false,
        })
    }

    /// Opening instruction of the route. Called implicitly by the
    /// first [`Self::process_reading`] if the caller does not.
    pub fn begin(&mut self) -> Vec<GuidanceEvent> {
        if self.begun {
            return Vec::new();
        }
        self.begun = true;
        let mut events = Vec::new();
        push_selection(&mut events, self.selector.begin(&self.progress));
        events
    }

    /// Feed one reading through the pipeline and collect the events it
    /// produces. Readings that match nothing are absorbed silently.
    pub fn process_reading(&mut self, reading: &Reading) -> Vec<GuidanceEvent> {
        let mut events = self.begin();

        let Some(matched) = self.match_reading(reading) else {
            debug!("reading produced no match, state retained");
            return events;
        };

        let update = self.progress.observe(&matched, reading);
        match update {
            ProgressUpdate::OffRoute { from, back_to } => {
                self.replan(&mut events, &from, &back_to);
            }
            update => {
                push_selection(&mut events, self.selector.select(&mut self.progress, &update));
                if let ProgressUpdate::Advanced { arrived: true, .. } = update {
                    events.push(GuidanceEvent::Arrived {
                        at: self.progress.current_waypoint().clone(),
                    });
                }
            }
        }
        events
    }

    /// The tracker state, for displays and traces.
    #[must_use]
    pub fn progress(&self) -> &RouteProgress {
        &self.progress
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.progress.state() == ProgressState::AtDestination
    }

    fn match_reading(&mut self, reading: &Reading) -> Option<PositionMatch> {
        match reading {
            Reading::Fix(point) => CoordinateMatcher::match_point(&self.graph, *point),
            Reading::Beacons(sample) => self.proximity.match_sample(&self.graph, sample),
        }
    }

    /// Plan a fresh route after an off-route swap. On failure the
    /// session stays in `Recalculating` and later readings retry from
    /// wherever they match.
    fn replan(&mut self, events: &mut Vec<GuidanceEvent>, from: &str, back_to: &str) {
        let origin = self.graph.node(from);
        let target = self.graph.node(back_to);
        let route = match (origin, target) {
            (Some(origin), Some(target)) => shortest_route(&self.graph, origin, target),
            _ => None,
        };
        match route {
            Some(route) => {
                info!("rerouted: {} -> {} ({} legs)", from, back_to, route.len());
                self.progress.install_recalculated(route);
                events.push(GuidanceEvent::Rerouted {
                    from: from.to_string(),
                    to: back_to.to_string(),
                });
                push_selection(
                    events,
                    self.selector.select(&mut self.progress, &ProgressUpdate::Rerouted),
                );
            }
            None => {
                warn!("unable to route from {from} back to {back_to}");
                events.push(GuidanceEvent::RouteUnavailable {
                    from: from.to_string(),
                    to: back_to.to_string(),
                });
            }
        }
    }
}

fn push_selection(events: &mut Vec<GuidanceEvent>, selection: Selection) {
    match selection {
        Selection::Deliver(batch) => {
            events.extend(batch.into_iter().map(GuidanceEvent::Instruction));
        }
        Selection::Silent(reason) => events.push(GuidanceEvent::Silent(reason)),
    }
}

/// Drives a session to completion by pulling readings from `source`
/// and pushing every event into `sink`.
///
/// Stops when the destination is reached, the source runs dry, or the
/// traveller cannot be routed back onto a plan.
pub fn run_session<S, K>(session: &mut GuidanceSession, source: &mut S, sink: &mut K) -> SessionEnd
where
    S: PositionSource,
    K: InstructionSink,
{
    for event in session.begin() {
        sink.deliver(&event);
    }
    while let Some(reading) = source.next_reading() {
        let mut unroutable = false;
        for event in session.process_reading(&reading) {
            if matches!(event, GuidanceEvent::RouteUnavailable { .. }) {
                unroutable = true;
            }
            sink.deliver(&event);
        }
        if session.is_complete() {
            return SessionEnd::Arrived;
        }
        if unroutable {
            return SessionEnd::Unroutable;
        }
    }
    SessionEnd::SourceExhausted
}
