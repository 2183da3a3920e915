//! Position matching between sensor readings and graph waypoints
//!
//! A reading is either an absolute coordinate fix (venue-local meters)
//! or one beacon ranging sample. Matching turns a reading into the
//! waypoint the traveller is most plausibly standing at, together with
//! a distance estimate the guidance layer compares against its
//! thresholds.

mod coordinate;
mod proximity;

pub use coordinate::CoordinateMatcher;
pub use proximity::{BeaconObservation, ProximityMatcher};

use geo::Point;
use petgraph::graph::NodeIndex;

use crate::WaypointId;

/// A single positioning input delivered to the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Reading {
    /// Absolute position fix in venue-local meters.
    Fix(Point<f64>),
    /// One ranging pass over the venue's beacon region.
    Beacons(Vec<BeaconObservation>),
}

impl Reading {
    /// Position carried by the reading, when it has one.
    #[must_use]
    pub fn position(&self) -> Option<Point<f64>> {
        match self {
            Self::Fix(point) => Some(*point),
            Self::Beacons(_) => None,
        }
    }
}

/// Result of matching one reading against the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionMatch {
    pub node: NodeIndex,
    pub waypoint: WaypointId,
    /// Meters between the reading and the matched waypoint. For beacon
    /// matches this is the ranging accuracy, or zero when matching by
    /// signal strength alone.
    pub distance: f64,
    /// Reading position, when the reading carries one.
    pub position: Option<Point<f64>>,
}
