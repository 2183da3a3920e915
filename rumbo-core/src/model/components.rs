//! Venue graph components - waypoints, path segments and instruction sets

use std::fmt;

use geo::Point;
use serde::{Deserialize, Serialize};

use crate::{Error, SegmentId, WaypointId};

/// iBeacon identity within a venue's beacon region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BeaconId {
    pub major: u16,
    pub minor: u16,
}

impl BeaconId {
    #[must_use]
    pub const fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for BeaconId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.major, self.minor)
    }
}

/// Physical categories a waypoint can belong to. A waypoint may carry
/// several (an entrance with a ticket machine next to it).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaypointKind {
    Entrance,
    Exit,
    TicketBarrier,
    TicketMachine,
    Platform,
    Lift,
    Escalator,
    Stairs,
    Toilet,
    Shop,
    Atm,
    StreetCrossing,
    BusStop,
    TaxiRank,
}

/// Graph node: a physical decision point inside the venue.
///
/// A waypoint is located either by venue-local coordinates, by an
/// installed beacon, or both. The `accuracy` and `rssi` thresholds
/// gate when a beacon observation is close enough to claim the node.
#[derive(Debug, Clone)]
pub struct Waypoint {
    pub id: WaypointId,
    /// Human-readable name, used in logs and exports.
    pub name: String,
    /// Position in venue-local meters, when surveyed.
    pub geometry: Option<Point<f64>>,
    /// Installed beacon, when present.
    pub beacon: Option<BeaconId>,
    /// Maximum ranging accuracy (meters) an observation may report and
    /// still activate this waypoint.
    pub accuracy: f64,
    /// Minimum signal strength (dBm) an observation must report when
    /// matching by RSSI.
    pub rssi: i16,
    pub kinds: Vec<WaypointKind>,
}

impl Waypoint {
    #[must_use]
    pub fn has_kind(&self, kind: WaypointKind) -> bool {
        self.kinds.contains(&kind)
    }

    /// Euclidean distance from `point` to this waypoint, when surveyed.
    #[must_use]
    pub fn distance_to(&self, point: Point<f64>) -> Option<f64> {
        use geo::{Distance, Euclidean};
        self.geometry.map(|g| Euclidean.distance(g, point))
    }
}

/// Graph edge: a directed traversable connection between two waypoints.
#[derive(Debug, Clone, PartialEq)]
pub struct PathSegment {
    pub id: SegmentId,
    pub source: WaypointId,
    pub target: WaypointId,
    /// Expected traversal time in seconds; the routing weight.
    pub weight: f64,
    /// Guidance authored for this segment, already narrowed to the
    /// session language at load time.
    pub instructions: InstructionSet,
}

impl PathSegment {
    #[must_use]
    pub fn travel_time(&self) -> f64 {
        self.weight
    }
}

/// Phases of guidance along a single segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstructionPhase {
    /// Delivered when the segment becomes the current one.
    Start,
    /// Delivered part-way along the segment.
    MidCourse,
    /// Delivered when the segment's target is reached or near.
    Arrival,
    /// Replaces all other phases on short hop segments.
    StartingOnly,
}

/// Guidance texts authored for one language on one segment.
///
/// `starting_only` is exclusive: a set carrying it must not carry any
/// other phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstructionSet {
    pub language: String,
    pub start: Option<String>,
    pub mid_course: Option<String>,
    pub arrival: Option<String>,
    pub starting_only: Option<String>,
}

impl InstructionSet {
    /// A set with no authored text, for segments that are silent in
    /// the requested language.
    #[must_use]
    pub fn empty(language: &str) -> Self {
        Self {
            language: language.to_string(),
            ..Self::default()
        }
    }

    /// True when no phase carries any text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start.is_none()
            && self.mid_course.is_none()
            && self.arrival.is_none()
            && self.starting_only.is_none()
    }

    #[must_use]
    pub fn text(&self, phase: InstructionPhase) -> Option<&str> {
        match phase {
            InstructionPhase::Start => self.start.as_deref(),
            InstructionPhase::MidCourse => self.mid_course.as_deref(),
            InstructionPhase::Arrival => self.arrival.as_deref(),
            InstructionPhase::StartingOnly => self.starting_only.as_deref(),
        }
    }

    /// Enforces the `starting_only` exclusivity rule.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInstructionSet` when `starting_only` coexists
    /// with any other phase text.
    pub fn validate(&self, segment: &SegmentId) -> Result<(), Error> {
        if self.starting_only.is_some() && !self.only_starting() {
            return Err(Error::InvalidInstructionSet {
                segment: segment.clone(),
                reason: "starting_only must not coexist with other phases".to_string(),
            });
        }
        Ok(())
    }

    fn only_starting(&self) -> bool {
        self.start.is_none() && self.mid_course.is_none() && self.arrival.is_none()
    }
}
