pub use crate::{DEFAULT_WAYPOINT_ACCURACY, DEFAULT_WAYPOINT_RSSI};

// Re-export key components
pub use crate::algo::{ValidationReport, validate_venue};
pub use crate::guidance::{
    EngineConfig, GuidanceEvent, GuidanceSession, InstructionSelector, RouteProgress, SessionEnd,
    run_session,
};
pub use crate::loading::load_venue;
pub use crate::matching::{BeaconObservation, CoordinateMatcher, ProximityMatcher, Reading};
pub use crate::model::{Venue, VenueGraph, VenueGraphBuilder};
pub use crate::routing::{Route, can_route, shortest_route};

// Core identifier types
pub use crate::SegmentId;
pub use crate::WaypointId;
