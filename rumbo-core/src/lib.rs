//! Venue-scale wayfinding engine for accessible turn-by-turn guidance.
//!
//! The crate models a venue (a station, a shopping centre, an airport
//! terminal) as a directed weighted graph of waypoints, plans routes over
//! it, matches live positioning readings against the graph and selects
//! authored voice instructions as the traveller moves.
//!
//! The core pipeline is:
//!
//! 1. [`loading`] parses a venue document and builds a [`model::VenueGraph`].
//! 2. [`routing`] answers reachability queries and plans shortest routes.
//! 3. [`matching`] turns raw readings (coordinate fixes or beacon ranging
//!    samples) into graph waypoints.
//! 4. [`guidance`] tracks progress along the planned route and decides
//!    which authored instruction, if any, each reading warrants.

pub mod algo;
pub mod error;
pub mod guidance;
pub mod loading;
pub mod matching;
pub mod model;
pub mod prelude;
pub mod routing;

pub use error::Error;
pub use model::{Venue, VenueGraph};

/// Stable identifier of a waypoint (graph node) within one venue.
pub type WaypointId = String;
/// Stable identifier of a path segment (graph edge) within one venue.
pub type SegmentId = String;

/// Ranging accuracy threshold (meters) applied to waypoints that do not
/// declare their own.
pub const DEFAULT_WAYPOINT_ACCURACY: f64 = 5.0;

/// Signal-strength threshold (dBm) applied to waypoints that do not
/// declare their own. Low enough that any received advertisement passes.
pub const DEFAULT_WAYPOINT_RSSI: i16 = -1000;
