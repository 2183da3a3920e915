//! Data model for venue wayfinding
//!
//! Contains types and structures representing one venue and its
//! walkable graph.

pub mod components;
pub mod graph;
pub mod venue;

// Re-export of the main model structures
pub use graph::{VenueGraph, VenueGraphBuilder};
pub use venue::{Exit, Platform, Venue};

// Re-export of basic types for convenience
pub use components::{
    BeaconId, InstructionPhase, InstructionSet, PathSegment, Waypoint, WaypointKind,
};
