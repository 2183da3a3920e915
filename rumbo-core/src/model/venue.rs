//! Venue-level records layered on the graph: platforms, exits, services.

use std::sync::Arc;

use itertools::Itertools;

use super::graph::VenueGraph;
use crate::WaypointId;

/// A boarding platform and the destinations it serves.
///
/// `entrance` is the waypoint used when approaching the platform,
/// `exit` the waypoint used when leaving it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub name: String,
    pub destinations: Vec<String>,
    pub entrance: WaypointId,
    pub exit: WaypointId,
}

/// A street-level exit. `entrance` is the waypoint used when entering
/// the venue through this exit, `exit` the waypoint used when leaving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exit {
    pub name: String,
    /// How the exit is traversed (escalator, lift, stairs, ...);
    /// travellers pick an exit by mode.
    pub mode: String,
    pub entrance: WaypointId,
    pub exit: WaypointId,
}

/// One venue: its graph plus the facilities travellers ask for.
#[derive(Debug, Clone)]
pub struct Venue {
    pub name: String,
    pub graph: Arc<VenueGraph>,
    pub platforms: Vec<Platform>,
    pub exits: Vec<Exit>,
}

impl Venue {
    #[must_use]
    pub fn platform_named(&self, name: &str) -> Option<&Platform> {
        self.platforms.iter().find(|p| p.name == name)
    }

    #[must_use]
    pub fn exit_named(&self, name: &str) -> Option<&Exit> {
        self.exits.iter().find(|e| e.name == name)
    }

    /// Platforms serving the given destination.
    pub fn platforms_serving<'a>(&'a self, destination: &'a str) -> impl Iterator<Item = &'a Platform> {
        self.platforms
            .iter()
            .filter(move |p| p.destinations.iter().any(|d| d == destination))
    }

    /// Every destination served from this venue, deduplicated and sorted.
    #[must_use]
    pub fn destinations(&self) -> Vec<String> {
        self.platforms
            .iter()
            .flat_map(|p| p.destinations.iter().cloned())
            .sorted()
            .dedup()
            .collect()
    }

    /// Every mode by which the venue can be left, deduplicated and sorted.
    #[must_use]
    pub fn exit_modes(&self) -> Vec<String> {
        self.exits.iter().map(|e| e.mode.clone()).sorted().dedup().collect()
    }

    /// First exit traversed by the given mode.
    #[must_use]
    pub fn exit_by_mode(&self, mode: &str) -> Option<&Exit> {
        self.exits.iter().find(|e| e.mode == mode)
    }
}
