use serde::Deserialize;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct VenueDocument {
    pub venue: RawVenue,
    pub graph: RawGraph,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RawVenue {
    pub name: String,
    pub platforms: Vec<RawPlatform>,
    pub exits: Vec<RawExit>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RawPlatform {
    pub name: String,
    pub destinations: Vec<String>,
    pub entrance: String,
    pub exit: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RawExit {
    pub name: String,
    pub mode: String,
    pub entrance: String,
    pub exit: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RawGraph {
    /// Fallback activation accuracy for nodes that do not declare one.
    pub default_accuracy: Option<f64>,
    pub nodes: Vec<RawWaypoint>,
    pub edges: Vec<RawSegment>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RawWaypoint {
    pub id: String,
    pub name: String,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub major: Option<u16>,
    pub minor: Option<u16>,
    pub accuracy: Option<f64>,
    pub rssi: Option<i16>,
    pub kind: Vec<crate::model::WaypointKind>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RawSegment {
    pub id: String,
    pub source: String,
    pub target: String,
    pub travel_time: f64,
    pub instructions: Vec<RawInstructionSet>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RawInstructionSet {
    pub language: String,
    pub start: String,
    pub mid_course: String,
    pub arrival: String,
    pub starting_only: String,
}
