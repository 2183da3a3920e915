use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Waypoint not found: {0}")]
    WaypointNotFound(String),
    #[error("Invalid node index")]
    InvalidNodeIndex,
    #[error("No route from {from} to {to}")]
    NoRoute { from: String, to: String },
    #[error("Duplicate waypoint id: {0}")]
    DuplicateWaypoint(String),
    #[error("Segment {segment} references unknown waypoint {waypoint}")]
    DanglingSegment { segment: String, waypoint: String },
    #[error("Invalid instruction set on segment {segment}: {reason}")]
    InvalidInstructionSet { segment: String, reason: String },
    #[error("Segment {segment} carries no instructions for language {language}")]
    MissingLanguage { segment: String, language: String },
    #[error("Invalid venue: {0}")]
    InvalidVenue(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("GeoJSON error: {0}")]
    GeoJsonError(String),
}
