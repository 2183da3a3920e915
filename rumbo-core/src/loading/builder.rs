use std::path::Path;
use std::sync::Arc;

use log::info;

use super::raw_types::{RawInstructionSet, RawSegment, RawWaypoint, VenueDocument};
use crate::model::{
    BeaconId, Exit, InstructionSet, PathSegment, Platform, Venue, VenueGraph, VenueGraphBuilder,
    Waypoint,
};
use crate::{DEFAULT_WAYPOINT_ACCURACY, DEFAULT_WAYPOINT_RSSI, Error};

/// Anything that can hand over a venue document.
pub trait VenueDataSource {
    /// Raw venue JSON.
    ///
    /// # Errors
    ///
    /// Implementations surface their own I/O failures.
    fn venue_document(&self) -> Result<String, Error>;
}

impl VenueDataSource for std::path::PathBuf {
    fn venue_document(&self) -> Result<String, Error> {
        Ok(std::fs::read_to_string(self)?)
    }
}

impl VenueDataSource for &Path {
    fn venue_document(&self) -> Result<String, Error> {
        Ok(std::fs::read_to_string(self)?)
    }
}

/// Loads a venue from a JSON file, narrowing authored instructions to
/// `language`.
///
/// # Errors
///
/// Returns an error if the file cannot be read, the JSON is malformed,
/// or the venue data breaks a structural invariant (dangling segment
/// endpoints, malformed instruction sets, unresolvable platform or
/// exit references, missing language).
pub fn load_venue(path: &Path, language: &str) -> Result<Venue, Error> {
    info!("loading venue data: {}", path.display());
    venue_from_source(&path, language)
}

/// Loads a venue from any [`VenueDataSource`].
///
/// # Errors
///
/// Same conditions as [`load_venue`].
pub fn venue_from_source<S: VenueDataSource>(source: &S, language: &str) -> Result<Venue, Error> {
    venue_from_json(&source.venue_document()?, language)
}

/// Builds a venue from a JSON document already in memory.
///
/// # Errors
///
/// Same conditions as [`load_venue`].
pub fn venue_from_json(json: &str, language: &str) -> Result<Venue, Error> {
    build_venue(serde_json::from_str(json)?, Vec::new(), language)
}

/// Builds a venue with a one-shot set of updated segments layered on
/// top of the document's own. `updates_json` is an array in the same
/// shape as `graph.edges`; an update whose id matches a document
/// segment replaces it wholesale (travel time and instructions), so a
/// temporary closure can be shipped without editing the venue file.
/// The substitution happens here, once; the built graph never changes
/// afterwards.
///
/// # Errors
///
/// Same conditions as [`load_venue`], applied to the updates as well
/// as the document.
pub fn venue_from_json_with_updates(
    json: &str,
    updates_json: &str,
    language: &str,
) -> Result<Venue, Error> {
    build_venue(
        serde_json::from_str(json)?,
        serde_json::from_str(updates_json)?,
        language,
    )
}

fn build_venue(
    document: VenueDocument,
    updates: Vec<RawSegment>,
    language: &str,
) -> Result<Venue, Error> {
    let default_accuracy = document
        .graph
        .default_accuracy
        .unwrap_or(DEFAULT_WAYPOINT_ACCURACY);

    let mut builder = VenueGraphBuilder::new();
    for node in document.graph.nodes {
        builder.add_waypoint(waypoint_from_raw(node, default_accuracy)?);
    }
    for edge in document.graph.edges {
        builder.add_segment(segment_from_raw(edge, language)?);
    }
    if !updates.is_empty() {
        info!("applying {} updated segments", updates.len());
        for edge in updates {
            builder.add_segment(segment_from_raw(edge, language)?);
        }
    }
    let graph = Arc::new(builder.build()?);

    let mut platforms = Vec::with_capacity(document.venue.platforms.len());
    for platform in document.venue.platforms {
        for waypoint in [&platform.entrance, &platform.exit] {
            if graph.node(waypoint).is_none() {
                return Err(Error::InvalidVenue(format!(
                    "platform '{}' references unknown waypoint {waypoint}",
                    platform.name
                )));
            }
        }
        platforms.push(Platform {
            name: platform.name,
            destinations: platform.destinations,
            entrance: platform.entrance,
            exit: platform.exit,
        });
    }

    let mut exits = Vec::with_capacity(document.venue.exits.len());
    for exit in document.venue.exits {
        for waypoint in [&exit.entrance, &exit.exit] {
            if graph.node(waypoint).is_none() {
                return Err(Error::InvalidVenue(format!(
                    "exit '{}' references unknown waypoint {waypoint}",
                    exit.name
                )));
            }
        }
        exits.push(Exit {
            name: exit.name,
            mode: exit.mode,
            entrance: exit.entrance,
            exit: exit.exit,
        });
    }

    info!(
        "venue '{}' loaded: {} waypoints, {} segments, {} platforms, {} exits",
        document.venue.name,
        graph.waypoint_count(),
        graph.segment_count(),
        platforms.len(),
        exits.len()
    );

    Ok(Venue {
        name: document.venue.name,
        graph,
        platforms,
        exits,
    })
}

fn waypoint_from_raw(raw: RawWaypoint, default_accuracy: f64) -> Result<Waypoint, Error> {
    let geometry = match (raw.x, raw.y) {
        (Some(x), Some(y)) => Some(geo::Point::new(x, y)),
        (None, None) => None,
        _ => {
            return Err(Error::InvalidData(format!(
                "waypoint {} has only one coordinate",
                raw.id
            )));
        }
    };
    let beacon = match (raw.major, raw.minor) {
        (Some(major), Some(minor)) => Some(BeaconId::new(major, minor)),
        (None, None) => None,
        _ => {
            return Err(Error::InvalidData(format!(
                "waypoint {} has an incomplete beacon identity",
                raw.id
            )));
        }
    };
    if geometry.is_none() && beacon.is_none() {
        return Err(Error::InvalidData(format!(
            "waypoint {} has neither coordinates nor a beacon",
            raw.id
        )));
    }
    Ok(Waypoint {
        id: raw.id,
        name: raw.name,
        geometry,
        beacon,
        accuracy: raw.accuracy.unwrap_or(default_accuracy),
        rssi: raw.rssi.unwrap_or(DEFAULT_WAYPOINT_RSSI),
        kinds: raw.kind,
    })
}

fn segment_from_raw(raw: RawSegment, language: &str) -> Result<PathSegment, Error> {
    if !raw.travel_time.is_finite() || raw.travel_time < 0.0 {
        return Err(Error::InvalidData(format!(
            "segment {} has an invalid travel time",
            raw.id
        )));
    }
    let instructions = select_language(&raw.id, raw.instructions, language)?;
    Ok(PathSegment {
        id: raw.id,
        source: raw.source,
        target: raw.target,
        weight: raw.travel_time,
        instructions,
    })
}

/// Picks the instruction set for the requested language. A segment
/// with no authored sets at all stays silent; a segment that is
/// authored, but not for this language, fails loudly rather than
/// guiding in the wrong tongue.
fn select_language(
    segment: &str,
    sets: Vec<RawInstructionSet>,
    language: &str,
) -> Result<InstructionSet, Error> {
    if sets.is_empty() {
        return Ok(InstructionSet::empty(language));
    }
    let raw = sets
        .into_iter()
        .find(|set| set.language == language)
        .ok_or_else(|| Error::MissingLanguage {
            segment: segment.to_string(),
            language: language.to_string(),
        })?;
    Ok(InstructionSet {
        language: raw.language,
        start: text(raw.start),
        mid_course: text(raw.mid_course),
        arrival: text(raw.arrival),
        starting_only: text(raw.starting_only),
    })
}

/// Authoring tools export unauthored phases as empty strings.
fn text(value: String) -> Option<String> {
    if value.trim().is_empty() { None } else { Some(value) }
}
