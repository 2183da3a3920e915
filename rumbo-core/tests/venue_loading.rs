//! Loading a complete venue document and querying the resulting model.

use rumbo_core::Error;
use rumbo_core::algo::validate_venue;
use rumbo_core::loading::venue_from_json;
use rumbo_core::model::WaypointKind;
use rumbo_core::routing::shortest_route;

const STATION: &str = include_str!("fixtures/station.json");

#[test]
fn station_document_loads() {
    let venue = venue_from_json(STATION, "en-GB").unwrap();

    assert_eq!(venue.name, "Las Arenas Central");
    assert_eq!(venue.graph.waypoint_count(), 7);
    assert_eq!(venue.graph.segment_count(), 12);
    assert_eq!(venue.platforms.len(), 2);
    assert_eq!(venue.exits.len(), 2);

    let platform = venue.platform_named("Platform 1").unwrap();
    assert_eq!(platform.entrance, "w-p1");
    assert!(platform.destinations.iter().any(|d| d == "Airport"));
    assert!(venue.exit_named("Side exit").is_some());
    assert_eq!(venue.exit_by_mode("Stairs").unwrap().name, "Side exit");
    assert_eq!(venue.exit_modes(), ["Level", "Stairs"]);

    let serving: Vec<_> = venue
        .platforms_serving("Airport")
        .map(|p| p.name.as_str())
        .collect();
    assert_eq!(serving, ["Platform 1"]);
    assert_eq!(venue.destinations(), ["Airport", "Harbour", "University"]);

    let barriers = venue.graph.waypoint_by_id("w-barriers").unwrap();
    assert!(barriers.has_kind(WaypointKind::TicketBarrier));
}

#[test]
fn instructions_narrow_to_the_requested_language() {
    let venue = venue_from_json(STATION, "es-ES").unwrap();

    let from = venue.graph.node("w-entrance").unwrap();
    let to = venue.graph.node("w-concourse").unwrap();
    let segment = venue.graph.segment_between(from, to).unwrap();
    assert_eq!(segment.instructions.language, "es-ES");
    assert_eq!(
        segment.instructions.start.as_deref(),
        Some("Siga recto hacia el vestíbulo")
    );
}

#[test]
fn unauthored_language_is_rejected() {
    assert!(matches!(
        venue_from_json(STATION, "fr-FR"),
        Err(Error::MissingLanguage { .. })
    ));
}

#[test]
fn station_data_passes_validation() {
    let venue = venue_from_json(STATION, "en-GB").unwrap();
    let report = validate_venue(&venue);
    assert!(report.passed(), "unexpected findings: {:?}", report.findings);
    assert_eq!(report.warning_count(), 0);
}

#[test]
fn routes_cross_the_station() {
    let venue = venue_from_json(STATION, "en-GB").unwrap();
    let entrance = venue.graph.node("w-entrance").unwrap();
    let platform = venue.graph.node("w-p1").unwrap();

    let route = shortest_route(&venue.graph, entrance, platform).unwrap();
    let legs: Vec<_> = route.legs().iter().map(|leg| leg.id.as_str()).collect();
    assert_eq!(legs, ["s-ent-con", "s-con-bar", "s-bar-p1"]);
    assert_eq!(route.nodes(), ["w-entrance", "w-concourse", "w-barriers", "w-p1"]);
    assert!((route.total_weight() - 80.0).abs() < f64::EPSILON);
}

#[test]
fn routes_export_as_geojson() {
    let venue = venue_from_json(STATION, "en-GB").unwrap();
    let entrance = venue.graph.node("w-entrance").unwrap();
    let platform = venue.graph.node("w-p1").unwrap();
    let route = shortest_route(&venue.graph, entrance, platform).unwrap();

    let collection = route.to_feature_collection(&venue.graph).unwrap();
    assert_eq!(collection.features.len(), 3);

    let first = &collection.features[0];
    assert!(first.geometry.is_some());
    let properties = first.properties.as_ref().unwrap();
    assert_eq!(properties["segment"], "s-ent-con");
    assert_eq!(properties["from_name"], "Main entrance");
    assert_eq!(properties["start"], "Go straight ahead towards the concourse");
}

#[test]
fn beacon_venue_loads_without_geometry() {
    let museum = venue_from_json(include_str!("fixtures/museum.json"), "en-GB").unwrap();
    assert_eq!(museum.graph.waypoint_count(), 3);

    let lobby = museum.graph.waypoint_by_id("w-lobby").unwrap();
    assert_eq!(lobby.geometry, None);
    assert!(lobby.beacon.is_some());
    // inherited from the document's default_accuracy
    assert!((lobby.accuracy - 4.0).abs() < f64::EPSILON);
}
