use geo::line_string;
use geojson::{Feature, FeatureCollection, Geometry, Value as GeoJsonValue};
use serde_json::json;

use crate::model::{PathSegment, VenueGraph};
use crate::{Error, WaypointId};

/// A planned route: an ordered sequence of connected segments.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    legs: Vec<PathSegment>,
    nodes: Vec<WaypointId>,
    total_weight: f64,
}

impl Route {
    pub(crate) fn new(legs: Vec<PathSegment>) -> Self {
        let mut nodes = Vec::with_capacity(legs.len() + 1);
        if let Some(first) = legs.first() {
            nodes.push(first.source.clone());
        }
        nodes.extend(legs.iter().map(|leg| leg.target.clone()));
        let total_weight = legs.iter().map(|leg| leg.weight).sum();
        Self {
            legs,
            nodes,
            total_weight,
        }
    }

    #[must_use]
    pub fn legs(&self) -> &[PathSegment] {
        &self.legs
    }

    #[must_use]
    pub fn into_legs(self) -> Vec<PathSegment> {
        self.legs
    }

    /// Waypoints visited, start to destination.
    #[must_use]
    pub fn nodes(&self) -> &[WaypointId] {
        &self.nodes
    }

    /// Total travel time in seconds.
    #[must_use]
    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.legs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }

    #[must_use]
    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.iter().any(|node| node == id)
    }

    /// Export the route as a `GeoJSON` feature collection, one feature
    /// per leg. Legs between unsurveyed waypoints get a null geometry
    /// so the authored instructions still travel with the export.
    ///
    /// # Errors
    ///
    /// Returns `GeoJsonError` when a feature cannot be assembled.
    pub fn to_feature_collection(&self, graph: &VenueGraph) -> Result<FeatureCollection, Error> {
        let features = self
            .legs
            .iter()
            .map(|leg| leg_feature(leg, graph))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        })
    }

    /// # Errors
    ///
    /// Same conditions as [`Self::to_feature_collection`].
    pub fn to_geojson_string(&self, graph: &VenueGraph) -> Result<String, Error> {
        serde_json::to_string(&self.to_feature_collection(graph)?)
            .map_err(|e| Error::GeoJsonError(e.to_string()))
    }
}

fn leg_feature(leg: &PathSegment, graph: &VenueGraph) -> Result<Feature, Error> {
    let source = graph.waypoint_by_id(&leg.source);
    let target = graph.waypoint_by_id(&leg.target);

    let geometry = match (
        source.and_then(|wp| wp.geometry),
        target.and_then(|wp| wp.geometry),
    ) {
        (Some(from), Some(to)) => {
            let line = line_string![
                (x: from.x(), y: from.y()),
                (x: to.x(), y: to.y()),
            ];
            Some(Geometry::new(GeoJsonValue::from(&line)))
        }
        _ => None,
    };

    let value = json!({
        "type": "Feature",
        "geometry": geometry,
        "properties": {
            "segment": leg.id,
            "from": leg.source,
            "from_name": source.map(|wp| wp.name.clone()),
            "to": leg.target,
            "to_name": target.map(|wp| wp.name.clone()),
            "travel_time": leg.weight,
            "start": leg.instructions.start,
            "mid_course": leg.instructions.mid_course,
            "arrival": leg.instructions.arrival,
            "starting_only": leg.instructions.starting_only,
        }
    });

    serde_json::from_value(value).map_err(|e| Error::GeoJsonError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use geo::Point;

    use super::*;
    use crate::model::{InstructionSet, VenueGraphBuilder, Waypoint};

    fn graph() -> VenueGraph {
        let mut builder = VenueGraphBuilder::new();
        for (id, x, y) in [("a", 0.0, 0.0), ("b", 10.0, 0.0), ("c", 10.0, 10.0)] {
            builder.add_waypoint(Waypoint {
                id: id.to_string(),
                name: format!("Waypoint {id}"),
                geometry: Some(Point::new(x, y)),
                beacon: None,
                accuracy: crate::DEFAULT_WAYPOINT_ACCURACY,
                rssi: crate::DEFAULT_WAYPOINT_RSSI,
                kinds: Vec::new(),
            });
        }
        builder
            .add_segment(leg("e1", "a", "b", 30.0))
            .add_segment(leg("e2", "b", "c", 20.0));
        builder.build().unwrap()
    }

    fn leg(id: &str, source: &str, target: &str, weight: f64) -> PathSegment {
        PathSegment {
            id: id.to_string(),
            source: source.to_string(),
            target: target.to_string(),
            weight,
            instructions: InstructionSet {
                language: "en-GB".to_string(),
                start: Some(format!("walk {id}")),
                mid_course: None,
                arrival: None,
                starting_only: None,
            },
        }
    }

    #[test]
    fn derives_nodes_and_total_weight() {
        let route = Route::new(vec![leg("e1", "a", "b", 30.0), leg("e2", "b", "c", 20.0)]);
        assert_eq!(route.len(), 2);
        assert_eq!(route.nodes(), ["a", "b", "c"]);
        assert!((route.total_weight() - 50.0).abs() < f64::EPSILON);
        assert!(route.contains_node("b"));
        assert!(!route.contains_node("z"));
    }

    #[test]
    fn empty_route_has_no_nodes() {
        let route = Route::new(Vec::new());
        assert!(route.is_empty());
        assert!(route.nodes().is_empty());
        assert!((route.total_weight()).abs() < f64::EPSILON);
    }

    #[test]
    fn exports_one_feature_per_leg() {
        let graph = graph();
        let route = Route::new(vec![leg("e1", "a", "b", 30.0), leg("e2", "b", "c", 20.0)]);

        let collection = route.to_feature_collection(&graph).unwrap();
        assert_eq!(collection.features.len(), 2);

        let first = &collection.features[0];
        assert!(first.geometry.is_some());
        let properties = first.properties.as_ref().unwrap();
        assert_eq!(properties["segment"], "e1");
        assert_eq!(properties["to_name"], "Waypoint b");
        assert_eq!(properties["start"], "walk e1");
    }
}
