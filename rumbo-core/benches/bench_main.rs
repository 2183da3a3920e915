//! Routing and matching benchmarks over a generated grid venue.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use geo::Point;
use rumbo_core::matching::{BeaconObservation, ProximityMatcher};
use rumbo_core::model::{
    BeaconId, InstructionSet, PathSegment, VenueGraph, VenueGraphBuilder, Waypoint,
};
use rumbo_core::routing::{can_route, shortest_route};
use rumbo_core::{DEFAULT_WAYPOINT_ACCURACY, DEFAULT_WAYPOINT_RSSI};

/// Square grid venue, `side * side` waypoints 10 m apart, bidirectional
/// segments between 4-neighbours, a beacon on every waypoint.
fn grid_venue(side: u16) -> VenueGraph {
    let mut builder = VenueGraphBuilder::new();
    for row in 0..side {
        for col in 0..side {
            builder.add_waypoint(Waypoint {
                id: format!("n-{row}-{col}"),
                name: format!("Waypoint {row}/{col}"),
                geometry: Some(Point::new(f64::from(col) * 10.0, f64::from(row) * 10.0)),
                beacon: Some(BeaconId::new(row, col)),
                accuracy: DEFAULT_WAYPOINT_ACCURACY,
                rssi: DEFAULT_WAYPOINT_RSSI,
                kinds: Vec::new(),
            });
        }
    }
    let mut connect = |a: (u16, u16), b: (u16, u16)| {
        builder.add_segment(PathSegment {
            id: format!("s-{}-{}-{}-{}", a.0, a.1, b.0, b.1),
            source: format!("n-{}-{}", a.0, a.1),
            target: format!("n-{}-{}", b.0, b.1),
            weight: 10.0,
            instructions: InstructionSet::empty("en-GB"),
        });
    };
    for row in 0..side {
        for col in 0..side {
            if col + 1 < side {
                connect((row, col), (row, col + 1));
                connect((row, col + 1), (row, col));
            }
            if row + 1 < side {
                connect((row, col), (row + 1, col));
                connect((row + 1, col), (row, col));
            }
        }
    }
    builder.build().unwrap()
}

fn bench_routing(c: &mut Criterion) {
    let mut group = c.benchmark_group("routing");
    for side in [10u16, 20, 40] {
        let graph = grid_venue(side);
        let from = graph.node("n-0-0").unwrap();
        let to = graph.node(&format!("n-{}-{}", side - 1, side - 1)).unwrap();

        group.bench_with_input(
            BenchmarkId::new("shortest_route", side),
            &graph,
            |b, graph| {
                b.iter(|| black_box(shortest_route(graph, from, to)));
            },
        );
        group.bench_with_input(BenchmarkId::new("can_route", side), &graph, |b, graph| {
            b.iter(|| black_box(can_route(graph, from, to)));
        });
    }
    group.finish();
}

fn bench_matching(c: &mut Criterion) {
    let graph = grid_venue(20);

    c.bench_function("nearest_waypoint", |b| {
        let query = Point::new(97.3, 42.8);
        b.iter(|| black_box(graph.nearest_waypoint(query)));
    });

    c.bench_function("proximity_match", |b| {
        // a scan reporting every beacon in a 3x3 neighbourhood
        let sample: Vec<_> = (0..3u16)
            .flat_map(|row| {
                (0..3u16).map(move |col| BeaconObservation {
                    accuracy: Some(1.0 + f64::from(row * 3 + col)),
                    rssi: Some(-60 - i16::try_from(row * 8 + col).unwrap()),
                    ..BeaconObservation::new(BeaconId::new(row + 4, col + 4))
                })
            })
            .collect();
        let mut matcher = ProximityMatcher::new(false);
        b.iter(|| black_box(matcher.match_sample(&graph, &sample)));
    });
}

criterion_group!(benches, bench_routing, bench_matching);
criterion_main!(benches);
