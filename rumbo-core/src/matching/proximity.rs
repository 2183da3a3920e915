//! Beacon proximity matching with observation merging
//!
//! Beacon advertisements are sparse: one sample may carry accuracy but
//! no battery level, the next the reverse. The matcher keeps the last
//! known value of every field per beacon and merges each new sample
//! into that history before ranking, so a field missing from the
//! current sample does not throw the match away.

use chrono::{DateTime, Utc};
use hashbrown::HashMap;
use log::trace;

use super::PositionMatch;
use crate::model::{BeaconId, VenueGraph, Waypoint};

/// One ranged beacon in a scan sample. Every field other than the
/// identity is optional; radios rarely report all of them at once.
#[derive(Debug, Clone, PartialEq)]
pub struct BeaconObservation {
    pub beacon: BeaconId,
    /// Estimated ranging accuracy in meters. Negative values mean the
    /// radio could not produce an estimate.
    pub accuracy: Option<f64>,
    /// Received signal strength in dBm.
    pub rssi: Option<i16>,
    pub tx_power: Option<i16>,
    pub battery: Option<u8>,
    pub observed_at: Option<DateTime<Utc>>,
}

impl BeaconObservation {
    #[must_use]
    pub fn new(beacon: BeaconId) -> Self {
        Self {
            beacon,
            accuracy: None,
            rssi: None,
            tx_power: None,
            battery: None,
            observed_at: None,
        }
    }

    /// Field-wise merge with an older observation of the same beacon;
    /// `self` wins wherever it carries a value.
    #[must_use]
    pub fn merged_with(&self, older: &Self) -> Self {
        Self {
            beacon: self.beacon,
            accuracy: self.accuracy.or(older.accuracy),
            rssi: self.rssi.or(older.rssi),
            tx_power: self.tx_power.or(older.tx_power),
            battery: self.battery.or(older.battery),
            observed_at: self.observed_at.or(older.observed_at),
        }
    }
}

/// Stateful matcher for beacon venues.
#[derive(Debug, Default)]
pub struct ProximityMatcher {
    history: HashMap<BeaconId, BeaconObservation>,
    use_rssi: bool,
}

impl ProximityMatcher {
    #[must_use]
    pub fn new(use_rssi: bool) -> Self {
        Self {
            history: HashMap::new(),
            use_rssi,
        }
    }

    /// Match one ranging sample against the graph.
    ///
    /// Observations are merged into the per-beacon history, filtered
    /// down to those with usable confidence, ranked best-first
    /// (smallest accuracy, or strongest signal when matching by RSSI)
    /// and the first one that activates its waypoint wins.
    pub fn match_sample(
        &mut self,
        graph: &VenueGraph,
        sample: &[BeaconObservation],
    ) -> Option<PositionMatch> {
        let mut merged: Vec<BeaconObservation> = sample
            .iter()
            .map(|observation| {
                let observation = match self.history.get(&observation.beacon) {
                    Some(previous) => observation.merged_with(previous),
                    None => observation.clone(),
                };
                self.history.insert(observation.beacon, observation.clone());
                observation
            })
            .collect();

        if self.use_rssi {
            merged.retain(|observation| observation.rssi.is_some());
            merged.sort_by(|a, b| b.rssi.cmp(&a.rssi));
        } else {
            merged.retain(|observation| observation.accuracy.is_some_and(|a| a >= 0.0));
            merged.sort_by(|a, b| confidence(a).total_cmp(&confidence(b)));
        }

        for observation in &merged {
            let Some(node) = graph.node_by_beacon(observation.beacon) else {
                trace!("beacon {} is not part of the graph", observation.beacon);
                continue;
            };
            let waypoint = graph.waypoint(node)?;
            if !activates(waypoint, observation, self.use_rssi) {
                trace!(
                    "beacon {} seen but outside waypoint {} activation range",
                    observation.beacon, waypoint.id
                );
                continue;
            }
            return Some(PositionMatch {
                node,
                waypoint: waypoint.id.clone(),
                distance: observation.accuracy.unwrap_or(0.0),
                position: None,
            });
        }

        None
    }

    /// Drop the accumulated per-beacon history.
    pub fn clear(&mut self) {
        self.history.clear();
    }
}

fn confidence(observation: &BeaconObservation) -> f64 {
    observation.accuracy.unwrap_or(f64::INFINITY)
}

/// Activation gate: the observation must beat the waypoint's declared
/// threshold before the waypoint can claim a match.
fn activates(waypoint: &Waypoint, observation: &BeaconObservation, use_rssi: bool) -> bool {
    if use_rssi {
        observation.rssi.is_some_and(|rssi| rssi > waypoint.rssi)
    } else {
        observation
            .accuracy
            .is_some_and(|accuracy| accuracy < waypoint.accuracy)
    }
}
