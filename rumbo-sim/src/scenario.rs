//! Scripted walk scenarios
//!
//! A scenario is a TOML file describing one guided walk: the session
//! endpoints, optional engine configuration overrides and the sequence
//! of readings the simulated traveller produces.

use std::collections::VecDeque;
use std::path::Path;

use chrono::Utc;
use geo::Point;
use rumbo_core::guidance::{EngineConfig, PositionSource};
use rumbo_core::matching::{BeaconObservation, Reading};
use rumbo_core::model::BeaconId;
use serde::Deserialize;

use crate::error::Error;

#[derive(Debug, Deserialize)]
pub struct Scenario {
    /// Instruction language the venue is loaded with.
    #[serde(default = "default_language")]
    pub language: String,
    /// Waypoint id the walk starts from.
    pub from: String,
    /// Waypoint id the walk heads to.
    pub to: String,
    /// Pause between readings when replayed in real time.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Engine configuration overrides; unset fields keep their defaults.
    #[serde(default)]
    pub config: EngineConfig,
    #[serde(default)]
    readings: Vec<RawReading>,
}

fn default_language() -> String {
    "en-GB".to_string()
}

fn default_interval_ms() -> u64 {
    1000
}

/// One scripted reading: either a coordinate fix (`x`/`y`) or a beacon
/// ranging sample (`beacons`), never both.
#[derive(Debug, Deserialize)]
struct RawReading {
    x: Option<f64>,
    y: Option<f64>,
    #[serde(default)]
    beacons: Vec<RawBeacon>,
}

#[derive(Debug, Deserialize)]
struct RawBeacon {
    major: u16,
    minor: u16,
    accuracy: Option<f64>,
    rssi: Option<i16>,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)?;
        let scenario: Self = toml::from_str(&text)?;
        if scenario.readings.is_empty() {
            return Err(Error::InvalidScenario(format!(
                "{} contains no readings",
                path.display()
            )));
        }
        Ok(scenario)
    }

    /// Converts the scripted readings into a replayable source.
    pub fn source(&self) -> Result<ScriptedSource, Error> {
        let mut readings = VecDeque::with_capacity(self.readings.len());
        for (index, raw) in self.readings.iter().enumerate() {
            readings.push_back(raw.to_reading(index)?);
        }
        Ok(ScriptedSource { readings })
    }
}

impl RawReading {
    fn to_reading(&self, index: usize) -> Result<Reading, Error> {
        match (self.x, self.y, self.beacons.is_empty()) {
            (Some(x), Some(y), true) => Ok(Reading::Fix(Point::new(x, y))),
            (None, None, false) => Ok(Reading::Beacons(
                self.beacons.iter().map(RawBeacon::to_observation).collect(),
            )),
            _ => Err(Error::InvalidScenario(format!(
                "reading {index} must carry either x/y or beacons"
            ))),
        }
    }
}

impl RawBeacon {
    fn to_observation(&self) -> BeaconObservation {
        BeaconObservation {
            accuracy: self.accuracy,
            rssi: self.rssi,
            observed_at: Some(Utc::now()),
            ..BeaconObservation::new(BeaconId::new(self.major, self.minor))
        }
    }
}

/// Replays scripted readings in order.
pub struct ScriptedSource {
    readings: VecDeque<Reading>,
}

impl ScriptedSource {
    #[must_use]
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

impl PositionSource for ScriptedSource {
    fn next_reading(&mut self) -> Option<Reading> {
        self.readings.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mixed_readings() {
        let scenario: Scenario = toml::from_str(
            r#"
            from = "a"
            to = "b"
            interval_ms = 250

            [config]
            distance_threshold = 10.0

            [[readings]]
            x = 1.0
            y = 2.0

            [[readings]]
            beacons = [{ major = 1, minor = 2, accuracy = 3.0 }]
            "#,
        )
        .unwrap();

        assert_eq!(scenario.language, "en-GB");
        assert_eq!(scenario.interval_ms, 250);
        assert!((scenario.config.distance_threshold - 10.0).abs() < f64::EPSILON);

        let mut source = scenario.source().unwrap();
        assert_eq!(source.len(), 2);
        assert!(matches!(source.next_reading(), Some(Reading::Fix(_))));
        match source.next_reading() {
            Some(Reading::Beacons(sample)) => {
                assert_eq!(sample.len(), 1);
                assert_eq!(sample[0].beacon, BeaconId::new(1, 2));
                assert_eq!(sample[0].accuracy, Some(3.0));
                assert!(sample[0].observed_at.is_some());
            }
            other => panic!("expected a beacon sample, got {other:?}"),
        }
        assert!(source.next_reading().is_none());
    }

    #[test]
    fn rejects_ambiguous_readings() {
        let scenario: Scenario = toml::from_str(
            r#"
            from = "a"
            to = "b"

            [[readings]]
            x = 1.0
            y = 2.0
            beacons = [{ major = 1, minor = 2 }]
            "#,
        )
        .unwrap();
        assert!(matches!(
            scenario.source(),
            Err(Error::InvalidScenario(_))
        ));
    }

    #[test]
    fn rejects_half_coordinates() {
        let scenario: Scenario = toml::from_str(
            r#"
            from = "a"
            to = "b"

            [[readings]]
            x = 1.0
            "#,
        )
        .unwrap();
        assert!(scenario.source().is_err());
    }
}
