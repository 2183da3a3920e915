//! Session tuning knobs

use serde::{Deserialize, Serialize};

use crate::Error;

/// Distance thresholds and matching policy for a guidance session.
///
/// All distances are venue-local meters. Every comparison adds
/// `precision` on top of the configured threshold, absorbing the
/// positioning jitter of the venue's survey.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// A match further than this from its waypoint is treated as noise.
    pub assignation_distance: f64,
    /// Slack added on top of every distance comparison.
    pub precision: f64,
    /// Mid-course instructions fire within this distance of the
    /// current segment's target.
    pub distance_threshold: f64,
    /// Arrival instructions fire within this distance of the current
    /// segment's target.
    pub near_threshold: f64,
    /// Reject skip-ahead advancement: a match further along the route
    /// than the immediate next waypoint triggers recalculation instead.
    pub strict_routing: bool,
    /// Language tag used to pick authored instruction sets at load time.
    pub language: String,
    /// Rank beacon observations by signal strength instead of ranging
    /// accuracy.
    pub use_rssi: bool,
    /// Readings that must be accepted after a recalculation before
    /// another recalculation may trigger.
    pub recalculation_cooldown: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            assignation_distance: 5.0,
            precision: 1.0,
            distance_threshold: 8.0,
            near_threshold: 4.0,
            strict_routing: false,
            language: "en-GB".to_string(),
            use_rssi: false,
            recalculation_cooldown: 3,
        }
    }
}

impl EngineConfig {
    /// Outer bound for accepting a match as the tracked position.
    #[must_use]
    pub fn assignation_limit(&self) -> f64 {
        self.assignation_distance + self.precision
    }

    /// Outer bound of the mid-course firing window.
    #[must_use]
    pub fn mid_course_limit(&self) -> f64 {
        self.distance_threshold + self.precision
    }

    /// Outer bound of the arrival firing window.
    #[must_use]
    pub fn arrival_limit(&self) -> f64 {
        self.near_threshold + self.precision
    }

    /// # Errors
    ///
    /// Returns `InvalidData` when a distance is negative or the arrival
    /// window is wider than the mid-course window.
    pub fn validate(&self) -> Result<(), Error> {
        let distances = [
            self.assignation_distance,
            self.precision,
            self.distance_threshold,
            self.near_threshold,
        ];
        if distances.iter().any(|d| !d.is_finite() || *d < 0.0) {
            return Err(Error::InvalidData(
                "engine distances must be finite and non-negative".to_string(),
            ));
        }
        if self.near_threshold > self.distance_threshold {
            return Err(Error::InvalidData(format!(
                "near_threshold ({}) must not exceed distance_threshold ({})",
                self.near_threshold, self.distance_threshold
            )));
        }
        if self.language.is_empty() {
            return Err(Error::InvalidData("language must not be empty".to_string()));
        }
        Ok(())
    }
}
