//! Bearing estimation from consecutive coordinate fixes

use geo::Point;

/// Signed angle, in degrees, between the direction of travel
/// (`previous -> current`) and the direction towards the target
/// (`current -> target`).
///
/// Positive means the target lies to the left of travel, negative to
/// the right; zero means straight ahead. Returns `None` when either
/// vector is degenerate (no movement, or standing on the target).
#[must_use]
pub fn bearing_change(
    previous: Point<f64>,
    current: Point<f64>,
    target: Point<f64>,
) -> Option<f64> {
    let travel = (current.x() - previous.x(), current.y() - previous.y());
    let towards = (target.x() - current.x(), target.y() - current.y());

    if (travel.0 == 0.0 && travel.1 == 0.0) || (towards.0 == 0.0 && towards.1 == 0.0) {
        return None;
    }

    let cross = travel.0 * towards.1 - travel.1 * towards.0;
    let dot = travel.0 * towards.0 + travel.1 * towards.1;
    Some(cross.atan2(dot).to_degrees())
}
