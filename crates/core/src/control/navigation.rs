//! Autopilot guidance towards a point

use crate::fixed::{trig, Fix32};
use crate::sensors::GeoPoint;

/// Vertical guidance limit, m/s
pub const MAX_VERTICAL_SPEED: Fix32 = Fix32::from_int(5);

/// Time the guidance aims to take to reach the target, seconds
const TIME_TO_TARGET: i32 = 2;

/// Velocity command towards a target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Guidance {
    pub north: Fix32,
    pub east: Fix32,
    /// Up positive
    pub vertical: Fix32,
    /// Horizontal distance to the target, metres
    pub distance: Fix32,
    /// Bearing to the target, radians from north
    pub bearing: Fix32,
}

/// Horizontal distance for a (north, east) offset without squaring large values
pub fn horizontal_distance(north: Fix32, east: Fix32) -> Fix32 {
    let (a, b) = (north.abs(), east.abs());
    let (big, small) = if a >= b { (a, b) } else { (b, a) };
    if big.is_zero() {
        return Fix32::ZERO;
    }
    let ratio = small / big;
    big * trig::sqrt(Fix32::ONE + ratio * ratio)
}

/// Velocity command that reaches `to` in about two seconds, capped at `max_hvel`
///
/// Uses the equirectangular projection of [`GeoPoint::offset_to`]; fine for
/// the few kilometres a return-to-home covers.
pub fn navigate_to(
    from: &GeoPoint,
    altitude: Fix32,
    to: &GeoPoint,
    target_altitude: Fix32,
    max_hvel: Fix32,
) -> Guidance {
    let (north, east) = from.offset_to(to);
    let distance = horizontal_distance(north, east);
    let bearing = trig::atan2(east, north);

    let mut speed = distance / TIME_TO_TARGET;
    let mut eta = Fix32::from_int(TIME_TO_TARGET);
    if speed > max_hvel {
        speed = max_hvel;
        eta = if speed > Fix32::ZERO {
            distance / speed
        } else {
            Fix32::from_int(TIME_TO_TARGET)
        };
    }

    let (sin_b, cos_b) = trig::sin_cos(bearing);
    let vertical = ((target_altitude - altitude) / eta).clamp(-MAX_VERTICAL_SPEED, MAX_VERTICAL_SPEED);
    Guidance {
        north: cos_b * speed,
        east: sin_b * speed,
        vertical,
        distance,
        bearing,
    }
}
