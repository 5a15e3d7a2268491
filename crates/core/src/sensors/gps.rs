//! GPS fix and local position arithmetic
//!
//! Positions stay in integer 1e-7 degree units. Offsets between two points
//! use an equirectangular projection: exact enough over a few kilometres,
//! not usable near the poles.

use crate::fixed::{trig, Fix32};

/// Equatorial circumference in metres
const EARTH_CIRCUMFERENCE_M: i128 = 40_075_000;

/// 360 degrees in 1e-7 degree units
const FULL_TURN_E7: i64 = 3_600_000_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FixType {
    #[default]
    NoFix,
    Fix2d,
    Fix3d,
}

/// Navigation solution as reported by the receiver
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GpsFix {
    /// Latitude, 1e-7 degrees
    pub lat_e7: i32,
    /// Longitude, 1e-7 degrees
    pub lon_e7: i32,
    /// Height above mean sea level, millimetres
    pub alt_mm: i32,
    /// North velocity, mm/s
    pub vel_n_mm_s: i32,
    /// East velocity, mm/s
    pub vel_e_mm_s: i32,
    /// Down velocity, mm/s
    pub vel_d_mm_s: i32,
    pub fix_type: FixType,
    pub satellites: u8,
}

impl GpsFix {
    pub fn has_3d_fix(&self) -> bool {
        self.fix_type == FixType::Fix3d
    }

    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.lat_e7, self.lon_e7)
    }

    pub fn altitude_m(&self) -> Fix32 {
        mm_to_m(self.alt_mm)
    }

    pub fn vel_north(&self) -> Fix32 {
        mm_to_m(self.vel_n_mm_s)
    }

    pub fn vel_east(&self) -> Fix32 {
        mm_to_m(self.vel_e_mm_s)
    }

    pub fn vel_up(&self) -> Fix32 {
        -mm_to_m(self.vel_d_mm_s)
    }
}

/// Millimetres to metres, saturating at the Q16.16 range
fn mm_to_m(mm: i32) -> Fix32 {
    let raw = ((mm as i64) << 16) / 1000;
    Fix32::from_raw(raw.clamp(i32::MIN as i64, i32::MAX as i64) as i32)
}

/// Latitude/longitude in 1e-7 degrees
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeoPoint {
    pub lat_e7: i32,
    pub lon_e7: i32,
}

impl GeoPoint {
    pub const fn new(lat_e7: i32, lon_e7: i32) -> Self {
        Self { lat_e7, lon_e7 }
    }

    /// Latitude in radians
    pub fn lat_rad(&self) -> Fix32 {
        // 1e-7 degrees to Q16.16 degrees, then to radians
        let deg = Fix32::from_raw(((self.lat_e7 as i64) * 65536 / 10_000_000) as i32);
        deg * Fix32::DEG_TO_RAD
    }

    /// (north, east) metres from `self` to `target`
    ///
    /// The longitude difference is wrapped to +-180 degrees so the
    /// antimeridian does not produce a 40000 km detour. Results saturate at
    /// the Q16.16 range (about 32 km).
    pub fn offset_to(&self, target: &GeoPoint) -> (Fix32, Fix32) {
        let d_lat = target.lat_e7 as i64 - self.lat_e7 as i64;
        let mut d_lon = target.lon_e7 as i64 - self.lon_e7 as i64;
        if d_lon > FULL_TURN_E7 / 2 {
            d_lon -= FULL_TURN_E7;
        } else if d_lon < -FULL_TURN_E7 / 2 {
            d_lon += FULL_TURN_E7;
        }

        let cos_lat = trig::cos(self.lat_rad());
        let north = e7_to_metres(d_lat, 1 << 16);
        let east = e7_to_metres(d_lon, cos_lat.raw() as i128);
        (north, east)
    }

    /// Point displaced by (north, east) metres
    pub fn displaced(&self, north_m: f32, east_m: f32) -> GeoPoint {
        let metres_per_e7 = EARTH_CIRCUMFERENCE_M as f32 / 360.0 / 1e7;
        let cos_lat = libm::cosf(self.lat_rad().to_f32());
        let d_lat = north_m / metres_per_e7;
        let d_lon = if cos_lat.abs() > 1e-6 {
            east_m / (metres_per_e7 * cos_lat)
        } else {
            0.0
        };
        GeoPoint::new(
            self.lat_e7.saturating_add(libm::roundf(d_lat) as i32),
            self.lon_e7.saturating_add(libm::roundf(d_lon) as i32),
        )
    }
}

/// `delta_e7 * scale` (Q16.16 scale) converted to metres on the sphere
fn e7_to_metres(delta_e7: i64, scale_raw: i128) -> Fix32 {
    let raw = delta_e7 as i128 * EARTH_CIRCUMFERENCE_M * scale_raw / (360 * 10_000_000);
    Fix32::from_raw(raw.clamp(i32::MIN as i128, i32::MAX as i128) as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_degree_north_is_111_km_saturated() {
        let a = GeoPoint::new(0, 0);
        let b = GeoPoint::new(10_000_000, 0);
        let (n, e) = a.offset_to(&b);
        assert_eq!(n, Fix32::MAX);
        assert_eq!(e, Fix32::ZERO);
    }

    #[test]
    fn test_short_offsets() {
        let home = GeoPoint::new(480_000_000, 110_000_000);
        // 0.0001 deg latitude = 11.13 m
        let (n, _) = home.offset_to(&GeoPoint::new(480_001_000, 110_000_000));
        assert!((n.to_f32() - 11.132).abs() < 0.01, "north {}", n);
        // 0.0001 deg longitude at 48 deg = 7.45 m
        let (_, e) = home.offset_to(&GeoPoint::new(480_000_000, 110_001_000));
        assert!((e.to_f32() - 7.449).abs() < 0.01, "east {}", e);
    }

    #[test]
    fn test_antimeridian_wrap() {
        let a = GeoPoint::new(0, 1_799_999_000);
        let b = GeoPoint::new(0, -1_799_999_000);
        let (_, e) = a.offset_to(&b);
        assert!((e.to_f32() - 22.26).abs() < 0.05, "east {}", e);
    }

    #[test]
    fn test_displaced_round_trip() {
        let home = GeoPoint::new(523_000_000, 134_000_000);
        let p = home.displaced(30.0, -40.0);
        let (n, e) = home.offset_to(&p);
        assert!((n.to_f32() - 30.0).abs() < 0.05, "north {}", n);
        assert!((e.to_f32() + 40.0).abs() < 0.05, "east {}", e);
    }

    #[test]
    fn test_velocity_conversions() {
        let fix = GpsFix {
            vel_n_mm_s: 1500,
            vel_e_mm_s: -250,
            vel_d_mm_s: 500,
            alt_mm: 123_456,
            ..Default::default()
        };
        assert!((fix.vel_north().to_f32() - 1.5).abs() < 1e-4);
        assert!((fix.vel_east().to_f32() + 0.25).abs() < 1e-4);
        assert!((fix.vel_up().to_f32() + 0.5).abs() < 1e-4);
        assert!((fix.altitude_m().to_f32() - 123.456).abs() < 1e-3);
    }
}
