//! Sensor sample types delivered by the drivers
//!
//! Drivers are external collaborators. They hand the core plain structs of
//! raw counts; a sample is delivered as `Some(..)` only when the driver has
//! new data, which doubles as the "new data" flag.

pub mod baro;
pub mod gps;

pub use baro::BaroCalibration;
pub use gps::{FixType, GeoPoint, GpsFix};

use crate::fixed::Fix32;

/// Gyro full scale: +-2000 deg/s over the signed 16-bit range
pub const GYRO_RAW_TO_RAD_PER_SEC: f32 = core::f32::consts::PI * 4000.0 / 65536.0 / 180.0;

/// Accelerometer full scale: +-16 g over the signed 16-bit range
pub const ACCEL_RAW_TO_M_PER_SEC2: Fix32 = Fix32::from_raw(314);

/// Standard gravity
pub const GRAVITY: Fix32 = Fix32::from_raw(642_908);

/// Gyro and accelerometer readings from one IMU transaction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImuSample {
    pub gyro: [i16; 3],
    pub accel: [i16; 3],
}

/// Magnetometer reading, hard-iron offset already removed by the driver
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MagSample {
    pub field: [i16; 3],
}

/// Raw barometer conversion result
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BaroSample {
    pub pressure_raw: i32,
    pub temperature_raw: i32,
}

/// Maps sensor axes onto the body frame
///
/// Each body axis takes one sensor axis, optionally negated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardAlignment {
    source: [usize; 3],
    negate: [bool; 3],
}

impl Default for BoardAlignment {
    /// Sensor x points right, y forward, z up
    fn default() -> Self {
        Self {
            source: [1, 0, 2],
            negate: [false, false, true],
        }
    }
}

impl BoardAlignment {
    /// Sensor axes already match the body frame
    pub const IDENTITY: Self = Self {
        source: [0, 1, 2],
        negate: [false, false, false],
    };

    /// Custom mapping. Returns `None` unless `source` is a permutation of 0..3.
    pub fn new(source: [usize; 3], negate: [bool; 3]) -> Option<Self> {
        let mut seen = [false; 3];
        for &s in &source {
            if s > 2 || seen[s] {
                return None;
            }
            seen[s] = true;
        }
        Some(Self { source, negate })
    }

    pub fn apply(&self, raw: [i16; 3]) -> [i32; 3] {
        let mut out = [0i32; 3];
        for (axis, value) in out.iter_mut().enumerate() {
            let v = raw[self.source[axis]] as i32;
            *value = if self.negate[axis] { -v } else { v };
        }
        out
    }
}
