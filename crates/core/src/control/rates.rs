//! Stick to rotation rate curve
//!
//! The "actual" curve: linear with the center sensitivity near the middle,
//! bending towards the max rate at full deflection. It is tabulated once at
//! 257 stick positions per axis and read back by linear interpolation.

use crate::fixed::Fix32;
use crate::parameters::{AxisRate, RateParams};

/// 257 stick positions plus one pad entry so `index + 1` stays valid at full stick
const TABLE_LEN: usize = 258;

/// Curve coefficients in controller units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateCoefficients {
    pub center: Fix32,
    pub max: Fix32,
    pub expo: Fix32,
}

impl From<&AxisRate> for RateCoefficients {
    fn from(rate: &AxisRate) -> Self {
        Self {
            center: Fix32::from_f32(rate.center),
            max: Fix32::from_f32(rate.max),
            expo: Fix32::from_f32(rate.expo),
        }
    }
}

impl RateCoefficients {
    /// Exact curve value in deg/s for `stick` in -1..1
    pub fn rate(&self, stick: Fix32) -> Fix32 {
        let expo = self.expo.clamp(Fix32::ZERO, Fix32::ONE);
        let stick2 = stick * stick;
        let stick6 = stick2 * stick2 * stick2;
        let linear = stick * self.center;
        let curved = (expo * stick6 + (Fix32::ONE - expo) * stick2) * (self.max - self.center);
        linear + curved * stick.sign()
    }
}

#[derive(Debug, Clone)]
pub struct RateCurve {
    table: [[Fix32; TABLE_LEN]; 3],
}

impl RateCurve {
    pub fn new(params: &RateParams) -> Self {
        let mut table = [[Fix32::ZERO; TABLE_LEN]; 3];
        for (axis, row) in table.iter_mut().enumerate() {
            let coefficients = RateCoefficients::from(&params.axes[axis]);
            for (j, entry) in row.iter_mut().take(TABLE_LEN - 1).enumerate() {
                let stick = Fix32::from_int(j as i32 - 128) / 128;
                *entry = coefficients.rate(stick);
            }
            row[TABLE_LEN - 1] = row[TABLE_LEN - 2];
        }
        Self { table }
    }

    /// Rate in deg/s for `stick` in -1..1 on axis 0 (roll), 1 (pitch) or 2 (yaw)
    ///
    /// Sticks beyond full deflection read as full deflection.
    pub fn rate(&self, stick: Fix32, axis: usize) -> Fix32 {
        let row = &self.table[axis.min(2)];
        // Q16.16 stick to a signed 8.8 table position
        let v = (stick.raw() >> 1).clamp(-32768, 32768);
        let high = ((v >> 8) + 128) as usize;
        let alpha = (v & 0xFF) as i64;
        let lower = row[high].raw() as i64;
        let upper = row[high + 1].raw() as i64;
        Fix32::from_raw((lower + (((upper - lower) * alpha) >> 8)) as i32)
    }
}

impl Default for RateCurve {
    fn default() -> Self {
        Self::new(&RateParams::default())
    }
}
