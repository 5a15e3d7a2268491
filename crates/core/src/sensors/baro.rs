//! Barometer calibration and pressure altitude

use super::BaroSample;
use crate::fixed::{Fix32, Fix64};

/// Vendor calibration of a pressure sensor
///
/// Raw counts are scaled by `kp` / `kt`, then pressure in Pa is
/// `c00 + c10 p + c01 t + c20 p^2 + c11 p t + c02 t^2`.
/// Evaluated in Q48.16 since pressures exceed the Q16.16 range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaroCalibration {
    pub kp: i32,
    pub kt: i32,
    pub c00: Fix64,
    pub c10: Fix64,
    pub c01: Fix64,
    pub c20: Fix64,
    pub c11: Fix64,
    pub c02: Fix64,
}

impl Default for BaroCalibration {
    /// Raw pressure counts are already pascals
    fn default() -> Self {
        Self {
            kp: 1,
            kt: 1,
            c00: Fix64::ZERO,
            c10: Fix64::ONE,
            c01: Fix64::ZERO,
            c20: Fix64::ZERO,
            c11: Fix64::ZERO,
            c02: Fix64::ZERO,
        }
    }
}

/// Piecewise-linear pressure altitude segments: (lower bound hPa, slope m/hPa, offset m)
const ALTITUDE_SEGMENTS: [(f32, f32, f32); 3] = [
    (845.0, -8.994, 9114.0),
    (633.0, -11.565, 11284.0),
    (f32::MIN, -16.087, 14146.0),
];

impl BaroCalibration {
    /// Pressure in Pa
    pub fn pressure_pa(&self, sample: &BaroSample) -> Fix64 {
        let kp = self.kp.max(1) as i64;
        let kt = self.kt.max(1) as i64;
        let p = Fix64::from_int(sample.pressure_raw as i64) / kp;
        let t = Fix64::from_int(sample.temperature_raw as i64) / kt;
        self.c00 + self.c10 * p + self.c01 * t + self.c20 * p * p + self.c11 * p * t + self.c02 * t * t
    }

    /// Pressure altitude above mean sea level in metres
    pub fn altitude_m(&self, sample: &BaroSample) -> Fix32 {
        altitude_from_hpa((self.pressure_pa(sample) / 100i64).to_fix32_saturating())
    }
}

/// Pressure altitude for a pressure in hPa
///
/// Three linear segments instead of the barometric formula, so no
/// logarithms or powers are needed at the sensor rate.
pub fn altitude_from_hpa(hpa: Fix32) -> Fix32 {
    let mut segment = ALTITUDE_SEGMENTS[ALTITUDE_SEGMENTS.len() - 1];
    for s in ALTITUDE_SEGMENTS {
        if hpa > Fix32::from_f32(s.0) {
            segment = s;
            break;
        }
    }
    Fix32::from_f32(segment.1) * hpa + Fix32::from_f32(segment.2)
}

/// Inverse of [`altitude_from_hpa`], used to synthesize sensor data
pub fn hpa_from_altitude(altitude_m: f32) -> f32 {
    for (lower, slope, offset) in ALTITUDE_SEGMENTS {
        let hpa = (altitude_m - offset) / slope;
        if hpa > lower {
            return hpa;
        }
    }
    let (_, slope, offset) = ALTITUDE_SEGMENTS[ALTITUDE_SEGMENTS.len() - 1];
    (altitude_m - offset) / slope
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_calibration_passes_pascals_through() {
        let cal = BaroCalibration::default();
        let s = BaroSample {
            pressure_raw: 101_325,
            temperature_raw: 2500,
        };
        assert_eq!(cal.pressure_pa(&s).to_int(), 101_325);
    }

    #[test]
    fn test_polynomial_terms() {
        let cal = BaroCalibration {
            kp: 2,
            kt: 4,
            c00: Fix64::from_int(100),
            c10: Fix64::from_int(3),
            c01: Fix64::from_int(5),
            c20: Fix64::from_int(1),
            c11: Fix64::from_int(2),
            c02: Fix64::from_int(1),
        };
        // p = 10, t = 2: 100 + 30 + 10 + 100 + 40 + 4
        let s = BaroSample {
            pressure_raw: 20,
            temperature_raw: 8,
        };
        assert_eq!(cal.pressure_pa(&s), Fix64::from_int(284));
    }

    #[test]
    fn test_altitude_segments() {
        let sea = altitude_from_hpa(Fix32::from_f32(1013.25)).to_f32();
        assert!(sea.abs() < 5.0, "sea level {}", sea);
        let high = altitude_from_hpa(Fix32::from_f32(700.0)).to_f32();
        assert!((high - (-11.565 * 700.0 + 11284.0)).abs() < 0.5, "{}", high);
    }

    #[test]
    fn test_altitude_resolves_decimetres() {
        let a = altitude_from_hpa(Fix32::from_f32(1000.0));
        let b = altitude_from_hpa(Fix32::from_f32(999.99));
        let d = (b - a).to_f32();
        assert!((d - 0.09).abs() < 0.01, "delta {}", d);
    }

    #[test]
    fn test_inverse_round_trip() {
        for alt in [-50.0f32, 0.0, 120.0, 1500.0, 4000.0] {
            let hpa = hpa_from_altitude(alt);
            let back = altitude_from_hpa(Fix32::from_f32(hpa)).to_f32();
            assert!((back - alt).abs() < 0.05, "{} -> {} hPa -> {}", alt, hpa, back);
        }
    }
}
