//! Rate Curve Parameter Definitions
//!
//! # Parameters
//!
//! Per axis (`R` roll, `P` pitch, `Y` yaw):
//!
//! - `RATE_<A>_CTR` - Center sensitivity, deg/s at full stick if the curve were linear
//! - `RATE_<A>_MAX` - Rate at full stick deflection, deg/s
//! - `RATE_<A>_EXPO` - Blend between the s^2 and s^6 parts of the curve (0..1)

use super::error::ParameterError;
use super::storage::{ParamFlags, ParamValue, ParameterStore};

const CENTER_NAMES: [&str; 3] = ["RATE_R_CTR", "RATE_P_CTR", "RATE_Y_CTR"];
const MAX_NAMES: [&str; 3] = ["RATE_R_MAX", "RATE_P_MAX", "RATE_Y_MAX"];
const EXPO_NAMES: [&str; 3] = ["RATE_R_EXPO", "RATE_P_EXPO", "RATE_Y_EXPO"];

const DEFAULT_CENTER: f32 = 170.0;
const DEFAULT_MAX: f32 = 900.0;
const DEFAULT_EXPO: f32 = 0.57;

/// Highest rate either coefficient may request, deg/s
pub const MAX_RATE_LIMIT: f32 = 2000.0;

/// "Actual" rate curve coefficients of one axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisRate {
    pub center: f32,
    pub max: f32,
    pub expo: f32,
}

impl Default for AxisRate {
    fn default() -> Self {
        Self {
            center: DEFAULT_CENTER,
            max: DEFAULT_MAX,
            expo: DEFAULT_EXPO,
        }
    }
}

/// Rate curve parameters for roll, pitch and yaw
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RateParams {
    pub axes: [AxisRate; 3],
}

impl RateParams {
    pub fn register_defaults(store: &mut ParameterStore) -> Result<(), ParameterError> {
        for axis in 0..3 {
            store.register(
                CENTER_NAMES[axis],
                ParamValue::Float(DEFAULT_CENTER),
                ParamFlags::empty(),
            )?;
            store.register(
                MAX_NAMES[axis],
                ParamValue::Float(DEFAULT_MAX),
                ParamFlags::empty(),
            )?;
            store.register(
                EXPO_NAMES[axis],
                ParamValue::Float(DEFAULT_EXPO),
                ParamFlags::empty(),
            )?;
        }
        Ok(())
    }

    /// Load from the store; the max rate is never below the center sensitivity
    pub fn from_store(store: &ParameterStore) -> Self {
        let mut params = Self::default();
        for (axis, rate) in params.axes.iter_mut().enumerate() {
            let center = store.get_f32(CENTER_NAMES[axis], DEFAULT_CENTER, 0.0, MAX_RATE_LIMIT);
            let max = store.get_f32(MAX_NAMES[axis], DEFAULT_MAX, center, MAX_RATE_LIMIT);
            let expo = store.get_f32(EXPO_NAMES[axis], DEFAULT_EXPO, 0.0, 1.0);
            *rate = AxisRate { center, max, expo };
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_params_defaults() {
        let mut store = ParameterStore::new();
        RateParams::register_defaults(&mut store).unwrap();
        assert_eq!(store.len(), 9);

        let params = RateParams::from_store(&store);
        assert_eq!(params, RateParams::default());
        assert!((params.axes[2].expo - 0.57).abs() < 1e-6);
    }

    #[test]
    fn test_rate_params_clamp() {
        let mut store = ParameterStore::new();
        RateParams::register_defaults(&mut store).unwrap();
        store.set("RATE_R_CTR", ParamValue::Float(300.0)).unwrap();
        store.set("RATE_R_MAX", ParamValue::Float(100.0)).unwrap();
        store.set("RATE_P_EXPO", ParamValue::Float(1.5)).unwrap();
        store.set("RATE_Y_MAX", ParamValue::Float(5000.0)).unwrap();

        let params = RateParams::from_store(&store);
        assert_eq!(params.axes[0].center, 300.0);
        assert_eq!(params.axes[0].max, 300.0);
        assert_eq!(params.axes[1].expo, 1.0);
        assert_eq!(params.axes[2].max, MAX_RATE_LIMIT);
    }
}
