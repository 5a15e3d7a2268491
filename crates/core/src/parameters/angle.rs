//! Angle Mode Parameter Definitions
//!
//! # Parameters
//!
//! - `ANG_MAX` - Largest commanded tilt in angle and GPS modes, degrees
//! - `ANG_P` - Tilt error to rotation rate gain
//! - `ANG_BURST` - Tilt allowed for a short time while accelerating in GPS modes, degrees
//! - `ANG_BURST_MS` - How long the burst tilt may be held, milliseconds
//! - `ANG_COOLDN_MS` - Time after a burst before the next one, milliseconds

use super::error::ParameterError;
use super::storage::{ParamFlags, ParamValue, ParameterStore};

const DEFAULT_MAX_ANGLE: f32 = 40.0;
const DEFAULT_P: f32 = 5.0;
const DEFAULT_BURST_ANGLE: f32 = 60.0;
const DEFAULT_BURST_MS: i32 = 3000;
const DEFAULT_COOLDOWN_MS: i32 = 5000;

const MAX_TILT: f32 = 85.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleParams {
    pub max_angle: f32,
    pub p: f32,
    pub burst_angle: f32,
    pub burst_time_ms: u32,
    pub burst_cooldown_ms: u32,
}

impl Default for AngleParams {
    fn default() -> Self {
        Self {
            max_angle: DEFAULT_MAX_ANGLE,
            p: DEFAULT_P,
            burst_angle: DEFAULT_BURST_ANGLE,
            burst_time_ms: DEFAULT_BURST_MS as u32,
            burst_cooldown_ms: DEFAULT_COOLDOWN_MS as u32,
        }
    }
}

impl AngleParams {
    pub fn register_defaults(store: &mut ParameterStore) -> Result<(), ParameterError> {
        store.register(
            "ANG_MAX",
            ParamValue::Float(DEFAULT_MAX_ANGLE),
            ParamFlags::empty(),
        )?;
        store.register("ANG_P", ParamValue::Float(DEFAULT_P), ParamFlags::empty())?;
        store.register(
            "ANG_BURST",
            ParamValue::Float(DEFAULT_BURST_ANGLE),
            ParamFlags::empty(),
        )?;
        store.register(
            "ANG_BURST_MS",
            ParamValue::Int(DEFAULT_BURST_MS),
            ParamFlags::empty(),
        )?;
        store.register(
            "ANG_COOLDN_MS",
            ParamValue::Int(DEFAULT_COOLDOWN_MS),
            ParamFlags::empty(),
        )?;
        Ok(())
    }

    /// Load from the store; the burst angle is never below the normal limit
    pub fn from_store(store: &ParameterStore) -> Self {
        let max_angle = store.get_f32("ANG_MAX", DEFAULT_MAX_ANGLE, 1.0, MAX_TILT);
        Self {
            max_angle,
            p: store.get_f32("ANG_P", DEFAULT_P, 0.0, 50.0),
            burst_angle: store.get_f32("ANG_BURST", DEFAULT_BURST_ANGLE, max_angle, MAX_TILT),
            burst_time_ms: store.get_i32("ANG_BURST_MS", DEFAULT_BURST_MS, 0, 60_000) as u32,
            burst_cooldown_ms: store.get_i32("ANG_COOLDN_MS", DEFAULT_COOLDOWN_MS, 0, 60_000)
                as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_angle_params_defaults() {
        let mut store = ParameterStore::new();
        AngleParams::register_defaults(&mut store).unwrap();
        assert_eq!(AngleParams::from_store(&store), AngleParams::default());
    }

    #[test]
    fn test_angle_params_clamp() {
        let mut store = ParameterStore::new();
        AngleParams::register_defaults(&mut store).unwrap();
        store.set("ANG_MAX", ParamValue::Float(50.0)).unwrap();
        store.set("ANG_BURST", ParamValue::Float(30.0)).unwrap();
        store.set("ANG_BURST_MS", ParamValue::Int(-1)).unwrap();

        let params = AngleParams::from_store(&store);
        assert_eq!(params.max_angle, 50.0);
        assert_eq!(params.burst_angle, 50.0);
        assert_eq!(params.burst_time_ms, 0);
    }
}
