//! Altitude Hold Parameter Definitions
//!
//! # Parameters
//!
//! - `VVEL_P` / `VVEL_I` / `VVEL_D` / `VVEL_FF` - Vertical velocity PID, throttle units per m/s
//! - `VVEL_FF_LPF` / `VVEL_D_LPF` - Setpoint derivative and D filter cutoffs, Hz
//! - `VVEL_MAX` - Vertical velocity at full stick, m/s
//! - `VVEL_DEADBAND` - Throttle stick deadband around center, stick units (0..512)
//! - `ALT_BARO_LPF` - Pull of the barometric altitude on the fused altitude, Hz
//! - `ALT_VEL_LPF` - Pull of the measured climb rate on the vertical velocity, Hz

use super::error::ParameterError;
use super::storage::{ParamFlags, ParamValue, ParameterStore};
use crate::ahrs::{AhrsConfig, SLOW_FUSION_CUTOFF_HZ};

const DEFAULT_P: f32 = 60.0;
const DEFAULT_I: f32 = 0.05;
const DEFAULT_D: f32 = 0.0;
const DEFAULT_FF: f32 = 400.0;
const DEFAULT_FF_CUTOFF: f32 = 2.0;
const DEFAULT_D_CUTOFF: f32 = 10.0;
const DEFAULT_MAX_VVEL: f32 = 5.0;
const DEFAULT_DEADBAND: i32 = 50;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AltitudeParams {
    pub p: f32,
    /// Never zero: the integrator is seeded as `throttle / i`
    pub i: f32,
    pub d: f32,
    pub ff: f32,
    pub ff_cutoff_hz: f32,
    pub d_cutoff_hz: f32,
    pub max_vvel: f32,
    pub deadband: i32,
    pub baro_fusion_cutoff_hz: f32,
    pub velocity_fusion_cutoff_hz: f32,
}

impl Default for AltitudeParams {
    fn default() -> Self {
        Self {
            p: DEFAULT_P,
            i: DEFAULT_I,
            d: DEFAULT_D,
            ff: DEFAULT_FF,
            ff_cutoff_hz: DEFAULT_FF_CUTOFF,
            d_cutoff_hz: DEFAULT_D_CUTOFF,
            max_vvel: DEFAULT_MAX_VVEL,
            deadband: DEFAULT_DEADBAND,
            baro_fusion_cutoff_hz: SLOW_FUSION_CUTOFF_HZ,
            velocity_fusion_cutoff_hz: SLOW_FUSION_CUTOFF_HZ,
        }
    }
}

impl AltitudeParams {
    pub fn register_defaults(store: &mut ParameterStore) -> Result<(), ParameterError> {
        store.register("VVEL_P", ParamValue::Float(DEFAULT_P), ParamFlags::empty())?;
        store.register("VVEL_I", ParamValue::Float(DEFAULT_I), ParamFlags::empty())?;
        store.register("VVEL_D", ParamValue::Float(DEFAULT_D), ParamFlags::empty())?;
        store.register("VVEL_FF", ParamValue::Float(DEFAULT_FF), ParamFlags::empty())?;
        store.register(
            "VVEL_FF_LPF",
            ParamValue::Float(DEFAULT_FF_CUTOFF),
            ParamFlags::empty(),
        )?;
        store.register(
            "VVEL_D_LPF",
            ParamValue::Float(DEFAULT_D_CUTOFF),
            ParamFlags::empty(),
        )?;
        store.register(
            "VVEL_MAX",
            ParamValue::Float(DEFAULT_MAX_VVEL),
            ParamFlags::empty(),
        )?;
        store.register(
            "VVEL_DEADBAND",
            ParamValue::Int(DEFAULT_DEADBAND),
            ParamFlags::empty(),
        )?;
        store.register(
            "ALT_BARO_LPF",
            ParamValue::Float(SLOW_FUSION_CUTOFF_HZ),
            ParamFlags::empty(),
        )?;
        store.register(
            "ALT_VEL_LPF",
            ParamValue::Float(SLOW_FUSION_CUTOFF_HZ),
            ParamFlags::empty(),
        )?;
        Ok(())
    }

    pub fn from_store(store: &ParameterStore) -> Self {
        Self {
            p: store.get_f32("VVEL_P", DEFAULT_P, 0.0, 1000.0),
            i: store.get_f32("VVEL_I", DEFAULT_I, 0.001, 10.0),
            d: store.get_f32("VVEL_D", DEFAULT_D, 0.0, 1000.0),
            ff: store.get_f32("VVEL_FF", DEFAULT_FF, 0.0, 5000.0),
            ff_cutoff_hz: store.get_f32("VVEL_FF_LPF", DEFAULT_FF_CUTOFF, 0.1, 50.0),
            d_cutoff_hz: store.get_f32("VVEL_D_LPF", DEFAULT_D_CUTOFF, 0.1, 100.0),
            max_vvel: store.get_f32("VVEL_MAX", DEFAULT_MAX_VVEL, 0.5, 20.0),
            deadband: store.get_i32("VVEL_DEADBAND", DEFAULT_DEADBAND, 0, 400),
            baro_fusion_cutoff_hz: store.get_f32("ALT_BARO_LPF", SLOW_FUSION_CUTOFF_HZ, 0.001, 10.0),
            velocity_fusion_cutoff_hz: store.get_f32(
                "ALT_VEL_LPF",
                SLOW_FUSION_CUTOFF_HZ,
                0.001,
                10.0,
            ),
        }
    }

    /// Copy the fusion cutoffs onto an estimator configuration
    pub fn apply_to(&self, config: &mut AhrsConfig) {
        config.baro_altitude_cutoff_hz = self.baro_fusion_cutoff_hz;
        config.gps_altitude_cutoff_hz = self.baro_fusion_cutoff_hz;
        config.baro_velocity_cutoff_hz = self.velocity_fusion_cutoff_hz;
        config.gps_velocity_cutoff_hz = self.velocity_fusion_cutoff_hz;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_altitude_params_defaults() {
        let mut store = ParameterStore::new();
        AltitudeParams::register_defaults(&mut store).unwrap();
        assert_eq!(AltitudeParams::from_store(&store), AltitudeParams::default());
    }

    #[test]
    fn test_altitude_params_i_never_zero() {
        let mut store = ParameterStore::new();
        AltitudeParams::register_defaults(&mut store).unwrap();
        store.set("VVEL_I", ParamValue::Float(0.0)).unwrap();
        store.set("VVEL_DEADBAND", ParamValue::Int(1000)).unwrap();

        let params = AltitudeParams::from_store(&store);
        assert!(params.i > 0.0);
        assert_eq!(params.deadband, 400);
    }

    #[test]
    fn test_altitude_params_apply_to_estimator() {
        let params = AltitudeParams {
            baro_fusion_cutoff_hz: 0.2,
            velocity_fusion_cutoff_hz: 0.3,
            ..Default::default()
        };
        let mut config = AhrsConfig::default();
        params.apply_to(&mut config);
        assert_eq!(config.baro_altitude_cutoff_hz, 0.2);
        assert_eq!(config.gps_velocity_cutoff_hz, 0.3);
    }
}
