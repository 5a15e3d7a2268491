//! Position Hold and Return-to-Home Parameter Definitions
//!
//! # Parameters
//!
//! - `HVEL_P` / `HVEL_I` / `HVEL_D` / `HVEL_FF` - Horizontal velocity PID, m/s^2 per m/s
//! - `HVEL_MAX` - Horizontal velocity at full stick and autopilot cap, m/s
//! - `HVEL_DEADBAND` - Roll/pitch stick deadband, channel units
//! - `HVEL_FF_LPF` / `HVEL_IRLX_LPF` / `HVEL_PUSH_LPF` - Feedforward, I relax and
//!   position push filter cutoffs, Hz
//! - `RTH_ALT` - Climb above home before returning, metres
//! - `RTH_LAND_SPD` - Descent speed on the final landing leg, m/s

use super::error::ParameterError;
use super::storage::{ParamFlags, ParamValue, ParameterStore};

const DEFAULT_P: f32 = 2.0;
const DEFAULT_I: f32 = 0.005;
const DEFAULT_D: f32 = 0.0;
const DEFAULT_FF: f32 = 1.0;
const DEFAULT_MAX_HVEL: f32 = 12.0;
const DEFAULT_DEADBAND: i32 = 30;
const DEFAULT_FF_CUTOFF: f32 = 2.0;
const DEFAULT_I_RELAX_CUTOFF: f32 = 0.5;
const DEFAULT_PUSH_CUTOFF: f32 = 0.5;
const DEFAULT_RTH_ALTITUDE: f32 = 30.0;
const DEFAULT_RTH_LAND_SPEED: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionParams {
    pub p: f32,
    pub i: f32,
    pub d: f32,
    pub ff: f32,
    pub max_hvel: f32,
    pub deadband: i32,
    pub ff_cutoff_hz: f32,
    pub i_relax_cutoff_hz: f32,
    pub push_cutoff_hz: f32,
    pub rth_altitude: f32,
    pub rth_land_speed: f32,
}

impl Default for PositionParams {
    fn default() -> Self {
        Self {
            p: DEFAULT_P,
            i: DEFAULT_I,
            d: DEFAULT_D,
            ff: DEFAULT_FF,
            max_hvel: DEFAULT_MAX_HVEL,
            deadband: DEFAULT_DEADBAND,
            ff_cutoff_hz: DEFAULT_FF_CUTOFF,
            i_relax_cutoff_hz: DEFAULT_I_RELAX_CUTOFF,
            push_cutoff_hz: DEFAULT_PUSH_CUTOFF,
            rth_altitude: DEFAULT_RTH_ALTITUDE,
            rth_land_speed: DEFAULT_RTH_LAND_SPEED,
        }
    }
}

impl PositionParams {
    pub fn register_defaults(store: &mut ParameterStore) -> Result<(), ParameterError> {
        store.register("HVEL_P", ParamValue::Float(DEFAULT_P), ParamFlags::empty())?;
        store.register("HVEL_I", ParamValue::Float(DEFAULT_I), ParamFlags::empty())?;
        store.register("HVEL_D", ParamValue::Float(DEFAULT_D), ParamFlags::empty())?;
        store.register("HVEL_FF", ParamValue::Float(DEFAULT_FF), ParamFlags::empty())?;
        store.register(
            "HVEL_MAX",
            ParamValue::Float(DEFAULT_MAX_HVEL),
            ParamFlags::empty(),
        )?;
        store.register(
            "HVEL_DEADBAND",
            ParamValue::Int(DEFAULT_DEADBAND),
            ParamFlags::empty(),
        )?;
        store.register(
            "HVEL_FF_LPF",
            ParamValue::Float(DEFAULT_FF_CUTOFF),
            ParamFlags::empty(),
        )?;
        store.register(
            "HVEL_IRLX_LPF",
            ParamValue::Float(DEFAULT_I_RELAX_CUTOFF),
            ParamFlags::empty(),
        )?;
        store.register(
            "HVEL_PUSH_LPF",
            ParamValue::Float(DEFAULT_PUSH_CUTOFF),
            ParamFlags::empty(),
        )?;
        store.register(
            "RTH_ALT",
            ParamValue::Float(DEFAULT_RTH_ALTITUDE),
            ParamFlags::empty(),
        )?;
        store.register(
            "RTH_LAND_SPD",
            ParamValue::Float(DEFAULT_RTH_LAND_SPEED),
            ParamFlags::empty(),
        )?;
        Ok(())
    }

    pub fn from_store(store: &ParameterStore) -> Self {
        Self {
            p: store.get_f32("HVEL_P", DEFAULT_P, 0.0, 50.0),
            i: store.get_f32("HVEL_I", DEFAULT_I, 0.0, 10.0),
            d: store.get_f32("HVEL_D", DEFAULT_D, 0.0, 50.0),
            ff: store.get_f32("HVEL_FF", DEFAULT_FF, 0.0, 10.0),
            max_hvel: store.get_f32("HVEL_MAX", DEFAULT_MAX_HVEL, 0.5, 30.0),
            deadband: store.get_i32("HVEL_DEADBAND", DEFAULT_DEADBAND, 0, 400),
            ff_cutoff_hz: store.get_f32("HVEL_FF_LPF", DEFAULT_FF_CUTOFF, 0.1, 50.0),
            i_relax_cutoff_hz: store.get_f32("HVEL_IRLX_LPF", DEFAULT_I_RELAX_CUTOFF, 0.05, 50.0),
            push_cutoff_hz: store.get_f32("HVEL_PUSH_LPF", DEFAULT_PUSH_CUTOFF, 0.05, 20.0),
            rth_altitude: store.get_f32("RTH_ALT", DEFAULT_RTH_ALTITUDE, 5.0, 200.0),
            rth_land_speed: store.get_f32("RTH_LAND_SPD", DEFAULT_RTH_LAND_SPEED, 0.2, 5.0),
        }
    }
}
