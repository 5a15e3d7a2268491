//! PID and Mixer Parameter Definitions
//!
//! # Parameters
//!
//! - `PID_<A>_<T>` - Integer tuning value for axis `R`/`P`/`Y` and term
//!   `P`/`I`/`D`/`FF`/`S`, converted by the fixed gain shifts
//! - `PID_IFALLOFF` - I-term decay before takeoff, I units per second
//! - `PID_IDLE` - Idle throttle, permille of the motor range
//! - `PID_DTERM_LPF` / `PID_GYRO_LPF` / `PID_SPDIFF_LPF` - Filter cutoffs, Hz
//! - `PID_BOOST` - Throttle-slew gain boost: 0 off, 1 roll/pitch, 2 all axes
//! - `MOT_PROPS_OUT` - Propellers spin outwards (yaw mixing inverted)
//! - `PID_DIDLE_EN` - Dynamic idle from ESC RPM telemetry
//! - `PID_DIDLE_RPM` - Dynamic idle target speed, RPM
//! - `PID_DIDLE_P` / `PID_DIDLE_I` / `PID_DIDLE_D` - Dynamic idle gains,
//!   motor units per RPM of error

use super::error::ParameterError;
use super::storage::{ParamFlags, ParamValue, ParameterStore};
use crate::fixed::Fix32;
use crate::motor::{DynamicIdleConfig, PropDirection, QuadMixer};
use crate::pid::{AxisGains, BoostAxes, PidBoost, PidConfig};

const GAIN_NAMES: [[&str; 5]; 3] = [
    ["PID_R_P", "PID_R_I", "PID_R_D", "PID_R_FF", "PID_R_S"],
    ["PID_P_P", "PID_P_I", "PID_P_D", "PID_P_FF", "PID_P_S"],
    ["PID_Y_P", "PID_Y_I", "PID_Y_D", "PID_Y_FF", "PID_Y_S"],
];

const DEFAULT_GAINS: [u16; 5] = [80, 40, 500, 40, 0];
const MAX_NICE_GAIN: i32 = 4000;
const DEFAULT_I_FALLOFF: i32 = 400;
const DEFAULT_IDLE_PERMILLE: i32 = 35;
const MAX_IDLE_PERMILLE: i32 = 200;
const DEFAULT_DTERM_CUTOFF: f32 = 70.0;
const DEFAULT_GYRO_CUTOFF: f32 = 100.0;
const DEFAULT_SPDIFF_CUTOFF: f32 = 12.0;
const BOOST_CUTOFF_HZ: f32 = 5.0;
const DIDLE_GAIN_NAMES: [&str; 3] = ["PID_DIDLE_P", "PID_DIDLE_I", "PID_DIDLE_D"];
const DEFAULT_DIDLE_GAINS: [f32; 3] = [0.2, 0.0015, 0.07];
const DEFAULT_DIDLE_RPM: i32 = 3000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidParams {
    /// Roll, pitch, yaw; each P, I, D, FF, S
    pub gains: [[u16; 5]; 3],
    pub i_falloff: u16,
    pub idle_permille: u16,
    pub dterm_cutoff_hz: f32,
    pub gyro_cutoff_hz: f32,
    pub setpoint_diff_cutoff_hz: f32,
    pub boost: BoostAxes,
    pub props_out: bool,
    pub dynamic_idle: bool,
    pub dynamic_idle_rpm: u16,
    pub dynamic_idle_gains: [f32; 3],
}

impl Default for PidParams {
    fn default() -> Self {
        Self {
            gains: [DEFAULT_GAINS; 3],
            i_falloff: DEFAULT_I_FALLOFF as u16,
            idle_permille: DEFAULT_IDLE_PERMILLE as u16,
            dterm_cutoff_hz: DEFAULT_DTERM_CUTOFF,
            gyro_cutoff_hz: DEFAULT_GYRO_CUTOFF,
            setpoint_diff_cutoff_hz: DEFAULT_SPDIFF_CUTOFF,
            boost: BoostAxes::Off,
            props_out: false,
            dynamic_idle: true,
            dynamic_idle_rpm: DEFAULT_DIDLE_RPM as u16,
            dynamic_idle_gains: DEFAULT_DIDLE_GAINS,
        }
    }
}

impl PidParams {
    pub fn register_defaults(store: &mut ParameterStore) -> Result<(), ParameterError> {
        for names in GAIN_NAMES.iter() {
            for (term, name) in names.iter().enumerate() {
                store.register(
                    name,
                    ParamValue::Int(DEFAULT_GAINS[term] as i32),
                    ParamFlags::empty(),
                )?;
            }
        }
        store.register(
            "PID_IFALLOFF",
            ParamValue::Int(DEFAULT_I_FALLOFF),
            ParamFlags::empty(),
        )?;
        store.register(
            "PID_IDLE",
            ParamValue::Int(DEFAULT_IDLE_PERMILLE),
            ParamFlags::empty(),
        )?;
        store.register(
            "PID_DTERM_LPF",
            ParamValue::Float(DEFAULT_DTERM_CUTOFF),
            ParamFlags::empty(),
        )?;
        store.register(
            "PID_GYRO_LPF",
            ParamValue::Float(DEFAULT_GYRO_CUTOFF),
            ParamFlags::empty(),
        )?;
        store.register(
            "PID_SPDIFF_LPF",
            ParamValue::Float(DEFAULT_SPDIFF_CUTOFF),
            ParamFlags::empty(),
        )?;
        store.register("PID_BOOST", ParamValue::Int(0), ParamFlags::empty())?;
        store.register("MOT_PROPS_OUT", ParamValue::Bool(false), ParamFlags::empty())?;
        store.register("PID_DIDLE_EN", ParamValue::Bool(true), ParamFlags::empty())?;
        store.register(
            "PID_DIDLE_RPM",
            ParamValue::Int(DEFAULT_DIDLE_RPM),
            ParamFlags::empty(),
        )?;
        for (name, gain) in DIDLE_GAIN_NAMES.iter().zip(DEFAULT_DIDLE_GAINS) {
            store.register(name, ParamValue::Float(gain), ParamFlags::empty())?;
        }
        Ok(())
    }

    pub fn from_store(store: &ParameterStore) -> Self {
        let mut gains = [DEFAULT_GAINS; 3];
        for (axis, names) in GAIN_NAMES.iter().enumerate() {
            for (term, name) in names.iter().enumerate() {
                gains[axis][term] =
                    store.get_i32(name, DEFAULT_GAINS[term] as i32, 0, MAX_NICE_GAIN) as u16;
            }
        }

        let mut dynamic_idle_gains = DEFAULT_DIDLE_GAINS;
        for (gain, (name, default)) in dynamic_idle_gains
            .iter_mut()
            .zip(DIDLE_GAIN_NAMES.iter().zip(DEFAULT_DIDLE_GAINS))
        {
            *gain = store.get_f32(name, default, 0.0, 10.0);
        }

        Self {
            gains,
            i_falloff: store.get_i32("PID_IFALLOFF", DEFAULT_I_FALLOFF, 0, 5000) as u16,
            idle_permille: store.get_i32("PID_IDLE", DEFAULT_IDLE_PERMILLE, 0, MAX_IDLE_PERMILLE)
                as u16,
            dterm_cutoff_hz: store.get_f32("PID_DTERM_LPF", DEFAULT_DTERM_CUTOFF, 5.0, 1000.0),
            gyro_cutoff_hz: store.get_f32("PID_GYRO_LPF", DEFAULT_GYRO_CUTOFF, 5.0, 1000.0),
            setpoint_diff_cutoff_hz: store.get_f32(
                "PID_SPDIFF_LPF",
                DEFAULT_SPDIFF_CUTOFF,
                1.0,
                200.0,
            ),
            boost: BoostAxes::from_index(store.get_i32("PID_BOOST", 0, 0, 2)),
            props_out: store.get_bool("MOT_PROPS_OUT", false),
            dynamic_idle: store.get_bool("PID_DIDLE_EN", true),
            dynamic_idle_rpm: store.get_i32("PID_DIDLE_RPM", DEFAULT_DIDLE_RPM, 0, 20_000) as u16,
            dynamic_idle_gains,
        }
    }

    /// Rate PID configuration for a loop running at `sample_hz`
    pub fn pid_config(&self, sample_hz: f32) -> PidConfig {
        PidConfig {
            sample_hz,
            gains: [
                AxisGains::from_nice(self.gains[0]),
                AxisGains::from_nice(self.gains[1]),
                AxisGains::from_nice(self.gains[2]),
            ],
            i_falloff: Fix32::from_int(self.i_falloff as i32),
            dterm_cutoff_hz: self.dterm_cutoff_hz,
            gyro_cutoff_hz: self.gyro_cutoff_hz,
            setpoint_diff_cutoff_hz: self.setpoint_diff_cutoff_hz,
            ..PidConfig::default()
        }
    }

    /// Boost stage, `None` when disabled
    pub fn pid_boost(&self, sample_hz: f32) -> Option<PidBoost> {
        match self.boost {
            BoostAxes::Off => None,
            axes => Some(PidBoost::new(axes, BOOST_CUTOFF_HZ, sample_hz)),
        }
    }

    pub fn mixer(&self) -> QuadMixer {
        let props = if self.props_out {
            PropDirection::PropsOut
        } else {
            PropDirection::PropsIn
        };
        QuadMixer::new(self.idle_permille, props)
    }

    pub fn dynamic_idle(&self) -> DynamicIdleConfig {
        let [p, i, d] = self.dynamic_idle_gains;
        DynamicIdleConfig {
            enabled: self.dynamic_idle,
            target_rpm: self.dynamic_idle_rpm,
            gains: [Fix32::from_f32(p), Fix32::from_f32(i), Fix32::from_f32(d)],
        }
    }
}
