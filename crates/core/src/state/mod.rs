//! Flight state aggregate
//!
//! One `FlightState` per vehicle, owned by the real-time pipeline. Each
//! field group has exactly one writer:
//!
//! | Fields                         | Writer            |
//! |--------------------------------|-------------------|
//! | `attitude`, `navigation`, `rates_dps` | estimator stage |
//! | `setpoints`, `flight_mode`, `rth_state` | controller stage |
//! | `pid`, `motors`                | PID/mixer stage   |
//! | `armed`, `last_disarm_reason`, `arming_flags` | arming stage |
//!
//! Housekeeping consumers never see `FlightState` itself, only the
//! `TelemetrySnapshot` copy published once per cycle.

use crate::ahrs::{Attitude, Navigation};
use crate::arming::{ArmingDisableFlags, DisarmReason};
use crate::control::{FlightMode, RthState};
use crate::fixed::Fix32;
use crate::motor::MotorOutputs;
use crate::pid::PidTerms;

/// Rate and throttle setpoints handed from the controller to the PID loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Setpoints {
    /// Target body rates, deg/s (roll, pitch, yaw)
    pub rates: [Fix32; 3],
    /// Collective throttle, 0..=1024
    pub throttle: Fix32,
}

impl Setpoints {
    pub const fn new(roll: Fix32, pitch: Fix32, yaw: Fix32, throttle: Fix32) -> Self {
        Self {
            rates: [roll, pitch, yaw],
            throttle,
        }
    }

    pub fn roll(&self) -> Fix32 {
        self.rates[0]
    }

    pub fn pitch(&self) -> Fix32 {
        self.rates[1]
    }

    pub fn yaw(&self) -> Fix32 {
        self.rates[2]
    }
}

/// Vehicle state shared between the pipeline stages
#[derive(Debug, Clone, Default)]
pub struct FlightState {
    pub attitude: Attitude,
    pub navigation: Navigation,
    /// Bias-corrected body rates, deg/s
    pub rates_dps: [Fix32; 3],
    pub setpoints: Setpoints,
    pub flight_mode: FlightMode,
    pub rth_state: Option<RthState>,
    pub pid: PidTerms,
    pub motors: MotorOutputs,
    pub armed: bool,
    pub arming_flags: ArmingDisableFlags,
    pub last_disarm_reason: Option<DisarmReason>,
    /// Last gyro read failed; the previous sample was reused
    pub gyro_fault: bool,
    /// Completed pipeline iterations
    pub cycle: u32,
}

impl FlightState {
    pub fn snapshot(&self, timestamp_us: u64) -> TelemetrySnapshot {
        TelemetrySnapshot {
            timestamp_us,
            cycle: self.cycle,
            roll: self.attitude.roll,
            pitch: self.attitude.pitch,
            yaw: self.attitude.yaw,
            heading: self.attitude.heading,
            altitude: self.navigation.altitude,
            vertical_velocity: self.navigation.vertical_velocity,
            north_velocity: self.navigation.north_velocity,
            east_velocity: self.navigation.east_velocity,
            rates_dps: self.rates_dps,
            setpoints: self.setpoints,
            pid: self.pid,
            motors: self.motors,
            flight_mode: self.flight_mode,
            rth_state: self.rth_state,
            armed: self.armed,
            arming_flags: self.arming_flags,
            last_disarm_reason: self.last_disarm_reason,
            gyro_fault: self.gyro_fault,
        }
    }
}

/// Read-only copy of the flight state for telemetry, logging and OSD
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TelemetrySnapshot {
    pub timestamp_us: u64,
    pub cycle: u32,
    pub roll: Fix32,
    pub pitch: Fix32,
    pub yaw: Fix32,
    pub heading: Fix32,
    pub altitude: Fix32,
    pub vertical_velocity: Fix32,
    pub north_velocity: Fix32,
    pub east_velocity: Fix32,
    pub rates_dps: [Fix32; 3],
    pub setpoints: Setpoints,
    pub pid: PidTerms,
    pub motors: MotorOutputs,
    pub flight_mode: FlightMode,
    pub rth_state: Option<RthState>,
    pub armed: bool,
    pub arming_flags: ArmingDisableFlags,
    pub last_disarm_reason: Option<DisarmReason>,
    pub gyro_fault: bool,
}
