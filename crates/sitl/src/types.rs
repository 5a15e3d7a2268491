use kolibri_core::motor::MotorOutputs;
use kolibri_core::sensors::{BaroSample, GpsFix, MagSample};

/// Raw sensor output of one simulation step
///
/// Everything is in driver units, exactly what the flight loop would get
/// from real hardware. Lower-rate sensors are `None` on steps where they
/// produced no new sample.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SensorData {
    /// Simulation time in microseconds.
    pub timestamp_us: u64,
    pub gyro: [i16; 3],
    pub accel: Option<[i16; 3]>,
    pub mag: Option<MagSample>,
    pub baro: Option<BaroSample>,
    pub gps: Option<GpsFix>,
}

/// World-frame velocity the vehicle should follow, m/s (up positive)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VelocityGuidance {
    pub north: f32,
    pub east: f32,
    pub vertical: f32,
}

/// Commands sent to a simulator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActuatorCommands {
    /// Simulation time in microseconds.
    pub timestamp_us: u64,
    pub motors: MotorOutputs,
    /// Velocity targets of the position/altitude controllers; `None` when
    /// the vehicle is flown on throttle alone
    pub guidance: Option<VelocityGuidance>,
}
