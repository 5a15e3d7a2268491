//! Collaborator seams of the flight loop
//!
//! Sensor drivers, the RC receiver, the ESC driver and the telemetry
//! consumer are outside this crate. Everything here is a non-blocking poll:
//! the loop asks, the collaborator answers with what it already has.

use core::fmt;

use kolibri_core::control::RcChannels;
use kolibri_core::sensors::{BaroSample, GpsFix, MagSample};
use kolibri_core::state::TelemetrySnapshot;

/// Failure of a single sensor transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// Bus transfer failed (SPI/I2C error, timeout)
    Bus,
    /// Sample failed validation (stuck or out-of-range data)
    InvalidData,
}

impl SensorError {
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorError::Bus => "bus error",
            SensorError::InvalidData => "invalid data",
        }
    }
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw sensor driver bundle
///
/// The gyro paces the loop. Every other `read_*` returns `Some` only when
/// the driver has a sample that was not handed out before.
pub trait SensorSource {
    /// A new gyro sample is waiting; cleared by `read_gyro`
    fn gyro_ready(&mut self) -> bool;

    fn read_gyro(&mut self) -> Result<[i16; 3], SensorError>;

    fn read_accel(&mut self) -> Option<[i16; 3]>;

    fn read_mag(&mut self) -> Option<MagSample>;

    fn read_baro(&mut self) -> Option<BaroSample>;

    fn read_gps(&mut self) -> Option<GpsFix>;

    /// Latest valid RPM frame from the ESCs, indexed like `MotorOutputs`
    ///
    /// Boards without ESC telemetry keep the default and fly on the fixed
    /// idle.
    fn read_esc_rpm(&mut self) -> Option<[u32; 4]> {
        None
    }
}

/// RC receiver
pub trait RcLink {
    /// Latest channel frame with `since_last_message_us` measured at `now_us`
    fn channels(&mut self, now_us: u64) -> RcChannels;
}

/// Consumer of telemetry snapshots (blackbox, MSP, OSD)
pub trait TelemetrySink {
    fn publish(&mut self, snapshot: &TelemetrySnapshot);
}
