//! Flight-loop collaborators backed by the simulator

use kolibri::traits::{MotorOutput, RcLink, SensorError, SensorSource};
use kolibri_core::control::RcChannels;
use kolibri_core::motor::{MotorError, MotorOutputs};
use kolibri_core::sensors::{BaroSample, GpsFix, MagSample};

use crate::types::SensorData;

/// Sensor driver fed from `SensorData`
#[derive(Debug, Default)]
pub struct SimSensors {
    gyro: Option<[i16; 3]>,
    accel: Option<[i16; 3]>,
    mag: Option<MagSample>,
    baro: Option<BaroSample>,
    gps: Option<GpsFix>,
    /// Reads left to fail
    gyro_failures: u32,
}

impl SimSensors {
    pub fn load(&mut self, data: SensorData) {
        self.gyro = Some(data.gyro);
        self.accel = data.accel.or(self.accel.take());
        self.mag = data.mag.or(self.mag.take());
        self.baro = data.baro.or(self.baro.take());
        self.gps = data.gps.or(self.gps.take());
    }

    /// Make the next `count` gyro reads fail with a bus error
    pub fn fail_gyro(&mut self, count: u32) {
        self.gyro_failures = count;
    }
}

impl SensorSource for SimSensors {
    fn gyro_ready(&mut self) -> bool {
        self.gyro.is_some()
    }

    fn read_gyro(&mut self) -> Result<[i16; 3], SensorError> {
        let sample = self.gyro.take();
        if self.gyro_failures > 0 {
            self.gyro_failures -= 1;
            return Err(SensorError::Bus);
        }
        sample.ok_or(SensorError::InvalidData)
    }

    fn read_accel(&mut self) -> Option<[i16; 3]> {
        self.accel.take()
    }

    fn read_mag(&mut self) -> Option<MagSample> {
        self.mag.take()
    }

    fn read_baro(&mut self) -> Option<BaroSample> {
        self.baro.take()
    }

    fn read_gps(&mut self) -> Option<GpsFix> {
        self.gps.take()
    }
}

/// Scripted transmitter
///
/// Every poll counts as a received frame unless the link has been dropped.
#[derive(Debug)]
pub struct SimRc {
    channels: RcChannels,
    last_message_us: u64,
    dropped: bool,
}

impl SimRc {
    pub fn new() -> Self {
        let mut channels = RcChannels::default();
        channels.link_up = true;
        channels.link_quality = 100;
        Self {
            channels,
            last_message_us: 0,
            dropped: false,
        }
    }

    pub fn set(&mut self, index: usize, value: u16) {
        self.channels.set_channel(index, value);
    }

    pub fn channel(&self, index: usize) -> u16 {
        self.channels.channel(index)
    }

    /// Stop delivering frames; the receiver keeps reporting the last one
    pub fn drop_link(&mut self) {
        self.dropped = true;
    }

    pub fn restore_link(&mut self) {
        self.dropped = false;
    }

    pub fn is_dropped(&self) -> bool {
        self.dropped
    }
}

impl Default for SimRc {
    fn default() -> Self {
        Self::new()
    }
}

impl RcLink for SimRc {
    fn channels(&mut self, now_us: u64) -> RcChannels {
        if !self.dropped {
            self.last_message_us = now_us;
        }
        let mut rc = self.channels;
        let since = now_us.saturating_sub(self.last_message_us);
        rc.since_last_message_us = since.min(u32::MAX as u64) as u32;
        rc.link_quality = if self.dropped { 0 } else { 100 };
        rc
    }
}

/// ESC stand-in that keeps the last command for the simulator
#[derive(Debug, Default)]
pub struct SimMotors {
    last: MotorOutputs,
    writes: u64,
}

impl SimMotors {
    pub fn last(&self) -> MotorOutputs {
        self.last
    }

    pub fn writes(&self) -> u64 {
        self.writes
    }
}

impl MotorOutput for SimMotors {
    fn write(&mut self, outputs: &MotorOutputs) -> Result<(), MotorError> {
        self.last = *outputs;
        self.writes += 1;
        Ok(())
    }
}
