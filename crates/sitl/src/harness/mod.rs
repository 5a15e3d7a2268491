//! Lockstep driver for a `FlightLoop` against a simulator adapter
//!
//! One harness step is one gyro period: advance the physics, hand the raw
//! sensor data to the loop, run a cycle, send the motor commands (and the
//! controllers' velocity targets) back.

pub mod io;

use kolibri::flight::{FlightLoop, LoopExchange};
use kolibri::traits::{MockState, SharedState};
use kolibri_core::ahrs::AhrsConfig;
use kolibri_core::control::{FlightMode, RcChannels};
use kolibri_core::parameters::FlightSettings;
use kolibri_core::state::TelemetrySnapshot;

pub use io::{SimMotors, SimRc, SimSensors};

use crate::adapter::SimulatorAdapter;
use crate::error::SimulatorError;
use crate::types::{ActuatorCommands, VelocityGuidance};

pub type SimFlightLoop<'a> = FlightLoop<'a, SimSensors, SimRc, SimMotors, MockState<LoopExchange>>;

/// Arm switch channel values
pub const SWITCH_OFF: u16 = 1000;
pub const SWITCH_ON: u16 = 2000;

#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub ahrs: AhrsConfig,
    pub settings: FlightSettings,
}

impl Default for HarnessConfig {
    /// Boot calibration shortened to 0.1 s
    fn default() -> Self {
        Self {
            ahrs: AhrsConfig::default().with_gyro_calibration_samples(320),
            settings: FlightSettings::default(),
        }
    }
}

pub struct SitlHarness<'a, A: SimulatorAdapter> {
    adapter: A,
    flight: SimFlightLoop<'a>,
    exchange: &'a MockState<LoopExchange>,
    cycles: u64,
}

impl<'a, A: SimulatorAdapter> SitlHarness<'a, A> {
    /// The exchange outlives the harness so tests can read snapshots and
    /// stage settings the way housekeeping would.
    pub fn new(adapter: A, exchange: &'a MockState<LoopExchange>, config: HarnessConfig) -> Self {
        let flight = FlightLoop::new(
            SimSensors::default(),
            SimRc::new(),
            SimMotors::default(),
            exchange,
            config.ahrs,
            config.settings,
        );
        Self {
            adapter,
            flight,
            exchange,
            cycles: 0,
        }
    }

    pub async fn connect(&mut self) -> Result<(), SimulatorError> {
        self.adapter.connect().await
    }

    pub async fn disconnect(&mut self) -> Result<(), SimulatorError> {
        self.adapter.disconnect().await
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn flight(&self) -> &SimFlightLoop<'a> {
        &self.flight
    }

    pub fn rc(&mut self) -> &mut SimRc {
        self.flight.link_mut()
    }

    pub fn sensors(&mut self) -> &mut SimSensors {
        self.flight.sensors_mut()
    }

    /// Latest published telemetry
    pub fn snapshot(&self) -> TelemetrySnapshot {
        self.exchange.with(|x| x.snapshot)
    }

    pub fn stage_settings(&self, settings: FlightSettings) {
        self.exchange.with_mut(|x| x.settings.stage(settings));
    }

    pub fn now_us(&self) -> u64 {
        self.adapter.sim_time_us()
    }

    /// Completed flight-loop cycles
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn select_mode(&mut self, mode: FlightMode) {
        self.rc().set(RcChannels::MODE, 1000 + 200 * mode as u16);
    }

    /// One gyro period
    pub async fn step(&mut self) -> Result<(), SimulatorError> {
        self.adapter.step().await?;
        let now = self.adapter.sim_time_us();
        if let Some(data) = self.adapter.receive_sensors().await? {
            self.flight.sensors_mut().load(data);
        }
        if self.flight.run_cycle(now) {
            self.cycles += 1;
        }
        let commands = ActuatorCommands {
            timestamp_us: now,
            motors: self.flight.motors().last(),
            guidance: self.guidance(),
        };
        self.adapter.send_actuators(&commands).await
    }

    pub async fn run_for(&mut self, duration_us: u64) -> Result<(), SimulatorError> {
        let end = self.now_us() + duration_us;
        while self.now_us() < end {
            self.step().await?;
        }
        Ok(())
    }

    /// Step until `done` holds for the harness, failing after `timeout_us`
    pub async fn run_until<F>(
        &mut self,
        phase: &'static str,
        timeout_us: u64,
        mut done: F,
    ) -> Result<(), SimulatorError>
    where
        F: FnMut(&Self) -> bool,
    {
        let start = self.now_us();
        while !done(self) {
            let elapsed_us = self.now_us() - start;
            if elapsed_us >= timeout_us {
                return Err(SimulatorError::ScenarioTimeout { phase, elapsed_us });
            }
            self.step().await?;
        }
        Ok(())
    }

    /// Cycle the arm switch in `mode` with the throttle low
    pub async fn arm(&mut self, mode: FlightMode) -> Result<(), SimulatorError> {
        self.select_mode(mode);
        self.rc().set(RcChannels::THROTTLE, 1000);
        self.rc().set(RcChannels::ARM, SWITCH_OFF);
        self.run_for(50_000).await?;
        self.rc().set(RcChannels::ARM, SWITCH_ON);
        self.run_until("arming", 500_000, |h| h.flight.arming().armed())
            .await
    }

    /// Velocity targets while the altitude (and position) controllers fly
    fn guidance(&self) -> Option<VelocityGuidance> {
        if !self.flight.arming().armed() {
            return None;
        }
        let controller = self.flight.controller();
        let mode = controller.mode();
        if !mode.holds_altitude() {
            return None;
        }
        let vertical = controller.altitude().terms().setpoint.to_f32();
        let (north, east) = if mode.uses_gps() {
            let (n, e) = controller.position().velocity_setpoint();
            (n.to_f32(), e.to_f32())
        } else {
            (0.0, 0.0)
        };
        Some(VelocityGuidance {
            north,
            east,
            vertical,
        })
    }
}
