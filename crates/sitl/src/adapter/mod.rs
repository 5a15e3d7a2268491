pub mod capabilities;
pub mod quad;

use async_trait::async_trait;

pub use capabilities::{SensorCapabilities, SimulatorCapabilities};
pub use quad::{QuadAdapter, QuadConfig};

use crate::error::SimulatorError;
use crate::types::{ActuatorCommands, SensorData};

/// Physics backend the harness drives in lockstep with the flight loop.
///
/// Implementations must be `Send + Sync` so adapters can be stored as
/// `Box<dyn SimulatorAdapter>`.
#[async_trait]
pub trait SimulatorAdapter: Send + Sync {
    /// Unique identifier for this adapter type (e.g., "quad").
    fn adapter_type(&self) -> &'static str;

    /// Human-readable name for this adapter instance.
    fn name(&self) -> &str;

    /// Connect to the simulator backend and reset it to its initial state.
    async fn connect(&mut self) -> Result<(), SimulatorError>;

    async fn disconnect(&mut self) -> Result<(), SimulatorError>;

    fn is_connected(&self) -> bool;

    /// Sensor output of the last step, `None` before the first step.
    async fn receive_sensors(&mut self) -> Result<Option<SensorData>, SimulatorError>;

    /// Commands applied from the next step on.
    async fn send_actuators(&mut self, commands: &ActuatorCommands) -> Result<(), SimulatorError>;

    /// Advance one gyro period.
    async fn step(&mut self) -> Result<(), SimulatorError>;

    /// Current simulation time in microseconds.
    fn sim_time_us(&self) -> u64;

    fn capabilities(&self) -> SimulatorCapabilities;
}
