//! Software-in-the-loop simulation for the kolibri flight loop
//!
//! A [`SimulatorAdapter`] produces raw sensor samples in driver units and
//! consumes motor commands; [`SitlHarness`] runs the unmodified
//! `FlightLoop` against it in lockstep, one gyro period per step.

pub mod adapter;
pub mod error;
pub mod harness;
pub mod types;

pub use adapter::{QuadAdapter, QuadConfig, SimulatorAdapter, SimulatorCapabilities};
pub use error::SimulatorError;
pub use harness::{HarnessConfig, SimMotors, SimRc, SimSensors, SitlHarness};
pub use types::{ActuatorCommands, SensorData, VelocityGuidance};
