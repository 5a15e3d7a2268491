//! Rate PID loop
//!
//! Runs once per gyro sample. Inputs are the rate setpoints from the flight
//! controller and the bias-corrected gyro rates; outputs are per-axis
//! corrections in motor units for the mixer.

mod boost;
mod rate;

pub use boost::{BoostAxes, PidBoost};
pub use rate::{AxisGains, AxisTerms, PidConfig, PidTerms, RatePid, GAIN_SHIFTS};
