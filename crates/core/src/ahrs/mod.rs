//! Attitude and Heading Reference System
//!
//! Gyro integration with accelerometer tilt correction, magnetometer heading
//! correction, and the barometer/GPS vertical and horizontal velocity
//! fusion. Everything here is sample-driven; the caller owns timing.

mod calibration;
mod config;
mod estimator;
mod heading_filter;

pub use calibration::{estimate_gyro_bias, GyroCalibration};
pub use config::{AhrsConfig, IntegrationOrder, SLOW_FUSION_CUTOFF_HZ};
pub use estimator::{Attitude, Estimator, Navigation, GYRO_RAW_TO_DEG_PER_SEC};
pub use heading_filter::MagHeadingFilter;
