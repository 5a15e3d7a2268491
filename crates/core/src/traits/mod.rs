//! Platform seams of the core
//!
//! Trait definitions carry no feature gates; host mocks are always built.
//! Embedded implementations live in the `kolibri` crate.

pub mod time;

pub use crate::motor::MotorOutput;
pub use time::{MockTime, TimeSource};
