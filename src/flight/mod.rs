//! The flight loop and its exchange with housekeeping

pub mod exchange;
pub mod pipeline;

pub use exchange::{LoopExchange, SettingsBank, TelemetryForwarder};
pub use pipeline::FlightLoop;
