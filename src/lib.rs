#![cfg_attr(not(test), no_std)]

//! kolibri - Flight-control integration for the Kolibri quadcopter
//!
//! Wires the algorithms of [`kolibri_core`] to the outside world: sensor
//! drivers, the RC receiver and the ESCs come in through the traits in
//! [`traits`]; [`flight::FlightLoop`] runs the real-time pipeline and
//! publishes a telemetry snapshot for housekeeping consumers.
//!
//! # Features
//!
//! - **`defmt`**: `log_*!` macros forward to defmt
//! - **`embassy`**: Embassy-backed `TimeSource` and `SharedState`

// Logging macros (log_info!, log_warn!, ...)
pub mod logging;

// Collaborator traits, shared state and time
pub mod traits;

// Real-time pipeline and settings/telemetry exchange
pub mod flight;

pub use flight::{FlightLoop, LoopExchange, SettingsBank, TelemetryForwarder};
pub use kolibri_core;
