//! Platform seams for the flight loop
//!
//! ```text
//!  SensorSource ─┐                        ┌─> MotorOutput
//!  RcLink ───────┼──> FlightLoop (writer) ─┤
//!                │                        └─> SharedState<LoopExchange>
//!                │                                   │
//!                └── configuration path ── stage ────┤
//!                                                    └─> TelemetrySink (reader)
//! ```
//!
//! # Features
//!
//! - **`embassy`**: Enables `EmbassyTime` and `EmbassyState<T>`
//! - Mock implementations are always available for host testing

pub mod io;
pub mod sync;
pub mod time;

pub use io::{RcLink, SensorError, SensorSource, TelemetrySink};
pub use kolibri_core::motor::{MotorError, MotorOutput};
pub use kolibri_core::traits::{MockTime, TimeSource};
pub use sync::{MockState, SharedState};

#[cfg(feature = "embassy")]
pub use sync::EmbassyState;

#[cfg(feature = "embassy")]
pub use time::EmbassyTime;
