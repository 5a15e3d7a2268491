//! Flight modes and the controllers behind them
//!
//! [`FlightController`] is the entry point: once per control loop iteration
//! it reads the sticks and the state estimate and produces the rate and
//! throttle setpoints for the PID loop.
//!
//! - [`rates`]: stick to rotation rate curves (acro)
//! - [`angle`]: target attitude to rotation rates (self-levelling)
//! - [`altitude`]: vertical velocity and altitude hold
//! - [`position`]: horizontal velocity, position lock and angle burst
//! - [`navigation`]: autopilot guidance towards a point
//! - [`rth`]: return-to-home sequencing
//! - [`slicer`]: the eight-phase time-sliced cycle

pub mod altitude;
pub mod angle;
pub mod controller;
pub mod mode;
pub mod navigation;
pub mod position;
pub mod rates;
pub mod rc;
pub mod rth;
pub mod slicer;

pub use altitude::{thrust_factor, AltitudeController, VerticalTerms};
pub use angle::{AngleController, MAX_ANGLE_RATE};
pub use controller::{ControlEvent, ControlEvents, ControlInput, ControlOutput, FlightController};
pub use mode::FlightMode;
pub use navigation::{horizontal_distance, navigate_to, Guidance};
pub use position::{AngleBurst, BurstState, PositionController, TiltCommand};
pub use rates::{RateCoefficients, RateCurve};
pub use rc::{RcChannels, Sticks, CHANNEL_CENTER, RC_CHANNEL_COUNT, THROTTLE_ZERO};
pub use rth::{RthState, RthStateMachine, RthStep};
pub use slicer::{Phase, PhaseSlicer, PHASES, PHASE_COUNT};
