//! kolibri_core - Pure no_std flight-control core for the kolibri quadcopter
//!
//! This crate contains platform-agnostic algorithms and types
//! that can be tested on host without any feature flags or embassy dependencies.
//!
//! # Design Principles
//!
//! - **Zero cfg**: No `#[cfg(feature = ...)]` directives allowed
//! - **Pure no_std**: No std library dependencies, no heap
//! - **Trait abstractions**: Platform services injected via traits
//! - **No logging**: State changes are returned as events; the integration
//!   layer decides what to log
//!
//! # Modules
//!
//! - [`fixed`]: Q16.16 / Q48.16 fixed point and lookup-table trigonometry
//! - [`geometry`]: Vectors and quaternions generic over the number type
//! - [`filters`]: PT1/PT2/PT3 and dual-rate low-pass filters
//! - [`sensors`]: Raw sensor structs, board alignment, baro and GPS math
//! - [`ahrs`]: Attitude, altitude and velocity estimator
//! - [`control`]: Flight modes, rate curves, self-levelling, altitude and
//!   position hold, return-to-home and the time-sliced cycle
//! - [`pid`]: Rate PID loop
//! - [`motor`]: Quad-X mixer and motor output seam
//! - [`arming`]: Arming debounce and disarm conditions
//! - [`parameters`]: Parameter store and typed parameter groups
//! - [`state`]: Shared flight state and telemetry snapshot
//! - [`traits`]: Platform-agnostic trait abstractions (TimeSource)

#![no_std]

pub mod ahrs;
pub mod arming;
pub mod control;
pub mod filters;
pub mod fixed;
pub mod geometry;
pub mod motor;
pub mod parameters;
pub mod pid;
pub mod sensors;
pub mod state;
pub mod traits;
