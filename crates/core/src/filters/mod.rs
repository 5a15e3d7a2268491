//! Low-pass filter primitives
//!
//! All filters are generic over [`Scalar`](crate::fixed::Scalar) and hold
//! a fixed amount of state, so they can live inside the control loop
//! without allocation.

mod cascade;
mod pt1;

pub use cascade::{DualPt1, Pt2, Pt3};
pub use pt1::{alpha_for, Pt1};
