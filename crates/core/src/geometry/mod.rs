//! Vectors and rotation quaternions
//!
//! Frame convention (body and world): x forward / roll right, y right /
//! pitch up, z down / yaw right.

mod quaternion;
mod vector;

pub use quaternion::Quaternion;
pub use vector::Vector3;

use crate::fixed::Scalar;

/// Principal axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn unit<T: Scalar>(self) -> Vector3<T> {
        match self {
            Axis::X => Vector3::unit_x(),
            Axis::Y => Vector3::unit_y(),
            Axis::Z => Vector3::unit_z(),
        }
    }
}
