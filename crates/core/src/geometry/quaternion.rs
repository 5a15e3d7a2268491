//! Unit quaternion
//!
//! Hamilton convention, `w` first. `a * b` applies rotation `a` to the
//! orientation `b`, so incremental updates are left-multiplied:
//! `q = delta * q`.

use core::ops::Mul;

use super::{Axis, Vector3};
use crate::fixed::Scalar;

/// Tolerance of the shortest-arc degenerate cases, 3 Q16.16 steps
const ARC_EPSILON: f32 = 3.0 / 65536.0;

/// Below this vector-part magnitude the rotation axis is undefined
const AXIS_EPSILON: f32 = 3.0 / 65536.0;

/// Rotation quaternion over any [`Scalar`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion<T> {
    pub w: T,
    pub x: T,
    pub y: T,
    pub z: T,
}

impl<T: Scalar> Default for Quaternion<T> {
    fn default() -> Self {
        Self::identity()
    }
}

impl<T: Scalar> Quaternion<T> {
    pub const fn new(w: T, x: T, y: T, z: T) -> Self {
        Self { w, x, y, z }
    }

    pub fn identity() -> Self {
        Self::new(T::ONE, T::ZERO, T::ZERO, T::ZERO)
    }

    pub fn from_parts(w: T, v: Vector3<T>) -> Self {
        Self::new(w, v.x, v.y, v.z)
    }

    pub fn vector(&self) -> Vector3<T> {
        Vector3::new(self.x, self.y, self.z)
    }

    /// Rotation of `angle` radians about the unit vector `axis`
    pub fn from_axis_angle(axis: Vector3<T>, angle: T) -> Self {
        let half = angle / T::from_f32(2.0);
        let (s, c) = half.sin_cos();
        Self::from_parts(c, axis.scale(s))
    }

    /// Exact rotation about one body axis
    pub fn from_axis_rotation(axis: Axis, angle: T) -> Self {
        Self::from_axis_angle(axis.unit(), angle)
    }

    /// First-order rotation about one body axis for small angles
    ///
    /// `w = 1 - h^2 / 2` with `h = angle / 2`. Accurate to O(angle^4) in
    /// `w`; the result is close to but not exactly unit length.
    pub fn from_small_angle(axis: Axis, angle: T) -> Self {
        let h = angle / T::from_f32(2.0);
        let w = T::ONE - h * h / T::from_f32(2.0);
        match axis {
            Axis::X => Self::new(w, h, T::ZERO, T::ZERO),
            Axis::Y => Self::new(w, T::ZERO, h, T::ZERO),
            Axis::Z => Self::new(w, T::ZERO, T::ZERO, h),
        }
    }

    /// Tait-Bryan angles applied roll, then pitch, then yaw (`z * y * x`)
    pub fn from_euler(roll: T, pitch: T, yaw: T) -> Self {
        let qx = Self::from_axis_rotation(Axis::X, roll);
        let qy = Self::from_axis_rotation(Axis::Y, pitch);
        let qz = Self::from_axis_rotation(Axis::Z, yaw);
        qz * (qy * qx)
    }

    /// Hamilton product: `a` applied to `b`
    pub fn multiply(a: &Self, b: &Self) -> Self {
        Self::new(
            a.w * b.w - a.x * b.x - a.y * b.y - a.z * b.z,
            a.x * b.w + a.w * b.x + a.y * b.z - a.z * b.y,
            a.w * b.y - a.x * b.z + a.y * b.w + a.z * b.x,
            a.w * b.z + a.x * b.y - a.y * b.x + a.z * b.w,
        )
    }

    pub fn norm_squared(&self) -> T {
        self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z
    }

    pub fn norm(&self) -> T {
        self.norm_squared().sqrt()
    }

    /// Unit-length copy. A zero quaternion becomes the identity.
    pub fn normalize(&self) -> Self {
        let n = self.norm();
        if n <= T::ZERO {
            return Self::identity();
        }
        let inv = T::ONE / n;
        Self::new(self.w * inv, self.x * inv, self.y * inv, self.z * inv)
    }

    pub fn conjugate(&self) -> Self {
        Self::new(self.w, -self.x, -self.y, -self.z)
    }

    /// Rotate `v` by this (unit) quaternion
    pub fn rotate(&self, v: Vector3<T>) -> Vector3<T> {
        let two = T::from_f32(2.0);
        let ww = self.w * self.w;
        let xx = self.x * self.x;
        let yy = self.y * self.y;
        let zz = self.z * self.z;
        let wx = self.w * self.x;
        let wy = self.w * self.y;
        let wz = self.w * self.z;
        let xy = self.x * self.y;
        let xz = self.x * self.z;
        let yz = self.y * self.z;
        Vector3::new(
            v.x * (ww + xx - yy - zz) + v.y * (xy - wz) * two + v.z * (xz + wy) * two,
            v.x * (xy + wz) * two + v.y * (ww - xx + yy - zz) + v.z * (yz - wx) * two,
            v.x * (xz - wy) * two + v.y * (yz + wx) * two + v.z * (ww - xx - yy + zz),
        )
    }

    /// Rotation axis (unit) and angle in [0, 2pi)
    ///
    /// When the vector part vanishes the angle is (close to) zero and the
    /// axis is undefined; `(1, 0, 0)` is returned in that case.
    pub fn to_axis_angle(&self) -> (Vector3<T>, T) {
        let v = self.vector();
        let s = v.norm();
        let angle = s.atan2(self.w) * T::from_f32(2.0);
        if s <= T::from_f32(AXIS_EPSILON) {
            return (Vector3::unit_x(), angle);
        }
        (v.scale(T::ONE / s), angle)
    }

    /// Shortest rotation taking unit vector `v0` onto unit vector `v1`
    ///
    /// Parallel inputs give the identity. Antiparallel inputs give a half
    /// turn about an axis orthogonal to `v0`.
    pub fn from_unit_vecs(v0: Vector3<T>, v1: Vector3<T>) -> Self {
        let eps = T::from_f32(ARC_EPSILON);
        let dot = v0.dot(v1);
        let cross = v0.cross(v1);
        let collinear = cross.max_abs() <= eps;

        if dot > T::ONE - eps || (collinear && dot > T::ZERO) {
            return Self::identity();
        }
        if dot < eps - T::ONE || collinear {
            let axis = Vector3::unit_x()
                .cross(v0)
                .normalize()
                .or_else(|| Vector3::unit_y().cross(v0).normalize())
                .unwrap_or_else(Vector3::unit_z);
            return Self::from_parts(T::ZERO, axis);
        }
        Self::from_parts(T::ONE + dot, cross).normalize()
    }

    /// Convert the component type
    pub fn cast<U: Scalar>(&self) -> Quaternion<U> {
        Quaternion::new(
            U::from_f32(self.w.to_f32()),
            U::from_f32(self.x.to_f32()),
            U::from_f32(self.y.to_f32()),
            U::from_f32(self.z.to_f32()),
        )
    }
}

impl<T: Scalar> Mul for Quaternion<T> {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Self::multiply(&self, &rhs)
    }
}
