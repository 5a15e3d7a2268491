//! Three-component vector

use core::ops::{Add, Mul, Neg, Sub};

use crate::fixed::Scalar;

/// 3D vector over any [`Scalar`]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector3<T> {
    pub x: T,
    pub y: T,
    pub z: T,
}

impl<T: Scalar> Vector3<T> {
    pub const fn new(x: T, y: T, z: T) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self::new(T::ZERO, T::ZERO, T::ZERO)
    }

    pub fn unit_x() -> Self {
        Self::new(T::ONE, T::ZERO, T::ZERO)
    }

    pub fn unit_y() -> Self {
        Self::new(T::ZERO, T::ONE, T::ZERO)
    }

    pub fn unit_z() -> Self {
        Self::new(T::ZERO, T::ZERO, T::ONE)
    }

    pub fn from_array(v: [T; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }

    pub fn to_array(self) -> [T; 3] {
        [self.x, self.y, self.z]
    }

    #[inline]
    pub fn dot(self, other: Self) -> T {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    #[inline]
    pub fn cross(self, other: Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn norm(self) -> T {
        self.dot(self).sqrt()
    }

    /// Unit vector in the same direction, or `None` if the norm is zero
    pub fn normalize(self) -> Option<Self> {
        let n = self.norm();
        if n > T::ZERO {
            Some(self.scale(T::ONE / n))
        } else {
            None
        }
    }

    #[inline]
    pub fn scale(self, k: T) -> Self {
        Self::new(self.x * k, self.y * k, self.z * k)
    }

    /// Largest absolute component
    pub fn max_abs(self) -> T {
        self.x.abs().max_of(self.y.abs()).max_of(self.z.abs())
    }

    /// Convert the component type
    pub fn cast<U: Scalar>(self) -> Vector3<U> {
        Vector3::new(
            U::from_f32(self.x.to_f32()),
            U::from_f32(self.y.to_f32()),
            U::from_f32(self.z.to_f32()),
        )
    }
}

impl<T: Scalar> Add for Vector3<T> {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl<T: Scalar> Sub for Vector3<T> {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl<T: Scalar> Neg for Vector3<T> {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl<T: Scalar> Mul<T> for Vector3<T> {
    type Output = Self;
    fn mul(self, rhs: T) -> Self {
        self.scale(rhs)
    }
}
