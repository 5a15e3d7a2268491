//! Numeric abstraction for filters, geometry and controllers

use core::ops::{Add, Div, Mul, Neg, Sub};

use super::{trig, Fix32};

/// The arithmetic surface a filter, quaternion or controller needs from its
/// number type.
///
/// Implemented for [`Fix32`] (lookup-table trigonometry, bit-reproducible)
/// and `f32` (`libm`), so the algorithms do not depend on the fixed-point
/// representation. The attitude integrator runs on `f32` because a single
/// gyro increment is far below one Q16.16 step; everything downstream of it
/// runs on `Fix32`.
pub trait Scalar:
    Copy
    + PartialOrd
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
{
    const ZERO: Self;
    const ONE: Self;

    fn from_f32(value: f32) -> Self;
    fn to_f32(self) -> f32;
    fn abs(self) -> Self;
    /// Square root; zero for non-positive inputs
    fn sqrt(self) -> Self;
    fn sin_cos(self) -> (Self, Self);
    fn atan2(self, x: Self) -> Self;
    /// Arccosine with the input clamped to [-1, 1]
    fn acos(self) -> Self;
    /// Arcsine with the input clamped to [-1, 1]
    fn asin(self) -> Self;

    #[inline]
    fn min_of(self, other: Self) -> Self {
        if other < self {
            other
        } else {
            self
        }
    }

    #[inline]
    fn max_of(self, other: Self) -> Self {
        if other > self {
            other
        } else {
            self
        }
    }

    #[inline]
    fn clamp_to(self, lower: Self, upper: Self) -> Self {
        self.max_of(lower).min_of(upper)
    }
}

impl Scalar for Fix32 {
    const ZERO: Self = Fix32::ZERO;
    const ONE: Self = Fix32::ONE;

    #[inline]
    fn from_f32(value: f32) -> Self {
        Fix32::from_f32(value)
    }

    #[inline]
    fn to_f32(self) -> f32 {
        Fix32::to_f32(self)
    }

    #[inline]
    fn abs(self) -> Self {
        Fix32::abs(self)
    }

    #[inline]
    fn sqrt(self) -> Self {
        trig::sqrt(self)
    }

    #[inline]
    fn sin_cos(self) -> (Self, Self) {
        trig::sin_cos(self)
    }

    #[inline]
    fn atan2(self, x: Self) -> Self {
        trig::atan2(self, x)
    }

    #[inline]
    fn acos(self) -> Self {
        trig::acos(self)
    }

    #[inline]
    fn asin(self) -> Self {
        trig::asin(self)
    }
}

impl Scalar for f32 {
    const ZERO: Self = 0.0;
    const ONE: Self = 1.0;

    #[inline]
    fn from_f32(value: f32) -> Self {
        value
    }

    #[inline]
    fn to_f32(self) -> f32 {
        self
    }

    #[inline]
    fn abs(self) -> Self {
        libm::fabsf(self)
    }

    #[inline]
    fn sqrt(self) -> Self {
        if self <= 0.0 {
            0.0
        } else {
            libm::sqrtf(self)
        }
    }

    #[inline]
    fn sin_cos(self) -> (Self, Self) {
        (libm::sinf(self), libm::cosf(self))
    }

    #[inline]
    fn atan2(self, x: Self) -> Self {
        libm::atan2f(self, x)
    }

    #[inline]
    fn acos(self) -> Self {
        libm::acosf(self.clamp_to(-1.0, 1.0))
    }

    #[inline]
    fn asin(self) -> Self {
        libm::asinf(self.clamp_to(-1.0, 1.0))
    }
}
