//! Fixed-point arithmetic
//!
//! Deterministic signed fixed-point numbers used by every estimation and
//! control algorithm in place of floating point.
//!
//! - [`Fix32`]: Q16.16 in an `i32`
//! - [`Fix64`]: Q48.16 in an `i64` (same scale, wider integer part)
//!
//! All arithmetic wraps exactly like the underlying native integer, in
//! debug and release builds alike, so results are bit-reproducible across
//! targets. Division by zero is a caller precondition (it panics, like
//! integer division) and is never reported as an error.
//!
//! Multiplication widens before shifting back: `Fix32 * Fix32` goes through
//! `i64`, anything involving `Fix64` goes through `i128`.

mod fix64;
mod scalar;
pub mod trig;

pub use fix64::Fix64;
pub use scalar::Scalar;

use core::fmt;
use core::ops::{
    Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Rem, Shl, ShlAssign, Shr, ShrAssign, Sub,
    SubAssign,
};

/// Number of fractional bits shared by both widths
pub const FRAC_BITS: u32 = 16;

const ONE_RAW: i32 = 1 << FRAC_BITS;

/// Q16.16 signed fixed-point number
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fix32(i32);

impl Fix32 {
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(ONE_RAW);
    pub const HALF: Self = Self(ONE_RAW / 2);
    /// Smallest positive value (2^-16)
    pub const EPSILON: Self = Self(1);
    pub const MAX: Self = Self(i32::MAX);
    pub const MIN: Self = Self(i32::MIN);
    pub const PI: Self = Self(205_887);
    pub const HALF_PI: Self = Self(102_944);
    pub const TWO_PI: Self = Self(411_775);
    pub const DEG_TO_RAD: Self = Self(1_144);
    pub const RAD_TO_DEG: Self = Self(3_754_936);

    /// Wraps a raw Q16.16 bit pattern
    #[inline]
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// Raw Q16.16 bit pattern
    #[inline]
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Integer conversion (wraps outside +-32768)
    #[inline]
    pub const fn from_int(value: i32) -> Self {
        Self(value.wrapping_shl(FRAC_BITS))
    }

    /// Nearest representable value, saturating at the range ends
    #[inline]
    pub fn from_f32(value: f32) -> Self {
        Self(libm::roundf(value * ONE_RAW as f32) as i32)
    }

    /// Nearest representable value, saturating at the range ends
    #[inline]
    pub fn from_f64(value: f64) -> Self {
        Self(libm::round(value * ONE_RAW as f64) as i32)
    }

    #[inline]
    pub fn to_f32(self) -> f32 {
        self.0 as f32 / ONE_RAW as f32
    }

    #[inline]
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / ONE_RAW as f64
    }

    /// Integer part, rounded toward negative infinity
    #[inline]
    pub const fn to_int(self) -> i32 {
        self.0 >> FRAC_BITS
    }

    /// Integer part, rounded to nearest (halves round up)
    #[inline]
    pub const fn round_int(self) -> i32 {
        self.0.wrapping_add(ONE_RAW / 2) >> FRAC_BITS
    }

    #[inline]
    pub const fn abs(self) -> Self {
        Self(self.0.wrapping_abs())
    }

    /// +1 for values >= 0, -1 otherwise
    #[inline]
    pub const fn sign(self) -> i32 {
        (self.0 >> 31) * 2 + 1
    }

    #[inline]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Widen to Q48.16 without loss
    #[inline]
    pub const fn to_fix64(self) -> Fix64 {
        Fix64::from_raw(self.0 as i64)
    }

    /// Wrap an angle in radians into [-pi, pi)
    pub fn wrap_pi(self) -> Self {
        let mut v = self;
        while v >= Self::PI {
            v -= Self::TWO_PI;
        }
        while v < -Self::PI {
            v += Self::TWO_PI;
        }
        v
    }
}

impl fmt::Debug for Fix32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fix32({})", self.to_f64())
    }
}

impl fmt::Display for Fix32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_f64())
    }
}

impl From<i32> for Fix32 {
    fn from(value: i32) -> Self {
        Self::from_int(value)
    }
}

impl From<i16> for Fix32 {
    fn from(value: i16) -> Self {
        Self::from_int(value as i32)
    }
}

impl From<u16> for Fix32 {
    fn from(value: u16) -> Self {
        Self::from_int(value as i32)
    }
}

impl Add for Fix32 {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self(self.0.wrapping_add(rhs.0))
    }
}

impl Sub for Fix32 {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self(self.0.wrapping_sub(rhs.0))
    }
}

impl Mul for Fix32 {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self(((self.0 as i64 * rhs.0 as i64) >> FRAC_BITS) as i32)
    }
}

impl Div for Fix32 {
    type Output = Self;
    /// Panics when `rhs` is zero, like integer division.
    #[inline]
    fn div(self, rhs: Self) -> Self {
        Self((((self.0 as i64) << FRAC_BITS) / rhs.0 as i64) as i32)
    }
}

impl Rem for Fix32 {
    type Output = Self;
    #[inline]
    fn rem(self, rhs: Self) -> Self {
        Self(self.0.wrapping_rem(rhs.0))
    }
}

impl Neg for Fix32 {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self(self.0.wrapping_neg())
    }
}

impl Mul<i32> for Fix32 {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: i32) -> Self {
        Self(self.0.wrapping_mul(rhs))
    }
}

impl Div<i32> for Fix32 {
    type Output = Self;
    #[inline]
    fn div(self, rhs: i32) -> Self {
        Self(self.0.wrapping_div(rhs))
    }
}

impl Shl<u32> for Fix32 {
    type Output = Self;
    #[inline]
    fn shl(self, rhs: u32) -> Self {
        Self(self.0.wrapping_shl(rhs))
    }
}

impl Shr<u32> for Fix32 {
    type Output = Self;
    #[inline]
    fn shr(self, rhs: u32) -> Self {
        Self(self.0.wrapping_shr(rhs))
    }
}

macro_rules! assign_ops {
    ($ty:ty, $rhs:ty, $($trait:ident :: $method:ident => $op:ident),*) => {
        $(
            impl $trait<$rhs> for $ty {
                #[inline]
                fn $method(&mut self, rhs: $rhs) {
                    *self = (*self).$op(rhs);
                }
            }
        )*
    };
}

assign_ops!(Fix32, Fix32,
    AddAssign::add_assign => add,
    SubAssign::sub_assign => sub,
    MulAssign::mul_assign => mul,
    DivAssign::div_assign => div);
assign_ops!(Fix32, i32,
    MulAssign::mul_assign => mul,
    DivAssign::div_assign => div);
assign_ops!(Fix32, u32,
    ShlAssign::shl_assign => shl,
    ShrAssign::shr_assign => shr);

pub(crate) use assign_ops;
