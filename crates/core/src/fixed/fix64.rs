//! Q48.16 fixed point
//!
//! Used where a Q16.16 would overflow: PID error accumulators and long
//! running sums. Shares the 16-bit fraction with [`Fix32`], so widening is
//! a plain sign extension of the raw value.

use core::fmt;
use core::ops::{
    Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Rem, Shl, Shr, Sub, SubAssign,
};

use super::{assign_ops, Fix32, FRAC_BITS};

const ONE_RAW: i64 = 1 << FRAC_BITS;

/// Q48.16 signed fixed-point number
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fix64(i64);

impl Fix64 {
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(ONE_RAW);
    pub const MAX: Self = Self(i64::MAX);
    pub const MIN: Self = Self(i64::MIN);

    #[inline]
    pub const fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn from_int(value: i64) -> Self {
        Self(value.wrapping_shl(FRAC_BITS))
    }

    /// Nearest representable value, saturating at the range ends
    #[inline]
    pub fn from_f64(value: f64) -> Self {
        Self(libm::round(value * ONE_RAW as f64) as i64)
    }

    #[inline]
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / ONE_RAW as f64
    }

    /// Narrow to Q16.16. The integer part wraps when it does not fit.
    #[inline]
    pub const fn to_fix32(self) -> Fix32 {
        Fix32::from_raw(self.0 as i32)
    }

    /// Narrow to Q16.16, saturating instead of wrapping
    #[inline]
    pub fn to_fix32_saturating(self) -> Fix32 {
        Fix32::from_raw(self.0.clamp(i32::MIN as i64, i32::MAX as i64) as i32)
    }

    #[inline]
    pub const fn to_int(self) -> i64 {
        self.0 >> FRAC_BITS
    }

    #[inline]
    pub const fn abs(self) -> Self {
        Self(self.0.wrapping_abs())
    }

    /// +1 for values >= 0, -1 otherwise
    #[inline]
    pub const fn sign(self) -> i32 {
        ((self.0 >> 63) * 2 + 1) as i32
    }
}

impl fmt::Debug for Fix64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fix64({})", self.to_f64())
    }
}

impl fmt::Display for Fix64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_f64())
    }
}

impl From<Fix32> for Fix64 {
    fn from(value: Fix32) -> Self {
        value.to_fix64()
    }
}

impl Add for Fix64 {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self(self.0.wrapping_add(rhs.0))
    }
}

impl Sub for Fix64 {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self(self.0.wrapping_sub(rhs.0))
    }
}

impl Mul for Fix64 {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self(((self.0 as i128 * rhs.0 as i128) >> FRAC_BITS) as i64)
    }
}

impl Div for Fix64 {
    type Output = Self;
    /// Panics when `rhs` is zero, like integer division.
    #[inline]
    fn div(self, rhs: Self) -> Self {
        Self((((self.0 as i128) << FRAC_BITS) / rhs.0 as i128) as i64)
    }
}

impl Rem for Fix64 {
    type Output = Self;
    #[inline]
    fn rem(self, rhs: Self) -> Self {
        Self(self.0.wrapping_rem(rhs.0))
    }
}

impl Neg for Fix64 {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self(self.0.wrapping_neg())
    }
}

impl Shl<u32> for Fix64 {
    type Output = Self;
    #[inline]
    fn shl(self, rhs: u32) -> Self {
        Self(self.0.wrapping_shl(rhs))
    }
}

impl Shr<u32> for Fix64 {
    type Output = Self;
    #[inline]
    fn shr(self, rhs: u32) -> Self {
        Self(self.0.wrapping_shr(rhs))
    }
}

// Mixed-width operations always produce the wide type.

impl Add<Fix32> for Fix64 {
    type Output = Fix64;
    #[inline]
    fn add(self, rhs: Fix32) -> Fix64 {
        self + rhs.to_fix64()
    }
}

impl Sub<Fix32> for Fix64 {
    type Output = Fix64;
    #[inline]
    fn sub(self, rhs: Fix32) -> Fix64 {
        self - rhs.to_fix64()
    }
}

impl Mul<Fix32> for Fix64 {
    type Output = Fix64;
    #[inline]
    fn mul(self, rhs: Fix32) -> Fix64 {
        self * rhs.to_fix64()
    }
}

impl Div<Fix32> for Fix64 {
    type Output = Fix64;
    #[inline]
    fn div(self, rhs: Fix32) -> Fix64 {
        self / rhs.to_fix64()
    }
}

impl Mul<Fix64> for Fix32 {
    type Output = Fix64;
    #[inline]
    fn mul(self, rhs: Fix64) -> Fix64 {
        self.to_fix64() * rhs
    }
}

impl Mul<i64> for Fix64 {
    type Output = Fix64;
    #[inline]
    fn mul(self, rhs: i64) -> Fix64 {
        Self(self.0.wrapping_mul(rhs))
    }
}

impl Div<i64> for Fix64 {
    type Output = Fix64;
    #[inline]
    fn div(self, rhs: i64) -> Fix64 {
        Self(self.0.wrapping_div(rhs))
    }
}

assign_ops!(Fix64, Fix64,
    AddAssign::add_assign => add,
    SubAssign::sub_assign => sub,
    MulAssign::mul_assign => mul,
    DivAssign::div_assign => div);
assign_ops!(Fix64, Fix32,
    AddAssign::add_assign => add,
    SubAssign::sub_assign => sub,
    MulAssign::mul_assign => mul,
    DivAssign::div_assign => div);
