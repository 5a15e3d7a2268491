//! Lookup-table trigonometry for [`Fix32`]
//!
//! Every function interpolates linearly between adjacent entries of a
//! precomputed table (256 segments per table). The tables are generated
//! by the build script and linked as constants, so there is no runtime
//! initialization step.
//!
//! Accuracy is about 1e-4 absolute for `sin`/`cos`/`atan`/`atan2`/`acos`
//! over their whole domain.

use super::Fix32;

include!(concat!(env!("OUT_DIR"), "/trig_tables.rs"));

/// Linear interpolation between `table[index]` and `table[index + 1]`
/// with an 8-bit fraction. Indices past the end return the last entry.
#[inline]
fn interpolate(table: &[i32], index: usize, frac: i32) -> i32 {
    let last = table[table.len() - 1];
    let lo = match table.get(index) {
        Some(v) => *v,
        None => return last,
    };
    match table.get(index + 1) {
        Some(hi) => lo + (((hi - lo) * frac) >> 8),
        None => lo,
    }
}

/// Position of `x` in units of pi: (table index, 8-bit fraction, negate)
#[inline]
fn half_turns(x: Fix32) -> (usize, i32, bool) {
    let turns = (x / Fix32::PI).raw();
    let negate = (turns >> 16) & 1 == 1;
    let pos = turns & 0xFFFF;
    ((pos >> 8) as usize, pos & 0xFF, negate)
}

#[inline]
fn half_turn_lookup(table: &[i32], index: usize, frac: i32, negate: bool) -> Fix32 {
    let v = interpolate(table, index, frac);
    Fix32::from_raw(if negate { -v } else { v })
}

/// Sine of an angle in radians
pub fn sin(x: Fix32) -> Fix32 {
    let (index, frac, negate) = half_turns(x);
    half_turn_lookup(&SIN_TABLE, index, frac, negate)
}

/// Cosine of an angle in radians
pub fn cos(x: Fix32) -> Fix32 {
    let (index, frac, negate) = half_turns(x);
    half_turn_lookup(&COS_TABLE, index, frac, negate)
}

/// Sine and cosine sharing one range reduction
pub fn sin_cos(x: Fix32) -> (Fix32, Fix32) {
    let (index, frac, negate) = half_turns(x);
    (
        half_turn_lookup(&SIN_TABLE, index, frac, negate),
        half_turn_lookup(&COS_TABLE, index, frac, negate),
    )
}

/// atan for 0 <= v <= 1
#[inline]
fn atan_unit(v: Fix32) -> Fix32 {
    let raw = v.raw();
    if raw < 0 {
        return Fix32::ZERO;
    }
    Fix32::from_raw(interpolate(
        &ATAN_TABLE,
        (raw >> 8) as usize,
        raw & 0xFF,
    ))
}

/// asin for 0 <= v <= 1, table region only
#[inline]
fn asin_table(v: Fix32) -> Fix32 {
    let raw = v.raw().max(0);
    Fix32::from_raw(interpolate(
        &ASIN_TABLE,
        (raw >> 8) as usize,
        raw & 0xFF,
    ))
}

/// Arctangent in radians, result in (-pi/2, pi/2)
pub fn atan(x: Fix32) -> Fix32 {
    let ax = x.abs();
    let r = if ax <= Fix32::ONE {
        atan_unit(ax)
    } else {
        Fix32::HALF_PI - atan_unit(Fix32::ONE / ax)
    };
    if x.is_negative() {
        -r
    } else {
        r
    }
}

/// Four-quadrant arctangent of `y / x`, result in [-pi, pi]
///
/// The ratio is always formed with the larger magnitude as divisor, so the
/// division cannot overflow. `atan2(0, 0)` returns 0.
pub fn atan2(y: Fix32, x: Fix32) -> Fix32 {
    if x.is_zero() && y.is_zero() {
        return Fix32::ZERO;
    }
    if x.abs() >= y.abs() {
        let a = atan(y / x);
        if !x.is_negative() {
            a
        } else if y.is_negative() {
            a - Fix32::PI
        } else {
            a + Fix32::PI
        }
    } else {
        let a = atan(x / y);
        if y.is_negative() {
            -Fix32::HALF_PI - a
        } else {
            Fix32::HALF_PI - a
        }
    }
}

/// Arccosine in radians, result in [0, pi]. Inputs outside [-1, 1] clamp.
///
/// Near |x| = 1 the arcsine table is too steep for linear interpolation, so
/// above |x| = 0.5 the result comes from `atan2(sqrt((1 - x)(1 + x)), x)`.
pub fn acos(x: Fix32) -> Fix32 {
    if x >= Fix32::ONE {
        return Fix32::ZERO;
    }
    if x <= -Fix32::ONE {
        return Fix32::PI;
    }
    let ax = x.abs();
    let asin_abs = if ax <= Fix32::HALF {
        asin_table(ax)
    } else {
        let s = sqrt((Fix32::ONE - ax) * (Fix32::ONE + ax));
        Fix32::HALF_PI - atan2(s, ax)
    };
    if x.is_negative() {
        Fix32::HALF_PI + asin_abs
    } else {
        Fix32::HALF_PI - asin_abs
    }
}

/// Arcsine in radians, result in [-pi/2, pi/2]. Inputs outside [-1, 1] clamp.
pub fn asin(x: Fix32) -> Fix32 {
    Fix32::HALF_PI - acos(x)
}

/// Square root; zero for non-positive inputs
///
/// Normalizes the input into [1, 4) by shifting two bits at a time, looks
/// the root up there and undoes the normalization on the result.
pub fn sqrt(x: Fix32) -> Fix32 {
    if x.raw() <= 0 {
        return Fix32::ZERO;
    }
    let one = 1u32 << 16;
    let four = 4u32 << 16;
    let mut v = x.raw() as u32;
    let mut shift: i32 = 0;
    while v < one {
        v <<= 2;
        shift += 1;
    }
    while v >= four {
        v >>= 2;
        shift -= 1;
    }
    let offset = v - one;
    let root = interpolate(&SQRT_TABLE, (offset >> 8) as usize, (offset & 0xFF) as i32) as u32;
    let raw = if shift >= 0 {
        root >> shift as u32
    } else {
        root << (-shift) as u32
    };
    Fix32::from_raw(raw as i32)
}
