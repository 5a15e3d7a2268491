//! First-order low-pass filter

use crate::fixed::Scalar;

/// Per-sample blend coefficient for a first-order low-pass
///
/// `alpha = w / (w + 1)` with `w = 2 pi cutoff / sample_rate`.
pub fn alpha_for(cutoff_hz: f32, sample_hz: f32) -> f32 {
    if sample_hz <= 0.0 || cutoff_hz <= 0.0 {
        return 0.0;
    }
    let omega = 2.0 * core::f32::consts::PI * cutoff_hz / sample_hz;
    omega / (omega + 1.0)
}

/// Single-pole IIR low-pass: `y += alpha * (x - y)`
///
/// The state starts at zero. With [`Pt1::set_rollover`] configured,
/// [`Pt1::rollover`] wraps the state back into `[lower, upper)`, which is
/// what angular quantities need.
#[derive(Debug, Clone, Copy)]
pub struct Pt1<T> {
    alpha: T,
    y: T,
    sample_hz: f32,
    lower: T,
    upper: T,
}

impl<T: Scalar> Pt1<T> {
    /// Filter with `cutoff_hz` when updated at `sample_hz`
    pub fn new(cutoff_hz: f32, sample_hz: f32) -> Self {
        Self {
            alpha: T::from_f32(alpha_for(cutoff_hz, sample_hz)),
            y: T::ZERO,
            sample_hz,
            lower: T::ZERO,
            upper: T::ZERO,
        }
    }

    /// Filter with an explicit blend coefficient (close to 0 = heavy filtering)
    pub fn from_alpha(alpha: T) -> Self {
        Self {
            alpha,
            y: T::ZERO,
            sample_hz: 0.0,
            lower: T::ZERO,
            upper: T::ZERO,
        }
    }

    #[inline]
    pub fn update(&mut self, value: T) -> T {
        self.y = self.y + self.alpha * (value - self.y);
        self.y
    }

    /// Shift the state by `delta` without filtering
    #[inline]
    pub fn add(&mut self, delta: T) {
        self.y = self.y + delta;
    }

    /// Overwrite the state
    #[inline]
    pub fn set(&mut self, value: T) {
        self.y = value;
    }

    #[inline]
    pub fn value(&self) -> T {
        self.y
    }

    pub fn alpha(&self) -> T {
        self.alpha
    }

    /// Recompute alpha for a new cutoff at the construction sample rate
    ///
    /// No-op for filters built with [`Pt1::from_alpha`].
    pub fn update_cutoff(&mut self, cutoff_hz: f32) {
        if self.sample_hz > 0.0 {
            self.alpha = T::from_f32(alpha_for(cutoff_hz, self.sample_hz));
        }
    }

    pub fn update_alpha(&mut self, alpha: T) {
        self.alpha = alpha;
    }

    /// Configure the wrap range, lower bound inclusive, upper exclusive
    pub fn set_rollover(&mut self, lower: T, upper: T) {
        self.lower = lower;
        self.upper = upper;
    }

    /// Wrap the state into the configured range by one range width
    pub fn rollover(&mut self) -> T {
        let width = self.upper - self.lower;
        if self.y < self.lower {
            self.y = self.y + width;
        } else if self.y >= self.upper {
            self.y = self.y - width;
        }
        self.y
    }
}
