//! Cascaded first-order filters

use super::Pt1;
use crate::fixed::Scalar;

/// Cutoff multiplier keeping the -3 dB point of two cascaded stages
const PT2_CUTOFF_CORRECTION: f32 = 1.553_774;
/// Cutoff multiplier keeping the -3 dB point of three cascaded stages
const PT3_CUTOFF_CORRECTION: f32 = 1.961_459;

/// Two PT1 stages in series
#[derive(Debug, Clone, Copy)]
pub struct Pt2<T> {
    stages: [Pt1<T>; 2],
}

impl<T: Scalar> Pt2<T> {
    pub fn new(cutoff_hz: f32, sample_hz: f32) -> Self {
        let stage = Pt1::new(cutoff_hz * PT2_CUTOFF_CORRECTION, sample_hz);
        Self {
            stages: [stage; 2],
        }
    }

    #[inline]
    pub fn update(&mut self, value: T) -> T {
        let a = self.stages[0].update(value);
        self.stages[1].update(a)
    }

    pub fn value(&self) -> T {
        self.stages[1].value()
    }

    /// Set every stage to `value` (no transient)
    pub fn set(&mut self, value: T) {
        for s in &mut self.stages {
            s.set(value);
        }
    }

    pub fn update_cutoff(&mut self, cutoff_hz: f32) {
        for s in &mut self.stages {
            s.update_cutoff(cutoff_hz * PT2_CUTOFF_CORRECTION);
        }
    }
}

/// Three PT1 stages in series
#[derive(Debug, Clone, Copy)]
pub struct Pt3<T> {
    stages: [Pt1<T>; 3],
}

impl<T: Scalar> Pt3<T> {
    pub fn new(cutoff_hz: f32, sample_hz: f32) -> Self {
        let stage = Pt1::new(cutoff_hz * PT3_CUTOFF_CORRECTION, sample_hz);
        Self {
            stages: [stage; 3],
        }
    }

    #[inline]
    pub fn update(&mut self, value: T) -> T {
        let a = self.stages[0].update(value);
        let b = self.stages[1].update(a);
        self.stages[2].update(b)
    }

    pub fn value(&self) -> T {
        self.stages[2].value()
    }

    pub fn set(&mut self, value: T) {
        for s in &mut self.stages {
            s.set(value);
        }
    }

    pub fn update_cutoff(&mut self, cutoff_hz: f32) {
        for s in &mut self.stages {
            s.update_cutoff(cutoff_hz * PT3_CUTOFF_CORRECTION);
        }
    }
}

/// Two-rate PT1 cascade for cutoffs far below the sample rate
///
/// A single PT1 at `cutoff << sample_rate` needs an alpha close to zero,
/// which a Q16.16 cannot resolve. This filter decimates by
/// `n = round(sqrt(sample_rate / cutoff))`: an inner anti-alias stage runs
/// every sample, the outer stage with the real cutoff runs every `n`-th
/// sample at the geometric-mean rate. Both alphas are of order `1 / n`.
#[derive(Debug, Clone, Copy)]
pub struct DualPt1<T> {
    inner: Pt1<T>,
    outer: Pt1<T>,
    decimation: u32,
    counter: u32,
}

impl<T: Scalar> DualPt1<T> {
    pub fn new(cutoff_hz: f32, sample_hz: f32) -> Self {
        let ratio = if cutoff_hz > 0.0 {
            sample_hz / cutoff_hz
        } else {
            1.0
        };
        let decimation = (libm::roundf(libm::sqrtf(ratio)) as u32).max(1);
        let mid_hz = sample_hz / decimation as f32;
        Self {
            inner: Pt1::new(mid_hz / 4.0, sample_hz),
            outer: Pt1::new(cutoff_hz, mid_hz),
            decimation,
            counter: 0,
        }
    }

    /// Samples between two outer-stage updates
    pub fn decimation(&self) -> u32 {
        self.decimation
    }

    pub fn update(&mut self, value: T) -> T {
        let inner = self.inner.update(value);
        self.counter += 1;
        if self.counter >= self.decimation {
            self.counter = 0;
            self.outer.update(inner);
        }
        self.outer.value()
    }

    pub fn value(&self) -> T {
        self.outer.value()
    }

    pub fn set(&mut self, value: T) {
        self.inner.set(value);
        self.outer.set(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::Fix32;

    /// Amplitude of the steady-state response to a sine at `freq`
    fn gain_at(freq: f32, sample_hz: f32, mut step: impl FnMut(f32) -> f32) -> f32 {
        let n = (sample_hz * 20.0 / freq) as usize;
        let mut peak = 0.0f32;
        for i in 0..n {
            let t = i as f32 / sample_hz;
            let y = step(libm::sinf(2.0 * core::f32::consts::PI * freq * t));
            if i > n / 2 {
                peak = peak.max(y.abs());
            }
        }
        peak
    }

    #[test]
    fn test_pt2_keeps_cutoff_near_minus_3db() {
        let mut f = Pt2::<f32>::new(50.0, 3200.0);
        let g = gain_at(50.0, 3200.0, |x| f.update(x));
        assert!((g - 0.707).abs() < 0.06, "gain {}", g);
    }

    #[test]
    fn test_pt3_keeps_cutoff_near_minus_3db() {
        let mut f = Pt3::<f32>::new(50.0, 3200.0);
        let g = gain_at(50.0, 3200.0, |x| f.update(x));
        assert!((g - 0.707).abs() < 0.06, "gain {}", g);
    }

    #[test]
    fn test_pt2_attenuates_more_than_pt1_above_cutoff() {
        let mut p1 = Pt1::<f32>::new(50.0, 3200.0);
        let mut p2 = Pt2::<f32>::new(50.0, 3200.0);
        let g1 = gain_at(400.0, 3200.0, |x| p1.update(x));
        let g2 = gain_at(400.0, 3200.0, |x| p2.update(x));
        assert!(g2 < g1, "pt1 {} pt2 {}", g1, g2);
    }

    #[test]
    fn test_dual_pt1_decimation() {
        let f = DualPt1::<Fix32>::new(1.0, 3200.0);
        assert_eq!(f.decimation(), 57);
    }

    #[test]
    fn test_dual_pt1_converges_at_very_low_cutoff() {
        // a single 0.05 Hz stage at 3200 Hz has an alpha of only 6 Q16.16 steps
        let single = Pt1::<Fix32>::new(0.05, 3200.0);
        assert!(single.alpha().raw() < 8);

        let mut f = DualPt1::<Fix32>::new(0.05, 3200.0);
        let input = Fix32::from_int(10);
        for _ in 0..(3200 * 40) {
            f.update(input);
        }
        assert!((f.value().to_f32() - 10.0).abs() < 0.2, "value {}", f.value());
    }

    #[test]
    fn test_set_skips_transient() {
        let mut f = Pt3::<f32>::new(5.0, 100.0);
        f.set(3.0);
        assert!((f.update(3.0) - 3.0).abs() < 1e-6);
    }
}
