//! Gyro bias calibration
//!
//! The gyro bias is measured at boot while the vehicle sits still: the
//! first `samples` body-frame readings are averaged and the mean is
//! subtracted from every later reading. Arming is refused until the
//! average is complete.

use crate::fixed::Fix32;

/// Streaming mean of the first N gyro readings
#[derive(Debug, Clone, Copy)]
pub struct GyroCalibration {
    target: u32,
    count: u32,
    sum: [i64; 3],
    bias: [Fix32; 3],
}

impl GyroCalibration {
    /// Calibration over `samples` readings. Zero samples means "no calibration".
    pub fn new(samples: u32) -> Self {
        Self {
            target: samples,
            count: 0,
            sum: [0; 3],
            bias: [Fix32::ZERO; 3],
        }
    }

    pub fn is_calibrated(&self) -> bool {
        self.count >= self.target
    }

    /// Feed one reading. Returns `true` on the sample that completes the average.
    pub fn accumulate(&mut self, body_rate: [i32; 3]) -> bool {
        if self.is_calibrated() {
            return false;
        }
        for (s, r) in self.sum.iter_mut().zip(body_rate) {
            *s += r as i64;
        }
        self.count += 1;
        if self.is_calibrated() {
            self.bias = mean_of(self.sum, self.count);
            return true;
        }
        false
    }

    /// Bias in raw counts
    pub fn bias(&self) -> [Fix32; 3] {
        self.bias
    }

    /// Start over, e.g. after the vehicle was moved during calibration
    pub fn restart(&mut self) {
        *self = Self::new(self.target);
    }

    /// Fraction done, 0..=1
    pub fn progress(&self) -> Fix32 {
        if self.target == 0 {
            return Fix32::ONE;
        }
        Fix32::from_raw(((self.count.min(self.target) as i64) << 16).wrapping_div(self.target as i64) as i32)
    }
}

fn mean_of(sum: [i64; 3], count: u32) -> [Fix32; 3] {
    let mut out = [Fix32::ZERO; 3];
    if count == 0 {
        return out;
    }
    for (o, s) in out.iter_mut().zip(sum) {
        let raw = (s << 16) / count as i64;
        *o = Fix32::from_raw(raw.clamp(i32::MIN as i64, i32::MAX as i64) as i32);
    }
    out
}

/// Mean of a batch of stationary gyro readings (raw counts)
pub fn estimate_gyro_bias(samples: &[[i32; 3]]) -> [Fix32; 3] {
    let mut sum = [0i64; 3];
    for sample in samples {
        for (s, r) in sum.iter_mut().zip(sample) {
            *s += *r as i64;
        }
    }
    mean_of(sum, samples.len() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_streaming_mean() {
        let mut cal = GyroCalibration::new(4);
        assert!(!cal.is_calibrated());
        assert!(!cal.accumulate([10, -5, 2]));
        assert!(!cal.accumulate([11, -6, 1]));
        assert!(!cal.accumulate([9, -4, 3]));
        assert!(cal.accumulate([11, -5, 2]));
        assert!(cal.is_calibrated());
        let b = cal.bias();
        assert_eq!(b[0], Fix32::from_f32(10.25));
        assert_eq!(b[1], Fix32::from_int(-5));
        assert_eq!(b[2], Fix32::from_int(2));
    }

    #[test]
    fn test_samples_after_completion_are_ignored() {
        let mut cal = GyroCalibration::new(1);
        cal.accumulate([4, 4, 4]);
        assert!(!cal.accumulate([100, 100, 100]));
        assert_eq!(cal.bias(), [Fix32::from_int(4); 3]);
    }

    #[test]
    fn test_zero_samples_is_calibrated() {
        let cal = GyroCalibration::new(0);
        assert!(cal.is_calibrated());
        assert_eq!(cal.progress(), Fix32::ONE);
    }

    #[test]
    fn test_restart_and_progress() {
        let mut cal = GyroCalibration::new(4);
        cal.accumulate([1, 1, 1]);
        cal.accumulate([1, 1, 1]);
        assert_eq!(cal.progress(), Fix32::HALF);
        cal.restart();
        assert_eq!(cal.progress(), Fix32::ZERO);
    }

    #[test]
    fn test_estimate_gyro_bias() {
        let samples = [[2, -4, 0], [4, -2, 1]];
        let bias = estimate_gyro_bias(&samples);
        assert_eq!(bias, [Fix32::from_int(3), Fix32::from_int(-3), Fix32::HALF]);
        assert_eq!(estimate_gyro_bias(&[]), [Fix32::ZERO; 3]);
    }
}
