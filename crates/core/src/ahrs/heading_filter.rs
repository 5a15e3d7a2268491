//! Magnetometer heading correction filter
//!
//! Smooths the difference between the magnetometer heading and the
//! gyro-integrated yaw. The filtered correction is added to yaw to form the
//! combined heading, so yaw drift stays bounded without the heading ever
//! snapping to a noisy magnetometer reading.

use crate::filters::Pt1;
use crate::fixed::Fix32;

/// Angle-aware PT1 on the (magnetometer - yaw) correction, range [-pi, pi)
#[derive(Debug, Clone, Copy)]
pub struct MagHeadingFilter {
    filter: Pt1<Fix32>,
}

impl MagHeadingFilter {
    pub fn new(cutoff_hz: f32, sample_hz: f32) -> Self {
        let mut filter = Pt1::new(cutoff_hz, sample_hz);
        filter.set_rollover(-Fix32::PI, Fix32::PI);
        Self { filter }
    }

    /// Feed one magnetometer heading and the yaw at the same instant
    ///
    /// The new correction is moved by a full turn when needed so the filter
    /// always takes the short way round.
    pub fn update(&mut self, mag_heading: Fix32, yaw: Fix32) -> Fix32 {
        let current = self.filter.value();
        let mut target = (mag_heading - yaw).wrap_pi();
        if target - current > Fix32::PI {
            target -= Fix32::TWO_PI;
        } else if target - current < -Fix32::PI {
            target += Fix32::TWO_PI;
        }
        self.filter.update(target);
        self.filter.rollover()
    }

    pub fn correction(&self) -> Fix32 {
        self.filter.value()
    }

    /// Jump straight to a correction (first magnetometer sample)
    pub fn reset_to(&mut self, correction: Fix32) {
        self.filter.set(correction.wrap_pi());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deg(v: f32) -> Fix32 {
        Fix32::from_f32(v.to_radians())
    }

    #[test]
    fn test_converges_to_offset() {
        let mut f = MagHeadingFilter::new(0.5, 75.0);
        for _ in 0..2000 {
            f.update(deg(30.0), deg(10.0));
        }
        assert!((f.correction().to_f32() - 20f32.to_radians()).abs() < 2e-3);
    }

    #[test]
    fn test_takes_short_way_across_pi() {
        let mut f = MagHeadingFilter::new(0.5, 75.0);
        f.reset_to(deg(175.0));
        // target -175 deg is 10 deg away across the wrap, not 350
        let c = f.update(deg(-175.0), Fix32::ZERO).to_f32().to_degrees();
        assert!(c > 175.0 || c < -170.0, "correction {}", c);
        for _ in 0..2000 {
            f.update(deg(-175.0), Fix32::ZERO);
        }
        let c = f.correction().to_f32().to_degrees();
        assert!((c + 175.0).abs() < 0.2, "correction {}", c);
    }

    #[test]
    fn test_alpha_one_passes_through() {
        let mut f = MagHeadingFilter {
            filter: {
                let mut p = Pt1::from_alpha(Fix32::ONE);
                p.set_rollover(-Fix32::PI, Fix32::PI);
                p
            },
        };
        let c = f.update(deg(90.0), deg(-120.0));
        // 210 deg wraps to -150 deg
        assert!((c.to_f32().to_degrees() + 150.0).abs() < 0.01);
    }
}
