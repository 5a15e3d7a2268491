//! Per-axis rate controller

use super::boost::{BoostFactors, PidBoost};
use crate::filters::{Pt1, Pt2};
use crate::fixed::{Fix32, Fix64};
use crate::state::Setpoints;

/// Left shifts turning the integer "nice" gains into Q16.16 gains
/// (P, I, D, FF, S)
pub const GAIN_SHIFTS: [u32; 5] = [11, 3, 10, 13, 8];

/// Throttle channel value above which the craft counts as flying
const TAKEOFF_THROTTLE_CHANNEL: u16 = 1020;

/// Cycles above the takeoff throttle before I falloff stops (about 0.3 s)
const TAKEOFF_CYCLES: u32 = 1000;

/// Setpoint-derivative sum where I relax starts and where it bottoms out
const I_RELAX_START: i32 = 70;
const I_RELAX_FULL: i32 = 300;

/// Gains of one axis, already converted to Q16.16
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AxisGains {
    pub p: Fix32,
    pub i: Fix32,
    pub d: Fix32,
    pub ff: Fix32,
    pub s: Fix32,
}

impl AxisGains {
    /// Integer tuning values as shown to the pilot (P, I, D, FF, S)
    pub fn from_nice(nice: [u16; 5]) -> Self {
        let g = |i: usize| Fix32::from_raw((nice[i] as i32) << GAIN_SHIFTS[i]);
        Self {
            p: g(0),
            i: g(1),
            d: g(2),
            ff: g(3),
            s: g(4),
        }
    }
}

/// PID loop configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidConfig {
    pub sample_hz: f32,
    /// Roll, pitch, yaw
    pub gains: [AxisGains; 3],
    /// I-term decay before takeoff, I-term units per second
    pub i_falloff: Fix32,
    /// Largest |I term| in motor units
    pub i_limit: Fix32,
    pub dterm_cutoff_hz: f32,
    pub gyro_cutoff_hz: f32,
    pub setpoint_diff_cutoff_hz: f32,
}

impl Default for PidConfig {
    fn default() -> Self {
        let gains = AxisGains::from_nice([80, 40, 500, 40, 0]);
        Self {
            sample_hz: 3200.0,
            gains: [gains; 3],
            i_falloff: Fix32::from_int(400),
            i_limit: Fix32::from_int(500),
            dterm_cutoff_hz: 70.0,
            gyro_cutoff_hz: 100.0,
            setpoint_diff_cutoff_hz: 12.0,
        }
    }
}

/// Terms of one axis from the last cycle, motor units
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AxisTerms {
    pub p: Fix32,
    pub i: Fix32,
    pub d: Fix32,
    pub ff: Fix32,
    pub s: Fix32,
}

impl AxisTerms {
    pub fn sum(&self) -> Fix32 {
        self.p + self.i + self.d + self.ff + self.s
    }
}

/// Published PID state for telemetry and blackbox consumers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PidTerms {
    /// Roll, pitch, yaw
    pub axes: [AxisTerms; 3],
    /// Filtered gyro rates, deg/s
    pub gyro_filtered: [Fix32; 3],
    pub i_relax: Fix32,
}

impl PidTerms {
    pub fn outputs(&self) -> [Fix32; 3] {
        [self.axes[0].sum(), self.axes[1].sum(), self.axes[2].sum()]
    }
}

#[derive(Debug, Clone, Copy)]
struct AxisState {
    gyro_filter: Pt1<Fix32>,
    dterm_filter: Pt2<Fix32>,
    setpoint_diff: Pt1<Fix32>,
    error_sum: Fix64,
    last_rate: Fix32,
    last_setpoint: Fix32,
}

impl AxisState {
    fn new(config: &PidConfig) -> Self {
        Self {
            gyro_filter: Pt1::new(config.gyro_cutoff_hz, config.sample_hz),
            dterm_filter: Pt2::new(config.dterm_cutoff_hz, config.sample_hz),
            setpoint_diff: Pt1::new(config.setpoint_diff_cutoff_hz, config.sample_hz),
            error_sum: Fix64::ZERO,
            last_rate: Fix32::ZERO,
            last_setpoint: Fix32::ZERO,
        }
    }
}

/// Three-axis rate PID with feedforward, I relax and pre-takeoff I falloff
///
/// The error sum is clamped every cycle so that `|Ki * sum|` never exceeds
/// `i_limit`.
#[derive(Debug, Clone)]
pub struct RatePid {
    config: PidConfig,
    sample_rate: i32,
    axes: [AxisState; 3],
    boost: Option<PidBoost>,
    takeoff_counter: u32,
    terms: PidTerms,
}

impl RatePid {
    pub fn new(config: PidConfig) -> Self {
        Self {
            sample_rate: (config.sample_hz as i32).max(1),
            axes: [AxisState::new(&config); 3],
            boost: None,
            takeoff_counter: 0,
            terms: PidTerms::default(),
            config,
        }
    }

    pub fn with_boost(mut self, boost: PidBoost) -> Self {
        self.boost = Some(boost);
        self
    }

    pub fn config(&self) -> &PidConfig {
        &self.config
    }

    /// Swap in new gains and filter cutoffs, keeping the integrator state
    pub fn set_config(&mut self, config: PidConfig) {
        for axis in self.axes.iter_mut() {
            axis.gyro_filter.update_cutoff(config.gyro_cutoff_hz);
            axis.dterm_filter.update_cutoff(config.dterm_cutoff_hz);
            axis.setpoint_diff.update_cutoff(config.setpoint_diff_cutoff_hz);
        }
        self.sample_rate = (config.sample_hz as i32).max(1);
        self.config = config;
    }

    pub fn terms(&self) -> &PidTerms {
        &self.terms
    }

    /// Integrator of one axis in error units (deg/s * cycles)
    pub fn error_sum(&self, axis: usize) -> Fix64 {
        self.axes.get(axis).map(|a| a.error_sum).unwrap_or(Fix64::ZERO)
    }

    /// Whether the takeoff detector has latched
    pub fn has_taken_off(&self) -> bool {
        self.takeoff_counter >= TAKEOFF_CYCLES
    }

    /// One armed cycle. Returns the roll, pitch and yaw outputs in motor units.
    pub fn update(
        &mut self,
        setpoints: &Setpoints,
        gyro_dps: [Fix32; 3],
        throttle_channel: u16,
    ) -> [Fix32; 3] {
        if throttle_channel > TAKEOFF_THROTTLE_CHANNEL {
            self.takeoff_counter = self.takeoff_counter.saturating_add(1);
        } else if self.takeoff_counter < TAKEOFF_CYCLES {
            self.takeoff_counter = 0;
        }
        let falloff = !self.has_taken_off();

        let boost = match self.boost.as_mut() {
            Some(b) => b.update(setpoints.throttle),
            None => BoostFactors::NONE,
        };
        let boost_yaw = self.boost.map(|b| b.boosts_yaw()).unwrap_or(false);

        // setpoint derivative, 1/16 deg/s^2
        let mut total_diff = Fix32::ZERO;
        for (axis, &sp) in self.axes.iter_mut().zip(setpoints.rates.iter()) {
            let diff = (((sp - axis.last_setpoint) >> 4).to_fix64() * self.sample_rate as i64)
                .to_fix32_saturating();
            total_diff += axis.setpoint_diff.update(diff).abs();
        }
        let i_relax = i_relax_factor(total_diff);

        let mut outputs = [Fix32::ZERO; 3];
        for (index, axis) in self.axes.iter_mut().enumerate() {
            let gains = self.config.gains[index];
            let setpoint = setpoints.rates[index];
            let rate = axis.gyro_filter.update(gyro_dps[index]);
            let error = setpoint - rate;
            let (p_factor, d_factor) = if index < 2 || boost_yaw {
                (boost.p, boost.d)
            } else {
                (Fix32::ONE, Fix32::ONE)
            };

            if falloff && !gains.i.is_zero() {
                let step = (self.config.i_falloff / self.sample_rate).to_fix64() / gains.i;
                if axis.error_sum.abs() <= step {
                    axis.error_sum = Fix64::ZERO;
                } else if axis.error_sum > Fix64::ZERO {
                    axis.error_sum -= step;
                } else {
                    axis.error_sum += step;
                }
            }

            axis.error_sum += error * i_relax * boost.i;
            if gains.i.is_zero() {
                axis.error_sum = Fix64::ZERO;
            } else {
                let bound = self.config.i_limit.to_fix64() / gains.i;
                axis.error_sum = axis.error_sum.clamp(-bound, bound);
            }

            let terms = AxisTerms {
                p: gains.p * error * p_factor,
                i: (gains.i * axis.error_sum).to_fix32_saturating(),
                d: gains.d * axis.dterm_filter.update(axis.last_rate - rate) * d_factor,
                ff: gains.ff * axis.setpoint_diff.value(),
                s: gains.s * setpoint,
            };
            outputs[index] = terms.sum();
            self.terms.axes[index] = terms;
            self.terms.gyro_filtered[index] = rate;

            axis.last_rate = rate;
            axis.last_setpoint = setpoint;
        }
        self.terms.i_relax = i_relax;
        outputs
    }

    /// Disarmed cycle: integrators and history cleared, gyro filters kept warm
    pub fn reset(&mut self, gyro_dps: [Fix32; 3]) {
        for (index, axis) in self.axes.iter_mut().enumerate() {
            let rate = axis.gyro_filter.update(gyro_dps[index]);
            axis.error_sum = Fix64::ZERO;
            axis.last_rate = Fix32::ZERO;
            axis.last_setpoint = Fix32::ZERO;
            axis.setpoint_diff.set(Fix32::ZERO);
            axis.dterm_filter.set(Fix32::ZERO);
            self.terms.gyro_filtered[index] = rate;
            self.terms.axes[index] = AxisTerms::default();
        }
        if let Some(boost) = self.boost.as_mut() {
            boost.reset();
        }
        self.takeoff_counter = 0;
    }

    /// Clear only the integrators (control authority changed in flight)
    pub fn reset_integrators(&mut self) {
        for axis in self.axes.iter_mut() {
            axis.error_sum = Fix64::ZERO;
        }
    }
}

/// I gain multiplier from the summed setpoint derivative
fn i_relax_factor(total_diff: Fix32) -> Fix32 {
    if total_diff > Fix32::from_int(I_RELAX_FULL) {
        Fix32::from_raw(4096)
    } else if total_diff > Fix32::from_int(I_RELAX_START) {
        let span = I_RELAX_FULL - I_RELAX_START;
        Fix32::ONE - (total_diff - Fix32::from_int(I_RELAX_START)) / span * 15 / 16
    } else {
        Fix32::ONE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fx(v: f32) -> Fix32 {
        Fix32::from_f32(v)
    }

    fn setpoints(roll: f32, pitch: f32, yaw: f32) -> Setpoints {
        Setpoints::new(fx(roll), fx(pitch), fx(yaw), Fix32::from_int(400))
    }

    #[test]
    fn test_gain_conversion() {
        let g = AxisGains::from_nice([80, 40, 500, 40, 0]);
        assert_eq!(g.p.raw(), 80 << 11);
        assert_eq!(g.i.raw(), 40 << 3);
        assert_eq!(g.d.raw(), 500 << 10);
        assert_eq!(g.ff.raw(), 40 << 13);
        assert_eq!(g.s, Fix32::ZERO);
        assert!((g.p.to_f32() - 2.5).abs() < 1e-6);
    }

    #[test]
    fn test_i_relax_zones() {
        assert_eq!(i_relax_factor(Fix32::from_int(10)), Fix32::ONE);
        assert_eq!(i_relax_factor(Fix32::from_int(400)), Fix32::from_f32(0.0625));
        let mid = i_relax_factor(Fix32::from_int(185)).to_f32();
        assert!((mid - (1.0 - 0.5 * 15.0 / 16.0)).abs() < 1e-3, "mid {}", mid);
    }

    #[test]
    fn test_proportional_response_sign() {
        let mut pid = RatePid::new(PidConfig::default());
        let out = pid.update(&setpoints(100.0, -100.0, 0.0), [Fix32::ZERO; 3], 1500);
        assert!(out[0] > Fix32::ZERO);
        assert!(out[1] < Fix32::ZERO);
        let p = pid.terms().axes[0].p.to_f32();
        assert!((p - 250.0).abs() < 0.5, "roll P {}", p);
    }

    #[test]
    fn test_integrator_clamped() {
        let config = PidConfig::default();
        let mut pid = RatePid::new(config);
        for _ in 0..20_000 {
            pid.update(&setpoints(500.0, 500.0, 500.0), [Fix32::ZERO; 3], 1800);
        }
        for axis in 0..3 {
            let i = pid.terms().axes[axis].i;
            assert!(i <= config.i_limit, "axis {} I {}", axis, i);
            assert!(i > config.i_limit - Fix32::ONE, "axis {} I {}", axis, i);
        }
    }

    #[test]
    fn test_falloff_before_takeoff() {
        let mut pid = RatePid::new(PidConfig::default());
        for _ in 0..200 {
            pid.update(&setpoints(50.0, 0.0, 0.0), [Fix32::ZERO; 3], 1000);
        }
        let with_error = pid.error_sum(0);
        assert!(with_error > Fix64::ZERO);
        for _ in 0..3200 {
            pid.update(&setpoints(0.0, 0.0, 0.0), [Fix32::ZERO; 3], 1000);
        }
        assert_eq!(pid.error_sum(0), Fix64::ZERO);
        assert!(!pid.has_taken_off());
    }

    #[test]
    fn test_takeoff_latches() {
        let mut pid = RatePid::new(PidConfig::default());
        for _ in 0..1000 {
            pid.update(&setpoints(0.0, 0.0, 0.0), [Fix32::ZERO; 3], 1300);
        }
        assert!(pid.has_taken_off());
        // low throttle after takeoff does not re-enable falloff
        pid.update(&setpoints(0.0, 0.0, 0.0), [Fix32::ZERO; 3], 1000);
        assert!(pid.has_taken_off());
    }

    #[test]
    fn test_feedforward_on_setpoint_step() {
        let mut pid = RatePid::new(PidConfig::default());
        pid.update(&setpoints(0.0, 0.0, 0.0), [Fix32::ZERO; 3], 1500);
        pid.update(&setpoints(0.0, 0.0, 200.0), [Fix32::ZERO; 3], 1500);
        assert!(pid.terms().axes[2].ff > Fix32::ZERO);
        assert!(pid.terms().i_relax < Fix32::ONE);
    }

    #[test]
    fn test_reset_clears_state() {
        let mut pid = RatePid::new(PidConfig::default());
        for _ in 0..100 {
            pid.update(&setpoints(100.0, 0.0, 0.0), [Fix32::ZERO; 3], 1500);
        }
        pid.reset([Fix32::ZERO; 3]);
        assert_eq!(pid.error_sum(0), Fix64::ZERO);
        assert_eq!(pid.terms().axes[0], AxisTerms::default());
        assert!(!pid.has_taken_off());
    }

    #[test]
    fn test_damping_opposes_rotation() {
        let mut pid = RatePid::new(PidConfig::default());
        let mut d = Fix32::ZERO;
        for k in 0..50 {
            let rate = fx(k as f32 * 10.0);
            pid.update(&setpoints(0.0, 0.0, 0.0), [rate, Fix32::ZERO, Fix32::ZERO], 1500);
            d = pid.terms().axes[0].d;
        }
        assert!(d < Fix32::ZERO, "D {}", d);
    }
}
