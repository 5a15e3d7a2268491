//! Altitude hold: throttle stick to vertical velocity to throttle
//!
//! Runs once per macro-cycle. The throttle stick commands a climb rate
//! around a deadbanded center. With the stick centered for a second the
//! current altitude is frozen as a target and a small pull towards it keeps
//! the velocity loop from drifting. The velocity PID output is divided by
//! the thrust efficiency `cos(roll) * cos(pitch)` so tilting does not sink
//! the craft.

use crate::ahrs::Attitude;
use crate::filters::Pt1;
use crate::fixed::{Fix32, Fix64};
use crate::motor::THROTTLE_MAX;
use crate::parameters::AltitudeParams;

/// Stick centered this long before the altitude target is frozen
const FREEZE_DELAY_US: u64 = 1_000_000;

/// After mode entry the neutral-stick latch gives up after this long
const LATCH_TIMEOUT_US: u64 = 2_000_000;

/// Throttle stick center (stick units 0..1024)
const STICK_CENTER: i32 = 512;

/// Setpoint changes per cycle below this integrate the full error
const STEADY_SETPOINT: Fix32 = Fix32::from_raw(66);

/// Thrust efficiency floor, caps the tilt compensation at about 3x
const MIN_THRUST_FACTOR: Fix32 = Fix32::from_raw(21627);

/// Side of center the throttle stick was on when the latch was set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NeutralLatch {
    Above,
    Below,
}

/// Terms of the last velocity loop step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VerticalTerms {
    pub setpoint: Fix32,
    pub error: Fix32,
    pub p: Fix32,
    pub i: Fix32,
    pub d: Fix32,
    pub ff: Fix32,
}

#[derive(Debug, Clone)]
pub struct AltitudeController {
    p: Fix32,
    i: Fix32,
    d: Fix32,
    ff: Fix32,
    deadband: Fix32,
    /// m/s per stick unit outside the deadband
    stick_scale: Fix32,
    altitude_setpoint: Fix32,
    centered_since: Option<u64>,
    frozen: bool,
    latch: Option<NeutralLatch>,
    entered_at: u64,
    error_sum: Fix64,
    last_setpoint: Fix32,
    last_velocity: Fix32,
    ff_filter: Pt1<Fix32>,
    d_filter: Pt1<Fix32>,
    terms: VerticalTerms,
}

impl AltitudeController {
    pub fn new(params: &AltitudeParams, macro_hz: f32) -> Self {
        let mut controller = Self {
            p: Fix32::ZERO,
            i: Fix32::ONE,
            d: Fix32::ZERO,
            ff: Fix32::ZERO,
            deadband: Fix32::ZERO,
            stick_scale: Fix32::ZERO,
            altitude_setpoint: Fix32::ZERO,
            centered_since: None,
            frozen: false,
            latch: None,
            entered_at: 0,
            error_sum: Fix64::ZERO,
            last_setpoint: Fix32::ZERO,
            last_velocity: Fix32::ZERO,
            ff_filter: Pt1::new(params.ff_cutoff_hz, macro_hz),
            d_filter: Pt1::new(params.d_cutoff_hz, macro_hz),
            terms: VerticalTerms::default(),
        };
        controller.set_params(params);
        controller
    }

    pub fn set_params(&mut self, params: &AltitudeParams) {
        self.p = Fix32::from_f32(params.p);
        self.i = Fix32::from_f32(params.i).max(Fix32::EPSILON);
        self.d = Fix32::from_f32(params.d);
        self.ff = Fix32::from_f32(params.ff);
        self.deadband = Fix32::from_int(params.deadband);
        let span = (STICK_CENTER - params.deadband).max(1);
        self.stick_scale = Fix32::from_f32(params.max_vvel) / span;
        self.ff_filter.update_cutoff(params.ff_cutoff_hz);
        self.d_filter.update_cutoff(params.d_cutoff_hz);
    }

    pub fn altitude_setpoint(&self) -> Fix32 {
        self.altitude_setpoint
    }

    pub fn terms(&self) -> &VerticalTerms {
        &self.terms
    }

    pub fn is_latched(&self) -> bool {
        self.latch.is_some()
    }

    /// Mode entry from a mode without altitude hold
    ///
    /// Seeds the integrator so the first output equals `throttle`, freezes
    /// the current altitude as the target, and optionally latches the
    /// vertical velocity to zero until the throttle stick crosses center.
    pub fn engage(
        &mut self,
        throttle: Fix32,
        altitude: Fix32,
        throttle_channel: u16,
        latch: bool,
        now_us: u64,
    ) {
        self.error_sum = throttle.to_fix64() / self.i;
        self.altitude_setpoint = altitude;
        self.frozen = true;
        self.centered_since = None;
        self.last_setpoint = Fix32::ZERO;
        self.ff_filter.set(Fix32::ZERO);
        self.d_filter.set(Fix32::ZERO);
        self.entered_at = now_us;
        self.latch = if latch {
            Some(if throttle_channel > 1500 {
                NeutralLatch::Above
            } else {
                NeutralLatch::Below
            })
        } else {
            None
        };
    }

    /// Freeze a new altitude target without touching the integrator
    pub fn hold_altitude(&mut self, altitude: Fix32) {
        self.altitude_setpoint = altitude;
        self.frozen = true;
    }

    /// Pilot climb-rate command (m/s) for a throttle stick in 0..1024
    pub fn stick_to_velocity(&mut self, stick: Fix32, altitude: Fix32, now_us: u64) -> Fix32 {
        if let Some(side) = self.latch {
            let crossed = match side {
                NeutralLatch::Above => stick <= Fix32::from_int(STICK_CENTER),
                NeutralLatch::Below => stick >= Fix32::from_int(STICK_CENTER),
            };
            if crossed || now_us.saturating_sub(self.entered_at) > LATCH_TIMEOUT_US {
                self.latch = None;
            } else {
                return Fix32::ZERO;
            }
        }

        let mut t = stick - Fix32::from_int(STICK_CENTER);
        if t.abs() < self.deadband {
            t = Fix32::ZERO;
        } else if t > Fix32::ZERO {
            t -= self.deadband;
        } else {
            t += self.deadband;
        }

        let mut target = t * self.stick_scale;
        if target.is_zero() {
            match self.centered_since {
                None => self.centered_since = Some(now_us),
                Some(since) if now_us.saturating_sub(since) > FREEZE_DELAY_US => {
                    if !self.frozen {
                        self.altitude_setpoint = altitude;
                        self.frozen = true;
                    }
                    target += (self.altitude_setpoint - altitude) / 5;
                }
                Some(_) => {}
            }
        } else {
            self.centered_since = None;
            self.frozen = false;
        }
        target
    }

    /// Autopilot climb-rate command; drops any stick freeze in progress
    pub fn hold_velocity(&mut self, velocity: Fix32) -> Fix32 {
        self.centered_since = None;
        self.frozen = false;
        velocity
    }

    /// One velocity loop step; returns throttle in 0..1024
    pub fn throttle(&mut self, target: Fix32, velocity: Fix32, attitude: &Attitude) -> Fix32 {
        let error = target - velocity;
        let setpoint_change = self.ff_filter.update(target - self.last_setpoint);
        let integrated = if setpoint_change.abs() < STEADY_SETPOINT {
            error
        } else {
            error / 2
        };
        let limit = Fix32::from_int(THROTTLE_MAX).to_fix64() / self.i;
        self.error_sum = (self.error_sum + integrated).clamp(Fix64::ZERO, limit);

        let p = self.p * error;
        let i = (self.i * self.error_sum).to_fix32_saturating();
        let d = self.d * self.d_filter.update(self.last_velocity - velocity);
        let ff = self.ff * setpoint_change;
        self.last_setpoint = target;
        self.last_velocity = velocity;
        self.terms = VerticalTerms {
            setpoint: target,
            error,
            p,
            i,
            d,
            ff,
        };

        let raw = p + i + d + ff;
        (raw / thrust_factor(attitude)).clamp(Fix32::ZERO, Fix32::from_int(THROTTLE_MAX))
    }
}

/// Share of the thrust pointing up, floored so the compensation stays finite
pub fn thrust_factor(attitude: &Attitude) -> Fix32 {
    let factor = attitude.cos_roll * attitude.cos_pitch;
    if factor.is_negative() {
        // upside down: no compensation
        return Fix32::ONE;
    }
    factor.clamp(MIN_THRUST_FACTOR, Fix32::ONE)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HZ: f32 = 400.0;

    fn controller() -> AltitudeController {
        AltitudeController::new(&AltitudeParams::default(), HZ)
    }

    fn level() -> Attitude {
        Attitude::default()
    }

    #[test]
    fn test_engage_keeps_throttle() {
        let mut alt = controller();
        let throttle = Fix32::from_int(420);
        alt.engage(throttle, Fix32::from_int(10), 1500, true, 0);
        assert_eq!(alt.altitude_setpoint(), Fix32::from_int(10));

        let target = alt.stick_to_velocity(Fix32::from_int(512), Fix32::from_int(10), 2_500);
        let out = alt.throttle(target, Fix32::ZERO, &level());
        assert!((out - throttle).abs() < Fix32::from_int(2), "throttle {}", out);
    }

    #[test]
    fn test_deadband_and_scale() {
        let mut alt = controller();
        let altitude = Fix32::ZERO;
        assert_eq!(alt.stick_to_velocity(Fix32::from_int(540), altitude, 0), Fix32::ZERO);
        let full = alt.stick_to_velocity(Fix32::from_int(1024), altitude, 0);
        assert!((full.to_f32() - 5.0).abs() < 0.01, "full {}", full);
        let down = alt.stick_to_velocity(Fix32::ZERO, altitude, 0);
        assert!((down.to_f32() + 5.0).abs() < 0.01, "down {}", down);
    }

    #[test]
    fn test_centered_stick_freezes_altitude() {
        let mut alt = controller();
        let center = Fix32::from_int(512);
        alt.stick_to_velocity(Fix32::from_int(900), Fix32::from_int(3), 0);
        assert_eq!(alt.stick_to_velocity(center, Fix32::from_int(5), 100_000), Fix32::ZERO);
        // not yet a second
        assert_eq!(alt.stick_to_velocity(center, Fix32::from_int(5), 900_000), Fix32::ZERO);
        // frozen at 5 m now; still at 5 m so no pull
        assert_eq!(alt.stick_to_velocity(center, Fix32::from_int(5), 1_200_000), Fix32::ZERO);
        assert_eq!(alt.altitude_setpoint(), Fix32::from_int(5));
        // sank to 4 m: pull up at 1/5 of the error
        let pull = alt.stick_to_velocity(center, Fix32::from_int(4), 1_300_000);
        assert!((pull.to_f32() - 0.2).abs() < 0.001, "pull {}", pull);
    }

    #[test]
    fn test_latch_until_center_crossing() {
        let mut alt = controller();
        alt.engage(Fix32::from_int(400), Fix32::ZERO, 1800, true, 0);
        assert!(alt.is_latched());
        // stick high but latched
        assert_eq!(alt.stick_to_velocity(Fix32::from_int(812), Fix32::ZERO, 1000), Fix32::ZERO);
        // crosses center, then climb accepted
        alt.stick_to_velocity(Fix32::from_int(500), Fix32::ZERO, 2000);
        assert!(!alt.is_latched());
        assert!(alt.stick_to_velocity(Fix32::from_int(812), Fix32::ZERO, 3000) > Fix32::ZERO);
    }

    #[test]
    fn test_latch_times_out() {
        let mut alt = controller();
        alt.engage(Fix32::from_int(400), Fix32::ZERO, 1200, true, 0);
        assert_eq!(alt.stick_to_velocity(Fix32::from_int(100), Fix32::ZERO, 1_000_000), Fix32::ZERO);
        assert!(alt.stick_to_velocity(Fix32::from_int(100), Fix32::ZERO, 2_100_000) < Fix32::ZERO);
    }

    #[test]
    fn test_integrator_climbs_on_sink() {
        let mut alt = controller();
        alt.engage(Fix32::from_int(300), Fix32::ZERO, 1500, false, 0);
        let first = alt.throttle(Fix32::ZERO, Fix32::from_int(-1), &level());
        let mut last = first;
        for _ in 0..400 {
            last = alt.throttle(Fix32::ZERO, Fix32::from_int(-1), &level());
        }
        assert!(first > Fix32::from_int(300));
        assert!(last > first, "{} vs {}", last, first);
        assert!(last <= Fix32::from_int(THROTTLE_MAX));
    }

    #[test]
    fn test_tilt_compensation() {
        let mut alt = controller();
        alt.engage(Fix32::from_int(300), Fix32::ZERO, 1500, false, 0);
        let tilted = Attitude {
            cos_roll: Fix32::HALF,
            ..Attitude::default()
        };
        let out = alt.throttle(Fix32::ZERO, Fix32::ZERO, &tilted);
        assert!((out.to_f32() - 600.0).abs() < 2.0, "throttle {}", out);

        let steep = Attitude {
            cos_roll: Fix32::from_f32(0.1),
            ..Attitude::default()
        };
        assert!((thrust_factor(&steep).to_f32() - 0.33).abs() < 0.001);
        let inverted = Attitude {
            cos_roll: Fix32::from_f32(-0.9),
            ..Attitude::default()
        };
        assert_eq!(thrust_factor(&inverted), Fix32::ONE);
    }
}
