//! Self-levelling: target attitude to rotation rates
//!
//! The target is a heading-only quaternion (integrated from the yaw stick)
//! with a roll/pitch tilt applied in its frame. The rotation from the
//! current attitude to the target, expressed in the body frame, becomes a
//! rate command through a proportional gain. Each step below is one slice
//! of the time-sliced control cycle.

use crate::fixed::{trig, Fix32};
use crate::geometry::{Axis, Quaternion, Vector3};
use crate::parameters::AngleParams;

/// Total rate command cap, deg/s
pub const MAX_ANGLE_RATE: Fix32 = Fix32::from_int(1000);

#[derive(Debug, Clone)]
pub struct AngleController {
    p: Fix32,
    max_angle: Fix32,
    /// Heading hold reference, degrees in (-180, 180]
    target_heading: Fix32,
    heading: Quaternion<Fix32>,
    tilt: Quaternion<Fix32>,
    difference: Quaternion<Fix32>,
}

impl AngleController {
    pub fn new(params: &AngleParams) -> Self {
        Self {
            p: Fix32::from_f32(params.p),
            max_angle: Fix32::from_f32(params.max_angle),
            target_heading: Fix32::ZERO,
            heading: Quaternion::identity(),
            tilt: Quaternion::identity(),
            difference: Quaternion::identity(),
        }
    }

    pub fn set_params(&mut self, params: &AngleParams) {
        self.p = Fix32::from_f32(params.p);
        self.max_angle = Fix32::from_f32(params.max_angle);
    }

    /// Largest tilt commanded from the sticks, degrees
    pub fn max_angle(&self) -> Fix32 {
        self.max_angle
    }

    pub fn target_heading(&self) -> Fix32 {
        self.target_heading
    }

    /// Re-anchor heading hold on the current yaw (radians)
    pub fn hold_heading(&mut self, yaw: Fix32) {
        self.target_heading = wrap_degrees(yaw * Fix32::RAD_TO_DEG);
        self.update_heading_quaternion();
    }

    /// Stick tilt targets in degrees: roll right and nose down for positive sticks
    pub fn stick_targets(&self, roll_stick: Fix32, pitch_stick: Fix32) -> (Fix32, Fix32) {
        (roll_stick * self.max_angle, -(pitch_stick * self.max_angle))
    }

    /// Advance the heading reference by a yaw rate (deg/s) over one macro-cycle
    pub fn update_heading(&mut self, yaw_rate: Fix32, macro_hz: i32) {
        self.target_heading = wrap_degrees(self.target_heading + yaw_rate / macro_hz);
        self.update_heading_quaternion();
    }

    fn update_heading_quaternion(&mut self) {
        self.heading =
            Quaternion::from_axis_rotation(Axis::Z, self.target_heading * Fix32::DEG_TO_RAD);
    }

    /// Roll/pitch target (degrees) as one rotation about a horizontal axis
    ///
    /// The total tilt is capped at `limit` degrees.
    pub fn update_tilt(&mut self, roll: Fix32, pitch: Fix32, limit: Fix32) {
        let total = trig::sqrt(roll * roll + pitch * pitch);
        if total.is_zero() {
            self.tilt = Quaternion::identity();
            return;
        }
        let axis = Vector3::new(roll / total, pitch / total, Fix32::ZERO);
        let angle = total.min(limit) * Fix32::DEG_TO_RAD;
        self.tilt = Quaternion::from_axis_angle(axis, angle);
    }

    /// Body-frame rotation from the current attitude to the target
    ///
    /// `world_to_body` is the estimator's integrated quaternion.
    pub fn update_difference(&mut self, world_to_body: &Quaternion<f32>) {
        let target = self.heading * self.tilt;
        self.difference = world_to_body.cast::<Fix32>() * target;
    }

    /// Rate setpoints (roll, pitch, yaw) in deg/s from the last difference
    pub fn rates(&self) -> [Fix32; 3] {
        let mut diff = self.difference.normalize();
        if diff.w.is_negative() {
            diff = Quaternion::new(-diff.w, -diff.x, -diff.y, -diff.z);
        }
        let (axis, angle) = diff.to_axis_angle();
        let limit = MAX_ANGLE_RATE * Fix32::DEG_TO_RAD;
        let command = (angle * self.p).min(limit) * Fix32::RAD_TO_DEG;
        [command * axis.x, command * axis.y, command * axis.z]
    }

    /// Whole pipeline in one call
    pub fn run(
        &mut self,
        roll: Fix32,
        pitch: Fix32,
        limit: Fix32,
        world_to_body: &Quaternion<f32>,
    ) -> [Fix32; 3] {
        self.update_tilt(roll, pitch, limit);
        self.update_difference(world_to_body);
        self.rates()
    }
}

/// Wrap degrees into (-180, 180]
fn wrap_degrees(mut deg: Fix32) -> Fix32 {
    let full = Fix32::from_int(360);
    while deg > Fix32::from_int(180) {
        deg -= full;
    }
    while deg <= Fix32::from_int(-180) {
        deg += full;
    }
    deg
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> AngleController {
        AngleController::new(&AngleParams::default())
    }

    /// World-to-body quaternion of a body at the given Euler angles (radians)
    fn attitude(roll: f32, pitch: f32, yaw: f32) -> Quaternion<f32> {
        Quaternion::<f32>::from_euler(roll, pitch, yaw).conjugate()
    }

    fn near(value: Fix32, expected: f32, tol: f32) -> bool {
        (value.to_f32() - expected).abs() < tol
    }

    #[test]
    fn test_level_hold_is_zero() {
        let mut ctrl = controller();
        let rates = ctrl.run(Fix32::ZERO, Fix32::ZERO, ctrl.max_angle(), &attitude(0.0, 0.0, 0.0));
        for r in rates {
            assert!(r.abs() < Fix32::from_f32(0.5), "rate {}", r);
        }
    }

    #[test]
    fn test_roll_target_commands_roll_rate() {
        let mut ctrl = controller();
        let level = attitude(0.0, 0.0, 0.0);
        let rates = ctrl.run(Fix32::from_int(10), Fix32::ZERO, ctrl.max_angle(), &level);
        // 10 deg error * P 5 = 50 deg/s
        assert!(near(rates[0], 50.0, 1.0), "roll rate {}", rates[0]);
        assert!(rates[1].abs() < Fix32::ONE);
        assert!(rates[2].abs() < Fix32::ONE);
    }

    #[test]
    fn test_pitch_stick_forward_noses_down() {
        let mut ctrl = controller();
        let (roll, pitch) = ctrl.stick_targets(Fix32::ZERO, Fix32::HALF);
        assert_eq!(pitch, Fix32::from_int(-20));
        let rates = ctrl.run(roll, pitch, ctrl.max_angle(), &attitude(0.0, 0.0, 0.0));
        assert!(near(rates[1], -100.0, 2.0), "pitch rate {}", rates[1]);
    }

    #[test]
    fn test_tilted_body_levels_back() {
        let mut ctrl = controller();
        let tilted = attitude(0.2, 0.0, 0.0);
        let rates = ctrl.run(Fix32::ZERO, Fix32::ZERO, ctrl.max_angle(), &tilted);
        assert!(rates[0] < Fix32::ZERO, "roll rate {}", rates[0]);
    }

    #[test]
    fn test_tilt_capped_at_limit() {
        let mut ctrl = controller();
        let rates = ctrl.run(
            Fix32::from_int(80),
            Fix32::ZERO,
            Fix32::from_int(40),
            &attitude(0.0, 0.0, 0.0),
        );
        assert!(near(rates[0], 200.0, 3.0), "roll rate {}", rates[0]);
    }

    #[test]
    fn test_rate_command_capped() {
        let mut ctrl = controller();
        let upside_down = attitude(3.0, 0.0, 0.0);
        let rates = ctrl.run(Fix32::ZERO, Fix32::ZERO, ctrl.max_angle(), &upside_down);
        let total = libm::sqrtf(rates.iter().map(|r| r.to_f32() * r.to_f32()).sum::<f32>());
        assert!(total > 500.0, "total {}", total);
        assert!(total <= 1001.0, "total {}", total);

        ctrl.set_params(&AngleParams {
            p: 20.0,
            ..AngleParams::default()
        });
        let rates = ctrl.run(Fix32::ZERO, Fix32::ZERO, ctrl.max_angle(), &upside_down);
        assert!(near(rates[0].abs(), 1000.0, 2.0), "roll rate {}", rates[0]);
    }

    #[test]
    fn test_heading_hold_and_yaw_stick() {
        let mut ctrl = controller();
        ctrl.hold_heading(Fix32::HALF_PI);
        assert!(near(ctrl.target_heading(), 90.0, 0.05));

        // facing 80 degrees, target 90: yaw right
        let body = attitude(0.0, 0.0, 80f32.to_radians());
        let rates = ctrl.run(Fix32::ZERO, Fix32::ZERO, ctrl.max_angle(), &body);
        assert!(near(rates[2], 50.0, 1.5), "yaw rate {}", rates[2]);

        // 400 deg/s for one second at 400 Hz
        for _ in 0..400 {
            ctrl.update_heading(Fix32::from_int(400), 400);
        }
        assert!(near(ctrl.target_heading(), 130.0, 0.5), "heading {}", ctrl.target_heading());
    }

    #[test]
    fn test_heading_wraps() {
        let mut ctrl = controller();
        ctrl.hold_heading(Fix32::from_f32(3.1));
        ctrl.update_heading(Fix32::from_int(4000), 400);
        assert!(ctrl.target_heading() < Fix32::from_int(-170));
        assert_eq!(wrap_degrees(Fix32::from_int(-180)), Fix32::from_int(180));
    }
}
