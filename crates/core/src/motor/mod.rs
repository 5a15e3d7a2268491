//! Quad-X mixer and motor output abstraction
//!
//! Motor values use the ESC command range 0..=2000. Zero means stopped;
//! an armed quad never commands less than the idle value, either the fixed
//! one or the per-motor floors of [`DynamicIdle`].
//!
//! Layout (seen from above, nose up):
//!
//! ```text
//!   FL   FR
//!     \ /
//!     / \
//!   RL   RR
//! ```

mod idle;

pub use idle::{DynamicIdle, DynamicIdleConfig, FLOOR_MAX, MAX_MISSED_FRAMES};

use crate::fixed::Fix32;

/// Highest motor command
pub const MOTOR_MAX: i32 = 2000;

/// Throttle setpoint full scale
pub const THROTTLE_MAX: i32 = 1024;

/// Motor position index into `MotorOutputs`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorPosition {
    RearRight = 0,
    FrontRight = 1,
    RearLeft = 2,
    FrontLeft = 3,
}

impl MotorPosition {
    pub const ALL: [MotorPosition; 4] = [
        MotorPosition::RearRight,
        MotorPosition::FrontRight,
        MotorPosition::RearLeft,
        MotorPosition::FrontLeft,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MotorPosition::RearRight => "RR",
            MotorPosition::FrontRight => "FR",
            MotorPosition::RearLeft => "RL",
            MotorPosition::FrontLeft => "FL",
        }
    }
}

/// Four motor commands, indexed by `MotorPosition`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MotorOutputs([u16; 4]);

impl MotorOutputs {
    pub const fn new(values: [u16; 4]) -> Self {
        Self(values)
    }

    /// All motors stopped
    pub const fn disarmed() -> Self {
        Self([0; 4])
    }

    pub fn values(&self) -> [u16; 4] {
        self.0
    }

    pub fn get(&self, position: MotorPosition) -> u16 {
        self.0[position as usize]
    }

    pub fn is_stopped(&self) -> bool {
        self.0.iter().all(|&v| v == 0)
    }
}

/// Propeller rotation direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PropDirection {
    /// Front props turn towards the fuselage
    #[default]
    PropsIn,
    PropsOut,
}

/// Errors from the motor driver collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorError {
    /// Transmission to the ESCs failed
    HardwareFault,
}

impl core::fmt::Display for MotorError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MotorError::HardwareFault => write!(f, "motor output hardware fault"),
        }
    }
}

/// Motor/ESC driver collaborator
///
/// Called once per PID cycle. The implementation owns the wire protocol;
/// it must not block for longer than one frame.
pub trait MotorOutput {
    fn write(&mut self, outputs: &MotorOutputs) -> Result<(), MotorError>;
}

/// Quad-X mixer with idle floor and saturation shift
///
/// Axis terms are in motor units. Positive roll lifts the left motors,
/// positive pitch lifts the front motors, positive yaw speeds up the pair
/// whose reaction torque yaws the craft to the right.
#[derive(Debug, Clone, Copy)]
pub struct QuadMixer {
    idle: i32,
    throttle_scale: Fix32,
    props: PropDirection,
}

impl QuadMixer {
    /// `idle_permille` is the idle command in 1/1000 of full scale
    pub fn new(idle_permille: u16, props: PropDirection) -> Self {
        let idle = (idle_permille.min(500) as i32) * 2;
        Self {
            idle,
            throttle_scale: Fix32::from_int(MOTOR_MAX - idle) / THROTTLE_MAX,
            props,
        }
    }

    pub fn idle(&self) -> i32 {
        self.idle
    }

    pub fn props(&self) -> PropDirection {
        self.props
    }

    /// Throttle setpoint 0..=1024 to motor units idle..=2000
    pub fn scale_throttle(&self, throttle: Fix32) -> Fix32 {
        let t = throttle.clamp(Fix32::ZERO, Fix32::from_int(THROTTLE_MAX));
        t * self.throttle_scale + Fix32::from_int(self.idle)
    }

    /// Mix throttle and axis terms into four motor commands
    ///
    /// When the spread does not fit, all four motors are shifted together:
    /// first down so the highest is at full scale, then up so the lowest
    /// stays at idle. Idle wins; the top is clamped last.
    pub fn mix(&self, throttle: Fix32, roll: Fix32, pitch: Fix32, yaw: Fix32) -> MotorOutputs {
        let motors = self.spread(self.scale_throttle(throttle), roll, pitch, yaw);

        let low = motors.iter().copied().min().unwrap_or(0);
        let high = motors.iter().copied().max().unwrap_or(0);
        let mut diff = 0;
        if high > MOTOR_MAX {
            diff = MOTOR_MAX - high;
        }
        if low + diff < self.idle {
            diff = self.idle - low;
        }
        shift(motors, diff)
    }

    /// Mix against per-motor idle floors (dynamic idle)
    ///
    /// Throttle covers the full 0..=2000 range. A floor never goes below the
    /// fixed idle. The shift is the larger of what the highest motor needs
    /// to fit under full scale and what the neediest motor needs to reach
    /// its floor.
    pub fn mix_with_floors(
        &self,
        throttle: Fix32,
        roll: Fix32,
        pitch: Fix32,
        yaw: Fix32,
        floors: &[Fix32; 4],
    ) -> MotorOutputs {
        let full_scale = Fix32::from_int(MOTOR_MAX) / THROTTLE_MAX;
        let t = throttle.clamp(Fix32::ZERO, Fix32::from_int(THROTTLE_MAX)) * full_scale;
        let motors = self.spread(t, roll, pitch, yaw);

        let mut lift = i32::MIN;
        let mut room = 0;
        for (&m, floor) in motors.iter().zip(floors) {
            lift = lift.max(floor.to_int().max(self.idle) - m);
            room = room.min(MOTOR_MAX - m);
        }
        shift(motors, room.max(lift))
    }

    fn spread(&self, t: Fix32, roll: Fix32, pitch: Fix32, yaw: Fix32) -> [i32; 4] {
        let y = match self.props {
            PropDirection::PropsIn => yaw,
            PropDirection::PropsOut => -yaw,
        };
        let mut motors = [0i32; 4];
        motors[MotorPosition::RearRight as usize] = (t - roll - pitch - y).to_int();
        motors[MotorPosition::FrontRight as usize] = (t - roll + pitch + y).to_int();
        motors[MotorPosition::RearLeft as usize] = (t + roll - pitch + y).to_int();
        motors[MotorPosition::FrontLeft as usize] = (t + roll + pitch - y).to_int();
        motors
    }
}

fn shift(motors: [i32; 4], diff: i32) -> MotorOutputs {
    let mut out = [0u16; 4];
    for (o, m) in out.iter_mut().zip(motors) {
        *o = (m + diff).clamp(0, MOTOR_MAX) as u16;
    }
    MotorOutputs(out)
}

impl Default for QuadMixer {
    fn default() -> Self {
        Self::new(35, PropDirection::PropsIn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fx(v: i32) -> Fix32 {
        Fix32::from_int(v)
    }

    #[test]
    fn test_throttle_scaling() {
        let mixer = QuadMixer::default();
        assert_eq!(mixer.idle(), 70);
        assert_eq!(mixer.scale_throttle(Fix32::ZERO).to_int(), 70);
        assert_eq!(mixer.scale_throttle(fx(1024)).round_int(), 2000);
        assert_eq!(mixer.scale_throttle(fx(5000)).round_int(), 2000);
    }

    #[test]
    fn test_pure_throttle_is_uniform() {
        let mixer = QuadMixer::default();
        let out = mixer.mix(fx(512), Fix32::ZERO, Fix32::ZERO, Fix32::ZERO);
        let v = out.values();
        assert!(v.iter().all(|&m| m == v[0]));
        assert!((v[0] as i32 - 1035).abs() <= 1, "mid throttle {}", v[0]);
    }

    #[test]
    fn test_axis_signs() {
        let mixer = QuadMixer::default();
        let base = fx(512);

        let roll = mixer.mix(base, fx(100), Fix32::ZERO, Fix32::ZERO);
        assert!(roll.get(MotorPosition::FrontLeft) > roll.get(MotorPosition::FrontRight));
        assert!(roll.get(MotorPosition::RearLeft) > roll.get(MotorPosition::RearRight));

        let pitch = mixer.mix(base, Fix32::ZERO, fx(100), Fix32::ZERO);
        assert!(pitch.get(MotorPosition::FrontLeft) > pitch.get(MotorPosition::RearLeft));
        assert!(pitch.get(MotorPosition::FrontRight) > pitch.get(MotorPosition::RearRight));

        let yaw = mixer.mix(base, Fix32::ZERO, Fix32::ZERO, fx(100));
        assert!(yaw.get(MotorPosition::FrontRight) > yaw.get(MotorPosition::FrontLeft));
        assert!(yaw.get(MotorPosition::RearLeft) > yaw.get(MotorPosition::RearRight));
    }

    #[test]
    fn test_props_out_flips_yaw() {
        let props_in = QuadMixer::new(35, PropDirection::PropsIn);
        let props_out = QuadMixer::new(35, PropDirection::PropsOut);
        let a = props_in.mix(fx(512), Fix32::ZERO, Fix32::ZERO, fx(100));
        let b = props_out.mix(fx(512), Fix32::ZERO, Fix32::ZERO, fx(100));
        assert_eq!(a.get(MotorPosition::FrontRight), b.get(MotorPosition::FrontLeft));
        assert_eq!(a.get(MotorPosition::RearLeft), b.get(MotorPosition::RearRight));
    }

    #[test]
    fn test_idle_floor_shifts_up() {
        let mixer = QuadMixer::default();
        let out = mixer.mix(Fix32::ZERO, fx(200), Fix32::ZERO, Fix32::ZERO);
        let v = out.values();
        assert_eq!(*v.iter().min().unwrap(), 70);
        // spread is preserved
        assert_eq!(
            out.get(MotorPosition::FrontLeft) - out.get(MotorPosition::FrontRight),
            400
        );
    }

    #[test]
    fn test_top_saturation_shifts_down() {
        let mixer = QuadMixer::default();
        let out = mixer.mix(fx(1000), fx(100), Fix32::ZERO, Fix32::ZERO);
        assert_eq!(*out.values().iter().max().unwrap(), 2000);
        assert_eq!(
            out.get(MotorPosition::RearLeft) - out.get(MotorPosition::RearRight),
            200
        );
    }

    #[test]
    fn test_idle_beats_top_clamp() {
        let mixer = QuadMixer::default();
        let out = mixer.mix(fx(512), fx(1500), Fix32::ZERO, Fix32::ZERO);
        let v = out.values();
        assert_eq!(*v.iter().min().unwrap(), 70);
        assert_eq!(*v.iter().max().unwrap(), 2000);
    }

    #[test]
    fn test_floor_lifts_all_motors() {
        let mixer = QuadMixer::default();
        let floors = [fx(150), Fix32::ZERO, Fix32::ZERO, Fix32::ZERO];
        let out = mixer.mix_with_floors(Fix32::ZERO, fx(20), Fix32::ZERO, Fix32::ZERO, &floors);
        // rear right sits lowest and needs the most
        assert_eq!(out.get(MotorPosition::RearRight), 150);
        assert_eq!(out.get(MotorPosition::FrontRight), 150);
        assert_eq!(out.get(MotorPosition::FrontLeft), 190);
        assert!(out.values().iter().all(|&m| m as i32 > mixer.idle()));
    }

    #[test]
    fn test_low_floors_use_full_throttle_range() {
        let mixer = QuadMixer::default();
        let floors = [Fix32::ZERO; 4];
        let out = mixer.mix_with_floors(fx(512), Fix32::ZERO, Fix32::ZERO, Fix32::ZERO, &floors);
        assert_eq!(out.values(), [1000; 4]);
        // the fixed idle still holds at zero throttle
        let out = mixer.mix_with_floors(Fix32::ZERO, Fix32::ZERO, Fix32::ZERO, Fix32::ZERO, &floors);
        assert_eq!(out.values(), [70; 4]);
    }

    #[test]
    fn test_floor_beats_top_clamp() {
        let mixer = QuadMixer::default();
        let floors = [fx(300); 4];
        let out = mixer.mix_with_floors(fx(900), fx(900), Fix32::ZERO, Fix32::ZERO, &floors);
        let v = out.values();
        assert_eq!(*v.iter().min().unwrap(), 300);
        assert_eq!(*v.iter().max().unwrap(), 2000);
    }

    #[test]
    fn test_disarmed_outputs() {
        let out = MotorOutputs::disarmed();
        assert!(out.is_stopped());
        assert_eq!(MotorPosition::FrontLeft.as_str(), "FL");
    }
}
