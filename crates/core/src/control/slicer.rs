//! Time-sliced control cycle
//!
//! The self-levelling pipeline is split into eight phases, one per control
//! loop iteration, so no single iteration carries the whole cost. A new
//! setpoint is produced once every eight iterations and the output is
//! slewed linearly from the previous one to it over the next eight.

use crate::fixed::Fix32;
use crate::state::Setpoints;

/// Control loop iterations per macro-cycle
pub const PHASE_COUNT: usize = 8;

/// Work done in one control loop iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Read the sticks into tilt, velocity or autopilot targets
    Sticks,
    /// Horizontal velocity PID to tilt targets
    HorizontalVelocity,
    /// Vertical velocity setpoint from stick or autopilot
    VerticalVelocity,
    /// Throttle, from the vertical velocity PID when holding altitude
    Throttle,
    /// Integrate the yaw stick into the heading reference
    Heading,
    /// Roll/pitch target quaternion
    Tilt,
    /// Rotation from the current attitude to the target
    Difference,
    /// Rate setpoints; completes the macro-cycle
    Rates,
}

/// Phase executed at each counter value
pub const PHASES: [Phase; PHASE_COUNT] = [
    Phase::Sticks,
    Phase::HorizontalVelocity,
    Phase::VerticalVelocity,
    Phase::Throttle,
    Phase::Heading,
    Phase::Tilt,
    Phase::Difference,
    Phase::Rates,
];

#[derive(Debug, Clone, Default)]
pub struct PhaseSlicer {
    counter: usize,
    previous: Setpoints,
    next: Setpoints,
    /// Eighths of the way from `previous` to `next`
    progress: i32,
}

impl PhaseSlicer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Phase to run in this iteration
    pub fn phase(&self) -> Phase {
        PHASES[self.counter]
    }

    pub fn counter(&self) -> usize {
        self.counter
    }

    /// Target of the slew in progress
    pub fn target(&self) -> &Setpoints {
        &self.next
    }

    /// Restart at phase 0 holding `current` steady
    pub fn reset(&mut self, current: Setpoints) {
        self.counter = 0;
        self.previous = current;
        self.next = current;
        self.progress = PHASE_COUNT as i32;
    }

    /// Start slewing towards a freshly computed setpoint
    pub fn complete(&mut self, setpoint: Setpoints) {
        self.previous = self.next;
        self.next = setpoint;
        self.progress = 1;
    }

    /// Interpolated output for this iteration; moves on to the next phase
    pub fn tick(&mut self) -> Setpoints {
        let output = self.interpolate();
        self.progress = (self.progress + 1).min(PHASE_COUNT as i32);
        self.counter = (self.counter + 1) % PHASE_COUNT;
        output
    }

    fn interpolate(&self) -> Setpoints {
        let k = self.progress;
        let n = PHASE_COUNT as i32;
        let lerp = |a: Fix32, b: Fix32| a + (b - a) * k / n;
        let mut out = self.next;
        for (axis, rate) in out.rates.iter_mut().enumerate() {
            *rate = lerp(self.previous.rates[axis], self.next.rates[axis]);
        }
        out.throttle = lerp(self.previous.throttle, self.next.throttle);
        out
    }
}
