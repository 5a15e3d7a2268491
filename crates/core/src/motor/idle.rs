//! Dynamic idle
//!
//! With ESC RPM telemetry the fixed idle floor is replaced by one PID per
//! motor that holds the propeller above a target speed. The mixer then
//! scales throttle over the full 0..=2000 range and lifts all motors
//! together until each one clears its own floor.
//!
//! Telemetry has to be fresh: after `MAX_MISSED_FRAMES` cycles without a
//! valid RPM frame the floors are dropped and the mixer falls back to the
//! fixed idle.

use crate::fixed::Fix32;

/// Cycles without RPM telemetry tolerated before falling back
pub const MAX_MISSED_FRAMES: u8 = 10;

/// Upper bound of the I term and of the idle floor, motor units
pub const FLOOR_MAX: Fix32 = Fix32::from_int(400);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DynamicIdleConfig {
    pub enabled: bool,
    /// Speed each motor is held above, RPM
    pub target_rpm: u16,
    /// P, I, D in motor units per RPM of error
    pub gains: [Fix32; 3],
}

impl Default for DynamicIdleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            target_rpm: 3000,
            gains: [
                Fix32::from_f32(0.2),
                Fix32::from_f32(0.0015),
                Fix32::from_f32(0.07),
            ],
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DynamicIdle {
    config: DynamicIdleConfig,
    i_terms: [Fix32; 4],
    rpm: [u32; 4],
    last_rpm: [u32; 4],
    missed: u8,
}

impl DynamicIdle {
    /// Starts out waiting for telemetry
    pub fn new(config: DynamicIdleConfig) -> Self {
        Self {
            config,
            i_terms: [Fix32::ZERO; 4],
            rpm: [0; 4],
            last_rpm: [0; 4],
            missed: MAX_MISSED_FRAMES,
        }
    }

    pub fn config(&self) -> &DynamicIdleConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: DynamicIdleConfig) {
        self.config = config;
        if !config.enabled {
            self.i_terms = [Fix32::ZERO; 4];
        }
    }

    /// Idle is currently driven by telemetry
    pub fn is_active(&self) -> bool {
        self.config.enabled && self.missed < MAX_MISSED_FRAMES
    }

    /// Integrators cleared; telemetry must arrive again before the floors
    /// come back
    pub fn reset(&mut self) {
        self.i_terms = [Fix32::ZERO; 4];
        self.missed = MAX_MISSED_FRAMES;
    }

    /// One cycle with the latest RPM frame, if the ESCs delivered one
    ///
    /// Returns the per-motor idle floors in motor units, or `None` when the
    /// fixed idle applies.
    pub fn update(&mut self, rpm: Option<[u32; 4]>) -> Option<[Fix32; 4]> {
        match rpm {
            Some(rpm) => {
                self.rpm = rpm;
                self.missed = 0;
            }
            None => self.missed = self.missed.saturating_add(1),
        }
        if !self.is_active() {
            self.i_terms = [Fix32::ZERO; 4];
            return None;
        }

        let target = self.config.target_rpm as u32;
        let [kp, ki, kd] = self.config.gains;
        let mut floors = [Fix32::ZERO; 4];
        for (i, floor) in floors.iter_mut().enumerate() {
            let rpm = self.rpm[i];
            if rpm < target * 2 {
                let error = target as i32 - rpm as i32;
                let p = kp * error;
                self.i_terms[i] = (self.i_terms[i] + ki * error).clamp(Fix32::ZERO, FLOOR_MAX);
                let d = kd * (self.last_rpm[i] as i32 - rpm as i32);
                *floor = (p + self.i_terms[i] + d).clamp(Fix32::ZERO, FLOOR_MAX);
            } else {
                self.i_terms[i] = Fix32::ZERO;
            }
            self.last_rpm[i] = rpm;
        }
        Some(floors)
    }

    pub fn i_terms(&self) -> &[Fix32; 4] {
        &self.i_terms
    }
}
