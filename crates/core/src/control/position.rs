//! GPS velocity and position hold
//!
//! Sticks command a world-frame velocity. Released sticks brake the craft
//! for two seconds, after which the position at that moment is locked and
//! a push filter converts the distance back to it into a corrective
//! velocity. A horizontal-velocity PID turns the velocity setpoint into an
//! acceleration, and the acceleration becomes a roll/pitch tilt target.

use crate::ahrs::{Attitude, Navigation};
use crate::filters::{Pt1, Pt2};
use crate::fixed::{trig, Fix32, Fix64};
use crate::parameters::{AngleParams, PositionParams};
use crate::sensors::{GeoPoint, GRAVITY};

use super::rc::{RcChannels, CHANNEL_CENTER};

/// Braking time after the sticks are released, before the position locks
const BRAKE_US: u64 = 2_000_000;

/// Push-filtered distance (m) to corrective velocity (m/s) divisor
const PUSH_DIVISOR: i32 = 4;

/// Largest integrator contribution, m/s^2
const I_LIMIT: Fix32 = Fix32::from_int(10);

/// Commanded acceleration (m/s^2) below which the integrator runs at full gain
const RELAX_START: Fix32 = Fix32::ONE;

/// Commanded acceleration (m/s^2) above which the integrator runs at 1/6 gain
const RELAX_FULL: Fix32 = Fix32::from_int(4);

/// Setpoint derivatives beyond this are clipped, m/s^2
const MAX_SETPOINT_ACCEL: Fix32 = Fix32::from_int(100);

const NORTH: usize = 0;
const EAST: usize = 1;

/// Integrator gain scale for a commanded acceleration magnitude
///
/// Full gain below 1 m/s^2, one sixth above 4 m/s^2, linear in between.
pub fn i_relax_factor(accel: Fix32) -> Fix32 {
    let sixth = Fix32::ONE / 6;
    if accel <= RELAX_START {
        Fix32::ONE
    } else if accel >= RELAX_FULL {
        sixth
    } else {
        let t = (accel - RELAX_START) / (RELAX_FULL - RELAX_START);
        Fix32::ONE - t * (Fix32::ONE - sixth)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StickState {
    /// Sticks deflected, velocity follows them
    Flying,
    /// Sticks released at the given time, braking to a stop
    Braking(u64),
    /// Holding `lock` with the push filter
    Locked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BurstState {
    Ready,
    Active(u64),
    Cooldown(u64),
}

/// Time-limited allowance for tilting past the normal max angle
#[derive(Debug, Clone)]
pub struct AngleBurst {
    max_angle: Fix32,
    burst_angle: Fix32,
    burst_us: u64,
    cooldown_us: u64,
    state: BurstState,
}

impl AngleBurst {
    pub fn new(params: &AngleParams) -> Self {
        let mut burst = Self {
            max_angle: Fix32::ZERO,
            burst_angle: Fix32::ZERO,
            burst_us: 0,
            cooldown_us: 0,
            state: BurstState::Ready,
        };
        burst.set_params(params);
        burst
    }

    pub fn set_params(&mut self, params: &AngleParams) {
        self.max_angle = Fix32::from_f32(params.max_angle);
        self.burst_angle = Fix32::from_f32(params.burst_angle).max(self.max_angle);
        self.burst_us = params.burst_time_ms as u64 * 1000;
        self.cooldown_us = params.burst_cooldown_ms as u64 * 1000;
    }

    pub fn state(&self) -> BurstState {
        self.state
    }

    /// Tilt limit in degrees for a total tilt demand
    pub fn limit(&mut self, demand: Fix32, now_us: u64) -> Fix32 {
        match self.state {
            BurstState::Ready => {
                if demand > self.max_angle {
                    self.state = BurstState::Active(now_us);
                    return self.burst_angle;
                }
            }
            BurstState::Active(since) => {
                if now_us.saturating_sub(since) > self.burst_us || demand <= self.max_angle {
                    self.state = BurstState::Cooldown(now_us);
                } else {
                    return self.burst_angle;
                }
            }
            BurstState::Cooldown(since) => {
                if now_us.saturating_sub(since) > self.cooldown_us {
                    self.state = BurstState::Ready;
                }
            }
        }
        self.max_angle
    }
}

/// Roll/pitch target in degrees with the tilt limit to apply
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TiltCommand {
    pub roll: Fix32,
    pub pitch: Fix32,
    pub limit: Fix32,
}

#[derive(Debug, Clone)]
pub struct PositionController {
    p: Fix32,
    i: Fix32,
    d: Fix32,
    ff: Fix32,
    max_hvel: Fix32,
    deadband: i32,
    macro_hz: i32,

    stick_state: StickState,
    lock: Option<GeoPoint>,
    push: [Pt2<Fix32>; 2],
    /// (north, east) m/s of the last step
    velocity_setpoint: [Fix32; 2],

    error_sum: [Fix64; 2],
    last_setpoint: [Fix32; 2],
    last_velocity: [Fix32; 2],
    ff_filter: [Pt1<Fix32>; 2],
    d_filter: [Pt1<Fix32>; 2],
    relax_filter: Pt1<Fix32>,
    burst: AngleBurst,
}

impl PositionController {
    pub fn new(params: &PositionParams, angle: &AngleParams, macro_hz: i32) -> Self {
        let hz = macro_hz.max(1) as f32;
        let mut controller = Self {
            p: Fix32::ZERO,
            i: Fix32::ZERO,
            d: Fix32::ZERO,
            ff: Fix32::ZERO,
            max_hvel: Fix32::ZERO,
            deadband: 0,
            macro_hz: macro_hz.max(1),
            stick_state: StickState::Flying,
            lock: None,
            push: [Pt2::new(params.push_cutoff_hz, hz); 2],
            velocity_setpoint: [Fix32::ZERO; 2],
            error_sum: [Fix64::ZERO; 2],
            last_setpoint: [Fix32::ZERO; 2],
            last_velocity: [Fix32::ZERO; 2],
            ff_filter: [Pt1::new(params.ff_cutoff_hz, hz); 2],
            d_filter: [Pt1::new(params.ff_cutoff_hz, hz); 2],
            relax_filter: Pt1::new(params.i_relax_cutoff_hz, hz),
            burst: AngleBurst::new(angle),
        };
        controller.set_params(params, angle);
        controller
    }

    pub fn set_params(&mut self, params: &PositionParams, angle: &AngleParams) {
        self.p = Fix32::from_f32(params.p);
        self.i = Fix32::from_f32(params.i);
        self.d = Fix32::from_f32(params.d);
        self.ff = Fix32::from_f32(params.ff);
        self.max_hvel = Fix32::from_f32(params.max_hvel);
        self.deadband = params.deadband;
        for filter in &mut self.push {
            filter.update_cutoff(params.push_cutoff_hz);
        }
        for filter in self.ff_filter.iter_mut().chain(self.d_filter.iter_mut()) {
            filter.update_cutoff(params.ff_cutoff_hz);
        }
        self.relax_filter.update_cutoff(params.i_relax_cutoff_hz);
        self.burst.set_params(angle);
        if self.i <= Fix32::ZERO {
            self.error_sum = [Fix64::ZERO; 2];
        }
    }

    pub fn max_hvel(&self) -> Fix32 {
        self.max_hvel
    }

    /// (north, east) velocity setpoint of the last step, m/s
    pub fn velocity_setpoint(&self) -> (Fix32, Fix32) {
        (self.velocity_setpoint[NORTH], self.velocity_setpoint[EAST])
    }

    pub fn lock_point(&self) -> Option<GeoPoint> {
        self.lock
    }

    pub fn burst(&self) -> &AngleBurst {
        &self.burst
    }

    /// Lock on `position` straight away, skipping the braking phase
    pub fn engage(&mut self, position: Option<GeoPoint>) {
        self.lock = position;
        self.stick_state = StickState::Locked;
        for filter in &mut self.push {
            filter.set(Fix32::ZERO);
        }
    }

    /// Clear the velocity PID state
    pub fn reset(&mut self, navigation: &Navigation) {
        self.error_sum = [Fix64::ZERO; 2];
        self.last_setpoint = [Fix32::ZERO; 2];
        self.last_velocity = [navigation.north_velocity, navigation.east_velocity];
        for filter in self.ff_filter.iter_mut().chain(self.d_filter.iter_mut()) {
            filter.set(Fix32::ZERO);
        }
        self.relax_filter.set(Fix32::ZERO);
    }

    fn deadbanded(&self, channel: u16) -> i32 {
        let v = channel as i32 - CHANNEL_CENTER as i32;
        if v.abs() < self.deadband {
            0
        } else {
            v - v.signum() * self.deadband
        }
    }

    /// World-frame (north, east) velocity setpoint from the sticks
    pub fn stick_velocity(
        &mut self,
        rc: &RcChannels,
        attitude: &Attitude,
        navigation: &Navigation,
        now_us: u64,
    ) -> (Fix32, Fix32) {
        let right = self.deadbanded(rc.channel(RcChannels::ROLL));
        let forward = self.deadbanded(rc.channel(RcChannels::PITCH));

        if right != 0 || forward != 0 {
            self.stick_state = StickState::Flying;
            self.lock = None;
            let right = (Fix32::from_int(right) >> 9) * self.max_hvel;
            let forward = (Fix32::from_int(forward) >> 9) * self.max_hvel;
            let (sin_h, cos_h) = (attitude.sin_heading, attitude.cos_heading);
            let east = cos_h * right + sin_h * forward;
            let north = -(sin_h * right) + cos_h * forward;
            return self.store_setpoint(north, east);
        }

        match self.stick_state {
            StickState::Flying => {
                self.stick_state = StickState::Braking(now_us);
                self.lock = navigation.position;
            }
            StickState::Braking(since) => {
                self.lock = navigation.position.or(self.lock);
                if now_us.saturating_sub(since) > BRAKE_US {
                    self.engage(self.lock);
                }
            }
            StickState::Locked => {
                if self.lock.is_none() {
                    self.lock = navigation.position;
                }
                if let (Some(lock), Some(here)) = (self.lock, navigation.position) {
                    let (north, east) = here.offset_to(&lock);
                    let north = self.push[NORTH].update(north) / PUSH_DIVISOR;
                    let east = self.push[EAST].update(east) / PUSH_DIVISOR;
                    let limit = self.max_hvel;
                    return self.store_setpoint(north.clamp(-limit, limit), east.clamp(-limit, limit));
                }
            }
        }
        self.store_setpoint(Fix32::ZERO, Fix32::ZERO)
    }

    fn store_setpoint(&mut self, north: Fix32, east: Fix32) -> (Fix32, Fix32) {
        self.velocity_setpoint = [north, east];
        (north, east)
    }

    /// Autopilot velocity setpoint; leaves the stick lock alone
    pub fn set_velocity_setpoint(&mut self, north: Fix32, east: Fix32) {
        let limit = self.max_hvel;
        self.store_setpoint(north.clamp(-limit, limit), east.clamp(-limit, limit));
    }

    /// One horizontal-velocity PID step on the stored setpoint
    pub fn update(
        &mut self,
        attitude: &Attitude,
        navigation: &Navigation,
        now_us: u64,
    ) -> TiltCommand {
        let velocity = [navigation.north_velocity, navigation.east_velocity];

        let mut setpoint_accel = [Fix32::ZERO; 2];
        for axis in [NORTH, EAST] {
            let change = (self.velocity_setpoint[axis] - self.last_setpoint[axis]) * self.macro_hz;
            let change = change.clamp(-MAX_SETPOINT_ACCEL, MAX_SETPOINT_ACCEL);
            setpoint_accel[axis] = self.ff_filter[axis].update(change);
        }
        let demand = setpoint_accel[NORTH].abs().max(setpoint_accel[EAST].abs());
        let relax = i_relax_factor(self.relax_filter.update(demand));

        let mut accel = [Fix32::ZERO; 2];
        for axis in [NORTH, EAST] {
            let error = self.velocity_setpoint[axis] - velocity[axis];

            let i = if self.i > Fix32::ZERO {
                let limit = I_LIMIT.to_fix64() / self.i;
                self.error_sum[axis] = (self.error_sum[axis] + error * relax).clamp(-limit, limit);
                (self.i * self.error_sum[axis]).to_fix32_saturating()
            } else {
                self.error_sum[axis] = Fix64::ZERO;
                Fix32::ZERO
            };

            let change = (self.last_velocity[axis] - velocity[axis]) * self.macro_hz;
            let d = self.d * self.d_filter[axis].update(change.clamp(-MAX_SETPOINT_ACCEL, MAX_SETPOINT_ACCEL));

            accel[axis] = self.p * error + i + d + self.ff * setpoint_accel[axis];
            self.last_setpoint[axis] = self.velocity_setpoint[axis];
            self.last_velocity[axis] = velocity[axis];
        }

        let (sin_h, cos_h) = (attitude.sin_heading, attitude.cos_heading);
        let forward = cos_h * accel[NORTH] + sin_h * accel[EAST];
        let right = -(sin_h * accel[NORTH]) + cos_h * accel[EAST];

        let roll = trig::atan2(right, GRAVITY) * Fix32::RAD_TO_DEG;
        let pitch = -(trig::atan2(forward, GRAVITY) * Fix32::RAD_TO_DEG);
        let total = trig::sqrt(roll * roll + pitch * pitch);
        TiltCommand {
            roll,
            pitch,
            limit: self.burst.limit(total, now_us),
        }
    }
}
