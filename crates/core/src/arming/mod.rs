//! Arming supervisor
//!
//! Arming needs ten consecutive evaluations with every check clear; one
//! failing evaluation starts the count over. Once armed, the vehicle
//! disarms on the switch, on RC link loss, on a configurator override, or
//! when return-to-home confirms the landing.
//!
//! After any disarm the switch has to be seen off before the next arm, so a
//! link that comes back with the switch still on does not re-arm.

pub mod error;

pub use error::{ArmingError, DisarmReason};

use bitflags::bitflags;

use crate::ahrs::Navigation;
use crate::control::{FlightMode, RcChannels};
use crate::fixed::Fix32;
use crate::sensors::GeoPoint;

/// Consecutive all-clear evaluations required to arm
pub const ARMING_DEBOUNCE_CYCLES: u8 = 10;

/// Time without a valid RC message after which the vehicle disarms
pub const LINK_LOSS_TIMEOUT_US: u32 = 500_000;

/// Arm switch channel threshold
const ARM_SWITCH_ON: u16 = 1500;

/// Throttle channel must be below this to arm
const THROTTLE_LOW: u16 = 1020;

bitflags! {
    /// Checks currently preventing arming (1 = blocking)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ArmingDisableFlags: u32 {
        /// Arm switch off, or not yet released since the last disarm
        const SWITCH = 0x01;
        /// Throttle stick not low
        const THROTTLE = 0x02;
        /// Configurator is overriding the motors
        const CONFIGURATOR = 0x08;
        /// RC link down
        const LINK_DOWN = 0x10;
        /// Flight mode other than acro or angle
        const FLIGHT_MODE = 0x20;
        /// Gyro bias calibration not finished
        const GYRO_CALIBRATION = 0x40;
        /// Takeoff prevention requested by the configurator
        const TAKEOFF_PREVENTION = 0x80;
    }
}

impl ArmingDisableFlags {
    /// Most relevant failing check, in the order a pilot should fix them
    pub fn dominant_reason(&self) -> &'static str {
        const ORDER: [(ArmingDisableFlags, &str); 7] = [
            (ArmingDisableFlags::GYRO_CALIBRATION, "gyro calibration"),
            (ArmingDisableFlags::CONFIGURATOR, "configurator override"),
            (ArmingDisableFlags::LINK_DOWN, "rc link down"),
            (ArmingDisableFlags::FLIGHT_MODE, "flight mode"),
            (ArmingDisableFlags::THROTTLE, "throttle not low"),
            (ArmingDisableFlags::TAKEOFF_PREVENTION, "takeoff prevention"),
            (ArmingDisableFlags::SWITCH, "arm switch"),
        ];
        ORDER
            .iter()
            .find(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .unwrap_or("none")
    }
}

/// Where the vehicle was armed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HomePoint {
    /// `None` when there was no 3D fix at arming
    pub position: Option<GeoPoint>,
    pub altitude: Fix32,
}

/// Everything one arming evaluation looks at
#[derive(Debug, Clone, Copy)]
pub struct ArmingInput<'a> {
    pub rc: &'a RcChannels,
    pub flight_mode: FlightMode,
    pub gyro_calibrated: bool,
    pub configurator_override: bool,
    pub navigation: &'a Navigation,
}

/// State change produced by one evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmingEvent {
    Armed(HomePoint),
    Disarmed(DisarmReason),
    Refused(ArmingError),
}

#[derive(Debug, Clone)]
pub struct ArmingSupervisor {
    armed: bool,
    clear_cycles: u8,
    switch_released: bool,
    takeoff_prevention: bool,
    refusal_reported: bool,
    flags: ArmingDisableFlags,
    last_disarm_reason: Option<DisarmReason>,
    home: Option<HomePoint>,
}

impl ArmingSupervisor {
    pub fn new() -> Self {
        Self {
            armed: false,
            clear_cycles: 0,
            switch_released: false,
            takeoff_prevention: false,
            refusal_reported: false,
            flags: ArmingDisableFlags::SWITCH,
            last_disarm_reason: None,
            home: None,
        }
    }

    pub fn armed(&self) -> bool {
        self.armed
    }

    pub fn flags(&self) -> ArmingDisableFlags {
        self.flags
    }

    pub fn last_disarm_reason(&self) -> Option<DisarmReason> {
        self.last_disarm_reason
    }

    /// Home captured at the last arming
    pub fn home(&self) -> Option<HomePoint> {
        self.home
    }

    /// Configurator "prevent takeoff" toggle
    pub fn set_takeoff_prevention(&mut self, enabled: bool) {
        self.takeoff_prevention = enabled;
    }

    /// Checks that block arming on this evaluation
    pub fn checks(&self, input: &ArmingInput<'_>) -> ArmingDisableFlags {
        let rc = input.rc;
        let mut flags = ArmingDisableFlags::empty();
        if rc.channel(RcChannels::ARM) <= ARM_SWITCH_ON || !self.switch_released {
            flags |= ArmingDisableFlags::SWITCH;
        }
        if rc.channel(RcChannels::THROTTLE) >= THROTTLE_LOW {
            flags |= ArmingDisableFlags::THROTTLE;
        }
        if input.configurator_override {
            flags |= ArmingDisableFlags::CONFIGURATOR;
        }
        if !rc.link_up || rc.since_last_message_us >= LINK_LOSS_TIMEOUT_US {
            flags |= ArmingDisableFlags::LINK_DOWN;
        }
        if input.flight_mode > FlightMode::Angle {
            flags |= ArmingDisableFlags::FLIGHT_MODE;
        }
        if !input.gyro_calibrated {
            flags |= ArmingDisableFlags::GYRO_CALIBRATION;
        }
        if self.takeoff_prevention {
            flags |= ArmingDisableFlags::TAKEOFF_PREVENTION;
        }
        flags
    }

    /// One evaluation, normally once per control cycle
    pub fn update(&mut self, input: &ArmingInput<'_>) -> Option<ArmingEvent> {
        let rc = input.rc;
        let switch_on = rc.channel(RcChannels::ARM) > ARM_SWITCH_ON;
        if !switch_on {
            self.switch_released = true;
        }

        if self.armed {
            if rc.since_last_message_us >= LINK_LOSS_TIMEOUT_US {
                return Some(ArmingEvent::Disarmed(self.disarm(DisarmReason::LinkLoss)));
            }
            if input.configurator_override {
                return Some(ArmingEvent::Disarmed(self.disarm(DisarmReason::Override)));
            }
            if !switch_on {
                return Some(ArmingEvent::Disarmed(self.disarm(DisarmReason::Switch)));
            }
            return None;
        }

        self.flags = self.checks(input);
        if self.flags.is_empty() {
            self.clear_cycles = self.clear_cycles.saturating_add(1);
            if self.clear_cycles >= ARMING_DEBOUNCE_CYCLES {
                let nav = input.navigation;
                let home = HomePoint {
                    position: nav.position,
                    altitude: nav.altitude,
                };
                self.armed = true;
                self.clear_cycles = 0;
                self.refusal_reported = false;
                self.home = Some(home);
                return Some(ArmingEvent::Armed(home));
            }
            return None;
        }

        self.clear_cycles = 0;
        let blocking = self.flags - ArmingDisableFlags::SWITCH;
        if switch_on && !blocking.is_empty() {
            if !self.refusal_reported {
                self.refusal_reported = true;
                return Some(ArmingEvent::Refused(ArmingError::Refused { flags: self.flags }));
            }
        } else {
            self.refusal_reported = false;
        }
        None
    }

    /// Forced disarm (landing confirmation, external safety stop)
    ///
    /// Returns the reason that was recorded; disarming twice keeps the
    /// first reason.
    pub fn disarm(&mut self, reason: DisarmReason) -> DisarmReason {
        if !self.armed {
            return self.last_disarm_reason.unwrap_or(reason);
        }
        self.armed = false;
        self.clear_cycles = 0;
        self.switch_released = false;
        self.flags = ArmingDisableFlags::SWITCH;
        self.last_disarm_reason = Some(reason);
        reason
    }
}

impl Default for ArmingSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rc(arm: u16, throttle: u16) -> RcChannels {
        let mut rc = RcChannels::default();
        rc.link_up = true;
        rc.set_channel(RcChannels::ARM, arm);
        rc.set_channel(RcChannels::THROTTLE, throttle);
        rc
    }

    fn input<'a>(rc: &'a RcChannels, nav: &'a Navigation) -> ArmingInput<'a> {
        ArmingInput {
            rc,
            flight_mode: FlightMode::Acro,
            gyro_calibrated: true,
            configurator_override: false,
            navigation: nav,
        }
    }

    fn arm(sup: &mut ArmingSupervisor, nav: &Navigation) {
        let off = rc(1000, 1000);
        sup.update(&input(&off, nav));
        let on = rc(2000, 1000);
        for _ in 0..ARMING_DEBOUNCE_CYCLES {
            sup.update(&input(&on, nav));
        }
        assert!(sup.armed());
    }

    #[test]
    fn test_arms_after_debounce() {
        let nav = Navigation::default();
        let mut sup = ArmingSupervisor::new();
        sup.update(&input(&rc(1000, 1000), &nav));
        let on = rc(2000, 1000);
        for _ in 0..ARMING_DEBOUNCE_CYCLES - 1 {
            assert_eq!(sup.update(&input(&on, &nav)), None);
        }
        assert!(!sup.armed());
        let event = sup.update(&input(&on, &nav));
        assert!(matches!(event, Some(ArmingEvent::Armed(_))));
        assert!(sup.armed());
    }

    #[test]
    fn test_switch_on_at_boot_needs_release() {
        let nav = Navigation::default();
        let mut sup = ArmingSupervisor::new();
        let on = rc(2000, 1000);
        for _ in 0..50 {
            sup.update(&input(&on, &nav));
        }
        assert!(!sup.armed());
        assert!(sup.flags().contains(ArmingDisableFlags::SWITCH));
    }

    #[test]
    fn test_refusal_reported_once() {
        let nav = Navigation::default();
        let mut sup = ArmingSupervisor::new();
        sup.update(&input(&rc(1000, 1500), &nav));
        let on = rc(2000, 1500);
        let first = sup.update(&input(&on, &nav));
        match first {
            Some(ArmingEvent::Refused(ArmingError::Refused { flags })) => {
                assert!(flags.contains(ArmingDisableFlags::THROTTLE));
            }
            other => panic!("expected refusal, got {:?}", other),
        }
        assert_eq!(sup.update(&input(&on, &nav)), None);
    }

    #[test]
    fn test_mode_and_calibration_block() {
        let nav = Navigation::default();
        let mut sup = ArmingSupervisor::new();
        let on = rc(2000, 1000);
        let mut inp = input(&on, &nav);
        inp.flight_mode = FlightMode::AltHold;
        inp.gyro_calibrated = false;
        let flags = sup.checks(&inp);
        assert!(flags.contains(ArmingDisableFlags::FLIGHT_MODE));
        assert!(flags.contains(ArmingDisableFlags::GYRO_CALIBRATION));
        assert_eq!(flags.dominant_reason(), "gyro calibration");
    }

    #[test]
    fn test_link_loss_disarms() {
        let nav = Navigation::default();
        let mut sup = ArmingSupervisor::new();
        arm(&mut sup, &nav);
        let mut lost = rc(2000, 1500);
        lost.since_last_message_us = LINK_LOSS_TIMEOUT_US;
        let event = sup.update(&input(&lost, &nav));
        assert_eq!(event, Some(ArmingEvent::Disarmed(DisarmReason::LinkLoss)));
        assert!(!sup.armed());
        assert_eq!(sup.last_disarm_reason(), Some(DisarmReason::LinkLoss));

        // link back with the switch still on: stays disarmed
        let back = rc(2000, 1000);
        for _ in 0..20 {
            sup.update(&input(&back, &nav));
        }
        assert!(!sup.armed());
    }

    #[test]
    fn test_switch_and_override_disarm() {
        let nav = Navigation::default();
        let mut sup = ArmingSupervisor::new();
        arm(&mut sup, &nav);
        let off = rc(1000, 1500);
        assert_eq!(
            sup.update(&input(&off, &nav)),
            Some(ArmingEvent::Disarmed(DisarmReason::Switch))
        );

        arm(&mut sup, &nav);
        let on = rc(2000, 1500);
        let mut inp = input(&on, &nav);
        inp.configurator_override = true;
        assert_eq!(
            sup.update(&inp),
            Some(ArmingEvent::Disarmed(DisarmReason::Override))
        );
    }

    #[test]
    fn test_home_captured_at_arming() {
        let nav = Navigation {
            altitude: Fix32::from_int(123),
            position: Some(GeoPoint::new(1, 2)),
            ..Default::default()
        };
        let mut sup = ArmingSupervisor::new();
        arm(&mut sup, &nav);
        let home = sup.home().unwrap();
        assert_eq!(home.altitude, Fix32::from_int(123));
        assert_eq!(home.position, Some(GeoPoint::new(1, 2)));
    }

    #[test]
    fn test_forced_disarm_keeps_first_reason() {
        let nav = Navigation::default();
        let mut sup = ArmingSupervisor::new();
        arm(&mut sup, &nav);
        assert_eq!(sup.disarm(DisarmReason::Landed), DisarmReason::Landed);
        assert_eq!(sup.disarm(DisarmReason::Switch), DisarmReason::Landed);
        assert_eq!(sup.last_disarm_reason(), Some(DisarmReason::Landed));
    }
}
