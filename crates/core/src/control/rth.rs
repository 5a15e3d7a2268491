//! Return-to-home sequencing
//!
//! Climb to a safe altitude over the point where RTH started, fly home at
//! that altitude, descend to near the ground, then keep sinking slowly
//! until the altitude stops changing.

use crate::arming::HomePoint;
use crate::fixed::{Fix32, Fix64};
use crate::parameters::PositionParams;
use crate::sensors::GeoPoint;

use super::navigation::{horizontal_distance, navigate_to, Guidance, MAX_VERTICAL_SPEED};

/// Climb is done this close below the RTH altitude, metres
const CLIMB_MARGIN: Fix32 = Fix32::ONE;

/// Home is reached when the guidance speed drops below this, m/s
const ARRIVAL_SPEED: Fix32 = Fix32::HALF;

/// Descent hands over to the landing check this high above home, metres
const DESCEND_FLOOR: Fix32 = Fix32::from_int(3);

const LANDING_SAMPLES: usize = 8;
const LANDING_SAMPLE_US: u64 = 1_000_000;

/// Altitude variance (m^2) across the samples that counts as landed
const LANDED_VARIANCE: Fix32 = Fix32::from_raw(2621);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RthState {
    Climb,
    NavigateHome,
    Descend,
    HoverConfirm,
    Landed,
}

impl RthState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RthState::Climb => "CLIMB",
            RthState::NavigateHome => "NAV_HOME",
            RthState::Descend => "DESCEND",
            RthState::HoverConfirm => "HOVER_CONFIRM",
            RthState::Landed => "LANDED",
        }
    }
}

/// Output of one RTH step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RthStep {
    /// World-frame velocity command, m/s
    pub north: Fix32,
    pub east: Fix32,
    /// Up positive, m/s
    pub vertical: Fix32,
    pub transition: Option<(RthState, RthState)>,
}

impl RthStep {
    pub fn landed(&self) -> bool {
        matches!(self.transition, Some((_, RthState::Landed)))
    }
}

#[derive(Debug, Clone)]
pub struct RthStateMachine {
    state: RthState,
    rth_altitude: Fix32,
    land_speed: Fix32,
    start: Option<GeoPoint>,
    target: Option<GeoPoint>,
    home_altitude: Fix32,
    cruise_altitude: Fix32,
    samples: [Fix32; LANDING_SAMPLES],
    sample_count: usize,
    last_sample_us: Option<u64>,
}

impl RthStateMachine {
    pub fn new(params: &PositionParams) -> Self {
        Self {
            state: RthState::Climb,
            rth_altitude: Fix32::from_f32(params.rth_altitude),
            land_speed: Fix32::from_f32(params.rth_land_speed),
            start: None,
            target: None,
            home_altitude: Fix32::ZERO,
            cruise_altitude: Fix32::ZERO,
            samples: [Fix32::ZERO; LANDING_SAMPLES],
            sample_count: 0,
            last_sample_us: None,
        }
    }

    pub fn set_params(&mut self, params: &PositionParams) {
        self.rth_altitude = Fix32::from_f32(params.rth_altitude);
        self.land_speed = Fix32::from_f32(params.rth_land_speed);
    }

    pub fn state(&self) -> RthState {
        self.state
    }

    pub fn start_point(&self) -> Option<GeoPoint> {
        self.start
    }

    /// Begin a return from `position` at `altitude`
    ///
    /// Without a home point the start point and current altitude stand in
    /// for it. Without any horizontal reference the climb and transit legs
    /// are skipped.
    pub fn start(&mut self, position: Option<GeoPoint>, altitude: Fix32, home: Option<HomePoint>) {
        self.start = position;
        match home {
            Some(home) => {
                self.target = home.position;
                self.home_altitude = home.altitude;
            }
            None => {
                self.target = position;
                self.home_altitude = altitude;
            }
        }
        self.cruise_altitude = self.home_altitude + self.rth_altitude;
        self.sample_count = 0;
        self.last_sample_us = None;
        self.state = if self.target.is_some() {
            RthState::Climb
        } else {
            RthState::Descend
        };
    }

    fn guidance(
        &self,
        here: Option<GeoPoint>,
        altitude: Fix32,
        to: Option<GeoPoint>,
        to_altitude: Fix32,
        max_hvel: Fix32,
    ) -> Guidance {
        match (here, to) {
            (Some(here), Some(to)) => navigate_to(&here, altitude, &to, to_altitude, max_hvel),
            _ => {
                let vertical = ((to_altitude - altitude) / 2)
                    .clamp(-MAX_VERTICAL_SPEED, MAX_VERTICAL_SPEED);
                Guidance {
                    vertical,
                    ..Guidance::default()
                }
            }
        }
    }

    /// Altitude variance over the landing samples, `None` until all are taken
    fn sample_variance(&self) -> Option<Fix64> {
        if self.sample_count < LANDING_SAMPLES {
            return None;
        }
        let sum = self.samples.iter().fold(Fix64::ZERO, |acc, &s| acc + s);
        let mean = (sum / LANDING_SAMPLES as i64).to_fix32_saturating();
        let squares = self.samples.iter().fold(Fix64::ZERO, |acc, &s| {
            let d = s - mean;
            acc + d * d.to_fix64()
        });
        Some(squares / LANDING_SAMPLES as i64)
    }

    fn record_sample(&mut self, altitude: Fix32, now_us: u64) -> bool {
        let due = match self.last_sample_us {
            None => true,
            Some(last) => now_us.saturating_sub(last) >= LANDING_SAMPLE_US,
        };
        if due {
            self.samples[self.sample_count % LANDING_SAMPLES] = altitude;
            self.sample_count = self.sample_count.saturating_add(1);
            self.last_sample_us = Some(now_us);
        }
        due
    }

    /// Advance the sequence by one macro-cycle
    pub fn step(
        &mut self,
        position: Option<GeoPoint>,
        altitude: Fix32,
        max_hvel: Fix32,
        now_us: u64,
    ) -> RthStep {
        let from = self.state;
        let (guidance, next) = match self.state {
            RthState::Climb => {
                let g = self.guidance(position, altitude, self.start, self.cruise_altitude, max_hvel);
                let next = if altitude >= self.cruise_altitude - CLIMB_MARGIN {
                    self.cruise_altitude = self.cruise_altitude.max(altitude);
                    RthState::NavigateHome
                } else {
                    RthState::Climb
                };
                (g, next)
            }
            RthState::NavigateHome => {
                let g = self.guidance(position, altitude, self.target, self.cruise_altitude, max_hvel);
                let next = if position.is_none() || horizontal_distance(g.north, g.east) < ARRIVAL_SPEED {
                    RthState::Descend
                } else {
                    RthState::NavigateHome
                };
                (g, next)
            }
            RthState::Descend => {
                let g = self.guidance(position, altitude, self.target, self.home_altitude, max_hvel);
                let next = if altitude - self.home_altitude < DESCEND_FLOOR {
                    RthState::HoverConfirm
                } else {
                    RthState::Descend
                };
                (g, next)
            }
            RthState::HoverConfirm => {
                let mut g = self.guidance(position, altitude, self.target, altitude, max_hvel);
                g.vertical = -self.land_speed;
                let mut next = RthState::HoverConfirm;
                if self.record_sample(altitude, now_us) {
                    if let Some(variance) = self.sample_variance() {
                        if variance < LANDED_VARIANCE.to_fix64() {
                            next = RthState::Landed;
                        }
                    }
                }
                (g, next)
            }
            RthState::Landed => (
                Guidance {
                    vertical: -self.land_speed,
                    ..Guidance::default()
                },
                RthState::Landed,
            ),
        };

        self.state = next;
        RthStep {
            north: guidance.north,
            east: guidance.east,
            vertical: guidance.vertical,
            transition: (from != next).then_some((from, next)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOME: GeoPoint = GeoPoint::new(473_977_420, 85_455_940);
    const MAX_HVEL: Fix32 = Fix32::from_int(12);

    fn home(altitude: i32) -> HomePoint {
        HomePoint {
            position: Some(HOME),
            altitude: Fix32::from_int(altitude),
        }
    }

    fn rth() -> RthStateMachine {
        RthStateMachine::new(&PositionParams::default())
    }

    #[test]
    fn test_climb_holds_start_point() {
        let mut rth = rth();
        let start = HOME.displaced(50.0, 0.0);
        rth.start(Some(start), Fix32::from_int(105), Some(home(100)));
        assert_eq!(rth.state(), RthState::Climb);

        let step = rth.step(Some(start), Fix32::from_int(105), MAX_HVEL, 0);
        assert!(step.north.abs() < Fix32::from_f32(0.05));
        assert_eq!(step.vertical, MAX_VERTICAL_SPEED);
        assert_eq!(step.transition, None);

        let step = rth.step(Some(start), Fix32::from_int(129), MAX_HVEL, 0);
        assert_eq!(step.transition, Some((RthState::Climb, RthState::NavigateHome)));
    }

    #[test]
    fn test_navigate_then_descend() {
        let mut rth = rth();
        let start = HOME.displaced(50.0, 0.0);
        rth.start(Some(start), Fix32::from_int(130), Some(home(100)));
        rth.step(Some(start), Fix32::from_int(130), MAX_HVEL, 0);
        assert_eq!(rth.state(), RthState::NavigateHome);

        let step = rth.step(Some(start), Fix32::from_int(130), MAX_HVEL, 0);
        assert!(step.north < Fix32::from_int(-11), "north {}", step.north);
        assert_eq!(rth.state(), RthState::NavigateHome);

        let step = rth.step(Some(HOME.displaced(0.3, 0.0)), Fix32::from_int(130), MAX_HVEL, 0);
        assert_eq!(step.transition, Some((RthState::NavigateHome, RthState::Descend)));

        let step = rth.step(Some(HOME), Fix32::from_int(130), MAX_HVEL, 0);
        assert_eq!(step.vertical, -MAX_VERTICAL_SPEED);
        let step = rth.step(Some(HOME), Fix32::from_f32(102.5), MAX_HVEL, 0);
        assert_eq!(step.transition, Some((RthState::Descend, RthState::HoverConfirm)));
    }

    #[test]
    fn test_hover_confirm_waits_for_still_altitude() {
        let mut rth = rth();
        rth.start(Some(HOME), Fix32::from_int(102), Some(home(100)));
        rth.state = RthState::HoverConfirm;

        // still sinking: no landing
        for second in 0..8u64 {
            let altitude = Fix32::from_int(102) - Fix32::from_int(second as i32) / 4;
            let step = rth.step(Some(HOME), altitude, MAX_HVEL, second * 1_000_000);
            assert_eq!(step.vertical, -Fix32::ONE);
            assert!(!step.landed());
        }

        // on the ground
        let mut landed_at = None;
        for second in 8..20u64 {
            let step = rth.step(Some(HOME), Fix32::from_int(100), MAX_HVEL, second * 1_000_000);
            if step.landed() {
                landed_at = Some(second);
                break;
            }
        }
        assert!(landed_at.is_some());
        assert_eq!(rth.state(), RthState::Landed);
        let step = rth.step(Some(HOME), Fix32::from_int(100), MAX_HVEL, 30_000_000);
        assert_eq!(step.transition, None);
    }

    #[test]
    fn test_samples_spaced_one_second() {
        let mut rth = rth();
        rth.start(Some(HOME), Fix32::from_int(100), Some(home(100)));
        rth.state = RthState::HoverConfirm;
        for cycle in 0..2000u64 {
            let step = rth.step(Some(HOME), Fix32::from_int(100), MAX_HVEL, cycle * 2500);
            assert!(!step.landed(), "landed after {} us", cycle * 2500);
        }
    }

    #[test]
    fn test_no_home_uses_start_point() {
        let mut rth = rth();
        let start = HOME.displaced(20.0, 20.0);
        rth.start(Some(start), Fix32::from_int(10), None);
        assert_eq!(rth.state(), RthState::Climb);
        let step = rth.step(Some(start), Fix32::from_int(39), MAX_HVEL, 0);
        assert_eq!(step.transition, Some((RthState::Climb, RthState::NavigateHome)));
        // already there
        let step = rth.step(Some(start), Fix32::from_int(40), MAX_HVEL, 0);
        assert_eq!(step.transition, Some((RthState::NavigateHome, RthState::Descend)));
    }

    #[test]
    fn test_no_fix_descends_in_place() {
        let mut rth = rth();
        rth.start(
            None,
            Fix32::from_int(20),
            Some(HomePoint {
                position: None,
                altitude: Fix32::ZERO,
            }),
        );
        assert_eq!(rth.state(), RthState::Descend);
        let step = rth.step(None, Fix32::from_int(20), MAX_HVEL, 0);
        assert_eq!((step.north, step.east), (Fix32::ZERO, Fix32::ZERO));
        assert_eq!(step.vertical, -MAX_VERTICAL_SPEED);
    }

    #[test]
    fn test_higher_than_rth_altitude_keeps_altitude() {
        let mut rth = rth();
        let start = HOME.displaced(100.0, 0.0);
        rth.start(Some(start), Fix32::from_int(80), Some(home(0)));
        let step = rth.step(Some(start), Fix32::from_int(80), MAX_HVEL, 0);
        assert_eq!(step.transition, Some((RthState::Climb, RthState::NavigateHome)));
        let step = rth.step(Some(start), Fix32::from_int(80), MAX_HVEL, 0);
        assert_eq!(step.vertical, Fix32::ZERO);
    }
}
