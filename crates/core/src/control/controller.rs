//! Flight-mode controller
//!
//! Turns sticks and the state estimate into rate and throttle setpoints.
//! Acro maps the sticks straight through the rate curves every iteration.
//! Every other mode runs one phase of the sliced pipeline per iteration and
//! slews the output between macro-cycles.

use heapless::Vec;

use crate::ahrs::{Attitude, Navigation};
use crate::arming::HomePoint;
use crate::fixed::Fix32;
use crate::parameters::FlightSettings;
use crate::state::Setpoints;

use super::altitude::AltitudeController;
use super::angle::AngleController;
use super::mode::FlightMode;
use super::position::{PositionController, TiltCommand};
use super::rates::RateCurve;
use super::rc::{RcChannels, Sticks};
use super::rth::{RthState, RthStateMachine};
use super::slicer::{Phase, PhaseSlicer, PHASE_COUNT};

/// Events raised by one controller iteration
pub type ControlEvents = Vec<ControlEvent, 4>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    ModeChanged { from: FlightMode, to: FlightMode },
    RthStateChanged { from: RthState, to: RthState },
    /// Return-to-home confirmed the landing; the vehicle should disarm
    Landed,
}

/// Everything one controller iteration reads
#[derive(Debug, Clone, Copy)]
pub struct ControlInput<'a> {
    pub rc: &'a RcChannels,
    pub attitude: &'a Attitude,
    pub navigation: &'a Navigation,
    /// Where the vehicle was armed
    pub home: Option<HomePoint>,
    pub now_us: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlOutput {
    pub setpoints: Setpoints,
    pub mode: FlightMode,
    pub rth_state: Option<RthState>,
    pub events: ControlEvents,
}

#[derive(Debug, Clone)]
pub struct FlightController {
    mode: FlightMode,
    macro_hz: i32,
    curve: RateCurve,
    angle: AngleController,
    altitude: AltitudeController,
    position: PositionController,
    rth: RthStateMachine,
    rth_state: Option<RthState>,
    slicer: PhaseSlicer,

    sticks: Sticks,
    tilt: TiltCommand,
    vertical_target: Fix32,
    throttle: Fix32,
    last_output: Setpoints,
    events: ControlEvents,
}

impl FlightController {
    /// Controller for a control loop running at `loop_hz`
    pub fn new(settings: &FlightSettings, loop_hz: u32) -> Self {
        let macro_hz = (loop_hz as i32 / PHASE_COUNT as i32).max(1);
        let angle = AngleController::new(&settings.angle);
        let tilt = TiltCommand {
            limit: angle.max_angle(),
            ..TiltCommand::default()
        };
        Self {
            mode: FlightMode::Acro,
            macro_hz,
            curve: RateCurve::new(&settings.rates),
            angle,
            altitude: AltitudeController::new(&settings.altitude, macro_hz as f32),
            position: PositionController::new(&settings.position, &settings.angle, macro_hz),
            rth: RthStateMachine::new(&settings.position),
            rth_state: None,
            slicer: PhaseSlicer::new(),
            sticks: Sticks::default(),
            tilt,
            vertical_target: Fix32::ZERO,
            throttle: Fix32::ZERO,
            last_output: Setpoints::default(),
            events: ControlEvents::new(),
        }
    }

    /// Take new settings; call between iterations only
    pub fn apply_settings(&mut self, settings: &FlightSettings) {
        self.curve = RateCurve::new(&settings.rates);
        self.angle.set_params(&settings.angle);
        self.altitude.set_params(&settings.altitude);
        self.position.set_params(&settings.position, &settings.angle);
        self.rth.set_params(&settings.position);
    }

    pub fn mode(&self) -> FlightMode {
        self.mode
    }

    pub fn rth_state(&self) -> Option<RthState> {
        self.rth_state
    }

    /// Iterations per second of the sliced pipeline
    pub fn macro_hz(&self) -> i32 {
        self.macro_hz
    }

    /// Whether the next iteration starts a fresh macro-cycle
    pub fn at_macro_boundary(&self) -> bool {
        !self.mode.is_sliced() || self.slicer.counter() == 0
    }

    pub fn angle(&self) -> &AngleController {
        &self.angle
    }

    pub fn altitude(&self) -> &AltitudeController {
        &self.altitude
    }

    pub fn position(&self) -> &PositionController {
        &self.position
    }

    pub fn slicer(&self) -> &PhaseSlicer {
        &self.slicer
    }

    /// Switch mode with its entry effects applied before the next iteration
    ///
    /// Returns false when already in `mode`.
    pub fn set_flight_mode(&mut self, mode: FlightMode, input: &ControlInput<'_>) -> bool {
        let from = self.mode;
        if mode == from {
            return false;
        }
        let nav = input.navigation;

        if !from.holds_altitude() && mode.holds_altitude() {
            let latch = matches!(mode, FlightMode::AltHold | FlightMode::GpsVelocity);
            self.altitude.engage(
                self.last_output.throttle,
                nav.altitude,
                input.rc.channel(RcChannels::THROTTLE),
                latch,
                input.now_us,
            );
        } else if mode == FlightMode::GpsVelocity {
            self.altitude.hold_altitude(nav.altitude);
        }

        if !from.is_sliced() && mode.is_sliced() {
            self.angle.hold_heading(input.attitude.yaw);
            self.tilt = TiltCommand {
                limit: self.angle.max_angle(),
                ..TiltCommand::default()
            };
        }

        match mode {
            FlightMode::GpsVelocity => {
                self.position.engage(nav.position);
                self.position.reset(nav);
            }
            FlightMode::GpsPosition => {
                self.rth.start(nav.position, nav.altitude, input.home);
                self.position.reset(nav);
            }
            _ => {}
        }
        self.rth_state = (mode == FlightMode::GpsPosition).then(|| self.rth.state());
        self.throttle = self.last_output.throttle;
        self.vertical_target = Fix32::ZERO;

        self.slicer.reset(self.last_output);
        self.mode = mode;
        let _ = self.events.push(ControlEvent::ModeChanged { from, to: mode });
        true
    }

    /// One control loop iteration
    pub fn update(&mut self, input: &ControlInput<'_>) -> ControlOutput {
        let requested = FlightMode::from_channel(input.rc.channel(RcChannels::MODE));
        self.set_flight_mode(requested, input);

        let setpoints = if self.mode.is_sliced() {
            self.run_phase(input);
            self.slicer.tick()
        } else {
            self.acro(input.rc)
        };
        self.last_output = setpoints;

        ControlOutput {
            setpoints,
            mode: self.mode,
            rth_state: self.rth_state,
            events: core::mem::take(&mut self.events),
        }
    }

    fn acro(&mut self, rc: &RcChannels) -> Setpoints {
        let sticks = Sticks::from_channels(rc);
        self.sticks = sticks;
        Setpoints::new(
            self.curve.rate(sticks.roll, 0),
            -self.curve.rate(sticks.pitch, 1),
            self.curve.rate(sticks.yaw, 2),
            sticks.throttle,
        )
    }

    fn run_phase(&mut self, input: &ControlInput<'_>) {
        let nav = input.navigation;
        let attitude = input.attitude;
        match self.slicer.phase() {
            Phase::Sticks => {
                self.sticks = Sticks::from_channels(input.rc);
                match self.mode {
                    FlightMode::Angle | FlightMode::AltHold => {
                        let (roll, pitch) =
                            self.angle.stick_targets(self.sticks.roll, self.sticks.pitch);
                        self.tilt = TiltCommand {
                            roll,
                            pitch,
                            limit: self.angle.max_angle(),
                        };
                    }
                    FlightMode::GpsVelocity => {
                        self.position.stick_velocity(input.rc, attitude, nav, input.now_us);
                    }
                    FlightMode::GpsPosition => self.rth_step(input),
                    FlightMode::Acro => {}
                }
            }
            Phase::HorizontalVelocity => {
                if self.mode.uses_gps() {
                    self.tilt = self.position.update(attitude, nav, input.now_us);
                }
            }
            Phase::VerticalVelocity => match self.mode {
                FlightMode::AltHold | FlightMode::GpsVelocity => {
                    self.vertical_target = self.altitude.stick_to_velocity(
                        self.sticks.throttle,
                        nav.altitude,
                        input.now_us,
                    );
                }
                FlightMode::GpsPosition => {
                    self.vertical_target = self.altitude.hold_velocity(self.vertical_target);
                }
                _ => {}
            },
            Phase::Throttle => {
                self.throttle = if self.mode.holds_altitude() {
                    self.altitude.throttle(self.vertical_target, nav.vertical_velocity, attitude)
                } else {
                    self.sticks.throttle
                };
            }
            Phase::Heading => {
                let yaw_rate = if self.mode == FlightMode::GpsPosition {
                    Fix32::ZERO
                } else {
                    self.curve.rate(self.sticks.yaw, 2)
                };
                self.angle.update_heading(yaw_rate, self.macro_hz);
            }
            Phase::Tilt => {
                self.angle.update_tilt(self.tilt.roll, self.tilt.pitch, self.tilt.limit);
            }
            Phase::Difference => {
                self.angle.update_difference(&attitude.quaternion);
            }
            Phase::Rates => {
                let [roll, pitch, yaw] = self.angle.rates();
                self.slicer.complete(Setpoints::new(roll, pitch, yaw, self.throttle));
            }
        }
    }

    fn rth_step(&mut self, input: &ControlInput<'_>) {
        let nav = input.navigation;
        let step = self.rth.step(
            nav.position,
            nav.altitude,
            self.position.max_hvel(),
            input.now_us,
        );
        self.position.set_velocity_setpoint(step.north, step.east);
        self.vertical_target = step.vertical;
        self.rth_state = Some(self.rth.state());
        if let Some((from, to)) = step.transition {
            let _ = self.events.push(ControlEvent::RthStateChanged { from, to });
            if step.landed() {
                let _ = self.events.push(ControlEvent::Landed);
            }
        }
    }
}
