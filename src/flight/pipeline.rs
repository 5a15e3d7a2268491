//! Real-time flight pipeline
//!
//! One `run_cycle` per gyro sample:
//!
//! ```text
//! gyro poll -> estimator -> arming / link check -> controller
//!           -> rate PID -> idle floors -> mixer -> motor output -> snapshot
//! ```
//!
//! Nothing in a cycle blocks or allocates. A failed gyro read reuses the
//! last good sample so actuation never stalls; a lost RC link disarms and
//! zeroes the motors within the same cycle.

use kolibri_core::ahrs::{AhrsConfig, Estimator, Navigation};
use kolibri_core::arming::{
    ArmingEvent, ArmingInput, ArmingSupervisor, DisarmReason, LINK_LOSS_TIMEOUT_US,
};
use kolibri_core::control::{
    ControlEvent, ControlEvents, ControlInput, FlightController, FlightMode, RcChannels,
};
use kolibri_core::motor::{DynamicIdle, MotorOutputs, QuadMixer};
use kolibri_core::parameters::FlightSettings;
use kolibri_core::pid::RatePid;
use kolibri_core::state::FlightState;

use super::exchange::LoopExchange;
use crate::traits::{MotorOutput, RcLink, SensorSource, SharedState};
use crate::{log_error, log_info, log_warn};

/// The flight loop and everything it owns
///
/// `X` is the shared cell the loop publishes its snapshot to and takes
/// staged settings from.
pub struct FlightLoop<'a, S, L, M, X>
where
    S: SensorSource,
    L: RcLink,
    M: MotorOutput,
    X: SharedState<LoopExchange>,
{
    sensors: S,
    link: L,
    motors: M,
    exchange: &'a X,

    loop_hz: u32,
    settings: FlightSettings,
    estimator: Estimator,
    arming: ArmingSupervisor,
    controller: FlightController,
    pid: RatePid,
    mixer: QuadMixer,
    idle: DynamicIdle,
    state: FlightState,

    last_gyro: [i16; 3],
    link_lost: bool,
    motor_fault: bool,
    configurator_override: bool,
}

impl<'a, S, L, M, X> FlightLoop<'a, S, L, M, X>
where
    S: SensorSource,
    L: RcLink,
    M: MotorOutput,
    X: SharedState<LoopExchange>,
{
    /// The loop runs at the gyro rate of `ahrs`
    pub fn new(
        sensors: S,
        link: L,
        motors: M,
        exchange: &'a X,
        ahrs: AhrsConfig,
        settings: FlightSettings,
    ) -> Self {
        let loop_hz = ahrs.gyro_rate_hz.max(1);
        let sample_hz = loop_hz as f32;
        let mut pid = RatePid::new(settings.pid.pid_config(sample_hz));
        if let Some(boost) = settings.pid.pid_boost(sample_hz) {
            pid = pid.with_boost(boost);
        }
        log_info!("flight loop at {} Hz", loop_hz);
        Self {
            sensors,
            link,
            motors,
            exchange,
            loop_hz,
            estimator: Estimator::new(ahrs),
            arming: ArmingSupervisor::new(),
            controller: FlightController::new(&settings, loop_hz),
            pid,
            mixer: settings.pid.mixer(),
            idle: DynamicIdle::new(settings.pid.dynamic_idle()),
            state: FlightState::default(),
            settings,
            last_gyro: [0; 3],
            link_lost: false,
            motor_fault: false,
            configurator_override: false,
        }
    }

    pub fn loop_hz(&self) -> u32 {
        self.loop_hz
    }

    /// Settings currently in effect
    pub fn settings(&self) -> &FlightSettings {
        &self.settings
    }

    pub fn state(&self) -> &FlightState {
        &self.state
    }

    pub fn estimator(&self) -> &Estimator {
        &self.estimator
    }

    pub fn arming(&self) -> &ArmingSupervisor {
        &self.arming
    }

    pub fn controller(&self) -> &FlightController {
        &self.controller
    }

    pub fn pid(&self) -> &RatePid {
        &self.pid
    }

    pub fn dynamic_idle(&self) -> &DynamicIdle {
        &self.idle
    }

    pub fn sensors_mut(&mut self) -> &mut S {
        &mut self.sensors
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    pub fn motors(&self) -> &M {
        &self.motors
    }

    /// Configurator motor test in progress; disarms and blocks arming
    pub fn set_configurator_override(&mut self, active: bool) {
        self.configurator_override = active;
    }

    pub fn set_takeoff_prevention(&mut self, enabled: bool) {
        self.arming.set_takeoff_prevention(enabled);
    }

    /// One pipeline pass if a gyro sample is ready
    ///
    /// Returns `false` without touching any state when there is nothing to
    /// process.
    pub fn run_cycle(&mut self, now_us: u64) -> bool {
        if !self.sensors.gyro_ready() {
            return false;
        }

        self.read_sensors();
        let navigation = self.estimator.navigation();
        let attitude = *self.estimator.attitude();
        let rates = self.estimator.rates_dps();

        let rc = self.link.channels(now_us);
        self.watch_link(&rc);
        self.evaluate_arming(&rc, &navigation);

        if self.controller.at_macro_boundary() {
            self.swap_settings();
        }
        let output = self.controller.update(&ControlInput {
            rc: &rc,
            attitude: &attitude,
            navigation: &navigation,
            home: self.arming.home(),
            now_us,
        });
        self.handle_control_events(&output.events);

        let esc_rpm = self.sensors.read_esc_rpm();
        let motors = if self.arming.armed() {
            let axes = self
                .pid
                .update(&output.setpoints, rates, rc.channel(RcChannels::THROTTLE));
            let throttle = output.setpoints.throttle;
            match self.idle.update(esc_rpm) {
                Some(floors) => {
                    self.mixer
                        .mix_with_floors(throttle, axes[0], axes[1], axes[2], &floors)
                }
                None => self.mixer.mix(throttle, axes[0], axes[1], axes[2]),
            }
        } else {
            self.pid.reset(rates);
            self.idle.reset();
            MotorOutputs::disarmed()
        };
        self.write_motors(&motors);

        let state = &mut self.state;
        state.attitude = attitude;
        state.navigation = navigation;
        state.rates_dps = rates;
        state.setpoints = output.setpoints;
        state.flight_mode = output.mode;
        state.rth_state = output.rth_state;
        state.pid = *self.pid.terms();
        state.motors = motors;
        state.armed = self.arming.armed();
        state.arming_flags = self.arming.flags();
        state.last_disarm_reason = self.arming.last_disarm_reason();
        state.cycle = state.cycle.wrapping_add(1);

        let snapshot = state.snapshot(now_us);
        self.exchange.with_mut(|x| x.snapshot = snapshot);
        true
    }

    fn read_sensors(&mut self) {
        match self.sensors.read_gyro() {
            Ok(raw) => {
                if self.state.gyro_fault {
                    log_info!("gyro recovered");
                }
                self.state.gyro_fault = false;
                self.last_gyro = raw;
            }
            Err(e) => {
                if !self.state.gyro_fault {
                    log_warn!("gyro read failed: {}", e.as_str());
                }
                self.state.gyro_fault = true;
            }
        }
        self.estimator.update_gyro(self.last_gyro);

        if let Some(accel) = self.sensors.read_accel() {
            self.estimator.update_accel(accel);
        }
        if let Some(mag) = self.sensors.read_mag() {
            self.estimator.update_mag(&mag);
        }
        if let Some(baro) = self.sensors.read_baro() {
            self.estimator.update_baro(&baro);
        }
        if let Some(fix) = self.sensors.read_gps() {
            self.estimator.update_gps(&fix);
        }
    }

    fn watch_link(&mut self, rc: &RcChannels) {
        let lost = !rc.link_up || rc.since_last_message_us >= LINK_LOSS_TIMEOUT_US;
        if lost && !self.link_lost {
            log_warn!("RC link lost");
        } else if !lost && self.link_lost {
            log_info!("RC link restored");
        }
        self.link_lost = lost;
    }

    fn evaluate_arming(&mut self, rc: &RcChannels, navigation: &Navigation) {
        let event = self.arming.update(&ArmingInput {
            rc,
            flight_mode: FlightMode::from_channel(rc.channel(RcChannels::MODE)),
            gyro_calibrated: self.estimator.is_gyro_calibrated(),
            configurator_override: self.configurator_override,
            navigation,
        });
        match event {
            Some(ArmingEvent::Armed(home)) => {
                let fix = if home.position.is_some() { "with" } else { "without" };
                log_info!("armed, home captured {} position", fix);
            }
            Some(ArmingEvent::Disarmed(reason)) => {
                log_warn!("disarmed: {}", reason.as_str());
            }
            Some(ArmingEvent::Refused(err)) => {
                log_warn!("arming refused: {}", err.as_str());
            }
            None => {}
        }
    }

    fn handle_control_events(&mut self, events: &ControlEvents) {
        for event in events.iter() {
            match *event {
                ControlEvent::ModeChanged { from, to } => {
                    log_info!("mode {} -> {}", from.as_str(), to.as_str());
                    // rate control authority changes hands
                    if (from == FlightMode::Acro) != (to == FlightMode::Acro) {
                        self.pid.reset_integrators();
                    }
                }
                ControlEvent::RthStateChanged { from, to } => {
                    log_info!("return home: {} -> {}", from.as_str(), to.as_str());
                }
                ControlEvent::Landed => {
                    if self.arming.armed() {
                        let reason = self.arming.disarm(DisarmReason::Landed);
                        log_info!("disarmed: {}", reason.as_str());
                    }
                }
            }
        }
    }

    fn swap_settings(&mut self) {
        let Some((settings, generation)) = self.exchange.with_mut(|x| {
            x.settings
                .take()
                .map(|settings| (settings, x.settings.generation()))
        }) else {
            return;
        };
        self.controller.apply_settings(&settings);
        self.pid
            .set_config(settings.pid.pid_config(self.loop_hz as f32));
        self.mixer = settings.pid.mixer();
        self.idle.set_config(settings.pid.dynamic_idle());
        self.settings = settings;
        log_info!("settings applied, generation {}", generation);
    }

    fn write_motors(&mut self, outputs: &MotorOutputs) {
        match self.motors.write(outputs) {
            Ok(()) => self.motor_fault = false,
            Err(_) => {
                if !self.motor_fault {
                    log_error!("motor output failed");
                }
                self.motor_fault = true;
            }
        }
    }
}
