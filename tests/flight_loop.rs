//! FlightLoop against mock collaborators

use kolibri::flight::{FlightLoop, LoopExchange};
use kolibri::kolibri_core::ahrs::AhrsConfig;
use kolibri::kolibri_core::arming::{DisarmReason, LINK_LOSS_TIMEOUT_US};
use kolibri::kolibri_core::control::{FlightMode, RcChannels};
use kolibri::kolibri_core::motor::{MotorError, MotorOutputs};
use kolibri::kolibri_core::parameters::FlightSettings;
use kolibri::kolibri_core::sensors::{BaroSample, GpsFix, MagSample};
use kolibri::traits::{MockState, MotorOutput, RcLink, SensorError, SensorSource, SharedState};

const CYCLE_US: u64 = 312;

#[derive(Default)]
struct QuietImu {
    esc_rpm: Option<[u32; 4]>,
}

impl SensorSource for QuietImu {
    fn gyro_ready(&mut self) -> bool {
        true
    }

    fn read_gyro(&mut self) -> Result<[i16; 3], SensorError> {
        Ok([0; 3])
    }

    fn read_accel(&mut self) -> Option<[i16; 3]> {
        None
    }

    fn read_mag(&mut self) -> Option<MagSample> {
        None
    }

    fn read_baro(&mut self) -> Option<BaroSample> {
        None
    }

    fn read_gps(&mut self) -> Option<GpsFix> {
        None
    }

    fn read_esc_rpm(&mut self) -> Option<[u32; 4]> {
        self.esc_rpm
    }
}

struct Radio {
    rc: RcChannels,
}

impl RcLink for Radio {
    fn channels(&mut self, _now_us: u64) -> RcChannels {
        self.rc
    }
}

#[derive(Default)]
struct Escs {
    last: MotorOutputs,
}

impl MotorOutput for Escs {
    fn write(&mut self, outputs: &MotorOutputs) -> Result<(), MotorError> {
        self.last = *outputs;
        Ok(())
    }
}

type Loop<'a> = FlightLoop<'a, QuietImu, Radio, Escs, MockState<LoopExchange>>;

fn flight_loop(exchange: &MockState<LoopExchange>) -> Loop<'_> {
    flight_loop_with(exchange, QuietImu::default(), FlightSettings::default())
}

fn flight_loop_with(
    exchange: &MockState<LoopExchange>,
    imu: QuietImu,
    settings: FlightSettings,
) -> Loop<'_> {
    let mut rc = RcChannels::default();
    rc.link_up = true;
    rc.link_quality = 100;
    FlightLoop::new(
        imu,
        Radio { rc },
        Escs::default(),
        exchange,
        AhrsConfig::default().with_gyro_calibration_samples(8),
        settings,
    )
}

fn run(fl: &mut Loop<'_>, now: &mut u64, cycles: u32) {
    for _ in 0..cycles {
        *now += CYCLE_US;
        assert!(fl.run_cycle(*now));
    }
}

fn arm(fl: &mut Loop<'_>, now: &mut u64) {
    // calibrate with the switch off, then hold it on through the debounce
    run(fl, now, 16);
    fl.link_mut().rc.set_channel(RcChannels::ARM, 2000);
    run(fl, now, 10);
    assert!(fl.arming().armed(), "flags {:?}", fl.arming().flags());
}

#[test]
fn test_motors_idle_until_armed() {
    let exchange = MockState::new(LoopExchange::default());
    let mut fl = flight_loop(&exchange);
    let mut now = 0;
    run(&mut fl, &mut now, 16);
    assert!(fl.motors().last.is_stopped());

    arm(&mut fl, &mut now);
    fl.link_mut().rc.set_channel(RcChannels::THROTTLE, 1300);
    run(&mut fl, &mut now, 1);
    let motors = fl.motors().last.values();
    assert!(motors.iter().all(|&m| m >= 70), "motors {:?}", motors);
    assert!(exchange.with(|x| x.snapshot.armed));
}

#[test]
fn test_link_loss_disarms_within_one_cycle() {
    let exchange = MockState::new(LoopExchange::default());
    let mut fl = flight_loop(&exchange);
    let mut now = 0;
    arm(&mut fl, &mut now);
    fl.link_mut().rc.set_channel(RcChannels::THROTTLE, 1500);
    run(&mut fl, &mut now, 100);
    assert!(!fl.motors().last.is_stopped());

    fl.link_mut().rc.since_last_message_us = LINK_LOSS_TIMEOUT_US;
    run(&mut fl, &mut now, 1);
    assert!(!fl.arming().armed());
    assert!(fl.motors().last.is_stopped());
    assert_eq!(fl.state().last_disarm_reason, Some(DisarmReason::LinkLoss));
    assert_eq!(fl.pid().terms().axes[0].i, Default::default());

    let snapshot = exchange.with(|x| x.snapshot);
    assert!(!snapshot.armed);
    assert!(snapshot.motors.is_stopped());
    assert_eq!(snapshot.last_disarm_reason, Some(DisarmReason::LinkLoss));
}

#[test]
fn test_settings_swap_waits_for_macro_boundary() {
    let exchange = MockState::new(LoopExchange::default());
    let mut fl = flight_loop(&exchange);
    let mut now = 0;
    fl.link_mut()
        .rc
        .set_channel(RcChannels::MODE, 1000 + 200 * FlightMode::Angle as u16);
    run(&mut fl, &mut now, 3);
    assert_eq!(fl.controller().mode(), FlightMode::Angle);

    let mut settings = FlightSettings::default();
    settings.angle.max_angle = 25.0;
    exchange.with_mut(|x| x.settings.stage(settings));

    // iterations 4..=8 of the macro-cycle
    for _ in 0..5 {
        run(&mut fl, &mut now, 1);
        assert_ne!(fl.settings().angle.max_angle, 25.0);
        assert!(exchange.with(|x| x.settings.has_staged()));
    }
    run(&mut fl, &mut now, 1);
    assert_eq!(fl.settings().angle.max_angle, 25.0);
    assert!(!exchange.with(|x| x.settings.has_staged()));
    assert_eq!(exchange.with(|x| x.settings.generation()), 1);
}

#[test]
fn test_snapshot_published_every_cycle() {
    let exchange = MockState::new(LoopExchange::default());
    let mut fl = flight_loop(&exchange);
    let mut now = 0;
    for expected in 1..=5u32 {
        run(&mut fl, &mut now, 1);
        let snapshot = exchange.with(|x| x.snapshot);
        assert_eq!(snapshot.cycle, expected);
        assert_eq!(snapshot.timestamp_us, now);
    }
}

#[test]
fn test_configurator_override_disarms() {
    let exchange = MockState::new(LoopExchange::default());
    let mut fl = flight_loop(&exchange);
    let mut now = 0;
    arm(&mut fl, &mut now);
    fl.set_configurator_override(true);
    run(&mut fl, &mut now, 1);
    assert!(!fl.arming().armed());
    assert_eq!(fl.state().last_disarm_reason, Some(DisarmReason::Override));
}

/// Armed at zero throttle for `cycles`, returning the last motor commands
fn idle_motors(fl: &mut Loop<'_>, cycles: u32) -> [u16; 4] {
    let mut now = 0;
    fl.link_mut().rc.set_channel(RcChannels::THROTTLE, 1000);
    arm(fl, &mut now);
    run(fl, &mut now, cycles);
    fl.motors().last.values()
}

#[test]
fn test_slow_motors_raise_idle_floor() {
    let exchange = MockState::new(LoopExchange::default());
    let imu = QuietImu {
        esc_rpm: Some([1000; 4]),
    };
    let mut fl = flight_loop_with(&exchange, imu, FlightSettings::default());
    let motors = idle_motors(&mut fl, 20);
    assert!(fl.dynamic_idle().is_active());
    // 2000 RPM short: P alone saturates the floor
    assert!(motors.iter().all(|&m| m >= 395), "motors {:?}", motors);

    // well above the target the floor drops back to the fixed idle
    fl.sensors_mut().esc_rpm = Some([7000; 4]);
    let mut now = 1_000_000;
    run(&mut fl, &mut now, 5);
    let motors = fl.motors().last.values();
    assert!(motors.iter().all(|&m| (70..100).contains(&m)), "motors {:?}", motors);

    // telemetry gone: fixed idle after the grace cycles
    fl.sensors_mut().esc_rpm = None;
    run(&mut fl, &mut now, 10);
    assert!(!fl.dynamic_idle().is_active());
}

#[test]
fn test_disabled_dynamic_idle_matches_fixed_idle() {
    let fixed = {
        let exchange = MockState::new(LoopExchange::default());
        let mut fl = flight_loop(&exchange);
        idle_motors(&mut fl, 20)
    };

    let mut settings = FlightSettings::default();
    settings.pid.dynamic_idle = false;
    let exchange = MockState::new(LoopExchange::default());
    let imu = QuietImu {
        esc_rpm: Some([1000; 4]),
    };
    let mut fl = flight_loop_with(&exchange, imu, settings);
    let disabled = idle_motors(&mut fl, 20);
    assert!(!fl.dynamic_idle().is_active());
    assert_eq!(disabled, fixed);
    assert!(fixed.iter().all(|&m| m < 100), "motors {:?}", fixed);
}
