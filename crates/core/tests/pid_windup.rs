//! Rate PID integrator bound and disarmed reset

use kolibri_core::fixed::Fix32;
use kolibri_core::parameters::PidParams;
use kolibri_core::pid::RatePid;
use kolibri_core::state::Setpoints;

const LOOP_HZ: f32 = 3200.0;

fn pid() -> RatePid {
    RatePid::new(PidParams::default().pid_config(LOOP_HZ))
}

#[test]
fn test_integrator_never_exceeds_limit() {
    let mut pid = pid();
    let limit = pid.config().i_limit;
    let setpoints = Setpoints::new(
        Fix32::from_int(300),
        Fix32::from_int(-300),
        Fix32::from_int(150),
        Fix32::from_int(600),
    );
    // motors stalled: the gyro never follows
    let gyro = [Fix32::ZERO; 3];
    for cycle in 0..20_000 {
        pid.update(&setpoints, gyro, 1600);
        for axis in pid.terms().axes.iter() {
            assert!(axis.i.abs() <= limit, "cycle {}: I {} beyond {}", cycle, axis.i, limit);
        }
    }
    // and it does reach the limit
    assert!(pid.terms().axes[0].i > limit - Fix32::from_int(2));
    assert!(pid.terms().axes[1].i < -limit + Fix32::from_int(2));
}

#[test]
fn test_reset_clears_integrators() {
    let mut pid = pid();
    let setpoints = Setpoints::new(Fix32::from_int(200), Fix32::ZERO, Fix32::ZERO, Fix32::from_int(500));
    for _ in 0..5_000 {
        pid.update(&setpoints, [Fix32::ZERO; 3], 1600);
    }
    assert!(pid.terms().axes[0].i > Fix32::ZERO);

    pid.reset([Fix32::ZERO; 3]);
    for axis in 0..3 {
        assert_eq!(pid.error_sum(axis), kolibri_core::fixed::Fix64::ZERO);
    }
    assert!(!pid.has_taken_off());
    assert_eq!(pid.terms().axes[0].i, Fix32::ZERO);
}
