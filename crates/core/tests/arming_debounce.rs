//! Arming debounce and forced disarm

use kolibri_core::ahrs::Navigation;
use kolibri_core::arming::{
    ArmingDisableFlags, ArmingEvent, ArmingInput, ArmingSupervisor, DisarmReason,
    ARMING_DEBOUNCE_CYCLES, LINK_LOSS_TIMEOUT_US,
};
use kolibri_core::control::{FlightMode, RcChannels};

fn channels(arm: u16, throttle: u16) -> RcChannels {
    let mut rc = RcChannels::default();
    rc.link_up = true;
    rc.link_quality = 100;
    rc.set_channel(RcChannels::ARM, arm);
    rc.set_channel(RcChannels::THROTTLE, throttle);
    rc
}

fn evaluate(sup: &mut ArmingSupervisor, rc: &RcChannels, mode: FlightMode) -> Option<ArmingEvent> {
    let nav = Navigation::default();
    sup.update(&ArmingInput {
        rc,
        flight_mode: mode,
        gyro_calibrated: true,
        configurator_override: false,
        navigation: &nav,
    })
}

#[test]
fn test_single_bad_cycle_restarts_count() {
    let mut sup = ArmingSupervisor::new();
    let off = channels(1000, 1000);
    let on = channels(2000, 1000);
    let throttle_up = channels(2000, 1200);

    evaluate(&mut sup, &off, FlightMode::Acro);
    for _ in 0..ARMING_DEBOUNCE_CYCLES - 1 {
        evaluate(&mut sup, &on, FlightMode::Acro);
    }
    // one disqualifying cycle just before the count completes
    evaluate(&mut sup, &throttle_up, FlightMode::Acro);
    assert!(!sup.armed());
    assert!(sup.flags().contains(ArmingDisableFlags::THROTTLE));

    for _ in 0..ARMING_DEBOUNCE_CYCLES - 1 {
        evaluate(&mut sup, &on, FlightMode::Acro);
        assert!(!sup.armed());
    }
    let event = evaluate(&mut sup, &on, FlightMode::Acro);
    assert!(matches!(event, Some(ArmingEvent::Armed(_))));
}

#[test]
fn test_disallowed_mode_blocks() {
    let mut sup = ArmingSupervisor::new();
    evaluate(&mut sup, &channels(1000, 1000), FlightMode::AltHold);
    let on = channels(2000, 1000);
    for _ in 0..3 * ARMING_DEBOUNCE_CYCLES {
        evaluate(&mut sup, &on, FlightMode::AltHold);
    }
    assert!(!sup.armed());
    assert_eq!(sup.flags().dominant_reason(), "flight mode");
}

#[test]
fn test_link_loss_disarms_on_first_evaluation() {
    let mut sup = ArmingSupervisor::new();
    evaluate(&mut sup, &channels(1000, 1000), FlightMode::Acro);
    let on = channels(2000, 1000);
    for _ in 0..ARMING_DEBOUNCE_CYCLES {
        evaluate(&mut sup, &on, FlightMode::Acro);
    }
    assert!(sup.armed());

    let mut lost = on;
    lost.since_last_message_us = LINK_LOSS_TIMEOUT_US - 1;
    assert_eq!(evaluate(&mut sup, &lost, FlightMode::Acro), None);
    lost.since_last_message_us = LINK_LOSS_TIMEOUT_US;
    assert_eq!(
        evaluate(&mut sup, &lost, FlightMode::Acro),
        Some(ArmingEvent::Disarmed(DisarmReason::LinkLoss))
    );
    assert!(!sup.armed());
    assert_eq!(sup.last_disarm_reason(), Some(DisarmReason::LinkLoss));

    // link back with the switch still on: stays disarmed
    for _ in 0..3 * ARMING_DEBOUNCE_CYCLES {
        evaluate(&mut sup, &on, FlightMode::Acro);
    }
    assert!(!sup.armed());
}
