//! Actuator controller: aerator mutual exclusion, pump ownership and
//! run-hour accounting against mock relay lines.

use bioreactor::app::controller::{AeratorSide, DoseOutcome, PumpOrigin};
use bioreactor::app::events::{Actuator, AppEvent};
use bioreactor::app::ports::ActuatorPort;
use bioreactor::error::ActuatorError;

use crate::mock_hw::Rig;

#[test]
fn starts_with_aerator_a_and_pump_off() {
    let rig = Rig::new();
    assert!(rig.a_energised());
    assert!(!rig.b_energised());
    assert!(!rig.pump.is_high());
    assert_eq!(rig.controller.aerator_state(), AeratorSide::A);
    assert!(rig.sink.contains(&AppEvent::Started {
        aerator: AeratorSide::A,
        pump_on: false,
    }));
}

#[test]
fn switching_keeps_exactly_one_aerator_running() {
    let mut rig = Rig::new();
    rig.controller.set_aerator_pair(false).unwrap();
    assert!(!rig.a_energised());
    assert!(rig.b_energised());
    assert_eq!(rig.controller.aerator_state(), AeratorSide::B);

    rig.controller.set_aerator_pair(true).unwrap();
    assert!(rig.a_energised());
    assert!(!rig.b_energised());
}

#[test]
fn reselecting_running_side_emits_nothing() {
    let mut rig = Rig::new();
    rig.sink.clear();
    rig.controller.set_aerator_pair(true).unwrap();
    assert!(rig.sink.events().is_empty());
}

#[test]
fn failed_incoming_side_leaves_outgoing_running() {
    let mut rig = Rig::new();
    rig.aerator_b[0].set_failing(true);
    let err = rig.controller.set_aerator_pair(false).unwrap_err();
    assert_eq!(err, ActuatorError::GpioWriteFailed);
    assert!(rig.a_energised());
    assert!(!rig.aerator_b[1].is_high());
    assert_eq!(rig.controller.aerator_state(), AeratorSide::A);
    assert!(rig.sink.contains(&AppEvent::ActuatorFault {
        actuator: Actuator::AeratorB,
        error: ActuatorError::GpioWriteFailed,
    }));
}

#[test]
fn fault_reasserting_running_side_keeps_it_energised() {
    let mut rig = Rig::new();
    rig.aerator_a[0].set_failing(true);
    let _ = rig.controller.set_aerator_pair(true);

    assert!(rig.aerator_a[0].is_high());
    assert!(rig.aerator_a[1].is_high());
    assert!(!rig.b_energised());
    assert!(rig.controller.aerator_a_on());
    assert_eq!(rig.controller.aerator_state(), AeratorSide::A);
}

#[test]
fn manual_toggle_owns_the_pump() {
    let mut rig = Rig::new();
    rig.controller.toggle_pump().unwrap();
    assert!(rig.pump.is_high());
    assert!(rig.controller.pump_is_on());
    assert_eq!(rig.controller.pump_origin(), Some(PumpOrigin::Manual));

    rig.controller.toggle_pump().unwrap();
    assert!(!rig.pump.is_high());
    assert_eq!(rig.controller.pump_origin(), None);
}

#[test]
fn failed_pump_write_keeps_logical_state() {
    let mut rig = Rig::new();
    rig.pump.set_failing(true);
    assert!(rig.controller.toggle_pump().is_err());
    assert!(!rig.controller.pump_is_on());
}

#[test]
fn auto_dose_skipped_when_pump_already_on() {
    let mut rig = Rig::new();
    rig.controller.toggle_pump().unwrap();
    assert!(!rig.controller.begin_auto_dose().unwrap());
    assert!(rig.sink.contains(&AppEvent::DoseSkipped));
    assert_eq!(rig.controller.pump_origin(), Some(PumpOrigin::Manual));
}

#[test]
fn auto_dose_completes_when_undisturbed() {
    let mut rig = Rig::new();
    assert!(rig.controller.begin_auto_dose().unwrap());
    assert_eq!(rig.controller.pump_origin(), Some(PumpOrigin::Automatic));
    rig.time.advance(5_000);
    assert_eq!(rig.controller.end_auto_dose().unwrap(), DoseOutcome::Completed);
    assert!(!rig.pump.is_high());
    assert_eq!(rig.controller.pump_relay().accumulated_secs(), 5);
}

#[test]
fn manual_off_during_dose_is_not_clobbered() {
    let mut rig = Rig::new();
    rig.controller.begin_auto_dose().unwrap();
    rig.controller.toggle_pump().unwrap();
    assert_eq!(rig.controller.end_auto_dose().unwrap(), DoseOutcome::AlreadyOff);
    assert!(!rig.pump.is_high());
    assert!(rig.sink.contains(&AppEvent::DoseConflict(DoseOutcome::AlreadyOff)));
}

#[test]
fn manual_off_then_on_during_dose_stays_on() {
    let mut rig = Rig::new();
    rig.controller.begin_auto_dose().unwrap();
    rig.controller.toggle_pump().unwrap();
    rig.controller.toggle_pump().unwrap();
    assert_eq!(
        rig.controller.end_auto_dose().unwrap(),
        DoseOutcome::ManualOverride
    );
    assert!(rig.pump.is_high());
    assert_eq!(rig.controller.pump_origin(), Some(PumpOrigin::Manual));
}

#[test]
fn run_hours_track_each_aerator() {
    let mut rig = Rig::new();
    rig.time.advance(3_600_000);
    rig.controller.set_aerator_pair(false).unwrap();
    rig.time.advance(1_800_000);

    let hours = rig.controller.run_hours();
    assert!((hours.aerator_a - 1.0).abs() < 1e-4);
    assert!((hours.aerator_b - 0.5).abs() < 1e-4);
    assert_eq!(hours.pump, 0.0);
}
