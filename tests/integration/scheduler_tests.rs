//! Control scheduler driven by a virtual clock.

use std::cell::RefCell;
use std::rc::Rc;

use bioreactor::app::controller::{AeratorSide, DoseOutcome};
use bioreactor::app::events::AppEvent;
use bioreactor::app::ports::{ActuatorPort, Clock};
use bioreactor::config::SystemConfig;
use bioreactor::error::Error;
use bioreactor::mode::OperatingMode;
use bioreactor::scheduler::{Activities, ControlScheduler, SchedulePlan};
use bioreactor::sensors::SensorPoller;
use bioreactor::sensors::analog::{AdcScale, AnalogChannelReader};
use bioreactor::snapshot;
use bioreactor::supervisor::TaskSupervisor;
use bioreactor::transducer::TransducerClient;
use futures_lite::future::{block_on, or, yield_now};

use crate::mock_hw::{Lines, MockAdc, MockController, RecordingSink, Rig, ScriptedBus, VirtualTimebase};

fn plan(activities: Activities) -> SchedulePlan {
    SchedulePlan {
        activities,
        aeration_cycle_ms: 10_000,
        pump_interval_ms: 120_000,
        pump_duration_ms: 60_000,
        sensor_poll_ms: 5_000,
    }
}

fn rig() -> (Rc<RefCell<MockController>>, Lines) {
    Rig::new().shared()
}

#[test]
fn alternate_once_flips_between_sides() {
    let (act, rig) = rig();
    let sched = ControlScheduler::new(act.clone(), rig.time.clone(), plan(Activities::Full));
    assert_eq!(sched.alternate_once().unwrap(), AeratorSide::B);
    assert!(rig.b_energised());
    assert_eq!(sched.alternate_once().unwrap(), AeratorSide::A);
    assert!(rig.a_energised());
    assert!(!rig.b_energised());
}

#[test]
fn aeration_loop_sleeps_before_each_flip() {
    let (act, rig) = rig();
    let sched = ControlScheduler::new(act.clone(), rig.time.clone(), plan(Activities::Full));
    rig.sink.clear();

    let stop = async {
        for _ in 0..3 {
            yield_now().await;
        }
    };
    block_on(or(sched.aeration_loop(), stop));

    let flips: Vec<AeratorSide> = rig
        .sink
        .events()
        .into_iter()
        .filter_map(|e| match e {
            AppEvent::AeratorSwitched { active } => Some(active),
            _ => None,
        })
        .collect();
    let cycles = rig.time.now_ms() / 10_000;
    assert!(!flips.is_empty());
    assert_eq!(flips.len() as u64, cycles - 1);
    for (i, side) in flips.iter().enumerate() {
        let expected = if i % 2 == 0 { AeratorSide::B } else { AeratorSide::A };
        assert_eq!(*side, expected);
    }
}

#[test]
fn undisturbed_dose_runs_full_duration() {
    let (act, rig) = rig();
    let sched = ControlScheduler::new(act.clone(), rig.time.clone(), plan(Activities::Full));

    let outcome = block_on(sched.dose_cycle()).unwrap();
    assert_eq!(outcome, Some(DoseOutcome::Completed));
    assert!(!rig.pump.is_high());
    assert_eq!(rig.time.now_ms(), 60_000);
    assert_eq!(act.borrow().pump_relay().accumulated_secs(), 60);
}

#[test]
fn manual_off_mid_dose_is_respected() {
    let (act, rig) = rig();
    let sched = ControlScheduler::new(act.clone(), rig.time.clone(), plan(Activities::Full));

    let handle = act.clone();
    rig.time.at(30_000, move || handle.borrow_mut().toggle_pump().unwrap());

    let outcome = block_on(sched.dose_cycle()).unwrap();
    assert_eq!(outcome, Some(DoseOutcome::AlreadyOff));
    assert!(!rig.pump.is_high());
    assert!(!act.borrow().pump_is_on());
    assert!(rig.sink.contains(&AppEvent::DoseConflict(DoseOutcome::AlreadyOff)));
    assert_eq!(act.borrow().pump_relay().accumulated_secs(), 30);
}

#[test]
fn manual_restart_mid_dose_keeps_pump_on() {
    let (act, rig) = rig();
    let sched = ControlScheduler::new(act.clone(), rig.time.clone(), plan(Activities::Full));

    let off = act.clone();
    rig.time.at(20_000, move || off.borrow_mut().toggle_pump().unwrap());
    let on = act.clone();
    rig.time.at(40_000, move || on.borrow_mut().toggle_pump().unwrap());

    let outcome = block_on(sched.dose_cycle()).unwrap();
    assert_eq!(outcome, Some(DoseOutcome::ManualOverride));
    assert!(rig.pump.is_high());
}

#[test]
fn dose_skipped_while_pump_manually_on() {
    let (act, rig) = rig();
    act.borrow_mut().toggle_pump().unwrap();
    let sched = ControlScheduler::new(act.clone(), rig.time.clone(), plan(Activities::Full));

    assert_eq!(block_on(sched.dose_cycle()).unwrap(), None);
    assert!(rig.pump.is_high());
    assert_eq!(rig.time.now_ms(), 0);
}

fn poller() -> SensorPoller<MockAdc, ScriptedBus, VirtualTimebase, RecordingSink> {
    SensorPoller::new(
        Ok(AnalogChannelReader::new(MockAdc::default(), AdcScale::default())),
        None::<Result<TransducerClient<ScriptedBus, VirtualTimebase>, Error>>,
        snapshot::shared(),
        RecordingSink::default(),
    )
}

#[test]
fn plan_decides_which_loops_are_spawned() {
    let config = SystemConfig::default();
    for (mode, expected) in [
        (OperatingMode::Normal, 3),
        (OperatingMode::Demo, 3),
        (OperatingMode::Working, 3),
        (OperatingMode::Emergency, 1),
        (OperatingMode::Program, 0),
    ] {
        let (act, rig) = rig();
        let sched = ControlScheduler::new(act, rig.time.clone(), SchedulePlan::for_mode(&config, mode));
        let supervisor = TaskSupervisor::new();
        assert_eq!(sched.spawn_into(&supervisor, poller()).unwrap(), expected);
        assert_eq!(supervisor.running(), expected);
    }
}
