//! Control scheduler: the periodic activities of the core.
//!
//! Three independent loops, each with its own sleep, multiplexed on the
//! cooperative executor:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Periodic activities                      │
//! │                                                              │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────────┐  │
//! │  │  Aeration    │   │  Dosing      │   │  Sensor poll     │  │
//! │  │  sleep, flip │   │  sleep, dose │   │  poll, sleep     │  │
//! │  └──────┬───────┘   └──────┬───────┘   └────────┬─────────┘  │
//! │         │                  │                    │            │
//! │         ▼                  ▼                    ▼            │
//! │     ActuatorPort       ActuatorPort       ReadingsSnapshot   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Which loops run is decided once at boot by the [`OperatingMode`]:
//! emergency runs aeration only (on its own long cycle), program mode runs
//! nothing.  Demo mode divides every interval by the demo factor.

use core::cell::RefCell;
use std::rc::Rc;

use log::{info, warn};

use crate::app::controller::{AeratorSide, DoseOutcome};
use crate::app::ports::{ActuatorPort, AdcPort, EventSink, SerialBus, Timebase};
use crate::config::SystemConfig;
use crate::error::{ActuatorError, Error};
use crate::mode::OperatingMode;
use crate::sensors::SensorPoller;
use crate::supervisor::TaskSupervisor;

/// No scaled interval drops below this.
pub const MIN_INTERVAL_MS: u64 = 1_000;

const MS_PER_HOUR: f64 = 3_600_000.0;
const MS_PER_MIN: u64 = 60_000;

/// Which loops a mode runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activities {
    /// Aeration, dosing and sensor polling.
    Full,
    /// Aeration alternation only.
    AerationOnly,
    /// Nothing.
    Idle,
}

/// Intervals resolved for one boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulePlan {
    pub activities: Activities,
    pub aeration_cycle_ms: u64,
    pub pump_interval_ms: u64,
    pub pump_duration_ms: u64,
    pub sensor_poll_ms: u64,
}

fn scaled(ms: u64, factor: u32) -> u64 {
    (ms / u64::from(factor.max(1))).max(MIN_INTERVAL_MS)
}

fn hours_to_ms(hours: f32) -> u64 {
    (f64::from(hours) * MS_PER_HOUR) as u64
}

impl SchedulePlan {
    pub fn for_mode(config: &SystemConfig, mode: OperatingMode) -> Self {
        let factor = mode.time_factor(config.demo_time_factor);
        let (activities, cycle_hours) = match mode {
            OperatingMode::Normal | OperatingMode::Demo | OperatingMode::Working => {
                (Activities::Full, config.aeration_cycle_hours)
            }
            OperatingMode::Emergency => (Activities::AerationOnly, config.emergency_cycle_hours),
            OperatingMode::Program => (Activities::Idle, config.aeration_cycle_hours),
        };
        Self {
            activities,
            aeration_cycle_ms: scaled(hours_to_ms(cycle_hours), factor),
            pump_interval_ms: scaled(u64::from(config.pump_interval_min) * MS_PER_MIN, factor),
            pump_duration_ms: scaled(u64::from(config.pump_duration_min) * MS_PER_MIN, factor),
            sensor_poll_ms: scaled(u64::from(config.sensor_poll_secs) * 1000, factor),
        }
    }
}

pub struct ControlScheduler<A: ActuatorPort, T: Timebase> {
    actuators: Rc<RefCell<A>>,
    timebase: T,
    plan: SchedulePlan,
}

impl<A: ActuatorPort, T: Timebase> ControlScheduler<A, T> {
    pub fn new(actuators: Rc<RefCell<A>>, timebase: T, plan: SchedulePlan) -> Self {
        Self {
            actuators,
            timebase,
            plan,
        }
    }

    pub fn plan(&self) -> &SchedulePlan {
        &self.plan
    }

    /// Flip the running aerator once.
    pub fn alternate_once(&self) -> Result<AeratorSide, ActuatorError> {
        let mut act = self.actuators.borrow_mut();
        let next = act.aerator_state().other();
        act.set_aerator_pair(next == AeratorSide::A)?;
        Ok(next)
    }

    /// Sleep a cycle, then flip.  Side A was selected at construction.
    pub async fn aeration_loop(&self) {
        info!(
            "Scheduler: aeration alternation every {}s",
            self.plan.aeration_cycle_ms / 1000
        );
        loop {
            self.timebase.sleep_ms(self.plan.aeration_cycle_ms).await;
            match self.alternate_once() {
                Ok(side) => info!("Scheduler: aerator {} running", side),
                Err(e) => warn!("Scheduler: aerator switch failed: {}", e),
            }
        }
    }

    /// One automatic dose: on, wait the duration, off unless overridden.
    /// `Ok(None)` if the pump was already on and the dose was skipped.
    pub async fn dose_cycle(&self) -> Result<Option<DoseOutcome>, ActuatorError> {
        let started = self.actuators.borrow_mut().begin_auto_dose()?;
        if !started {
            info!("Scheduler: pump already on, dose skipped");
            return Ok(None);
        }
        info!(
            "Scheduler: auto dose on for {}s",
            self.plan.pump_duration_ms / 1000
        );
        self.timebase.sleep_ms(self.plan.pump_duration_ms).await;
        let outcome = self.actuators.borrow_mut().end_auto_dose()?;
        Ok(Some(outcome))
    }

    pub async fn dosing_loop(&self) {
        info!(
            "Scheduler: dosing every {}s for {}s",
            self.plan.pump_interval_ms / 1000,
            self.plan.pump_duration_ms / 1000
        );
        loop {
            self.timebase.sleep_ms(self.plan.pump_interval_ms).await;
            match self.dose_cycle().await {
                Ok(Some(DoseOutcome::Completed)) => info!("Scheduler: auto dose complete"),
                Ok(Some(other)) => warn!("Scheduler: auto dose ended as {:?}", other),
                Ok(None) => {}
                Err(e) => warn!("Scheduler: auto dose failed: {}", e),
            }
        }
    }

    /// Poll, then sleep.  Owns the poller for the life of the loop.
    pub async fn sensor_loop<D, B, T2, S>(&self, mut poller: SensorPoller<D, B, T2, S>)
    where
        D: AdcPort,
        B: SerialBus,
        T2: Timebase,
        S: EventSink,
    {
        info!(
            "Scheduler: sensor poll every {}s",
            self.plan.sensor_poll_ms / 1000
        );
        loop {
            let s = poller.poll_once().await;
            info!(
                "Scheduler: poll analog {}/{} serial {}/{}",
                s.analog_updated,
                s.analog_updated + s.analog_missing,
                s.serial_updated,
                s.serial_updated + s.serial_missing
            );
            self.timebase.sleep_ms(self.plan.sensor_poll_ms).await;
        }
    }

    /// Spawn the loops the plan calls for.  Returns how many were started.
    pub fn spawn_into<'a, D, B, T2, S>(
        &'a self,
        supervisor: &TaskSupervisor<'a>,
        poller: SensorPoller<D, B, T2, S>,
    ) -> Result<usize, Error>
    where
        D: AdcPort + 'a,
        B: SerialBus + 'a,
        T2: Timebase + 'a,
        S: EventSink + 'a,
    {
        match self.plan.activities {
            Activities::Idle => {
                info!("Scheduler: no core tasks in this mode");
                Ok(0)
            }
            Activities::AerationOnly => {
                supervisor.spawn("aeration", self.aeration_loop())?;
                Ok(1)
            }
            Activities::Full => {
                supervisor.spawn("aeration", self.aeration_loop())?;
                supervisor.spawn("dosing", self.dosing_loop())?;
                supervisor.spawn("sensors", self.sensor_loop(poller))?;
                Ok(3)
            }
        }
    }
}
