//! Actuator controller: aerator A/B pair plus the dosing pump.
//!
//! ## Aeration
//!
//! Exactly one aerator runs at a time.  Switching is make-before-break:
//! the incoming side is energised first, and if that fails the outgoing
//! side is left running so the tank is never without air.
//!
//! ## Pump ownership
//!
//! Every pump "on" period is tagged with who started it.  An automatic dose
//! only switches the pump off if it is still on *and* still tagged
//! automatic; anything else is a conflict that is reported and left alone.

use core::fmt;

use embedded_hal::digital::OutputPin;
use log::warn;
use serde::Serialize;

use crate::app::events::{Actuator, AppEvent};
use crate::app::ports::{ActuatorPort, Clock, EventSink};
use crate::drivers::relay::{Relay, RelayGroup};
use crate::error::ActuatorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AeratorSide {
    A,
    B,
}

impl AeratorSide {
    pub fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}

impl fmt::Display for AeratorSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::A => "A",
            Self::B => "B",
        })
    }
}

/// Who switched the pump on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PumpOrigin {
    Manual,
    Automatic,
}

/// How an automatic dose ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoseOutcome {
    /// The automation switched the pump off.
    Completed,
    /// Someone already switched it off.
    AlreadyOff,
    /// Someone switched it off and back on; it now belongs to them.
    ManualOverride,
}

/// Live run-hour counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RunHours {
    pub aerator_a: f32,
    pub aerator_b: f32,
    pub pump: f32,
}

pub struct ActuatorController<P: OutputPin, C: Clock, S: EventSink> {
    aerator_a: RelayGroup<P>,
    aerator_b: RelayGroup<P>,
    pump: Relay<P>,
    active: AeratorSide,
    pump_origin: Option<PumpOrigin>,
    clock: C,
    sink: S,
}

impl<P: OutputPin, C: Clock, S: EventSink> ActuatorController<P, C, S> {
    /// Force everything off, then select aerator A.  Line failures are
    /// reported through the sink; construction itself never fails.
    pub fn new(
        aerator_a: RelayGroup<P>,
        aerator_b: RelayGroup<P>,
        pump: Relay<P>,
        clock: C,
        sink: S,
    ) -> Self {
        let mut ctl = Self {
            aerator_a,
            aerator_b,
            pump,
            active: AeratorSide::A,
            pump_origin: None,
            clock,
            sink,
        };

        let now = ctl.clock.now_ms();
        if let Err(e) = ctl.aerator_a.off(now) {
            ctl.fault(Actuator::AeratorA, e);
        }
        if let Err(e) = ctl.aerator_b.off(now) {
            ctl.fault(Actuator::AeratorB, e);
        }
        if let Err(e) = ctl.pump.off(now) {
            ctl.fault(Actuator::Pump, e);
        }
        // Fault already reported.
        let _ = ctl.switch_to(AeratorSide::A);

        ctl.sink.emit(&AppEvent::Started {
            aerator: ctl.active,
            pump_on: ctl.pump.is_on(),
        });
        ctl
    }

    fn fault(&mut self, actuator: Actuator, error: ActuatorError) {
        warn!("Actuator {:?}: {}", actuator, error);
        self.sink.emit(&AppEvent::ActuatorFault { actuator, error });
    }

    fn group(&mut self, side: AeratorSide) -> (&mut RelayGroup<P>, Actuator) {
        match side {
            AeratorSide::A => (&mut self.aerator_a, Actuator::AeratorA),
            AeratorSide::B => (&mut self.aerator_b, Actuator::AeratorB),
        }
    }

    fn switch_to(&mut self, target: AeratorSide) -> Result<bool, ActuatorError> {
        let now = self.clock.now_ms();

        let reassert = target == self.active;
        let (incoming, id) = self.group(target);
        let started = match incoming.on(now) {
            Ok(c) => c,
            Err(e) => {
                // A side that was not running releases any member that
                // latched; the running side stays energised.
                if !reassert {
                    let _ = incoming.off(now);
                }
                self.fault(id, e);
                return Err(e);
            }
        };
        self.active = target;

        let (outgoing, id) = self.group(target.other());
        let stopped = match outgoing.off(now) {
            Ok(c) => c,
            Err(e) => {
                self.fault(id, e);
                return Err(e);
            }
        };
        Ok(started || stopped)
    }

    /// Current pump owner, `None` while off.
    pub fn pump_origin(&self) -> Option<PumpOrigin> {
        self.pump_origin
    }

    pub fn aerator_a_on(&self) -> bool {
        self.aerator_a.is_on()
    }

    pub fn aerator_b_on(&self) -> bool {
        self.aerator_b.is_on()
    }

    pub fn pump_relay(&self) -> &Relay<P> {
        &self.pump
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}

impl<P: OutputPin, C: Clock, S: EventSink> ActuatorPort for ActuatorController<P, C, S> {
    fn set_aerator_pair(&mut self, primary_on: bool) -> Result<(), ActuatorError> {
        let target = if primary_on {
            AeratorSide::A
        } else {
            AeratorSide::B
        };
        if self.switch_to(target)? {
            self.sink.emit(&AppEvent::AeratorSwitched { active: target });
        }
        Ok(())
    }

    fn aerator_state(&self) -> AeratorSide {
        self.active
    }

    fn toggle_pump(&mut self) -> Result<(), ActuatorError> {
        let now = self.clock.now_ms();
        if let Err(e) = self.pump.toggle(now) {
            self.fault(Actuator::Pump, e);
            return Err(e);
        }
        let on = self.pump.is_on();
        self.pump_origin = on.then_some(PumpOrigin::Manual);
        self.sink.emit(&AppEvent::PumpChanged {
            on,
            origin: PumpOrigin::Manual,
        });
        Ok(())
    }

    fn pump_is_on(&self) -> bool {
        self.pump.is_on()
    }

    fn begin_auto_dose(&mut self) -> Result<bool, ActuatorError> {
        if self.pump.is_on() {
            self.sink.emit(&AppEvent::DoseSkipped);
            return Ok(false);
        }
        let now = self.clock.now_ms();
        if let Err(e) = self.pump.on(now) {
            self.fault(Actuator::Pump, e);
            return Err(e);
        }
        self.pump_origin = Some(PumpOrigin::Automatic);
        self.sink.emit(&AppEvent::PumpChanged {
            on: true,
            origin: PumpOrigin::Automatic,
        });
        Ok(true)
    }

    fn end_auto_dose(&mut self) -> Result<DoseOutcome, ActuatorError> {
        let outcome = match (self.pump.is_on(), self.pump_origin) {
            (true, Some(PumpOrigin::Automatic)) => {
                let now = self.clock.now_ms();
                if let Err(e) = self.pump.off(now) {
                    self.fault(Actuator::Pump, e);
                    return Err(e);
                }
                self.pump_origin = None;
                self.sink.emit(&AppEvent::PumpChanged {
                    on: false,
                    origin: PumpOrigin::Automatic,
                });
                return Ok(DoseOutcome::Completed);
            }
            (false, _) => DoseOutcome::AlreadyOff,
            (true, _) => DoseOutcome::ManualOverride,
        };
        warn!("Dosing: end of dose found {:?}, pump left as is", outcome);
        self.sink.emit(&AppEvent::DoseConflict(outcome));
        Ok(outcome)
    }

    fn run_hours(&self) -> RunHours {
        let now = self.clock.now_ms();
        RunHours {
            aerator_a: self.aerator_a.hours(now),
            aerator_b: self.aerator_b.hours(now),
            pump: self.pump.hours(now),
        }
    }
}
