//! Outbound application events.
//!
//! The controller, poller and supervisor emit these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log to serial, or record them in a
//! test spy.

use crate::app::controller::{AeratorSide, DoseOutcome, PumpOrigin};
use crate::error::{ActuatorError, Error};
use crate::mode::OperatingMode;
use crate::snapshot::SensorGroup;

/// Physical actuator named in a fault report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actuator {
    AeratorA,
    AeratorB,
    Pump,
}

/// Sensor subsystem that can be switched off at start-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subsystem {
    Analog,
    Transducer,
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Boot mode decoded from the selector switches.
    ModeSelected(OperatingMode),

    /// Controller reached its deterministic start state.
    Started { aerator: AeratorSide, pump_on: bool },

    /// The running aerator changed.
    AeratorSwitched { active: AeratorSide },

    /// The pump changed state.
    PumpChanged { on: bool, origin: PumpOrigin },

    /// An automatic dose was not started because the pump was already on.
    DoseSkipped,

    /// An automatic dose found a manual action in its way and left it alone.
    DoseConflict(DoseOutcome),

    /// An output line refused a command.
    ActuatorFault {
        actuator: Actuator,
        error: ActuatorError,
    },

    /// A sensor subsystem failed to initialise and is off for good.
    SubsystemDisabled { subsystem: Subsystem, reason: Error },

    /// One poll pass finished for a sensor group.
    ReadingsUpdated {
        group: SensorGroup,
        updated: u8,
        missing: u8,
    },

    /// A supervised task returned.
    TaskExited { name: &'static str },
}
