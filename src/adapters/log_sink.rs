//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART console in production, stderr on the host).
//! Every line starts with a fixed tag so the console can be grepped.

use log::{error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::ModeSelected(mode) => {
                info!("MODE  | {}", mode);
            }
            AppEvent::Started { aerator, pump_on } => {
                info!("START | aerator={} pump={}", aerator, if *pump_on { "ON" } else { "OFF" });
            }
            AppEvent::AeratorSwitched { active } => {
                info!("AERO  | active={}", active);
            }
            AppEvent::PumpChanged { on, origin } => {
                info!("PUMP  | {} origin={:?}", if *on { "ON" } else { "OFF" }, origin);
            }
            AppEvent::DoseSkipped => {
                info!("DOSE  | skipped, pump already on");
            }
            AppEvent::DoseConflict(outcome) => {
                warn!("DOSE  | conflict, ended as {:?}", outcome);
            }
            AppEvent::ActuatorFault { actuator, error: e } => {
                error!("FAULT | {:?}: {}", actuator, e);
            }
            AppEvent::SubsystemDisabled { subsystem, reason } => {
                error!("SENS  | {:?} disabled: {}", subsystem, reason);
            }
            AppEvent::ReadingsUpdated { group, updated, missing } => {
                if *missing > 0 {
                    warn!("SENS  | {} updated={} missing={}", group.name(), updated, missing);
                } else {
                    info!("SENS  | {} updated={}", group.name(), updated);
                }
            }
            AppEvent::TaskExited { name } => {
                error!("TASK  | '{}' exited", name);
            }
        }
    }
}
