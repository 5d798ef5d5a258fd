//! Status report: the read-only view handed to the display and to the
//! HTTP `/api/status` collaborator.

use serde::Serialize;

use crate::app::controller::{AeratorSide, RunHours};
use crate::app::ports::ActuatorPort;
use crate::mode::OperatingMode;
use crate::snapshot::ReadingsSnapshot;

#[derive(Debug, Serialize)]
pub struct StatusReport<'a> {
    pub mode: OperatingMode,
    pub pump_on: bool,
    pub aerator: AeratorSide,
    pub hours: RunHours,
    pub readings: &'a ReadingsSnapshot,
}

impl<'a> StatusReport<'a> {
    pub fn build(
        mode: OperatingMode,
        actuators: &impl ActuatorPort,
        readings: &'a ReadingsSnapshot,
    ) -> Self {
        Self {
            mode,
            pump_on: actuators.pump_is_on(),
            aerator: actuators.aerator_state(),
            hours: actuators.run_hours(),
            readings,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
