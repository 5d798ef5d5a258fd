//! Application core: pure domain logic, zero I/O.
//!
//! Actuator orchestration, command ingress, and the status view.  All
//! interaction with hardware happens through **port traits** defined in
//! [`ports`], keeping this layer fully testable without real peripherals.

pub mod commands;
pub mod controller;
pub mod events;
pub mod ports;
pub mod status;
