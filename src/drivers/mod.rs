//! Relay drivers, the operator button, hardware initialisation and the
//! task watchdog.

pub mod button;
pub mod hw_init;
pub mod relay;
pub mod watchdog;
