//! Bioreactor controller firmware library.
//!
//! Exposes the pure-logic modules for integration testing.  All
//! ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module and falls back to a host simulation otherwise.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod mode;
pub mod pins;
pub mod scheduler;
pub mod snapshot;
pub mod supervisor;
pub mod transducer;

pub mod adapters;
pub mod drivers;
pub mod esp_link_shims;
pub mod sensors;
