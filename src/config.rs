//! System configuration parameters
//!
//! All tunable parameters for the bioreactor controller.  Defaults match the
//! deployed firmware; `validate()` is the gate any loader must pass through.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Upper bound on exchanges per parameter per poll.
pub const MAX_TRANSDUCER_ATTEMPTS: u8 = 8;

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Aeration ---
    /// Hours between aerator A/B flips in normal operation
    pub aeration_cycle_hours: f32,
    /// Hours between flips when booted into emergency mode
    pub emergency_cycle_hours: f32,

    // --- Dosing pump ---
    /// Minutes between automatic dosing runs
    pub pump_interval_min: u32,
    /// Minutes the pump stays on per automatic run
    pub pump_duration_min: u32,

    // --- Sensors ---
    /// Seconds between sensor poll passes
    pub sensor_poll_secs: u32,
    /// Whether the RS-485 transducer is polled at all
    pub rs485_enabled: bool,
    /// ADC full-scale reference (volts)
    pub adc_reference_volts: f32,
    /// Multiplicative trim applied after code→volts conversion
    pub adc_gain_correction: f32,
    /// Half-duplex exchange timing
    pub transducer: TransducerTiming,

    // --- Modes ---
    /// Divisor applied to every scheduler interval in demo mode
    pub demo_time_factor: u32,

    // --- Watchdog ---
    /// Task watchdog timeout (milliseconds)
    pub watchdog_timeout_ms: u32,
    /// Supervisor feed period (seconds)
    pub watchdog_feed_secs: u32,
}

/// Timing of one RS-485 request/response exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransducerTiming {
    pub baud_rate: u32,
    /// Exchanges per parameter per poll
    pub attempts: u8,
    /// Driver-enable asserted → first byte written
    pub guard_ms: u32,
    /// Last byte written → driver-enable released
    pub settle_ms: u32,
    /// Inactivity after the first received byte that ends collection
    pub idle_gap_ms: u32,
    /// Hard ceiling on the whole receive phase
    pub window_ms: u32,
    /// Pause between attempts
    pub attempt_spacing_ms: u32,
    /// Extra jitter ceiling added per attempt to guard and settle
    pub jitter_step_ms: u32,
    /// Receive polling granularity
    pub poll_ms: u32,
}

impl Default for TransducerTiming {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            attempts: 3,
            guard_ms: 2,
            settle_ms: 10,
            idle_gap_ms: 60,
            window_ms: 400,
            attempt_spacing_ms: 200,
            jitter_step_ms: 1,
            poll_ms: 2,
        }
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Aeration
            aeration_cycle_hours: 4.0,
            emergency_cycle_hours: 8.0,

            // Dosing pump
            pump_interval_min: 60,
            pump_duration_min: 5,

            // Sensors
            sensor_poll_secs: 15,
            rs485_enabled: true,
            adc_reference_volts: 3.3,
            adc_gain_correction: 1.0,
            transducer: TransducerTiming::default(),

            // Modes
            demo_time_factor: 60,

            // Watchdog
            watchdog_timeout_ms: 300_000, // 5 min
            watchdog_feed_secs: 60,
        }
    }
}

impl SystemConfig {
    /// Reject values the control loops cannot run with.  Never clamps.
    pub fn validate(&self) -> Result<(), Error> {
        if !(self.aeration_cycle_hours > 0.0) || !(self.emergency_cycle_hours > 0.0) {
            return Err(Error::Config("aeration cycle must be positive"));
        }
        if self.pump_interval_min == 0 {
            return Err(Error::Config("pump interval must be positive"));
        }
        if self.pump_duration_min == 0 || self.pump_duration_min >= self.pump_interval_min {
            return Err(Error::Config("pump duration must be shorter than interval"));
        }
        if self.sensor_poll_secs == 0 {
            return Err(Error::Config("sensor poll period must be positive"));
        }
        if !(self.adc_reference_volts > 0.0) || !(self.adc_gain_correction > 0.0) {
            return Err(Error::Config("ADC scale must be positive"));
        }
        if self.demo_time_factor == 0 {
            return Err(Error::Config("demo time factor must be at least 1"));
        }
        if self.watchdog_feed_secs == 0
            || u64::from(self.watchdog_feed_secs) * 1000 >= u64::from(self.watchdog_timeout_ms)
        {
            return Err(Error::Config("watchdog must be fed faster than it times out"));
        }

        let t = &self.transducer;
        if t.attempts == 0 || t.attempts > MAX_TRANSDUCER_ATTEMPTS {
            return Err(Error::Config("transducer attempts must be 1..=8"));
        }
        if t.baud_rate == 0 || t.poll_ms == 0 {
            return Err(Error::Config("transducer baud rate and poll step must be positive"));
        }
        if t.idle_gap_ms == 0 || t.idle_gap_ms > t.window_ms {
            return Err(Error::Config("idle gap must fit inside the receive window"));
        }
        Ok(())
    }
}
