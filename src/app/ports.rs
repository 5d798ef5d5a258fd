//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ controller / client / scheduler (domain)
//! ```
//!
//! Driven adapters (ADC, RS-485 bus, relays, event sinks, display, time)
//! implement these traits.  The domain consumes them via generics, so it
//! never touches hardware directly and every loop runs against mocks on
//! the host.

use core::future::Future;

use crate::app::controller::{AeratorSide, DoseOutcome, RunHours};
use crate::app::status::StatusReport;
use crate::error::{ActuatorError, BusError, SensorError};

// ───────────────────────────────────────────────────────────────
// Time
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock.  Never adjusted by wall-clock sync.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Clock plus a cooperative sleep.  Every suspension point in the core
/// goes through `sleep_ms`, so a virtual implementation drives the whole
/// system deterministically in tests.
pub trait Timebase: Clock {
    fn sleep_ms(&self, ms: u64) -> impl Future<Output = ()>;
}

// ───────────────────────────────────────────────────────────────
// Sensor ports (driven adapters: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Raw one-shot ADC access.
pub trait AdcPort {
    /// Read the raw code of ADC1 `channel`.
    fn read_raw(&mut self, channel: u32) -> Result<u16, SensorError>;
}

/// Half-duplex serial line with a driver-enable signal.
///
/// The transducer client is the only owner; nothing else may assert the
/// driver-enable line.
pub trait SerialBus {
    /// Discard anything sitting in the receive FIFO.
    fn flush_input(&mut self) -> Result<(), BusError>;

    /// `true` puts the transceiver in transmit mode, `false` in receive.
    fn set_driver_enable(&mut self, transmit: bool) -> Result<(), BusError>;

    /// Queue `frame` and block until it has left the shift register.
    fn write_all(&mut self, frame: &[u8]) -> Result<(), BusError>;

    /// Non-blocking: copy whatever has arrived into `buf`.
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, BusError>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven by scheduler, button, and network commands)
// ───────────────────────────────────────────────────────────────

/// Command surface of the actuator controller.
pub trait ActuatorPort {
    /// Energise the selected aerator and release the other.
    fn set_aerator_pair(&mut self, primary_on: bool) -> Result<(), ActuatorError>;

    /// Which aerator is currently running.
    fn aerator_state(&self) -> AeratorSide;

    /// Manual pump toggle (button, HTTP).
    fn toggle_pump(&mut self) -> Result<(), ActuatorError>;

    fn pump_is_on(&self) -> bool;

    /// Start an automatic dose.  `Ok(false)` if the pump was already on.
    fn begin_auto_dose(&mut self) -> Result<bool, ActuatorError>;

    /// Finish an automatic dose, unless a manual actor got there first.
    fn end_auto_dose(&mut self) -> Result<DoseOutcome, ActuatorError>;

    /// Live run-hour counters.
    fn run_hours(&self) -> RunHours;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Display port
// ───────────────────────────────────────────────────────────────

/// Something that can show a [`StatusReport`].  The LCD driver lives
/// outside this crate; [`NullDisplay`](crate::adapters::display::NullDisplay)
/// stands in when no panel answers the probe.
pub trait DisplayPort {
    fn render(&mut self, report: &StatusReport<'_>);

    /// Short name for logs.
    fn name(&self) -> &'static str {
        "panel"
    }
}

// ───────────────────────────────────────────────────────────────
// Watchdog port
// ───────────────────────────────────────────────────────────────

/// Task watchdog.  Only the supervisor's top-level loop feeds it.
pub trait WatchdogPort {
    fn feed(&mut self);
}
