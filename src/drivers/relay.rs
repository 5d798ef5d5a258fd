//! Relay outputs with run-time accounting.
//!
//! A [`Relay`] owns one output line; a [`RelayGroup`] switches several
//! lines as one logical device (each compressor is wired to two relay
//! channels).
//!
//! ## Accounting
//!
//! Time is `u64` milliseconds from the monotonic clock, differenced with
//! `wrapping_sub`.  Energised time is folded into `accumulated_ms` only on
//! the on→off edge; live queries add the running stretch without touching
//! stored state.
//!
//! ## Failure
//!
//! A failed line write leaves the logical state exactly as it was and
//! surfaces as [`ActuatorError::GpioWriteFailed`].

use embedded_hal::digital::OutputPin;
use heapless::Vec;
use log::warn;

use crate::error::{ActuatorError, Error};

const MS_PER_HOUR: f32 = 3_600_000.0;

/// Maximum number of lines in one group.
pub const MAX_GROUP_MEMBERS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// Line HIGH energises the coil.
    ActiveHigh,
    /// Line LOW energises the coil.
    ActiveLow,
}

impl Polarity {
    fn is_high(self, energised: bool) -> bool {
        match self {
            Self::ActiveHigh => energised,
            Self::ActiveLow => !energised,
        }
    }
}

pub struct Relay<P: OutputPin> {
    pin: P,
    polarity: Polarity,
    energized_since: Option<u64>,
    accumulated_ms: u64,
}

impl<P: OutputPin> Relay<P> {
    /// Takes the line and immediately drives it to the de-energised level.
    pub fn new(pin: P, polarity: Polarity) -> Self {
        let mut relay = Self {
            pin,
            polarity,
            energized_since: None,
            accumulated_ms: 0,
        };
        if relay.drive(false).is_err() {
            warn!("Relay: could not drive line inactive at construction");
        }
        relay
    }

    fn drive(&mut self, energised: bool) -> Result<(), ActuatorError> {
        let res = if self.polarity.is_high(energised) {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        res.map_err(|_| ActuatorError::GpioWriteFailed)
    }

    /// Energise.  Returns `true` if this call changed the state; a repeat
    /// call re-asserts the line but keeps `energized_since`.
    pub fn on(&mut self, now_ms: u64) -> Result<bool, ActuatorError> {
        self.drive(true)?;
        if self.energized_since.is_some() {
            return Ok(false);
        }
        self.energized_since = Some(now_ms);
        Ok(true)
    }

    /// De-energise.  Returns `true` if this call changed the state.
    pub fn off(&mut self, now_ms: u64) -> Result<bool, ActuatorError> {
        self.drive(false)?;
        match self.energized_since.take() {
            Some(since) => {
                self.accumulated_ms = self
                    .accumulated_ms
                    .saturating_add(now_ms.wrapping_sub(since));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn toggle(&mut self, now_ms: u64) -> Result<bool, ActuatorError> {
        if self.is_on() {
            self.off(now_ms)
        } else {
            self.on(now_ms)
        }
    }

    pub fn is_on(&self) -> bool {
        self.energized_since.is_some()
    }

    pub fn energized_since(&self) -> Option<u64> {
        self.energized_since
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    /// Finalised energised time, whole seconds.
    pub fn accumulated_secs(&self) -> u64 {
        self.accumulated_ms / 1000
    }

    /// Finalised plus live energised time.
    pub fn active_ms(&self, now_ms: u64) -> u64 {
        let live = self
            .energized_since
            .map_or(0, |since| now_ms.wrapping_sub(since));
        self.accumulated_ms.saturating_add(live)
    }

    pub fn hours(&self, now_ms: u64) -> f32 {
        self.active_ms(now_ms) as f32 / MS_PER_HOUR
    }
}

/// Several relays behaving as one actuator.
pub struct RelayGroup<P: OutputPin> {
    members: Vec<Relay<P>, MAX_GROUP_MEMBERS>,
}

impl<P: OutputPin> RelayGroup<P> {
    pub fn from_relays(relays: impl IntoIterator<Item = Relay<P>>) -> Result<Self, Error> {
        let mut members = Vec::new();
        for r in relays {
            if members.push(r).is_err() {
                return Err(Error::Init("relay group over capacity"));
            }
        }
        Ok(Self { members })
    }

    /// Apply `op` to every member even if one fails; report the first failure.
    fn fan_out(
        &mut self,
        now_ms: u64,
        op: fn(&mut Relay<P>, u64) -> Result<bool, ActuatorError>,
    ) -> Result<bool, ActuatorError> {
        let mut changed = false;
        let mut first_err = None;
        for relay in &mut self.members {
            match op(relay, now_ms) {
                Ok(c) => changed |= c,
                Err(e) => {
                    first_err.get_or_insert(e);
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(changed),
        }
    }

    pub fn on(&mut self, now_ms: u64) -> Result<bool, ActuatorError> {
        self.fan_out(now_ms, Relay::on)
    }

    pub fn off(&mut self, now_ms: u64) -> Result<bool, ActuatorError> {
        self.fan_out(now_ms, Relay::off)
    }

    pub fn toggle(&mut self, now_ms: u64) -> Result<bool, ActuatorError> {
        if self.is_on() {
            self.off(now_ms)
        } else {
            self.on(now_ms)
        }
    }

    /// Logically on if any member is.
    pub fn is_on(&self) -> bool {
        self.members.iter().any(Relay::is_on)
    }

    /// Mean of the members' hours; 0.0 for an empty group.
    pub fn hours(&self, now_ms: u64) -> f32 {
        if self.members.is_empty() {
            return 0.0;
        }
        let total: f32 = self.members.iter().map(|r| r.hours(now_ms)).sum();
        total / self.members.len() as f32
    }

    pub fn members(&self) -> &[Relay<P>] {
        &self.members
    }
}
