//! RS-485 transducer client.
//!
//! One exchange walks this state machine:
//!
//! ```text
//!  Idle ─▶ DriveEnabled ─▶ Transmitting ─▶ ReceiveEnabled ─▶ Collecting ─▶ Decoding ─┬▶ Accepted
//!          flush + DE on    write + settle   DE off            budget / idle /       └▶ Rejected
//!                                                              window
//! ```
//!
//! A parameter is sampled `attempts` times per poll; survivors of frame
//! validation, CRC, decoding and range checks are reduced to their median.
//! The receive phase is the only bounded wait, so a silent transducer can
//! never hold the poll loop past `window_ms`.

use heapless::Vec;
use log::{debug, warn};

use crate::app::ports::{SerialBus, Timebase};
use crate::config::{MAX_TRANSDUCER_ATTEMPTS, TransducerTiming};
use crate::error::TransducerError;

use super::decode::decode_with_fallback;
use super::frame::{ReadRequest, parse_response};

/// Largest response the client will buffer.
pub const MAX_FRAME: usize = 64;
/// Maximum parameters tracked by one client.
pub const MAX_PARAMETERS: usize = 8;

/// Default slave address of the level/temperature transducer.
pub const TRANSDUCER_SLAVE: u8 = 0x01;

/// One logical reading served by the transducer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransducerParameter {
    pub name: &'static str,
    pub request: ReadRequest,
    /// Inclusive; decoded values outside are discarded, never clamped.
    pub valid_range: (f32, f32),
    /// Treat a decoded ~0.0 as "no reading".
    pub reject_zero: bool,
}

pub const DEFAULT_PARAMETERS: [TransducerParameter; 3] = [
    TransducerParameter {
        name: "level",
        request: ReadRequest::holding(TRANSDUCER_SLAVE, 0x040A, 2),
        valid_range: (-0.1, 3.0),
        reject_zero: true,
    },
    TransducerParameter {
        name: "rs485_temperature",
        request: ReadRequest::holding(TRANSDUCER_SLAVE, 0x0408, 2),
        valid_range: (-10.0, 350.0),
        reject_zero: true,
    },
    TransducerParameter {
        name: "ambient_temperature",
        request: ReadRequest::holding(TRANSDUCER_SLAVE, 0x040C, 2),
        valid_range: (0.0, 50.0),
        reject_zero: true,
    },
];

/// Accepted, median-filtered value for one parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransducerSample {
    pub parameter: &'static str,
    pub value: f32,
    pub valid_range: (f32, f32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    Idle,
    DriveEnabled,
    Transmitting,
    ReceiveEnabled,
    Collecting,
    Decoding,
    Accepted,
    Rejected,
}

/// Median of `values`; the upper middle for even counts.  Reorders the slice.
pub fn median(values: &mut [f32]) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    values.sort_unstable_by(f32::total_cmp);
    Some(values[values.len() / 2])
}

/// xorshift32 source for per-attempt guard and settle jitter.
struct Jitter(u32);

impl Jitter {
    fn seeded(seed: u64) -> Self {
        Self((seed as u32 ^ (seed >> 32) as u32) | 1)
    }

    /// Uniform-ish in `0..=max`.
    fn next(&mut self, max: u32) -> u32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        if max == 0 { 0 } else { x % max.saturating_add(1) }
    }
}

pub struct TransducerClient<B: SerialBus, T: Timebase> {
    bus: B,
    timebase: T,
    timing: TransducerTiming,
    parameters: Vec<TransducerParameter, MAX_PARAMETERS>,
    state: ExchangeState,
    jitter: Jitter,
}

impl<B: SerialBus, T: Timebase> TransducerClient<B, T> {
    /// Client polling [`DEFAULT_PARAMETERS`].
    pub fn new(bus: B, timebase: T, timing: TransducerTiming) -> Self {
        Self::with_parameters(bus, timebase, timing, &DEFAULT_PARAMETERS)
    }

    /// Client polling `parameters`.  Entries beyond [`MAX_PARAMETERS`] are
    /// dropped with a warning.
    pub fn with_parameters(
        bus: B,
        timebase: T,
        timing: TransducerTiming,
        parameters: &[TransducerParameter],
    ) -> Self {
        let mut list = Vec::new();
        for p in parameters {
            if list.push(*p).is_err() {
                warn!("RS485: parameter table full, dropping {}", p.name);
            }
        }
        let jitter = Jitter::seeded(timebase.now_ms());
        Self {
            bus,
            timebase,
            timing,
            parameters: list,
            state: ExchangeState::Idle,
            jitter,
        }
    }

    pub fn state(&self) -> ExchangeState {
        self.state
    }

    pub fn parameters(&self) -> &[TransducerParameter] {
        &self.parameters
    }

    /// Access to the owned bus (tests inspect the scripted transcript).
    pub fn bus(&self) -> &B {
        &self.bus
    }

    fn jitter_ms(&mut self, attempt: u8) -> u64 {
        let ceiling = self.timing.jitter_step_ms.saturating_mul(u32::from(attempt) + 1);
        u64::from(self.jitter.next(ceiling))
    }

    async fn transmit(&mut self, frame: &[u8], attempt: u8) -> Result<(), TransducerError> {
        self.state = ExchangeState::DriveEnabled;
        self.bus.flush_input()?;
        self.bus.set_driver_enable(true)?;
        let guard = u64::from(self.timing.guard_ms) + self.jitter_ms(attempt);
        self.timebase.sleep_ms(guard).await;

        self.state = ExchangeState::Transmitting;
        self.bus.write_all(frame)?;
        let settle = u64::from(self.timing.settle_ms) + self.jitter_ms(attempt);
        self.timebase.sleep_ms(settle).await;
        Ok(())
    }

    async fn collect(&mut self, budget: usize) -> Result<Vec<u8, MAX_FRAME>, TransducerError> {
        self.state = ExchangeState::Collecting;
        let budget = budget.min(MAX_FRAME);
        let idle_gap = u64::from(self.timing.idle_gap_ms);
        let window = u64::from(self.timing.window_ms);
        let poll = u64::from(self.timing.poll_ms.max(1));

        let mut buf: Vec<u8, MAX_FRAME> = Vec::new();
        let mut chunk = [0u8; MAX_FRAME];
        let start = self.timebase.now_ms();
        let mut last_rx: Option<u64> = None;

        loop {
            let room = budget - buf.len();
            let n = self.bus.read_available(&mut chunk[..room])?.min(room);
            let now = self.timebase.now_ms();
            if n > 0 {
                if buf.extend_from_slice(&chunk[..n]).is_err() {
                    break;
                }
                last_rx = Some(now);
            }

            if buf.len() >= budget {
                break;
            }
            if last_rx.is_some_and(|t| now.wrapping_sub(t) >= idle_gap) {
                break;
            }
            if now.wrapping_sub(start) >= window {
                break;
            }
            self.timebase.sleep_ms(poll).await;
        }

        if buf.is_empty() {
            Err(TransducerError::NoResponse)
        } else {
            Ok(buf)
        }
    }

    /// One full request/response exchange.  The driver-enable line is
    /// always released before returning, also on error.
    pub async fn exchange(
        &mut self,
        request: &ReadRequest,
        attempt: u8,
    ) -> Result<Vec<u8, MAX_FRAME>, TransducerError> {
        let frame = request.encode();
        let sent = self.transmit(&frame, attempt).await;
        let released = self.bus.set_driver_enable(false);
        self.state = ExchangeState::ReceiveEnabled;
        sent?;
        released?;
        self.collect(request.response_len()).await
    }

    /// Exchange, validate and decode once.
    pub async fn read_once(
        &mut self,
        parameter: &TransducerParameter,
        attempt: u8,
    ) -> Result<f32, TransducerError> {
        let frame = self.exchange(&parameter.request, attempt).await?;
        self.state = ExchangeState::Decoding;
        let payload = parse_response(&frame, &parameter.request)?;
        decode_with_fallback(payload, parameter.valid_range, parameter.reject_zero)
            .map(|(value, _)| value)
            .ok_or(TransducerError::Undecodable)
    }

    /// Median-filtered sample of `parameter`, or `None` if no attempt
    /// survived.
    pub async fn sample(&mut self, parameter: &TransducerParameter) -> Option<TransducerSample> {
        let attempts = self.timing.attempts.clamp(1, MAX_TRANSDUCER_ATTEMPTS);
        let mut values: Vec<f32, { MAX_TRANSDUCER_ATTEMPTS as usize }> = Vec::new();

        for attempt in 0..attempts {
            if attempt > 0 {
                self.timebase
                    .sleep_ms(u64::from(self.timing.attempt_spacing_ms))
                    .await;
            }
            match self.read_once(parameter, attempt).await {
                Ok(v) => {
                    self.state = ExchangeState::Accepted;
                    if values.push(v).is_err() {
                        warn!("RS485: {} sample buffer full", parameter.name);
                    }
                }
                Err(e) => {
                    self.state = ExchangeState::Rejected;
                    debug!("RS485: {} attempt {}: {}", parameter.name, attempt + 1, e);
                }
            }
        }
        self.state = ExchangeState::Idle;

        let value = median(&mut values)?;
        Some(TransducerSample {
            parameter: parameter.name,
            value,
            valid_range: parameter.valid_range,
        })
    }

    /// Sample every tracked parameter once.  Unavailable parameters come
    /// back as `None` so the caller can keep the stale value.
    pub async fn poll(&mut self) -> Vec<(&'static str, Option<f32>), MAX_PARAMETERS> {
        let mut out = Vec::new();
        for i in 0..self.parameters.len() {
            if i > 0 {
                self.timebase
                    .sleep_ms(u64::from(self.timing.attempt_spacing_ms))
                    .await;
            }
            let parameter = self.parameters[i];
            let value = self.sample(&parameter).await.map(|s| s.value);
            if value.is_none() {
                warn!("RS485: {} unavailable this cycle", parameter.name);
            }
            if out.push((parameter.name, value)).is_err() {
                warn!("RS485: poll result full, dropping {}", parameter.name);
            }
        }
        out
    }
}
