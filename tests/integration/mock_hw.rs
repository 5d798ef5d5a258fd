//! Mock hardware adapters for integration tests.
//!
//! Every mock is a cheap `Clone` handle over shared state, so a test can
//! hand one copy to the code under test and keep another to inspect or
//! script it.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use bioreactor::app::controller::ActuatorController;
use bioreactor::app::events::AppEvent;
use bioreactor::app::ports::{AdcPort, Clock, EventSink, SerialBus, Timebase, WatchdogPort};
use bioreactor::drivers::relay::{Polarity, Relay, RelayGroup};
use bioreactor::error::{BusError, SensorError};
use bioreactor::transducer::crc::crc_bytes;
use embedded_hal::digital::{ErrorKind, ErrorType, InputPin, OutputPin};

// ── Output lines ──────────────────────────────────────────────

#[derive(Debug)]
pub struct LineFault;

impl embedded_hal::digital::Error for LineFault {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Output line that records its level and can be told to fail.
#[derive(Clone, Default)]
pub struct MockLine {
    high: Rc<Cell<bool>>,
    fail: Rc<Cell<bool>>,
    writes: Rc<Cell<u32>>,
}

impl MockLine {
    pub fn is_high(&self) -> bool {
        self.high.get()
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.set(fail);
    }

    pub fn writes(&self) -> u32 {
        self.writes.get()
    }

    fn drive(&mut self, high: bool) -> Result<(), LineFault> {
        if self.fail.get() {
            return Err(LineFault);
        }
        self.writes.set(self.writes.get() + 1);
        self.high.set(high);
        Ok(())
    }
}

impl ErrorType for MockLine {
    type Error = LineFault;
}

impl OutputPin for MockLine {
    fn set_low(&mut self) -> Result<(), LineFault> {
        self.drive(false)
    }

    fn set_high(&mut self) -> Result<(), LineFault> {
        self.drive(true)
    }
}

/// Input line whose level a test (or a scheduled action) sets.
#[derive(Clone, Default)]
pub struct MockInput {
    high: Rc<Cell<bool>>,
}

impl MockInput {
    pub fn set_level(&self, high: bool) {
        self.high.set(high);
    }
}

impl ErrorType for MockInput {
    type Error = LineFault;
}

impl InputPin for MockInput {
    fn is_high(&mut self) -> Result<bool, LineFault> {
        Ok(self.high.get())
    }

    fn is_low(&mut self) -> Result<bool, LineFault> {
        Ok(!self.high.get())
    }
}

// ── Virtual time ──────────────────────────────────────────────

type Action = Box<dyn FnOnce()>;

#[derive(Default)]
struct VirtualInner {
    now: Cell<u64>,
    slept: Cell<u64>,
    actions: RefCell<Vec<(u64, Action)>>,
}

/// Deterministic clock.  `sleep_ms` jumps time forward, firing any
/// scheduled action whose deadline falls inside the sleep, then yields once.
#[derive(Clone, Default)]
pub struct VirtualTimebase {
    inner: Rc<VirtualInner>,
}

impl VirtualTimebase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `action` when virtual time reaches `at_ms`.
    pub fn at(&self, at_ms: u64, action: impl FnOnce() + 'static) {
        self.inner.actions.borrow_mut().push((at_ms, Box::new(action)));
    }

    pub fn set_now(&self, ms: u64) {
        self.inner.now.set(ms);
    }

    pub fn advance(&self, ms: u64) {
        let target = self.inner.now.get() + ms;
        self.fire_due(target);
        self.inner.now.set(target);
    }

    /// Total milliseconds requested through `sleep_ms`.
    pub fn slept_ms(&self) -> u64 {
        self.inner.slept.get()
    }

    fn fire_due(&self, upto: u64) {
        loop {
            let next = {
                let mut actions = self.inner.actions.borrow_mut();
                let idx = actions
                    .iter()
                    .enumerate()
                    .filter(|(_, (t, _))| *t <= upto)
                    .min_by_key(|(_, (t, _))| *t)
                    .map(|(i, _)| i);
                idx.map(|i| actions.remove(i))
            };
            let Some((t, action)) = next else { break };
            if t > self.inner.now.get() {
                self.inner.now.set(t);
            }
            action();
        }
    }
}

impl Clock for VirtualTimebase {
    fn now_ms(&self) -> u64 {
        self.inner.now.get()
    }
}

impl Timebase for VirtualTimebase {
    async fn sleep_ms(&self, ms: u64) {
        self.inner.slept.set(self.inner.slept.get() + ms);
        self.advance(ms);
        futures_lite::future::yield_now().await;
    }
}

// ── Scripted RS-485 bus ───────────────────────────────────────

/// What the transducer answers to one request.
#[derive(Debug, Clone)]
pub enum Reply {
    Frame(Vec<u8>),
    Silence,
}

#[derive(Default)]
pub struct BusState {
    pub replies: VecDeque<Reply>,
    pub written: Vec<Vec<u8>>,
    /// Every driver-enable transition, in order.
    pub de_log: Vec<bool>,
    pub de: bool,
    pub flushes: u32,
    pub fail_write: bool,
    /// Driver-enable level seen at each write.
    pub de_at_write: Vec<bool>,
    pending: Vec<u8>,
}

/// Half-duplex bus that answers each write with the next scripted reply.
/// An exhausted script answers with silence.
#[derive(Clone, Default)]
pub struct ScriptedBus {
    state: Rc<RefCell<BusState>>,
}

impl ScriptedBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, reply: Reply) -> &Self {
        self.state.borrow_mut().replies.push_back(reply);
        self
    }

    pub fn reply_frame(&self, frame: Vec<u8>) -> &Self {
        self.reply(Reply::Frame(frame))
    }

    pub fn state(&self) -> std::cell::Ref<'_, BusState> {
        self.state.borrow()
    }

    pub fn set_fail_write(&self, fail: bool) {
        self.state.borrow_mut().fail_write = fail;
    }
}

impl SerialBus for ScriptedBus {
    fn flush_input(&mut self) -> Result<(), BusError> {
        let mut s = self.state.borrow_mut();
        s.pending.clear();
        s.flushes += 1;
        Ok(())
    }

    fn set_driver_enable(&mut self, transmit: bool) -> Result<(), BusError> {
        let mut s = self.state.borrow_mut();
        s.de = transmit;
        s.de_log.push(transmit);
        Ok(())
    }

    fn write_all(&mut self, frame: &[u8]) -> Result<(), BusError> {
        let mut s = self.state.borrow_mut();
        let de = s.de;
        s.de_at_write.push(de);
        if s.fail_write {
            return Err(BusError::WriteFailed);
        }
        s.written.push(frame.to_vec());
        if let Some(Reply::Frame(bytes)) = s.replies.pop_front() {
            s.pending = bytes;
        }
        Ok(())
    }

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, BusError> {
        let mut s = self.state.borrow_mut();
        let n = s.pending.len().min(buf.len());
        buf[..n].copy_from_slice(&s.pending[..n]);
        let rest = s.pending.split_off(n);
        s.pending = rest;
        Ok(n)
    }
}

/// Valid read-holding-registers response carrying `payload`.
pub fn response(slave: u8, payload: &[u8]) -> Vec<u8> {
    let mut frame = vec![slave, 0x03, payload.len() as u8];
    frame.extend_from_slice(payload);
    let crc = crc_bytes(&frame);
    frame.extend_from_slice(&crc);
    frame
}

/// Response whose payload is `value` as big-endian IEEE-754.
pub fn f32_response(value: f32) -> Vec<u8> {
    response(0x01, &value.to_be_bytes())
}

// ── ADC ───────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockAdc {
    codes: Rc<RefCell<HashMap<u32, Result<u16, SensorError>>>>,
}

impl MockAdc {
    pub fn set(&self, channel: u32, code: u16) {
        self.codes.borrow_mut().insert(channel, Ok(code));
    }

    pub fn fail(&self, channel: u32) {
        self.codes
            .borrow_mut()
            .insert(channel, Err(SensorError::AdcReadFailed(-1)));
    }
}

impl AdcPort for MockAdc {
    fn read_raw(&mut self, channel: u32) -> Result<u16, SensorError> {
        self.codes
            .borrow()
            .get(&channel)
            .copied()
            .unwrap_or(Err(SensorError::UnknownChannel))
    }
}

// ── Event spy ─────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct RecordingSink {
    events: Rc<RefCell<Vec<AppEvent>>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<AppEvent> {
        self.events.borrow().clone()
    }

    pub fn contains(&self, event: &AppEvent) -> bool {
        self.events.borrow().iter().any(|e| e == event)
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}

// ── Watchdog ──────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct CountingWatchdog {
    feeds: Rc<Cell<u32>>,
}

impl CountingWatchdog {
    pub fn feeds(&self) -> u32 {
        self.feeds.get()
    }
}

impl WatchdogPort for CountingWatchdog {
    fn feed(&mut self) {
        self.feeds.set(self.feeds.get() + 1);
    }
}

// ── Controller rig ────────────────────────────────────────────

pub type MockController = ActuatorController<MockLine, VirtualTimebase, RecordingSink>;

/// Handles to every line, the clock and the event spy behind a controller.
#[derive(Clone)]
pub struct Lines {
    pub aerator_a: [MockLine; 2],
    pub aerator_b: [MockLine; 2],
    pub pump: MockLine,
    pub time: VirtualTimebase,
    pub sink: RecordingSink,
}

impl Lines {
    pub fn a_energised(&self) -> bool {
        self.aerator_a.iter().all(MockLine::is_high)
    }

    pub fn b_energised(&self) -> bool {
        self.aerator_b.iter().all(MockLine::is_high)
    }
}

/// A controller over mock lines.  Derefs to its [`Lines`].
pub struct Rig {
    pub controller: MockController,
    pub lines: Lines,
}

impl Rig {
    pub fn new() -> Self {
        let lines = Lines {
            aerator_a: [MockLine::default(), MockLine::default()],
            aerator_b: [MockLine::default(), MockLine::default()],
            pump: MockLine::default(),
            time: VirtualTimebase::new(),
            sink: RecordingSink::default(),
        };

        let group = |pair: &[MockLine; 2]| {
            RelayGroup::from_relays(
                pair.iter()
                    .map(|l| Relay::new(l.clone(), Polarity::ActiveHigh)),
            )
            .unwrap()
        };
        let controller = ActuatorController::new(
            group(&lines.aerator_a),
            group(&lines.aerator_b),
            Relay::new(lines.pump.clone(), Polarity::ActiveHigh),
            lines.time.clone(),
            lines.sink.clone(),
        );
        Self { controller, lines }
    }

    /// Controller behind the shared handle the scheduler and command
    /// task expect.
    pub fn shared(self) -> (Rc<RefCell<MockController>>, Lines) {
        (Rc::new(RefCell::new(self.controller)), self.lines)
    }
}

impl std::ops::Deref for Rig {
    type Target = Lines;

    fn deref(&self) -> &Lines {
        &self.lines
    }
}
