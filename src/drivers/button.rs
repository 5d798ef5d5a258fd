//! Polled, debounced push-button.
//!
//! ## Hardware
//!
//! Active-low momentary switch with pull-up.  The line is sampled every
//! [`POLL_MS`]; a level change is accepted once it has been stable for
//! [`DEBOUNCE_MS`].  Each accepted press queues
//! [`ActuatorCommand::TogglePump`] on the command channel.
//!
//! ```text
//!  level ─┐        ┌──────────
//!         └────────┘
//!         |<-30ms->|  Pressed
//! ```

use embedded_hal::digital::InputPin;
use log::{debug, info, warn};

use crate::app::commands::{submit_to, ActuatorCommand, CommandChannel};
use crate::app::ports::Timebase;

pub const POLL_MS: u64 = 10;
pub const DEBOUNCE_MS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    Pressed,
    Released,
}

/// Debounce state machine.  Feed it one sample per poll.
#[derive(Debug, Clone, Copy)]
pub struct Debouncer {
    stable_pressed: bool,
    candidate: Option<(bool, u64)>,
}

impl Debouncer {
    /// Start from the level observed at boot, so a button held through
    /// reset does not count as a press.
    pub fn new(initially_pressed: bool) -> Self {
        Self {
            stable_pressed: initially_pressed,
            candidate: None,
        }
    }

    pub fn is_pressed(&self) -> bool {
        self.stable_pressed
    }

    pub fn tick(&mut self, now_ms: u64, pressed: bool) -> Option<ButtonEvent> {
        if pressed == self.stable_pressed {
            self.candidate = None;
            return None;
        }
        match self.candidate {
            Some((level, since)) if level == pressed => {
                if now_ms.wrapping_sub(since) >= DEBOUNCE_MS {
                    self.stable_pressed = pressed;
                    self.candidate = None;
                    Some(if pressed {
                        ButtonEvent::Pressed
                    } else {
                        ButtonEvent::Released
                    })
                } else {
                    None
                }
            }
            _ => {
                self.candidate = Some((pressed, now_ms));
                None
            }
        }
    }
}

/// Button task.  Never returns.
pub async fn button_loop<I, T>(mut pin: I, timebase: &T, channel: &CommandChannel)
where
    I: InputPin,
    T: Timebase,
{
    let initial = pin.is_low().unwrap_or(false);
    let mut debouncer = Debouncer::new(initial);
    let mut read_failed = false;
    info!("Button: polling every {}ms", POLL_MS);

    loop {
        match pin.is_low() {
            Ok(pressed) => {
                read_failed = false;
                match debouncer.tick(timebase.now_ms(), pressed) {
                    Some(ButtonEvent::Pressed) => {
                        if submit_to(channel, ActuatorCommand::TogglePump) {
                            info!("Button: pump toggle queued");
                        }
                    }
                    Some(ButtonEvent::Released) => debug!("Button: released"),
                    None => {}
                }
            }
            Err(_) if !read_failed => {
                read_failed = true;
                warn!("Button: input read failed");
            }
            Err(_) => {}
        }
        timebase.sleep_ms(POLL_MS).await;
    }
}
