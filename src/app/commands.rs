//! Inbound actuator commands.
//!
//! The button task and the HTTP collaborator (which runs on its own
//! thread) never touch the controller directly.  They push discrete
//! commands into a bounded `embassy-sync` channel; the command task on the
//! core executor drains it and applies each one.
//!
//! ```text
//! ┌──────────────┐  ActuatorCommand  ┌──────────────┐
//! │ button / HTTP│──────────────────▶│ command_loop │──▶ ActuatorPort
//! └──────────────┘                   └──────────────┘
//! ```

use core::cell::RefCell;
use std::rc::Rc;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{info, warn};

use crate::app::controller::AeratorSide;
use crate::app::ports::ActuatorPort;
use crate::error::ActuatorError;

/// Commands external adapters can send into the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorCommand {
    /// Manual pump toggle.
    TogglePump,
    /// Select the running aerator.
    SetAerator(AeratorSide),
}

/// Channel depth for queued commands.
pub const COMMAND_DEPTH: usize = 4;

pub type CommandChannel = Channel<CriticalSectionRawMutex, ActuatorCommand, COMMAND_DEPTH>;

/// Process-wide command ingress.
pub static COMMAND_CHANNEL: CommandChannel = Channel::new();

/// Queue `cmd` without blocking.  Returns `false` if the queue is full.
pub fn submit_to(channel: &CommandChannel, cmd: ActuatorCommand) -> bool {
    if channel.try_send(cmd).is_err() {
        warn!("CMD: queue full, dropping {:?}", cmd);
        return false;
    }
    true
}

/// Queue `cmd` on [`COMMAND_CHANNEL`].
pub fn submit(cmd: ActuatorCommand) -> bool {
    submit_to(&COMMAND_CHANNEL, cmd)
}

/// Apply one command to the controller.
pub fn apply(cmd: ActuatorCommand, actuators: &mut impl ActuatorPort) -> Result<(), ActuatorError> {
    match cmd {
        ActuatorCommand::TogglePump => actuators.toggle_pump(),
        ActuatorCommand::SetAerator(side) => actuators.set_aerator_pair(side == AeratorSide::A),
    }
}

/// Apply everything currently queued.  Returns the number applied.
pub fn drain_pending<A: ActuatorPort>(channel: &CommandChannel, actuators: &RefCell<A>) -> usize {
    let mut n = 0;
    while let Ok(cmd) = channel.try_receive() {
        if let Err(e) = apply(cmd, &mut *actuators.borrow_mut()) {
            warn!("CMD: {:?} failed: {}", cmd, e);
        }
        n += 1;
    }
    n
}

/// Command task: wakes on every queued command.
pub async fn command_loop<A: ActuatorPort>(channel: &CommandChannel, actuators: Rc<RefCell<A>>) {
    info!("CMD: command task started");
    loop {
        let cmd = channel.receive().await;
        let res = apply(cmd, &mut *actuators.borrow_mut());
        match res {
            Ok(()) => info!("CMD: applied {:?}", cmd),
            Err(e) => warn!("CMD: {:?} failed: {}", cmd, e),
        }
    }
}
