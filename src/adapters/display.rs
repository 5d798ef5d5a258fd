//! Display capability.
//!
//! The 4x20 LCD driver is an external collaborator.  At boot a probe
//! either hands over a real [`DisplayPort`] or finds nothing, in which
//! case [`NullDisplay`] stands in and the refresh task keeps running
//! against it.

use core::cell::RefCell;
use std::rc::Rc;

use log::info;

use crate::app::ports::{ActuatorPort, DisplayPort, Timebase};
use crate::app::status::StatusReport;
use crate::mode::OperatingMode;
use crate::snapshot::SharedSnapshot;

pub const DISPLAY_REFRESH_MS: u64 = 2_000;

/// No-op display used when no panel answers the probe.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDisplay {
    frames: u32,
}

impl NullDisplay {
    /// Frames swallowed so far.
    pub fn frames(&self) -> u32 {
        self.frames
    }
}

impl DisplayPort for NullDisplay {
    fn render(&mut self, _report: &StatusReport<'_>) {
        self.frames = self.frames.wrapping_add(1);
    }

    fn name(&self) -> &'static str {
        "null"
    }
}

/// Pick the real display if the probe found one, otherwise the stub.
/// Decided once at startup.
pub fn select_display(probed: Option<Box<dyn DisplayPort>>) -> Box<dyn DisplayPort> {
    let display = probed.unwrap_or_else(|| Box::new(NullDisplay::default()));
    info!("Display: using {} display", display.name());
    display
}

/// Render one frame from the current state.
pub fn refresh<A: ActuatorPort>(
    display: &mut dyn DisplayPort,
    mode: OperatingMode,
    actuators: &RefCell<A>,
    snapshot: &SharedSnapshot,
) {
    let act = actuators.borrow();
    let snap = snapshot.borrow();
    let report = StatusReport::build(mode, &*act, &snap);
    display.render(&report);
}

/// Display task.  Never returns.
pub async fn display_loop<A, T>(
    mut display: Box<dyn DisplayPort>,
    mode: OperatingMode,
    actuators: Rc<RefCell<A>>,
    snapshot: SharedSnapshot,
    timebase: &T,
) where
    A: ActuatorPort,
    T: Timebase,
{
    loop {
        refresh(display.as_mut(), mode, &actuators, &snapshot);
        timebase.sleep_ms(DISPLAY_REFRESH_MS).await;
    }
}
