//! Top-level operating mode, chosen once at boot from the selector switches.

use core::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum OperatingMode {
    /// Full operation at real-time intervals.
    #[default]
    Normal,
    /// Full operation with every interval divided by the demo factor.
    Demo,
    /// Full operation; selected by switch 1 on the deployed board.
    Working,
    /// Aeration alternation only, on the long emergency cycle.
    Emergency,
    /// Maintenance: no core task runs.
    Program,
}

impl OperatingMode {
    /// Decode the two boot switches (`true` = closed).
    pub fn from_switches(sw1: bool, sw2: bool) -> Self {
        match (sw1, sw2) {
            (true, true) => Self::Emergency,
            (true, false) => Self::Working,
            (false, true) => Self::Demo,
            (false, false) => Self::Program,
        }
    }

    /// Divisor applied to scheduler intervals.
    pub fn time_factor(self, demo_factor: u32) -> u32 {
        match self {
            Self::Demo => demo_factor.max(1),
            _ => 1,
        }
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Normal => "NORMAL",
            Self::Demo => "DEMO",
            Self::Working => "WORKING",
            Self::Emergency => "EMERGENCY",
            Self::Program => "PROGRAM",
        };
        f.write_str(name)
    }
}
