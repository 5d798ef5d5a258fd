//! Shared "current readings" snapshot.
//!
//! Two groups, each a fixed-capacity map from parameter name to the last
//! known value.  Every parameter has exactly one producer (the poller);
//! display and status consumers only read.  Updates replace a whole field
//! between suspension points, so a reader never sees a half-written value.

use core::cell::RefCell;
use core::fmt;
use std::rc::Rc;

use heapless::FnvIndexMap;
use log::warn;
use serde::{Serialize, Serializer};

/// Parameters per group.
pub const MAX_GROUP_PARAMETERS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorGroup {
    Analog,
    Serial,
}

impl SensorGroup {
    pub fn name(self) -> &'static str {
        match self {
            Self::Analog => "analog",
            Self::Serial => "serial",
        }
    }
}

/// Last known value of one parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Reading {
    /// Nothing has been measured since boot.
    #[default]
    Unknown,
    Value(f32),
}

impl Reading {
    pub fn value(self) -> Option<f32> {
        match self {
            Self::Unknown => None,
            Self::Value(v) => Some(v),
        }
    }
}

impl Serialize for Reading {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Unknown => s.serialize_none(),
            Self::Value(v) => s.serialize_f32(*v),
        }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => f.write_str("---"),
            Self::Value(v) => write!(f, "{v:.2}"),
        }
    }
}

type GroupMap = FnvIndexMap<&'static str, Reading, MAX_GROUP_PARAMETERS>;

#[derive(Debug, Default, Serialize)]
pub struct ReadingsSnapshot {
    analog: GroupMap,
    serial: GroupMap,
}

impl ReadingsSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self, group: SensorGroup) -> &GroupMap {
        match group {
            SensorGroup::Analog => &self.analog,
            SensorGroup::Serial => &self.serial,
        }
    }

    fn map_mut(&mut self, group: SensorGroup) -> &mut GroupMap {
        match group {
            SensorGroup::Analog => &mut self.analog,
            SensorGroup::Serial => &mut self.serial,
        }
    }

    /// Register `parameter` as [`Reading::Unknown`] unless already present.
    pub fn declare(&mut self, group: SensorGroup, parameter: &'static str) {
        let map = self.map_mut(group);
        if map.contains_key(parameter) {
            return;
        }
        if map.insert(parameter, Reading::Unknown).is_err() {
            warn!("Snapshot: {} group full, dropping {}", group.name(), parameter);
        }
    }

    pub fn get(&self, group: SensorGroup, parameter: &str) -> Reading {
        self.map(group).get(parameter).copied().unwrap_or_default()
    }

    /// Replace one field.
    pub fn set(&mut self, group: SensorGroup, parameter: &'static str, value: f32) {
        if self
            .map_mut(group)
            .insert(parameter, Reading::Value(value))
            .is_err()
        {
            warn!("Snapshot: {} group full, dropping {}", group.name(), parameter);
        }
    }

    /// Apply one poll result: `Some` replaces, `None` keeps the stale value.
    /// Returns `true` if the field was written.
    pub fn apply(&mut self, group: SensorGroup, parameter: &'static str, value: Option<f32>) -> bool {
        match value {
            Some(v) => {
                self.set(group, parameter, v);
                true
            }
            None => {
                self.declare(group, parameter);
                false
            }
        }
    }

    pub fn iter(&self, group: SensorGroup) -> impl Iterator<Item = (&'static str, Reading)> + '_ {
        self.map(group).iter().map(|(k, v)| (*k, *v))
    }
}

/// Handle shared by the poller (writer) and every reader task.
pub type SharedSnapshot = Rc<RefCell<ReadingsSnapshot>>;

pub fn shared() -> SharedSnapshot {
    Rc::new(RefCell::new(ReadingsSnapshot::new()))
}
