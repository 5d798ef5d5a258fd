//! Sensor subsystem: the analog reader and the aggregating [`SensorPoller`].
//!
//! The poller owns both acquisition paths and is the single writer of the
//! shared [`ReadingsSnapshot`](crate::snapshot::ReadingsSnapshot).  A
//! subsystem that failed to come up at boot is logged once and skipped for
//! the rest of the process lifetime; the other keeps running.

pub mod analog;

use log::{error, info};

use crate::app::events::{AppEvent, Subsystem};
use crate::app::ports::{AdcPort, EventSink, SerialBus, Timebase};
use crate::error::Error;
use crate::snapshot::{SensorGroup, SharedSnapshot};
use crate::transducer::TransducerClient;

use analog::AnalogChannelReader;

/// Per-group outcome of one poll pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollSummary {
    pub analog_updated: u8,
    pub analog_missing: u8,
    pub serial_updated: u8,
    pub serial_missing: u8,
}

pub struct SensorPoller<A: AdcPort, B: SerialBus, T: Timebase, S: EventSink> {
    analog: Option<AnalogChannelReader<A>>,
    transducer: Option<TransducerClient<B, T>>,
    snapshot: SharedSnapshot,
    sink: S,
}

impl<A: AdcPort, B: SerialBus, T: Timebase, S: EventSink> SensorPoller<A, B, T, S> {
    /// `transducer` is `None` when RS-485 polling is switched off in the
    /// config, `Some(Err(_))` when the port failed to open.
    pub fn new(
        analog: Result<AnalogChannelReader<A>, Error>,
        transducer: Option<Result<TransducerClient<B, T>, Error>>,
        snapshot: SharedSnapshot,
        mut sink: S,
    ) -> Self {
        let analog = match analog {
            Ok(reader) => Some(reader),
            Err(reason) => {
                error!("Sensors: analog front end disabled: {}", reason);
                sink.emit(&AppEvent::SubsystemDisabled {
                    subsystem: Subsystem::Analog,
                    reason,
                });
                None
            }
        };
        let transducer = match transducer {
            Some(Ok(client)) => Some(client),
            Some(Err(reason)) => {
                error!("Sensors: RS-485 transducer disabled: {}", reason);
                sink.emit(&AppEvent::SubsystemDisabled {
                    subsystem: Subsystem::Transducer,
                    reason,
                });
                None
            }
            None => {
                info!("Sensors: RS-485 polling off by configuration");
                None
            }
        };

        {
            let mut snap = snapshot.borrow_mut();
            if let Some(reader) = &analog {
                for ch in reader.channels() {
                    snap.declare(SensorGroup::Analog, ch.parameter);
                }
            }
            if let Some(client) = &transducer {
                for p in client.parameters() {
                    snap.declare(SensorGroup::Serial, p.name);
                }
            }
        }

        Self {
            analog,
            transducer,
            snapshot,
            sink,
        }
    }

    pub fn analog_enabled(&self) -> bool {
        self.analog.is_some()
    }

    pub fn transducer_enabled(&self) -> bool {
        self.transducer.is_some()
    }

    pub fn snapshot(&self) -> &SharedSnapshot {
        &self.snapshot
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// One analog pass followed by one transducer pass.
    pub async fn poll_once(&mut self) -> PollSummary {
        let mut summary = PollSummary::default();

        if let Some(reader) = self.analog.as_mut() {
            let readings = reader.poll();
            let expected = reader.channels().len();
            {
                let mut snap = self.snapshot.borrow_mut();
                for r in &readings {
                    snap.set(SensorGroup::Analog, r.parameter, r.engineered_value);
                }
            }
            summary.analog_updated = readings.len() as u8;
            summary.analog_missing = expected.saturating_sub(readings.len()) as u8;
            self.sink.emit(&AppEvent::ReadingsUpdated {
                group: SensorGroup::Analog,
                updated: summary.analog_updated,
                missing: summary.analog_missing,
            });
        }

        if let Some(client) = self.transducer.as_mut() {
            // No snapshot borrow is held across the exchange.
            let results = client.poll().await;
            {
                let mut snap = self.snapshot.borrow_mut();
                for &(name, value) in &results {
                    if snap.apply(SensorGroup::Serial, name, value) {
                        summary.serial_updated += 1;
                    } else {
                        summary.serial_missing += 1;
                    }
                }
            }
            self.sink.emit(&AppEvent::ReadingsUpdated {
                group: SensorGroup::Serial,
                updated: summary.serial_updated,
                missing: summary.serial_missing,
            });
        }

        summary
    }
}
