//! Analog front end: pH, dissolved oxygen, NH3 and H2S probes on ADC1.
//!
//! Each channel converts its raw code to volts with a shared [`AdcScale`]
//! and then to an engineered value with its own [`Calibration`].
//!
//! ## Failure
//!
//! A channel whose read fails is logged and left out of the pass; the
//! poller then keeps that parameter's previous snapshot value.

use heapless::Vec;
use log::warn;

use crate::app::ports::AdcPort;
use crate::pins;

/// Channels one reader can own.
pub const MAX_ANALOG_CHANNELS: usize = 4;

/// Raw code → engineered value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Calibration {
    /// `slope * volts + offset`, clamped to `[min, max]`.
    Affine {
        slope: f32,
        offset: f32,
        min: f32,
        max: f32,
    },
    /// `[volts_lo, volts_hi]` mapped onto `[out_lo, out_hi]`, saturating
    /// at both ends.
    Linear {
        volts_lo: f32,
        volts_hi: f32,
        out_lo: f32,
        out_hi: f32,
    },
}

impl Calibration {
    pub fn apply(&self, volts: f32) -> f32 {
        match *self {
            Self::Affine {
                slope,
                offset,
                min,
                max,
            } => (slope * volts + offset).clamp(min, max),
            Self::Linear {
                volts_lo,
                volts_hi,
                out_lo,
                out_hi,
            } => {
                let span = volts_hi - volts_lo;
                if span.abs() <= f32::EPSILON {
                    return out_lo;
                }
                let t = ((volts - volts_lo) / span).clamp(0.0, 1.0);
                out_lo + t * (out_hi - out_lo)
            }
        }
    }
}

/// Code → volts conversion shared by every channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdcScale {
    pub max_code: u16,
    pub reference_volts: f32,
    pub gain_correction: f32,
}

impl Default for AdcScale {
    fn default() -> Self {
        Self {
            max_code: 4095,
            reference_volts: 3.3,
            gain_correction: 1.0,
        }
    }
}

impl AdcScale {
    pub fn volts(&self, code: u16) -> f32 {
        if self.max_code == 0 {
            return 0.0;
        }
        let code = code.min(self.max_code);
        f32::from(code) / f32::from(self.max_code) * self.reference_volts * self.gain_correction
    }
}

/// One configured probe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalogChannel {
    pub parameter: &'static str,
    pub adc_channel: u32,
    pub calibration: Calibration,
}

/// One converted measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalogReading {
    pub parameter: &'static str,
    pub adc_channel: u32,
    pub raw_code: u16,
    pub voltage: f32,
    pub engineered_value: f32,
    pub calibration: Calibration,
}

/// A raw code tagged with the channel it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSample {
    pub adc_channel: u32,
    pub code: u16,
}

/// The four probes on the controller board.
pub fn default_channels() -> [AnalogChannel; MAX_ANALOG_CHANNELS] {
    [
        AnalogChannel {
            parameter: "pH",
            adc_channel: pins::PH_ADC_CHANNEL,
            calibration: Calibration::Affine {
                slope: 3.9769,
                offset: -1.8758,
                min: 0.0,
                max: 14.0,
            },
        },
        AnalogChannel {
            parameter: "O2_pct",
            adc_channel: pins::O2_ADC_CHANNEL,
            calibration: Calibration::Linear {
                volts_lo: 0.0,
                volts_hi: 3.0,
                out_lo: 0.0,
                out_hi: 100.0,
            },
        },
        AnalogChannel {
            parameter: "NH3_ppm",
            adc_channel: pins::NH3_ADC_CHANNEL,
            calibration: Calibration::Linear {
                volts_lo: 0.0,
                volts_hi: 3.3,
                out_lo: 0.0,
                out_hi: 50.0,
            },
        },
        AnalogChannel {
            parameter: "H2S_ppm",
            adc_channel: pins::H2S_ADC_CHANNEL,
            calibration: Calibration::Linear {
                volts_lo: 0.0,
                volts_hi: 3.3,
                out_lo: 0.0,
                out_hi: 50.0,
            },
        },
    ]
}

pub struct AnalogChannelReader<A: AdcPort> {
    adc: A,
    scale: AdcScale,
    channels: Vec<AnalogChannel, MAX_ANALOG_CHANNELS>,
}

impl<A: AdcPort> AnalogChannelReader<A> {
    pub fn new(adc: A, scale: AdcScale) -> Self {
        Self::with_channels(adc, scale, &default_channels())
    }

    /// Reader over `channels`; entries past [`MAX_ANALOG_CHANNELS`] are
    /// dropped with a warning.
    pub fn with_channels(adc: A, scale: AdcScale, channels: &[AnalogChannel]) -> Self {
        let mut list = Vec::new();
        for c in channels {
            if list.push(*c).is_err() {
                warn!("ADC: channel table full, dropping {}", c.parameter);
            }
        }
        Self {
            adc,
            scale,
            channels: list,
        }
    }

    pub fn channels(&self) -> &[AnalogChannel] {
        &self.channels
    }

    /// One pass over every channel.  Failed channels are logged and omitted.
    pub fn read_raw(&mut self) -> Vec<RawSample, MAX_ANALOG_CHANNELS> {
        let mut out = Vec::new();
        for ch in &self.channels {
            match self.adc.read_raw(ch.adc_channel) {
                Ok(code) => {
                    let sample = RawSample {
                        adc_channel: ch.adc_channel,
                        code,
                    };
                    if out.push(sample).is_err() {
                        warn!("ADC: raw buffer full, dropping ch{}", ch.adc_channel);
                    }
                }
                Err(e) => warn!("ADC: {} (ch{}): {}", ch.parameter, ch.adc_channel, e),
            }
        }
        out
    }

    /// Convert a pass of raw codes.  Codes for unconfigured channels are
    /// dropped.
    pub fn to_engineered(&self, raw: &[RawSample]) -> Vec<AnalogReading, MAX_ANALOG_CHANNELS> {
        let mut out = Vec::new();
        for sample in raw {
            let Some(ch) = self.channels.iter().find(|c| c.adc_channel == sample.adc_channel)
            else {
                continue;
            };
            let voltage = self.scale.volts(sample.code);
            let reading = AnalogReading {
                parameter: ch.parameter,
                adc_channel: ch.adc_channel,
                raw_code: sample.code,
                voltage,
                engineered_value: ch.calibration.apply(voltage),
                calibration: ch.calibration,
            };
            if out.push(reading).is_err() {
                warn!("ADC: reading buffer full, dropping {}", ch.parameter);
            }
        }
        out
    }

    pub fn poll(&mut self) -> Vec<AnalogReading, MAX_ANALOG_CHANNELS> {
        let raw = self.read_raw();
        self.to_engineered(&raw)
    }
}
