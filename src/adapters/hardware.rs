//! Hardware adapter: bridges real peripherals to the domain port traits.
//!
//! | Type        | Implements                 | Backed by                 |
//! |-------------|----------------------------|---------------------------|
//! | `GpioLine`  | `embedded_hal` `OutputPin` | `hw_init::gpio_write`     |
//! | `GpioInput` | `embedded_hal` `InputPin`  | `hw_init::gpio_read`      |
//! | `EspAdc`    | `AdcPort`                  | ADC1 oneshot              |
//! | `Rs485Bus`  | `SerialBus`                | UART + DE/RE line         |
//!
//! This is the only module that touches peripherals.  On non-espidf
//! targets the helpers in `hw_init` fall back to their atomic-backed
//! simulation.

use embedded_hal::digital::{ErrorKind, ErrorType, InputPin, OutputPin};
use log::{info, warn};

use crate::app::ports::{AdcPort, SerialBus};
use crate::config::TransducerTiming;
use crate::drivers::hw_init::{self, HwInitError};
use crate::error::{BusError, Error, SensorError};
use crate::pins;

// ── GPIO ──────────────────────────────────────────────────────

/// ESP-IDF return code from a failed pin access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpioError(pub i32);

impl embedded_hal::digital::Error for GpioError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// One push-pull output configured by `hw_init::init_outputs`.
#[derive(Debug)]
pub struct GpioLine {
    pin: i32,
}

impl GpioLine {
    pub fn new(pin: i32) -> Self {
        Self { pin }
    }

    pub fn pin(&self) -> i32 {
        self.pin
    }
}

impl ErrorType for GpioLine {
    type Error = GpioError;
}

impl OutputPin for GpioLine {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        hw_init::gpio_write(self.pin, false).map_err(GpioError)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        hw_init::gpio_write(self.pin, true).map_err(GpioError)
    }
}

/// One input configured by `hw_init::init_inputs`.
#[derive(Debug)]
pub struct GpioInput {
    pin: i32,
}

impl GpioInput {
    pub fn new(pin: i32) -> Self {
        Self { pin }
    }
}

impl ErrorType for GpioInput {
    type Error = GpioError;
}

impl InputPin for GpioInput {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(hw_init::gpio_read(self.pin))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!hw_init::gpio_read(self.pin))
    }
}

// ── ADC ───────────────────────────────────────────────────────

/// ADC1 oneshot unit.  Only channels brought up at boot are readable.
#[derive(Debug)]
pub struct EspAdc {
    _private: (),
}

impl EspAdc {
    /// Initialise ADC1 and every probe channel.
    pub fn open() -> Result<Self, Error> {
        hw_init::init_adc().map_err(|e| {
            warn!("ADC: {}", e);
            Error::from(e)
        })?;
        Ok(Self { _private: () })
    }
}

impl AdcPort for EspAdc {
    fn read_raw(&mut self, channel: u32) -> Result<u16, SensorError> {
        if !pins::ADC_CHANNELS.contains(&channel) {
            return Err(SensorError::UnknownChannel);
        }
        hw_init::adc1_read(channel).map_err(SensorError::AdcReadFailed)
    }
}

// ── RS-485 ────────────────────────────────────────────────────

/// UART plus the tied DE and /RE line of a MAX485 transceiver.
#[derive(Debug)]
pub struct Rs485Bus {
    port: i32,
    driver_enable: GpioLine,
}

impl Rs485Bus {
    /// Install the UART driver and park the transceiver in receive mode.
    pub fn open(timing: &TransducerTiming) -> Result<Self, Error> {
        hw_init::init_uart(
            pins::RS485_UART_PORT,
            timing.baud_rate,
            pins::RS485_TX_GPIO,
            pins::RS485_RX_GPIO,
        )
        .map_err(|e: HwInitError| {
            warn!("RS485: {}", e);
            Error::from(e)
        })?;
        let mut driver_enable = GpioLine::new(pins::RS485_DE_RE_GPIO);
        driver_enable
            .set_low()
            .map_err(|_| Error::Init("RS-485 driver-enable line"))?;
        info!(
            "RS485: UART{} ready, DE/RE on GPIO{}",
            pins::RS485_UART_PORT,
            pins::RS485_DE_RE_GPIO
        );
        Ok(Self {
            port: pins::RS485_UART_PORT,
            driver_enable,
        })
    }
}

impl SerialBus for Rs485Bus {
    fn flush_input(&mut self) -> Result<(), BusError> {
        hw_init::uart_flush_input(self.port).map_err(|_| BusError::FlushFailed)
    }

    fn set_driver_enable(&mut self, transmit: bool) -> Result<(), BusError> {
        let res = if transmit {
            self.driver_enable.set_high()
        } else {
            self.driver_enable.set_low()
        };
        res.map_err(|_| BusError::DriverEnableFailed)
    }

    fn write_all(&mut self, frame: &[u8]) -> Result<(), BusError> {
        hw_init::uart_write(self.port, frame).map_err(|_| BusError::WriteFailed)
    }

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, BusError> {
        hw_init::uart_read(self.port, buf).map_err(|_| BusError::ReadFailed)
    }
}
