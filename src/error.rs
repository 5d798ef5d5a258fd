//! Unified error types for the bioreactor firmware.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! poll loop's retain-stale vs. disable-subsystem decision uniform.
//! All variants are `Copy` so they can be passed through the scheduler and
//! event sink without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// An analog channel could not be read.
    Sensor(SensorError),
    /// A serial transducer exchange failed.
    Transducer(TransducerError),
    /// An actuator command failed.
    Actuator(ActuatorError),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Transducer(e) => write!(f, "transducer: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// ADC read returned an error code.
    AdcReadFailed(i32),
    /// The requested channel was never configured.
    UnknownChannel,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdcReadFailed(rc) => write!(f, "ADC read failed (rc={rc})"),
            Self::UnknownChannel => write!(f, "channel not configured"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Half-duplex bus errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// Discarding stale receive bytes failed.
    FlushFailed,
    /// Toggling the driver-enable line failed.
    DriverEnableFailed,
    /// The UART rejected the outbound frame.
    WriteFailed,
    /// The UART receive path returned an error.
    ReadFailed,
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FlushFailed => write!(f, "input flush failed"),
            Self::DriverEnableFailed => write!(f, "driver-enable line failed"),
            Self::WriteFailed => write!(f, "write failed"),
            Self::ReadFailed => write!(f, "read failed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Response frame validation errors
// ---------------------------------------------------------------------------

/// Structural problems with an inbound transducer frame.
///
/// These are always detected before any payload byte is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// Fewer bytes than the smallest legal response.
    TooShort,
    /// Trailing CRC does not match the locally computed one.
    CrcMismatch,
    /// Response came from a different slave address.
    AddressMismatch,
    /// Function code does not echo the request.
    FunctionMismatch,
    /// The slave answered with an exception response.
    Exception(u8),
    /// Byte-count field disagrees with the frame length or request.
    ByteCountMismatch,
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort => write!(f, "frame too short"),
            Self::CrcMismatch => write!(f, "CRC mismatch"),
            Self::AddressMismatch => write!(f, "address mismatch"),
            Self::FunctionMismatch => write!(f, "function code mismatch"),
            Self::Exception(code) => write!(f, "exception response 0x{code:02X}"),
            Self::ByteCountMismatch => write!(f, "byte count mismatch"),
        }
    }
}

// ---------------------------------------------------------------------------
// Transducer exchange errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransducerError {
    /// The bus itself failed.
    Bus(BusError),
    /// Nothing arrived inside the receive window.
    NoResponse,
    /// A response arrived but was structurally invalid.
    Frame(FrameError),
    /// No encoding in the fallback chain produced an in-range value.
    Undecodable,
}

impl fmt::Display for TransducerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus(e) => write!(f, "bus: {e}"),
            Self::NoResponse => write!(f, "no response"),
            Self::Frame(e) => write!(f, "frame: {e}"),
            Self::Undecodable => write!(f, "no in-range decoding"),
        }
    }
}

impl From<BusError> for TransducerError {
    fn from(e: BusError) -> Self {
        Self::Bus(e)
    }
}

impl From<FrameError> for TransducerError {
    fn from(e: FrameError) -> Self {
        Self::Frame(e)
    }
}

impl From<TransducerError> for Error {
    fn from(e: TransducerError) -> Self {
        Self::Transducer(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// Driving a relay output line failed; logical state was left unchanged.
    GpioWriteFailed,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioWriteFailed => write!(f, "GPIO write failed"),
        }
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
