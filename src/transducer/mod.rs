//! RS-485 level/temperature transducer: Modbus-style framing, CRC, the
//! decode fallback chain, and the median-filtering client.

pub mod client;
pub mod crc;
pub mod decode;
pub mod frame;

pub use client::{
    DEFAULT_PARAMETERS, ExchangeState, TransducerClient, TransducerParameter, TransducerSample,
};
pub use frame::ReadRequest;
