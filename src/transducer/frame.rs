//! Request construction and response validation.
//!
//! ```text
//!  request : addr | fn | reg_hi | reg_lo | cnt_hi | cnt_lo | crc_lo | crc_hi
//!  response: addr | fn | nbytes | payload[nbytes]          | crc_lo | crc_hi
//!  error   : addr | fn|0x80 | code                         | crc_lo | crc_hi
//! ```
//!
//! A response is checked structurally and by CRC before a single payload
//! byte is handed to the decoder.

use crate::error::FrameError;

use super::crc::{check_crc, crc_bytes};

/// Read-holding-registers function code.
pub const FN_READ_HOLDING: u8 = 0x03;

const EXCEPTION_BIT: u8 = 0x80;
/// addr + fn + code/byte-count + CRC.
const MIN_RESPONSE_LEN: usize = 5;

/// One outbound register read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadRequest {
    pub slave: u8,
    pub function: u8,
    pub register: u16,
    pub count: u16,
}

impl ReadRequest {
    pub const fn holding(slave: u8, register: u16, count: u16) -> Self {
        Self {
            slave,
            function: FN_READ_HOLDING,
            register,
            count,
        }
    }

    /// Wire bytes, CRC included.
    pub fn encode(&self) -> [u8; 8] {
        let [reg_hi, reg_lo] = self.register.to_be_bytes();
        let [cnt_hi, cnt_lo] = self.count.to_be_bytes();
        let pdu = [self.slave, self.function, reg_hi, reg_lo, cnt_hi, cnt_lo];
        let [crc_lo, crc_hi] = crc_bytes(&pdu);
        [
            pdu[0], pdu[1], pdu[2], pdu[3], pdu[4], pdu[5], crc_lo, crc_hi,
        ]
    }

    /// Payload bytes a well-formed answer carries.
    pub fn payload_len(&self) -> usize {
        usize::from(self.count) * 2
    }

    /// Total length of a well-formed answer; also the receive byte budget.
    pub fn response_len(&self) -> usize {
        MIN_RESPONSE_LEN + self.payload_len()
    }
}

/// Validate `frame` as the answer to `request` and return its payload.
pub fn parse_response<'a>(frame: &'a [u8], request: &ReadRequest) -> Result<&'a [u8], FrameError> {
    if frame.len() < MIN_RESPONSE_LEN {
        return Err(FrameError::TooShort);
    }
    if !check_crc(frame) {
        return Err(FrameError::CrcMismatch);
    }
    if frame[0] != request.slave {
        return Err(FrameError::AddressMismatch);
    }
    if frame[1] == request.function | EXCEPTION_BIT {
        return Err(FrameError::Exception(frame[2]));
    }
    if frame[1] != request.function {
        return Err(FrameError::FunctionMismatch);
    }

    let nbytes = usize::from(frame[2]);
    if nbytes != request.payload_len() || frame.len() != MIN_RESPONSE_LEN + nbytes {
        return Err(FrameError::ByteCountMismatch);
    }
    Ok(&frame[3..3 + nbytes])
}
