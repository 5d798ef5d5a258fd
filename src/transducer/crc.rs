//! Modbus CRC-16 (reflected polynomial 0xA001, init 0xFFFF).
//!
//! The checksum is appended low byte first.

const POLY: u16 = 0xA001;

/// CRC-16/MODBUS over `data`.
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc = 0xFFFFu16;
    for &b in data {
        crc ^= u16::from(b);
        for _ in 0..8 {
            crc = if crc & 1 != 0 { (crc >> 1) ^ POLY } else { crc >> 1 };
        }
    }
    crc
}

/// The two trailing bytes to append after `pdu`.
pub fn crc_bytes(pdu: &[u8]) -> [u8; 2] {
    crc16(pdu).to_le_bytes()
}

/// `true` if the last two bytes of `frame` are the CRC of everything before.
pub fn check_crc(frame: &[u8]) -> bool {
    let Some(split) = frame.len().checked_sub(2) else {
        return false;
    };
    let (body, tail) = frame.split_at(split);
    u16::from_le_bytes([tail[0], tail[1]]) == crc16(body)
}
