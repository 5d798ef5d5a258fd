//! Payload → value decoding.
//!
//! Deployed transducer revisions disagree on how the two holding registers
//! encode their value, so every accepted payload is run through a fixed
//! chain of encodings and the first in-range result wins.  Prune
//! [`DECODE_CHAIN`] once the fielded model is pinned down.

/// One interpretation of the first four payload bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// IEEE-754 single, big-endian.
    F32Be,
    /// IEEE-754 single, little-endian.
    F32Le,
    /// Unsigned 32-bit big-endian integer, taken as its numeric value.
    U32Be,
    /// Two big-endian 16-bit registers `(hi << 16 | lo)`, in thousandths.
    PairedU16Milli,
}

/// Order in which encodings are tried.
pub const DECODE_CHAIN: [Encoding; 4] = [
    Encoding::F32Be,
    Encoding::F32Le,
    Encoding::U32Be,
    Encoding::PairedU16Milli,
];

/// Values with a magnitude at or below this read as "no reading".
pub const ZERO_EPSILON: f32 = 1e-10;

/// Interpret `payload` with a single encoding.  `None` for short payloads
/// and non-finite results.
pub fn decode(payload: &[u8], encoding: Encoding) -> Option<f32> {
    let word: [u8; 4] = payload.get(..4)?.try_into().ok()?;
    let value = match encoding {
        Encoding::F32Be => f32::from_be_bytes(word),
        Encoding::F32Le => f32::from_le_bytes(word),
        Encoding::U32Be => u32::from_be_bytes(word) as f32,
        Encoding::PairedU16Milli => {
            let hi = u32::from(u16::from_be_bytes([word[0], word[1]]));
            let lo = u32::from(u16::from_be_bytes([word[2], word[3]]));
            ((hi << 16) | lo) as f32 / 1000.0
        }
    };
    value.is_finite().then_some(value)
}

/// Walk [`DECODE_CHAIN`] and return the first value inside `range`
/// (inclusive), together with the encoding that produced it.
pub fn decode_with_fallback(
    payload: &[u8],
    range: (f32, f32),
    reject_zero: bool,
) -> Option<(f32, Encoding)> {
    let (min, max) = range;
    DECODE_CHAIN.iter().find_map(|&enc| {
        let v = decode(payload, enc)?;
        if reject_zero && v.abs() <= ZERO_EPSILON {
            return None;
        }
        (min..=max).contains(&v).then_some((v, enc))
    })
}
