//! Fuzz target: `parse_response` + `decode_with_fallback`
//!
//! Feeds arbitrary bytes as a transducer reply to each default request.
//! Parsing must never panic, an accepted payload must be exactly the
//! requested register width, and a decoded value must sit inside the
//! parameter's range.
//!
//! cargo fuzz run fuzz_response_frame

#![no_main]

use bioreactor::transducer::decode::decode_with_fallback;
use bioreactor::transducer::frame::parse_response;
use bioreactor::transducer::DEFAULT_PARAMETERS;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    for param in &DEFAULT_PARAMETERS {
        let Ok(payload) = parse_response(data, &param.request) else {
            continue;
        };
        assert_eq!(payload.len(), param.request.payload_len());

        if let Some((value, _)) = decode_with_fallback(payload, param.valid_range, param.reject_zero) {
            assert!(value.is_finite());
            assert!(value >= param.valid_range.0 && value <= param.valid_range.1);
        }
    }
});
