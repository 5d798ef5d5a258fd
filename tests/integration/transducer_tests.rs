//! RS-485 transducer client against a scripted half-duplex bus.

use bioreactor::app::ports::Clock;
use bioreactor::config::TransducerTiming;
use bioreactor::error::{BusError, FrameError, TransducerError};
use bioreactor::transducer::{DEFAULT_PARAMETERS, ExchangeState, TransducerClient};
use futures_lite::future::block_on;

use crate::mock_hw::{Reply, ScriptedBus, VirtualTimebase, f32_response, response};

fn client(bus: &ScriptedBus) -> (TransducerClient<ScriptedBus, VirtualTimebase>, VirtualTimebase) {
    let time = VirtualTimebase::new();
    time.set_now(1_000);
    let c = TransducerClient::new(bus.clone(), time.clone(), TransducerTiming::default());
    (c, time)
}

#[test]
fn request_frame_goes_out_with_driver_enabled() {
    let bus = ScriptedBus::new();
    bus.reply_frame(f32_response(1.25));
    let (mut c, _) = client(&bus);

    let frame = block_on(c.exchange(&DEFAULT_PARAMETERS[0].request, 0)).unwrap();
    assert_eq!(frame.as_slice(), f32_response(1.25).as_slice());

    let s = bus.state();
    assert_eq!(s.written, vec![vec![0x01, 0x03, 0x04, 0x0A, 0x00, 0x02, 0xE5, 0x39]]);
    assert_eq!(s.de_at_write, vec![true]);
    assert_eq!(s.de_log, vec![true, false]);
    assert_eq!(s.flushes, 1);
}

#[test]
fn median_discards_single_outlier() {
    let bus = ScriptedBus::new();
    bus.reply_frame(f32_response(1.20))
        .reply_frame(f32_response(2.90))
        .reply_frame(f32_response(1.25));
    let (mut c, _) = client(&bus);

    let sample = block_on(c.sample(&DEFAULT_PARAMETERS[0])).unwrap();
    assert_eq!(sample.parameter, "level");
    assert!((sample.value - 1.25).abs() < 1e-6);
    assert_eq!(c.state(), ExchangeState::Idle);
    assert_eq!(bus.state().written.len(), 3);
}

#[test]
fn corrupted_attempt_is_dropped_before_median() {
    let bus = ScriptedBus::new();
    let mut bad = f32_response(0.5);
    bad[4] ^= 0x01;
    bus.reply_frame(bad)
        .reply_frame(f32_response(1.0))
        .reply_frame(f32_response(2.0));
    let (mut c, _) = client(&bus);

    let sample = block_on(c.sample(&DEFAULT_PARAMETERS[0])).unwrap();
    // Two survivors: upper middle.
    assert_eq!(sample.value, 2.0);
}

#[test]
fn silent_transducer_yields_none_and_releases_bus() {
    let bus = ScriptedBus::new();
    let (mut c, _) = client(&bus);

    assert!(block_on(c.sample(&DEFAULT_PARAMETERS[1])).is_none());
    let s = bus.state();
    assert_eq!(s.written.len(), 3);
    assert!(!s.de);
    assert_eq!(s.de_log.last(), Some(&false));
}

#[test]
fn silent_exchange_is_bounded_by_receive_window() {
    let bus = ScriptedBus::new();
    let (mut c, time) = client(&bus);
    let timing = TransducerTiming::default();

    let before = time.now_ms();
    let res = block_on(c.exchange(&DEFAULT_PARAMETERS[0].request, 0));
    let elapsed = time.now_ms() - before;

    assert_eq!(res.unwrap_err(), TransducerError::NoResponse);
    let ceiling = u64::from(
        timing.guard_ms + timing.settle_ms + 2 * timing.jitter_step_ms + timing.window_ms + timing.poll_ms,
    );
    assert!(elapsed >= u64::from(timing.window_ms));
    assert!(elapsed <= ceiling, "elapsed {elapsed} > {ceiling}");
}

#[test]
fn all_zero_payload_counts_as_no_reading() {
    let bus = ScriptedBus::new();
    for _ in 0..3 {
        bus.reply_frame(response(0x01, &[0, 0, 0, 0]));
    }
    let (mut c, _) = client(&bus);
    assert!(block_on(c.sample(&DEFAULT_PARAMETERS[0])).is_none());
}

#[test]
fn out_of_range_value_is_rejected_not_clamped() {
    let bus = ScriptedBus::new();
    for _ in 0..3 {
        bus.reply_frame(f32_response(80.0));
    }
    let (mut c, _) = client(&bus);
    // 80 is fine for the probe temperature but not for ambient.
    assert!(block_on(c.sample(&DEFAULT_PARAMETERS[2])).is_none());
}

#[test]
fn exception_response_is_a_frame_error() {
    let bus = ScriptedBus::new();
    let mut exc = vec![0x01, 0x83, 0x02];
    let crc = bioreactor::transducer::crc::crc_bytes(&exc);
    exc.extend_from_slice(&crc);
    bus.reply_frame(exc);
    let (mut c, _) = client(&bus);

    let err = block_on(c.read_once(&DEFAULT_PARAMETERS[0], 0)).unwrap_err();
    assert_eq!(err, TransducerError::Frame(FrameError::Exception(0x02)));
}

#[test]
fn write_failure_still_releases_driver_enable() {
    let bus = ScriptedBus::new();
    bus.set_fail_write(true);
    let (mut c, _) = client(&bus);

    let err = block_on(c.exchange(&DEFAULT_PARAMETERS[0].request, 0)).unwrap_err();
    assert_eq!(err, TransducerError::Bus(BusError::WriteFailed));
    assert!(!bus.state().de);
}

#[test]
fn poll_reports_each_parameter_independently() {
    let bus = ScriptedBus::new();
    for _ in 0..3 {
        bus.reply_frame(f32_response(1.5));
    }
    for _ in 0..3 {
        bus.reply(Reply::Silence);
    }
    for _ in 0..3 {
        bus.reply_frame(f32_response(22.0));
    }
    let (mut c, _) = client(&bus);

    let results = block_on(c.poll());
    assert_eq!(results.len(), 3);
    assert_eq!(results[0], ("level", Some(1.5)));
    assert_eq!(results[1], ("rs485_temperature", None));
    assert_eq!(results[2], ("ambient_temperature", Some(22.0)));
}

#[test]
fn little_endian_payload_is_accepted_through_fallback() {
    // Big-endian this reads ~1.7e38; little-endian it is ~1.5.
    let value = f32::from_bits(0x3FC0_007F);
    let bus = ScriptedBus::new();
    for _ in 0..3 {
        bus.reply_frame(response(0x01, &value.to_le_bytes()));
    }
    let (mut c, _) = client(&bus);

    let sample = block_on(c.sample(&DEFAULT_PARAMETERS[0])).unwrap();
    assert_eq!(sample.value, value);
    assert!((sample.value - 1.5).abs() < 1e-3);
}

#[test]
fn payload_out_of_range_under_every_encoding_yields_none() {
    let bus = ScriptedBus::new();
    for _ in 0..3 {
        bus.reply_frame(response(0x01, &[0x7F, 0x7F, 0x7F, 0x7F]));
    }
    let (mut c, _) = client(&bus);

    assert_eq!(
        block_on(c.read_once(&DEFAULT_PARAMETERS[0], 0)).unwrap_err(),
        TransducerError::Undecodable
    );
    assert!(block_on(c.sample(&DEFAULT_PARAMETERS[0])).is_none());
}
