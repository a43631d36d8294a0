//! End-to-end tests for the frame stream
//!
//! Encoder output goes through the same text path a QR code would carry
//! (optionally uppercased, shuffled, repeated) and into a fresh Decoder.

use airgap_ur::fountain::xoshiro::Xoshiro256;
use airgap_ur::{
    decode_frame, encode_frame, DecodeError, Decoder, Encoder, EncoderConfig, Frame, Part, Receipt,
    Ur,
};
use bytes::Bytes;
use std::time::{Duration, Instant};
use proptest::prelude::*;

// =============================================================================
// Helpers
// =============================================================================

fn payload(len: usize) -> Vec<u8> {
    Xoshiro256::from_seed(b"round trip payload").next_data(len)
}

fn frames(encoder: &mut Encoder, count: usize) -> Vec<String> {
    (0..count).map(|_| encoder.next_part()).collect()
}

/// Fisher-Yates shuffle driven by a seeded generator
fn shuffle<T>(items: &mut [T], seed: u64) {
    let mut rng = Xoshiro256::from_seed(&seed.to_be_bytes());
    for i in (1..items.len()).rev() {
        let j = rng.next_int(0, i as u64) as usize;
        items.swap(i, j);
    }
}

/// Feed frames until complete, returning how many were consumed
fn feed(decoder: &mut Decoder, frames: &[String]) -> usize {
    for (i, frame) in frames.iter().enumerate() {
        decoder.receive(frame).unwrap();
        if decoder.is_complete() {
            return i + 1;
        }
    }
    frames.len()
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn test_four_pure_fragments_any_order() {
    let message = payload(37);
    let mut encoder = Encoder::new(Ur::new("test", message.clone()).unwrap(), 10).unwrap();
    assert_eq!(encoder.fragment_count(), 4);

    let mut pure = frames(&mut encoder, 4);
    pure.reverse();
    pure.swap(1, 2);

    let mut decoder = Decoder::new();
    assert_eq!(feed(&mut decoder, &pure), 4);
    let ur = decoder.result().unwrap();
    assert_eq!(ur.ur_type(), "test");
    assert_eq!(&ur.message()[..], &message[..]);
}

#[test]
fn test_single_frame_repeats() {
    let message = payload(5);
    let mut encoder = Encoder::new(Ur::new("test", message.clone()).unwrap(), 100).unwrap();
    let shown = frames(&mut encoder, 5);
    assert!(shown.iter().all(|frame| frame == &shown[0]));

    for frame in &shown {
        let mut decoder = Decoder::new();
        assert_eq!(decoder.receive(frame).unwrap(), Receipt::Accepted);
        assert!(decoder.is_complete());
        assert_eq!(&decoder.result().unwrap().message()[..], &message[..]);
    }
}

#[test]
fn test_recovers_without_every_pure_fragment() {
    let message = payload(1000);
    let config = EncoderConfig {
        max_fragment_len: 100,
        min_fragment_len: 10,
        repair_ratio_bps: 50_000,
    };
    let mut encoder = Encoder::with_config(Ur::new("bytes", message.clone()).unwrap(), &config).unwrap();
    assert_eq!(encoder.fragment_count(), 10);
    assert_eq!(encoder.cycle_len(), 60);

    // One cycle, but pure fragments 2 and 5 never reach the scanner
    let seen: Vec<String> = frames(&mut encoder, 60)
        .into_iter()
        .enumerate()
        .filter(|(i, _)| *i != 1 && *i != 4)
        .map(|(_, frame)| frame)
        .collect();

    let mut decoder = Decoder::new();
    feed(&mut decoder, &seen);
    assert!(decoder.is_complete());
    assert_eq!(&decoder.result().unwrap().message()[..], &message[..]);
}

#[test]
fn test_interleaved_foreign_stream_is_ignored() {
    let ours = payload(300);
    let theirs: Vec<u8> = ours.iter().map(|b| b ^ 0xff).collect();
    let mut our_encoder = Encoder::new(Ur::new("bytes", ours.clone()).unwrap(), 50).unwrap();
    let mut their_encoder = Encoder::new(Ur::new("bytes", theirs).unwrap(), 50).unwrap();

    let mut decoder = Decoder::new();
    decoder.receive(&our_encoder.next_part()).unwrap();

    let mut foreign = 0;
    while !decoder.is_complete() {
        match decoder.receive(&their_encoder.next_part()) {
            Err(DecodeError::Foreign { .. }) => foreign += 1,
            other => panic!("expected foreign frame, got {:?}", other),
        }
        decoder.receive(&our_encoder.next_part()).unwrap();
    }

    assert!(foreign > 0);
    assert_eq!(&decoder.result().unwrap().message()[..], &ours[..]);
}

#[test]
fn test_garbage_lines_do_not_disturb_session() {
    let message = payload(120);
    let mut encoder = Encoder::new(Ur::new("bytes", message.clone()).unwrap(), 40).unwrap();
    let mut decoder = Decoder::new();

    for junk in ["", "hello", "ur:", "ur:bytes/1-3/zzzz", "UR:BYTES/0-3/AEAEAEAE"] {
        assert!(matches!(
            decoder.receive(junk),
            Err(DecodeError::Malformed { .. })
        ));
    }
    assert_eq!(decoder.processed_parts_count(), 0);

    while !decoder.is_complete() {
        decoder.receive(&encoder.next_part()).unwrap();
    }
    assert_eq!(&decoder.result().unwrap().message()[..], &message[..]);
}

#[test]
fn test_result_before_completion() {
    let decoder = Decoder::new();
    assert!(matches!(
        decoder.result(),
        Err(DecodeError::Incomplete { .. })
    ));
}

#[test]
fn test_frame_text_survives_uppercase() {
    let mut encoder = Encoder::new(Ur::new("crypto-psbt", payload(200)).unwrap(), 60).unwrap();
    for frame in frames(&mut encoder, 10) {
        let upper = frame.to_uppercase();
        assert!(upper
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || ":/-".contains(c)));
        assert_eq!(decode_frame(&upper).unwrap(), decode_frame(&frame).unwrap());
        assert_eq!(encode_frame(&decode_frame(&upper).unwrap()), frame);
    }
}

#[test]
fn test_repair_ratio_changes_cycle() {
    let ur = Ur::new("bytes", payload(500)).unwrap();
    let lean = Encoder::with_config(
        ur.clone(),
        &EncoderConfig {
            max_fragment_len: 50,
            min_fragment_len: 10,
            repair_ratio_bps: 0,
        },
    )
    .unwrap();
    let heavy = Encoder::with_config(
        ur,
        &EncoderConfig {
            max_fragment_len: 50,
            min_fragment_len: 10,
            repair_ratio_bps: 20_000,
        },
    )
    .unwrap();

    assert_eq!(lean.cycle_len(), 10);
    assert_eq!(heavy.cycle_len(), 30);
}

// =============================================================================
// Properties
// =============================================================================

fn message_bytes() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 1..1500)
}

/// Header field values, weighted toward the edges
fn header_field() -> impl Strategy<Value = u32> {
    prop_oneof![
        Just(0u32),
        Just(1u32),
        1u32..128,
        Just(u32::MAX),
        any::<u32>(),
    ]
}

fn type_tag() -> impl Strategy<Value = String> {
    "[a-z0-9]{1,8}(-[a-z0-9]{1,8}){0,2}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Two full cycles in any order, with repeats, always recover the payload
    #[test]
    fn prop_shuffled_stream_round_trips(
        message in message_bytes(),
        ur_type in type_tag(),
        max_fragment_len in 10usize..300,
        seed in any::<u64>(),
        uppercase in any::<bool>(),
    ) {
        let ur = Ur::new(ur_type, message).unwrap();
        let mut encoder = Encoder::new(ur.clone(), max_fragment_len).unwrap();
        let cycle = encoder.cycle_len().max(1);

        let mut stream = frames(&mut encoder, cycle * 2);
        let repeats: Vec<String> = stream.iter().step_by(3).cloned().collect();
        stream.extend(repeats);
        shuffle(&mut stream, seed);
        if uppercase {
            stream.iter_mut().for_each(|frame| frame.make_ascii_uppercase());
        }

        let mut decoder = Decoder::new();
        for frame in &stream {
            let receipt = decoder.receive(frame);
            prop_assert!(receipt.is_ok(), "unexpected {:?}", receipt);
        }
        prop_assert!(decoder.is_complete());
        prop_assert_eq!(decoder.result().unwrap(), &ur);
    }

    /// Same payload and settings always give the same frames
    #[test]
    fn prop_encoder_is_deterministic(
        message in message_bytes(),
        max_fragment_len in 10usize..300,
    ) {
        let ur = Ur::new("bytes", message).unwrap();
        let mut first = Encoder::new(ur.clone(), max_fragment_len).unwrap();
        let mut second = Encoder::new(ur, max_fragment_len).unwrap();
        let count = first.cycle_len() * 2 + 3;
        prop_assert_eq!(frames(&mut first, count), frames(&mut second, count));

        first.reset();
        let replay = frames(&mut first, count);
        second.reset();
        prop_assert_eq!(replay, frames(&mut second, count));
    }

    /// The first F frames are the pure fragments in order
    #[test]
    fn prop_pure_fragments_lead_each_stream(
        message in message_bytes(),
        max_fragment_len in 10usize..300,
    ) {
        let ur = Ur::new("bytes", message).unwrap();
        let mut encoder = Encoder::new(ur, max_fragment_len).unwrap();
        prop_assume!(!encoder.is_single_part());
        let fragments = encoder.fragment_count();

        let mut decoder = Decoder::new();
        for (i, frame) in frames(&mut encoder, fragments).iter().enumerate() {
            let expected_seq = format!("/{}-{}/", i + 1, fragments);
            prop_assert!(frame.contains(&expected_seq));
            prop_assert_eq!(decoder.receive(frame).unwrap(), Receipt::Accepted);
        }
        prop_assert!(decoder.is_complete());
    }

    /// Re-feeding frames after completion changes nothing
    #[test]
    fn prop_receive_is_idempotent(
        message in message_bytes(),
        max_fragment_len in 10usize..300,
    ) {
        let ur = Ur::new("bytes", message).unwrap();
        let mut encoder = Encoder::new(ur.clone(), max_fragment_len).unwrap();
        let cycle = encoder.cycle_len().max(1);
        let stream = frames(&mut encoder, cycle);

        let mut decoder = Decoder::new();
        let used = feed(&mut decoder, &stream);
        prop_assert!(decoder.is_complete());
        let processed = decoder.processed_parts_count();

        for frame in &stream[..used] {
            prop_assert_eq!(decoder.receive(frame).unwrap(), Receipt::Duplicate);
        }
        prop_assert_eq!(decoder.processed_parts_count(), processed);
        prop_assert_eq!(decoder.result().unwrap(), &ur);
    }

    /// Arbitrary text never panics the decoder and never completes it
    #[test]
    fn prop_random_text_is_rejected(text in ".{0,200}") {
        let mut decoder = Decoder::new();
        prop_assert!(decoder.receive(&text).is_err());
        prop_assert!(!decoder.is_complete());
    }

    /// Well-formed frames with arbitrary header claims are answered quickly
    /// and never take the decoder down
    #[test]
    fn prop_arbitrary_headers_are_bounded(
        seq_num in header_field(),
        seq_len in header_field(),
        message_len in header_field(),
        checksum in any::<u32>(),
        data in prop::collection::vec(any::<u8>(), 1..64),
    ) {
        let frame = encode_frame(&Frame::Multi {
            ur_type: "bytes".to_string(),
            part: Part {
                seq_num,
                seq_len: seq_len as usize,
                message_len: message_len as usize,
                checksum,
                data: Bytes::from(data),
            },
        });

        let mut decoder = Decoder::new();
        let started = Instant::now();
        let outcome = decoder.receive(&frame);
        prop_assert!(started.elapsed() < Duration::from_secs(1));
        prop_assert!(
            matches!(
                outcome,
                Ok(_) | Err(DecodeError::Malformed { .. }) | Err(DecodeError::Corrupted { .. })
            ),
            "unexpected {:?}",
            outcome
        );
    }
}
