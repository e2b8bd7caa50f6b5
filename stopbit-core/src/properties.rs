//! Property tests across the transmitter, receiver and link

use proptest::prelude::*;

use crate::frame::{FrameFormat, Level, Position};
use crate::host::{RxSink, TxHost};
use crate::link::{round_trip_ticks, Link};
use crate::receiver::{FramingError, Receiver, RxInputs};
use crate::traits::Clocked;
use crate::transmitter::{Transmitter, TxInputs};

/// Send one character over a clean link; returns (ack tick, completion tick, result)
fn round_trip<const N: usize>(character: u16) -> (u64, u64, Result<u16, FramingError>) {
    let mut link = Link::<N>::new();
    let mut host = TxHost::<N, 1>::new();
    host.enqueue(character).unwrap();

    let mut ack = 0;
    for _ in 0..(N + 8) {
        let out = link.tick(host.inputs());
        if host.observe(&out.tx).is_some() {
            ack = out.tick;
        }
        if let Some(result) = out.rx.result() {
            return (ack, out.tick, result);
        }
    }
    panic!("no completion");
}

proptest! {
    #[test]
    fn test_round_trip_eight_bit(character in 0u16..=0xFF) {
        let (ack, done, result) = round_trip::<8>(character);
        prop_assert_eq!(ack, 1);
        prop_assert_eq!(done, ack + round_trip_ticks::<8>());
        prop_assert_eq!(result, Ok(character));
    }

    #[test]
    fn test_round_trip_other_widths(character in any::<u16>()) {
        let (_, _, result) = round_trip::<5>(FrameFormat::<5>::mask(character));
        prop_assert_eq!(result, Ok(FrameFormat::<5>::mask(character)));

        let (_, _, result) = round_trip::<9>(FrameFormat::<9>::mask(character));
        prop_assert_eq!(result, Ok(FrameFormat::<9>::mask(character)));

        let (_, _, result) = round_trip::<16>(character);
        prop_assert_eq!(result, Ok(character));
    }

    #[test]
    fn test_continuous_requests_space_acks_by_frame_length(
        message in prop::collection::vec(0u16..=0xFF, 2..12)
    ) {
        let mut link = Link::<8>::new();
        let mut host = TxHost::<8, 16>::new();
        let mut sink = RxSink::<16>::new();
        host.enqueue_all(&message).unwrap();

        let mut acks = Vec::new();
        for _ in 0..(message.len() * 10 + 12) {
            let out = link.tick(host.inputs());
            if host.observe(&out.tx).is_some() {
                acks.push(out.tick);
            }
            sink.observe(out.tick, &out.rx);
        }

        prop_assert_eq!(acks.len(), message.len());
        for pair in acks.windows(2) {
            prop_assert_eq!(pair[1] - pair[0], u64::from(FrameFormat::<8>::TICKS_PER_FRAME));
        }
        let received: Vec<u16> = sink.characters().collect();
        prop_assert_eq!(received, message);
    }

    #[test]
    fn test_positions_stay_in_range(
        steps in prop::collection::vec(
            (prop::bool::weighted(0.05), any::<bool>(), any::<u16>(), any::<bool>()),
            1..400,
        )
    ) {
        let mut tx = Transmitter::<8>::power_on();
        let mut rx = Receiver::<8>::power_on();
        for (reset, send_requested, character, serial) in steps {
            let (next_tx, tx_out) = tx.tick(TxInputs { reset, character, send_requested });
            let (next_rx, rx_out) = rx.tick(RxInputs { reset, serial: Level::from_bit(serial) });
            tx = next_tx;
            rx = next_rx;

            prop_assert!(tx.frame_position() <= FrameFormat::<8>::STOP_SLOT);
            prop_assert!(rx.frame_position() <= FrameFormat::<8>::STOP_SLOT);
            prop_assert!(!(rx_out.ready && rx_out.error));
            if tx_out.acknowledge {
                prop_assert_eq!(tx.position(), Position::START);
            }
        }
    }

    #[test]
    fn test_reset_is_immediate(character in 0u16..=0xFF, before in 0usize..40) {
        let mut link = Link::<8>::new();
        link.tick(TxInputs::send(character));
        for _ in 0..before {
            link.tick(TxInputs::idle());
        }

        let out = link.reset();
        prop_assert!(!out.tx.acknowledge);
        prop_assert!(!out.rx.ready);
        prop_assert!(!out.rx.error);
        prop_assert_eq!(out.tx.serial, Level::IDLE);
        prop_assert!(link.transmitter().is_idle());
        prop_assert!(link.receiver().is_idle());
    }

    #[test]
    fn test_bad_stop_bit_still_delivers(character in 0u16..=0xFF) {
        let mut samples: Vec<Level> = FrameFormat::<8>::levels(character).collect();
        let stop = samples.len() - 1;
        samples[stop] = Level::Low;

        let outputs: Vec<_> = Receiver::<8>::power_on()
            .run(samples.into_iter().map(RxInputs::sample))
            .collect();
        for out in &outputs[..stop] {
            prop_assert!(out.result().is_none());
        }
        prop_assert_eq!(outputs[stop].result(), Some(Err(FramingError { character })));
    }

    #[test]
    fn test_idle_line_is_stable(ticks in 1usize..500) {
        let mut link = Link::<8>::new();
        for _ in 0..ticks {
            let out = link.tick(TxInputs::idle());
            prop_assert_eq!(out.tx.serial, Level::IDLE);
            prop_assert!(!out.tx.acknowledge);
            prop_assert!(out.rx.result().is_none());
        }
    }
}
