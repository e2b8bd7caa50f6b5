//! Receiver state machine
//!
//! Samples the line once per tick, waits for a start bit, shifts in N data
//! bits MSB first and checks the stop bit. The assembled character is always
//! copied to the output buffer at the stop slot; the stop level decides
//! between the ready and error strobes.

use core::fmt;

use crate::frame::{FrameFormat, Level, Position, Slot, DEFAULT_WIDTH};
use crate::traits::Clocked;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Stop bit sampled low
///
/// Carries the character assembled from the malformed frame, which is still
/// delivered on the output buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FramingError {
    /// Bits shifted in before the bad stop bit
    pub character: u16,
}

impl fmt::Display for FramingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "framing error (stop bit low), payload {:#06x}", self.character)
    }
}

/// Inputs sampled by the receiver on each tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RxInputs {
    /// Synchronous reset, active high
    pub reset: bool,
    /// Line level sampled this tick
    pub serial: Level,
}

impl RxInputs {
    /// Sample `serial` without reset
    pub const fn sample(serial: Level) -> Self {
        Self {
            reset: false,
            serial,
        }
    }

    /// Reset asserted; the line is treated as idle
    pub const fn reset() -> Self {
        Self {
            reset: true,
            serial: Level::IDLE,
        }
    }
}

/// Outputs produced by the receiver on each tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RxOutputs {
    /// Last completed character, valid until the next completion
    pub character: u16,
    /// High for the tick on which a valid frame completed
    pub ready: bool,
    /// High for the tick on which a frame completed with a bad stop bit
    pub error: bool,
}

impl RxOutputs {
    /// Completion reported this tick, if any
    pub fn result(&self) -> Option<Result<u16, FramingError>> {
        if self.ready {
            Some(Ok(self.character))
        } else if self.error {
            Some(Err(FramingError {
                character: self.character,
            }))
        } else {
            None
        }
    }
}

/// Receiver registers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Receiver<const N: usize = DEFAULT_WIDTH> {
    /// Slot expected on the next tick
    position: Position<N>,
    /// Bits of the frame in progress, most recent in the LSB
    accumulator: u16,
    /// Last completed character
    character: u16,
}

impl<const N: usize> Default for Receiver<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Receiver<N> {
    /// Create a receiver in its reset state (awaiting a start bit)
    pub const fn new() -> Self {
        FrameFormat::<N>::check();
        Self {
            position: Position::START,
            accumulator: 0,
            character: 0,
        }
    }

    /// Current frame position
    pub fn position(&self) -> Position<N> {
        self.position
    }

    /// Last completed character
    pub fn character(&self) -> u16 {
        self.character
    }

    /// Returns true while waiting for a start bit
    pub fn is_idle(&self) -> bool {
        self.position.is_start()
    }

    /// Advance one tick
    pub fn tick(self, inputs: RxInputs) -> (Self, RxOutputs) {
        let mut next = self;
        let mut ready = false;
        let mut error = false;

        if inputs.reset {
            next.position = Position::START;
        } else {
            match self.position.slot() {
                Slot::Start => {
                    if inputs.serial == Level::START {
                        next.position = self.position.next();
                    }
                }
                Slot::Data(_) => {
                    next.accumulator =
                        FrameFormat::<N>::mask((self.accumulator << 1) | inputs.serial.bit());
                    next.position = self.position.next();
                }
                Slot::Stop => {
                    next.character = self.accumulator;
                    if inputs.serial == Level::STOP {
                        ready = true;
                    } else {
                        error = true;
                    }
                    next.position = Position::START;
                }
            }
        }

        (
            next,
            RxOutputs {
                character: next.character,
                ready,
                error,
            },
        )
    }
}

impl<const N: usize> Clocked for Receiver<N> {
    type Inputs = RxInputs;
    type Outputs = RxOutputs;

    fn power_on() -> Self {
        Self::new()
    }

    fn tick(self, inputs: RxInputs) -> (Self, RxOutputs) {
        Receiver::tick(self, inputs)
    }

    fn frame_position(&self) -> u8 {
        self.position.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME_0X55: [u16; 10] = [0, 0, 1, 0, 1, 0, 1, 0, 1, 1];

    /// Feed bits, returning the receiver and the outputs of the final tick
    fn feed(mut rx: Receiver<8>, bits: &[u16]) -> (Receiver<8>, Option<RxOutputs>) {
        let mut last = None;
        for &bit in bits {
            let (next, out) = rx.tick(RxInputs::sample(Level::from_bit(bit != 0)));
            rx = next;
            last = Some(out);
        }
        (rx, last)
    }

    #[test]
    fn test_receive_0x55() {
        let (rx, before) = feed(Receiver::new(), &FRAME_0X55[..9]);
        let before = before.unwrap();
        assert!(!before.ready);
        assert!(!before.error);

        let (rx, out) = feed(rx, &FRAME_0X55[9..]);
        let out = out.unwrap();
        assert!(out.ready);
        assert!(!out.error);
        assert_eq!(out.character, 0x55);
        assert_eq!(out.result(), Some(Ok(0x55)));
        assert!(rx.is_idle());
    }

    #[test]
    fn test_framing_error_still_delivers() {
        let mut bits = FRAME_0X55;
        bits[9] = 0;
        let (rx, out) = feed(Receiver::new(), &bits);
        let out = out.unwrap();
        assert!(out.error);
        assert!(!out.ready);
        assert_eq!(out.character, 0x55);
        assert_eq!(
            out.result(),
            Some(Err(FramingError { character: 0x55 }))
        );
        assert_eq!(rx.character(), 0x55);
        assert!(rx.is_idle());
    }

    #[test]
    fn test_idle_line_never_starts() {
        let mut rx = Receiver::<8>::new();
        for _ in 0..50 {
            let (next, out) = rx.tick(RxInputs::sample(Level::High));
            assert!(out.result().is_none());
            rx = next;
        }
        assert!(rx.is_idle());
    }

    #[test]
    fn test_next_start_bit_right_after_stop() {
        let mut bits = [0u16; 20];
        bits[..10].copy_from_slice(&FRAME_0X55);
        // 0xF0 framed with no gap
        bits[10..].copy_from_slice(&[0, 1, 1, 1, 1, 0, 0, 0, 0, 1]);

        let (_, first) = feed(Receiver::new(), &bits[..10]);
        assert_eq!(first.unwrap().result(), Some(Ok(0x55)));

        let (rx, _) = feed(Receiver::new(), &bits[..10]);
        let (_, second) = feed(rx, &bits[10..]);
        assert_eq!(second.unwrap().result(), Some(Ok(0xF0)));
    }

    #[test]
    fn test_output_held_between_frames() {
        let (rx, _) = feed(Receiver::new(), &FRAME_0X55);
        let (rx, out) = feed(rx, &[1, 1, 1, 0, 1, 1]);
        let out = out.unwrap();
        assert_eq!(out.character, 0x55);
        assert!(!out.ready);
        assert_eq!(rx.character(), 0x55);
    }

    #[test]
    fn test_reset_aborts_frame_silently() {
        let (rx, _) = feed(Receiver::new(), &FRAME_0X55[..5]);
        assert_eq!(rx.position().get(), 5);

        let (rx, out) = rx.tick(RxInputs::reset());
        assert!(rx.is_idle());
        assert!(!out.ready);
        assert!(!out.error);
    }

    #[test]
    fn test_reset_on_stop_slot_emits_no_strobe() {
        let (rx, _) = feed(Receiver::new(), &FRAME_0X55[..9]);
        assert!(rx.position().is_stop());

        let (rx, out) = rx.tick(RxInputs::reset());
        assert!(rx.is_idle());
        assert!(out.result().is_none());
    }

    #[test]
    fn test_reset_keeps_output_buffer() {
        let (rx, _) = feed(Receiver::new(), &FRAME_0X55);
        let (rx, out) = rx.tick(RxInputs::reset());
        assert_eq!(out.character, 0x55);
        assert_eq!(rx.character(), 0x55);
    }

    #[test]
    fn test_narrow_width() {
        let mut rx = Receiver::<5>::new();
        for bit in [0u16, 1, 0, 0, 1, 1, 1] {
            let (next, out) = rx.tick(RxInputs::sample(Level::from_bit(bit != 0)));
            rx = next;
            if let Some(result) = out.result() {
                assert_eq!(result, Ok(0b10011));
            }
        }
        assert_eq!(rx.character(), 0b10011);
    }
}
