//! Transmitter state machine
//!
//! Serializes a parallel character onto the line as start bit, N data bits
//! (MSB first) and stop bit. A new character is accepted only on the stop
//! slot, and acceptance is signalled by a one-tick acknowledge pulse.

use crate::frame::{FrameFormat, Level, Position, Slot, DEFAULT_WIDTH};
use crate::traits::Clocked;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Inputs sampled by the transmitter on each tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TxInputs {
    /// Synchronous reset, active high
    pub reset: bool,
    /// Character offered by the host; bits above N are ignored
    pub character: u16,
    /// True while the host wants `character` sent
    pub send_requested: bool,
}

impl TxInputs {
    /// No request, no reset
    pub const fn idle() -> Self {
        Self {
            reset: false,
            character: 0,
            send_requested: false,
        }
    }

    /// Reset asserted
    pub const fn reset() -> Self {
        Self {
            reset: true,
            character: 0,
            send_requested: false,
        }
    }

    /// Request to send `character`
    pub const fn send(character: u16) -> Self {
        Self {
            reset: false,
            character,
            send_requested: true,
        }
    }
}

/// Outputs produced by the transmitter on each tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TxOutputs {
    /// Level driven onto the line this tick
    pub serial: Level,
    /// High for exactly the tick on which a character was accepted
    pub acknowledge: bool,
}

/// Transmitter registers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Transmitter<const N: usize = DEFAULT_WIDTH> {
    /// Slot produced on the next tick
    position: Position<N>,
    /// Remaining data bits, next bit to send in the MSB
    shift: u16,
    /// Request level sampled on the most recent stop-slot tick
    request_latched: bool,
    /// Level driven on the most recent tick
    line: Level,
}

impl<const N: usize> Default for Transmitter<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Transmitter<N> {
    /// Create a transmitter in its reset state (idle on the stop slot)
    pub const fn new() -> Self {
        FrameFormat::<N>::check();
        Self {
            position: Position::STOP,
            shift: 0,
            request_latched: false,
            line: Level::IDLE,
        }
    }

    /// Current frame position
    pub fn position(&self) -> Position<N> {
        self.position
    }

    /// Level driven on the most recent tick
    pub fn serial_out(&self) -> Level {
        self.line
    }

    /// Returns true when parked on the stop slot, able to accept a character
    pub fn is_idle(&self) -> bool {
        self.position.is_stop()
    }

    /// Request level latched on the most recent stop-slot tick
    pub fn request_latched(&self) -> bool {
        self.request_latched
    }

    /// Data bits not yet shifted out, aligned to the MSB
    pub fn shift_buffer(&self) -> u16 {
        self.shift
    }

    /// Advance one tick
    ///
    /// Starts from a copy of the current registers and overrides only what the
    /// active slot specifies.
    pub fn tick(self, inputs: TxInputs) -> (Self, TxOutputs) {
        let mut next = self;
        let mut acknowledge = false;

        if inputs.reset {
            next.position = Position::STOP;
            next.line = Level::IDLE;
            next.request_latched = false;
            return (
                next,
                TxOutputs {
                    serial: next.line,
                    acknowledge,
                },
            );
        }

        match self.position.slot() {
            Slot::Stop => {
                // Trailer of the previous frame (or idle line) is driven on the
                // same tick a new character is accepted, so continuous requests
                // produce frames with no gap.
                next.line = Level::STOP;
                next.request_latched = inputs.send_requested;
                if inputs.send_requested {
                    next.shift = FrameFormat::<N>::mask(inputs.character);
                    next.position = Position::START;
                    acknowledge = true;
                }
            }
            Slot::Start => {
                next.line = Level::START;
                next.position = self.position.next();
            }
            Slot::Data(_) => {
                next.line = Level::from_bit(self.shift & FrameFormat::<N>::MSB != 0);
                next.shift = FrameFormat::<N>::mask(self.shift << 1);
                next.position = self.position.next();
            }
        }

        (
            next,
            TxOutputs {
                serial: next.line,
                acknowledge,
            },
        )
    }
}

impl<const N: usize> Clocked for Transmitter<N> {
    type Inputs = TxInputs;
    type Outputs = TxOutputs;

    fn power_on() -> Self {
        Self::new()
    }

    fn tick(self, inputs: TxInputs) -> (Self, TxOutputs) {
        Transmitter::tick(self, inputs)
    }

    fn frame_position(&self) -> u8 {
        self.position.get()
    }
}
