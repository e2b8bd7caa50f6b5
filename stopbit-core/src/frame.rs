//! Frame geometry shared by the transmitter and the receiver.
//!
//! Frame layout, one slot per tick:
//! ```text
//! ┌───────┬───────────────────────────┬──────┐
//! │ START │ DATA bit N-1 ..= bit 0    │ STOP │
//! │ 0     │ 1 ..= N                   │ N+1  │
//! └───────┴───────────────────────────┴──────┘
//! ```
//!
//! Both machines count the same slots. The transmitter idles on the stop slot,
//! the receiver idles on the start slot.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default character width in bits
pub const DEFAULT_WIDTH: usize = 8;

/// Widest character the 16-bit registers can carry
pub const MAX_WIDTH: usize = 16;

/// Logic level of the serial line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Level {
    /// Logical 0
    Low,
    /// Logical 1
    High,
}

impl Level {
    /// Level held on an idle line
    pub const IDLE: Level = Level::High;
    /// Level of the start bit
    pub const START: Level = Level::Low;
    /// Level of a valid stop bit
    pub const STOP: Level = Level::High;

    /// Level carrying a single data bit
    pub const fn from_bit(bit: bool) -> Self {
        if bit {
            Level::High
        } else {
            Level::Low
        }
    }

    /// Returns true for logical 1
    pub const fn is_high(self) -> bool {
        matches!(self, Level::High)
    }

    /// Returns true for logical 0
    pub const fn is_low(self) -> bool {
        matches!(self, Level::Low)
    }

    /// The level as a single register bit
    pub const fn bit(self) -> u16 {
        match self {
            Level::Low => 0,
            Level::High => 1,
        }
    }

    /// The opposite level
    pub const fn inverted(self) -> Self {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }
}

impl From<bool> for Level {
    fn from(bit: bool) -> Self {
        Level::from_bit(bit)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.is_high() { "1" } else { "0" })
    }
}

/// Compile-time constants for an N-bit frame
///
/// Every machine in this crate is generic over the character width; the
/// constants here are the single source of truth for slot numbering and
/// register masking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameFormat<const N: usize = DEFAULT_WIDTH>;

impl<const N: usize> FrameFormat<N> {
    const VALID: () = assert!(
        N >= 1 && N <= MAX_WIDTH,
        "character width must be between 1 and 16 bits"
    );

    /// Character width in bits
    pub const WIDTH: usize = N;
    /// Slot carrying the start bit
    pub const START_SLOT: u8 = 0;
    /// Slot carrying the stop bit
    pub const STOP_SLOT: u8 = (N + 1) as u8;
    /// Ticks spanned by one complete frame
    pub const TICKS_PER_FRAME: u32 = (N + 2) as u32;
    /// Mask selecting the N character bits of a register
    pub const MASK: u16 = if N >= MAX_WIDTH {
        u16::MAX
    } else {
        (1u16 << N) - 1
    };
    /// Most-significant character bit, the first data bit on the wire
    pub const MSB: u16 = 1u16 << (N - 1);

    /// Force a compile error for unsupported widths
    pub(crate) const fn check() {
        let () = Self::VALID;
    }

    /// Truncate a register value to the character width
    pub const fn mask(character: u16) -> u16 {
        character & Self::MASK
    }

    /// Returns true if the value fits in N bits
    pub const fn fits(character: u16) -> bool {
        character & !Self::MASK == 0
    }

    /// Line levels of a complete frame carrying `character`, in wire order
    pub fn levels(character: u16) -> FrameLevels<N> {
        Self::check();
        FrameLevels {
            character: Self::mask(character),
            position: Position::START,
            done: false,
        }
    }
}

/// Iterator over the N+2 line levels of one frame
#[derive(Debug, Clone)]
pub struct FrameLevels<const N: usize> {
    character: u16,
    position: Position<N>,
    done: bool,
}

impl<const N: usize> Iterator for FrameLevels<N> {
    type Item = Level;

    fn next(&mut self) -> Option<Level> {
        if self.done {
            return None;
        }
        let level = match self.position.slot() {
            Slot::Start => Level::START,
            Slot::Data(bit) => Level::from_bit(self.character & (1 << bit) != 0),
            Slot::Stop => {
                self.done = true;
                Level::STOP
            }
        };
        self.position = self.position.next();
        Some(level)
    }
}

/// What a frame position carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Slot {
    /// Start bit (position 0)
    Start,
    /// Data bit with the given character bit index (N-1 at position 1 down to 0 at position N)
    Data(u8),
    /// Stop bit (position N+1)
    Stop,
}

/// Frame position counter, always within `0..=N+1`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u8", into = "u8"))]
pub struct Position<const N: usize = DEFAULT_WIDTH>(u8);

impl<const N: usize> Position<N> {
    /// Start-bit slot; the receiver's idle position
    pub const START: Self = Position(FrameFormat::<N>::START_SLOT);
    /// Stop-bit slot; the transmitter's idle position
    pub const STOP: Self = Position(FrameFormat::<N>::STOP_SLOT);

    /// Create a position, rejecting values outside `0..=N+1`
    pub const fn new(slot: u8) -> Option<Self> {
        FrameFormat::<N>::check();
        if slot <= FrameFormat::<N>::STOP_SLOT {
            Some(Position(slot))
        } else {
            None
        }
    }

    /// Raw slot number
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Classify the slot
    pub const fn slot(self) -> Slot {
        if self.0 == FrameFormat::<N>::START_SLOT {
            Slot::Start
        } else if self.0 == FrameFormat::<N>::STOP_SLOT {
            Slot::Stop
        } else {
            Slot::Data(N as u8 - self.0)
        }
    }

    /// The following slot; the stop slot wraps to the start slot
    pub const fn next(self) -> Self {
        if self.0 == FrameFormat::<N>::STOP_SLOT {
            Self::START
        } else {
            Position(self.0 + 1)
        }
    }

    /// Returns true on the start-bit slot
    pub const fn is_start(self) -> bool {
        self.0 == FrameFormat::<N>::START_SLOT
    }

    /// Returns true on the stop-bit slot
    pub const fn is_stop(self) -> bool {
        self.0 == FrameFormat::<N>::STOP_SLOT
    }
}

impl<const N: usize> From<Position<N>> for u8 {
    fn from(position: Position<N>) -> u8 {
        position.0
    }
}

impl<const N: usize> TryFrom<u8> for Position<N> {
    type Error = PositionOutOfRange;

    fn try_from(slot: u8) -> Result<Self, Self::Error> {
        Position::new(slot).ok_or(PositionOutOfRange {
            slot,
            max: FrameFormat::<N>::STOP_SLOT,
        })
    }
}

/// A slot number outside `0..=N+1`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PositionOutOfRange {
    /// Rejected slot
    pub slot: u8,
    /// Highest valid slot (the stop slot)
    pub max: u8,
}

impl fmt::Display for PositionOutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame position {} outside 0..={}", self.slot, self.max)
    }
}
