//! Host-side handshake adapters
//!
//! [`TxHost`] keeps the send request and character stable until the
//! transmitter acknowledges, so characters are neither dropped nor sent twice.
//! [`RxSink`] collects completions from the receiver's strobes.

use core::fmt;

use heapless::Deque;

use crate::frame::{FrameFormat, DEFAULT_WIDTH};
use crate::receiver::{FramingError, RxOutputs};
use crate::transmitter::{TxInputs, TxOutputs};

/// Default queue depth
pub const DEFAULT_QUEUE_DEPTH: usize = 16;

/// Host adapter errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HostError {
    /// Send queue is full; the rejected character is returned
    QueueFull(u16),
    /// Character has bits set above the frame width
    TooWide(u16),
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostError::QueueFull(c) => write!(f, "send queue full, dropped {:#06x}", c),
            HostError::TooWide(c) => write!(f, "character {:#06x} wider than the frame", c),
        }
    }
}

/// Send queue driving the transmitter's request handshake
#[derive(Debug, Clone)]
pub struct TxHost<const N: usize = DEFAULT_WIDTH, const Q: usize = DEFAULT_QUEUE_DEPTH> {
    queue: Deque<u16, Q>,
}

impl<const N: usize, const Q: usize> Default for TxHost<N, Q> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize, const Q: usize> TxHost<N, Q> {
    /// Create an empty send queue
    pub const fn new() -> Self {
        Self {
            queue: Deque::new(),
        }
    }

    /// Queue a character for transmission
    pub fn enqueue(&mut self, character: u16) -> Result<(), HostError> {
        if !FrameFormat::<N>::fits(character) {
            return Err(HostError::TooWide(character));
        }
        self.queue.push_back(character).map_err(HostError::QueueFull)
    }

    /// Queue several characters, stopping at the first failure
    pub fn enqueue_all(&mut self, characters: &[u16]) -> Result<(), HostError> {
        for &character in characters {
            self.enqueue(character)?;
        }
        Ok(())
    }

    /// Transmitter inputs for this tick
    ///
    /// The queue head is offered with the request asserted until it is
    /// acknowledged.
    pub fn inputs(&self) -> TxInputs {
        match self.queue.front() {
            Some(&character) => TxInputs::send(character),
            None => TxInputs::idle(),
        }
    }

    /// Consume the transmitter outputs of this tick
    ///
    /// Returns the character that was accepted, if the acknowledge strobe
    /// fired.
    pub fn observe(&mut self, outputs: &TxOutputs) -> Option<u16> {
        if outputs.acknowledge {
            self.queue.pop_front()
        } else {
            None
        }
    }

    /// Characters still waiting for an acknowledge
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Returns true when every queued character has been accepted
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Drop all queued characters
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

/// A completed frame as seen by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reception {
    /// Tick of the ready or error strobe
    pub tick: u64,
    /// Character, or the framing error carrying it
    pub result: Result<u16, FramingError>,
}

impl Reception {
    /// Payload regardless of the stop bit
    pub fn character(&self) -> u16 {
        match self.result {
            Ok(c) => c,
            Err(e) => e.character,
        }
    }
}

/// Bounded history of receiver completions, oldest evicted first
#[derive(Debug, Clone)]
pub struct RxSink<const Q: usize = DEFAULT_QUEUE_DEPTH> {
    history: Deque<Reception, Q>,
    evicted: u32,
}

impl<const Q: usize> Default for RxSink<Q> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const Q: usize> RxSink<Q> {
    /// Create an empty sink
    pub const fn new() -> Self {
        Self {
            history: Deque::new(),
            evicted: 0,
        }
    }

    /// Consume the receiver outputs of `tick`
    ///
    /// Samples the output buffer only while a strobe is high, as a host must.
    pub fn observe(&mut self, tick: u64, outputs: &RxOutputs) -> Option<Reception> {
        let reception = Reception {
            tick,
            result: outputs.result()?,
        };
        if self.history.is_full() {
            self.history.pop_front();
            self.evicted = self.evicted.saturating_add(1);
        }
        // Cannot fail: a slot was freed above
        let _ = self.history.push_back(reception);
        Some(reception)
    }

    /// Take the oldest reception
    pub fn pop(&mut self) -> Option<Reception> {
        self.history.pop_front()
    }

    /// Retained receptions, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &Reception> {
        self.history.iter()
    }

    /// Characters of valid frames, oldest first
    pub fn characters(&self) -> impl Iterator<Item = u16> + '_ {
        self.history.iter().filter_map(|r| r.result.ok())
    }

    /// Retained framing errors
    pub fn framing_errors(&self) -> usize {
        self.history.iter().filter(|r| r.result.is_err()).count()
    }

    /// Retained receptions
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// Returns true if nothing is retained
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Receptions dropped because the history was full
    pub fn evicted(&self) -> u32 {
        self.evicted
    }
}
