//! Asynchronous serial line framing, one tick at a time
//!
//! This crate models a start/stop framed serial line as two synchronous
//! state machines that advance exactly once per clock tick. The clock tick
//! rate is the baud rate; there is no divider and no oversampling.
//!
//! # Frame Format
//!
//! ```text
//! idle ─┐     ┌─────┐     ┌─────┬── ... ──┬───────── idle
//!       │START│ D7  │ D6  │ ... │  D0     │ STOP
//!       └─────┘     └─────┘     └──...────┘
//!        slot 0   1     2          N        N+1
//! ```
//!
//! - Start bit: one tick low
//! - Data: N bits, most-significant first (N = 8 by default)
//! - Stop bit: one tick high; a low stop bit is a framing error
//! - No parity, one stop bit
//!
//! # Machines
//!
//! - [`Transmitter`]: accepts a character on the stop slot when the host
//!   requests it, pulses `acknowledge` for one tick, then shifts the frame out.
//! - [`Receiver`]: waits for a low sample, shifts in N bits, then pulses
//!   `ready` (or `error` for a low stop bit) for one tick.
//!
//! Both are pure `(state, inputs) -> (state, outputs)` functions through the
//! [`Clocked`] trait. [`Link`] steps a transmitter and a receiver in lockstep
//! over a registered line, and [`TxHost`] / [`RxSink`] implement the host side
//! of the handshake.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod fault;
pub mod frame;
pub mod host;
pub mod link;
pub mod receiver;
pub mod traits;
pub mod transmitter;

#[cfg(test)]
mod properties;

pub use fault::{Clean, Glitch, Glitches, LineFault, StuckAt};
pub use frame::{FrameFormat, Level, Position, Slot, DEFAULT_WIDTH, MAX_WIDTH};
pub use host::{HostError, Reception, RxSink, TxHost};
pub use link::{Link, LinkOutputs, LinkStats};
pub use receiver::{FramingError, Receiver, RxInputs, RxOutputs};
pub use traits::Clocked;
pub use transmitter::{Transmitter, TxInputs, TxOutputs};
