//! Lockstep point-to-point link
//!
//! Wires one transmitter's serial output to one receiver's serial input
//! through a registered line, and advances both machines on the same tick.
//!
//! ```text
//!  host ──► Transmitter ──► [line register] ──► fault ──► Receiver ──► host
//! ```
//!
//! On every tick the receiver samples the line value committed on the
//! previous tick, both machines compute their next state from their current
//! state, and all updates commit together. A character acknowledged on tick
//! `t` is therefore reported by the receiver on tick `t + N + 3`.

use crate::fault::{Clean, LineFault};
use crate::frame::{Level, DEFAULT_WIDTH};
use crate::receiver::{Receiver, RxInputs, RxOutputs};
use crate::transmitter::{Transmitter, TxInputs, TxOutputs};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Ticks from the acknowledge pulse to the matching ready/error pulse
pub const fn round_trip_ticks<const N: usize>() -> u64 {
    N as u64 + 3
}

/// Everything observable on one link tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkOutputs {
    /// Tick number, starting at 1
    pub tick: u64,
    /// Global reset was asserted on this tick
    pub reset: bool,
    /// Level the receiver sampled (after fault injection)
    pub sampled: Level,
    /// Transmitter outputs
    pub tx: TxOutputs,
    /// Receiver outputs
    pub rx: RxOutputs,
}

/// Link activity counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LinkStats {
    /// Ticks elapsed
    pub ticks: u64,
    /// Characters accepted by the transmitter
    pub accepted: u32,
    /// Frames completed with a valid stop bit
    pub delivered: u32,
    /// Frames completed with a bad stop bit
    pub framing_errors: u32,
    /// Ticks with global reset asserted
    pub resets: u32,
}

impl LinkStats {
    /// Account for one tick
    pub fn record(&mut self, outputs: &LinkOutputs) {
        self.ticks = self.ticks.saturating_add(1);
        if outputs.reset {
            self.resets = self.resets.saturating_add(1);
        }
        if outputs.tx.acknowledge {
            self.accepted = self.accepted.saturating_add(1);
        }
        if outputs.rx.ready {
            self.delivered = self.delivered.saturating_add(1);
        }
        if outputs.rx.error {
            self.framing_errors = self.framing_errors.saturating_add(1);
        }
    }

    /// Frames completed either way
    pub fn completed(&self) -> u32 {
        self.delivered.saturating_add(self.framing_errors)
    }
}

/// Transmitter and receiver joined by a single line
#[derive(Debug, Clone)]
pub struct Link<const N: usize = DEFAULT_WIDTH, F = Clean> {
    tx: Transmitter<N>,
    rx: Receiver<N>,
    /// Level committed by the transmitter on the previous tick
    line: Level,
    tick: u64,
    fault: F,
    stats: LinkStats,
}

impl<const N: usize> Default for Link<N, Clean> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Link<N, Clean> {
    /// Create a link with a clean line, both machines in their reset state
    pub fn new() -> Self {
        Self::with_fault(Clean)
    }
}

impl<const N: usize, F: LineFault> Link<N, F> {
    /// Create a link whose receiver samples through `fault`
    pub fn with_fault(fault: F) -> Self {
        Self {
            tx: Transmitter::new(),
            rx: Receiver::new(),
            line: Level::IDLE,
            tick: 0,
            fault,
            stats: LinkStats::default(),
        }
    }

    /// Advance both machines one tick
    ///
    /// `host.reset` is the global reset and applies to both machines.
    pub fn tick(&mut self, host: TxInputs) -> LinkOutputs {
        self.tick += 1;

        let sampled = self.fault.apply(self.tick, self.line);
        let (tx, tx_out) = self.tx.tick(host);
        let (rx, rx_out) = self.rx.tick(RxInputs {
            reset: host.reset,
            serial: sampled,
        });

        self.tx = tx;
        self.rx = rx;
        self.line = tx_out.serial;

        let outputs = LinkOutputs {
            tick: self.tick,
            reset: host.reset,
            sampled,
            tx: tx_out,
            rx: rx_out,
        };
        self.stats.record(&outputs);
        outputs
    }

    /// Assert global reset for one tick
    pub fn reset(&mut self) -> LinkOutputs {
        self.tick(TxInputs::reset())
    }

    /// Transmitter registers
    pub fn transmitter(&self) -> &Transmitter<N> {
        &self.tx
    }

    /// Receiver registers
    pub fn receiver(&self) -> &Receiver<N> {
        &self.rx
    }

    /// Level currently on the line
    pub fn line(&self) -> Level {
        self.line
    }

    /// Ticks elapsed since construction
    pub fn ticks(&self) -> u64 {
        self.tick
    }

    /// Activity counters
    pub fn stats(&self) -> &LinkStats {
        &self.stats
    }

    /// Mutable access to the fault, e.g. to schedule more glitches
    pub fn fault_mut(&mut self) -> &mut F {
        &mut self.fault
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::{Glitches, StuckAt};
    use crate::receiver::FramingError;

    /// Send one character and return (ack tick, completion tick, result)
    fn send_one<F: LineFault>(
        link: &mut Link<8, F>,
        character: u16,
    ) -> (u64, u64, Result<u16, FramingError>) {
        let mut ack = None;
        let mut inputs = TxInputs::send(character);
        for _ in 0..40 {
            let out = link.tick(inputs);
            if out.tx.acknowledge {
                ack = Some(out.tick);
                inputs = TxInputs::idle();
            }
            if let Some(result) = out.rx.result() {
                return (ack.unwrap(), out.tick, result);
            }
        }
        panic!("frame never completed");
    }

    #[test]
    fn test_round_trip_latency() {
        let mut link = Link::<8>::new();
        let (ack, done, result) = send_one(&mut link, 0x55);
        assert_eq!(ack, 1);
        assert_eq!(done - ack, round_trip_ticks::<8>());
        assert_eq!(result, Ok(0x55));
        assert_eq!(link.stats().accepted, 1);
        assert_eq!(link.stats().delivered, 1);
    }

    #[test]
    fn test_consecutive_characters() {
        let mut link = Link::<8>::new();
        for character in [0x00, 0xFF, 0x81, 0x7E] {
            let (_, _, result) = send_one(&mut link, character);
            assert_eq!(result, Ok(character));
        }
        assert_eq!(link.stats().completed(), 4);
        assert_eq!(link.stats().framing_errors, 0);
    }

    #[test]
    fn test_glitched_stop_bit() {
        let mut fault = Glitches::new();
        // Acknowledge on tick 1, stop bit sampled on tick 1 + N + 3
        fault.force(12, Level::Low).unwrap();
        let mut link = Link::<8, _>::with_fault(fault);

        let (_, done, result) = send_one(&mut link, 0x55);
        assert_eq!(done, 12);
        assert_eq!(result, Err(FramingError { character: 0x55 }));
        assert_eq!(link.receiver().character(), 0x55);
        assert_eq!(link.stats().framing_errors, 1);
    }

    #[test]
    fn test_stuck_low_line_reports_errors() {
        let mut link = Link::<8, _>::with_fault(StuckAt(Level::Low));
        let mut errors = 0;
        for _ in 0..30 {
            let out = link.tick(TxInputs::idle());
            assert!(!out.rx.ready);
            if out.rx.error {
                errors += 1;
                assert_eq!(out.rx.character, 0);
            }
        }
        assert_eq!(errors, 3);
    }

    #[test]
    fn test_global_reset_mid_frame() {
        let mut link = Link::<8>::new();
        link.tick(TxInputs::send(0xAA));
        for _ in 0..5 {
            link.tick(TxInputs::idle());
        }
        assert!(!link.transmitter().is_idle());
        assert!(!link.receiver().is_idle());

        let out = link.reset();
        assert!(out.reset);
        assert!(!out.tx.acknowledge);
        assert!(out.rx.result().is_none());
        assert_eq!(out.tx.serial, Level::IDLE);
        assert!(link.transmitter().is_idle());
        assert!(link.receiver().is_idle());

        // The aborted frame never completes
        for _ in 0..20 {
            let out = link.tick(TxInputs::idle());
            assert!(out.rx.result().is_none());
        }
        assert_eq!(link.stats().resets, 1);
    }

    #[test]
    fn test_idle_link() {
        let mut link = Link::<8>::new();
        for _ in 0..100 {
            let out = link.tick(TxInputs::idle());
            assert_eq!(out.tx.serial, Level::IDLE);
            assert!(!out.tx.acknowledge);
            assert!(out.rx.result().is_none());
        }
        assert_eq!(link.ticks(), 100);
    }
}
