//! Scenario runner
//!
//! Drives a [`Link`] tick by tick from a [`Scenario`]: applies resets, feeds
//! the send queue through the handshake, injects line faults and records
//! every tick. The run ends once all traffic has completed and the line has
//! been quiet for `drain_ticks`, or at `max_ticks`.

use log::{debug, info, trace, warn};
use stopbit_core::fault::MAX_GLITCHES;
use stopbit_core::{
    Glitches, HostError, Level, Link, LinkStats, Reception, RxSink, TxHost, TxInputs,
};

use crate::error::{RunError, ScenarioError};
use crate::scenario::{Expect, Scenario, MAX_CHARACTERS};
use crate::trace::{Trace, TraceRow};

/// Result of one simulation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Character width used
    pub data_bits: u8,
    /// Ticks simulated
    pub ticks: u64,
    /// Link counters
    pub stats: LinkStats,
    /// Characters acknowledged by the transmitter, in order
    pub sent: Vec<u16>,
    /// Characters still queued when the run ended
    pub unsent: usize,
    /// Every completed frame, in order
    pub receptions: Vec<Reception>,
    /// Per-tick signals
    pub trace: Trace,
}

impl Report {
    /// Characters of valid frames, in order
    pub fn received(&self) -> Vec<u16> {
        self.receptions
            .iter()
            .filter_map(|r| r.result.ok())
            .collect()
    }

    /// Number of frames with a bad stop bit
    pub fn framing_errors(&self) -> u32 {
        self.stats.framing_errors
    }

    /// Compare the run against an `[expect]` block
    pub fn check(&self, expect: &Expect) -> Result<(), RunError> {
        if let Some(expected) = &expect.received {
            let received = self.received();
            if &received != expected {
                return Err(RunError::ReceivedMismatch {
                    expected: expected.clone(),
                    received,
                });
            }
        }
        if let Some(expected) = expect.framing_errors {
            if expected != self.framing_errors() {
                return Err(RunError::FramingErrors {
                    expected,
                    actual: self.framing_errors(),
                });
            }
        }
        if expect.all_sent && self.unsent > 0 {
            return Err(RunError::Unsent {
                pending: self.unsent,
            });
        }
        Ok(())
    }
}

/// Run a validated scenario at its configured width
pub fn run(scenario: &Scenario) -> Result<Report, ScenarioError> {
    scenario.validate()?;
    match scenario.link.data_bits {
        5 => run_width::<5>(scenario),
        6 => run_width::<6>(scenario),
        7 => run_width::<7>(scenario),
        8 => run_width::<8>(scenario),
        9 => run_width::<9>(scenario),
        other => Err(ScenarioError::UnsupportedWidth(other)),
    }
}

fn run_width<const N: usize>(scenario: &Scenario) -> Result<Report, ScenarioError> {
    let mut glitches = Glitches::new();
    for fault in &scenario.faults {
        glitches
            .force(fault.tick, fault.level)
            .map_err(|_| ScenarioError::TooManyFaults {
                count: scenario.faults.len(),
                max: MAX_GLITCHES,
            })?;
    }

    let characters = scenario.characters();
    let mut host = TxHost::<N, MAX_CHARACTERS>::new();
    for &character in &characters {
        host.enqueue(character).map_err(|e| match e {
            HostError::QueueFull(_) => ScenarioError::TooManyCharacters {
                count: characters.len(),
                max: MAX_CHARACTERS,
            },
            HostError::TooWide(character) => ScenarioError::CharacterTooWide {
                character,
                data_bits: N as u8,
            },
        })?;
    }

    let mut link = Link::<N, _>::with_fault(glitches);
    let mut sink = RxSink::<1>::new();
    let mut trace = Trace::new();
    let mut sent = Vec::with_capacity(characters.len());
    let mut receptions = Vec::new();
    let last_event = scenario.last_event_tick();
    let mut quiet = 0u64;

    info!(
        "Running {} characters over a {}-bit link (max {} ticks)",
        characters.len(),
        N,
        scenario.link.max_ticks
    );

    for tick in 1..=scenario.link.max_ticks {
        let inputs = if scenario.reset_at(tick) {
            TxInputs::reset()
        } else {
            host.inputs()
        };

        let tx_slot = link.transmitter().position().get();
        let rx_slot = link.receiver().position().get();
        let out = link.tick(inputs);
        let row = TraceRow::new(tx_slot, rx_slot, &out);
        trace!("{}", row);
        trace.push(row);

        if out.reset && tick > scenario.link.reset_ticks {
            debug!("tick {}: global reset", tick);
        }
        if let Some(character) = host.observe(&out.tx) {
            debug!("tick {}: accepted {:#04x}", tick, character);
            sent.push(character);
        }
        if let Some(reception) = sink.observe(out.tick, &out.rx) {
            match reception.result {
                Ok(character) => debug!("tick {}: received {:#04x}", tick, character),
                Err(e) => warn!("tick {}: {}", tick, e),
            }
            receptions.push(reception);
            sink.pop();
        }

        let idle = host.is_empty()
            && link.transmitter().is_idle()
            && link.receiver().is_idle()
            && link.line() == Level::IDLE;
        quiet = if idle { quiet + 1 } else { 0 };
        if quiet >= scenario.link.drain_ticks.max(1) && tick >= last_event {
            break;
        }
    }

    let stats = link.stats();
    info!(
        "Finished after {} ticks: {} accepted, {} delivered, {} framing errors",
        stats.ticks, stats.accepted, stats.delivered, stats.framing_errors
    );
    if !host.is_empty() {
        warn!(
            "{} characters still queued after {} ticks",
            host.pending(),
            link.ticks()
        );
    }

    Ok(Report {
        data_bits: N as u8,
        ticks: link.ticks(),
        stats: *link.stats(),
        sent,
        unsent: host.pending(),
        receptions,
        trace,
    })
}
