//! Line fault injection
//!
//! A fault sits between the line register and the receiver's sampler and may
//! replace the level the receiver sees on a given tick.

use heapless::Vec;

use crate::frame::Level;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum scheduled glitches per fault list
pub const MAX_GLITCHES: usize = 32;

/// Transformation applied to the line before the receiver samples it
pub trait LineFault {
    /// Level the receiver samples on `tick`, given the level on the line
    fn apply(&mut self, tick: u64, level: Level) -> Level;
}

/// Clean line, samples pass through unchanged
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Clean;

impl LineFault for Clean {
    fn apply(&mut self, _tick: u64, level: Level) -> Level {
        level
    }
}

/// Line shorted to a fixed level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StuckAt(pub Level);

impl LineFault for StuckAt {
    fn apply(&mut self, _tick: u64, _level: Level) -> Level {
        self.0
    }
}

/// A single forced sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Glitch {
    /// Tick on which the receiver sees `level`
    pub tick: u64,
    /// Forced level
    pub level: Level,
}

/// Fault errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FaultError {
    /// Glitch list is full
    TooManyGlitches,
}

/// Scheduled glitches, each forcing the sampled level on one tick
#[derive(Debug, Clone, Default)]
pub struct Glitches {
    glitches: Vec<Glitch, MAX_GLITCHES>,
}

impl Glitches {
    /// Create an empty glitch list (behaves like [`Clean`])
    pub fn new() -> Self {
        Self { glitches: Vec::new() }
    }

    /// Force `level` on `tick`; a later entry for the same tick wins
    pub fn force(&mut self, tick: u64, level: Level) -> Result<(), FaultError> {
        self.glitches
            .push(Glitch { tick, level })
            .map_err(|_| FaultError::TooManyGlitches)
    }

    /// Scheduled glitches in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Glitch> {
        self.glitches.iter()
    }

    /// Number of scheduled glitches
    pub fn len(&self) -> usize {
        self.glitches.len()
    }

    /// Returns true if nothing is scheduled
    pub fn is_empty(&self) -> bool {
        self.glitches.is_empty()
    }
}

impl LineFault for Glitches {
    fn apply(&mut self, tick: u64, level: Level) -> Level {
        self.glitches
            .iter()
            .rev()
            .find(|g| g.tick == tick)
            .map_or(level, |g| g.level)
    }
}

impl<F: LineFault + ?Sized> LineFault for &mut F {
    fn apply(&mut self, tick: u64, level: Level) -> Level {
        (**self).apply(tick, level)
    }
}
