//! Scenario configuration
//!
//! A scenario describes one simulation run: link width, stimulus, line
//! faults, mid-run resets and the expected outcome.
//!
//! ```toml
//! [link]
//! data_bits = 8
//! reset_ticks = 1
//!
//! [send]
//! characters = [0x55]
//! text = "hi"
//!
//! [[fault]]
//! tick = 13
//! level = "low"
//!
//! [[reset]]
//! tick = 40
//!
//! [expect]
//! received = [0x55, 0x68, 0x69]
//! framing_errors = 0
//! ```

use std::fs;
use std::ops::RangeInclusive;
use std::path::Path;

use serde::Deserialize;
use stopbit_core::fault::MAX_GLITCHES;
use stopbit_core::Level;

use crate::error::ScenarioError;

/// Character widths the runner can instantiate
pub const SUPPORTED_WIDTHS: RangeInclusive<u8> = 5..=9;

/// Maximum characters queued by one scenario
pub const MAX_CHARACTERS: usize = 256;

/// Complete scenario file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Link parameters
    #[serde(default)]
    pub link: LinkSection,
    /// Stimulus
    #[serde(default)]
    pub send: SendSection,
    /// Forced line samples
    #[serde(default, rename = "fault")]
    pub faults: Vec<FaultEntry>,
    /// Global resets after the initial reset
    #[serde(default, rename = "reset")]
    pub resets: Vec<ResetEntry>,
    /// Outcome checks
    #[serde(default)]
    pub expect: Option<Expect>,
}

/// `[link]` table
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LinkSection {
    /// Character width N
    pub data_bits: u8,
    /// Ticks of global reset before any stimulus
    pub reset_ticks: u64,
    /// Hard limit on simulated ticks
    pub max_ticks: u64,
    /// Quiet ticks to keep simulating once all traffic has completed
    pub drain_ticks: u64,
}

impl Default for LinkSection {
    fn default() -> Self {
        Self {
            data_bits: 8,
            reset_ticks: 1,
            max_ticks: 10_000,
            drain_ticks: 4,
        }
    }
}

/// `[send]` table; `characters` are queued before `text`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SendSection {
    /// Raw character values
    pub characters: Vec<u16>,
    /// UTF-8 text, sent byte by byte
    pub text: Option<String>,
}

/// `[[fault]]` entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FaultEntry {
    /// Tick on which the receiver samples `level`
    pub tick: u64,
    /// Forced level
    pub level: Level,
}

/// `[[reset]]` entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResetEntry {
    /// Tick on which global reset is asserted
    pub tick: u64,
}

/// `[expect]` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Expect {
    /// Characters of valid frames, in order
    pub received: Option<Vec<u16>>,
    /// Number of frames with a bad stop bit
    pub framing_errors: Option<u32>,
    /// Require every queued character to be acknowledged
    pub all_sent: bool,
}

impl Scenario {
    /// Parse and validate a scenario from TOML text
    pub fn from_toml_str(input: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = toml::from_str(input)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Read, parse and validate a scenario file
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let input = fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&input)
    }

    /// Characters to send, in queue order
    pub fn characters(&self) -> Vec<u16> {
        let text = self.send.text.as_deref().unwrap_or_default();
        self.send
            .characters
            .iter()
            .copied()
            .chain(text.bytes().map(u16::from))
            .collect()
    }

    /// Last tick carrying a scheduled event
    pub fn last_event_tick(&self) -> u64 {
        let faults = self.faults.iter().map(|f| f.tick);
        let resets = self.resets.iter().map(|r| r.tick);
        faults
            .chain(resets)
            .fold(self.link.reset_ticks, u64::max)
    }

    /// Returns true if global reset is asserted on `tick`
    pub fn reset_at(&self, tick: u64) -> bool {
        tick <= self.link.reset_ticks || self.resets.iter().any(|r| r.tick == tick)
    }

    /// Check limits that the TOML schema cannot express
    pub fn validate(&self) -> Result<(), ScenarioError> {
        let data_bits = self.link.data_bits;
        if !SUPPORTED_WIDTHS.contains(&data_bits) {
            return Err(ScenarioError::UnsupportedWidth(data_bits));
        }
        if self.link.max_ticks == 0 {
            return Err(ScenarioError::ZeroMaxTicks);
        }

        let characters = self.characters();
        if characters.len() > MAX_CHARACTERS {
            return Err(ScenarioError::TooManyCharacters {
                count: characters.len(),
                max: MAX_CHARACTERS,
            });
        }
        let mask = (1u16 << data_bits) - 1;
        if let Some(&character) = characters.iter().find(|&&c| c & !mask != 0) {
            return Err(ScenarioError::CharacterTooWide {
                character,
                data_bits,
            });
        }

        if self.faults.len() > MAX_GLITCHES {
            return Err(ScenarioError::TooManyFaults {
                count: self.faults.len(),
                max: MAX_GLITCHES,
            });
        }
        if self.faults.iter().any(|f| f.tick == 0) {
            return Err(ScenarioError::ZeroTick("fault"));
        }
        if self.resets.iter().any(|r| r.tick == 0) {
            return Err(ScenarioError::ZeroTick("reset"));
        }

        Ok(())
    }
}
