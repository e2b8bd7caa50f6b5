//! Simulator error types

use std::path::PathBuf;

use thiserror::Error;

/// Problems loading or validating a scenario
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to read scenario {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid scenario TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unsupported data_bits {0} (supported: 5-9)")]
    UnsupportedWidth(u8),

    #[error("character {character:#x} does not fit in {data_bits} data bits")]
    CharacterTooWide { character: u16, data_bits: u8 },

    #[error("{count} characters to send, at most {max} supported")]
    TooManyCharacters { count: usize, max: usize },

    #[error("{count} line faults scheduled, at most {max} supported")]
    TooManyFaults { count: usize, max: usize },

    #[error("{0} tick must be 1 or later")]
    ZeroTick(&'static str),

    #[error("max_ticks must be at least 1")]
    ZeroMaxTicks,
}

/// A completed run that did not meet the scenario's `[expect]` block
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RunError {
    #[error("received {received:02x?}, expected {expected:02x?}")]
    ReceivedMismatch {
        expected: Vec<u16>,
        received: Vec<u16>,
    },

    #[error("{actual} framing errors, expected {expected}")]
    FramingErrors { expected: u32, actual: u32 },

    #[error("{pending} characters never acknowledged before max_ticks")]
    Unsent { pending: usize },
}
