//! Stopbit Simulator
//!
//! Host-side harness for the `stopbit-core` link. A [`Scenario`] loaded from
//! TOML describes the character width, the characters to send, forced line
//! levels and mid-run resets. [`run`] steps the link until the traffic has
//! drained and returns a [`Report`] with counters, receptions and a per-tick
//! [`Trace`].

pub mod error;
pub mod runner;
pub mod scenario;
pub mod trace;

pub use error::{RunError, ScenarioError};
pub use runner::{run, Report};
pub use scenario::{Expect, Scenario, MAX_CHARACTERS, SUPPORTED_WIDTHS};
pub use trace::{Trace, TraceRow};
