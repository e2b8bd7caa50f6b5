//! Per-tick trace capture and rendering

use std::fmt;
use std::io::{self, Write};

use stopbit_core::{Level, LinkOutputs};

/// Boundary signals of one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceRow {
    /// Tick number
    pub tick: u64,
    /// Global reset asserted
    pub reset: bool,
    /// Transmitter slot driven this tick
    pub tx_slot: u8,
    /// Level driven by the transmitter
    pub line: Level,
    /// Acknowledge strobe
    pub acknowledge: bool,
    /// Receiver slot sampled this tick
    pub rx_slot: u8,
    /// Level sampled by the receiver
    pub sampled: Level,
    /// Ready strobe
    pub ready: bool,
    /// Error strobe
    pub error: bool,
    /// Receiver output buffer
    pub character: u16,
}

impl TraceRow {
    /// Build a row from the slots before the tick and the link outputs
    pub fn new(tx_slot: u8, rx_slot: u8, outputs: &LinkOutputs) -> Self {
        Self {
            tick: outputs.tick,
            reset: outputs.reset,
            tx_slot,
            line: outputs.tx.serial,
            acknowledge: outputs.tx.acknowledge,
            rx_slot,
            sampled: outputs.sampled,
            ready: outputs.rx.ready,
            error: outputs.rx.error,
            character: outputs.rx.character,
        }
    }

    /// Header matching the [`fmt::Display`] layout
    pub const HEADER: &'static str = "  tick rst | tx line ack | rx smp rdy err  char";
}

fn flag(set: bool, mark: char) -> char {
    if set {
        mark
    } else {
        '.'
    }
}

impl fmt::Display for TraceRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>6}  {}  | {:>2}   {}   {}  | {:>2}   {}   {}   {}  {:#05x}",
            self.tick,
            flag(self.reset, 'R'),
            self.tx_slot,
            self.line,
            flag(self.acknowledge, 'A'),
            self.rx_slot,
            self.sampled,
            flag(self.ready, 'Y'),
            flag(self.error, 'E'),
            self.character,
        )
    }
}

/// Recorded ticks of one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trace {
    rows: Vec<TraceRow>,
}

impl Trace {
    /// Create an empty trace
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one tick
    pub fn push(&mut self, row: TraceRow) {
        self.rows.push(row);
    }

    /// Recorded rows
    pub fn rows(&self) -> &[TraceRow] {
        &self.rows
    }

    /// Number of recorded ticks
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if no tick was recorded
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Transmitter line levels as a string of `0`/`1`
    pub fn line_bits(&self) -> String {
        self.rows.iter().map(|r| r.line.to_string()).collect()
    }

    /// Write the trace as a table
    pub fn render<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "{}", TraceRow::HEADER)?;
        for row in &self.rows {
            writeln!(out, "{}", row)?;
        }
        Ok(())
    }

    /// Write a compact two-line waveform, `width` ticks per block
    ///
    /// Strobes are marked under the waveform: `A` acknowledge, `Y` ready,
    /// `E` error, `R` reset.
    pub fn render_waveform<W: Write>(&self, out: &mut W, width: usize) -> io::Result<()> {
        let width = width.max(1);
        for chunk in self.rows.chunks(width) {
            let first = chunk.first().map_or(0, |r| r.tick);
            let line: String = chunk.iter().map(|r| r.line.to_string()).collect();
            let marks: String = chunk
                .iter()
                .map(|r| {
                    if r.reset {
                        'R'
                    } else if r.error {
                        'E'
                    } else if r.ready {
                        'Y'
                    } else if r.acknowledge {
                        'A'
                    } else {
                        ' '
                    }
                })
                .collect();
            writeln!(out, "{:>6} {}", first, line)?;
            writeln!(out, "       {}", marks.trim_end())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stopbit_core::{Link, TxInputs};

    fn record(ticks: usize) -> Trace {
        let mut link = Link::<8>::new();
        let mut trace = Trace::new();
        for tick in 0..ticks {
            let inputs = if tick == 0 {
                TxInputs::send(0x55)
            } else {
                TxInputs::idle()
            };
            let tx_slot = link.transmitter().position().get();
            let rx_slot = link.receiver().position().get();
            let out = link.tick(inputs);
            trace.push(TraceRow::new(tx_slot, rx_slot, &out));
        }
        trace
    }

    #[test]
    fn test_line_bits() {
        let trace = record(11);
        assert_eq!(trace.line_bits(), "10010101011");
    }

    #[test]
    fn test_row_slots() {
        let trace = record(3);
        let rows = trace.rows();
        assert_eq!(rows[0].tx_slot, 9);
        assert!(rows[0].acknowledge);
        assert_eq!(rows[1].tx_slot, 0);
        assert_eq!(rows[1].line, Level::Low);
        assert_eq!(rows[2].rx_slot, 0);
    }

    #[test]
    fn test_render_table() {
        let trace = record(12);
        let mut out = Vec::new();
        trace.render(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 13);
        assert_eq!(lines[0], TraceRow::HEADER);
        assert!(lines[1].contains('A'));
        assert!(lines[12].contains('Y'));
        assert!(lines[12].ends_with("0x055"));
    }

    #[test]
    fn test_render_waveform() {
        let trace = record(12);
        let mut out = Vec::new();
        trace.render_waveform(&mut out, 40).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "     1 100101010111");
        assert_eq!(lines[1], "       A          Y");
    }
}
