//! Entry point for `stopbit-sim`.
//!
//! Loads a scenario, runs it and prints a summary. Set `RUST_LOG` to see
//! per-frame (`debug`) or per-tick (`trace`) activity.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use log::{error, info};

use stopbit_sim::{run, Report, Scenario};

/// Ticks per line of `--waveform` output
const WAVEFORM_WIDTH: usize = 64;

#[derive(Parser, Debug)]
#[command(
    name = "stopbit-sim",
    version,
    about = "Run a start/stop serial link scenario tick by tick."
)]
struct Args {
    /// Scenario file (TOML)
    scenario: PathBuf,

    /// Print every tick as a table
    #[arg(long, action = clap::ArgAction::SetTrue)]
    trace: bool,

    /// Print the line level as a compact waveform
    #[arg(long, action = clap::ArgAction::SetTrue)]
    waveform: bool,

    /// Override the scenario's tick limit
    #[arg(long, value_name = "TICKS")]
    max_ticks: Option<u64>,
}

fn main() -> ExitCode {
    env_logger::init();

    match try_main(Args::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

/// Returns `Ok(false)` when the run completed but missed its expectations
fn try_main(args: Args) -> anyhow::Result<bool> {
    let mut scenario = Scenario::load(&args.scenario)
        .with_context(|| format!("loading {}", args.scenario.display()))?;
    if let Some(max_ticks) = args.max_ticks {
        scenario.link.max_ticks = max_ticks;
    }

    let report = run(&scenario).context("scenario rejected")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if args.trace {
        report.trace.render(&mut out)?;
        writeln!(out)?;
    }
    if args.waveform {
        report.trace.render_waveform(&mut out, WAVEFORM_WIDTH)?;
        writeln!(out)?;
    }
    print_summary(&mut out, &report)?;

    let Some(expect) = &scenario.expect else {
        return Ok(true);
    };
    match report.check(expect) {
        Ok(()) => {
            info!("all expectations met");
            writeln!(out, "PASS")?;
            Ok(true)
        }
        Err(e) => {
            error!("{}", e);
            writeln!(out, "FAIL: {}", e)?;
            Ok(false)
        }
    }
}

fn print_summary<W: Write>(out: &mut W, report: &Report) -> io::Result<()> {
    let stats = &report.stats;
    writeln!(
        out,
        "{} ticks, {} data bits: {} accepted, {} delivered, {} framing errors, {} unsent",
        report.ticks,
        report.data_bits,
        stats.accepted,
        stats.delivered,
        stats.framing_errors,
        report.unsent
    )?;
    for reception in &report.receptions {
        let status = if reception.result.is_ok() { "ok" } else { "framing error" };
        writeln!(
            out,
            "  tick {:>6}  {:#05x}  {}",
            reception.tick,
            reception.character(),
            status
        )?;
    }
    Ok(())
}
