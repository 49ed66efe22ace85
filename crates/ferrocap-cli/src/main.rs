//! Ferrocap command-line interface.
//!
//! Sweeps one ferroelectric capacitor along a triangle or sine drive and prints the
//! trajectory as CSV on stdout. Logs go to stderr and follow `RUST_LOG`.

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use ferrocap_devices::{DeviceConfig, EvaluationResult, FerroCapacitor, Waveform};
use log::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ferrocap")]
#[command(about = "Q-V sweeps of a Preisach ferroelectric capacitor model", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON device configuration (parameters, solver criteria, polarity)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Peak drive voltage (V)
    #[arg(short, long, default_value_t = 3.0)]
    amplitude: f64,

    /// Full swings after the initial rise
    #[arg(short = 'n', long, default_value_t = 1)]
    cycles: usize,

    /// Samples per unit of drive time (the initial rise is one unit)
    #[arg(short, long, default_value_t = 50)]
    points: usize,

    /// Drive the device by voltage or by charge
    #[arg(short, long, value_enum, default_value_t = Mode::Voltage)]
    mode: Mode,

    /// Drive waveform shape
    #[arg(short, long, value_enum, default_value_t = Shape::Triangle)]
    shape: Shape,

    /// Write the final switching history to this file
    #[arg(long, value_name = "FILE")]
    checkpoint: Option<PathBuf>,

    /// Verbose output (debug logging unless RUST_LOG is set)
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Apply the triangle as a voltage.
    Voltage,
    /// Apply the triangle as a charge peaking at the saturated charge of
    /// the peak voltage.
    Charge,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Shape {
    /// Linear ramps between the peaks.
    Triangle,
    /// Sinusoid through the same peaks at the same times.
    Sine,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => DeviceConfig::from_path(path)
            .with_context(|| format!("Failed to load device configuration {}", path.display()))?,
        None => DeviceConfig::default(),
    };
    if !(cli.amplitude.is_finite() && cli.amplitude > 0.0) {
        bail!("amplitude must be a positive number, got {}", cli.amplitude);
    }
    if cli.points == 0 {
        bail!("at least one point per time unit is required");
    }

    let mut device = FerroCapacitor::with_config("CFE1", config)
        .context("Invalid device parameters")?;
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    sweep(&mut device, &cli, &mut out)?;
    out.flush()?;

    if let Some(path) = &cli.checkpoint {
        device
            .checkpoint()
            .save(path)
            .with_context(|| format!("Failed to write checkpoint {}", path.display()))?;
        info!("history checkpoint written to {}", path.display());
    }

    Ok(())
}

fn sweep(device: &mut FerroCapacitor, cli: &Cli, out: &mut impl Write) -> Result<()> {
    let peak = match cli.mode {
        Mode::Voltage => cli.amplitude,
        Mode::Charge => {
            let params = device.params();
            params.saturation_charge + params.linear_capacitance() * cli.amplitude
        }
    };
    let drive = match cli.shape {
        Shape::Triangle => Waveform::triangle(peak, cli.cycles),
        Shape::Sine => Waveform::sine_sweep(peak),
    };
    let duration = drive
        .duration()
        .unwrap_or(1.0 + 4.0 * cli.cycles as f64);
    let samples = (duration * cli.points as f64).round() as usize;

    writeln!(out, "time,voltage,charge,capacitance,iterations,converged")?;
    let mut failures = 0;
    for i in 0..=samples {
        let t = i as f64 / cli.points as f64;
        let x = drive.value_at(t);
        let r: EvaluationResult = match cli.mode {
            Mode::Voltage => device.evaluate_at_voltage(x),
            Mode::Charge => device.solve_for_charge(x),
        }
        .with_context(|| format!("Evaluation failed at t = {}", t))?;
        if !r.converged {
            failures += 1;
        }
        writeln!(
            out,
            "{},{:.9e},{:.9e},{:.9e},{},{}",
            t, r.voltage, r.charge, r.capacitance, r.iterations, r.converged
        )?;
    }

    if failures > 0 {
        warn!("{} of {} samples did not converge", failures, samples + 1);
    }
    info!(
        "{} samples, {} reversals, final history depth {}",
        samples + 1,
        device.history().reversals(),
        device.history().stack().len()
    );
    Ok(())
}
