//! Command-line entry point for one sweep run.

use anyhow::Context;
use clap::Parser;
use hom_scan::config::ScanConfig;
use hom_scan::hardware::counter_box::SerialCounterBox;
use hom_scan::hardware::mock::{FixedCounterSource, MockActuatorPort, MockTemperatureController};
use hom_scan::hardware::tc200::Tc200Session;
use hom_scan::hardware::zaber::ZaberBinaryPort;
use hom_scan::storage::DatFileSink;
use hom_scan::sweep::{SweepOrchestrator, SweepSummary};
use log::{info, warn};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "hom-scan",
    about = "Acquire a Hong-Ou-Mandel delay-temperature map"
)]
struct Args {
    /// Path to the run configuration file
    #[arg(short, long, default_value = "homscan.toml")]
    config: PathBuf,

    /// Run against mock hardware instead of the serial ports
    #[arg(long)]
    mock: bool,

    /// Override the configured output directory
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = ScanConfig::load(&args.config)
        .with_context(|| format!("failed to load configuration from {}", args.config.display()))?;
    if let Some(dir) = args.output_dir {
        config.output.directory = dir;
    }
    config.validate()?;

    let summary = if args.mock {
        run_with_mocks(&config)?
    } else {
        run_with_hardware(&config)?
    };

    info!(
        "Run complete: {} temperature lines in {:.1} s",
        summary.lines_written,
        summary.elapsed.as_secs_f64()
    );
    if !summary.release_failures.is_empty() {
        warn!(
            "{} resource(s) did not release cleanly",
            summary.release_failures.len()
        );
    }
    Ok(())
}

fn run_with_hardware(config: &ScanConfig) -> anyhow::Result<SweepSummary> {
    let actuator = ZaberBinaryPort::open(&config.ports.actuator, config.ports.actuator_baud)?;
    let controller = Tc200Session::open(
        &config.ports.controller,
        config.ports.controller_baud,
        &config.controller_pid,
    )?;
    let counters = SerialCounterBox::open(&config.ports.counters, config.ports.counters_baud)?;
    let sink = DatFileSink::new(&config.output.directory, &config.output.file_suffix);

    let orchestrator = SweepOrchestrator::from_config(
        config,
        Box::new(actuator),
        Box::new(controller),
        Box::new(counters),
        Box::new(sink),
    )?;
    Ok(orchestrator.run()?)
}

fn run_with_mocks(config: &ScanConfig) -> anyhow::Result<SweepSummary> {
    info!("Dry run with mock hardware; no serial ports will be opened");
    let sink = DatFileSink::new(&config.output.directory, &config.output.file_suffix);

    let orchestrator = SweepOrchestrator::from_config(
        config,
        Box::new(MockActuatorPort::new()),
        Box::new(MockTemperatureController::new()),
        Box::new(FixedCounterSource::new(1000.0, 1000.0, 120.0)),
        Box::new(sink),
    )?;
    Ok(orchestrator.run()?)
}
