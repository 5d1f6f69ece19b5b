use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use tracing::{error, info, warn};

use sounding_sim::config::{
    AppConfig, DetachType, RunMode, SimulationSetting, TrajectoryMode, WindModelKind,
};
use sounding_sim::io;
use sounding_sim::sim::result::SimuResultSummary;
use sounding_sim::sim::runner::Runner;

/// Sounding-rocket flight simulator.
#[derive(Debug, Parser)]
#[command(name = "sounding-sim", version, about)]
struct Cli {
    /// Application settings JSON.
    #[arg(long, default_value = "settings.json")]
    settings: PathBuf,

    /// Rocket specification JSON.
    #[arg(long)]
    spec: PathBuf,

    /// Input data root (thrust curves under `thrust/`, wind/aero tables).
    #[arg(long, default_value = "input")]
    input_dir: PathBuf,

    /// Run mode. Real-data and no-wind models always run in detail mode.
    #[arg(long, value_enum, default_value = "detail")]
    mode: RunMode,

    /// Descent type.
    #[arg(long, value_enum, default_value = "trajectory")]
    trajectory: TrajectoryMode,

    /// Separation condition (multi-stage specs only).
    #[arg(long, value_enum, default_value = "burning-finished")]
    detach: DetachType,

    /// Separation time, s (with `--detach time`).
    #[arg(long, default_value_t = 0.0)]
    detach_time: f64,

    /// Ground wind speed, m/s (detail mode, synthetic wind models).
    #[arg(long, default_value_t = 0.0)]
    wind_speed: f64,

    /// Ground wind direction, deg (north 0, east 90).
    #[arg(long, default_value_t = 0.0)]
    wind_direction: f64,

    /// Result root directory.
    #[arg(long, default_value = "result")]
    output: PathBuf,

    /// Run without writing result files.
    #[arg(long)]
    no_output: bool,
}

fn main() {
    tracing_subscriber::fmt().init();

    if let Err(e) = run(Cli::parse()) {
        error!(error = %e, "run failed");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), sounding_sim::SimError> {
    let config = AppConfig::load(&cli.settings)?;
    show_wind_model(&config);

    let spec = io::load_spec(&cli.spec, &cli.input_dir)?;

    let wind_table = if config.wind_model.kind == WindModelKind::Real {
        let path = cli.input_dir.join(&config.wind_model.realdata_filename);
        Some(io::tables::read_wind_table(&path)?)
    } else {
        None
    };

    // The measured-table and no-wind models have exactly one wind
    // condition, so a scatter sweep degenerates to a detail run.
    let fixed_wind = matches!(
        config.wind_model.kind,
        WindModelKind::Real | WindModelKind::NoWind
    );
    let run_mode = if fixed_wind && cli.mode == RunMode::Scatter {
        warn!("this wind model has a single wind condition; running in detail mode");
        RunMode::Detail
    } else {
        cli.mode
    };

    let setting = SimulationSetting {
        run_mode,
        trajectory_mode: cli.trajectory,
        detach_type: cli.detach,
        detach_time: cli.detach_time,
        wind_speed: cli.wind_speed,
        wind_direction: cli.wind_direction,
    };

    let runner = Runner::new(&config, setting, spec, wind_table)?;
    if runner.is_multi() {
        info!("this is a multiple rocket");
    }

    let start = Instant::now();
    let results = runner.run()?;
    info!("finished processing: {:.2}s", start.elapsed().as_secs_f64());

    match run_mode {
        RunMode::Detail => print_detail_summary(&results[0]),
        RunMode::Scatter => print_scatter_summary(&results),
    }

    if !cli.no_output {
        let dir = cli.output.join(runner.output_dir_name());
        std::fs::create_dir_all(&dir)?;
        match run_mode {
            RunMode::Detail => io::csv::save_detail(&dir, &results[0], config.precision())?,
            RunMode::Scatter => io::csv::save_scatter(&dir, &results, config.precision())?,
        }
        info!(dir = %dir.display(), "result saved");
    }

    Ok(())
}

fn show_wind_model(config: &AppConfig) {
    match config.wind_model.kind {
        WindModelKind::Real => info!(
            file = %config.wind_model.realdata_filename,
            "wind model: real"
        ),
        WindModelKind::Original => info!("wind model: original"),
        WindModelKind::OnlyPowerLaw => info!("wind model: only power law"),
        WindModelKind::NoWind => info!("wind model: no wind"),
    }
}

// ---------------------------------------------------------------------------
// Console summaries
// ---------------------------------------------------------------------------

fn print_detail_summary(result: &SimuResultSummary) {
    println!();
    println!("====================================================================");
    println!("  FLIGHT SUMMARY");
    println!("====================================================================");
    println!();
    println!("  Flight Events");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  LAUNCH CLEAR   t={:>6.2}s   vel={:>7.2} m/s",
        result.launch_clear_time,
        result.launch_clear_velocity.norm()
    );
    println!(
        "  APOGEE         t={:>6.2}s   alt={:>8.1} m",
        result.detect_peak_time, result.max_altitude
    );
    for (index, position) in result.body_final_positions.iter().enumerate() {
        println!(
            "  LANDING body{}  lat={:>10.6}   long={:>10.6}",
            index + 1,
            position.latitude,
            position.longitude
        );
    }
    println!();
    println!("  Performance");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  Max velocity:       {:>8.1} m/s    Max airspeed: {:>8.1} m/s",
        result.max_velocity, result.max_airspeed
    );
    println!(
        "  Max normal force:   {:>8.1} N      (while ascending)",
        result.max_normal_force_during_rising
    );
    println!();
}

fn print_scatter_summary(results: &[SimuResultSummary]) {
    let max_altitude = results
        .iter()
        .map(|r| r.max_altitude)
        .fold(0.0_f64, f64::max);

    println!();
    println!("====================================================================");
    println!("  SCATTER SUMMARY");
    println!("====================================================================");
    println!();
    println!("  Wind conditions simulated: {:>5}", results.len());
    println!("  Highest apogee:            {max_altitude:>8.1} m");
    println!();
}
