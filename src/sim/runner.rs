use std::path::Path;

use rayon::prelude::*;
use tracing::info;

use crate::config::{AppConfig, RunMode, SimulationSetting, TrajectoryMode, WindModelKind};
use crate::environment::{Environment, MapData};
use crate::error::SimError;
use crate::io::spec::LoadedSpec;
use crate::physics::wind::WindData;
use crate::sim::result::SimuResultSummary;
use crate::sim::solver::Solver;
use crate::vehicle::spec::RocketSpecification;

// ---------------------------------------------------------------------------
// Run orchestration (detail / scatter)
// ---------------------------------------------------------------------------

/// Owns everything one run needs and dispatches it by run mode. Detail runs
/// one scenario at the configured wind point; scatter sweeps the wind grid,
/// one independent solve per point.
pub struct Runner<'a> {
    config: &'a AppConfig,
    setting: SimulationSetting,
    spec_name: String,
    environment: Environment,
    map: MapData,
    rocket_spec: RocketSpecification,
    wind_table: Option<Vec<WindData>>,
}

impl<'a> Runner<'a> {
    pub fn new(
        config: &'a AppConfig,
        setting: SimulationSetting,
        spec: LoadedSpec,
        wind_table: Option<Vec<WindData>>,
    ) -> Result<Self, SimError> {
        let map = MapData::lookup(&spec.environment.place)?;
        Ok(Runner {
            config,
            setting,
            spec_name: spec.name,
            environment: spec.environment,
            map,
            rocket_spec: spec.rocket,
            wind_table,
        })
    }

    pub fn is_multi(&self) -> bool {
        self.rocket_spec.is_multi()
    }

    pub fn run(&self) -> Result<Vec<SimuResultSummary>, SimError> {
        match self.setting.run_mode {
            RunMode::Detail => {
                info!(
                    wind_speed = self.setting.wind_speed,
                    wind_direction = self.setting.wind_direction,
                    "running detail simulation"
                );
                let summary =
                    self.solve_at(self.setting.wind_speed, self.setting.wind_direction)?;
                Ok(vec![summary])
            }
            RunMode::Scatter => self.run_scatter(),
        }
    }

    fn run_scatter(&self) -> Result<Vec<SimuResultSummary>, SimError> {
        let points = self.scatter_points();
        info!(points = points.len(), "running scatter simulation");

        let solve = |&(speed, direction): &(f64, f64)| -> Result<SimuResultSummary, SimError> {
            let summary = self.solve_at(speed, direction)?;
            Ok(summary.into_scatter_format())
        };

        if self.config.processing.multi_thread {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.processing.multi_thread_count as usize)
                .build()
                .map_err(|e| SimError::config("processing", e.to_string()))?;
            pool.install(|| points.par_iter().map(solve).collect())
        } else {
            points.iter().map(solve).collect()
        }
    }

    /// Wind grid: speeds `min..=max` in 1 m/s steps, directions `0..360`
    /// at the configured interval.
    fn scatter_points(&self) -> Vec<(f64, f64)> {
        let scatter = &self.config.simulation.scatter;
        let mut points = Vec::new();
        let mut speed = scatter.wind_speed_min;
        while speed <= scatter.wind_speed_max {
            let mut direction = 0.0;
            while direction < 360.0 {
                points.push((speed, direction));
                direction += scatter.wind_dir_interval;
            }
            speed += 1.0;
        }
        points
    }

    fn solve_at(
        &self,
        wind_speed: f64,
        wind_direction: f64,
    ) -> Result<SimuResultSummary, SimError> {
        let solver = Solver::new(
            self.config,
            &self.environment,
            self.map.clone(),
            &self.setting,
            self.rocket_spec.clone(),
            self.wind_table.clone(),
        );
        solver.solve(wind_speed, wind_direction)
    }

    /// Result directory name: spec name, wind model, run and trajectory
    /// mode, and for detail runs the wind point.
    pub fn output_dir_name(&self) -> String {
        let mut dir = format!("{}[", self.spec_name);

        match self.config.wind_model.kind {
            WindModelKind::Real => {
                let stem = Path::new(&self.config.wind_model.realdata_filename)
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                dir.push_str(&format!("({stem})"));
            }
            WindModelKind::Original => dir.push_str("original"),
            WindModelKind::OnlyPowerLaw => dir.push_str("powerlaw"),
            WindModelKind::NoWind => dir.push_str("nowind"),
        }

        if self.config.wind_model.kind != WindModelKind::Real {
            match self.setting.run_mode {
                RunMode::Scatter => dir.push_str("_scatter"),
                RunMode::Detail => dir.push_str("_detail"),
            }
        }

        match self.setting.trajectory_mode {
            TrajectoryMode::Parachute => dir.push_str("_para"),
            TrajectoryMode::Trajectory => dir.push_str("_traj"),
        }
        dir.push(']');

        let fixed_wind = matches!(
            self.config.wind_model.kind,
            WindModelKind::Real | WindModelKind::NoWind
        );
        if self.setting.run_mode == RunMode::Detail && !fixed_wind {
            dir.push_str(&format!(
                "[{:.2}ms, {:.2}deg]",
                self.setting.wind_speed, self.setting.wind_direction
            ));
        }

        dir
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DetachType;

    fn config_for(kind_name: &str) -> AppConfig {
        let mut config = AppConfig::default();
        config.wind_model.kind_name = kind_name.into();
        config.wind_model.realdata_filename = "wind/noshiro_2024.csv".into();
        config.validate();
        config
    }

    fn setting_for(run_mode: RunMode) -> SimulationSetting {
        SimulationSetting {
            run_mode,
            trajectory_mode: TrajectoryMode::Parachute,
            detach_type: DetachType::DoNotDetach,
            detach_time: 0.0,
            wind_speed: 3.0,
            wind_direction: 90.0,
        }
    }

    fn make_runner<'a>(config: &'a AppConfig, setting: SimulationSetting) -> Runner<'a> {
        Runner {
            config,
            setting,
            spec_name: "ss-520".into(),
            environment: Environment {
                place: "noshiro_sea".into(),
                rail_length: 5.0,
                rail_azimuth: 0.0,
                rail_elevation: 80.0,
            },
            map: MapData::lookup("noshiro_sea").unwrap(),
            rocket_spec: RocketSpecification::new(vec![]),
            wind_table: None,
        }
    }

    #[test]
    fn detail_directory_name_carries_wind_point() {
        let config = config_for("original");
        let runner = make_runner(&config, setting_for(RunMode::Detail));
        assert_eq!(
            runner.output_dir_name(),
            "ss-520[original_detail_para][3.00ms, 90.00deg]"
        );
    }

    #[test]
    fn real_wind_directory_name_uses_file_stem() {
        let config = config_for("real");
        let runner = make_runner(&config, setting_for(RunMode::Detail));
        assert_eq!(runner.output_dir_name(), "ss-520[(noshiro_2024)_para]");
    }

    #[test]
    fn scatter_grid_covers_speed_and_direction_ranges() {
        let config = config_for("original");
        let runner = make_runner(&config, setting_for(RunMode::Scatter));
        let points = runner.scatter_points();
        // Defaults: speeds 1..=7, directions every 30 deg.
        assert_eq!(points.len(), 7 * 12);
        assert_eq!(points[0], (1.0, 0.0));
        assert!(points.iter().all(|&(_, d)| d < 360.0));
    }
}
