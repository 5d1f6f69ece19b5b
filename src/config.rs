use std::path::Path;

use clap::ValueEnum;
use serde::Deserialize;
use tracing::warn;

use crate::error::SimError;

// ---------------------------------------------------------------------------
// Application configuration (settings JSON)
// ---------------------------------------------------------------------------
//
// Loaded once at startup and passed by reference into the solver and its
// collaborators. Out-of-range values are replaced by corrected defaults with
// a logged warning; missing sections/keys are fatal.

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub processing: ProcessingConfig,
    pub simulation: SimulationConfig,
    pub result: ResultConfig,
    pub wind_model: WindModelConfig,
    pub atmosphere: AtmosphereConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProcessingConfig {
    pub multi_thread: bool,
    pub multi_thread_count: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    /// Integration timestep, s.
    pub dt: f64,
    /// Altitude drop below the running maximum that counts as apogee, m.
    pub detect_peak_threshold: f64,
    pub scatter: ScatterConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScatterConfig {
    pub wind_speed_min: f64,
    pub wind_speed_max: f64,
    /// Wind direction sweep interval, deg.
    pub wind_dir_interval: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResultConfig {
    /// Decimal digits written to result CSVs.
    pub precision: i64,
    /// A snapshot is retained every this many integration steps.
    pub step_save_interval: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindModelKind {
    Real,
    Original,
    OnlyPowerLaw,
    NoWind,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WindModelConfig {
    /// Power-law exponent denominator: multiplier = (h/base)^(1/n).
    pub power_constant: f64,
    #[serde(rename = "power_law_base_alt")]
    pub power_law_base_altitude: f64,
    #[serde(rename = "type")]
    pub kind_name: String,
    pub realdata_filename: String,
    #[serde(skip, default = "default_wind_kind")]
    pub kind: WindModelKind,
}

fn default_wind_kind() -> WindModelKind {
    WindModelKind::Original
}

#[derive(Debug, Clone, Deserialize)]
pub struct AtmosphereConfig {
    pub base_pressure_pascal: f64,
    pub base_temperature_celsius: f64,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<AppConfig, SimError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| SimError::config(path.display().to_string(), e.to_string()))?;
        let mut config: AppConfig = serde_json::from_str(&text)
            .map_err(|e| SimError::config(path.display().to_string(), e.to_string()))?;
        config.validate();
        Ok(config)
    }

    /// Substitute corrected defaults for out-of-range values. Non-fatal.
    pub fn validate(&mut self) {
        if self.processing.multi_thread_count < 1 {
            warn!("specified thread count is too low, thread count is set to 1");
            self.processing.multi_thread_count = 1;
        }
        if self.result.precision < 0 {
            warn!("result precision is set to the default value of 8");
            self.result.precision = 8;
        }
        if self.result.step_save_interval < 1 {
            warn!("step save interval is set to the default value of 10");
            self.result.step_save_interval = 10;
        }
        self.wind_model.kind = match self.wind_model.kind_name.as_str() {
            "real" => WindModelKind::Real,
            "original" => WindModelKind::Original,
            "only_powerlaw" => WindModelKind::OnlyPowerLaw,
            "no_wind" => WindModelKind::NoWind,
            other => {
                warn!(
                    "wind_model.type \"{other}\" is invalid; \
                     set \"real\", \"original\", \"only_powerlaw\" or \"no_wind\". \
                     Falling back to \"original\""
                );
                WindModelKind::Original
            }
        };
    }

    pub fn precision(&self) -> usize {
        self.result.precision as usize
    }

    pub fn step_save_interval(&self) -> usize {
        self.result.step_save_interval as usize
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            processing: ProcessingConfig {
                multi_thread: false,
                multi_thread_count: 1,
            },
            simulation: SimulationConfig {
                dt: 0.001,
                detect_peak_threshold: 15.0,
                scatter: ScatterConfig {
                    wind_speed_min: 1.0,
                    wind_speed_max: 7.0,
                    wind_dir_interval: 30.0,
                },
            },
            result: ResultConfig {
                precision: 8,
                step_save_interval: 10,
            },
            wind_model: WindModelConfig {
                power_constant: 7.0,
                power_law_base_altitude: 10.0,
                kind_name: "original".into(),
                realdata_filename: String::new(),
                kind: WindModelKind::Original,
            },
            atmosphere: AtmosphereConfig {
                base_pressure_pascal: 101_325.0,
                base_temperature_celsius: 15.0,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Per-run simulation setting (resolved before solve() is invoked)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RunMode {
    /// One solve at a fixed wind point; full time-series output.
    Detail,
    /// Wind-condition sweep; landing-point scatter output.
    Scatter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TrajectoryMode {
    /// Ballistic descent.
    Trajectory,
    /// Parachute-assisted descent.
    Parachute,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DetachType {
    BurningFinished,
    Time,
    SyncPara,
    DoNotDetach,
}

#[derive(Debug, Clone)]
pub struct SimulationSetting {
    pub run_mode: RunMode,
    pub trajectory_mode: TrajectoryMode,
    pub detach_type: DetachType,
    pub detach_time: f64,
    pub wind_speed: f64,
    pub wind_direction: f64,
}

impl Default for SimulationSetting {
    fn default() -> Self {
        SimulationSetting {
            run_mode: RunMode::Detail,
            trajectory_mode: TrajectoryMode::Trajectory,
            detach_type: DetachType::BurningFinished,
            detach_time: 0.0,
            wind_speed: 0.0,
            wind_direction: 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_settings_json() {
        let text = r#"{
            "processing": {"multi_thread": true, "multi_thread_count": 4},
            "simulation": {
                "dt": 0.001,
                "detect_peak_threshold": 15.0,
                "scatter": {"wind_speed_min": 1.0, "wind_speed_max": 7.0, "wind_dir_interval": 30.0}
            },
            "result": {"precision": 6, "step_save_interval": 10},
            "wind_model": {
                "power_constant": 7.0,
                "power_law_base_alt": 10.0,
                "type": "no_wind",
                "realdata_filename": ""
            },
            "atmosphere": {"base_pressure_pascal": 101325.0, "base_temperature_celsius": 15.0}
        }"#;
        let mut config: AppConfig = serde_json::from_str(text).unwrap();
        config.validate();
        assert_eq!(config.wind_model.kind, WindModelKind::NoWind);
        assert_eq!(config.precision(), 6);
    }

    #[test]
    fn out_of_range_values_corrected() {
        let mut config = AppConfig::default();
        config.processing.multi_thread_count = 0;
        config.result.precision = -1;
        config.result.step_save_interval = 0;
        config.wind_model.kind_name = "hurricane".into();
        config.validate();
        assert_eq!(config.processing.multi_thread_count, 1);
        assert_eq!(config.result.precision, 8);
        assert_eq!(config.result.step_save_interval, 10);
        assert_eq!(config.wind_model.kind, WindModelKind::Original);
    }

    #[test]
    fn no_wind_is_its_own_kind() {
        // "no_wind" must not alias the real-data model.
        let mut config = AppConfig::default();
        config.wind_model.kind_name = "no_wind".into();
        config.validate();
        assert_ne!(config.wind_model.kind, WindModelKind::Real);
        assert_eq!(config.wind_model.kind, WindModelKind::NoWind);
    }
}
