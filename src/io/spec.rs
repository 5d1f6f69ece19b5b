use std::collections::VecDeque;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::environment::Environment;
use crate::error::SimError;
use crate::io::tables;
use crate::vehicle::aero::{AeroCoefRecord, AeroTable};
use crate::vehicle::engine::Engine;
use crate::vehicle::spec::{
    parachute_cd, BodySpecification, Parachute, ParachuteOpeningType, RocketSpecification,
    Transition,
};

// ---------------------------------------------------------------------------
// Rocket specification file (JSON)
// ---------------------------------------------------------------------------
//
// Key names follow the established spec-file format; up to three stage
// sections (`rocket1`..`rocket3`). Referenced data files (thrust curve,
// aero table, wind table) are resolved against the input directory.

#[derive(Debug, Deserialize)]
struct SpecFile {
    environment: EnvironmentSection,
    rocket1: StageSection,
    rocket2: Option<StageSection>,
    rocket3: Option<StageSection>,
}

#[derive(Debug, Deserialize)]
struct EnvironmentSection {
    place: String,
    rail_len: f64,
    rail_azi: f64,
    rail_elev: f64,
}

#[derive(Debug, Deserialize)]
struct StageSection {
    ref_len: f64,
    diam: f64,
    #[serde(rename = "CGlen_i")]
    cg_len_i: f64,
    #[serde(rename = "CGlen_f")]
    cg_len_f: f64,
    mass_i: f64,
    mass_f: f64,
    #[serde(rename = "Iyz_i")]
    iyz_i: f64,
    #[serde(rename = "Iyz_f")]
    iyz_f: f64,
    #[serde(rename = "Cmq")]
    cmq: f64,

    // first (and only modeled) parachute
    op_type_1st: i64,
    vel_1st: f64,
    op_time_1st: f64,
    delay_time_1st: f64,

    motor_file: String,
    thrust_measured_pressure: Option<f64>,
    engine_nozzle_diameter: Option<f64>,

    aero_coef_file: Option<String>,
    #[serde(rename = "CPlen")]
    cp_len: f64,
    #[serde(rename = "CP_alpha")]
    cp_alpha: f64,
    #[serde(rename = "Cd_i")]
    cd_i: f64,
    #[serde(rename = "Cd_f")]
    cd_f: f64,
    #[serde(rename = "Cd_alpha2")]
    cd_alpha2: f64,
    #[serde(rename = "Cna")]
    cna: f64,

    transitions: Option<Vec<TransitionSection>>,
}

#[derive(Debug, Deserialize)]
struct TransitionSection {
    time: f64,
    mass: f64,
    #[serde(rename = "Cd")]
    cd: f64,
}

/// A fully loaded specification file: launch environment plus stage specs.
#[derive(Debug, Clone)]
pub struct LoadedSpec {
    pub name: String,
    pub environment: Environment,
    pub rocket: RocketSpecification,
}

/// Load and resolve a rocket specification. `input_dir` is the root the
/// spec's relative file references (thrust curves under `thrust/`, aero
/// tables) are resolved against.
pub fn load_spec(path: &Path, input_dir: &Path) -> Result<LoadedSpec, SimError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| SimError::config(path.display().to_string(), e.to_string()))?;
    let file: SpecFile = serde_json::from_str(&text)
        .map_err(|e| SimError::config(path.display().to_string(), e.to_string()))?;

    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "spec".to_string());

    let environment = Environment {
        place: file.environment.place.to_lowercase(),
        rail_length: file.environment.rail_len,
        rail_azimuth: file.environment.rail_azi,
        rail_elevation: file.environment.rail_elev,
    };

    let mut body_specs = vec![build_stage("rocket1", &file.rocket1, input_dir)?];
    if let Some(stage) = &file.rocket2 {
        body_specs.push(build_stage("rocket2", stage, input_dir)?);
    }
    if let Some(stage) = &file.rocket3 {
        body_specs.push(build_stage("rocket3", stage, input_dir)?);
    }

    Ok(LoadedSpec {
        name,
        environment,
        rocket: RocketSpecification::new(body_specs),
    })
}

fn build_stage(
    key: &str,
    stage: &StageSection,
    input_dir: &Path,
) -> Result<BodySpecification, SimError> {
    let parachute = build_parachute(key, stage)?;
    let engine = build_engine(key, stage, input_dir)?;
    let aero_table = build_aero_table(key, stage, input_dir);

    Ok(BodySpecification {
        length: stage.ref_len,
        diameter: stage.diam,
        bottom_area: stage.diam * stage.diam * std::f64::consts::PI / 4.0,
        cg_length_initial: stage.cg_len_i,
        cg_length_final: stage.cg_len_f,
        mass_initial: stage.mass_i,
        mass_final: stage.mass_f,
        rolling_moment_inertia_initial: stage.iyz_i,
        rolling_moment_inertia_final: stage.iyz_f,
        cmq: stage.cmq,
        parachutes: vec![parachute],
        engine,
        aero_table,
        transitions: stage
            .transitions
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|t| Transition {
                time: t.time,
                mass: t.mass,
                cd: t.cd,
            })
            .collect::<VecDeque<_>>(),
    })
}

fn build_parachute(key: &str, stage: &StageSection) -> Result<Parachute, SimError> {
    let opening_type = ParachuteOpeningType::from_code(stage.op_type_1st)?;
    let cd = if stage.vel_1st <= 0.0 {
        warn!(
            stage = key,
            "terminal velocity is undefined; parachute Cd will be derived from the other stages"
        );
        0.0
    } else {
        parachute_cd(stage.mass_f, stage.vel_1st)
    };
    Ok(Parachute {
        opening_type,
        terminal_velocity: stage.vel_1st,
        opening_time: stage.op_time_1st,
        opening_height: stage.delay_time_1st,
        cd,
    })
}

fn build_engine(key: &str, stage: &StageSection, input_dir: &Path) -> Result<Engine, SimError> {
    let path = input_dir.join("thrust").join(&stage.motor_file);
    let mut engine = if path.is_file() {
        Engine::from_curve(tables::read_thrust_curve(&path)?)
    } else {
        warn!(
            stage = key,
            path = %path.display(),
            "thrust curve not found; stage flies unpowered"
        );
        Engine::absent()
    };
    if let Some(pressure) = stage.thrust_measured_pressure {
        engine.set_measured_pressure(pressure);
    }
    if let Some(diameter) = stage.engine_nozzle_diameter {
        engine.set_nozzle_diameter(diameter);
    }
    Ok(engine)
}

/// Aero coefficients come from a CSV table when one is given and readable,
/// and from the spec's constant values otherwise.
fn build_aero_table(key: &str, stage: &StageSection, input_dir: &Path) -> AeroTable {
    if let Some(file) = stage.aero_coef_file.as_deref().filter(|f| !f.is_empty()) {
        let path = input_dir.join(file);
        match tables::read_aero_table(&path) {
            Ok(records) if !records.is_empty() => {
                info!(stage = key, "aero coefficients are set from CSV");
                return AeroTable::from_records(records);
            }
            Ok(_) => warn!(stage = key, "aero table is empty; using spec constants"),
            Err(e) => warn!(stage = key, error = %e, "aero table unreadable; using spec constants"),
        }
    } else {
        info!(stage = key, "aero coefficients are set from JSON");
    }
    AeroTable::constant_record(AeroCoefRecord {
        airspeed: 0.0,
        cp: stage.cp_len,
        cp_a: stage.cp_alpha,
        cd_i: stage.cd_i,
        cd_f: stage.cd_f,
        cd_a2: stage.cd_alpha2,
        cna: stage.cna,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
