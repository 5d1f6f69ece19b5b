use std::collections::VecDeque;

use tracing::warn;

use crate::error::SimError;
use crate::physics::atmosphere::G0;
use crate::vehicle::aero::AeroTable;
use crate::vehicle::engine::Engine;

// ---------------------------------------------------------------------------
// Parachute
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParachuteOpeningType {
    /// Open the moment apogee is detected.
    DetectPeak,
    /// Open at a fixed time after this body went live.
    FixedTime,
    /// Open a fixed delay after apogee detection.
    TimeFromDetectPeak,
}

impl ParachuteOpeningType {
    /// Spec files encode the policy as an integer.
    pub fn from_code(code: i64) -> Result<Self, SimError> {
        match code {
            0 => Ok(ParachuteOpeningType::DetectPeak),
            1 => Ok(ParachuteOpeningType::FixedTime),
            2 => Ok(ParachuteOpeningType::TimeFromDetectPeak),
            other => Err(SimError::config(
                "op_type_1st",
                format!("invalid parachute opening type {other} (expected 0, 1 or 2)"),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Parachute {
    pub opening_type: ParachuteOpeningType,
    pub terminal_velocity: f64, // m/s; <= 0 means undefined
    pub opening_time: f64,      // s
    pub opening_height: f64,    // m
    pub cd: f64,                // effective drag area coefficient
}

/// Parachute drag coefficient that balances gravity at the given terminal
/// velocity (assumes 1.25 kg/m^3 descent-air density).
pub fn parachute_cd(mass_final: f64, terminal_velocity: f64) -> f64 {
    mass_final * G0 / (0.5 * 1.25 * terminal_velocity * terminal_velocity)
}

// ---------------------------------------------------------------------------
// Mass/Cd transition
// ---------------------------------------------------------------------------

/// Time-triggered instantaneous mass and drag-coefficient change, consumed
/// in time order during flight.
#[derive(Debug, Clone, Copy)]
pub struct Transition {
    pub time: f64,
    pub mass: f64, // added to the body mass
    pub cd: f64,   // becomes the constant-offset drag coefficient
}

// ---------------------------------------------------------------------------
// Per-stage specification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct BodySpecification {
    pub length: f64,      // m
    pub diameter: f64,    // m
    pub bottom_area: f64, // m^2

    pub cg_length_initial: f64,
    pub cg_length_final: f64,

    pub mass_initial: f64,
    pub mass_final: f64,

    pub rolling_moment_inertia_initial: f64, // pitch/yaw, kg·m^2
    pub rolling_moment_inertia_final: f64,

    pub cmq: f64, // pitch/yaw damping moment coefficient

    /// Recovery parachutes; the first entry governs parachute-mode descent.
    /// May be empty, in which case the stage always descends ballistically.
    pub parachutes: Vec<Parachute>,
    pub engine: Engine,
    pub aero_table: AeroTable,
    pub transitions: VecDeque<Transition>,
}

// ---------------------------------------------------------------------------
// Whole-vehicle specification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RocketSpecification {
    body_specs: Vec<BodySpecification>,
}

impl RocketSpecification {
    pub fn new(body_specs: Vec<BodySpecification>) -> Self {
        let mut spec = RocketSpecification { body_specs };
        spec.resolve_parachute_cds();
        spec
    }

    pub fn body_count(&self) -> usize {
        self.body_specs.len()
    }

    pub fn is_multi(&self) -> bool {
        self.body_specs.len() > 1
    }

    pub fn body_spec(&self, index: usize) -> &BodySpecification {
        &self.body_specs[index]
    }

    pub fn body_spec_mut(&mut self, index: usize) -> &mut BodySpecification {
        &mut self.body_specs[index]
    }

    /// Stage spec governing a given body index, clamped to the last stage
    /// for separated siblings beyond the defined list.
    pub fn spec_index_for_body(&self, body_index: usize) -> usize {
        body_index.min(self.body_specs.len() - 1)
    }

    /// Fill in drag coefficients for parachutes whose terminal velocity was
    /// undefined: each one takes the sum of the other stages' coefficients.
    fn resolve_parachute_cds(&mut self) {
        let total: f64 = self
            .body_specs
            .iter()
            .filter_map(|s| s.parachutes.first())
            .map(|p| p.cd)
            .sum();
        for spec in &mut self.body_specs {
            if let Some(parachute) = spec.parachutes.first_mut() {
                if parachute.cd == 0.0 {
                    warn!("terminal velocity is undefined; parachute Cd is automatically calculated");
                    parachute.cd = total;
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
