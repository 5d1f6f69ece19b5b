use nalgebra::Vector3;

use crate::environment::MapData;
use crate::physics::wind::WindModel;
use crate::vehicle::body::{Body, Rocket};

// ---------------------------------------------------------------------------
// Per-step snapshot
// ---------------------------------------------------------------------------

/// One retained integration-step snapshot of a body.
#[derive(Debug, Clone)]
pub struct SimuResultStep {
    // general
    pub time_from_launch: f64,
    pub elapsed_time: f64,

    // phase flags
    pub launch_clear: bool,
    pub combusting: bool,
    pub parachute_opened: bool,

    // air
    pub air_density: f64,
    pub air_gravity: f64,
    pub air_pressure: f64,
    pub air_temperature: f64,
    pub air_wind: Vector3<f64>,

    // body
    pub mass: f64,
    pub cg_length: f64,
    pub iyz: f64,
    pub ix: f64,
    pub attack_angle: f64,
    pub pos: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub airspeed_b: Vector3<f64>,
    pub force_b: Vector3<f64>,
    pub cnp: f64,
    pub cny: f64,
    pub cmqp: f64,
    pub cmqy: f64,
    pub cp: f64,
    pub cd: f64,
    pub cna: f64,

    // position
    pub latitude: f64,
    pub longitude: f64,
    pub downrange: f64,

    // calculated
    pub fst: f64, // static margin, % of body length
    pub dynamic_pressure: f64,
}

/// Time series for one body (stage).
#[derive(Debug, Clone, Default)]
pub struct SimuResultBody {
    pub steps: Vec<SimuResultStep>,
}

/// Landing (or freeze) point of one body.
#[derive(Debug, Clone, Copy, Default)]
pub struct BodyFinalPosition {
    pub latitude: f64,
    pub longitude: f64,
}

// ---------------------------------------------------------------------------
// Whole-scenario summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct SimuResultSummary {
    pub body_results: Vec<SimuResultBody>,
    pub body_final_positions: Vec<BodyFinalPosition>,

    // wind condition of this scenario
    pub wind_speed: f64,
    pub wind_direction: f64,

    // launch clear
    pub launch_clear_time: f64,
    pub launch_clear_velocity: Vector3<f64>,

    // extrema
    pub max_altitude: f64,
    pub detect_peak_time: f64,
    pub max_velocity: f64,
    pub max_airspeed: f64,
    pub max_normal_force_during_rising: f64,
}

impl SimuResultSummary {
    /// Clamp below-ground samples to the surface.
    pub fn organize(&mut self) {
        for body in &mut self.body_results {
            for step in &mut body.steps {
                if step.pos.z < 0.0 {
                    step.pos.z = 0.0;
                }
            }
        }
    }

    /// Reduce to landing points only: keep each body's last retained step
    /// and drop bodies that never reached the ground.
    pub fn into_scatter_format(mut self) -> SimuResultSummary {
        for body in &mut self.body_results {
            if body.steps.len() > 1 {
                body.steps = body.steps.split_off(body.steps.len() - 1);
            }
        }
        self.body_results
            .retain(|body| body.steps.last().map(|s| s.pos.z <= 0.0).unwrap_or(false));
        self
    }
}

// ---------------------------------------------------------------------------
// Per-run result logger
// ---------------------------------------------------------------------------

/// Accumulates snapshots and summary extrema for exactly one solver
/// invocation; returned by value so scenario runs stay independent.
#[derive(Debug, Clone)]
pub struct SimuResultLogger {
    map: MapData,
    result: SimuResultSummary,
}

impl SimuResultLogger {
    pub fn new(map: MapData, wind_speed: f64, wind_direction: f64) -> Self {
        SimuResultLogger {
            map,
            result: SimuResultSummary {
                wind_speed,
                wind_direction,
                ..SimuResultSummary::default()
            },
        }
    }

    /// Open a new body's time series (called once per solved body).
    pub fn push_body(&mut self) {
        self.result.body_results.push(SimuResultBody::default());
        self.result
            .body_final_positions
            .push(BodyFinalPosition::default());
    }

    pub fn set_launch_clear(&mut self, body: &Body) {
        self.result.launch_clear_time = body.elapsed_time;
        self.result.launch_clear_velocity = body.velocity;
    }

    pub fn set_body_final_position(&mut self, body_index: usize, pos: Vector3<f64>) {
        self.result.body_final_positions[body_index] = BodyFinalPosition {
            latitude: self.map.coordinate.latitude_at(pos.y),
            longitude: self.map.coordinate.longitude_at(pos.x),
        };
    }

    /// Record one snapshot and fold it into the running extrema.
    pub fn update(
        &mut self,
        body_index: usize,
        rocket: &Rocket,
        body: &Body,
        wind: &WindModel,
        combusting: bool,
        body_length: f64,
    ) {
        let normal_force = body.force_b.y.hypot(body.force_b.z);
        let airspeed = body.airspeed_b.norm();

        let step = SimuResultStep {
            time_from_launch: rocket.time_from_launch,
            elapsed_time: body.elapsed_time,

            launch_clear: rocket.launch_clear,
            combusting,
            parachute_opened: body.parachute_opened,

            air_density: wind.density(),
            air_gravity: wind.gravity(),
            air_pressure: wind.pressure(),
            air_temperature: wind.temperature(),
            air_wind: wind.wind(),

            mass: body.mass,
            cg_length: body.ref_length,
            iyz: body.iyz,
            ix: body.ix,
            attack_angle: body.attack_angle,
            pos: body.pos,
            velocity: body.velocity,
            airspeed_b: body.airspeed_b,
            force_b: body.force_b,
            cnp: body.cnp,
            cny: body.cny,
            cmqp: body.cmqp,
            cmqy: body.cmqy,
            cp: body.aero_coef.cp,
            cd: body.aero_coef.cd,
            cna: body.aero_coef.cna,

            latitude: self.map.coordinate.latitude_at(body.pos.y),
            longitude: self.map.coordinate.longitude_at(body.pos.x),
            downrange: body.pos.x.hypot(body.pos.y),

            fst: 100.0 * (body.aero_coef.cp - body.ref_length) / body_length,
            dynamic_pressure: 0.5 * wind.density() * airspeed * airspeed,
        };
        self.result.body_results[body_index].steps.push(step);

        let rising = body.velocity.z > 0.0;
        if self.result.max_altitude < body.pos.z {
            self.result.max_altitude = body.pos.z;
            self.result.detect_peak_time = body.elapsed_time;
        }
        if self.result.max_velocity < body.velocity.norm() {
            self.result.max_velocity = body.velocity.norm();
        }
        if self.result.max_airspeed < airspeed {
            self.result.max_airspeed = airspeed;
        }
        if rising && self.result.max_normal_force_during_rising < normal_force {
            self.result.max_normal_force_during_rising = normal_force;
        }
    }

    pub fn into_summary(self) -> SimuResultSummary {
        self.result
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_step(altitude: f64) -> SimuResultStep {
        SimuResultStep {
            time_from_launch: 0.0,
            elapsed_time: 0.0,
            launch_clear: false,
            combusting: false,
            parachute_opened: false,
            air_density: 1.2,
            air_gravity: 9.8,
            air_pressure: 101_325.0,
            air_temperature: 15.0,
            air_wind: Vector3::zeros(),
            mass: 10.0,
            cg_length: 1.0,
            iyz: 2.0,
            ix: 0.02,
            attack_angle: 0.0,
            pos: Vector3::new(0.0, 0.0, altitude),
            velocity: Vector3::zeros(),
            airspeed_b: Vector3::zeros(),
            force_b: Vector3::zeros(),
            cnp: 0.0,
            cny: 0.0,
            cmqp: 0.0,
            cmqy: 0.0,
            cp: 1.2,
            cd: 0.4,
            cna: 8.0,
            latitude: 0.0,
            longitude: 0.0,
            downrange: 0.0,
            fst: 0.0,
            dynamic_pressure: 0.0,
        }
    }

    #[test]
    fn organize_clamps_below_ground() {
        let mut summary = SimuResultSummary::default();
        summary.body_results.push(SimuResultBody {
            steps: vec![dummy_step(100.0), dummy_step(-3.0)],
        });
        summary.organize();
        assert_eq!(summary.body_results[0].steps[1].pos.z, 0.0);
    }

    #[test]
    fn scatter_format_keeps_only_landed_bodies() {
        let mut summary = SimuResultSummary::default();
        summary.body_results.push(SimuResultBody {
            steps: vec![dummy_step(100.0), dummy_step(0.0)],
        });
        summary.body_results.push(SimuResultBody {
            steps: vec![dummy_step(100.0), dummy_step(500.0)],
        });
        let scatter = summary.into_scatter_format();
        assert_eq!(scatter.body_results.len(), 1);
        assert_eq!(scatter.body_results[0].steps.len(), 1);
    }
}
