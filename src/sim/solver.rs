use nalgebra::{Quaternion, UnitQuaternion, Vector3};

use crate::config::{AppConfig, DetachType, SimulationSetting, TrajectoryMode, WindModelKind};
use crate::environment::{Environment, MapData};
use crate::error::SimError;
use crate::physics::atmosphere::Atmosphere;
use crate::physics::wind::{WindData, WindModel};
use crate::sim::result::{SimuResultLogger, SimuResultSummary};
use crate::vehicle::body::{Body, BodyDelta, Rocket};
use crate::vehicle::spec::{ParachuteOpeningType, RocketSpecification};

// Roll inertia is not part of the stage specification; every body starts at
// the initial value and ramps linearly to the final value over the burn.
const ROLL_INERTIA_INITIAL: f64 = 0.02;
const ROLL_INERTIA_FINAL: f64 = 0.01;

// Below this altitude the body is considered stuck and its velocity frozen.
const FREEZE_ALTITUDE: f64 = -10.0;

// ---------------------------------------------------------------------------
// Solver
// ---------------------------------------------------------------------------

/// Fixed-timestep forward-Euler flight solver for one wind condition.
///
/// A solver is built fresh for every scenario: it owns a private copy of the
/// rocket specification because transitions are consumed and drag constants
/// rewritten while the flight runs. `solve` integrates the launch body and,
/// for multi-stage vehicles, both bodies spawned at separation, then returns
/// the aggregated result.
pub struct Solver<'a> {
    config: &'a AppConfig,
    environment: &'a Environment,
    map: MapData,
    trajectory_mode: TrajectoryMode,
    detach_type: DetachType,
    detach_time: f64,
    spec: RocketSpecification,
    wind_table: Option<Vec<WindData>>,

    rocket: Rocket,
    delta: BodyDelta,
    current: usize,
    detach_count: usize,
    steps: usize,
}

impl<'a> Solver<'a> {
    pub fn new(
        config: &'a AppConfig,
        environment: &'a Environment,
        map: MapData,
        setting: &SimulationSetting,
        spec: RocketSpecification,
        wind_table: Option<Vec<WindData>>,
    ) -> Self {
        Solver {
            config,
            environment,
            map,
            trajectory_mode: setting.trajectory_mode,
            detach_type: setting.detach_type,
            detach_time: setting.detach_time,
            spec,
            wind_table,
            rocket: Rocket::default(),
            delta: BodyDelta::default(),
            current: 0,
            detach_count: 0,
            steps: 0,
        }
    }

    /// Run the whole scenario at one wind condition. The real-data wind
    /// model ignores the arguments; every other model takes them as the
    /// ground wind.
    pub fn solve(
        mut self,
        wind_speed: f64,
        wind_direction: f64,
    ) -> Result<SimuResultSummary, SimError> {
        let atmosphere = Atmosphere::new(
            self.config.atmosphere.base_temperature_celsius,
            self.config.atmosphere.base_pressure_pascal,
        );
        let mut wind = match self.config.wind_model.kind {
            WindModelKind::Real => WindModel::real(
                atmosphere,
                &self.config.wind_model,
                self.wind_table.take().unwrap_or_default(),
                self.map.magnetic_declination,
            ),
            WindModelKind::Original => WindModel::original(
                atmosphere,
                &self.config.wind_model,
                wind_speed,
                wind_direction,
                self.map.magnetic_declination,
            ),
            WindModelKind::OnlyPowerLaw => WindModel::only_power_law(
                atmosphere,
                &self.config.wind_model,
                wind_speed,
                wind_direction,
                self.map.magnetic_declination,
            ),
            WindModelKind::NoWind => WindModel::no_wind(atmosphere, &self.config.wind_model),
        };

        let mut logger = SimuResultLogger::new(self.map.clone(), wind_speed, wind_direction);
        logger.push_body();

        let save_interval = self.config.step_save_interval();
        let is_multi = self.spec.is_multi();

        let launch_body = self.launch_body();
        self.rocket.bodies.push(launch_body);

        // Bodies spawned at separation are appended to the rocket and
        // solved in turn after the body that carried them.
        loop {
            self.steps = 0;

            loop {
                let body = &self.rocket.bodies[self.current];
                if body.pos.z <= 0.0 && body.elapsed_time >= 0.1 {
                    break;
                }

                wind.update(self.rocket.bodies[self.current].pos.z)?;
                self.apply_transitions();

                if self.trajectory_mode == TrajectoryMode::Parachute {
                    self.update_parachute();
                }
                if is_multi && self.update_detachment() {
                    break;
                }

                self.update_aerodynamic_parameters(&wind);
                self.update_body_properties();
                self.update_external_force(&wind);
                self.update_body_delta(&wind, &mut logger);
                self.apply_delta();

                if self.steps % save_interval == 0 {
                    self.save_step(&mut logger, &wind);
                }
                self.steps += 1;
            }

            // Retain the last step when the interval missed it.
            if self.steps > 0 && (self.steps - 1) % save_interval != 0 {
                self.save_step(&mut logger, &wind);
            }
            logger.set_body_final_position(self.current, self.rocket.bodies[self.current].pos);

            if self.current + 1 >= self.rocket.bodies.len() {
                break;
            }
            self.current += 1;
            logger.push_body();
        }

        let mut result = logger.into_summary();
        result.organize();
        Ok(result)
    }

    // -- body setup ---------------------------------------------------------

    fn launch_body(&self) -> Body {
        let spec = self.spec.body_spec(0);

        // Attitude from the launch rail; yaw measured from east, with the
        // azimuth corrected to true north.
        let yaw =
            (-(self.environment.rail_azimuth - self.map.magnetic_declination) + 90.0).to_radians();
        let pitch = self.environment.rail_elevation.to_radians();
        let quat = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), yaw)
            * UnitQuaternion::from_axis_angle(&Vector3::y_axis(), -pitch);

        Body {
            spec_index: 0,
            mass: spec.mass_initial,
            ref_length: spec.cg_length_initial,
            iyz: spec.rolling_moment_inertia_initial,
            ix: ROLL_INERTIA_INITIAL,
            quat,
            ..Body::default()
        }
    }

    // -- per-step phases ----------------------------------------------------

    /// Consume a due mass/Cd transition, if any.
    fn apply_transitions(&mut self) {
        let spec_index = self.spec.spec_index_for_body(self.current);
        let body = &mut self.rocket.bodies[self.current];
        let spec = self.spec.body_spec_mut(spec_index);

        if let Some(front) = spec.transitions.front().copied() {
            if front.time < body.elapsed_time {
                body.mass += front.mass;
                spec.aero_table.set_constant(0.0, front.cd, 0.0);
                spec.transitions.pop_front();
            }
        }
    }

    fn update_parachute(&mut self) {
        let spec_index = self.spec.spec_index_for_body(self.current);
        let spec = self.spec.body_spec(spec_index);
        let body = &mut self.rocket.bodies[self.current];
        // A stage without a recovery parachute descends ballistically even
        // in parachute mode.
        let Some(parachute) = spec.parachutes.first() else {
            return;
        };

        let past_peak = body.max_altitude
            > body.pos.z + self.config.simulation.detect_peak_threshold;
        if past_peak {
            body.detect_peak = true;
        }
        if body.parachute_opened {
            return;
        }

        match parachute.opening_type {
            ParachuteOpeningType::DetectPeak => {
                if past_peak {
                    body.parachute_opened = true;
                }
            }
            ParachuteOpeningType::FixedTime => {
                if body.elapsed_time > parachute.opening_time {
                    body.parachute_opened = true;
                }
            }
            ParachuteOpeningType::TimeFromDetectPeak => {
                if past_peak && !body.wait_for_open_para {
                    body.wait_for_open_para = true;
                }
                if body.wait_for_open_para
                    && body.elapsed_time - body.max_altitude_time > parachute.opening_time
                {
                    body.parachute_opened = true;
                }
            }
        }
    }

    /// Check the separation condition; on separation spawn both follow-on
    /// bodies (upper stage and dropped booster) inheriting the parent's
    /// position, velocity and attitude, and end the parent's flight.
    fn update_detachment(&mut self) -> bool {
        let spec_index = self.spec.spec_index_for_body(self.current);
        let body = &self.rocket.bodies[self.current];

        let detach = match self.detach_type {
            DetachType::BurningFinished => self
                .spec
                .body_spec(spec_index)
                .engine
                .did_combustion(body.elapsed_time),
            DetachType::Time => body.elapsed_time >= self.detach_time,
            DetachType::SyncPara => body.parachute_opened,
            DetachType::DoNotDetach => return false,
        };

        // Only one separation event is supported.
        if !detach || self.detach_count >= 1 {
            return false;
        }

        let parent = self.rocket.bodies[self.current].clone();
        for child_offset in 1..=2 {
            let child_spec_index = self.spec.spec_index_for_body(self.current + child_offset);
            let child_spec = self.spec.body_spec(child_spec_index);
            self.rocket.bodies.push(Body {
                spec_index: child_spec_index,
                mass: child_spec.mass_initial,
                ref_length: child_spec.cg_length_initial,
                iyz: child_spec.rolling_moment_inertia_initial,
                ix: ROLL_INERTIA_INITIAL,
                pos: parent.pos,
                velocity: parent.velocity,
                quat: parent.quat,
                ..Body::default()
            });
        }
        self.detach_count += 1;
        true
    }

    fn update_aerodynamic_parameters(&mut self, wind: &WindModel) {
        let spec_index = self.spec.spec_index_for_body(self.current);
        let spec = self.spec.body_spec(spec_index);
        let body = &mut self.rocket.bodies[self.current];

        body.airspeed_b = body
            .quat
            .inverse_transform_vector(&(body.velocity - wind.wind()));

        let crossflow = body.airspeed_b.y.hypot(body.airspeed_b.z);
        body.attack_angle = (crossflow / (body.airspeed_b.x + 1e-16)).atan();

        body.aero_coef = spec.aero_table.value_in(
            body.airspeed_b.norm(),
            body.attack_angle,
            spec.engine.did_combustion(body.elapsed_time),
        );

        let alpha = (body.airspeed_b.z / (body.airspeed_b.x + 1e-16)).atan();
        let beta = (body.airspeed_b.y / (body.airspeed_b.x + 1e-16)).atan();
        body.cnp = body.aero_coef.cna * alpha;
        body.cny = body.aero_coef.cna * beta;
        body.cmqp = spec.cmq;
        body.cmqy = spec.cmq;
    }

    /// Mass, CG and inertia rates: linear drain over the burn, zero after.
    fn update_body_properties(&mut self) {
        let spec_index = self.spec.spec_index_for_body(self.current);
        let spec = self.spec.body_spec(spec_index);
        let body = &self.rocket.bodies[self.current];

        if spec.engine.is_combusting(body.elapsed_time) {
            let burn = spec.engine.combustion_time();
            self.delta.mass = (spec.mass_final - spec.mass_initial) / burn;
            self.delta.ref_length = (spec.cg_length_final - spec.cg_length_initial) / burn;
            self.delta.iyz =
                (spec.rolling_moment_inertia_final - spec.rolling_moment_inertia_initial) / burn;
            self.delta.ix = (ROLL_INERTIA_FINAL - ROLL_INERTIA_INITIAL) / burn;
        } else {
            self.delta.mass = 0.0;
            self.delta.ref_length = 0.0;
            self.delta.iyz = 0.0;
            self.delta.ix = 0.0;
        }
    }

    fn update_external_force(&mut self, wind: &WindModel) {
        let spec_index = self.spec.spec_index_for_body(self.current);
        let spec = self.spec.body_spec(spec_index);
        let body = &mut self.rocket.bodies[self.current];

        body.force_b = Vector3::zeros();
        body.moment_b = Vector3::zeros();

        body.force_b.x += spec.engine.thrust_at(body.elapsed_time, wind.pressure());

        // Aerodynamic force and moment are dropped once the canopy is out;
        // the parachute branch of the delta update takes over.
        if !body.parachute_opened {
            let q_area = 0.5 * wind.density() * body.airspeed_b.norm_squared() * spec.bottom_area;
            body.force_b -= Vector3::new(
                body.aero_coef.cd * q_area * body.attack_angle.cos(),
                body.cny * q_area,
                body.cnp * q_area,
            );

            let damping =
                0.25 * wind.density() * body.airspeed_b.norm() * spec.length * spec.length
                    * spec.bottom_area;
            body.moment_b = Vector3::new(
                0.0,
                damping * body.cmqp * body.omega_b.y,
                damping * body.cmqy * body.omega_b.z,
            ) + Vector3::new(0.0, body.force_b.z, -body.force_b.y)
                * (body.aero_coef.cp - body.ref_length);

            let weight = Vector3::new(0.0, 0.0, -wind.gravity() * body.mass);
            body.force_b += body.quat.inverse_transform_vector(&weight);
        }
    }

    fn update_body_delta(&mut self, wind: &WindModel, logger: &mut SimuResultLogger) {
        let spec_index = self.spec.spec_index_for_body(self.current);
        let spec = self.spec.body_spec(spec_index);
        let Rocket {
            bodies,
            launch_clear,
            ..
        } = &mut self.rocket;
        let body = &mut bodies[self.current];

        if body.pos.norm() <= self.environment.rail_length && body.velocity.z >= 0.0 {
            // On the rail: held down while net axial force points backwards,
            // otherwise constrained to slide along the rail axis.
            if body.force_b.x < 0.0 {
                self.delta.pos = Vector3::zeros();
                self.delta.velocity = Vector3::zeros();
                self.delta.omega_b = Vector3::zeros();
                self.delta.quat = Quaternion::new(0.0, 0.0, 0.0, 0.0);
            } else {
                body.force_b.y = 0.0;
                body.force_b.z = 0.0;
                self.delta.pos = body.velocity;
                self.delta.velocity = body.quat.transform_vector(&body.force_b) / body.mass;
                self.delta.omega_b = Vector3::zeros();
                self.delta.quat = Quaternion::new(0.0, 0.0, 0.0, 0.0);
            }
        } else if body.parachute_opened {
            // Vertical drag balance; laterally the body rides the wind.
            let cd = spec
                .parachutes
                .get(body.parachute_index)
                .map(|p| p.cd)
                .unwrap_or(0.0);
            let drag = 0.5 * wind.density() * body.velocity.z * body.velocity.z * cd;
            self.delta.velocity = Vector3::new(0.0, 0.0, drag / body.mass - wind.gravity());

            body.velocity.x = wind.wind().x;
            body.velocity.y = wind.wind().y;
            self.delta.pos = body.velocity;

            self.delta.omega_b = Vector3::zeros();
            self.delta.quat = Quaternion::new(0.0, 0.0, 0.0, 0.0);
        } else if body.pos.z < FREEZE_ALTITUDE {
            self.delta.velocity = Vector3::zeros();
        } else {
            // Free flight.
            if !*launch_clear {
                *launch_clear = true;
                logger.set_launch_clear(body);
            }

            self.delta.pos = body.velocity;
            self.delta.velocity = body.quat.transform_vector(&body.force_b) / body.mass;
            self.delta.omega_b = body
                .moment_b
                .component_div(&Vector3::new(body.ix, body.iyz, body.iyz));
            self.delta.quat = body.quat.quaternion() * Quaternion::from_imag(body.omega_b) * 0.5;
        }
    }

    fn apply_delta(&mut self) {
        let dt = self.config.simulation.dt;
        let body = &mut self.rocket.bodies[self.current];
        body.apply(&self.delta, dt);
        if body.max_altitude < body.pos.z {
            body.max_altitude = body.pos.z;
            body.max_altitude_time = body.elapsed_time;
        }
        self.rocket.time_from_launch += dt;
    }

    fn save_step(&self, logger: &mut SimuResultLogger, wind: &WindModel) {
        let spec_index = self.spec.spec_index_for_body(self.current);
        let spec = self.spec.body_spec(spec_index);
        let body = &self.rocket.bodies[self.current];
        logger.update(
            self.current,
            &self.rocket,
            body,
            wind,
            spec.engine.is_combusting(body.elapsed_time),
            spec.length,
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
