use nalgebra::{Quaternion, UnitQuaternion, Vector3};

use crate::vehicle::aero::AeroCoefficient;

// ---------------------------------------------------------------------------
// Body: one rigid stage's kinematic/dynamic state
// ---------------------------------------------------------------------------

/// Per-stage state vector. Frame: position/velocity in ENU (origin at the
/// launch point), angular velocity and force/moment in the body frame with
/// x along the long axis; `quat` rotates body to ENU.
#[derive(Debug, Clone)]
pub struct Body {
    /// Index into the rocket specification's stage list.
    pub spec_index: usize,

    // Integrated fields (a delta exists for each).
    pub mass: f64,       // kg
    pub ref_length: f64, // nose to CG, m
    pub iyz: f64,        // pitch/yaw inertia, kg·m^2
    pub ix: f64,         // roll inertia, kg·m^2
    pub pos: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub omega_b: Vector3<f64>,
    pub quat: UnitQuaternion<f64>,

    // Derived each step (no delta).
    pub aero_coef: AeroCoefficient,
    pub cnp: f64,
    pub cny: f64,
    pub cmqp: f64,
    pub cmqy: f64,
    pub force_b: Vector3<f64>,
    pub moment_b: Vector3<f64>,
    pub airspeed_b: Vector3<f64>,
    pub attack_angle: f64, // rad

    // Phase flags and running extrema.
    pub elapsed_time: f64, // s since this body became live
    pub parachute_index: usize,
    pub parachute_opened: bool,
    pub wait_for_open_para: bool,
    pub detect_peak: bool,
    pub max_altitude: f64,
    pub max_altitude_time: f64,
}

impl Default for Body {
    fn default() -> Self {
        Body {
            spec_index: 0,
            mass: 0.0,
            ref_length: 0.0,
            iyz: 0.0,
            ix: 0.0,
            pos: Vector3::zeros(),
            velocity: Vector3::zeros(),
            omega_b: Vector3::zeros(),
            quat: UnitQuaternion::identity(),
            aero_coef: AeroCoefficient::default(),
            cnp: 0.0,
            cny: 0.0,
            cmqp: 0.0,
            cmqy: 0.0,
            force_b: Vector3::zeros(),
            moment_b: Vector3::zeros(),
            airspeed_b: Vector3::zeros(),
            attack_angle: 0.0,
            elapsed_time: 0.0,
            parachute_index: 0,
            parachute_opened: false,
            wait_for_open_para: false,
            detect_peak: false,
            max_altitude: 0.0,
            max_altitude_time: 0.0,
        }
    }
}

impl Body {
    /// Euler-integrate one step: `state += delta · dt`, renormalizing the
    /// attitude quaternion, and advance this body's elapsed time.
    pub fn apply(&mut self, delta: &BodyDelta, dt: f64) {
        self.mass += delta.mass * dt;
        self.ref_length += delta.ref_length * dt;
        self.iyz += delta.iyz * dt;
        self.ix += delta.ix * dt;
        self.pos += delta.pos * dt;
        self.velocity += delta.velocity * dt;
        self.omega_b += delta.omega_b * dt;

        let raw = self.quat.quaternion() + delta.quat * dt;
        if raw.norm() > 0.0 {
            self.quat = UnitQuaternion::new_normalize(raw);
        }

        self.elapsed_time += dt;
    }
}

// ---------------------------------------------------------------------------
// Body delta: per-field time derivative
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct BodyDelta {
    pub mass: f64,
    pub ref_length: f64,
    pub iyz: f64,
    pub ix: f64,
    pub pos: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub omega_b: Vector3<f64>,
    pub quat: Quaternion<f64>, // NOT unit — raw quaternion derivative
}

impl Default for BodyDelta {
    fn default() -> Self {
        BodyDelta {
            mass: 0.0,
            ref_length: 0.0,
            iyz: 0.0,
            ix: 0.0,
            pos: Vector3::zeros(),
            velocity: Vector3::zeros(),
            omega_b: Vector3::zeros(),
            quat: Quaternion::new(0.0, 0.0, 0.0, 0.0),
        }
    }
}

// ---------------------------------------------------------------------------
// Rocket: ordered stage collection
// ---------------------------------------------------------------------------

/// Index 0 is the boost (lowest) stage; separation pushes child bodies.
#[derive(Debug, Clone, Default)]
pub struct Rocket {
    pub bodies: Vec<Body>,
    pub time_from_launch: f64,
    pub launch_clear: bool,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn quaternion_stays_unit_under_integration() {
        let mut body = Body {
            omega_b: Vector3::new(0.3, -0.5, 1.1),
            ..Body::default()
        };
        let dt = 0.01;
        for _ in 0..2_000 {
            let delta = BodyDelta {
                quat: body.quat.quaternion() * Quaternion::from_imag(body.omega_b) * 0.5,
                ..BodyDelta::default()
            };
            body.apply(&delta, dt);
            let norm = body.quat.quaternion().norm();
            assert_relative_eq!(norm, 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn zero_quat_delta_keeps_attitude() {
        let mut body = Body::default();
        let before = body.quat;
        body.apply(&BodyDelta::default(), 0.01);
        assert_eq!(body.quat, before);
        assert_relative_eq!(body.elapsed_time, 0.01);
    }

    #[test]
    fn apply_integrates_all_fields() {
        let mut body = Body {
            mass: 10.0,
            ..Body::default()
        };
        let delta = BodyDelta {
            mass: -0.5,
            pos: Vector3::new(0.0, 0.0, 100.0),
            velocity: Vector3::new(0.0, 0.0, -9.8),
            ..BodyDelta::default()
        };
        body.apply(&delta, 0.1);
        assert_relative_eq!(body.mass, 9.95);
        assert_relative_eq!(body.pos.z, 10.0);
        assert_relative_eq!(body.velocity.z, -0.98);
    }
}
