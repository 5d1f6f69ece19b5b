use nalgebra::Vector3;

use crate::config::WindModelConfig;
use crate::error::SimError;
use crate::physics::atmosphere::{AtmoSample, Atmosphere};

// ---------------------------------------------------------------------------
// Boundary-layer constants ("original" wind model)
// ---------------------------------------------------------------------------

const GEOSTROPHIC_WIND: f64 = 15.0; // m/s
const SURFACE_LAYER_LIMIT: f64 = 300.0; // m, surface layer 0..300
const EKMAN_LAYER_LIMIT: f64 = 1_000.0; // m, Ekman layer 300..1000

// ---------------------------------------------------------------------------
// Wind data & strategies
// ---------------------------------------------------------------------------

/// One row of a measured wind table.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindData {
    pub height: f64,    // m
    pub speed: f64,     // m/s
    pub direction: f64, // deg, direction the wind blows FROM (north 0, east 90)
}

/// Interchangeable wind strategies. Ground-wind parameters carry the
/// magnetic-declination correction applied at construction.
#[derive(Debug, Clone)]
enum WindProfile {
    /// Height-sorted measured table; zero below the first sample, clamped
    /// above the last.
    Real { table: Vec<WindData> },
    /// Surface layer power law twisting into an Ekman spiral toward the
    /// geostrophic wind.
    Original {
        ground_speed: f64,
        ground_direction: f64,
        direction_interval: f64,
    },
    /// Pure power-law scaling of the ground wind.
    OnlyPowerLaw {
        ground_speed: f64,
        ground_direction: f64,
    },
    NoWind,
}

/// Speed/direction to an ENU wind vector (z = 0): the direction names where
/// the wind comes from, so the vector points the opposite way.
fn wind_vector(speed: f64, direction_deg: f64) -> Vector3<f64> {
    let rad = direction_deg.to_radians();
    -Vector3::new(rad.sin(), rad.cos(), 0.0) * speed
}

// ---------------------------------------------------------------------------
// Wind model
// ---------------------------------------------------------------------------

/// Atmosphere + wind state at the most recently updated altitude.
///
/// `update(height)` recomputes geopotential height, gravity, temperature,
/// pressure, density and the wind vector, in that order; the accessors are
/// valid only after at least one successful update.
#[derive(Debug, Clone)]
pub struct WindModel {
    atmosphere: Atmosphere,
    profile: WindProfile,
    power_constant: f64,
    power_law_base_altitude: f64,
    sample: AtmoSample,
    wind: Vector3<f64>,
}

impl WindModel {
    /// Measured-table strategy. The magnetic declination is subtracted from
    /// every direction once, at load.
    pub fn real(
        atmosphere: Atmosphere,
        config: &WindModelConfig,
        mut table: Vec<WindData>,
        magnetic_declination: f64,
    ) -> Self {
        table.sort_by(|a, b| a.height.total_cmp(&b.height));
        for row in &mut table {
            row.direction -= magnetic_declination;
        }
        Self::with_profile(atmosphere, config, WindProfile::Real { table })
    }

    /// Ground-wind strategy (`Original` boundary-layer model).
    pub fn original(
        atmosphere: Atmosphere,
        config: &WindModelConfig,
        ground_speed: f64,
        ground_direction: f64,
        magnetic_declination: f64,
    ) -> Self {
        let ground_direction = (ground_direction - magnetic_declination).rem_euclid(360.0);
        // Twist interval toward the geostrophic axis (270 deg), kept positive.
        let interval = 270.0 - ground_direction;
        let direction_interval = if interval > 45.0 {
            interval
        } else {
            interval + 360.0
        };
        Self::with_profile(
            atmosphere,
            config,
            WindProfile::Original {
                ground_speed,
                ground_direction,
                direction_interval,
            },
        )
    }

    pub fn only_power_law(
        atmosphere: Atmosphere,
        config: &WindModelConfig,
        ground_speed: f64,
        ground_direction: f64,
        magnetic_declination: f64,
    ) -> Self {
        let ground_direction = (ground_direction - magnetic_declination).rem_euclid(360.0);
        Self::with_profile(
            atmosphere,
            config,
            WindProfile::OnlyPowerLaw {
                ground_speed,
                ground_direction,
            },
        )
    }

    pub fn no_wind(atmosphere: Atmosphere, config: &WindModelConfig) -> Self {
        Self::with_profile(atmosphere, config, WindProfile::NoWind)
    }

    fn with_profile(atmosphere: Atmosphere, config: &WindModelConfig, profile: WindProfile) -> Self {
        WindModel {
            atmosphere,
            profile,
            power_constant: config.power_constant,
            power_law_base_altitude: config.power_law_base_altitude,
            sample: AtmoSample::default(),
            wind: Vector3::zeros(),
        }
    }

    pub fn update(&mut self, height: f64) -> Result<(), SimError> {
        self.sample = self.atmosphere.sample(height)?;
        self.wind = match &self.profile {
            WindProfile::Real { table } => self.wind_from_data(table, height),
            WindProfile::Original {
                ground_speed,
                ground_direction,
                direction_interval,
            } => self.wind_original(height, *ground_speed, *ground_direction, *direction_interval),
            WindProfile::OnlyPowerLaw {
                ground_speed,
                ground_direction,
            } => self.wind_power_law(height, *ground_speed, *ground_direction),
            WindProfile::NoWind => Vector3::zeros(),
        };
        Ok(())
    }

    pub fn geopotential_height(&self) -> f64 {
        self.sample.geopotential_height
    }

    pub fn gravity(&self) -> f64 {
        self.sample.gravity
    }

    /// °C.
    pub fn temperature(&self) -> f64 {
        self.sample.temperature
    }

    pub fn pressure(&self) -> f64 {
        self.sample.pressure
    }

    pub fn density(&self) -> f64 {
        self.sample.density
    }

    pub fn wind(&self) -> Vector3<f64> {
        self.wind
    }

    /// Power-law multiplier relative to the reference altitude.
    fn power_law_multiplier(&self, height: f64) -> f64 {
        (height / self.power_law_base_altitude).powf(1.0 / self.power_constant)
    }

    fn wind_from_data(&self, table: &[WindData], height: f64) -> Vector3<f64> {
        if table.is_empty() {
            return Vector3::zeros();
        }
        let idx = table.partition_point(|row| row.height < height);
        if idx == 0 {
            // Below the first measured height: no wind.
            return Vector3::zeros();
        }
        let idx = idx.min(table.len() - 1);
        let lower = table[idx - 1];
        let upper = table[idx];
        // Clamp outside the table span, as for a boundary sample.
        let t = if upper.height > lower.height {
            ((height - lower.height) / (upper.height - lower.height)).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let speed = lower.speed + (upper.speed - lower.speed) * t;
        let direction = lower.direction + (upper.direction - lower.direction) * t;
        wind_vector(speed, direction)
    }

    fn wind_original(
        &self,
        height: f64,
        ground_speed: f64,
        ground_direction: f64,
        direction_interval: f64,
    ) -> Vector3<f64> {
        if height <= 0.0 {
            return wind_vector(ground_speed, ground_direction);
        }

        let delta_direction = height / EKMAN_LAYER_LIMIT * direction_interval;
        let direction = ground_direction + delta_direction;

        if height < SURFACE_LAYER_LIMIT {
            // Surface layer: power-law profile, direction twisting upward.
            return wind_vector(ground_speed, direction) * self.power_law_multiplier(height);
        }

        if height < EKMAN_LAYER_LIMIT {
            // Ekman layer: blend the power-law wind into the spiral approach
            // to the geostrophic wind.
            let border_speed = ground_speed * self.power_law_multiplier(height);
            let k = (height - SURFACE_LAYER_LIMIT) / (SURFACE_LAYER_LIMIT + 2.0_f64.sqrt());
            let u = GEOSTROPHIC_WIND * (1.0 - (-k).exp() * k.cos());
            let v = GEOSTROPHIC_WIND * (1.0 - (-k).exp() * k.sin());
            let descent_rate = (GEOSTROPHIC_WIND - u) / GEOSTROPHIC_WIND;

            let rad = direction.to_radians();
            return wind_vector(border_speed * descent_rate, direction)
                - Vector3::new(u * rad.sin(), v * rad.cos(), v);
        }

        // Free atmosphere: pure geostrophic wind along the fixed axis.
        -Vector3::new(GEOSTROPHIC_WIND, 0.0, 0.0)
    }

    fn wind_power_law(&self, height: f64, ground_speed: f64, ground_direction: f64) -> Vector3<f64> {
        let ground = wind_vector(ground_speed, ground_direction);
        if height <= 0.0 {
            ground
        } else {
            ground * self.power_law_multiplier(height)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use approx::assert_relative_eq;

    fn atmosphere() -> Atmosphere {
        Atmosphere::new(15.0, 101_325.0)
    }

    fn wind_config() -> WindModelConfig {
        AppConfig::default().wind_model
    }

    #[test]
    fn power_law_is_unity_at_base_altitude() {
        let config = wind_config();
        let mut model = WindModel::only_power_law(atmosphere(), &config, 5.0, 0.0, 0.0);
        model.update(config.power_law_base_altitude).unwrap();
        assert_relative_eq!(model.wind().norm(), 5.0, epsilon = 1e-12);
    }

    #[test]
    fn power_law_grows_with_height() {
        let config = wind_config();
        let mut model = WindModel::only_power_law(atmosphere(), &config, 5.0, 90.0, 0.0);
        model.update(100.0).unwrap();
        let high = model.wind().norm();
        model.update(10.0).unwrap();
        let low = model.wind().norm();
        assert!(high > low);
    }

    #[test]
    fn real_table_interpolates_speed_and_direction() {
        let config = wind_config();
        let table = vec![
            WindData { height: 0.0, speed: 5.0, direction: 180.0 },
            WindData { height: 1_000.0, speed: 10.0, direction: 200.0 },
        ];
        let mut model = WindModel::real(atmosphere(), &config, table, 0.0);
        model.update(500.0).unwrap();
        let expected = wind_vector(7.5, 190.0);
        assert_relative_eq!(model.wind().x, expected.x, epsilon = 1e-12);
        assert_relative_eq!(model.wind().y, expected.y, epsilon = 1e-12);
        assert_relative_eq!(model.wind().z, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn real_table_clamps_at_boundaries() {
        let config = wind_config();
        let table = vec![
            WindData { height: 100.0, speed: 5.0, direction: 0.0 },
            WindData { height: 1_000.0, speed: 10.0, direction: 0.0 },
        ];
        let mut model = WindModel::real(atmosphere(), &config, table, 0.0);
        // Below the first sample: no wind.
        model.update(50.0).unwrap();
        assert_relative_eq!(model.wind().norm(), 0.0, epsilon = 1e-12);
        // Above the last sample: boundary value.
        model.update(5_000.0).unwrap();
        assert_relative_eq!(model.wind().norm(), 10.0, epsilon = 1e-12);
    }

    #[test]
    fn original_model_is_geostrophic_above_ekman_layer() {
        let config = wind_config();
        let mut model = WindModel::original(atmosphere(), &config, 3.0, 45.0, 0.0);
        model.update(2_000.0).unwrap();
        assert_relative_eq!(model.wind().x, -GEOSTROPHIC_WIND, epsilon = 1e-12);
        assert_relative_eq!(model.wind().y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn no_wind_is_zero_everywhere() {
        let config = wind_config();
        let mut model = WindModel::no_wind(atmosphere(), &config);
        for h in [0.0, 100.0, 5_000.0] {
            model.update(h).unwrap();
            assert_eq!(model.wind(), Vector3::zeros());
        }
    }

    #[test]
    fn update_refreshes_atmosphere_state() {
        let config = wind_config();
        let mut model = WindModel::no_wind(atmosphere(), &config);
        model.update(0.0).unwrap();
        let p0 = model.pressure();
        model.update(3_000.0).unwrap();
        assert!(model.pressure() < p0);
        assert!(model.gravity() < crate::physics::atmosphere::G0);
        assert!(model.temperature() < 15.0);
    }
}
