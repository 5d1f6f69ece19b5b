use crate::error::SimError;

// ---------------------------------------------------------------------------
// Physical constants
// ---------------------------------------------------------------------------

pub const G0: f64 = 9.80665; // standard gravity, m/s^2
pub const EARTH_RADIUS: f64 = 6_378_137.0; // equatorial radius, m
pub const R_AIR: f64 = 287.0; // specific gas constant for dry air, J/(kg·K)
pub const CELSIUS_ZERO: f64 = 273.15; // 0 °C in K

// ---------------------------------------------------------------------------
// Layered standard atmosphere (sea level to 32 km geopotential)
// ---------------------------------------------------------------------------
//
// Three layers selected by geopotential height; temperature is linear in
// geopotential height within a layer. Above the top threshold the model is
// undefined and sampling is a hard error — the stage cannot be simulated
// further, extrapolating silently is not an option.

/// Geopotential layer boundaries, m.
const LAYER_THRESHOLDS: [f64; 4] = [0.0, 11_000.0, 20_000.0, 32_000.0];

#[derive(Debug, Clone, Copy)]
struct Layer {
    base_temperature: f64, // °C, intercept at h_g = 0
    lapse_rate: f64,       // K/m
    base_pressure: f64,    // Pa
}

/// Atmospheric properties at a given geometric altitude.
#[derive(Debug, Clone, Copy, Default)]
pub struct AtmoSample {
    pub geopotential_height: f64, // m
    pub gravity: f64,             // m/s^2
    pub temperature: f64,         // °C
    pub pressure: f64,            // Pa
    pub density: f64,             // kg/m^3
}

/// Layered atmosphere with a configurable sea-level base state.
#[derive(Debug, Clone)]
pub struct Atmosphere {
    layers: [Layer; 3],
}

impl Atmosphere {
    pub fn new(base_temperature_celsius: f64, base_pressure_pascal: f64) -> Self {
        Atmosphere {
            layers: [
                // Troposphere: configurable base, lapse -6.5 K/km
                Layer {
                    base_temperature: base_temperature_celsius,
                    lapse_rate: -6.5e-3,
                    base_pressure: base_pressure_pascal,
                },
                // Tropopause: isothermal -56.5 °C
                Layer {
                    base_temperature: -56.5,
                    lapse_rate: 0.0,
                    base_pressure: 22_632.064,
                },
                // Stratosphere: lapse +1.0 K/km
                Layer {
                    base_temperature: -76.5,
                    lapse_rate: 1.0e-3,
                    base_pressure: 5_474.889,
                },
            ],
        }
    }

    /// Geopotential height: h_g = R·h / (R + h).
    pub fn geopotential_height(height: f64) -> f64 {
        EARTH_RADIUS * height / (EARTH_RADIUS + height)
    }

    /// Inverse-square gravity at geometric altitude.
    pub fn gravity(height: f64) -> f64 {
        G0 * (EARTH_RADIUS / (EARTH_RADIUS + height)).powi(2)
    }

    fn layer_at(&self, geopotential_height: f64) -> Result<&Layer, SimError> {
        for (layer, threshold) in self.layers.iter().zip(&LAYER_THRESHOLDS[1..]) {
            if geopotential_height < *threshold {
                return Ok(layer);
            }
        }
        Err(SimError::AtmosphereOutOfRange {
            height: geopotential_height,
        })
    }

    /// Compute all derived quantities at a geometric altitude, in their
    /// dependency order: geopotential height, gravity, temperature,
    /// pressure, density.
    pub fn sample(&self, height: f64) -> Result<AtmoSample, SimError> {
        let geopotential_height = Self::geopotential_height(height);
        let gravity = Self::gravity(height);

        let layer = self.layer_at(geopotential_height)?;
        // Layer intercepts are folded to h_g = 0, so the profile is linear
        // in the full geopotential height.
        let temperature = layer.base_temperature + layer.lapse_rate * geopotential_height;

        // Barometric formula with the lapse term inside a Kelvin-temperature
        // denominator: P = P0 * (1 + k/(T_K - k))^5.257, k = lapse * h_g.
        let kelvin = temperature + CELSIUS_ZERO;
        let k = layer.lapse_rate * geopotential_height;
        let pressure = layer.base_pressure * (1.0 + k / (kelvin - k)).powf(5.257);

        let density = pressure / (kelvin * R_AIR);

        Ok(AtmoSample {
            geopotential_height,
            gravity,
            temperature,
            pressure,
            density,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn standard() -> Atmosphere {
        Atmosphere::new(15.0, 101_325.0)
    }

    #[test]
    fn sea_level_base_values() {
        let a = standard().sample(0.0).unwrap();
        assert_relative_eq!(a.temperature, 15.0, epsilon = 1e-9);
        assert_relative_eq!(a.pressure, 101_325.0, epsilon = 1e-6);
        assert_relative_eq!(a.density, 1.225, epsilon = 1e-3);
        assert_relative_eq!(a.gravity, G0, epsilon = 1e-9);
    }

    #[test]
    fn geopotential_height_below_geometric() {
        let h_g = Atmosphere::geopotential_height(10_000.0);
        assert!(h_g < 10_000.0);
        assert!(h_g > 9_980.0);
    }

    #[test]
    fn tropopause_boundary_is_continuous() {
        // Temperature and pressure from the troposphere and tropopause
        // formulas must agree at the 11 km geopotential boundary.
        let atmo = standard();
        // Geometric altitudes straddling h_g = 11000 m.
        let h = EARTH_RADIUS * 11_000.0 / (EARTH_RADIUS - 11_000.0);
        let below = atmo.sample(h - 0.5).unwrap();
        let above = atmo.sample(h + 0.5).unwrap();
        assert!(below.geopotential_height < 11_000.0);
        assert!(above.geopotential_height > 11_000.0);
        assert_relative_eq!(below.temperature, above.temperature, epsilon = 0.01);
        assert_relative_eq!(below.pressure, above.pressure, max_relative = 1e-3);
    }

    #[test]
    fn density_decreases_with_altitude() {
        let atmo = standard();
        let rho_0 = atmo.sample(0.0).unwrap().density;
        let rho_5k = atmo.sample(5_000.0).unwrap().density;
        let rho_15k = atmo.sample(15_000.0).unwrap().density;
        assert!(rho_0 > rho_5k);
        assert!(rho_5k > rho_15k);
        assert!(rho_15k > 0.0);
    }

    #[test]
    fn above_top_layer_is_an_error() {
        let err = standard().sample(40_000.0).unwrap_err();
        assert!(matches!(err, SimError::AtmosphereOutOfRange { .. }));
    }
}
