use std::f64::consts::PI;

// ---------------------------------------------------------------------------
// Engine: interpolated thrust curve with ambient-pressure correction
// ---------------------------------------------------------------------------

/// One sample of a measured thrust curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThrustSample {
    pub time: f64,   // s
    pub thrust: f64, // N
}

/// Sea-level reference pressure for thrust-curve measurements, Pa.
const DEFAULT_MEASURED_PRESSURE: f64 = 101_325.0;

/// A motor described by a time-ordered thrust curve. An engine with no curve
/// is "absent": it produces zero thrust and reports combustion as finished.
#[derive(Debug, Clone)]
pub struct Engine {
    curve: Vec<ThrustSample>,
    measured_pressure: f64, // Pa
    nozzle_area: f64,       // m^2
}

impl Engine {
    /// An engine with no thrust data (missing or unreadable motor file).
    pub fn absent() -> Self {
        Engine {
            curve: Vec::new(),
            measured_pressure: DEFAULT_MEASURED_PRESSURE,
            nozzle_area: 0.0,
        }
    }

    /// Build from curve samples; sorts by time and prepends a zero sample
    /// when the curve does not start at t = 0.
    pub fn from_curve(mut samples: Vec<ThrustSample>) -> Self {
        samples.sort_by(|a, b| a.time.total_cmp(&b.time));
        if samples.first().map(|s| s.time != 0.0).unwrap_or(false) {
            samples.insert(0, ThrustSample { time: 0.0, thrust: 0.0 });
        }
        Engine {
            curve: samples,
            measured_pressure: DEFAULT_MEASURED_PRESSURE,
            nozzle_area: 0.0,
        }
    }

    pub fn exists(&self) -> bool {
        !self.curve.is_empty()
    }

    pub fn set_measured_pressure(&mut self, pressure: f64) {
        self.measured_pressure = pressure;
    }

    pub fn set_nozzle_diameter(&mut self, diameter: f64) {
        self.nozzle_area = PI * diameter * diameter / 4.0;
    }

    /// Burn duration: the last sample's time, 0 when no data is loaded.
    pub fn combustion_time(&self) -> f64 {
        self.curve.last().map(|s| s.time).unwrap_or(0.0)
    }

    pub fn is_combusting(&self, time: f64) -> bool {
        self.exists() && time < self.combustion_time()
    }

    pub fn did_combustion(&self, time: f64) -> bool {
        !self.exists() || time > self.combustion_time()
    }

    /// Thrust at elapsed time under the given ambient pressure: linear
    /// interpolation inside the curve, zero outside, corrected by
    /// (measured − ambient) · nozzle area.
    pub fn thrust_at(&self, time: f64, ambient_pressure: f64) -> f64 {
        if !self.is_combusting(time) {
            return 0.0;
        }

        let idx = self.curve.partition_point(|s| s.time < time);
        let thrust = if idx == 0 {
            self.curve[0].thrust
        } else {
            let lower = self.curve[idx - 1];
            let upper = self.curve[idx];
            let t = (time - lower.time) / (upper.time - lower.time);
            lower.thrust + (upper.thrust - lower.thrust) * t
        };

        thrust + (self.measured_pressure - ambient_pressure) * self.nozzle_area
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
