// ---------------------------------------------------------------------------
// Aerodynamic coefficient table
// ---------------------------------------------------------------------------
//
// Maps (airspeed, angle of attack, combustion state) to {Cp, Cd, Cna}.
// Backed either by a single record (JSON constants) or an airspeed-sorted
// series interpolated linearly. A separate constant-offset record is always
// added on top; it is overwritten by mass/Cd transitions mid-flight.

/// Composed coefficients handed to the solver.
#[derive(Debug, Clone, Copy, Default)]
pub struct AeroCoefficient {
    pub cp: f64,  // centre of pressure from nose, m
    pub cd: f64,  // drag coefficient
    pub cna: f64, // normal-force coefficient slope, 1/rad
}

/// One row of the coefficient table.
#[derive(Debug, Clone, Copy, Default)]
pub struct AeroCoefRecord {
    pub airspeed: f64,
    pub cp: f64,
    pub cp_a: f64,  // Cp shift per rad of attack angle
    pub cd_i: f64,  // drag while combusting
    pub cd_f: f64,  // drag after burnout
    pub cd_a2: f64, // drag shift per rad^2 of attack angle
    pub cna: f64,
}

#[derive(Debug, Clone)]
pub struct AeroTable {
    records: Vec<AeroCoefRecord>,
    constant: AeroCoefficient,
    from_table: bool,
}

impl AeroTable {
    /// Single-record table from spec-file constants.
    pub fn constant_record(record: AeroCoefRecord) -> Self {
        AeroTable {
            records: vec![record],
            constant: AeroCoefficient::default(),
            from_table: false,
        }
    }

    /// Airspeed-series table (sorted on construction).
    pub fn from_records(mut records: Vec<AeroCoefRecord>) -> Self {
        records.sort_by(|a, b| a.airspeed.total_cmp(&b.airspeed));
        AeroTable {
            records,
            constant: AeroCoefficient::default(),
            from_table: true,
        }
    }

    /// Whether the coefficients came from an airspeed series.
    pub fn is_table(&self) -> bool {
        self.from_table
    }

    /// Overwrite the constant-offset record (transition-triggered Cd shift).
    pub fn set_constant(&mut self, cp: f64, cd: f64, cna: f64) {
        self.constant = AeroCoefficient { cp, cd, cna };
    }

    fn record_at(&self, airspeed: f64) -> AeroCoefRecord {
        if self.records.len() == 1 {
            return self.records[0];
        }
        let first = self.records[0];
        let last = self.records[self.records.len() - 1];
        if airspeed < first.airspeed {
            return first;
        }
        if airspeed > last.airspeed {
            return last;
        }
        let idx = self
            .records
            .partition_point(|r| r.airspeed < airspeed)
            .clamp(1, self.records.len() - 1);
        let lower = self.records[idx - 1];
        let upper = self.records[idx];
        let t = if upper.airspeed > lower.airspeed {
            (airspeed - lower.airspeed) / (upper.airspeed - lower.airspeed)
        } else {
            0.0
        };
        let lerp = |a: f64, b: f64| a + (b - a) * t;
        AeroCoefRecord {
            airspeed,
            cp: lerp(lower.cp, upper.cp),
            cp_a: lerp(lower.cp_a, upper.cp_a),
            cd_i: lerp(lower.cd_i, upper.cd_i),
            cd_f: lerp(lower.cd_f, upper.cd_f),
            cd_a2: lerp(lower.cd_a2, upper.cd_a2),
            cna: lerp(lower.cna, upper.cna),
        }
    }

    /// Compose the coefficients for the current flight condition.
    pub fn value_in(
        &self,
        airspeed: f64,
        attack_angle: f64,
        combustion_ended: bool,
    ) -> AeroCoefficient {
        let record = self.record_at(airspeed);
        let cd_base = if combustion_ended {
            record.cd_f
        } else {
            record.cd_i
        };
        AeroCoefficient {
            cp: self.constant.cp + record.cp + record.cp_a * attack_angle,
            cd: self.constant.cd + cd_base + record.cd_a2 * attack_angle * attack_angle,
            cna: self.constant.cna + record.cna,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn record(airspeed: f64, cp: f64, cna: f64) -> AeroCoefRecord {
        AeroCoefRecord {
            airspeed,
            cp,
            cp_a: 0.0,
            cd_i: 0.5,
            cd_f: 0.4,
            cd_a2: 2.0,
            cna,
        }
    }

    #[test]
    fn single_record_composition() {
        let table = AeroTable::constant_record(record(0.0, 0.8, 8.0));
        let c = table.value_in(30.0, 0.1, false);
        assert_relative_eq!(c.cp, 0.8, epsilon = 1e-12);
        assert_relative_eq!(c.cd, 0.5 + 2.0 * 0.01, epsilon = 1e-12);
        assert_relative_eq!(c.cna, 8.0, epsilon = 1e-12);
        // After burnout the final drag coefficient applies.
        let c = table.value_in(30.0, 0.0, true);
        assert_relative_eq!(c.cd, 0.4, epsilon = 1e-12);
    }

    #[test]
    fn series_interpolates_and_clamps() {
        let table = AeroTable::from_records(vec![record(10.0, 0.8, 8.0), record(30.0, 1.0, 10.0)]);
        let mid = table.value_in(20.0, 0.0, false);
        assert_relative_eq!(mid.cp, 0.9, epsilon = 1e-12);
        assert_relative_eq!(mid.cna, 9.0, epsilon = 1e-12);
        let below = table.value_in(1.0, 0.0, false);
        assert_relative_eq!(below.cp, 0.8, epsilon = 1e-12);
        let above = table.value_in(100.0, 0.0, false);
        assert_relative_eq!(above.cp, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn constant_offset_shifts_drag() {
        let mut table = AeroTable::constant_record(record(0.0, 0.8, 8.0));
        table.set_constant(0.0, 0.3, 0.0);
        let c = table.value_in(30.0, 0.0, false);
        assert_relative_eq!(c.cd, 0.8, epsilon = 1e-12);
        assert_relative_eq!(c.cp, 0.8, epsilon = 1e-12);
    }
}
