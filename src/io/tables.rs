use std::path::Path;

use serde::Deserialize;

use crate::error::SimError;
use crate::physics::wind::WindData;
use crate::vehicle::aero::AeroCoefRecord;
use crate::vehicle::engine::ThrustSample;

// ---------------------------------------------------------------------------
// CSV table readers (thrust curves, measured wind, aero coefficients)
// ---------------------------------------------------------------------------

/// Read a headerless two-column thrust curve: time [s], thrust [N].
pub fn read_thrust_curve(path: &Path) -> Result<Vec<ThrustSample>, SimError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)?;

    let mut samples = Vec::new();
    for record in reader.records() {
        let record = record?;
        let (time, thrust) = parse_pair(&record).ok_or_else(|| {
            SimError::config(
                path.display().to_string(),
                format!("malformed thrust curve row: {:?}", record),
            )
        })?;
        samples.push(ThrustSample { time, thrust });
    }
    Ok(samples)
}

/// A row may be comma-separated or a single whitespace-separated field.
fn parse_pair(record: &csv::StringRecord) -> Option<(f64, f64)> {
    if record.len() >= 2 {
        let time = record.get(0)?.parse().ok()?;
        let thrust = record.get(1)?.parse().ok()?;
        return Some((time, thrust));
    }
    let mut fields = record.get(0)?.split_whitespace();
    let time = fields.next()?.parse().ok()?;
    let thrust = fields.next()?.parse().ok()?;
    Some((time, thrust))
}

#[derive(Debug, Deserialize)]
struct WindRow {
    height: f64,
    speed: f64,
    direction: f64,
}

/// Read a measured wind table with a `height,speed,direction` header.
pub fn read_wind_table(path: &Path) -> Result<Vec<WindData>, SimError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut table = Vec::new();
    for row in reader.deserialize() {
        let row: WindRow = row?;
        table.push(WindData {
            height: row.height,
            speed: row.speed,
            direction: row.direction,
        });
    }
    Ok(table)
}

/// Read an airspeed-indexed aero coefficient table. Columns, in order:
/// airspeed, Cp, Cp_alpha, Cd_i, Cd_f, Cd_alpha2, Cna (header line skipped).
pub fn read_aero_table(path: &Path) -> Result<Vec<AeroCoefRecord>, SimError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.len() < 7 {
            return Err(SimError::config(
                path.display().to_string(),
                format!("aero table needs 7 columns, found {}", record.len()),
            ));
        }
        let mut fields = [0.0; 7];
        for (slot, raw) in fields.iter_mut().zip(record.iter()) {
            *slot = raw.parse().map_err(|_| {
                SimError::config(
                    path.display().to_string(),
                    format!("non-numeric aero table value: {raw:?}"),
                )
            })?;
        }
        records.push(AeroCoefRecord {
            airspeed: fields[0],
            cp: fields[1],
            cp_a: fields[2],
            cd_i: fields[3],
            cd_f: fields[4],
            cd_a2: fields[5],
            cna: fields[6],
        });
    }
    Ok(records)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_file(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn thrust_curve_parses_comma_rows() {
        let path = temp_file("table_thrust_comma.csv", "0.0,0.0\n0.1,120.5\n1.8,0.0\n");
        let curve = read_thrust_curve(&path).unwrap();
        assert_eq!(curve.len(), 3);
        assert_eq!(curve[1].thrust, 120.5);
    }

    #[test]
    fn thrust_curve_parses_whitespace_rows() {
        let path = temp_file("table_thrust_ws.csv", "0.0 0.0\n0.1 120.5\n");
        let curve = read_thrust_curve(&path).unwrap();
        assert_eq!(curve.len(), 2);
        assert_eq!(curve[1].time, 0.1);
    }

    #[test]
    fn wind_table_parses_header_and_rows() {
        let path = temp_file(
            "table_wind.csv",
            "height,speed,direction\n0,3.0,270\n1000,8.0,290\n",
        );
        let table = read_wind_table(&path).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table[1].direction, 290.0);
    }

    #[test]
    fn short_aero_table_is_an_error() {
        let path = temp_file("table_aero_short.csv", "airspeed,Cp,Cd\n10,0.9,0.4\n");
        assert!(read_aero_table(&path).is_err());
    }

    #[test]
    fn aero_table_parses_seven_columns() {
        let path = temp_file(
            "table_aero.csv",
            "airspeed,Cp,Cp_alpha,Cd_i,Cd_f,Cd_alpha2,Cna\n\
             10,0.9,0.1,0.45,0.4,0.2,8.0\n\
             80,0.95,0.1,0.5,0.45,0.2,8.5\n",
        );
        let records = read_aero_table(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].cna, 8.5);
    }
}
