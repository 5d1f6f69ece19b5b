use std::io::{self, Write};
use std::path::Path;

use crate::sim::result::{SimuResultStep, SimuResultSummary};

// ---------------------------------------------------------------------------
// Result CSV writers
// ---------------------------------------------------------------------------

const DETAIL_HEADER: &str = "time_from_launch[s],elapsed_time[s],\
     launch_clear?,combusting?,para_opened?,\
     air_density[kg/m3],gravity[m/s2],pressure[Pa],temperature[C],\
     wind_x[m/s],wind_y[m/s],wind_z[m/s],\
     mass[kg],Cg_from_nose[m],inertia_moment_pitch_yaw[kg*m2],inertia_moment_roll[kg*m2],\
     attack_angle[rad],altitude[m],velocity[m/s],airspeed[m/s],\
     accel[m/s2],longitudinal_accel[m/s2],normal_force[N],\
     Cnp,Cny,Cmqp,Cmqy,Cp_from_nose[m],Cd,Cna,\
     latitude,longitude,downrange[m],Fst[%],dynamic_pressure[Pa]";

const SUMMARY_HEADER: &str = "wind_speed[m/s],wind_dir[deg],\
     launch_clear_time[s],launch_clear_vel[m/s],\
     max_altitude[m],max_altitude_time[s],max_velocity[m/s],max_airspeed[m/s],\
     max_normal_force_rising[N]";

/// Write a detail-mode result: one time-series CSV per body plus the
/// one-line summary CSV.
pub fn save_detail(dir: &Path, result: &SimuResultSummary, precision: usize) -> io::Result<()> {
    for (index, body) in result.body_results.iter().enumerate() {
        let path = dir.join(format!("detail_body{}.csv", index + 1));
        let mut file = std::fs::File::create(path)?;
        write_body_result(&mut file, &body.steps, precision)?;
    }

    let mut file = std::fs::File::create(dir.join("summary.csv"))?;
    write_summary_header(&mut file, result.body_final_positions.len())?;
    write_summary_line(&mut file, result, result.body_final_positions.len(), precision)?;
    Ok(())
}

/// Write a scatter-mode result: one summary line per wind condition.
pub fn save_scatter(
    dir: &Path,
    results: &[SimuResultSummary],
    precision: usize,
) -> io::Result<()> {
    let mut file = std::fs::File::create(dir.join("summary.csv"))?;
    let body_count = results
        .iter()
        .map(|r| r.body_final_positions.len())
        .max()
        .unwrap_or(0);

    write_summary_header(&mut file, body_count)?;
    for result in results {
        write_summary_line(&mut file, result, body_count, precision)?;
    }
    Ok(())
}

fn write_body_result<W: Write>(
    writer: &mut W,
    steps: &[SimuResultStep],
    prec: usize,
) -> io::Result<()> {
    writeln!(writer, "{DETAIL_HEADER}")?;

    for s in steps {
        let normal_force = s.force_b.y.hypot(s.force_b.z);
        writeln!(
            writer,
            "{:.p$},{:.p$},{},{},{},\
             {:.p$},{:.p$},{:.p$},{:.p$},{:.p$},{:.p$},{:.p$},\
             {:.p$},{:.p$},{:.p$},{:.p$},{:.p$},{:.p$},{:.p$},{:.p$},\
             {:.p$},{:.p$},{:.p$},\
             {:.p$},{:.p$},{:.p$},{:.p$},{:.p$},{:.p$},{:.p$},\
             {:.p$},{:.p$},{:.p$},{:.p$},{:.p$}",
            s.time_from_launch,
            s.elapsed_time,
            s.launch_clear,
            s.combusting,
            s.parachute_opened,
            s.air_density,
            s.air_gravity,
            s.air_pressure,
            s.air_temperature,
            s.air_wind.x,
            s.air_wind.y,
            s.air_wind.z,
            s.mass,
            s.cg_length,
            s.iyz,
            s.ix,
            s.attack_angle,
            s.pos.z,
            s.velocity.norm(),
            s.airspeed_b.norm(),
            s.force_b.norm() / s.mass,
            s.force_b.x / s.mass,
            normal_force,
            s.cnp,
            s.cny,
            s.cmqp,
            s.cmqy,
            s.cp,
            s.cd,
            s.cna,
            s.latitude,
            s.longitude,
            s.downrange,
            s.fst,
            s.dynamic_pressure,
            p = prec,
        )?;
    }
    Ok(())
}

fn write_summary_header<W: Write>(writer: &mut W, body_count: usize) -> io::Result<()> {
    write!(writer, "{SUMMARY_HEADER}")?;
    for index in 0..body_count {
        write!(writer, ",{index}_final_latitude,{index}_final_longitude")?;
    }
    writeln!(writer)
}

fn write_summary_line<W: Write>(
    writer: &mut W,
    result: &SimuResultSummary,
    body_count: usize,
    prec: usize,
) -> io::Result<()> {
    write!(
        writer,
        "{:.p$},{:.p$},{:.p$},{:.p$},{:.p$},{:.p$},{:.p$},{:.p$},{:.p$}",
        result.wind_speed,
        result.wind_direction,
        result.launch_clear_time,
        result.launch_clear_velocity.norm(),
        result.max_altitude,
        result.detect_peak_time,
        result.max_velocity,
        result.max_airspeed,
        result.max_normal_force_during_rising,
        p = prec,
    )?;
    // Pad with zeros so every line carries the same column count.
    for index in 0..body_count {
        let (latitude, longitude) = result
            .body_final_positions
            .get(index)
            .map(|pos| (pos.latitude, pos.longitude))
            .unwrap_or((0.0, 0.0));
        write!(writer, ",{latitude:.p$},{longitude:.p$}", p = prec)?;
    }
    writeln!(writer)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::result::{BodyFinalPosition, SimuResultBody};
    use nalgebra::Vector3;

    fn summary_with_bodies(count: usize) -> SimuResultSummary {
        let mut summary = SimuResultSummary {
            wind_speed: 3.0,
            wind_direction: 90.0,
            max_altitude: 350.0,
            ..SimuResultSummary::default()
        };
        for index in 0..count {
            summary.body_results.push(SimuResultBody::default());
            summary.body_final_positions.push(BodyFinalPosition {
                latitude: 40.0 + index as f64,
                longitude: 140.0,
            });
        }
        summary
    }

    #[test]
    fn summary_header_grows_with_body_count() {
        let mut buf = Vec::new();
        write_summary_header(&mut buf, 2).unwrap();
        let header = String::from_utf8(buf).unwrap();
        assert!(header.contains("0_final_latitude"));
        assert!(header.contains("1_final_longitude"));
        assert!(!header.contains("2_final_latitude"));
    }

    #[test]
    fn scatter_lines_are_padded_to_widest_body_count() {
        let mut buf = Vec::new();
        write_summary_header(&mut buf, 2).unwrap();
        write_summary_line(&mut buf, &summary_with_bodies(1), 2, 2).unwrap();
        let output = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(
            lines[0].split(',').count(),
            lines[1].split(',').count(),
        );
    }

    #[test]
    fn detail_rows_have_header_column_count() {
        let step = SimuResultStep {
            time_from_launch: 0.0,
            elapsed_time: 0.0,
            launch_clear: false,
            combusting: true,
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
            pos: Vector3::new(0.0, 0.0, 10.0),
            velocity: Vector3::new(0.0, 0.0, 30.0),
            airspeed_b: Vector3::new(30.0, 0.0, 0.0),
            force_b: Vector3::new(200.0, 0.0, 0.0),
            cnp: 0.0,
            cny: 0.0,
            cmqp: -2.0,
            cmqy: -2.0,
            cp: 1.2,
            cd: 0.4,
            cna: 8.0,
            latitude: 40.0,
            longitude: 140.0,
            downrange: 0.0,
            fst: 10.0,
            dynamic_pressure: 540.0,
        };

        let mut buf = Vec::new();
        write_body_result(&mut buf, &[step], 4).unwrap();
        let output = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(
            lines[0].split(',').count(),
            lines[1].split(',').count(),
        );
    }
}
