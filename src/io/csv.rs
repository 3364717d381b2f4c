use std::io::{self, Write};
use std::path::Path;

use crate::sim::Sample;

/// Write the primary vessel's telemetry to CSV.
///
/// Columns: time, configuration, main_level, booster_level, propellant_kg,
///          gimbal_y, gimbal_z, debris
pub fn write_telemetry<W: Write>(writer: &mut W, samples: &[Sample]) -> io::Result<()> {
    writeln!(
        writer,
        "time,configuration,main_level,booster_level,propellant_kg,gimbal_y,gimbal_z,debris"
    )?;

    for s in samples {
        let cfg = s.configuration.map_or_else(String::new, |c| c.to_string());
        let (gy, gz) = s.gimbal_dir.map_or((0.0, 0.0), |d| (d.y, d.z));
        writeln!(
            writer,
            "{:.3},{},{:.4},{:.4},{:.1},{:.6},{:.6},{}",
            s.time, cfg, s.main_level, s.booster_level, s.propellant, gy, gz, s.debris,
        )?;
    }

    Ok(())
}

pub fn write_telemetry_file(path: impl AsRef<Path>, samples: &[Sample]) -> io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    write_telemetry(&mut file, samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn csv_output_has_header_and_rows() {
        let samples = vec![
            Sample {
                time: 0.1,
                configuration: Some(0),
                main_level: 1.0,
                booster_level: 0.0,
                propellant: 1_742_967.0,
                gimbal_dir: Some(Vector3::new(0.0, -0.13, 0.99)),
                debris: 0,
            },
            Sample {
                time: 0.2,
                configuration: None,
                main_level: 0.0,
                booster_level: 0.0,
                propellant: 0.0,
                gimbal_dir: None,
                debris: 2,
            },
        ];

        let mut buf = Vec::new();
        write_telemetry(&mut buf, &samples).unwrap();
        let output = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = output.lines().collect();

        assert!(lines[0].starts_with("time,"));
        assert_eq!(lines.len(), 3); // header + 2 data rows
        assert!(lines[1].starts_with("0.100,0,1.0000,"));
        assert!(lines[2].starts_with("0.200,,"));
        assert!(lines[2].ends_with(",2"));
    }
}
