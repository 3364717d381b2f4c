use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::sim::{EventKind, Sample, SimEvent};

/// Summary of one simulated flight.
#[derive(Debug, Clone, Serialize)]
pub struct FlightSummary {
    pub vessel: String,
    pub flight_time: f64,
    pub final_configuration: Option<i64>,
    /// Time of each configuration change, in order.
    pub staging_times: Vec<f64>,
    pub spawned: Vec<String>,
    pub propellant_start_kg: f64,
    pub propellant_end_kg: f64,
    /// Largest upper-engine deflection from the body axis, deg.
    pub max_gimbal_deg: f64,
    pub events: Vec<String>,
}

impl FlightSummary {
    pub fn from_run(vessel: &str, samples: &[Sample], events: &[SimEvent]) -> Self {
        let staging_times = events
            .iter()
            .filter(|e| matches!(e.kind, EventKind::Staging { .. }))
            .map(|e| e.time)
            .collect();
        let spawned = events
            .iter()
            .filter_map(|e| match &e.kind {
                EventKind::Spawned { name, .. } => Some(name.clone()),
                _ => None,
            })
            .collect();
        let max_gimbal_deg = samples
            .iter()
            .filter_map(|s| s.gimbal_dir)
            .map(|d| d.y.atan2(d.z).abs().to_degrees())
            .fold(0.0_f64, f64::max);

        FlightSummary {
            vessel: vessel.to_string(),
            flight_time: samples.last().map_or(0.0, |s| s.time),
            final_configuration: samples.last().and_then(|s| s.configuration),
            staging_times,
            spawned,
            propellant_start_kg: samples.first().map_or(0.0, |s| s.propellant),
            propellant_end_kg: samples.last().map_or(0.0, |s| s.propellant),
            max_gimbal_deg,
            events: events.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Write flight summary as pretty JSON to a writer.
pub fn write_summary<W: Write>(writer: &mut W, summary: &FlightSummary) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, summary)?;
    writeln!(writer)?;
    Ok(())
}

pub fn write_summary_file(path: impl AsRef<Path>, summary: &FlightSummary) -> Result<()> {
    let mut file = std::fs::File::create(path)?;
    write_summary(&mut file, summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::VesselClass;
    use nalgebra::Vector3;

    fn sample(time: f64, configuration: i64, propellant: f64, dy: f64) -> Sample {
        Sample {
            time,
            configuration: Some(configuration),
            main_level: 1.0,
            booster_level: 0.0,
            propellant,
            gimbal_dir: Some(Vector3::new(0.0, dy, 1.0).normalize()),
            debris: 0,
        }
    }

    #[test]
    fn summary_picks_up_staging() {
        let samples = [sample(1.0, 1, 100.0, 0.0), sample(2.0, 2, 50.0, -0.2)];
        let events = [
            SimEvent { time: 1.0, vessel: "STS".into(), kind: EventKind::Staging { from: 0, to: 1 } },
            SimEvent {
                time: 2.0,
                vessel: "STS".into(),
                kind: EventKind::Spawned { name: "STS-SRB1".into(), class: VesselClass::Booster },
            },
            SimEvent { time: 2.0, vessel: "STS".into(), kind: EventKind::Staging { from: 1, to: 2 } },
        ];
        let s = FlightSummary::from_run("STS", &samples, &events);
        assert_eq!(s.staging_times, vec![1.0, 2.0]);
        assert_eq!(s.spawned, vec!["STS-SRB1".to_string()]);
        assert_eq!(s.final_configuration, Some(2));
        assert!((s.max_gimbal_deg - 0.2_f64.atan().to_degrees()).abs() < 1e-9);
    }

    #[test]
    fn json_output_is_valid() {
        let s = FlightSummary::from_run("Test", &[sample(1.0, 3, 10.0, 0.0)], &[]);
        let mut buf = Vec::new();
        write_summary(&mut buf, &s).unwrap();
        let v: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(v["vessel"], "Test");
        assert_eq!(v["final_configuration"], 3);
    }
}
