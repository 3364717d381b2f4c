use approx::assert_relative_eq;

use vessel_sim::config::StagingParams;
use vessel_sim::host::{FlightQuery, GroupKind, VesselClass};
use vessel_sim::io::ScenarioBlock;
use vessel_sim::sim::{RecordedEvent, SimHost};
use vessel_sim::vehicle::{srb_state, LaunchStack, Stage, VesselModule};

fn loaded(text: &str, load_time: f64) -> (LaunchStack, SimHost) {
    let mut host = SimHost::new("STS-101");
    host.set_time(load_time);
    let mut stack = LaunchStack::default();
    stack.set_class_caps(&mut host);
    stack.load_state(&ScenarioBlock::parse(text)).unwrap();
    stack.post_creation(&mut host, load_time);
    (stack, host)
}

#[test]
fn resumed_burn_separates_on_schedule() {
    let (mut stack, mut host) = loaded("CONFIGURATION 1\nMET 50", 1000.0);
    let t0 = stack.controller().reference_time();
    assert_relative_eq!(t0, 950.0, epsilon = 1e-9);
    assert_eq!(stack.stage(), Stage::BoostersBurning);
    assert!(host.group_defined(GroupKind::Booster));

    stack.post_step(&mut host, t0 + 51.0, 1.0);
    assert_eq!(stack.stage(), Stage::BoostersBurning);

    stack.post_step(&mut host, t0 + 127.0, 1.0);
    assert_eq!(stack.stage(), Stage::BoostersSeparated);
    assert!(!host.group_defined(GroupKind::Booster));
}

#[test]
fn ignition_happens_once() {
    let (mut stack, mut host) = loaded("", 0.0);
    host.set_group_level(GroupKind::Main, 1.0);
    for k in 1..=20 {
        let t = k as f64 * 0.1;
        host.set_time(t);
        stack.post_step(&mut host, t, 0.1);
    }
    let ignitions = host
        .events()
        .iter()
        .filter(|(_, e)| *e == RecordedEvent::SrbIgnition)
        .count();
    assert_eq!(ignitions, 1);
    assert_relative_eq!(stack.controller().reference_time(), 0.1 + 4.0, epsilon = 1e-12);
}

#[test]
fn automatic_separation_fires_at_burn_end() {
    let (mut stack, mut host) = loaded("", 0.0);
    host.set_group_level(GroupKind::Main, 1.0);
    stack.post_step(&mut host, 0.0, 0.1);
    let t0 = stack.controller().reference_time();

    let mut prev_met = f64::NEG_INFINITY;
    for k in 1..2000 {
        let t = k as f64 * 0.1;
        stack.post_step(&mut host, t, 0.1);
        if stack.stage() == Stage::BoostersSeparated {
            let met = t - t0;
            assert!(met > 126.0, "separated early at MET {met}");
            assert!(prev_met <= 126.0, "separated late at MET {met}");
            return;
        }
        prev_met = t - t0;
    }
    panic!("boosters never separated");
}

#[test]
fn manual_jettison_during_burn() {
    let (mut stack, mut host) = loaded("CONFIGURATION 1\nMET 10", 100.0);
    assert_eq!(host.propellant_count(), 3);
    stack.controller_mut().jettison(&mut host, 100.0);

    assert_eq!(stack.stage(), Stage::BoostersSeparated);
    assert!(stack.controller().booster_propellant().is_none());
    assert_eq!(host.propellant_count(), 2);
    assert!(!host.group_defined(GroupKind::Booster));

    let (_, prop) = srb_state(10.0);
    let boosters: Vec<_> = host.spawned().iter().filter(|s| s.class == VesselClass::Booster).collect();
    assert_eq!(boosters.len(), 2);
    for b in boosters {
        assert_relative_eq!(b.fuel_level.unwrap(), prop, epsilon = 1e-12);
    }
}

#[test]
fn jettison_key_reaches_next_step() {
    let (mut stack, mut host) = loaded("CONFIGURATION 2", 0.0);
    assert!(stack.request_jettison(&host));
    stack.post_step(&mut host, 1.0, 0.1);
    assert_eq!(stack.stage(), Stage::TankSeparated);
    assert_eq!(stack.configuration(), Some(3));
    assert!(stack.gimbal_dir(&host).is_none());
}

#[test]
fn save_then_resume_keeps_timeline() {
    let (stack, _) = loaded("CONFIGURATION 1\nMET 30", 500.0);
    let mut scn = ScenarioBlock::new();
    stack.save_state(&mut scn, 520.0);
    assert_eq!(scn.parse_value::<f64>("MET").unwrap(), Some(50.0));

    let (resumed, _) = loaded(&scn.to_string(), 2000.0);
    assert_relative_eq!(resumed.controller().reference_time(), 1950.0, epsilon = 1e-9);
}

#[test]
fn custom_staging_calibration() {
    let staging = StagingParams { separation_time: 120.0, ..StagingParams::default() };
    let mut host = SimHost::new("STS-X");
    let mut stack = LaunchStack::new(staging);
    stack.load_state(&ScenarioBlock::parse("CONFIGURATION 1\nMET 119")).unwrap();
    stack.post_creation(&mut host, 0.0);
    stack.post_step(&mut host, 0.5, 0.5);
    assert_eq!(stack.stage(), Stage::BoostersBurning);
    stack.post_step(&mut host, 1.5, 0.5);
    assert_eq!(stack.stage(), Stage::BoostersSeparated);
}
