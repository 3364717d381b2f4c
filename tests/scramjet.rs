use vessel_sim::host::FlightQuery;
use vessel_sim::physics::atmosphere::AtmConstants;
use vessel_sim::sim::{FlightConditions, SimHost};
use vessel_sim::vehicle::{ScramGlider, ScramModel, TankConfig, VesselModule};

fn glider(model: ScramModel) -> (ScramGlider, SimHost) {
    let mut host = SimHost::new("DG-S");
    let mut dg = ScramGlider::with_model(model);
    dg.set_class_caps(&mut host);
    dg.set_tank_config(TankConfig::ScramLarge);
    dg.post_creation(&mut host, 0.0);
    let (rocket, scram) = TankConfig::ScramLarge.capacities();
    host.set_propellant_mass(dg.main_propellant().unwrap(), rocket);
    host.set_propellant_mass(dg.scram_propellant().unwrap(), scram);
    (dg, host)
}

#[test]
fn thrust_is_never_negative_in_the_envelope() {
    for model in [ScramModel::Easy, ScramModel::Realistic] {
        let (mut dg, mut host) = glider(model);
        dg.set_scram_level(&mut host, 2, 1.0);
        for alt in [5_000.0, 20_000.0, 30_000.0] {
            for i in 0..=40 {
                host.set_conditions(FlightConditions::isa(alt, 0.25 * i as f64));
                dg.post_step(&mut host, 0.0, 0.1);
                for d in dg.scramjet().defs() {
                    assert!(d.thrust >= 0.0);
                    assert!(d.fuel_flow <= model.max_fuel_flow() + 1e-12);
                }
                assert!(dg.scramjet().tsfc(0).is_finite());
                assert!(dg.scram_max()[0] <= 1.0);
            }
        }
    }
}

#[test]
fn scram_fuel_drains_at_speed() {
    let (mut dg, mut host) = glider(ScramModel::Easy);
    let ph = dg.scram_propellant().unwrap();
    let start = host.propellant_mass(ph);
    host.set_conditions(FlightConditions::isa(25_000.0, 5.0));
    dg.set_scram_level(&mut host, 2, 1.0);
    for k in 0..10 {
        dg.post_step(&mut host, k as f64, 1.0);
        host.drain(1.0);
    }
    let burnt = start - host.propellant_mass(ph);
    let expected = 10.0 * (dg.scramjet().dmf(0) + dg.scramjet().dmf(1));
    assert!(burnt > 0.0);
    assert!((burnt - expected).abs() / expected < 1e-3, "burnt {burnt} kg, expected {expected} kg");
}

#[test]
fn vacuum_shuts_the_scramjets_down() {
    let (mut dg, mut host) = glider(ScramModel::Realistic);
    let th = dg.scram_thrusters().unwrap();
    host.set_conditions(FlightConditions::isa(25_000.0, 5.0));
    dg.set_scram_level(&mut host, 2, 1.0);
    dg.post_step(&mut host, 0.0, 0.1);
    assert!(host.thruster_moment(th[0]).0.norm() > 0.0);

    host.set_atmosphere(None);
    dg.post_step(&mut host, 0.1, 0.1);
    assert_eq!(dg.scramjet().dmf(0), 0.0);
    assert_eq!(dg.scram_intensity(), [0.0, 0.0]);
    assert!(host.thruster_moment(th[0]).0.norm() < 1e-3);

    host.set_atmosphere(Some(AtmConstants::EARTH));
    dg.post_step(&mut host, 0.2, 0.1);
    assert!(dg.scram_intensity()[0] > 0.0);
}
