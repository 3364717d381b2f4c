//! Airbreathing ramjet / scramjet thrust model.
//!
//! A simplified Brayton cycle: isentropic compression in the intake
//! diffuser, constant-pressure heat addition in the burner, isentropic
//! expansion back to ambient pressure in the nozzle. The air mass flow is
//! derived from the diffuser pressure with a calibrated scale constant
//! rather than from density, velocity and intake area directly.

use tracing::trace;

use crate::host::{FlightQuery, ThrusterHandle};

/// Air mass flow per unit diffuser pressure and intake area, kg/(s·Pa·m²).
const DMA_SCALE: f64 = 2.7e-4;

/// Keeps specific fuel consumption finite at zero thrust.
const TSFC_EPS: f64 = 1e-5;

// ---------------------------------------------------------------------------
// Engine definition
// ---------------------------------------------------------------------------

/// Design parameters and last computed state of one ramjet.
#[derive(Debug, Clone, PartialEq)]
pub struct ThrusterDef {
    pub th: ThrusterHandle,
    pub heating_value: f64,   // J/kg
    pub intake_area: f64,     // m^2
    pub max_burner_temp: f64, // K
    pub max_fuel_flow: f64,   // kg/s

    pub fuel_flow: f64,       // kg/s
    pub thrust: f64,          // N
    /// Diffuser, burner and exhaust temperature, K.
    pub temp: [f64; 3],
}

impl ThrusterDef {
    fn new(
        th: ThrusterHandle,
        heating_value: f64,
        intake_area: f64,
        max_burner_temp: f64,
        max_fuel_flow: f64,
    ) -> Self {
        Self {
            th,
            heating_value,
            intake_area,
            max_burner_temp,
            max_fuel_flow,
            fuel_flow: 0.0,
            thrust: 0.0,
            temp: [0.0; 3],
        }
    }

    fn idle(&mut self, t: f64) {
        self.fuel_flow = 0.0;
        self.thrust = 0.0;
        self.temp = [t; 3];
    }
}

/// Freestream quantities shared by every engine of one vessel in a frame.
#[derive(Debug, Clone, Copy)]
struct Intake {
    cp: f64,
    gamma: f64,
    p0: f64,  // static pressure
    v0: f64,  // freestream velocity
    td: f64,  // diffuser temperature
    pd: f64,  // diffuser pressure
    dmafac: f64,
}

// ---------------------------------------------------------------------------
// Engine set
// ---------------------------------------------------------------------------

/// The ramjets mounted on one vessel.
#[derive(Debug, Clone, Default)]
pub struct RamjetEngine {
    defs: Vec<ThrusterDef>,
}

impl RamjetEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an engine. `th` must be a live thruster of the owning vessel.
    pub fn add_thruster_definition(
        &mut self,
        th: ThrusterHandle,
        heating_value: f64,
        intake_area: f64,
        max_burner_temp: f64,
        max_fuel_flow: f64,
    ) {
        self.defs.push(ThrusterDef::new(
            th,
            heating_value,
            intake_area,
            max_burner_temp,
            max_fuel_flow,
        ));
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn def(&self, idx: usize) -> Option<&ThrusterDef> {
        self.defs.get(idx)
    }

    pub fn defs(&self) -> &[ThrusterDef] {
        &self.defs
    }

    /// Compute the thrust of every engine at the current flight conditions.
    ///
    /// Forces are written into `forces` in registration order; extra slots
    /// are left untouched. Each engine's fuel flow, thrust and temperature
    /// trace are refreshed for later telemetry queries.
    pub fn thrust<H: FlightQuery + ?Sized>(&mut self, host: &H, forces: &mut [f64]) {
        let Some(atm) = host.atm_constants() else {
            for (def, f) in self.defs.iter_mut().zip(forces.iter_mut()) {
                def.idle(0.0);
                *f = 0.0;
            }
            return;
        };

        let gamma = atm.gamma;
        let cp = atm.cp();
        let mach = host.mach();
        let t0 = host.atm_temperature();
        let p0 = host.atm_pressure();

        let td = t0 * (1.0 + 0.5 * (gamma - 1.0) * mach * mach);
        let pd = p0 * (td / t0).powf(gamma / (gamma - 1.0));
        let precov = (1.0 - 0.075 * (mach.max(1.0) - 1.0).powf(1.35)).max(0.0);

        let intake = Intake {
            cp,
            gamma,
            p0,
            v0: mach * atm.sound_speed(t0),
            td,
            pd,
            dmafac: DMA_SCALE * precov * pd,
        };

        for (def, f) in self.defs.iter_mut().zip(forces.iter_mut()) {
            let level = host.thruster_level(def.th);
            *f = burn(def, &intake, level);
        }
        trace!(mach, td, pd, precov, "ramjet intake");
    }

    /// Convenience wrapper around [`RamjetEngine::thrust`].
    pub fn thrusts<H: FlightQuery + ?Sized>(&mut self, host: &H) -> Vec<f64> {
        let mut forces = vec![0.0; self.defs.len()];
        self.thrust(host, &mut forces);
        forces
    }

    /// Thrust-specific fuel consumption of engine `idx`, kg/(N·s).
    ///
    /// # Panics
    /// If `idx` is not a registered engine.
    pub fn tsfc(&self, idx: usize) -> f64 {
        let def = &self.defs[idx];
        def.fuel_flow / (def.thrust + TSFC_EPS)
    }

    /// Fuel mass flow of engine `idx` from the last thrust computation, kg/s.
    ///
    /// # Panics
    /// If `idx` is not a registered engine.
    pub fn dmf(&self, idx: usize) -> f64 {
        self.defs[idx].fuel_flow
    }

    /// Diffuser, burner and exhaust temperature of engine `idx`, K.
    ///
    /// # Panics
    /// If `idx` is not a registered engine.
    pub fn temperatures(&self, idx: usize) -> [f64; 3] {
        self.defs[idx].temp
    }
}

/// One engine's cycle at throttle `level`. Returns the thrust, N.
fn burn(def: &mut ThrusterDef, intake: &Intake, level: f64) -> f64 {
    let Intake { cp, gamma, p0, v0, td, pd, dmafac } = *intake;

    // diffuser air already at or above the material limit
    if def.max_burner_temp <= td {
        def.idle(td);
        return 0.0;
    }

    let q_cp = def.heating_value / cp;
    let headroom = q_cp - def.max_burner_temp;
    let d_max = if headroom > 0.0 {
        ((def.max_burner_temp - td) / headroom).max(0.0)
    } else {
        0.0
    };

    let dma = dmafac * def.intake_area;
    let mut d = d_max * level;
    let mut dmf = d * dma;
    if dmf > def.max_fuel_flow {
        dmf = def.max_fuel_flow;
        d = dmf / dma;
    }

    let tb = (d * q_cp + td) / (1.0 + d);
    let te = tb * (p0 / pd).powf((gamma - 1.0) / gamma);
    let ve = (2.0 * cp * (tb - te)).max(0.0).sqrt();
    let fs = (1.0 + d) * ve - v0;
    let thrust = (fs * dma).max(0.0);

    def.fuel_flow = dmf;
    def.thrust = thrust;
    def.temp = [td, tb, te];
    thrust
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{ThrusterSpec, VesselHost};
    use crate::physics::atmosphere::AtmConstants;
    use crate::sim::host::{FlightConditions, SimHost};
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    fn scram_host(alt: f64, mach: f64) -> (SimHost, ThrusterHandle) {
        let mut host = SimHost::new("test");
        let ph = host.create_propellant(1000.0);
        let th = host.create_thruster(&ThrusterSpec::new(
            Vector3::zeros(),
            Vector3::z(),
            0.0,
            Some(ph),
            1.0,
        ));
        host.set_conditions(FlightConditions::isa(alt, mach));
        (host, th)
    }

    fn engine(th: ThrusterHandle, max_burner_temp: f64, max_fuel_flow: f64) -> RamjetEngine {
        let mut e = RamjetEngine::new();
        e.add_thruster_definition(th, 3.5e8, 1.0, max_burner_temp, max_fuel_flow);
        e
    }

    #[test]
    fn full_throttle_reaches_burner_limit() {
        let (mut host, th) = scram_host(25_000.0, 5.0);
        host.set_thruster_level(th, 1.0);
        let mut e = engine(th, 3500.0, 2.0);
        let f = e.thrusts(&host);

        let t = e.temperatures(0);
        assert_relative_eq!(t[0], host.atm_temperature() * 6.0, max_relative = 1e-12);
        // unclamped fuel ratio heats the burner exactly to its limit
        assert_relative_eq!(t[1], 3500.0, max_relative = 1e-9);
        // isentropic expansion undoes the diffuser temperature ratio
        assert_relative_eq!(t[2], 3500.0 / 6.0, max_relative = 1e-9);
        assert!(f[0] > 1.0e5 && f[0] < 2.5e5, "thrust {}", f[0]);
        assert!(e.dmf(0) > 0.0 && e.dmf(0) < 2.0);
    }

    #[test]
    fn fuel_flow_is_capped() {
        let (mut host, th) = scram_host(25_000.0, 5.0);
        host.set_thruster_level(th, 1.0);
        let mut e = engine(th, 3500.0, 0.5);
        e.thrusts(&host);
        assert_relative_eq!(e.dmf(0), 0.5, max_relative = 1e-12);
        assert!(e.temperatures(0)[1] < 3500.0);
    }

    #[test]
    fn overheated_diffuser_gives_no_thrust() {
        let (mut host, th) = scram_host(25_000.0, 5.0);
        host.set_thruster_level(th, 1.0);
        let mut e = engine(th, 1000.0, 2.0);
        let f = e.thrusts(&host);
        let td = host.atm_temperature() * 6.0;
        assert_eq!(f[0], 0.0);
        assert_eq!(e.dmf(0), 0.0);
        for t in e.temperatures(0) {
            assert_relative_eq!(t, td, max_relative = 1e-12);
        }
    }

    #[test]
    fn no_atmosphere_no_thrust() {
        let (mut host, th) = scram_host(25_000.0, 5.0);
        host.set_thruster_level(th, 1.0);
        host.set_atmosphere(None);
        let mut e = engine(th, 3500.0, 2.0);
        let mut forces = [7.0, 7.0];
        e.thrust(&host, &mut forces);
        assert_eq!(forces, [0.0, 7.0]);
        assert_eq!(e.dmf(0), 0.0);
        assert_eq!(e.tsfc(0), 0.0);
    }

    #[test]
    fn envelope_sweep_stays_physical() {
        let (mut host, th) = scram_host(25_000.0, 0.0);
        let mut e = engine(th, 3200.0, 3.0);
        for alt in [0.0, 10_000.0, 25_000.0, 40_000.0] {
            for i in 0..=60 {
                let mach = 0.25 * i as f64;
                host.set_conditions(FlightConditions::isa(alt, mach));
                for level in [0.0, 0.3, 1.0] {
                    host.set_thruster_level(th, level);
                    let f = e.thrusts(&host);
                    assert!(f[0] >= 0.0);
                    assert!(e.dmf(0) <= 3.0 + 1e-12);
                    assert!(e.tsfc(0).is_finite());
                }
            }
        }
    }

    #[test]
    fn zero_throttle_burns_nothing() {
        let (host, th) = scram_host(25_000.0, 4.0);
        let mut e = engine(th, 3500.0, 2.0);
        e.thrusts(&host);
        assert_eq!(e.dmf(0), 0.0);
        assert_eq!(e.tsfc(0), 0.0);
    }

    #[test]
    fn fuel_below_burner_limit_cannot_heat() {
        let (mut host, th) = scram_host(25_000.0, 5.0);
        host.set_thruster_level(th, 1.0);
        let mut e = RamjetEngine::new();
        // heating value too low to ever reach the burner limit
        e.add_thruster_definition(th, 1.0e6, 1.0, 3500.0, 2.0);
        let f = e.thrusts(&host);
        assert_eq!(e.dmf(0), 0.0);
        assert!(f[0] >= 0.0);
    }

    #[test]
    fn non_earth_gas_constants_are_used() {
        let (mut host, th) = scram_host(25_000.0, 5.0);
        host.set_thruster_level(th, 1.0);
        let mut e = engine(th, 3500.0, 2.0);
        let earth = e.thrusts(&host)[0];
        host.set_atmosphere(Some(AtmConstants { gamma: 1.3, r: 188.9 }));
        let other = e.thrusts(&host)[0];
        assert!((earth - other).abs() > 1.0);
    }
}
