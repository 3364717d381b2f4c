//! Scramjet-equipped glider.
//!
//! Two scramjets share one propellant tank next to the rocket main tank.
//! Their thrust rating and Isp are not fixed: every step the ramjet model
//! recomputes them from the current flight conditions and the result is
//! written back into the host's thruster table.

use std::fmt;

use nalgebra::Vector3;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::gnc::ScramGimbal;
use crate::host::{
    DragCoefficients, FlightQuery, GroupKind, PhysicalParams, PhysicalParamsBuilder,
    PropellantHandle, ThrusterHandle, ThrusterSpec, VesselClass, VesselHost,
};
use crate::io::scenario::ScenarioBlock;
use crate::physics::ramjet::RamjetEngine;

use super::module::VesselModule;

pub const KEY_TANKCONFIG: &str = "TANKCONFIG";

const EMPTY_MASS: f64 = 13_000.0;
const TANK1_CAPACITY: f64 = 10_400.0;
const TANK2_CAPACITY: f64 = 2_500.0;

const MAIN_ISP: f64 = 4.0e4;
const SCRAM_INTAKE_AREA: f64 = 1.0;

/// Numerical floor for levels and flows that end up in a denominator.
const EPS: f64 = 1e-8;

// ---------------------------------------------------------------------------
// Variants
// ---------------------------------------------------------------------------

/// Flight model difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScramModel {
    #[default]
    Easy,
    Realistic,
}

impl ScramModel {
    fn idx(self) -> usize {
        match self {
            ScramModel::Easy => 0,
            ScramModel::Realistic => 1,
        }
    }

    pub fn max_main_thrust(self) -> f64 {
        [2.0e5, 1.6e5][self.idx()]
    }

    /// Fuel heating value, J/kg.
    pub fn heating_value(self) -> f64 {
        [3.5e8, 2.0e8][self.idx()]
    }

    pub fn max_burner_temp(self) -> f64 {
        [3500.0, 3200.0][self.idx()]
    }

    pub fn max_fuel_flow(self) -> f64 {
        [2.0, 3.0][self.idx()]
    }

    /// Thrust against which exhaust intensity is normalised, N.
    pub fn nominal_scram_thrust(self) -> f64 {
        2.5 * self.max_main_thrust()
    }

    fn isp_scale(self) -> f64 {
        [1.0, 0.8][self.idx()]
    }
}

/// Split of the two fuel tanks between the rocket engines and the scramjets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TankConfig {
    /// Both tanks feed the rocket engines.
    #[default]
    RocketOnly,
    /// Large tank to the rockets, small tank to the scramjets.
    ScramSmall,
    /// Small tank to the rockets, large tank to the scramjets.
    ScramLarge,
}

impl TankConfig {
    pub fn index(self) -> i64 {
        match self {
            TankConfig::RocketOnly => 0,
            TankConfig::ScramSmall => 1,
            TankConfig::ScramLarge => 2,
        }
    }

    pub fn from_index(idx: i64) -> Result<Self> {
        match idx {
            0 => Ok(TankConfig::RocketOnly),
            1 => Ok(TankConfig::ScramSmall),
            2 => Ok(TankConfig::ScramLarge),
            _ => Err(Error::ScenarioValue {
                key: KEY_TANKCONFIG.to_string(),
                value: idx.to_string(),
            }),
        }
    }

    /// Rocket and scramjet propellant capacity, kg.
    pub fn capacities(self) -> (f64, f64) {
        match self {
            TankConfig::RocketOnly => (TANK1_CAPACITY + TANK2_CAPACITY, 0.0),
            TankConfig::ScramSmall => (TANK1_CAPACITY, TANK2_CAPACITY),
            TankConfig::ScramLarge => (TANK2_CAPACITY, TANK1_CAPACITY),
        }
    }
}

impl fmt::Display for TankConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

fn physical_params() -> PhysicalParams {
    PhysicalParamsBuilder::new()
        .size(10.0)
        .empty_mass(EMPTY_MASS)
        .cw(DragCoefficients::new(0.09, 0.09, 2.0, 1.4))
        .cross_sections(Vector3::new(53.0, 186.9, 25.9))
        .rot_drag(Vector3::new(0.10, 0.13, 0.04))
        .pmi(Vector3::new(15.5, 22.1, 7.7))
        .build()
}

// ---------------------------------------------------------------------------
// Vessel module
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ScramGlider {
    model: ScramModel,
    tank_config: TankConfig,
    scramjet: RamjetEngine,
    gimbal: [ScramGimbal; 2],

    ph_main: Option<PropellantHandle>,
    ph_scram: Option<PropellantHandle>,
    th_main: Option<[ThrusterHandle; 2]>,
    th_scram: Option<[ThrusterHandle; 2]>,

    scram_max: [f64; 2],
    scram_intensity: [f64; 2],
}

impl Default for ScramGlider {
    fn default() -> Self {
        Self::new()
    }
}

impl ScramGlider {
    pub fn new() -> Self {
        Self::with_model(ScramModel::default())
    }

    pub fn with_model(model: ScramModel) -> Self {
        Self {
            model,
            tank_config: TankConfig::default(),
            scramjet: RamjetEngine::new(),
            gimbal: [ScramGimbal::new(); 2],
            ph_main: None,
            ph_scram: None,
            th_main: None,
            th_scram: None,
            scram_max: [0.0; 2],
            scram_intensity: [0.0; 2],
        }
    }

    pub fn model(&self) -> ScramModel {
        self.model
    }

    pub fn tank_config(&self) -> TankConfig {
        self.tank_config
    }

    pub fn set_tank_config(&mut self, cfg: TankConfig) {
        self.tank_config = cfg;
    }

    pub fn scramjet(&self) -> &RamjetEngine {
        &self.scramjet
    }

    pub fn scram_thrusters(&self) -> Option<[ThrusterHandle; 2]> {
        self.th_scram
    }

    pub fn scram_propellant(&self) -> Option<PropellantHandle> {
        self.ph_scram
    }

    pub fn main_propellant(&self) -> Option<PropellantHandle> {
        self.ph_main
    }

    /// Achievable fraction of nominal thrust per engine at the last step.
    pub fn scram_max(&self) -> [f64; 2] {
        self.scram_max
    }

    /// Exhaust intensity per engine, throttle level times `scram_max`.
    pub fn scram_intensity(&self) -> [f64; 2] {
        self.scram_intensity
    }

    /// Throttle one scramjet (`which` 0 or 1) or both (any other value).
    pub fn set_scram_level(&mut self, host: &mut dyn VesselHost, which: usize, level: f64) {
        let Some(th_scram) = self.th_scram else { return };
        for i in 0..2 {
            if which != 1 - i {
                host.set_thruster_level(th_scram[i], level);
                self.scram_intensity[i] = level * self.scram_max[i];
            }
        }
    }

    /// Slew both scramjet nozzles; `sense` > 0 pitches up.
    pub fn gimbal_scram(&mut self, host: &mut dyn VesselHost, dt: f64, sense: f64) {
        let Some(th_scram) = self.th_scram else { return };
        for (g, th) in self.gimbal.iter_mut().zip(th_scram) {
            let dir = g.increment(dt, sense);
            host.set_thruster_dir(th, dir);
        }
    }

    /// Slew both nozzles toward neutral. Returns true while still moving.
    pub fn recenter_scram(&mut self, host: &mut dyn VesselHost, dt: f64) -> bool {
        let Some(th_scram) = self.th_scram else { return false };
        let mut moving = false;
        for (g, th) in self.gimbal.iter_mut().zip(th_scram) {
            moving |= g.recenter(dt);
            host.set_thruster_dir(th, g.dir());
        }
        moving
    }

    pub fn gimbal_indicator(&self) -> [usize; 2] {
        [self.gimbal[0].indicator(), self.gimbal[1].indicator()]
    }

    /// Refresh the scramjet thrust ratings from the ramjet model.
    fn scramjet_thrust(&mut self, host: &mut dyn VesselHost) {
        let Some(th_scram) = self.th_scram else { return };
        let mut f_scram = [0.0; 2];
        self.scramjet.thrust(&*host, &mut f_scram);
        let f_nominal = self.model.nominal_scram_thrust();

        for i in 0..2 {
            let level = host.thruster_level(th_scram[i]);
            let f_max = f_scram[i] / (level + EPS);
            host.set_thruster_max(th_scram[i], f_max);
            host.set_thruster_isp(th_scram[i], (f_scram[i] / (self.scramjet.dmf(i) + EPS)).max(1.0));

            self.scram_max[i] = (f_max / f_nominal).min(1.0);
            self.scram_intensity[i] = level * self.scram_max[i];
        }
    }
}

impl VesselModule for ScramGlider {
    fn class(&self) -> VesselClass {
        VesselClass::ScramGlider
    }

    fn set_class_caps(&mut self, host: &mut dyn VesselHost) {
        host.set_physical_params(&physical_params());

        let (rocket, scram) = TankConfig::RocketOnly.capacities();
        let ph_main = host.create_propellant(rocket);
        let ph_scram = host.create_propellant(scram);
        host.set_default_propellant(ph_main);

        let isp = MAIN_ISP * self.model.isp_scale();
        let th_main = [-1.0, 1.0].map(|x| {
            host.create_thruster(&ThrusterSpec::new(
                Vector3::new(x, 0.0, -7.8),
                Vector3::z(),
                self.model.max_main_thrust(),
                Some(ph_main),
                isp,
            ))
        });
        host.create_group(&th_main, GroupKind::Main);

        let dir = ScramGimbal::new().dir();
        let th_scram = [-0.9, 0.9].map(|x| {
            // rating and Isp are refreshed every step
            host.create_thruster(&ThrusterSpec::new(
                Vector3::new(x, -0.8, -5.6),
                dir,
                0.0,
                Some(ph_scram),
                0.0,
            ))
        });
        self.scramjet = RamjetEngine::new();
        for th in th_scram {
            self.scramjet.add_thruster_definition(
                th,
                self.model.heating_value(),
                SCRAM_INTAKE_AREA,
                self.model.max_burner_temp(),
                self.model.max_fuel_flow(),
            );
        }

        self.ph_main = Some(ph_main);
        self.ph_scram = Some(ph_scram);
        self.th_main = Some(th_main);
        self.th_scram = Some(th_scram);
        self.gimbal = [ScramGimbal::new(); 2];
    }

    fn load_state(&mut self, scn: &ScenarioBlock) -> Result<()> {
        if let Some(idx) = scn.parse_value::<i64>(KEY_TANKCONFIG)? {
            self.tank_config = TankConfig::from_index(idx)?;
        }
        Ok(())
    }

    fn save_state(&self, scn: &mut ScenarioBlock, _simt: f64) {
        if self.tank_config != TankConfig::RocketOnly {
            scn.set(KEY_TANKCONFIG, self.tank_config);
        }
    }

    fn post_creation(&mut self, host: &mut dyn VesselHost, _simt: f64) {
        let (rocket, scram) = self.tank_config.capacities();
        if let (Some(ph_main), Some(ph_scram)) = (self.ph_main, self.ph_scram) {
            host.set_propellant_max_mass(ph_main, rocket);
            host.set_propellant_max_mass(ph_scram, scram);
        }
        if let Some(th_scram) = self.th_scram {
            self.gimbal = th_scram.map(|th| ScramGimbal::from_dir(&host.thruster_dir(th)));
        }
        info!(vessel = host.name(), tanks = %self.tank_config, model = ?self.model, "scram glider ready");
    }

    fn post_step(&mut self, host: &mut dyn VesselHost, _simt: f64, _simdt: f64) {
        self.scramjet_thrust(host);
        debug!(
            vessel = host.name(),
            scram_max = self.scram_max[0],
            gimbal = ?self.gimbal_indicator(),
            tsfc = self.scramjet.tsfc(0),
            "scramjet rating refreshed"
        );
    }

    fn gimbal_dir(&self, host: &dyn FlightQuery) -> Option<Vector3<f64>> {
        self.th_scram.map(|th| host.thruster_dir(th[0]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::host::{FlightConditions, SimHost};

    fn glider(cfg: TankConfig) -> (ScramGlider, SimHost) {
        let mut host = SimHost::new("DG-S");
        let mut dg = ScramGlider::new();
        dg.set_class_caps(&mut host);
        dg.set_tank_config(cfg);
        dg.post_creation(&mut host, 0.0);
        (dg, host)
    }

    #[test]
    fn tank_configuration_splits_capacity() {
        let (dg, host) = glider(TankConfig::ScramLarge);
        let ph_main = dg.main_propellant().unwrap();
        let ph_scram = dg.scram_propellant().unwrap();
        assert_eq!(host.propellant_max_mass(ph_main), TANK2_CAPACITY);
        assert_eq!(host.propellant_max_mass(ph_scram), TANK1_CAPACITY);

        let (dg, host) = glider(TankConfig::RocketOnly);
        assert_eq!(host.propellant_max_mass(dg.scram_propellant().unwrap()), 0.0);
    }

    #[test]
    fn nozzle_angle_picked_up_from_host() {
        use crate::gnc::scram_gimbal::{SCRAM_DEFAULT_DIR, SCRAM_GIMBAL_RANGE};

        let mut host = SimHost::new("DG-S");
        let mut dg = ScramGlider::new();
        dg.set_class_caps(&mut host);
        let th = dg.scram_thrusters().unwrap();
        let up = SCRAM_DEFAULT_DIR + SCRAM_GIMBAL_RANGE;
        host.set_thruster_dir(th[0], Vector3::new(0.0, up.sin(), up.cos()));
        dg.post_creation(&mut host, 0.0);

        let [left, right] = dg.gimbal_indicator();
        assert!(left >= 70);
        assert_eq!(right, 35);
    }

    #[test]
    fn tank_config_persists_only_when_set() {
        let (dg, _) = glider(TankConfig::RocketOnly);
        let mut scn = ScenarioBlock::new();
        dg.save_state(&mut scn, 0.0);
        assert!(scn.is_empty());

        let mut dg = ScramGlider::new();
        dg.load_state(&ScenarioBlock::parse("TANKCONFIG 1")).unwrap();
        assert_eq!(dg.tank_config(), TankConfig::ScramSmall);
        assert!(dg.load_state(&ScenarioBlock::parse("TANKCONFIG 5")).is_err());
    }

    #[test]
    fn single_engine_throttle() {
        let (mut dg, mut host) = glider(TankConfig::ScramSmall);
        let th = dg.scram_thrusters().unwrap();
        dg.set_scram_level(&mut host, 1, 0.7);
        assert_eq!(host.thruster_level(th[0]), 0.0);
        assert!((host.thruster_level(th[1]) - 0.7).abs() < 1e-12);
        dg.set_scram_level(&mut host, 2, 0.4);
        assert!((host.thruster_level(th[0]) - 0.4).abs() < 1e-12);
        assert!((host.thruster_level(th[1]) - 0.4).abs() < 1e-12);
    }

    #[test]
    fn rating_follows_flight_conditions() {
        let (mut dg, mut host) = glider(TankConfig::ScramSmall);
        let th = dg.scram_thrusters().unwrap();
        host.set_conditions(FlightConditions::isa(25_000.0, 5.0));
        dg.set_scram_level(&mut host, 2, 1.0);
        dg.post_step(&mut host, 0.0, 0.1);

        let spec = &host.thruster(th[0]).unwrap().spec;
        assert!(spec.max_thrust > 0.0);
        assert!(spec.isp_vac > 1.0);
        assert!(dg.scram_max()[0] > 0.0 && dg.scram_max()[0] <= 1.0);
        assert!((dg.scram_intensity()[0] - dg.scram_max()[0]).abs() < 1e-12);
    }

    #[test]
    fn standing_still_gives_no_rating() {
        let (mut dg, mut host) = glider(TankConfig::ScramSmall);
        let th = dg.scram_thrusters().unwrap();
        dg.post_step(&mut host, 0.0, 0.1);
        let spec = &host.thruster(th[0]).unwrap().spec;
        assert!(spec.max_thrust.abs() < 1e-3);
        assert_eq!(spec.isp_vac, 1.0);
    }

    #[test]
    fn nozzle_gimbal_moves_thrusters() {
        let (mut dg, mut host) = glider(TankConfig::ScramSmall);
        let th = dg.scram_thrusters().unwrap();
        let before = host.thruster_dir(th[0]);
        dg.gimbal_scram(&mut host, 1.0, 1.0);
        let after = host.thruster_dir(th[0]);
        assert!(after.y > before.y);
        assert!(dg.recenter_scram(&mut host, 0.5));
        assert!(!dg.recenter_scram(&mut host, 10.0));
        assert!((host.thruster_dir(th[1]) - before).norm() < 1e-12);
    }
}
