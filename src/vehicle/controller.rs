//! Staging state machine of the launch stack.
//!
//! Tracks which hardware is still attached, rebuilds the vessel's
//! thrusters and propellant resources whenever something is shed, and
//! steers the upper main engine against the boosters' pitch moment while
//! they are attached.

use std::f64::consts::PI;

use nalgebra::Vector3;
use tracing::{debug, info, warn};

use crate::config::StagingParams;
use crate::error::Result;
use crate::gnc::{balance_upper_engine, GimbalGeometry};
use crate::host::{
    FlightQuery, GroupKind, PropellantHandle, SpawnSpec, ThrusterHandle, ThrusterSpec, VesselClass, VesselHost,
};
use crate::io::scenario::ScenarioBlock;
use crate::sim::event::{JettisonTarget, RecordedEvent};

use super::booster::SrbProfile;
use super::layout::*;
use super::stage::Stage;

pub const KEY_CONFIGURATION: &str = "CONFIGURATION";
pub const KEY_MET: &str = "MET";

/// Pending operator command, consumed at the start of the next step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageCommand {
    /// Drop whatever the current stage can drop.
    Jettison,
}

/// External geometry the vessel is currently built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Footprint {
    Launch,
    OrbiterTank,
    Orbiter,
}

impl Footprint {
    fn of(stage: Stage) -> Self {
        if stage.has_boosters() {
            Footprint::Launch
        } else if stage.has_tank() {
            Footprint::OrbiterTank
        } else {
            Footprint::Orbiter
        }
    }
}

// ---------------------------------------------------------------------------
// Stage controller
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct StageController {
    staging: StagingParams,
    geometry: GimbalGeometry,
    profile: SrbProfile,

    stage: Stage,
    /// Liftoff epoch, simulation time.
    t0: f64,
    /// MET read from a scenario, applied on resume.
    loaded_met: f64,
    pending: Option<StageCommand>,
    configured: Option<Footprint>,

    ph_oms: Option<PropellantHandle>,
    ph_tank: Option<PropellantHandle>,
    ph_srb: Option<PropellantHandle>,
    th_main: Option<[ThrusterHandle; 3]>,
    th_srb: Option<[ThrusterHandle; 2]>,
    th_oms: Option<[ThrusterHandle; 2]>,
}

impl StageController {
    pub fn new(staging: StagingParams) -> Self {
        if let Err(e) = staging.validate() {
            warn!(error = %e, "staging calibration out of range, booster profile is unreliable");
        }
        Self {
            staging,
            geometry: GimbalGeometry::default(),
            profile: SrbProfile::new(&staging),
            stage: Stage::Assembled,
            t0: 0.0,
            loaded_met: 0.0,
            pending: None,
            configured: None,
            ph_oms: None,
            ph_tank: None,
            ph_srb: None,
            th_main: None,
            th_srb: None,
            th_oms: None,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn staging(&self) -> &StagingParams {
        &self.staging
    }

    /// Liftoff epoch, simulation time.
    pub fn reference_time(&self) -> f64 {
        self.t0
    }

    pub fn met(&self, simt: f64) -> f64 {
        simt - self.t0
    }

    pub fn pending(&self) -> Option<StageCommand> {
        self.pending
    }

    pub fn booster_propellant(&self) -> Option<PropellantHandle> {
        self.ph_srb
    }

    pub fn tank_propellant(&self) -> Option<PropellantHandle> {
        self.ph_tank
    }

    pub fn orbiter_propellant(&self) -> Option<PropellantHandle> {
        self.ph_oms
    }

    /// Main engines while the tank is attached: left, right, upper.
    pub fn main_engines(&self) -> Option<[ThrusterHandle; 3]> {
        self.th_main
    }

    pub fn booster_engines(&self) -> Option<[ThrusterHandle; 2]> {
        self.th_srb
    }

    pub fn oms_engines(&self) -> Option<[ThrusterHandle; 2]> {
        self.th_oms
    }

    /// Queue a separation for the next step.
    pub fn request_separation(&mut self) {
        self.pending = Some(StageCommand::Jettison);
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    pub fn load(&mut self, scn: &ScenarioBlock) -> Result<()> {
        if let Some(idx) = scn.parse_value::<i64>(KEY_CONFIGURATION)? {
            self.stage = Stage::from_index(idx)?;
        }
        if let Some(met) = scn.parse_value::<f64>(KEY_MET)? {
            self.loaded_met = met;
        }
        let rest = scn.unhandled(&[KEY_CONFIGURATION, KEY_MET]);
        debug!(stage = %self.stage, met = self.loaded_met, passed_on = rest.len(), "staging state loaded");
        Ok(())
    }

    pub fn save(&self, scn: &mut ScenarioBlock, simt: f64) {
        scn.set(KEY_CONFIGURATION, self.stage.index());
        if self.stage == Stage::BoostersBurning {
            scn.set(KEY_MET, format!("{:.3}", self.met(simt)));
        }
    }

    /// Build the configuration of the loaded stage at simulation time `simt`.
    pub fn resume(&mut self, host: &mut dyn VesselHost, simt: f64) {
        if self.stage == Stage::BoostersBurning {
            self.t0 = simt - self.loaded_met;
        }
        self.configure(host);
        info!(vessel = host.name(), stage = %self.stage, "stack configured");
    }

    // -----------------------------------------------------------------------
    // Per-step update
    // -----------------------------------------------------------------------

    pub fn step(&mut self, host: &mut dyn VesselHost, simt: f64, _simdt: f64) {
        let command = self.pending.take();
        let playback = host.is_playback();

        match self.stage {
            Stage::Assembled => {
                if command.is_some() {
                    warn!(vessel = host.name(), "nothing to jettison before ignition");
                }
                self.auto_gimbal(host);
                if host.group_level(GroupKind::Main) > self.staging.ignition_level {
                    self.ignite(host, simt);
                }
            }
            Stage::BoostersBurning => {
                let met = self.met(simt);
                let (thrust_level, _) = self.profile.state(met);
                if let Some(th_srb) = self.th_srb {
                    for th in th_srb {
                        host.set_thruster_level(th, thrust_level);
                    }
                }
                if met < 0.0 {
                    self.launch_clamps(host);
                }
                self.auto_gimbal(host);
                if (met > self.staging.separation_time && !playback) || command.is_some() {
                    self.separate_boosters(host, met);
                }
            }
            Stage::BoostersSeparated => {
                let tank_empty = self
                    .ph_tank
                    .is_some_and(|ph| host.propellant_mass(ph) < self.staging.tank_empty_mass);
                if (tank_empty && !playback) || command.is_some() {
                    self.separate_tank(host);
                }
            }
            Stage::TankSeparated => {
                if command.is_some() {
                    warn!(vessel = host.name(), "nothing left to jettison");
                }
            }
        }
    }

    /// Separate whatever the current stage can drop, right now.
    pub fn jettison(&mut self, host: &mut dyn VesselHost, simt: f64) {
        match self.stage {
            Stage::BoostersBurning => {
                let met = self.met(simt);
                self.separate_boosters(host, met);
            }
            Stage::BoostersSeparated => self.separate_tank(host),
            Stage::Assembled | Stage::TankSeparated => {
                warn!(vessel = host.name(), stage = %self.stage, "jettison ignored");
            }
        }
    }

    /// Apply a replayed recorder event. Returns true if it was consumed.
    pub fn playback_event(&mut self, host: &dyn VesselHost, event_t: f64, event: &RecordedEvent) -> bool {
        match *event {
            RecordedEvent::Jettison(target) => {
                debug!(vessel = host.name(), ?target, "replayed separation queued");
                self.pending = Some(StageCommand::Jettison);
            }
            RecordedEvent::SrbIgnition => {
                self.stage = Stage::BoostersBurning;
                self.t0 = event_t + self.staging.stabilisation_time;
                info!(vessel = host.name(), t0 = self.t0, "replayed SRB ignition");
            }
            RecordedEvent::AdjustLaunchTime(t) => {
                self.t0 = t;
                info!(vessel = host.name(), t0 = t, "launch time adjusted");
            }
        }
        true
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    fn ignite(&mut self, host: &mut dyn VesselHost, simt: f64) {
        self.stage = Stage::BoostersBurning;
        self.t0 = simt + self.staging.stabilisation_time;
        host.record_event(RecordedEvent::SrbIgnition);
        info!(vessel = host.name(), simt, liftoff = self.t0, "SRB ignition");
    }

    fn separate_boosters(&mut self, host: &mut dyn VesselHost, met: f64) {
        let (thrust_level, prop_level) = self.profile.state(met);
        let name = host.name().to_string();
        for (suffix, ofs, roll) in [
            ("SRB1", OFS_LAUNCH_RIGHTSRB, 0.25 * PI),
            ("SRB2", OFS_LAUNCH_LEFTSRB, -1.25 * PI),
        ] {
            let mut spec = SpawnSpec::new(format!("{name}-{suffix}"), VesselClass::Booster, ofs);
            spec.roll = roll;
            spec.fuel_level = Some(prop_level);
            spec.thrust_level = Some(thrust_level);
            host.spawn(spec);
        }

        if let Some(ph) = self.ph_srb.take() {
            host.delete_propellant(ph);
        }
        host.delete_group(GroupKind::Booster, true);
        self.th_srb = None;
        host.shift_cg(OFS_LAUNCH_ORBITER - OFS_WITHTANK_ORBITER);
        host.record_event(RecordedEvent::Jettison(JettisonTarget::Boosters));

        self.stage = Stage::BoostersSeparated;
        self.configure(host);
        info!(vessel = %name, met, prop_level, "boosters separated");
    }

    fn separate_tank(&mut self, host: &mut dyn VesselHost) {
        let name = host.name().to_string();
        let mut ofs = OFS_WITHTANK_TANK;
        if host.is_playback() {
            // replay has already shifted the CG
            ofs -= OFS_WITHTANK_ORBITER;
        }
        let mut spec = SpawnSpec::new(format!("{name}-Tank"), VesselClass::Tank, ofs);
        spec.velocity = Vector3::new(0.0, -1.0, 0.0) * self.staging.tank_separation_speed;
        spec.angular_velocity = Vector3::new(self.staging.tank_separation_pitch_rate, 0.0, 0.0);
        host.spawn(spec);

        if let Some(ph) = self.ph_tank.take() {
            host.delete_propellant(ph);
        }
        host.delete_group(GroupKind::Main, true);
        self.th_main = None;
        for kind in GroupKind::ROTATION {
            host.delete_group(kind, true);
        }
        host.shift_cg(OFS_WITHTANK_ORBITER);
        host.record_event(RecordedEvent::Jettison(JettisonTarget::Tank));

        self.stage = Stage::TankSeparated;
        self.configure(host);
        info!(vessel = %name, "tank separated");
    }

    // -----------------------------------------------------------------------
    // Configurations
    // -----------------------------------------------------------------------

    /// Build thrusters and propellant for the current stage's footprint.
    /// A footprint that is already built is left alone.
    pub fn configure(&mut self, host: &mut dyn VesselHost) {
        let footprint = Footprint::of(self.stage);
        if self.configured == Some(footprint) {
            debug!(vessel = host.name(), ?footprint, "configuration already active");
            return;
        }
        match footprint {
            Footprint::Launch => self.set_launch_configuration(host),
            Footprint::OrbiterTank => self.set_orbiter_tank_configuration(host),
            Footprint::Orbiter => self.set_orbiter_configuration(host),
        }
        self.configured = Some(footprint);
        debug!(vessel = host.name(), ?footprint, "configuration built");
    }

    fn set_launch_configuration(&mut self, host: &mut dyn VesselHost) {
        host.set_physical_params(&presets::launch());

        self.ph_oms.get_or_insert_with(|| host.create_propellant(ORBITER_MAX_PROPELLANT_MASS));
        let ph_tank = *self
            .ph_tank
            .get_or_insert_with(|| host.create_propellant(TANK_MAX_PROPELLANT_MASS));
        let ph_srb = *self
            .ph_srb
            .get_or_insert_with(|| host.create_propellant(2.0 * SRB_MAX_PROPELLANT_MASS));
        host.set_default_propellant(ph_tank);

        host.clear_thrusters();

        let th_main: [ThrusterHandle; 3] = std::array::from_fn(|i| {
            host.create_thruster(&main_engine(
                OFS_LAUNCH_ORBITER + MAIN_ENGINE_POS[i],
                MAIN_ENGINE_DIR_LAUNCH[i],
                ph_tank,
            ))
        });
        host.create_group(&th_main, GroupKind::Main);
        self.th_main = Some(th_main);

        let th_srb = [OFS_LAUNCH_RIGHTSRB, OFS_LAUNCH_LEFTSRB].map(|ofs| {
            host.create_thruster(
                &ThrusterSpec::new(ofs + SRB_NOZZLE_OFS, SRB_THRUST_DIR, SRB_THRUST, Some(ph_srb), SRB_ISP0)
                    .sea_level_isp(SRB_ISP1),
            )
        });
        host.create_group(&th_srb, GroupKind::Booster);
        self.th_srb = Some(th_srb);
        self.th_oms = None;

        create_launch_att_controls(host, ph_tank);
    }

    fn set_orbiter_tank_configuration(&mut self, host: &mut dyn VesselHost) {
        host.set_physical_params(&presets::orbiter_tank());

        self.ph_oms.get_or_insert_with(|| host.create_propellant(ORBITER_MAX_PROPELLANT_MASS));
        let ph_tank = *self
            .ph_tank
            .get_or_insert_with(|| host.create_propellant(TANK_MAX_PROPELLANT_MASS));
        host.set_default_propellant(ph_tank);

        let ofs = OFS_WITHTANK_ORBITER;
        match self.th_main {
            Some(th_main) if host.group_defined(GroupKind::Main) => {
                for (i, th) in th_main.into_iter().enumerate() {
                    host.set_thruster_ref(th, ofs + MAIN_ENGINE_POS[i]);
                    host.set_thruster_dir(th, MAIN_ENGINE_DIR_WITHTANK[i]);
                }
            }
            _ => {
                let th_main: [ThrusterHandle; 3] = std::array::from_fn(|i| {
                    host.create_thruster(&main_engine(
                        ofs + MAIN_ENGINE_POS[i],
                        MAIN_ENGINE_DIR_WITHTANK[i],
                        ph_tank,
                    ))
                });
                host.create_group(&th_main, GroupKind::Main);
                self.th_main = Some(th_main);
            }
        }

        if !host.group_defined(GroupKind::AttPitchUp) {
            create_launch_att_controls(host, ph_tank);
        }
    }

    fn set_orbiter_configuration(&mut self, host: &mut dyn VesselHost) {
        host.set_physical_params(&presets::orbiter());

        let ph_oms = *self
            .ph_oms
            .get_or_insert_with(|| host.create_propellant(ORBITER_MAX_PROPELLANT_MASS));
        host.set_default_propellant(ph_oms);

        let th_oms: [ThrusterHandle; 2] = std::array::from_fn(|i| {
            host.create_thruster(
                &ThrusterSpec::new(OMS_POS[i], OMS_DIR[i], ORBITER_OMS_THRUST, Some(ph_oms), ORBITER_OMS_ISP0)
                    .sea_level_isp(ORBITER_OMS_ISP1),
            )
        });
        host.create_group(&th_oms, GroupKind::Main);
        self.th_oms = Some(th_oms);

        create_rcs(host, ph_oms);
    }

    // -----------------------------------------------------------------------
    // Control laws
    // -----------------------------------------------------------------------

    /// Point the upper main engine so that the stack's pitch moment vanishes.
    fn auto_gimbal(&self, host: &mut dyn VesselHost) {
        let (Some(th_main), Some(th_srb)) = (self.th_main, self.th_srb) else {
            return;
        };
        let f_srb = SRB_THRUST * host.thruster_level(th_srb[0]);
        let f_main = ORBITER_MAIN_THRUST * host.thruster_level(th_main[0]);
        if let Some(dir) = balance_upper_engine(&self.geometry, f_srb, f_main) {
            debug!(dy = dir.y, dz = dir.z, f_srb, f_main, "upper engine gimbal");
            host.set_thruster_dir(th_main[2], dir);
        }
    }

    /// Hold the stack on the pad against booster and main engine thrust.
    fn launch_clamps(&self, host: &mut dyn VesselHost) {
        let (Some(th_main), Some(th_srb)) = (self.th_main, self.th_srb) else {
            return;
        };
        let mut fc = Vector3::zeros();
        let mut tc = Vector3::zeros();

        let (f, t) = host.thruster_moment(th_srb[0]);
        fc.z = -2.0 * f.z;
        tc.x = 2.0 * t.x;
        let (f, t) = host.thruster_moment(th_main[0]);
        fc.z -= 2.0 * f.z;
        fc.y -= 2.0 * f.y;
        tc.x += 2.0 * t.x;
        let (f, t) = host.thruster_moment(th_main[2]);
        fc.z -= f.z;
        fc.y -= f.y;
        tc.x += t.x;

        let r = Vector3::new(0.0, 0.0, if fc.y != 0.0 { tc.x / fc.y } else { 0.0 });
        host.add_force(fc, r);
    }
}

// ---------------------------------------------------------------------------
// Thruster layouts
// ---------------------------------------------------------------------------

fn main_engine(pos: Vector3<f64>, dir: Vector3<f64>, ph: PropellantHandle) -> ThrusterSpec {
    ThrusterSpec::new(pos, dir, ORBITER_MAIN_THRUST, Some(ph), ORBITER_MAIN_ISP0)
        .sea_level_isp(ORBITER_MAIN_ISP1)
}

fn create_launch_att_controls(host: &mut dyn VesselHost, ph: PropellantHandle) {
    // yaw is only there so that kill-rotation works
    create_att_controls(host, ph, MAX_ATT_LAUNCH, MAX_ROLL_SRB, MAX_ATT_LAUNCH);
}

/// Rotational thruster pairs fed from `ph`, using main engine Isp.
fn create_att_controls(host: &mut dyn VesselHost, ph: PropellantHandle, pitch: f64, roll: f64, yaw: f64) {
    let up = Vector3::y();
    let right = Vector3::x();
    let table = [
        (GroupKind::AttPitchUp, pitch, [(Vector3::new(0.0, 0.0, 25.0), up), (Vector3::new(0.0, 0.0, -25.0), -up)]),
        (GroupKind::AttPitchDown, pitch, [(Vector3::new(0.0, 0.0, 25.0), -up), (Vector3::new(0.0, 0.0, -25.0), up)]),
        (GroupKind::AttBankLeft, roll, [(Vector3::new(8.0, 0.0, 0.0), up), (Vector3::new(-8.0, 0.0, 0.0), -up)]),
        (GroupKind::AttBankRight, roll, [(Vector3::new(8.0, 0.0, 0.0), -up), (Vector3::new(-8.0, 0.0, 0.0), up)]),
        (GroupKind::AttYawRight, yaw, [(Vector3::new(0.0, 0.0, 10.0), right), (Vector3::new(0.0, 0.0, -10.0), -right)]),
        (GroupKind::AttYawLeft, yaw, [(Vector3::new(0.0, 0.0, 10.0), -right), (Vector3::new(0.0, 0.0, -10.0), right)]),
    ];
    for (kind, thrust, pair) in table {
        let th = pair.map(|(pos, dir)| {
            host.create_thruster(
                &ThrusterSpec::new(pos, dir, thrust, Some(ph), ORBITER_MAIN_ISP0).sea_level_isp(ORBITER_MAIN_ISP1),
            )
        });
        host.create_group(&th, kind);
    }
}

/// Orbiter reaction control system. Rotation and translation modes share
/// thrusters so that neither produces the other's momentum.
fn create_rcs(host: &mut dyn VesselHost, ph: PropellantHandle) {
    let mut rcs = |pos: Vector3<f64>, dir: Vector3<f64>| {
        host.create_thruster(
            &ThrusterSpec::new(pos, dir, ORBITER_RCS_THRUST, Some(ph), ORBITER_RCS_ISP0)
                .sea_level_isp(ORBITER_RCS_ISP1),
        )
    };
    let fwd = Vector3::new(0.0, 0.0, 15.5);
    let aft = Vector3::new(0.0, 0.0, -15.5);
    let (up, right) = (Vector3::y(), Vector3::x());

    let p = [rcs(fwd, up), rcs(aft, -up), rcs(fwd, -up), rcs(aft, up)];
    let y = [rcs(fwd, -right), rcs(aft, right), rcs(fwd, right), rcs(aft, -right)];
    let b = [
        rcs(Vector3::new(2.7, 0.0, 0.0), up),
        rcs(Vector3::new(-2.7, 0.0, 0.0), -up),
        rcs(Vector3::new(-2.7, 0.0, 0.0), up),
        rcs(Vector3::new(2.7, 0.0, 0.0), -up),
    ];
    let forward = rcs(Vector3::new(0.0, 0.0, -16.0), Vector3::z());
    let back = rcs(Vector3::new(0.0, 0.0, 16.0), -Vector3::z());

    let groups = [
        (GroupKind::AttPitchUp, vec![p[0], p[1]]),
        (GroupKind::AttPitchDown, vec![p[2], p[3]]),
        (GroupKind::AttUp, vec![p[0], p[3]]),
        (GroupKind::AttDown, vec![p[2], p[1]]),
        (GroupKind::AttYawLeft, vec![y[0], y[1]]),
        (GroupKind::AttYawRight, vec![y[2], y[3]]),
        (GroupKind::AttLeft, vec![y[0], y[3]]),
        (GroupKind::AttRight, vec![y[2], y[1]]),
        (GroupKind::AttBankLeft, vec![b[0], b[1]]),
        (GroupKind::AttBankRight, vec![b[2], b[3]]),
        (GroupKind::AttForward, vec![forward]),
        (GroupKind::AttBack, vec![back]),
    ];
    for (kind, th) in groups {
        host.create_group(&th, kind);
    }
}
