//! In-memory vessel host.
//!
//! Keeps the thruster, propellant and group tables a vessel module builds,
//! drains propellant according to thruster levels and reports scripted
//! flight conditions. Rigid-body motion is out of scope: forces applied by
//! modules are only collected for inspection.

use std::collections::BTreeMap;

use nalgebra::Vector3;
use tracing::warn;

use crate::host::{
    FlightQuery, GroupKind, PhysicalParams, PropellantHandle, SpawnSpec, ThrusterHandle,
    ThrusterSpec, VesselHost,
};
use crate::physics::atmosphere::{isa, AtmConstants};
use crate::sim::event::RecordedEvent;

const SEA_LEVEL_PRESSURE: f64 = 101_325.0;

// ---------------------------------------------------------------------------
// Flight conditions
// ---------------------------------------------------------------------------

/// Freestream state reported to the vessel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightConditions {
    pub altitude: f64,    // m
    pub mach: f64,
    pub temperature: f64, // K
    pub pressure: f64,    // Pa
    pub density: f64,     // kg/m^3
}

impl FlightConditions {
    /// Standard atmosphere at `altitude`, flying at `mach`.
    pub fn isa(altitude: f64, mach: f64) -> Self {
        let a = isa(altitude);
        Self {
            altitude,
            mach,
            temperature: a.temperature,
            pressure: a.pressure,
            density: a.density,
        }
    }
}

impl Default for FlightConditions {
    fn default() -> Self {
        Self::isa(0.0, 0.0)
    }
}

// ---------------------------------------------------------------------------
// Host tables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Propellant {
    pub max_mass: f64,
    pub mass: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Thruster {
    pub spec: ThrusterSpec,
    pub level: f64,
}

impl Thruster {
    /// Isp interpolated between sea level and vacuum by ambient pressure.
    fn isp(&self, pressure: f64) -> f64 {
        let f = (pressure / SEA_LEVEL_PRESSURE).clamp(0.0, 1.0);
        self.spec.isp_vac + (self.spec.isp_sl - self.spec.isp_vac) * f
    }
}

#[derive(Debug, Clone)]
pub struct SimHost {
    name: String,
    time: f64,
    params: Option<PhysicalParams>,

    propellants: BTreeMap<PropellantHandle, Propellant>,
    default_propellant: Option<PropellantHandle>,
    thrusters: BTreeMap<ThrusterHandle, Thruster>,
    groups: BTreeMap<GroupKind, Vec<ThrusterHandle>>,
    next_id: u32,

    atm: Option<AtmConstants>,
    conditions: FlightConditions,
    playback: bool,

    cg_shift: Vector3<f64>,
    forces: Vec<(Vector3<f64>, Vector3<f64>)>,
    spawned: Vec<SpawnSpec>,
    events: Vec<(f64, RecordedEvent)>,
    delete_requested: bool,
}

impl SimHost {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            time: 0.0,
            params: None,
            propellants: BTreeMap::new(),
            default_propellant: None,
            thrusters: BTreeMap::new(),
            groups: BTreeMap::new(),
            next_id: 1,
            atm: Some(AtmConstants::EARTH),
            conditions: FlightConditions::default(),
            playback: false,
            cg_shift: Vector3::zeros(),
            forces: Vec::new(),
            spawned: Vec::new(),
            events: Vec::new(),
            delete_requested: false,
        }
    }

    fn issue(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    // -- scripting ----------------------------------------------------------

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn set_time(&mut self, t: f64) {
        self.time = t;
    }

    pub fn set_conditions(&mut self, c: FlightConditions) {
        self.conditions = c;
    }

    pub fn conditions(&self) -> FlightConditions {
        self.conditions
    }

    pub fn set_altitude(&mut self, altitude: f64) {
        self.conditions.altitude = altitude;
    }

    /// `None` removes the atmosphere reference (vacuum).
    pub fn set_atmosphere(&mut self, atm: Option<AtmConstants>) {
        self.atm = atm;
    }

    pub fn set_playback(&mut self, playback: bool) {
        self.playback = playback;
    }

    pub fn set_propellant_mass(&mut self, ph: PropellantHandle, mass: f64) {
        match self.propellants.get_mut(&ph) {
            Some(p) => p.mass = mass.clamp(0.0, p.max_mass),
            None => warn!(vessel = %self.name, ?ph, "set_propellant_mass: unknown propellant"),
        }
    }

    /// Set every thruster of a group to `level`.
    pub fn set_group_level(&mut self, kind: GroupKind, level: f64) {
        let Some(members) = self.groups.get(&kind).cloned() else {
            warn!(vessel = %self.name, ?kind, "set_group_level: group not defined");
            return;
        };
        for th in members {
            self.set_thruster_level(th, level);
        }
    }

    // -- inspection ---------------------------------------------------------

    pub fn physical_params(&self) -> Option<&PhysicalParams> {
        self.params.as_ref()
    }

    pub fn thruster(&self, th: ThrusterHandle) -> Option<&Thruster> {
        self.thrusters.get(&th)
    }

    pub fn thruster_handles(&self) -> Vec<ThrusterHandle> {
        self.thrusters.keys().copied().collect()
    }

    pub fn thruster_count(&self) -> usize {
        self.thrusters.len()
    }

    pub fn propellant_handles(&self) -> Vec<PropellantHandle> {
        self.propellants.keys().copied().collect()
    }

    pub fn propellant_count(&self) -> usize {
        self.propellants.len()
    }

    pub fn default_propellant(&self) -> Option<PropellantHandle> {
        self.default_propellant
    }

    /// Total propellant on board, kg.
    pub fn total_propellant(&self) -> f64 {
        self.propellants.values().map(|p| p.mass).sum()
    }

    pub fn group(&self, kind: GroupKind) -> Option<&[ThrusterHandle]> {
        self.groups.get(&kind).map(Vec::as_slice)
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn cg_shift(&self) -> Vector3<f64> {
        self.cg_shift
    }

    /// External forces applied during the current frame.
    pub fn forces(&self) -> &[(Vector3<f64>, Vector3<f64>)] {
        &self.forces
    }

    pub fn spawned(&self) -> &[SpawnSpec] {
        &self.spawned
    }

    pub fn take_spawned(&mut self) -> Vec<SpawnSpec> {
        std::mem::take(&mut self.spawned)
    }

    pub fn events(&self) -> &[(f64, RecordedEvent)] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<(f64, RecordedEvent)> {
        std::mem::take(&mut self.events)
    }

    pub fn delete_requested(&self) -> bool {
        self.delete_requested
    }

    // -- frame ----------------------------------------------------------------

    /// Drop per-frame outputs before the vessel's step callback.
    pub fn begin_frame(&mut self) {
        self.forces.clear();
    }

    /// Burn propellant for `dt` seconds at the current thruster levels.
    pub fn drain(&mut self, dt: f64) {
        let pressure = self.conditions.pressure;
        for th in self.thrusters.values() {
            let Some(ph) = th.spec.propellant else { continue };
            let isp = th.isp(pressure);
            if th.level <= 0.0 || isp <= 0.0 {
                continue;
            }
            if let Some(p) = self.propellants.get_mut(&ph) {
                let flow = th.level * th.spec.max_thrust / isp;
                p.mass = (p.mass - flow * dt).max(0.0);
            }
        }
    }

    fn has_fuel(&self, th: &Thruster) -> bool {
        th.spec
            .propellant
            .and_then(|ph| self.propellants.get(&ph))
            .is_some_and(|p| p.mass > 0.0)
    }
}

// ---------------------------------------------------------------------------
// Host trait implementations
// ---------------------------------------------------------------------------

impl FlightQuery for SimHost {
    fn name(&self) -> &str {
        &self.name
    }

    fn thruster_level(&self, th: ThrusterHandle) -> f64 {
        self.thrusters.get(&th).map_or(0.0, |t| t.level)
    }

    fn thruster_dir(&self, th: ThrusterHandle) -> Vector3<f64> {
        self.thrusters.get(&th).map_or_else(Vector3::zeros, |t| t.spec.dir)
    }

    fn thruster_moment(&self, th: ThrusterHandle) -> (Vector3<f64>, Vector3<f64>) {
        let Some(t) = self.thrusters.get(&th) else {
            return (Vector3::zeros(), Vector3::zeros());
        };
        if !self.has_fuel(t) {
            return (Vector3::zeros(), Vector3::zeros());
        }
        let f = t.spec.dir * (t.spec.max_thrust * t.level);
        (f, t.spec.pos.cross(&f))
    }

    fn group_level(&self, kind: GroupKind) -> f64 {
        match self.groups.get(&kind) {
            Some(members) if !members.is_empty() => {
                members.iter().map(|&th| self.thruster_level(th)).sum::<f64>()
                    / members.len() as f64
            }
            _ => 0.0,
        }
    }

    fn group_defined(&self, kind: GroupKind) -> bool {
        self.groups.contains_key(&kind)
    }

    fn propellant_mass(&self, ph: PropellantHandle) -> f64 {
        self.propellants.get(&ph).map_or(0.0, |p| p.mass)
    }

    fn propellant_max_mass(&self, ph: PropellantHandle) -> f64 {
        self.propellants.get(&ph).map_or(0.0, |p| p.max_mass)
    }

    fn atm_constants(&self) -> Option<AtmConstants> {
        self.atm
    }

    fn mach(&self) -> f64 {
        self.conditions.mach
    }

    fn atm_temperature(&self) -> f64 {
        self.conditions.temperature
    }

    fn atm_pressure(&self) -> f64 {
        self.conditions.pressure
    }

    fn atm_density(&self) -> f64 {
        self.conditions.density
    }

    fn altitude(&self) -> f64 {
        self.conditions.altitude
    }

    fn is_playback(&self) -> bool {
        self.playback
    }
}

impl VesselHost for SimHost {
    fn set_physical_params(&mut self, params: &PhysicalParams) {
        self.params = Some(params.clone());
    }

    fn create_propellant(&mut self, max_mass: f64) -> PropellantHandle {
        let ph = PropellantHandle(self.issue());
        self.propellants.insert(ph, Propellant { max_mass, mass: max_mass });
        if self.default_propellant.is_none() {
            self.default_propellant = Some(ph);
        }
        ph
    }

    fn delete_propellant(&mut self, ph: PropellantHandle) {
        if self.propellants.remove(&ph).is_none() {
            warn!(vessel = %self.name, ?ph, "delete_propellant: unknown propellant");
            return;
        }
        for t in self.thrusters.values_mut() {
            if t.spec.propellant == Some(ph) {
                t.spec.propellant = None;
            }
        }
        if self.default_propellant == Some(ph) {
            self.default_propellant = self.propellants.keys().next().copied();
        }
    }

    fn set_propellant_max_mass(&mut self, ph: PropellantHandle, max_mass: f64) {
        match self.propellants.get_mut(&ph) {
            Some(p) => {
                p.max_mass = max_mass;
                p.mass = p.mass.min(max_mass);
            }
            None => warn!(vessel = %self.name, ?ph, "set_propellant_max_mass: unknown propellant"),
        }
    }

    fn set_default_propellant(&mut self, ph: PropellantHandle) {
        if self.propellants.contains_key(&ph) {
            self.default_propellant = Some(ph);
        } else {
            warn!(vessel = %self.name, ?ph, "set_default_propellant: unknown propellant");
        }
    }

    fn create_thruster(&mut self, spec: &ThrusterSpec) -> ThrusterHandle {
        let th = ThrusterHandle(self.issue());
        self.thrusters.insert(th, Thruster { spec: spec.clone(), level: 0.0 });
        th
    }

    fn delete_thruster(&mut self, th: ThrusterHandle) {
        if self.thrusters.remove(&th).is_none() {
            warn!(vessel = %self.name, ?th, "delete_thruster: unknown thruster");
            return;
        }
        for members in self.groups.values_mut() {
            members.retain(|&m| m != th);
        }
    }

    fn clear_thrusters(&mut self) {
        self.thrusters.clear();
        self.groups.clear();
    }

    fn set_thruster_ref(&mut self, th: ThrusterHandle, pos: Vector3<f64>) {
        match self.thrusters.get_mut(&th) {
            Some(t) => t.spec.pos = pos,
            None => warn!(vessel = %self.name, ?th, "set_thruster_ref: unknown thruster"),
        }
    }

    fn set_thruster_dir(&mut self, th: ThrusterHandle, dir: Vector3<f64>) {
        match self.thrusters.get_mut(&th) {
            Some(t) => t.spec.dir = dir,
            None => warn!(vessel = %self.name, ?th, "set_thruster_dir: unknown thruster"),
        }
    }

    fn set_thruster_level(&mut self, th: ThrusterHandle, level: f64) {
        match self.thrusters.get_mut(&th) {
            Some(t) => t.level = level.clamp(0.0, 1.0),
            None => warn!(vessel = %self.name, ?th, "set_thruster_level: unknown thruster"),
        }
    }

    fn set_thruster_max(&mut self, th: ThrusterHandle, max_thrust: f64) {
        match self.thrusters.get_mut(&th) {
            Some(t) => t.spec.max_thrust = max_thrust,
            None => warn!(vessel = %self.name, ?th, "set_thruster_max: unknown thruster"),
        }
    }

    fn set_thruster_isp(&mut self, th: ThrusterHandle, isp: f64) {
        match self.thrusters.get_mut(&th) {
            Some(t) => {
                t.spec.isp_vac = isp;
                t.spec.isp_sl = isp;
            }
            None => warn!(vessel = %self.name, ?th, "set_thruster_isp: unknown thruster"),
        }
    }

    fn create_group(&mut self, thrusters: &[ThrusterHandle], kind: GroupKind) {
        self.groups.insert(kind, thrusters.to_vec());
    }

    fn delete_group(&mut self, kind: GroupKind, delete_thrusters: bool) {
        let Some(members) = self.groups.remove(&kind) else {
            warn!(vessel = %self.name, ?kind, "delete_group: group not defined");
            return;
        };
        if delete_thrusters {
            for th in members {
                self.delete_thruster(th);
            }
        }
    }

    fn shift_cg(&mut self, shift: Vector3<f64>) {
        self.cg_shift += shift;
    }

    fn add_force(&mut self, force: Vector3<f64>, point: Vector3<f64>) {
        self.forces.push((force, point));
    }

    fn spawn(&mut self, spec: SpawnSpec) {
        self.spawned.push(spec);
    }

    fn record_event(&mut self, event: RecordedEvent) {
        self.events.push((self.time, event));
    }

    fn request_delete(&mut self) {
        self.delete_requested = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(host: &mut SimHost, ph: PropellantHandle) -> ThrusterHandle {
        host.create_thruster(&ThrusterSpec::new(
            Vector3::new(1.0, 0.0, -10.0),
            Vector3::z(),
            1000.0,
            Some(ph),
            1000.0,
        ))
    }

    #[test]
    fn drain_follows_level_and_isp() {
        let mut host = SimHost::new("t");
        let ph = host.create_propellant(100.0);
        let th = engine(&mut host, ph);
        host.set_thruster_level(th, 0.5);
        host.drain(2.0);
        assert!((host.propellant_mass(ph) - 99.0).abs() < 1e-12);
    }

    #[test]
    fn empty_tank_produces_no_force() {
        let mut host = SimHost::new("t");
        let ph = host.create_propellant(100.0);
        let th = engine(&mut host, ph);
        host.set_thruster_level(th, 1.0);
        let (f, t) = host.thruster_moment(th);
        assert!((f.z - 1000.0).abs() < 1e-12);
        assert!((t.y - -1000.0).abs() < 1e-12);
        host.set_propellant_mass(ph, 0.0);
        assert_eq!(host.thruster_moment(th).0, Vector3::zeros());
    }

    #[test]
    fn deleting_a_group_can_take_its_thrusters() {
        let mut host = SimHost::new("t");
        let ph = host.create_propellant(100.0);
        let a = engine(&mut host, ph);
        let b = engine(&mut host, ph);
        let c = engine(&mut host, ph);
        host.create_group(&[a, b], GroupKind::Main);
        host.create_group(&[c], GroupKind::Booster);
        host.delete_group(GroupKind::Main, true);
        host.delete_group(GroupKind::Booster, false);
        assert_eq!(host.thruster_handles(), vec![c]);
        assert_eq!(host.group_count(), 0);
    }

    #[test]
    fn group_level_is_member_mean() {
        let mut host = SimHost::new("t");
        let ph = host.create_propellant(100.0);
        let a = engine(&mut host, ph);
        let b = engine(&mut host, ph);
        host.create_group(&[a, b], GroupKind::Main);
        host.set_thruster_level(a, 1.0);
        assert!((host.group_level(GroupKind::Main) - 0.5).abs() < 1e-12);
        assert_eq!(host.group_level(GroupKind::Booster), 0.0);
    }

    #[test]
    fn deleted_propellant_detaches_thrusters() {
        let mut host = SimHost::new("t");
        let ph = host.create_propellant(100.0);
        let spare = host.create_propellant(5.0);
        let th = engine(&mut host, ph);
        host.delete_propellant(ph);
        assert_eq!(host.thruster(th).unwrap().spec.propellant, None);
        assert_eq!(host.default_propellant(), Some(spare));
    }
}
