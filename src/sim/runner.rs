use nalgebra::Vector3;
use tracing::{debug, info};

use crate::config::{SimConfig, StagingParams, VesselConfig};
use crate::error::Result;
use crate::host::{FlightQuery, GroupKind, SpawnSpec, VesselClass, VesselHost};
use crate::io::scenario::ScenarioBlock;
use crate::vehicle::{spawn_module, VesselModule};

use super::event::{EventKind, RecordedEvent, SimEvent};
use super::host::{FlightConditions, SimHost};

/// Flight conditions as a function of simulation time.
pub type FlightProfile = Box<dyn Fn(f64) -> FlightConditions>;

/// Per-frame hook on the primary vessel, called before its step callback.
pub type Pilot = Box<dyn FnMut(f64, &mut Vessel)>;

// ---------------------------------------------------------------------------
// Vessel
// ---------------------------------------------------------------------------

/// A vessel module together with the host state it drives.
pub struct Vessel {
    pub host: SimHost,
    pub module: Box<dyn VesselModule>,
}

impl Vessel {
    /// Run the creation sequence: class caps, optional scenario state,
    /// post-creation at `simt`.
    pub fn create(
        name: &str,
        class: VesselClass,
        staging: &StagingParams,
        scn: Option<&ScenarioBlock>,
        simt: f64,
    ) -> Result<Self> {
        let mut vessel = Self::bare(name, class, staging, simt);
        if let Some(scn) = scn {
            vessel.module.load_state(scn)?;
        }
        vessel.module.post_creation(&mut vessel.host, simt);
        Ok(vessel)
    }

    fn bare(name: &str, class: VesselClass, staging: &StagingParams, simt: f64) -> Self {
        let mut host = SimHost::new(name);
        host.set_time(simt);
        let mut module = spawn_module(class, staging);
        module.set_class_caps(&mut host);
        Self { host, module }
    }

    /// Create a vessel requested through [`VesselHost::spawn`].
    /// Propellant and thrust levels not given by the spawner are zeroed.
    fn spawned(spec: &SpawnSpec, staging: &StagingParams, conditions: FlightConditions, simt: f64) -> Self {
        let mut vessel = Self::bare(&spec.name, spec.class, staging, simt);
        vessel.host.set_conditions(conditions);

        let fuel = spec.fuel_level.unwrap_or(0.0);
        for ph in vessel.host.propellant_handles() {
            let max = vessel.host.propellant_max_mass(ph);
            vessel.host.set_propellant_mass(ph, fuel * max);
        }
        let level = spec.thrust_level.unwrap_or(0.0);
        for th in vessel.host.thruster_handles() {
            vessel.host.set_thruster_level(th, level);
        }

        vessel.module.post_creation(&mut vessel.host, simt);
        vessel
    }

    pub fn name(&self) -> &str {
        self.host.name()
    }

    pub fn class(&self) -> VesselClass {
        self.module.class()
    }

    pub fn save(&self, simt: f64) -> ScenarioBlock {
        let mut scn = ScenarioBlock::new();
        self.module.save_state(&mut scn, simt);
        scn
    }
}

// ---------------------------------------------------------------------------
// Telemetry
// ---------------------------------------------------------------------------

/// Primary vessel state sampled after each frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub time: f64,
    pub configuration: Option<i64>,
    pub main_level: f64,
    pub booster_level: f64,
    /// Propellant on board, kg.
    pub propellant: f64,
    pub gimbal_dir: Option<Vector3<f64>>,
    pub debris: usize,
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

/// Fixed-step driver for one primary vessel and whatever it sheds.
pub struct Simulation {
    config: SimConfig,
    staging: StagingParams,
    time: f64,

    primary: Vessel,
    debris: Vec<Vessel>,

    profile: Option<FlightProfile>,
    pilot: Option<Pilot>,
    replay: Vec<(f64, RecordedEvent)>,

    samples: Vec<Sample>,
    events: Vec<SimEvent>,
}

impl Simulation {
    pub fn new(config: &VesselConfig, name: &str, class: VesselClass) -> Result<Self> {
        Self::build(config, name, class, None)
    }

    /// Start from a saved scenario block of the primary vessel.
    pub fn from_scenario(
        config: &VesselConfig,
        name: &str,
        class: VesselClass,
        scn: &ScenarioBlock,
    ) -> Result<Self> {
        Self::build(config, name, class, Some(scn))
    }

    fn build(
        config: &VesselConfig,
        name: &str,
        class: VesselClass,
        scn: Option<&ScenarioBlock>,
    ) -> Result<Self> {
        config.staging.validate()?;
        let primary = Vessel::create(name, class, &config.staging, scn, 0.0)?;
        info!(vessel = name, %class, "simulation created");
        Ok(Self {
            config: config.sim,
            staging: config.staging,
            time: 0.0,
            primary,
            debris: Vec::new(),
            profile: None,
            pilot: None,
            replay: Vec::new(),
            samples: Vec::new(),
            events: Vec::new(),
        })
    }

    pub fn with_profile(mut self, profile: impl Fn(f64) -> FlightConditions + 'static) -> Self {
        let conditions = profile(self.time);
        self.primary.host.set_conditions(conditions);
        self.profile = Some(Box::new(profile));
        self
    }

    pub fn with_pilot(mut self, pilot: impl FnMut(f64, &mut Vessel) + 'static) -> Self {
        self.pilot = Some(Box::new(pilot));
        self
    }

    /// Replay a recorded event stream into the primary vessel. Puts the
    /// primary host into playback mode.
    pub fn with_replay(mut self, mut events: Vec<(f64, RecordedEvent)>) -> Self {
        events.sort_by(|a, b| a.0.total_cmp(&b.0));
        self.replay = events;
        self.primary.host.set_playback(true);
        self
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn primary(&self) -> &Vessel {
        &self.primary
    }

    pub fn primary_mut(&mut self) -> &mut Vessel {
        &mut self.primary
    }

    pub fn debris(&self) -> &[Vessel] {
        &self.debris
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    /// Advance one frame.
    pub fn step(&mut self) {
        let dt = self.config.dt;
        self.time += dt;
        let t = self.time;
        let conditions = self.profile.as_ref().map(|p| p(t));

        let before = self.primary.module.configuration();
        self.replay_due(t);

        if let Some(pilot) = self.pilot.as_mut() {
            pilot(t, &mut self.primary);
        }
        frame(&mut self.primary, conditions, t, dt);
        let after = self.primary.module.configuration();
        if let (Some(from), Some(to)) = (before, after) {
            if from != to {
                self.push_event(self.primary.name().to_string(), EventKind::Staging { from, to });
            }
        }
        self.collect(t);

        for v in &mut self.debris {
            frame(v, conditions, t, dt);
        }
        self.collect_debris(t);

        self.samples.push(self.sample());
    }

    /// Step until the configured end time.
    pub fn run(&mut self) {
        let n = (self.config.max_time / self.config.dt).round() as usize;
        for _ in 0..n {
            self.step();
        }
        info!(
            t = self.time,
            configuration = ?self.primary.module.configuration(),
            debris = self.debris.len(),
            events = self.events.len(),
            "simulation finished"
        );
    }

    fn replay_due(&mut self, t: f64) {
        let due = self.replay.iter().take_while(|(et, _)| *et <= t).count();
        for (et, ev) in self.replay.drain(..due).collect::<Vec<_>>() {
            let consumed = self.primary.module.playback_event(&mut self.primary.host, t, et, &ev);
            debug!(event = %ev, consumed, "replayed");
        }
    }

    /// Pick up spawn requests and recorded events from the primary.
    fn collect(&mut self, t: f64) {
        let name = self.primary.name().to_string();
        for (et, ev) in self.primary.host.take_events() {
            self.events.push(SimEvent { time: et, vessel: name.clone(), kind: EventKind::Recorded(ev) });
        }
        let conditions = self.primary.host.conditions();
        for spec in self.primary.host.take_spawned() {
            info!(parent = %name, child = %spec.name, class = %spec.class, "vessel spawned");
            self.push_event(
                name.clone(),
                EventKind::Spawned { name: spec.name.clone(), class: spec.class },
            );
            self.debris.push(Vessel::spawned(&spec, &self.staging, conditions, t));
        }
    }

    fn collect_debris(&mut self, t: f64) {
        let mut removed = Vec::new();
        self.debris.retain(|v| {
            if v.host.delete_requested() {
                removed.push(v.name().to_string());
                false
            } else {
                true
            }
        });
        for name in removed {
            self.events.push(SimEvent { time: t, vessel: name, kind: EventKind::Deleted });
        }
    }

    fn push_event(&mut self, vessel: String, kind: EventKind) {
        self.events.push(SimEvent { time: self.time, vessel, kind });
    }

    fn sample(&self) -> Sample {
        let host = &self.primary.host;
        Sample {
            time: self.time,
            configuration: self.primary.module.configuration(),
            main_level: host.group_level(GroupKind::Main),
            booster_level: host.group_level(GroupKind::Booster),
            propellant: host.total_propellant(),
            gimbal_dir: self.primary.module.gimbal_dir(host),
            debris: self.debris.len(),
        }
    }
}

fn frame(vessel: &mut Vessel, conditions: Option<FlightConditions>, t: f64, dt: f64) {
    vessel.host.set_time(t);
    if let Some(c) = conditions {
        vessel.host.set_conditions(c);
    }
    vessel.host.begin_frame();
    vessel.module.post_step(&mut vessel.host, t, dt);
    vessel.host.drain(dt);
}

/// Full-throttle launch of the stack from the pad under a vertical ISA
/// climb profile.
pub fn simulate_launch(config: &VesselConfig, name: &str) -> Result<Simulation> {
    let mut sim = Simulation::new(config, name, VesselClass::LaunchStack)?
        .with_profile(launch_profile)
        .with_pilot(full_throttle);
    sim.run();
    Ok(sim)
}

/// Coarse climb used when no trajectory is integrated: altitude and Mach
/// grow with time, pad conditions before liftoff.
pub fn launch_profile(t: f64) -> FlightConditions {
    let met = (t - 8.0).max(0.0);
    let altitude = (0.5 * 15.0 * met * met).min(110_000.0);
    let mach = (met / 25.0).min(25.0);
    FlightConditions::isa(altitude, mach)
}

/// Pilot holding the main engine group at full throttle until the orbiter
/// flies alone.
pub fn full_throttle(_t: f64, vessel: &mut Vessel) {
    if vessel.host.group_defined(GroupKind::Main) && vessel.module.configuration() != Some(3) {
        vessel.host.set_group_level(GroupKind::Main, 1.0);
    }
}
