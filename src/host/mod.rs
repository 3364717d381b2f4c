//! Interface between vessel modules and the simulator host.
//!
//! The host owns thrusters, propellant resources, thruster groups and the
//! rigid-body integrator. Modules only ever see it through these traits:
//! [`FlightQuery`] for read access and [`VesselHost`] for mutation.

pub mod params;

use nalgebra::Vector3;

use crate::physics::atmosphere::AtmConstants;
use crate::sim::event::RecordedEvent;

pub use params::{DragCoefficients, PhysicalParams, PhysicalParamsBuilder, SpawnSpec, ThrusterSpec, VesselClass};

// ---------------------------------------------------------------------------
// Handles
// ---------------------------------------------------------------------------

/// Opaque host-issued thruster handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThrusterHandle(pub u32);

/// Opaque host-issued propellant resource handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropellantHandle(pub u32);

/// Logical thruster groups. A vessel holds at most one group per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GroupKind {
    Main,
    /// User group holding the strap-on boosters.
    Booster,
    AttPitchUp,
    AttPitchDown,
    AttYawLeft,
    AttYawRight,
    AttBankLeft,
    AttBankRight,
    AttUp,
    AttDown,
    AttLeft,
    AttRight,
    AttForward,
    AttBack,
}

impl GroupKind {
    /// Rotational groups defined by the launch-phase attitude control.
    pub const ROTATION: [GroupKind; 6] = [
        GroupKind::AttPitchUp,
        GroupKind::AttPitchDown,
        GroupKind::AttBankLeft,
        GroupKind::AttBankRight,
        GroupKind::AttYawLeft,
        GroupKind::AttYawRight,
    ];
}

// ---------------------------------------------------------------------------
// Host traits
// ---------------------------------------------------------------------------

/// Read-only view of the vessel and its flight environment.
pub trait FlightQuery {
    fn name(&self) -> &str;

    fn thruster_level(&self, th: ThrusterHandle) -> f64;
    fn thruster_dir(&self, th: ThrusterHandle) -> Vector3<f64>;
    /// Force and torque (vessel frame) of one thruster at its current level.
    fn thruster_moment(&self, th: ThrusterHandle) -> (Vector3<f64>, Vector3<f64>);
    /// Mean level of a thruster group, 0 if the group is not defined.
    fn group_level(&self, kind: GroupKind) -> f64;
    fn group_defined(&self, kind: GroupKind) -> bool;

    fn propellant_mass(&self, ph: PropellantHandle) -> f64;
    fn propellant_max_mass(&self, ph: PropellantHandle) -> f64;

    /// Atmosphere constants of the reference body, `None` in vacuum.
    fn atm_constants(&self) -> Option<AtmConstants>;
    fn mach(&self) -> f64;
    fn atm_temperature(&self) -> f64;
    fn atm_pressure(&self) -> f64;
    fn atm_density(&self) -> f64;
    fn altitude(&self) -> f64;

    /// True while the host is replaying a recorded flight.
    fn is_playback(&self) -> bool;
}

/// Mutating host services available to a vessel module.
pub trait VesselHost: FlightQuery {
    fn set_physical_params(&mut self, params: &PhysicalParams);

    fn create_propellant(&mut self, max_mass: f64) -> PropellantHandle;
    fn delete_propellant(&mut self, ph: PropellantHandle);
    fn set_propellant_max_mass(&mut self, ph: PropellantHandle, max_mass: f64);
    fn set_default_propellant(&mut self, ph: PropellantHandle);

    fn create_thruster(&mut self, spec: &ThrusterSpec) -> ThrusterHandle;
    fn delete_thruster(&mut self, th: ThrusterHandle);
    /// Remove every thruster and group.
    fn clear_thrusters(&mut self);
    fn set_thruster_ref(&mut self, th: ThrusterHandle, pos: Vector3<f64>);
    fn set_thruster_dir(&mut self, th: ThrusterHandle, dir: Vector3<f64>);
    fn set_thruster_level(&mut self, th: ThrusterHandle, level: f64);
    fn set_thruster_max(&mut self, th: ThrusterHandle, max_thrust: f64);
    fn set_thruster_isp(&mut self, th: ThrusterHandle, isp: f64);

    fn create_group(&mut self, thrusters: &[ThrusterHandle], kind: GroupKind);
    /// Remove a group; with `delete_thrusters` its members go too.
    fn delete_group(&mut self, kind: GroupKind, delete_thrusters: bool);

    fn shift_cg(&mut self, shift: Vector3<f64>);
    /// Apply an external force at a point (vessel frame) for this frame.
    fn add_force(&mut self, force: Vector3<f64>, point: Vector3<f64>);

    /// Create an independent object next to this vessel.
    fn spawn(&mut self, spec: SpawnSpec);
    fn record_event(&mut self, event: RecordedEvent);
    /// Ask the host to remove this vessel at the end of the frame.
    fn request_delete(&mut self);
}
