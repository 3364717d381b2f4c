use std::fmt;
use std::str::FromStr;

use nalgebra::Vector3;

use super::PropellantHandle;
use crate::error::Error;

// ---------------------------------------------------------------------------
// Physical parameters of one vessel footprint
// ---------------------------------------------------------------------------

/// Drag coefficients along the principal directions (+z, -z, ±x, ±y).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragCoefficients {
    pub z_pos: f64,
    pub z_neg: f64,
    pub x: f64,
    pub y: f64,
}

impl DragCoefficients {
    pub const fn new(z_pos: f64, z_neg: f64, x: f64, y: f64) -> Self {
        Self { z_pos, z_neg, x, y }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalParams {
    pub size: f64,                    // mean radius, m
    pub empty_mass: f64,              // kg
    pub cw: DragCoefficients,
    pub cross_sections: Vector3<f64>, // m^2, projections onto principal axes
    pub rot_drag: Vector3<f64>,
    pub pmi: Vector3<f64>,            // principal moments of inertia / mass, m^2
}

pub struct PhysicalParamsBuilder {
    size: f64,
    empty_mass: f64,
    cw: DragCoefficients,
    cross_sections: Vector3<f64>,
    rot_drag: Vector3<f64>,
    pmi: Vector3<f64>,
}

impl PhysicalParamsBuilder {
    pub fn new() -> Self {
        Self {
            size: 10.0,
            empty_mass: 1000.0,
            cw: DragCoefficients::new(0.2, 0.5, 1.5, 1.5),
            cross_sections: Vector3::new(10.0, 10.0, 2.0),
            rot_drag: Vector3::new(0.7, 0.7, 0.1),
            pmi: Vector3::new(10.0, 10.0, 1.0),
        }
    }

    pub fn size(mut self, v: f64) -> Self { self.size = v; self }
    pub fn empty_mass(mut self, v: f64) -> Self { self.empty_mass = v; self }
    pub fn cw(mut self, v: DragCoefficients) -> Self { self.cw = v; self }
    pub fn cross_sections(mut self, v: Vector3<f64>) -> Self { self.cross_sections = v; self }
    pub fn rot_drag(mut self, v: Vector3<f64>) -> Self { self.rot_drag = v; self }
    pub fn pmi(mut self, v: Vector3<f64>) -> Self { self.pmi = v; self }

    pub fn build(self) -> PhysicalParams {
        PhysicalParams {
            size: self.size,
            empty_mass: self.empty_mass,
            cw: self.cw,
            cross_sections: self.cross_sections,
            rot_drag: self.rot_drag,
            pmi: self.pmi,
        }
    }
}

impl Default for PhysicalParamsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Thruster definition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ThrusterSpec {
    pub pos: Vector3<f64>,                  // m, vessel frame
    pub dir: Vector3<f64>,                  // unit thrust direction
    pub max_thrust: f64,                    // N, vacuum
    pub propellant: Option<PropellantHandle>,
    pub isp_vac: f64,                       // m/s
    pub isp_sl: f64,                        // m/s at sea-level pressure
}

impl ThrusterSpec {
    pub fn new(
        pos: Vector3<f64>,
        dir: Vector3<f64>,
        max_thrust: f64,
        propellant: Option<PropellantHandle>,
        isp_vac: f64,
    ) -> Self {
        Self { pos, dir, max_thrust, propellant, isp_vac, isp_sl: isp_vac }
    }

    pub fn sea_level_isp(mut self, isp: f64) -> Self {
        self.isp_sl = isp;
        self
    }
}

// ---------------------------------------------------------------------------
// Spawned objects
// ---------------------------------------------------------------------------

/// Vessel classes the stack sheds during ascent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VesselClass {
    LaunchStack,
    Booster,
    Tank,
    ScramGlider,
}

impl VesselClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            VesselClass::LaunchStack => "LaunchStack",
            VesselClass::Booster => "LaunchStack_SRB",
            VesselClass::Tank => "LaunchStack_Tank",
            VesselClass::ScramGlider => "ScramGlider",
        }
    }
}

impl fmt::Display for VesselClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VesselClass {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            VesselClass::LaunchStack,
            VesselClass::Booster,
            VesselClass::Tank,
            VesselClass::ScramGlider,
        ]
        .into_iter()
        .find(|c| c.as_str().eq_ignore_ascii_case(s))
        .ok_or_else(|| Error::UnknownVesselClass(s.to_string()))
    }
}

/// Initial state of an object split off from the parent vessel.
///
/// Kinematics are expressed in the parent's vessel frame; the host maps
/// them to global coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnSpec {
    pub name: String,
    pub class: VesselClass,
    pub offset: Vector3<f64>,           // m
    pub velocity: Vector3<f64>,         // m/s, added to the parent's velocity
    pub roll: f64,                      // rad about the parent's z-axis
    pub angular_velocity: Vector3<f64>, // rad/s
    /// Fraction of the child's propellant capacity; `None` resets it.
    pub fuel_level: Option<f64>,
    /// Level of the child's first thruster; `None` resets it.
    pub thrust_level: Option<f64>,
}

impl SpawnSpec {
    pub fn new(name: impl Into<String>, class: VesselClass, offset: Vector3<f64>) -> Self {
        Self {
            name: name.into(),
            class,
            offset,
            velocity: Vector3::zeros(),
            roll: 0.0,
            angular_velocity: Vector3::zeros(),
            fuel_level: None,
            thrust_level: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let p = PhysicalParamsBuilder::new().size(30.0).empty_mass(5.0).build();
        assert_eq!(p.size, 30.0);
        assert_eq!(p.empty_mass, 5.0);
        assert_eq!(p.cw, DragCoefficients::new(0.2, 0.5, 1.5, 1.5));
    }

    #[test]
    fn vessel_class_round_trips_through_name() {
        let c: VesselClass = "launchstack_srb".parse().unwrap();
        assert_eq!(c, VesselClass::Booster);
        assert!(matches!(
            "Nasa_MMU".parse::<VesselClass>(),
            Err(Error::UnknownVesselClass(_))
        ));
    }
}
