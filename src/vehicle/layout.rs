//! Launch stack dimensions, ratings and per-configuration physical presets.
//!
//! Offsets are in the frame of whichever vessel currently carries the
//! component, m. Thrust in N, Isp in m/s, masses in kg.

use nalgebra::Vector3;

use crate::host::{DragCoefficients, PhysicalParams, PhysicalParamsBuilder};

// ---------------------------------------------------------------------------
// Orbiter
// ---------------------------------------------------------------------------

pub const ORBITER_EMPTY_MASS: f64 = 104_326.0;
pub const ORBITER_MAX_PROPELLANT_MASS: f64 = 21_600.0;

pub const ORBITER_MAIN_THRUST: f64 = 1_668_652.0 * 1.25;
pub const ORBITER_OMS_THRUST: f64 = 26_700.0;
pub const ORBITER_RCS_THRUST: f64 = 7_740.0;

pub const ORBITER_MAIN_ISP0: f64 = 5000.0; // vacuum
pub const ORBITER_MAIN_ISP1: f64 = 4000.0; // sea level
pub const ORBITER_OMS_ISP0: f64 = 3100.0;
pub const ORBITER_OMS_ISP1: f64 = 2500.0;
pub const ORBITER_RCS_ISP0: f64 = 5000.0;
pub const ORBITER_RCS_ISP1: f64 = 4000.0;

pub const ORBITER_CS: Vector3<f64> = Vector3::new(234.8, 389.1, 68.2);
pub const ORBITER_CW: DragCoefficients = DragCoefficients::new(0.13, 0.5, 1.4, 1.4);

// ---------------------------------------------------------------------------
// External tank and boosters
// ---------------------------------------------------------------------------

pub const TANK_MAX_PROPELLANT_MASS: f64 = 719_115.0;
pub const TANK_EMPTY_MASS: f64 = 35_425.0;

pub const SRB_MAX_PROPELLANT_MASS: f64 = 502_126.0;
pub const SRB_EMPTY_MASS: f64 = 87_543.0;
pub const SRB_ISP0: f64 = 3574.68;
pub const SRB_ISP1: f64 = 2859.74;
pub const SRB_THRUST: f64 = 1_202_020.0 * 9.81 * 1.25;

/// Pitch/yaw authority of the launch attitude thrusters, N.
pub const MAX_ATT_LAUNCH: f64 = 1.0e5;
/// Roll authority while the boosters are attached, N.
pub const MAX_ROLL_SRB: f64 = 2.5e5;

// ---------------------------------------------------------------------------
// Mounting offsets
// ---------------------------------------------------------------------------

pub const OFS_LAUNCH_ORBITER: Vector3<f64> = Vector3::new(0.0, 6.22, -7.795);
pub const OFS_LAUNCH_TANK: Vector3<f64> = Vector3::new(0.0, -1.91, 5.72);
pub const OFS_LAUNCH_RIGHTSRB: Vector3<f64> = Vector3::new(6.2, -1.91, -5.68);
pub const OFS_LAUNCH_LEFTSRB: Vector3<f64> = Vector3::new(-6.2, -1.91, -5.68);
pub const OFS_WITHTANK_ORBITER: Vector3<f64> = Vector3::new(0.0, 4.79, -9.185);
pub const OFS_WITHTANK_TANK: Vector3<f64> = Vector3::new(0.0, -3.34, 4.33);

/// Main engine nozzles relative to the orbiter origin: left, right, upper.
pub const MAIN_ENGINE_POS: [Vector3<f64>; 3] = [
    Vector3::new(-1.6, -0.2, -16.0),
    Vector3::new(1.6, -0.2, -16.0),
    Vector3::new(0.0, 3.2, -15.5),
];

/// Main engine directions with boosters attached.
pub const MAIN_ENGINE_DIR_LAUNCH: [Vector3<f64>; 3] = [
    Vector3::new(0.04994, 0.0, 0.99875),
    Vector3::new(-0.04994, 0.0, 0.99875),
    Vector3::new(0.0, -0.13, 1.0),
];

/// Main engine directions once only the tank is attached.
pub const MAIN_ENGINE_DIR_WITHTANK: [Vector3<f64>; 3] = [
    Vector3::new(0.0624, -0.1789, 0.9819),
    Vector3::new(-0.0624, -0.1789, 0.9819),
    Vector3::new(0.0, -0.308_046, 0.951_372),
];

/// Booster nozzle relative to the booster mounting offset.
pub const SRB_NOZZLE_OFS: Vector3<f64> = Vector3::new(0.0, 0.0, -21.8);
pub const SRB_THRUST_DIR: Vector3<f64> = Vector3::new(0.0, 0.023_643, 0.999_720);

pub const OMS_POS: [Vector3<f64>; 2] = [
    Vector3::new(-2.7, 3.7, -13.8),
    Vector3::new(2.7, 3.7, -13.8),
];
pub const OMS_DIR: [Vector3<f64>; 2] = [
    Vector3::new(0.03, -0.25885, 0.96545),
    Vector3::new(-0.03, -0.25885, 0.96545),
];

// ---------------------------------------------------------------------------
// Physical presets
// ---------------------------------------------------------------------------

pub mod presets {
    use super::*;

    /// Orbiter, tank and both boosters on the pad.
    pub fn launch() -> PhysicalParams {
        PhysicalParamsBuilder::new()
            .size(30.0)
            .empty_mass(ORBITER_EMPTY_MASS + TANK_EMPTY_MASS + 2.0 * SRB_EMPTY_MASS)
            .cw(DragCoefficients::new(0.2, 0.5, 1.5, 1.5))
            .cross_sections(Vector3::new(687.4, 849.5, 189.4))
            .rot_drag(Vector3::new(0.7, 0.1, 0.3))
            .pmi(Vector3::new(179.1, 176.8, 29.3))
            .build()
    }

    /// Orbiter riding the external tank.
    pub fn orbiter_tank() -> PhysicalParams {
        PhysicalParamsBuilder::new()
            .size(28.8)
            .empty_mass(ORBITER_EMPTY_MASS + TANK_EMPTY_MASS)
            .cw(DragCoefficients::new(0.2, 0.5, 1.5, 1.5))
            .cross_sections(Vector3::new(646.1, 603.0, 141.5))
            .rot_drag(Vector3::new(0.7, 0.1, 0.3))
            .pmi(Vector3::new(168.2, 154.1, 24.2))
            .build()
    }

    pub fn orbiter() -> PhysicalParams {
        PhysicalParamsBuilder::new()
            .size(19.6)
            .empty_mass(ORBITER_EMPTY_MASS)
            .cw(ORBITER_CW)
            .cross_sections(ORBITER_CS)
            .rot_drag(Vector3::new(0.43, 0.43, 0.29))
            .pmi(Vector3::new(78.2, 82.1, 10.7))
            .build()
    }

    /// A detached solid rocket booster.
    pub fn booster() -> PhysicalParams {
        PhysicalParamsBuilder::new()
            .size(23.0)
            .empty_mass(SRB_EMPTY_MASS)
            .cw(DragCoefficients::new(0.1, 0.3, 1.4, 1.4))
            .cross_sections(Vector3::new(162.1, 162.1, 26.6))
            .rot_drag(Vector3::new(0.7, 0.7, 0.1))
            .pmi(Vector3::new(154.3, 154.3, 1.83))
            .build()
    }

    /// The detached external tank.
    pub fn tank() -> PhysicalParams {
        PhysicalParamsBuilder::new()
            .size(24.0)
            .empty_mass(TANK_EMPTY_MASS)
            .cw(DragCoefficients::new(0.2, 0.3, 1.2, 1.2))
            .cross_sections(Vector3::new(412.1, 411.8, 72.7))
            .rot_drag(Vector3::new(0.5, 0.5, 0.1))
            .pmi(Vector3::new(145.6, 145.6, 10.5))
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stack_mass_decreases_with_each_configuration() {
        let m = [
            presets::launch().empty_mass,
            presets::orbiter_tank().empty_mass,
            presets::orbiter().empty_mass,
        ];
        assert!(m[0] > m[1] && m[1] > m[2]);
        assert!((m[0] - m[1] - 2.0 * SRB_EMPTY_MASS).abs() < 1e-9);
    }

    #[test]
    fn thrust_directions_are_nearly_unit() {
        for d in MAIN_ENGINE_DIR_LAUNCH[..2].iter().chain(&MAIN_ENGINE_DIR_WITHTANK) {
            assert!((d.norm() - 1.0).abs() < 1e-3, "{d:?}");
        }
        assert!((SRB_THRUST_DIR.norm() - 1.0).abs() < 1e-4);
    }
}
