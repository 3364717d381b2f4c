use nalgebra::Vector3;

// ---------------------------------------------------------------------------
// Booster-imbalance gimbal law
// ---------------------------------------------------------------------------

/// Moment arms of the launch stack about the pitch axis.
///
/// `k_srb` and `k_main` convert booster and lower main engine thrust into
/// pitch moment; `(ry, rz)` is the offset of the upper main engine from
/// the stack's centre of mass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GimbalGeometry {
    pub k_srb: f64,
    pub k_main: f64,
    pub ry: f64,
    pub rz: f64,
}

impl Default for GimbalGeometry {
    fn default() -> Self {
        Self {
            k_srb: 2.519_511_12,
            k_main: -12.024_95,
            ry: 9.42,
            rz: -23.295,
        }
    }
}

impl GimbalGeometry {
    /// Residual pitch moment the upper engine has to cancel, N·m.
    pub fn residual_moment(&self, f_srb: f64, f_main: f64) -> f64 {
        self.k_srb * f_srb + self.k_main * f_main
    }
}

/// Thrust direction `(0, dy, dz)` of the upper main engine that cancels the
/// pitch moment of the boosters and the two lower main engines.
///
/// `f_srb` and `f_main` are the current thrust of one booster and one main
/// engine, N. Returns `None` when the main engines are not firing. When
/// the moment is too large to be cancelled by a unit thrust vector the
/// solution saturates and is renormalised.
pub fn balance_upper_engine(geom: &GimbalGeometry, f_srb: f64, f_main: f64) -> Option<Vector3<f64>> {
    if f_main == 0.0 {
        return None;
    }
    let m0 = geom.residual_moment(f_srb, f_main);
    let (ry, rz) = (geom.ry, geom.rz);
    let r2 = ry * ry + rz * rz;

    let term = -m0 * m0 + f_main * f_main * r2;
    let arg1 = (rz * rz * term).max(0.0);
    let arg2 = (ry * ry * term).max(0.0);
    let scale = 1.0 / (f_main * r2);

    let mut dz = (m0 * ry + arg1.sqrt()) * scale;
    let mut dy = -(m0 * rz + arg2.sqrt()) * scale;

    if arg1 == 0.0 || arg2 == 0.0 {
        let len = (dy * dy + dz * dz).sqrt();
        if len > 0.0 {
            dy /= len;
            dz /= len;
        }
    }
    Some(Vector3::new(0.0, dy, dz))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const F_MAIN: f64 = 1_668_652.0 * 1.25;

    #[test]
    fn idle_main_engines_leave_gimbal_alone() {
        assert!(balance_upper_engine(&GimbalGeometry::default(), 1.0e7, 0.0).is_none());
    }

    #[test]
    fn solution_cancels_residual_moment() {
        let g = GimbalGeometry::default();
        let f_srb = 0.6 * 1_202_020.0 * 9.81 * 1.25;
        let d = balance_upper_engine(&g, f_srb, F_MAIN).unwrap();
        assert_abs_diff_eq!(d.norm(), 1.0, epsilon = 1e-12);
        let moment = F_MAIN * (g.ry * d.z - g.rz * d.y);
        assert_abs_diff_eq!(moment, g.residual_moment(f_srb, F_MAIN), epsilon = 1e-3);
    }

    #[test]
    fn balanced_thrust_on_axis_engine_points_straight() {
        // engine on the thrust axis: zero imbalance needs no deflection
        let g = GimbalGeometry { k_srb: 2.0, k_main: -1.0, ry: 0.0, rz: -23.295 };
        let d = balance_upper_engine(&g, 0.5 * F_MAIN, F_MAIN).unwrap();
        assert_abs_diff_eq!(d, Vector3::new(0.0, 0.0, 1.0), epsilon = 1e-12);
    }

    #[test]
    fn saturated_solution_is_renormalised() {
        let g = GimbalGeometry::default();
        // moment far beyond what the upper engine can cancel
        let d = balance_upper_engine(&g, 1.0e9, F_MAIN).unwrap();
        assert_abs_diff_eq!(d.norm(), 1.0, epsilon = 1e-12);
        assert_eq!(d.x, 0.0);
    }
}
