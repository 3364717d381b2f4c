use nalgebra::Vector3;

/// Neutral scramjet pitch angle, rad.
pub const SCRAM_DEFAULT_DIR: f64 = 9.0 * std::f64::consts::PI / 180.0;
/// Gimbal travel either side of neutral, rad.
pub const SCRAM_GIMBAL_RANGE: f64 = 5.0 * std::f64::consts::PI / 180.0;
/// Slew rate, rad/s.
pub const SCRAM_GIMBAL_SPEED: f64 = SCRAM_GIMBAL_RANGE / 3.0;

/// Pitch gimbal of one scramjet nozzle, rotating in the y-z plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScramGimbal {
    phi: f64,
}

impl Default for ScramGimbal {
    fn default() -> Self {
        Self { phi: SCRAM_DEFAULT_DIR }
    }
}

impl ScramGimbal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick up the angle from an existing thrust direction.
    pub fn from_dir(dir: &Vector3<f64>) -> Self {
        let phi = dir.y.atan2(dir.z);
        Self { phi: phi.clamp(SCRAM_DEFAULT_DIR - SCRAM_GIMBAL_RANGE, SCRAM_DEFAULT_DIR + SCRAM_GIMBAL_RANGE) }
    }

    pub fn angle(&self) -> f64 {
        self.phi
    }

    pub fn dir(&self) -> Vector3<f64> {
        Vector3::new(0.0, self.phi.sin(), self.phi.cos())
    }

    /// Slew for `dt` seconds; `sense` > 0 pitches the nozzle up, 0 holds.
    /// Returns the new thrust direction.
    pub fn increment(&mut self, dt: f64, sense: f64) -> Vector3<f64> {
        if sense == 0.0 || sense.is_nan() {
            return self.dir();
        }
        let dphi = dt * SCRAM_GIMBAL_SPEED * sense.signum();
        self.phi = (self.phi + dphi).clamp(
            SCRAM_DEFAULT_DIR - SCRAM_GIMBAL_RANGE,
            SCRAM_DEFAULT_DIR + SCRAM_GIMBAL_RANGE,
        );
        self.dir()
    }

    /// Slew back toward neutral. Returns true while still off-centre.
    pub fn recenter(&mut self, dt: f64) -> bool {
        let dphi = dt * SCRAM_GIMBAL_SPEED;
        if self.phi > SCRAM_DEFAULT_DIR {
            self.phi = (self.phi - dphi).max(SCRAM_DEFAULT_DIR);
        } else if self.phi < SCRAM_DEFAULT_DIR {
            self.phi = (self.phi + dphi).min(SCRAM_DEFAULT_DIR);
        }
        self.phi != SCRAM_DEFAULT_DIR
    }

    /// Panel indicator position, 0 at full down to 71 at full up.
    pub fn indicator(&self) -> usize {
        let idx = 35.5 * (self.phi - SCRAM_DEFAULT_DIR + SCRAM_GIMBAL_RANGE) / SCRAM_GIMBAL_RANGE;
        (idx.max(0.0) as usize).min(71)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_sense_holds_angle() {
        let mut g = ScramGimbal::new();
        let before = g.dir();
        assert_eq!(g.increment(1.0, 0.0), before);
        assert_eq!(g.angle(), SCRAM_DEFAULT_DIR);
        g.increment(1.0, -0.0);
        assert_eq!(g.angle(), SCRAM_DEFAULT_DIR);
    }

    #[test]
    fn travel_is_clamped() {
        let mut g = ScramGimbal::new();
        g.increment(100.0, 1.0);
        assert!((g.angle() - (SCRAM_DEFAULT_DIR + SCRAM_GIMBAL_RANGE)).abs() < 1e-12);
        assert!(g.indicator() >= 70);
        g.increment(100.0, -1.0);
        assert!((g.angle() - (SCRAM_DEFAULT_DIR - SCRAM_GIMBAL_RANGE)).abs() < 1e-12);
        assert_eq!(g.indicator(), 0);
    }

    #[test]
    fn full_travel_takes_three_seconds() {
        let mut g = ScramGimbal::new();
        g.increment(1.5, 1.0);
        assert!((g.angle() - (SCRAM_DEFAULT_DIR + 0.5 * SCRAM_GIMBAL_RANGE)).abs() < 1e-12);
    }

    #[test]
    fn recenter_stops_at_neutral() {
        let mut g = ScramGimbal::new();
        g.increment(3.0, 1.0);
        assert!(g.recenter(1.0));
        assert!(g.recenter(1.0));
        assert!(!g.recenter(1.5));
        assert_eq!(g.angle(), SCRAM_DEFAULT_DIR);
        assert_eq!(g.indicator(), 35);
    }

    #[test]
    fn direction_round_trip() {
        let mut g = ScramGimbal::new();
        let d = g.increment(0.7, -1.0);
        assert!((d.norm() - 1.0).abs() < 1e-12);
        let h = ScramGimbal::from_dir(&d);
        assert!((h.angle() - g.angle()).abs() < 1e-12);
    }
}
