use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Frame stepping
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub dt: f64,       // frame length, s
    pub max_time: f64, // hard stop, s
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            dt: 0.1,          // 10 Hz host frames
            max_time: 700.0,  // past main-tank depletion
        }
    }
}

// ---------------------------------------------------------------------------
// Staging calibration
// ---------------------------------------------------------------------------

/// Fixed MET knot at which booster tail-off begins, s.
pub const SRB_TAILOFF_MET: f64 = 115.0;

/// Timing and threshold constants of the launch stack staging sequence.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct StagingParams {
    /// Main engine level that counts as "go for SRB ignition".
    pub ignition_level: f64,
    /// Delay between main engine ignition and SRB ignition (liftoff), s.
    pub stabilisation_time: f64,
    /// MET at which the boosters are jettisoned, s.
    pub separation_time: f64,
    /// MET at which a detached booster shuts down, s.
    pub cutout_time: f64,
    /// Main tank propellant below which the tank is jettisoned, kg.
    pub tank_empty_mass: f64,
    /// Tank separation speed along the stack's -y axis, m/s.
    pub tank_separation_speed: f64,
    /// Pitch rate given to the detached tank, rad/s.
    pub tank_separation_pitch_rate: f64,
}

impl Default for StagingParams {
    fn default() -> Self {
        Self {
            ignition_level: 0.95,
            stabilisation_time: 4.0,
            separation_time: 126.0,
            cutout_time: 135.0,
            tank_empty_mass: 1.0,
            tank_separation_speed: 0.3,
            tank_separation_pitch_rate: -0.005,
        }
    }
}

impl StagingParams {
    /// Check that the booster burn profile knots stay strictly ordered.
    pub fn validate(&self) -> Result<()> {
        if !(self.ignition_level > 0.0 && self.ignition_level <= 1.0) {
            return invalid("ignition_level", self.ignition_level, "must lie in (0, 1]");
        }
        if !(self.stabilisation_time > 1.0) {
            return invalid("stabilisation_time", self.stabilisation_time, "must exceed 1 s");
        }
        if !(self.separation_time > SRB_TAILOFF_MET) {
            return invalid("separation_time", self.separation_time, "must come after booster tail-off at 115 s");
        }
        if !(self.cutout_time > self.separation_time && self.cutout_time < 1e10) {
            return invalid("cutout_time", self.cutout_time, "must come after separation_time");
        }
        if !(self.tank_empty_mass >= 0.0) {
            return invalid("tank_empty_mass", self.tank_empty_mass, "must not be negative");
        }
        Ok(())
    }
}

fn invalid(key: &'static str, value: f64, reason: &'static str) -> Result<()> {
    Err(Error::Staging { key, value, reason })
}

// ---------------------------------------------------------------------------
// File-level configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct VesselConfig {
    pub sim: SimConfig,
    pub staging: StagingParams,
}

impl VesselConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(text)?;
        cfg.staging.validate()?;
        Ok(cfg)
    }
}

/// Load a TOML configuration file. Missing keys keep their defaults.
pub fn load<P: AsRef<Path>>(path: P) -> Result<VesselConfig> {
    let text = std::fs::read_to_string(path)?;
    VesselConfig::from_toml_str(&text)
}
