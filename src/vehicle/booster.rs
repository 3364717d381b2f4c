use nalgebra::Vector3;
use tracing::{debug, info};

use crate::config::{StagingParams, SRB_TAILOFF_MET};
use crate::host::{
    GroupKind, PropellantHandle, ThrusterHandle, ThrusterSpec, VesselClass, VesselHost,
};

use super::layout::{presets, SRB_ISP0, SRB_ISP1, SRB_MAX_PROPELLANT_MASS, SRB_THRUST};
use super::module::VesselModule;

// ---------------------------------------------------------------------------
// SRB burn profile
// ---------------------------------------------------------------------------

const N_KNOTS: usize = 8;

/// Booster thrust level at each profile knot.
const THRUST_LEVEL: [f64; N_KNOTS] = [0.1, 0.1, 1.0, 1.0, 0.8, 0.05, 0.0, 0.0];
/// Fraction of booster propellant left at each profile knot.
const PROP_LEVEL: [f64; N_KNOTS] = [1.0, 0.98, 0.95, 0.2, 0.1, 0.03, 0.0, 0.0];

/// Piecewise-linear SRB thrust and propellant curves over mission time.
#[derive(Debug, Clone, PartialEq)]
pub struct SrbProfile {
    seq: [f64; N_KNOTS],
    thrust_slope: [f64; N_KNOTS - 1],
    prop_slope: [f64; N_KNOTS - 1],
}

impl SrbProfile {
    /// Build the curves for `staging`, which is expected to pass
    /// [`StagingParams::validate`]; otherwise the knots are out of order.
    pub fn new(staging: &StagingParams) -> Self {
        let seq = [
            -staging.stabilisation_time,
            -1.0,
            0.0,
            103.0,
            SRB_TAILOFF_MET,
            staging.separation_time,
            staging.cutout_time,
            1e10,
        ];
        let mut thrust_slope = [0.0; N_KNOTS - 1];
        let mut prop_slope = [0.0; N_KNOTS - 1];
        for i in 0..N_KNOTS - 1 {
            let dt = seq[i + 1] - seq[i];
            thrust_slope[i] = (THRUST_LEVEL[i + 1] - THRUST_LEVEL[i]) / dt;
            prop_slope[i] = (PROP_LEVEL[i + 1] - PROP_LEVEL[i]) / dt;
        }
        Self { seq, thrust_slope, prop_slope }
    }

    /// Thrust level and propellant fraction at mission time `met`, s.
    pub fn state(&self, met: f64) -> (f64, f64) {
        let i = (0..N_KNOTS - 1).rev().find(|&i| met > self.seq[i]).unwrap_or(0);
        let dt = met - self.seq[i];
        let thrust = self.thrust_slope[i] * dt + THRUST_LEVEL[i];
        let prop = self.prop_slope[i] * dt + PROP_LEVEL[i];
        (thrust.clamp(0.0, 1.0), prop.clamp(0.0, 1.0))
    }

    /// Mission time at which the boosters hold `fraction` of their propellant.
    pub fn met_from_propellant(&self, fraction: f64) -> f64 {
        let fuel = fraction.clamp(0.0, 1.0);
        let i = (1..N_KNOTS).find(|&i| fuel >= PROP_LEVEL[i]).unwrap_or(N_KNOTS - 2);
        self.seq[i] + (fuel - PROP_LEVEL[i]) / self.prop_slope[i - 1]
    }
}

impl Default for SrbProfile {
    fn default() -> Self {
        Self::new(&StagingParams::default())
    }
}

/// [`SrbProfile::state`] on the default staging timeline.
pub fn srb_state(met: f64) -> (f64, f64) {
    SrbProfile::default().state(met)
}

/// [`SrbProfile::met_from_propellant`] on the default staging timeline.
pub fn met_from_propellant(fraction: f64) -> f64 {
    SrbProfile::default().met_from_propellant(fraction)
}

// ---------------------------------------------------------------------------
// Detached booster
// ---------------------------------------------------------------------------

const BOLT_THRUST: f64 = 3.0e6;
const BOLT_ISP: f64 = 1.0e7;
/// Burn time of the separation bolts, s.
const BOLT_BURN: f64 = 0.5;

/// A solid rocket booster after separation from the stack.
///
/// Keeps burning down its profile until cutout, kicked away from the
/// stack by its separation bolts during the first half second.
#[derive(Debug, Clone)]
pub struct Booster {
    staging: StagingParams,
    profile: SrbProfile,
    ph: Option<PropellantHandle>,
    th_main: Option<ThrusterHandle>,
    bolt: Option<ThrusterHandle>,
    /// Liftoff epoch reconstructed from the remaining propellant.
    t0: f64,
    created: f64,
}

impl Booster {
    pub fn new(staging: StagingParams) -> Self {
        Self {
            staging,
            profile: SrbProfile::new(&staging),
            ph: None,
            th_main: None,
            bolt: None,
            t0: 0.0,
            created: 0.0,
        }
    }

    pub fn reference_time(&self) -> f64 {
        self.t0
    }
}

impl VesselModule for Booster {
    fn class(&self) -> VesselClass {
        VesselClass::Booster
    }

    fn set_class_caps(&mut self, host: &mut dyn VesselHost) {
        host.set_physical_params(&presets::booster());
        let ph = host.create_propellant(SRB_MAX_PROPELLANT_MASS);
        let th = host.create_thruster(
            &ThrusterSpec::new(Vector3::new(0.0, 0.0, -21.0), Vector3::z(), SRB_THRUST, Some(ph), SRB_ISP0)
                .sea_level_isp(SRB_ISP1),
        );
        host.create_group(&[th], GroupKind::Main);
        self.ph = Some(ph);
        self.th_main = Some(th);
    }

    fn post_creation(&mut self, host: &mut dyn VesselHost, simt: f64) {
        let fraction = match self.ph {
            Some(ph) => host.propellant_mass(ph) / host.propellant_max_mass(ph).max(f64::MIN_POSITIVE),
            None => 0.0,
        };
        let met = self.profile.met_from_propellant(fraction);
        self.t0 = simt - met;
        self.created = simt;

        let bolt = host.create_thruster(&ThrusterSpec::new(
            Vector3::new(0.0, 0.0, 1.2),
            Vector3::x(),
            BOLT_THRUST,
            self.ph,
            BOLT_ISP,
        ));
        host.set_thruster_level(bolt, 1.0);
        self.bolt = Some(bolt);
        debug!(vessel = host.name(), met, "booster reference time reconstructed");
    }

    fn post_step(&mut self, host: &mut dyn VesselHost, simt: f64, _simdt: f64) {
        let met = simt - self.t0;
        if let Some(th) = self.th_main {
            let level = if met >= self.staging.cutout_time {
                0.0
            } else {
                self.profile.state(met).0
            };
            host.set_thruster_level(th, level);
        }

        if let Some(bolt) = self.bolt {
            let dt = simt - self.created;
            if dt < BOLT_BURN {
                host.set_thruster_level(bolt, (1.0 - dt / BOLT_BURN).sqrt());
            } else {
                host.delete_thruster(bolt);
                self.bolt = None;
            }
        }

        if host.altitude() < 0.0 {
            info!(vessel = host.name(), "booster impact, removing");
            host.request_delete();
        }
    }
}
