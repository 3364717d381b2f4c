use tracing::info;

use crate::host::{VesselClass, VesselHost};

use super::layout::presets;
use super::module::VesselModule;

/// The external tank after separation. Unpowered; removed on impact.
#[derive(Debug, Clone, Default)]
pub struct Tank;

impl Tank {
    pub fn new() -> Self {
        Self
    }
}

impl VesselModule for Tank {
    fn class(&self) -> VesselClass {
        VesselClass::Tank
    }

    fn set_class_caps(&mut self, host: &mut dyn VesselHost) {
        host.set_physical_params(&presets::tank());
        host.clear_thrusters();
    }

    fn post_step(&mut self, host: &mut dyn VesselHost, _simt: f64, _simdt: f64) {
        if host.altitude() < 0.0 {
            info!(vessel = host.name(), "tank impact, removing");
            host.request_delete();
        }
    }
}
