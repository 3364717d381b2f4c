use nalgebra::Vector3;

use crate::config::StagingParams;
use crate::error::Result;
use crate::host::{FlightQuery, VesselClass, VesselHost};
use crate::io::scenario::ScenarioBlock;
use crate::sim::event::RecordedEvent;

use super::booster::Booster;
use super::glider::ScramGlider;
use super::shuttle::LaunchStack;
use super::tank::Tank;

/// Lifecycle hooks a vessel module receives from the host.
///
/// Call order for a new vessel: [`set_class_caps`](Self::set_class_caps),
/// then [`load_state`](Self::load_state) when resuming from a scenario,
/// then [`post_creation`](Self::post_creation). After that the host calls
/// [`post_step`](Self::post_step) once per frame.
pub trait VesselModule {
    fn class(&self) -> VesselClass;

    /// Build the vessel's default footprint, propellant and thrusters.
    fn set_class_caps(&mut self, host: &mut dyn VesselHost);

    /// Read persisted fields. Application is deferred to `post_creation`.
    fn load_state(&mut self, _scn: &ScenarioBlock) -> Result<()> {
        Ok(())
    }

    fn save_state(&self, _scn: &mut ScenarioBlock, _simt: f64) {}

    fn post_creation(&mut self, _host: &mut dyn VesselHost, _simt: f64) {}

    fn post_step(&mut self, host: &mut dyn VesselHost, simt: f64, simdt: f64);

    /// React to a replayed recorder event. Returns true if consumed.
    fn playback_event(
        &mut self,
        _host: &mut dyn VesselHost,
        _simt: f64,
        _event_t: f64,
        _event: &RecordedEvent,
    ) -> bool {
        false
    }

    /// Persisted configuration index, for vessels that stage.
    fn configuration(&self) -> Option<i64> {
        None
    }

    /// Current thrust direction of the steered engine, if any.
    fn gimbal_dir(&self, _host: &dyn FlightQuery) -> Option<Vector3<f64>> {
        None
    }
}

/// Create the module for a vessel class.
pub fn spawn_module(class: VesselClass, staging: &StagingParams) -> Box<dyn VesselModule> {
    match class {
        VesselClass::LaunchStack => Box::new(LaunchStack::new(*staging)),
        VesselClass::Booster => Box::new(Booster::new(*staging)),
        VesselClass::Tank => Box::new(Tank::new()),
        VesselClass::ScramGlider => Box::new(ScramGlider::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_builds_requested_class() {
        let staging = StagingParams::default();
        for class in [
            VesselClass::LaunchStack,
            VesselClass::Booster,
            VesselClass::Tank,
            VesselClass::ScramGlider,
        ] {
            assert_eq!(spawn_module(class, &staging).class(), class);
        }
    }
}
