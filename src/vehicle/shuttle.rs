use nalgebra::Vector3;
use tracing::debug;

use crate::config::StagingParams;
use crate::error::Result;
use crate::host::{FlightQuery, VesselClass, VesselHost};
use crate::io::scenario::ScenarioBlock;
use crate::sim::event::RecordedEvent;

use super::controller::StageController;
use super::module::VesselModule;
use super::stage::Stage;

/// The full launch stack: orbiter, external tank and two boosters.
///
/// Nothing is built in `set_class_caps`; the footprint depends on the
/// persisted configuration and is created in `post_creation`.
#[derive(Debug, Clone)]
pub struct LaunchStack {
    ctl: StageController,
}

impl LaunchStack {
    pub fn new(staging: StagingParams) -> Self {
        Self { ctl: StageController::new(staging) }
    }

    pub fn controller(&self) -> &StageController {
        &self.ctl
    }

    pub fn controller_mut(&mut self) -> &mut StageController {
        &mut self.ctl
    }

    pub fn stage(&self) -> Stage {
        self.ctl.stage()
    }

    /// Operator separation key. Ignored while a recording is replayed.
    pub fn request_jettison(&mut self, host: &dyn FlightQuery) -> bool {
        if host.is_playback() {
            debug!(vessel = host.name(), "jettison key ignored during playback");
            return false;
        }
        self.ctl.request_separation();
        true
    }
}

impl Default for LaunchStack {
    fn default() -> Self {
        Self::new(StagingParams::default())
    }
}

impl VesselModule for LaunchStack {
    fn class(&self) -> VesselClass {
        VesselClass::LaunchStack
    }

    fn set_class_caps(&mut self, _host: &mut dyn VesselHost) {}

    fn load_state(&mut self, scn: &ScenarioBlock) -> Result<()> {
        self.ctl.load(scn)
    }

    fn save_state(&self, scn: &mut ScenarioBlock, simt: f64) {
        self.ctl.save(scn, simt);
    }

    fn post_creation(&mut self, host: &mut dyn VesselHost, simt: f64) {
        self.ctl.resume(host, simt);
    }

    fn post_step(&mut self, host: &mut dyn VesselHost, simt: f64, simdt: f64) {
        self.ctl.step(host, simt, simdt);
    }

    fn playback_event(
        &mut self,
        host: &mut dyn VesselHost,
        _simt: f64,
        event_t: f64,
        event: &RecordedEvent,
    ) -> bool {
        self.ctl.playback_event(&*host, event_t, event)
    }

    fn configuration(&self) -> Option<i64> {
        Some(self.ctl.stage().index())
    }

    fn gimbal_dir(&self, host: &dyn FlightQuery) -> Option<Vector3<f64>> {
        self.ctl.main_engines().map(|th| host.thruster_dir(th[2]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::host::SimHost;

    #[test]
    fn class_caps_build_nothing() {
        let mut host = SimHost::new("STS");
        let mut stack = LaunchStack::default();
        stack.set_class_caps(&mut host);
        assert_eq!(host.thruster_count(), 0);
        stack.post_creation(&mut host, 0.0);
        assert_eq!(host.thruster_count(), 17);
        assert_eq!(stack.configuration(), Some(0));
    }

    #[test]
    fn jettison_key_ignored_in_playback() {
        let mut host = SimHost::new("STS");
        let mut stack = LaunchStack::default();
        host.set_playback(true);
        assert!(!stack.request_jettison(&host));
        assert_eq!(stack.controller().pending(), None);
        host.set_playback(false);
        assert!(stack.request_jettison(&host));
        assert!(stack.controller().pending().is_some());
    }

    #[test]
    fn reports_upper_engine_direction() {
        let mut host = SimHost::new("STS");
        let mut stack = LaunchStack::default();
        stack.post_creation(&mut host, 0.0);
        let dir = stack.gimbal_dir(&host).unwrap();
        assert!(dir.z > 0.9);
    }
}
