pub mod event;
pub mod host;
pub mod runner;

pub use event::{EventKind, JettisonTarget, RecordedEvent, SimEvent};
pub use host::{FlightConditions, SimHost};
pub use runner::{full_throttle, launch_profile, simulate_launch, Sample, Simulation, Vessel};
