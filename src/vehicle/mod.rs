pub mod booster;
pub mod controller;
pub mod glider;
pub mod layout;
pub mod module;
pub mod shuttle;
pub mod stage;
pub mod tank;

pub use booster::{met_from_propellant, srb_state, Booster, SrbProfile};
pub use controller::{StageCommand, StageController};
pub use glider::{ScramGlider, ScramModel, TankConfig};
pub use layout::presets;
pub use module::{spawn_module, VesselModule};
pub use shuttle::LaunchStack;
pub use stage::Stage;
pub use tank::Tank;
