pub mod gimbal;
pub mod scram_gimbal;

pub use gimbal::{balance_upper_engine, GimbalGeometry};
pub use scram_gimbal::ScramGimbal;
