pub mod csv;
pub mod json;
pub mod scenario;

pub use scenario::ScenarioBlock;
