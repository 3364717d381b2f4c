use thiserror::Error;

/// Convenient result alias for the vessel modules.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised at the persistence and configuration boundary.
///
/// The numeric core (ramjet model, staging, gimbal law) never fails; it
/// saturates instead. Everything here comes from reading or writing state.
#[derive(Debug, Error)]
pub enum Error {
    /// A scenario line carried a value that could not be parsed.
    #[error("invalid value {value:?} for scenario key {key}")]
    ScenarioValue { key: String, value: String },

    /// The persisted stack configuration is outside the known stages.
    #[error("unknown stack configuration {0} (expected 0..=3)")]
    UnknownConfiguration(i64),

    /// The spawn factory was asked for a class it does not know.
    #[error("unknown vessel class {0:?}")]
    UnknownVesselClass(String),

    /// A staging calibration value would break the booster burn profile.
    #[error("invalid staging parameter {key} = {value}: {reason}")]
    Staging { key: &'static str, value: f64, reason: &'static str },

    #[error("failed to parse configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
