use thiserror::Error;

/// Caller-usage errors raised by the environment.
///
/// None of these are recoverable internally: the simulation has no transient
/// failure modes, so every variant points at a bug in the calling code or in
/// its configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EnvError {
    #[error("Invalid action: {0} (expected one of 0, 1, 2, 3)")]
    InvalidAction(i64),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl EnvError {
    pub(crate) fn episode_finished() -> Self {
        EnvError::InvalidState("episode is done; call reset() before stepping again".into())
    }

    pub(crate) fn not_started() -> Self {
        EnvError::InvalidState("no active episode; call reset() first".into())
    }
}

impl From<validator::ValidationErrors> for EnvError {
    fn from(errors: validator::ValidationErrors) -> Self {
        EnvError::Configuration(errors.to_string())
    }
}

pub type EnvResult<T> = std::result::Result<T, EnvError>;
