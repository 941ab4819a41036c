use pitstop_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AutoplayError {
    #[error("world model declares no concrete actions")]
    EmptyActionSpace,
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("core error: {0}")]
    Core(String),
    #[error("io error: {0}")]
    Io(String),
    #[error("serialize error: {0}")]
    Serialize(String),
}

impl From<CoreError> for AutoplayError {
    fn from(value: CoreError) -> Self {
        Self::Core(value.to_string())
    }
}

impl From<std::io::Error> for AutoplayError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value.to_string())
    }
}

impl From<serde_json::Error> for AutoplayError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value.to_string())
    }
}
