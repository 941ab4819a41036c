use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid problem: {0}")]
    InvalidProblem(String),
    #[error("invalid action key: {0:?}")]
    InvalidActionKey(String),
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for CoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value.to_string())
    }
}
