use thiserror::Error;

// Errors are Clone so that callers coalesced onto one in-flight
// request can all receive the same failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("transport error: {0}")]
    Transport(String),
}

pub type Result<T> = std::result::Result<T, ServiceError>;

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        match err.url() {
            Some(url) => ServiceError::Transport(format!("{} (url: {})", err, url)),
            None => ServiceError::Transport(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::Transport(format!("failed to parse response: {}", err))
    }
}

impl From<csv::Error> for ServiceError {
    fn from(err: csv::Error) -> Self {
        ServiceError::Transport(format!("failed to read tab-delimited response: {}", err))
    }
}
