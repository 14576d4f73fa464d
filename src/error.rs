use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdgeniusError {
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("api error ({status}): {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("task {task_id} reported FAILED")]
    TaskFailed { task_id: String },
    #[error("task {task_id} did not finish after {attempts} status checks")]
    Timeout { task_id: String, attempts: u32 },
    #[error("polling cancelled")]
    Cancelled,
    /// A task that already failed, rebuilt from its snapshot.
    #[error("task {task_id} failed earlier: {message}")]
    Recorded {
        task_id: String,
        kind: ErrorKind,
        message: String,
    },
    #[error("invalid config: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse classification used by callers that only need to pick a user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Provider,
    Timeout,
    Transport,
    Cancelled,
    Config,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Provider => "provider",
            Self::Timeout => "timeout",
            Self::Transport => "transport",
            Self::Cancelled => "cancelled",
            Self::Config => "config",
        }
    }
}

impl AdgeniusError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Api { .. } | Self::InvalidResponse(_) | Self::TaskFailed { .. } => {
                ErrorKind::Provider
            }
            Self::Json(_) => ErrorKind::Provider,
            Self::Http(_) => ErrorKind::Transport,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Recorded { kind, .. } => *kind,
            Self::Config(_) | Self::Io(_) => ErrorKind::Config,
        }
    }
}

pub type Result<T> = std::result::Result<T, AdgeniusError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_provider_and_timeout_errors() {
        let api = AdgeniusError::Api {
            status: reqwest::StatusCode::BAD_REQUEST,
            body: "{\"message\":\"bad prompt\"}".to_string(),
        };
        assert_eq!(api.kind(), ErrorKind::Provider);
        assert!(api.to_string().contains("bad prompt"));

        let failed = AdgeniusError::TaskFailed {
            task_id: "abc".to_string(),
        };
        assert_eq!(failed.kind(), ErrorKind::Provider);

        let timeout = AdgeniusError::Timeout {
            task_id: "abc".to_string(),
            attempts: 10,
        };
        assert_eq!(timeout.kind(), ErrorKind::Timeout);
        assert_eq!(
            timeout.to_string(),
            "task abc did not finish after 10 status checks"
        );

        assert_eq!(
            AdgeniusError::Validation("empty prompt".to_string()).kind(),
            ErrorKind::Validation
        );
    }
}
