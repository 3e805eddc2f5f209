use serde::Serialize;

/// Shared error type used across all uniload crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Timeout, HTTP 429 or 5xx that stayed failing after all retries.
    #[error("transient network failure: {0}")]
    TransientNetwork(String),

    /// Any other HTTP status, connection refusal, or malformed response body.
    #[error("network failure: {0}")]
    TerminalNetwork(String),

    /// One or more validation problems. All of them are reported together.
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("config: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(vec![message.into()])
    }

    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Error::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Machine-readable classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) => ErrorKind::Io,
            Error::Json(_) | Error::Yaml(_) => ErrorKind::Serialization,
            Error::TransientNetwork(_) => ErrorKind::TransientNetwork,
            Error::TerminalNetwork(_) => ErrorKind::TerminalNetwork,
            Error::Validation(_) | Error::Conflict(_) => ErrorKind::Validation,
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::Config(_) => ErrorKind::Config,
            Error::Other(_) => ErrorKind::Internal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    TransientNetwork,
    TerminalNetwork,
    Validation,
    NotFound,
    Io,
    Serialization,
    Config,
    Internal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::TransientNetwork => "transient_network",
            ErrorKind::TerminalNetwork => "terminal_network",
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Io => "io",
            ErrorKind::Serialization => "serialization",
            ErrorKind::Config => "config",
            ErrorKind::Internal => "internal",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_joins_all_messages() {
        let err = Error::Validation(vec!["a missing".into(), "b dangling".into()]);
        assert_eq!(err.to_string(), "validation failed: a missing; b dangling");
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn conflict_is_a_validation_kind() {
        let err = Error::Conflict("display name 'x' already used".into());
        assert_eq!(err.kind().as_str(), "validation");
    }

    #[test]
    fn not_found_message_names_entity() {
        let err = Error::not_found("model", "m-1");
        assert_eq!(err.to_string(), "model not found: m-1");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::TransientNetwork).unwrap();
        assert_eq!(json, r#""transient_network""#);
    }
}
