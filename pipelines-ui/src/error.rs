use pipelines_common::CriteriaKind;
use thiserror::Error;

/// A criteria projection half that could not be decoded
#[derive(Error, Debug)]
pub enum ProjectionError {
    #[error("Malformed {kind} projection: {source}")]
    Json {
        kind: CriteriaKind,
        #[source]
        source: serde_json::Error,
    },
    #[error("Malformed query string: {0}")]
    Query(#[from] serde_urlencoded::de::Error),
}

/// Failure reported by a URL-state collaborator while navigating
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    #[error("Navigation rejected: {0}")]
    Rejected(String),
    #[error("Navigation cancelled")]
    Cancelled,
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_yaml::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error returned by a mutation observer. Logged, never propagated.
pub type ObserverError = Box<dyn std::error::Error + Send + Sync>;
