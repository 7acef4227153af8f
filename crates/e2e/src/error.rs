//! Error types for E2E verification

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Playwright not found. Install with: npx playwright install")]
    PlaywrightNotFound,

    #[error("Playwright error: {0}")]
    Playwright(String),

    #[error("Browser session closed: {0}")]
    SessionClosed(String),

    #[error("Timeout after {timeout_ms} ms waiting for: {what}")]
    Timeout { what: String, timeout_ms: u64 },

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("Unexpected status from POST {path}: expected {expected}, got {actual}")]
    UnexpectedStatus {
        path: String,
        expected: u16,
        actual: u16,
    },

    #[error("System under test not ready after {0} attempts")]
    NotReady(usize),

    #[error("Query on {table} failed: {source}")]
    Query {
        table: &'static str,
        #[source]
        source: StorageError,
    },

    #[error("Malformed row in {table}: {reason}")]
    MalformedRow { table: &'static str, reason: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database server error: {0}")]
    DatabaseServer(#[from] sqlx::Error),
}

/// Driver error from either storage backend
#[derive(Error, Debug)]
pub enum StorageError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Server(#[from] sqlx::Error),
}

/// Why a scenario failed.
///
/// Rejections and bank declines are outcomes, not failures; a failure is
/// either the system disagreeing with the expectation or the harness being
/// unable to observe it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Assertion,
    Infrastructure,
}

impl E2eError {
    pub fn kind(&self) -> FailureKind {
        match self {
            E2eError::AssertionFailed(_) => FailureKind::Assertion,
            _ => FailureKind::Infrastructure,
        }
    }

    pub(crate) fn query<E>(table: &'static str) -> impl FnOnce(E) -> E2eError
    where
        E: Into<StorageError>,
    {
        move |source| E2eError::Query {
            table,
            source: source.into(),
        }
    }
}

pub type E2eResult<T> = Result<T, E2eError>;
