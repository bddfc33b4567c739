//! Error types and result types for document fetching.
//!
//! Every fallible operation in the workspace returns [`FetchResult<T>`]. The variants are
//! split by the stage that failed so callers can tell a startup problem from a failed read.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use std::time::Duration;
use thiserror::Error;

/// Represents all possible errors that can occur while connecting to or reading from a store.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The configuration was rejected before any connection was attempted.
    #[error("Configuration error: {0}")]
    Config(String),
    /// The driver client could not be created for the endpoint.
    #[error("Connection error: {0}")]
    Connection(String),
    /// The liveness check returned an error.
    #[error("Liveness check failed: {0}")]
    Liveness(String),
    /// The liveness check did not answer within the connect timeout.
    #[error("Liveness check timed out after {0:?}")]
    LivenessTimeout(Duration),
    /// The query could not be issued against the collection.
    #[error("Query error: {0}")]
    Query(String),
    /// A record returned by the cursor could not be decoded into a document.
    #[error("Decode error: {0}")]
    Decode(String),
    /// The cursor reported an error while iterating.
    #[error("Cursor error: {0}")]
    Cursor(String),
    /// The caller's cancellation token fired.
    #[error("Operation cancelled by caller")]
    Cancelled,
    /// The caller's deadline passed before the operation finished.
    #[error("Caller deadline exceeded")]
    DeadlineExceeded,
    /// Closing the underlying client failed.
    #[error("Shutdown error: {0}")]
    Shutdown(String),
}

impl FetchError {
    /// Returns `true` for errors raised while constructing a client.
    ///
    /// These are the failures a process usually treats as fatal at startup.
    pub fn is_startup(&self) -> bool {
        matches!(
            self,
            FetchError::Config(_)
                | FetchError::Connection(_)
                | FetchError::Liveness(_)
                | FetchError::LivenessTimeout(_)
        )
    }

    /// Returns `true` when the caller's context ended the operation.
    pub fn is_caller_abort(&self) -> bool {
        matches!(self, FetchError::Cancelled | FetchError::DeadlineExceeded)
    }
}

/// A specialized `Result` type for fetch operations.
pub type FetchResult<T> = Result<T, FetchError>;

impl From<BsonError> for FetchError {
    fn from(err: BsonError) -> Self {
        FetchError::Decode(err.to_string())
    }
}

impl From<SerdeJsonError> for FetchError {
    fn from(err: SerdeJsonError) -> Self {
        FetchError::Decode(err.to_string())
    }
}
