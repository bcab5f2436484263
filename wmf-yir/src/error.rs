//! Error types for wmf-yir
//!
//! Eligibility failures are not errors: the gate reports them as
//! [`crate::gate::Ineligibility`]. Everything here is a genuine failure that
//! propagates to the caller of the population entry point.

use thiserror::Error;

/// Year in Review error type
#[derive(Debug, Error)]
pub enum YirError {
    /// Persistence layer was never initialized; the controller stays locked out
    #[error("Report store unavailable")]
    StoreUnavailable,

    /// No MediaWiki service bound to the controller
    #[error("MediaWiki service unavailable")]
    ServiceUnavailable,

    /// Project missing or unable to resolve to an API endpoint
    #[error("Invalid project reference: {0}")]
    InvalidProjectReference(String),

    /// Request URL or parameters could not be built
    #[error("Failed to construct request: {0}")]
    RequestConstructionFailure(String),

    /// Response body decoded but did not have the expected shape
    #[error("Unexpected response: {0}")]
    UnexpectedResponseShape(String),

    /// No remote feature config for the target config year
    #[error("Remote feature config missing")]
    RemoteConfigMissing,

    /// Network communication error
    #[error("Network error: {0}")]
    Network(String),

    /// API answered with a non-success status
    #[error("API error {0}: {1}")]
    HttpStatus(u16, String),

    /// Database operation error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Slide payload could not be encoded or decoded
    #[error("Encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    /// wmf-common error
    #[error("Common error: {0}")]
    Common(#[from] wmf_common::Error),
}

/// Result type for Year in Review operations
pub type YirResult<T> = Result<T, YirError>;
