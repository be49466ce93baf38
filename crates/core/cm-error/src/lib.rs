//! Error types and classification for coldmove.
//!
//! This crate provides:
//! - [`StoreError`] - Object-store backend errors with transient/permanent
//!   classification
//! - [`MoveError`] - Run-level errors for a migration run
//! - [`classify_backend_error`] - Classification of raw backend error
//!   codes/messages into [`StoreError`] variants

use thiserror::Error;

/// Errors surfaced by an object-store backend.
///
/// The transient variants map to the backend failure kinds that are expected
/// to clear on their own: rate limiting and the 5xx family. Everything else
/// is permanent and must not be retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Backend asked us to slow down (HTTP 429 family)
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Backend-side failure (HTTP 500)
    #[error("Internal server error: {0}")]
    InternalServer(String),

    /// Intermediate proxy failure (HTTP 502)
    #[error("Bad gateway: {0}")]
    BadGateway(String),

    /// Backend temporarily unavailable (HTTP 503)
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Backend did not respond in time (HTTP 504)
    #[error("Gateway timeout: {0}")]
    GatewayTimeout(String),

    /// Bucket or object does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller lacks permission for the operation
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Malformed or rejected request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Anything the backend reported that fits no other variant
    #[error("Store error: {0}")]
    Other(String),
}

impl StoreError {
    /// Whether this error is expected to clear on retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::RateLimited(_)
                | StoreError::InternalServer(_)
                | StoreError::BadGateway(_)
                | StoreError::ServiceUnavailable(_)
                | StoreError::GatewayTimeout(_)
        )
    }
}

/// Classify a raw backend error code/message into a [`StoreError`].
///
/// Matching is case-insensitive and substring-based because backends report
/// the same condition under several spellings (service error codes, HTTP
/// status text, connection-layer messages).
pub fn classify_backend_error(code: &str, message: &str) -> StoreError {
    let haystack = format!("{} {}", code, message).to_lowercase();
    let detail = message.to_string();

    if haystack.contains("slowdown")
        || haystack.contains("toomanyrequests")
        || haystack.contains("throttl")
        || haystack.contains("429")
    {
        StoreError::RateLimited(detail)
    } else if haystack.contains("internalerror")
        || haystack.contains("internal server")
        || haystack.contains("500")
    {
        StoreError::InternalServer(detail)
    } else if haystack.contains("badgateway") || haystack.contains("bad gateway") || haystack.contains("502") {
        StoreError::BadGateway(detail)
    } else if haystack.contains("serviceunavailable")
        || haystack.contains("service unavailable")
        || haystack.contains("503")
    {
        StoreError::ServiceUnavailable(detail)
    } else if haystack.contains("504")
        || haystack.contains("gateway timeout")
        || haystack.contains("requesttimeout")
        || haystack.contains("timeout")
    {
        StoreError::GatewayTimeout(detail)
    } else if haystack.contains("nosuchkey")
        || haystack.contains("nosuchbucket")
        || haystack.contains("notfound")
        || haystack.contains("not found")
        || haystack.contains("404")
    {
        StoreError::NotFound(detail)
    } else if haystack.contains("accessdenied") || haystack.contains("forbidden") || haystack.contains("403") {
        StoreError::PermissionDenied(detail)
    } else if haystack.contains("invalidrequest")
        || haystack.contains("invalidargument")
        || haystack.contains("400")
    {
        StoreError::InvalidRequest(detail)
    } else {
        StoreError::Other(detail)
    }
}

/// Run-level errors for a migration run.
///
/// Per-object and per-prefix failures are contained where they occur and
/// reported through the run summary; only these conditions abort a run.
#[derive(Error, Debug)]
pub enum MoveError {
    /// The migration request violates an invariant; rejected before any
    /// remote call.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Every listing task failed; no candidate list could be produced.
    #[error("Listing failed for every prefix: {0}")]
    Listing(StoreError),
}

/// Result type alias using MoveError.
pub type Result<T> = std::result::Result<T, MoveError>;

/// Result type alias for object-store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
