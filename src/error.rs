/// Unified error types for the remid resolver
use thiserror::Error;

/// Outcome vocabulary exposed to the resolution host.
///
/// Every public operation classifies into exactly one of these, matching the
/// statuses a name-service host expects back from a resolver backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupStatus {
    Success,
    NotFound,
    Unavailable,
    TryAgain,
}

/// Main error type for the resolver
#[derive(Error, Debug)]
pub enum ResolveError {
    /// Configuration file could not be read or parsed at all
    #[error("configuration error: {0}")]
    Config(String),

    /// Connection, TLS, or timeout failure talking to the identity service
    #[error("transport error: {0}")]
    Transport(String),

    /// Authoritative absence: a 404 response, a range-gate denial, or an
    /// exhausted enumeration cursor. A normal outcome, not a fault.
    #[error("record not found")]
    NotFound,

    /// Malformed response payload. Always a contract violation, never
    /// conflated with not-found.
    #[error("response parse error: {0}")]
    Parse(String),

    /// Destination buffer too small; the caller should retry with more space
    #[error("record buffer too small: {needed} bytes needed, {remaining} remaining")]
    BufferTooSmall { needed: usize, remaining: usize },

    /// Response body exceeded the hard size ceiling
    #[error("response larger than {limit} bytes")]
    ResponseTooLarge { limit: usize },

    /// Shared-state mutex could not be acquired within the bounded retry
    #[error("lock contention: gave up after {attempts} attempts")]
    LockContended { attempts: u32 },
}

impl ResolveError {
    /// Classify this error into the host-facing outcome vocabulary.
    pub fn status(&self) -> LookupStatus {
        match self {
            ResolveError::NotFound => LookupStatus::NotFound,
            ResolveError::BufferTooSmall { .. } => LookupStatus::TryAgain,
            _ => LookupStatus::Unavailable,
        }
    }
}

/// Result type alias for resolver operations
pub type ResolveResult<T> = Result<T, ResolveError>;
