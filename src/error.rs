//! Error types for Chainview

use std::fmt;

/// Outcome taxonomy shared by the resolver, the pending pool and the stores.
///
/// `CallerError` and `NotFound` are expected results of a well-formed request
/// and are reported back as-is. `StoreUnavailable` and `EncodingFailure` are
/// service failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Missing, conflicting or malformed request parameters.
    CallerError(String),
    /// The query was valid but nothing matched.
    NotFound(String),
    /// The backing ledger, accounts or pool could not be read, parsed or written.
    StoreUnavailable(String),
    /// A record lacks a field its identity hash depends on.
    EncodingFailure(String),
}

impl LedgerError {
    /// True for outcomes a caller is expected to handle (bad input, no match).
    pub fn is_expected(&self) -> bool {
        matches!(self, LedgerError::CallerError(_) | LedgerError::NotFound(_))
    }
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LedgerError::CallerError(msg) => write!(f, "Invalid request: {}", msg),
            LedgerError::NotFound(msg) => write!(f, "Not found: {}", msg),
            LedgerError::StoreUnavailable(msg) => write!(f, "Store unavailable: {}", msg),
            LedgerError::EncodingFailure(msg) => write!(f, "Encoding failure: {}", msg),
        }
    }
}

impl std::error::Error for LedgerError {}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::StoreUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::StoreUnavailable(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, LedgerError>;
