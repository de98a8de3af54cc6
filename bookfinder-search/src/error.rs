//! Error types for the bookfinder-search crate.
//!
//! All errors use stable string messages suitable for display to users
//! and for the `error_message` field of a failed source outcome. No API
//! keys or passwords appear in error messages.

/// Errors that can occur while resolving or searching for a book.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    /// Malformed or missing source configuration. Fatal at startup.
    #[error("config error: {0}")]
    Config(String),

    /// An HTTP request to a source failed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// A source response could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// An operation exceeded its deadline.
    #[error("timed out: {0}")]
    Timeout(String),

    /// Credentials were rejected, or the session could not be re-established.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// A previously valid session is no longer accepted by the source.
    ///
    /// Adapters recover from this once by re-authenticating; it only escapes
    /// as [`SearchError::Authentication`].
    #[error("session expired: {0}")]
    SessionExpired(String),

    /// Candidate resolution produced several candidates; the caller must pick one.
    #[error("ambiguous query: {candidates} candidates require a selection")]
    Ambiguous {
        /// Number of candidates presented.
        candidates: usize,
    },

    /// Nothing matched within the current scope.
    #[error("not found: {0}")]
    NotFound(String),

    /// The adapter cannot serve this kind of query.
    #[error("unsupported query: {0}")]
    Unsupported(String),

    /// An operation was attempted from the wrong resolution state.
    #[error("invalid state: {0}")]
    InvalidState(String),
}

impl SearchError {
    /// Whether this error is isolated to a single source execution.
    ///
    /// Configuration errors and resolution failures are the only errors
    /// reported to the caller as an overall search failure.
    pub fn is_source_scoped(&self) -> bool {
        matches!(
            self,
            Self::Http(_)
                | Self::Parse(_)
                | Self::Timeout(_)
                | Self::Authentication(_)
                | Self::SessionExpired(_)
                | Self::Unsupported(_)
        )
    }
}

/// Convenience type alias for bookfinder-search results.
pub type Result<T> = std::result::Result<T, SearchError>;
