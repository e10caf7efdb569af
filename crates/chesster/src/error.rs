//! Server-side error type.

/// Errors raised by the service layer.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// A configuration value failed validation.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// What was wrong with the value.
        reason: String,
    },

    /// The presented token did not resolve to an identity.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// The rating persistence collaborator reported a failure.
    #[error("rating persistence failed: {reason}")]
    RatingPersistence {
        /// The collaborator's description of the failure.
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}
