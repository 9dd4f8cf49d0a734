//! # Upstream Error Contract
//!
//! Every upstream adapter (indexers, price oracles, config services) reports
//! failures in this shape so the rest of the core can react uniformly:
//! the fetch orchestrator caches not-found results, and circuit breakers
//! classify which failures count toward tripping. A client-side mistake
//! (4xx) says nothing about upstream health and must not open a circuit.

use thiserror::Error;

/// Failure reported by an upstream dependency.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    /// The requested resource does not exist upstream. Cacheable.
    #[error("upstream resource not found: {resource}")]
    NotFound { resource: String },

    /// The upstream answered with a non-success status.
    #[error("upstream returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// The upstream could not be reached or the connection broke.
    #[error("upstream network failure: {0}")]
    Network(String),

    /// The upstream answered, but the payload did not parse.
    #[error("upstream response decode failure: {0}")]
    Decode(String),
}

impl UpstreamError {
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Default circuit breaker classifier: does this failure indicate the
    /// upstream itself is unhealthy?
    ///
    /// Server errors, unreachable hosts, and undecodable payloads count.
    /// Not-found and other 4xx responses are the upstream working as
    /// intended and never trip a circuit.
    pub fn is_server_fault(&self) -> bool {
        match self {
            Self::NotFound { .. } => false,
            Self::Status { status, .. } => *status >= 500,
            Self::Network(_) | Self::Decode(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_never_a_server_fault() {
        assert!(!UpstreamError::not_found("1_chain").is_server_fault());
        assert!(UpstreamError::not_found("1_chain").is_not_found());
    }

    #[test]
    fn test_status_classification_splits_at_500() {
        assert!(!UpstreamError::status(400, "bad request").is_server_fault());
        assert!(!UpstreamError::status(429, "slow down").is_server_fault());
        assert!(UpstreamError::status(500, "boom").is_server_fault());
        assert!(UpstreamError::status(503, "overloaded").is_server_fault());
    }

    #[test]
    fn test_transport_failures_are_server_faults() {
        assert!(UpstreamError::Network("connection refused".into()).is_server_fault());
        assert!(UpstreamError::Decode("truncated body".into()).is_server_fault());
    }
}
