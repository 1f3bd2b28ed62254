//! Error types for the catalog provider

use bridge_traits::error::BridgeError;
use std::time::Duration;

pub use bridge_traits::catalog::{CatalogError, CatalogResult as Result};

/// Classify a failed HTTP exchange for `resource`.
///
/// `deadline` is the operation budget reported when the bridge timed out.
pub(crate) fn from_bridge(resource: &str, error: BridgeError, deadline: Duration) -> CatalogError {
    let resource = resource.to_string();
    match error {
        BridgeError::Timeout(_) => CatalogError::Timeout {
            resource,
            timeout: deadline,
        },
        BridgeError::Transport(message) => CatalogError::Transport { resource, message },
        BridgeError::InvalidRequest(message) => CatalogError::InvalidRequest { resource, message },
        other => CatalogError::Transport {
            resource,
            message: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = CatalogError::UnexpectedStatus {
            resource: "asset a1".to_string(),
            status: 404,
            body: "{\"errors\":[\"not found\"]}".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "Unexpected status 404 for asset a1: {\"errors\":[\"not found\"]}"
        );
    }

    #[test]
    fn test_bridge_error_conversion() {
        let timeout = from_bridge(
            "metadata view v1",
            BridgeError::Timeout(Duration::from_secs(2)),
            Duration::from_secs(30),
        );
        assert!(matches!(
            timeout,
            CatalogError::Timeout { timeout, .. } if timeout == Duration::from_secs(30)
        ));

        let transport = from_bridge(
            "asset a1",
            BridgeError::Transport("connection refused".to_string()),
            Duration::from_secs(30),
        );
        assert!(matches!(transport, CatalogError::Transport { .. }));
        assert!(transport.to_string().contains("connection refused"));
    }
}
