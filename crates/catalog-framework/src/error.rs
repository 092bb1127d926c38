//! # Framework Errors
//!
//! This module defines the common error type used throughout the catalog framework.
//! Fetch failures travel inside `error` events, so the type is `Clone` and carries
//! only rendered messages instead of boxed sources.

/// Errors that can occur within the catalog framework itself.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Transport closed")]
    TransportClosed,
    #[error("Transport dropped response channel")]
    TransportDropped,
    #[error("Transport failure: {0}")]
    Transport(String),
    #[error("Malformed response: {0}")]
    Parse(String),
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Invalid route pattern: {0}")]
    InvalidRoute(String),
    #[error("Router already started")]
    AlreadyStarted,
}

impl CatalogError {
    /// Network or remote failure while talking to the transport.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            CatalogError::Transport(_) | CatalogError::TransportClosed | CatalogError::TransportDropped
        )
    }

    /// The transport answered, but the payload had the wrong shape.
    pub fn is_parse(&self) -> bool {
        matches!(self, CatalogError::Parse(_))
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(e: serde_json::Error) -> Self {
        CatalogError::Parse(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(CatalogError::TransportClosed.is_transport());
        assert!(CatalogError::Transport("timeout".into()).is_transport());
        assert!(CatalogError::Parse("missing Search".into()).is_parse());
        assert!(!CatalogError::NotFound("tt1".into()).is_transport());
        assert!(!CatalogError::NotFound("tt1".into()).is_parse());
    }

    #[test]
    fn test_json_errors_are_parse_failures() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(CatalogError::from(err).is_parse());
    }
}
