//! # Transport Contract
//!
//! The framework never talks to the network itself. It consumes two narrow async
//! contracts:
//!
//! - [`Transport`] is what entities and collections call to fetch raw data.
//! - [`CatalogSource`] is the backend seam served by a
//!   [`TransportActor`](crate::actor::TransportActor).
//!
//! Both hand back raw JSON values; shaping them into records is done by
//! [`CatalogConfig`](crate::config::CatalogConfig) so that a malformed payload is
//! reported as a parse failure rather than a transport failure.

use crate::config::CatalogConfig;
use crate::error::CatalogError;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// A raw remote record: field name to arbitrary JSON value.
pub type Record = serde_json::Map<String, Value>;

/// Client side of the remote catalog.
///
/// Implemented by [`ChannelTransport`](crate::client::ChannelTransport) and by the
/// test doubles in [`mock`](crate::mock).
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Fetches the abbreviated listing for a search term.
    async fn fetch_listing(&self, term: &str) -> Result<Value, CatalogError>;

    /// Fetches every field of a single record.
    async fn fetch_detail(&self, id: &str) -> Result<Value, CatalogError>;
}

/// Backend that answers transport requests (an HTTP API, a fixture, a cache).
#[async_trait]
pub trait CatalogSource: Send + 'static {
    async fn search(&mut self, term: &str) -> Result<Value, CatalogError>;

    async fn detail(&mut self, id: &str) -> Result<Value, CatalogError>;
}

/// Runtime dependencies injected into every entity and collection of a catalog.
#[derive(Clone)]
pub struct CatalogContext {
    pub transport: Arc<dyn Transport>,
    pub config: Arc<CatalogConfig>,
}

impl CatalogContext {
    pub fn new(transport: impl Transport, config: CatalogConfig) -> Self {
        Self {
            transport: Arc::new(transport),
            config: Arc::new(config),
        }
    }

    /// Fetches and shapes a listing.
    pub async fn listing(&self, term: &str) -> Result<Vec<Record>, CatalogError> {
        let response = self.transport.fetch_listing(term).await?;
        self.config.parse_listing(response)
    }

    /// Fetches and shapes a detail record.
    pub async fn detail(&self, id: &str) -> Result<Record, CatalogError> {
        let response = self.transport.fetch_detail(id).await?;
        self.config.parse_detail(response)
    }
}

impl std::fmt::Debug for CatalogContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
