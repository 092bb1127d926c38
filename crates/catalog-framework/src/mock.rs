//! # Mock Transports & Testing Guide
//!
//! Two test doubles for the [`Transport`] contract.
//!
//! | Feature | [`MockTransport`] | [`create_mock_transport`] |
//! |---------|-------------------|---------------------------|
//! | **Style** | Scripted expectations | Manual request/response |
//! | **Resolution order** | Immediate (or fixed latency) | Whenever the test replies |
//! | **Use Case** | Happy paths, error injection | Races: coalescing, stale responses |
//!
//! ## Scripted
//!
//! ```rust
//! use catalog_framework::mock::MockTransport;
//! use catalog_framework::{CatalogConfig, CatalogContext, EntityCollection};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut mock = MockTransport::new();
//!     mock.expect_listing("dune").return_ok(json!([{"id": "d1", "title": "Dune"}]));
//!
//!     let collection = EntityCollection::new(CatalogContext::new(mock.clone(), CatalogConfig::default()));
//!     collection.search("dune").await;
//!
//!     assert_eq!(collection.len(), 1);
//!     mock.verify();
//! }
//! ```
//!
//! ## Manual
//!
//! The test receives each [`TransportRequest`] and decides when to answer it,
//! which makes it possible to resolve two searches out of order.
//!
//! ```rust,ignore
//! let (transport, mut requests) = create_mock_transport(8);
//! let task = tokio::spawn(async move { collection.search("a").await });
//! let (term, responder) = expect_listing(&mut requests).await.unwrap();
//! responder.send(Ok(json!([]))).unwrap();
//! ```

use crate::client::ChannelTransport;
use crate::error::CatalogError;
use crate::events::lock;
use crate::message::{Response, TransportRequest};
use crate::transport::Transport;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

enum Expectation {
    Listing {
        term: String,
        response: Result<Value, CatalogError>,
    },
    Detail {
        id: String,
        response: Result<Value, CatalogError>,
    },
}

/// A scripted transport that answers requests from a queue of expectations.
///
/// Expectations are consumed in order; a request that does not match the next
/// expectation panics, failing the test.
///
/// ```ignore
/// let mut mock = MockTransport::new();
/// mock.expect_listing("hobbit").return_ok(json!({"Search": []}));
/// mock.expect_detail("tt1").return_err(CatalogError::Transport("503".into()));
/// // hand `mock.clone()` to a CatalogContext, run the code under test...
/// mock.verify();
/// ```
#[derive(Clone, Default)]
pub struct MockTransport {
    expectations: Arc<Mutex<VecDeque<Expectation>>>,
    listing_calls: Arc<Mutex<Vec<String>>>,
    detail_calls: Arc<Mutex<Vec<String>>>,
    latency: Option<Duration>,
}

impl MockTransport {
    /// Creates a new mock transport with no expectations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every answer, so callers observe the request as in flight.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Expects a listing fetch for `term`.
    pub fn expect_listing(&mut self, term: impl Into<String>) -> ListingExpectationBuilder {
        ListingExpectationBuilder {
            term: term.into(),
            expectations: self.expectations.clone(),
        }
    }

    /// Expects a detail fetch for `id`.
    pub fn expect_detail(&mut self, id: impl Into<String>) -> DetailExpectationBuilder {
        DetailExpectationBuilder {
            id: id.into(),
            expectations: self.expectations.clone(),
        }
    }

    pub fn listing_calls(&self) -> usize {
        lock(&self.listing_calls).len()
    }

    pub fn detail_calls(&self) -> usize {
        lock(&self.detail_calls).len()
    }

    /// Terms of every listing fetch received, in order.
    pub fn searched_terms(&self) -> Vec<String> {
        lock(&self.listing_calls).clone()
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        let remaining = lock(&self.expectations).len();
        if remaining != 0 {
            panic!("Not all expectations were met. {remaining} remaining");
        }
    }

    async fn settle(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn fetch_listing(&self, term: &str) -> Result<Value, CatalogError> {
        lock(&self.listing_calls).push(term.to_string());
        let expectation = lock(&self.expectations).pop_front();
        let response = match expectation {
            Some(Expectation::Listing { term: expected, response }) if expected == term => response,
            _ => panic!("Unexpected listing request for `{term}`"),
        };
        self.settle().await;
        response
    }

    async fn fetch_detail(&self, id: &str) -> Result<Value, CatalogError> {
        lock(&self.detail_calls).push(id.to_string());
        let expectation = lock(&self.expectations).pop_front();
        let response = match expectation {
            Some(Expectation::Detail { id: expected, response }) if expected == id => response,
            _ => panic!("Unexpected detail request for `{id}`"),
        };
        self.settle().await;
        response
    }
}

/// Builder for listing expectations.
pub struct ListingExpectationBuilder {
    term: String,
    expectations: Arc<Mutex<VecDeque<Expectation>>>,
}

impl ListingExpectationBuilder {
    /// Sets the expectation to return a successful result.
    pub fn return_ok(self, response: Value) {
        lock(&self.expectations).push_back(Expectation::Listing {
            term: self.term,
            response: Ok(response),
        });
    }

    /// Sets the expectation to return an error.
    pub fn return_err(self, error: CatalogError) {
        lock(&self.expectations).push_back(Expectation::Listing {
            term: self.term,
            response: Err(error),
        });
    }
}

/// Builder for detail expectations.
pub struct DetailExpectationBuilder {
    id: String,
    expectations: Arc<Mutex<VecDeque<Expectation>>>,
}

impl DetailExpectationBuilder {
    /// Sets the expectation to return a successful result.
    pub fn return_ok(self, response: Value) {
        lock(&self.expectations).push_back(Expectation::Detail {
            id: self.id,
            response: Ok(response),
        });
    }

    /// Sets the expectation to return an error.
    pub fn return_err(self, error: CatalogError) {
        lock(&self.expectations).push_back(Expectation::Detail {
            id: self.id,
            response: Err(error),
        });
    }
}

// =============================================================================
// CHANNEL HELPERS
// =============================================================================

/// Creates a transport whose requests arrive on a receiver the test controls.
///
/// Nothing answers automatically: every request stays in flight until the test
/// sends on its responder, which is what races need.
pub fn create_mock_transport(buffer_size: usize) -> (ChannelTransport, mpsc::Receiver<TransportRequest>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (ChannelTransport::new(sender), receiver)
}

/// Helper to verify that the next message is a Listing request
pub async fn expect_listing(
    receiver: &mut mpsc::Receiver<TransportRequest>,
) -> Option<(String, Response<Value>)> {
    match receiver.recv().await {
        Some(TransportRequest::Listing { term, respond_to }) => Some((term, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Detail request
pub async fn expect_detail(
    receiver: &mut mpsc::Receiver<TransportRequest>,
) -> Option<(String, Response<Value>)> {
    match receiver.recv().await {
        Some(TransportRequest::Detail { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}
