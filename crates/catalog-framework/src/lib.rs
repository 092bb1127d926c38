//! # Catalog Framework
//!
//! A client-side reactive cache for a remote, searchable catalog. Records fetched
//! from the catalog live in observable entities, searches keep an ordered
//! collection of them, views re-derive from that collection, and the current
//! location fragment is mapped to named handlers.
//!
//! ## Architecture Overview
//!
//! 1. **Transport Layer** ([`Transport`], [`TransportActor`], [`ChannelTransport`]): fetching raw
//!    JSON. A [`CatalogSource`] runs inside an actor; callers hold a cloneable channel handle.
//! 2. **Cache Layer** ([`Entity`], [`EntityCollection`]): identity, materialization,
//!    coalescing of detail fetches, stale-response protection for searches.
//! 3. **Presentation Layer** ([`ViewBinder`], [`Router`]): snapshots derived from the cache,
//!    and the location fragment kept in step with what is shown.
//!
//! Everything is wired by [`EventBus`]: synchronous, ordered, named notifications.
//!
//! ## Example
//!
//! ```rust
//! use catalog_framework::mock::MockTransport;
//! use catalog_framework::{CatalogConfig, CatalogContext, EntityCollection, ViewBinder};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut mock = MockTransport::new();
//!     mock.expect_listing("heat")
//!         .return_ok(json!({"Search": [{"imdbID": "tt0113277", "Title": "Heat"}]}));
//!
//!     let config = CatalogConfig::new("imdbID").with_listing_field("Search");
//!     let collection = EntityCollection::new(CatalogContext::new(mock, config));
//!     let view = ViewBinder::new(|movie| movie.get("Title"));
//!     view.bind(&collection);
//!
//!     collection.search("heat").await;
//!
//!     assert_eq!(view.snapshot().rows[0].data, Some(json!("Heat")));
//! }
//! ```
//!
//! ## Concurrency Model
//!
//! - Cache state sits behind short-lived mutexes; no lock is held across an `.await`
//!   or while subscribers run.
//! - Event delivery is synchronous on the emitting task, in registration order.
//! - At most one detail fetch per entity is in flight; concurrent loads share its result.
//! - Each search supersedes the previous one; late responses are dropped.
//!
//! ## Testing
//!
//! See the [`mock`] module for a scripted transport and a channel transport the
//! test answers by hand.

pub mod actor;
pub mod client;
pub mod collection;
pub mod config;
pub mod entity;
pub mod error;
pub mod events;
pub mod message;
pub mod mock;
pub mod router;
pub mod tracing;
pub mod transport;
pub mod view;

// Re-export core types for convenience
pub use actor::TransportActor;
pub use client::ChannelTransport;
pub use collection::{CollectionEvent, EntityCollection, SearchOutcome, SyncState};
pub use config::CatalogConfig;
pub use entity::{Entity, EntityEvent, FetchState, LoadOutcome, Materialization};
pub use error::CatalogError;
pub use events::{Event, EventBus, Listener, SubscriptionHandle};
pub use message::{Response, TransportRequest};
pub use router::{MemoryNavigation, NavigateOptions, Navigation, RouteMatch, Router, RouterState};
pub use transport::{CatalogContext, CatalogSource, Record, Transport};
pub use view::{Row, Snapshot, ViewBinder, ViewEvent};
