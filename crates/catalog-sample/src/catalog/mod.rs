//! # Catalog Sources
//!
//! Backends served by a [`TransportActor`](catalog_framework::TransportActor).

pub mod fixture;

pub use fixture::FixtureCatalog;
