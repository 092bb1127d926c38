//! # Observability & Tracing
//!
//! The [`setup_tracing`] function initializes structured logging for the whole cache.
//!
//! ## What Gets Traced
//!
//! - **Transport actor lifecycle**: startup, shutdown and the number of requests served
//! - **Fetches**: one span per listing search and per detail load
//! - **Synchronization**: `sync` with the member count, stale responses that were dropped
//! - **Routing**: registered patterns, matched handlers, fragments nobody handles
//! - **Failures**: transport and parse errors, with the entity id or search term
//!
//! ## Usage Examples
//!
//! ```bash
//! # Lifecycle only
//! RUST_LOG=info cargo run
//!
//! # Every fetch, merge and route
//! RUST_LOG=debug cargo run
//!
//! # Include renders and ignored navigation notifications
//! RUST_LOG=trace cargo run
//!
//! # Only the collection
//! RUST_LOG=catalog_framework::collection=debug cargo run
//! ```
//!
//! With `RUST_LOG=debug` a search for `heat` reads:
//!
//! ```text
//! DEBUG search{term="heat"}:fetch_listing{term="heat"}: Sending request
//! DEBUG Listing source_type="FixtureCatalog" term="heat"
//! INFO search{term="heat"}: Search loaded count=2
//! DEBUG Routed fragment="search/heat" handler=search
//! ```

/// Installs a compact `fmt` subscriber filtered by `RUST_LOG`.
///
/// Call once, at the start of `main`.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
