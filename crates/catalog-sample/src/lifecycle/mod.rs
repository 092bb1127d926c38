//! # Application Lifecycle & Wiring
//!
//! Individual pieces of the framework are small; the application is mostly the
//! wiring between them. This module owns that wiring.
//!
//! ## The Flow of a Search
//!
//! 1. **Form** - [`SearchForm::submit`](crate::views::SearchForm::submit) publishes `search`
//! 2. **Route** - the app navigates to `search/<percent-encoded term>` with `trigger`
//! 3. **Handler** - the `search` route spawns [`EntityCollection::search`](catalog_framework::EntityCollection::search)
//! 4. **Transport** - the collection's fetch travels through the [`TransportActor`](catalog_framework::TransportActor)
//!    to the catalog source
//! 5. **Views** - `sync` re-renders the results list and resets the form's value
//!
//! Back and forward enter at step 3: the router follows the navigation source and
//! fires the same handler, so the visible results always match the location.
//!
//! ## Loading Details
//!
//! [`SearchApp::load_detail`] goes straight to the cache. The entity's `change`
//! bubbles through the collection, and the results list re-renders that single row.
//!
//! ## Graceful Shutdown
//!
//! 1. **Stop routing** - the navigation observer task is aborted
//! 2. **Settle** - the last search is awaited
//! 3. **Release views** - every subscription on the collection is dropped
//! 4. **Drop the cache** - this drops the last transport handle, the actor's
//!    receive loop ends and its task is awaited
//!
//! ## Configuration
//!
//! [`config_from_env`] reads an optional `CATALOG_CONFIG` JSON document; without it
//! the movie defaults from [`movie_config`] apply.

pub mod search_app;

pub use search_app::*;

use crate::error::AppError;
use catalog_framework::CatalogConfig;

/// Environment variable holding a JSON [`CatalogConfig`].
pub const CONFIG_ENV: &str = "CATALOG_CONFIG";

/// Records are keyed by `imdbID`; listings nest them under `Search`.
pub fn movie_config() -> CatalogConfig {
    CatalogConfig::new("imdbID").with_listing_field("Search")
}

/// Reads [`CONFIG_ENV`], falling back to [`movie_config`] when it is unset.
pub fn config_from_env() -> Result<CatalogConfig, AppError> {
    match std::env::var(CONFIG_ENV) {
        Ok(raw) => CatalogConfig::from_json(&raw).map_err(|e| AppError::Config(e.to_string())),
        Err(_) => Ok(movie_config()),
    }
}
