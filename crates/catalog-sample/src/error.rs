//! Error types for the movie search application.

use catalog_framework::CatalogError;
use thiserror::Error;

/// Errors surfaced by [`SearchApp`](crate::lifecycle::SearchApp).
#[derive(Debug, Error)]
pub enum AppError {
    /// A cache, transport or routing failure.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// `CATALOG_CONFIG` was set but could not be read as a configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A background task panicked or was cancelled.
    #[error("Task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
