//! # Movie Search Demo
//!
//! Drives the sample application the way a user would.
//!
//! ## Core Components
//!
//! - **[catalog]**: [`FixtureCatalog`], an in-memory catalog shaped like the remote movie API.
//! - **[model]**: [`MovieRow`](catalog_sample::model::MovieRow), the projection shown in the results list.
//! - **[views]**: the search form.
//! - **[lifecycle]**: [`SearchApp`], which wires transport, cache, views and router.
//!
//! ## Quick Start
//!
//! ```bash
//! RUST_LOG=info cargo run -p catalog-sample
//! RUST_LOG=debug cargo run -p catalog-sample
//! ```

use catalog_framework::events::lock;
use catalog_framework::tracing::setup_tracing;
use catalog_framework::MemoryNavigation;
use catalog_sample::catalog::FixtureCatalog;
use catalog_sample::error::AppError;
use catalog_sample::lifecycle::{config_from_env, SearchApp};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{info, warn, Instrument};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    setup_tracing();

    info!("Starting movie search demo");

    let config = config_from_env()?;
    let navigation = MemoryNavigation::new("");
    let source = FixtureCatalog::classics().with_latency(Duration::from_millis(20));
    let app = SearchApp::new(config, source, navigation.clone())?;
    app.start().await?;

    // Search from the form
    let span = tracing::info_span!("search");
    async {
        app.submit_search("lord of the rings").await?;
        for row in &app.snapshot().rows {
            info!(id = %row.id, title = ?row.data.title, year = ?row.data.year, "Result");
        }
        Ok::<_, AppError>(())
    }
    .instrument(span)
    .await?;

    // Expand one row
    let span = tracing::info_span!("detail");
    async {
        let first = app.collection.ids().into_iter().next();
        match first {
            Some(id) => {
                let outcome = app.load_detail(&id).await?;
                let snapshot = app.snapshot();
                if let Some(row) = snapshot.rows.iter().find(|r| r.id == id) {
                    info!(?outcome, cast = ?row.data.cast, "Detail loaded");
                }
            }
            None => warn!("No results to expand"),
        }
        Ok::<_, AppError>(())
    }
    .instrument(span)
    .await?;

    // A second search, then back
    app.submit_search("heat").await?;
    info!(term = ?app.collection.query_term(), rows = app.snapshot().rows.len(), "Searched again");

    let (routed, on_routed) = oneshot::channel();
    let routed = Mutex::new(Some(routed));
    app.router.events().once("route", move |_| {
        if let Some(routed) = lock(&routed).take() {
            let _ = routed.send(());
        }
    });
    navigation.back();
    if on_routed.await.is_ok() {
        app.settle().await?;
    }
    info!(
        term = ?app.collection.query_term(),
        form = %app.form.value(),
        "Went back"
    );

    app.shutdown().await?;

    info!("Demo completed successfully");
    Ok(())
}
