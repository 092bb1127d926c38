use crate::error::AppError;
use crate::model::MovieRow;
use crate::views::SearchForm;
use catalog_framework::events::lock;
use catalog_framework::{
    CatalogConfig, CatalogContext, CatalogSource, EntityCollection, LoadOutcome, NavigateOptions,
    Navigation, RouteMatch, Router, SearchOutcome, Snapshot, TransportActor, ViewBinder,
};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info};

type PendingSearch = Arc<Mutex<Option<JoinHandle<SearchOutcome>>>>;

/// The movie search application, wired and running.
///
/// `SearchApp` is responsible for:
/// - **Lifecycle Management**: spawning the transport actor and stopping it on shutdown
/// - **Wiring**: form submit → `navigate("search/<term>")` → route handler → collection search
/// - **Views**: the results list and the search form, both bound to one collection
///
/// # Example
///
/// ```ignore
/// let app = SearchApp::new(movie_config(), FixtureCatalog::classics(), MemoryNavigation::new(""))?;
/// app.start().await?;
///
/// app.submit_search("heat").await?;
/// app.load_detail("tt0113277").await?;
/// println!("{:?}", app.snapshot());
///
/// app.shutdown().await?;
/// ```
pub struct SearchApp {
    pub collection: EntityCollection,

    /// Results list, one [`MovieRow`] per member.
    pub results: ViewBinder<MovieRow>,

    pub form: SearchForm,

    pub router: Router,

    /// Search started by the most recent `search` route.
    pending: PendingSearch,

    actor: JoinHandle<()>,
}

impl SearchApp {
    /// Spawns the transport actor for `source` and wires every component.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn new<S: CatalogSource>(
        config: CatalogConfig,
        source: S,
        navigation: impl Navigation,
    ) -> Result<Self, AppError> {
        let (actor, transport) = TransportActor::new(config.transport_buffer, source);
        let actor = tokio::spawn(actor.run());

        let collection = EntityCollection::new(CatalogContext::new(transport, config));
        let results = ViewBinder::new(MovieRow::project);
        results.bind(&collection);
        let form = SearchForm::new(&collection);

        let router = Router::new(navigation);
        router.route("search/:query", "search")?;

        let pending: PendingSearch = Arc::new(Mutex::new(None));
        let (target, slot) = (collection.clone(), pending.clone());
        router.on_route("search", move |matched: &RouteMatch| {
            let Some(query) = matched.param("query") else {
                return;
            };
            let (collection, query) = (target.clone(), query.to_string());
            let task = tokio::spawn(async move { collection.search(&query).await });
            // A superseded search keeps running and resolves as stale.
            *lock(&slot) = Some(task);
        });

        let navigator = router.clone();
        form.on_search(move |term| {
            let path = format!("search/{}", urlencoding::encode(term));
            navigator.navigate(&path, NavigateOptions::trigger());
        });

        info!("Search app wired");
        Ok(Self {
            collection,
            results,
            form,
            router,
            pending,
            actor,
        })
    }

    /// Routes the current location and starts following navigation.
    ///
    /// Returns the outcome of the search the initial location asked for, if any.
    pub async fn start(&self) -> Result<Option<SearchOutcome>, AppError> {
        self.router.start()?;
        self.settle().await
    }

    /// Submits `term` through the search form and waits for the resulting search.
    ///
    /// A blank term is ignored and yields `None`.
    pub async fn submit_search(&self, term: &str) -> Result<Option<SearchOutcome>, AppError> {
        if !self.form.submit(term) {
            return Ok(None);
        }
        self.settle().await
    }

    /// Waits for the search started by the latest `search` route, if one is running.
    pub async fn settle(&self) -> Result<Option<SearchOutcome>, AppError> {
        let task = lock(&self.pending).take();
        match task {
            Some(task) => Ok(Some(task.await?)),
            None => Ok(None),
        }
    }

    /// Loads the full record of one listed movie.
    pub async fn load_detail(&self, id: &str) -> Result<LoadOutcome, AppError> {
        Ok(self.collection.load_detail(id).await?)
    }

    /// Rows currently shown in the results list.
    pub fn snapshot(&self) -> Arc<Snapshot<MovieRow>> {
        self.results.snapshot()
    }

    /// Stops routing, releases the views and waits for the transport actor to drain.
    pub async fn shutdown(self) -> Result<(), AppError> {
        info!("Shutting down search app");
        self.router.stop();
        self.settle().await?;
        self.form.dispose();
        self.results.dispose();

        let Self {
            collection,
            results,
            form,
            router,
            actor,
            ..
        } = self;
        drop(router);
        drop(form);
        drop(results);
        drop(collection);

        if let Err(e) = actor.await {
            error!("Transport actor failed: {:?}", e);
            return Err(e.into());
        }
        info!("Search app shutdown complete.");
        Ok(())
    }
}
