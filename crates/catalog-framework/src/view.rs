//! # View Binder
//!
//! Keeps a presentation snapshot in step with an [`EntityCollection`] without ever
//! mutating it.
//!
//! - `sync`, `add` and `remove` on the collection re-derive the whole snapshot.
//! - `change` re-projects only the row of the member that changed.
//!
//! Rows are produced by a caller-supplied projection, so the binder knows nothing
//! about the record's fields beyond the id and the materialization flag.
//! Every subscription is made under the binder's own [`Listener`], and
//! [`ViewBinder::dispose`] releases all of them at once; no callback reaches a
//! disposed binder.

use crate::collection::{CollectionEvent, EntityCollection};
use crate::entity::Entity;
use crate::events::{lock, Event, EventBus, Listener};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tracing::{debug, trace};

/// One projected row.
#[derive(Debug, Clone, PartialEq)]
pub struct Row<R> {
    pub id: String,
    pub full: bool,
    pub data: R,
}

/// Immutable result of a render.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<R> {
    pub query_term: Option<String>,
    pub rows: Vec<Row<R>>,
}

impl<R> Default for Snapshot<R> {
    fn default() -> Self {
        Self {
            query_term: None,
            rows: Vec::new(),
        }
    }
}

/// Published by the binder after it re-derived something.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent<R> {
    Render(Arc<Snapshot<R>>),
    RowUpdate { index: usize, row: Row<R> },
}

impl<R: Send + Sync + 'static> Event for ViewEvent<R> {
    fn name(&self) -> &str {
        match self {
            ViewEvent::Render(_) => "render",
            ViewEvent::RowUpdate { .. } => "row",
        }
    }
}

type Projection<R> = Arc<dyn Fn(&Entity) -> R + Send + Sync>;

struct BinderInner<R> {
    projection: Projection<R>,
    listener: Listener,
    collection: Mutex<Option<EntityCollection>>,
    snapshot: Mutex<Arc<Snapshot<R>>>,
    events: EventBus<ViewEvent<R>>,
    renders: AtomicU64,
    row_updates: AtomicU64,
    disposed: AtomicBool,
}

impl<R> Drop for BinderInner<R> {
    fn drop(&mut self) {
        self.listener.stop_listening();
    }
}

impl<R: Clone + Send + Sync + 'static> BinderInner<R> {
    fn project(&self, entity: &Entity) -> Row<R> {
        Row {
            id: entity.id().to_string(),
            full: entity.is_full(),
            data: (self.projection)(entity),
        }
    }

    fn derive(&self) -> Snapshot<R> {
        let collection = lock(&self.collection).clone();
        match collection {
            Some(collection) => Snapshot {
                query_term: collection.query_term(),
                rows: collection.map(|entity| self.project(entity)),
            },
            None => Snapshot::default(),
        }
    }

    fn render(&self) -> Arc<Snapshot<R>> {
        if self.disposed.load(Ordering::SeqCst) {
            return lock(&self.snapshot).clone();
        }
        let snapshot = Arc::new(self.derive());
        *lock(&self.snapshot) = snapshot.clone();
        let renders = self.renders.fetch_add(1, Ordering::SeqCst) + 1;
        trace!(renders, rows = snapshot.rows.len(), "Render");
        self.events.emit(&ViewEvent::Render(snapshot.clone()));
        snapshot
    }

    fn render_row(&self, id: &str) {
        if self.disposed.load(Ordering::SeqCst) {
            return;
        }
        let Some(entity) = lock(&self.collection).as_ref().and_then(|c| c.get(id)) else {
            return;
        };
        let row = self.project(&entity);

        let index = {
            let mut current = lock(&self.snapshot);
            let Some(index) = current.rows.iter().position(|r| r.id == id) else {
                debug!(%id, "Changed member is not rendered yet");
                return;
            };
            let mut next = Snapshot::clone(&current);
            next.rows[index] = row.clone();
            *current = Arc::new(next);
            index
        };
        self.row_updates.fetch_add(1, Ordering::SeqCst);
        trace!(%id, index, "Row update");
        self.events.emit(&ViewEvent::RowUpdate { index, row });
    }
}

/// Derives presentation rows of type `R` from a bound collection.
pub struct ViewBinder<R> {
    inner: Arc<BinderInner<R>>,
}

impl<R> Clone for ViewBinder<R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<R: Clone + Send + Sync + 'static> ViewBinder<R> {
    pub fn new(projection: impl Fn(&Entity) -> R + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(BinderInner {
                projection: Arc::new(projection),
                listener: Listener::new(),
                collection: Mutex::new(None),
                snapshot: Mutex::new(Arc::new(Snapshot::default())),
                events: EventBus::new(),
                renders: AtomicU64::new(0),
                row_updates: AtomicU64::new(0),
                disposed: AtomicBool::new(false),
            }),
        }
    }

    /// Observes `collection`, replacing any earlier binding.
    pub fn bind(&self, collection: &EntityCollection) {
        self.inner.listener.stop_listening();
        *lock(&self.inner.collection) = Some(collection.clone());
        self.inner.disposed.store(false, Ordering::SeqCst);

        for name in ["sync", "add", "remove"] {
            let weak = Arc::downgrade(&self.inner);
            self.inner
                .listener
                .listen_to(collection.events(), name, move |_: &CollectionEvent| {
                    if let Some(inner) = weak.upgrade() {
                        inner.render();
                    }
                });
        }

        let weak: Weak<BinderInner<R>> = Arc::downgrade(&self.inner);
        self.inner
            .listener
            .listen_to(collection.events(), "change", move |event: &CollectionEvent| {
                if let (Some(inner), CollectionEvent::Change { id, .. }) = (weak.upgrade(), event) {
                    inner.render_row(id);
                }
            });
        debug!("Bound");
    }

    /// Re-derives the snapshot from the bound collection and publishes it.
    ///
    /// The same cache state always yields an equal snapshot. Once disposed the
    /// binder stops deriving and returns its last snapshot.
    pub fn render(&self) -> Arc<Snapshot<R>> {
        self.inner.render()
    }

    /// Last rendered snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot<R>> {
        lock(&self.inner.snapshot).clone()
    }

    /// Releases every subscription; no callback runs into this binder afterwards.
    pub fn dispose(&self) {
        self.inner.disposed.store(true, Ordering::SeqCst);
        self.inner.listener.stop_listening();
        *lock(&self.inner.collection) = None;
        debug!("Disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    pub fn events(&self) -> &EventBus<ViewEvent<R>> {
        &self.inner.events
    }

    /// Number of full renders so far.
    pub fn render_count(&self) -> u64 {
        self.inner.renders.load(Ordering::SeqCst)
    }

    /// Number of single-row re-renders so far.
    pub fn row_update_count(&self) -> u64 {
        self.inner.row_updates.load(Ordering::SeqCst)
    }
}
