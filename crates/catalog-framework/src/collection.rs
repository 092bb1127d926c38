//! # Entity Collection
//!
//! An ordered, id-unique set of [`Entity`] values bound to a search term.
//!
//! ## Search
//!
//! [`EntityCollection::search`] replaces the whole item list with the listing for
//! a term. The replacement happens under one lock and `sync` is emitted only after
//! it, so subscribers never see a half-replaced collection. A failed search keeps
//! the previous items and moves the collection to [`SyncState::Error`].
//!
//! Every search takes a generation number. A response that arrives after a newer
//! search started is discarded ([`SearchOutcome::Stale`]), whatever its content.
//!
//! ## Reuse
//!
//! An incoming row whose id is already cached keeps the existing entity and only
//! refreshes its listing fields, so detail data loaded earlier survives a repeated
//! or overlapping search.
//!
//! ## Bubbling
//!
//! The collection listens to `change` and `error` on every member and re-emits
//! them on its own bus, tagged with the member id. Members that leave the
//! collection are unsubscribed.

use crate::entity::{Entity, EntityEvent, LoadOutcome, Materialization};
use crate::error::CatalogError;
use crate::events::{lock, Event, EventBus, Listener};
use crate::transport::{CatalogContext, Record};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncState {
    Idle,
    Loading,
    Loaded,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The listing replaced the items; carries the new item count.
    Loaded(usize),
    /// A newer search was issued before this one resolved.
    Stale,
    /// The listing failed; previous items were kept.
    Failed(CatalogError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CollectionEvent {
    Request {
        term: String,
    },
    Sync {
        term: String,
        count: usize,
    },
    Change {
        id: String,
        changed: Vec<String>,
        version: u64,
    },
    /// `id` is set when a member failed, `term` when a search failed.
    Error {
        id: Option<String>,
        term: Option<String>,
        error: CatalogError,
    },
    Add {
        id: String,
    },
    Remove {
        id: String,
    },
}

impl Event for CollectionEvent {
    fn name(&self) -> &str {
        match self {
            CollectionEvent::Request { .. } => "request",
            CollectionEvent::Sync { .. } => "sync",
            CollectionEvent::Change { .. } => "change",
            CollectionEvent::Error { .. } => "error",
            CollectionEvent::Add { .. } => "add",
            CollectionEvent::Remove { .. } => "remove",
        }
    }
}

struct CollectionState {
    items: Vec<Arc<Entity>>,
    index: HashMap<String, Arc<Entity>>,
    query_term: Option<String>,
    sync_state: SyncState,
    generation: u64,
}

struct CollectionInner {
    state: Mutex<CollectionState>,
    events: EventBus<CollectionEvent>,
    listener: Listener,
    context: CatalogContext,
}

impl Drop for CollectionInner {
    fn drop(&mut self) {
        self.listener.stop_listening();
    }
}

/// Cheaply cloneable handle; clones share the same items and event bus.
#[derive(Clone)]
pub struct EntityCollection {
    inner: Arc<CollectionInner>,
}

impl EntityCollection {
    pub fn new(context: CatalogContext) -> Self {
        Self {
            inner: Arc::new(CollectionInner {
                state: Mutex::new(CollectionState {
                    items: Vec::new(),
                    index: HashMap::new(),
                    query_term: None,
                    sync_state: SyncState::Idle,
                    generation: 0,
                }),
                events: EventBus::new(),
                listener: Listener::new(),
                context,
            }),
        }
    }

    pub fn events(&self) -> &EventBus<CollectionEvent> {
        &self.inner.events
    }

    pub fn context(&self) -> &CatalogContext {
        &self.inner.context
    }

    /// Last term passed to [`search`](Self::search); `None` before any search.
    pub fn query_term(&self) -> Option<String> {
        lock(&self.inner.state).query_term.clone()
    }

    pub fn sync_state(&self) -> SyncState {
        lock(&self.inner.state).sync_state
    }

    pub fn len(&self) -> usize {
        lock(&self.inner.state).items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// O(1) lookup by id.
    pub fn get(&self, id: &str) -> Option<Arc<Entity>> {
        lock(&self.inner.state).index.get(id).cloned()
    }

    /// Snapshot of the members in display order.
    pub fn entities(&self) -> Vec<Arc<Entity>> {
        lock(&self.inner.state).items.clone()
    }

    pub fn ids(&self) -> Vec<String> {
        self.map(|e| e.id().to_string())
    }

    /// Projects every member, in order. The collection is not locked while `f`
    /// runs, so `f` may read entities freely.
    pub fn map<R>(&self, mut f: impl FnMut(&Entity) -> R) -> Vec<R> {
        self.entities().iter().map(|e| f(e.as_ref())).collect()
    }

    /// Replaces the items with the listing for `term`.
    #[instrument(skip(self))]
    pub async fn search(&self, term: &str) -> SearchOutcome {
        let generation = {
            let mut state = lock(&self.inner.state);
            state.generation += 1;
            state.query_term = Some(term.to_string());
            state.sync_state = SyncState::Loading;
            state.generation
        };
        self.inner.events.emit(&CollectionEvent::Request {
            term: term.to_string(),
        });

        let rows = self
            .inner
            .context
            .listing(term)
            .await
            .and_then(|records| self.keyed(records));

        let result = {
            let mut state = lock(&self.inner.state);
            if state.generation != generation {
                debug!(generation, current = state.generation, "Discarding stale listing");
                return SearchOutcome::Stale;
            }
            let result = rows.and_then(|rows| self.replace(&mut state, rows));
            state.sync_state = match result {
                Ok(_) => SyncState::Loaded,
                Err(_) => SyncState::Error,
            };
            result
        };

        match result {
            Ok(count) => {
                info!(count, "Search loaded");
                self.inner.events.emit(&CollectionEvent::Sync {
                    term: term.to_string(),
                    count,
                });
                SearchOutcome::Loaded(count)
            }
            Err(error) => {
                warn!(error = %error, "Search failed, keeping previous items");
                self.inner.events.emit(&CollectionEvent::Error {
                    id: None,
                    term: Some(term.to_string()),
                    error: error.clone(),
                });
                SearchOutcome::Failed(error)
            }
        }
    }

    /// Loads the full record of one member.
    pub async fn load_detail(&self, id: &str) -> Result<LoadOutcome, CatalogError> {
        let entity = self
            .get(id)
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;
        Ok(entity.load_full().await)
    }

    /// Adds one record, or merges it into the member that already has its id.
    pub fn add(&self, record: Record, level: Materialization) -> Result<Arc<Entity>, CatalogError> {
        let id = self.inner.context.config.extract_id(&record)?;
        let mut state = lock(&self.inner.state);
        if let Some(existing) = state.index.get(&id).cloned() {
            // Merging emits `change`; release the lock first.
            drop(state);
            existing.merge(record, level);
            return Ok(existing);
        }

        let entity = Arc::new(Entity::from_record(record, level, self.inner.context.clone())?);
        self.bubble(&entity);
        state.items.push(entity.clone());
        state.index.insert(id.clone(), entity.clone());
        drop(state);
        debug!(%id, "Added");
        self.inner.events.emit(&CollectionEvent::Add { id });
        Ok(entity)
    }

    /// Removes a member and stops relaying its events.
    pub fn remove(&self, id: &str) -> Option<Arc<Entity>> {
        let removed = {
            let mut state = lock(&self.inner.state);
            let removed = state.index.remove(id)?;
            state.items.retain(|e| e.id() != id);
            removed
        };
        self.inner.listener.stop_listening_to(removed.events());
        debug!(%id, "Removed");
        self.inner.events.emit(&CollectionEvent::Remove { id: id.to_string() });
        Some(removed)
    }

    /// Pairs records with their ids, collapsing repeated ids into the first row.
    fn keyed(&self, records: Vec<Record>) -> Result<Vec<(String, Record)>, CatalogError> {
        let mut rows: Vec<(String, Record)> = Vec::with_capacity(records.len());
        let mut positions: HashMap<String, usize> = HashMap::new();
        for record in records {
            let id = self.inner.context.config.extract_id(&record)?;
            match positions.get(&id) {
                Some(&at) => rows[at].1.extend(record),
                None => {
                    positions.insert(id.clone(), rows.len());
                    rows.push((id, record));
                }
            }
        }
        Ok(rows)
    }

    /// Swaps in the new item list. Fails before touching any state.
    fn replace(
        &self,
        state: &mut CollectionState,
        rows: Vec<(String, Record)>,
    ) -> Result<usize, CatalogError> {
        let mut planned: Vec<(Arc<Entity>, Option<Record>)> = Vec::with_capacity(rows.len());
        for (id, record) in rows {
            match state.index.get(&id) {
                Some(existing) => planned.push((existing.clone(), Some(record))),
                None => {
                    let entity =
                        Entity::from_record(record, Materialization::Stub, self.inner.context.clone())?;
                    planned.push((Arc::new(entity), None));
                }
            }
        }

        let mut items = Vec::with_capacity(planned.len());
        let mut index = HashMap::with_capacity(planned.len());
        for (entity, refresh) in planned {
            match refresh {
                Some(record) => {
                    entity.merge_silent(record, Materialization::Stub);
                    state.index.remove(entity.id());
                }
                None => self.bubble(&entity),
            }
            index.insert(entity.id().to_string(), entity.clone());
            items.push(entity);
        }

        for evicted in state.index.values() {
            self.inner.listener.stop_listening_to(evicted.events());
        }
        state.items = items;
        state.index = index;
        Ok(state.items.len())
    }

    fn bubble(&self, entity: &Entity) {
        let bus = self.inner.events.downgrade();
        self.inner
            .listener
            .listen_to(entity.events(), "change", move |event: &EntityEvent| {
                if let (Some(bus), EntityEvent::Change { id, changed, version }) = (bus.upgrade(), event) {
                    bus.emit(&CollectionEvent::Change {
                        id: id.clone(),
                        changed: changed.clone(),
                        version: *version,
                    });
                }
            });

        let bus = self.inner.events.downgrade();
        self.inner
            .listener
            .listen_to(entity.events(), "error", move |event: &EntityEvent| {
                if let (Some(bus), EntityEvent::Error { id, error }) = (bus.upgrade(), event) {
                    bus.emit(&CollectionEvent::Error {
                        id: Some(id.clone()),
                        term: None,
                        error: error.clone(),
                    });
                }
            });
    }
}

impl std::fmt::Debug for EntityCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = lock(&self.inner.state);
        f.debug_struct("EntityCollection")
            .field("query_term", &state.query_term)
            .field("sync_state", &state.sync_state)
            .field("len", &state.items.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CatalogConfig;
    use crate::mock::{create_mock_transport, expect_detail, expect_listing, MockTransport};
    use serde_json::{json, Value};

    fn config() -> CatalogConfig {
        CatalogConfig::new("imdbID").with_listing_field("Search")
    }

    fn hobbit_listing() -> Value {
        json!({
            "Search": [
                {"imdbID": "tt0903624", "Title": "The Hobbit: An Unexpected Journey", "Year": "2012"},
                {"imdbID": "tt1170358", "Title": "The Hobbit: The Desolation of Smaug", "Year": "2013"},
                {"imdbID": "tt2310332", "Title": "The Hobbit: The Battle of the Five Armies", "Year": "2014"}
            ],
            "totalResults": "3",
            "Response": "True"
        })
    }

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    fn recorded(collection: &EntityCollection, name: &str) -> Arc<Mutex<Vec<CollectionEvent>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        collection.events().on(name, move |e: &CollectionEvent| s.lock().unwrap().push(e.clone()));
        seen
    }

    #[tokio::test]
    async fn test_search_populates_in_response_order() {
        let mut mock = MockTransport::new();
        mock.expect_listing("hobbit").return_ok(hobbit_listing());
        let collection = EntityCollection::new(CatalogContext::new(mock.clone(), config()));
        let syncs = recorded(&collection, "sync");

        let outcome = collection.search("hobbit").await;

        assert_eq!(outcome, SearchOutcome::Loaded(3));
        assert_eq!(collection.len(), 3);
        assert_eq!(collection.sync_state(), SyncState::Loaded);
        assert_eq!(collection.query_term().as_deref(), Some("hobbit"));
        assert_eq!(collection.ids(), vec!["tt0903624", "tt1170358", "tt2310332"]);
        let smaug = collection.get("tt1170358").expect("member");
        assert_eq!(smaug.get("Title"), Some(json!("The Hobbit: The Desolation of Smaug")));
        assert!(!smaug.is_full());
        assert_eq!(
            *syncs.lock().unwrap(),
            vec![CollectionEvent::Sync { term: "hobbit".into(), count: 3 }]
        );
        mock.verify();
    }

    #[tokio::test]
    async fn test_search_replaces_previous_items() {
        let mut mock = MockTransport::new();
        mock.expect_listing("hobbit").return_ok(hobbit_listing());
        mock.expect_listing("alien")
            .return_ok(json!({"Search": [{"imdbID": "tt0078748", "Title": "Alien"}]}));
        let collection = EntityCollection::new(CatalogContext::new(mock, config()));

        collection.search("hobbit").await;
        let evicted = collection.get("tt0903624").unwrap();
        collection.search("alien").await;

        assert_eq!(collection.ids(), vec!["tt0078748"]);
        assert!(collection.get("tt0903624").is_none());
        assert_eq!(evicted.events().listener_count("change"), 0);
        assert_eq!(evicted.events().listener_count("error"), 0);
    }

    #[tokio::test]
    async fn test_failed_search_keeps_last_good_items() {
        let mut mock = MockTransport::new();
        mock.expect_listing("hobbit").return_ok(hobbit_listing());
        mock.expect_listing("dune")
            .return_err(CatalogError::Transport("503".into()));
        let collection = EntityCollection::new(CatalogContext::new(mock, config()));
        let errors = recorded(&collection, "error");

        collection.search("hobbit").await;
        let outcome = collection.search("dune").await;

        assert_eq!(outcome, SearchOutcome::Failed(CatalogError::Transport("503".into())));
        assert_eq!(collection.sync_state(), SyncState::Error);
        assert_eq!(collection.len(), 3);
        assert_eq!(collection.query_term().as_deref(), Some("dune"));
        assert_eq!(
            *errors.lock().unwrap(),
            vec![CollectionEvent::Error {
                id: None,
                term: Some("dune".into()),
                error: CatalogError::Transport("503".into()),
            }]
        );
    }

    #[tokio::test]
    async fn test_malformed_listing_keeps_items() {
        let mut mock = MockTransport::new();
        mock.expect_listing("hobbit").return_ok(hobbit_listing());
        mock.expect_listing("broken")
            .return_ok(json!({"Search": [{"imdbID": "tt1"}, {"Title": "no id"}]}));
        let collection = EntityCollection::new(CatalogContext::new(mock, config()));

        collection.search("hobbit").await;
        let outcome = collection.search("broken").await;

        assert!(matches!(outcome, SearchOutcome::Failed(CatalogError::Parse(_))));
        assert_eq!(collection.len(), 3);
        assert!(collection.get("tt1").is_none());
    }

    #[tokio::test]
    async fn test_stale_listing_is_discarded() {
        let (transport, mut requests) = create_mock_transport(8);
        let collection = EntityCollection::new(CatalogContext::new(transport, config()));

        let first = tokio::spawn({
            let c = collection.clone();
            async move { c.search("a").await }
        });
        let (term_a, reply_a) = expect_listing(&mut requests).await.unwrap();
        assert_eq!(term_a, "a");

        let second = tokio::spawn({
            let c = collection.clone();
            async move { c.search("b").await }
        });
        let (term_b, reply_b) = expect_listing(&mut requests).await.unwrap();
        assert_eq!(term_b, "b");

        reply_b
            .send(Ok(json!({"Search": [{"imdbID": "b1", "Title": "B"}]})))
            .unwrap();
        assert_eq!(second.await.unwrap(), SearchOutcome::Loaded(1));

        reply_a
            .send(Ok(json!({"Search": [{"imdbID": "a1"}, {"imdbID": "a2"}]})))
            .unwrap();
        assert_eq!(first.await.unwrap(), SearchOutcome::Stale);

        assert_eq!(collection.query_term().as_deref(), Some("b"));
        assert_eq!(collection.ids(), vec!["b1"]);
        assert_eq!(collection.sync_state(), SyncState::Loaded);
    }

    #[tokio::test]
    async fn test_repeated_search_keeps_full_entities() {
        let mut mock = MockTransport::new();
        mock.expect_listing("hobbit").return_ok(hobbit_listing());
        mock.expect_detail("tt0903624").return_ok(json!({
            "imdbID": "tt0903624",
            "Title": "The Hobbit: An Unexpected Journey",
            "Director": "Peter Jackson",
            "Response": "True"
        }));
        mock.expect_listing("hobbit").return_ok(hobbit_listing());
        let collection = EntityCollection::new(CatalogContext::new(mock.clone(), config()));

        collection.search("hobbit").await;
        let loaded = collection.get("tt0903624").unwrap();
        assert_eq!(collection.load_detail("tt0903624").await, Ok(LoadOutcome::Loaded));
        collection.search("hobbit").await;

        let again = collection.get("tt0903624").unwrap();
        assert!(Arc::ptr_eq(&loaded, &again));
        assert!(again.is_full());
        assert_eq!(again.get("Director"), Some(json!("Peter Jackson")));
        assert_eq!(again.events().listener_count("change"), 1);
        mock.verify();
    }

    #[tokio::test]
    async fn test_detail_change_bubbles_with_member_id() {
        let (transport, mut requests) = create_mock_transport(8);
        let collection = EntityCollection::new(CatalogContext::new(transport, config()));
        let changes = recorded(&collection, "change");

        let search = tokio::spawn({
            let c = collection.clone();
            async move { c.search("hobbit").await }
        });
        let (_, reply) = expect_listing(&mut requests).await.unwrap();
        reply.send(Ok(hobbit_listing())).unwrap();
        search.await.unwrap();
        assert!(changes.lock().unwrap().is_empty());

        let load = tokio::spawn({
            let c = collection.clone();
            async move { c.load_detail("tt2310332").await }
        });
        let (id, reply) = expect_detail(&mut requests).await.unwrap();
        assert_eq!(id, "tt2310332");
        reply
            .send(Ok(json!({"imdbID": "tt2310332", "Rated": "PG-13"})))
            .unwrap();
        assert_eq!(load.await.unwrap(), Ok(LoadOutcome::Loaded));

        let changes = changes.lock().unwrap();
        assert_eq!(changes.len(), 1);
        assert!(matches!(
            &changes[0],
            CollectionEvent::Change { id, changed, .. } if id == "tt2310332" && changed == &vec!["Rated".to_string()]
        ));
    }

    #[tokio::test]
    async fn test_detail_error_bubbles() {
        let mut mock = MockTransport::new();
        mock.expect_listing("hobbit").return_ok(hobbit_listing());
        mock.expect_detail("tt0903624")
            .return_err(CatalogError::Transport("timeout".into()));
        let collection = EntityCollection::new(CatalogContext::new(mock, config()));
        let errors = recorded(&collection, "error");

        collection.search("hobbit").await;
        let outcome = collection.load_detail("tt0903624").await.unwrap();

        assert!(matches!(outcome, LoadOutcome::Failed(_)));
        assert_eq!(collection.sync_state(), SyncState::Loaded);
        assert_eq!(
            *errors.lock().unwrap(),
            vec![CollectionEvent::Error {
                id: Some("tt0903624".into()),
                term: None,
                error: CatalogError::Transport("timeout".into()),
            }]
        );
    }

    #[tokio::test]
    async fn test_load_detail_unknown_id() {
        let collection = EntityCollection::new(CatalogContext::new(MockTransport::new(), config()));
        assert_eq!(
            collection.load_detail("nope").await,
            Err(CatalogError::NotFound("nope".into()))
        );
    }

    #[tokio::test]
    async fn test_sync_observers_see_complete_items() {
        let mut mock = MockTransport::new();
        mock.expect_listing("hobbit").return_ok(hobbit_listing());
        let collection = EntityCollection::new(CatalogContext::new(mock, config()));
        let observed = Arc::new(Mutex::new(Vec::new()));
        let (c, o) = (collection.clone(), observed.clone());
        collection.events().on("sync", move |_| {
            o.lock().unwrap().push(c.map(|e| e.id().to_string()));
        });

        collection.search("hobbit").await;

        assert_eq!(
            *observed.lock().unwrap(),
            vec![vec!["tt0903624", "tt1170358", "tt2310332"]]
        );
    }

    #[tokio::test]
    async fn test_duplicate_ids_collapse() {
        let mut mock = MockTransport::new();
        mock.expect_listing("dup").return_ok(json!({"Search": [
            {"imdbID": "x", "Title": "First"},
            {"imdbID": "y", "Title": "Other"},
            {"imdbID": "x", "Year": "1999"}
        ]}));
        let collection = EntityCollection::new(CatalogContext::new(mock, config()));

        assert_eq!(collection.search("dup").await, SearchOutcome::Loaded(2));

        let x = collection.get("x").unwrap();
        assert_eq!(collection.ids(), vec!["x", "y"]);
        assert_eq!(x.get("Title"), Some(json!("First")));
        assert_eq!(x.get("Year"), Some(json!("1999")));
    }

    #[test]
    fn test_add_and_remove_manage_bubbling() {
        let collection = EntityCollection::new(CatalogContext::new(MockTransport::new(), config()));
        let changes = recorded(&collection, "change");
        let removals = recorded(&collection, "remove");

        let entity = collection
            .add(record(json!({"imdbID": "tt1", "Title": "One"})), Materialization::Stub)
            .unwrap();
        entity.merge(record(json!({"Year": "2001"})), Materialization::Stub);
        assert_eq!(changes.lock().unwrap().len(), 1);

        let removed = collection.remove("tt1").expect("member");
        assert!(Arc::ptr_eq(&entity, &removed));
        entity.merge(record(json!({"Year": "2002"})), Materialization::Stub);

        assert_eq!(changes.lock().unwrap().len(), 1);
        assert_eq!(*removals.lock().unwrap(), vec![CollectionEvent::Remove { id: "tt1".into() }]);
        assert!(collection.is_empty());
        assert!(collection.remove("tt1").is_none());
    }

    #[test]
    fn test_add_existing_merges() {
        let collection = EntityCollection::new(CatalogContext::new(MockTransport::new(), config()));
        let first = collection
            .add(record(json!({"imdbID": "tt1", "Title": "One"})), Materialization::Stub)
            .unwrap();
        let second = collection
            .add(record(json!({"imdbID": "tt1", "Plot": "..."})), Materialization::Full)
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(collection.len(), 1);
        assert!(first.is_full());
    }

    #[test]
    fn test_concurrent_add_keeps_one_member() {
        let collection = EntityCollection::new(CatalogContext::new(MockTransport::new(), config()));
        let added = Arc::new(Mutex::new(0));
        let a = added.clone();
        collection.events().on("add", move |_: &CollectionEvent| *a.lock().unwrap() += 1);

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let collection = collection.clone();
                std::thread::spawn(move || {
                    collection
                        .add(record(json!({"imdbID": "tt1", "Title": "One"})), Materialization::Stub)
                        .unwrap()
                })
            })
            .collect();
        let entities: Vec<_> = workers.into_iter().map(|w| w.join().unwrap()).collect();

        assert_eq!(collection.len(), 1);
        assert_eq!(collection.ids(), vec!["tt1"]);
        assert!(entities.iter().all(|e| Arc::ptr_eq(e, &entities[0])));
        assert_eq!(*added.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_map_is_repeatable() {
        let mut mock = MockTransport::new();
        mock.expect_listing("hobbit").return_ok(hobbit_listing());
        let collection = EntityCollection::new(CatalogContext::new(mock, config()));
        collection.search("hobbit").await;

        let project = |e: &Entity| (e.id().to_string(), e.get("Year"), e.is_full());
        assert_eq!(collection.map(project), collection.map(project));
    }
}
