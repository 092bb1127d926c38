//! # Entity
//!
//! One cacheable record of the remote catalog.
//!
//! An entity starts as a [`Materialization::Stub`] built from a listing row and
//! becomes [`Materialization::Full`] once a detail fetch has been merged into it.
//! Attributes are only ever merged: keys missing from a later payload keep their
//! previous value, so detail data survives a later listing refresh.
//!
//! # Detail Fetches
//!
//! [`Entity::load_full`] issues at most one detail fetch at a time. A second call
//! while one is in flight returns [`LoadOutcome::Coalesced`] without touching the
//! transport. Failures never escape as errors: they are recorded in
//! [`FetchState::Failed`] and announced through an `error` event, and the cached
//! attributes are left exactly as they were.
//!
//! # Events
//!
//! | name      | when                                               |
//! |-----------|----------------------------------------------------|
//! | `request` | a detail fetch was issued                          |
//! | `change`  | a merge was applied                                |
//! | `sync`    | a detail fetch was merged                          |
//! | `error`   | a detail fetch failed                              |

use crate::error::CatalogError;
use crate::events::{lock, Event, EventBus};
use crate::transport::{CatalogContext, Record};
use serde_json::Value;
use std::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// How much of the remote record an entity holds. Ordered: `Stub < Full`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Materialization {
    Stub,
    Full,
}

/// Detail-fetch lifecycle of one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchState {
    Idle,
    InFlight,
    Failed,
}

/// What a call to [`Entity::load_full`] or [`Entity::reload`] ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A detail fetch was issued and merged.
    Loaded,
    /// Nothing to do, the entity was already full.
    AlreadyFull,
    /// Another detail fetch was in flight; no request was issued.
    Coalesced,
    /// The fetch failed; the same error was published as an `error` event.
    Failed(CatalogError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntityEvent {
    Request {
        id: String,
    },
    Change {
        id: String,
        changed: Vec<String>,
        version: u64,
    },
    Sync {
        id: String,
    },
    Error {
        id: String,
        error: CatalogError,
    },
}

impl EntityEvent {
    pub fn id(&self) -> &str {
        match self {
            EntityEvent::Request { id }
            | EntityEvent::Change { id, .. }
            | EntityEvent::Sync { id }
            | EntityEvent::Error { id, .. } => id,
        }
    }
}

impl Event for EntityEvent {
    fn name(&self) -> &str {
        match self {
            EntityEvent::Request { .. } => "request",
            EntityEvent::Change { .. } => "change",
            EntityEvent::Sync { .. } => "sync",
            EntityEvent::Error { .. } => "error",
        }
    }
}

struct EntityState {
    attributes: Record,
    materialization: Materialization,
    fetch_state: FetchState,
    version: u64,
}

impl EntityState {
    /// Left-fold merge; returns the keys whose value actually changed.
    fn apply(&mut self, attributes: Record, level: Materialization) -> Vec<String> {
        let mut changed = Vec::new();
        for (key, value) in attributes {
            if self.attributes.get(&key) != Some(&value) {
                changed.push(key.clone());
            }
            self.attributes.insert(key, value);
        }
        self.materialization = self.materialization.max(level);
        self.version += 1;
        changed
    }
}

/// A cached catalog record. Shared as `Arc<Entity>` between its collection and
/// any views observing it.
pub struct Entity {
    id: String,
    state: Mutex<EntityState>,
    events: EventBus<EntityEvent>,
    context: CatalogContext,
}

impl Entity {
    /// Builds an entity from a raw record, taking its id from the configured
    /// identifier field.
    pub fn from_record(
        record: Record,
        level: Materialization,
        context: CatalogContext,
    ) -> Result<Self, CatalogError> {
        let id = context.config.extract_id(&record)?;
        Ok(Self {
            id,
            state: Mutex::new(EntityState {
                attributes: record,
                materialization: level,
                fetch_state: FetchState::Idle,
                version: 1,
            }),
            events: EventBus::new(),
            context,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        lock(&self.state).attributes.get(key).cloned()
    }

    pub fn has(&self, key: &str) -> bool {
        lock(&self.state).attributes.contains_key(key)
    }

    /// Snapshot of every attribute.
    pub fn attributes(&self) -> Record {
        lock(&self.state).attributes.clone()
    }

    pub fn materialization(&self) -> Materialization {
        lock(&self.state).materialization
    }

    pub fn is_full(&self) -> bool {
        self.materialization() == Materialization::Full
    }

    pub fn fetch_state(&self) -> FetchState {
        lock(&self.state).fetch_state
    }

    /// Incremented on every applied merge.
    pub fn version(&self) -> u64 {
        lock(&self.state).version
    }

    pub fn events(&self) -> &EventBus<EntityEvent> {
        &self.events
    }

    /// Merges `attributes` and emits `change`.
    ///
    /// Keys absent from `attributes` are kept. The materialization only ever
    /// rises: merging a stub payload into a full entity leaves it full.
    pub fn merge(&self, attributes: Record, level: Materialization) -> Vec<String> {
        let (changed, version) = self.merge_silent(attributes, level);
        self.events.emit(&EntityEvent::Change {
            id: self.id.clone(),
            changed: changed.clone(),
            version,
        });
        changed
    }

    /// Merge without notifying; the collection uses this while it rebuilds its
    /// item list and announces the result with a single `sync`.
    pub(crate) fn merge_silent(&self, attributes: Record, level: Materialization) -> (Vec<String>, u64) {
        let mut state = lock(&self.state);
        let changed = state.apply(attributes, level);
        (changed, state.version)
    }

    /// Fetches the full record unless it is already loaded or a fetch is in flight.
    #[instrument(skip(self), fields(id = %self.id))]
    pub async fn load_full(&self) -> LoadOutcome {
        self.fetch_detail(false).await
    }

    /// Fetches the full record even if the entity is already full.
    #[instrument(skip(self), fields(id = %self.id))]
    pub async fn reload(&self) -> LoadOutcome {
        self.fetch_detail(true).await
    }

    async fn fetch_detail(&self, force: bool) -> LoadOutcome {
        {
            let mut state = lock(&self.state);
            if state.fetch_state == FetchState::InFlight {
                debug!("Detail fetch already in flight");
                return LoadOutcome::Coalesced;
            }
            if !force && state.materialization == Materialization::Full {
                debug!("Already full");
                return LoadOutcome::AlreadyFull;
            }
            state.fetch_state = FetchState::InFlight;
        }
        let mut guard = InFlightGuard {
            state: &self.state,
            armed: true,
        };

        self.events.emit(&EntityEvent::Request {
            id: self.id.clone(),
        });

        let result = self
            .context
            .detail(&self.id)
            .await
            .and_then(|record| self.check_identity(record));

        match result {
            Ok(record) => {
                let (changed, version) = {
                    let mut state = lock(&self.state);
                    let changed = state.apply(record, Materialization::Full);
                    state.fetch_state = FetchState::Idle;
                    (changed, state.version)
                };
                guard.armed = false;
                info!(changed = changed.len(), version, "Detail loaded");
                self.events.emit(&EntityEvent::Change {
                    id: self.id.clone(),
                    changed,
                    version,
                });
                self.events.emit(&EntityEvent::Sync {
                    id: self.id.clone(),
                });
                LoadOutcome::Loaded
            }
            Err(error) => {
                lock(&self.state).fetch_state = FetchState::Failed;
                guard.armed = false;
                warn!(error = %error, "Detail fetch failed");
                self.events.emit(&EntityEvent::Error {
                    id: self.id.clone(),
                    error: error.clone(),
                });
                LoadOutcome::Failed(error)
            }
        }
    }

    fn check_identity(&self, record: Record) -> Result<Record, CatalogError> {
        if !record.contains_key(&self.context.config.id_attribute) {
            return Ok(record);
        }
        let id = self.context.config.extract_id(&record)?;
        if id != self.id {
            return Err(CatalogError::Parse(format!(
                "detail for `{}` answered with `{id}`",
                self.id
            )));
        }
        Ok(record)
    }
}

/// Returns the entity to `Idle` if a detail fetch is abandoned mid-flight
/// (the awaiting task was cancelled), so later loads are not coalesced forever.
struct InFlightGuard<'a> {
    state: &'a Mutex<EntityState>,
    armed: bool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut state = lock(self.state);
            if state.fetch_state == FetchState::InFlight {
                state.fetch_state = FetchState::Idle;
            }
        }
    }
}

impl std::fmt::Debug for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("materialization", &state.materialization)
            .field("fetch_state", &state.fetch_state)
            .field("version", &state.version)
            .finish()
    }
}
