//! # Search Form
//!
//! The input box above the results. Its value follows the collection's query term
//! on every `sync`, so a search reached through back/forward shows the right
//! text. Submitting publishes a `search` event; the form itself never fetches.

use catalog_framework::events::lock;
use catalog_framework::{CollectionEvent, EntityCollection, Event, EventBus, Listener, SubscriptionHandle};
use std::sync::{Arc, Mutex};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    Search { term: String },
}

impl Event for FormEvent {
    fn name(&self) -> &str {
        match self {
            FormEvent::Search { .. } => "search",
        }
    }
}

struct FormInner {
    value: Mutex<String>,
    listener: Listener,
    events: EventBus<FormEvent>,
}

impl Drop for FormInner {
    fn drop(&mut self) {
        self.listener.stop_listening();
    }
}

#[derive(Clone)]
pub struct SearchForm {
    inner: Arc<FormInner>,
}

impl SearchForm {
    pub fn new(collection: &EntityCollection) -> Self {
        let inner = Arc::new(FormInner {
            value: Mutex::new(String::new()),
            listener: Listener::new(),
            events: EventBus::new(),
        });

        let weak = Arc::downgrade(&inner);
        inner
            .listener
            .listen_to(collection.events(), "sync", move |event: &CollectionEvent| {
                if let (Some(inner), CollectionEvent::Sync { term, .. }) = (weak.upgrade(), event) {
                    *lock(&inner.value) = term.clone();
                }
            });

        Self { inner }
    }

    /// Current text of the input.
    pub fn value(&self) -> String {
        lock(&self.inner.value).clone()
    }

    /// Submits `term`. Blank input is ignored and returns `false`.
    pub fn submit(&self, term: &str) -> bool {
        let term = term.trim();
        if term.is_empty() {
            return false;
        }
        *lock(&self.inner.value) = term.to_string();
        debug!(%term, "Search submitted");
        self.inner.events.emit(&FormEvent::Search {
            term: term.to_string(),
        });
        true
    }

    pub fn on_search<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.inner.events.on("search", move |event: &FormEvent| {
            let FormEvent::Search { term } = event;
            callback(term);
        })
    }

    pub fn dispose(&self) {
        self.inner.listener.stop_listening();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_framework::mock::MockTransport;
    use catalog_framework::{CatalogConfig, CatalogContext};
    use serde_json::json;

    fn collection(mock: MockTransport) -> EntityCollection {
        EntityCollection::new(CatalogContext::new(
            mock,
            CatalogConfig::new("imdbID").with_listing_field("Search"),
        ))
    }

    #[tokio::test]
    async fn test_value_follows_query_term() {
        let mut mock = MockTransport::new();
        mock.expect_listing("alien").return_ok(json!({"Search": []}));
        let collection = collection(mock);
        let form = SearchForm::new(&collection);

        collection.search("alien").await;

        assert_eq!(form.value(), "alien");
    }

    #[test]
    fn test_submit_publishes_trimmed_term() {
        let form = SearchForm::new(&collection(MockTransport::new()));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        form.on_search(move |term| s.lock().unwrap().push(term.to_string()));

        assert!(form.submit("  heat "));
        assert!(!form.submit("   "));

        assert_eq!(*seen.lock().unwrap(), vec!["heat".to_string()]);
        assert_eq!(form.value(), "heat");
    }

    #[tokio::test]
    async fn test_disposed_form_stops_following() {
        let mut mock = MockTransport::new();
        mock.expect_listing("alien").return_ok(json!({"Search": []}));
        let collection = collection(mock);
        let form = SearchForm::new(&collection);
        form.dispose();

        collection.search("alien").await;

        assert_eq!(form.value(), "");
        assert_eq!(collection.events().listener_count("sync"), 0);
    }
}
