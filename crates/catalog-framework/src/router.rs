//! # Route Synchronizer
//!
//! Maps location fragments such as `search/heat` to named handlers with extracted
//! parameters, and keeps that mapping in step with a [`Navigation`] source.
//!
//! Patterns are compiled once at registration:
//!
//! | Token | Matches |
//! |-------|---------|
//! | `:name` | one non-empty path segment, percent-decoded |
//! | `*name` | the remainder of the fragment, slashes included |
//! | anything else | itself, literally |
//!
//! The first registered pattern that matches wins. A match fires
//! `route:<handler>` and then `route` on [`Router::events`].
//!
//! ## Two directions
//!
//! - **Outbound**: [`Router::navigate`] records the fragment on the navigation source
//!   and, with `trigger`, routes it immediately.
//! - **Inbound**: after [`Router::start`], a background task receives every
//!   fragment the navigation source reports (back, forward, a typed location) and
//!   routes it. A report equal to the current path is ignored.

use crate::error::CatalogError;
use crate::events::{lock, EventBus, SubscriptionHandle};
use regex::Regex;
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

// =============================================================================
// NAVIGATION SOURCE
// =============================================================================

/// The location the router reads from and writes to.
pub trait Navigation: Send + Sync + 'static {
    /// Current location fragment.
    fn current(&self) -> String;

    /// Records `fragment` as the current location. Must not notify subscribers.
    fn set(&self, fragment: &str, replace: bool);

    /// Stream of fragments reached by something other than [`set`](Self::set).
    fn subscribe(&self) -> broadcast::Receiver<String>;
}

#[derive(Debug)]
struct History {
    entries: Vec<String>,
    cursor: usize,
}

/// In-process navigation history with back and forward.
#[derive(Clone, Debug)]
pub struct MemoryNavigation {
    history: Arc<Mutex<History>>,
    notify: broadcast::Sender<String>,
}

impl MemoryNavigation {
    pub fn new(initial: impl Into<String>) -> Self {
        let (notify, _) = broadcast::channel(64);
        Self {
            history: Arc::new(Mutex::new(History {
                entries: vec![initial.into()],
                cursor: 0,
            })),
            notify,
        }
    }

    /// Goes to `fragment` the way a user typing a location would, notifying subscribers.
    pub fn visit(&self, fragment: impl Into<String>) {
        let fragment = fragment.into();
        self.push(fragment.clone());
        self.announce(fragment);
    }

    /// Steps back one entry. Returns `false` at the start of history.
    pub fn back(&self) -> bool {
        self.step(|cursor, _| cursor.checked_sub(1))
    }

    /// Steps forward one entry. Returns `false` at the end of history.
    pub fn forward(&self) -> bool {
        self.step(|cursor, len| (cursor + 1 < len).then_some(cursor + 1))
    }

    pub fn entries(&self) -> Vec<String> {
        lock(&self.history).entries.clone()
    }

    fn push(&self, fragment: String) {
        let mut history = lock(&self.history);
        let next = history.cursor + 1;
        history.entries.truncate(next);
        history.entries.push(fragment);
        history.cursor = next;
    }

    fn step(&self, to: impl FnOnce(usize, usize) -> Option<usize>) -> bool {
        let fragment = {
            let mut history = lock(&self.history);
            let Some(cursor) = to(history.cursor, history.entries.len()) else {
                return false;
            };
            history.cursor = cursor;
            history.entries[cursor].clone()
        };
        self.announce(fragment);
        true
    }

    fn announce(&self, fragment: String) {
        // No receivers simply means nobody started a router yet.
        let _ = self.notify.send(fragment);
    }
}

impl Navigation for MemoryNavigation {
    fn current(&self) -> String {
        let history = lock(&self.history);
        history.entries[history.cursor].clone()
    }

    fn set(&self, fragment: &str, replace: bool) {
        if replace {
            let mut history = lock(&self.history);
            let cursor = history.cursor;
            history.entries[cursor] = fragment.to_string();
        } else {
            self.push(fragment.to_string());
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<String> {
        self.notify.subscribe()
    }
}

// =============================================================================
// ROUTES
// =============================================================================

#[derive(Debug)]
struct Route {
    pattern: String,
    handler: String,
    regex: Regex,
    names: Vec<String>,
}

impl Route {
    fn compile(pattern: &str, handler: &str) -> Result<Self, CatalogError> {
        let mut names = Vec::new();
        let mut source = String::from("^");
        for (i, segment) in normalize(pattern).split('/').enumerate() {
            if i > 0 {
                source.push('/');
            }
            if let Some(name) = segment.strip_prefix(':') {
                names.push(param_name(pattern, name)?);
                source.push_str("([^/]+)");
            } else if let Some(name) = segment.strip_prefix('*') {
                names.push(param_name(pattern, name)?);
                source.push_str("(.*)");
            } else {
                source.push_str(&regex::escape(segment));
            }
        }
        source.push('$');

        let regex =
            Regex::new(&source).map_err(|e| CatalogError::InvalidRoute(format!("{pattern}: {e}")))?;
        Ok(Self {
            pattern: pattern.to_string(),
            handler: handler.to_string(),
            regex,
            names,
        })
    }

    fn matches(&self, fragment: &str) -> Option<RouteMatch> {
        let captures = self.regex.captures(fragment)?;
        let params = self
            .names
            .iter()
            .zip(captures.iter().skip(1))
            .map(|(name, capture)| {
                let raw = capture.map_or("", |c| c.as_str());
                (name.clone(), decode(raw))
            })
            .collect();
        Some(RouteMatch {
            handler: self.handler.clone(),
            pattern: self.pattern.clone(),
            fragment: fragment.to_string(),
            params,
        })
    }
}

fn param_name(pattern: &str, name: &str) -> Result<String, CatalogError> {
    if !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        Ok(name.to_string())
    } else {
        Err(CatalogError::InvalidRoute(format!(
            "{pattern}: bad parameter name `{name}`"
        )))
    }
}

/// Percent-decodes one captured segment, keeping it raw when it is not valid UTF-8.
fn decode(raw: &str) -> String {
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw.to_string(),
    }
}

/// Strips a leading `#` and leading slashes.
fn normalize(fragment: &str) -> &str {
    fragment.trim_start_matches('#').trim_start_matches('/')
}

/// A fragment resolved to a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub handler: String,
    pub pattern: String,
    pub fragment: String,
    /// Parameter names and decoded values, in pattern order.
    pub params: Vec<(String, String)>,
}

impl RouteMatch {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn values(&self) -> Vec<&str> {
        self.params.iter().map(|(_, v)| v.as_str()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RouterState {
    #[default]
    Idle,
    Matched,
}

/// Options for [`Router::navigate`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NavigateOptions {
    /// Route the new fragment immediately.
    pub trigger: bool,
    /// Overwrite the current history entry instead of pushing one.
    pub replace: bool,
}

impl NavigateOptions {
    pub fn trigger() -> Self {
        Self {
            trigger: true,
            replace: false,
        }
    }
}

// =============================================================================
// ROUTER
// =============================================================================

#[derive(Default)]
struct Current {
    path: Option<String>,
    matched: Option<RouteMatch>,
}

struct RouterInner {
    navigation: Arc<dyn Navigation>,
    routes: Mutex<Vec<Route>>,
    current: Mutex<Current>,
    events: EventBus<RouteMatch>,
    observer: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for RouterInner {
    fn drop(&mut self) {
        if let Some(task) = lock(&self.observer).take() {
            task.abort();
        }
    }
}

impl RouterInner {
    fn load_url(&self, fragment: &str) -> Option<RouteMatch> {
        let fragment = normalize(fragment);
        let matched = lock(&self.routes).iter().find_map(|r| r.matches(fragment));

        {
            let mut current = lock(&self.current);
            current.path = Some(fragment.to_string());
            current.matched = matched.clone();
        }

        let Some(matched) = matched else {
            debug!(%fragment, "No route matched");
            return None;
        };
        debug!(%fragment, handler = %matched.handler, "Routed");
        self.events
            .trigger(&format!("route:{}", matched.handler), &matched);
        self.events.trigger("route", &matched);
        Some(matched)
    }

    fn on_external(&self, fragment: &str) {
        let fragment = normalize(fragment);
        if lock(&self.current).path.as_deref() == Some(fragment) {
            trace!(%fragment, "Location unchanged");
            return;
        }
        self.load_url(fragment);
    }
}

/// Routes location fragments to named handlers.
#[derive(Clone)]
pub struct Router {
    inner: Arc<RouterInner>,
}

impl Router {
    pub fn new(navigation: impl Navigation) -> Self {
        Self {
            inner: Arc::new(RouterInner {
                navigation: Arc::new(navigation),
                routes: Mutex::new(Vec::new()),
                current: Mutex::new(Current::default()),
                events: EventBus::new(),
                observer: Mutex::new(None),
            }),
        }
    }

    /// Registers `pattern` for `handler`. Earlier registrations take precedence.
    pub fn route(&self, pattern: &str, handler: &str) -> Result<(), CatalogError> {
        let route = Route::compile(pattern, handler)?;
        debug!(%pattern, %handler, "Route registered");
        lock(&self.inner.routes).push(route);
        Ok(())
    }

    /// Subscribes to matches of one handler.
    pub fn on_route<F>(&self, handler: &str, callback: F) -> SubscriptionHandle
    where
        F: Fn(&RouteMatch) + Send + Sync + 'static,
    {
        self.inner.events.on(&format!("route:{handler}"), callback)
    }

    /// Bus carrying `route:<handler>` and `route`.
    pub fn events(&self) -> &EventBus<RouteMatch> {
        &self.inner.events
    }

    /// Records `path` as the current location, routing it when `options.trigger` is set.
    pub fn navigate(&self, path: &str, options: NavigateOptions) -> Option<RouteMatch> {
        let fragment = normalize(path);
        self.inner.navigation.set(fragment, options.replace);
        {
            let mut current = lock(&self.inner.current);
            current.path = Some(fragment.to_string());
            if !options.trigger {
                current.matched = None;
            }
        }
        trace!(%fragment, trigger = options.trigger, "Navigate");
        if options.trigger {
            self.inner.load_url(fragment)
        } else {
            None
        }
    }

    /// Routes `fragment` without touching the navigation source.
    pub fn load_url(&self, fragment: &str) -> Option<RouteMatch> {
        self.inner.load_url(fragment)
    }

    /// Routes the current location and starts following the navigation source.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn start(&self) -> Result<Option<RouteMatch>, CatalogError> {
        {
            let mut observer = lock(&self.inner.observer);
            if observer.is_some() {
                return Err(CatalogError::AlreadyStarted);
            }
            let receiver = self.inner.navigation.subscribe();
            *observer = Some(tokio::spawn(observe(receiver, Arc::downgrade(&self.inner))));
        }
        info!("Router started");
        let initial = self.inner.navigation.current();
        Ok(self.inner.load_url(&initial))
    }

    /// Stops following the navigation source. The router may be started again.
    pub fn stop(&self) {
        if let Some(task) = lock(&self.inner.observer).take() {
            task.abort();
            info!("Router stopped");
        }
    }

    pub fn is_started(&self) -> bool {
        lock(&self.inner.observer).is_some()
    }

    pub fn current_path(&self) -> Option<String> {
        lock(&self.inner.current).path.clone()
    }

    pub fn current_match(&self) -> Option<RouteMatch> {
        lock(&self.inner.current).matched.clone()
    }

    pub fn state(&self) -> RouterState {
        if lock(&self.inner.current).matched.is_some() {
            RouterState::Matched
        } else {
            RouterState::Idle
        }
    }
}

async fn observe(mut receiver: broadcast::Receiver<String>, router: Weak<RouterInner>) {
    loop {
        let fragment = match receiver.recv().await {
            Ok(fragment) => fragment,
            Err(RecvError::Lagged(skipped)) => {
                let Some(inner) = router.upgrade() else { break };
                warn!(skipped, "Navigation notifications dropped, resyncing");
                inner.navigation.current()
            }
            Err(RecvError::Closed) => break,
        };
        let Some(inner) = router.upgrade() else { break };
        inner.on_external(&fragment);
    }
    debug!("Navigation observer finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    fn router() -> (Router, MemoryNavigation) {
        let navigation = MemoryNavigation::new("");
        let router = Router::new(navigation.clone());
        router.route("", "home").unwrap();
        router.route("search/:term", "search").unwrap();
        router.route("movie/:id", "detail").unwrap();
        router.route("files/*path", "files").unwrap();
        (router, navigation)
    }

    fn recorder(router: &Router) -> mpsc::UnboundedReceiver<RouteMatch> {
        let (tx, rx) = mpsc::unbounded_channel();
        router.events().on("route", move |m: &RouteMatch| {
            let _ = tx.send(m.clone());
        });
        rx
    }

    async fn next(rx: &mut mpsc::UnboundedReceiver<RouteMatch>) -> RouteMatch {
        timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("route event")
            .expect("channel open")
    }

    #[test]
    fn test_params_are_percent_decoded() {
        let (router, _) = router();
        let m = router.load_url("search/lord%20of%20the%20rings").unwrap();
        assert_eq!(m.handler, "search");
        assert_eq!(m.param("term"), Some("lord of the rings"));
        assert_eq!(router.state(), RouterState::Matched);
    }

    #[test]
    fn test_undecodable_segment_is_kept_raw() {
        let (router, _) = router();
        let m = router.load_url("search/%FF").unwrap();
        assert_eq!(m.param("term"), Some("%FF"));
    }

    #[test]
    fn test_leading_hash_and_slash_are_stripped() {
        let (router, _) = router();
        assert_eq!(router.load_url("#/movie/tt1").unwrap().values(), vec!["tt1"]);
        assert_eq!(router.load_url("/movie/tt2").unwrap().values(), vec!["tt2"]);
    }

    #[test]
    fn test_splat_spans_segments() {
        let (router, _) = router();
        let m = router.load_url("files/a/b/c.txt").unwrap();
        assert_eq!(m.param("path"), Some("a/b/c.txt"));
    }

    #[test]
    fn test_first_registered_route_wins() {
        let router = Router::new(MemoryNavigation::new(""));
        router.route("movie/new", "create").unwrap();
        router.route("movie/:id", "detail").unwrap();
        assert_eq!(router.load_url("movie/new").unwrap().handler, "create");
        assert_eq!(router.load_url("movie/tt1").unwrap().handler, "detail");
    }

    #[test]
    fn test_no_match_returns_to_idle() {
        let (router, _) = router();
        router.load_url("search/heat");
        assert!(router.load_url("nowhere/at/all").is_none());
        assert_eq!(router.state(), RouterState::Idle);
        assert_eq!(router.current_path().as_deref(), Some("nowhere/at/all"));
    }

    #[test]
    fn test_param_must_not_be_empty() {
        let (router, _) = router();
        assert!(router.load_url("search/").is_none());
    }

    #[test]
    fn test_invalid_parameter_name_is_rejected() {
        let router = Router::new(MemoryNavigation::new(""));
        let err = router.route("search/:", "search").unwrap_err();
        assert!(matches!(err, CatalogError::InvalidRoute(_)));
    }

    #[test]
    fn test_handler_event_fires_before_generic() {
        let (router, _) = router();
        let order = Arc::new(Mutex::new(Vec::new()));
        let o = order.clone();
        router.events().on("route", move |m: &RouteMatch| {
            o.lock().unwrap().push(format!("route {}", m.handler));
        });
        let o = order.clone();
        router.on_route("search", move |m: &RouteMatch| {
            o.lock().unwrap().push(format!("route:search {}", m.values()[0]));
        });

        router.load_url("search/heat");

        assert_eq!(
            *order.lock().unwrap(),
            vec!["route:search heat".to_string(), "route search".to_string()]
        );
    }

    #[test]
    fn test_navigate_without_trigger_only_records() {
        let (router, navigation) = router();
        let mut rx = recorder(&router);

        assert!(router.navigate("search/heat", NavigateOptions::default()).is_none());

        assert_eq!(navigation.current(), "search/heat");
        assert_eq!(router.current_path().as_deref(), Some("search/heat"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_navigate_without_trigger_drops_previous_match() {
        let (router, _) = router();
        assert!(router.load_url("search/heat").is_some());
        assert_eq!(router.state(), RouterState::Matched);

        router.navigate("movie/tt1", NavigateOptions::default());

        assert_eq!(router.state(), RouterState::Idle);
        assert!(router.current_match().is_none());
        assert_eq!(router.current_path().as_deref(), Some("movie/tt1"));
    }

    #[test]
    fn test_navigate_replace_overwrites_entry() {
        let (router, navigation) = router();
        router.navigate("search/a", NavigateOptions::default());
        router.navigate(
            "search/b",
            NavigateOptions {
                trigger: true,
                replace: true,
            },
        );
        assert_eq!(navigation.entries(), vec!["".to_string(), "search/b".to_string()]);
    }

    #[tokio::test]
    async fn test_start_routes_initial_location() {
        let navigation = MemoryNavigation::new("#movie/tt7");
        let router = Router::new(navigation);
        router.route("movie/:id", "detail").unwrap();

        let initial = router.start().unwrap().unwrap();

        assert_eq!(initial.param("id"), Some("tt7"));
        assert!(router.is_started());
        assert_eq!(router.start(), Err(CatalogError::AlreadyStarted));
    }

    #[tokio::test]
    async fn test_external_changes_are_routed() {
        let (router, navigation) = router();
        router.start().unwrap();
        let mut rx = recorder(&router);

        navigation.visit("search/heat");
        let m = next(&mut rx).await;
        assert_eq!(m.param("term"), Some("heat"));

        router.navigate("movie/tt1", NavigateOptions::trigger());
        assert_eq!(next(&mut rx).await.handler, "detail");

        assert!(navigation.back());
        let m = next(&mut rx).await;
        assert_eq!(m.handler, "search");
        assert_eq!(m.param("term"), Some("heat"));
    }

    #[tokio::test]
    async fn test_unchanged_location_is_ignored() {
        let (router, navigation) = router();
        router.navigate("search/heat", NavigateOptions::default());
        router.start().unwrap();
        let mut rx = recorder(&router);

        navigation.visit("search/heat");
        navigation.visit("movie/tt1");

        assert_eq!(next(&mut rx).await.handler, "detail");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_stopped_router_ignores_navigation() {
        let (router, navigation) = router();
        router.start().unwrap();
        router.stop();
        let mut rx = recorder(&router);

        navigation.visit("search/heat");
        tokio::task::yield_now().await;

        assert!(rx.try_recv().is_err());
        assert!(!router.is_started());
    }
}
