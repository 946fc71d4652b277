//! Async combobox resources
//!
//! The engine never fetches anything. An async combobox field carries a
//! [`ResourceRequest`] descriptor; the presentation layer substitutes the
//! live search string for [`QUERY_TOKEN`] and runs the request itself.
//!
//! [`QuerySession`] is the bookkeeping a boundary fetcher needs for
//! fire-and-replace semantics: each new query supersedes the previous one,
//! and late results of superseded queries are dropped.
//!
//! ```rust
//! use sift_filter::resource::{QuerySession, ResourceRequest, ResourceStatus};
//!
//! let mut session = QuerySession::new(ResourceRequest::get("/users?q={query}"));
//!
//! let first = session.search("oc");
//! let second = session.search("octo");
//! assert_eq!(second.request.url, "/users?q=octo");
//!
//! // The stale response is ignored
//! assert!(!session.complete(first.generation, Ok(vec![])));
//! assert!(session.complete(second.generation, Ok(vec!["octocat".into()])));
//! assert!(matches!(session.status(), ResourceStatus::Ready(items) if items.len() == 1));
//! ```

use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Placeholder in a request URL replaced by the live search string
pub const QUERY_TOKEN: &str = "{query}";

fn default_method() -> String {
    "GET".to_string()
}

/// Network request descriptor of an async combobox
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceRequest {
    /// May embed [`QUERY_TOKEN`]
    pub url: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub headers: IndexMap<String, String>,
    #[serde(default)]
    pub params: IndexMap<String, String>,
    #[serde(default)]
    pub body: Option<Value>,
}

impl ResourceRequest {
    /// A GET request to `url`
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: default_method(),
            headers: IndexMap::new(),
            params: IndexMap::new(),
            body: None,
        }
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn has_query_token(&self) -> bool {
        self.url.contains(QUERY_TOKEN)
    }

    /// The request to issue for `query`
    ///
    /// Only the first token occurrence in the URL is replaced; a URL
    /// without the token is returned unchanged.
    pub fn resolve(&self, query: &str) -> ResourceRequest {
        if !self.has_query_token() {
            return self.clone();
        }
        ResourceRequest {
            url: self.url.replacen(QUERY_TOKEN, query, 1),
            ..self.clone()
        }
    }
}

/// Fetch options handed to the boundary fetcher along with the request
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceOptions {
    /// Items shown before the first response arrives
    #[serde(default)]
    pub default_value: Option<Value>,
    /// Delay between the last keystroke and the request
    #[serde(default)]
    pub debounce_ms: Option<u64>,
}

impl ResourceOptions {
    pub fn debounce(&self) -> Option<Duration> {
        self.debounce_ms.map(Duration::from_millis)
    }
}

/// Turns a fetched item into the label shown in the list
#[derive(Clone)]
pub struct ItemFormatter(Rc<dyn Fn(&Value) -> String>);

impl ItemFormatter {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value) -> String + 'static,
    {
        Self(Rc::new(f))
    }

    pub fn format(&self, item: &Value) -> String {
        (self.0)(item)
    }
}

impl Default for ItemFormatter {
    fn default() -> Self {
        Self::new(default_item_label)
    }
}

impl fmt::Debug for ItemFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ItemFormatter(..)")
    }
}

impl PartialEq for ItemFormatter {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// Label of an item when no formatter was configured
///
/// Strings are shown as-is, null as an empty string, anything else as JSON.
pub fn default_item_label(item: &Value) -> String {
    match item {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Lifecycle of the newest query
#[derive(Clone, Debug, PartialEq)]
pub enum ResourceStatus {
    Idle,
    Loading,
    Ready(Vec<Value>),
    Failed(String),
}

/// A request the boundary should issue now
#[derive(Clone, Debug, PartialEq)]
pub struct PendingRequest {
    /// Pass back to [`QuerySession::complete`]
    pub generation: u64,
    pub request: ResourceRequest,
}

/// Boundary-owned state of one async combobox search
#[derive(Debug)]
pub struct QuerySession {
    template: ResourceRequest,
    query: String,
    generation: u64,
    status: ResourceStatus,
}

impl QuerySession {
    pub fn new(template: ResourceRequest) -> Self {
        Self {
            template,
            query: String::new(),
            generation: 0,
            status: ResourceStatus::Idle,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn status(&self) -> &ResourceStatus {
        &self.status
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Start a search, superseding any request still in flight
    pub fn search(&mut self, query: impl Into<String>) -> PendingRequest {
        self.query = query.into();
        self.generation += 1;
        self.status = ResourceStatus::Loading;
        PendingRequest {
            generation: self.generation,
            request: self.template.resolve(&self.query),
        }
    }

    /// Record the outcome of a request
    ///
    /// Returns false, leaving the session untouched, when `generation` has
    /// been superseded.
    pub fn complete(&mut self, generation: u64, result: Result<Vec<Value>, String>) -> bool {
        if generation != self.generation {
            tracing::debug!(
                generation,
                current = self.generation,
                "dropping superseded resource response"
            );
            return false;
        }
        self.status = match result {
            Ok(items) => ResourceStatus::Ready(items),
            Err(message) => ResourceStatus::Failed(message),
        };
        true
    }

    /// Items of the last successful response
    pub fn items(&self) -> &[Value] {
        match &self.status {
            ResourceStatus::Ready(items) => items.as_slice(),
            _ => &[],
        }
    }

    /// `(label, item)` pairs ready for a list widget
    pub fn labelled_items(&self, formatter: &ItemFormatter) -> Vec<(String, Value)> {
        self.items()
            .iter()
            .map(|item| (formatter.format(item), item.clone()))
            .collect()
    }

    /// Status line shown above the list, if any
    pub fn status_message(&self) -> Option<String> {
        match &self.status {
            ResourceStatus::Failed(message) => Some(message.clone()),
            ResourceStatus::Loading => Some("Loading...".to_string()),
            _ if self.query.is_empty() => Some("Type to search.".to_string()),
            ResourceStatus::Ready(items) if items.is_empty() => {
                Some(format!("No matches for \"{}\".", self.query))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_replaces_first_token() {
        let req = ResourceRequest::get("https://api.example.com/search?q={query}&echo={query}")
            .header("accept", "application/json");
        let resolved = req.resolve("ada");
        assert_eq!(
            resolved.url,
            "https://api.example.com/search?q=ada&echo={query}"
        );
        assert_eq!(resolved.headers.get("accept").map(String::as_str), Some("application/json"));
    }

    #[test]
    fn test_resolve_without_token_is_identity() {
        let req = ResourceRequest::get("/countries").param("limit", "10");
        assert!(!req.has_query_token());
        assert_eq!(req.resolve("ca"), req);
    }

    #[test]
    fn test_default_item_label() {
        assert_eq!(default_item_label(&Value::Null), "");
        assert_eq!(default_item_label(&json!("x")), "x");
        assert_eq!(default_item_label(&json!(42)), "42");
        assert_eq!(default_item_label(&json!({"a": 1})), "{\"a\":1}");
    }

    #[test]
    fn test_formatter_equality_is_identity() {
        let a = ItemFormatter::default();
        let b = a.clone();
        assert_eq!(a, b);
        assert_ne!(a, ItemFormatter::default());
    }

    #[test]
    fn test_formatter_may_capture_local_state() {
        let calls = Rc::new(std::cell::Cell::new(0));
        let counter = Rc::clone(&calls);
        let formatter = ItemFormatter::new(move |item| {
            counter.set(counter.get() + 1);
            default_item_label(item)
        });

        assert_eq!(formatter.format(&json!("ada")), "ada");
        assert_eq!(formatter.clone().format(&json!(7)), "7");
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_session_fire_and_replace() {
        let mut session = QuerySession::new(ResourceRequest::get("/u?q={query}"));
        assert_eq!(session.status_message().as_deref(), Some("Type to search."));

        let a = session.search("a");
        let b = session.search("ab");
        assert_eq!(session.status(), &ResourceStatus::Loading);

        assert!(session.complete(b.generation, Err("boom".into())));
        assert!(!session.complete(a.generation, Ok(vec![json!("late")])));
        assert_eq!(session.status(), &ResourceStatus::Failed("boom".into()));
        assert!(session.items().is_empty());
    }

    #[test]
    fn test_session_labels_and_empty_message() {
        let mut session = QuerySession::new(ResourceRequest::get("/u?q={query}"));
        let pending = session.search("zz");
        session.complete(pending.generation, Ok(vec![]));
        assert_eq!(
            session.status_message().as_deref(),
            Some("No matches for \"zz\".")
        );

        let pending = session.search("oc");
        session.complete(
            pending.generation,
            Ok(vec![json!({"login": "octocat"}), json!({"login": "ocelot"})]),
        );
        let formatter = ItemFormatter::new(|item| {
            item.get("login")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        });
        let labels: Vec<String> = session
            .labelled_items(&formatter)
            .into_iter()
            .map(|(label, _)| label)
            .collect();
        assert_eq!(labels, vec!["octocat", "ocelot"]);
        assert_eq!(session.status_message(), None);
    }
}
