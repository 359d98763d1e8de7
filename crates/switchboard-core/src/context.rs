//! Request accessors captured at accept time.
//!
//! The host framework performs the upgrade and hands over whatever it knows
//! about the originating request. The runtime never interprets these values;
//! they are exposed to setup code and listeners through
//! [`Connection::context`](crate::Connection::context).

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Pass-through values from the request that opened a connection.
#[derive(Clone, Default)]
pub struct RequestContext {
    params: HashMap<String, String>,
    query: HashMap<String, String>,
    cookies: HashMap<String, String>,
    locals: HashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl RequestContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a path parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Add a query parameter.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Add a cookie.
    pub fn with_cookie(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(key.into(), value.into());
        self
    }

    /// Add a request-local value.
    pub fn with_local<T: Any + Send + Sync>(mut self, key: impl Into<String>, value: T) -> Self {
        self.locals.insert(key.into(), Arc::new(value));
        self
    }

    /// Get a path parameter.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Get a path parameter, or `default` if absent.
    pub fn param_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.param(key).unwrap_or(default)
    }

    /// Get a query parameter.
    pub fn query(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    /// Get a query parameter, or `default` if absent.
    pub fn query_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.query(key).unwrap_or(default)
    }

    /// Get a cookie.
    pub fn cookie(&self, key: &str) -> Option<&str> {
        self.cookies.get(key).map(String::as_str)
    }

    /// Get a cookie, or `default` if absent.
    pub fn cookie_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.cookie(key).unwrap_or(default)
    }

    /// Get a request-local value of type `T`.
    ///
    /// Returns `None` if the key is absent or holds a different type.
    pub fn local<T: Any + Send + Sync>(&self, key: &str) -> Option<&T> {
        self.locals.get(key).and_then(|v| v.downcast_ref::<T>())
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("params", &self.params)
            .field("query", &self.query)
            .field("cookies", &self.cookies)
            .field("locals", &self.locals.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let ctx = RequestContext::new()
            .with_param("room", "lobby")
            .with_query("token", "abc")
            .with_cookie("session", "s1");

        assert_eq!(ctx.param("room"), Some("lobby"));
        assert_eq!(ctx.query("token"), Some("abc"));
        assert_eq!(ctx.cookie("session"), Some("s1"));
        assert_eq!(ctx.param("missing"), None);
    }

    #[test]
    fn test_defaults() {
        let ctx = RequestContext::new();
        assert_eq!(ctx.param_or("room", "main"), "main");
        assert_eq!(ctx.query_or("page", "1"), "1");
        assert_eq!(ctx.cookie_or("lang", "en"), "en");
    }

    #[test]
    fn test_locals_are_typed() {
        let ctx = RequestContext::new().with_local("user_id", 42u64);

        assert_eq!(ctx.local::<u64>("user_id"), Some(&42));
        assert_eq!(ctx.local::<String>("user_id"), None);
        assert_eq!(ctx.local::<u64>("missing"), None);
    }

    #[test]
    fn test_debug_lists_local_keys() {
        let ctx = RequestContext::new().with_local("user", "alice".to_string());
        let debug = format!("{ctx:?}");
        assert!(debug.contains("user"));
    }
}
