//! Request context handed to handlers.
//!
//! [`RequestContext`] replaces ambient, process-wide request state: everything a
//! handler may ask about the request (method, path, path and query parameters,
//! form fields, headers, body) travels in one explicit value.

use std::env;
use std::sync::Arc;

use http::Method;
use once_cell::sync::OnceCell;
use serde_json::Value;
use smallvec::SmallVec;
use tracing::debug;

use crate::error::RequestError;
use crate::router::ParamVec;

/// Maximum inline headers before heap allocation.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Header list; names keep their original spelling and compare case-insensitively.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Everything the router and handlers know about one request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    method: Method,
    path: String,
    path_params: ParamVec,
    query_params: ParamVec,
    headers: HeaderVec,
    body: Vec<u8>,
    json_body: OnceCell<Value>,
}

impl RequestContext {
    /// Create a context for `method` and `path`.
    ///
    /// A query string after `?` is split off and parsed into query parameters.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        let mut path = path.into();
        let query_params = match path.find('?') {
            Some(pos) => {
                let params = parse_query_params(&path[pos + 1..]);
                path.truncate(pos);
                params
            }
            None => ParamVec::new(),
        };

        Self {
            method,
            path,
            path_params: ParamVec::new(),
            query_params,
            headers: HeaderVec::new(),
            body: Vec::new(),
            json_body: OnceCell::new(),
        }
    }

    /// Build a context from CGI-style environment variables.
    ///
    /// Reads `SCRIPT_NAME` (path), `REQUEST_METHOD`, `QUERY_STRING`,
    /// `CONTENT_TYPE` and every `HTTP_*` variable as a header. The body is not
    /// read; attach it with [`with_body`](Self::with_body).
    ///
    /// # Errors
    ///
    /// Internal error when the path or method is missing or the method is not
    /// a valid HTTP token.
    pub fn from_cgi_env() -> Result<Self, RequestError> {
        let path = env::var("SCRIPT_NAME")
            .ok()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| RequestError::internal("request path not set"))?;
        let method = env::var("REQUEST_METHOD")
            .ok()
            .filter(|m| !m.is_empty())
            .ok_or_else(|| RequestError::internal("request method not set"))?;
        let method = Method::from_bytes(method.as_bytes())
            .map_err(|_| RequestError::internal(format!("illegal request method {method}")))?;

        let mut ctx = Self::new(method, path);
        if let Ok(query) = env::var("QUERY_STRING") {
            ctx = ctx.with_query(&query);
        }
        if let Ok(content_type) = env::var("CONTENT_TYPE") {
            ctx = ctx.with_header("content-type", content_type);
        }
        for (key, value) in env::vars() {
            if let Some(name) = key.strip_prefix("HTTP_") {
                let name = name.to_ascii_lowercase().replace('_', "-");
                ctx = ctx.with_header(name, value);
            }
        }

        debug!(method = %ctx.method, path = %ctx.path, headers = ctx.headers.len(), "Request context read from environment");
        Ok(ctx)
    }

    /// Replace the query parameters with those parsed from `query`.
    #[must_use]
    pub fn with_query(mut self, query: &str) -> Self {
        self.query_params = parse_query_params(query.strip_prefix('?').unwrap_or(query));
        self
    }

    /// Append a request header.
    #[must_use]
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.push((Arc::from(name.as_ref()), value.into()));
        self
    }

    /// Attach the raw request body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self.json_body = OnceCell::new();
        self
    }

    /// Request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Request path (after the router stripped its configured prefix).
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    pub(crate) fn set_path(&mut self, path: String) {
        self.path = path;
    }

    pub(crate) fn set_path_params(&mut self, params: ParamVec) {
        self.path_params = params;
    }

    /// Path parameters in declaration order.
    #[must_use]
    pub fn path_params(&self) -> &ParamVec {
        &self.path_params
    }

    /// Path parameter by name.
    ///
    /// When a template declares the same name twice the last occurrence wins.
    #[inline]
    #[must_use]
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Query parameters in the order they appeared.
    #[must_use]
    pub fn query_params(&self) -> &ParamVec {
        &self.query_params
    }

    /// Query parameter by name (last occurrence wins).
    #[inline]
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Form fields of an `application/x-www-form-urlencoded` body.
    ///
    /// Empty for any other content type.
    #[must_use]
    pub fn post_params(&self) -> ParamVec {
        let is_form = self
            .header("content-type")
            .and_then(|ct| ct.split(';').next())
            .is_some_and(|ct| ct.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE));
        if !is_form {
            return ParamVec::new();
        }
        url::form_urlencoded::parse(&self.body)
            .map(|(k, v)| (Arc::from(k.as_ref()), v.into_owned()))
            .collect()
    }

    /// Form field by name (last occurrence wins).
    #[must_use]
    pub fn post_param(&self, name: &str) -> Option<String> {
        self.post_params()
            .into_iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v)
    }

    /// Header by name (case-insensitive).
    #[inline]
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderVec {
        &self.headers
    }

    /// Raw request body.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Request body decoded as JSON.
    ///
    /// Decoded once and cached for subsequent calls.
    ///
    /// # Errors
    ///
    /// `400 Bad Request` ("invalid json") when the body is empty, not valid JSON,
    /// or the JSON literal `null`.
    pub fn json_body(&self) -> Result<&Value, RequestError> {
        self.json_body.get_or_try_init(|| {
            match serde_json::from_slice::<Value>(&self.body) {
                Ok(Value::Null) | Err(_) => Err(RequestError::bad_request("invalid json")),
                Ok(value) => Ok(value),
            }
        })
    }
}

/// Parse a query string into ordered, URL-decoded pairs.
#[must_use]
pub fn parse_query_params(query: &str) -> ParamVec {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (Arc::from(k.as_ref()), v.into_owned()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Mutex, OnceLock};

    // Serialize environment mutations to avoid test races
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn with_cgi_env<T>(vars: &[(&str, Option<&str>)], f: impl FnOnce() -> T) -> T {
        let _guard = ENV_LOCK
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        let saved: Vec<_> = vars.iter().map(|(k, _)| (*k, env::var(k).ok())).collect();
        for (key, value) in vars {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
        let result = f();
        for (key, value) in saved {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
        result
    }

    #[test]
    fn test_from_cgi_env_reads_request() {
        let ctx = with_cgi_env(
            &[
                ("SCRIPT_NAME", Some("/api/items/7")),
                ("REQUEST_METHOD", Some("PUT")),
                ("QUERY_STRING", Some("dry_run=1")),
                ("CONTENT_TYPE", Some("application/json")),
                ("HTTP_ORIGIN", Some("https://app.example.com")),
                ("HTTP_X_REQUEST_ID", Some("abc-123")),
            ],
            RequestContext::from_cgi_env,
        )
        .unwrap();

        assert_eq!(ctx.method(), &Method::PUT);
        assert_eq!(ctx.path(), "/api/items/7");
        assert_eq!(ctx.query_param("dry_run"), Some("1"));
        assert_eq!(ctx.header("content-type"), Some("application/json"));
        assert_eq!(ctx.header("origin"), Some("https://app.example.com"));
        assert_eq!(ctx.header("x-request-id"), Some("abc-123"));
    }

    #[test]
    fn test_from_cgi_env_requires_path_and_method() {
        let err = with_cgi_env(
            &[("SCRIPT_NAME", None), ("REQUEST_METHOD", Some("GET"))],
            RequestContext::from_cgi_env,
        )
        .unwrap_err();
        assert!(err.is_internal());
        assert!(matches!(&err, RequestError::Internal { message, .. } if message == "request path not set"));

        let err = with_cgi_env(
            &[("SCRIPT_NAME", Some("/items")), ("REQUEST_METHOD", Some(""))],
            RequestContext::from_cgi_env,
        )
        .unwrap_err();
        assert!(matches!(&err, RequestError::Internal { message, .. } if message == "request method not set"));
    }

    #[test]
    fn test_query_split_from_path() {
        let ctx = RequestContext::new(Method::GET, "/users?limit=10&name=a%20b&limit=20");
        assert_eq!(ctx.path(), "/users");
        assert_eq!(ctx.query_param("limit"), Some("20"));
        assert_eq!(ctx.query_param("name"), Some("a b"));
        assert_eq!(ctx.query_param("missing"), None);
    }

    #[test]
    fn test_headers_case_insensitive() {
        let ctx = RequestContext::new(Method::GET, "/").with_header("Origin", "https://example.com");
        assert_eq!(ctx.header("origin"), Some("https://example.com"));
        assert_eq!(ctx.header("ORIGIN"), Some("https://example.com"));
    }

    #[test]
    fn test_post_params_require_form_content_type() {
        let ctx = RequestContext::new(Method::POST, "/login")
            .with_header("Content-Type", "application/x-www-form-urlencoded; charset=utf-8")
            .with_body("user=alice&remember=1");
        assert_eq!(ctx.post_param("user").as_deref(), Some("alice"));
        assert_eq!(ctx.post_params().len(), 2);

        let ctx = RequestContext::new(Method::POST, "/login").with_body("user=alice");
        assert!(ctx.post_params().is_empty());
    }

    #[test]
    fn test_json_body() {
        let ctx = RequestContext::new(Method::POST, "/items").with_body(r#"{"name":"widget"}"#);
        assert_eq!(ctx.json_body().unwrap(), &json!({"name": "widget"}));

        let ctx = RequestContext::new(Method::POST, "/items").with_body("{not json");
        let err = ctx.json_body().unwrap_err();
        assert_eq!(err.status(), http::StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "invalid json");

        let ctx = RequestContext::new(Method::POST, "/items");
        assert!(ctx.json_body().is_err());
    }
}
