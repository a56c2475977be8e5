//! # Response Model
//!
//! [`Response`] accumulates what a handler wants to answer: status code, body
//! data, response type, redirect location, headers and the CORS origin
//! allow-list. The router fills in defaults after the handler ran and
//! [`crate::server::render`] turns the model into an `http::Response`.
//!
//! Body data is kept as a [`serde_json::Value`]. JSON-family response types are
//! serialized on send; for every other type string data is written verbatim.

mod headers;

pub use headers::{HeaderEntry, HeaderMultimap};

use http::StatusCode;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::RequestError;

/// `application/json`
pub const TYPE_JSON: &str = "application/json";
/// `application/vnd.api+json`
pub const TYPE_JSONAPI: &str = "application/vnd.api+json";
/// `text/plain`
pub const TYPE_PLAIN: &str = "text/plain";
/// `text/html`
pub const TYPE_HTML: &str = "text/html";

/// Whether `response_type` is one of the JSON-family types.
#[must_use]
pub fn is_json_type(response_type: &str) -> bool {
    let essence = response_type.split(';').next().unwrap_or_default().trim();
    essence.eq_ignore_ascii_case(TYPE_JSON) || essence.eq_ignore_ascii_case(TYPE_JSONAPI)
}

/// Response under construction for one request.
#[derive(Debug, Clone, Default)]
pub struct Response {
    code: Option<StatusCode>,
    data: Option<Value>,
    response_type: Option<String>,
    location: Option<String>,
    headers: HeaderMultimap,
    cors_origins: Vec<String>,
}

impl Response {
    /// Create an empty response.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_code(&mut self, code: StatusCode) {
        self.code = Some(code);
    }

    #[must_use]
    pub fn code(&self) -> Option<StatusCode> {
        self.code
    }

    /// Set the response type, e.g. [`TYPE_JSON`].
    pub fn set_type(&mut self, response_type: impl Into<String>) {
        self.response_type = Some(response_type.into());
    }

    #[must_use]
    pub fn response_type(&self) -> Option<&str> {
        self.response_type.as_deref()
    }

    pub fn set_data(&mut self, data: Value) {
        self.data = Some(data);
    }

    /// Serialize `data` and use it as the body.
    ///
    /// # Errors
    ///
    /// Internal error when `data` cannot be represented as JSON.
    pub fn set_json<T: Serialize>(&mut self, data: &T) -> Result<(), RequestError> {
        let value = serde_json::to_value(data)
            .map_err(|err| RequestError::internal(format!("response data not serializable: {err}")))?;
        self.data = Some(value);
        Ok(())
    }

    /// Body data; `None` when unset or explicitly `null`.
    #[must_use]
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref().filter(|v| !v.is_null())
    }

    pub(crate) fn has_data(&self) -> bool {
        self.data().is_some()
    }

    /// Set a redirect location; the router emits it as `Location`, prefixed with
    /// its configured request path prefix.
    pub fn set_location(&mut self, path: impl Into<String>) {
        self.location = Some(path.into());
    }

    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Set (`append == false`) or add (`append == true`) a header value.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>, append: bool) {
        self.headers.set(name, value, append);
    }

    #[must_use]
    pub fn is_header_set(&self, name: &str) -> bool {
        self.headers.contains(name)
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&HeaderEntry> {
        self.headers.get(name)
    }

    /// Values of `name` joined with `", "`.
    #[must_use]
    pub fn header_joined(&self, name: &str) -> Option<String> {
        self.headers.get_joined(name)
    }

    pub fn clear_header(&mut self, name: &str) {
        self.headers.remove(name);
    }

    pub fn clear_headers(&mut self) {
        self.headers.clear();
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMultimap {
        &self.headers
    }

    /// Write `value` into the body at a dot-separated key path.
    ///
    /// `add_response_data("error.code", json!(404))` turns an empty body into
    /// `{"error": {"code": 404}}` and leaves sibling keys of an existing object
    /// body in place.
    ///
    /// # Errors
    ///
    /// Internal error when the body, or a value on the key path, is not an object.
    pub fn add_response_data(&mut self, key_path: &str, value: Value) -> Result<(), RequestError> {
        self.add_response_data_with_separator(key_path, value, '.')
    }

    /// [`add_response_data`](Self::add_response_data) with a custom key separator.
    ///
    /// # Errors
    ///
    /// Internal error when the body, or a value on the key path, is not an object.
    pub fn add_response_data_with_separator(
        &mut self,
        key_path: &str,
        value: Value,
        separator: char,
    ) -> Result<(), RequestError> {
        let data = self.data.get_or_insert_with(|| Value::Object(Map::new()));
        if data.is_null() {
            *data = Value::Object(Map::new());
        }
        let Value::Object(root) = data else {
            return Err(RequestError::internal(
                "add_response_data() used on non-object response data",
            ));
        };

        let mut current = root;

        let mut keys = key_path.split(separator).peekable();
        while let Some(key) = keys.next() {
            if keys.peek().is_none() {
                current.insert(key.to_string(), value);
                return Ok(());
            }
            let next = current
                .entry(key.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            current = match next {
                Value::Object(map) => map,
                _ => {
                    return Err(RequestError::internal(format!(
                        "add_response_data() cannot descend into non-object key '{key}'"
                    )))
                }
            };
        }
        Ok(())
    }

    /// Replace the CORS origin allow-list with a single origin (`*` for any).
    pub fn cors_set_origin(&mut self, origin: &str) {
        self.cors_origins = vec![origin.to_lowercase()];
    }

    pub fn cors_add_origin(&mut self, origin: &str) {
        self.cors_origins.push(origin.to_lowercase());
    }

    /// Lower-cased CORS origin allow-list.
    #[must_use]
    pub fn cors_origins(&self) -> &[String] {
        &self.cors_origins
    }

    pub fn cors_allow_credentials(&mut self, allowed: bool) {
        self.set_header(
            "Access-Control-Allow-Credentials",
            if allowed { "true" } else { "false" },
            false,
        );
    }

    /// Add a header to `Access-Control-Allow-Headers`, keeping it a single
    /// comma-separated value.
    pub fn cors_add_allowed_header(&mut self, header: &str) {
        let value = match self.header_joined("Access-Control-Allow-Headers") {
            Some(prev) => format!("{prev}, {header}"),
            None => header.to_string(),
        };
        self.set_header("Access-Control-Allow-Headers", value, false);
    }

    pub fn cors_add_allowed_headers<I, S>(&mut self, headers: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for header in headers {
            self.cors_add_allowed_header(header.as_ref());
        }
    }

    pub fn cors_set_max_age(&mut self, max_age_secs: u64) {
        self.set_header("Access-Control-Max-Age", max_age_secs.to_string(), false);
    }
}
