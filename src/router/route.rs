use std::collections::HashMap;
use std::sync::Arc;

use http::Method;
use regex::Captures;

use super::pattern::{compile, CompiledPattern};
use super::ParamVec;
use crate::config::RouteConfig;
use crate::error::ConfigError;
use crate::handler::{Handler, HandlerRef, HandlerRegistry};

/// Methods a route may be declared for. OPTIONS and HEAD are answered by the
/// router itself.
pub const ROUTE_METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
];

/// One entry of the routing table.
///
/// Immutable after construction and free of per-request state; matching hands
/// back a [`PathMatch`] token instead of remembering captures.
#[derive(Debug, Clone)]
pub struct Route {
    path: String,
    method: Method,
    pattern: CompiledPattern,
    handler: HandlerRef,
    param_patterns: HashMap<String, String>,
}

impl Route {
    /// Create a route for `path` and `method`.
    ///
    /// # Errors
    ///
    /// Fails when the template is malformed or `method` is not one of
    /// [`ROUTE_METHODS`].
    pub fn new(path: &str, method: Method, handler: HandlerRef) -> Result<Self, ConfigError> {
        if !ROUTE_METHODS.contains(&method) {
            return Err(ConfigError::InvalidMethod(method.to_string()));
        }
        let pattern = compile(path)?;
        Ok(Self {
            path: path.to_string(),
            method,
            pattern,
            handler,
            param_patterns: HashMap::new(),
        })
    }

    /// Create a route from a textual method name (case-insensitive).
    ///
    /// # Errors
    ///
    /// Same as [`Route::new`]; an empty or unknown method is
    /// [`ConfigError::InvalidMethod`].
    pub fn create(path: &str, method: &str, handler: HandlerRef) -> Result<Self, ConfigError> {
        let upper = method.trim().to_ascii_uppercase();
        let parsed = ROUTE_METHODS
            .iter()
            .find(|m| m.as_str() == upper)
            .cloned()
            .ok_or_else(|| ConfigError::InvalidMethod(method.to_string()))?;
        Self::new(path, parsed, handler)
    }

    /// Create a route from a configuration entry.
    ///
    /// # Errors
    ///
    /// Same as [`Route::create`].
    pub fn from_config(config: RouteConfig) -> Result<Self, ConfigError> {
        let RouteConfig {
            path,
            method,
            processor,
            param_patterns,
        } = config;
        Ok(Self::create(&path, &method, processor.into())?.with_param_patterns(param_patterns))
    }

    /// Attach per-parameter patterns. Stored for introspection only; matching
    /// uses the constraints written in the template.
    #[must_use]
    pub fn with_param_patterns(mut self, param_patterns: HashMap<String, String>) -> Self {
        self.param_patterns = param_patterns;
        self
    }

    /// Template as registered.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn pattern(&self) -> &CompiledPattern {
        &self.pattern
    }

    #[must_use]
    pub fn handler(&self) -> &HandlerRef {
        &self.handler
    }

    #[must_use]
    pub fn param_patterns(&self) -> &HashMap<String, String> {
        &self.param_patterns
    }

    /// Whether a request with `method` is served by this route. HEAD is served by GET routes.
    #[inline]
    #[must_use]
    pub fn accepts_method(&self, method: &Method) -> bool {
        self.method == *method || (*method == Method::HEAD && self.method == Method::GET)
    }

    /// Structural match only, ignoring the method.
    #[inline]
    #[must_use]
    pub fn is_path_match(&self, path: &str) -> bool {
        self.pattern.is_match(path)
    }

    /// Match a request path and method.
    ///
    /// `None` when the path does not match structurally. Otherwise the returned
    /// token records whether the method matched as well and carries the captures
    /// needed by [`PathMatch::bind`].
    #[must_use]
    pub fn matches<'r, 'p>(&'r self, path: &'p str, method: &Method) -> Option<PathMatch<'r, 'p>> {
        let captures = self.pattern.captures(path)?;
        Some(PathMatch {
            route: self,
            captures,
            method_match: self.accepts_method(method),
        })
    }

    /// Produce the handler for one request.
    ///
    /// # Errors
    ///
    /// Fails when a named handler type is unknown or cannot be constructed.
    pub fn resolve_handler(&self, registry: &HandlerRegistry) -> Result<Arc<dyn Handler>, ConfigError> {
        self.handler.resolve(registry)
    }
}

/// Successful structural match of a request path against one [`Route`].
#[derive(Debug)]
pub struct PathMatch<'r, 'p> {
    route: &'r Route,
    captures: Captures<'p>,
    method_match: bool,
}

impl<'r> PathMatch<'r, '_> {
    #[must_use]
    pub fn route(&self) -> &'r Route {
        self.route
    }

    /// Whether the request method is accepted by the route.
    #[must_use]
    pub fn is_method_match(&self) -> bool {
        self.method_match
    }

    /// Captured values paired with parameter names, in declaration order.
    #[must_use]
    pub fn params(&self) -> ParamVec {
        self.route
            .pattern
            .param_names()
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let value = self
                    .captures
                    .get(idx + 1)
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default();
                (Arc::clone(name), value)
            })
            .collect()
    }

    /// Consume the match: extract parameters and resolve the handler.
    ///
    /// # Errors
    ///
    /// Fails when the route's handler cannot be resolved.
    pub fn bind(self, registry: &HandlerRegistry) -> Result<Binding, ConfigError> {
        let handler = self.route.resolve_handler(registry)?;
        Ok(Binding {
            params: self.params(),
            handler,
        })
    }
}

/// Parameters and handler produced by [`PathMatch::bind`].
pub struct Binding {
    /// Path parameters in declaration order
    pub params: ParamVec,
    /// Handler instance for this request
    pub handler: Arc<dyn Handler>,
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}
