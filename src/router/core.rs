use std::time::{Duration, Instant};

use http::{Method, StatusCode};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::route::{Binding, Route};
use crate::config::{AppConfig, RouteConfig, RouterOptions};
use crate::error::{ConfigError, RequestError, ResolveError};
use crate::handler::{HandlerRef, HandlerRegistry};
use crate::request::RequestContext;
use crate::response::{is_json_type, Response};

/// Ordered routing table plus the options and handler registry it resolves with.
///
/// Routes are tried in registration order and the first route matching both
/// path and method wins. The router holds no per-request state, so one instance
/// can be shared behind an `Arc` by any number of threads.
#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: Vec<Route>,
    options: RouterOptions,
    registry: HandlerRegistry,
}

impl Router {
    /// Create an empty router with default options and an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_options(mut self, options: RouterOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_registry(mut self, registry: HandlerRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Build a router from a loaded configuration file.
    ///
    /// # Errors
    ///
    /// Fails on the first route that does not compile or names an unregistered
    /// handler type.
    pub fn from_config(config: AppConfig, registry: HandlerRegistry) -> Result<Self, ConfigError> {
        let AppConfig { router, routes } = config;
        let mut this = Self::new().with_options(router).with_registry(registry);
        this.import_routes(routes)?;

        let routes_summary: Vec<String> = this
            .routes
            .iter()
            .take(10)
            .map(|r| format!("{} {}", r.method(), r.path()))
            .collect();
        info!(
            routes_count = this.routes.len(),
            path_prefix = %this.options.request_path_prefix,
            routes_summary = ?routes_summary,
            "Routing table loaded"
        );
        Ok(this)
    }

    #[must_use]
    pub fn options(&self) -> &RouterOptions {
        &self.options
    }

    /// Set an option by name, see [`RouterOptions::set_option`].
    ///
    /// # Errors
    ///
    /// Unknown option names and wrongly shaped values are rejected.
    pub fn set_option(&mut self, name: &str, value: &Value) -> Result<&mut Self, ConfigError> {
        self.options.set_option(name, value)?;
        Ok(self)
    }

    #[must_use]
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut HandlerRegistry {
        &mut self.registry
    }

    /// Append a route to the table.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownHandler`] when the route names a handler type that
    /// is not registered.
    pub fn add_route(&mut self, route: Route) -> Result<&Route, ConfigError> {
        if let Some(name) = route.handler().type_name() {
            if !self.registry.contains(name) {
                return Err(ConfigError::UnknownHandler(name.to_string()));
            }
        }
        debug!(
            method = %route.method(),
            path = %route.path(),
            handler = %route.handler(),
            pattern = %route.pattern().as_str(),
            "Route registered"
        );
        let idx = self.routes.len();
        self.routes.push(route);
        Ok(&self.routes[idx])
    }

    /// Compile and append a route.
    ///
    /// # Errors
    ///
    /// See [`Route::new`] and [`Router::add_route`].
    pub fn create_route(
        &mut self,
        path: &str,
        method: Method,
        handler: HandlerRef,
    ) -> Result<&Route, ConfigError> {
        let route = Route::new(path, method, handler)?;
        self.add_route(route)
    }

    /// Append a route described by a configuration entry.
    ///
    /// # Errors
    ///
    /// See [`Route::from_config`] and [`Router::add_route`].
    pub fn import_route(&mut self, config: RouteConfig) -> Result<&Route, ConfigError> {
        let route = Route::from_config(config)?;
        self.add_route(route)
    }

    /// Append several configured routes, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// See [`Router::import_route`].
    pub fn import_routes<I>(&mut self, configs: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = RouteConfig>,
    {
        for config in configs {
            self.import_route(config)?;
        }
        Ok(())
    }

    /// Routes in match order.
    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Print all registered routes to stdout.
    pub fn dump_routes(&self) {
        println!(
            "[routes] prefix={} count={}",
            self.options.request_path_prefix,
            self.routes.len()
        );
        for route in &self.routes {
            println!(
                "[route] {} {} -> {} ({})",
                route.method(),
                route.path(),
                route.handler(),
                route.pattern().as_str()
            );
        }
    }

    /// Methods of all routes whose template structurally matches `path`,
    /// deduplicated, in registration order.
    #[must_use]
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let mut methods: Vec<Method> = Vec::new();
        for route in self.routes.iter().filter(|r| r.is_path_match(path)) {
            if !methods.contains(route.method()) {
                methods.push(route.method().clone());
            }
        }
        methods
    }

    /// Resolve and dispatch one request.
    ///
    /// Strips the configured path prefix from `ctx`, answers OPTIONS itself,
    /// otherwise finds the first matching route, stores its path parameters in
    /// `ctx`, runs the handler and fills in response defaults.
    ///
    /// # Errors
    ///
    /// On failure the returned [`ResolveError`] carries the original error and
    /// a response annotated with its status code, the `Allow` header for 405
    /// and, for JSON response types, an error body.
    pub fn resolve(&self, ctx: &mut RequestContext) -> Result<Response, ResolveError> {
        let mut response = Response::new();
        match self.try_resolve(ctx, &mut response) {
            Ok(()) => Ok(response),
            Err(error) => {
                self.annotate_error(&error, &mut response);
                Err(ResolveError { error, response })
            }
        }
    }

    /// Resolve a request and render whatever came out of it, success or error.
    pub fn handle(&self, mut ctx: RequestContext) -> http::Response<Vec<u8>> {
        let response = match self.resolve(&mut ctx) {
            Ok(response) => response,
            Err(err) => {
                let (error, response) = err.into_parts();
                if error.is_internal() {
                    error!(
                        method = %ctx.method(),
                        path = %ctx.path(),
                        status = error.status().as_u16(),
                        error = %error,
                        "Request failed with internal error"
                    );
                } else {
                    warn!(
                        method = %ctx.method(),
                        path = %ctx.path(),
                        status = error.status().as_u16(),
                        error = %error,
                        "Request rejected"
                    );
                }
                response
            }
        };
        self.render(&ctx, response)
    }

    /// Turn a resolved response into an HTTP response for `ctx`.
    #[must_use]
    pub fn render(&self, ctx: &RequestContext, response: Response) -> http::Response<Vec<u8>> {
        crate::server::render(&self.options, ctx, response)
    }

    fn try_resolve(&self, ctx: &mut RequestContext, response: &mut Response) -> Result<(), RequestError> {
        self.strip_prefix(ctx)?;

        if *ctx.method() == Method::OPTIONS {
            self.collect_options(ctx, response);
            return Ok(());
        }

        let binding = self.resolve_path(ctx, response)?;
        ctx.set_path_params(binding.params);
        binding.handler.execute(ctx, response)?;

        self.finalize(response);
        Ok(())
    }

    fn strip_prefix(&self, ctx: &mut RequestContext) -> Result<(), RequestError> {
        let prefix = self.options.request_path_prefix.as_str();
        if prefix.is_empty() {
            return Ok(());
        }
        let stripped = ctx
            .path()
            .strip_prefix(prefix)
            .filter(|rest| rest.len() > 1 && rest.starts_with('/'))
            .map(str::to_string)
            .ok_or_else(|| {
                RequestError::internal(format!("path {} not prefixed by {prefix}/", ctx.path()))
            })?;
        ctx.set_path(stripped);
        Ok(())
    }

    fn collect_options(&self, ctx: &RequestContext, response: &mut Response) {
        let methods = self.allowed_methods(ctx.path());
        debug!(path = %ctx.path(), allowed = ?methods, "Answering preflight");
        response.set_code(StatusCode::OK);
        response.set_header("Access-Control-Allow-Methods", join_methods(&methods), false);
    }

    fn resolve_path(&self, ctx: &RequestContext, response: &mut Response) -> Result<Binding, RequestError> {
        let method = ctx.method();
        let path = ctx.path();
        debug!(method = %method, path = %path, routes = self.routes.len(), "Route match attempt");

        let match_start = Instant::now();
        let mut allowed: Vec<Method> = Vec::new();

        for route in &self.routes {
            let Some(path_match) = route.matches(path, method) else {
                continue;
            };
            if !path_match.is_method_match() {
                if !allowed.contains(route.method()) {
                    allowed.push(route.method().clone());
                }
                continue;
            }

            let binding = path_match.bind(&self.registry)?;
            let match_duration = match_start.elapsed();
            if match_duration > Duration::from_millis(1) {
                warn!(
                    method = %method,
                    path = %path,
                    handler = %route.handler(),
                    route_pattern = %route.path(),
                    path_params = ?binding.params,
                    duration_us = match_duration.as_micros(),
                    "Slow route matching detected"
                );
            } else {
                info!(
                    method = %method,
                    path = %path,
                    handler = %route.handler(),
                    route_pattern = %route.path(),
                    path_params = ?binding.params,
                    duration_us = match_duration.as_micros(),
                    "Route matched"
                );
            }
            return Ok(binding);
        }

        let match_duration = match_start.elapsed();
        if allowed.is_empty() {
            warn!(
                method = %method,
                path = %path,
                duration_us = match_duration.as_micros(),
                "No route matched"
            );
            return Err(RequestError::NotFound);
        }

        warn!(
            method = %method,
            path = %path,
            allowed = ?allowed,
            duration_us = match_duration.as_micros(),
            "Method not allowed"
        );
        response.set_header("Allow", join_methods(&allowed), false);
        Err(RequestError::MethodNotAllowed { allowed })
    }

    fn finalize(&self, response: &mut Response) {
        if response.response_type().is_none() {
            response.set_type(self.options.default_response_type.clone());
        }

        if response.has_data() && !response.is_header_set("Content-Type") {
            if let Some(response_type) = response.response_type().map(str::to_string) {
                response.set_header("Content-Type", response_type, false);
            }
        }

        if let Some(location) = response.location().map(str::to_string) {
            let location = format!("{}{location}", self.options.request_path_prefix);
            response.set_header("Location", location, false);
        }

        if response.code().is_none() {
            let code = if response.has_data() {
                StatusCode::OK
            } else {
                StatusCode::NO_CONTENT
            };
            response.set_code(code);
        }
    }

    fn annotate_error(&self, error: &RequestError, response: &mut Response) {
        let status = error.status();
        response.set_code(status);

        let response_type = response
            .response_type()
            .unwrap_or(self.options.default_response_type.as_str());
        if !is_json_type(response_type) {
            return;
        }

        let message = error.public_message(&self.options.internal_error_message);
        let written = response
            .add_response_data(&self.options.error_code_key, Value::from(status.as_u16()))
            .and_then(|()| response.add_response_data(&self.options.error_message_key, Value::String(message)));
        if let Err(err) = written {
            warn!(error = %err, status = status.as_u16(), "Could not write error body");
        }
    }
}

fn join_methods(methods: &[Method]) -> String {
    methods
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
