//! # simplerouter
//!
//! **simplerouter** is a small, synchronous HTTP request router. Routes are path
//! templates with optionally constrained placeholders (`/users/{id:\d+}`); the
//! router picks the first route matching the request path and method, extracts
//! the path parameters, runs the route's handler and normalizes its output into
//! an HTTP response (status code, headers, body, content type, CORS headers).
//!
//! ## Architecture
//!
//! - **[`router`]** - template compilation, routes and request resolution
//! - **[`handler`]** - the [`handler::Handler`] trait, handler references and the
//!   name-to-constructor registry
//! - **[`request`]** - [`RequestContext`], the explicit per-request input
//! - **[`response`]** - [`Response`], the model handlers fill in
//! - **[`server`]** - rendering a [`Response`] into an `http::Response`
//! - **[`config`]** - router options and route tables from TOML/YAML/JSON files
//! - **[`error`]** - configuration and request error types
//! - **[`logging`]** - `tracing` subscriber setup
//! - **[`cli`]** - the `simplerouter` command line
//!
//! ## Request Flow
//!
//! ```text
//! RequestContext ──► Router::resolve ──► Route::matches ──► PathMatch::bind
//!                                                               │
//!        http::Response ◄── Router::render ◄── defaults ◄── Handler::execute
//! ```
//!
//! 1. The configured path prefix is stripped.
//! 2. `OPTIONS` is answered directly with `Access-Control-Allow-Methods`.
//! 3. Routes are tried in registration order; `HEAD` is served by `GET` routes.
//! 4. No match gives 404, a path match with the wrong method gives 405 and an
//!    `Allow` header.
//! 5. After the handler ran the router applies the default response type, the
//!    `Content-Type` and `Location` headers and a 200/204 status code.
//!
//! ## Quick Start
//!
//! ```rust
//! use simplerouter::handler::HandlerRef;
//! use simplerouter::response::TYPE_JSON;
//! use simplerouter::{Method, RequestContext, Router, RouterOptions, StatusCode};
//!
//! let mut router = Router::new()
//!     .with_options(RouterOptions::default().with_default_response_type(TYPE_JSON));
//! router
//!     .create_route("/hello/{name}", Method::GET, HandlerRef::from_fn(|ctx, res| {
//!         res.set_data(serde_json::json!({ "hello": ctx.path_param("name") }));
//!         Ok(())
//!     }))
//!     .unwrap();
//!
//! let out = router.handle(RequestContext::new(Method::GET, "/hello/world"));
//! assert_eq!(out.status(), StatusCode::OK);
//! assert_eq!(out.body().as_slice(), br#"{"hello":"world"}"#);
//!
//! let out = router.handle(RequestContext::new(Method::POST, "/hello/world"));
//! assert_eq!(out.status(), StatusCode::METHOD_NOT_ALLOWED);
//! assert_eq!(out.headers()["allow"], "GET");
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod handler;
pub mod logging;
pub mod request;
pub mod response;
pub mod router;
pub mod server;

pub use http::{Method, StatusCode};

pub use config::{load_config, AppConfig, RouteConfig, RouterOptions};
pub use error::{ConfigError, RequestError, ResolveError};
pub use handler::{Handler, HandlerRef, HandlerRegistry};
pub use request::RequestContext;
pub use response::Response;
pub use router::{Route, Router};
