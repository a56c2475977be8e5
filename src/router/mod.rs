//! # Router Module
//!
//! Path matching and request resolution.
//!
//! ## Overview
//!
//! The router works in two phases:
//!
//! 1. **Compilation**: at startup every path template (e.g. `/pets/{id:\d+}`) is
//!    compiled into an anchored regex plus its ordered parameter names
//!    ([`compile`]). Malformed templates fail here, never at request time.
//!
//! 2. **Matching**: for each request the router walks the routes in registration
//!    order. The first route whose template matches the path and whose method
//!    accepts the request wins. Routes that only matched the path contribute to
//!    the `Allow` header of a 405 answer; when nothing matched the answer is 404.
//!
//! ## Example
//!
//! ```rust
//! use simplerouter::handler::HandlerRef;
//! use simplerouter::{Method, RequestContext, Router, StatusCode};
//!
//! let mut router = Router::new();
//! router
//!     .create_route(r"/pets/{id:\d+}", Method::GET, HandlerRef::from_fn(|ctx, res| {
//!         res.set_data(serde_json::json!({ "id": ctx.path_param("id") }));
//!         Ok(())
//!     }))
//!     .unwrap();
//!
//! let mut ctx = RequestContext::new(Method::GET, "/pets/42");
//! let response = router.resolve(&mut ctx).unwrap();
//! assert_eq!(response.code(), Some(StatusCode::OK));
//! assert_eq!(ctx.path_param("id"), Some("42"));
//! ```

mod core;
pub mod pattern;
mod route;

use std::sync::Arc;

use smallvec::SmallVec;

pub use self::core::Router;
pub use pattern::{compile, CompiledPattern, DEFAULT_CONSTRAINT};
pub use route::{Binding, PathMatch, Route, ROUTE_METHODS};

/// Maximum number of parameters stored inline before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Ordered `(name, value)` pairs; names are shared with the compiled pattern.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;
