//! # Handler Module
//!
//! Handlers are the business end of a route. After the router has matched a
//! request and bound its path parameters it calls [`Handler::execute`] with the
//! request context and a mutable [`Response`] that the handler fills in.
//!
//! ## Handler References
//!
//! A route does not have to own a handler instance. [`HandlerRef`] supports three
//! shapes:
//!
//! - [`HandlerRef::Instance`] - a pre-built, shared handler used for every request
//! - [`HandlerRef::Type`] - the name of a type registered in a [`HandlerRegistry`],
//!   constructed fresh for every request without arguments
//! - [`HandlerRef::TypeWithArgs`] - a registered type name plus an ordered list of
//!   constructor arguments
//!
//! Named references let route tables live in configuration files while the code
//! only registers constructors once at startup:
//!
//! ```rust
//! use simplerouter::handler::{HandlerRef, HandlerRegistry};
//! use simplerouter::{Method, Router};
//!
//! let mut router = Router::new().with_registry(HandlerRegistry::with_builtins());
//! router.create_route("/echo/{word}", Method::GET, HandlerRef::named("echo")).unwrap();
//! ```

mod builtin;
mod registry;

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::RequestError;
use crate::request::RequestContext;
use crate::response::Response;

pub use builtin::{EchoHandler, StaticHandler};
pub use registry::{HandlerConstructor, HandlerRegistry};

/// Contract implemented by request handlers.
///
/// Handlers read the request through [`RequestContext`] (path parameters, query
/// and form parameters, headers, JSON body) and describe their answer by mutating
/// the [`Response`]. Status code and content type defaults are applied by the
/// router after `execute` returns.
pub trait Handler: Send + Sync {
    /// Process one request.
    ///
    /// # Errors
    ///
    /// Returning an error aborts the request; the router converts it into an
    /// error response with the error's status code.
    fn execute(&self, ctx: &RequestContext, response: &mut Response) -> Result<(), RequestError>;
}

/// Adapter that turns a closure into a [`Handler`].
pub struct FnHandler<F>(F);

impl<F> Handler for FnHandler<F>
where
    F: Fn(&RequestContext, &mut Response) -> Result<(), RequestError> + Send + Sync,
{
    fn execute(&self, ctx: &RequestContext, response: &mut Response) -> Result<(), RequestError> {
        (self.0)(ctx, response)
    }
}

/// Wrap a closure as a handler.
pub fn from_fn<F>(f: F) -> FnHandler<F>
where
    F: Fn(&RequestContext, &mut Response) -> Result<(), RequestError> + Send + Sync,
{
    FnHandler(f)
}

/// How a route refers to its handler.
#[derive(Clone)]
pub enum HandlerRef {
    /// Shared, already constructed handler
    Instance(Arc<dyn Handler>),
    /// Registered type constructed without arguments
    Type(String),
    /// Registered type constructed with the given arguments
    TypeWithArgs(String, Vec<Value>),
}

impl HandlerRef {
    /// Reference a pre-built handler.
    pub fn instance<H: Handler + 'static>(handler: H) -> Self {
        HandlerRef::Instance(Arc::new(handler))
    }

    /// Reference a closure handler.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&RequestContext, &mut Response) -> Result<(), RequestError> + Send + Sync + 'static,
    {
        HandlerRef::Instance(Arc::new(from_fn(f)))
    }

    /// Reference a registered type by name.
    pub fn named(name: impl Into<String>) -> Self {
        HandlerRef::Type(name.into())
    }

    /// Reference a registered type by name, with constructor arguments.
    pub fn with_args(name: impl Into<String>, args: Vec<Value>) -> Self {
        HandlerRef::TypeWithArgs(name.into(), args)
    }

    /// Registered type name, if this reference is not an instance.
    #[must_use]
    pub fn type_name(&self) -> Option<&str> {
        match self {
            HandlerRef::Instance(_) => None,
            HandlerRef::Type(name) | HandlerRef::TypeWithArgs(name, _) => Some(name),
        }
    }

    /// Produce a handler for one request.
    ///
    /// Instances are returned as-is; named types are constructed through `registry`.
    ///
    /// # Errors
    ///
    /// Fails when the type name is not registered or its constructor rejects the
    /// arguments.
    pub fn resolve(
        &self,
        registry: &HandlerRegistry,
    ) -> Result<Arc<dyn Handler>, crate::error::ConfigError> {
        match self {
            HandlerRef::Instance(handler) => Ok(Arc::clone(handler)),
            HandlerRef::Type(name) => registry.construct(name, &[]),
            HandlerRef::TypeWithArgs(name, args) => registry.construct(name, args),
        }
    }
}

impl fmt::Debug for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerRef::Instance(_) => write!(f, "Instance(<handler>)"),
            HandlerRef::Type(name) => f.debug_tuple("Type").field(name).finish(),
            HandlerRef::TypeWithArgs(name, args) => f
                .debug_tuple("TypeWithArgs")
                .field(name)
                .field(args)
                .finish(),
        }
    }
}

impl fmt::Display for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerRef::Instance(_) => write!(f, "<instance>"),
            HandlerRef::Type(name) | HandlerRef::TypeWithArgs(name, _) => write!(f, "{name}"),
        }
    }
}
