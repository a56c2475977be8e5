use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use super::{EchoHandler, Handler, StaticHandler};
use crate::error::ConfigError;

/// Constructor stored in a [`HandlerRegistry`].
pub type HandlerConstructor =
    Arc<dyn Fn(&[Value]) -> anyhow::Result<Arc<dyn Handler>> + Send + Sync>;

#[derive(Clone)]
enum Constructor {
    Plain(Arc<dyn Fn() -> Arc<dyn Handler> + Send + Sync>),
    WithArgs(HandlerConstructor),
}

/// Name → constructor table used to resolve [`super::HandlerRef::Type`] and
/// [`super::HandlerRef::TypeWithArgs`] references.
///
/// Constructors are registered once at startup. Every resolution builds a fresh
/// handler, so handlers constructed this way never share per-request state.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    constructors: HashMap<String, Constructor>,
}

impl HandlerRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the built-in handlers (`echo`, `static`).
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("echo", || EchoHandler);
        registry.register_with_args("static", StaticHandler::from_args);
        registry
    }

    /// Register a type constructed without arguments.
    ///
    /// Registering a name twice replaces the earlier constructor.
    pub fn register<H, F>(&mut self, name: impl Into<String>, constructor: F) -> &mut Self
    where
        H: Handler + 'static,
        F: Fn() -> H + Send + Sync + 'static,
    {
        let name = name.into();
        let ctor = Constructor::Plain(Arc::new(move || Arc::new(constructor()) as Arc<dyn Handler>));
        self.insert(name, ctor);
        self
    }

    /// Register a type whose constructor takes an ordered argument list.
    pub fn register_with_args<H, F>(&mut self, name: impl Into<String>, constructor: F) -> &mut Self
    where
        H: Handler + 'static,
        F: Fn(&[Value]) -> anyhow::Result<H> + Send + Sync + 'static,
    {
        let name = name.into();
        let ctor = Constructor::WithArgs(Arc::new(move |args: &[Value]| {
            constructor(args).map(|h| Arc::new(h) as Arc<dyn Handler>)
        }));
        self.insert(name, ctor);
        self
    }

    fn insert(&mut self, name: String, ctor: Constructor) {
        if self.constructors.insert(name.clone(), ctor).is_some() {
            warn!(handler_type = %name, "Replaced existing handler constructor");
        } else {
            debug!(handler_type = %name, total = self.constructors.len(), "Handler type registered");
        }
    }

    /// Whether `name` has a registered constructor.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Registered type names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Construct a handler of type `name`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownHandler`] when `name` is not registered, and
    /// [`ConfigError::HandlerConstruction`] when the constructor fails or when
    /// arguments are passed to a type registered without them.
    pub fn construct(&self, name: &str, args: &[Value]) -> Result<Arc<dyn Handler>, ConfigError> {
        let ctor = self
            .constructors
            .get(name)
            .ok_or_else(|| ConfigError::UnknownHandler(name.to_string()))?;

        match ctor {
            Constructor::Plain(_) if !args.is_empty() => Err(ConfigError::HandlerConstruction {
                name: name.to_string(),
                message: format!("takes no arguments, {} given", args.len()),
            }),
            Constructor::Plain(build) => Ok(build()),
            Constructor::WithArgs(build) => {
                build(args).map_err(|err| ConfigError::HandlerConstruction {
                    name: name.to_string(),
                    message: format!("{err:#}"),
                })
            }
        }
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("types", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_type() {
        let registry = HandlerRegistry::new();
        let err = registry.construct("Missing", &[]).err();
        assert!(matches!(err, Some(ConfigError::UnknownHandler(name)) if name == "Missing"));
    }

    #[test]
    fn test_plain_constructor_rejects_args() {
        let registry = HandlerRegistry::with_builtins();
        assert!(registry.construct("echo", &[]).is_ok());
        assert!(matches!(
            registry.construct("echo", &[json!(1)]),
            Err(ConfigError::HandlerConstruction { .. })
        ));
    }

    #[test]
    fn test_constructor_with_args() {
        let registry = HandlerRegistry::with_builtins();
        assert!(registry.construct("static", &[json!(201), json!("created")]).is_ok());
        assert!(matches!(
            registry.construct("static", &[json!("not a status")]),
            Err(ConfigError::HandlerConstruction { .. })
        ));
    }

    #[test]
    fn test_names_sorted() {
        let registry = HandlerRegistry::with_builtins();
        assert_eq!(registry.names(), vec!["echo", "static"]);
    }
}
