//! # Configuration
//!
//! Router options and route tables can be declared in a TOML, YAML or JSON file
//! and loaded with [`load_config`]:
//!
//! ```toml
//! [router]
//! request_path_prefix = "/api"
//! default_response_type = "application/json"
//! cors_permissive = true
//!
//! [[routes]]
//! path = "/users/{id:\\d+}"
//! method = "GET"
//! processor = "UserHandler"
//!
//! [[routes]]
//! path = "/health"
//! method = "GET"
//! processor = { type = "static", args = [200, { status = "ok" }, "application/json"] }
//! ```
//!
//! ## Environment Variables
//!
//! [`RouterOptions::apply_env`] overlays:
//!
//! - `SIMPLEROUTER_PATH_PREFIX` - request path prefix
//! - `SIMPLEROUTER_DEFAULT_TYPE` - default response type
//! - `SIMPLEROUTER_CORS_PERMISSIVE` - `true`/`false`/`1`/`0`

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::handler::HandlerRef;
use crate::response::TYPE_HTML;

/// Router behaviour switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RouterOptions {
    /// Prefix stripped from request paths before matching (e.g. `/api`)
    pub request_path_prefix: String,
    /// Response type used when a handler does not set one
    pub default_response_type: String,
    /// Dot-separated key path of the error message in JSON error bodies
    pub error_message_key: String,
    /// Dot-separated key path of the status code in JSON error bodies
    pub error_code_key: String,
    /// Message written in place of internal error details
    pub internal_error_message: String,
    /// Derive CORS allow-origin/headers/credentials from the request
    pub cors_permissive: bool,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            request_path_prefix: String::new(),
            default_response_type: TYPE_HTML.to_string(),
            error_message_key: "error.message".to_string(),
            error_code_key: "error.code".to_string(),
            internal_error_message: "internal server error".to_string(),
            cors_permissive: false,
        }
    }
}

impl RouterOptions {
    #[must_use]
    pub fn with_path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.request_path_prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn with_default_response_type(mut self, response_type: impl Into<String>) -> Self {
        self.default_response_type = response_type.into();
        self
    }

    #[must_use]
    pub fn with_error_keys(mut self, message_key: impl Into<String>, code_key: impl Into<String>) -> Self {
        self.error_message_key = message_key.into();
        self.error_code_key = code_key.into();
        self
    }

    #[must_use]
    pub fn with_internal_error_message(mut self, message: impl Into<String>) -> Self {
        self.internal_error_message = message.into();
        self
    }

    #[must_use]
    pub fn with_cors_permissive(mut self, enabled: bool) -> Self {
        self.cors_permissive = enabled;
        self
    }

    /// Set an option by name.
    ///
    /// Accepts the field names (`request_path_prefix`, ...) as well as the
    /// `OPT_*` constant names (`OPT_REQUEST_PATH_PREFIX`, `OPT_RESPONSE_TYPE`,
    /// `OPT_KEY_ERROR_MESSAGE`, `OPT_KEY_ERROR_CODE`, `OPT_INTERNAL_ERROR_MSG`,
    /// `OPT_CORS_PERMISSIVE`).
    ///
    /// # Errors
    ///
    /// [`ConfigError::IllegalKey`] for an unknown name, [`ConfigError::IllegalValue`]
    /// when the value has the wrong shape (a non-string response type, a
    /// non-boolean CORS flag).
    pub fn set_option(&mut self, name: &str, value: &Value) -> Result<(), ConfigError> {
        let illegal = || ConfigError::IllegalValue {
            key: name.to_string(),
            value: value.to_string(),
        };
        let as_string = || value.as_str().map(str::to_string).ok_or_else(illegal);

        match name {
            "request_path_prefix" | "OPT_REQUEST_PATH_PREFIX" => {
                self.request_path_prefix = as_string()?;
            }
            "default_response_type" | "OPT_RESPONSE_TYPE" => {
                self.default_response_type = as_string()?;
            }
            "error_message_key" | "OPT_KEY_ERROR_MESSAGE" => self.error_message_key = as_string()?,
            "error_code_key" | "OPT_KEY_ERROR_CODE" => self.error_code_key = as_string()?,
            "internal_error_message" | "OPT_INTERNAL_ERROR_MSG" => {
                self.internal_error_message = as_string()?;
            }
            "cors_permissive" | "OPT_CORS_PERMISSIVE" => {
                self.cors_permissive = value.as_bool().ok_or_else(illegal)?;
            }
            _ => return Err(ConfigError::IllegalKey(name.to_string())),
        }
        debug!(option = %name, value = %value, "Router option set");
        Ok(())
    }

    /// Overlay options from `SIMPLEROUTER_*` environment variables.
    ///
    /// # Errors
    ///
    /// [`ConfigError::IllegalValue`] when `SIMPLEROUTER_CORS_PERMISSIVE` is not
    /// a boolean.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(prefix) = env::var("SIMPLEROUTER_PATH_PREFIX") {
            self.request_path_prefix = prefix;
        }
        if let Ok(response_type) = env::var("SIMPLEROUTER_DEFAULT_TYPE") {
            if !response_type.is_empty() {
                self.default_response_type = response_type;
            }
        }
        if let Ok(flag) = env::var("SIMPLEROUTER_CORS_PERMISSIVE") {
            self.cors_permissive = parse_bool(&flag).ok_or_else(|| ConfigError::IllegalValue {
                key: "SIMPLEROUTER_CORS_PERMISSIVE".to_string(),
                value: flag,
            })?;
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Handler reference as written in a configuration file.
///
/// Either a bare type name or a table with `type` and optional `args`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HandlerSpec {
    /// `processor = "UserHandler"`
    Type(String),
    /// `processor = { type = "static", args = [204] }`
    WithArgs {
        #[serde(rename = "type")]
        type_name: String,
        #[serde(default)]
        args: Vec<Value>,
    },
}

impl From<HandlerSpec> for HandlerRef {
    fn from(spec: HandlerSpec) -> Self {
        match spec {
            HandlerSpec::Type(name) => HandlerRef::Type(name),
            HandlerSpec::WithArgs { type_name, args } if args.is_empty() => HandlerRef::Type(type_name),
            HandlerSpec::WithArgs { type_name, args } => HandlerRef::TypeWithArgs(type_name, args),
        }
    }
}

/// One route declaration.
///
/// Keys may be written lower-case or upper-case (`PATH`, `METHOD`, `PROCESSOR`,
/// `PARAM_PATTERNS`); any other key is rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteConfig {
    #[serde(alias = "PATH")]
    pub path: String,
    #[serde(alias = "METHOD")]
    pub method: String,
    #[serde(alias = "PROCESSOR", alias = "handler")]
    pub processor: HandlerSpec,
    #[serde(default, alias = "PARAM_PATTERNS")]
    pub param_patterns: HashMap<String, String>,
}

impl RouteConfig {
    pub fn new(path: impl Into<String>, method: impl Into<String>, processor: HandlerSpec) -> Self {
        Self {
            path: path.into(),
            method: method.into(),
            processor,
            param_patterns: HashMap::new(),
        }
    }
}

/// Whole configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub router: RouterOptions,
    pub routes: Vec<RouteConfig>,
}

/// Load a configuration file, choosing the format by extension
/// (`.toml`, `.yaml`/`.yml`, `.json`).
///
/// # Errors
///
/// Fails when the file cannot be read, the extension is not recognised, or the
/// content does not parse into an [`AppConfig`].
pub fn load_config(path: &Path) -> anyhow::Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let config = parse_config(&content, &extension)
        .with_context(|| format!("failed to parse config file {}", path.display()))?;

    info!(
        path = %path.display(),
        routes_count = config.routes.len(),
        path_prefix = %config.router.request_path_prefix,
        "Configuration loaded"
    );
    Ok(config)
}

/// Parse configuration text in the given format (`toml`, `yaml`, `yml`, `json`).
///
/// # Errors
///
/// Fails on an unknown format or invalid content.
pub fn parse_config(content: &str, format: &str) -> anyhow::Result<AppConfig> {
    let config = match format {
        "toml" => toml::from_str(content)?,
        "yaml" | "yml" => serde_yaml::from_str(content)?,
        "json" => serde_json::from_str(content)?,
        other => bail!("unsupported config format '{other}' (expected toml, yaml or json)"),
    };
    Ok(config)
}
