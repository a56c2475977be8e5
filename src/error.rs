//! # Error Types
//!
//! Two families of errors surface from the router:
//!
//! - [`ConfigError`] - raised while building the route table (bad template syntax,
//!   unknown verbs, unresolvable handler types, illegal options). These are fatal
//!   and should stop the application from starting.
//! - [`RequestError`] - raised while resolving a single request. Internal errors
//!   describe programming or configuration defects discovered at request time;
//!   the remaining variants are caused by the client and carry a message that is
//!   safe to return to it.
//!
//! Every [`RequestError`] maps onto an HTTP status code via [`RequestError::status`].

use http::{Method, StatusCode};
use thiserror::Error;

use crate::response::Response;

/// Error raised while compiling templates or assembling the route table.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Path templates must start with `/` and must not contain spaces.
    #[error("illegal path value: '{0}'")]
    InvalidPath(String),

    /// Routes may only be declared for GET, POST, PUT, PATCH and DELETE.
    #[error("illegal method {0}")]
    InvalidMethod(String),

    /// A closing brace appeared without a matching opening brace.
    #[error("too many curly brackets closed in '{template}'")]
    TooManyClosingBraces {
        /// The offending template
        template: String,
    },

    /// The template ended while a placeholder was still open.
    #[error("curly brackets not properly closed in '{template}'")]
    UnbalancedBraces {
        /// The offending template
        template: String,
    },

    /// A placeholder such as `{}` or `{:\d+}` has no name.
    #[error("empty placeholder name in '{template}'")]
    EmptyParameterName {
        /// The offending template
        template: String,
    },

    /// The assembled pattern is not a valid regular expression.
    #[error("invalid constraint in '{template}': {source}")]
    InvalidConstraint {
        /// The offending template
        template: String,
        /// Error reported by the regex compiler
        #[source]
        source: regex::Error,
    },

    /// A constraint introduced its own capturing group, so captures no longer
    /// line up with parameter names.
    #[error(
        "'{template}' declares {names} parameters but compiles to {groups} capture groups; \
         use non-capturing groups (?:...) inside constraints"
    )]
    CaptureGroupMismatch {
        /// The offending template
        template: String,
        /// Number of declared placeholders
        names: usize,
        /// Number of capture groups in the compiled pattern
        groups: usize,
    },

    /// A handler reference names a type that was never registered.
    #[error("processor class {0} does not exist")]
    UnknownHandler(String),

    /// A registered constructor rejected its arguments.
    #[error("error constructing processor {name}: {message}")]
    HandlerConstruction {
        /// Registered handler type name
        name: String,
        /// Constructor failure description
        message: String,
    },

    /// An option or route key that the router does not know about.
    #[error("illegal config key {0}")]
    IllegalKey(String),

    /// A known option received a value of the wrong shape.
    #[error("illegal value for option {key}: {value}")]
    IllegalValue {
        /// Option name
        key: String,
        /// Rejected value
        value: String,
    },
}

/// Error raised while resolving or dispatching a single request.
#[derive(Debug, Clone, Error)]
pub enum RequestError {
    /// Programming or configuration defect discovered at request time.
    ///
    /// The message is meant for logs; it is replaced by a generic string before
    /// being written into a response body.
    #[error("{message}")]
    Internal {
        /// Detailed description, never shown to clients
        message: String,
        /// Status code to answer with (usually 500)
        status: StatusCode,
    },

    /// No route matched the request path.
    #[error("not found")]
    NotFound,

    /// The path matched at least one route, but none for the request method.
    #[error("method not allowed")]
    MethodNotAllowed {
        /// Methods of the routes whose path matched, in registration order
        allowed: Vec<Method>,
    },

    /// The request body could not be decoded.
    #[error("{message}")]
    BadRequest {
        /// Client-facing description
        message: String,
    },

    /// Any other client-caused failure raised by a handler.
    #[error("{message}")]
    User {
        /// Status code to answer with
        status: StatusCode,
        /// Client-facing description
        message: String,
    },
}

impl RequestError {
    /// Internal error answered with `500 Internal Server Error`.
    pub fn internal(message: impl Into<String>) -> Self {
        RequestError::Internal {
            message: message.into(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client error with an explicit status code.
    pub fn user(status: StatusCode, message: impl Into<String>) -> Self {
        RequestError::User {
            status,
            message: message.into(),
        }
    }

    /// Malformed request body (`400 Bad Request`).
    pub fn bad_request(message: impl Into<String>) -> Self {
        RequestError::BadRequest {
            message: message.into(),
        }
    }

    /// HTTP status code associated with this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            RequestError::Internal { status, .. } => *status,
            RequestError::NotFound => StatusCode::NOT_FOUND,
            RequestError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            RequestError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            RequestError::User { status, .. } => *status,
        }
    }

    /// Whether this error is an internal defect rather than a client mistake.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        matches!(self, RequestError::Internal { .. })
    }

    /// Message that may be returned to the client.
    ///
    /// Internal errors yield `generic` instead of their own message.
    #[must_use]
    pub fn public_message(&self, generic: &str) -> String {
        if self.is_internal() {
            generic.to_string()
        } else {
            self.to_string()
        }
    }
}

impl From<ConfigError> for RequestError {
    fn from(err: ConfigError) -> Self {
        RequestError::internal(err.to_string())
    }
}

/// Failure returned by [`crate::router::Router::resolve`].
///
/// Carries the original error together with the best-effort response the
/// router assembled for it (status code, `Allow` header, JSON error body), so
/// the transport always has something to send.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct ResolveError {
    /// The error that stopped resolution
    pub error: RequestError,
    /// Response annotated with the error's status and body
    pub response: Response,
}

impl ResolveError {
    /// Split into the error and the annotated response.
    #[must_use]
    pub fn into_parts(self) -> (RequestError, Response) {
        (self.error, self.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(RequestError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            RequestError::MethodNotAllowed { allowed: vec![Method::GET] }.status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(RequestError::bad_request("invalid json").status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            RequestError::internal("boom").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_message_is_masked() {
        let err = RequestError::internal("database password rejected");
        assert_eq!(err.public_message("internal server error"), "internal server error");

        let err = RequestError::NotFound;
        assert_eq!(err.public_message("internal server error"), "not found");
    }

    #[test]
    fn test_config_error_becomes_internal() {
        let err: RequestError = ConfigError::UnknownHandler("Missing".into()).into();
        assert!(err.is_internal());
        assert_eq!(err.to_string(), "processor class Missing does not exist");
    }
}
