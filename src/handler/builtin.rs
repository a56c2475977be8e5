use anyhow::{anyhow, bail, Context};
use http::StatusCode;
use serde_json::{json, Map, Value};

use super::Handler;
use crate::error::RequestError;
use crate::request::RequestContext;
use crate::response::{Response, TYPE_JSON};
use crate::router::ParamVec;

/// Reflects the request back as JSON: method, path, path parameters and query.
///
/// Registered as `echo` by [`super::HandlerRegistry::with_builtins`]. Handy for
/// checking a route table from the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoHandler;

impl Handler for EchoHandler {
    fn execute(&self, ctx: &RequestContext, response: &mut Response) -> Result<(), RequestError> {
        response.set_type(TYPE_JSON);
        response.set_data(json!({
            "method": ctx.method().as_str(),
            "path": ctx.path(),
            "params": params_object(ctx.path_params()),
            "query": params_object(ctx.query_params()),
        }));
        Ok(())
    }
}

fn params_object(params: &ParamVec) -> Value {
    let mut map = Map::with_capacity(params.len());
    for (name, value) in params {
        map.insert(name.to_string(), Value::String(value.clone()));
    }
    Value::Object(map)
}

/// Answers every request with a fixed status and body.
///
/// Registered as `static`; constructor arguments are `[status, body?, type?]`,
/// e.g. `[201, {"ok": true}, "application/json"]`.
#[derive(Debug, Clone)]
pub struct StaticHandler {
    status: StatusCode,
    body: Option<Value>,
    response_type: Option<String>,
}

impl StaticHandler {
    /// Create a handler answering with `status` and an optional body.
    #[must_use]
    pub fn new(status: StatusCode, body: Option<Value>) -> Self {
        Self {
            status,
            body,
            response_type: None,
        }
    }

    /// Set the response type (content type) of the fixed answer.
    #[must_use]
    pub fn with_type(mut self, response_type: impl Into<String>) -> Self {
        self.response_type = Some(response_type.into());
        self
    }

    /// Build from registry arguments `[status, body?, type?]`.
    ///
    /// # Errors
    ///
    /// Fails when the status is missing or not a valid HTTP status code, or when
    /// the type is present but not a string.
    pub fn from_args(args: &[Value]) -> anyhow::Result<Self> {
        let code = args
            .first()
            .and_then(Value::as_u64)
            .ok_or_else(|| anyhow!("first argument must be a numeric status code"))?;
        let code = u16::try_from(code).context("status code out of range")?;
        let status = StatusCode::from_u16(code).context("invalid status code")?;

        let body = args.get(1).filter(|v| !v.is_null()).cloned();

        let response_type = match args.get(2) {
            None | Some(Value::Null) => None,
            Some(Value::String(t)) => Some(t.clone()),
            Some(other) => bail!("response type must be a string, got {other}"),
        };

        Ok(Self {
            status,
            body,
            response_type,
        })
    }
}

impl Handler for StaticHandler {
    fn execute(&self, _ctx: &RequestContext, response: &mut Response) -> Result<(), RequestError> {
        response.set_code(self.status);
        if let Some(body) = &self.body {
            response.set_data(body.clone());
        }
        if let Some(t) = &self.response_type {
            response.set_type(t.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    #[test]
    fn test_static_from_args() {
        let handler = StaticHandler::from_args(&[json!(202), json!({"queued": true})]).unwrap();
        let ctx = RequestContext::new(Method::POST, "/jobs");
        let mut response = Response::new();
        handler.execute(&ctx, &mut response).unwrap();
        assert_eq!(response.code(), Some(StatusCode::ACCEPTED));
        assert_eq!(response.data(), Some(&json!({"queued": true})));
        assert_eq!(response.response_type(), None);
    }

    #[test]
    fn test_static_rejects_bad_status() {
        assert!(StaticHandler::from_args(&[]).is_err());
        assert!(StaticHandler::from_args(&[json!(99)]).is_err());
        assert!(StaticHandler::from_args(&[json!(200), json!(null), json!(5)]).is_err());
    }

    #[test]
    fn test_echo_reflects_query() {
        let ctx = RequestContext::new(Method::GET, "/search?q=rust&page=2");
        let mut response = Response::new();
        EchoHandler.execute(&ctx, &mut response).unwrap();
        assert_eq!(response.response_type(), Some(TYPE_JSON));
        let data = response.data().unwrap();
        assert_eq!(data["path"], "/search");
        assert_eq!(data["query"]["q"], "rust");
        assert_eq!(data["query"]["page"], "2");
    }
}
