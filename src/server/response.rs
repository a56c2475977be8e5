use http::header::{HeaderName, HeaderValue};
use http::{Method, StatusCode};
use serde_json::Value;
use tracing::warn;

use super::cors;
use crate::config::RouterOptions;
use crate::request::RequestContext;
use crate::response::{is_json_type, Response};

/// Write a resolved [`Response`] as an `http::Response`.
///
/// Applies CORS (permissive mode and the origin allow-list), copies every header
/// value in order, serializes the body according to the response type and
/// drops the body for HEAD requests. A missing status code is sent as 200.
#[must_use]
pub fn render(options: &RouterOptions, ctx: &RequestContext, mut response: Response) -> http::Response<Vec<u8>> {
    if options.cors_permissive {
        cors::apply_permissive(ctx, &mut response);
    }
    cors::apply_allow_origin(ctx, &mut response);

    let status = response.code().unwrap_or(StatusCode::OK);
    let body = if *ctx.method() == Method::HEAD {
        Vec::new()
    } else {
        let response_type = response
            .response_type()
            .unwrap_or(options.default_response_type.as_str());
        encode_body(response.data(), response_type)
    };

    let mut out = http::Response::new(body);
    *out.status_mut() = status;

    let headers = out.headers_mut();
    for entry in response.headers().iter() {
        let Ok(name) = HeaderName::from_bytes(entry.name().as_bytes()) else {
            warn!(header = %entry.name(), "Skipping invalid response header name");
            continue;
        };
        for value in entry.values() {
            match HeaderValue::from_str(value) {
                Ok(value) => {
                    headers.append(name.clone(), value);
                }
                Err(_) => warn!(header = %entry.name(), value = %value, "Skipping invalid response header value"),
            }
        }
    }

    out
}

fn encode_body(data: Option<&Value>, response_type: &str) -> Vec<u8> {
    match data {
        None => Vec::new(),
        Some(value) if is_json_type(response_type) => match serde_json::to_vec(value) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(error = %err, "Response body could not be serialized");
                Vec::new()
            }
        },
        Some(Value::String(text)) => text.clone().into_bytes(),
        Some(other) => other.to_string().into_bytes(),
    }
}
