use tracing::debug;

use crate::request::RequestContext;
use crate::response::Response;

/// Headers always allowed in permissive mode.
pub const DEFAULT_ALLOWED_HEADERS: [&str; 5] = [
    "content-type",
    "authorization",
    "accept",
    "origin",
    "x-requested-with",
];

/// Permissive mode: allow the caller's origin (or `*`), the default headers
/// plus whatever the preflight asked for, and credentials.
pub(crate) fn apply_permissive(ctx: &RequestContext, response: &mut Response) {
    match ctx.header("origin") {
        Some(origin) => response.cors_add_origin(origin),
        None => response.cors_set_origin("*"),
    }

    let mut headers: Vec<String> = DEFAULT_ALLOWED_HEADERS.iter().map(|h| (*h).to_string()).collect();
    if let Some(requested) = ctx.header("access-control-request-headers") {
        for header in requested.split(',') {
            let header = header.trim().to_lowercase();
            if !header.is_empty() && !headers.contains(&header) {
                headers.push(header);
            }
        }
    }
    response.cors_add_allowed_headers(&headers);
    response.cors_allow_credentials(true);
}

/// Emit `Access-Control-Allow-Origin` from the response's origin allow-list,
/// unless a handler already set it.
///
/// The request origin is echoed when it is listed; otherwise `*` is sent when the
/// list contains it.
pub(crate) fn apply_allow_origin(ctx: &RequestContext, response: &mut Response) {
    if response.is_header_set("Access-Control-Allow-Origin") {
        return;
    }

    let origins = response.cors_origins();
    let allowed = match ctx.header("origin") {
        Some(origin) if origins.iter().any(|o| *o == origin.to_lowercase()) => Some(origin.to_string()),
        _ if origins.iter().any(|o| o == "*") => Some("*".to_string()),
        _ => None,
    };

    if let Some(origin) = allowed {
        debug!(origin = %origin, "CORS allow-origin set");
        response.set_header("Access-Control-Allow-Origin", origin, false);
    }
}
