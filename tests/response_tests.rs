use serde::Serialize;
use serde_json::json;
use simplerouter::handler::HandlerRef;
use simplerouter::response::{HeaderEntry, TYPE_JSON, TYPE_JSONAPI};
use simplerouter::{Method, RequestContext, Response, Router, RouterOptions, StatusCode};

#[test]
fn test_add_response_data_nests_keys() {
    let mut response = Response::new();
    response.add_response_data("error.code", json!(404)).unwrap();
    response.add_response_data("error.message", json!("not found")).unwrap();
    response.add_response_data("request_id", json!("abc")).unwrap();
    assert_eq!(
        response.data(),
        Some(&json!({
            "error": {"code": 404, "message": "not found"},
            "request_id": "abc"
        }))
    );
}

#[test]
fn test_add_response_data_keeps_existing_fields() {
    let mut response = Response::new();
    response.set_data(json!({"items": [1, 2], "meta": {"page": 1}}));
    response.add_response_data("meta.total", json!(2)).unwrap();
    assert_eq!(
        response.data(),
        Some(&json!({"items": [1, 2], "meta": {"page": 1, "total": 2}}))
    );
}

#[test]
fn test_add_response_data_custom_separator() {
    let mut response = Response::new();
    response
        .add_response_data_with_separator("a/b", json!(true), '/')
        .unwrap();
    assert_eq!(response.data(), Some(&json!({"a": {"b": true}})));
}

#[test]
fn test_add_response_data_rejects_non_object() {
    let mut response = Response::new();
    response.set_data(json!("plain text"));
    let err = response.add_response_data("error.code", json!(500)).unwrap_err();
    assert!(err.is_internal());

    let mut response = Response::new();
    response.set_data(json!({"error": "flat"}));
    assert!(response.add_response_data("error.code", json!(500)).is_err());
}

#[test]
fn test_set_json_serializes_structs() {
    #[derive(Serialize)]
    struct User {
        id: u32,
        name: &'static str,
    }

    let mut response = Response::new();
    response.set_json(&User { id: 7, name: "ada" }).unwrap();
    assert_eq!(response.data(), Some(&json!({"id": 7, "name": "ada"})));
}

#[test]
fn test_header_set_append_clear() {
    let mut response = Response::new();
    response.set_header("Set-Cookie", "a=1", false);
    response.set_header("set-cookie", "b=2", true);
    response.set_header("X-Mode", "fast", false);
    assert!(response.is_header_set("SET-COOKIE"));
    assert_eq!(
        response.header("Set-Cookie").map(HeaderEntry::values),
        Some(&["a=1".to_string(), "b=2".to_string()][..])
    );

    response.clear_header("set-cookie");
    assert!(!response.is_header_set("Set-Cookie"));
    assert_eq!(response.headers().len(), 1);

    response.clear_headers();
    assert!(response.headers().is_empty());
}

#[test]
fn test_repeated_headers_rendered_in_order() {
    let mut router = Router::new();
    router
        .create_route(
            "/login",
            Method::POST,
            HandlerRef::from_fn(|_, res| {
                res.set_header("Set-Cookie", "session=1", true);
                res.set_header("Set-Cookie", "theme=dark", true);
                Ok(())
            }),
        )
        .unwrap();

    let out = router.handle(RequestContext::new(Method::POST, "/login"));
    let cookies: Vec<_> = out
        .headers()
        .get_all("set-cookie")
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert_eq!(cookies, vec!["session=1", "theme=dark"]);
}

#[test]
fn test_cors_allowed_headers_accumulate() {
    let mut response = Response::new();
    response.cors_add_allowed_header("content-type");
    response.cors_add_allowed_headers(["x-api-key", "x-trace"]);
    response.cors_set_max_age(600);
    response.cors_allow_credentials(false);
    assert_eq!(
        response.header_joined("Access-Control-Allow-Headers").as_deref(),
        Some("content-type, x-api-key, x-trace")
    );
    assert_eq!(
        response.header("Access-Control-Allow-Headers").map(|h| h.values().len()),
        Some(1)
    );
    assert_eq!(response.header_joined("Access-Control-Max-Age").as_deref(), Some("600"));
    assert_eq!(
        response.header_joined("Access-Control-Allow-Credentials").as_deref(),
        Some("false")
    );
}

#[test]
fn test_cors_origin_allow_list() {
    let mut router = Router::new();
    router
        .create_route(
            "/data",
            Method::GET,
            HandlerRef::from_fn(|_, res| {
                res.cors_add_origin("https://App.Example.com");
                res.set_data(json!("ok"));
                Ok(())
            }),
        )
        .unwrap();

    let out = router.handle(
        RequestContext::new(Method::GET, "/data").with_header("Origin", "https://app.example.com"),
    );
    assert_eq!(out.headers()["access-control-allow-origin"], "https://app.example.com");

    let out = router.handle(
        RequestContext::new(Method::GET, "/data").with_header("Origin", "https://other.example"),
    );
    assert!(out.headers().get("access-control-allow-origin").is_none());
}

#[test]
fn test_permissive_cors() {
    let mut router = Router::new().with_options(RouterOptions::default().with_cors_permissive(true));
    router
        .create_route("/data", Method::GET, HandlerRef::from_fn(|_, _| Ok(())))
        .unwrap();

    let out = router.handle(
        RequestContext::new(Method::OPTIONS, "/data")
            .with_header("Origin", "https://app.example.com")
            .with_header("Access-Control-Request-Headers", "X-Api-Key"),
    );
    assert_eq!(out.status(), StatusCode::OK);
    assert_eq!(out.headers()["access-control-allow-origin"], "https://app.example.com");
    assert_eq!(out.headers()["access-control-allow-methods"], "GET");
    assert_eq!(out.headers()["access-control-allow-credentials"], "true");
    assert_eq!(
        out.headers()["access-control-allow-headers"],
        "content-type, authorization, accept, origin, x-requested-with, x-api-key"
    );

    let out = router.handle(RequestContext::new(Method::GET, "/data"));
    assert_eq!(out.status(), StatusCode::NO_CONTENT);
    assert_eq!(out.headers()["access-control-allow-origin"], "*");
}

#[test]
fn test_jsonapi_body_serialized() {
    let mut router = Router::new();
    router
        .create_route(
            "/articles",
            Method::GET,
            HandlerRef::from_fn(|_, res| {
                res.set_type(TYPE_JSONAPI);
                res.set_data(json!({"data": []}));
                Ok(())
            }),
        )
        .unwrap();

    let out = router.handle(RequestContext::new(Method::GET, "/articles"));
    assert_eq!(out.headers()["content-type"], TYPE_JSONAPI);
    assert_eq!(out.body().as_slice(), br#"{"data":[]}"#);

    let out = router.handle(RequestContext::new(Method::PUT, "/articles"));
    assert_eq!(out.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert!(out.body().is_empty());
}

#[test]
fn test_handler_type_drives_error_body() {
    let mut router = Router::new();
    router
        .create_route(
            "/strict",
            Method::GET,
            HandlerRef::from_fn(|_, res| {
                res.set_type(TYPE_JSON);
                Err(simplerouter::RequestError::user(StatusCode::FORBIDDEN, "no access"))
            }),
        )
        .unwrap();

    let out = router.handle(RequestContext::new(Method::GET, "/strict"));
    assert_eq!(out.status(), StatusCode::FORBIDDEN);
    assert_eq!(out.body().as_slice(), br#"{"error":{"code":403,"message":"no access"}}"#);
}
