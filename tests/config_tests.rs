use std::io::Write;

use serde_json::{json, Value};
use simplerouter::{
    load_config, HandlerRegistry, Method, RequestContext, Router, StatusCode,
};
use tempfile::NamedTempFile;

fn write_config(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

const TOML_CONFIG: &str = r#"
[router]
request_path_prefix = "/api"
default_response_type = "application/json"

[[routes]]
path = '/users/{id:\d+}'
method = "GET"
processor = "echo"

[[routes]]
path = "/health"
method = "get"
processor = { type = "static", args = [200, { status = "ok" }] }
"#;

#[test]
fn test_load_toml_and_resolve() {
    let file = write_config(".toml", TOML_CONFIG);
    let config = load_config(file.path()).unwrap();
    assert_eq!(config.router.request_path_prefix, "/api");
    assert_eq!(config.routes.len(), 2);

    let router = Router::from_config(config, HandlerRegistry::with_builtins()).unwrap();
    assert_eq!(router.routes()[1].method(), &Method::GET);

    let out = router.handle(RequestContext::new(Method::GET, "/api/users/42?full=1"));
    assert_eq!(out.status(), StatusCode::OK);
    let body: Value = serde_json::from_slice(out.body()).unwrap();
    assert_eq!(body["params"], json!({"id": "42"}));
    assert_eq!(body["query"], json!({"full": "1"}));
    assert_eq!(body["path"], "/users/42");

    let out = router.handle(RequestContext::new(Method::GET, "/api/health"));
    let body: Value = serde_json::from_slice(out.body()).unwrap();
    assert_eq!(body, json!({"status": "ok"}));

    let out = router.handle(RequestContext::new(Method::GET, "/api/users/abc"));
    assert_eq!(out.status(), StatusCode::NOT_FOUND);
}

#[test]
fn test_load_yaml_with_upper_case_keys() {
    let file = write_config(
        ".yaml",
        r#"
routes:
  - PATH: /ping
    METHOD: POST
    PROCESSOR:
      type: static
      args: [202]
"#,
    );
    let config = load_config(file.path()).unwrap();
    let router = Router::from_config(config, HandlerRegistry::with_builtins()).unwrap();

    let mut ctx = RequestContext::new(Method::POST, "/ping");
    let response = router.resolve(&mut ctx).unwrap();
    assert_eq!(response.code(), Some(StatusCode::ACCEPTED));
    assert_eq!(response.response_type(), Some("text/html"));
}

#[test]
fn test_load_json() {
    let file = write_config(
        ".json",
        r#"{"routes": [{"path": "/echo", "method": "DELETE", "processor": "echo"}]}"#,
    );
    let config = load_config(file.path()).unwrap();
    assert_eq!(config.routes[0].method, "DELETE");
}

#[test]
fn test_unknown_route_key_rejected() {
    let file = write_config(
        ".toml",
        r#"
[[routes]]
path = "/x"
method = "GET"
processor = "echo"
priority = 3
"#,
    );
    let err = load_config(file.path()).unwrap_err();
    assert!(format!("{err:#}").contains("priority"));
}

#[test]
fn test_unknown_router_option_rejected() {
    let file = write_config(".toml", "[router]\nturbo = true\n");
    assert!(load_config(file.path()).is_err());
}

#[test]
fn test_unsupported_extension() {
    let file = write_config(".ini", "routes = []");
    let err = load_config(file.path()).unwrap_err();
    assert!(format!("{err:#}").contains("unsupported config format"));
}

#[test]
fn test_missing_file() {
    assert!(load_config(std::path::Path::new("/definitely/not/here.toml")).is_err());
}

#[test]
fn test_bad_routes_fail_router_build() {
    let file = write_config(
        ".toml",
        r#"
[[routes]]
path = "/x"
method = "OPTIONS"
processor = "echo"
"#,
    );
    let config = load_config(file.path()).unwrap();
    assert!(Router::from_config(config, HandlerRegistry::with_builtins()).is_err());

    let file = write_config(
        ".toml",
        r#"
[[routes]]
path = "/x"
method = "GET"
processor = "NotRegistered"
"#,
    );
    let config = load_config(file.path()).unwrap();
    let err = Router::from_config(config, HandlerRegistry::with_builtins()).unwrap_err();
    assert_eq!(err.to_string(), "processor class NotRegistered does not exist");
}
