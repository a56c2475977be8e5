//! # Transport Sender
//!
//! Converts the router's [`crate::response::Response`] model into an
//! `http::Response<Vec<u8>>` that any transport (CGI shim, hyper, tests) can
//! write out. See [`render`].

mod cors;
mod response;

pub use cors::DEFAULT_ALLOWED_HEADERS;
pub use response::render;
