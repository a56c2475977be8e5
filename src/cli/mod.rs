//! # CLI Module
//!
//! Command-line front end for checking route tables and trying requests
//! against them without a web server.
//!
//! ## Commands
//!
//! ### `check`
//!
//! Load a configuration file, compile every route and print the table:
//!
//! ```bash
//! simplerouter check --config routes.toml
//! ```
//!
//! ### `resolve`
//!
//! Resolve one request and print the rendered response:
//!
//! ```bash
//! simplerouter resolve --config routes.toml --method GET --path /api/users/7 \
//!     --query "verbose=1" --header "Origin: https://app.example.com"
//! ```
//!
//! Only handler types registered by [`crate::handler::HandlerRegistry::with_builtins`]
//! (`echo`, `static`) are available from the command line.

mod commands;

pub use commands::{run_cli, Cli, Commands};
