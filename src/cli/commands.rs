use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use http::Method;
use tracing::info;

use crate::config::load_config;
use crate::handler::HandlerRegistry;
use crate::request::RequestContext;
use crate::router::Router;

/// Command-line interface for simplerouter
#[derive(Parser)]
#[command(name = "simplerouter")]
#[command(about = "Regex path router: check route tables and resolve requests", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load a configuration file, compile every route and print the table
    Check {
        /// Route configuration (TOML, YAML or JSON)
        #[arg(short, long, env = "SIMPLEROUTER_CONFIG")]
        config: PathBuf,
    },
    /// Resolve one request against a configuration and print the response
    Resolve {
        /// Route configuration (TOML, YAML or JSON)
        #[arg(short, long, env = "SIMPLEROUTER_CONFIG")]
        config: PathBuf,

        /// Request method
        #[arg(short, long, default_value = "GET")]
        method: String,

        /// Request path, optionally with `?query`
        #[arg(short, long)]
        path: String,

        /// Query string (replaces any query in --path)
        #[arg(short, long)]
        query: Option<String>,

        /// Request body
        #[arg(short, long)]
        body: Option<String>,

        /// Request header as `Name: value` (repeatable)
        #[arg(short = 'H', long = "header")]
        header: Vec<String>,
    },
}

/// Run a parsed command line.
///
/// # Errors
///
/// Fails when the configuration cannot be loaded or does not compile, or when
/// the request arguments are malformed.
pub fn run_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Check { config } => {
            let router = load_router(&config)?;
            router.dump_routes();
            info!(routes_count = router.routes().len(), "Route table OK");
            Ok(())
        }
        Commands::Resolve {
            config,
            method,
            path,
            query,
            body,
            header,
        } => {
            let router = load_router(&config)?;
            let ctx = build_context(&method, path, query.as_deref(), body, &header)?;
            let response = router.handle(ctx);
            print_response(&response)
        }
    }
}

fn load_router(path: &Path) -> anyhow::Result<Router> {
    let mut config = load_config(path)?;
    config
        .router
        .apply_env()
        .context("invalid router options in environment")?;
    Router::from_config(config, HandlerRegistry::with_builtins())
        .with_context(|| format!("invalid route table in {}", path.display()))
}

pub(crate) fn build_context(
    method: &str,
    path: String,
    query: Option<&str>,
    body: Option<String>,
    headers: &[String],
) -> anyhow::Result<RequestContext> {
    let method = Method::from_bytes(method.trim().to_ascii_uppercase().as_bytes())
        .with_context(|| format!("illegal method {method}"))?;

    let mut ctx = RequestContext::new(method, path);
    if let Some(query) = query {
        ctx = ctx.with_query(query);
    }
    for header in headers {
        let (name, value) = header
            .split_once(':')
            .ok_or_else(|| anyhow!("header '{header}' must look like 'Name: value'"))?;
        ctx = ctx.with_header(name.trim(), value.trim());
    }
    if let Some(body) = body {
        ctx = ctx.with_body(body);
    }
    Ok(ctx)
}

fn print_response(response: &http::Response<Vec<u8>>) -> anyhow::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "HTTP/1.1 {}", response.status())?;
    for (name, value) in response.headers() {
        writeln!(out, "{}: {}", name, String::from_utf8_lossy(value.as_bytes()))?;
    }
    writeln!(out)?;
    out.write_all(response.body())?;
    if !response.body().is_empty() {
        writeln!(out)?;
    }
    Ok(())
}
