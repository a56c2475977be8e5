use clap::Parser;
use simplerouter::cli::{run_cli, Cli};
use simplerouter::logging::{init_logging_with_config, LogConfig};

fn main() -> anyhow::Result<()> {
    init_logging_with_config(&LogConfig::from_env())?;
    run_cli(Cli::parse())
}
