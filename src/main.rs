// ABOUTME: Entry point for the pitwall CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use pitwall::config::DeploymentConfig;
use pitwall::error::{Error, Result};
use pitwall::output::{Output, OutputMode};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mut output = Output::new(OutputMode::from_flags(cli.json, cli.quiet));
    output.start_timer();
    let result = run(cli, &output).await;

    if let Err(e) = result {
        let details = match &e {
            Error::Deploy(err) => err.diagnostics(),
            _ => &[][..],
        };
        output.error(&e.to_string(), details);
        std::process::exit(1);
    }
}

async fn run(cli: Cli, output: &Output) -> Result<()> {
    let config = DeploymentConfig::load(&cli.root, &cli.profile)?;

    match cli.command {
        Commands::Deploy {
            service,
            dc,
            image,
            address,
        } => {
            let options = commands::deploy_options(&cli.root, &service, &dc, &image, &address)?;
            commands::deploy(&config, options, output).await
        }
        Commands::Services { dc } => commands::list_services(&config, dc.as_deref(), output),
        Commands::Datacenters { service } => {
            commands::list_datacenters(&config, &service, output);
            Ok(())
        }
    }
}
