// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};
use pitwall::nomad::DEFAULT_ADDRESS;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pitwall")]
#[command(about = "Deploy services to a Nomad cluster, one datacenter at a time")]
#[command(version)]
pub struct Cli {
    /// Configuration root holding datacenters/ and nomad/
    #[arg(long, global = true, env = "PITWALL_ROOT", default_value = ".")]
    pub root: PathBuf,

    /// Configuration profile (file name under each datacenter directory)
    #[arg(short, long, global = true, env = "PITWALL_PROFILE", default_value = "production")]
    pub profile: String,

    /// Show debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print only the final result
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print JSON lines
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Deploy a service to one datacenter
    Deploy {
        /// Service to deploy
        service: String,

        /// Target datacenter
        #[arg(short, long)]
        dc: String,

        /// Container image to deploy
        #[arg(short, long)]
        image: String,

        /// Scheduler API address
        #[arg(long, env = "NOMAD_ADDR", default_value = DEFAULT_ADDRESS)]
        address: String,
    },

    /// List configured services
    Services {
        /// Only services of this datacenter
        #[arg(short, long)]
        dc: Option<String>,
    },

    /// List datacenters a service is configured in
    Datacenters {
        /// Service to look up
        service: String,
    },
}
