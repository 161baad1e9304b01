// ABOUTME: Command module aggregator for the pitwall CLI.
// ABOUTME: Re-exports deploy and config inspection handlers.

mod deploy;
mod inspect;

pub use deploy::{deploy, deploy_options};
pub use inspect::{list_datacenters, list_services};
