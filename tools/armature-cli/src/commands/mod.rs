//! CLI command implementations.

pub mod build;
pub mod config;
pub mod dev;
pub mod routes;

use clap::{Args, Subcommand};

/// Arguments for the dev command.
#[derive(Args)]
pub struct DevArgs {
    /// Host to bind (overrides `server.host`).
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind (overrides `server.port`).
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Disable the file watcher and HMR stream.
    #[arg(long)]
    pub no_hmr: bool,
}

/// Arguments for the build command.
#[derive(Args)]
pub struct BuildArgs {
    /// Remove the build directory first.
    #[arg(long)]
    pub clean: bool,

    /// Skip minification.
    #[arg(long)]
    pub no_minify: bool,
}

/// Arguments for the routes command.
#[derive(Args)]
pub struct RoutesArgs {
    /// Resolve a URL path instead of listing routes.
    pub path: Option<String>,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,
    /// Initialize a new config file.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Validate the config file.
    Validate,
}
