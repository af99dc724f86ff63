//! vmlink - session management for virtualization endpoints
//!
//! Connects to a management controller or virtualization server, keeps the
//! session healthy and records every step in the operation log.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::error;
use vmlink_core::exit_code::ExitCode;
use vmlink_core::init_logging;
use vmlink_core::types::EndpointKind;

mod cli;

#[derive(Parser)]
#[command(name = "vmlink")]
#[command(about = "Connection management and operational logging for virtualization endpoints")]
struct Cli {
    /// Configuration file (default: ~/.config/vmlink/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Never prompt; fail when a credentials file is missing
    #[arg(long, global = true)]
    non_interactive: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect an endpoint, report its health, then disconnect
    Connect {
        /// controller or hypervisor
        kind: EndpointKind,
        /// Credentials file to use instead of the configured one
        #[arg(long)]
        credentials_file: Option<PathBuf>,
        /// Open a new session even if one already exists
        #[arg(long)]
        force: bool,
        /// Fail unless the endpoint runs at least this version
        #[arg(long)]
        min_version: Option<String>,
    },
    /// Connect both endpoints from credential files and test them
    Check {
        /// Only check that a session exists, without calling the endpoint
        #[arg(long)]
        skip_probe: bool,
    },
    /// Validate a credentials file
    Validate {
        /// controller or hypervisor
        kind: EndpointKind,
        file: PathBuf,
    },
    /// Show how long a bearer token remains valid
    TokenTtl { token: String },
}

fn main() {
    let cli = Cli::parse();

    let settings = match cli::load_settings(cli.config.as_deref(), cli.non_interactive) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(e.exit_code().code());
        }
    };

    if let Err(e) = init_logging(&settings.config.logging) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(ExitCode::GeneralError.code());
    }

    let result = match cli.command {
        Commands::Connect {
            kind,
            credentials_file,
            force,
            min_version,
        } => cli::connect::run_connect(
            &settings,
            cli::connect::ConnectArgs {
                kind,
                credentials_file,
                force,
                min_version,
            },
        ),
        Commands::Check { skip_probe } => cli::check::run_check(&settings, skip_probe),
        Commands::Validate { kind, file } => cli::validate::run_validate(kind, &file),
        Commands::TokenTtl { token } => cli::token::run_token_ttl(&token),
    };

    match result {
        Ok(()) => std::process::exit(ExitCode::Success.code()),
        Err(e) => {
            let exit_code = e.exit_code();
            error!("{}", e);
            error!("Exiting with {}", exit_code);
            std::process::exit(exit_code.code());
        }
    }
}
