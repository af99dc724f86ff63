//! Connect command
//!
//! Connects one endpoint, reports its version and token lifetime, runs the
//! health check a long operation would run, then disconnects everything.

use crate::cli::prompt::TerminalPrompter;
use crate::cli::Settings;
use colored::Colorize;
use std::path::PathBuf;
use tracing::info;
use vmlink_core::error::VmlinkError;
use vmlink_core::sdk::{RestSdk, VirtualizationSdk};
use vmlink_core::session::reconnect::{ConnectOptions, HealthOutcome};
use vmlink_core::session::token::TokenTtl;
use vmlink_core::session::SessionContext;
use vmlink_core::types::EndpointKind;

/// Arguments of `vmlink connect`
pub struct ConnectArgs {
    pub kind: EndpointKind,
    pub credentials_file: Option<PathBuf>,
    pub force: bool,
    pub min_version: Option<String>,
}

/// Run the connect command
pub fn run_connect(settings: &Settings, args: ConnectArgs) -> Result<(), VmlinkError> {
    let sdk = RestSdk::new(&settings.config.sdk)
        .map_err(|e| VmlinkError::Session(e.into_session_error(args.kind.as_str())))?;
    let mut context = SessionContext::from_config(sdk, &settings.config, &settings.config_dir);

    let result = connect_and_report(&mut context, &args);

    // Always release sessions, even after a failure
    let disconnected = context.disconnect_all();
    result?;
    disconnected?;
    Ok(())
}

fn connect_and_report<S: VirtualizationSdk>(
    context: &mut SessionContext<S>,
    args: &ConnectArgs,
) -> Result<(), VmlinkError> {
    let mut prompter = TerminalPrompter;
    let options = ConnectOptions {
        force_reconnect: args.force,
        credential_file: args.credentials_file.clone(),
    };

    let handle = context.connect(args.kind, &options, &mut prompter)?;
    println!(
        "{} Connected to {} {} as {}",
        "✓".green(),
        args.kind,
        handle.endpoint_address.bold(),
        handle.username
    );
    println!("  Version: {}", handle.product_version);

    if let Some(minimum) = &args.min_version {
        context.require_minimum_version(args.kind, minimum)?;
        println!("  Version requirement {} met", minimum);
    }

    match context.token_time_to_live(args.kind) {
        TokenTtl::Minutes(minutes) if minutes < f64::from(context.policy().min_ttl_minutes) => {
            println!("  Token: {}", format!("{:.1} minutes left", minutes).yellow())
        }
        TokenTtl::Minutes(minutes) => println!("  Token: {:.1} minutes left", minutes),
        other => println!("  Token: {}", other),
    }

    let outcome = context.ensure_healthy_connection(args.kind, &mut prompter)?;
    info!(?outcome, "Health check of {} finished", args.kind);
    match outcome {
        HealthOutcome::Healthy => println!("  Health: {}", "healthy".green()),
        HealthOutcome::SilentlyReconnected => {
            println!("  Health: {}", "reconnected with cached credentials".green())
        }
        HealthOutcome::Reconnected => println!("  Health: {}", "reconnected".green()),
        HealthOutcome::SilentReconnectFailed(reason) | HealthOutcome::ProbeFailed(reason) => {
            println!("  Health: {}", reason.red())
        }
    }

    Ok(())
}
