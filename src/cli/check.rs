//! Check command
//!
//! Connects both endpoints from their credential files without prompting,
//! tests each session and reports the result.

use crate::cli::prompt::TerminalPrompter;
use crate::cli::Settings;
use colored::Colorize;
use vmlink_core::error::{SessionError, VmlinkError};
use vmlink_core::sdk::RestSdk;
use vmlink_core::session::reconnect::ConnectOptions;
use vmlink_core::session::SessionContext;
use vmlink_core::types::EndpointKind;

/// Run the check command
pub fn run_check(settings: &Settings, skip_probe: bool) -> Result<(), VmlinkError> {
    let mut config = settings.config.clone();
    config.reconnection.non_interactive = true;

    let sdk = RestSdk::new(&config.sdk)
        .map_err(|e| VmlinkError::Session(e.into_session_error("endpoint adapter")))?;
    let mut context = SessionContext::from_config(sdk, &config, &settings.config_dir);
    let mut prompter = TerminalPrompter;

    let mut first_error: Option<VmlinkError> = None;

    for kind in [EndpointKind::Controller, EndpointKind::Hypervisor] {
        let handle = match context.connect(kind, &ConnectOptions::default(), &mut prompter) {
            Ok(handle) => handle,
            Err(e) => {
                println!("{} {}: {}", "✗".red(), kind, e);
                first_error.get_or_insert(e);
                continue;
            }
        };

        let result = context.test_connection(&handle.endpoint_address, skip_probe);
        let age = result.session_age().map(|a| a.as_secs()).unwrap_or(0);
        match result.error_message() {
            None => println!(
                "{} {} {} connected (session age {}s, version {})",
                "✓".green(),
                kind,
                result.endpoint_address(),
                age,
                handle.product_version
            ),
            Some(message) => {
                println!("{} {} {}: {}", "✗".red(), kind, result.endpoint_address(), message);
                first_error.get_or_insert(
                    SessionError::SessionInvalid {
                        address: result.endpoint_address().to_string(),
                        reason: message.to_string(),
                    }
                    .into(),
                );
            }
        }
    }

    let disconnected = context.disconnect_all();
    if let Some(e) = first_error {
        return Err(e);
    }
    disconnected?;
    Ok(())
}
