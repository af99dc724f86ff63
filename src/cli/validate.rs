//! Validate command
//!
//! Checks a credentials file without connecting to anything.

use colored::Colorize;
use std::path::Path;
use vmlink_core::credentials::file::{load_credentials, validate_credential_document};
use vmlink_core::error::{ConfigError, VmlinkError};
use vmlink_core::json::load_json_file;
use vmlink_core::types::EndpointKind;

/// Run the validate command
pub fn run_validate(kind: EndpointKind, file: &Path) -> Result<(), VmlinkError> {
    let document = load_json_file(file).map_err(|e| ConfigError::ValidationError {
        message: format!("{}: {}", file.display(), e),
    })?;

    let result = validate_credential_document(kind, &document);
    if !result.is_valid {
        println!("{} {}", "✗".red(), result.summary);
        for item in &result.missing_items {
            println!("  entry {}: missing {}", item.index, item.missing_fields.join(", "));
        }
        return Err(ConfigError::MissingFields {
            summary: result.summary,
        }
        .into());
    }

    let credentials = load_credentials(kind, file)?;
    println!(
        "{} {} is a valid {} credentials file ({} as {})",
        "✓".green(),
        file.display(),
        kind,
        credentials.address,
        credentials.username
    );
    Ok(())
}
