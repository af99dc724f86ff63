//! JSON credential files
//!
//! A credential file holds one object (or an array of objects) with the
//! address, username and secret fields of one endpoint kind. The field
//! names differ per kind, see [`EndpointKind::credential_fields`].
//!
//! Files are plaintext. Writing one is always an explicit operator choice.

use crate::error::{ConfigError, CredentialError, VmlinkError};
use crate::json::load_json_file;
use crate::types::{EndpointCredentials, EndpointKind, EndpointSecret};
use crate::validation::{find_empty_fields, validate_array_properties, ValidationResult};
use serde::ser::{SerializeMap, Serializer};
use serde_json::Value;
use std::path::Path;
use tracing::{error, info};
use zeroize::Zeroizing;

/// Items of a credential document: the array itself, or the lone object
fn document_items(document: &Value) -> Vec<Value> {
    match document {
        Value::Array(items) => items.clone(),
        other => vec![other.clone()],
    }
}

/// Structural check: every entry carries all required fields for `kind`
pub fn validate_credential_document(kind: EndpointKind, document: &Value) -> ValidationResult {
    let fields = kind.credential_fields();
    validate_array_properties(&document_items(document), &fields.all())
}

/// Load and validate the credentials for `kind` from `path`
///
/// # Errors
///
/// Returns a [`ConfigError`] when the file cannot be parsed, lacks a
/// required field, or holds an empty value. No connection is attempted
/// by callers in any of these cases.
pub fn load_credentials(kind: EndpointKind, path: &Path) -> Result<EndpointCredentials, VmlinkError> {
    let document = load_json_file(path).map_err(|e| {
        error!("Unable to load credentials file {}: {}", path.display(), e);
        ConfigError::ValidationError {
            message: format!("{}: {}", path.display(), e),
        }
    })?;

    let validation = validate_credential_document(kind, &document);
    if !validation.is_valid {
        error!(
            missing = validation.error_count,
            "Credentials file {} is incomplete: {}",
            path.display(),
            validation.summary
        );
        return Err(ConfigError::MissingFields {
            summary: validation.summary,
        }
        .into());
    }

    let items = document_items(&document);
    let fields = kind.credential_fields();
    let first = items.first().ok_or_else(|| ConfigError::MissingFields {
        summary: "credentials file contains an empty array".to_string(),
    })?;

    let empty: Vec<String> = items
        .iter()
        .flat_map(|item| find_empty_fields(item, &fields.all()))
        .collect();
    if !empty.is_empty() {
        error!("Credentials file {} has empty values: {}", path.display(), empty.join(", "));
        return Err(ConfigError::EmptyFields { fields: empty }.into());
    }

    let text = |field: &str| first.get(field).and_then(Value::as_str).unwrap_or_default().to_string();
    let credentials = EndpointCredentials::new(
        text(fields.address),
        text(fields.username),
        EndpointSecret::new(text(fields.secret)),
    );

    info!("Loaded {} credentials for {} from {}", kind, credentials.address, path.display());
    Ok(credentials)
}

/// Write `credentials` to `path` as plaintext JSON
///
/// The secret is only exposed inside a scoped closure, and the serialized
/// buffer is zeroed when this function returns.
pub fn save_plaintext(
    kind: EndpointKind,
    path: &Path,
    credentials: &EndpointCredentials,
) -> Result<(), VmlinkError> {
    let persist_error = |reason: String| CredentialError::PersistFailed {
        path: path.display().to_string(),
        reason,
    };

    let fields = kind.credential_fields();
    let mut buffer = Zeroizing::new(Vec::with_capacity(256));

    credentials
        .secret
        .with_exposed(|secret| -> Result<(), serde_json::Error> {
            let mut serializer = serde_json::Serializer::pretty(&mut *buffer);
            let mut map = serializer.serialize_map(Some(3))?;
            map.serialize_entry(fields.address, &credentials.address)?;
            map.serialize_entry(fields.username, &credentials.username)?;
            map.serialize_entry(fields.secret, secret)?;
            map.end()
        })
        .map_err(|e| persist_error(e.to_string()))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| persist_error(e.to_string()))?;
    }
    std::fs::write(path, buffer.as_slice()).map_err(|e| persist_error(e.to_string()))?;

    crate::advisory!(
        "Saved {} credentials to {} in plaintext; protect or delete this file",
        kind,
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_array_document_validated_per_entry() {
        let document = json!([
            {"server": "vc01", "user": "a", "password": "b"},
            {"server": "vc02", "user": "a"}
        ]);
        let result = validate_credential_document(EndpointKind::Hypervisor, &document);
        assert!(!result.is_valid);
        assert_eq!(result.missing_items[0].index, 1);
        assert_eq!(result.missing_items[0].missing_fields, vec!["password"]);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("creds").join("hypervisor.json");
        let credentials = EndpointCredentials::new(
            "vc01.lab.local",
            "administrator@vsphere.local",
            EndpointSecret::new("VMware1!".to_string()),
        );

        save_plaintext(EndpointKind::Hypervisor, &path, &credentials).unwrap();

        let written: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["server"], "vc01.lab.local");
        assert_eq!(written["password"], "VMware1!");

        let loaded = load_credentials(EndpointKind::Hypervisor, &path).unwrap();
        assert_eq!(loaded.username, "administrator@vsphere.local");
        assert_eq!(loaded.secret.expose(), "VMware1!");
    }
}
