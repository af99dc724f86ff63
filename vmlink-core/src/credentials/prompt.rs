//! Interactive credential entry
//!
//! The terminal is reached only through [`Prompter`], so connect flows can
//! be driven by scripted input in tests and by `rpassword` in the binary.

use crate::error::{CredentialError, VmlinkError};
use crate::types::{EndpointCredentials, EndpointKind, EndpointSecret};
use std::io;
use tracing::debug;

/// Source of operator input
pub trait Prompter {
    /// Read one line of visible input, trimmed
    fn input(&mut self, prompt: &str) -> io::Result<String>;

    /// Read a secret without echo
    fn secret(&mut self, prompt: &str) -> io::Result<EndpointSecret>;

    /// Ask a yes/no question; an empty answer selects `default_yes`
    fn confirm(&mut self, prompt: &str, default_yes: bool) -> io::Result<bool>;
}

fn prompt_failed(field: &str, e: io::Error) -> VmlinkError {
    CredentialError::PromptFailed {
        field: field.to_string(),
        reason: e.to_string(),
    }
    .into()
}

/// Ask until a non-empty value is entered
fn required_input(prompter: &mut dyn Prompter, label: &str) -> Result<String, VmlinkError> {
    loop {
        let value = prompter
            .input(&format!("{}: ", label))
            .map_err(|e| prompt_failed(label, e))?;
        if !value.trim().is_empty() {
            return Ok(value.trim().to_string());
        }
        println!("❌ {} cannot be empty", label);
    }
}

/// Prompt for address, username and secret of a `kind` endpoint
pub fn prompt_credentials(
    prompter: &mut dyn Prompter,
    kind: EndpointKind,
) -> Result<EndpointCredentials, VmlinkError> {
    debug!("Prompting for {} credentials", kind);

    let address = required_input(prompter, &format!("{} address", kind))?;
    let username = required_input(prompter, "Username")?;

    let secret = loop {
        let secret = prompter
            .secret("Password: ")
            .map_err(|e| prompt_failed("Password", e))?;
        if !secret.is_blank() {
            break secret;
        }
        println!("❌ Password cannot be empty");
    };

    Ok(EndpointCredentials::new(address, username, secret))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    struct Script(VecDeque<String>);

    impl Prompter for Script {
        fn input(&mut self, _prompt: &str) -> io::Result<String> {
            self.0
                .pop_front()
                .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "script exhausted"))
        }

        fn secret(&mut self, prompt: &str) -> io::Result<EndpointSecret> {
            self.input(prompt).map(EndpointSecret::new)
        }

        fn confirm(&mut self, _prompt: &str, default_yes: bool) -> io::Result<bool> {
            Ok(default_yes)
        }
    }

    fn script(lines: &[&str]) -> Script {
        Script(lines.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_empty_answers_are_asked_again() {
        let mut prompter = script(&["", "sddc01.lab", "admin@local", "", "VMware1!"]);
        let creds = prompt_credentials(&mut prompter, EndpointKind::Controller).unwrap();
        assert_eq!(creds.address, "sddc01.lab");
        assert_eq!(creds.username, "admin@local");
        assert_eq!(creds.secret.expose(), "VMware1!");
    }

    #[test]
    fn test_closed_input_is_prompt_failure() {
        let mut prompter = script(&["sddc01.lab"]);
        let err = prompt_credentials(&mut prompter, EndpointKind::Controller).unwrap_err();
        assert!(matches!(
            err,
            VmlinkError::Credential(CredentialError::PromptFailed { .. })
        ));
    }
}
