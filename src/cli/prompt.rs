//! Terminal prompts
//!
//! Visible input is read from stdin, secrets through `rpassword` so they
//! are never echoed.

use std::io::{self, Write};
use vmlink_core::credentials::Prompter;
use vmlink_core::types::EndpointSecret;

/// [`Prompter`] backed by the controlling terminal
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn input(&mut self, prompt: &str) -> io::Result<String> {
        prompt_input(prompt)
    }

    fn secret(&mut self, prompt: &str) -> io::Result<EndpointSecret> {
        rpassword::prompt_password(prompt).map(EndpointSecret::new)
    }

    fn confirm(&mut self, prompt: &str, default_yes: bool) -> io::Result<bool> {
        let default_indicator = if default_yes { "[Y/n]" } else { "[y/N]" };
        let prompt_text = format!("{} {}: ", prompt, default_indicator);

        loop {
            let input = prompt_input(&prompt_text)?.to_lowercase();

            match input.as_str() {
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                "" => return Ok(default_yes),
                _ => println!("Please enter 'y' for yes or 'n' for no."),
            }
        }
    }
}

/// Low-level input prompting
fn prompt_input(prompt: &str) -> io::Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    if io::stdin().read_line(&mut input)? == 0 {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed"));
    }

    Ok(input.trim_end().to_string())
}
