//! Credential module
//!
//! Handles the session credential cache, JSON credential files and
//! interactive credential entry.

pub mod cache;
pub mod file;
pub mod prompt;

pub use cache::CredentialCache;
pub use prompt::Prompter;
