//! Shared fixtures for session tests
#![allow(dead_code)]

use chrono::Duration;
use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};
use vmlink_core::credentials::Prompter;
use vmlink_core::sdk::InMemorySdk;
use vmlink_core::session::reconnect::{ConnectOptions, ReconnectPolicy};
use vmlink_core::session::SessionContext;
use vmlink_core::types::{EndpointKind, EndpointSecret};

pub const SDDC: &str = "sddc01.lab.local";
pub const SDDC_USER: &str = "administrator@vsphere.local";
pub const SDDC_SECRET: &str = "VMware123!VMware123!";
pub const SDDC_VERSION: &str = "5.1.0.0";

pub const VCENTER: &str = "vc01.lab.local";
pub const VCENTER_USER: &str = "administrator@vsphere.local";
pub const VCENTER_SECRET: &str = "VMware1!";
pub const VCENTER_VERSION: &str = "8.0.2";

/// Adapter knowing one controller and one virtualization server account
pub fn lab_sdk() -> InMemorySdk {
    InMemorySdk::new()
        .with_account(EndpointKind::Controller, SDDC, SDDC_USER, SDDC_SECRET, SDDC_VERSION)
        .with_account(
            EndpointKind::Hypervisor,
            VCENTER,
            VCENTER_USER,
            VCENTER_SECRET,
            VCENTER_VERSION,
        )
}

/// Write a credentials file for `kind` with the given raw JSON body
pub fn write_file(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path
}

/// Write a complete, valid credentials file for `kind`
pub fn write_valid_credentials(dir: &Path, kind: EndpointKind) -> PathBuf {
    let body = match kind {
        EndpointKind::Controller => format!(
            r#"{{"address": "{}", "username": "{}", "secret": "{}"}}"#,
            SDDC, SDDC_USER, SDDC_SECRET
        ),
        EndpointKind::Hypervisor => format!(
            r#"{{"server": "{}", "user": "{}", "password": "{}"}}"#,
            VCENTER, VCENTER_USER, VCENTER_SECRET
        ),
    };
    write_file(dir, &format!("{}-credentials.json", kind), &body)
}

/// Context whose `kind` endpoint is connected from a credentials file
///
/// The controller token lives for `token_lifetime`.
pub fn connected_context(
    dir: &Path,
    kind: EndpointKind,
    token_lifetime: Duration,
) -> SessionContext<InMemorySdk> {
    let path = write_valid_credentials(dir, kind);
    let sdk = lab_sdk().with_token_lifetime(token_lifetime);
    let mut context = SessionContext::new(sdk, ReconnectPolicy::default()).with_credential_file(kind, path);
    context
        .connect(kind, &ConnectOptions::default(), &mut NoPrompt)
        .unwrap();
    context.sdk_mut().reset_calls();
    context
}

/// Prompter that fails the test when asked anything
pub struct NoPrompt;

impl Prompter for NoPrompt {
    fn input(&mut self, prompt: &str) -> io::Result<String> {
        panic!("unexpected prompt: {}", prompt)
    }

    fn secret(&mut self, prompt: &str) -> io::Result<EndpointSecret> {
        panic!("unexpected secret prompt: {}", prompt)
    }

    fn confirm(&mut self, prompt: &str, _default_yes: bool) -> io::Result<bool> {
        panic!("unexpected confirmation: {}", prompt)
    }
}

/// Prompter answering from scripted queues
#[derive(Default)]
pub struct ScriptedPrompter {
    lines: VecDeque<String>,
    answers: VecDeque<bool>,
    pub prompts: Vec<String>,
}

impl ScriptedPrompter {
    /// Queue address, username and secret answers
    pub fn credentials(mut self, address: &str, username: &str, secret: &str) -> Self {
        self.lines.push_back(address.to_string());
        self.lines.push_back(username.to_string());
        self.lines.push_back(secret.to_string());
        self
    }

    /// Queue a yes/no answer
    pub fn answer(mut self, yes: bool) -> Self {
        self.answers.push_back(yes);
        self
    }

    fn next_line(&mut self, prompt: &str) -> io::Result<String> {
        self.prompts.push(prompt.to_string());
        self.lines
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "script exhausted"))
    }
}

impl Prompter for ScriptedPrompter {
    fn input(&mut self, prompt: &str) -> io::Result<String> {
        self.next_line(prompt)
    }

    fn secret(&mut self, prompt: &str) -> io::Result<EndpointSecret> {
        self.next_line(prompt).map(EndpointSecret::new)
    }

    fn confirm(&mut self, prompt: &str, _default_yes: bool) -> io::Result<bool> {
        self.prompts.push(prompt.to_string());
        self.answers
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no answer scripted"))
    }
}
