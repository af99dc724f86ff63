//! Token TTL command

use colored::Colorize;
use vmlink_core::error::VmlinkError;
use vmlink_core::session::token::{decode_claims, local_expiry, time_to_live, TokenTtl};

/// Run the token-ttl command
pub fn run_token_ttl(token: &str) -> Result<(), VmlinkError> {
    let claims = decode_claims(token.trim())?;
    let expiry = local_expiry(&claims)?;

    println!("Expires at: {}", expiry.format("%Y-%m-%d %H:%M:%S %:z"));
    match time_to_live(Some(token)) {
        TokenTtl::Minutes(minutes) if minutes < 0.0 => {
            println!("Time to live: {}", format!("expired {:.1} minutes ago", -minutes).red())
        }
        TokenTtl::Minutes(minutes) => println!("Time to live: {:.1} minutes", minutes),
        other => println!("Time to live: {}", other),
    }
    Ok(())
}
