//! `auth` command: inspect or clear the persisted sign-in session.

use std::path::Path;

use clap::Subcommand;
use coachfinder_core::{AuthTokenStore, FileStore};

#[derive(Debug, Subcommand)]
pub enum AuthCommands {
    /// Show whether a session is stored
    Status,
    /// Remove stored tokens and user profile
    Clear,
}

/// # Errors
///
/// Returns an error if the store file exists but cannot be read or written.
pub(crate) fn run_auth(store_path: &Path, command: &AuthCommands, json: bool) -> anyhow::Result<()> {
    let store = AuthTokenStore::new(FileStore::new(store_path));
    match command {
        AuthCommands::Status => {
            let tokens = store.load_tokens()?;
            let user: Option<serde_json::Value> = store.load_user()?;
            if json {
                let status = serde_json::json!({
                    "signedIn": tokens.is_some(),
                    "hasRefreshToken": tokens.as_ref().is_some_and(|t| t.refresh_token.is_some()),
                    "user": user,
                });
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else if tokens.is_some() {
                let who = user
                    .as_ref()
                    .and_then(|u| u.get("name").or_else(|| u.get("email")))
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or("unknown user");
                println!("signed in as {who} ({})", store_path.display());
            } else {
                println!("not signed in");
            }
        }
        AuthCommands::Clear => {
            store.clear()?;
            tracing::info!(path = %store_path.display(), "stored session cleared");
            println!("session cleared");
        }
    }
    Ok(())
}
