//! CLI command implementations.

mod auth;
mod route;

pub use auth::{login, logout, status, whoami};
pub use route::route;

use anyhow::{Context, Result};
use auth_engine::{OAuthClient, SessionManager};
use client_config::{Config, Paths};
use std::sync::Arc;

/// Wire config, storage and the session engine together.
///
/// Rehydrates the persisted session so every command starts from the
/// same state a reloaded SPA would.
pub fn build_manager() -> Result<SessionManager> {
    let paths = Paths::new().context("could not determine home directory")?;
    paths.ensure_dirs().context("could not create data directory")?;

    let config = Config::load(&paths).context("could not load configuration")?;
    let base_url = config.api_base_url().context("invalid API base URL")?;

    let vault = session_store::create_vault(paths.session_file())
        .context("could not open session store")?;

    let manager = SessionManager::new(
        Arc::new(vault),
        base_url,
        OAuthClient {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
        },
    );
    manager.rehydrate().context("could not restore session")?;

    Ok(manager)
}
