//! Authentication commands.

use super::build_manager;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use auth_engine::{ChallengeOutcome, ExchangeOutcome, LoginOutcome};
use std::io::{self, Write};
use tracing::debug;

/// Login with email and password.
pub async fn login(email: Option<String>, format: &OutputFormat) -> Result<()> {
    let manager = build_manager()?;

    if manager.session().is_authenticated() {
        let who = current_identity(&manager);
        output::print_success(&format!("Already logged in as {}", who), format);
        return Ok(());
    }

    let email = match email {
        Some(email) => email,
        None => {
            print!("Email: ");
            io::stdout().flush()?;
            let mut email = String::new();
            io::stdin().read_line(&mut email)?;
            email.trim().to_string()
        }
    };
    if email.is_empty() {
        output::print_error("Email is required", format);
        return Ok(());
    }

    let state = uuid::Uuid::new_v4().to_string();
    let challenge = manager
        .request_challenge(&email, "openid profile", &state)
        .await?;

    match challenge {
        ChallengeOutcome::Redirect(url) => {
            // External identity provider; nothing more to do here
            output::print_success(&format!("Continue signing in at: {}", url), format);
            return Ok(());
        }
        ChallengeOutcome::Issued(payload) => {
            debug!(?payload, "challenge issued");
        }
    }

    let password = rpassword::prompt_password("Password: ")?;
    if password.is_empty() {
        output::print_error("Password is required", format);
        return Ok(());
    }

    println!("Logging in...");

    match manager.submit_credentials(&email, &password, true).await? {
        LoginOutcome::Redirect(url) => {
            output::print_success(&format!("Continue signing in at: {}", url), format);
        }
        LoginOutcome::Authenticated(user) => {
            let who = user.email.as_deref().unwrap_or(&user.id).to_string();
            output::print_success(&format!("Logged in as {}", who), format);
        }
        LoginOutcome::Pending(payload) => {
            // The provider answered with an authorization code instead
            // of a direct login; finish the exchange
            let code = payload
                .get("code")
                .or_else(|| payload.get("authorization_code"))
                .and_then(|v| v.as_str());

            let Some(code) = code else {
                output::print_error("Login did not complete; unexpected server response", format);
                return Ok(());
            };

            let outcome = manager.exchange_token(code).await?;
            if matches!(outcome, ExchangeOutcome::TokensOnly) {
                manager.fetch_user_info().await?;
            }
            let who = current_identity(&manager);
            output::print_success(&format!("Logged in as {}", who), format);
        }
    }

    Ok(())
}

/// Logout and clear session.
pub async fn logout(format: &OutputFormat) -> Result<()> {
    let manager = build_manager()?;

    if !manager.session().is_authenticated() && manager.session().access_token.is_none() {
        output::print_success("Not logged in", format);
        return Ok(());
    }

    manager.logout().await?;
    output::print_success("Logged out successfully", format);
    Ok(())
}

/// Check authentication status.
pub async fn status(format: &OutputFormat) -> Result<()> {
    let manager = build_manager()?;
    let session = manager.session();

    match format {
        OutputFormat::Text => {
            println!("Session status");
            output::print_row(
                "Authenticated",
                if session.is_authenticated() { "yes" } else { "no" },
            );
            output::print_row("Phase", &format!("{:?}", manager.phase()));
            if let Some(user) = &session.user {
                output::print_row("User", user.email.as_deref().unwrap_or(&user.id));
                if let Some(role) = &user.role {
                    output::print_row("Role", role);
                }
            }
            if let Some(company) = &session.company {
                output::print_row("Company", company.name.as_deref().unwrap_or(&company.id));
            }
            if let Some(expires_at) = &session.expires_at {
                output::print_row("Expires", expires_at);
            }
        }
        OutputFormat::Json => {
            output::print_json(&serde_json::json!({
                "authenticated": session.is_authenticated(),
                "phase": manager.phase(),
                "user_id": session.user.as_ref().map(|u| u.id.clone()),
                "email": session.user.as_ref().and_then(|u| u.email.clone()),
                "role": session.role(),
                "expires_at": session.expires_at,
            }));
        }
    }

    Ok(())
}

/// Show the authoritative user record.
pub async fn whoami(format: &OutputFormat) -> Result<()> {
    let manager = build_manager()?;

    if !manager.session().is_authenticated() {
        output::print_error("Not logged in", format);
        return Ok(());
    }

    let user = manager.fetch_user_info().await?;

    match format {
        OutputFormat::Text => {
            output::print_row("Id", &user.id);
            if let Some(email) = &user.email {
                output::print_row("Email", email);
            }
            let name = [user.first_name.as_deref(), user.last_name.as_deref()]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join(" ");
            if !name.is_empty() {
                output::print_row("Name", &name);
            }
            if let Some(role) = &user.role {
                output::print_row("Role", role);
            }
            if !user.permissions.is_empty() {
                output::print_row("Permissions", &user.permissions.join(", "));
            }
        }
        OutputFormat::Json => output::print_json(&user),
    }

    Ok(())
}

fn current_identity(manager: &auth_engine::SessionManager) -> String {
    let session = manager.session();
    session
        .user
        .as_ref()
        .map(|u| u.email.clone().unwrap_or_else(|| u.id.clone()))
        .unwrap_or_else(|| "user".to_string())
}
