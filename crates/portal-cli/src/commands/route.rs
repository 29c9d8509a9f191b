//! Landing-route inspection command.

use super::build_manager;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use auth_engine::{resolve_landing, Landing};

/// Show where the portal would land from the given location.
pub async fn route(path: &str, format: &OutputFormat) -> Result<()> {
    let manager = build_manager()?;
    let session = manager.session();

    let (decision, detail) = match resolve_landing(&session, path) {
        Landing::Stay => ("stay", None),
        Landing::Login => ("login", None),
        Landing::Redirect(target) => ("redirect", Some(target)),
        Landing::Loading => ("loading", None),
    };

    match format {
        OutputFormat::Text => {
            output::print_row("From", path);
            output::print_row("Decision", decision);
            if let Some(target) = &detail {
                output::print_row("Target", target);
            }
        }
        OutputFormat::Json => output::print_json(&serde_json::json!({
            "from": path,
            "decision": decision,
            "target": detail,
        })),
    }

    Ok(())
}
