//! Config command handler

use crate::context::DatastetCliContext;
use datastet::DatastetError;

/// Print the configuration after file and environment overrides.
pub fn handle_config_command(ctx: &DatastetCliContext) -> datastet::Result<()> {
    let body = serde_json::to_string_pretty(&ctx.config)
        .map_err(|e| DatastetError::Other(format!("Failed to serialize configuration: {}", e)))?;
    println!("{}", body);
    Ok(())
}
