//! Status command handler

use crate::args::StatusArgs;
use crate::context::DatastetCliContext;
use crate::output::*;
use datastet::services::{Disambiguator, EntityFishingClient};
use serde_json::json;
use std::time::Duration;

/// Report which stages are enabled and whether the linking service answers.
pub async fn handle_status_command(
    args: StatusArgs,
    ctx: &DatastetCliContext,
    output_format: &str,
) -> datastet::Result<()> {
    let config = &ctx.config;
    let stages = [
        ("propagation", config.propagation.enabled, None),
        ("datatype", config.datatype.enabled, Some(config.datatype.url.as_str())),
        ("context", config.context.enabled, Some(config.context.url.as_str())),
        ("disambiguation", config.disambiguation.enabled, Some(config.disambiguation.url.as_str())),
        ("consolidation", config.consolidation.enabled, Some(config.consolidation.url.as_str())),
    ];

    let mut alive = None;
    let mut customisation = None;
    if config.disambiguation.enabled {
        let client = EntityFishingClient::new(config.disambiguation.url.clone())
            .with_timeout(Duration::from_secs(config.disambiguation.timeout_secs));
        alive = Some(client.is_alive().await.unwrap_or(false));
        if args.customisation && alive == Some(true) {
            customisation = Some(
                client
                    .has_customisation(&config.disambiguation.customisation)
                    .await
                    .unwrap_or(false),
            );
        }
    }

    if output_format == "json" {
        let stages: Vec<_> = stages
            .iter()
            .map(|(name, enabled, url)| json!({"stage": name, "enabled": enabled, "url": url}))
            .collect();
        let status = json!({
            "version": datastet::VERSION,
            "stages": stages,
            "disambiguationAlive": alive,
            "customisationAvailable": customisation,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&status).unwrap_or_else(|_| "{}".to_string())
        );
        return Ok(());
    }

    for (name, enabled, url) in stages {
        let line = match (enabled, url) {
            (true, Some(url)) => format!("{}: enabled ({})", name, url),
            (true, None) => format!("{}: enabled", name),
            (false, _) => format!("{}: disabled", name),
        };
        if enabled {
            println!("{}", format_success(&line));
        } else {
            println!("{}", format_info(&line));
        }
    }
    match alive {
        Some(true) => println!("{}", format_success("entity-fishing: alive")),
        Some(false) => println!("{}", format_error("entity-fishing: not responding")),
        None => {}
    }
    match customisation {
        Some(true) => println!(
            "{}",
            format_success(&format!("customisation {}: available", config.disambiguation.customisation))
        ),
        Some(false) => println!(
            "{}",
            format_warning(&format!("customisation {}: missing", config.disambiguation.customisation))
        ),
        None => {}
    }
    Ok(())
}
