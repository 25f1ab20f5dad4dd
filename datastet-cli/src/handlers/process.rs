//! Process command handler

use crate::args::ProcessArgs;
use crate::context::DatastetCliContext;
use crate::output::*;
use crate::utils::{parse_mention_type, read_document};
use datastet::DatastetError;
use datastet::model::Dataset;
use datastet::output::document_json;
use tracing::info;

pub async fn handle_process_command(
    args: ProcessArgs,
    ctx: &DatastetCliContext,
    output_format: &str,
) -> datastet::Result<()> {
    let filter = args.mention_type.as_deref().map(parse_mention_type).transpose()?;
    let document = read_document(&args.file)?;
    info!(
        file = %args.file.display(),
        sequences = document.sequences.len(),
        "Processing document"
    );

    let processor = ctx.processor(!args.no_propagation)?;
    let mut processed = processor.process(document).await?;
    if let Some(kind) = filter {
        processed.records.retain(|record| record.dataset_type == kind);
    }

    if let Some(path) = &args.save {
        let body = serde_json::to_string_pretty(&document_json(&processed))
            .map_err(|e| DatastetError::Other(format!("Failed to serialize result: {}", e)))?;
        std::fs::write(path, body)?;
        if output_format != "json" {
            println!(
                "{}",
                format_success(&format!(
                    "Saved {} mentions to {}",
                    processed.records.len(),
                    path.display()
                ))
            );
        }
        return Ok(());
    }

    if output_format == "json" {
        println!(
            "{}",
            serde_json::to_string_pretty(&document_json(&processed))
                .unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        let records: Vec<&Dataset> = processed.records.iter().collect();
        print_mention_list(&processed, &records);
    }
    Ok(())
}
