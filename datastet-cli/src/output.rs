use crate::utils::truncate;
use colored::*;
use datastet::model::{ContextAttributes, Dataset, RoleDecision, byte_to_char};
use datastet::pipeline::ProcessedDocument;
use datastet::DatastetError;
use serde_json::json;

pub struct CliColors;

impl CliColors {
    pub fn success() -> Color {
        Color::TrueColor {
            r: 34,
            g: 197,
            b: 94,
        }
    }

    pub fn error() -> Color {
        Color::TrueColor {
            r: 239,
            g: 68,
            b: 68,
        }
    }

    pub fn warning() -> Color {
        Color::TrueColor {
            r: 245,
            g: 158,
            b: 11,
        }
    }

    pub fn info() -> Color {
        Color::TrueColor {
            r: 59,
            g: 130,
            b: 246,
        }
    }

    pub fn named() -> Color {
        Color::TrueColor {
            r: 168,
            g: 85,
            b: 247,
        }
    }

    pub fn implicit() -> Color {
        Color::TrueColor {
            r: 34,
            g: 197,
            b: 94,
        }
    }

    pub fn muted() -> Color {
        Color::TrueColor {
            r: 148,
            g: 163,
            b: 184,
        }
    }

    pub fn accent() -> Color {
        Color::TrueColor {
            r: 59,
            g: 130,
            b: 246,
        }
    }
}

/// Output a DatastetError, as structured JSON in json mode
pub fn output_error_json(error: &DatastetError, output_format: &str) {
    if output_format == "json" {
        let code = match error {
            DatastetError::Configuration(_) => "CONFIGURATION_ERROR",
            DatastetError::Lexicon(_) => "LEXICON_ERROR",
            DatastetError::Tagger(_) => "TAGGER_ERROR",
            DatastetError::Service(_) => "SERVICE_ERROR",
            DatastetError::MalformedResponse(_) => "MALFORMED_RESPONSE",
            DatastetError::InvalidDocument(_) => "INVALID_DOCUMENT",
            DatastetError::Logging(_) => "LOGGING_ERROR",
            DatastetError::Io(_) => "IO_ERROR",
            DatastetError::Other(_) => "OTHER_ERROR",
        };
        let error_response = json!({
            "error": true,
            "code": code,
            "message": error.to_string(),
            "timestamp": chrono::Utc::now().to_rfc3339()
        });
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&error_response).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        eprintln!("{}", format_error(&error.to_string()));
    }
}

pub fn format_success(msg: &str) -> String {
    format!(
        "{} {}",
        "✓".color(CliColors::success()).bold(),
        msg.color(CliColors::success())
    )
}

pub fn format_error(msg: &str) -> String {
    format!(
        "{} {}",
        "✗".color(CliColors::error()).bold(),
        msg.color(CliColors::error())
    )
}

pub fn format_warning(msg: &str) -> String {
    format!(
        "{} {}",
        "⚠".color(CliColors::warning()).bold(),
        msg.color(CliColors::warning())
    )
}

pub fn format_info(msg: &str) -> String {
    format!(
        "{} {}",
        "ℹ".color(CliColors::info()).bold(),
        msg.color(CliColors::info())
    )
}

pub fn format_mention_type(record: &Dataset) -> ColoredString {
    match record.dataset_type.as_str() {
        "dataset-name" => "named".color(CliColors::named()),
        other => other.color(CliColors::implicit()),
    }
}

/// One-letter summary of a decision: `+` true, `-` false, `?` unset.
pub fn format_decision(decision: &RoleDecision) -> String {
    let mark = match decision.value {
        Some(true) => "+",
        Some(false) => "-",
        None => "?",
    };
    format!("{}{:.2}", mark, decision.score)
}

pub fn format_roles(attributes: Option<&ContextAttributes>) -> String {
    match attributes {
        Some(attributes) => format!(
            "used {} created {} shared {}",
            format_decision(&attributes.used),
            format_decision(&attributes.created),
            format_decision(&attributes.shared)
        ),
        None => "-".to_string(),
    }
}

/// Print one mention; the offset shown is a character position in `text`.
pub fn print_mention(record: &Dataset, index: usize, text: &str) {
    let offset = record
        .anchor()
        .map(|anchor| byte_to_char(text, anchor.offsets.global_start()).to_string())
        .unwrap_or_else(|| "?".to_string());
    let mut flags = Vec::new();
    if record.propagated {
        flags.push("propagated");
    }
    if record.in_data_availability_section {
        flags.push("availability");
    }

    println!(
        "{}. {} [{}] {} {}",
        (index + 1).to_string().color(CliColors::muted()),
        record.raw_form.bold(),
        format_mention_type(record),
        format!("@{}", offset).color(CliColors::muted()),
        flags.join(",").color(CliColors::warning())
    );

    if let Some(device) = &record.data_device {
        println!("   {}: {}", "Device".color(CliColors::muted()), device.raw_form);
    }
    if let Some(url) = &record.url {
        let target = url.destination.as_deref().unwrap_or(&url.raw_form);
        println!("   {}: {}", "URL".color(CliColors::muted()), target.color(CliColors::accent()));
    }
    if let Some(kind) = record.dataset.as_ref().and_then(|d| d.best_data_type.as_deref()) {
        println!("   {}: {}", "Data type".color(CliColors::muted()), kind);
    }
    if let Some(id) = record.anchor().and_then(|a| a.wikidata_id.as_deref()) {
        println!("   {}: {}", "Wikidata".color(CliColors::muted()), id);
    }
    for citation in &record.citations {
        let title = citation
            .item
            .as_ref()
            .and_then(|item| item.title.as_deref())
            .unwrap_or("");
        println!(
            "   {}: {} {}",
            "Cites".color(CliColors::muted()),
            citation.raw_form,
            truncate(title, 60).color(CliColors::muted())
        );
    }
    if record.document_context_attributes.is_some() {
        println!(
            "   {}: {}",
            "Roles".color(CliColors::muted()),
            format_roles(record.document_context_attributes.as_ref())
        );
    }
    if let Some(context) = &record.context {
        println!("   {}", truncate(context, 100).dimmed());
    }
}

pub fn print_mention_list(processed: &ProcessedDocument, records: &[&Dataset]) {
    if records.is_empty() {
        println!("{}", format_info("No dataset mentions found."));
        return;
    }

    println!(
        "{}",
        format!("━━━ Dataset mentions ({}) ━━━", records.len())
            .color(CliColors::accent())
            .bold()
    );
    for (index, record) in records.iter().enumerate() {
        print_mention(record, index, &processed.text);
    }
    println!(
        "{}",
        format!(
            "{} references, processed in {} ms",
            processed.citations.len(),
            processed.runtime_ms
        )
        .color(CliColors::muted())
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_decision() {
        assert_eq!(format_decision(&RoleDecision::new(true, 0.9)), "+0.90");
        assert_eq!(format_decision(&RoleDecision::default()), "?0.00");
    }

    #[test]
    fn test_format_roles_without_attributes() {
        assert_eq!(format_roles(None), "-");
    }
}
