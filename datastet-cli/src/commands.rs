//! Command enum definitions

use crate::args::*;
use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Display version information
    Version,

    /// Extract and consolidate the dataset mentions of a document
    #[command(
        alias = "run",
        long_about = r#"
Run the consolidation pipeline over one document and print its dataset
mentions.

The document is a JSON object with a list of sequences (sentences or
paragraphs). A sequence carries its text and, usually, the labels the
sequence tagger gave to its non-blank tokens:

  {
    "sequences": [
      {"text": "The GSE12345 dataset is available at https://osf.io/abc123.",
       "labels": ["<other>", "<dataset-name>", "<other>", "..."]}
    ],
    "citations": [],
    "annotations": []
  }

Sequences without labels are treated as containing no mention; term
propagation may still find mentions in them.

REMOTE STAGES:
  Data type and role classification, entity linking and citation
  consolidation run only when enabled in the configuration. A service that
  cannot be reached is skipped with a warning.
"#
    )]
    Process(ProcessArgs),

    /// Check the configured remote services
    Status(StatusArgs),

    /// Print the effective configuration
    Config,

    /// Generate shell completion scripts
    Completions(CompletionsArgs),
}
