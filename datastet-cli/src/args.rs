//! Command argument structures

use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// Document to process (JSON, labelled sequences)
    pub file: PathBuf,

    /// Skip term propagation
    #[arg(long)]
    pub no_propagation: bool,

    /// Only print mentions of this type (dataset-name, dataset)
    #[arg(long = "type", short = 't')]
    pub mention_type: Option<String>,

    /// Write the JSON result to a file instead of stdout
    #[arg(long)]
    pub save: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub struct StatusArgs {
    /// Also check the customisation configured for disambiguation
    #[arg(long)]
    pub customisation: bool,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell type
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
