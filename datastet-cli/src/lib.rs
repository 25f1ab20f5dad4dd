pub mod args;
pub mod commands;
pub mod context;
pub mod handlers;
pub mod output;
pub mod utils;

pub use context::DatastetCliContext;
pub use output::{
    CliColors, format_error, format_info, format_success, format_warning, output_error_json,
    print_mention, print_mention_list,
};
pub use utils::{logging_config, parse_mention_type, read_document};
